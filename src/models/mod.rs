// Re-export all model types for ease of use

pub mod webdav;

pub use webdav::*;

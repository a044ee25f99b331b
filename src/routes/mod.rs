pub mod files;
pub mod webdav;

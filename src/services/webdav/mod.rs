// WebDAV client modules organized by functionality

pub mod client;
pub mod config;
pub mod listing;
pub mod navigation;
pub mod path;

// Re-export main types for convenience
pub use client::{WebDavClient, DEFAULT_CONTENT_TYPE, METHOD_OVERRIDE_HEADER};
pub use config::{WebDavClientConfig, ADMIN_USERNAME};
pub use listing::{find_entry, parse_directory_listing, sort_entries};
pub use navigation::{Generation, NavigationGuard};
pub use path::{DavPath, MOUNT_PREFIX};

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content type reported for every collection, whatever the server said.
pub const DIRECTORY_CONTENT_TYPE: &str = "directory";

/// PROPFIND traversal depth, sent as the `Depth` header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Depth {
    #[serde(rename = "0")]
    Zero,
    #[default]
    #[serde(rename = "1")]
    One,
    #[serde(rename = "infinity")]
    Infinity,
}

impl Depth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Depth::Zero => "0",
            Depth::One => "1",
            Depth::Infinity => "infinity",
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Depth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" => Ok(Depth::Zero),
            "1" => Ok(Depth::One),
            "infinity" => Ok(Depth::Infinity),
            other => Err(format!("invalid depth '{}': expected 0, 1 or infinity", other)),
        }
    }
}

/// A file or directory returned by a PROPFIND listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebDavEntry {
    /// Raw href from the multistatus response, kept for provenance.
    pub href: String,
    pub display_name: String,
    pub content_type: String,
    pub content_length: Option<u64>,
    /// Opaque HTTP-date string as sent by the server.
    pub last_modified: Option<String>,
    pub is_collection: bool,
    /// Mount-relative path; ends with `/` iff `is_collection`.
    pub path: String,
}

impl WebDavEntry {
    /// Best-effort parse of `last_modified`. The raw string stays authoritative.
    pub fn last_modified_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.last_modified.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }

        DateTime::parse_from_rfc2822(raw)
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Children of one directory, collections first and then by display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebDavListing {
    pub path: String,
    pub entries: Vec<WebDavEntry>,
}

impl WebDavListing {
    pub fn directories(&self) -> impl Iterator<Item = &WebDavEntry> {
        self.entries.iter().filter(|e| e.is_collection)
    }

    pub fn files(&self) -> impl Iterator<Item = &WebDavEntry> {
        self.entries.iter().filter(|e| !e.is_collection)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

use std::fmt;

/// Mount point of the homeserver's WebDAV tree.
pub const MOUNT_PREFIX: &str = "/dav";

/// A path relative to the WebDAV mount.
///
/// Always starts with `/` and never carries the `/dav` mount prefix, so
/// `/dav/alice/pub/` and `http://host/dav/alice/pub/` both become `/alice/pub/`.
/// Trailing slashes are preserved; they mark collections.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DavPath(String);

impl DavPath {
    pub fn root() -> Self {
        DavPath("/".to_string())
    }

    /// Normalizes a raw path: leading `/`, mount prefix stripped repeatedly,
    /// a bare `/dav` collapsed to `/`.
    pub fn new(raw: &str) -> Self {
        let trimmed = raw.trim();
        let mut path = if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{}", trimmed)
        };

        loop {
            if path == MOUNT_PREFIX {
                path = "/".to_string();
                break;
            }
            match path.strip_prefix(MOUNT_PREFIX) {
                Some(rest) if rest.starts_with('/') => path = rest.to_string(),
                _ => break,
            }
        }

        DavPath(path)
    }

    /// Resolves an href from a multistatus response.
    ///
    /// Hrefs under `base_url` lose that prefix, full URLs on another authority
    /// are reduced to their path, and bare paths are taken as they are.
    pub fn from_href(href: &str, base_url: &str) -> Self {
        let href = href.trim();
        let base = base_url.trim().trim_end_matches('/');

        if !base.is_empty() {
            if let Some(rest) = href.strip_prefix(base) {
                if rest.is_empty() || rest.starts_with('/') {
                    return DavPath::new(rest);
                }
            }
        }

        if href.contains("://") {
            if let Ok(url) = url::Url::parse(href) {
                return DavPath::new(url.path());
            }
        }

        DavPath::new(href)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    pub fn is_directory(&self) -> bool {
        self.0.ends_with('/')
    }

    /// Same path with a trailing `/`.
    pub fn into_directory(self) -> Self {
        if self.is_directory() {
            self
        } else {
            DavPath(format!("{}/", self.0))
        }
    }

    /// Form used for equality checks: no trailing slash, `/` for the root.
    pub fn comparison_key(&self) -> &str {
        let key = self.0.trim_end_matches('/');
        if key.is_empty() {
            "/"
        } else {
            key
        }
    }

    pub fn same_resource(&self, other: &DavPath) -> bool {
        self.comparison_key() == other.comparison_key()
    }

    /// Last non-empty segment, `None` for the root.
    pub fn last_segment(&self) -> Option<&str> {
        self.0.split('/').rev().find(|s| !s.is_empty())
    }

    /// Percent-decoded copy, for display and lenient comparisons.
    pub fn decoded(&self) -> DavPath {
        match urlencoding::decode(&self.0) {
            Ok(decoded) => DavPath(decoded.into_owned()),
            Err(_) => self.clone(),
        }
    }

    /// Appends a child segment, keeping the result mount-relative.
    pub fn join(&self, child: &str) -> DavPath {
        let child = child.trim_start_matches('/');
        DavPath::new(&format!("{}/{}", self.0.trim_end_matches('/'), child))
    }
}

impl fmt::Display for DavPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DavPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DavPath {
    fn from(raw: &str) -> Self {
        DavPath::new(raw)
    }
}

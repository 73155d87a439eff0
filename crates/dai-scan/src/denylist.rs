//! Deny-list of system-generated storage paths.

/// Path fragments excluded from the inventory by default: image style
/// derivatives, aggregated CSS/JS, compiled templates, module caches and
/// generated thumbnails.
pub const DEFAULT_DENY_FRAGMENTS: &[&str] = &[
    "styles/",
    "css/",
    "js/",
    "php/",
    "ctools/",
    "xmlsitemap/",
    "languages/",
    "oembed_thumbnails/",
    "media-icons/",
    "simpletest/",
];

/// Matches storage-relative paths against a list of fragments.
///
/// A fragment matches at the start of the path or right after any `/`, so
/// `css/` denies `css/site.css` and `theme/css/site.css` but not
/// `docs/specs/`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DenyList {
    fragments: Vec<String>,
}

impl Default for DenyList {
    fn default() -> Self {
        Self::new(DEFAULT_DENY_FRAGMENTS.iter().copied())
    }
}

impl DenyList {
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            fragments: fragments
                .into_iter()
                .map(|f| f.as_ref().trim_start_matches('/').to_ascii_lowercase())
                .filter(|f| !f.is_empty())
                .collect(),
        }
    }

    /// Returns `true` if `path` is system-generated.
    pub fn is_denied(&self, path: &str) -> bool {
        let path = path.trim_start_matches('/').to_ascii_lowercase();
        self.fragments.iter().any(|fragment| {
            path.match_indices(fragment.as_str())
                .any(|(i, _)| i == 0 || path.as_bytes()[i - 1] == b'/')
        })
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }
}

//! The [`Normalizer`]: raw reference string to canonical location.

use std::fmt;
use std::sync::LazyLock;

use dai_types::{AssetId, MediaCategory};
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::category::{classify_extension, extension_of, VIMEO_PATTERN, YOUTUBE_PATTERN};
use crate::config::NormalizerConfig;
use crate::error::{NormalizeError, NormalizeResult};

/// Any `scheme:` prefix. Used to drop `mailto:`, `tel:`, `javascript:`,
/// `data:` and other non-asset schemes after the known ones are handled.
static SCHEME_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*:").expect("scheme pattern must compile"));

/// File storage scheme of a locally stored asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageScheme {
    Public,
    Private,
}

impl StorageScheme {
    /// The URI prefix, e.g. `public://`.
    pub fn uri_prefix(&self) -> &'static str {
        match self {
            Self::Public => "public://",
            Self::Private => "private://",
        }
    }
}

impl fmt::Display for StorageScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Public => "public",
            Self::Private => "private",
        })
    }
}

/// Where a normalized reference points.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Location {
    /// A file under one of the site's storage schemes. `path` is relative to
    /// the scheme root, percent-decoded, with no leading slash.
    Stored { scheme: StorageScheme, path: String },
    /// A resource on another host.
    External { url: String },
}

/// A raw reference reduced to its canonical form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedReference {
    /// Canonical location string: `public://docs/a.pdf` or a cleaned URL.
    pub canonical: String,
    pub location: Location,
    pub category: MediaCategory,
    /// Human-readable name: last path segment, or the canonical URL for
    /// hosted video.
    pub file_name: String,
}

impl NormalizedReference {
    /// The asset identity for this reference.
    pub fn asset_id(&self) -> AssetId {
        AssetId::from_location(&self.canonical)
    }

    /// Returns `true` if the reference points at locally stored content.
    pub fn is_stored(&self) -> bool {
        matches!(self.location, Location::Stored { .. })
    }
}

/// Converts raw reference strings into canonical locations.
#[derive(Clone, Debug, Default)]
pub struct Normalizer {
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize a raw reference.
    ///
    /// Returns `Ok(None)` for references that are not classifiable assets and
    /// `Err` for strings that are malformed.
    pub fn normalize(&self, raw: &str) -> NormalizeResult<Option<NormalizedReference>> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('?') {
            return Ok(None);
        }

        if let Some(rest) = strip_prefix_ci(trimmed, StorageScheme::Public.uri_prefix()) {
            return stored(StorageScheme::Public, rest, raw);
        }
        if let Some(rest) = strip_prefix_ci(trimmed, StorageScheme::Private.uri_prefix()) {
            return stored(StorageScheme::Private, rest, raw);
        }

        let protocol_relative = trimmed.starts_with("//");
        if protocol_relative
            || strip_prefix_ci(trimmed, "http://").is_some()
            || strip_prefix_ci(trimmed, "https://").is_some()
        {
            let candidate = if protocol_relative {
                format!("https:{trimmed}")
            } else {
                trimmed.to_string()
            };
            let url = Url::parse(&candidate).map_err(|e| NormalizeError::MalformedUrl {
                raw: raw.to_string(),
                reason: e.to_string(),
            })?;
            let host = url.host_str().unwrap_or_default();
            if host.is_empty() {
                return Err(NormalizeError::MalformedUrl {
                    raw: raw.to_string(),
                    reason: "missing host".into(),
                });
            }
            if self.config.is_local_host(host) {
                return self.site_relative(url.path(), raw);
            }
            return external(url);
        }

        if SCHEME_PREFIX.is_match(trimmed) {
            return Ok(None);
        }

        self.site_relative(trimmed, raw)
    }

    /// Canonical location string only.
    pub fn canonicalize(&self, raw: &str) -> NormalizeResult<Option<String>> {
        Ok(self.normalize(raw)?.map(|r| r.canonical))
    }

    /// Site-relative public path for a reference (inverse of normalization
    /// for stored files; external URLs are returned unchanged).
    pub fn public_path(&self, reference: &NormalizedReference) -> String {
        match &reference.location {
            Location::Stored {
                scheme: StorageScheme::Public,
                path,
            } => format!("{}{}", self.config.public_prefix, path),
            Location::Stored {
                scheme: StorageScheme::Private,
                path,
            } => format!("{}{}", self.config.private_prefix, path),
            Location::External { url } => url.clone(),
        }
    }

    fn site_relative(&self, path: &str, raw: &str) -> NormalizeResult<Option<NormalizedReference>> {
        let path = strip_query_and_fragment(path);
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        if let Some(rest) = path.strip_prefix(self.config.public_prefix.as_str()) {
            stored(StorageScheme::Public, rest, raw)
        } else if let Some(rest) = path.strip_prefix(self.config.private_prefix.as_str()) {
            stored(StorageScheme::Private, rest, raw)
        } else {
            // Internal page links, theme assets and the like are not
            // inventoried.
            Ok(None)
        }
    }
}

fn stored(
    scheme: StorageScheme,
    rest: &str,
    raw: &str,
) -> NormalizeResult<Option<NormalizedReference>> {
    let rest = strip_query_and_fragment(rest);
    let decoded = urlencoding::decode(rest)
        .map_err(|_| NormalizeError::InvalidEncoding(raw.to_string()))?;

    let mut segments = Vec::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(NormalizeError::PathTraversal(raw.to_string())),
            s => segments.push(s),
        }
    }
    if segments.is_empty() {
        return Ok(None);
    }
    let path = segments.join("/");

    let Some(category) = extension_of(&path).and_then(|ext| classify_extension(&ext)) else {
        return Ok(None);
    };

    let file_name = segments.last().copied().unwrap_or_default().to_string();
    Ok(Some(NormalizedReference {
        canonical: format!("{}{}", scheme.uri_prefix(), path),
        location: Location::Stored { scheme, path },
        category,
        file_name,
    }))
}

fn external(mut url: Url) -> NormalizeResult<Option<NormalizedReference>> {
    url.set_fragment(None);
    let as_str = url.as_str().to_string();

    if let Some(caps) = YOUTUBE_PATTERN.captures(&as_str) {
        let canonical = format!("https://www.youtube.com/watch?v={}", &caps[1]);
        return Ok(Some(hosted_video(canonical)));
    }
    if let Some(caps) = VIMEO_PATTERN.captures(&as_str) {
        let canonical = format!("https://vimeo.com/{}", &caps[1]);
        return Ok(Some(hosted_video(canonical)));
    }

    let Some(category) = extension_of(url.path()).and_then(|ext| classify_extension(&ext)) else {
        return Ok(None);
    };

    let last = url.path().rsplit('/').next().unwrap_or_default();
    let file_name = urlencoding::decode(last)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| last.to_string());

    Ok(Some(NormalizedReference {
        canonical: as_str.clone(),
        location: Location::External { url: as_str },
        category,
        file_name,
    }))
}

fn hosted_video(canonical: String) -> NormalizedReference {
    NormalizedReference {
        file_name: canonical.clone(),
        location: Location::External {
            url: canonical.clone(),
        },
        canonical,
        category: MediaCategory::Video,
    }
}

fn strip_query_and_fragment(s: &str) -> &str {
    let end = s.find(['?', '#']).unwrap_or(s.len());
    &s[..end]
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    if s.len() >= prefix.len()
        && s.is_char_boundary(prefix.len())
        && s[..prefix.len()].eq_ignore_ascii_case(prefix)
    {
        Some(&s[prefix.len()..])
    } else {
        None
    }
}

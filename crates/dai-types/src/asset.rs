use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Domain tag prepended to every canonical location before hashing.
const ASSET_DOMAIN: &str = "dai-asset-v1";

/// Canonical identity of an inventoried asset.
///
/// An `AssetId` is the domain-separated BLAKE3 hash of the asset's canonical
/// location string (see `dai-normalize`). Every raw spelling of the same
/// location (absolute URL, site-relative path, storage-scheme URI) normalizes
/// to the same string and therefore the same `AssetId`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(#[serde(with = "hex_bytes")] [u8; 32]);

impl AssetId {
    /// Derive the identity for a canonical location string.
    pub fn from_location(canonical: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(ASSET_DOMAIN.as_bytes());
        hasher.update(b":");
        hasher.update(canonical.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Create an `AssetId` from a pre-computed hash.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash)
    }

    /// The raw 32-byte hash.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TypeError::InvalidLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetId({})", self.short_hex())
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for AssetId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Where an asset was first discovered.
///
/// When several scanners see the same asset the builder keeps the most
/// authoritative origin; variants are declared in that precedence order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OriginKind {
    /// Listed in the managed-file registry.
    RegisteredFile,
    /// Present in the files directory but unknown to the registry.
    LooseFile,
    /// A remote-media record (hosted video, audio, etc.).
    RemoteReference,
    /// A bare external URL found in content, link fields, or menus.
    ExternalUrl,
}

impl OriginKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RegisteredFile => "registered-file",
            Self::LooseFile => "loose-file",
            Self::RemoteReference => "remote-reference",
            Self::ExternalUrl => "external-url",
        }
    }

    /// Returns `true` for origins backed by a stored file.
    ///
    /// Only file-backed assets go through the two-step queue/execute archive
    /// flow and the in-use gate.
    pub fn is_file(&self) -> bool {
        matches!(self, Self::RegisteredFile | Self::LooseFile)
    }
}

impl fmt::Display for OriginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media classification derived from MIME type, extension, or URL pattern.
///
/// There is no catch-all variant: references that cannot be
/// classified are discarded by the scanners rather than stored as unknown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MediaCategory {
    Document,
    Image,
    Video,
    Audio,
    Compressed,
}

impl MediaCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Compressed => "compressed",
        }
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a host entity references an asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmbedMethod {
    /// A file or image field pointing at a registered file.
    FieldReference,
    /// An embedded element in rich text (`<img>`, `<video>`, `<object>`, ...).
    TextEmbed,
    /// An anchor in rich text.
    TextLink,
    /// A bare URL in rich text or a link field value.
    RawLink,
    /// A navigation menu link.
    MenuLink,
    /// A reference to a remote-media record.
    MediaReference,
}

impl EmbedMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FieldReference => "field-reference",
            Self::TextEmbed => "text-embed",
            Self::TextLink => "text-link",
            Self::RawLink => "raw-link",
            Self::MenuLink => "menu-link",
            Self::MediaReference => "media-reference",
        }
    }
}

impl fmt::Display for EmbedMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a sighting's hosting chain does not resolve to a live root entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrphanReason {
    /// A parent entity in the chain no longer exists.
    MissingParent,
    /// The parent exists but no longer lists the component in its field.
    Detached,
    /// The chain loops back on itself or exceeds the configured depth.
    Unresolvable,
}

impl OrphanReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingParent => "missing-parent",
            Self::Detached => "detached",
            Self::Unresolvable => "unresolvable",
        }
    }
}

impl fmt::Display for OrphanReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrphanReason {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "missing-parent" => Ok(Self::MissingParent),
            "detached" => Ok(Self::Detached),
            "unresolvable" => Ok(Self::Unresolvable),
            other => Err(TypeError::UnknownVariant {
                kind: "orphan reason",
                value: other.to_string(),
            }),
        }
    }
}

/// Hex encoding for the 32-byte asset hash, so identities stay readable
/// in JSON and usable as map keys.
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|v: Vec<u8>| serde::de::Error::invalid_length(v.len(), &"32 bytes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn same_location_same_identity() {
        let a = AssetId::from_location("public://docs/report.pdf");
        let b = AssetId::from_location("public://docs/report.pdf");
        assert_eq!(a, b);
    }

    #[test]
    fn identity_is_domain_separated() {
        let id = AssetId::from_location("public://a.pdf");
        let raw = blake3::hash(b"public://a.pdf");
        assert_ne!(id.as_bytes(), raw.as_bytes());
    }

    #[test]
    fn hex_parse_rejects_short_input() {
        let err = AssetId::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: 32,
                actual: 2
            }
        );
    }

    #[test]
    fn serializes_as_hex_string() {
        let id = AssetId::from_location("public://a.pdf");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.to_hex()));
        let back: AssetId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<AssetId>("\"abcd\"").is_err());
    }

    #[test]
    fn origin_precedence_prefers_registry() {
        assert!(OriginKind::RegisteredFile < OriginKind::LooseFile);
        assert!(OriginKind::LooseFile < OriginKind::ExternalUrl);
        assert!(OriginKind::RegisteredFile.is_file());
        assert!(!OriginKind::RemoteReference.is_file());
    }

    #[test]
    fn enums_serialize_kebab_case() {
        let json = serde_json::to_string(&EmbedMethod::FieldReference).unwrap();
        assert_eq!(json, "\"field-reference\"");
        let json = serde_json::to_string(&OrphanReason::MissingParent).unwrap();
        assert_eq!(json, "\"missing-parent\"");
    }

    #[test]
    fn orphan_reason_parses_its_display_form() {
        for reason in [
            OrphanReason::MissingParent,
            OrphanReason::Detached,
            OrphanReason::Unresolvable,
        ] {
            assert_eq!(reason.to_string().parse::<OrphanReason>().unwrap(), reason);
        }
    }

    proptest! {
        #[test]
        fn distinct_locations_never_collide(a in "[a-z/]{1,24}", b in "[a-z/]{1,24}") {
            prop_assume!(a != b);
            prop_assert_ne!(AssetId::from_location(&a), AssetId::from_location(&b));
        }

        #[test]
        fn display_parses_back(loc in ".{0,64}") {
            let id = AssetId::from_location(&loc);
            prop_assert_eq!(id.to_string().parse::<AssetId>().unwrap(), id);
        }
    }
}

//! Reference extraction from formatted text.
//!
//! Entities are decoded once, then tag attributes are matched, then bare
//! URLs are matched in the text left after tags are removed. Each occurrence
//! is reported separately so callers can count repeats.

use std::sync::LazyLock;

use dai_types::EmbedMethod;
use regex::{Captures, Regex};

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]{1,6}|#[0-9]{1,7}|amp|lt|gt|quot|apos|nbsp);")
        .expect("entity pattern must compile")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(a|img|object|embed|video|audio|source|track|iframe)\b([^>]*)>")
        .expect("tag pattern must compile")
});

static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)(?:^|\s)(href|src|srcset|data)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#,
    )
    .expect("attribute pattern must compile")
});

static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("markup pattern must compile"));

static BARE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(?:https?|public|private)://[^\s<>"']+"#)
        .expect("url pattern must compile")
});

/// One reference found in formatted text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedReference {
    pub raw: String,
    pub method: EmbedMethod,
}

/// Decode HTML character references in one pass.
///
/// Double-encoded input stays encoded once: `&amp;lt;` becomes `&lt;`.
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures<'_>| {
            let name = &caps[1];
            let decoded = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => {
                    let code = match name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => name[1..].parse().ok(),
                    };
                    code.and_then(char::from_u32)
                }
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Extract every asset-like reference from formatted text.
pub fn extract_references(markup: &str) -> Vec<ExtractedReference> {
    let text = decode_entities(markup);
    let mut out = Vec::new();

    for tag in TAG.captures_iter(&text) {
        let name = tag[1].to_ascii_lowercase();
        let attrs = &tag[2];
        for attr in ATTR.captures_iter(attrs) {
            let attr_name = attr[1].to_ascii_lowercase();
            let value = attr
                .get(2)
                .or_else(|| attr.get(3))
                .or_else(|| attr.get(4))
                .map(|m| m.as_str().trim())
                .unwrap_or_default();
            if value.is_empty() {
                continue;
            }
            match (name.as_str(), attr_name.as_str()) {
                ("a", "href") => push(&mut out, value, EmbedMethod::TextLink),
                ("img", "srcset") | ("source", "srcset") => {
                    for candidate in value.split(',') {
                        if let Some(url) = candidate.split_whitespace().next() {
                            push(&mut out, url, EmbedMethod::TextEmbed);
                        }
                    }
                }
                ("object", "data") => push(&mut out, value, EmbedMethod::TextEmbed),
                ("a", _) | ("object", _) => {}
                (_, "src") => push(&mut out, value, EmbedMethod::TextEmbed),
                _ => {}
            }
        }
    }

    let stripped = ANY_TAG.replace_all(&text, " ");
    for m in BARE_URL.find_iter(&stripped) {
        let url = m
            .as_str()
            .trim_end_matches(['.', ',', ';', ':', '!', '?', ')', ']']);
        push(&mut out, url, EmbedMethod::TextLink);
    }

    out
}

fn push(out: &mut Vec<ExtractedReference>, raw: &str, method: EmbedMethod) {
    out.push(ExtractedReference {
        raw: raw.to_string(),
        method,
    });
}

//! Media classification by extension, MIME type, and URL pattern.

use std::sync::LazyLock;

use dai_types::MediaCategory;
use regex::Regex;

/// Extensions recognized as documents.
const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp", "rtf", "txt", "csv",
];

/// Extensions recognized as images.
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "svg", "webp", "bmp", "tif", "tiff", "ico",
];

/// Extensions recognized as video.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "webm", "mov", "avi", "mkv", "ogv", "m4v", "wmv"];

/// Extensions recognized as audio.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "oga", "m4a", "flac", "aac", "wma"];

/// Extensions recognized as compressed archives.
const COMPRESSED_EXTENSIONS: &[&str] = &["zip", "tar", "gz", "tgz", "7z", "rar", "bz2"];

/// YouTube watch, short-link, and embed URLs. Group 1 is the video id.
pub(crate) static YOUTUBE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://(?:www\.|m\.)?(?:youtube\.com/(?:watch\?(?:.*&)?v=|embed/|shorts/)|youtu\.be/)([A-Za-z0-9_-]{6,})",
    )
    .expect("youtube pattern must compile")
});

/// Vimeo page and player URLs. Group 1 is the numeric video id.
pub(crate) static VIMEO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://(?:www\.)?(?:player\.)?vimeo\.com/(?:video/)?(\d+)")
        .expect("vimeo pattern must compile")
});

/// Lowercased extension of the last path segment, if any.
///
/// # Examples
///
/// ```
/// use dai_normalize::extension_of;
///
/// assert_eq!(extension_of("docs/Annual Report.PDF").as_deref(), Some("pdf"));
/// assert_eq!(extension_of("docs/README"), None);
/// assert_eq!(extension_of(".htaccess"), None);
/// ```
pub fn extension_of(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Classify a file extension (without the leading dot).
pub fn classify_extension(ext: &str) -> Option<MediaCategory> {
    let ext = ext.to_ascii_lowercase();
    let ext = ext.as_str();
    if DOCUMENT_EXTENSIONS.contains(&ext) {
        Some(MediaCategory::Document)
    } else if IMAGE_EXTENSIONS.contains(&ext) {
        Some(MediaCategory::Image)
    } else if VIDEO_EXTENSIONS.contains(&ext) {
        Some(MediaCategory::Video)
    } else if AUDIO_EXTENSIONS.contains(&ext) {
        Some(MediaCategory::Audio)
    } else if COMPRESSED_EXTENSIONS.contains(&ext) {
        Some(MediaCategory::Compressed)
    } else {
        None
    }
}

/// Classify a MIME type string such as `application/pdf`.
pub fn classify_mime(mime: &str) -> Option<MediaCategory> {
    let mime = mime.trim().to_ascii_lowercase();
    let essence = mime.split(';').next().unwrap_or_default().trim();
    let (top, sub) = essence.split_once('/')?;
    match top {
        "image" => Some(MediaCategory::Image),
        "video" => Some(MediaCategory::Video),
        "audio" => Some(MediaCategory::Audio),
        "text" if matches!(sub, "plain" | "csv" | "rtf") => Some(MediaCategory::Document),
        "application" => match sub {
            "pdf" | "msword" | "rtf" => Some(MediaCategory::Document),
            s if s.starts_with("vnd.openxmlformats-officedocument")
                || s.starts_with("vnd.ms-excel")
                || s.starts_with("vnd.ms-powerpoint")
                || s.starts_with("vnd.oasis.opendocument") =>
            {
                Some(MediaCategory::Document)
            }
            "zip" | "x-zip-compressed" | "gzip" | "x-gzip" | "x-tar" | "x-7z-compressed"
            | "vnd.rar" | "x-rar-compressed" | "x-bzip2" => Some(MediaCategory::Compressed),
            _ => None,
        },
        _ => None,
    }
}

/// Classify an external URL by well-known hosting patterns.
///
/// Only hosted-video services are recognized; everything else falls back to
/// extension classification in the normalizer.
pub fn classify_url_pattern(url: &str) -> Option<MediaCategory> {
    if YOUTUBE_PATTERN.is_match(url) || VIMEO_PATTERN.is_match(url) {
        Some(MediaCategory::Video)
    } else {
        None
    }
}

//! Archive path assignment for media.
//!
//! Every fetched item lands at `media/<subdir>/<stem>.<ext>`. Callers hand us
//! names in many shapes (`audio-1`, `media/audio-1.mp3`, `/media/media/audio/
//! audio-1.mp3`, blob-ish URLs with query strings); the functions here reduce
//! them to one stem so a logical id always maps to exactly one path.

use percent_encoding::percent_decode_str;

use crate::model::MediaKind;
use crate::util::MediaFormat;

/// Root directory for all packaged media.
pub const MEDIA_ROOT: &str = "media";

/// True for names that point outside the package.
pub fn is_external(name: &str) -> bool {
    let lower = name.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//")
}

/// Split a raw name into its meaningful segments: no query/fragment, no
/// leading media root or type subdirectory, no `.`/`..`/empty segments.
fn meaningful_segments(raw: &str) -> Vec<String> {
    let without_query = raw.split(['?', '#']).next().unwrap_or(raw);
    let normalized = without_query.replace('\\', "/");

    let mut segments: Vec<String> = normalized
        .split('/')
        .map(|s| percent_decode_str(s).decode_utf8_lossy().trim().to_string())
        .filter(|s| !s.is_empty() && s != "." && s != "..")
        .collect();

    let is_prefix = |s: &str| {
        s.eq_ignore_ascii_case(MEDIA_ROOT)
            || [
                MediaKind::Audio,
                MediaKind::Image,
                MediaKind::Video,
                MediaKind::Caption,
            ]
            .iter()
            .any(|k| s.eq_ignore_ascii_case(k.subdir()))
    };

    // Strip any number of leading root/subdir segments, but never the last
    // segment, which is the file itself.
    while segments.len() > 1 && is_prefix(&segments[0]) {
        segments.remove(0);
    }
    segments
}

/// Split `name` into stem and a recognized media extension.
fn split_extension(name: &str) -> (&str, Option<MediaFormat>) {
    if let Some((stem, ext)) = name.rsplit_once('.')
        && !stem.is_empty()
        && let Some(format) = MediaFormat::from_extension(ext)
    {
        return (stem, Some(format));
    }
    (name, None)
}

/// Restrict a stem to characters that are safe in archive paths and URLs.
fn slugify(stem: &str) -> String {
    let mut out = String::with_capacity(stem.len());
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '.' {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches(|c| c == '-' || c == '.');
    if trimmed.is_empty() {
        "media".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Derive the logical id a raw reference stands for.
///
/// `media/audio-1.mp3`, `audio-1.mp3` and `audio-1` all yield `audio-1`.
pub fn logical_media_id(raw: &str) -> String {
    let segments = meaningful_segments(raw);
    let joined = segments.join("-");
    let (stem, _) = split_extension(&joined);
    slugify(stem)
}

/// Extension recorded in a raw name, if it is a known media type.
pub fn source_format(raw: &str) -> Option<MediaFormat> {
    let segments = meaningful_segments(raw);
    segments.last().and_then(|s| split_extension(s).1)
}

/// Canonical archive path for `raw` of the given kind.
///
/// The extension comes from `mime` when recognized, then from the raw name,
/// then from the kind's default. Idempotent: feeding a result back in returns
/// it unchanged.
pub fn canonical_media_path(kind: MediaKind, raw: &str, mime: Option<&str>) -> String {
    let ext = mime
        .and_then(MediaFormat::from_mime)
        .or_else(|| source_format(raw))
        .and_then(MediaFormat::extension)
        .unwrap_or(kind.default_extension());
    format!(
        "{MEDIA_ROOT}/{}/{}.{}",
        kind.subdir(),
        logical_media_id(raw),
        ext
    )
}

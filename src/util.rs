//! Text decoding, escaping and media format detection.

use std::borrow::Cow;

/// Decode bytes to a string: UTF-8 (BOM allowed), falling back to
/// Windows-1252 for files saved by older editors.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);
    if !malformed {
        return result;
    }
    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Escape text for HTML/XML element content.
pub fn escape_text(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>']) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    )
}

/// Escape text for a double- or single-quoted attribute value.
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(
        s.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#39;"),
    )
}

// ============================================================================
// Media Format Detection
// ============================================================================

/// Media formats a course package can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    Jpeg,
    Png,
    Gif,
    Svg,
    WebP,
    Mp3,
    Wav,
    Ogg,
    M4a,
    Mp4,
    WebM,
    Vtt,
    Srt,
    Binary,
}

impl MediaFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            MediaFormat::Jpeg => "image/jpeg",
            MediaFormat::Png => "image/png",
            MediaFormat::Gif => "image/gif",
            MediaFormat::Svg => "image/svg+xml",
            MediaFormat::WebP => "image/webp",
            MediaFormat::Mp3 => "audio/mpeg",
            MediaFormat::Wav => "audio/wav",
            MediaFormat::Ogg => "audio/ogg",
            MediaFormat::M4a => "audio/mp4",
            MediaFormat::Mp4 => "video/mp4",
            MediaFormat::WebM => "video/webm",
            MediaFormat::Vtt => "text/vtt",
            MediaFormat::Srt => "application/x-subrip",
            MediaFormat::Binary => "application/octet-stream",
        }
    }

    pub fn extension(self) -> Option<&'static str> {
        match self {
            MediaFormat::Jpeg => Some("jpg"),
            MediaFormat::Png => Some("png"),
            MediaFormat::Gif => Some("gif"),
            MediaFormat::Svg => Some("svg"),
            MediaFormat::WebP => Some("webp"),
            MediaFormat::Mp3 => Some("mp3"),
            MediaFormat::Wav => Some("wav"),
            MediaFormat::Ogg => Some("ogg"),
            MediaFormat::M4a => Some("m4a"),
            MediaFormat::Mp4 => Some("mp4"),
            MediaFormat::WebM => Some("webm"),
            MediaFormat::Vtt => Some("vtt"),
            MediaFormat::Srt => Some("srt"),
            MediaFormat::Binary => None,
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(MediaFormat::Jpeg),
            "png" => Some(MediaFormat::Png),
            "gif" => Some(MediaFormat::Gif),
            "svg" => Some(MediaFormat::Svg),
            "webp" => Some(MediaFormat::WebP),
            "mp3" => Some(MediaFormat::Mp3),
            "wav" => Some(MediaFormat::Wav),
            "ogg" | "oga" => Some(MediaFormat::Ogg),
            "m4a" => Some(MediaFormat::M4a),
            "mp4" | "m4v" => Some(MediaFormat::Mp4),
            "webm" => Some(MediaFormat::WebM),
            "vtt" => Some(MediaFormat::Vtt),
            "srt" => Some(MediaFormat::Srt),
            _ => None,
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or(mime).trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(MediaFormat::Jpeg),
            "image/png" => Some(MediaFormat::Png),
            "image/gif" => Some(MediaFormat::Gif),
            "image/svg+xml" => Some(MediaFormat::Svg),
            "image/webp" => Some(MediaFormat::WebP),
            "audio/mpeg" | "audio/mp3" => Some(MediaFormat::Mp3),
            "audio/wav" | "audio/x-wav" | "audio/wave" => Some(MediaFormat::Wav),
            "audio/ogg" => Some(MediaFormat::Ogg),
            "audio/mp4" | "audio/x-m4a" => Some(MediaFormat::M4a),
            "video/mp4" => Some(MediaFormat::Mp4),
            "video/webm" => Some(MediaFormat::WebM),
            "text/vtt" => Some(MediaFormat::Vtt),
            "application/x-subrip" | "text/srt" => Some(MediaFormat::Srt),
            _ => None,
        }
    }
}

/// Detect a format from magic bytes.
///
/// Returns `Binary` when the bytes match nothing known.
pub fn sniff_media_format(data: &[u8]) -> MediaFormat {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return MediaFormat::Jpeg;
    }
    if data.starts_with(&[0x89, b'P', b'N', b'G']) {
        return MediaFormat::Png;
    }
    if data.starts_with(b"GIF8") {
        return MediaFormat::Gif;
    }
    if data.len() >= 12 && data.starts_with(b"RIFF") {
        match &data[8..12] {
            b"WEBP" => return MediaFormat::WebP,
            b"WAVE" => return MediaFormat::Wav,
            _ => {}
        }
    }
    if data.starts_with(b"ID3") || (data.len() >= 2 && data[0] == 0xFF && data[1] & 0xE0 == 0xE0)
    {
        return MediaFormat::Mp3;
    }
    if data.starts_with(b"OggS") {
        return MediaFormat::Ogg;
    }
    if data.len() >= 12 && &data[4..8] == b"ftyp" {
        return if &data[8..11] == b"M4A" {
            MediaFormat::M4a
        } else {
            MediaFormat::Mp4
        };
    }
    if data.starts_with(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return MediaFormat::WebM;
    }
    let text = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);
    if text.starts_with(b"WEBVTT") {
        return MediaFormat::Vtt;
    }
    if text.starts_with(b"<svg") || text.starts_with(b"<?xml") {
        return MediaFormat::Svg;
    }
    MediaFormat::Binary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_text_utf8_bom() {
        let bytes = b"\xEF\xBB\xBFhello";
        assert_eq!(decode_text(bytes), "hello");
    }

    #[test]
    fn test_decode_text_cp1252_fallback() {
        // 0x93/0x94 are curly quotes in Windows-1252 and invalid UTF-8
        let bytes = b"\x93quoted\x94";
        assert_eq!(decode_text(bytes), "\u{201C}quoted\u{201D}");
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a < b & c"), "a &lt; b &amp; c");
        assert!(matches!(escape_text("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr(r#"say "hi""#), "say &quot;hi&quot;");
        assert_eq!(escape_attr("it's"), "it&#39;s");
    }

    #[test]
    fn test_sniff_media_format() {
        assert_eq!(sniff_media_format(b"ID3\x04\x00rest"), MediaFormat::Mp3);
        assert_eq!(sniff_media_format(b"\x89PNG\r\n\x1a\n"), MediaFormat::Png);
        assert_eq!(sniff_media_format(b"WEBVTT\n\n00:00.000"), MediaFormat::Vtt);
        assert_eq!(
            sniff_media_format(b"\x00\x00\x00\x18ftypmp42"),
            MediaFormat::Mp4
        );
        assert_eq!(sniff_media_format(b"nothing"), MediaFormat::Binary);
    }

    #[test]
    fn test_mime_round_trip_through_format() {
        let format = MediaFormat::from_mime("audio/mpeg; codecs=mp3").unwrap();
        assert_eq!(format.extension(), Some("mp3"));
        assert_eq!(MediaFormat::from_extension("JPEG"), Some(MediaFormat::Jpeg));
    }
}

//! Media references and resolution results.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::PageId;

/// Declared media type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Image,
    Video,
    Caption,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Caption => "caption",
        }
    }

    /// Archive subdirectory under the media root.
    pub fn subdir(self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Image => "images",
            MediaKind::Video => "video",
            MediaKind::Caption => "captions",
        }
    }

    pub fn default_extension(self) -> &'static str {
        match self {
            MediaKind::Audio => "mp3",
            MediaKind::Image => "jpg",
            MediaKind::Video => "mp4",
            MediaKind::Caption => "vtt",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "audio" | "narration" => Ok(MediaKind::Audio),
            "image" | "img" | "picture" => Ok(MediaKind::Image),
            "video" | "youtube" => Ok(MediaKind::Video),
            "caption" | "captions" | "subtitle" | "vtt" => Ok(MediaKind::Caption),
            _ => Err(format!("unknown media type '{s}'")),
        }
    }
}

/// Where a reference came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaOrigin {
    /// Named by the course document.
    Declared,
    /// Narration slot added by the resolver (`audio-<n>` / `caption-<n>`).
    Conventional,
}

/// A reference to a media item held by the project store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    /// Logical id used for store lookups, e.g. `audio-1`.
    pub id: String,
    pub kind: MediaKind,
    /// Externally hosted embed (e.g. a video player URL); never fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_id: Option<PageId>,
    pub title: String,
    /// The name as the caller spelled it (`media/audio-1.mp3`, a URL, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub origin: MediaOrigin,
}

impl MediaRef {
    pub fn new(id: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            id: id.into(),
            kind,
            embed_url: None,
            page_id: None,
            title: String::new(),
            source: None,
            origin: MediaOrigin::Declared,
        }
    }

    pub fn with_page(mut self, page: PageId) -> Self {
        self.page_id = Some(page);
        self
    }

    pub fn with_embed_url(mut self, url: impl Into<String>) -> Self {
        self.embed_url = Some(url.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn key(&self) -> MediaKey {
        MediaKey::new(self.id.clone(), self.kind)
    }
}

/// Dedup key: a logical id together with its declared type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MediaKey {
    pub id: String,
    pub kind: MediaKind,
}

impl MediaKey {
    pub fn new(id: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

impl fmt::Display for MediaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Fetched bytes with their assigned archive path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    /// Archive-relative path, e.g. `media/audio/audio-1.mp3`.
    pub path: String,
    pub byte_len: u64,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Outcome for one resolved key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedEntry {
    File(ResolvedAsset),
    /// Present but pathless; rendered straight from the URL.
    Embed { url: String },
}

/// Logical media → resolved entry, built once per build by the resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedMedia {
    entries: BTreeMap<MediaKey, ResolvedEntry>,
}

impl ResolvedMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, key: MediaKey, entry: ResolvedEntry) {
        self.entries.insert(key, entry);
    }

    pub fn get(&self, key: &MediaKey) -> Option<&ResolvedEntry> {
        self.entries.get(key)
    }

    /// Lookup by id and kind without building a key.
    pub fn lookup(&self, id: &str, kind: MediaKind) -> Option<&ResolvedEntry> {
        self.entries.get(&MediaKey::new(id, kind))
    }

    pub fn contains(&self, key: &MediaKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Archive path for a fetched file.
    pub fn path_of(&self, key: &MediaKey) -> Option<&str> {
        match self.entries.get(key) {
            Some(ResolvedEntry::File(asset)) => Some(asset.path.as_str()),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MediaKey, &ResolvedEntry)> {
        self.entries.iter()
    }

    /// Fetched files only, in key order.
    pub fn files(&self) -> impl Iterator<Item = (&MediaKey, &ResolvedAsset)> {
        self.entries.iter().filter_map(|(k, e)| match e {
            ResolvedEntry::File(asset) => Some((k, asset)),
            ResolvedEntry::Embed { .. } => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

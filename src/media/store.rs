//! Read-only access to the project media store.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::model::{MediaKind, MediaRef, PageId};

/// Errors a store can report for a single lookup.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("media not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid metadata for {id}: {message}")]
    Metadata { id: String, message: String },
}

/// Bytes returned by a store, with the MIME type it recorded (if any).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    pub data: Vec<u8>,
    pub mime_type: Option<String>,
}

/// The storage collaborator. The compiler only ever reads through it.
///
/// Implementations must be thread-safe: fetches run on a bounded pool of
/// blocking workers.
pub trait MediaStore: Send + Sync {
    /// Fetch the bytes for a logical media id.
    fn fetch(&self, id: &str) -> Result<StoredMedia, StoreError>;

    /// Every media item the store holds for a project.
    fn list(&self, project_id: &str) -> Result<Vec<MediaRef>, StoreError>;
}

// --- Implementation: In-Memory ---

struct MemoryEntry {
    media: StoredMedia,
    reference: MediaRef,
}

/// An in-memory store, handy for tests and for callers that already hold
/// every asset in memory.
#[derive(Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, MemoryEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add bytes under `id`.
    pub fn insert(&mut self, id: impl Into<String>, kind: MediaKind, data: impl Into<Vec<u8>>) {
        let id = id.into();
        self.entries.insert(
            id.clone(),
            MemoryEntry {
                media: StoredMedia {
                    data: data.into(),
                    mime_type: None,
                },
                reference: MediaRef::new(id, kind),
            },
        );
    }

    /// Add bytes with an explicit MIME type.
    pub fn insert_with_mime(
        &mut self,
        id: impl Into<String>,
        kind: MediaKind,
        data: impl Into<Vec<u8>>,
        mime: impl Into<String>,
    ) {
        let id = id.into();
        self.insert(id.clone(), kind, data);
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.media.mime_type = Some(mime.into());
        }
    }

    /// Register an externally hosted item. It lists but never fetches.
    pub fn insert_embed(&mut self, id: impl Into<String>, kind: MediaKind, url: impl Into<String>) {
        let id = id.into();
        self.entries.insert(
            id.clone(),
            MemoryEntry {
                media: StoredMedia {
                    data: Vec::new(),
                    mime_type: None,
                },
                reference: MediaRef::new(id, kind).with_embed_url(url),
            },
        );
    }

    pub fn with(mut self, id: impl Into<String>, kind: MediaKind, data: impl Into<Vec<u8>>) -> Self {
        self.insert(id, kind, data);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MediaStore for MemoryStore {
    fn fetch(&self, id: &str) -> Result<StoredMedia, StoreError> {
        match self.entries.get(id) {
            Some(entry) if entry.reference.embed_url.is_none() => Ok(entry.media.clone()),
            _ => Err(StoreError::NotFound(id.to_string())),
        }
    }

    fn list(&self, _project_id: &str) -> Result<Vec<MediaRef>, StoreError> {
        Ok(self.entries.values().map(|e| e.reference.clone()).collect())
    }
}

// --- Implementation: Project Directory ---

/// Sidecar metadata written next to each `<id>.bin`.
#[derive(Debug, Deserialize)]
struct MediaMetadata {
    #[serde(default)]
    page_id: Option<String>,
    #[serde(rename = "type", alias = "media_type")]
    media_type: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    embed_url: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    original_name: Option<String>,
}

/// Store backed by the on-disk project layout:
/// `<root>/<project>/media/<id>.bin` plus `<id>.json` metadata.
pub struct DirectoryStore {
    root: PathBuf,
    project_id: String,
}

impl DirectoryStore {
    /// Open the media of `project` under the projects directory `root`.
    ///
    /// `project` may also be a project file name such as
    /// `Safety_1712345678.scormproj`; the numeric id is extracted.
    pub fn new(root: impl Into<PathBuf>, project: &str) -> Self {
        Self {
            root: root.into(),
            project_id: project_id_from_name(project),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn media_dir(&self, project_id: &str) -> PathBuf {
        self.root.join(project_id).join("media")
    }

    fn read_metadata(path: &Path, id: &str) -> Result<MediaMetadata, StoreError> {
        let bytes = fs::read(path)?;
        let text = crate::util::decode_text(&bytes);
        serde_json::from_str(&text).map_err(|e| StoreError::Metadata {
            id: id.to_string(),
            message: e.to_string(),
        })
    }

    fn listed_ref(path: &Path, id: &str) -> Result<MediaRef, StoreError> {
        let meta = Self::read_metadata(path, id)?;
        let kind: MediaKind = meta.media_type.parse().map_err(|message| StoreError::Metadata {
            id: id.to_string(),
            message,
        })?;

        let mut media = MediaRef::new(id, kind);
        media.page_id = meta.page_id.map(PageId::new);
        media.embed_url = meta.embed_url.filter(|u| !u.is_empty());
        media.title = meta.title.unwrap_or_default();
        media.source = meta.original_name;
        Ok(media)
    }
}

/// Ids are single path components; anything else can never name a stored item.
fn is_plain_id(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains(['/', '\\', '\0'])
}

impl MediaStore for DirectoryStore {
    fn fetch(&self, id: &str) -> Result<StoredMedia, StoreError> {
        if !is_plain_id(id) {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let dir = self.media_dir(&self.project_id);
        let data = match fs::read(dir.join(format!("{id}.bin"))) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let meta_path = dir.join(format!("{id}.json"));
        let mime_type = if meta_path.exists() {
            Self::read_metadata(&meta_path, id)?.mime_type
        } else {
            None
        };

        Ok(StoredMedia { data, mime_type })
    }

    fn list(&self, project_id: &str) -> Result<Vec<MediaRef>, StoreError> {
        let dir = self.media_dir(&project_id_from_name(project_id));
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut refs = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match Self::listed_ref(&path, id) {
                Ok(media) => refs.push(media),
                Err(e) => tracing::warn!(id, error = %e, "skipping unreadable media metadata"),
            }
        }
        refs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(refs)
    }
}

/// Extract the project id from a project file name or path.
///
/// `Name_1234567890.scormproj` and `1234567890.scormproj` yield
/// `1234567890`; anything else is returned unchanged.
pub fn project_id_from_name(name: &str) -> String {
    if !name.contains(".scormproj") {
        return name.to_string();
    }
    let Some(file_name) = Path::new(name).file_name().and_then(|f| f.to_str()) else {
        return name.to_string();
    };
    let is_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

    if let (Some(underscore), Some(dot)) = (file_name.rfind('_'), file_name.rfind('.'))
        && underscore < dot
        && is_digits(&file_name[underscore + 1..dot])
    {
        return file_name[underscore + 1..dot].to_string();
    }
    if let Some(dot) = file_name.find('.')
        && is_digits(&file_name[..dot])
    {
        return file_name[..dot].to_string();
    }
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_fetch() {
        let store = MemoryStore::new().with("audio-1", MediaKind::Audio, b"ID3".to_vec());
        assert_eq!(store.fetch("audio-1").unwrap().data, b"ID3");
        assert!(matches!(store.fetch("audio-2"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_memory_store_embed_not_fetchable() {
        let mut store = MemoryStore::new();
        store.insert_embed("video-1", MediaKind::Video, "https://www.youtube.com/embed/x");
        assert!(store.fetch("video-1").is_err());
        let listed = store.list("any").unwrap();
        assert_eq!(listed[0].embed_url.as_deref(), Some("https://www.youtube.com/embed/x"));
    }

    #[test]
    fn test_project_id_from_name() {
        assert_eq!(project_id_from_name("Safety_1712345678.scormproj"), "1712345678");
        assert_eq!(project_id_from_name("/tmp/x/1712345678.scormproj"), "1712345678");
        assert_eq!(project_id_from_name("1712345678"), "1712345678");
        assert_eq!(project_id_from_name("Draft.scormproj"), "Draft.scormproj");
    }

    #[test]
    fn test_plain_ids_only() {
        assert!(is_plain_id("audio-1"));
        assert!(!is_plain_id("../secrets"));
        assert!(!is_plain_id("a/b"));
    }
}

//! Media collection, fetching and archive path assignment.
//!
//! The resolver is the only stage that talks to the [`MediaStore`]. It runs
//! once per build and produces a read-only [`ResolvedMedia`] map that the
//! renderer and assembler consult.
//!
//! [`ResolvedMedia`]: crate::model::ResolvedMedia

mod paths;
mod resolve;
mod store;

use std::collections::BTreeSet;

pub use paths::{MEDIA_ROOT, canonical_media_path, is_external, logical_media_id, source_format};
pub use resolve::{MediaResolver, Resolution};
pub use store::{
    DirectoryStore, MediaStore, MemoryStore, StoreError, StoredMedia, project_id_from_name,
};

use crate::model::{CourseContent, MediaKind, MediaKey, MediaOrigin, MediaRef, Page, PageKind};

/// Narration slot for a page: welcome 0, objectives 1, topic `i` at `i + 2`.
///
/// Slots name the `audio-<n>` / `caption-<n>` items older projects stored
/// without declaring them on the page.
pub fn narration_slot(content: &CourseContent, page: &Page) -> Option<usize> {
    match page.kind {
        PageKind::Welcome => Some(0),
        PageKind::Objectives => Some(1),
        PageKind::Topic => content
            .topics()
            .position(|t| t.id == page.id)
            .map(|i| i + 2),
        PageKind::Assessment => None,
    }
}

/// Every media reference a page will render: its declared references, plus
/// conventional narration when it declares no audio or no caption.
pub fn page_media(content: &CourseContent, page: &Page) -> Vec<MediaRef> {
    let mut refs: Vec<MediaRef> = page
        .media
        .iter()
        .map(|m| {
            let mut m = m.clone();
            m.page_id.get_or_insert_with(|| page.id.clone());
            m
        })
        .collect();

    if let Some(slot) = narration_slot(content, page) {
        for kind in [MediaKind::Audio, MediaKind::Caption] {
            if refs.iter().any(|m| m.kind == kind) {
                continue;
            }
            let mut conventional =
                MediaRef::new(format!("{}-{slot}", kind.as_str()), kind).with_page(page.id.clone());
            conventional.origin = MediaOrigin::Conventional;
            refs.push(conventional);
        }
    }
    refs
}

/// All references in the course, deduplicated by `(id, kind)`.
///
/// The first page to mention a key owns it.
pub fn collect_media(content: &CourseContent) -> Vec<MediaRef> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for page in &content.pages {
        for media in page_media(content, page) {
            if seen.insert(media.key()) {
                out.push(media);
            }
        }
    }
    out
}

/// Keys of every reference, in the order [`collect_media`] returns them.
pub fn media_keys(content: &CourseContent) -> Vec<MediaKey> {
    collect_media(content).iter().map(MediaRef::key).collect()
}

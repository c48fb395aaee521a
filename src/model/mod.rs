//! Canonical course model shared by every build stage.
//!
//! This module contains:
//! - Course and page structure ([`CourseContent`], [`Page`])
//! - Knowledge-check questions in their canonical form
//! - Media references and the per-build [`ResolvedMedia`] map
//! - [`SafeHtml`], markup that has been through the sanitizer

mod course;
mod html;
mod media;
mod question;

pub use course::{CourseContent, Page, PageId, PageKind};
pub use html::SafeHtml;
pub use media::{MediaKey, MediaKind, MediaOrigin, MediaRef, ResolvedAsset, ResolvedEntry, ResolvedMedia};
pub use question::{KnowledgeCheck, Question, QuestionKind};

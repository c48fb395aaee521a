//! # coursepack
//!
//! A deterministic compiler for offline SCORM course packages.
//!
//! ## Features
//!
//! - Accepts course documents written by any generation of the editor and
//!   normalizes them into one canonical model
//! - Fetches narration, captions, images and video from a media store with
//!   bounded concurrency and timeouts
//! - Renders sanitized page documents, an entry shell and a SCORM 1.2 or 2004
//!   manifest
//! - Ships a navigation state machine that gates progress on knowledge checks
//!   and a host API shim that degrades to standalone mode
//! - Verifies every reference before writing a byte-identical zip
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use coursepack::{BuildConfig, CancelToken, Compiler, DirectoryStore};
//!
//! # async fn run() -> coursepack::Result<()> {
//! let raw = serde_json::from_slice(&std::fs::read("course.json")?)?;
//! let store = DirectoryStore::new("projects", "123");
//! let compiler = Compiler::new(BuildConfig::default(), Arc::new(store));
//!
//! let output = compiler.build(&raw, &CancelToken::new()).await?;
//! for warning in &output.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! std::fs::write("course.zip", &output.archive)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Stages
//!
//! Each stage can also be used on its own:
//!
//! ```
//! use coursepack::normalize::normalize;
//!
//! let course = normalize(&serde_json::json!({
//!     "course_title": "Safety",
//!     "topics": [{"title": "Exits"}]
//! }))
//! .unwrap();
//! assert_eq!(course.pages.len(), 2);
//! ```

pub mod cancel;
pub mod config;
pub(crate) mod dom;
pub mod error;
pub mod media;
pub mod model;
pub mod navigation;
pub mod normalize;
pub mod package;
pub mod pipeline;
pub mod render;
pub mod shim;
pub(crate) mod util;

pub use cancel::CancelToken;
pub use config::{BuildConfig, NavigationMode, ScormVersion};
pub use error::{BuildWarning, Error, ManifestMismatch, MissingReason, Result, ValidationError, ValidationErrors};
pub use media::{DirectoryStore, MediaStore, MemoryStore, StoreError, StoredMedia};
pub use model::{CourseContent, Page, PageId, PageKind, Question, QuestionKind};
pub use navigation::{NavigationGraph, NavigationSession};
pub use normalize::normalize;
pub use pipeline::{BuildOutput, Compiler};

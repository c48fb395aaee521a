//! Error and warning types for package builds.

use std::fmt;

use thiserror::Error;

use crate::model::{MediaKind, PageId};

/// Fatal errors that abort a build.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid course content:\n{0}")]
    Validation(ValidationErrors),

    #[error("manifest does not match package contents: {0}")]
    ManifestMismatch(ManifestMismatch),

    #[error("incomplete package, missing: {}", missing.join(", "))]
    IncompletePackage { missing: Vec<String> },

    #[error("invalid archive path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("build cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A single structural problem found while normalizing input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// JSON-style location of the offending value, e.g. `topics[2].title`.
    pub path: String,
    /// Page the problem belongs to, when it could be determined.
    pub page: Option<String>,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.page {
            Some(page) => write!(f, "{} (page {}): {}", self.path, page, self.message),
            None => write!(f, "{}: {}", self.path, self.message),
        }
    }
}

/// Every problem found in one normalization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn push(&mut self, path: impl Into<String>, page: Option<&str>, message: impl Into<String>) {
        self.0.push(ValidationError {
            path: path.into(),
            page: page.map(str::to_string),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// Returns `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {err}")?;
        }
        Ok(())
    }
}

/// Reference problems found while assembling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestMismatch {
    /// Referenced by rendered HTML but absent from the archive.
    pub missing: Vec<String>,
    /// Present and referenced but not listed in the manifest.
    pub unlisted: Vec<String>,
    /// Listed in the manifest but absent from the archive.
    pub dangling: Vec<String>,
}

impl ManifestMismatch {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.unlisted.is_empty() && self.dangling.is_empty()
    }
}

impl fmt::Display for ManifestMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("referenced but missing [{}]", self.missing.join(", ")));
        }
        if !self.unlisted.is_empty() {
            parts.push(format!("not in manifest [{}]", self.unlisted.join(", ")));
        }
        if !self.dangling.is_empty() {
            parts.push(format!("listed but absent [{}]", self.dangling.join(", ")));
        }
        f.write_str(&parts.join("; "))
    }
}

/// Why a media reference was dropped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum MissingReason {
    NotFound,
    TimedOut,
    /// The build ceiling expired before this fetch finished.
    Abandoned,
    Store(String),
}

impl fmt::Display for MissingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingReason::NotFound => f.write_str("not found"),
            MissingReason::TimedOut => f.write_str("fetch timed out"),
            MissingReason::Abandoned => f.write_str("build time limit reached"),
            MissingReason::Store(msg) => write!(f, "store error: {msg}"),
        }
    }
}

/// Non-fatal conditions collected alongside a successful build.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildWarning {
    MissingMedia {
        id: String,
        kind: MediaKind,
        page_id: Option<PageId>,
        /// False for narration references the compiler added by convention.
        declared: bool,
        reason: MissingReason,
    },
    UnreferencedFile(String),
    InventoryUnavailable(String),
    /// A local `src`/`href` in author markup that the sanitizer removed.
    DroppedReference { page_id: PageId, reference: String },
}

impl fmt::Display for BuildWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildWarning::MissingMedia {
                id,
                kind,
                page_id,
                reason,
                ..
            } => {
                write!(f, "{kind} '{id}' dropped ({reason})")?;
                if let Some(page) = page_id {
                    write!(f, " on page {page}")?;
                }
                Ok(())
            }
            BuildWarning::UnreferencedFile(path) => {
                write!(f, "{path} is packaged but never referenced")
            }
            BuildWarning::InventoryUnavailable(msg) => {
                write!(f, "media inventory unavailable: {msg}")
            }
            BuildWarning::DroppedReference { page_id, reference } => {
                write!(f, "local reference '{reference}' removed from page {page_id}")
            }
        }
    }
}

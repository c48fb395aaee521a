//! Course structure.

use std::fmt;

use serde::Serialize;

use super::{KnowledgeCheck, MediaRef, SafeHtml};

/// Stable page identifier, unique within a package.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    pub const WELCOME: &'static str = "welcome";
    pub const OBJECTIVES: &'static str = "learning-objectives";
    pub const ASSESSMENT: &'static str = "assessment";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn welcome() -> Self {
        Self::new(Self::WELCOME)
    }

    pub fn objectives() -> Self {
        Self::new(Self::OBJECTIVES)
    }

    pub fn assessment() -> Self {
        Self::new(Self::ASSESSMENT)
    }

    /// Generated id for the topic at `index` (0-based).
    pub fn topic(index: usize) -> Self {
        Self(format!("topic-{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Archive path of this page's document.
    pub fn document_path(&self) -> String {
        format!("pages/{}.html", self.0)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The role a page plays in the course sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageKind {
    Welcome,
    Objectives,
    Topic,
    Assessment,
}

/// One page of the course. Immutable once normalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: PageId,
    pub kind: PageKind,
    /// Plain text; escaped by the renderer.
    pub title: String,
    pub body: SafeHtml,
    pub media: Vec<MediaRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knowledge_check: Option<KnowledgeCheck>,
    /// Label of the welcome page's start button.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_label: Option<String>,
    /// Local `src`/`href` values the sanitizer removed from the body.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropped_references: Vec<String>,
}

impl Page {
    pub fn new(id: PageId, kind: PageKind, title: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            title: title.into(),
            body: SafeHtml::default(),
            media: Vec::new(),
            knowledge_check: None,
            start_label: None,
            dropped_references: Vec::new(),
        }
    }

    /// True when forward navigation out of this page is gated.
    pub fn is_gating(&self) -> bool {
        self.knowledge_check
            .as_ref()
            .is_some_and(|kc| !kc.questions.is_empty())
    }
}

/// Root of the canonical model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseContent {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Percentage (0-100) needed to pass the assessment.
    pub pass_mark: u8,
    /// Ordered pages; the order defines manifest sequence and navigation edges.
    pub pages: Vec<Page>,
}

impl CourseContent {
    pub const DEFAULT_PASS_MARK: u8 = 80;

    pub fn page(&self, id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id.as_str() == id)
    }

    pub fn topics(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter().filter(|p| p.kind == PageKind::Topic)
    }

    pub fn assessment(&self) -> Option<&Page> {
        self.pages.iter().find(|p| p.kind == PageKind::Assessment)
    }

    /// Deterministic package identifier derived from the title and page ids.
    pub fn identifier(&self) -> String {
        let mut hasher = sha1_smol::Sha1::new();
        hasher.update(self.title.as_bytes());
        for page in &self.pages {
            hasher.update(b"\0");
            hasher.update(page.id.as_str().as_bytes());
        }
        let digest = hasher.digest().to_string();
        format!("course-{}", &digest[..16])
    }
}

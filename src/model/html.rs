//! Sanitized markup.

use std::fmt;

use serde::Serialize;

/// HTML that has passed through [`crate::normalize::sanitize_html`].
///
/// Only the sanitizer (and a few internal helpers that build markup from
/// escaped text) can construct one, so the renderer can insert it verbatim
/// without escaping it a second time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SafeHtml(String);

impl SafeHtml {
    pub(crate) fn from_sanitized(html: String) -> Self {
        Self(html)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for SafeHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

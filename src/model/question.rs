//! Knowledge-check questions.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// The canonical question kinds.
///
/// Serialized under the field name `kind` in every artifact: page markup
/// (`data-kind`), the navigation data table, and `inspect` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice,
    TrueFalse,
    FillInTheBlank,
}

impl QuestionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice => "multiple-choice",
            QuestionKind::TrueFalse => "true-false",
            QuestionKind::FillInTheBlank => "fill-in-the-blank",
        }
    }

    /// Whether answers are picked from a fixed option list.
    pub fn has_options(self) -> bool {
        matches!(self, QuestionKind::MultipleChoice | QuestionKind::TrueFalse)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    /// Accepts the spellings found in older course documents.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match folded.as_str() {
            "multiplechoice" | "mc" | "choice" => Ok(QuestionKind::MultipleChoice),
            "truefalse" | "tf" | "boolean" => Ok(QuestionKind::TrueFalse),
            "fillintheblank" | "fillinblank" | "fillblank" | "blank" => {
                Ok(QuestionKind::FillInTheBlank)
            }
            _ => Err(format!("unknown question kind '{s}'")),
        }
    }
}

/// A question in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub kind: QuestionKind,
    /// Plain text.
    pub prompt: String,
    /// Empty for fill-in-the-blank; exactly `["True", "False"]` for true/false.
    pub options: Vec<String>,
    /// For option kinds, always one of `options`.
    pub correct_answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incorrect_feedback: Option<String>,
}

impl Question {
    pub const TRUE: &'static str = "True";
    pub const FALSE: &'static str = "False";

    /// Canonical true/false question.
    pub fn true_false(prompt: impl Into<String>, answer: bool) -> Self {
        Self {
            kind: QuestionKind::TrueFalse,
            prompt: prompt.into(),
            options: vec![Self::TRUE.to_string(), Self::FALSE.to_string()],
            correct_answer: if answer { Self::TRUE } else { Self::FALSE }.to_string(),
            explanation: None,
            correct_feedback: None,
            incorrect_feedback: None,
        }
    }

    /// Index of the correct option, for option kinds.
    pub fn correct_index(&self) -> Option<usize> {
        self.options.iter().position(|o| *o == self.correct_answer)
    }
}

/// Questions that gate a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KnowledgeCheck {
    pub questions: Vec<Question>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_accepts_legacy_spellings() {
        assert_eq!("fill-in-the-blank".parse(), Ok(QuestionKind::FillInTheBlank));
        assert_eq!("fill_in_blank".parse(), Ok(QuestionKind::FillInTheBlank));
        assert_eq!("True/False".parse(), Ok(QuestionKind::TrueFalse));
        assert_eq!("multipleChoice".parse(), Ok(QuestionKind::MultipleChoice));
        assert!("essay".parse::<QuestionKind>().is_err());
    }

    #[test]
    fn test_true_false_constructor() {
        let q = Question::true_false("Rust has a GC", false);
        assert_eq!(q.options, vec!["True", "False"]);
        assert_eq!(q.correct_answer, "False");
        assert_eq!(q.correct_index(), Some(1));
    }

    #[test]
    fn test_kind_serializes_kebab_case() {
        let json = serde_json::to_string(&QuestionKind::FillInTheBlank).unwrap();
        assert_eq!(json, "\"fill-in-the-blank\"");
    }
}

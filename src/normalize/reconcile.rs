//! Field-name reconciliation tables.
//!
//! Course documents have been written by several generations of the editor.
//! Each scope has one table mapping a legacy key to its canonical key; it is
//! applied exactly once, and nothing after normalization looks at raw keys.

use serde_json::{Map, Value};

/// Which object a table applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    Course,
    Page,
    KnowledgeCheck,
    Question,
    Media,
}

const COURSE: &[(&str, &str)] = &[
    ("courseTitle", "title"),
    ("course_title", "title"),
    ("courseDescription", "description"),
    ("course_description", "description"),
    ("pass_mark", "passMark"),
    ("passingScore", "passMark"),
    ("welcome_page", "welcomePage"),
    ("welcome", "welcomePage"),
    ("objectivesPage", "learningObjectivesPage"),
    ("learning_objectives_page", "learningObjectivesPage"),
    ("objectives_page", "learningObjectivesPage"),
    ("assessmentPage", "assessment"),
    ("assessment_page", "assessment"),
    ("quiz", "assessment"),
];

const PAGE: &[(&str, &str)] = &[
    ("pageId", "id"),
    ("page_id", "id"),
    ("name", "title"),
    ("html", "content"),
    ("body", "content"),
    ("instructions", "content"),
    ("audioFile", "audioId"),
    ("audio_file", "audioId"),
    ("audio_id", "audioId"),
    ("narration", "audioId"),
    ("captionFile", "captionId"),
    ("caption_file", "captionId"),
    ("caption_id", "captionId"),
    ("image_url", "imageUrl"),
    ("image", "imageUrl"),
    ("knowledge_check", "knowledgeCheck"),
    ("start_button_text", "startButtonText"),
    ("pass_mark", "passMark"),
];

const KNOWLEDGE_CHECK: &[(&str, &str)] = &[("is_enabled", "enabled"), ("isEnabled", "enabled")];

const QUESTION: &[(&str, &str)] = &[
    ("type", "kind"),
    ("questionType", "kind"),
    ("question_type", "kind"),
    ("text", "prompt"),
    ("question", "prompt"),
    ("choices", "options"),
    ("answers", "options"),
    ("correct_answer", "correctAnswer"),
    ("answer", "correctAnswer"),
    ("correct_feedback", "correctFeedback"),
    ("incorrect_feedback", "incorrectFeedback"),
];

const MEDIA: &[(&str, &str)] = &[
    ("type", "kind"),
    ("media_type", "kind"),
    ("mediaType", "kind"),
    ("embed_url", "embedUrl"),
    ("storage_id", "storageId"),
    ("is_youtube", "isYoutube"),
    ("src", "url"),
    ("fileName", "url"),
    ("file_name", "url"),
];

fn table(scope: Scope) -> &'static [(&'static str, &'static str)] {
    match scope {
        Scope::Course => COURSE,
        Scope::Page => PAGE,
        Scope::KnowledgeCheck => KNOWLEDGE_CHECK,
        Scope::Question => QUESTION,
        Scope::Media => MEDIA,
    }
}

/// Rewrite `object`'s keys to their canonical names.
///
/// A canonical key already present always wins over a legacy spelling; among
/// legacy spellings the first in the table wins. Keys not in the table pass
/// through unchanged.
pub(crate) fn reconcile(object: &Map<String, Value>, scope: Scope) -> Map<String, Value> {
    let aliases = table(scope);
    let is_alias = |key: &str| aliases.iter().any(|(legacy, _)| *legacy == key);

    let mut out: Map<String, Value> = object
        .iter()
        .filter(|(k, _)| !is_alias(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    for (legacy, canonical) in aliases {
        if let Some(value) = object.get(*legacy)
            && !out.contains_key(*canonical)
        {
            out.insert((*canonical).to_string(), value.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn reconciled(value: Value, scope: Scope) -> Value {
        Value::Object(reconcile(value.as_object().unwrap(), scope))
    }

    #[test]
    fn test_legacy_keys_renamed() {
        let out = reconciled(
            json!({"objectivesPage": {}, "course_title": "T"}),
            Scope::Course,
        );
        assert_eq!(out, json!({"learningObjectivesPage": {}, "title": "T"}));
    }

    #[test]
    fn test_canonical_key_wins() {
        let out = reconciled(
            json!({"type": "true-false", "kind": "multiple-choice"}),
            Scope::Question,
        );
        assert_eq!(out, json!({"kind": "multiple-choice"}));
    }

    #[test]
    fn test_first_legacy_spelling_wins() {
        let out = reconciled(
            json!({"audio_file": "b.mp3", "audioFile": "a.mp3"}),
            Scope::Page,
        );
        assert_eq!(out, json!({"audioId": "a.mp3"}));
    }

    #[test]
    fn test_unknown_keys_pass_through() {
        let out = reconciled(json!({"custom": 1}), Scope::Media);
        assert_eq!(out, json!({"custom": 1}));
    }
}

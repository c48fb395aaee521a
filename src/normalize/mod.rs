//! Content normalization.
//!
//! Turns a course document of any historical shape into one canonical
//! [`CourseContent`]. Keys are reconciled once per object (see `reconcile`),
//! page ids are assigned deterministically, questions are canonicalized and
//! author markup is sanitized. Every structural problem is collected; the
//! result is either a complete model or [`Error::Validation`] listing them all.

mod raw;
mod reconcile;
mod sanitize;

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use tracing::debug;

use raw::{RawMedia, RawPage, RawQuestion, decode, non_empty, scalar_text};
use reconcile::{Scope, reconcile};
pub use sanitize::{Sanitized, html_or_text, markup_or_text, sanitize, sanitize_html, text_to_html};

use crate::error::{Error, Result, ValidationErrors};
use crate::media::{is_external, logical_media_id};
use crate::model::{
    CourseContent, KnowledgeCheck, MediaKind, MediaRef, Page, PageId, PageKind, Question,
    QuestionKind, SafeHtml,
};
use crate::util::escape_text;

const DEFAULT_START_LABEL: &str = "Start Course";

/// Normalize a parsed course document.
pub fn normalize(raw: &Value) -> Result<CourseContent> {
    let mut errors = ValidationErrors::default();
    let Some(course) = course_object(raw) else {
        errors.push("$", None, "course content must be a JSON object");
        return Err(Error::Validation(errors));
    };

    let content = build_course(&course, &mut errors);
    errors.into_result()?;

    debug!(
        title = %content.title,
        pages = content.pages.len(),
        pass_mark = content.pass_mark,
        "normalized course"
    );
    Ok(content)
}

/// Normalize a course document from raw JSON bytes.
pub fn normalize_bytes(bytes: &[u8]) -> Result<CourseContent> {
    let text = crate::util::decode_text(bytes);
    let value: Value = serde_json::from_str(&text)?;
    normalize(&value)
}

/// The reconciled course object, unwrapping a `courseContent` envelope when
/// present. Envelope-level title, description and pass mark fill gaps.
fn course_object(raw: &Value) -> Option<Map<String, Value>> {
    let root = raw.as_object()?;
    let outer = reconcile(root, Scope::Course);

    let Some(inner) = ["courseContent", "course_content"]
        .iter()
        .find_map(|key| root.get(*key)?.as_object())
    else {
        return Some(outer);
    };

    let mut course = reconcile(inner, Scope::Course);
    for key in ["title", "description", "passMark"] {
        if !course.contains_key(key)
            && let Some(value) = outer.get(key)
        {
            course.insert(key.to_string(), value.clone());
        }
    }
    Some(course)
}

fn build_course(course: &Map<String, Value>, errors: &mut ValidationErrors) -> CourseContent {
    let title = match course.get("title").and_then(scalar_text) {
        Some(title) if !title.is_empty() => title,
        _ => {
            errors.push("title", None, "missing course title");
            String::new()
        }
    };
    let description = course
        .get("description")
        .and_then(Value::as_str)
        .and_then(|d| non_empty(Some(d)));

    let mut pages = Vec::new();

    let welcome = present(course.get("welcomePage"));
    pages.push(build_welcome(welcome, errors));

    if let Some(value) = present(course.get("learningObjectivesPage")) {
        pages.extend(build_objectives(value, errors));
    }

    pages.extend(build_topics(course.get("topics"), errors));

    let assessment = present(course.get("assessment"));
    let mut assessment_pass_mark = None;
    if let Some(value) = assessment {
        if let Some((page, pass_mark)) = build_assessment(value, errors) {
            pages.push(page);
            assessment_pass_mark = pass_mark;
        }
    }

    let pass_mark = match present(course.get("passMark")) {
        Some(value) => parse_pass_mark(value, "passMark", errors),
        None => assessment_pass_mark
            .and_then(|value| parse_pass_mark(&value, "assessment.passMark", errors)),
    }
    .unwrap_or(CourseContent::DEFAULT_PASS_MARK);

    CourseContent {
        title,
        description,
        pass_mark,
        pages,
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

fn parse_pass_mark(value: &Value, path: &str, errors: &mut ValidationErrors) -> Option<u8> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if (0.0..=100.0).contains(&n) => Some(n.round() as u8),
        Some(n) => {
            errors.push(path, None, format!("pass mark {n} is outside 0-100"));
            None
        }
        None => {
            errors.push(path, None, format!("pass mark must be a number, got {value}"));
            None
        }
    }
}

// ============================================================================
// Pages
// ============================================================================

/// Reconcile and decode one page object.
fn page_fields(
    value: &Value,
    path: &str,
    page: Option<&str>,
    errors: &mut ValidationErrors,
) -> Option<RawPage> {
    let Some(object) = value.as_object() else {
        errors.push(path, page, "expected an object");
        return None;
    };
    decode(reconcile(object, Scope::Page), path, page, errors)
}

fn build_welcome(value: Option<&Value>, errors: &mut ValidationErrors) -> Page {
    let id = PageId::welcome();
    let raw = value
        .and_then(|v| page_fields(v, "welcomePage", Some(PageId::WELCOME), errors))
        .unwrap_or_default();

    let mut page = Page::new(id, PageKind::Welcome, title_or(&raw, "Welcome"));
    set_body(&mut page, &raw);
    page.start_label = Some(
        non_empty(raw.start_button_text.as_deref())
            .unwrap_or_else(|| DEFAULT_START_LABEL.to_string()),
    );
    page.media = page_media(&raw, "welcomePage", &page.id, errors);
    page.knowledge_check = knowledge_check(&raw, "welcomePage", &page.id, errors);
    page
}

fn build_objectives(value: &Value, errors: &mut ValidationErrors) -> Option<Page> {
    let path = "learningObjectivesPage";
    let id = PageId::objectives();
    let raw = match value {
        // Some documents store the bare list.
        Value::Array(items) => RawPage {
            objectives: Some(items.clone()),
            ..RawPage::default()
        },
        _ => page_fields(value, path, Some(PageId::OBJECTIVES), errors)?,
    };

    let objectives: Vec<String> = raw
        .objectives
        .iter()
        .flatten()
        .filter_map(scalar_text)
        .filter(|s| !s.is_empty())
        .collect();

    let mut page = Page::new(id, PageKind::Objectives, title_or(&raw, "Learning Objectives"));
    set_body(&mut page, &raw);
    if !objectives.is_empty() {
        let mut html = page.body.as_str().to_string();
        if !html.is_empty() {
            html.push('\n');
        }
        html.push_str("<ul class=\"objectives-list\">");
        for objective in &objectives {
            html.push_str("<li>");
            html.push_str(&escape_text(objective));
            html.push_str("</li>");
        }
        html.push_str("</ul>");
        page.body = SafeHtml::from_sanitized(html);
    }
    page.media = page_media(&raw, path, &page.id, errors);
    page.knowledge_check = knowledge_check(&raw, path, &page.id, errors);
    Some(page)
}

fn build_topics(value: Option<&Value>, errors: &mut ValidationErrors) -> Vec<Page> {
    let items = match value {
        Some(Value::Array(items)) if !items.is_empty() => items,
        Some(Value::Array(_)) | Some(Value::Null) | None => {
            errors.push("topics", None, "at least one topic is required");
            return Vec::new();
        }
        Some(_) => {
            errors.push("topics", None, "topics must be an array");
            return Vec::new();
        }
    };

    let raw_topics: Vec<Option<RawPage>> = items
        .iter()
        .enumerate()
        .map(|(index, item)| page_fields(item, &format!("topics[{index}]"), None, errors))
        .collect();

    let explicit: Vec<Option<String>> = raw_topics
        .iter()
        .map(|raw| raw.as_ref()?.id.as_ref().and_then(scalar_text))
        .collect();
    let ids = assign_topic_ids(&explicit);

    raw_topics
        .into_iter()
        .zip(ids)
        .enumerate()
        .filter_map(|(index, (raw, id))| {
            let raw = raw?;
            let path = format!("topics[{index}]");
            let title = match non_empty(raw.title.as_deref()) {
                Some(title) => title,
                None => {
                    errors.push(format!("{path}.title"), Some(id.as_str()), "missing topic title");
                    String::new()
                }
            };
            let mut page = Page::new(id, PageKind::Topic, title);
            set_body(&mut page, &raw);
            page.media = page_media(&raw, &path, &page.id, errors);
            page.knowledge_check = knowledge_check(&raw, &path, &page.id, errors);
            Some(page)
        })
        .collect()
}

/// Assign topic ids.
///
/// Explicit ids are slugified and claimed first, in document order, when
/// non-empty, unique and not one of the fixed page ids. Every other topic
/// gets `topic-<index>`, or `topic-<index>-<n>` if an explicit id took it.
pub fn assign_topic_ids(explicit: &[Option<String>]) -> Vec<PageId> {
    let reserved = [PageId::WELCOME, PageId::OBJECTIVES, PageId::ASSESSMENT];
    let mut taken = BTreeSet::new();

    let mut ids: Vec<Option<String>> = explicit
        .iter()
        .map(|raw| {
            let slug = slugify_id(raw.as_deref()?);
            let usable = !slug.is_empty() && !reserved.contains(&slug.as_str());
            (usable && taken.insert(slug.clone())).then_some(slug)
        })
        .collect();

    for (index, id) in ids.iter_mut().enumerate() {
        if id.is_some() {
            continue;
        }
        let mut candidate = format!("topic-{index}");
        let mut n = 2;
        while taken.contains(&candidate) {
            candidate = format!("topic-{index}-{n}");
            n += 1;
        }
        taken.insert(candidate.clone());
        *id = Some(candidate);
    }

    ids.into_iter().flatten().map(PageId::new).collect()
}

fn slugify_id(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

fn build_assessment(value: &Value, errors: &mut ValidationErrors) -> Option<(Page, Option<Value>)> {
    let path = "assessment";
    let id = PageId::assessment();
    let raw = match value {
        Value::Array(items) => RawPage {
            questions: Some(items.clone()),
            ..RawPage::default()
        },
        _ => page_fields(value, path, Some(PageId::ASSESSMENT), errors)?,
    };

    let items = raw.questions.clone().unwrap_or_default();
    let questions: Vec<Question> = items
        .iter()
        .enumerate()
        .filter_map(|(i, q)| {
            normalize_question(q, &format!("{path}.questions[{i}]"), id.as_str(), errors)
        })
        .collect();
    if items.is_empty() {
        errors.push(format!("{path}.questions"), Some(id.as_str()), "assessment has no questions");
    }

    let mut page = Page::new(id, PageKind::Assessment, title_or(&raw, "Assessment"));
    set_body(&mut page, &raw);
    page.media = page_media(&raw, path, &page.id, errors);
    page.knowledge_check = Some(KnowledgeCheck { questions });
    Some((page, raw.pass_mark))
}

fn title_or(raw: &RawPage, default: &str) -> String {
    non_empty(raw.title.as_deref()).unwrap_or_else(|| default.to_string())
}

fn set_body(page: &mut Page, raw: &RawPage) {
    let Some(content) = raw.content.as_deref() else {
        return;
    };
    let sanitized = markup_or_text(content);
    for reference in &sanitized.dropped {
        tracing::debug!(page = %page.id, reference = %reference, "removed local reference");
    }
    page.body = sanitized.html;
    page.dropped_references = sanitized.dropped;
}

// ============================================================================
// Media
// ============================================================================

/// Declared media of a page: the named narration, caption and image slots
/// followed by the media list, deduplicated by `(id, kind)`.
fn page_media(
    raw: &RawPage,
    path: &str,
    page: &PageId,
    errors: &mut ValidationErrors,
) -> Vec<MediaRef> {
    let mut refs = Vec::new();
    let slots = [
        (raw.audio_id.as_deref(), MediaKind::Audio),
        (raw.caption_id.as_deref(), MediaKind::Caption),
        (raw.image_url.as_deref(), MediaKind::Image),
    ];
    for (name, kind) in slots {
        if let Some(name) = non_empty(name) {
            refs.push(media_from_name(&name, kind));
        }
    }

    for (i, item) in raw.media.iter().flatten().enumerate() {
        let item_path = format!("{path}.media[{i}]");
        if let Some(media) = media_item(item, &item_path, page.as_str(), errors) {
            refs.push(media);
        }
    }

    let mut seen = BTreeSet::new();
    refs.retain(|m| seen.insert(m.key()));
    for media in &mut refs {
        media.page_id = Some(page.clone());
    }
    refs
}

/// A reference spelled as a file name, store id or URL.
fn media_from_name(name: &str, kind: MediaKind) -> MediaRef {
    if is_external(name) || name.starts_with("data:") {
        MediaRef::new(external_id(name), kind)
            .with_embed_url(name)
            .with_source(name)
    } else {
        MediaRef::new(logical_media_id(name), kind).with_source(name)
    }
}

/// Stable id for an externally hosted item.
fn external_id(url: &str) -> String {
    let digest = sha1_smol::Sha1::from(url.as_bytes()).digest().to_string();
    format!("external-{}", &digest[..12])
}

fn media_item(
    value: &Value,
    path: &str,
    page: &str,
    errors: &mut ValidationErrors,
) -> Option<MediaRef> {
    let Some(object) = value.as_object() else {
        errors.push(path, Some(page), "expected an object");
        return None;
    };
    let raw: RawMedia = decode(reconcile(object, Scope::Media), path, Some(page), errors)?;
    let youtube = raw.is_youtube.unwrap_or(false);

    let kind = match raw.kind.as_deref().map(str::parse::<MediaKind>) {
        Some(Ok(kind)) => kind,
        Some(Err(message)) => {
            errors.push(format!("{path}.kind"), Some(page), message);
            return None;
        }
        None if youtube => MediaKind::Video,
        None => {
            errors.push(format!("{path}.kind"), Some(page), "missing media type");
            return None;
        }
    };

    let id = non_empty(raw.storage_id.as_deref())
        .or_else(|| raw.id.as_ref().and_then(scalar_text).filter(|s| !s.is_empty()));
    let url = non_empty(raw.url.as_deref());
    let embed = non_empty(raw.embed_url.as_deref()).or_else(|| url.clone().filter(|_| youtube));

    let media = if let Some(embed) = embed {
        let id = id
            .as_deref()
            .map(logical_media_id)
            .unwrap_or_else(|| external_id(&embed));
        MediaRef::new(id, kind).with_embed_url(embed)
    } else if let Some(id) = id {
        let source = url.unwrap_or_else(|| id.clone());
        MediaRef::new(logical_media_id(&id), kind).with_source(source)
    } else if let Some(url) = url {
        media_from_name(&url, kind)
    } else {
        errors.push(path, Some(page), "media item has neither an id nor a url");
        return None;
    };

    Some(match non_empty(raw.title.as_deref()) {
        Some(title) => media.with_title(title),
        None => media,
    })
}

// ============================================================================
// Questions
// ============================================================================

/// Keys that mark an object as a single question rather than a wrapper.
const QUESTION_KEYS: &[&str] = &[
    "kind",
    "type",
    "questionType",
    "question_type",
    "prompt",
    "question",
    "text",
];

fn knowledge_check(
    raw: &RawPage,
    path: &str,
    page: &PageId,
    errors: &mut ValidationErrors,
) -> Option<KnowledgeCheck> {
    let path = format!("{path}.knowledgeCheck");
    let items: Vec<Value> = match raw.knowledge_check.as_ref()? {
        Value::Null => return None,
        Value::Array(items) => items.clone(),
        Value::Object(object) => {
            let check = reconcile(object, Scope::KnowledgeCheck);
            if check.get("enabled").and_then(Value::as_bool) == Some(false) {
                return None;
            }
            match check.get("questions") {
                Some(Value::Array(items)) => items.clone(),
                Some(_) => {
                    errors.push(format!("{path}.questions"), Some(page.as_str()), "questions must be an array");
                    return None;
                }
                None if QUESTION_KEYS.iter().any(|k| object.contains_key(*k)) => {
                    vec![Value::Object(object.clone())]
                }
                None => return None,
            }
        }
        _ => {
            errors.push(&path, Some(page.as_str()), "expected an object or array");
            return None;
        }
    };

    let questions: Vec<Question> = items
        .iter()
        .enumerate()
        .filter_map(|(i, q)| {
            normalize_question(q, &format!("{path}.questions[{i}]"), page.as_str(), errors)
        })
        .collect();

    (!questions.is_empty()).then_some(KnowledgeCheck { questions })
}

/// Canonicalize one question, recording every problem found.
pub(crate) fn normalize_question(
    value: &Value,
    path: &str,
    page: &str,
    errors: &mut ValidationErrors,
) -> Option<Question> {
    let Some(object) = value.as_object() else {
        errors.push(path, Some(page), "expected an object");
        return None;
    };
    let raw: RawQuestion = decode(reconcile(object, Scope::Question), path, Some(page), errors)?;

    let kind = match raw.kind.as_deref().map(str::parse::<QuestionKind>) {
        Some(Ok(kind)) => Some(kind),
        Some(Err(message)) => {
            errors.push(format!("{path}.kind"), Some(page), message);
            None
        }
        None => {
            errors.push(format!("{path}.kind"), Some(page), "missing question kind");
            None
        }
    };
    let prompt = non_empty(raw.prompt.as_deref());
    if prompt.is_none() {
        errors.push(format!("{path}.prompt"), Some(page), "missing question prompt");
    }
    let (kind, prompt) = (kind?, prompt?);

    let options: Vec<String> = raw
        .options
        .iter()
        .flatten()
        .filter_map(scalar_text)
        .collect();
    let answer = raw.correct_answer.as_ref().filter(|v| !v.is_null());
    let answer_path = format!("{path}.correctAnswer");

    let (options, correct_answer) = match kind {
        QuestionKind::MultipleChoice => {
            let options: Vec<String> = options.into_iter().filter(|o| !o.is_empty()).collect();
            if options.len() < 2 {
                errors.push(
                    format!("{path}.options"),
                    Some(page),
                    "multiple-choice questions need at least two options",
                );
                return None;
            }
            match choice_answer(&options, answer) {
                Ok(correct) => (options, correct),
                Err(message) => {
                    errors.push(answer_path, Some(page), message);
                    return None;
                }
            }
        }
        QuestionKind::TrueFalse => match true_false_answer(answer, &options) {
            Some(value) => {
                let canonical = Question::true_false(String::new(), value);
                (canonical.options, canonical.correct_answer)
            }
            None => {
                let shown = answer.map(Value::to_string).unwrap_or_else(|| "nothing".into());
                errors.push(
                    answer_path,
                    Some(page),
                    format!("cannot read a true/false answer from {shown}"),
                );
                return None;
            }
        },
        QuestionKind::FillInTheBlank => match answer.and_then(scalar_text).filter(|a| !a.is_empty()) {
            Some(correct) => (Vec::new(), correct),
            None => {
                errors.push(answer_path, Some(page), "fill-in-the-blank answer is empty");
                return None;
            }
        },
    };

    Some(Question {
        kind,
        prompt,
        options,
        correct_answer,
        explanation: non_empty(raw.explanation.as_deref()),
        correct_feedback: non_empty(raw.correct_feedback.as_deref()),
        incorrect_feedback: non_empty(raw.incorrect_feedback.as_deref()),
    })
}

/// The option a multiple-choice answer names: exact text, then
/// case-insensitive text, then a 0-based index.
fn choice_answer(options: &[String], answer: Option<&Value>) -> std::result::Result<String, String> {
    let Some(answer) = answer else {
        return Err("missing correct answer".to_string());
    };
    if let Value::Number(n) = answer {
        return n
            .as_u64()
            .and_then(|i| options.get(i as usize))
            .cloned()
            .ok_or_else(|| format!("answer index {n} is out of range"));
    }
    let Some(text) = scalar_text(answer) else {
        return Err(format!("unsupported answer {answer}"));
    };
    options
        .iter()
        .find(|o| **o == text)
        .or_else(|| options.iter().find(|o| o.eq_ignore_ascii_case(&text)))
        .or_else(|| text.parse::<usize>().ok().and_then(|i| options.get(i)))
        .cloned()
        .ok_or_else(|| format!("correct answer '{text}' is not among the options"))
}

/// Read a true/false answer from a boolean, a word (true/false/yes/no/t/f/
/// y/n, any case) or an index into the source options.
pub fn true_false_answer(answer: Option<&Value>, source_options: &[String]) -> Option<bool> {
    match answer? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => option_meaning(usize::try_from(n.as_u64()?).ok()?, source_options),
        Value::String(s) => {
            let s = s.trim();
            bool_word(s)
                .or_else(|| option_meaning(s.parse().ok()?, source_options))
                .or_else(|| {
                    // Answer spelled as the text of one of the source options.
                    let index = source_options
                        .iter()
                        .position(|o| o.trim().eq_ignore_ascii_case(s))?;
                    option_meaning(index, source_options)
                })
        }
        _ => None,
    }
}

fn bool_word(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" => Some(true),
        "false" | "f" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Meaning of the option at `index`: its text when that reads as a boolean,
/// otherwise its position in the canonical order (0 true, 1 false).
fn option_meaning(index: usize, source_options: &[String]) -> Option<bool> {
    let positional = match index {
        0 => Some(true),
        1 => Some(false),
        _ => None,
    };
    match source_options.get(index) {
        Some(text) => bool_word(text.trim()).or(positional),
        None if source_options.is_empty() => positional,
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn minimal() -> Value {
        json!({
            "title": "Safety",
            "topics": [{"title": "Ladders", "content": "<p>Climb carefully</p>"}]
        })
    }

    #[test]
    fn test_minimal_course() {
        let content = normalize(&minimal()).unwrap();
        let ids: Vec<_> = content.pages.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["welcome", "topic-0"]);
        assert_eq!(content.pass_mark, 80);
        assert_eq!(content.pages[0].start_label.as_deref(), Some("Start Course"));
    }

    #[test]
    fn test_every_problem_reported() {
        let err = normalize(&json!({
            "topics": [],
            "passMark": 140,
        }))
        .unwrap_err();
        let Error::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let paths: Vec<_> = errors.iter().map(|e| e.path.as_str()).collect();
        assert!(paths.contains(&"title"));
        assert!(paths.contains(&"topics"));
        assert!(paths.contains(&"passMark"));
    }

    #[test]
    fn test_topic_ids_explicit_claimed_first() {
        let ids = assign_topic_ids(&[
            None,
            Some("topic-0".into()),
            Some("Fire Safety".into()),
            Some("fire-safety".into()),
            Some("welcome".into()),
        ]);
        let ids: Vec<_> = ids.iter().map(PageId::as_str).collect();
        assert_eq!(
            ids,
            vec!["topic-0-2", "topic-0", "fire-safety", "topic-3", "topic-4"]
        );
    }

    #[test]
    fn test_true_false_forms() {
        let none: Vec<String> = Vec::new();
        assert_eq!(true_false_answer(Some(&json!(true)), &none), Some(true));
        assert_eq!(true_false_answer(Some(&json!("FALSE")), &none), Some(false));
        assert_eq!(true_false_answer(Some(&json!("yes")), &none), Some(true));
        assert_eq!(true_false_answer(Some(&json!(1)), &none), Some(false));
        let reversed = vec!["False".to_string(), "True".to_string()];
        assert_eq!(true_false_answer(Some(&json!(0)), &reversed), Some(false));
        assert_eq!(true_false_answer(Some(&json!("maybe")), &none), None);
    }

    #[test]
    fn test_true_false_canonicalized() {
        let mut errors = ValidationErrors::default();
        let q = normalize_question(
            &json!({"type": "true-false", "question": "Sky is blue", "options": ["yes", "no"], "correct_answer": "Yes"}),
            "q",
            "topic-0",
            &mut errors,
        )
        .unwrap();
        assert_eq!(q.options, vec!["True", "False"]);
        assert_eq!(q.correct_answer, "True");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_choice_answer_matching() {
        let options = vec!["Red".to_string(), "Blue".to_string()];
        assert_eq!(choice_answer(&options, Some(&json!("blue"))), Ok("Blue".to_string()));
        assert_eq!(choice_answer(&options, Some(&json!(0))), Ok("Red".to_string()));
        assert!(choice_answer(&options, Some(&json!("Green"))).is_err());
    }

    #[test]
    fn test_disabled_knowledge_check_dropped() {
        let content = normalize(&json!({
            "title": "T",
            "topics": [{
                "title": "A",
                "knowledgeCheck": {"enabled": false, "questions": [
                    {"type": "fill-in-the-blank", "text": "2+2", "correctAnswer": "4"}
                ]}
            }]
        }))
        .unwrap();
        assert!(content.pages[1].knowledge_check.is_none());
    }

    #[test]
    fn test_single_question_knowledge_check() {
        let content = normalize(&json!({
            "title": "T",
            "topics": [{
                "title": "A",
                "knowledge_check": {"type": "multiple-choice", "question": "Pick", "options": ["a", "b"], "correctAnswer": "b"}
            }]
        }))
        .unwrap();
        let check = content.pages[1].knowledge_check.as_ref().unwrap();
        assert_eq!(check.questions.len(), 1);
        assert_eq!(check.questions[0].correct_answer, "b");
    }

    #[test]
    fn test_objectives_rendered_as_list() {
        let content = normalize(&json!({
            "title": "T",
            "objectivesPage": {"objectives": ["Know <tools>", "Stay safe"]},
            "topics": [{"title": "A"}]
        }))
        .unwrap();
        let objectives = content.page("learning-objectives").unwrap();
        assert_eq!(
            objectives.body.as_str(),
            "<ul class=\"objectives-list\"><li>Know &lt;tools&gt;</li><li>Stay safe</li></ul>"
        );
    }

    #[test]
    fn test_media_slots_and_external_urls() {
        let content = normalize(&json!({
            "title": "T",
            "topics": [{
                "title": "A",
                "audioFile": "media/audio-2.mp3",
                "image_url": "https://example.com/a.png",
                "media": [{"id": "video-1", "type": "video", "url": "https://youtu.be/x", "isYoutube": true}]
            }]
        }))
        .unwrap();
        let media = &content.pages[1].media;
        assert_eq!(media[0].id, "audio-2");
        assert_eq!(media[0].source.as_deref(), Some("media/audio-2.mp3"));
        assert!(media[1].embed_url.is_some());
        assert!(media[1].id.starts_with("external-"));
        assert_eq!(media[2].embed_url.as_deref(), Some("https://youtu.be/x"));
        assert!(media.iter().all(|m| m.page_id == Some(PageId::topic(0))));
    }

    #[test]
    fn test_unknown_media_kind_rejected() {
        let err = normalize(&json!({
            "title": "T",
            "topics": [{"title": "A", "media": [{"id": "x", "type": "hologram"}]}]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("topics[0].media[0].kind"));
    }

    #[test]
    fn test_envelope_unwrapped() {
        let content = normalize(&json!({
            "courseTitle": "Outer",
            "courseContent": {"topics": [{"title": "A"}], "assessment": {"questions": [
                {"type": "true-false", "question": "Q", "correctAnswer": true}
            ], "passMark": 70}}
        }))
        .unwrap();
        assert_eq!(content.title, "Outer");
        assert_eq!(content.pass_mark, 70);
        assert_eq!(content.pages.last().unwrap().id.as_str(), "assessment");
    }
}

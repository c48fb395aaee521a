//! Navigation state machine.
//!
//! [`NavigationGraph`] is the page sequence with its gates. The delivered
//! `navigation.js` runs the machine in the browser from the graph embedded by
//! [`emit_navigation_script`]; [`NavigationSession`] implements the same
//! transitions natively so the rules can be exercised from Rust.

mod session;

use std::collections::BTreeMap;

use serde::Serialize;

pub use session::{Blocked, NavState, NavigationSession};

use crate::config::NavigationMode;
use crate::error::Result;
use crate::model::{CourseContent, PageId, PageKind, Question};

const ENGINE: &str = include_str!("engine.js");
const DATA_PLACEHOLDER: &str = "/*@COURSE_DATA@*/null";

/// Key recording that a question has been answered: `pageId:questionIndex`.
pub fn question_key(page: &PageId, index: usize) -> String {
    format!("{page}:{index}")
}

/// One state of the machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationNode {
    pub page_id: PageId,
    pub title: String,
    pub document: String,
    /// Forward navigation is refused until the gate is satisfied.
    pub gating: bool,
    /// Question keys that must be answered to satisfy the gate.
    pub required_keys: Vec<String>,
    /// The gate also needs an assessment score at or above the pass mark.
    pub requires_pass: bool,
}

/// Page sequence plus the data the delivered script needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationGraph {
    pub pages: Vec<NavigationNode>,
    /// Page id → its questions, in order.
    pub questions: BTreeMap<String, Vec<Question>>,
    pub pass_mark: u8,
    pub navigation_mode: NavigationMode,
    /// A failed assessment may be submitted again.
    pub allow_retake: bool,
}

impl NavigationGraph {
    pub fn from_content(content: &CourseContent, pass_mark: u8) -> Self {
        let mut questions = BTreeMap::new();
        let pages = content
            .pages
            .iter()
            .map(|page| {
                let page_questions = page
                    .knowledge_check
                    .as_ref()
                    .map(|kc| kc.questions.as_slice())
                    .unwrap_or_default();
                if !page_questions.is_empty() {
                    questions.insert(page.id.to_string(), page_questions.to_vec());
                }
                NavigationNode {
                    page_id: page.id.clone(),
                    title: page.title.clone(),
                    document: page.id.document_path(),
                    gating: page.is_gating(),
                    required_keys: (0..page_questions.len())
                        .map(|i| question_key(&page.id, i))
                        .collect(),
                    requires_pass: page.kind == PageKind::Assessment && page.is_gating(),
                }
            })
            .collect();

        Self {
            pages,
            questions,
            pass_mark: pass_mark.min(100),
            navigation_mode: NavigationMode::default(),
            allow_retake: true,
        }
    }

    pub fn with_navigation_mode(mut self, mode: NavigationMode) -> Self {
        self.navigation_mode = mode;
        self
    }

    pub fn with_allow_retake(mut self, allow: bool) -> Self {
        self.allow_retake = allow;
        self
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn node(&self, index: usize) -> Option<&NavigationNode> {
        self.pages.get(index)
    }

    pub fn index_of(&self, page: &str) -> Option<usize> {
        self.pages.iter().position(|n| n.page_id.as_str() == page)
    }

    /// Indices of the gating pages, in order.
    pub fn gates(&self) -> impl Iterator<Item = usize> + '_ {
        self.pages
            .iter()
            .enumerate()
            .filter(|(_, n)| n.gating)
            .map(|(i, _)| i)
    }
}

/// The navigation script with `graph` embedded.
pub fn emit_navigation_script(graph: &NavigationGraph) -> Result<String> {
    // No `</script>` inside the embedded data.
    let data = serde_json::to_string(graph)?.replace("</", "<\\/");
    let script = ENGINE.replacen(DATA_PLACEHOLDER, &data, 1);
    tracing::debug!(
        pages = graph.len(),
        gates = graph.gates().count(),
        bytes = script.len(),
        "emitted navigation script"
    );
    Ok(script)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{KnowledgeCheck, Page};

    fn content() -> CourseContent {
        let mut topic = Page::new(PageId::topic(0), PageKind::Topic, "One");
        topic.knowledge_check = Some(KnowledgeCheck {
            questions: vec![
                Question::true_false("A", true),
                Question::true_false("B", false),
            ],
        });
        let mut assessment = Page::new(PageId::assessment(), PageKind::Assessment, "Quiz");
        assessment.knowledge_check = Some(KnowledgeCheck {
            questions: vec![Question::true_false("C", true)],
        });
        CourseContent {
            title: "T".into(),
            description: None,
            pass_mark: 80,
            pages: vec![
                Page::new(PageId::welcome(), PageKind::Welcome, "Welcome"),
                topic,
                Page::new(PageId::topic(1), PageKind::Topic, "Two"),
                assessment,
            ],
        }
    }

    #[test]
    fn test_question_key() {
        assert_eq!(question_key(&PageId::topic(2), 1), "topic-2:1");
    }

    #[test]
    fn test_graph_marks_gates() {
        let graph = NavigationGraph::from_content(&content(), 70);
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.gates().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(graph.pages[1].required_keys, vec!["topic-0:0", "topic-0:1"]);
        assert!(!graph.pages[1].requires_pass);
        assert!(graph.pages[3].requires_pass);
        assert_eq!(graph.index_of("topic-1"), Some(2));
        assert_eq!(graph.questions.len(), 2);
    }

    #[test]
    fn test_script_embeds_graph() {
        let graph = NavigationGraph::from_content(&content(), 70);
        let script = emit_navigation_script(&graph).unwrap();
        assert!(!script.contains(DATA_PLACEHOLDER));
        assert!(script.contains("\"passMark\":70"));
        assert!(script.contains("\"navigationMode\":\"linear\""));
        assert!(script.contains("\"allowRetake\":true"));
        assert!(script.contains("\"kind\":\"true-false\""));
        assert!(script.contains("\"requiredKeys\":[\"topic-0:0\",\"topic-0:1\"]"));
        for name in [
            "function updateNavigationState",
            "function shouldBlockNavigation",
            "function navigateToPage",
            "function checkMultipleChoice",
            "function checkFillInBlank",
            "function initializeNavigation",
            "shouldBlockNavigation()",
        ] {
            assert!(script.contains(name), "missing {name}");
        }
    }

    #[test]
    fn test_script_data_cannot_close_tag() {
        let mut course = content();
        course.pages[0].title = "</script>".into();
        let graph = NavigationGraph::from_content(&course, 80);
        let script = emit_navigation_script(&graph).unwrap();
        assert!(!script.contains("</script>"));
    }
}

//! Native reference implementation of the navigation rules.

use std::collections::BTreeSet;
use std::fmt;

use super::NavigationGraph;
use crate::config::NavigationMode;

/// Where the learner is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Page(usize),
    /// Terminal: completion has been reported.
    Complete,
}

/// Why a forward move was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Blocked {
    /// The gate at `page` still has unanswered questions.
    Unanswered { page: usize, remaining: Vec<String> },
    /// The assessment has not been passed.
    NotPassed { score: Option<u8>, pass_mark: u8 },
    /// Retakes are disabled and the one attempt has been used.
    AttemptUsed { score: u8 },
    /// Target index outside the course.
    OutOfRange(usize),
}

impl fmt::Display for Blocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Blocked::Unanswered { .. } => {
                f.write_str("Please answer all knowledge check questions before continuing.")
            }
            Blocked::NotPassed {
                score: Some(score),
                pass_mark,
            } => write!(
                f,
                "You scored {score}%. You need {pass_mark}% to pass. Please review and retake the assessment."
            ),
            Blocked::NotPassed { score: None, .. } => {
                f.write_str("Please submit the assessment before continuing.")
            }
            Blocked::AttemptUsed { score } => write!(
                f,
                "The assessment has already been submitted. Your score was {score}%."
            ),
            Blocked::OutOfRange(index) => write!(f, "There is no page {index}."),
        }
    }
}

/// One learner's pass through the course.
///
/// The answered set lives only as long as the session.
#[derive(Debug, Clone)]
pub struct NavigationSession<'a> {
    graph: &'a NavigationGraph,
    state: NavState,
    answered: BTreeSet<String>,
    score: Option<u8>,
    visited: BTreeSet<usize>,
}

impl<'a> NavigationSession<'a> {
    pub fn new(graph: &'a NavigationGraph) -> Self {
        let mut visited = BTreeSet::new();
        if !graph.is_empty() {
            visited.insert(0);
        }
        Self {
            graph,
            state: NavState::Page(0),
            answered: BTreeSet::new(),
            score: None,
            visited,
        }
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == NavState::Complete
    }

    pub fn score(&self) -> Option<u8> {
        self.score
    }

    pub fn has_visited(&self, index: usize) -> bool {
        self.visited.contains(&index)
    }

    /// Record an answered question. Answering again changes nothing.
    pub fn mark_answered(&mut self, key: impl Into<String>) {
        self.answered.insert(key.into());
    }

    pub fn is_answered(&self, key: &str) -> bool {
        self.answered.contains(key)
    }

    /// Record an assessment attempt; a retake replaces the previous score.
    ///
    /// Submitting answers every assessment question. With retakes disabled
    /// only the first attempt counts.
    pub fn submit_assessment(&mut self, correct: usize, total: usize) -> Result<u8, Blocked> {
        if !self.graph.allow_retake
            && let Some(score) = self.score
        {
            return Err(Blocked::AttemptUsed { score });
        }
        let score = if total == 0 {
            100
        } else {
            ((correct.min(total) * 100 + total / 2) / total) as u8
        };
        if let Some(node) = self.graph.pages.iter().find(|n| n.requires_pass) {
            self.answered.extend(node.required_keys.iter().cloned());
        }
        self.score = Some(score);
        tracing::debug!(score, pass_mark = self.graph.pass_mark, "assessment submitted");
        Ok(score)
    }

    /// Whether the gate at `index` lets the learner past.
    pub fn gate_check(&self, index: usize) -> Result<(), Blocked> {
        let Some(node) = self.graph.node(index) else {
            return Err(Blocked::OutOfRange(index));
        };
        if !node.gating {
            return Ok(());
        }
        let remaining: Vec<String> = node
            .required_keys
            .iter()
            .filter(|k| !self.answered.contains(*k))
            .cloned()
            .collect();
        if !remaining.is_empty() {
            return Err(Blocked::Unanswered {
                page: index,
                remaining,
            });
        }
        if node.requires_pass {
            // A failed single attempt still ends the course.
            let failed = self.score.is_none_or(|s| s < self.graph.pass_mark);
            if self.score.is_none() || (failed && self.graph.allow_retake) {
                return Err(Blocked::NotPassed {
                    score: self.score,
                    pass_mark: self.graph.pass_mark,
                });
            }
        }
        Ok(())
    }

    /// First page whose gate is not yet satisfied.
    pub fn first_blocked_gate(&self) -> Option<usize> {
        self.graph.gates().find(|&i| self.gate_check(i).is_err())
    }

    /// True when forward navigation from the current page would be refused.
    pub fn should_block(&self) -> bool {
        match self.state {
            NavState::Page(index) => self.gate_check(index).is_err(),
            NavState::Complete => true,
        }
    }

    /// Move forward. Leaving the last page completes the course once every
    /// gate is satisfied.
    pub fn advance(&mut self) -> Result<NavState, Blocked> {
        let NavState::Page(index) = self.state else {
            return Ok(self.state);
        };
        self.gate_check(index)?;
        self.state = if index + 1 >= self.graph.len() {
            if let Some(gate) = self.first_blocked_gate() {
                return Err(self.gate_check(gate).err().unwrap_or(Blocked::OutOfRange(gate)));
            }
            NavState::Complete
        } else {
            self.visited.insert(index + 1);
            NavState::Page(index + 1)
        };
        Ok(self.state)
    }

    /// Move back one page. No-op on the first page and once complete.
    pub fn back(&mut self) -> NavState {
        if let NavState::Page(index) = self.state
            && index > 0
        {
            self.visited.insert(index - 1);
            self.state = NavState::Page(index - 1);
        }
        self.state
    }

    /// Jump from the outline. In linear mode pages past the first
    /// unsatisfied gate are refused.
    pub fn jump(&mut self, target: usize) -> Result<NavState, Blocked> {
        if self.is_complete() {
            return Ok(self.state);
        }
        if target >= self.graph.len() {
            return Err(Blocked::OutOfRange(target));
        }
        if self.graph.navigation_mode == NavigationMode::Linear
            && let Some(gate) = self.first_blocked_gate()
            && target > gate
        {
            return Err(self
                .gate_check(gate)
                .err()
                .unwrap_or(Blocked::OutOfRange(target)));
        }
        self.visited.insert(target);
        self.state = NavState::Page(target);
        Ok(self.state)
    }

    /// Fraction of pages visited, as a percentage. Only completion reaches 100.
    pub fn progress(&self) -> u8 {
        if self.is_complete() || self.graph.is_empty() {
            return 100;
        }
        ((self.visited.len() * 100) / self.graph.len()).min(99) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CourseContent, KnowledgeCheck, Page, PageId, PageKind, Question};

    fn graph() -> NavigationGraph {
        let mut topic = Page::new(PageId::topic(0), PageKind::Topic, "One");
        topic.knowledge_check = Some(KnowledgeCheck {
            questions: vec![Question::true_false("A", true)],
        });
        let mut assessment = Page::new(PageId::assessment(), PageKind::Assessment, "Quiz");
        assessment.knowledge_check = Some(KnowledgeCheck {
            questions: vec![
                Question::true_false("B", true),
                Question::true_false("C", false),
            ],
        });
        let content = CourseContent {
            title: "T".into(),
            description: None,
            pass_mark: 80,
            pages: vec![
                Page::new(PageId::welcome(), PageKind::Welcome, "Welcome"),
                topic,
                Page::new(PageId::topic(1), PageKind::Topic, "Two"),
                assessment,
            ],
        };
        NavigationGraph::from_content(&content, 80)
    }

    #[test]
    fn test_gate_blocks_until_answered() {
        let graph = graph();
        let mut session = NavigationSession::new(&graph);
        assert_eq!(session.advance(), Ok(NavState::Page(1)));
        assert!(session.should_block());
        assert!(matches!(session.advance(), Err(Blocked::Unanswered { page: 1, .. })));
        assert_eq!(session.state(), NavState::Page(1));

        session.mark_answered("topic-0:0");
        assert!(!session.should_block());
        assert_eq!(session.advance(), Ok(NavState::Page(2)));
    }

    #[test]
    fn test_back_always_allowed() {
        let graph = graph();
        let mut session = NavigationSession::new(&graph);
        assert_eq!(session.back(), NavState::Page(0));
        session.advance().unwrap();
        assert_eq!(session.back(), NavState::Page(0));
    }

    #[test]
    fn test_jump_stops_at_first_blocked_gate() {
        let graph = graph();
        let mut session = NavigationSession::new(&graph);
        assert_eq!(session.jump(1), Ok(NavState::Page(1)));
        assert!(session.jump(2).is_err());
        session.mark_answered("topic-0:0");
        assert_eq!(session.jump(3), Ok(NavState::Page(3)));
        assert_eq!(session.jump(9), Err(Blocked::OutOfRange(9)));
    }

    #[test]
    fn test_assessment_requires_pass_and_allows_retake() {
        let graph = graph();
        let mut session = NavigationSession::new(&graph);
        session.mark_answered("topic-0:0");
        session.jump(3).unwrap();

        assert_eq!(session.submit_assessment(1, 2), Ok(50));
        let blocked = session.advance().unwrap_err();
        assert_eq!(
            blocked,
            Blocked::NotPassed {
                score: Some(50),
                pass_mark: 80
            }
        );
        assert!(blocked.to_string().contains("80%"));

        assert_eq!(session.submit_assessment(2, 2), Ok(100));
        assert_eq!(session.advance(), Ok(NavState::Complete));
        assert!(session.is_complete());
        assert_eq!(session.progress(), 100);
    }

    #[test]
    fn test_complete_is_terminal() {
        let graph = graph();
        let mut session = NavigationSession::new(&graph);
        session.mark_answered("topic-0:0");
        session.jump(3).unwrap();
        session.submit_assessment(2, 2).unwrap();
        session.advance().unwrap();
        assert_eq!(session.back(), NavState::Complete);
        assert_eq!(session.jump(0), Ok(NavState::Complete));
        assert_eq!(session.advance(), Ok(NavState::Complete));
    }

    #[test]
    fn test_free_mode_jumps_past_gates() {
        let graph = graph().with_navigation_mode(NavigationMode::Free);
        let mut session = NavigationSession::new(&graph);
        assert_eq!(session.jump(2), Ok(NavState::Page(2)));
        assert_eq!(session.jump(3), Ok(NavState::Page(3)));

        // Next still respects the gate on the current page.
        session.jump(1).unwrap();
        assert!(matches!(session.advance(), Err(Blocked::Unanswered { page: 1, .. })));
    }

    #[test]
    fn test_free_mode_cannot_finish_with_open_gates() {
        let graph = graph().with_navigation_mode(NavigationMode::Free);
        let mut session = NavigationSession::new(&graph);
        session.jump(3).unwrap();
        session.submit_assessment(2, 2).unwrap();
        assert!(matches!(session.advance(), Err(Blocked::Unanswered { page: 1, .. })));

        session.mark_answered("topic-0:0");
        assert_eq!(session.advance(), Ok(NavState::Complete));
    }

    #[test]
    fn test_single_attempt_without_retake() {
        let graph = graph().with_allow_retake(false);
        let mut session = NavigationSession::new(&graph);
        session.mark_answered("topic-0:0");
        session.jump(3).unwrap();

        assert_eq!(session.submit_assessment(1, 2), Ok(50));
        assert_eq!(
            session.submit_assessment(2, 2),
            Err(Blocked::AttemptUsed { score: 50 })
        );
        assert_eq!(session.score(), Some(50));

        // The failed attempt is final, so the course can still end.
        assert_eq!(session.advance(), Ok(NavState::Complete));
    }

    #[test]
    fn test_progress_below_100_until_complete() {
        let graph = graph();
        let mut session = NavigationSession::new(&graph);
        session.mark_answered("topic-0:0");
        for index in 1..4 {
            session.jump(index).unwrap();
        }
        assert_eq!(session.progress(), 99);
    }
}

//! Navigation rules over the fixture course.

use coursepack::model::ResolvedMedia;
use coursepack::navigation::{Blocked, NavState, emit_navigation_script, question_key};
use coursepack::normalize::{normalize, normalize_bytes};
use coursepack::render::{RenderOptions, render};
use coursepack::{BuildConfig, NavigationGraph, NavigationMode, NavigationSession, PageId};
use serde_json::json;

fn fixture_graph() -> NavigationGraph {
    let bytes = std::fs::read("tests/fixtures/course.json").expect("fixture should exist");
    let content = normalize_bytes(&bytes).unwrap();
    NavigationGraph::from_content(&content, content.pass_mark)
}

fn answer_page(session: &mut NavigationSession<'_>, graph: &NavigationGraph, index: usize) {
    for key in &graph.pages[index].required_keys {
        session.mark_answered(key.clone());
    }
}

// ============================================================================
// Graph
// ============================================================================

#[test]
fn test_graph_from_fixture() {
    let graph = fixture_graph();
    let gates: Vec<_> = graph.gates().collect();
    assert_eq!(gates, vec![2, 3, 4]);
    assert_eq!(graph.pass_mark, 75);

    let hazards = &graph.pages[2];
    assert_eq!(hazards.document, "pages/hazards.html");
    assert_eq!(hazards.required_keys, vec!["hazards:0"]);
    assert!(!hazards.requires_pass);

    let assessment = &graph.pages[4];
    assert!(assessment.requires_pass);
    assert_eq!(assessment.required_keys.len(), 2);
    assert_eq!(graph.questions["topic-1"].len(), 2);
    assert_eq!(graph.index_of("assessment"), Some(4));
}

#[test]
fn test_question_key_format() {
    assert_eq!(question_key(&PageId::topic(2), 1), "topic-2:1");
}

// ============================================================================
// Gating
// ============================================================================

#[test]
fn test_gate_cannot_be_skipped() {
    let graph = fixture_graph();
    let mut session = NavigationSession::new(&graph);

    assert_eq!(session.advance(), Ok(NavState::Page(1)));
    assert_eq!(session.advance(), Ok(NavState::Page(2)));
    assert!(session.should_block());

    let Err(Blocked::Unanswered { page, remaining }) = session.advance() else {
        panic!("expected an unanswered gate");
    };
    assert_eq!(page, 2);
    assert_eq!(remaining, vec!["hazards:0"]);

    // The outline cannot jump past the unsatisfied gate either.
    assert!(matches!(session.jump(3), Err(Blocked::Unanswered { page: 2, .. })));
    assert!(matches!(session.jump(4), Err(Blocked::Unanswered { page: 2, .. })));
    assert_eq!(session.state(), NavState::Page(2));

    // Going back is always allowed.
    assert_eq!(session.jump(0), Ok(NavState::Page(0)));
    assert_eq!(session.back(), NavState::Page(0));
}

#[test]
fn test_answering_opens_one_gate_at_a_time() {
    let graph = fixture_graph();
    let mut session = NavigationSession::new(&graph);
    session.jump(2).unwrap();

    answer_page(&mut session, &graph, 2);
    assert!(!session.should_block());
    assert_eq!(session.advance(), Ok(NavState::Page(3)));

    session.mark_answered("topic-1:0");
    assert!(session.should_block());
    assert!(session.jump(4).is_err());

    // Answering twice is harmless.
    session.mark_answered("topic-1:1");
    session.mark_answered("topic-1:1");
    assert_eq!(session.advance(), Ok(NavState::Page(4)));
}

#[test]
fn test_assessment_needs_a_passing_score() {
    let graph = fixture_graph();
    let mut session = NavigationSession::new(&graph);
    for index in [2, 3] {
        answer_page(&mut session, &graph, index);
    }
    session.jump(4).unwrap();

    // Nothing submitted yet: the assessment questions count as unanswered.
    assert!(matches!(session.advance(), Err(Blocked::Unanswered { page: 4, .. })));

    assert_eq!(session.submit_assessment(1, 2), Ok(50));
    let blocked = session.advance().unwrap_err();
    assert_eq!(
        blocked.to_string(),
        "You scored 50%. You need 75% to pass. Please review and retake the assessment."
    );

    // Retake.
    assert_eq!(session.submit_assessment(2, 2), Ok(100));
    assert_eq!(session.advance(), Ok(NavState::Complete));
    assert!(session.is_complete());
    assert_eq!(session.progress(), 100);
}

#[test]
fn test_score_at_pass_mark_passes() {
    let graph = fixture_graph();
    let mut session = NavigationSession::new(&graph);
    for index in [2, 3] {
        answer_page(&mut session, &graph, index);
    }
    session.jump(4).unwrap();
    assert_eq!(session.submit_assessment(3, 4), Ok(75));
    assert_eq!(session.advance(), Ok(NavState::Complete));
}

#[test]
fn test_unanswered_message() {
    let blocked = Blocked::Unanswered {
        page: 2,
        remaining: vec!["hazards:0".into()],
    };
    assert_eq!(
        blocked.to_string(),
        "Please answer all knowledge check questions before continuing."
    );
}

#[test]
fn test_welcome_check_is_answerable() {
    let content = normalize(&json!({
        "title": "Warm-up",
        "welcomePage": {
            "title": "Hello",
            "knowledgeCheck": {"questions": [{
                "type": "true-false",
                "question": "Ready?",
                "correctAnswer": true
            }]}
        },
        "topics": [{"title": "A"}]
    }))
    .unwrap();
    let graph = NavigationGraph::from_content(&content, content.pass_mark);
    assert!(graph.pages[0].gating);
    assert_eq!(graph.pages[0].required_keys, vec!["welcome:0"]);

    // The welcome page carries markup for every key its gate needs.
    let rendered = render(
        &content,
        &ResolvedMedia::new(),
        &RenderOptions::new(&content, &BuildConfig::default()),
    );
    let welcome = &rendered.artifacts["pages/welcome.html"].text;
    for key in &graph.pages[0].required_keys {
        assert!(welcome.contains(&format!("data-question-key=\"{key}\"")));
    }
    assert!(welcome.contains("class=\"check-answer\""));

    let mut session = NavigationSession::new(&graph);
    assert!(matches!(session.advance(), Err(Blocked::Unanswered { page: 0, .. })));
    session.mark_answered("welcome:0");
    assert_eq!(session.advance(), Ok(NavState::Page(1)));
}

// ============================================================================
// Course Settings
// ============================================================================

#[test]
fn test_free_outline_keeps_next_gated() {
    let graph = fixture_graph().with_navigation_mode(NavigationMode::Free);
    let mut session = NavigationSession::new(&graph);

    assert_eq!(session.jump(4), Ok(NavState::Page(4)));
    assert_eq!(session.jump(3), Ok(NavState::Page(3)));
    assert!(matches!(session.advance(), Err(Blocked::Unanswered { page: 3, .. })));
}

#[test]
fn test_no_retake_after_failed_attempt() {
    let graph = fixture_graph().with_allow_retake(false);
    let mut session = NavigationSession::new(&graph);
    for index in [2, 3] {
        answer_page(&mut session, &graph, index);
    }
    session.jump(4).unwrap();

    assert_eq!(session.submit_assessment(1, 4), Ok(25));
    let refused = session.submit_assessment(4, 4).unwrap_err();
    assert_eq!(refused, Blocked::AttemptUsed { score: 25 });
    assert_eq!(
        refused.to_string(),
        "The assessment has already been submitted. Your score was 25%."
    );
    assert_eq!(session.advance(), Ok(NavState::Complete));
}

#[test]
fn test_settings_reach_the_script() {
    let graph = fixture_graph()
        .with_navigation_mode(NavigationMode::Free)
        .with_allow_retake(false);
    let script = emit_navigation_script(&graph).unwrap();
    assert!(script.contains("\"navigationMode\":\"free\""));
    assert!(script.contains("\"allowRetake\":false"));
}

// ============================================================================
// Ungated Courses
// ============================================================================

#[test]
fn test_ungated_course_runs_to_completion() {
    let content = normalize(&json!({
        "title": "Reading only",
        "topics": [{"title": "A"}, {"title": "B"}]
    }))
    .unwrap();
    let graph = NavigationGraph::from_content(&content, content.pass_mark);
    let mut session = NavigationSession::new(&graph);

    assert_eq!(session.progress(), 33);
    assert_eq!(session.jump(2), Ok(NavState::Page(2)));
    assert_eq!(session.advance(), Ok(NavState::Complete));

    // Complete is terminal.
    assert_eq!(session.advance(), Ok(NavState::Complete));
    assert_eq!(session.back(), NavState::Complete);
    assert_eq!(session.jump(0), Ok(NavState::Complete));
    assert!(session.should_block());
}

#[test]
fn test_jump_out_of_range() {
    let graph = fixture_graph();
    let mut session = NavigationSession::new(&graph);
    assert_eq!(session.jump(99), Err(Blocked::OutOfRange(99)));
}

// ============================================================================
// Delivered Script
// ============================================================================

#[test]
fn test_script_embeds_graph() {
    let graph = fixture_graph();
    let script = emit_navigation_script(&graph).unwrap();

    assert!(!script.contains("/*@COURSE_DATA@*/"));
    assert!(script.contains("\"passMark\":75"));
    assert!(script.contains("\"requiredKeys\":[\"hazards:0\"]"));
    assert!(script.contains("\"document\":\"pages/hazards.html\""));
    assert!(script.contains("CoursepackNavigation"));
}

#[test]
fn test_script_data_cannot_close_the_tag() {
    let content = normalize(&json!({
        "title": "Tricky",
        "topics": [{
            "title": "A",
            "knowledgeCheck": {"questions": [{
                "type": "fill-in-the-blank",
                "question": "Type </script> here",
                "correctAnswer": "</script>"
            }]}
        }]
    }))
    .unwrap();
    let graph = NavigationGraph::from_content(&content, 80);
    let script = emit_navigation_script(&graph).unwrap();

    let data_start = script.find("\"pages\"").unwrap();
    assert!(!script[data_start..].contains("</script>"));
    assert!(script.contains("<\\/script>"));
}

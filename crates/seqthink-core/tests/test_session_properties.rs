use seqthink_core::analysis::{self, AnalysisContext, Complexity, ThoughtType};
use seqthink_core::session::{Session, ThoughtOptions};
use seqthink_core::{SessionController, ThoughtRequest};
use serde_json::json;

/// Applies a fixed mix of appends, revisions and branches, some of which fail.
fn exercise(session: &mut Session) {
    for step in 0..30u32 {
        let _ = match step % 5 {
            0 | 1 => session
                .add_thought(format!("step {step}"), ThoughtOptions::default())
                .map(|_| ()),
            2 => session
                .revise_thought(step / 2, format!("revise {step}"), ThoughtOptions::default())
                .map(|_| ()),
            3 => session.create_branch(step, format!("b{step}")).map(|_| ()),
            _ => session
                .revise_thought(step * 10, "never applies", ThoughtOptions::default())
                .map(|_| ()),
        };
    }
}

#[test]
fn test_log_stays_dense() {
    let mut session = Session::new(None);
    exercise(&mut session);

    for (index, thought) in session.thoughts().iter().enumerate() {
        assert_eq!(thought.number as usize, index + 1);
    }
    let metadata = session.metadata();
    assert_eq!(metadata.total_thoughts, session.thoughts().len());
    assert_eq!(
        metadata.revision_count,
        session.thoughts().iter().filter(|t| t.is_revision).count()
    );
    assert_eq!(metadata.branch_count, session.branches().len());
    session.verify().expect("invariants hold");
}

#[test]
fn test_revision_never_alters_target() {
    let mut session = Session::new(None);
    for text in ["one", "two", "three"] {
        session.add_thought(text, ThoughtOptions::default()).unwrap();
    }
    let snapshot = session.thoughts().to_vec();

    let revision = session
        .revise_thought(2, "two, revised", ThoughtOptions::default())
        .unwrap();

    assert_eq!(&session.thoughts()[..3], &snapshot[..]);
    assert_eq!(revision.revises_thought, Some(2));
    assert_eq!(revision.original_text.as_deref(), Some("two"));
}

#[test]
fn test_branch_beyond_log_fails() {
    let mut session = Session::new(None);
    session.add_thought("only", ThoughtOptions::default()).unwrap();
    let err = session.create_branch(2, "late").unwrap_err();
    assert!(err.is_thought_not_found());
}

#[test]
fn test_revise_missing_thought_example() {
    let mut session = Session::new(None);
    session.add_thought("only", ThoughtOptions::default()).unwrap();
    let err = session
        .revise_thought(2, "updated text", ThoughtOptions::default())
        .unwrap_err();
    assert!(err.is_thought_not_found());
    assert_eq!(session.thoughts().len(), 1);
}

#[test]
fn test_confidence_always_bounded() {
    let texts = [
        "",
        "?",
        "definitely certainly clearly obviously, no doubt",
        "maybe perhaps possibly uncertain unclear",
        "Clearly this is unclear?",
    ];
    for text in texts {
        for total in 1..=12u32 {
            for number in 1..=total {
                let analysis = analysis::analyze(text, &AnalysisContext::new(number, total));
                assert!(
                    (0.1..=1.0).contains(&analysis.confidence),
                    "confidence {} out of range for {text:?}",
                    analysis.confidence
                );
            }
        }
        let unknown = analysis::analyze(text, &AnalysisContext::default());
        assert!((0.1..=1.0).contains(&unknown.confidence));
    }
}

#[test]
fn test_complexity_monotonic_in_keywords() {
    let base = "We look at the cache layer";
    let keywords = [
        "analysis",
        "architecture",
        "algorithm",
        "optimization",
        "strategy",
        "framework",
        "paradigm",
        "abstraction",
        "synthesize",
        "integrate",
    ];

    let mut text = base.to_string();
    let mut previous = analysis::analyze(&text, &AnalysisContext::default()).complexity;
    for keyword in keywords.iter().cycle().take(25) {
        text.push(' ');
        text.push_str(keyword);
        let current = analysis::analyze(&text, &AnalysisContext::default()).complexity;
        assert!(current >= previous, "{text}");
        previous = current;
    }
}

#[test]
fn test_analysis_is_deterministic() {
    let text = "How should the framework integrate with the scheduler if load spikes?";
    let context = AnalysisContext::new(2, 6);
    assert_eq!(
        analysis::analyze(text, &context),
        analysis::analyze(text, &context)
    );
}

#[test]
fn test_question_example() {
    let mut controller = SessionController::default();
    let outcome = controller
        .submit_request(ThoughtRequest::new("Should we refactor the query layer?", 1, 5))
        .unwrap();
    assert_eq!(outcome.analysis.thought_type, ThoughtType::Question);
    assert_eq!(outcome.analysis.complexity, Complexity::VeryLow);
    assert!((outcome.analysis.progress - 0.2).abs() < f64::EPSILON);
}

#[test]
fn test_long_text_example() {
    let mut text = "The architecture needs optimization. Why? How? Where? ".to_string();
    text.push_str(&"x".repeat(600 - text.len()));
    assert_eq!(analysis::complexity_score(&text), 7.0);
    assert_eq!(
        analysis::analyze(&text, &AnalysisContext::default()).complexity,
        Complexity::High
    );
}

#[test]
fn test_late_revision_example() {
    let mut controller = SessionController::default();
    for number in 1..=3 {
        controller
            .submit_request(ThoughtRequest::new(format!("thought {number}"), number, 5))
            .unwrap();
    }
    let outcome = controller
        .submit_request(ThoughtRequest::new("thought 2, corrected", 4, 5).revising(2))
        .unwrap();
    assert_eq!(
        outcome.recommendations[0],
        "Ensure all aspects have been thoroughly considered"
    );
    assert!(outcome
        .recommendations
        .contains(&"Document what changed in this revision and why".to_string()));
}

#[test]
fn test_failed_submission_wire_shape() {
    let mut controller = SessionController::default();
    let response = controller
        .submit(&json!({ "thought": "x", "thoughtNumber": 3, "totalThoughts": 2, "nextThoughtNeeded": true }))
        .to_json();
    assert_eq!(response["success"], false);
    assert_eq!(response["error"], "totalThoughts must be an integer >= thoughtNumber");
}

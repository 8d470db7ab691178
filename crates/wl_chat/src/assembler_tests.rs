use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use test_log::test;
use wl_conversation::{Phase, Role};
use wl_sse::MalformedFrame;

use super::*;

fn pending() -> Conversation {
    let mut conversation = Conversation::new().with_session_id("s-1");
    conversation.submit("What is my balance?").unwrap();
    conversation
}

fn content(text: &str) -> Frame {
    Payload::content(text).into()
}

fn done(sources: Vec<RagSource>) -> Frame {
    Payload::done(sources).into()
}

fn source(name: &str, relevance: f64, content: &str) -> RagSource {
    RagSource {
        source: name.to_owned(),
        relevance,
        content: content.to_owned(),
    }
}

#[test]
fn test_begin_opens_assistant_turn() {
    let mut conversation = pending();
    let (assembler, update) = Assembler::begin(&mut conversation).unwrap();

    assert_eq!(update, Update::TurnOpened { index: 1 });
    assert_eq!(assembler.index(), 1);
    assert_eq!(conversation.phase(), Phase::Streaming(1));
    assert_eq!(conversation.get(1).unwrap().role(), Role::Assistant);
}

#[test]
fn test_begin_requires_pending_user_turn() {
    let mut conversation = Conversation::new();
    let error = Assembler::begin(&mut conversation).unwrap_err();

    assert_eq!(
        error,
        crate::Error::Conversation(wl_conversation::Error::NotAwaiting)
    );
}

#[test]
fn test_content_accumulates_in_order() {
    let mut conversation = pending();
    let (mut assembler, _) = Assembler::begin(&mut conversation).unwrap();

    let updates: Vec<_> = ["Your ", "balance ", "is $1,200."]
        .into_iter()
        .filter_map(|text| assembler.apply(&mut conversation, content(text)))
        .collect();

    assert_eq!(updates.len(), 3);
    assert_eq!(updates[2], Update::TurnUpdated {
        index: 1,
        delta: "is $1,200.".to_owned(),
        text: "Your balance is $1,200.".to_owned(),
    });
    assert_eq!(conversation.get(1).unwrap().text(), "Your balance is $1,200.");
    assert!(conversation.get(1).unwrap().is_open());
}

#[test]
fn test_empty_content_is_skipped() {
    let mut conversation = pending();
    let (mut assembler, _) = Assembler::begin(&mut conversation).unwrap();

    assert_eq!(assembler.apply(&mut conversation, content("")), None);
    assert_eq!(conversation.get(1).unwrap().text(), "");
}

#[test]
fn test_done_seals_with_citations() {
    let mut conversation = pending();
    let (mut assembler, _) = Assembler::begin(&mut conversation).unwrap();
    assembler.apply(&mut conversation, content("See the fee schedule."));

    let update = assembler.apply(
        &mut conversation,
        done(vec![
            source("fees.pdf", 0.87, "Monthly fee is $5."),
            source("faq.md", 1.4, "Fees are waived for students."),
        ]),
    );

    assert_matches!(update, Some(Update::TurnSealed { index: 1, reason: SealReason::Completed, ref citations }) => {
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].source, "fees.pdf");
        assert_eq!(citations[0].relevance_percent(), 87);
        assert_eq!(citations[1].relevance, 1.0);
    });

    let turn = conversation.get(1).unwrap();
    assert!(!turn.is_open());
    assert_eq!(turn.citations().len(), 2);
    assert_eq!(turn.text(), "See the fee schedule.");
    assert_eq!(conversation.phase(), Phase::Idle);
    assert!(assembler.is_sealed());
}

#[test]
fn test_done_without_sources_has_no_citations() {
    let mut conversation = pending();
    let (mut assembler, _) = Assembler::begin(&mut conversation).unwrap();

    let update = assembler.apply(&mut conversation, done(vec![]));

    assert_eq!(
        update,
        Some(Update::TurnSealed {
            index: 1,
            reason: SealReason::Completed,
            citations: vec![],
        })
    );
}

#[test]
fn test_frames_after_done_are_ignored() {
    let mut conversation = pending();
    let (mut assembler, _) = Assembler::begin(&mut conversation).unwrap();
    assembler.apply(&mut conversation, content("Done."));
    assembler.apply(&mut conversation, done(vec![]));

    assert_eq!(assembler.apply(&mut conversation, content(" More.")), None);
    assert_eq!(assembler.apply(&mut conversation, done(vec![])), None);
    assert_eq!(assembler.finish(&mut conversation, SealReason::Exhausted), None);

    let turn = conversation.get(1).unwrap();
    assert_eq!(turn.text(), "Done.");
    assert_eq!(turn.seal_reason(), Some(SealReason::Completed));
}

#[test]
fn test_malformed_and_unknown_frames_are_skipped() {
    let mut conversation = pending();
    let (mut assembler, _) = Assembler::begin(&mut conversation).unwrap();

    let frames = vec![
        content("Hello"),
        Frame::Malformed(MalformedFrame {
            data: "{not json".to_owned(),
            error: "expected value".to_owned(),
        }),
        Payload::Unknown.into(),
        content(" there"),
    ];

    let updates = frames
        .into_iter()
        .filter_map(|frame| assembler.apply(&mut conversation, frame))
        .count();

    assert_eq!(updates, 2);
    assert_eq!(conversation.get(1).unwrap().text(), "Hello there");
}

#[test]
fn test_finish_seals_partial_turn() {
    let mut conversation = pending();
    let (mut assembler, _) = Assembler::begin(&mut conversation).unwrap();
    assembler.apply(&mut conversation, content("Your balance"));

    let update = assembler.finish(&mut conversation, SealReason::Exhausted);

    assert_eq!(
        update,
        Some(Update::TurnSealed {
            index: 1,
            reason: SealReason::Exhausted,
            citations: vec![],
        })
    );

    let turn = conversation.get(1).unwrap();
    assert_eq!(turn.text(), "Your balance");
    assert!(turn.seal_reason().unwrap().is_partial());
    assert!(!conversation.is_busy());
}

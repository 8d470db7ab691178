use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use super::*;
use crate::turn::Role;

#[test_log::test]
fn test_full_cycle() {
    let mut conversation = Conversation::new()
        .with_session_id("abc")
        .with_greeting("Hello! How can I help you today?");

    let user = conversation.submit("What is my balance?").unwrap();
    assert_eq!(user, 1);
    assert_eq!(conversation.phase(), Phase::Awaiting);

    let assistant = conversation.open_assistant().unwrap();
    assert_eq!(assistant, 2);
    assert_eq!(conversation.phase(), Phase::Streaming(2));

    conversation.append("Your balance ").unwrap();
    let turn = conversation.append("is $42.").unwrap();
    assert_eq!(turn.text(), "Your balance is $42.");

    let sealed = conversation
        .seal(vec![Citation::new("accounts", 0.8, "checking")], SealReason::Completed)
        .unwrap();
    assert_eq!(sealed, 2);
    assert_eq!(conversation.phase(), Phase::Idle);

    let roles = conversation.turns().iter().map(Turn::role).collect::<Vec<_>>();
    assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
    assert_eq!(conversation.session_id().map(SessionId::as_str), Some("abc"));
}

#[test_log::test]
fn test_submit_rejected_while_busy() {
    let mut conversation = Conversation::new();
    conversation.submit("first").unwrap();

    assert_eq!(
        conversation.submit("second"),
        Err(Error::Busy(Phase::Awaiting))
    );

    conversation.open_assistant().unwrap();
    assert_eq!(
        conversation.submit("second"),
        Err(Error::Busy(Phase::Streaming(1)))
    );

    // Rejection leaves the conversation untouched.
    assert_eq!(conversation.len(), 2);
    assert_eq!(conversation.open_turn().map(Turn::text), Some(""));

    conversation.seal(vec![], SealReason::Exhausted).unwrap();
    assert_eq!(conversation.submit("second"), Ok(2));
}

#[test_log::test]
fn test_blank_input_rejected() {
    let mut conversation = Conversation::new();

    assert_eq!(conversation.submit("   \n"), Err(Error::EmptyInput));
    assert!(conversation.is_empty());
    assert!(!conversation.is_busy());
}

#[test_log::test]
fn test_at_most_one_open_turn() {
    let mut conversation = Conversation::new();
    conversation.submit("hi").unwrap();
    conversation.open_assistant().unwrap();

    assert_matches!(conversation.open_assistant(), Err(Error::Busy(_)));

    let open = conversation.turns().iter().filter(|t| t.is_open()).count();
    assert_eq!(open, 1);
}

#[test_log::test]
fn test_append_without_open_turn() {
    let mut conversation = Conversation::new();
    assert_matches!(conversation.append("x"), Err(Error::NoOpenTurn));

    conversation.submit("hi").unwrap();
    assert_matches!(conversation.append("x"), Err(Error::NoOpenTurn));
    assert_eq!(
        conversation.seal(vec![], SealReason::Completed),
        Err(Error::NoOpenTurn)
    );

    let error = conversation.append("x").unwrap_err();
    assert!(error.is_protocol_violation());
}

#[test_log::test]
fn test_abandon_returns_to_idle() {
    let mut conversation = Conversation::new();
    assert_eq!(conversation.abandon(), Err(Error::NotAwaiting));

    conversation.submit("hi").unwrap();
    conversation.abandon().unwrap();

    assert_eq!(conversation.phase(), Phase::Idle);
    assert_eq!(conversation.len(), 1);
    assert_eq!(conversation.open_assistant(), Err(Error::NotAwaiting));
}

#[test_log::test]
fn test_sealed_turns_survive_later_turns() {
    let mut conversation = Conversation::new();
    conversation.submit("one").unwrap();
    conversation.open_assistant().unwrap();
    conversation.append("first answer").unwrap();
    conversation.seal(vec![], SealReason::Completed).unwrap();

    conversation.submit("two").unwrap();
    conversation.open_assistant().unwrap();
    conversation.append("partial").unwrap();
    conversation.seal(vec![], SealReason::Failed).unwrap();

    assert_eq!(conversation.get(1).map(Turn::text), Some("first answer"));
    assert_eq!(
        conversation.get(1).and_then(Turn::seal_reason),
        Some(SealReason::Completed)
    );
    assert_eq!(
        conversation.last().and_then(Turn::seal_reason),
        Some(SealReason::Failed)
    );
}

#[test_log::test]
fn test_deserialize_checks_phase() {
    let mut conversation = Conversation::new().with_session_id("abc");
    conversation.submit("one").unwrap();
    conversation.open_assistant().unwrap();
    conversation.append("partial").unwrap();

    let value = serde_json::to_value(&conversation).unwrap();
    let restored: Conversation = serde_json::from_value(value.clone()).unwrap();
    assert_eq!(restored, conversation);

    let with_phase = |phase: Phase| {
        let mut value = value.clone();
        value["phase"] = serde_json::to_value(phase).unwrap();
        serde_json::from_value::<Conversation>(value)
    };

    assert!(with_phase(Phase::Streaming(9)).is_err());
    assert!(with_phase(Phase::Idle).is_err());
    assert!(with_phase(Phase::Awaiting).is_err());

    conversation.seal(vec![], SealReason::Exhausted).unwrap();
    let mut sealed = serde_json::to_value(&conversation).unwrap();
    sealed["phase"] = serde_json::to_value(Phase::Streaming(2)).unwrap();

    let error = serde_json::from_value::<Conversation>(sealed).unwrap_err();
    assert!(error.to_string().contains("streaming turn 2"), "{error}");
}

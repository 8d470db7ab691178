use pretty_assertions::assert_eq;
use test_log::test;
use wl_chat::Update;
use wl_conversation::{Citation, SealReason};

use super::*;

fn render(updates: &[Update], color: bool) -> (String, String) {
    let mut out = vec![];
    let mut err = vec![];

    let mut renderer = Renderer::new(&mut out, &mut err, color);
    for update in updates {
        renderer.render(update).unwrap();
    }

    (
        String::from_utf8(out).unwrap(),
        String::from_utf8(err).unwrap(),
    )
}

#[test]
fn test_renders_answer_with_citations() {
    let updates = [
        Update::TurnSubmitted { index: 1 },
        Update::TurnOpened { index: 2 },
        Update::TurnUpdated {
            index: 2,
            delta: "Hel".to_owned(),
            text: "Hel".to_owned(),
        },
        Update::TurnUpdated {
            index: 2,
            delta: "lo".to_owned(),
            text: "Hello".to_owned(),
        },
        Update::TurnSealed {
            index: 2,
            reason: SealReason::Completed,
            citations: vec![
                Citation::new("fees.pdf", 0.874, "Monthly fee is $5."),
                Citation::new("faq.md", 0.5, "  "),
            ],
        },
    ];

    let (out, err) = render(&updates, false);

    assert_eq!(
        out,
        "assistant> Hello\n\nSources:\n  [87%] fees.pdf: Monthly fee is $5.\n  [50%] faq.md\n\n"
    );
    assert_eq!(err, "");
}

#[test]
fn test_marks_partial_answers() {
    let updates = [
        Update::TurnOpened { index: 2 },
        Update::TurnUpdated {
            index: 2,
            delta: "Your bal".to_owned(),
            text: "Your bal".to_owned(),
        },
        Update::TurnSealed {
            index: 2,
            reason: SealReason::Exhausted,
            citations: vec![],
        },
    ];

    let (out, _) = render(&updates, false);

    assert_eq!(out, "assistant> Your bal\n[stream ended early]\n\n");
}

#[test]
fn test_notifications_go_to_stderr() {
    let updates = [Update::Notification(Notification::error(
        "Error",
        "Failed to send message",
    ))];

    let (out, err) = render(&updates, false);

    assert_eq!(out, "");
    assert_eq!(err, "Error: Failed to send message\n");
}

#[test]
fn test_color_output_strips_to_plain_text() {
    let updates = [
        Update::TurnOpened { index: 2 },
        Update::TurnUpdated {
            index: 2,
            delta: "Hi".to_owned(),
            text: "Hi".to_owned(),
        },
        Update::TurnSealed {
            index: 2,
            reason: SealReason::Cancelled,
            citations: vec![],
        },
    ];

    let (colored, _) = render(&updates, true);
    let (plain, _) = render(&updates, false);

    assert_ne!(colored, plain);
    assert_eq!(strip_ansi_escapes::strip_str(colored), plain);
}

#[test]
fn test_greeting_and_prompt() {
    let mut out = vec![];
    let mut renderer = Renderer::new(&mut out, io::sink(), false);
    renderer.greeting("Hello! How can I help?").unwrap();
    renderer.prompt().unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "assistant> Hello! How can I help?\n\nyou> "
    );
}

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use super::*;
use crate::RagSource;

/// Feed `chunks` to a fresh codec one read at a time, then signal EOF.
fn decode_chunks(codec: &mut FrameCodec, chunks: &[&[u8]]) -> Vec<Frame> {
    let mut buf = BytesMut::new();
    let mut frames = vec![];

    for chunk in chunks {
        buf.extend_from_slice(chunk);
        while let Some(frame) = codec.decode(&mut buf).unwrap() {
            frames.push(frame);
        }
    }

    while let Some(frame) = codec.decode_eof(&mut buf).unwrap() {
        frames.push(frame);
    }

    frames
}

fn decode_all(chunks: &[&[u8]]) -> Vec<Frame> {
    decode_chunks(&mut FrameCodec::new(), chunks)
}

fn content(text: &str) -> Frame {
    Frame::Payload(Payload::content(text))
}

#[test_log::test]
fn test_content_frames_in_order() {
    let body = b"data: {\"type\":\"content\",\"content\":\"Hel\"}\n\n\
                 data: {\"type\":\"content\",\"content\":\"lo\"}\n\n\
                 data: {\"type\":\"content\",\"content\":\" world\"}\n\n\
                 data: [DONE]\n\n";

    assert_eq!(decode_all(&[body]), vec![
        content("Hel"),
        content("lo"),
        content(" world"),
    ]);
}

#[test_log::test]
fn test_frame_split_across_reads() {
    let frames = decode_all(&[
        b"data: {\"type\":\"con",
        b"tent\",\"content\":\"Hel",
        b"lo\"}\n",
        b"\ndata: {\"type\":\"done\"}\n",
    ]);

    assert_eq!(frames, vec![
        content("Hello"),
        Frame::Payload(Payload::done(vec![])),
    ]);
}

#[test_log::test]
fn test_multibyte_character_split_across_reads() {
    let line = "data: {\"type\":\"content\",\"content\":\"Saldo: 100 €\"}\n";
    let bytes = line.as_bytes();

    // Split inside the three-byte euro sign.
    let split = line.find('€').unwrap() + 1;
    let frames = decode_all(&[&bytes[..split], &bytes[split..]]);

    assert_eq!(frames, vec![content("Saldo: 100 €")]);
}

#[test_log::test]
fn test_malformed_frame_does_not_stop_decoding() {
    let frames = decode_all(&[b"data: {\"type\":\"content\",\"content\":\"a\"}\n\
                                data: {not json}\n\
                                data: {\"type\":\"content\",\"content\":\"b\"}\n"]);

    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0], content("a"));
    assert_matches!(&frames[1], Frame::Malformed(MalformedFrame { data, .. }) if data == "{not json}");
    assert_eq!(frames[2], content("b"));
}

#[test_log::test]
fn test_malformed_frame_display_is_truncated() {
    let data = format!("{{{}", "é".repeat(1000));
    let line = format!("data: {data}\n");
    let frames = decode_all(&[line.as_bytes()]);

    let Some(Frame::Malformed(frame)) = frames.first() else {
        panic!("expected a malformed frame, got {frames:?}");
    };
    assert_eq!(frame.data, data);

    let shown = frame.to_string();
    let prefix = format!("{{{}", "é".repeat(MalformedFrame::DISPLAY_LIMIT - 1));
    assert!(shown.contains(&format!("{prefix:?}...")), "{shown}");
    assert!(shown.ends_with(", 2001 bytes)"), "{shown}");
    assert!(shown.len() < 1000, "{shown}");

    let short = MalformedFrame {
        data: "{oops".to_owned(),
        error: "bad".to_owned(),
    };
    assert_eq!(short.to_string(), r#"bad (payload: "{oops")"#);
}

#[test_log::test]
fn test_invalid_utf8_is_malformed() {
    let frames = decode_all(&[b"data: \xff\xfe\n", b"data: {\"type\":\"content\",\"content\":\"ok\"}\n"]);

    assert_matches!(&frames[0], Frame::Malformed(_));
    assert_eq!(frames[1], content("ok"));
}

#[test_log::test]
fn test_ignores_non_data_lines() {
    let frames = decode_all(&[b": keep-alive\n\
                                event: message\n\
                                id: 7\n\
                                data:\n\
                                \n\
                                data:{\"type\":\"content\",\"content\":\"x\"}\n"]);

    assert_eq!(frames, vec![content("x")]);
}

#[test_log::test]
fn test_crlf_line_endings() {
    let frames = decode_all(&[
        b"data: {\"type\":\"content\",\"content\":\"a\"}\r\n\r\n",
        b"data: [DONE]\r\n",
    ]);

    assert_eq!(frames, vec![content("a")]);
}

#[test_log::test]
fn test_unterminated_final_line() {
    let frames = decode_all(&[b"data: {\"type\":\"content\",\"content\":\"tail\"}"]);
    assert_eq!(frames, vec![content("tail")]);
}

#[test_log::test]
fn test_done_carries_sources_in_order() {
    let frames = decode_all(&[br#"data: {"type":"done","rag_sources":[{"source":"fees.pdf","relevance":0.92,"content":"Wire fees are"},{"source":"faq.md","relevance":0.4,"content":"Transfers"}]}
"#]);

    assert_eq!(frames, vec![Frame::Payload(Payload::done(vec![
        RagSource {
            source: "fees.pdf".into(),
            relevance: 0.92,
            content: "Wire fees are".into(),
        },
        RagSource {
            source: "faq.md".into(),
            relevance: 0.4,
            content: "Transfers".into(),
        },
    ]))]);
}

#[test_log::test]
fn test_line_too_long() {
    let mut codec = FrameCodec::new().with_max_length(16);
    let mut buf = BytesMut::from(&b"data: {\"type\":\"content\",\"content\":\"x\"}"[..]);

    assert_eq!(codec.decode(&mut buf), Err(Error::LineTooLong { max: 16 }));
}

#[test_log::test]
fn test_long_line_within_limit_across_reads() {
    let mut codec = FrameCodec::new().with_max_length(64);
    let frames = decode_chunks(&mut codec, &[
        b"data: {\"type\":\"content\",",
        b"\"content\":\"xyz\"}\n",
    ]);

    assert_eq!(frames, vec![content("xyz")]);
}

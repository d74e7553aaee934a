// tests/event_stream.rs

use std::error::Error;

use gftpwrap::context::{ErrorKind, OperationState, Phase, Progress, Published};
use gftpwrap::event::parser::{
    INVALID_RESPONSE_MESSAGE, SERVICE_UNAVAILABLE_MARKER, SERVICE_UNAVAILABLE_MESSAGE,
};
use gftpwrap::event::{GftpEvent, LineBuffer, ParsedLine, handle_line, parse_line};
use gftpwrap::types::OperationKind;
use gftpwrap_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn feed(state: &mut OperationState, lines: &[&str]) {
    for line in lines {
        handle_line(OperationKind::Publish, line, state);
    }
}

#[test]
fn single_result_sets_file_and_url() {
    init_tracing();
    let mut state = OperationState::new();

    feed(&mut state, &[r#"{"result": {"file": "a.bin", "url": "gftp://0xabc/hash"}}"#]);

    assert_eq!(state.file(), Some("a.bin"));
    assert_eq!(state.url(), Some("gftp://0xabc/hash"));
    assert!(state.error().is_none());
    assert!(state.exit_code().is_none());
}

#[test]
fn batch_result_keeps_every_entry_in_order() {
    init_tracing();
    let mut state = OperationState::new();

    feed(
        &mut state,
        &[r#"{"result": [{"file": "a", "url": "u1"}, {"file": "b", "url": "u2"}]}"#],
    );

    assert_eq!(
        state.published(),
        &[
            Published { file: "a".into(), url: "u1".into() },
            Published { file: "b".into(), url: "u2".into() },
        ]
    );
    assert_eq!(state.url(), Some("u2"));
}

#[test]
fn batch_with_incomplete_element_latches_invalid_response_but_keeps_valid_sibling() {
    init_tracing();
    let mut state = OperationState::new();

    feed(
        &mut state,
        &[r#"{"result": [{"file": "a", "url": "u1"}, {"file": "b"}]}"#],
    );

    let err = state.error().expect("error must be latched");
    assert_eq!(err.kind, ErrorKind::Protocol);
    assert_eq!(err.message, INVALID_RESPONSE_MESSAGE);
    assert_eq!(state.file(), Some("a"));
    assert_eq!(state.url(), Some("u1"));
}

#[test]
fn single_result_without_url_is_a_protocol_error() {
    init_tracing();
    let mut state = OperationState::new();

    feed(&mut state, &[r#"{"result": {"file": "a"}}"#]);

    assert_eq!(state.error().map(|e| e.kind), Some(ErrorKind::Protocol));
    assert!(state.url().is_none());
}

#[test]
fn malformed_lines_change_nothing() {
    init_tracing();
    let mut state = OperationState::new();
    feed(&mut state, &[r#"{"cur": 1, "tot": 2, "spc": 3, "spt": 4, "elp": 5}"#]);
    let before = state.clone();

    feed(
        &mut state,
        &[
            "not json at all",
            "{\"result\": ",
            "[2024-01-01 INFO] listening",
            "}}}",
        ],
    );

    assert_eq!(state, before);
}

#[test]
fn lines_are_classified_by_shape() {
    assert!(matches!(parse_line("garbage"), ParsedLine::Malformed(_)));
    assert!(matches!(parse_line("   "), ParsedLine::Empty));
    assert!(matches!(parse_line(r#"{"hello": 1}"#), ParsedLine::Unrecognized(_)));
    assert!(matches!(parse_line("[1, 2]"), ParsedLine::Unrecognized(_)));
    assert!(matches!(
        parse_line(r#"{"cur": 1, "tot": 2, "spc": 3, "spt": 4, "elp": 5}"#),
        ParsedLine::Event(GftpEvent::Progress(_))
    ));
}

#[test]
fn progress_is_replaced_whole_and_reprocessing_is_idempotent() {
    init_tracing();
    let mut state = OperationState::new();
    let line = r#"{"cur": 10, "tot": 100, "spc": 7, "spt": 5, "elp": 2}"#;

    feed(&mut state, &[line]);
    let first = state.clone();
    feed(&mut state, &[line]);

    let expected = Progress {
        current: 10,
        total: 100,
        speed_current: 7,
        speed_total: 5,
        elapsed: 2,
    };
    assert_eq!(state.progress(), Some(&expected));
    assert_eq!(state, first);

    feed(&mut state, &[r#"{"cur": 20, "tot": 100, "spc": 1, "spt": 6, "elp": 3}"#]);
    assert_eq!(state.progress().map(|p| p.current), Some(20));
    assert_eq!(state.progress().map(|p| p.speed_current), Some(1));
    assert_eq!(state.progress().and_then(|p| p.fraction()), Some(0.2));
}

#[test]
fn partial_progress_is_ignored() {
    init_tracing();
    let mut state = OperationState::new();

    feed(&mut state, &[r#"{"cur": 10, "tot": 100}"#]);

    assert!(state.progress().is_none());
    assert!(matches!(parse_line(r#"{"cur": 1}"#), ParsedLine::Unrecognized(_)));
}

#[test]
fn service_unavailable_message_is_rewritten() {
    init_tracing();
    let mut state = OperationState::new();
    let raw = format!(
        r#"{{"error": {{"message": "Called service {} at tcp://127.0.0.1:7464"}}}}"#,
        SERVICE_UNAVAILABLE_MARKER
    );

    feed(&mut state, &[raw.as_str()]);

    let err = state.error().expect("error must be latched");
    assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
    assert_eq!(err.message, SERVICE_UNAVAILABLE_MESSAGE);
    assert!(!err.message.contains("7464"));
}

#[test]
fn other_error_messages_pass_through_verbatim() {
    init_tracing();
    let mut state = OperationState::new();

    feed(&mut state, &[r#"{"error": {"message": "file not found: /tmp/x"}}"#]);

    let err = state.error().expect("error must be latched");
    assert_eq!(err.kind, ErrorKind::Service);
    assert_eq!(err.message, "file not found: /tmp/x");
}

#[test]
fn first_error_wins_and_survives_later_events() {
    init_tracing();
    let mut state = OperationState::new();

    feed(
        &mut state,
        &[
            r#"{"error": {"message": "first"}}"#,
            r#"{"error": {"message": "second"}}"#,
            r#"{"cur": 1, "tot": 2, "spc": 0, "spt": 0, "elp": 0}"#,
            r#"{"result": [{"file": "a"}]}"#,
        ],
    );

    assert_eq!(state.error().map(|e| e.message.as_str()), Some("first"));
    assert_eq!(state.progress().map(|p| p.total), Some(2));
}

#[test]
fn error_without_message_is_an_invalid_response() -> TestResult {
    match parse_line(r#"{"error": {"code": -32000}}"#) {
        ParsedLine::Event(GftpEvent::Error(err)) => {
            assert_eq!(err.kind, ErrorKind::Protocol);
            assert_eq!(err.message, INVALID_RESPONSE_MESSAGE);
            Ok(())
        }
        other => Err(format!("expected error event, got {other:?}").into()),
    }
}

#[test]
fn phase_reports_most_significant_condition() {
    let mut state = OperationState::new();
    assert!(matches!(state.phase(), Phase::Pending));

    feed(&mut state, &[r#"{"cur": 1, "tot": 2, "spc": 0, "spt": 0, "elp": 0}"#]);
    assert!(matches!(state.phase(), Phase::Progress(p) if p.current == 1));

    feed(&mut state, &[r#"{"result": {"file": "a", "url": "u"}}"#]);
    assert!(matches!(state.phase(), Phase::Published(p) if p.url == "u"));

    feed(&mut state, &[r#"{"error": {"message": "boom"}}"#]);
    assert!(matches!(state.phase(), Phase::Error(e) if e.message == "boom"));
}

#[test]
fn line_buffer_reassembles_split_objects() {
    let mut buf = LineBuffer::new();

    assert!(buf.push(br#"{"result": {"fi"#).is_empty());
    let lines = buf.push(b"le\": \"a\", \"url\": \"u\"}}\n{\"cur\"");
    assert_eq!(lines, vec![r#"{"result": {"file": "a", "url": "u"}}"#.to_string()]);
    assert!(!buf.is_empty());

    let lines = buf.push(b": 1}\r\n\n");
    assert_eq!(lines, vec![r#"{"cur": 1}"#.to_string(), String::new()]);
    assert!(buf.finish().is_none());
}

#[test]
fn line_buffer_flushes_unterminated_tail() {
    let mut buf = LineBuffer::new();

    assert!(buf.push(br#"{"result": {"file": "a", "url": "u"}}"#).is_empty());

    assert_eq!(
        buf.finish().as_deref(),
        Some(r#"{"result": {"file": "a", "url": "u"}}"#)
    );
    assert!(buf.is_empty());
}

#[test]
fn line_buffer_drops_oversized_lines_and_keeps_going() {
    init_tracing();
    let mut buf = LineBuffer::with_limit(8);

    // Oversized line spread over several chunks.
    assert!(buf.push(b"0123456789").is_empty());
    assert!(buf.push(b"abcdef").is_empty());
    assert_eq!(buf.push(b"ghi\nok\n"), vec!["ok".to_string()]);

    // Oversized line arriving in one piece.
    assert_eq!(buf.push(b"0123456789\r\nnext\n"), vec!["next".to_string()]);

    // A line of exactly the limit survives, with or without `\r`.
    assert_eq!(
        buf.push(b"12345678\r\n12345678\n"),
        vec!["12345678".to_string(), "12345678".to_string()]
    );
    assert!(buf.finish().is_none());
}

#[test]
fn line_buffer_drops_oversized_unterminated_tail() {
    let mut buf = LineBuffer::with_limit(4);

    assert!(buf.push(b"ok\n").len() == 1);
    assert!(buf.push(b"toolong").is_empty());

    assert!(buf.finish().is_none());
    assert!(buf.is_empty());
}

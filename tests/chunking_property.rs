// tests/chunking_property.rs

use proptest::prelude::*;

use gftpwrap::context::OperationState;
use gftpwrap::event::{LineBuffer, handle_line};
use gftpwrap::types::OperationKind;

const STREAM: &str = concat!(
    "gftp starting\n",
    r#"{"cur": 0, "tot": 300, "spc": 0, "spt": 0, "elp": 0}"#,
    "\n",
    r#"{"cur": 150, "tot": 300, "spc": 80, "spt": 75, "elp": 2}"#,
    "\r\n",
    "\n",
    r#"{"result": [{"file": "a.bin", "url": "gftp://0x1/a"}, {"file": "b.bin", "url": "gftp://0x1/b"}]}"#,
    "\n",
    "unparseable { noise\n",
    r#"{"cur": 300, "tot": 300, "spc": 90, "spt": 80, "elp": 4}"#,
);

fn run_chunks(chunks: &[&[u8]]) -> OperationState {
    run_chunks_with(LineBuffer::new(), chunks)
}

fn run_chunks_with(mut buf: LineBuffer, chunks: &[&[u8]]) -> OperationState {
    let mut state = OperationState::new();
    for chunk in chunks {
        for line in buf.push(chunk) {
            handle_line(OperationKind::Download, &line, &mut state);
        }
    }
    if let Some(rest) = buf.finish() {
        handle_line(OperationKind::Download, &rest, &mut state);
    }
    state
}

/// Split `bytes` at the given (sorted, deduplicated) cut points.
fn split_at_points<'a>(bytes: &'a [u8], mut cuts: Vec<usize>) -> Vec<&'a [u8]> {
    cuts.iter_mut().for_each(|c| *c %= bytes.len() + 1);
    cuts.sort_unstable();
    cuts.dedup();

    let mut chunks = Vec::new();
    let mut start = 0;
    for cut in cuts {
        chunks.push(&bytes[start..cut]);
        start = cut;
    }
    chunks.push(&bytes[start..]);
    chunks
}

#[test]
fn whole_stream_produces_expected_state() {
    let state = run_chunks(&[STREAM.as_bytes()]);

    assert_eq!(state.published().len(), 2);
    assert_eq!(state.url(), Some("gftp://0x1/b"));
    assert_eq!(state.progress().map(|p| p.current), Some(300));
    assert!(state.error().is_none());
}

proptest! {
    #[test]
    fn final_state_does_not_depend_on_chunk_boundaries(
        cuts in proptest::collection::vec(any::<usize>(), 0..24)
    ) {
        let whole = run_chunks(&[STREAM.as_bytes()]);
        let chunks = split_at_points(STREAM.as_bytes(), cuts);
        let split = run_chunks(&chunks);

        prop_assert_eq!(split, whole);
    }

    #[test]
    fn dropping_long_lines_does_not_depend_on_chunk_boundaries(
        cuts in proptest::collection::vec(any::<usize>(), 0..24)
    ) {
        // Everything but the result batch fits.
        let limit = 60;
        let whole = run_chunks_with(LineBuffer::with_limit(limit), &[STREAM.as_bytes()]);
        let chunks = split_at_points(STREAM.as_bytes(), cuts);
        let split = run_chunks_with(LineBuffer::with_limit(limit), &chunks);

        prop_assert!(whole.published().is_empty());
        prop_assert_eq!(whole.progress().map(|p| p.current), Some(300));
        prop_assert_eq!(split, whole);
    }
}

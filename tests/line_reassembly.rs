//! Reassembly of lines split arbitrarily across receives.

mod common;

use common::{settings, Harness};
use proptest::prelude::*;
use slirc_client::{Event, LineBuffer};

fn line_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex(":[a-z]{1,9}![a-z]{1,9}@[a-z.]{1,20} PRIVMSG #[a-z]{1,10} :[ -~]{0,80}")
        .expect("valid regex")
}

proptest! {
    #[test]
    fn prop_chunking_does_not_change_lines(
        lines in prop::collection::vec(line_strategy(), 1..20),
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..30),
    ) {
        let stream: Vec<u8> = lines
            .iter()
            .flat_map(|line| format!("{line}\r\n").into_bytes())
            .collect();

        let mut points: Vec<usize> = cuts.iter().map(|i| i.index(stream.len())).collect();
        points.push(0);
        points.push(stream.len());
        points.sort_unstable();
        points.dedup();

        let mut buffer = LineBuffer::new();
        let mut received = Vec::new();
        for window in points.windows(2) {
            buffer.push(&stream[window[0]..window[1]]);
            received.extend(std::iter::from_fn(|| buffer.next_line()));
        }

        prop_assert_eq!(received, lines);
        prop_assert_eq!(buffer.pending(), 0);
    }
}

#[test]
fn test_client_handles_line_split_across_receives() {
    let mut h = Harness::new(settings());
    h.register();

    h.server.push(":alice!a@h PRIVMSG #c :hel");
    h.server.push("lo\r\n:alice!a@h PRIVMSG #c :again\r\n");
    h.think();
    assert!(h.recorder.take().is_empty());

    h.think();
    let chats: Vec<String> = h
        .recorder
        .take()
        .into_iter()
        .filter_map(|e| match e {
            Event::Chat { text, .. } => Some(text),
            _ => None,
        })
        .collect();
    assert_eq!(chats, vec!["hello", "again"]);
}

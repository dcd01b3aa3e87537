//! Fuzz target for line reassembly and message parsing
//!
//! Arbitrary bytes are fed through the line buffer, and every resulting
//! line through the parser and the mask splitter. None of them may panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use slirc_client::{LineBuffer, Message};

fuzz_target!(|data: &[u8]| {
    let mut buffer = LineBuffer::with_max_line_len(512);
    for chunk in data.chunks(7) {
        buffer.push(chunk);
        while let Some(line) = buffer.next_line() {
            let msg = Message::parse(&line);
            let _ = msg.numeric();
            let _ = msg.sender();
            let _ = msg.remainder();
            let _ = slirc_client::ctcp::parse_query(msg.trailing());
        }
    }
});

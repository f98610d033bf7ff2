//! Fuzz target for frame decoding
//!
//! Feeds arbitrary text to the decoder to find:
//! - Parser panics on malformed JSON or unexpected field types
//! - Accepted frames that do not survive re-encoding
//!
//! The decoder should NEVER panic. All invalid inputs return an error.

#![no_main]

use belay_proto::{decode, encode, Frame};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(message) = decode(&Frame::new(text)) {
        let reencoded = encode(&message);
        let decoded = decode(&reencoded).expect("encoded message must decode");
        assert_eq!(decoded, message);
    }
});

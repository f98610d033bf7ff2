//! Property-based tests for the envelope codec
//!
//! Verifies the round-trip law for all valid messages and that the decoder
//! rejects, rather than panics on, arbitrary input.

use belay_proto::{
    ChatMessage, DecodeError, Frame, MAX_MESSAGE_CHARS, MessageType, decode, encode,
};
use chrono::DateTime;
use proptest::prelude::*;

fn arbitrary_message_type() -> impl Strategy<Value = MessageType> {
    prop_oneof![Just(MessageType::Client), Just(MessageType::Server), Just(MessageType::System)]
}

/// Non-empty text of at most MAX_MESSAGE_CHARS characters, including
/// multi-byte and escaped characters.
fn arbitrary_text() -> impl Strategy<Value = String> {
    prop::collection::vec(any::<char>(), 1..=MAX_MESSAGE_CHARS)
        .prop_map(|chars| chars.into_iter().collect::<String>())
        .prop_filter("non-empty after trim", |s| !s.trim().is_empty())
}

fn arbitrary_message() -> impl Strategy<Value = ChatMessage> {
    (
        arbitrary_message_type(),
        1u64..u64::MAX,
        any::<u64>(),
        arbitrary_text(),
        // 1970 .. 2100, nanosecond precision
        (0i64..4_102_444_800, 0u32..1_000_000_000),
        prop::option::of("[0-9a-f]{16}"),
    )
        .prop_filter_map(
            "valid timestamp",
            |(message_type, room, sender_id, message, (secs, nanos), client_nonce)| {
                let sent_at = DateTime::from_timestamp(secs, nanos)?;
                Some(ChatMessage { message_type, room, sender_id, message, sent_at, client_nonce })
            },
        )
}

proptest! {
    #[test]
    fn prop_encode_decode_roundtrip(msg in arbitrary_message()) {
        let frame = encode(&msg);
        let decoded = decode(&frame);

        // PROPERTY: Round-trip must be identity
        prop_assert_eq!(decoded, Ok(msg));
    }

    #[test]
    fn prop_decode_never_panics(text in ".*") {
        let _ = decode(&Frame::from(text));
    }

    #[test]
    fn prop_unknown_types_are_classified(
        msg in arbitrary_message(),
        ty in "[A-Z]{1,12}".prop_filter("not a known type", |t| MessageType::from_wire(t).is_none()),
    ) {
        let known = format!("\"messageType\":\"{}\"", msg.message_type.as_str());
        let text = encode(&msg).into_text().replacen(&known, &format!("\"messageType\":\"{ty}\""), 1);

        prop_assert_eq!(decode(&Frame::from(text)), Err(DecodeError::UnknownType(ty)));
    }
}

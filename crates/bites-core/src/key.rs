//! Order-preserving key codec
//!
//! Keys have the layout `kind '+' conversation '@' start_be64`. For one
//! `(kind, conversation)` timeline the byte order of keys equals the numeric
//! order of `start`, and the prefix up to and including `'@'` selects exactly
//! that timeline because validated conversations never contain `'+'` or `'@'`.

use crate::error::KeyError;
use crate::identity::{ConversationId, ItemId, ItemKind};

/// Separates the kind tag from the conversation
pub const KIND_SEPARATOR: u8 = b'+';

/// Separates the conversation from the big-endian start offset
pub const CONVERSATION_SEPARATOR: u8 = b'@';

/// Width of the trailing offset
pub const START_LEN: usize = 8;

/// Encode the prefix shared by every key of one timeline
pub fn encode_prefix(kind: ItemKind, conversation: &str) -> Result<Vec<u8>, KeyError> {
    if !ConversationId::is_valid(conversation) {
        return Err(KeyError::InvalidIdentity(format!(
            "conversation {conversation:?} must match [A-Za-z0-9-]+"
        )));
    }

    let tag = kind.as_str();
    let mut key = Vec::with_capacity(tag.len() + conversation.len() + 2 + START_LEN);
    key.extend_from_slice(tag.as_bytes());
    key.push(KIND_SEPARATOR);
    key.extend_from_slice(conversation.as_bytes());
    key.push(CONVERSATION_SEPARATOR);
    Ok(key)
}

/// Encode the full key of one item
pub fn encode(kind: ItemKind, conversation: &str, start: u64) -> Result<Vec<u8>, KeyError> {
    let mut key = encode_prefix(kind, conversation)?;
    key.extend_from_slice(&start.to_be_bytes());
    Ok(key)
}

/// Split a stored key back into its identity
///
/// The `'@'` separator is searched from the end, in front of the fixed-width
/// offset, and the `'+'` separator from the end of what remains.
pub fn decode(bytes: &[u8]) -> Result<ItemId, KeyError> {
    if bytes.len() < START_LEN + 1 {
        return Err(KeyError::KeyParse(format!(
            "key of {} bytes is too short",
            bytes.len()
        )));
    }

    let head = &bytes[..bytes.len() - START_LEN];
    let at = head
        .iter()
        .rposition(|&b| b == CONVERSATION_SEPARATOR)
        .ok_or_else(|| KeyError::KeyParse("conversation separator not found".into()))?;

    let start_bytes: [u8; START_LEN] = bytes[at + 1..].try_into().map_err(|_| {
        KeyError::KeyParse(format!(
            "start offset is {} bytes, expected {START_LEN}",
            bytes.len() - at - 1
        ))
    })?;

    let plus = bytes[..at]
        .iter()
        .rposition(|&b| b == KIND_SEPARATOR)
        .ok_or_else(|| KeyError::KeyParse("kind separator not found".into()))?;

    let kind = std::str::from_utf8(&bytes[..plus])
        .map_err(|e| KeyError::KeyParse(e.to_string()))?
        .parse::<ItemKind>()
        .map_err(|e| KeyError::KeyParse(e.to_string()))?;
    let conversation = std::str::from_utf8(&bytes[plus + 1..at])
        .map_err(|e| KeyError::KeyParse(e.to_string()))
        .and_then(|s| ConversationId::parse(s).map_err(|e| KeyError::KeyParse(e.to_string())))?;

    Ok(ItemId {
        kind,
        conversation,
        start: u64::from_be_bytes(start_bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_encode_layout() {
        let key = encode(ItemKind::Segment, "conv1", 258).unwrap();
        assert_eq!(&key[..11], b"bite+conv1@");
        assert_eq!(&key[11..], &[0, 0, 0, 0, 0, 0, 1, 2]);

        let prefix = encode_prefix(ItemKind::Annotation, "conv1").unwrap();
        assert_eq!(prefix, b"user+conv1@");
        assert!(encode(ItemKind::Annotation, "conv1", 7).unwrap().starts_with(&prefix));
    }

    #[test]
    fn test_invalid_identity_rejected() {
        for bad in ["", "a@b", "a+b", "a b", "a\0b"] {
            assert!(matches!(
                encode(ItemKind::Segment, bad, 1),
                Err(KeyError::InvalidIdentity(_))
            ));
        }
    }

    #[test]
    fn test_round_trip_with_separator_bytes_in_start() {
        // 0x40 is '@' and 0x2b is '+'
        let starts = [
            0,
            1,
            0x40,
            0x2b,
            0x4040_4040_4040_4040,
            0x2b2b_2b2b_2b2b_2b2b,
            0x402b_402b_402b_402b,
            u64::MAX,
        ];
        for kind in ItemKind::ALL {
            for start in starts {
                let key = encode(kind, "Conv-9", start).unwrap();
                let id = decode(&key).unwrap();
                assert_eq!(id.kind, kind);
                assert_eq!(id.conversation.as_str(), "Conv-9");
                assert_eq!(id.start, start);
            }
        }
    }

    #[test]
    fn test_random_round_trip() {
        let mut rng = rand::rng();
        let alphabet = b"abcXYZ019-";
        for _ in 0..500 {
            let len = rng.random_range(1..24);
            let conversation: String = (0..len)
                .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
                .collect();
            let start: u64 = rng.random();
            let kind = ItemKind::ALL[rng.random_range(0..2)];

            let id = decode(&encode(kind, &conversation, start).unwrap()).unwrap();
            assert_eq!(
                (id.kind, id.conversation.as_str(), id.start),
                (kind, conversation.as_str(), start)
            );
        }
    }

    #[test]
    fn test_key_order_matches_start_order() {
        let mut rng = rand::rng();
        let mut starts: Vec<u64> = (0..256).map(|_| rng.random()).collect();
        starts.extend([0, 1, 255, 256, u64::MAX]);

        let mut keys: Vec<Vec<u8>> = starts
            .iter()
            .map(|&s| encode(ItemKind::Segment, "conv1", s).unwrap())
            .collect();
        keys.sort();
        starts.sort();

        let decoded: Vec<u64> = keys.iter().map(|k| decode(k).unwrap().start).collect();
        assert_eq!(decoded, starts);
    }

    #[test]
    fn test_prefix_does_not_cross_timelines() {
        let prefix = encode_prefix(ItemKind::Segment, "conv").unwrap();
        for other in ["conv1", "conv-1", "xconv", "con"] {
            let key = encode(ItemKind::Segment, other, 5).unwrap();
            assert!(!key.starts_with(&prefix), "{other} leaked into conv");
        }
        let annotation = encode(ItemKind::Annotation, "conv", 5).unwrap();
        assert!(!annotation.starts_with(&prefix));
    }

    #[test]
    fn test_decode_rejects_malformed_keys() {
        assert!(matches!(decode(b""), Err(KeyError::KeyParse(_))));
        assert!(matches!(decode(b"bite+conv1"), Err(KeyError::KeyParse(_))));
        assert!(matches!(decode(b"bite+conv112345678"), Err(KeyError::KeyParse(_))));
        assert!(matches!(decode(b"biteconv1@12345678"), Err(KeyError::KeyParse(_))));
        assert!(matches!(decode(b"bite+conv1@123456789"), Err(KeyError::KeyParse(_))));
        assert!(matches!(decode(b"blob+conv1@12345678"), Err(KeyError::KeyParse(_))));
    }
}

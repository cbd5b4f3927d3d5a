//! Item identity
//!
//! Every stored item is identified by `(kind, conversation, start)`:
//!
//! - [`ItemKind`]: segment ("bite") or annotation ("user")
//! - [`ConversationId`]: validated `[A-Za-z0-9-]+` timeline name
//! - `start`: `u64` offset, unique within one `(kind, conversation)` timeline

use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::KeyError;

/// Kind of a stored item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// Binary audio segment of a conversation ("bite")
    Segment,
    /// Annotation attached to a segment's offset ("user")
    Annotation,
}

impl ItemKind {
    /// Both kinds, in key order
    pub const ALL: [ItemKind; 2] = [ItemKind::Segment, ItemKind::Annotation];

    /// Tag used inside encoded keys
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Segment => "bite",
            ItemKind::Annotation => "user",
        }
    }
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemKind {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bite" => Ok(ItemKind::Segment),
            "user" => Ok(ItemKind::Annotation),
            other => Err(KeyError::InvalidIdentity(format!("unknown kind {other:?}"))),
        }
    }
}

/// A validated conversation identifier
///
/// Only ASCII letters, digits and `-` are accepted, so the key separators
/// `+` and `@` can never occur inside it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConversationId(String);

impl ConversationId {
    /// Validate and wrap a conversation identifier
    pub fn parse(s: &str) -> Result<Self, KeyError> {
        if Self::is_valid(s) {
            Ok(Self(s.to_owned()))
        } else {
            Err(KeyError::InvalidIdentity(format!(
                "conversation {s:?} must match [A-Za-z0-9-]+"
            )))
        }
    }

    /// Check a candidate identifier without allocating
    pub fn is_valid(s: &str) -> bool {
        !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ConversationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Fully decoded identity of one stored item
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemId {
    pub kind: ItemKind,
    pub conversation: ConversationId,
    pub start: u64,
}

impl Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}@{}", self.kind, self.conversation, self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in ItemKind::ALL {
            assert_eq!(kind.as_str().parse::<ItemKind>().unwrap(), kind);
        }
        assert!(matches!(
            "bites".parse::<ItemKind>(),
            Err(KeyError::InvalidIdentity(_))
        ));
        assert!("".parse::<ItemKind>().is_err());
    }

    #[test]
    fn test_conversation_validation() {
        assert!(ConversationId::parse("conv1").is_ok());
        assert!(ConversationId::parse("Call-2024-01-a").is_ok());
        assert!(ConversationId::parse("-").is_ok());

        for bad in ["", "a+b", "a@b", "with space", "under_score", "ünïcode", "a/b"] {
            assert!(
                matches!(ConversationId::parse(bad), Err(KeyError::InvalidIdentity(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_item_id_display() {
        let id = ItemId {
            kind: ItemKind::Annotation,
            conversation: ConversationId::parse("conv1").unwrap(),
            start: 42,
        };
        assert_eq!(id.to_string(), "user+conv1@42");
    }
}

//! Windowed range scans with previous/next hints
//!
//! The scanner runs over [`OrderedKeys`], a read snapshot that can walk keys
//! in either direction from a seek position. Prefix testing stays here, so a
//! backend only has to provide ordered iteration.

use std::collections::BTreeMap;
use std::ops::{Bound, ControlFlow};

use bites_core::{ItemKind, RangeResponse, key};
use tracing::debug;

use crate::error::{ServiceError, StorageError};
use crate::store::ItemStore;

/// Callback driven by a key walk; `Break` stops the walk
pub type KeyVisitor<'a> = dyn FnMut(&[u8]) -> ControlFlow<()> + 'a;

/// Ordered iteration over one consistent snapshot of the key space
pub trait OrderedKeys {
    /// Visit keys `<= from` in descending order
    fn walk_back(&self, from: &[u8], visit: &mut KeyVisitor<'_>) -> Result<(), StorageError>;

    /// Visit keys `>= from` in ascending order
    fn walk_forward(&self, from: &[u8], visit: &mut KeyVisitor<'_>) -> Result<(), StorageError>;
}

impl<V> OrderedKeys for BTreeMap<Vec<u8>, V> {
    fn walk_back(&self, from: &[u8], visit: &mut KeyVisitor<'_>) -> Result<(), StorageError> {
        for key in self
            .range::<[u8], _>((Bound::Unbounded, Bound::Included(from)))
            .rev()
            .map(|(k, _)| k)
        {
            if visit(key).is_break() {
                break;
            }
        }
        Ok(())
    }

    fn walk_forward(&self, from: &[u8], visit: &mut KeyVisitor<'_>) -> Result<(), StorageError> {
        for key in self
            .range::<[u8], _>((Bound::Included(from), Bound::Unbounded))
            .map(|(k, _)| k)
        {
            if visit(key).is_break() {
                break;
            }
        }
        Ok(())
    }
}

/// Scan one timeline of `store` for starts in `[from, to]`
///
/// Identity is validated before the store is touched.
pub fn scan<S: ItemStore + ?Sized>(
    store: &S,
    kind: ItemKind,
    conversation: &str,
    from: u64,
    to: u64,
) -> Result<RangeResponse, ServiceError> {
    let prefix = key::encode_prefix(kind, conversation)?;
    let from_key = key::encode(kind, conversation, from)?;
    Ok(store.scan_window(&prefix, &from_key, to)?)
}

/// Core window algorithm over one snapshot
///
/// `previous` is the nearest start strictly before `from_key`, `items` the
/// starts from `from_key` up to `to` inclusive, and `next` the first start
/// beyond `to`. Keys outside `prefix` end a walk; keys inside it that fail to
/// decode are skipped.
pub fn scan_window<K: OrderedKeys + ?Sized>(
    keys: &K,
    prefix: &[u8],
    from_key: &[u8],
    to: u64,
) -> Result<RangeResponse, StorageError> {
    let mut response = RangeResponse::default();

    keys.walk_back(from_key, &mut |key: &[u8]| {
        if key == from_key {
            return ControlFlow::Continue(());
        }
        if !key.starts_with(prefix) {
            return ControlFlow::Break(());
        }
        match key::decode(key) {
            Ok(id) => {
                response.previous = Some(id.start);
                ControlFlow::Break(())
            }
            Err(e) => {
                debug!(key = %hex::encode(key), error = %e, "Skipping undecodable key");
                ControlFlow::Continue(())
            }
        }
    })?;

    keys.walk_forward(from_key, &mut |key: &[u8]| {
        if !key.starts_with(prefix) {
            return ControlFlow::Break(());
        }
        match key::decode(key) {
            Ok(id) if id.start > to => {
                response.next = Some(id.start);
                ControlFlow::Break(())
            }
            Ok(id) => {
                response.items.push(id.start);
                ControlFlow::Continue(())
            }
            Err(e) => {
                debug!(key = %hex::encode(key), error = %e, "Skipping undecodable key");
                ControlFlow::Continue(())
            }
        }
    })?;

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timeline(entries: &[(ItemKind, &str, u64)]) -> BTreeMap<Vec<u8>, ()> {
        entries
            .iter()
            .map(|&(kind, conv, start)| (key::encode(kind, conv, start).unwrap(), ()))
            .collect()
    }

    fn window(keys: &BTreeMap<Vec<u8>, ()>, conv: &str, from: u64, to: u64) -> RangeResponse {
        let prefix = key::encode_prefix(ItemKind::Segment, conv).unwrap();
        let from_key = key::encode(ItemKind::Segment, conv, from).unwrap();
        scan_window(keys, &prefix, &from_key, to).unwrap()
    }

    fn conv1() -> BTreeMap<Vec<u8>, ()> {
        timeline(&[
            (ItemKind::Segment, "conv1", 10),
            (ItemKind::Segment, "conv1", 20),
            (ItemKind::Segment, "conv1", 30),
            (ItemKind::Segment, "conv1", 40),
        ])
    }

    #[test]
    fn test_window_with_hints() {
        let resp = window(&conv1(), "conv1", 15, 35);
        assert_eq!(resp.previous, Some(10));
        assert_eq!(resp.items, vec![20, 30]);
        assert_eq!(resp.next, Some(40));
    }

    #[test]
    fn test_previous_excludes_exact_from() {
        let resp = window(&conv1(), "conv1", 20, 35);
        assert_eq!(resp.previous, Some(10));
        assert_eq!(resp.items, vec![20, 30]);
        assert_eq!(resp.next, Some(40));
    }

    #[test]
    fn test_inclusive_bounds() {
        let resp = window(&conv1(), "conv1", 10, 40);
        assert_eq!(resp.previous, None);
        assert_eq!(resp.items, vec![10, 20, 30, 40]);
        assert_eq!(resp.next, None);
    }

    #[test]
    fn test_window_past_the_end() {
        let resp = window(&conv1(), "conv1", 41, 100);
        assert_eq!(resp.previous, Some(40));
        assert!(resp.items.is_empty());
        assert_eq!(resp.next, None);
    }

    #[test]
    fn test_inverted_window() {
        let resp = window(&conv1(), "conv1", 25, 5);
        assert!(resp.items.is_empty());
        assert_eq!(resp.previous, Some(20));
        assert_eq!(resp.next, Some(30));
    }

    #[test]
    fn test_unknown_conversation_is_empty() {
        let resp = window(&conv1(), "conv2", 0, u64::MAX);
        assert_eq!(resp, RangeResponse::default());
    }

    #[test]
    fn test_start_zero_is_a_real_previous() {
        let keys = timeline(&[
            (ItemKind::Segment, "conv1", 0),
            (ItemKind::Segment, "conv1", 5),
        ]);
        let resp = window(&keys, "conv1", 3, 10);
        assert_eq!(resp.previous, Some(0));
        assert_eq!(resp.items, vec![5]);
    }

    #[test]
    fn test_no_cross_timeline_leakage() {
        let keys = timeline(&[
            (ItemKind::Segment, "conv", 5),
            (ItemKind::Segment, "conv", 15),
            // Neighbours whose names extend or shorten "conv"
            (ItemKind::Segment, "con", 10),
            (ItemKind::Segment, "conv1", 10),
            (ItemKind::Segment, "conv-1", 10),
            (ItemKind::Segment, "xconv", 10),
            (ItemKind::Annotation, "conv", 10),
        ]);

        let resp = window(&keys, "conv", 0, u64::MAX);
        assert_eq!(resp.items, vec![5, 15]);
        assert_eq!(resp.previous, None);
        assert_eq!(resp.next, None);

        let resp = window(&keys, "conv", 6, 14);
        assert!(resp.items.is_empty());
        assert_eq!(resp.previous, Some(5));
        assert_eq!(resp.next, Some(15));
    }

    #[test]
    fn test_undecodable_keys_are_skipped() {
        let mut keys = conv1();
        // In-prefix keys with a 9-byte offset, one on each side of from=15
        keys.insert(b"bite+conv1@\x00\x00\x00\x00\x00\x00\x00\x0c\x00".to_vec(), ());
        keys.insert(b"bite+conv1@\x00\x00\x00\x00\x00\x00\x00\x0f\x01".to_vec(), ());

        let resp = window(&keys, "conv1", 15, 35);
        assert_eq!(resp.previous, Some(10));
        assert_eq!(resp.items, vec![20, 30]);
        assert_eq!(resp.next, Some(40));
    }

    #[test]
    fn test_items_follow_start_order_not_insert_order() {
        use rand::seq::SliceRandom;

        let mut starts: Vec<u64> = (0..64).map(|i| i * 1000 + 7).collect();
        starts.shuffle(&mut rand::rng());

        let mut keys = BTreeMap::new();
        for start in &starts {
            keys.insert(key::encode(ItemKind::Segment, "conv1", *start).unwrap(), ());
        }

        let resp = window(&keys, "conv1", 0, u64::MAX);
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(resp.items, sorted);
    }
}

//! Order-preserving page merges.
//!
//! Pages fetched through cursor pagination can overlap: a comment created
//! while the reader paginates shifts page boundaries, and a retried request
//! can return a page the cache already holds. Merging by id keeps the list
//! stable under both.
//!
//! ## Merge contract
//!
//! - Ids already present keep their original position; the incoming copy
//!   replaces the held copy in that slot.
//! - Genuinely new ids are appended (or prepended) in incoming order.
//! - Merging the same page twice changes nothing: no duplicates, no
//!   reordering.

use crate::comments::types::CommentId;
use crate::comments::Comment;
use std::collections::HashMap;

/// Where genuinely new entries land relative to the existing list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePosition {
    /// New entries go after the existing list (pagination).
    Append,
    /// New entries go before the existing list (optimistic create).
    Prepend,
}

/// Merges `incoming` into `existing`, keyed by comment id.
///
/// Same-id entries are replacements-in-place: the incoming copy wins the
/// slot but never moves it. A slower response can therefore overwrite a
/// newer local copy of the same comment; callers needing upsert semantics
/// with conflict resolution must diff before merging. Duplicate ids within
/// `incoming` collapse to the last copy.
///
/// # Arguments
/// * `existing` - The list currently held by the thread state
/// * `incoming` - The freshly fetched (or created) comments
/// * `position` - Where unseen ids are inserted
///
/// # Returns
/// The merged list. `existing` ids retain their relative order.
pub fn merge_preserve_order_by_id(
    existing: &[Comment],
    incoming: Vec<Comment>,
    position: MergePosition,
) -> Vec<Comment> {
    let mut merged: Vec<Comment> = existing.to_vec();
    let index: HashMap<CommentId, usize> = merged
        .iter()
        .enumerate()
        .map(|(pos, comment)| (comment.id.clone(), pos))
        .collect();

    let mut fresh: Vec<Comment> = Vec::new();
    for comment in incoming {
        match index.get(&comment.id) {
            // Known id: latest fetched copy wins the slot, position unchanged
            Some(&pos) => merged[pos] = comment,
            None => {
                if let Some(slot) = fresh.iter_mut().find(|c| c.id == comment.id) {
                    *slot = comment;
                } else {
                    fresh.push(comment);
                }
            }
        }
    }

    match position {
        MergePosition::Append => {
            merged.extend(fresh);
            merged
        }
        MergePosition::Prepend => {
            fresh.extend(merged);
            fresh
        }
    }
}

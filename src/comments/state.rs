//! In-memory thread state for the comment cache.
//!
//! ## Thread layout
//!
//! ```text
//! ThreadKey::Root          -> top-level comments, in display order
//! ThreadKey::Reply(c1)     -> flattened replies under top-level comment c1
//! ThreadKey::Reply(c9)     -> flattened replies under top-level comment c9
//! ```
//!
//! Every comment belongs to exactly one entry. Entries are created empty
//! before their first load and are never explicitly destroyed; they live
//! for the lifetime of the owning store.
//!
//! The `loading`/`saving` flags are advisory guards for the single-threaded
//! event-loop model this cache is designed for, not atomic locks.

use crate::comments::types::{CommentId, Cursor, ThreadKey};
use crate::comments::Comment;
use std::collections::HashMap;

/// State of a single thread: one page-merged comment list plus fetch
/// bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct ThreadState {
    /// Comments in display order.
    pub comments: Vec<Comment>,
    /// Advisory guard for an in-flight fetch.
    pub loading: bool,
    /// Advisory guard for an in-flight create/reply call.
    pub saving: bool,
    /// Cursor for the next page, if the remote reported more.
    pub next_cursor: Option<Cursor>,
    /// Last operation failure. Cleared when the next operation starts.
    pub error: Option<String>,
}

impl ThreadState {
    /// Returns true if another page can be fetched.
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }

    /// Looks up a comment held by this thread.
    pub fn comment(&self, id: &CommentId) -> Option<&Comment> {
        self.comments.iter().find(|c| &c.id == id)
    }

    /// Looks up a comment held by this thread, mutably.
    pub fn comment_mut(&mut self, id: &CommentId) -> Option<&mut Comment> {
        self.comments.iter_mut().find(|c| &c.id == id)
    }

    /// Returns true if this thread holds the given comment.
    pub fn contains(&self, id: &CommentId) -> bool {
        self.comment(id).is_some()
    }
}

/// All thread states for one resource, keyed by thread.
#[derive(Debug, Clone)]
pub struct ThreadMap {
    threads: HashMap<ThreadKey, ThreadState>,
}

impl ThreadMap {
    /// Creates a thread map with an empty root entry.
    pub fn new() -> Self {
        let mut threads = HashMap::new();
        threads.insert(ThreadKey::Root, ThreadState::default());
        Self { threads }
    }

    /// Returns the root thread state.
    pub fn root(&self) -> &ThreadState {
        // The root entry is inserted in new() and never removed
        self.threads
            .get(&ThreadKey::Root)
            .expect("root thread entry always present")
    }

    /// Returns a thread state, if the entry exists.
    pub fn thread(&self, key: &ThreadKey) -> Option<&ThreadState> {
        self.threads.get(key)
    }

    /// Returns a thread state, creating an empty entry if absent.
    pub fn entry(&mut self, key: ThreadKey) -> &mut ThreadState {
        self.threads.entry(key).or_default()
    }

    /// Returns the number of thread entries (root included).
    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Iterates over all thread entries.
    pub fn iter(&self) -> impl Iterator<Item = (&ThreadKey, &ThreadState)> {
        self.threads.iter()
    }

    /// Iterates over every comment in every thread.
    pub fn iter_comments(&self) -> impl Iterator<Item = &Comment> {
        self.threads.values().flat_map(|state| state.comments.iter())
    }

    /// Looks up a comment across all threads.
    pub fn comment(&self, id: &CommentId) -> Option<&Comment> {
        self.threads.values().find_map(|state| state.comment(id))
    }

    /// Returns the key of the thread holding the given comment.
    pub fn owning_thread(&self, id: &CommentId) -> Option<ThreadKey> {
        self.threads
            .iter()
            .find(|(_, state)| state.contains(id))
            .map(|(key, _)| key.clone())
    }

    /// Returns true if any loaded comment names `id` as its parent.
    ///
    /// This only sees the loaded window; replies known to the remote but
    /// not yet fetched are reflected in the comment's `reply_count`.
    pub fn has_loaded_descendants(&self, id: &CommentId) -> bool {
        self.iter_comments()
            .any(|c| c.parent_id.as_ref() == Some(id))
    }
}

impl Default for ThreadMap {
    fn default() -> Self {
        Self::new()
    }
}

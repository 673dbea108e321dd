//! Identifier and enumeration types for the comment cache.
//!
//! Identifiers assigned by the remote API (`CommentId`, `AuthorId`,
//! `ResourceId`, `Cursor`) are opaque strings wrapped in newtypes so they
//! cannot be confused with each other at call sites. `ThreadKey` addresses a
//! thread-state entry: the synthetic root, or a top-level comment id acting
//! as a reply-thread id.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a comment, assigned by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(String);

impl CommentId {
    /// Creates a comment id from its string form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string form of the id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CommentId {
    fn from(id: String) -> Self {
        CommentId::new(id)
    }
}

impl From<&str> for CommentId {
    fn from(id: &str) -> Self {
        CommentId::new(id)
    }
}

/// Opaque identifier of a comment author (a member account).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(String);

impl AuthorId {
    /// Creates an author id from its string form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string form of the id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier of the resource comments hang off (an article, a
/// product page, a post).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Creates a resource id from its string form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string form of the id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque pagination token returned by the remote API.
///
/// A cursor addresses a specific thread; the client never inspects it,
/// only hands it back to continue that thread's listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    /// Creates a cursor from its string form.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the string form of the token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Publication status of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentStatus {
    /// Held for moderation, not yet visible to other readers.
    Pending,
    /// Visible to all readers.
    Published,
    /// Deleted; retained only as a tombstone for thread structure.
    Deleted,
}

impl CommentStatus {
    /// Returns true if the comment should be rendered with its content.
    pub fn is_visible(&self) -> bool {
        matches!(self, CommentStatus::Published)
    }

    /// Returns true if the comment is a deletion tombstone.
    pub fn is_deleted(&self) -> bool {
        matches!(self, CommentStatus::Deleted)
    }
}

impl fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentStatus::Pending => write!(f, "PENDING"),
            CommentStatus::Published => write!(f, "PUBLISHED"),
            CommentStatus::Deleted => write!(f, "DELETED"),
        }
    }
}

/// Sort direction for top-level comment listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommentSort {
    /// Most recently created comments first.
    NewestFirst,
    /// Oldest comments first.
    OldestFirst,
}

impl Default for CommentSort {
    fn default() -> Self {
        CommentSort::NewestFirst
    }
}

impl fmt::Display for CommentSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentSort::NewestFirst => write!(f, "NEWEST_FIRST"),
            CommentSort::OldestFirst => write!(f, "OLDEST_FIRST"),
        }
    }
}

/// Addresses one thread-state entry in the cache.
///
/// The root entry holds top-level comments; each top-level comment with
/// replies owns its own entry keyed by its id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ThreadKey {
    /// The synthetic root thread of top-level comments.
    Root,
    /// The reply thread owned by a top-level comment.
    Reply(CommentId),
}

impl ThreadKey {
    /// Creates a reply-thread key for a top-level comment.
    pub fn reply(id: impl Into<CommentId>) -> Self {
        ThreadKey::Reply(id.into())
    }

    /// Returns true if this is the root thread key.
    pub fn is_root(&self) -> bool {
        matches!(self, ThreadKey::Root)
    }
}

impl From<CommentId> for ThreadKey {
    fn from(id: CommentId) -> Self {
        ThreadKey::Reply(id)
    }
}

impl fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadKey::Root => write!(f, "root"),
            ThreadKey::Reply(id) => write!(f, "{}", id),
        }
    }
}

/// Returns the current timestamp in milliseconds since the Unix epoch.
pub fn current_timestamp_millis() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}

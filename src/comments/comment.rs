//! Comment records held by the thread cache.
//!
//! A comment is identified by an opaque id assigned by the remote API. Its
//! body is rich text modeled as ordered paragraphs. Author references are
//! ids on the wire; resolved member profiles are attached client-side after
//! fetch (see the `members` module).
//!
//! Deleting a comment that still has replies must not break the thread
//! shape, so such comments become tombstones: status `DELETED`, body and
//! author redacted, id and parent linkage preserved.

use crate::comments::constants::{MAX_COMMENT_BODY_SIZE, MAX_PARAGRAPH_COUNT};
use crate::comments::members::MemberProfile;
use crate::comments::types::{
    current_timestamp_millis, AuthorId, CommentId, CommentStatus, ResourceId,
};
use crate::error::{Result, ThreadlineError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rich-text body of a comment, as ordered paragraphs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentContent {
    /// Paragraphs in reading order.
    pub paragraphs: Vec<String>,
}

impl fmt::Debug for CommentContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommentContent")
            .field("paragraph_count", &self.paragraphs.len())
            .field("byte_len", &self.byte_len())
            .finish()
    }
}

impl CommentContent {
    /// Creates a comment body from paragraphs.
    ///
    /// # Errors
    /// Returns an error if:
    /// - No paragraph carries any text
    /// - More than [`MAX_PARAGRAPH_COUNT`] paragraphs are given
    /// - The combined body exceeds [`MAX_COMMENT_BODY_SIZE`] bytes
    pub fn new(paragraphs: Vec<String>) -> Result<Self> {
        if paragraphs.iter().all(|p| p.trim().is_empty()) {
            return Err(ThreadlineError::invalid_input(
                "Comment body cannot be empty",
            ));
        }
        if paragraphs.len() > MAX_PARAGRAPH_COUNT {
            return Err(ThreadlineError::invalid_input(format!(
                "Comment cannot have more than {} paragraphs",
                MAX_PARAGRAPH_COUNT
            )));
        }
        let content = Self { paragraphs };
        if content.byte_len() > MAX_COMMENT_BODY_SIZE {
            return Err(ThreadlineError::invalid_input(format!(
                "Comment body exceeds maximum size of {} bytes",
                MAX_COMMENT_BODY_SIZE
            )));
        }
        Ok(content)
    }

    /// Creates a single-paragraph body from plain text.
    pub fn plain(text: impl Into<String>) -> Result<Self> {
        Self::new(vec![text.into()])
    }

    /// Returns the body flattened to plain text, paragraphs separated by
    /// blank lines.
    pub fn to_plain_text(&self) -> String {
        self.paragraphs.join("\n\n")
    }

    /// Returns the combined byte length of all paragraphs.
    pub fn byte_len(&self) -> usize {
        self.paragraphs.iter().map(String::len).sum()
    }
}

/// A comment as held by the cache.
///
/// `author` and `parent_author` are resolved member profiles attached after
/// fetch; on the wire only the id references travel.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Unique comment id.
    pub id: CommentId,
    /// The resource this comment belongs to.
    pub resource_id: ResourceId,
    /// Rich-text body. `None` on tombstones.
    pub content: Option<CommentContent>,
    /// Author reference. `None` on tombstones.
    pub author_id: Option<AuthorId>,
    /// Resolved author profile, attached after fetch.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub author: Option<MemberProfile>,
    /// Parent comment, when this is a reply.
    pub parent_id: Option<CommentId>,
    /// Resolved profile of the parent comment's author, attached after fetch.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent_author: Option<MemberProfile>,
    /// Publication status.
    pub status: CommentStatus,
    /// Number of replies, maintained by the remote API and mirrored locally.
    pub reply_count: u64,
    /// Creation timestamp in milliseconds since the Unix epoch.
    pub created_at: u64,
}

impl fmt::Debug for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Comment")
            .field("id", &self.id)
            .field("parent_id", &self.parent_id)
            .field("status", &self.status)
            .field("reply_count", &self.reply_count)
            .field("body_len", &self.content.as_ref().map(CommentContent::byte_len))
            .finish()
    }
}

impl Comment {
    /// Creates a published comment record.
    ///
    /// Backends assign the id; the client only ever receives comments, it
    /// never constructs ids itself.
    pub fn new(
        id: CommentId,
        resource_id: ResourceId,
        content: CommentContent,
        author_id: AuthorId,
        parent_id: Option<CommentId>,
    ) -> Self {
        Self {
            id,
            resource_id,
            content: Some(content),
            author_id: Some(author_id),
            author: None,
            parent_id,
            parent_author: None,
            status: CommentStatus::Published,
            reply_count: 0,
            created_at: current_timestamp_millis(),
        }
    }

    /// Converts this comment into a deletion tombstone in place.
    ///
    /// The id, parent linkage and reply count survive so the thread shape
    /// stays intact; body and author references are redacted.
    pub fn tombstone(&mut self) {
        self.status = CommentStatus::Deleted;
        self.content = None;
        self.author_id = None;
        self.author = None;
        self.parent_author = None;
    }

    /// Returns true if this comment is a deletion tombstone.
    pub fn is_tombstone(&self) -> bool {
        self.status.is_deleted()
    }

    /// Returns true if this comment is a reply (has a parent).
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

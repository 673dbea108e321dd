//! Wire contract for the remote comment API and member directory.
//!
//! ## Pagination model
//!
//! Listing is cursor-based. A first-page request (no cursor) returns the
//! top-level page for the resource plus an inline map of reply-thread
//! first pages, each with its own cursor. A cursor addresses one specific
//! thread: continuing a cursor returns that thread's next page and nothing
//! else.
//!
//! 1. Client sends `{ resource_id, sort, cursor: None, page sizes }`
//! 2. Server returns the root page, inline reply threads, and cursors
//! 3. Client merges pages by id and keeps the cursors per thread
//! 4. `cursor: Some(..)` requests continue one thread until its cursor
//!    comes back `None`
//!
//! Page sizes are capped server-side; the request types clamp them to the
//! same maxima so an oversized ask never leaves the client.

use crate::comments::constants::{
    DEFAULT_PAGE_SIZE, DEFAULT_REPLY_PAGE_SIZE, MAX_PAGE_SIZE, MAX_REPLY_PAGE_SIZE,
};
use crate::comments::members::MemberProfile;
use crate::comments::types::{AuthorId, CommentId, CommentSort, Cursor, ResourceId};
use crate::comments::{Comment, CommentContent};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Request to list comments for a resource.
///
/// ## Usage
///
/// 1. First page: `cursor = None`
/// 2. The response carries per-thread `next_cursor` values
/// 3. Continue any thread by sending its cursor back
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListCommentsRequest {
    /// The resource whose comments are listed.
    pub resource_id: ResourceId,
    /// Sort direction for top-level comments.
    pub sort: CommentSort,
    /// Continuation cursor from a previous response. `None` fetches the
    /// first page plus inline reply threads.
    pub cursor: Option<Cursor>,
    /// Maximum top-level comments per page. Defaults to
    /// `DEFAULT_PAGE_SIZE`, capped at `MAX_PAGE_SIZE`.
    pub page_size: Option<usize>,
    /// Maximum replies per inline reply-thread page. Defaults to
    /// `DEFAULT_REPLY_PAGE_SIZE`, capped at `MAX_REPLY_PAGE_SIZE`.
    pub reply_page_size: Option<usize>,
}

impl ListCommentsRequest {
    /// Creates a first-page request.
    pub fn new(resource_id: ResourceId, sort: CommentSort) -> Self {
        Self {
            resource_id,
            sort,
            cursor: None,
            page_size: None,
            reply_page_size: None,
        }
    }

    /// Continues a thread from a cursor returned by a previous response.
    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Sets the top-level page size for this request.
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size.min(MAX_PAGE_SIZE));
        self
    }

    /// Sets the inline reply-thread page size for this request.
    pub fn with_reply_page_size(mut self, size: usize) -> Self {
        self.reply_page_size = Some(size.min(MAX_REPLY_PAGE_SIZE));
        self
    }

    /// Returns the effective top-level page size (applies defaults and limits).
    pub fn effective_page_size(&self) -> usize {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE)
    }

    /// Returns the effective reply page size (applies defaults and limits).
    pub fn effective_reply_page_size(&self) -> usize {
        self.reply_page_size
            .unwrap_or(DEFAULT_REPLY_PAGE_SIZE)
            .min(MAX_REPLY_PAGE_SIZE)
    }
}

/// One page of a single thread's comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentPage {
    /// Comments in display order.
    pub comments: Vec<Comment>,
    /// Cursor for the next page of this thread, if more exist.
    pub next_cursor: Option<Cursor>,
    /// Total comments in the thread (optional, for progress display).
    pub total: Option<usize>,
}

impl CommentPage {
    /// Creates an empty page.
    pub fn new() -> Self {
        Self {
            comments: Vec::new(),
            next_cursor: None,
            total: None,
        }
    }

    /// Sets the comments and continuation cursor for this page.
    pub fn with_comments(mut self, comments: Vec<Comment>, next_cursor: Option<Cursor>) -> Self {
        self.comments = comments;
        self.next_cursor = next_cursor;
        self
    }

    /// Sets the thread total.
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }
}

impl Default for CommentPage {
    fn default() -> Self {
        Self::new()
    }
}

/// Response to a list request.
///
/// For a first-page request, `page` is the top-level page and
/// `reply_threads` maps each top-level comment id (with replies) to that
/// thread's inline first page. For a cursor continuation, `page` is the
/// continued thread's next page and `reply_threads` is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListCommentsResponse {
    /// The page addressed by the request.
    pub page: CommentPage,
    /// Inline reply-thread first pages, keyed by top-level comment id.
    #[serde(default)]
    pub reply_threads: HashMap<CommentId, CommentPage>,
}

impl ListCommentsResponse {
    /// Creates a response holding one page.
    pub fn new(page: CommentPage) -> Self {
        Self {
            page,
            reply_threads: HashMap::new(),
        }
    }

    /// Adds an inline reply thread to the response.
    pub fn with_reply_thread(mut self, parent: CommentId, page: CommentPage) -> Self {
        self.reply_threads.insert(parent, page);
        self
    }
}

/// Request to create a comment or reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    /// The resource the comment belongs to.
    pub resource_id: ResourceId,
    /// The body to publish.
    pub content: CommentContent,
    /// Parent comment when creating a reply.
    pub parent_id: Option<CommentId>,
}

impl CreateCommentRequest {
    /// Creates a top-level comment request.
    pub fn new(resource_id: ResourceId, content: CommentContent) -> Self {
        Self {
            resource_id,
            content,
            parent_id: None,
        }
    }

    /// Scopes the request to a parent, making it a reply.
    pub fn with_parent(mut self, parent_id: CommentId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Remote comment API collaborator.
///
/// Implementations own the transport; the store only sees these three
/// operations. All methods are total per-call: an error describes one
/// failed operation and the next call starts fresh.
#[async_trait]
pub trait CommentsApi: Send + Sync {
    /// Lists comments for a resource, first page or cursor continuation.
    async fn list_comments_by_resource(
        &self,
        request: ListCommentsRequest,
    ) -> Result<ListCommentsResponse>;

    /// Creates a comment or reply, returning the stored record.
    async fn create_comment(&self, request: CreateCommentRequest) -> Result<Comment>;

    /// Deletes a comment by id.
    async fn delete_comment(&self, comment_id: &CommentId) -> Result<()>;
}

/// Remote member-lookup collaborator.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// Resolves a member profile. `Ok(None)` when the member does not
    /// exist; `Err` only for transport failures.
    async fn member_profile(&self, author_id: &AuthorId) -> Result<Option<MemberProfile>>;
}

// Shared handles delegate, so one backend can serve a store and still be
// reachable by its owner (tests, multi-store setups).

#[async_trait]
impl<T: CommentsApi + ?Sized> CommentsApi for Arc<T> {
    async fn list_comments_by_resource(
        &self,
        request: ListCommentsRequest,
    ) -> Result<ListCommentsResponse> {
        (**self).list_comments_by_resource(request).await
    }

    async fn create_comment(&self, request: CreateCommentRequest) -> Result<Comment> {
        (**self).create_comment(request).await
    }

    async fn delete_comment(&self, comment_id: &CommentId) -> Result<()> {
        (**self).delete_comment(comment_id).await
    }
}

#[async_trait]
impl<T: MemberDirectory + ?Sized> MemberDirectory for Arc<T> {
    async fn member_profile(&self, author_id: &AuthorId) -> Result<Option<MemberProfile>> {
        (**self).member_profile(author_id).await
    }
}

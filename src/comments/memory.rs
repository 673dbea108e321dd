//! In-memory comment backend.
//!
//! Implements both collaborator traits entirely in memory: a per-resource
//! comment log in arrival order, offset-coded opaque cursors, sort applied
//! at query time, and inline reply-thread first pages on first-page
//! listings. The integration tests drive the store against this backend;
//! downstream consumers can use it as a test double, and it doubles as the
//! reference behavior for a conforming remote backend.
//!
//! ## Cursor encoding
//!
//! Cursors are `thread:sort:offset` internally (the root sentinel or a
//! top-level comment id, a sort tag, and the next offset). Clients treat
//! them as opaque tokens; a cursor pins the sort it was minted under, so a
//! continuation is stable even if the caller's sort signal has moved on.
//!
//! Arrival order stands in for created-at order: newest-first listings
//! reverse it, and flattened reply threads always read oldest first.

use crate::comments::api::{
    CommentsApi, CreateCommentRequest, ListCommentsRequest, ListCommentsResponse, MemberDirectory,
};
use crate::comments::members::MemberProfile;
use crate::comments::types::{AuthorId, CommentId, CommentSort, Cursor, ResourceId};
use crate::comments::{Comment, CommentContent, CommentPage};
use crate::error::{Result, ThreadlineError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// Thread tag used in cursors for the top-level listing.
const ROOT_CURSOR_THREAD: &str = "root";

#[derive(Debug, Default)]
struct CommentsInner {
    /// Per-resource comment logs, in arrival order (oldest first).
    resources: HashMap<ResourceId, Vec<Comment>>,
    /// Next id suffix to assign.
    next_id: u64,
    /// Author attributed to created comments.
    current_author: Option<AuthorId>,
    /// One-shot armed failure, consumed by the next API call.
    fail_next: Option<ThreadlineError>,
    /// Number of successfully served list calls.
    list_calls: usize,
}

impl CommentsInner {
    fn take_failure(&mut self) -> Result<()> {
        match self.fail_next.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn allocate_id(&mut self) -> CommentId {
        self.next_id += 1;
        CommentId::new(format!("c{}", self.next_id))
    }

    /// Inserts a comment, bumping reply counts on the direct parent and
    /// the top-of-thread ancestor when different.
    fn insert_comment(
        &mut self,
        resource_id: &ResourceId,
        author: AuthorId,
        parent_id: Option<CommentId>,
        content: CommentContent,
    ) -> Result<Comment> {
        let id = self.allocate_id();
        let comments = self.resources.entry(resource_id.clone()).or_default();

        if let Some(parent) = &parent_id {
            if !comments.iter().any(|c| &c.id == parent) {
                return Err(ThreadlineError::not_found(format!(
                    "Parent comment {} not found",
                    parent
                )));
            }
            let top = top_level_ancestor(comments, parent);
            for held in comments.iter_mut() {
                if &held.id == parent || (top != *parent && held.id == top) {
                    held.reply_count += 1;
                }
            }
        }

        let comment = Comment::new(id, resource_id.clone(), content, author, parent_id);
        comments.push(comment.clone());
        Ok(comment)
    }
}

/// In-memory implementation of [`CommentsApi`].
#[derive(Debug, Default)]
pub struct InMemoryComments {
    inner: Mutex<CommentsInner>,
}

impl InMemoryComments {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CommentsInner> {
        self.inner.lock().expect("comment backend lock poisoned")
    }

    /// Sets the author attributed to comments created through the API.
    pub fn set_current_author(&self, author: AuthorId) {
        self.lock().current_author = Some(author);
    }

    /// Arms a one-shot failure: the next API call returns `error` instead
    /// of executing.
    pub fn fail_next(&self, error: ThreadlineError) {
        self.lock().fail_next = Some(error);
    }

    /// Returns the number of successfully served list calls.
    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }

    /// Returns the number of comments held for a resource.
    pub fn comment_count(&self, resource_id: &ResourceId) -> usize {
        self.lock()
            .resources
            .get(resource_id)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Seeds a comment directly into the backend, bypassing the API
    /// surface. Reply counts are maintained exactly as `create_comment`
    /// would.
    pub fn seed_comment(
        &self,
        resource_id: &ResourceId,
        author: AuthorId,
        parent_id: Option<CommentId>,
        text: &str,
    ) -> Result<CommentId> {
        let content = CommentContent::plain(text)?;
        let comment = self
            .lock()
            .insert_comment(resource_id, author, parent_id, content)?;
        Ok(comment.id)
    }
}

#[async_trait]
impl CommentsApi for InMemoryComments {
    async fn list_comments_by_resource(
        &self,
        request: ListCommentsRequest,
    ) -> Result<ListCommentsResponse> {
        let mut inner = self.lock();
        inner.take_failure()?;
        inner.list_calls += 1;

        let comments: Vec<Comment> = inner
            .resources
            .get(&request.resource_id)
            .cloned()
            .unwrap_or_default();
        drop(inner);

        let page_size = request.effective_page_size();
        let reply_page_size = request.effective_reply_page_size();
        match &request.cursor {
            None => Ok(root_page(&comments, request.sort, 0, page_size, reply_page_size)),
            Some(cursor) => {
                let (thread, sort, offset) = decode_cursor(cursor)?;
                if thread == ROOT_CURSOR_THREAD {
                    Ok(root_page(&comments, sort, offset, page_size, reply_page_size))
                } else {
                    Ok(thread_page(
                        &comments,
                        &CommentId::new(thread.as_str()),
                        sort,
                        offset,
                        page_size,
                    ))
                }
            }
        }
    }

    async fn create_comment(&self, request: CreateCommentRequest) -> Result<Comment> {
        let mut inner = self.lock();
        inner.take_failure()?;
        let author = inner
            .current_author
            .clone()
            .unwrap_or_else(|| AuthorId::new("anonymous"));
        inner.insert_comment(
            &request.resource_id,
            author,
            request.parent_id,
            request.content,
        )
    }

    async fn delete_comment(&self, comment_id: &CommentId) -> Result<()> {
        let mut guard = self.lock();
        let inner = &mut *guard;
        inner.take_failure()?;

        for comments in inner.resources.values_mut() {
            let Some(pos) = comments.iter().position(|c| &c.id == comment_id) else {
                continue;
            };
            let has_children = comments[pos].reply_count > 0
                || comments
                    .iter()
                    .any(|c| c.parent_id.as_ref() == Some(comment_id));
            if has_children {
                comments[pos].tombstone();
            } else {
                comments.remove(pos);
            }
            return Ok(());
        }
        Err(ThreadlineError::not_found(format!(
            "Comment {} not found",
            comment_id
        )))
    }
}

/// Builds one page of the top-level listing, with inline reply-thread
/// first pages attached for every listed comment that has replies.
fn root_page(
    comments: &[Comment],
    sort: CommentSort,
    offset: usize,
    page_size: usize,
    reply_page_size: usize,
) -> ListCommentsResponse {
    let top_level = ordered_top_level(comments, sort);
    let listed: Vec<Comment> = top_level.iter().skip(offset).take(page_size).cloned().collect();
    let next_offset = offset + page_size;
    let next_cursor = (top_level.len() > next_offset)
        .then(|| encode_cursor(ROOT_CURSOR_THREAD, sort, next_offset));

    let mut response = ListCommentsResponse::new(
        CommentPage::new()
            .with_comments(listed.clone(), next_cursor)
            .with_total(top_level.len()),
    );

    for top in &listed {
        let thread = flatten_thread(comments, &top.id);
        if thread.is_empty() {
            continue;
        }
        let replies: Vec<Comment> = thread.iter().take(reply_page_size).cloned().collect();
        let cursor = (thread.len() > reply_page_size)
            .then(|| encode_cursor(top.id.as_str(), sort, reply_page_size));
        response = response.with_reply_thread(
            top.id.clone(),
            CommentPage::new()
                .with_comments(replies, cursor)
                .with_total(thread.len()),
        );
    }

    response
}

/// Builds one page of a flattened reply thread.
fn thread_page(
    comments: &[Comment],
    thread_id: &CommentId,
    sort: CommentSort,
    offset: usize,
    limit: usize,
) -> ListCommentsResponse {
    let ordered = flatten_thread(comments, thread_id);
    let slice: Vec<Comment> = ordered.iter().skip(offset).take(limit).cloned().collect();
    let next_offset = offset + limit;
    let next_cursor = (ordered.len() > next_offset)
        .then(|| encode_cursor(thread_id.as_str(), sort, next_offset));

    ListCommentsResponse::new(
        CommentPage::new()
            .with_comments(slice, next_cursor)
            .with_total(ordered.len()),
    )
}

/// Top-level comments in listing order for the given sort.
fn ordered_top_level(comments: &[Comment], sort: CommentSort) -> Vec<Comment> {
    let oldest_first = comments.iter().filter(|c| c.parent_id.is_none());
    match sort {
        CommentSort::OldestFirst => oldest_first.cloned().collect(),
        CommentSort::NewestFirst => {
            let mut reversed: Vec<Comment> = oldest_first.cloned().collect();
            reversed.reverse();
            reversed
        }
    }
}

/// Walks the parent chain of a comment up to its top-level ancestor.
fn top_level_ancestor(comments: &[Comment], id: &CommentId) -> CommentId {
    let mut current = id.clone();
    loop {
        let parent = comments
            .iter()
            .find(|c| c.id == current)
            .and_then(|c| c.parent_id.clone());
        match parent {
            Some(parent) => current = parent,
            None => return current,
        }
    }
}

/// Flattens every descendant of a top-level comment into one list in
/// arrival order. Parents always arrive before their children, so a
/// single pass suffices.
fn flatten_thread(comments: &[Comment], top_id: &CommentId) -> Vec<Comment> {
    let mut thread_ids: HashSet<CommentId> = HashSet::new();
    thread_ids.insert(top_id.clone());

    let mut thread = Vec::new();
    for comment in comments {
        let Some(parent) = &comment.parent_id else {
            continue;
        };
        if thread_ids.contains(parent) {
            thread_ids.insert(comment.id.clone());
            thread.push(comment.clone());
        }
    }
    thread
}

fn encode_cursor(thread: &str, sort: CommentSort, offset: usize) -> Cursor {
    let sort_tag = match sort {
        CommentSort::NewestFirst => "n",
        CommentSort::OldestFirst => "o",
    };
    Cursor::new(format!("{}:{}:{}", thread, sort_tag, offset))
}

fn decode_cursor(cursor: &Cursor) -> Result<(String, CommentSort, usize)> {
    let mut parts = cursor.as_str().splitn(3, ':');
    let (Some(thread), Some(sort_tag), Some(offset)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(ThreadlineError::invalid_input(
            "Malformed pagination cursor",
        ));
    };
    let sort = match sort_tag {
        "n" => CommentSort::NewestFirst,
        "o" => CommentSort::OldestFirst,
        _ => {
            return Err(ThreadlineError::invalid_input(
                "Malformed pagination cursor",
            ))
        }
    };
    let offset: usize = offset
        .parse()
        .map_err(|_| ThreadlineError::invalid_input("Malformed pagination cursor"))?;
    Ok((thread.to_string(), sort, offset))
}

#[derive(Debug, Default)]
struct MembersInner {
    profiles: HashMap<AuthorId, MemberProfile>,
    lookups: usize,
}

/// In-memory implementation of [`MemberDirectory`].
#[derive(Debug, Default)]
pub struct InMemoryMembers {
    inner: Mutex<MembersInner>,
}

impl InMemoryMembers {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MembersInner> {
        self.inner.lock().expect("member directory lock poisoned")
    }

    /// Registers a member profile.
    pub fn insert_profile(&self, profile: MemberProfile) {
        self.lock().profiles.insert(profile.id.clone(), profile);
    }

    /// Returns how many lookups have been served.
    pub fn lookup_count(&self) -> usize {
        self.lock().lookups
    }
}

#[async_trait]
impl MemberDirectory for InMemoryMembers {
    async fn member_profile(&self, author_id: &AuthorId) -> Result<Option<MemberProfile>> {
        let mut inner = self.lock();
        inner.lookups += 1;
        Ok(inner.profiles.get(author_id).cloned())
    }
}

//! Comment thread store: the service between thread state and the remote API.
//!
//! One store instance serves one resource. It owns the thread-state map
//! and the sort selection as observable signals, and mediates every
//! remote operation: first-page loads, cursor continuation for the root
//! and for reply threads, sort switching, optimistic create/reply, and
//! tree-aware delete.
//!
//! ## Failure containment
//!
//! Every remote call is contained at thread granularity: a failure sets
//! the owning thread's `error` string and clears its in-flight flag, and
//! nothing else changes. No operation is retried automatically; callers
//! re-invoke the same method. A failure while loading replies for one
//! comment never disturbs the root thread or any sibling thread.
//!
//! ## Concurrency model
//!
//! The store targets a single-threaded event loop. `loading`/`saving`
//! are advisory guards, not locks: a second call arriving between the
//! check and the set can race. In-flight fetches are never aborted; when
//! two fetches target the same thread the last signal write wins,
//! whichever request started first.

use crate::comments::api::{
    CommentsApi, CreateCommentRequest, ListCommentsRequest, ListCommentsResponse, MemberDirectory,
};
use crate::comments::constants::{DEFAULT_PAGE_SIZE, DEFAULT_REPLY_PAGE_SIZE};
use crate::comments::members::AuthorResolver;
use crate::comments::merge::{merge_preserve_order_by_id, MergePosition};
use crate::comments::state::ThreadMap;
use crate::comments::types::{AuthorId, CommentId, CommentSort, ResourceId, ThreadKey};
use crate::comments::{Comment, CommentContent};
use crate::error::ThreadlineError;
use crate::signal::Signal;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Page-size configuration for one store instance.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Top-level comments fetched per page.
    pub page_size: usize,
    /// Replies fetched per reply-thread page.
    pub reply_page_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            reply_page_size: DEFAULT_REPLY_PAGE_SIZE,
        }
    }
}

/// Per-resource comment thread cache mediating a remote comment API.
///
/// Collaborators are injected at construction; the store holds no global
/// state of any kind.
pub struct CommentThreadStore<A, M> {
    api: A,
    members: M,
    resource_id: ResourceId,
    config: StoreConfig,
    threads: Signal<ThreadMap>,
    sort: Signal<CommentSort>,
}

impl<A: CommentsApi, M: MemberDirectory> CommentThreadStore<A, M> {
    /// Creates a store for a resource with default page sizes.
    pub fn new(api: A, members: M, resource_id: ResourceId) -> Self {
        Self::with_config(api, members, resource_id, StoreConfig::default())
    }

    /// Creates a store with explicit page sizes.
    pub fn with_config(api: A, members: M, resource_id: ResourceId, config: StoreConfig) -> Self {
        Self {
            api,
            members,
            resource_id,
            config,
            threads: Signal::new(ThreadMap::new()),
            sort: Signal::new(CommentSort::default()),
        }
    }

    /// Returns the thread-state signal for subscription.
    pub fn threads(&self) -> &Signal<ThreadMap> {
        &self.threads
    }

    /// Returns the sort signal for subscription.
    pub fn sort(&self) -> &Signal<CommentSort> {
        &self.sort
    }

    /// Returns the resource this store serves.
    pub fn resource_id(&self) -> &ResourceId {
        &self.resource_id
    }

    /// Returns a snapshot of all thread states.
    pub fn snapshot(&self) -> ThreadMap {
        self.threads.get()
    }

    /// Fetches the first page of root comments plus inline reply threads,
    /// replacing any previously held root state.
    ///
    /// No-op if a root fetch is already in flight.
    pub async fn initial_load(&self) {
        if self.threads.get().root().loading {
            debug!("Root thread already loading; skipping initial load");
            return;
        }
        self.begin_load(ThreadKey::Root);
        self.fetch_and_replace().await;
    }

    /// Fetches the next page of root comments (plus the inline reply
    /// threads of the newly listed comments) and merges it in, preserving
    /// the order of everything already listed.
    ///
    /// Warns and returns if the root thread has no pagination cursor.
    pub async fn load_more(&self) {
        self.load_more_for(ThreadKey::Root).await;
    }

    /// Fetches the next page of a reply thread and merges it in.
    ///
    /// Warns and returns if that thread has no pagination cursor.
    pub async fn load_more_replies(&self, comment_id: CommentId) {
        self.load_more_for(ThreadKey::Reply(comment_id)).await;
    }

    /// Switches the sort direction and refetches from the first page.
    ///
    /// The root cursor is discarded before the refetch is issued, so a
    /// `load_more` racing the reload can never reuse a cursor minted
    /// under the old sort. The refetch replaces data; it does not merge.
    pub async fn set_sort(&self, sort: CommentSort) {
        self.sort.set(sort);
        self.threads.update(|threads| {
            let root = threads.entry(ThreadKey::Root);
            root.next_cursor = None;
            root.loading = true;
            root.error = None;
        });
        self.fetch_and_replace().await;
    }

    /// Creates a top-level comment and prepends it to the root thread.
    ///
    /// Returns the stored comment with its author profile attached, or
    /// `None` on failure (the error lands on the root thread).
    pub async fn create_comment(&self, content: CommentContent) -> Option<Comment> {
        self.begin_save(ThreadKey::Root);
        let request = CreateCommentRequest::new(self.resource_id.clone(), content);
        match self.api.create_comment(request).await {
            Ok(mut comment) => {
                self.resolve_created(&mut comment).await;
                self.threads.update(|threads| {
                    let root = threads.entry(ThreadKey::Root);
                    root.comments = merge_preserve_order_by_id(
                        &root.comments,
                        vec![comment.clone()],
                        MergePosition::Prepend,
                    );
                    root.saving = false;
                    root.error = None;
                });
                Some(comment)
            }
            Err(e) => {
                self.fail_thread(ThreadKey::Root, e);
                None
            }
        }
    }

    /// Creates a reply under `parent_comment_id` and stores it in the
    /// thread owned by `top_comment_id`.
    ///
    /// On success the reply count is incremented by exactly one on the
    /// root-list comment matching `parent_comment_id`, and on the one
    /// matching `top_comment_id` when different. A nested parent that is
    /// not in the root list is skipped.
    ///
    /// Returns the stored reply with author and parent-author profiles
    /// attached, or `None` on failure (the error lands on the reply
    /// thread).
    pub async fn create_reply(
        &self,
        top_comment_id: CommentId,
        parent_comment_id: CommentId,
        content: CommentContent,
    ) -> Option<Comment> {
        let key = ThreadKey::Reply(top_comment_id.clone());
        self.begin_save(key.clone());
        let request = CreateCommentRequest::new(self.resource_id.clone(), content)
            .with_parent(parent_comment_id.clone());
        match self.api.create_comment(request).await {
            Ok(mut comment) => {
                self.resolve_created(&mut comment).await;
                self.threads.update(|threads| {
                    let thread = threads.entry(key);
                    thread.comments = merge_preserve_order_by_id(
                        &thread.comments,
                        vec![comment.clone()],
                        MergePosition::Append,
                    );
                    thread.saving = false;
                    thread.error = None;

                    let root = threads.entry(ThreadKey::Root);
                    for held in root.comments.iter_mut() {
                        if held.id == parent_comment_id || held.id == top_comment_id {
                            held.reply_count += 1;
                        }
                    }
                });
                Some(comment)
            }
            Err(e) => {
                self.fail_thread(key, e);
                None
            }
        }
    }

    /// Deletes a comment.
    ///
    /// A comment that still has replies (loaded descendants, or a
    /// positive reply count covering replies beyond the loaded window)
    /// becomes a tombstone so the thread shape survives; a leaf is
    /// removed outright from its thread.
    pub async fn delete_comment(&self, comment_id: CommentId) {
        let Some(key) = self.threads.get().owning_thread(&comment_id) else {
            warn!("Delete requested for unknown comment {}", comment_id);
            return;
        };
        match self.api.delete_comment(&comment_id).await {
            Ok(()) => {
                self.threads.update(|threads| {
                    let has_descendants = threads.has_loaded_descendants(&comment_id)
                        || threads
                            .comment(&comment_id)
                            .map(|c| c.reply_count > 0)
                            .unwrap_or(false);
                    let thread = threads.entry(key);
                    if has_descendants {
                        if let Some(held) = thread.comment_mut(&comment_id) {
                            held.tombstone();
                        }
                    } else {
                        thread.comments.retain(|c| c.id != comment_id);
                    }
                    thread.error = None;
                });
            }
            Err(e) => self.fail_thread(key, e),
        }
    }

    /// Issues a first-page fetch and replaces the root thread and every
    /// inline reply thread with the result. Shared by `initial_load` and
    /// `set_sort`.
    async fn fetch_and_replace(&self) {
        let request = ListCommentsRequest::new(self.resource_id.clone(), self.sort.get())
            .with_page_size(self.config.page_size)
            .with_reply_page_size(self.config.reply_page_size);
        match self.api.list_comments_by_resource(request).await {
            Ok(mut response) => {
                self.resolve_response(&mut response).await;
                self.threads.update(|threads| {
                    let root = threads.entry(ThreadKey::Root);
                    root.comments = response.page.comments;
                    root.next_cursor = response.page.next_cursor;
                    root.loading = false;
                    root.error = None;
                    for (parent, page) in response.reply_threads {
                        let thread = threads.entry(ThreadKey::Reply(parent));
                        thread.comments = page.comments;
                        thread.next_cursor = page.next_cursor;
                        thread.loading = false;
                        thread.error = None;
                    }
                });
            }
            Err(e) => self.fail_thread(ThreadKey::Root, e),
        }
    }

    /// Cursor continuation for one thread, merge-appending the next page.
    async fn load_more_for(&self, key: ThreadKey) {
        let snapshot = self.threads.get();
        let Some(state) = snapshot.thread(&key) else {
            warn!("No thread state for {}; nothing to load", key);
            return;
        };
        if state.loading {
            debug!("Thread {} already loading; skipping", key);
            return;
        }
        let Some(cursor) = state.next_cursor.clone() else {
            warn!("No pagination cursor for thread {}; load the first page first", key);
            return;
        };

        self.begin_load(key.clone());
        let page_size = match &key {
            ThreadKey::Root => self.config.page_size,
            ThreadKey::Reply(_) => self.config.reply_page_size,
        };
        let mut request = ListCommentsRequest::new(self.resource_id.clone(), self.sort.get())
            .with_cursor(cursor)
            .with_page_size(page_size);
        if key.is_root() {
            request = request.with_reply_page_size(self.config.reply_page_size);
        }
        match self.api.list_comments_by_resource(request).await {
            Ok(mut response) => {
                self.resolve_response(&mut response).await;
                self.threads.update(|threads| {
                    let thread = threads.entry(key);
                    thread.comments = merge_preserve_order_by_id(
                        &thread.comments,
                        response.page.comments,
                        MergePosition::Append,
                    );
                    thread.next_cursor = response.page.next_cursor;
                    thread.loading = false;
                    thread.error = None;
                    // A root continuation inlines the reply threads of the
                    // newly listed comments; seed their entries
                    for (parent, page) in response.reply_threads {
                        let reply_thread = threads.entry(ThreadKey::Reply(parent));
                        reply_thread.comments = page.comments;
                        reply_thread.next_cursor = page.next_cursor;
                        reply_thread.loading = false;
                        reply_thread.error = None;
                    }
                });
            }
            Err(e) => self.fail_thread(key, e),
        }
    }

    /// Attaches author and parent-author profiles to a fetched response,
    /// looking each distinct author up at most once.
    async fn resolve_response(&self, response: &mut ListCommentsResponse) {
        let snapshot = self.threads.get();
        let mut resolver = AuthorResolver::new(&self.members);
        resolver.seed(snapshot.iter_comments());

        resolver.resolve_authors(&mut response.page.comments).await;
        for page in response.reply_threads.values_mut() {
            resolver.resolve_authors(&mut page.comments).await;
        }

        // Parents of inline replies are usually top-level comments in the
        // same response; fall back to the cached threads for the rest
        let mut authors_by_comment: HashMap<CommentId, AuthorId> = HashMap::new();
        for comment in response
            .page
            .comments
            .iter()
            .chain(response.reply_threads.values().flat_map(|p| p.comments.iter()))
        {
            if let Some(author_id) = &comment.author_id {
                authors_by_comment.insert(comment.id.clone(), author_id.clone());
            }
        }
        let lookup = |parent_id: &CommentId| {
            authors_by_comment.get(parent_id).cloned().or_else(|| {
                snapshot
                    .comment(parent_id)
                    .and_then(|c| c.author_id.clone())
            })
        };

        resolver
            .resolve_parent_authors(&mut response.page.comments, &lookup)
            .await;
        for page in response.reply_threads.values_mut() {
            resolver
                .resolve_parent_authors(&mut page.comments, &lookup)
                .await;
        }
    }

    /// Attaches profiles to a freshly created comment or reply.
    async fn resolve_created(&self, comment: &mut Comment) {
        let snapshot = self.threads.get();
        let mut resolver = AuthorResolver::new(&self.members);
        resolver.seed(snapshot.iter_comments());
        resolver
            .resolve_authors(std::slice::from_mut(comment))
            .await;
        resolver
            .resolve_parent_authors(std::slice::from_mut(comment), |parent_id| {
                snapshot
                    .comment(parent_id)
                    .and_then(|c| c.author_id.clone())
            })
            .await;
    }

    fn begin_load(&self, key: ThreadKey) {
        self.threads.update(|threads| {
            let state = threads.entry(key);
            state.loading = true;
            state.error = None;
        });
    }

    fn begin_save(&self, key: ThreadKey) {
        self.threads.update(|threads| {
            let state = threads.entry(key);
            state.saving = true;
            state.error = None;
        });
    }

    /// Records a contained failure on one thread and clears its flags.
    fn fail_thread(&self, key: ThreadKey, error: ThreadlineError) {
        warn!("Comment operation failed for thread {}: {}", key, error);
        self.threads.update(|threads| {
            let state = threads.entry(key);
            state.loading = false;
            state.saving = false;
            state.error = Some(error.to_string());
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::memory::{InMemoryComments, InMemoryMembers};
    use crate::comments::members::MemberProfile;

    fn resource() -> ResourceId {
        ResourceId::new("article-1")
    }

    fn members() -> InMemoryMembers {
        let members = InMemoryMembers::new();
        members.insert_profile(MemberProfile::new(AuthorId::new("alice"), "Alice"));
        members.insert_profile(MemberProfile::new(AuthorId::new("bob"), "Bob"));
        members
    }

    fn store_with(
        api: InMemoryComments,
    ) -> CommentThreadStore<InMemoryComments, InMemoryMembers> {
        CommentThreadStore::with_config(
            api,
            members(),
            resource(),
            StoreConfig {
                page_size: 2,
                reply_page_size: 2,
            },
        )
    }

    fn seed(api: &InMemoryComments, author: &str, parent: Option<&str>, text: &str) -> CommentId {
        api.seed_comment(
            &resource(),
            AuthorId::new(author),
            parent.map(CommentId::new),
            text,
        )
        .expect("Failed to seed comment")
    }

    #[tokio::test]
    async fn test_initial_load_replaces_root_and_reply_threads() {
        let api = InMemoryComments::new();
        let top = seed(&api, "alice", None, "top comment");
        seed(&api, "bob", Some(top.as_str()), "first reply");
        let store = store_with(api);

        store.initial_load().await;

        let threads = store.snapshot();
        let root = threads.root();
        assert_eq!(root.comments.len(), 1);
        assert!(!root.loading);
        assert!(root.error.is_none());

        let replies = threads.thread(&ThreadKey::Reply(top.clone())).unwrap();
        assert_eq!(replies.comments.len(), 1);
        // Authors resolved through the member directory
        assert_eq!(
            root.comments[0].author.as_ref().unwrap().display_name,
            "Alice"
        );
        assert_eq!(
            replies.comments[0].author.as_ref().unwrap().display_name,
            "Bob"
        );
        // Reply's parent-author resolved from the same response
        assert_eq!(
            replies.comments[0]
                .parent_author
                .as_ref()
                .unwrap()
                .display_name,
            "Alice"
        );
    }

    #[tokio::test]
    async fn test_initial_load_short_circuits_while_loading() {
        let api = InMemoryComments::new();
        seed(&api, "alice", None, "one");
        let store = store_with(api);

        store
            .threads()
            .update(|threads| threads.entry(ThreadKey::Root).loading = true);
        store.initial_load().await;

        assert_eq!(store.api.list_calls(), 0);
        assert!(store.snapshot().root().comments.is_empty());
    }

    #[tokio::test]
    async fn test_load_more_without_cursor_is_a_warned_noop() {
        let api = InMemoryComments::new();
        let store = store_with(api);

        store.load_more().await;

        assert_eq!(store.api.list_calls(), 0);
        let root_state = store.snapshot();
        assert!(root_state.root().error.is_none());
        assert!(!root_state.root().loading);
    }

    #[tokio::test]
    async fn test_load_more_appends_and_dedups_overlap() {
        let api = InMemoryComments::new();
        for n in 1..=4 {
            seed(&api, "alice", None, &format!("comment {}", n));
        }
        let store = store_with(api);

        store.initial_load().await;
        let first_page: Vec<CommentId> = store
            .snapshot()
            .root()
            .comments
            .iter()
            .map(|c| c.id.clone())
            .collect();
        assert_eq!(first_page.len(), 2);

        // A comment created between pages shifts offsets so the next page
        // overlaps the first; the merge must keep order and drop the dup
        seed(&store.api, "bob", None, "late arrival");
        store.load_more().await;

        let root = store.snapshot();
        let ids: Vec<CommentId> = root.root().comments.iter().map(|c| c.id.clone()).collect();
        assert_eq!(&ids[..2], &first_page[..]);
        let unique: std::collections::HashSet<&CommentId> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[tokio::test]
    async fn test_set_sort_discards_cursor_and_replaces() {
        let api = InMemoryComments::new();
        for n in 1..=4 {
            seed(&api, "alice", None, &format!("comment {}", n));
        }
        let store = store_with(api);

        store.initial_load().await;
        assert!(store.snapshot().root().has_more());
        let newest_first = store.snapshot().root().comments[0].id.clone();

        store.set_sort(CommentSort::OldestFirst).await;

        assert_eq!(store.sort().get(), CommentSort::OldestFirst);
        let root_comments = store.snapshot();
        let oldest_first = &root_comments.root().comments[0].id;
        assert_ne!(oldest_first, &newest_first);
        // Replaced, not merged: still exactly one page
        assert_eq!(root_comments.root().comments.len(), 2);
    }

    #[tokio::test]
    async fn test_set_sort_failure_leaves_no_stale_cursor() {
        let api = InMemoryComments::new();
        for n in 1..=4 {
            seed(&api, "alice", None, &format!("comment {}", n));
        }
        let store = store_with(api);

        store.initial_load().await;
        assert!(store.snapshot().root().has_more());

        store
            .api
            .fail_next(ThreadlineError::api("sort fetch failed"));
        store.set_sort(CommentSort::OldestFirst).await;

        let root_state = store.snapshot();
        assert!(root_state.root().error.is_some());
        assert!(root_state.root().next_cursor.is_none());

        // With the cursor discarded, load_more is a no-op rather than a
        // request with a stale token
        let calls_before = store.api.list_calls();
        store.load_more().await;
        assert_eq!(store.api.list_calls(), calls_before);
    }

    #[tokio::test]
    async fn test_create_comment_prepends_and_resolves_author() {
        let api = InMemoryComments::new();
        seed(&api, "alice", None, "existing");
        api.set_current_author(AuthorId::new("bob"));
        let store = store_with(api);

        store.initial_load().await;
        let created = store
            .create_comment(CommentContent::plain("brand new").unwrap())
            .await
            .expect("create should succeed");

        assert_eq!(created.author.as_ref().unwrap().display_name, "Bob");
        let root_threads = store.snapshot();
        let root = root_threads.root();
        assert_eq!(root.comments[0].id, created.id);
        assert!(!root.saving);
        assert!(root.error.is_none());
    }

    #[tokio::test]
    async fn test_create_comment_failure_returns_none_and_records_error() {
        let api = InMemoryComments::new();
        api.fail_next(ThreadlineError::api("create rejected"));
        let store = store_with(api);

        let created = store
            .create_comment(CommentContent::plain("doomed").unwrap())
            .await;

        assert!(created.is_none());
        let root_state = store.snapshot();
        assert_eq!(
            root_state.root().error.as_deref(),
            Some("Comment API error: create rejected")
        );
        assert!(!root_state.root().saving);
    }

    #[tokio::test]
    async fn test_create_reply_bumps_parent_and_top_counts() {
        let api = InMemoryComments::new();
        let top = seed(&api, "alice", None, "top");
        let nested = seed(&api, "bob", Some(top.as_str()), "nested");
        api.set_current_author(AuthorId::new("alice"));
        let store = store_with(api);

        store.initial_load().await;

        // Reply directly to the top-level comment: one increment
        store
            .create_reply(
                top.clone(),
                top.clone(),
                CommentContent::plain("direct reply").unwrap(),
            )
            .await
            .expect("reply should succeed");
        let after_direct = store.snapshot();
        let base = after_direct.root().comment(&top).unwrap().reply_count;

        // Reply to the nested comment: top-of-thread gets one more; the
        // nested parent is not in the root list, so nothing else changes
        store
            .create_reply(
                top.clone(),
                nested.clone(),
                CommentContent::plain("deeper reply").unwrap(),
            )
            .await
            .expect("reply should succeed");

        let threads = store.snapshot();
        assert_eq!(threads.root().comment(&top).unwrap().reply_count, base + 1);
        let reply_thread = threads.thread(&ThreadKey::Reply(top.clone())).unwrap();
        assert_eq!(reply_thread.comments.len(), 3);
    }

    #[tokio::test]
    async fn test_delete_leaf_removes_it() {
        let api = InMemoryComments::new();
        let top = seed(&api, "alice", None, "leaf");
        let store = store_with(api);

        store.initial_load().await;
        store.delete_comment(top.clone()).await;

        let threads = store.snapshot();
        assert!(threads.root().comment(&top).is_none());
    }

    #[tokio::test]
    async fn test_delete_with_replies_leaves_tombstone() {
        let api = InMemoryComments::new();
        let top = seed(&api, "alice", None, "parent");
        seed(&api, "bob", Some(top.as_str()), "child");
        let store = store_with(api);

        store.initial_load().await;
        store.delete_comment(top.clone()).await;

        let threads = store.snapshot();
        let held = threads.root().comment(&top).expect("tombstone remains");
        assert!(held.is_tombstone());
        assert!(held.content.is_none());
        assert!(held.author.is_none());
    }

    #[tokio::test]
    async fn test_failure_in_one_thread_does_not_affect_others() {
        let api = InMemoryComments::new();
        let top_a = seed(&api, "alice", None, "thread a");
        let top_b = seed(&api, "bob", None, "thread b");
        for n in 1..=3 {
            seed(&api, "bob", Some(top_a.as_str()), &format!("a reply {}", n));
            seed(&api, "alice", Some(top_b.as_str()), &format!("b reply {}", n));
        }
        let store = store_with(api);

        store.initial_load().await;
        store
            .api
            .fail_next(ThreadlineError::api("replies unavailable"));
        store.load_more_replies(top_a.clone()).await;

        let threads = store.snapshot();
        let thread_a = threads.thread(&ThreadKey::Reply(top_a.clone())).unwrap();
        assert!(thread_a.error.is_some());
        assert!(!thread_a.loading);

        let thread_b = threads.thread(&ThreadKey::Reply(top_b.clone())).unwrap();
        assert!(thread_b.error.is_none());
        assert!(threads.root().error.is_none());

        // Retry is clean: the same call succeeds afterwards
        store.load_more_replies(top_a.clone()).await;
        let threads = store.snapshot();
        let thread_a = threads.thread(&ThreadKey::Reply(top_a)).unwrap();
        assert!(thread_a.error.is_none());
        assert_eq!(thread_a.comments.len(), 3);
    }
}

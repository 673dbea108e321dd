//! Client-side comment thread cache.
//!
//! This module caches paginated comment threads for one resource and
//! mediates every mutation against a remote comment API. Threads are
//! addressed by key:
//!
//! ```text
//! ThreadKey::Root              (top-level comments)
//!     └── ThreadKey::Reply(id) (flattened replies per top-level comment)
//! ```
//!
//! ## Data flow
//!
//! 1. `CommentThreadStore` fetches pages through the `CommentsApi` trait
//! 2. Author ids are resolved to profiles through `MemberDirectory`,
//!    cached per batch
//! 3. Pages merge by id, preserving the order of everything already held
//! 4. Consumers observe the `ThreadMap` signal and re-render on change
//!
//! Failures stay contained to the thread they occurred in; re-invoking
//! the failed operation is always safe.

pub mod api;
mod comment;
pub mod constants;
pub mod members;
pub mod memory;
mod merge;
pub mod state;
pub mod store;
pub mod types;

pub use api::{
    CommentPage, CommentsApi, CreateCommentRequest, ListCommentsRequest, ListCommentsResponse,
    MemberDirectory,
};
pub use comment::{Comment, CommentContent};
pub use members::{AuthorResolver, MemberProfile};
pub use memory::{InMemoryComments, InMemoryMembers};
pub use merge::{merge_preserve_order_by_id, MergePosition};
pub use state::{ThreadMap, ThreadState};
pub use store::{CommentThreadStore, StoreConfig};
pub use types::{
    AuthorId, CommentId, CommentSort, CommentStatus, Cursor, ResourceId, ThreadKey,
};

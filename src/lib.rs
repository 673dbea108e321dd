//! # Threadline - client-side comment thread cache
//!
//! An in-memory, per-resource cache of paginated comment threads fronting
//! a remote comment API. Threads are keyed by parent comment (with a
//! synthetic root), pages merge by id without reordering what a reader
//! already sees, and deletions are tree-aware: a comment with replies
//! becomes a tombstone, a leaf disappears.
//!
//! ## Features
//!
//! - **Cursor pagination**: opaque per-thread cursors, "load more" for the
//!   root and for any reply thread
//! - **Order-preserving merges**: re-fetched pages replace in place and
//!   append only unseen ids; merging the same page twice is a no-op
//! - **Optimistic create**: new comments and replies land in the cache
//!   directly from the create response, authors resolved
//! - **Contained failures**: an error is recorded on the thread it hit and
//!   nowhere else; every operation is safely re-invocable
//! - **Observable state**: thread states and sort are exposed as signals
//!   consumers can subscribe to
//!
//! ## Example
//!
//! ```rust,no_run
//! use threadline::comments::{
//!     CommentContent, CommentThreadStore, InMemoryComments, InMemoryMembers, ResourceId,
//! };
//!
//! # async fn run() {
//! let api = InMemoryComments::new();
//! let members = InMemoryMembers::new();
//! let store = CommentThreadStore::new(api, members, ResourceId::new("article-1"));
//!
//! store.initial_load().await;
//! let created = store
//!     .create_comment(CommentContent::plain("First!").unwrap())
//!     .await;
//! assert!(created.is_some());
//! store.load_more().await;
//!
//! for comment in &store.snapshot().root().comments {
//!     println!("{:?}", comment);
//! }
//! # }
//! ```

pub mod comments;
pub mod error;
pub mod signal;

pub use error::{Result, ThreadlineError};
pub use signal::Signal;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

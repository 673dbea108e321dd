//! Author resolution against the member directory.
//!
//! Comments arrive from the wire carrying author ids only. The resolver
//! attaches member profiles to a batch of comments, looking each distinct
//! id up at most once per call: the cache is seeded from comments already
//! resolved in previous batches and filled as lookups complete. A missing
//! or failing lookup is logged and recorded as `None`; it never fails the
//! batch.

use crate::comments::api::MemberDirectory;
use crate::comments::types::{AuthorId, CommentId};
use crate::comments::Comment;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Public profile of a member account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProfile {
    /// The member's account id.
    pub id: AuthorId,
    /// Display name shown next to comments.
    pub display_name: String,
    /// Avatar image URL, if the member set one.
    pub avatar_url: Option<String>,
}

impl MemberProfile {
    /// Creates a profile.
    pub fn new(id: AuthorId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            avatar_url: None,
        }
    }

    /// Sets the avatar URL.
    pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }
}

/// Batch author resolver with a per-call lookup cache.
pub struct AuthorResolver<'a, M> {
    directory: &'a M,
    cache: HashMap<AuthorId, Option<MemberProfile>>,
}

impl<'a, M: MemberDirectory> AuthorResolver<'a, M> {
    /// Creates a resolver with an empty cache.
    pub fn new(directory: &'a M) -> Self {
        Self {
            directory,
            cache: HashMap::new(),
        }
    }

    /// Seeds the cache from comments whose authors are already resolved,
    /// so previously loaded authors are never looked up again.
    pub fn seed<'c>(&mut self, comments: impl IntoIterator<Item = &'c Comment>) {
        for comment in comments {
            if let (Some(author_id), Some(profile)) = (&comment.author_id, &comment.author) {
                self.cache
                    .entry(author_id.clone())
                    .or_insert_with(|| Some(profile.clone()));
            }
        }
    }

    /// Attaches author profiles to every comment in the batch.
    pub async fn resolve_authors(&mut self, comments: &mut [Comment]) {
        for comment in comments.iter_mut() {
            if comment.author.is_some() {
                continue;
            }
            if let Some(author_id) = comment.author_id.clone() {
                comment.author = self.profile_for(&author_id).await;
            }
        }
    }

    /// Attaches parent-author profiles to every reply in the batch.
    ///
    /// A parent inside the batch is found directly; `parent_author_id`
    /// maps parents that live outside the batch (already-cached threads)
    /// to their author.
    pub async fn resolve_parent_authors<F>(&mut self, comments: &mut [Comment], parent_author_id: F)
    where
        F: Fn(&CommentId) -> Option<AuthorId>,
    {
        // Authors of the batch itself, for replies whose parent sits in
        // the same page
        let batch_authors: HashMap<CommentId, AuthorId> = comments
            .iter()
            .filter_map(|c| c.author_id.clone().map(|a| (c.id.clone(), a)))
            .collect();

        for index in 0..comments.len() {
            if comments[index].parent_author.is_some() {
                continue;
            }
            let Some(parent_id) = comments[index].parent_id.clone() else {
                continue;
            };
            let author_id = batch_authors
                .get(&parent_id)
                .cloned()
                .or_else(|| parent_author_id(&parent_id));
            if let Some(author_id) = author_id {
                comments[index].parent_author = self.profile_for(&author_id).await;
            }
        }
    }

    /// Resolves one profile through the cache.
    ///
    /// Not-found and transport failures both cache as `None` so the id is
    /// not retried within this call.
    pub async fn profile_for(&mut self, author_id: &AuthorId) -> Option<MemberProfile> {
        if let Some(cached) = self.cache.get(author_id) {
            return cached.clone();
        }
        let profile = match self.directory.member_profile(author_id).await {
            Ok(Some(profile)) => Some(profile),
            Ok(None) => {
                warn!("Member profile not found for {}", author_id);
                None
            }
            Err(e) => {
                warn!("Member lookup failed for {}: {}", author_id, e);
                None
            }
        };
        self.cache.insert(author_id.clone(), profile.clone());
        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::memory::InMemoryMembers;
    use crate::comments::types::ResourceId;
    use crate::comments::CommentContent;

    fn comment(id: &str, author: &str, parent: Option<&str>) -> Comment {
        Comment::new(
            CommentId::new(id),
            ResourceId::new("article-1"),
            CommentContent::plain("body").unwrap(),
            AuthorId::new(author),
            parent.map(CommentId::new),
        )
    }

    fn directory() -> InMemoryMembers {
        let members = InMemoryMembers::new();
        members.insert_profile(MemberProfile::new(AuthorId::new("alice"), "Alice"));
        members.insert_profile(MemberProfile::new(AuthorId::new("bob"), "Bob"));
        members
    }

    #[tokio::test]
    async fn test_resolve_attaches_profiles() {
        let members = directory();
        let mut resolver = AuthorResolver::new(&members);
        let mut batch = vec![comment("c1", "alice", None), comment("c2", "bob", None)];

        resolver.resolve_authors(&mut batch).await;

        assert_eq!(batch[0].author.as_ref().unwrap().display_name, "Alice");
        assert_eq!(batch[1].author.as_ref().unwrap().display_name, "Bob");
    }

    #[tokio::test]
    async fn test_duplicate_authors_looked_up_once() {
        let members = directory();
        let mut resolver = AuthorResolver::new(&members);
        let mut batch = vec![
            comment("c1", "alice", None),
            comment("c2", "alice", None),
            comment("c3", "alice", None),
        ];

        resolver.resolve_authors(&mut batch).await;

        assert_eq!(members.lookup_count(), 1);
        assert!(batch.iter().all(|c| c.author.is_some()));
    }

    #[tokio::test]
    async fn test_seed_skips_known_authors() {
        let members = directory();
        let mut resolver = AuthorResolver::new(&members);

        let mut resolved = comment("c0", "alice", None);
        resolved.author = Some(MemberProfile::new(AuthorId::new("alice"), "Alice"));
        resolver.seed([&resolved]);

        let mut batch = vec![comment("c1", "alice", None)];
        resolver.resolve_authors(&mut batch).await;

        assert_eq!(members.lookup_count(), 0);
        assert!(batch[0].author.is_some());
    }

    #[tokio::test]
    async fn test_unknown_author_resolves_to_none() {
        let members = directory();
        let mut resolver = AuthorResolver::new(&members);
        let mut batch = vec![comment("c1", "ghost", None), comment("c2", "ghost", None)];

        resolver.resolve_authors(&mut batch).await;

        // Cached as None, looked up once, batch not failed
        assert!(batch[0].author.is_none());
        assert!(batch[1].author.is_none());
        assert_eq!(members.lookup_count(), 1);
    }

    #[tokio::test]
    async fn test_parent_author_from_batch() {
        let members = directory();
        let mut resolver = AuthorResolver::new(&members);
        let mut batch = vec![
            comment("c1", "alice", None),
            comment("c2", "bob", Some("c1")),
        ];

        resolver.resolve_authors(&mut batch).await;
        resolver
            .resolve_parent_authors(&mut batch, |_| None)
            .await;

        assert_eq!(
            batch[1].parent_author.as_ref().unwrap().display_name,
            "Alice"
        );
        assert!(batch[0].parent_author.is_none());
    }

    #[tokio::test]
    async fn test_parent_author_from_lookup_fn() {
        let members = directory();
        let mut resolver = AuthorResolver::new(&members);
        let mut batch = vec![comment("r1", "bob", Some("outside"))];

        resolver.resolve_authors(&mut batch).await;
        resolver
            .resolve_parent_authors(&mut batch, |parent_id| {
                (parent_id == &CommentId::new("outside")).then(|| AuthorId::new("alice"))
            })
            .await;

        assert_eq!(
            batch[0].parent_author.as_ref().unwrap().display_name,
            "Alice"
        );
    }
}

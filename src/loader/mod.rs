//! Loader Module
//!
//! Builds fresh, referentially closed tables from the three backing files.
//! Committing them into a [`TableStore`](crate::store::TableStore) is the
//! store's job; loaders never touch live state.
//!
//! ## Foreign-Key Filtering
//! ```text
//!   users ──▶ {username}
//!                 │
//!   posts ──filter(username)──▶ {post id}
//!                 │                 │
//!   engagements ──filter(username, post id)
//! ```
//!
//! Both loaders push rows through the same two-stage filter
//! ([`PostFilter`] then [`EngagementFilter`]) in file order, so for the
//! same input files they produce identical tables. Duplicate primary keys
//! resolve to the last accepted row.

mod parallel;
mod sequential;

use std::collections::HashSet;

use crate::config::Config;
use crate::error::Result;
use crate::record::{Engagement, Post, RecordId, Table, User};
use crate::storage::ReadStats;

pub use parallel::load_parallel;
pub use sequential::load_sequential;

/// Which loader to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// One file after another, filtering while streaming
    #[default]
    Sequential,

    /// Parse all three files concurrently, filter afterwards
    Parallel,
}

/// Counters from one load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub users: usize,
    pub posts: usize,
    pub engagements: usize,
    /// Rows dropped by the parser (arity, bad integers)
    pub malformed: usize,
    /// Rows dropped for referencing a missing user or post
    pub dangling: usize,
}

/// Tables ready to be committed
#[derive(Debug, Default)]
pub struct LoadedTables {
    pub users: Table<User>,
    pub posts: Table<Post>,
    pub engagements: Table<Engagement>,
    pub stats: LoadStats,
}

/// Run the loader selected by `mode`
pub fn load(config: &Config, mode: LoadMode) -> Result<LoadedTables> {
    match mode {
        LoadMode::Sequential => load_sequential(config),
        LoadMode::Parallel => load_parallel(config),
    }
}

// =============================================================================
// Foreign-Key Filter
// =============================================================================

/// Stage 1: accepts posts whose username belongs to a loaded user
pub(crate) struct PostFilter {
    users: Table<User>,
    usernames: HashSet<String>,
    posts: Table<Post>,
    dangling: usize,
}

impl PostFilter {
    pub(crate) fn new(users: Table<User>) -> Self {
        let usernames = users.values().map(|u| u.username.clone()).collect();
        Self {
            users,
            usernames,
            posts: Table::new(),
            dangling: 0,
        }
    }

    pub(crate) fn offer(&mut self, post: Post) {
        if self.usernames.contains(&post.username) {
            self.posts.insert(post.id, post);
        } else {
            tracing::trace!(post_id = post.id, username = %post.username, "dropped post with unknown user");
            self.dangling += 1;
        }
    }

    /// Freeze the accepted posts and move on to engagements
    pub(crate) fn seal(self) -> EngagementFilter {
        let post_ids = self.posts.keys().copied().collect();
        EngagementFilter {
            users: self.users,
            usernames: self.usernames,
            posts: self.posts,
            post_ids,
            engagements: Table::new(),
            dangling: self.dangling,
        }
    }
}

/// Stage 2: accepts engagements whose post and user both survived
pub(crate) struct EngagementFilter {
    users: Table<User>,
    usernames: HashSet<String>,
    posts: Table<Post>,
    post_ids: HashSet<RecordId>,
    engagements: Table<Engagement>,
    dangling: usize,
}

impl EngagementFilter {
    pub(crate) fn offer(&mut self, engagement: Engagement) {
        if self.post_ids.contains(&engagement.post_id)
            && self.usernames.contains(&engagement.username)
        {
            self.engagements.insert(engagement.id, engagement);
        } else {
            tracing::trace!(
                engagement_id = engagement.id,
                post_id = engagement.post_id,
                username = %engagement.username,
                "dropped engagement with unknown post or user"
            );
            self.dangling += 1;
        }
    }

    pub(crate) fn finish(self, reads: [ReadStats; 3]) -> LoadedTables {
        let stats = LoadStats {
            users: self.users.len(),
            posts: self.posts.len(),
            engagements: self.engagements.len(),
            malformed: reads.iter().map(|r| r.malformed).sum(),
            dangling: self.dangling,
        };

        tracing::debug!(
            users = stats.users,
            posts = stats.posts,
            engagements = stats.engagements,
            malformed = stats.malformed,
            dangling = stats.dangling,
            "tables assembled"
        );

        LoadedTables {
            users: self.users,
            posts: self.posts,
            engagements: self.engagements,
            stats,
        }
    }
}

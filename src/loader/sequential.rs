//! Sequential Loader
//!
//! Reads users, then posts, then engagements, filtering each row as it
//! streams past.

use crate::config::Config;
use crate::error::Result;
use crate::record::{Engagement, Post, Table, User};
use crate::storage::read_rows;

use super::{LoadedTables, PostFilter};

/// Load all three tables one file at a time.
///
/// O(U + P + E) in rows read. Fails if any file cannot be opened.
pub fn load_sequential(config: &Config) -> Result<LoadedTables> {
    let mut users = Table::new();
    let user_reads = read_rows::<User, _>(&config.users_path, |user| {
        users.insert(user.id, user);
    })?;

    let mut posts = PostFilter::new(users);
    let post_reads = read_rows::<Post, _>(&config.posts_path, |post| posts.offer(post))?;

    let mut engagements = posts.seal();
    let engagement_reads = read_rows::<Engagement, _>(&config.engagements_path, |e| {
        engagements.offer(e)
    })?;

    Ok(engagements.finish([user_reads, post_reads, engagement_reads]))
}

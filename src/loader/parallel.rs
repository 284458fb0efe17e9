//! Parallel Loader
//!
//! One scoped thread per file parses rows without looking at the other
//! files. Foreign-key filtering runs afterwards over the complete row sets,
//! in file order, through the same filter the sequential loader uses.

use std::path::Path;

use crossbeam::thread::{self, ScopedJoinHandle};

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::record::{Engagement, Post, Record, Table, User};
use crate::storage::{read_rows, ReadStats};

use super::{LoadedTables, PostFilter};

type Parsed<R> = (Vec<R>, ReadStats);

/// Load all three tables, parsing the files concurrently.
///
/// The committed result equals [`load_sequential`](super::load_sequential)
/// for the same files. If several files fail to open, the error for the
/// first one in users/posts/engagements order is returned.
pub fn load_parallel(config: &Config) -> Result<LoadedTables> {
    let (users, posts, engagements) = thread::scope(|s| {
        let users = s.spawn(|_| parse_all::<User>(&config.users_path));
        let posts = s.spawn(|_| parse_all::<Post>(&config.posts_path));
        let engagements = s.spawn(|_| parse_all::<Engagement>(&config.engagements_path));
        (join(users), join(posts), join(engagements))
    })
    .map_err(|_| StoreError::Loader("parse scope panicked".to_string()))?;

    let (user_rows, user_reads) = users?;
    let (post_rows, post_reads) = posts?;
    let (engagement_rows, engagement_reads) = engagements?;

    let mut users = Table::new();
    for user in user_rows {
        users.insert(user.id, user);
    }

    let mut posts = PostFilter::new(users);
    for post in post_rows {
        posts.offer(post);
    }

    let mut engagements = posts.seal();
    for engagement in engagement_rows {
        engagements.offer(engagement);
    }

    Ok(engagements.finish([user_reads, post_reads, engagement_reads]))
}

fn parse_all<R: Record>(path: &Path) -> Result<Parsed<R>> {
    let mut rows = Vec::new();
    let stats = read_rows::<R, _>(path, |row| rows.push(row))?;
    Ok((rows, stats))
}

fn join<R: Record>(handle: ScopedJoinHandle<'_, Result<Parsed<R>>>) -> Result<Parsed<R>> {
    handle.join().map_err(|_| {
        StoreError::Loader(format!("{} parse task panicked", R::TABLE))
    })?
}

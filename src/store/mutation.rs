//! Mutations
//!
//! Every mutation writes the backing file first and updates memory only
//! after the write is installed, so memory is never ahead of disk.

use crate::error::Result;
use crate::record::{
    parse_line, replace_field, validate_field, Engagement, EngagementKind, Post, Record,
    RecordId, TableKind, User,
};
use crate::storage::{append_line, atomic_rewrite};

use super::TableStore;

/// `views` column in posts rows
const POST_VIEWS_COLUMN: usize = 3;

impl TableStore {
    /// Add `delta` to a post's view count and persist it.
    ///
    /// Views clamp at zero. Returns `Ok(false)` (no side effect) if the post
    /// does not exist. The whole posts file is rewritten on every call.
    pub fn update_post_views(&self, post_id: RecordId, delta: i32) -> Result<bool> {
        let mut posts = self.posts.lock();

        let Some(current) = posts.get(&post_id).map(|p| p.views) else {
            return Ok(false);
        };
        let new_views = current.saturating_add(delta).max(0);
        let views_field = new_views.to_string();

        atomic_rewrite(&self.config.posts_path, self.config.sync_mode, |line| {
            let row = parse_line::<Post>(line)?;
            (row.id == post_id).then(|| replace_field(line, POST_VIEWS_COLUMN, &views_field))
        })?;

        if let Some(post) = posts.get_mut(&post_id) {
            post.views = new_views;
        }

        tracing::debug!(post_id, delta, views = new_views, "updated post views");
        Ok(true)
    }

    /// Append an engagement if its post and user exist.
    ///
    /// Returns `Ok(false)` without touching disk or memory when either
    /// reference is missing. The engagement id is not checked for
    /// uniqueness; a reused id replaces the in-memory row and, on reload,
    /// the later file row wins.
    pub fn add_engagement(&self, mut record: Engagement) -> Result<bool> {
        validate_field("username", &record.username)?;
        validate_field("type", record.kind.as_str())?;
        validate_field("comment", &record.comment)?;
        // Same kind the appended row parses back to
        record.kind = EngagementKind::from(record.kind.as_str());

        // Held until the insert so a concurrent rename cannot interleave
        let users = self.users.lock();
        let posts = self.posts.lock();

        let post_exists = posts.contains_key(&record.post_id);
        let user_exists = users.values().any(|u| u.username == record.username);
        if !(post_exists && user_exists) {
            tracing::warn!(
                engagement_id = record.id,
                post_id = record.post_id,
                username = %record.username,
                post_exists,
                user_exists,
                "rejected engagement with dangling reference"
            );
            return Ok(false);
        }

        let mut engagements = self.engagements.lock();
        append_line(
            &self.config.engagements_path,
            TableKind::Engagements,
            &record.to_line(),
            self.config.sync_mode,
        )?;

        tracing::debug!(engagement_id = record.id, post_id = record.post_id, "appended engagement");
        engagements.insert(record.id, record);
        Ok(true)
    }

    /// Rename a user in all three tables.
    ///
    /// Holds every lock for the whole call. Returns `Ok(false)` if the user
    /// does not exist or another user already has `new_username`; renaming
    /// to the current name is a successful no-op.
    ///
    /// Files are rewritten users → posts → engagements, each installed
    /// before the next begins. An error part way through leaves the earlier
    /// files renamed and memory unchanged; the store has no rollback.
    pub fn rename_user(&self, user_id: RecordId, new_username: &str) -> Result<bool> {
        let mut all = self.lock_all();

        let Some(old_username) = all.users.get(&user_id).map(|u| u.username.clone()) else {
            return Ok(false);
        };
        if old_username == new_username {
            return Ok(true);
        }
        validate_field("username", new_username)?;

        if all.users.values().any(|u| u.username == new_username) {
            tracing::warn!(user_id, new_username, "rename rejected, username taken");
            return Ok(false);
        }

        let sync = self.config.sync_mode;

        let user_rows = atomic_rewrite(&self.config.users_path, sync, |line| {
            let row = parse_line::<User>(line)?;
            (row.id == user_id).then(|| rename_in(line, TableKind::Users, new_username))
        })?;
        let post_rows = atomic_rewrite(&self.config.posts_path, sync, |line| {
            let row = parse_line::<Post>(line)?;
            (row.username == old_username).then(|| rename_in(line, TableKind::Posts, new_username))
        })?;
        let engagement_rows = atomic_rewrite(&self.config.engagements_path, sync, |line| {
            let row = parse_line::<Engagement>(line)?;
            (row.username == old_username)
                .then(|| rename_in(line, TableKind::Engagements, new_username))
        })?;

        // Disk is done; now memory
        if let Some(user) = all.users.get_mut(&user_id) {
            user.username = new_username.to_string();
        }
        for post in all.posts.values_mut().filter(|p| p.username == old_username) {
            post.username = new_username.to_string();
        }
        for engagement in all
            .engagements
            .values_mut()
            .filter(|e| e.username == old_username)
        {
            engagement.username = new_username.to_string();
        }

        tracing::info!(
            user_id,
            old = %old_username,
            new = new_username,
            user_rows,
            post_rows,
            engagement_rows,
            "renamed user"
        );
        Ok(true)
    }
}

fn rename_in(line: &str, table: TableKind, new_username: &str) -> String {
    replace_field(line, table.username_column(), new_username)
}

//! Queries
//!
//! Read paths resolve users first, release that lock, then scan
//! engagements. Neither query holds two locks at once.

use std::collections::HashSet;

use crate::record::{EngagementKind, RecordId};

use super::TableStore;

impl TableStore {
    /// Every comment written by `user_id`, as `(post_id, comment)` pairs
    /// sorted by post id and then by comment text.
    ///
    /// An unknown user yields an empty list.
    pub fn get_all_user_comments(&self, user_id: RecordId) -> Vec<(RecordId, String)> {
        let username = match self.users.lock().get(&user_id) {
            Some(user) => user.username.clone(),
            None => return Vec::new(),
        };

        let mut comments: Vec<(RecordId, String)> = self
            .engagements
            .lock()
            .values()
            .filter(|e| e.username == username && e.kind == EngagementKind::Comment)
            .map(|e| (e.post_id, e.comment.clone()))
            .collect();

        comments.sort();
        comments
    }

    /// Count `(likes, comments)` made by users whose location equals
    /// `location` exactly.
    ///
    /// Returns `(0, 0)` without scanning engagements when nobody lives there.
    pub fn get_all_engagements_by_location(&self, location: &str) -> (usize, usize) {
        let usernames: HashSet<String> = self
            .users
            .lock()
            .values()
            .filter(|u| u.location == location)
            .map(|u| u.username.clone())
            .collect();

        if usernames.is_empty() {
            return (0, 0);
        }

        let engagements = self.engagements.lock();
        engagements
            .values()
            .filter(|e| usernames.contains(&e.username))
            .fold((0, 0), |(likes, comments), e| match e.kind {
                EngagementKind::Like => (likes + 1, comments),
                EngagementKind::Comment => (likes, comments + 1),
                EngagementKind::Other(_) => (likes, comments),
            })
    }
}

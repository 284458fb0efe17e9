//! Referential-integrity sweep

use std::collections::HashSet;

use serde::Serialize;

use crate::record::RecordId;

use super::TableStore;

/// Rows whose foreign keys do not resolve. Empty on every committed state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    /// Post ids whose username matches no user
    pub posts_with_unknown_user: Vec<RecordId>,
    /// Engagement ids whose post id matches no post
    pub engagements_with_unknown_post: Vec<RecordId>,
    /// Engagement ids whose username matches no user
    pub engagements_with_unknown_user: Vec<RecordId>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.posts_with_unknown_user.is_empty()
            && self.engagements_with_unknown_post.is_empty()
            && self.engagements_with_unknown_user.is_empty()
    }
}

impl TableStore {
    /// Check referential closure across all three tables at one instant
    pub fn verify_integrity(&self) -> IntegrityReport {
        let all = self.lock_all();

        let usernames: HashSet<&str> = all.users.values().map(|u| u.username.as_str()).collect();
        let mut report = IntegrityReport::default();

        for post in all.posts.values() {
            if !usernames.contains(post.username.as_str()) {
                report.posts_with_unknown_user.push(post.id);
            }
        }
        for engagement in all.engagements.values() {
            if !all.posts.contains_key(&engagement.post_id) {
                report.engagements_with_unknown_post.push(engagement.id);
            }
            if !usernames.contains(engagement.username.as_str()) {
                report.engagements_with_unknown_user.push(engagement.id);
            }
        }

        if !report.is_clean() {
            tracing::warn!(?report, "referential integrity violated");
        }
        report
    }
}

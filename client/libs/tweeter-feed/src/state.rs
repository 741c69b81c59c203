//! Feed state transitions
//!
//! Every transition is synchronous; the store applies them under its lock
//! on either side of a backend call.

use tweeter_common::{Post, RefreshPolicy};

pub const LOAD_ERROR_MESSAGE: &str = "Failed to load tweets. Please try again.";
pub const POST_ERROR_MESSAGE: &str = "Failed to post tweet. Please try again.";

/// What views render
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedSnapshot {
    pub posts: Vec<Post>,
    pub loading: bool,
    pub error: Option<String>,
    pub submitting: bool,
    /// Temporary ids of writes still in flight, oldest first
    pub pending: Vec<String>,
}

impl FeedSnapshot {
    /// Whether `post` is an optimistic entry awaiting the backend
    pub fn is_pending(&self, post: &Post) -> bool {
        self.pending.contains(&post.id)
    }

    pub fn pending_count(&self) -> usize {
        self.posts.iter().filter(|p| self.is_pending(p)).count()
    }
}

#[derive(Debug, Default)]
pub(crate) struct FeedState {
    snapshot: FeedSnapshot,
    /// Foreground refreshes still in flight
    refreshing: usize,
}

impl FeedState {
    pub(crate) fn snapshot(&self) -> &FeedSnapshot {
        &self.snapshot
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.snapshot.pending.len()
    }

    pub(crate) fn begin_refresh(&mut self) {
        self.refreshing += 1;
        self.snapshot.loading = true;
        self.snapshot.error = None;
    }

    pub(crate) fn finish_refresh(&mut self, fetched: Vec<Post>, policy: RefreshPolicy, sort: bool) {
        self.apply_fetched(fetched, policy, sort);
        self.end_refresh();
    }

    /// Foreground failure: posts stay as they were
    pub(crate) fn fail_refresh(&mut self) {
        self.snapshot.error = Some(LOAD_ERROR_MESSAGE.to_string());
        self.end_refresh();
    }

    /// Silent success: neither `loading` nor `error` change
    pub(crate) fn apply_fetched(&mut self, mut fetched: Vec<Post>, policy: RefreshPolicy, sort: bool) {
        if sort {
            fetched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }

        if policy == RefreshPolicy::MergePending && !self.snapshot.pending.is_empty() {
            let mut merged: Vec<Post> = self
                .snapshot
                .posts
                .iter()
                .filter(|p| self.snapshot.is_pending(p))
                .cloned()
                .collect();
            merged.extend(fetched);
            fetched = merged;
        }

        self.snapshot.posts = fetched;
    }

    /// Prepend a pending post
    pub(crate) fn begin_post(&mut self, pending: Post) {
        self.snapshot.pending.push(pending.id.clone());
        self.snapshot.posts.insert(0, pending);
        self.snapshot.submitting = true;
        self.snapshot.error = None;
    }

    /// Swap the pending entry for the confirmed record, in place.
    ///
    /// A refresh that raced the write may already have delivered the
    /// confirmed id; that copy is dropped so the id appears once. When the
    /// pending entry is gone (wholesale replace), the list is left alone and
    /// the next refresh brings the post in.
    pub(crate) fn confirm_post(&mut self, temp_id: &str, confirmed: Post) {
        self.settle(temp_id);

        let posts = &mut self.snapshot.posts;
        let Some(idx) = posts.iter().position(|p| p.id == temp_id) else {
            return;
        };

        let confirmed_id = confirmed.id.clone();
        posts[idx] = confirmed;

        let mut position = 0;
        posts.retain(|p| {
            let keep = position == idx || p.id != confirmed_id;
            position += 1;
            keep
        });
    }

    /// Remove the pending entry and surface the write failure
    pub(crate) fn rollback_post(&mut self, temp_id: &str) {
        self.settle(temp_id);
        self.snapshot.posts.retain(|p| p.id != temp_id);
        self.snapshot.error = Some(POST_ERROR_MESSAGE.to_string());
    }

    pub(crate) fn clear_error(&mut self) {
        self.snapshot.error = None;
    }

    fn end_refresh(&mut self) {
        self.refreshing = self.refreshing.saturating_sub(1);
        self.snapshot.loading = self.refreshing > 0;
    }

    fn settle(&mut self, temp_id: &str) {
        self.snapshot.pending.retain(|id| id != temp_id);
        self.snapshot.submitting = !self.snapshot.pending.is_empty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn post(id: &str, minute: u32) -> Post {
        Post {
            id: id.to_string(),
            content: format!("content {}", id),
            author: "alice".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, minute, 0).unwrap(),
        }
    }

    fn ids(state: &FeedState) -> Vec<&str> {
        state.snapshot().posts.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_refresh_flags() {
        let mut state = FeedState::default();
        state.snapshot.error = Some("old".into());

        state.begin_refresh();
        assert!(state.snapshot().loading);
        assert_eq!(state.snapshot().error, None);

        state.finish_refresh(vec![post("2", 2), post("1", 1)], RefreshPolicy::MergePending, false);
        assert!(!state.snapshot().loading);
        assert_eq!(ids(&state), vec!["2", "1"]);
    }

    #[test]
    fn test_failed_refresh_keeps_posts() {
        let mut state = FeedState::default();
        state.finish_refresh(vec![post("1", 1)], RefreshPolicy::Replace, false);

        state.begin_refresh();
        state.fail_refresh();
        assert_eq!(ids(&state), vec!["1"]);
        assert_eq!(state.snapshot().error.as_deref(), Some(LOAD_ERROR_MESSAGE));
        assert!(!state.snapshot().loading);
    }

    #[test]
    fn test_merge_keeps_pending_in_front() {
        let mut state = FeedState::default();
        state.finish_refresh(vec![post("1", 1)], RefreshPolicy::MergePending, false);
        state.begin_post(post("tmp-a", 5));

        state.apply_fetched(vec![post("3", 3), post("1", 1)], RefreshPolicy::MergePending, false);
        assert_eq!(ids(&state), vec!["tmp-a", "3", "1"]);

        state.apply_fetched(vec![post("3", 3)], RefreshPolicy::Replace, false);
        assert_eq!(ids(&state), vec!["3"]);
    }

    #[test]
    fn test_sort_fallback_is_stable() {
        let mut state = FeedState::default();
        let fetched = vec![post("old", 1), post("new", 9), post("tie-a", 5), post("tie-b", 5)];

        state.apply_fetched(fetched.clone(), RefreshPolicy::Replace, false);
        assert_eq!(ids(&state), vec!["old", "new", "tie-a", "tie-b"]);

        state.apply_fetched(fetched, RefreshPolicy::Replace, true);
        assert_eq!(ids(&state), vec!["new", "tie-a", "tie-b", "old"]);
    }

    #[test]
    fn test_confirm_replaces_in_place() {
        let mut state = FeedState::default();
        state.finish_refresh(vec![post("1", 1)], RefreshPolicy::MergePending, false);
        state.begin_post(post("tmp-a", 5));
        state.begin_post(post("tmp-b", 6));
        assert_eq!(ids(&state), vec!["tmp-b", "tmp-a", "1"]);

        state.confirm_post("tmp-a", post("7", 5));
        assert_eq!(ids(&state), vec!["tmp-b", "7", "1"]);
        assert!(state.snapshot().submitting);

        state.confirm_post("tmp-b", post("8", 6));
        assert_eq!(ids(&state), vec!["8", "7", "1"]);
        assert!(!state.snapshot().submitting);
    }

    #[test]
    fn test_confirm_drops_raced_duplicate() {
        let mut state = FeedState::default();
        state.begin_post(post("tmp-a", 5));
        // Refresh already returned the stored copy
        state.apply_fetched(vec![post("7", 5), post("1", 1)], RefreshPolicy::MergePending, false);
        assert_eq!(ids(&state), vec!["tmp-a", "7", "1"]);

        state.confirm_post("tmp-a", post("7", 5));
        assert_eq!(ids(&state), vec!["7", "1"]);
    }

    #[test]
    fn test_confirm_after_replace_leaves_list_alone() {
        let mut state = FeedState::default();
        state.begin_post(post("tmp-a", 5));
        state.apply_fetched(vec![post("1", 1)], RefreshPolicy::Replace, false);

        state.confirm_post("tmp-a", post("7", 5));
        assert_eq!(ids(&state), vec!["1"]);
        assert!(!state.snapshot().submitting);
    }

    #[test]
    fn test_rollback_restores_previous_list() {
        let mut state = FeedState::default();
        state.finish_refresh(vec![post("2", 2), post("1", 1)], RefreshPolicy::MergePending, false);
        let before = state.snapshot().posts.clone();

        state.begin_post(post("tmp-a", 5));
        state.rollback_post("tmp-a");

        assert_eq!(state.snapshot().posts, before);
        assert_eq!(state.snapshot().error.as_deref(), Some(POST_ERROR_MESSAGE));
        assert!(!state.snapshot().submitting);
        assert_eq!(state.pending_len(), 0);
    }

    #[test]
    fn test_clear_error_only_touches_error() {
        let mut state = FeedState::default();
        state.begin_refresh();
        state.begin_post(post("tmp-a", 5));
        state.rollback_post("tmp-a");
        assert!(state.snapshot().error.is_some());

        state.clear_error();
        assert_eq!(state.snapshot().error, None);
        assert!(state.snapshot().loading);
    }

    #[test]
    fn test_overlapping_refreshes_keep_loading() {
        let mut state = FeedState::default();
        state.begin_refresh();
        state.begin_refresh();

        state.finish_refresh(vec![post("1", 1)], RefreshPolicy::MergePending, false);
        assert!(state.snapshot().loading);

        state.fail_refresh();
        assert!(!state.snapshot().loading);
        assert_eq!(ids(&state), vec!["1"]);
    }

    #[test]
    fn test_pending_follows_in_flight_writes_not_id_shape() {
        let mut state = FeedState::default();
        // Backend ids are opaque text; a stored one may look temporary
        state.finish_refresh(vec![post("tmp-stored", 1)], RefreshPolicy::MergePending, false);
        assert_eq!(state.snapshot().pending_count(), 0);
        assert!(!state.snapshot().is_pending(&state.snapshot().posts[0]));

        state.begin_post(post("draft-1", 5));
        assert_eq!(state.snapshot().pending, vec!["draft-1"]);
        assert_eq!(state.snapshot().pending_count(), 1);

        state.confirm_post("draft-1", post("9", 5));
        assert!(state.snapshot().pending.is_empty());
        assert_eq!(state.snapshot().pending_count(), 0);
    }
}

use ratemypets_common::model::{Id, comment::Comment, post::PostMarker};
use std::collections::HashMap;
use tracing::warn;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub enum CommentLoadState {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    Failed(String),
}

/// Comments of one post, as last fetched from the remote.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct CommentThread {
    items: Vec<Comment>,
    load_state: CommentLoadState,
    visible: bool,
    last_issued: u64,
    loaded_once: bool,
}

impl CommentThread {
    #[must_use]
    pub fn items(&self) -> &[Comment] {
        &self.items
    }

    #[must_use]
    pub fn load_state(&self) -> &CommentLoadState {
        &self.load_state
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Number of comments, once a fetch has succeeded.
    #[must_use]
    pub fn count(&self) -> Option<usize> {
        self.loaded_once.then_some(self.items.len())
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct FetchTicket(u64);

/// Per-post comment threads. Threads are independent of each other and of feed pagination.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct CommentCache {
    threads: HashMap<Id<PostMarker>, CommentThread>,
}

impl CommentCache {
    #[must_use]
    pub fn thread(&self, post_id: &Id<PostMarker>) -> Option<&CommentThread> {
        self.threads.get(post_id)
    }

    fn thread_mut(&mut self, post_id: &Id<PostMarker>) -> &mut CommentThread {
        self.threads.entry(post_id.clone()).or_default()
    }

    pub(crate) fn begin_fetch(&mut self, post_id: &Id<PostMarker>) -> FetchTicket {
        let thread = self.thread_mut(post_id);
        thread.last_issued += 1;
        thread.load_state = CommentLoadState::Loading;
        FetchTicket(thread.last_issued)
    }

    /// Replaces the thread's comments with a fetch result, unless a newer fetch for the same post
    /// was issued since. Comments that belong to another post are dropped.
    ///
    /// Returns the new comment count if the result was applied.
    pub(crate) fn finish_fetch(
        &mut self,
        post_id: &Id<PostMarker>,
        ticket: FetchTicket,
        result: Result<Vec<Comment>, String>,
    ) -> Option<usize> {
        let thread = self.thread_mut(post_id);
        if ticket.0 != thread.last_issued {
            return None;
        }

        match result {
            Ok(mut comments) => {
                let fetched = comments.len();
                comments.retain(|comment| &comment.post_id == post_id);
                if comments.len() != fetched {
                    warn!(
                        post = %post_id,
                        dropped = fetched - comments.len(),
                        "Dropped comments belonging to other posts"
                    );
                }

                thread.items = comments;
                thread.load_state = CommentLoadState::Loaded;
                thread.loaded_once = true;
                Some(thread.items.len())
            }
            Err(message) => {
                thread.load_state = CommentLoadState::Failed(message);
                None
            }
        }
    }

    pub(crate) fn toggle_visibility(&mut self, post_id: &Id<PostMarker>) -> bool {
        let thread = self.thread_mut(post_id);
        thread.visible = !thread.visible;
        thread.visible
    }

    pub(crate) fn forget(&mut self, post_id: &Id<PostMarker>) {
        self.threads.remove(post_id);
    }
}

#[cfg(test)]
mod tests {
    use crate::comments::{CommentCache, CommentLoadState};
    use ratemypets_common::model::{
        Id,
        comment::{Comment, CommentText},
        user::{User, Username},
    };
    use time::macros::utc_datetime;

    fn comment(id: &str, post: &str) -> Comment {
        Comment {
            id: Id::new(id).unwrap(),
            post_id: Id::new(post).unwrap(),
            author: User {
                id: Id::new("u1").unwrap(),
                username: Username::new("bob".to_owned()).unwrap(),
            },
            text: CommentText::new(format!("comment {id}")).unwrap(),
            created_at: utc_datetime!(2025-02-02 02:02),
        }
    }

    #[test]
    fn fetch_replaces_wholesale() {
        let mut cache = CommentCache::default();
        let post = Id::new("p1").unwrap();

        let ticket = cache.begin_fetch(&post);
        let first = vec![comment("a", "p1"), comment("b", "p1")];
        assert_eq!(cache.finish_fetch(&post, ticket, Ok(first)), Some(2));

        let ticket = cache.begin_fetch(&post);
        assert_eq!(
            cache.finish_fetch(&post, ticket, Ok(vec![comment("c", "p1")])),
            Some(1)
        );

        let thread = cache.thread(&post).unwrap();
        assert_eq!(thread.items().len(), 1);
        assert_eq!(thread.items()[0].id.get(), "c");
        assert_eq!(thread.count(), Some(1));
    }

    #[test]
    fn orphans_are_dropped() {
        let mut cache = CommentCache::default();
        let post = Id::new("p1").unwrap();

        let ticket = cache.begin_fetch(&post);
        let count = cache.finish_fetch(
            &post,
            ticket,
            Ok(vec![comment("a", "p1"), comment("x", "p2")]),
        );

        assert_eq!(count, Some(1));
        assert!(cache.thread(&Id::new("p2").unwrap()).is_none());
    }

    #[test]
    fn per_post_fetches_do_not_interfere() {
        let mut cache = CommentCache::default();
        let first = Id::new("p1").unwrap();
        let second = Id::new("p2").unwrap();

        let first_ticket = cache.begin_fetch(&first);
        let second_ticket = cache.begin_fetch(&second);

        assert_eq!(
            cache.finish_fetch(&second, second_ticket, Ok(vec![comment("b", "p2")])),
            Some(1)
        );
        assert_eq!(
            cache.finish_fetch(&first, first_ticket, Ok(Vec::new())),
            Some(0)
        );
    }

    #[test]
    fn superseded_fetch_is_ignored() {
        let mut cache = CommentCache::default();
        let post = Id::new("p1").unwrap();

        let mount = cache.begin_fetch(&post);
        let after_submit = cache.begin_fetch(&post);

        assert_eq!(
            cache.finish_fetch(&post, after_submit, Ok(vec![comment("a", "p1")])),
            Some(1)
        );
        assert_eq!(cache.finish_fetch(&post, mount, Ok(Vec::new())), None);
        assert_eq!(cache.thread(&post).unwrap().count(), Some(1));
    }

    #[test]
    fn failure_keeps_items_and_visibility_is_independent() {
        let mut cache = CommentCache::default();
        let post = Id::new("p1").unwrap();

        assert!(cache.toggle_visibility(&post));
        assert_eq!(cache.thread(&post).unwrap().count(), None);

        let ticket = cache.begin_fetch(&post);
        cache.finish_fetch(&post, ticket, Ok(vec![comment("a", "p1")]));
        let ticket = cache.begin_fetch(&post);
        assert_eq!(
            cache.finish_fetch(&post, ticket, Err("offline".to_owned())),
            None
        );

        let thread = cache.thread(&post).unwrap();
        assert_eq!(
            thread.load_state(),
            &CommentLoadState::Failed("offline".to_owned())
        );
        assert_eq!(thread.count(), Some(1));
        assert!(thread.is_visible());
        assert!(!cache.toggle_visibility(&post));
    }
}

use ratemypets_common::model::{
    Id,
    post::{Post, PostMarker},
};
use std::mem;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub enum LoadStatus {
    /// No load has been issued yet.
    #[default]
    Idle,
    Loading,
    /// The last load succeeded. The collection may be empty.
    Ready,
    Failed(String),
}

/// Identifies one issued load so that superseded results can be told apart.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct LoadTicket(u64);

/// A change the remote confirmed while a load was in flight.
#[derive(Clone, Eq, PartialEq, Debug)]
enum Confirmed {
    Inserted(Post),
    Updated(Post),
    Likes(Post),
    Removed(Id<PostMarker>),
}

/// The feed's posts, newest first.
///
/// Mutation goes through the crate-private transitions, each of which is applied whole.
/// Changes confirmed after the latest load was issued are replayed onto that load's result.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct PostStore {
    posts: Vec<Post>,
    status: LoadStatus,
    last_issued: u64,
    confirmed_since_load: Vec<Confirmed>,
}

impl PostStore {
    #[must_use]
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    #[must_use]
    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    #[must_use]
    pub fn get(&self, post_id: &Id<PostMarker>) -> Option<&Post> {
        self.posts.iter().find(|post| &post.id == post_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    fn get_mut(&mut self, post_id: &Id<PostMarker>) -> Option<&mut Post> {
        self.posts.iter_mut().find(|post| &post.id == post_id)
    }

    pub(crate) fn begin_load(&mut self) -> LoadTicket {
        self.last_issued += 1;
        self.status = LoadStatus::Loading;
        self.confirmed_since_load.clear();
        LoadTicket(self.last_issued)
    }

    fn record(&mut self, change: Confirmed) {
        if self.status == LoadStatus::Loading {
            self.confirmed_since_load.push(change);
        }
    }

    fn replay(&mut self, change: Confirmed) {
        match change {
            Confirmed::Inserted(post) => self.put_newest(post),
            Confirmed::Updated(post) => {
                if let Some(stored) = self.get_mut(&post.id) {
                    stored.apply_update(post);
                }
            }
            Confirmed::Likes(post) => {
                self.set_likes(&post);
            }
            Confirmed::Removed(post_id) => {
                self.take(&post_id);
            }
        }
    }

    /// Applies a load result if it belongs to the most recently issued load.
    ///
    /// Returns whether the result was applied.
    pub(crate) fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Post>, String>,
    ) -> bool {
        if ticket.0 != self.last_issued {
            return false;
        }

        let confirmed = mem::take(&mut self.confirmed_since_load);
        match result {
            Ok(posts) => {
                self.posts = posts;
                self.status = LoadStatus::Ready;
                for change in confirmed {
                    self.replay(change);
                }
            }
            Err(message) => self.status = LoadStatus::Failed(message),
        }
        true
    }

    fn set_likes(&mut self, updated: &Post) -> bool {
        match self.get_mut(&updated.id) {
            Some(post) => {
                post.liked_by.clone_from(&updated.liked_by);
                true
            }
            None => false,
        }
    }

    fn put_newest(&mut self, post: Post) {
        self.posts.retain(|existing| existing.id != post.id);
        self.posts.insert(0, post);
    }

    fn take(&mut self, post_id: &Id<PostMarker>) -> Option<Post> {
        let index = self.posts.iter().position(|post| &post.id == post_id)?;
        Some(self.posts.remove(index))
    }

    /// Takes the like state of `updated` over into the stored copy of that post.
    pub(crate) fn apply_likes(&mut self, updated: &Post) -> bool {
        self.record(Confirmed::Likes(updated.clone()));
        self.set_likes(updated)
    }

    pub(crate) fn apply_update(&mut self, updated: Post) -> Option<&Post> {
        self.record(Confirmed::Updated(updated.clone()));
        let post = self.get_mut(&updated.id)?;
        post.apply_update(updated);
        Some(&*post)
    }

    pub(crate) fn insert_newest(&mut self, post: Post) {
        self.record(Confirmed::Inserted(post.clone()));
        self.put_newest(post);
    }

    pub(crate) fn remove(&mut self, post_id: &Id<PostMarker>) -> Option<Post> {
        self.record(Confirmed::Removed(post_id.clone()));
        self.take(post_id)
    }

    pub(crate) fn set_comment_count(&mut self, post_id: &Id<PostMarker>, count: usize) {
        if let Some(post) = self.get_mut(post_id) {
            post.comment_count = count;
        }
    }
}

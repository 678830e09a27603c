//! A [`FeedRemote`] that keeps everything in memory.
//!
//! It applies the same authentication and authorization rules as the real server, so clients can
//! be exercised against it end to end. Failures can be injected per operation.

use crate::remote::{FeedRemote, RemoteError, Result};
use async_trait::async_trait;
use ratemypets_common::model::{
    Id,
    auth::{Credential, Identity, can_mutate},
    comment::{Comment, CommentMarker, CommentText, CreateComment},
    post::{Category, Post, PostData, PostMarker},
    user::{Role, Username},
};
use std::{
    collections::{BTreeSet, HashMap},
    sync::{Mutex, MutexGuard, PoisonError},
};
use time::UtcDateTime;
use tracing::debug;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum RemoteOperation {
    FetchPosts,
    CreatePost,
    UpdatePost,
    DeletePost,
    LikePost,
    UnlikePost,
    FetchComments,
    CreateComment,
}

#[derive(Debug, Default)]
pub struct InMemoryRemote {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    /// Newest first, the order the server lists them in.
    posts: Vec<Post>,
    /// Oldest first.
    comments: Vec<Comment>,
    accounts: HashMap<String, Identity>,
    next_id: u64,
    failures: HashMap<RemoteOperation, String>,
    calls: HashMap<RemoteOperation, usize>,
}

impl MemoryState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn call(&mut self, operation: RemoteOperation) -> Result<()> {
        *self.calls.entry(operation).or_default() += 1;

        match self.failures.remove(&operation) {
            Some(message) => Err(RemoteError::Transport(message)),
            None => Ok(()),
        }
    }

    fn authenticate(&self, credential: &Credential) -> Result<Identity> {
        self.accounts
            .get(credential.bearer())
            .cloned()
            .ok_or(RemoteError::Unauthenticated)
    }

    fn post_mut(&mut self, post_id: &Id<PostMarker>) -> Result<&mut Post> {
        self.posts
            .iter_mut()
            .find(|post| &post.id == post_id)
            .ok_or_else(|| RemoteError::NotFound(format!("post {post_id}")))
    }
}

impl InMemoryRemote {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Creates an account and hands out the credential the remote will accept for it.
    ///
    /// # Panics
    /// If `username` is not a valid username.
    pub fn register(&self, username: &str, role: Role) -> (Identity, Credential) {
        let mut state = self.lock();

        let identity = Identity {
            user_id: Id::new(state.next_id("user")).expect("generated ids are never empty"),
            username: Username::new(username.to_owned()).expect("invalid username"),
            role,
        };
        let credential = Credential::new(state.next_id("token"))
            .expect("generated tokens are never empty");

        state
            .accounts
            .insert(credential.bearer().to_owned(), identity.clone());

        (identity, credential)
    }

    /// Publishes a post as `author` without going through the client.
    ///
    /// # Panics
    /// If the generated post id is rejected as blank.
    pub fn seed_post(&self, author: &Identity, pet_name: &str) -> Post {
        let mut state = self.lock();

        let post = Post {
            id: Id::new(state.next_id("post")).expect("generated ids are never empty"),
            author: author.as_user(),
            pet_name: pet_name.to_owned(),
            category: Category::Other,
            caption: String::new(),
            image_url: format!("https://cdn.example.com/{pet_name}.jpg"),
            liked_by: BTreeSet::new(),
            comment_count: 0,
            created_at: UtcDateTime::now(),
        };
        state.posts.insert(0, post.clone());

        post
    }

    /// Adds a comment as `author` without going through the client, as a concurrent writer would.
    ///
    /// # Panics
    /// If the post does not exist or `text` is blank.
    pub fn seed_comment(
        &self,
        post_id: &Id<PostMarker>,
        author: &Identity,
        text: &str,
    ) -> Comment {
        let mut state = self.lock();

        let comment = Comment {
            id: Id::<CommentMarker>::new(state.next_id("comment"))
                .expect("generated ids are never empty"),
            post_id: post_id.clone(),
            author: author.as_user(),
            text: CommentText::new(text.to_owned()).expect("blank comment"),
            created_at: UtcDateTime::now(),
        };
        state
            .post_mut(post_id)
            .expect("post to comment on")
            .comment_count += 1;
        state.comments.push(comment.clone());

        comment
    }

    /// Makes the next call of `operation` fail with a transport error carrying `message`.
    pub fn fail_next(&self, operation: RemoteOperation, message: &str) {
        self.lock().failures.insert(operation, message.to_owned());
    }

    #[must_use]
    pub fn calls(&self, operation: RemoteOperation) -> usize {
        self.lock().calls.get(&operation).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total_calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    #[must_use]
    pub fn post(&self, post_id: &Id<PostMarker>) -> Option<Post> {
        self.lock()
            .posts
            .iter()
            .find(|post| &post.id == post_id)
            .cloned()
    }

    #[must_use]
    pub fn posts(&self) -> Vec<Post> {
        self.lock().posts.clone()
    }
}

#[async_trait]
impl FeedRemote for InMemoryRemote {
    async fn fetch_posts(&self) -> Result<Vec<Post>> {
        let mut state = self.lock();
        state.call(RemoteOperation::FetchPosts)?;

        Ok(state.posts.clone())
    }

    async fn create_post(&self, data: &PostData, credential: &Credential) -> Result<Post> {
        let mut state = self.lock();
        state.call(RemoteOperation::CreatePost)?;
        let identity = state.authenticate(credential)?;

        let post = Post {
            id: Id::new(state.next_id("post"))?,
            author: identity.as_user(),
            pet_name: data.pet_name().to_owned(),
            category: data.category(),
            caption: data.caption().to_owned(),
            image_url: data.image_url().get().to_owned(),
            liked_by: BTreeSet::new(),
            comment_count: 0,
            created_at: UtcDateTime::now(),
        };
        debug!(post = %post.id, author = %identity.user_id, "Created post");
        state.posts.insert(0, post.clone());

        Ok(post)
    }

    async fn update_post(
        &self,
        post_id: &Id<PostMarker>,
        data: &PostData,
        credential: &Credential,
    ) -> Result<Post> {
        let mut state = self.lock();
        state.call(RemoteOperation::UpdatePost)?;
        let identity = state.authenticate(credential)?;

        let post = state.post_mut(post_id)?;
        if !can_mutate(&identity, post) {
            return Err(RemoteError::Forbidden);
        }

        post.pet_name = data.pet_name().to_owned();
        post.category = data.category();
        post.caption = data.caption().to_owned();
        post.image_url = data.image_url().get().to_owned();

        Ok(post.clone())
    }

    async fn delete_post(&self, post_id: &Id<PostMarker>, credential: &Credential) -> Result<()> {
        let mut state = self.lock();
        state.call(RemoteOperation::DeletePost)?;
        let identity = state.authenticate(credential)?;

        if !can_mutate(&identity, state.post_mut(post_id)?) {
            return Err(RemoteError::Forbidden);
        }

        state.posts.retain(|post| &post.id != post_id);
        state.comments.retain(|comment| &comment.post_id != post_id);

        Ok(())
    }

    async fn like_post(&self, post_id: &Id<PostMarker>, credential: &Credential) -> Result<Post> {
        let mut state = self.lock();
        state.call(RemoteOperation::LikePost)?;
        let identity = state.authenticate(credential)?;

        let post = state.post_mut(post_id)?;
        post.liked_by.insert(identity.user_id);

        Ok(post.clone())
    }

    async fn unlike_post(
        &self,
        post_id: &Id<PostMarker>,
        credential: &Credential,
    ) -> Result<Post> {
        let mut state = self.lock();
        state.call(RemoteOperation::UnlikePost)?;
        let identity = state.authenticate(credential)?;

        let post = state.post_mut(post_id)?;
        post.liked_by.remove(&identity.user_id);

        Ok(post.clone())
    }

    async fn fetch_comments_for_post(&self, post_id: &Id<PostMarker>) -> Result<Vec<Comment>> {
        let mut state = self.lock();
        state.call(RemoteOperation::FetchComments)?;

        Ok(state
            .comments
            .iter()
            .filter(|comment| &comment.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn create_comment(
        &self,
        post_id: &Id<PostMarker>,
        comment: &CreateComment,
        credential: &Credential,
    ) -> Result<Comment> {
        let mut state = self.lock();
        state.call(RemoteOperation::CreateComment)?;
        let identity = state.authenticate(credential)?;

        state.post_mut(post_id)?.comment_count += 1;

        let comment = Comment {
            id: Id::new(state.next_id("comment"))?,
            post_id: post_id.clone(),
            author: identity.as_user(),
            text: comment.text.clone(),
            created_at: UtcDateTime::now(),
        };
        state.comments.push(comment.clone());

        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        memory::{InMemoryRemote, RemoteOperation},
        remote::{FeedRemote, RemoteError},
    };
    use ratemypets_common::model::{
        auth::Credential,
        comment::{CommentText, CreateComment},
        post::PostDraft,
        user::Role,
    };

    fn draft() -> PostDraft {
        PostDraft {
            pet_name: "Rex".to_owned(),
            category: "Dog".to_owned(),
            caption: String::new(),
            image_url: "rex.png".to_owned(),
        }
    }

    #[tokio::test]
    async fn unknown_credentials_are_rejected() {
        let remote = InMemoryRemote::new();
        let stranger = Credential::new("forged".to_owned()).unwrap();

        let result = remote
            .create_post(&draft().validate().unwrap(), &stranger)
            .await;

        assert!(matches!(result, Err(RemoteError::Unauthenticated)));
        assert!(remote.posts().is_empty());
    }

    #[tokio::test]
    async fn only_authors_and_admins_may_mutate() {
        let remote = InMemoryRemote::new();
        let (alice, _) = remote.register("alice", Role::User);
        let (_, bob) = remote.register("bob", Role::User);
        let (_, admin) = remote.register("root", Role::Admin);
        let post = remote.seed_post(&alice, "Rex");

        assert!(matches!(
            remote.delete_post(&post.id, &bob).await,
            Err(RemoteError::Forbidden)
        ));
        remote.delete_post(&post.id, &admin).await.unwrap();
        assert!(remote.posts().is_empty());
    }

    #[tokio::test]
    async fn likes_are_idempotent() {
        let remote = InMemoryRemote::new();
        let (alice, credential) = remote.register("alice", Role::User);
        let post = remote.seed_post(&alice, "Rex");

        remote.like_post(&post.id, &credential).await.unwrap();
        let liked = remote.like_post(&post.id, &credential).await.unwrap();
        assert_eq!(liked.likes(), 1);

        let unliked = remote.unlike_post(&post.id, &credential).await.unwrap();
        assert_eq!(unliked.likes(), 0);
    }

    #[tokio::test]
    async fn injected_failures_fire_once() {
        let remote = InMemoryRemote::new();
        remote.fail_next(RemoteOperation::FetchPosts, "connection reset");

        assert!(matches!(
            remote.fetch_posts().await,
            Err(RemoteError::Transport(message)) if message == "connection reset"
        ));
        assert!(remote.fetch_posts().await.is_ok());
        assert_eq!(remote.calls(RemoteOperation::FetchPosts), 2);
    }

    #[tokio::test]
    async fn comments_count_towards_their_post() {
        let remote = InMemoryRemote::new();
        let (alice, credential) = remote.register("alice", Role::User);
        let post = remote.seed_post(&alice, "Rex");
        let other = remote.seed_post(&alice, "Tom");

        let body = CreateComment {
            text: CommentText::new("hi".to_owned()).unwrap(),
        };
        remote
            .create_comment(&post.id, &body, &credential)
            .await
            .unwrap();
        remote.seed_comment(&other.id, &alice, "elsewhere");

        assert_eq!(remote.fetch_comments_for_post(&post.id).await.unwrap().len(), 1);
        assert_eq!(remote.post(&post.id).unwrap().comment_count, 1);
    }
}

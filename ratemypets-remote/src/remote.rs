use async_trait::async_trait;
use ratemypets_common::model::{
    Id, ModelValidationError,
    auth::Credential,
    comment::{Comment, CreateComment},
    post::{Post, PostData, PostMarker},
};
use std::sync::Arc;
use thiserror::Error;

pub type Result<T, E = RemoteError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("The remote rejected the credential")]
    Unauthenticated,
    #[error("The remote refused the action")]
    Forbidden,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("The remote sent invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("An object sent by the remote was invalid: {0}")]
    InvalidData(#[from] ModelValidationError),
}

impl RemoteError {
    /// Maps a non-success HTTP status and its body message onto the error taxonomy.
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            401 => RemoteError::Unauthenticated,
            403 => RemoteError::Forbidden,
            404 => RemoteError::NotFound(message.into()),
            _ => RemoteError::Transport(format!("{status}: {}", message.into())),
        }
    }
}

/// The remote source of truth for posts and comments.
///
/// Implementations own the transport. Every method either returns the authoritative object as
/// the remote now holds it, or an error; nothing is applied locally by the caller on failure.
#[async_trait]
pub trait FeedRemote: Send + Sync {
    async fn fetch_posts(&self) -> Result<Vec<Post>>;

    async fn create_post(&self, data: &PostData, credential: &Credential) -> Result<Post>;

    async fn update_post(
        &self,
        post_id: &Id<PostMarker>,
        data: &PostData,
        credential: &Credential,
    ) -> Result<Post>;

    async fn delete_post(&self, post_id: &Id<PostMarker>, credential: &Credential) -> Result<()>;

    async fn like_post(&self, post_id: &Id<PostMarker>, credential: &Credential) -> Result<Post>;

    async fn unlike_post(
        &self,
        post_id: &Id<PostMarker>,
        credential: &Credential,
    ) -> Result<Post>;

    async fn fetch_comments_for_post(&self, post_id: &Id<PostMarker>) -> Result<Vec<Comment>>;

    async fn create_comment(
        &self,
        post_id: &Id<PostMarker>,
        comment: &CreateComment,
        credential: &Credential,
    ) -> Result<Comment>;
}

#[async_trait]
impl<R: FeedRemote + ?Sized> FeedRemote for Arc<R> {
    async fn fetch_posts(&self) -> Result<Vec<Post>> {
        (**self).fetch_posts().await
    }

    async fn create_post(&self, data: &PostData, credential: &Credential) -> Result<Post> {
        (**self).create_post(data, credential).await
    }

    async fn update_post(
        &self,
        post_id: &Id<PostMarker>,
        data: &PostData,
        credential: &Credential,
    ) -> Result<Post> {
        (**self).update_post(post_id, data, credential).await
    }

    async fn delete_post(&self, post_id: &Id<PostMarker>, credential: &Credential) -> Result<()> {
        (**self).delete_post(post_id, credential).await
    }

    async fn like_post(&self, post_id: &Id<PostMarker>, credential: &Credential) -> Result<Post> {
        (**self).like_post(post_id, credential).await
    }

    async fn unlike_post(
        &self,
        post_id: &Id<PostMarker>,
        credential: &Credential,
    ) -> Result<Post> {
        (**self).unlike_post(post_id, credential).await
    }

    async fn fetch_comments_for_post(&self, post_id: &Id<PostMarker>) -> Result<Vec<Comment>> {
        (**self).fetch_comments_for_post(post_id).await
    }

    async fn create_comment(
        &self,
        post_id: &Id<PostMarker>,
        comment: &CreateComment,
        credential: &Credential,
    ) -> Result<Comment> {
        (**self).create_comment(post_id, comment, credential).await
    }
}

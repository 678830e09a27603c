use crate::session::SessionFileError;
use ratemypets_common::model::{
    Id,
    auth::IdentityDecodeError,
    comment::EmptyCommentTextError,
    post::{PostMarker, PostValidationError},
};
use ratemypets_remote::remote::RemoteError;
use thiserror::Error;

pub type Result<T, E = FeedError> = std::result::Result<T, E>;

/// Input rejected before anything was sent to the remote.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Post(#[from] PostValidationError),
    #[error(transparent)]
    Comment(#[from] EmptyCommentTextError),
}

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub enum ErrorKind {
    Validation,
    Unauthenticated,
    Forbidden,
    NotFound,
    Remote,
    Session,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("You need to sign in first")]
    Unauthenticated,
    #[error("You are not allowed to change this post")]
    Forbidden,
    #[error("Post with id {0} is not in the feed")]
    PostNotFound(Id<PostMarker>),
    #[error(transparent)]
    Remote(RemoteError),
    #[error("The credential does not carry a usable identity: {0}")]
    InvalidToken(#[from] IdentityDecodeError),
    #[error(transparent)]
    SessionFile(#[from] SessionFileError),
}

impl FeedError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            FeedError::Validation(_) => ErrorKind::Validation,
            FeedError::Unauthenticated | FeedError::InvalidToken(_) => ErrorKind::Unauthenticated,
            FeedError::Forbidden => ErrorKind::Forbidden,
            FeedError::PostNotFound(_) => ErrorKind::NotFound,
            FeedError::Remote(_) => ErrorKind::Remote,
            FeedError::SessionFile(_) => ErrorKind::Session,
        }
    }
}

impl From<RemoteError> for FeedError {
    fn from(value: RemoteError) -> Self {
        match value {
            RemoteError::Unauthenticated => FeedError::Unauthenticated,
            RemoteError::Forbidden => FeedError::Forbidden,
            other => FeedError::Remote(other),
        }
    }
}

impl From<PostValidationError> for FeedError {
    fn from(value: PostValidationError) -> Self {
        FeedError::Validation(value.into())
    }
}

impl From<EmptyCommentTextError> for FeedError {
    fn from(value: EmptyCommentTextError) -> Self {
        FeedError::Validation(value.into())
    }
}

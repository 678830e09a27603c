use crate::model::{Id, post::PostMarker, user::User};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use thiserror::Error;
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommentMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Comment {
    pub id: Id<CommentMarker>,
    pub post_id: Id<PostMarker>,
    pub author: User,
    pub text: CommentText,
    pub created_at: UtcDateTime,
}

/// Comment body, non-empty after trimming.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct CommentText(String);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Comment text must not be empty")]
pub struct EmptyCommentTextError;

impl CommentText {
    pub fn new(text: String) -> Result<Self, EmptyCommentTextError> {
        if text.trim().is_empty() {
            Err(EmptyCommentTextError)
        } else {
            Ok(Self(text))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl Display for CommentText {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct CreateComment {
    pub text: CommentText,
}

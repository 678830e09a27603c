pub mod auth;
pub mod comment;
pub mod post;
pub mod user;

use crate::model::{
    comment::EmptyCommentTextError,
    post::UnknownCategoryError,
    user::InvalidUsernameError,
};
use derive_where::derive_where;
use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{Error, Unexpected},
};
use std::{fmt::Display, marker::PhantomData};
use thiserror::Error;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum ModelValidationError {
    #[error(transparent)]
    Username(#[from] InvalidUsernameError),
    #[error(transparent)]
    Category(#[from] UnknownCategoryError),
    #[error(transparent)]
    CommentText(#[from] EmptyCommentTextError),
    #[error("An id was empty")]
    EmptyId,
    #[error("A comment did not name the post it belongs to")]
    OrphanComment,
}

/// Opaque server-assigned identifier, typed by the kind of object it names.
#[derive_where(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash)]
pub struct Id<Marker>(String, PhantomData<Marker>);

impl<Marker> Id<Marker> {
    pub fn new(id: impl Into<String>) -> Result<Self, ModelValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ModelValidationError::EmptyId);
        }

        Ok(Self(id, PhantomData))
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<Marker> Display for Id<Marker> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<Marker> TryFrom<String> for Id<Marker> {
    type Error = ModelValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<Marker> TryFrom<&str> for Id<Marker> {
    type Error = ModelValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<Marker> From<Id<Marker>> for String {
    fn from(value: Id<Marker>) -> Self {
        value.0
    }
}

impl<Marker> Serialize for Id<Marker> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de, Marker> Deserialize<'de> for Id<Marker> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        if inner.trim().is_empty() {
            return Err(Error::invalid_value(Unexpected::Str(&inner), &"Id"));
        }

        Ok(Self(inner, PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{Id, ModelValidationError, post::PostMarker, user::UserMarker};

    #[test]
    fn empty_ids_are_rejected() {
        assert_eq!(
            Id::<PostMarker>::new(""),
            Err(ModelValidationError::EmptyId)
        );
        assert_eq!(
            Id::<UserMarker>::new("   "),
            Err(ModelValidationError::EmptyId)
        );
        assert_eq!(
            Id::<UserMarker>::new("66a1f0c2e4b0").unwrap().get(),
            "66a1f0c2e4b0"
        );
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = Id::<PostMarker>::new("abc123").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123\"");

        let parsed: Id<PostMarker> = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(parsed, id);
    }
}

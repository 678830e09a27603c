//! Records matching the JSON the feed server sends, and their conversion into the model.

use crate::remote::Result;
use ratemypets_common::model::{
    Id, ModelValidationError,
    comment::{Comment, CommentText},
    post::Post,
    user::{User, Username},
};
use serde::{Deserialize, de::IgnoredAny};
use std::collections::BTreeSet;
use time::OffsetDateTime;
use tracing::warn;

/// Shown for authors the server did not expand into a full user object, or sent without a name.
pub const UNKNOWN_AUTHOR: &str = "Anonymous";

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
#[serde(untagged)]
pub enum AuthorRecord {
    Embedded(UserRecord),
    Bare(String),
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub author: AuthorRecord,
    pub pet_name: String,
    pub category: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub likes: Option<usize>,
    #[serde(default)]
    pub liked_by: Vec<String>,
    #[serde(default)]
    pub comments: Vec<IgnoredAny>,
    #[serde(default)]
    pub comment_count: Option<usize>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, alias = "post")]
    pub post_id: Option<String>,
    pub author: AuthorRecord,
    pub text: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl TryFrom<AuthorRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: AuthorRecord) -> Result<Self, Self::Error> {
        let (id, username) = match value {
            AuthorRecord::Embedded(UserRecord { id, username }) => (id, username),
            AuthorRecord::Bare(id) => (id, None),
        };

        let username = username
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_owned());

        Ok(Self {
            id: Id::new(id)?,
            username: Username::new(username)?,
        })
    }
}

impl TryFrom<PostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        let liked_by = value
            .liked_by
            .into_iter()
            .map(Id::new)
            .collect::<Result<BTreeSet<_>, _>>()?;

        if let Some(likes) = value.likes
            && likes != liked_by.len()
        {
            warn!(
                post = %value.id,
                likes,
                liked_by = liked_by.len(),
                "Like count disagrees with likedBy, using likedBy"
            );
        }

        Ok(Self {
            id: Id::new(value.id)?,
            author: value.author.try_into()?,
            pet_name: value.pet_name,
            category: value.category.parse()?,
            caption: value.caption,
            image_url: value.image_url,
            liked_by,
            comment_count: value.comment_count.unwrap_or(value.comments.len()),
            created_at: value.created_at.to_utc(),
        })
    }
}

impl TryFrom<CommentRecord> for Comment {
    type Error = ModelValidationError;

    fn try_from(value: CommentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::new(value.id)?,
            post_id: Id::new(value.post_id.ok_or(ModelValidationError::OrphanComment)?)?,
            author: value.author.try_into()?,
            text: CommentText::new(value.text)?,
            created_at: value.created_at.to_utc(),
        })
    }
}

pub fn decode_posts(json: &[u8]) -> Result<Vec<Post>> {
    let records: Vec<PostRecord> = serde_json::from_slice(json)?;
    let posts = records
        .into_iter()
        .map(Post::try_from)
        .collect::<Result<_, _>>()?;
    Ok(posts)
}

pub fn decode_post(json: &[u8]) -> Result<Post> {
    let record: PostRecord = serde_json::from_slice(json)?;
    Ok(record.try_into()?)
}

/// Decodes a comment list, dropping comments that do not name their post.
pub fn decode_comments(json: &[u8]) -> Result<Vec<Comment>> {
    let records: Vec<CommentRecord> = serde_json::from_slice(json)?;
    let mut comments = Vec::with_capacity(records.len());

    for record in records {
        if record.post_id.is_none() {
            warn!(comment = %record.id, "Dropping comment without a post");
            continue;
        }
        comments.push(record.try_into()?);
    }

    Ok(comments)
}

pub fn decode_comment(json: &[u8]) -> Result<Comment> {
    let record: CommentRecord = serde_json::from_slice(json)?;
    Ok(record.try_into()?)
}

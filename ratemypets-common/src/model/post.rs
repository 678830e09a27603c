use crate::model::{
    Id,
    user::{User, UserMarker},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fmt::{Display, Formatter},
    str::FromStr,
};
use thiserror::Error;
use time::UtcDateTime;

/// Suffixes accepted for post images. Matching is case-sensitive.
pub const IMAGE_EXTENSIONS: [&str; 5] = [".jpeg", ".jpg", ".gif", ".png", ".webp"];

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Deserialize, Serialize)]
pub enum Category {
    Dog,
    Cat,
    Bird,
    Fish,
    Rabbit,
    Hamster,
    #[serde(rename = "Guinea Pig")]
    GuineaPig,
    Turtle,
    Snake,
    Other,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Unknown pet category: {0:?}")]
pub struct UnknownCategoryError(String);

impl Category {
    pub const ALL: [Category; 10] = [
        Category::Dog,
        Category::Cat,
        Category::Bird,
        Category::Fish,
        Category::Rabbit,
        Category::Hamster,
        Category::GuineaPig,
        Category::Turtle,
        Category::Snake,
        Category::Other,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Category::Dog => "Dog",
            Category::Cat => "Cat",
            Category::Bird => "Bird",
            Category::Fish => "Fish",
            Category::Rabbit => "Rabbit",
            Category::Hamster => "Hamster",
            Category::GuineaPig => "Guinea Pig",
            Category::Turtle => "Turtle",
            Category::Snake => "Snake",
            Category::Other => "Other",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Category {
    type Err = UnknownCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.name() == s)
            .ok_or_else(|| UnknownCategoryError(s.to_owned()))
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize)]
#[serde(transparent)]
pub struct ImageUrl(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Invalid image URL {0:?}, expected one of .jpg, .jpeg, .png, .gif, .webp")]
pub struct InvalidImageUrlError(String);

impl ImageUrl {
    pub fn new(url: String) -> Result<Self, InvalidImageUrlError> {
        if IMAGE_EXTENSIONS.iter().any(|ext| url.ends_with(ext)) {
            Ok(Self(url))
        } else {
            Err(InvalidImageUrlError(url))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

/// Validation failures for post input, reported in the order the rules are checked.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum PostValidationError {
    #[error("Pet name is required")]
    MissingPetName,
    #[error("Category must be selected")]
    MissingCategory,
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategoryError),
    #[error("Image URL is required")]
    MissingImageUrl,
    #[error(transparent)]
    InvalidImageUrl(#[from] InvalidImageUrlError),
}

/// Unvalidated post input as entered in the post form.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct PostDraft {
    pub pet_name: String,
    pub category: String,
    pub caption: String,
    pub image_url: String,
}

/// Post input that passed validation. Only obtainable through [`PostDraft::validate`].
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostData {
    pet_name: String,
    category: Category,
    caption: String,
    image_url: ImageUrl,
}

impl PostDraft {
    pub fn validate(&self) -> Result<PostData, PostValidationError> {
        let pet_name = self.pet_name.trim();
        if pet_name.is_empty() {
            return Err(PostValidationError::MissingPetName);
        }

        if self.category.is_empty() {
            return Err(PostValidationError::MissingCategory);
        }
        let category = self.category.parse()?;

        if self.image_url.trim().is_empty() {
            return Err(PostValidationError::MissingImageUrl);
        }
        let image_url = ImageUrl::new(self.image_url.clone())?;

        Ok(PostData {
            pet_name: pet_name.to_owned(),
            category,
            caption: self.caption.clone(),
            image_url,
        })
    }
}

impl PostData {
    #[must_use]
    pub fn pet_name(&self) -> &str {
        &self.pet_name
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn caption(&self) -> &str {
        &self.caption
    }

    #[must_use]
    pub fn image_url(&self) -> &ImageUrl {
        &self.image_url
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub author: User,
    pub pet_name: String,
    pub category: Category,
    pub caption: String,
    pub image_url: String,
    pub liked_by: BTreeSet<Id<UserMarker>>,
    pub comment_count: usize,
    pub created_at: UtcDateTime,
}

impl Post {
    /// Like count. Derived from `liked_by` so the two can never disagree.
    #[must_use]
    pub fn likes(&self) -> usize {
        self.liked_by.len()
    }

    #[must_use]
    pub fn is_liked_by(&self, user: &Id<UserMarker>) -> bool {
        self.liked_by.contains(user)
    }

    /// Takes over the mutable fields of `updated`, keeping `id`, `author` and `created_at`.
    pub fn apply_update(&mut self, updated: Post) {
        let Post {
            pet_name,
            category,
            caption,
            image_url,
            liked_by,
            comment_count,
            ..
        } = updated;

        self.pet_name = pet_name;
        self.category = category;
        self.caption = caption;
        self.image_url = image_url;
        self.liked_by = liked_by;
        self.comment_count = comment_count;
    }
}

impl From<&Post> for PostDraft {
    fn from(post: &Post) -> Self {
        Self {
            pet_name: post.pet_name.clone(),
            category: post.category.name().to_owned(),
            caption: post.caption.clone(),
            image_url: post.image_url.clone(),
        }
    }
}

//! Client-side state for the RateMyPets feed.
//!
//! [`Feed`] holds the session, the posts, the current page and the comment threads, and
//! reconciles user actions against a [`ratemypets_remote::remote::FeedRemote`]. Nothing is
//! applied before the remote confirms it.

pub mod comments;
pub mod config;
pub mod error;
pub mod feed;
pub mod pagination;
pub mod posts;
pub mod session;

pub use error::{FeedError, Result};
pub use feed::{EditorState, Feed, FeedView};

#![allow(dead_code)]

use async_trait::async_trait;
use ratemypets_common::model::{
    Id,
    auth::Credential,
    comment::{Comment, CreateComment},
    post::{Post, PostData, PostDraft, PostMarker},
};
use ratemypets_feed::{Feed, config::FeedConfig};
use ratemypets_remote::{
    memory::InMemoryRemote,
    remote::{FeedRemote, Result},
};
use std::{
    collections::VecDeque,
    num::NonZeroUsize,
    sync::{Arc, Mutex},
};
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn feed<R: FeedRemote>(remote: R) -> Feed<R> {
    init_tracing();
    Feed::new(remote, &FeedConfig::default())
}

pub fn feed_with_page_size<R: FeedRemote>(remote: R, page_size: usize) -> Feed<R> {
    init_tracing();
    let config = FeedConfig {
        page_size: NonZeroUsize::new(page_size).expect("page size must be positive"),
        ..FeedConfig::default()
    };
    Feed::new(remote, &config)
}

pub fn draft(pet_name: &str) -> PostDraft {
    PostDraft {
        pet_name: pet_name.to_owned(),
        category: "Dog".to_owned(),
        caption: "Very good".to_owned(),
        image_url: format!("https://cdn.example.com/{pet_name}.png"),
    }
}

/// Delegates to an [`InMemoryRemote`], but holds post fetches back until their gate is opened.
#[derive(Debug, Default)]
pub struct GatedRemote {
    pub inner: InMemoryRemote,
    gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
}

impl GatedRemote {
    /// The next `fetch_posts` reads the posts immediately but only returns once the sender fires.
    pub fn gate(&self) -> oneshot::Sender<()> {
        let (sender, receiver) = oneshot::channel();
        self.gates.lock().expect("gates lock").push_back(receiver);
        sender
    }
}

#[async_trait]
impl FeedRemote for GatedRemote {
    async fn fetch_posts(&self) -> Result<Vec<Post>> {
        let posts = self.inner.fetch_posts().await;
        let gate = self.gates.lock().expect("gates lock").pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        posts
    }

    async fn create_post(&self, data: &PostData, credential: &Credential) -> Result<Post> {
        self.inner.create_post(data, credential).await
    }

    async fn update_post(
        &self,
        post_id: &Id<PostMarker>,
        data: &PostData,
        credential: &Credential,
    ) -> Result<Post> {
        self.inner.update_post(post_id, data, credential).await
    }

    async fn delete_post(&self, post_id: &Id<PostMarker>, credential: &Credential) -> Result<()> {
        self.inner.delete_post(post_id, credential).await
    }

    async fn like_post(&self, post_id: &Id<PostMarker>, credential: &Credential) -> Result<Post> {
        self.inner.like_post(post_id, credential).await
    }

    async fn unlike_post(
        &self,
        post_id: &Id<PostMarker>,
        credential: &Credential,
    ) -> Result<Post> {
        self.inner.unlike_post(post_id, credential).await
    }

    async fn fetch_comments_for_post(&self, post_id: &Id<PostMarker>) -> Result<Vec<Comment>> {
        self.inner.fetch_comments_for_post(post_id).await
    }

    async fn create_comment(
        &self,
        post_id: &Id<PostMarker>,
        comment: &CreateComment,
        credential: &Credential,
    ) -> Result<Comment> {
        self.inner.create_comment(post_id, comment, credential).await
    }
}

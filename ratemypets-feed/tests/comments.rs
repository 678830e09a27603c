mod common;

use common::feed;
use ratemypets_common::model::user::Role;
use ratemypets_feed::{
    FeedError,
    comments::CommentLoadState,
    error::{ErrorKind, ValidationError},
};
use ratemypets_remote::memory::{InMemoryRemote, RemoteOperation};
use std::sync::Arc;

#[tokio::test]
async fn submitting_refetches_the_thread() {
    let remote = Arc::new(InMemoryRemote::new());
    let (alice, alice_credential) = remote.register("alice", Role::User);
    let post = remote.seed_post(&alice, "Rex");

    let feed = feed(Arc::clone(&remote));
    feed.sign_in(alice, alice_credential).unwrap();
    feed.load().await.unwrap();

    let comment = feed.submit_comment(&post.id, "  What a good boy  ").await.unwrap();

    let thread = feed.comment_thread(&post.id).unwrap();
    assert_eq!(thread.items(), [comment]);
    assert_eq!(thread.count(), Some(1));
    assert_eq!(thread.load_state(), &CommentLoadState::Loaded);
    assert_eq!(feed.post(&post.id).unwrap().comment_count, 1);
    assert_eq!(remote.calls(RemoteOperation::FetchComments), 1);
}

#[tokio::test]
async fn comment_count_comes_from_the_remote() {
    let remote = Arc::new(InMemoryRemote::new());
    let (alice, alice_credential) = remote.register("alice", Role::User);
    let (bob, _) = remote.register("bob", Role::User);
    let post = remote.seed_post(&alice, "Rex");

    let feed = feed(Arc::clone(&remote));
    feed.sign_in(alice, alice_credential).unwrap();
    feed.load().await.unwrap();
    assert_eq!(feed.post(&post.id).unwrap().comment_count, 0);

    remote.seed_comment(&post.id, &bob, "First!");
    feed.submit_comment(&post.id, "Second").await.unwrap();

    let thread = feed.comment_thread(&post.id).unwrap();
    assert_eq!(thread.count(), Some(2));
    assert_eq!(thread.items()[0].text.get(), "First!");
    assert_eq!(feed.post(&post.id).unwrap().comment_count, 2);
}

#[tokio::test]
async fn blank_comments_are_rejected_locally() {
    let remote = Arc::new(InMemoryRemote::new());
    let (alice, alice_credential) = remote.register("alice", Role::User);
    let post = remote.seed_post(&alice, "Rex");

    let feed = feed(Arc::clone(&remote));

    assert!(matches!(
        feed.submit_comment(&post.id, "   ").await,
        Err(FeedError::Unauthenticated)
    ));

    feed.sign_in(alice, alice_credential).unwrap();
    let err = feed.submit_comment(&post.id, " \n ").await.unwrap_err();

    assert!(matches!(err, FeedError::Validation(ValidationError::Comment(_))));
    assert_eq!(remote.total_calls(), 0);
}

#[tokio::test]
async fn failed_fetch_keeps_the_last_comments() {
    let remote = Arc::new(InMemoryRemote::new());
    let (alice, _) = remote.register("alice", Role::User);
    let post = remote.seed_post(&alice, "Rex");
    remote.seed_comment(&post.id, &alice, "Hello");

    let feed = feed(Arc::clone(&remote));
    assert!(feed.toggle_comments(&post.id));
    assert_eq!(feed.fetch_comments(&post.id).await.unwrap(), 1);

    remote.fail_next(RemoteOperation::FetchComments, "server exploded");
    let err = feed.fetch_comments(&post.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Remote);

    let thread = feed.comment_thread(&post.id).unwrap();
    assert!(matches!(thread.load_state(), CommentLoadState::Failed(_)));
    assert_eq!(thread.items().len(), 1);
    assert!(thread.is_visible());
    assert!(!feed.toggle_comments(&post.id));
}

#[tokio::test]
async fn threads_are_kept_per_post() {
    let remote = Arc::new(InMemoryRemote::new());
    let (alice, _) = remote.register("alice", Role::User);
    let rex = remote.seed_post(&alice, "Rex");
    let tom = remote.seed_post(&alice, "Tom");
    remote.seed_comment(&rex.id, &alice, "Woof");
    remote.seed_comment(&tom.id, &alice, "Meow");
    remote.seed_comment(&tom.id, &alice, "Purr");

    let feed = feed(Arc::clone(&remote));
    let (rex_count, tom_count) = tokio::join!(
        feed.fetch_comments(&rex.id),
        feed.fetch_comments(&tom.id)
    );

    assert_eq!(rex_count.unwrap(), 1);
    assert_eq!(tom_count.unwrap(), 2);
    for (post, count) in [(&rex, 1), (&tom, 2)] {
        let thread = feed.comment_thread(&post.id).unwrap();
        assert_eq!(thread.items().len(), count);
        assert!(thread.items().iter().all(|comment| comment.post_id == post.id));
    }
}

#[tokio::test]
async fn removed_posts_lose_their_thread() {
    let remote = Arc::new(InMemoryRemote::new());
    let (alice, alice_credential) = remote.register("alice", Role::User);
    let post = remote.seed_post(&alice, "Rex");
    remote.seed_comment(&post.id, &alice, "Hello");

    let feed = feed(Arc::clone(&remote));
    feed.sign_in(alice, alice_credential).unwrap();
    feed.load().await.unwrap();
    feed.fetch_comments(&post.id).await.unwrap();

    feed.remove_post(&post.id).await.unwrap();

    assert!(feed.comment_thread(&post.id).is_none());
}

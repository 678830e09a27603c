use crate::{
    comments::{CommentCache, CommentThread},
    config::FeedConfig,
    error::{FeedError, Result},
    pagination::{self, PageLabel, PageState},
    posts::{LoadStatus, PostStore},
    session::SessionFile,
};
use ratemypets_common::model::{
    Id,
    auth::{Credential, Identity, Session, can_mutate},
    comment::{Comment, CommentText, CreateComment},
    post::{Post, PostDraft, PostMarker},
};
use ratemypets_remote::remote::{FeedRemote, RemoteError};
use std::{
    fmt::{Debug, Formatter},
    sync::{Mutex, PoisonError},
};
use tracing::{debug, error, info, warn};

/// What the post form is currently doing.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub enum EditorState {
    #[default]
    Closed,
    Creating,
    Editing(Id<PostMarker>),
}

/// A consistent snapshot of what the feed shows.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FeedView {
    pub status: LoadStatus,
    pub posts: Vec<Post>,
    pub current_page: usize,
    pub total_pages: usize,
    pub labels: Vec<PageLabel>,
}

#[derive(Debug)]
struct FeedState {
    session: Session,
    posts: PostStore,
    page: PageState,
    comments: CommentCache,
    editor: EditorState,
}

impl FeedState {
    fn credential(&self) -> Result<Credential> {
        self.session
            .credential()
            .cloned()
            .ok_or(FeedError::Unauthenticated)
    }

    fn post(&self, post_id: &Id<PostMarker>) -> Result<&Post> {
        self.posts
            .get(post_id)
            .ok_or_else(|| FeedError::PostNotFound(post_id.clone()))
    }

    /// The check shared by edit and delete: signed in first, then allowed to touch the post.
    fn authorize_mutation(&self, post_id: &Id<PostMarker>) -> Result<Credential> {
        let Session::Authenticated {
            identity,
            credential,
        } = &self.session
        else {
            return Err(FeedError::Unauthenticated);
        };

        if !can_mutate(identity, self.post(post_id)?) {
            return Err(FeedError::Forbidden);
        }

        Ok(credential.clone())
    }

    fn close_editor_for(&mut self, post_id: &Id<PostMarker>) {
        if matches!(&self.editor, EditorState::Editing(editing) if editing == post_id) {
            self.editor = EditorState::Closed;
        }
    }
}

fn remote_failure(action: &'static str, err: RemoteError) -> FeedError {
    let err = FeedError::from(err);
    error!(action, error = %err, "Remote call failed");
    err
}

/// The feed client: owns all client-side state and is the only way to change it.
///
/// Every operation checks the session and input first, then calls the remote, and only applies
/// the outcome once the remote confirmed it. State lives behind a single lock that is never held
/// across a remote call, so a `Feed` can be shared between tasks.
pub struct Feed<R> {
    remote: R,
    state: Mutex<FeedState>,
    session_file: Option<SessionFile>,
}

impl<R> Debug for Feed<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Feed")
            .field("state", &self.state)
            .field("session_file", &self.session_file)
            .finish_non_exhaustive()
    }
}

impl<R: FeedRemote> Feed<R> {
    pub fn new(remote: R, config: &FeedConfig) -> Self {
        let state = FeedState {
            session: Session::Anonymous,
            posts: PostStore::default(),
            page: PageState::new(config.page_size),
            comments: CommentCache::default(),
            editor: EditorState::Closed,
        };

        Self {
            remote,
            state: Mutex::new(state),
            session_file: config.session_file.clone().map(SessionFile::new),
        }
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut FeedState) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    // Session

    /// Picks up the session stored by a previous run, if a session file is configured.
    ///
    /// Returns whether someone is signed in afterwards.
    pub fn restore_session(&self) -> Result<bool> {
        let Some(file) = &self.session_file else {
            return Ok(false);
        };

        let session = file.load()?;
        if let Some(identity) = session.identity() {
            info!(user = %identity.user_id, "Restored session");
        }

        let authenticated = session.is_authenticated();
        self.with_state(|state| state.session = session);
        Ok(authenticated)
    }

    pub fn sign_in(&self, identity: Identity, credential: Credential) -> Result<()> {
        info!(user = %identity.user_id, role = ?identity.role, "Signing in");

        let session = Session::Authenticated {
            identity,
            credential,
        };
        if let Some(file) = &self.session_file {
            file.save(&session)?;
        }

        self.with_state(|state| state.session = session);
        Ok(())
    }

    /// Signs in with a bearer token, reading the identity from its claims.
    pub fn sign_in_with_token(&self, token: String) -> Result<Identity> {
        let credential = Credential::new(token).map_err(|_| FeedError::Unauthenticated)?;
        let identity = Identity::from_token(&credential)?;

        self.sign_in(identity.clone(), credential)?;
        Ok(identity)
    }

    pub fn sign_out(&self) -> Result<()> {
        if let Some(file) = &self.session_file {
            file.clear()?;
        }

        self.with_state(|state| {
            state.session = Session::Anonymous;
            state.editor = EditorState::Closed;
        });
        info!("Signed out");
        Ok(())
    }

    #[must_use]
    pub fn session(&self) -> Session {
        self.with_state(|state| state.session.clone())
    }

    // Posts

    /// Fetches all posts. When loads overlap, only the most recently issued one is applied.
    pub async fn load(&self) -> Result<()> {
        let ticket = self.with_state(|state| state.posts.begin_load());
        debug!(?ticket, "Loading posts");

        let result = self.remote.fetch_posts().await;

        self.with_state(|state| match result {
            Ok(posts) => {
                if state.posts.finish_load(ticket, Ok(posts)) {
                    let count = state.posts.len();
                    let page = state.page.clamp(count);
                    debug!(?ticket, count, page, "Loaded posts");
                } else {
                    warn!(?ticket, "Discarded result of superseded load");
                }
                Ok(())
            }
            Err(err) => {
                let err = remote_failure("load posts", err);
                state.posts.finish_load(ticket, Err(err.to_string()));
                Err(err)
            }
        })
    }

    pub async fn like(&self, post_id: &Id<PostMarker>) -> Result<Post> {
        self.send_like(post_id, true).await
    }

    pub async fn unlike(&self, post_id: &Id<PostMarker>) -> Result<Post> {
        self.send_like(post_id, false).await
    }

    /// Unlikes the post if the signed-in user already likes it, likes it otherwise.
    pub async fn toggle_like(&self, post_id: &Id<PostMarker>) -> Result<Post> {
        let liked = self.with_state(|state| {
            let identity = state
                .session
                .identity()
                .ok_or(FeedError::Unauthenticated)?;
            Ok::<_, FeedError>(state.post(post_id)?.is_liked_by(&identity.user_id))
        })?;

        self.send_like(post_id, !liked).await
    }

    async fn send_like(&self, post_id: &Id<PostMarker>, like: bool) -> Result<Post> {
        let credential = self.with_state(|state| {
            let credential = state.credential()?;
            state.post(post_id)?;
            Ok::<_, FeedError>(credential)
        })?;

        let (action, result) = if like {
            ("like", self.remote.like_post(post_id, &credential).await)
        } else {
            ("unlike", self.remote.unlike_post(post_id, &credential).await)
        };
        let updated = result.map_err(|err| remote_failure(action, err))?;

        self.with_state(|state| {
            if state.posts.apply_likes(&updated) {
                debug!(post = %post_id, action, likes = updated.likes(), "Applied like");
            } else {
                debug!(post = %post_id, action, "Post left the feed before the like settled");
            }
        });
        Ok(updated)
    }

    pub async fn create_post(&self, draft: &PostDraft) -> Result<Post> {
        let credential = self.with_state(|state| state.credential())?;
        let data = draft.validate()?;

        let post = self
            .remote
            .create_post(&data, &credential)
            .await
            .map_err(|err| remote_failure("create post", err))?;

        self.with_state(|state| {
            state.posts.insert_newest(post.clone());
            state.page.clamp(state.posts.len());
            if state.editor == EditorState::Creating {
                state.editor = EditorState::Closed;
            }
        });
        info!(post = %post.id, "Created post");
        Ok(post)
    }

    pub async fn update_post(&self, post_id: &Id<PostMarker>, draft: &PostDraft) -> Result<Post> {
        let credential = self.with_state(|state| state.authorize_mutation(post_id))?;
        let data = draft.validate()?;

        let updated = self
            .remote
            .update_post(post_id, &data, &credential)
            .await
            .map_err(|err| remote_failure("update post", err))?;

        let stored = self.with_state(|state| {
            let stored = state.posts.apply_update(updated.clone()).cloned();
            state.close_editor_for(post_id);
            stored
        });
        info!(post = %post_id, "Updated post");
        Ok(stored.unwrap_or(updated))
    }

    /// Deletes a post. The current page is pulled back in the same step if it ran empty.
    pub async fn remove_post(&self, post_id: &Id<PostMarker>) -> Result<()> {
        let credential = self.with_state(|state| state.authorize_mutation(post_id))?;

        self.remote
            .delete_post(post_id, &credential)
            .await
            .map_err(|err| remote_failure("delete post", err))?;

        self.with_state(|state| {
            state.posts.remove(post_id);
            state.comments.forget(post_id);
            state.close_editor_for(post_id);
            let page = state.page.clamp(state.posts.len());
            info!(post = %post_id, page, "Removed post");
        });
        Ok(())
    }

    #[must_use]
    pub fn post(&self, post_id: &Id<PostMarker>) -> Option<Post> {
        self.with_state(|state| state.posts.get(post_id).cloned())
    }

    #[must_use]
    pub fn posts(&self) -> Vec<Post> {
        self.with_state(|state| state.posts.posts().to_vec())
    }

    #[must_use]
    pub fn status(&self) -> LoadStatus {
        self.with_state(|state| state.posts.status().clone())
    }

    // Pages

    pub fn set_page(&self, page: usize) -> usize {
        self.with_state(|state| {
            let len = state.posts.len();
            state.page.set_page(page, len)
        })
    }

    pub fn next_page(&self) -> usize {
        self.with_state(|state| {
            let len = state.posts.len();
            let next = state.page.current_page().saturating_add(1);
            state.page.set_page(next, len)
        })
    }

    pub fn previous_page(&self) -> usize {
        self.with_state(|state| {
            let len = state.posts.len();
            let previous = state.page.current_page().saturating_sub(1);
            state.page.set_page(previous, len)
        })
    }

    #[must_use]
    pub fn page_state(&self) -> PageState {
        self.with_state(|state| state.page)
    }

    #[must_use]
    pub fn view(&self) -> FeedView {
        self.with_state(|state| {
            let posts = state.posts.posts();
            let current_page = state.page.current_page();
            let total_pages = state.page.total_pages(posts.len());

            FeedView {
                status: state.posts.status().clone(),
                posts: pagination::derive(posts, state.page).to_vec(),
                current_page,
                total_pages,
                labels: pagination::page_labels(current_page, total_pages),
            }
        })
    }

    // Comments

    /// Replaces the post's comment thread with the remote's list and returns the comment count.
    pub async fn fetch_comments(&self, post_id: &Id<PostMarker>) -> Result<usize> {
        let ticket = self.with_state(|state| state.comments.begin_fetch(post_id));

        let result = self.remote.fetch_comments_for_post(post_id).await;

        self.with_state(|state| match result {
            Ok(comments) => match state.comments.finish_fetch(post_id, ticket, Ok(comments)) {
                Some(count) => {
                    state.posts.set_comment_count(post_id, count);
                    debug!(post = %post_id, count, "Fetched comments");
                    Ok(count)
                }
                None => {
                    warn!(post = %post_id, ?ticket, "Discarded superseded comment fetch");
                    Ok(state
                        .comments
                        .thread(post_id)
                        .and_then(CommentThread::count)
                        .unwrap_or(0))
                }
            },
            Err(err) => {
                let err = remote_failure("fetch comments", err);
                state.comments.finish_fetch(post_id, ticket, Err(err.to_string()));
                Err(err)
            }
        })
    }

    /// Posts a comment, then refetches the thread so the list and count come from the remote.
    pub async fn submit_comment(&self, post_id: &Id<PostMarker>, text: &str) -> Result<Comment> {
        let credential = self.with_state(|state| state.credential())?;
        let body = CreateComment {
            text: CommentText::new(text.to_owned())?,
        };

        let comment = self
            .remote
            .create_comment(post_id, &body, &credential)
            .await
            .map_err(|err| remote_failure("create comment", err))?;
        debug!(post = %post_id, comment = %comment.id, "Created comment");

        self.fetch_comments(post_id).await?;
        Ok(comment)
    }

    /// Shows or hides a post's comments. Returns whether they are now shown.
    pub fn toggle_comments(&self, post_id: &Id<PostMarker>) -> bool {
        self.with_state(|state| state.comments.toggle_visibility(post_id))
    }

    #[must_use]
    pub fn comment_thread(&self, post_id: &Id<PostMarker>) -> Option<CommentThread> {
        self.with_state(|state| state.comments.thread(post_id).cloned())
    }

    // Post form

    pub fn open_composer(&self) -> Result<()> {
        self.with_state(|state| {
            state.credential()?;
            state.editor = EditorState::Creating;
            Ok(())
        })
    }

    /// Opens the post form on an existing post and returns its current values.
    pub fn begin_edit(&self, post_id: &Id<PostMarker>) -> Result<PostDraft> {
        self.with_state(|state| {
            state.authorize_mutation(post_id)?;
            let draft = PostDraft::from(state.post(post_id)?);
            state.editor = EditorState::Editing(post_id.clone());
            Ok(draft)
        })
    }

    pub fn close_editor(&self) {
        self.with_state(|state| state.editor = EditorState::Closed);
    }

    #[must_use]
    pub fn editor(&self) -> EditorState {
        self.with_state(|state| state.editor.clone())
    }
}

use uuid::Uuid;

use super::{ApiClient, Notice};
use crate::{
    error::AppError,
    models::{like::LikeToggle, post::FeedPost},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedMode {
    Public,
    Own,
}

/// Every change a feed view makes to its list.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedAction {
    /// Replaces the whole list with a fresh read.
    Loaded(Vec<FeedPost>),
    /// A read failed; the list is emptied.
    LoadFailed,
    /// The store confirmed a like toggle.
    Toggled(LikeToggle),
}

/// Display-model list keyed by post id. Mutated only through `apply`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedList {
    posts: Vec<FeedPost>,
}

impl FeedList {
    pub fn apply(&mut self, action: FeedAction) {
        match action {
            FeedAction::Loaded(posts) => self.posts = posts,
            FeedAction::LoadFailed => self.posts.clear(),
            FeedAction::Toggled(toggle) => {
                let Some(entry) = self.posts.iter_mut().find(|p| p.post.id == toggle.post_id) else {
                    return;
                };
                if toggle.changed && entry.liked_by_user != toggle.liked {
                    if toggle.liked {
                        entry.likes += 1;
                    } else {
                        entry.likes = (entry.likes - 1).max(0);
                    }
                }
                entry.liked_by_user = toggle.liked;
            }
        }
    }

    pub fn get(&self, post_id: Uuid) -> Option<&FeedPost> {
        self.posts.iter().find(|p| p.post.id == post_id)
    }

    pub fn posts(&self) -> &[FeedPost] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// A feed on screen: the list, its mode and the last notice shown.
#[derive(Debug, Clone)]
pub struct FeedView {
    mode: FeedMode,
    list: FeedList,
    notice: Option<Notice>,
}

impl FeedView {
    pub fn new(mode: FeedMode) -> Self {
        Self {
            mode,
            list: FeedList::default(),
            notice: None,
        }
    }

    pub fn mode(&self) -> FeedMode {
        self.mode
    }

    pub fn list(&self) -> &FeedList {
        &self.list
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Reads the whole feed. On failure the list is left empty and an error notice is set.
    pub async fn load(&mut self, client: &ApiClient) -> Result<(), AppError> {
        let result = match self.mode {
            FeedMode::Public => client.public_feed().await,
            FeedMode::Own => client.own_posts().await,
        };

        match result {
            Ok(posts) => {
                self.list.apply(FeedAction::Loaded(posts));
                Ok(())
            }
            Err(e) => {
                tracing::error!("Error fetching posts: {}", e);
                self.list.apply(FeedAction::LoadFailed);
                self.notice = Some(Notice::error("Could not load posts."));
                Err(e)
            }
        }
    }

    /// Likes or unlikes a post. The list changes only after the server confirmed.
    pub async fn toggle_like(&mut self, client: &ApiClient, post_id: Uuid) -> Result<LikeToggle, AppError> {
        if !client.is_signed_in() {
            self.notice = Some(Notice::error("You must sign in to like posts."));
            return Err(AppError::Unauthenticated("Sign in required".to_string()));
        }

        match client.toggle_like(post_id).await {
            Ok(toggle) => {
                self.list.apply(FeedAction::Toggled(toggle));
                Ok(toggle)
            }
            Err(e) => {
                tracing::error!(%post_id, "Error toggling like: {}", e);
                self.notice = Some(Notice::error("There was a problem updating the like."));
                Err(e)
            }
        }
    }
}

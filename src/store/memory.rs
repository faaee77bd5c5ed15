use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AccountStore, LikeStore, PostStore, ProfileStore};
use crate::{
    error::AppError,
    models::{
        like::Like,
        post::{FeedPost, FeedScope, NewPost, Post},
        user::{Identity, Session, User},
    },
};

#[derive(Default)]
struct Tables {
    identities: HashMap<Uuid, Identity>,
    sessions: HashMap<Uuid, Session>,
    users: HashMap<Uuid, User>,
    /// Insertion order breaks ties between equal timestamps.
    posts: Vec<Post>,
    likes: Vec<Like>,
}

/// In-process adapter with the same constraints as the SQL schema:
/// unique emails, unique (post, user) likes, likes and posts must reference existing rows.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_identity(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Identity, AppError> {
        let mut tables = self.tables.write().await;
        if tables.identities.values().any(|i| i.email == email) {
            return Err(AppError::Conflict(format!(
                "Email '{}' is already registered",
                email
            )));
        }

        let identity = Identity {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        tables.identities.insert(identity.id, identity.clone());
        Ok(identity)
    }

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.identities.values().find(|i| i.email == email).cloned())
    }

    async fn create_session(&self, user_id: Uuid) -> Result<Session, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.identities.contains_key(&user_id) {
            return Err(AppError::Store(format!("Identity {} does not exist", user_id)));
        }

        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            created_at: Utc::now(),
            revoked_at: None,
        };
        tables.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_session(&self, id: Uuid) -> Result<Option<Session>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.sessions.get(&id).cloned())
    }

    async fn revoke_session(&self, id: Uuid) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if let Some(session) = tables.sessions.get_mut(&id) {
            session.revoked_at.get_or_insert_with(Utc::now);
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn ensure_profile(&self, profile: &User) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&profile.id) {
            return Ok(false);
        }
        tables.users.insert(profile.id, profile.clone());
        Ok(true)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).cloned())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn insert_post(&self, post: &NewPost) -> Result<Post, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&post.user_id) {
            return Err(AppError::Store(format!(
                "Post owner {} has no profile row",
                post.user_id
            )));
        }
        if post.title.trim().is_empty() {
            return Err(AppError::Store("Post title must not be empty".to_string()));
        }

        let row = Post {
            id: Uuid::new_v4(),
            kind: post.kind,
            title: post.title.clone(),
            description: post.description.clone(),
            image_url: post.image_url.clone(),
            is_public: post.is_public,
            user_id: post.user_id,
            created_at: Utc::now(),
        };
        tables.posts.push(row.clone());
        Ok(row)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn list_feed(
        &self,
        scope: FeedScope,
        viewer: Option<Uuid>,
    ) -> Result<Vec<FeedPost>, AppError> {
        let tables = self.tables.read().await;

        let mut feed: Vec<FeedPost> = tables
            .posts
            .iter()
            .rev()
            .filter(|p| match scope {
                FeedScope::Public => p.is_public,
                FeedScope::OwnedBy(owner) => p.user_id == owner,
            })
            .map(|p| {
                let likes = tables.likes.iter().filter(|l| l.post_id == p.id);
                let mut count = 0;
                let mut liked_by_user = false;
                for like in likes {
                    count += 1;
                    liked_by_user |= Some(like.user_id) == viewer;
                }
                FeedPost {
                    post: p.clone(),
                    likes: count,
                    liked_by_user,
                    image_public_url: None,
                }
            })
            .collect();

        // Stable sort keeps newer insertions first among equal timestamps.
        feed.sort_by(|a, b| b.post.created_at.cmp(&a.post.created_at));
        Ok(feed)
    }
}

#[async_trait]
impl LikeStore for MemoryStore {
    async fn find_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Like>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .likes
            .iter()
            .find(|l| l.post_id == post_id && l.user_id == user_id)
            .cloned())
    }

    async fn insert_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Like, AppError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.iter().any(|p| p.id == post_id) {
            return Err(AppError::Store(format!("Post {} does not exist", post_id)));
        }
        if tables
            .likes
            .iter()
            .any(|l| l.post_id == post_id && l.user_id == user_id)
        {
            return Err(AppError::Conflict("Already liked".to_string()));
        }

        let like = Like {
            id: Uuid::new_v4(),
            post_id,
            user_id,
            created_at: Utc::now(),
        };
        tables.likes.push(like.clone());
        Ok(like)
    }

    async fn delete_like(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.likes.len();
        tables.likes.retain(|l| l.id != id);
        Ok(tables.likes.len() < before)
    }

    async fn count_likes(&self, post_id: Uuid) -> Result<i64, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.likes.iter().filter(|l| l.post_id == post_id).count() as i64)
    }
}

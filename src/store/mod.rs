// src/store/mod.rs

//! Relational store seams. Handlers only see `dyn Store`; the PostgreSQL
//! adapter backs production and the in-memory adapter backs local runs and tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        like::Like,
        post::{FeedPost, FeedScope, NewPost, Post},
        user::{Identity, Session, User},
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Tables owned by the auth provider.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn create_identity(&self, email: &str, password_hash: &str)
    -> Result<Identity, AppError>;

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>, AppError>;

    async fn create_session(&self, user_id: Uuid) -> Result<Session, AppError>;

    async fn find_session(&self, id: Uuid) -> Result<Option<Session>, AppError>;

    async fn revoke_session(&self, id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Inserts the profile unless a row with the same id exists.
    /// Returns whether a row was created.
    async fn ensure_profile(&self, profile: &User) -> Result<bool, AppError>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn insert_post(&self, post: &NewPost) -> Result<Post, AppError>;

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, AppError>;

    /// Posts in scope, newest first, joined with like counts and the viewer's membership.
    async fn list_feed(
        &self,
        scope: FeedScope,
        viewer: Option<Uuid>,
    ) -> Result<Vec<FeedPost>, AppError>;
}

#[async_trait]
pub trait LikeStore: Send + Sync {
    async fn find_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Like>, AppError>;

    /// Fails with `Conflict` when the pair already has a row.
    async fn insert_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Like, AppError>;

    /// Returns whether a row was deleted.
    async fn delete_like(&self, id: Uuid) -> Result<bool, AppError>;

    async fn count_likes(&self, post_id: Uuid) -> Result<i64, AppError>;
}

pub trait Store: AccountStore + ProfileStore + PostStore + LikeStore {}

impl<T> Store for T where T: AccountStore + ProfileStore + PostStore + LikeStore {}

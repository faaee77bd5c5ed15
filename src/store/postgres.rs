use async_trait::async_trait;
use sqlx::PgPool;
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

const POST_COLUMNS: &str = r#"
    id, type AS kind, title, description, image_url, is_public, user_id, created_at
"#;

/// Like count is an aggregate over `likes`, membership an EXISTS against the viewer.
/// A NULL viewer never matches, so anonymous reads get `liked_by_user = false`.
const FEED_SELECT: &str = r#"
    SELECT
        p.id, p.type AS kind, p.title, p.description, p.image_url,
        p.is_public, p.user_id, p.created_at,
        (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes,
        EXISTS(
            SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = $1::UUID
        ) AS liked_by_user
    FROM posts p
"#;

/// PostgreSQL adapter.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

#[async_trait]
impl AccountStore for PgStore {
    async fn create_identity(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Identity, AppError> {
        sqlx::query_as::<_, Identity>(
            r#"
            INSERT INTO auth_identities (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!("Email '{}' is already registered", email))
            } else {
                tracing::error!("Failed to create identity: {:?}", e);
                AppError::from(e)
            }
        })
    }

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>, AppError> {
        let identity = sqlx::query_as::<_, Identity>(
            "SELECT id, email, password_hash, created_at FROM auth_identities WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(identity)
    }

    async fn create_session(&self, user_id: Uuid) -> Result<Session, AppError> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO auth_sessions (user_id)
            VALUES ($1)
            RETURNING id, user_id, created_at, revoked_at
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    async fn find_session(&self, id: Uuid) -> Result<Option<Session>, AppError> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT id, user_id, created_at, revoked_at FROM auth_sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    async fn revoke_session(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE auth_sessions SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn ensure_profile(&self, profile: &User) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, email, username)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(profile.id)
        .bind(&profile.email)
        .bind(&profile.username)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT id, email, username FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn insert_post(&self, post: &NewPost) -> Result<Post, AppError> {
        let sql = format!(
            r#"
            INSERT INTO posts (type, title, description, image_url, is_public, user_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            POST_COLUMNS
        );

        sqlx::query_as::<_, Post>(&sql)
            .bind(post.kind)
            .bind(&post.title)
            .bind(&post.description)
            .bind(&post.image_url)
            .bind(post.is_public)
            .bind(post.user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to insert post: {:?}", e);
                AppError::from(e)
            })
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, AppError> {
        let sql = format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS);

        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    async fn list_feed(
        &self,
        scope: FeedScope,
        viewer: Option<Uuid>,
    ) -> Result<Vec<FeedPost>, AppError> {
        let filter = match scope {
            FeedScope::Public => "p.is_public = TRUE",
            FeedScope::OwnedBy(_) => "p.user_id = $2",
        };
        let sql = format!(
            "{} WHERE {} ORDER BY p.created_at DESC, p.id DESC",
            FEED_SELECT, filter
        );

        let mut query = sqlx::query_as::<_, FeedPost>(&sql).bind(viewer);
        if let FeedScope::OwnedBy(owner) = scope {
            query = query.bind(owner);
        }

        let posts = query.fetch_all(&self.pool).await.map_err(|e| {
            tracing::error!("Failed to list feed: {:?}", e);
            AppError::from(e)
        })?;

        Ok(posts)
    }
}

#[async_trait]
impl LikeStore for PgStore {
    async fn find_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Option<Like>, AppError> {
        let like = sqlx::query_as::<_, Like>(
            r#"
            SELECT id, post_id, user_id, created_at
            FROM likes
            WHERE post_id = $1 AND user_id = $2
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(like)
    }

    async fn insert_like(&self, post_id: Uuid, user_id: Uuid) -> Result<Like, AppError> {
        sqlx::query_as::<_, Like>(
            r#"
            INSERT INTO likes (post_id, user_id)
            VALUES ($1, $2)
            RETURNING id, post_id, user_id, created_at
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Already liked".to_string())
            } else {
                AppError::from(e)
            }
        })
    }

    async fn delete_like(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM likes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_likes(&self, post_id: Uuid) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

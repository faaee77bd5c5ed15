use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Represents the 'likes' table. At most one row per (post_id, user_id).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Like {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Outcome of a like toggle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LikeToggle {
    pub post_id: Uuid,
    /// State after the toggle.
    pub liked: bool,
    /// False when the store already was in the target state (a concurrent toggle won).
    pub changed: bool,
}

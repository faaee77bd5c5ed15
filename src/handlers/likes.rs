use axum::{
    Extension, Json,
    extract::{Path, State},
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{like::LikeToggle, user::AuthUser},
    state::AppState,
    store::{LikeStore, PostStore},
};

/// Toggle Like on a post.
///
/// Looks up the viewer's like row, then deletes it or inserts one. The two steps are
/// separate store calls; the (post, user) unique constraint catches a concurrent
/// duplicate insert, which is reported as already liked with `changed = false`.
pub async fn toggle_like(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<LikeToggle>, AppError> {
    state
        .store
        .find_post(post_id)
        .await?
        .filter(|post| post.visible_to(Some(user.id)))
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

    // 1. Check if already liked
    let existing = state.store.find_like(post_id, user.id).await?;

    let toggle = match existing {
        // Unlike
        Some(like) => {
            let deleted = state.store.delete_like(like.id).await?;
            LikeToggle {
                post_id,
                liked: false,
                changed: deleted,
            }
        }
        // Like
        None => match state.store.insert_like(post_id, user.id).await {
            Ok(_) => LikeToggle {
                post_id,
                liked: true,
                changed: true,
            },
            Err(AppError::Conflict(_)) => {
                tracing::warn!(%post_id, user_id = %user.id, "Concurrent like already recorded");
                LikeToggle {
                    post_id,
                    liked: true,
                    changed: false,
                }
            }
            Err(e) => return Err(e),
        },
    };

    tracing::debug!(%post_id, user_id = %user.id, liked = toggle.liked, "Like toggled");

    Ok(Json(toggle))
}

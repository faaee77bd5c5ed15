use axum::{Extension, Json, extract::State};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        post::{FeedPost, FeedScope},
        user::{AuthUser, Viewer},
    },
    state::AppState,
    storage::public_url,
    store::PostStore,
};

async fn load(
    state: &AppState,
    scope: FeedScope,
    viewer: Option<Uuid>,
) -> Result<Vec<FeedPost>, AppError> {
    let mut posts = state.store.list_feed(scope, viewer).await?;

    let base = &state.config.public_base_url;
    let bucket = state.objects.bucket();
    for entry in &mut posts {
        entry.image_public_url = entry
            .post
            .image_url
            .as_deref()
            .filter(|path| !path.is_empty())
            .map(|path| public_url(base, bucket, path));
    }

    Ok(posts)
}

/// Every public post, newest first.
/// Anonymous viewers are allowed; their `liked_by_user` is always false.
pub async fn public_feed(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<Vec<FeedPost>>, AppError> {
    Ok(Json(load(&state, FeedScope::Public, viewer.id()).await?))
}

/// Every post of the current user, public or private, newest first.
pub async fn own_posts(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<FeedPost>>, AppError> {
    Ok(Json(
        load(&state, FeedScope::OwnedBy(user.id), Some(user.id)).await?,
    ))
}

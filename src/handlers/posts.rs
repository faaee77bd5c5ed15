use axum::{
    Extension, Json,
    extract::{Multipart, State, multipart::Field},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        post::{ImageFile, NewPost, PostForm, parse_flag},
        user::{AuthUser, User},
    },
    state::AppState,
    storage::image_path,
    store::{PostStore, ProfileStore},
    utils::html::clean_description,
};

async fn field_text(field: Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))
}

/// Collects the composer's multipart body into a `PostForm`.
/// An empty file input (no name, no bytes) counts as no image.
async fn read_form(mut multipart: Multipart) -> Result<PostForm, AppError> {
    let mut form = PostForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "type" => {
                let value = field_text(field).await?;
                form.kind = match value.trim() {
                    "" => None,
                    kind => Some(kind.parse().map_err(AppError::Validation)?),
                };
            }
            "title" => form.title = field_text(field).await?.trim().to_string(),
            "description" => form.description = Some(field_text(field).await?),
            "is_public" | "isPublic" => form.is_public = parse_flag(&field_text(field).await?),
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.to_string()))?;

                if !file_name.is_empty() || !bytes.is_empty() {
                    form.image = Some(ImageFile {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

/// Create a new post.
///
/// Validates the form, ensures the author's profile row exists, uploads the image
/// if one was attached, then inserts the post. Any failure aborts the remaining steps.
pub async fn create_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    // 1. Validate payload before any side effect
    let form = read_form(multipart).await?;
    form.validate()?;
    let kind = form
        .kind
        .ok_or_else(|| AppError::Validation("Post type is required.".to_string()))?;
    let upload_path = form
        .image
        .as_ref()
        .map(|image| image_path(&image.file_name))
        .transpose()?;

    // 2. Ensure the profile row exists
    let created = state
        .store
        .ensure_profile(&User::for_identity(user.id, &user.email))
        .await?;
    if created {
        tracing::info!(user_id = %user.id, "Created profile on first post");
    }

    // 3. Upload the image
    let image_url = match (&form.image, upload_path) {
        (Some(image), Some(path)) => Some(
            state
                .objects
                .upload(&path, &image.bytes, image.content_type.as_deref())
                .await?,
        ),
        _ => None,
    };

    // 4. Insert Post. A failed insert removes the uploaded image.
    let inserted = state
        .store
        .insert_post(&NewPost {
            kind,
            title: form.title.trim().to_string(),
            description: clean_description(form.description.as_deref()),
            image_url: image_url.clone(),
            is_public: form.is_public,
            user_id: user.id,
        })
        .await;

    let post = match inserted {
        Ok(post) => post,
        Err(e) => {
            if let Some(path) = &image_url {
                if let Err(cleanup) = state.objects.delete(path).await {
                    tracing::error!(path = %path, "Failed to remove orphaned image: {}", cleanup);
                }
            }
            return Err(e);
        }
    };

    tracing::info!(post_id = %post.id, user_id = %user.id, is_public = post.is_public, "Post created");

    Ok((StatusCode::CREATED, Json(post)))
}

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Kind of recommendation a post carries.
/// Stored as the `post_kind` enum; `series` and `series-movies` are accepted legacy spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "post_kind", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum PostKind {
    Book,
    #[serde(alias = "series", alias = "series-movies")]
    SeriesMovie,
    Music,
}

impl PostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::Book => "book",
            PostKind::SeriesMovie => "series-movie",
            PostKind::Music => "music",
        }
    }
}

impl fmt::Display for PostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "book" => Ok(PostKind::Book),
            "series-movie" | "series" | "series-movies" => Ok(PostKind::SeriesMovie),
            "music" => Ok(PostKind::Music),
            other => Err(format!("Unknown post type '{}'", other)),
        }
    }
}

/// Represents the 'posts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub title: String,
    pub description: Option<String>,

    /// Storage path inside the images bucket, not a URL.
    pub image_url: Option<String>,

    pub is_public: bool,
    pub user_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Post {
    /// Public posts are visible to everyone, private ones only to their owner.
    pub fn visible_to(&self, viewer: Option<Uuid>) -> bool {
        self.is_public || viewer == Some(self.user_id)
    }
}

/// Display model of a feed entry. Never persisted.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct FeedPost {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub post: Post,

    /// Number of like rows for the post.
    pub likes: i64,

    /// Whether the viewer has a like row for the post. Always false for anonymous viewers.
    pub liked_by_user: bool,

    /// Filled in by the feed handler from the storage base URL.
    #[sqlx(skip)]
    #[serde(default)]
    pub image_public_url: Option<String>,
}

/// Which posts a feed read returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    /// Every public post.
    Public,
    /// Every post owned by the given user, whatever its visibility.
    OwnedBy(Uuid),
}

/// An image attached to a composer submission.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFile")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Composer input, shared by the multipart handler and the client form.
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct PostForm {
    #[validate(required(message = "Post type is required."))]
    pub kind: Option<PostKind>,

    #[validate(
        length(max = 200, message = "Title must be at most 200 characters."),
        custom(function = validate_not_blank)
    )]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters."))]
    pub description: Option<String>,

    pub image: Option<ImageFile>,
    pub is_public: bool,
}

fn validate_not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        let mut err = validator::ValidationError::new("required");
        err.message = Some("Title is required.".into());
        return Err(err);
    }
    Ok(())
}

/// Row to insert once the form is validated and the image stored.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub kind: PostKind,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_public: bool,
    pub user_id: Uuid,
}

/// Parses the HTML-form spelling of a checkbox.
pub fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "on" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_kind_spellings_normalize() {
        assert_eq!("series".parse::<PostKind>(), Ok(PostKind::SeriesMovie));
        assert_eq!("series-movies".parse::<PostKind>(), Ok(PostKind::SeriesMovie));
        assert_eq!(" Book ".parse::<PostKind>(), Ok(PostKind::Book));
        assert!("podcast".parse::<PostKind>().is_err());

        let kind: PostKind = serde_json::from_str("\"series\"").unwrap();
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"series-movie\"");
    }

    #[test]
    fn blank_title_fails_validation() {
        let form = PostForm {
            kind: Some(PostKind::Book),
            title: "   ".into(),
            ..Default::default()
        };
        assert!(form.validate().is_err());

        let form = PostForm {
            kind: None,
            title: "Dune".into(),
            ..Default::default()
        };
        assert!(form.validate().is_err());

        let form = PostForm {
            kind: Some(PostKind::Book),
            title: "Dune".into(),
            ..Default::default()
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn checkbox_values() {
        assert!(parse_flag("on"));
        assert!(parse_flag("TRUE"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }
}

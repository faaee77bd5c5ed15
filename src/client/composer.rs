use validator::Validate;

use super::{ApiClient, Notice};
use crate::{
    error::AppError,
    models::post::{Post, PostForm},
};

/// Post form state. A successful submit resets the form; a failed one keeps the input.
#[derive(Debug, Clone, Default)]
pub struct PostComposer {
    pub form: PostForm,
    notice: Option<Notice>,
}

impl PostComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub async fn submit(&mut self, client: &ApiClient) -> Result<Post, AppError> {
        if let Err(e) = self.form.validate() {
            self.notice = Some(Notice::error("Please fill in the required fields."));
            return Err(e.into());
        }

        match client.create_post(&self.form).await {
            Ok(post) => {
                self.form = PostForm::default();
                self.notice = Some(Notice::success(
                    "Post created",
                    "Your post was published successfully.",
                ));
                Ok(post)
            }
            Err(e) => {
                tracing::error!("Error creating post: {}", e);
                self.notice = Some(Notice::error("There was a problem creating the post."));
                Err(e)
            }
        }
    }
}

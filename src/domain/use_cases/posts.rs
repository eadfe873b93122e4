use std::sync::Arc;

use tracing::{error, info, warn};
use validator::Validate;

use crate::{
    entities::{
        image::ImageInsert,
        pagination::{PageRequest, Pagination},
        post::{NewPostRequest, PostCreatedResponse, PostListResponse, PostResponse},
    },
    errors::AppError,
    repositories::post::PostRepository,
    storage::ObjectStorage,
};

pub const POST_CREATED_MESSAGE: &str = "Post created successfully";
pub const NO_FILES_MESSAGE: &str = "No images were uploaded";
pub const MISSING_FIELDS_MESSAGE: &str = "Missing required fields: content, nombre or titulo";

/// Create and list operations for posts. Both collaborators are built once
/// per process and shared by every request.
#[derive(Clone)]
pub struct PostHandler {
    pub post_repo: Arc<dyn PostRepository>,
    pub storage: Arc<dyn ObjectStorage>,
}

impl PostHandler {
    pub fn new(post_repo: Arc<dyn PostRepository>, storage: Arc<dyn ObjectStorage>) -> Self {
        PostHandler { post_repo, storage }
    }

    /// Retrieves one page of posts, newest first
    pub async fn list_posts(&self, page: PageRequest) -> Result<PostListResponse, AppError> {
        let result = self.post_repo.list_posts(&page).await.inspect_err(|e| {
            error!("Failed to fetch posts: {}", e);
        })?;

        Ok(PostListResponse {
            posts: result.posts.into_iter().map(PostResponse::from).collect(),
            pagination: Pagination::new(page, result.total),
        })
    }

    /// Stores every uploaded image, then records the post referencing them
    pub async fn create_post(&self, mut request: NewPostRequest) -> Result<PostCreatedResponse, AppError> {
        request
            .validate()
            .map_err(|e| AppError::from(e).with_message(MISSING_FIELDS_MESSAGE))?;

        if request.files.is_empty() {
            return Err(AppError::InvalidInput(NO_FILES_MESSAGE.to_string()));
        }

        let files = std::mem::take(&mut request.files);
        let mut stored_keys: Vec<String> = Vec::with_capacity(files.len());
        let mut images: Vec<ImageInsert> = Vec::with_capacity(files.len());

        // One at a time, in payload order
        for upload in files {
            let target = upload.storage_target();
            let size = upload.data.len();

            info!(
                "Uploading image: {}, type: {}, size: {} bytes",
                target.key, target.content_type, size
            );

            let url = match self
                .storage
                .put_object(&target.key, upload.data, target.content_type)
                .await
            {
                Ok(url) => url,
                Err(e) => {
                    error!("Failed to create post: {}", e);
                    self.discard_objects(&stored_keys).await;
                    return Err(e.into());
                }
            };

            stored_keys.push(target.key.clone());
            images.push(ImageInsert {
                url,
                filename: target.key,
                mimetype: target.content_type.to_string(),
                size: size as i64,
                content: None,
            });
        }

        let insert = request.prepare_for_insert(images);

        let post = match self.post_repo.create_post(&insert).await {
            Ok(post) => post,
            Err(e) => {
                error!("Failed to create post: {}", e);
                self.discard_objects(&stored_keys).await;
                return Err(e);
            }
        };

        info!(post_id = %post.id, images = post.images.len(), "Post created.");

        Ok(PostCreatedResponse {
            message: POST_CREATED_MESSAGE.to_string(),
            post: post.into(),
        })
    }

    /// Best-effort removal of objects written by a create call that failed.
    /// Never retried; failures are only logged.
    async fn discard_objects(&self, keys: &[String]) {
        for key in keys {
            if let Err(e) = self.storage.delete_object(key).await {
                warn!("Orphaned object left in storage: {}", e);
            }
        }
    }
}

use std::borrow::Cow;

use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::entities::{
    image::{iso_timestamp, Image, ImageInsert, ImageResponse, ImageUpload},
    pagination::Pagination,
};

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub name: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post together with its images, in upload order.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub id: Uuid,
    pub name: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub images: Vec<Image>,
}

impl Post {
    pub fn from_parts(row: PostRow, images: Vec<Image>) -> Self {
        Post {
            id: row.id,
            name: row.name,
            title: row.title,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
            images,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostInsert {
    pub name: String,
    pub title: String,
    pub description: String,
    pub images: Vec<ImageInsert>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct PostResponse {
    pub id: Uuid,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
    pub images: Vec<ImageResponse>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            name: post.name,
            title: post.title,
            description: post.description,
            created_at: iso_timestamp(&post.created_at),
            updated_at: iso_timestamp(&post.updated_at),
            images: post.images.into_iter().map(ImageResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct PostCreatedResponse {
    pub message: String,
    pub post: PostResponse,
}

// ───── Input & Validation ───────────────────────────────────────────

#[derive(Debug, MultipartForm)]
pub struct PostUploadForm {
    #[multipart(rename = "file")]
    pub files: Vec<TempFile>,

    pub content: Option<Text<String>>,

    pub nombre: Option<Text<String>>,

    pub titulo: Option<Text<String>>,
}

/// Transport-free create request. Text fields keep their form names so
/// validation errors point at what the client actually sent.
#[derive(Debug, Validate)]
pub struct NewPostRequest {
    #[validate(
        required(message = "content is required"),
        custom(function = "validate_not_blank")
    )]
    pub content: Option<String>,

    #[validate(
        required(message = "nombre is required"),
        custom(function = "validate_not_blank")
    )]
    pub nombre: Option<String>,

    #[validate(
        required(message = "titulo is required"),
        custom(function = "validate_not_blank")
    )]
    pub titulo: Option<String>,

    pub files: Vec<ImageUpload>,
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some(Cow::Borrowed("Field cannot be empty"));
        return Err(err);
    }
    Ok(())
}

impl NewPostRequest {
    /// Builds the insert once every file has been stored. Must only be
    /// called on a request that passed validation.
    pub fn prepare_for_insert(&self, images: Vec<ImageInsert>) -> PostInsert {
        let now = Utc::now();
        PostInsert {
            name: self.nombre.clone().unwrap_or_default(),
            title: self.titulo.clone().unwrap_or_default(),
            description: self.content.clone().unwrap_or_default(),
            images,
            created_at: now,
            updated_at: now,
        }
    }
}

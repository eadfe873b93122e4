use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;

// ───── Constants ──────────────────────────────────────────────────────
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];
pub const FALLBACK_EXTENSION: &str = "jpg";

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Image {
    pub id: Uuid,
    pub post_id: Uuid,
    pub position: i32,
    pub url: String,
    pub filename: String,
    pub mimetype: String,
    pub size: i64,
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An object already written to storage, waiting for its database row.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInsert {
    pub url: String,
    pub filename: String,
    pub mimetype: String,
    pub size: i64,
    pub content: Option<String>,
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ImageResponse {
    pub id: Uuid,
    pub url: String,
    pub filename: String,
    pub mimetype: String,
    pub size: i64,
    pub content: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Image> for ImageResponse {
    fn from(image: Image) -> Self {
        Self {
            id: image.id,
            url: image.url,
            filename: image.filename,
            mimetype: image.mimetype,
            size: image.size,
            content: image.content,
            created_at: iso_timestamp(&image.created_at),
            updated_at: iso_timestamp(&image.updated_at),
        }
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub fn iso_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ───── Input ────────────────────────────────────────────────────────

/// A file part lifted out of the multipart form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub original_name: Option<String>,
    pub data: Vec<u8>,
}

impl ImageUpload {
    pub fn new(original_name: Option<String>, data: Vec<u8>) -> Self {
        ImageUpload { original_name, data }
    }

    /// Storage key, extension and content type this upload will be written with.
    pub fn storage_target(&self) -> StorageTarget {
        let extension = normalized_extension(self.original_name.as_deref());
        StorageTarget {
            key: format!("{}.{}", Uuid::new_v4(), extension),
            content_type: mime_for_extension(extension),
            extension,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageTarget {
    pub key: String,
    pub extension: &'static str,
    pub content_type: &'static str,
}

// ───── Extension Policy ─────────────────────────────────────────────

/// Lower-cased text after the last dot of `file_name` when whitelisted,
/// `jpg` otherwise. A name without a dot is taken whole, so `png` keeps `png`.
pub fn normalized_extension(file_name: Option<&str>) -> &'static str {
    let ext = file_name
        .and_then(|name| name.rsplit('.').next())
        .map(str::to_lowercase)
        .unwrap_or_default();

    if ext.is_empty() {
        return FALLBACK_EXTENSION;
    }

    ALLOWED_EXTENSIONS
        .iter()
        .copied()
        .find(|allowed| *allowed == ext)
        .unwrap_or_else(|| {
            tracing::info!("Unsupported extension: {}, using .{} as fallback", ext, FALLBACK_EXTENSION);
            FALLBACK_EXTENSION
        })
}

pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        _ => "image/jpeg",
    }
}

use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Credentials, Region},
    error::DisplayErrorContext,
    primitives::ByteStream,
    Client,
};
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::{errors::StorageError, settings::AppConfig, storage::ObjectStorage};

/// S3-compatible storage (AWS S3, Cloudflare R2, MinIO).
#[derive(Clone)]
pub struct S3ObjectStorage {
    client: Client,
    bucket: String,
    public_url: String,
}

impl S3ObjectStorage {
    pub async fn from_config(config: &AppConfig) -> Result<Self, StorageError> {
        if config.storage_bucket.trim().is_empty() {
            return Err(StorageError::Configuration("bucket is not set".into()));
        }

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.storage_region.clone()));

        // Otherwise the default credential chain applies
        if let (Some(access_key_id), Some(secret_access_key)) =
            (&config.storage_access_key_id, &config.storage_secret_access_key)
        {
            let secret = Zeroizing::new(secret_access_key.clone());
            let credentials = Credentials::new(
                access_key_id,
                secret.as_str(),
                None,
                None,
                "posts_backend_storage",
            );
            loader = loader.credentials_provider(credentials);
        }

        if let Some(endpoint) = &config.storage_endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.storage_force_path_style)
            .build();

        info!(bucket = %config.storage_bucket, "Object storage client configured.");

        Ok(Self::new(
            Client::from_conf(s3_config),
            config.storage_bucket.clone(),
            config.storage_public_url.clone(),
        ))
    }

    pub fn new(client: Client, bucket: String, public_url: String) -> Self {
        S3ObjectStorage {
            client,
            bucket,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn public_url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<String, StorageError> {
        let size = body.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                key: key.to_string(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        debug!(key, content_type, size, "Object written.");

        Ok(self.public_url_for(key))
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Delete {
                key: key.to_string(),
                reason: DisplayErrorContext(&e).to_string(),
            })?;

        Ok(())
    }

    async fn check_connection(&self) -> Result<(), StorageError> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| StorageError::Unavailable(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}

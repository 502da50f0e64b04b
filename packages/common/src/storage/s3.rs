use std::time::Duration;

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};
use serde::Deserialize;

use super::error::StorageError;
use super::traits::{ObjectStore, object_key};

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint (MinIO, R2, ...). Defaults to the AWS endpoint of `region`.
    pub endpoint: Option<String>,
    pub access_key: String,
    pub secret_key: String,
    /// Base URL under which objects are publicly readable.
    pub public_url: String,
    #[serde(default)]
    pub path_style: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    15
}

/// Object store backed by an S3-compatible bucket.
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
    public_url: String,
    max_size: u64,
}

impl S3ObjectStore {
    pub fn new(config: &S3Config, max_size: u64) -> Result<Self, StorageError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Backend(format!("invalid credentials: {e}")))?;

        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://s3.{}.amazonaws.com", config.region));
        let region = Region::Custom {
            region: config.region.clone(),
            endpoint,
        };

        let mut bucket = Bucket::new(&config.bucket, region, credentials).map_err(backend)?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }
        bucket.set_request_timeout(Some(Duration::from_secs(config.request_timeout_secs)));

        Ok(Self {
            bucket,
            public_url: config.public_url.trim_end_matches('/').to_string(),
            max_size,
        })
    }
}

fn backend(err: S3Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

fn expect_success(key: &str, status: u16) -> Result<(), StorageError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(StorageError::Backend(format!(
            "unexpected status {status} for {key}"
        )))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        folder: &str,
        name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let key = object_key(folder, name)?;
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let response = self
            .bucket
            .put_object_with_content_type(&key, &data, content_type)
            .await
            .map_err(backend)?;
        expect_success(&key, response.status_code())?;

        Ok(format!("{}/{key}", self.public_url))
    }

    async fn delete(&self, folder: &str, name: &str) -> Result<bool, StorageError> {
        let key = object_key(folder, name)?;
        if !self.exists(folder, name).await? {
            return Ok(false);
        }
        let response = self.bucket.delete_object(&key).await.map_err(backend)?;
        expect_success(&key, response.status_code())?;
        Ok(true)
    }

    async fn exists(&self, folder: &str, name: &str) -> Result<bool, StorageError> {
        let key = object_key(folder, name)?;
        match self.bucket.head_object(&key).await {
            Ok((_, status)) => Ok((200..300).contains(&status)),
            Err(S3Error::HttpFailWithBody(404, _)) => Ok(false),
            Err(e) => Err(backend(e)),
        }
    }
}

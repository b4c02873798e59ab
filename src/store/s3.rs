use super::ObjectStore;
use crate::error::StoreError;
use crate::types::ObjectDescriptor;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Error;
use aws_sdk_s3::Client;
use bytes::Bytes;
use std::fmt::Debug;
use tracing::{debug, info};

/// Authenticated access to S3 or an S3-compatible service through the AWS SDK.
pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from the standard AWS environment and profile chain.
    ///
    /// Region falls back to `us-east-1`. A custom `endpoint` (MinIO, R2, ...)
    /// switches the client to path-style addressing.
    pub async fn from_env(endpoint: Option<&str>) -> Self {
        let region_provider = RegionProviderChain::default_provider().or_else("us-east-1");
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region_provider);
        if let Some(endpoint) = endpoint {
            info!("☁️  Using S3 endpoint {}", endpoint);
            loader = loader.endpoint_url(endpoint);
        }
        let shared_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared_config)
            .force_path_style(endpoint.is_some())
            .build();

        Self::new(Client::from_conf(s3_config))
    }
}

fn list_error<R>(bucket: &str, err: SdkError<ListObjectsV2Error, R>) -> StoreError
where
    R: Debug + 'static,
{
    match err.as_service_error() {
        Some(service_error) if service_error.is_no_such_bucket() => {
            StoreError::NoSuchBucket(bucket.to_string())
        }
        _ => StoreError::S3(DisplayErrorContext(&err).to_string()),
    }
}

fn get_error<R>(key: &str, err: SdkError<GetObjectError, R>) -> StoreError
where
    R: Debug + 'static,
{
    match err.as_service_error() {
        Some(service_error) if service_error.is_no_such_key() => {
            StoreError::NoSuchKey(key.to_string())
        }
        _ => StoreError::S3(DisplayErrorContext(&err).to_string()),
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3Store {
    async fn list_objects(&self, bucket: &str) -> Result<Vec<ObjectDescriptor>, StoreError> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .into_paginator()
            .send();

        let mut objects = Vec::new();
        let mut page_count = 0usize;
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| list_error(bucket, e))?;
            page_count += 1;
            for object in page.contents() {
                if let Some(key) = object.key() {
                    let size = object.size().and_then(|s| u64::try_from(s).ok());
                    objects.push(ObjectDescriptor::new(key, size));
                }
            }
        }
        debug!(
            "Listed {} objects in {} page(s) from {}",
            objects.len(),
            page_count,
            bucket
        );

        Ok(objects)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| get_error(key, e))?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StoreError::S3(format!("reading body of {}: {}", key, e)))?;

        Ok(data.into_bytes())
    }
}

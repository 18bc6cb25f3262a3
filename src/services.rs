//! Capability traits the wranglers talk to, and their AWS SDK implementations.

use async_trait::async_trait;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::InvocationType;
use aws_smithy_types::body::SdkBody;
use aws_smithy_types::byte_stream::ByteStream;
use std::time::Instant;
use tracing::{debug, info};

use crate::error::{aws_error, ErrorKind, IngestError};

/// Blob storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn read_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, IngestError>;
    async fn write_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), IngestError>;
}

/// Outcome of a synchronous function invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Invocation {
    pub payload: Vec<u8>,
    /// Set when the invoked function raised instead of returning.
    pub function_error: Option<String>,
}

#[async_trait]
pub trait MethodInvoker: Send + Sync {
    async fn invoke(&self, function_name: &str, payload: Vec<u8>) -> Result<Invocation, IngestError>;
}

#[async_trait]
pub trait QueueSink: Send + Sync {
    async fn send_message(
        &self,
        queue_url: &str,
        body: String,
        group_id: &str,
        deduplication_id: &str,
    ) -> Result<(), IngestError>;
}

#[async_trait]
pub trait TopicPublisher: Send + Sync {
    async fn publish(&self, topic_arn: &str, message: String) -> Result<(), IngestError>;
}

/// The collaborators handed to a wrangler for one invocation.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub store: &'a dyn ObjectStore,
    pub invoker: &'a dyn MethodInvoker,
    pub queue: &'a dyn QueueSink,
    pub topic: &'a dyn TopicPublisher,
}

#[async_trait]
impl ObjectStore for aws_sdk_s3::Client {
    async fn read_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, IngestError> {
        let start_time = Instant::now();
        let response = self
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| aws_error("S3", e))?;

        let capacity = response.content_length.unwrap_or(64 * 1024).max(0) as usize;
        let mut data = Vec::with_capacity(capacity);
        let mut body = response.body;
        while let Some(chunk) = body.next().await {
            let bytes = chunk.map_err(|e| IngestError::Aws {
                kind: ErrorKind::Transient,
                service: "S3",
                message: e.to_string(),
            })?;
            data.extend_from_slice(&bytes[..]);
        }

        info!(
            "Downloaded s3://{}/{} ({} bytes) in {}ms",
            bucket,
            key,
            data.len(),
            start_time.elapsed().as_millis()
        );
        Ok(data)
    }

    async fn write_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), IngestError> {
        debug!("uploading {} bytes to s3://{}/{}", body.len(), bucket, key);
        self.put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::new(SdkBody::from(body)))
            .send()
            .await
            .map_err(|e| aws_error("S3", e))?;
        Ok(())
    }
}

#[async_trait]
impl MethodInvoker for aws_sdk_lambda::Client {
    async fn invoke(&self, function_name: &str, payload: Vec<u8>) -> Result<Invocation, IngestError> {
        let start_time = Instant::now();
        let response = self
            .invoke()
            .function_name(function_name)
            .invocation_type(InvocationType::RequestResponse)
            .payload(Blob::new(payload))
            .send()
            .await
            .map_err(|e| aws_error("Lambda", e))?;

        info!(
            "Invoked {} in {}ms",
            function_name,
            start_time.elapsed().as_millis()
        );
        Ok(Invocation {
            payload: response.payload.map(Blob::into_inner).unwrap_or_default(),
            function_error: response.function_error,
        })
    }
}

#[async_trait]
impl QueueSink for aws_sdk_sqs::Client {
    async fn send_message(
        &self,
        queue_url: &str,
        body: String,
        group_id: &str,
        deduplication_id: &str,
    ) -> Result<(), IngestError> {
        self.send_message()
            .queue_url(queue_url)
            .message_body(body)
            .message_group_id(group_id)
            .message_deduplication_id(deduplication_id)
            .send()
            .await
            .map_err(|e| aws_error("SQS", e))?;
        Ok(())
    }
}

#[async_trait]
impl TopicPublisher for aws_sdk_sns::Client {
    async fn publish(&self, topic_arn: &str, message: String) -> Result<(), IngestError> {
        self.publish()
            .target_arn(topic_arn)
            .message(message)
            .send()
            .await
            .map_err(|e| aws_error("SNS", e))?;
        Ok(())
    }
}

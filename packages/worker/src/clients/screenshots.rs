//! Screenshot object storage.

use async_trait::async_trait;
use audit::AuditError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait ScreenshotStore: Send + Sync {
    /// Store a PNG under `key`, returning the stored object's path.
    async fn put_png(&self, key: &str, bytes: Vec<u8>) -> Result<String, AuditError>;
}

/// `businesses/{businessId}/{device}-{timestamp}.png`
pub fn screenshot_key(business_id: Uuid, device: &str, at: DateTime<Utc>) -> String {
    format!("businesses/{}/{}-{}.png", business_id, device, at.timestamp())
}

pub struct S3ScreenshotStore {
    client: Client,
    bucket: String,
}

impl S3ScreenshotStore {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    pub async fn from_env(bucket: String) -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(Client::new(&config), bucket)
    }
}

#[async_trait]
impl ScreenshotStore for S3ScreenshotStore {
    async fn put_png(&self, key: &str, bytes: Vec<u8>) -> Result<String, AuditError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("image/png")
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| AuditError::Storage(format!("screenshot upload failed: {e}")))?;

        Ok(format!("s3://{}/{}", self.bucket, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn key_is_namespaced_by_business_and_timestamp() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(
            screenshot_key(id, "desktop", at),
            "businesses/550e8400-e29b-41d4-a716-446655440000/desktop-1700000000.png"
        );
    }
}

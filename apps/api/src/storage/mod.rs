// Object storage for uploaded resumes.
// The extraction service fetches files by public URL, so every upload must
// land somewhere publicly dereferenceable.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use uuid::Uuid;

/// Object-store collaborator: durable writes plus public URLs.
///
/// Carried as `Arc<dyn ResumeStore>` so the pipeline can run against an
/// in-memory store in tests.
#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn upload(&self, key: &str, bytes: Bytes, content_type: &str) -> anyhow::Result<()>;
    fn public_url(&self, key: &str) -> String;
}

/// S3 / MinIO-backed store.
pub struct S3ResumeStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    endpoint: String,
}

impl S3ResumeStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, endpoint: String) -> Self {
        Self {
            client,
            bucket,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ResumeStore for S3ResumeStore {
    async fn upload(&self, key: &str, bytes: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("S3 upload failed: {e}"))?;

        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }
}

/// Builds the storage key for one uploaded resume. Keys are namespaced by
/// applicant and salted with a fresh UUID, so re-submitting the same file
/// always lands at a new key.
pub fn resume_key(applicant_id: Uuid, file_name: &str) -> String {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .unwrap_or("pdf");

    format!("{applicant_id}/{}.{ext}", Uuid::new_v4())
}

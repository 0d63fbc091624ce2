use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use floorplan_shared::{decode_plan_file, encode_plan_file, PlanFileData, PlanFileDecodeError};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored plan is unreadable: {0}")]
    Decode(#[from] PlanFileDecodeError),
    #[error("object storage error: {0}")]
    Remote(String),
}

/// Persistence for event boards and their uploaded objects.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn load_board(&self, event_id: &str) -> Result<PlanFileData, StorageError>;
    async fn save_board(&self, event_id: &str, data: &PlanFileData) -> Result<(), StorageError>;
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;
    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StorageError>;
}

pub struct FileStorage {
    data_dir: PathBuf,
}

impl FileStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn plan_path(&self, event_id: &str) -> PathBuf {
        self.data_dir.join(format!("{event_id}.plan"))
    }

    fn object_path(&self, key: &str) -> PathBuf {
        self.data_dir.join("objects").join(key)
    }
}

async fn read_or_not_found(path: &Path, what: &str) -> Result<Vec<u8>, StorageError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(bytes),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            Err(StorageError::NotFound(what.to_string()))
        }
        Err(error) => Err(error.into()),
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn load_board(&self, event_id: &str) -> Result<PlanFileData, StorageError> {
        let payload =
            read_or_not_found(&self.plan_path(event_id), &format!("plan {event_id}")).await?;
        Ok(decode_plan_file(&payload)?)
    }

    async fn save_board(&self, event_id: &str, data: &PlanFileData) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        let path = self.plan_path(event_id);
        let staging = path.with_extension("plan.tmp");
        tokio::fs::write(&staging, encode_plan_file(data)).await?;
        tokio::fs::rename(&staging, &path).await?;
        Ok(())
    }

    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        let path = self.object_path(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        read_or_not_found(&self.object_path(key), &format!("object {key}")).await
    }
}

#[derive(Clone, Debug)]
pub struct S3StorageConfig {
    pub bucket: String,
    pub prefix: Option<String>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub force_path_style: bool,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl S3StorageConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: None,
            region: None,
            endpoint_url: None,
            force_path_style: false,
            access_key_id: None,
            secret_access_key: None,
        }
    }
}

pub struct S3Storage {
    bucket: String,
    prefix: String,
    client: Client,
}

impl S3Storage {
    pub async fn new(config: S3StorageConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let (Some(access_key_id), Some(secret_access_key)) = (
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
        ) {
            let creds = Credentials::new(access_key_id, secret_access_key, None, None, "static");
            loader = loader.credentials_provider(creds);
        }
        if let Some(region) = config.region.clone() {
            loader = loader.region(aws_config::Region::new(region));
        }
        let shared = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint_url) = config.endpoint_url.as_ref() {
            builder = builder.endpoint_url(endpoint_url);
        }
        if config.force_path_style {
            builder = builder.force_path_style(true);
        }
        let client = Client::from_conf(builder.build());
        let prefix = config
            .prefix
            .unwrap_or_default()
            .trim_matches('/')
            .to_string();
        Self {
            bucket: config.bucket,
            prefix,
            client,
        }
    }

    fn key(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{name}", self.prefix)
        }
    }

    async fn get(&self, key: String, what: &str) -> Result<Vec<u8>, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;
        let output = match response {
            Ok(output) => output,
            Err(error) => {
                if let Some(service_error) = error.as_service_error() {
                    if service_error.is_no_such_key() {
                        return Err(StorageError::NotFound(what.to_string()));
                    }
                }
                return Err(StorageError::Remote(format!(
                    "failed to load {what} from s3: {error:?}"
                )));
            }
        };
        match output.body.collect().await {
            Ok(collected) => Ok(collected.into_bytes().to_vec()),
            Err(error) => Err(StorageError::Remote(format!(
                "failed to read {what} from s3 response: {error:?}"
            ))),
        }
    }

    async fn put(
        &self,
        key: String,
        bytes: Vec<u8>,
        content_type: &str,
        what: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map(|_| ())
            .map_err(|error| StorageError::Remote(format!("failed to save {what} to s3: {error:?}")))
    }
}

#[async_trait]
impl Storage for S3Storage {
    async fn load_board(&self, event_id: &str) -> Result<PlanFileData, StorageError> {
        let payload = self
            .get(self.key(&format!("{event_id}.plan")), &format!("plan {event_id}"))
            .await?;
        Ok(decode_plan_file(&payload)?)
    }

    async fn save_board(&self, event_id: &str, data: &PlanFileData) -> Result<(), StorageError> {
        self.put(
            self.key(&format!("{event_id}.plan")),
            encode_plan_file(data),
            "application/octet-stream",
            &format!("plan {event_id}"),
        )
        .await
    }

    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.put(self.key(key), bytes, content_type, &format!("object {key}"))
            .await
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.get(self.key(key), &format!("object {key}")).await
    }
}

/// Keeps everything in process memory; plans are still run through the file
/// codec so behavior matches the durable backends.
#[derive(Default)]
pub struct MemoryStorage {
    plans: Mutex<HashMap<String, Vec<u8>>>,
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn load_board(&self, event_id: &str) -> Result<PlanFileData, StorageError> {
        let plans = self.plans.lock().await;
        let payload = plans
            .get(event_id)
            .ok_or_else(|| StorageError::NotFound(format!("plan {event_id}")))?;
        Ok(decode_plan_file(payload)?)
    }

    async fn save_board(&self, event_id: &str, data: &PlanFileData) -> Result<(), StorageError> {
        self.plans
            .lock()
            .await
            .insert(event_id.to_string(), encode_plan_file(data));
        Ok(())
    }

    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), StorageError> {
        self.objects.lock().await.insert(key.to_string(), bytes);
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        self.objects
            .lock()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("object {key}")))
    }
}

#[cfg(test)]
mod tests {
    use floorplan_shared::{BoothRecord, EventId, FloorPlan, VenueId};
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample() -> PlanFileData {
        PlanFileData {
            floor_plan: Some(FloorPlan::new(EventId::from("expo"), VenueId::from("arena"))),
            booths: vec![BoothRecord {
                id: "b1".into(),
                event_id: "expo".into(),
                grid_row: Some(0),
                grid_col: Some(3),
                ..BoothRecord::default()
            }],
            zones: Vec::new(),
        }
    }

    #[tokio::test]
    async fn file_storage_persists_plans_and_objects() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("plans"));
        assert!(matches!(
            storage.load_board("expo").await,
            Err(StorageError::NotFound(_))
        ));
        storage.save_board("expo", &sample()).await.unwrap();
        assert_eq!(storage.load_board("expo").await.unwrap(), sample());

        storage
            .put_object("backgrounds/expo.jpg", vec![1, 2, 3], "image/jpeg")
            .await
            .unwrap();
        assert_eq!(
            storage.get_object("backgrounds/expo.jpg").await.unwrap(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn corrupt_plan_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("expo.plan"), b"garbage")
            .await
            .unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf());
        assert!(matches!(
            storage.load_board("expo").await,
            Err(StorageError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn memory_storage_reports_missing_objects() {
        let storage = MemoryStorage::default();
        assert!(matches!(
            storage.get_object("backgrounds/none.jpg").await,
            Err(StorageError::NotFound(_))
        ));
        storage.save_board("expo", &sample()).await.unwrap();
        assert_eq!(storage.load_board("expo").await.unwrap(), sample());
    }
}

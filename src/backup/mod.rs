pub mod onedrive;
pub mod snapshot;
pub mod storage;
pub mod webdav;

pub use onedrive::OneDriveStorage;
pub use snapshot::{SnapshotError, SnapshotRecord};
pub use storage::{RemoteStorage, StorageError};
pub use webdav::WebDavStorage;

use chrono::Utc;
use thiserror::Error;

use crate::config::{AppConfig, BackupTarget};
use crate::db::position_repo::RestoredPosition;
use crate::models::Position;

const SNAPSHOT_PREFIX: &str = "backup_";
const SNAPSHOT_SUFFIX: &str = ".json";

/// Failure of a backup or restore operation, keeping the failing
/// component (transport vs document) visible to the caller.
#[derive(Debug, Error)]
pub enum BackupError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Backup/restore gateway over one remote storage backend, chosen once at
/// construction from the configured default target.
pub struct BackupGateway {
    backend: Box<dyn RemoteStorage>,
    remote_dir: String,
}

impl BackupGateway {
    /// Build the gateway for the configured target. Returns
    /// `StorageError::Unavailable` when the target's credentials are
    /// absent; callers report that, they do not treat it as a failure.
    pub fn from_config(config: &AppConfig) -> Result<Self, StorageError> {
        let backend: Box<dyn RemoteStorage> = match config.backup_target {
            BackupTarget::OneDrive => {
                let token = config
                    .onedrive_access_token
                    .clone()
                    .ok_or(StorageError::Unavailable("onedrive"))?;
                Box::new(OneDriveStorage::new(token))
            }
            BackupTarget::WebDav => {
                if !config.has_webdav() {
                    return Err(StorageError::Unavailable("webdav"));
                }
                Box::new(WebDavStorage::new(
                    config.webdav_url.clone().unwrap_or_default(),
                    config.webdav_username.as_deref().unwrap_or_default(),
                    config.webdav_password.as_deref().unwrap_or_default(),
                ))
            }
        };

        Ok(Self {
            backend,
            remote_dir: config.backup_dir.clone(),
        })
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Snapshot every position (closed ones included) and upload it.
    /// Returns the stored snapshot name.
    pub async fn backup(&self, positions: &[Position]) -> Result<String, BackupError> {
        let doc = snapshot::encode(positions)?;
        let file_name = format!(
            "{SNAPSHOT_PREFIX}{}{SNAPSHOT_SUFFIX}",
            Utc::now().format("%Y%m%d_%H%M%S")
        );
        let remote_path = format!("{}/{}", self.remote_dir, file_name);

        if !self.backend.exists(&self.remote_dir).await.unwrap_or(false) {
            // Creation failures surface through the upload fallback chain.
            if let Err(e) = self.backend.mkdir(&self.remote_dir).await {
                tracing::warn!(error = %e, dir = %self.remote_dir, "Backup directory creation failed");
            }
        }

        self.backend.upload(&doc, &remote_path).await?;

        tracing::info!(
            backend = self.backend.name(),
            file = %file_name,
            count = positions.len(),
            "Snapshot uploaded"
        );

        Ok(file_name)
    }

    /// Download a named snapshot and parse it, recomputing targets as of
    /// now. Applying the result to the store is the caller's transaction.
    pub async fn restore(&self, snapshot_name: &str) -> Result<Vec<RestoredPosition>, BackupError> {
        let remote_path = format!("{}/{}", self.remote_dir, snapshot_name);
        let bytes = self.backend.download(&remote_path).await?;
        let restored = snapshot::decode(&bytes, Utc::now())?;

        tracing::info!(
            backend = self.backend.name(),
            file = snapshot_name,
            count = restored.len(),
            "Snapshot downloaded and parsed"
        );

        Ok(restored)
    }

    /// Names of previously stored snapshots, oldest first.
    pub async fn list_backups(&self) -> Result<Vec<String>, StorageError> {
        let mut names: Vec<String> = self
            .backend
            .list(&self.remote_dir)
            .await?
            .into_iter()
            .filter(|n| n.starts_with(SNAPSHOT_PREFIX) && n.ends_with(SNAPSHOT_SUFFIX))
            .collect();
        names.sort();
        Ok(names)
    }
}

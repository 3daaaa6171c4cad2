use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{backend} returned {status} for {path}")]
    Status {
        backend: &'static str,
        status: u16,
        path: String,
    },

    #[error("remote file not found: {0}")]
    NotFound(String),

    #[error("{0} backend is not configured")]
    Unavailable(&'static str),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// Capability set every backup backend must provide. Paths are relative
/// to the backend's root ("TradeBackup/backup_x.json"); each operation
/// may fail independently and failures are reported, never fatal.
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn exists(&self, path: &str) -> Result<bool, StorageError>;

    async fn mkdir(&self, path: &str) -> Result<(), StorageError>;

    async fn upload(&self, data: &[u8], remote_path: &str) -> Result<(), StorageError>;

    async fn download(&self, remote_path: &str) -> Result<Vec<u8>, StorageError>;

    async fn list(&self, dir: &str) -> Result<Vec<String>, StorageError>;
}

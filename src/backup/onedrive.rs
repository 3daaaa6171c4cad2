use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::storage::{RemoteStorage, StorageError};

const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";

/// OneDrive backend over the Microsoft Graph drive API. The access token
/// is supplied ready-made through configuration; acquiring or refreshing
/// it is outside this client.
#[derive(Debug, Clone)]
pub struct OneDriveStorage {
    http: Client,
    base_url: String,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct DriveChildren {
    value: Vec<DriveItem>,
}

#[derive(Debug, Deserialize)]
struct DriveItem {
    name: String,
}

impl OneDriveStorage {
    pub fn new(access_token: String) -> Self {
        Self::with_base_url(GRAPH_API_BASE.into(), access_token)
    }

    pub fn with_base_url(base_url: String, access_token: String) -> Self {
        Self {
            http: Client::new(),
            base_url,
            access_token,
        }
    }

    fn item_url(&self, path: &str, suffix: &str) -> String {
        format!("{}/me/drive/root:/{}{}", self.base_url, path.trim_matches('/'), suffix)
    }

    fn status_error(&self, status: StatusCode, path: &str) -> StorageError {
        StorageError::Status {
            backend: self.name(),
            status: status.as_u16(),
            path: path.to_string(),
        }
    }
}

#[async_trait]
impl RemoteStorage for OneDriveStorage {
    fn name(&self) -> &'static str {
        "onedrive"
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let resp = self
            .http
            .get(self.item_url(path, ""))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() => Ok(true),
            s => Err(self.status_error(s, path)),
        }
    }

    async fn mkdir(&self, path: &str) -> Result<(), StorageError> {
        // Folders are created as children of the drive root.
        let url = format!("{}/me/drive/root/children", self.base_url);
        let body = json!({
            "name": path.trim_matches('/'),
            "folder": {},
            "@microsoft.graph.conflictBehavior": "replace",
        });

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(self.status_error(resp.status(), path))
        }
    }

    async fn upload(&self, data: &[u8], remote_path: &str) -> Result<(), StorageError> {
        let resp = self
            .http
            .put(self.item_url(remote_path, ":/content"))
            .bearer_auth(&self.access_token)
            .header("content-type", "application/json")
            .body(data.to_vec())
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(self.status_error(resp.status(), remote_path))
        }
    }

    async fn download(&self, remote_path: &str) -> Result<Vec<u8>, StorageError> {
        let resp = self
            .http
            .get(self.item_url(remote_path, ":/content"))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Err(StorageError::NotFound(remote_path.to_string())),
            s if s.is_success() => Ok(resp.bytes().await?.to_vec()),
            s => Err(self.status_error(s, remote_path)),
        }
    }

    async fn list(&self, dir: &str) -> Result<Vec<String>, StorageError> {
        let resp = self
            .http
            .get(self.item_url(dir, ":/children"))
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            s if s.is_success() => {
                let children: DriveChildren = resp.json().await?;
                Ok(children.value.into_iter().map(|item| item.name).collect())
            }
            s => Err(self.status_error(s, dir)),
        }
    }
}

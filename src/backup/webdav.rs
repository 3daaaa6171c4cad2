use async_trait::async_trait;
use base64::Engine as _;
use reqwest::{Client, Method, StatusCode};

use super::storage::{RemoteStorage, StorageError};

/// WebDAV backend. Servers disagree on how collection paths resolve, so
/// `upload` works through a fixed fallback chain (see below) instead of a
/// single PUT.
#[derive(Debug, Clone)]
pub struct WebDavStorage {
    http: Client,
    base_url: String,
    auth_header: String,
}

impl WebDavStorage {
    pub fn new(base_url: String, username: &str, password: &str) -> Self {
        let credentials =
            base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header: format!("Basic {credentials}"),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_matches('/'))
    }

    fn status_error(&self, status: StatusCode, path: &str) -> StorageError {
        StorageError::Status {
            backend: self.name(),
            status: status.as_u16(),
            path: path.to_string(),
        }
    }

    async fn request(&self, method: Method, path: &str) -> Result<reqwest::Response, StorageError> {
        Ok(self
            .http
            .request(method, self.url_for(path))
            .header("authorization", &self.auth_header)
            .send()
            .await?)
    }

    async fn put_bytes(&self, path: &str, data: &[u8]) -> Result<(), StorageError> {
        let resp = self
            .http
            .put(self.url_for(path))
            .header("authorization", &self.auth_header)
            .body(data.to_vec())
            .send()
            .await?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(self.status_error(resp.status(), path))
        }
    }
}

#[async_trait]
impl RemoteStorage for WebDavStorage {
    fn name(&self) -> &'static str {
        "webdav"
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let method = Method::from_bytes(b"PROPFIND").expect("valid method");
        let resp = self
            .http
            .request(method, self.url_for(path))
            .header("authorization", &self.auth_header)
            .header("depth", "0")
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(false),
            s if s.is_success() || s == StatusCode::MULTI_STATUS => Ok(true),
            s => Err(self.status_error(s, path)),
        }
    }

    async fn mkdir(&self, path: &str) -> Result<(), StorageError> {
        let method = Method::from_bytes(b"MKCOL").expect("valid method");
        let resp = self.request(method, path).await?;

        match resp.status() {
            // 405 means the collection already exists
            StatusCode::METHOD_NOT_ALLOWED => Ok(()),
            s if s.is_success() => Ok(()),
            s => Err(self.status_error(s, path)),
        }
    }

    /// Upload through up to three path-resolution strategies, in order:
    /// 1. ensure the directory exists, then PUT into it;
    /// 2. PUT the full directory/file path in one shot (servers that
    ///    auto-create or remap collections);
    /// 3. PUT the bare file name at the root.
    /// The chain stops at the first success; the last error is reported.
    async fn upload(&self, data: &[u8], remote_path: &str) -> Result<(), StorageError> {
        let (dir, file) = match remote_path.rsplit_once('/') {
            Some((dir, file)) => (Some(dir), file),
            None => (None, remote_path),
        };

        // Strategy 1: directory then file.
        let first_err = if let Some(dir) = dir {
            match self.mkdir(dir).await {
                Ok(()) => match self.put_bytes(remote_path, data).await {
                    Ok(()) => return Ok(()),
                    Err(e) => e,
                },
                Err(e) => e,
            }
        } else {
            return self.put_bytes(file, data).await;
        };
        tracing::warn!(error = %first_err, path = remote_path, "WebDAV upload strategy 1 failed");

        // Strategy 2: flat full-path PUT, no prior MKCOL.
        match self.put_bytes(remote_path, data).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, path = remote_path, "WebDAV upload strategy 2 failed");
            }
        }

        // Strategy 3: bare root path.
        match self.put_bytes(file, data).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, path = file, "WebDAV upload strategy 3 failed");
                Err(e)
            }
        }
    }

    async fn download(&self, remote_path: &str) -> Result<Vec<u8>, StorageError> {
        let resp = self.request(Method::GET, remote_path).await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Err(StorageError::NotFound(remote_path.to_string())),
            s if s.is_success() => Ok(resp.bytes().await?.to_vec()),
            s => Err(self.status_error(s, remote_path)),
        }
    }

    async fn list(&self, dir: &str) -> Result<Vec<String>, StorageError> {
        let method = Method::from_bytes(b"PROPFIND").expect("valid method");
        let resp = self
            .http
            .request(method, self.url_for(dir))
            .header("authorization", &self.auth_header)
            .header("depth", "1")
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(Vec::new()),
            s if s.is_success() || s == StatusCode::MULTI_STATUS => {
                let body = resp.text().await?;
                Ok(file_names_from_propfind(&body, dir))
            }
            s => Err(self.status_error(s, dir)),
        }
    }
}

/// Pull file names out of a PROPFIND multistatus body. The href elements
/// are enough here; a full XML parse buys nothing for name listing.
fn file_names_from_propfind(body: &str, dir: &str) -> Vec<String> {
    let dir = dir.trim_matches('/');
    let dir_suffix = format!("/{dir}");
    extract_hrefs(body)
        .into_iter()
        .filter_map(|href| {
            // Collection hrefs carry a trailing slash; the listing wants
            // files only.
            if href.ends_with('/') {
                return None;
            }
            let path = href.trim_start_matches('/');
            // PROPFIND depth 1 includes the collection itself, with or
            // without the trailing slash; compare the full path, not the
            // last segment.
            if path.is_empty() || path == dir || path.ends_with(&dir_suffix) {
                return None;
            }
            path.rsplit('/').next().map(str::to_string)
        })
        .collect()
}

fn extract_hrefs(body: &str) -> Vec<String> {
    // ASCII-only lowering keeps byte offsets aligned with `body`.
    let lower = body.to_ascii_lowercase();
    let mut hrefs = Vec::new();
    let mut cursor = 0;

    while let Some(open) = lower[cursor..].find('<') {
        let tag_start = cursor + open + 1;
        let Some(tag_len) = lower[tag_start..].find('>') else {
            break;
        };
        let tag = &lower[tag_start..tag_start + tag_len];
        cursor = tag_start + tag_len + 1;

        // Opening href tags only ("href", "d:href", ...); closing tags
        // start with a slash and must not contribute entries.
        if tag.starts_with('/') || !(tag == "href" || tag.ends_with(":href")) {
            continue;
        }

        let start = cursor;
        let Some(close) = lower[start..].find("</") else {
            break;
        };
        hrefs.push(body[start..start + close].trim().to_string());
        cursor = start + close;
    }

    hrefs
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULTISTATUS: &str = r#"<?xml version="1.0"?>
        <D:multistatus xmlns:D="DAV:">
          <D:response><D:href>/dav/TradeBackup/</D:href></D:response>
          <D:response><D:href>/dav/TradeBackup/backup_20240101_120000.json</D:href></D:response>
          <D:response><D:href>/dav/TradeBackup/backup_20240201_090000.json</D:href></D:response>
        </D:multistatus>"#;

    #[test]
    fn test_extract_hrefs() {
        let hrefs = extract_hrefs(MULTISTATUS);
        assert_eq!(hrefs.len(), 3);
        assert_eq!(hrefs[1], "/dav/TradeBackup/backup_20240101_120000.json");
    }

    #[test]
    fn test_file_names_skip_the_collection_itself() {
        let names = file_names_from_propfind(MULTISTATUS, "TradeBackup");
        assert_eq!(
            names,
            vec![
                "backup_20240101_120000.json".to_string(),
                "backup_20240201_090000.json".to_string(),
            ]
        );
    }

    #[test]
    fn test_lowercase_namespace_prefix() {
        let body = "<d:href>/x/a.json</d:href>";
        assert_eq!(extract_hrefs(body), vec!["/x/a.json".to_string()]);
    }

    #[test]
    fn test_adjacent_hrefs_in_compact_body() {
        // No whitespace between elements: closing tags must not produce
        // empty or polluted entries.
        let body = "<D:href>/dav/TradeBackup/backup_a.json</D:href>\
                    <D:href>/dav/TradeBackup/backup_b.json</D:href>";
        assert_eq!(
            extract_hrefs(body),
            vec![
                "/dav/TradeBackup/backup_a.json".to_string(),
                "/dav/TradeBackup/backup_b.json".to_string(),
            ]
        );
    }

    #[test]
    fn test_unrelated_tags_are_ignored() {
        let body = "<d:response><d:status>HTTP/1.1 200 OK</d:status>\
                    <d:href>/x/a.json</d:href></d:response>";
        assert_eq!(extract_hrefs(body), vec!["/x/a.json".to_string()]);
    }

    #[test]
    fn test_file_named_like_directory_suffix_is_kept() {
        // "Backup" is a suffix of "TradeBackup" but a real file; only the
        // collection's own href may be dropped.
        let body = "<D:href>/dav/TradeBackup/</D:href>\
                    <D:href>/dav/TradeBackup/Backup</D:href>";
        assert_eq!(
            file_names_from_propfind(body, "TradeBackup"),
            vec!["Backup".to_string()]
        );
    }

    #[test]
    fn test_collection_href_without_trailing_slash_is_dropped() {
        let body = "<D:href>/dav/TradeBackup</D:href>\
                    <D:href>/dav/TradeBackup/backup_20240101_120000.json</D:href>";
        assert_eq!(
            file_names_from_propfind(body, "TradeBackup"),
            vec!["backup_20240101_120000.json".to_string()]
        );
    }
}

use std::env;
use std::fmt;

const DEFAULT_FEED_URL: &str = "https://api.tushare.pro";
const DEFAULT_BACKUP_DIR: &str = "TradeBackup";
const DEFAULT_MONITOR_INTERVAL_SECS: u64 = 60;

/// Which remote storage backend the backup gateway targets. Chosen once
/// at startup; an unconfigured target makes the gateway unavailable, not
/// the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupTarget {
    OneDrive,
    WebDav,
}

impl BackupTarget {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "webdav" => BackupTarget::WebDav,
            _ => BackupTarget::OneDrive,
        }
    }
}

impl fmt::Display for BackupTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupTarget::OneDrive => write!(f, "onedrive"),
            BackupTarget::WebDav => write!(f, "webdav"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    // Price feed (optional — monitoring and lookups need it)
    pub feed_base_url: String,
    pub feed_token: Option<String>,

    // Monitor loop
    pub monitor_interval_secs: u64,

    // API auth (optional — empty disables it)
    pub api_token: Option<String>,

    // Backup gateway
    pub backup_target: BackupTarget,
    pub backup_dir: String,
    pub onedrive_access_token: Option<String>,
    pub webdav_url: Option<String>,
    pub webdav_username: Option<String>,
    pub webdav_password: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,

            feed_base_url: env::var("FEED_BASE_URL").unwrap_or_else(|_| DEFAULT_FEED_URL.into()),
            feed_token: env::var("FEED_TOKEN").ok().filter(|s| !s.is_empty()),

            monitor_interval_secs: env::var("MONITOR_INTERVAL_SECS")
                .unwrap_or_default()
                .parse()
                .unwrap_or(DEFAULT_MONITOR_INTERVAL_SECS),

            api_token: env::var("API_TOKEN").ok().filter(|s| !s.is_empty()),

            backup_target: BackupTarget::from_str(
                &env::var("BACKUP_TARGET").unwrap_or_default(),
            ),
            backup_dir: env::var("BACKUP_DIR").unwrap_or_else(|_| DEFAULT_BACKUP_DIR.into()),
            onedrive_access_token: env::var("ONEDRIVE_ACCESS_TOKEN")
                .ok()
                .filter(|s| !s.is_empty()),
            webdav_url: env::var("WEBDAV_URL").ok().filter(|s| !s.is_empty()),
            webdav_username: env::var("WEBDAV_USERNAME").ok().filter(|s| !s.is_empty()),
            webdav_password: env::var("WEBDAV_PASSWORD").ok().filter(|s| !s.is_empty()),
        })
    }

    /// True when the price feed token is configured.
    pub fn has_feed(&self) -> bool {
        self.feed_token.is_some()
    }

    /// True when all WebDAV credentials are configured.
    pub fn has_webdav(&self) -> bool {
        self.webdav_url.is_some()
            && self.webdav_username.is_some()
            && self.webdav_password.is_some()
    }

    /// True when the OneDrive access token is configured.
    pub fn has_onedrive(&self) -> bool {
        self.onedrive_access_token.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_target_parsing() {
        assert_eq!(BackupTarget::from_str("webdav"), BackupTarget::WebDav);
        assert_eq!(BackupTarget::from_str("WebDAV"), BackupTarget::WebDav);
        assert_eq!(BackupTarget::from_str("onedrive"), BackupTarget::OneDrive);
        // Unknown tags fall back to the cloud-drive default.
        assert_eq!(BackupTarget::from_str(""), BackupTarget::OneDrive);
    }
}

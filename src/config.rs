use crate::core::{Result, SyncError};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:3001/api";

pub const ENV_API_URL: &str = "GARAGESYNC_API_URL";
pub const ENV_AUTH_TOKEN: &str = "GARAGESYNC_AUTH_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "GARAGESYNC_TIMEOUT_SECS";
pub const ENV_STORAGE_DIR: &str = "GARAGESYNC_STORAGE_DIR";

/// Client configuration: where the backend lives and where local snapshots go.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the REST API, without trailing slash
    pub api_url: String,

    /// Bearer token forwarded on every request
    pub auth_token: Option<String>,

    /// Whole-request timeout; the only timeout a mutation is subject to
    pub request_timeout: Duration,

    /// TCP connect timeout
    pub connect_timeout: Duration,

    /// Directory for the file-backed Local Store (in-memory when unset)
    pub storage_dir: Option<PathBuf>,
}

impl SyncConfig {
    pub fn new(api_url: &str) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            auth_token: None,
            request_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            storage_dir: None,
        }
    }

    /// Set the bearer token
    pub fn auth_token(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_string());
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Persist local snapshots under `dir`
    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Build from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source; unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut config = match value(ENV_API_URL) {
            Some(url) => Self::new(url.trim()),
            None => Self::default(),
        };
        if let Some(token) = value(ENV_AUTH_TOKEN) {
            config = config.auth_token(token.trim());
        }
        if let Some(raw) = value(ENV_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                SyncError::Config(format!("{} must be a whole number of seconds", ENV_TIMEOUT_SECS))
            })?;
            let timeout = Duration::from_secs(secs);
            let connect = config.connect_timeout.min(timeout);
            config = config.connect_timeout(connect).request_timeout(timeout);
        }
        if let Some(dir) = value(ENV_STORAGE_DIR) {
            config = config.storage_dir(dir.trim());
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_url.is_empty() {
            return Err(SyncError::Config("api_url cannot be empty".to_string()));
        }

        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(SyncError::Config(
                "api_url must start with 'http://' or 'https://'".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(SyncError::Config("request_timeout must be > 0".to_string()));
        }

        if self.connect_timeout > self.request_timeout {
            return Err(SyncError::Config(
                "connect_timeout cannot exceed request_timeout".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(config.storage_dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = SyncConfig::new("https://garage.example.com/api/")
            .auth_token("t0k3n")
            .request_timeout(Duration::from_secs(30))
            .storage_dir("/var/lib/garagesync");

        assert_eq!(config.api_url, "https://garage.example.com/api");
        assert_eq!(config.auth_token.as_deref(), Some("t0k3n"));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(
            config.storage_dir,
            Some(PathBuf::from("/var/lib/garagesync"))
        );
    }

    #[test]
    fn test_from_lookup() {
        let config = SyncConfig::from_lookup(lookup(&[
            (ENV_API_URL, "http://10.0.0.5:8080/api"),
            (ENV_TIMEOUT_SECS, "20"),
            (ENV_AUTH_TOKEN, "  "),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "http://10.0.0.5:8080/api");
        assert_eq!(config.request_timeout, Duration::from_secs(20));
        assert_eq!(config.auth_token, None);
    }

    #[test]
    fn test_short_timeout_caps_connect_timeout() {
        let config = SyncConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "2")])).unwrap();
        assert_eq!(config.request_timeout, Duration::from_secs(2));
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_from_lookup_rejects_bad_timeout() {
        let err = SyncConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "soon")])).unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }

    #[test]
    fn test_validate() {
        assert!(SyncConfig::new("").validate().is_err());
        assert!(SyncConfig::new("ftp://files").validate().is_err());
        assert!(
            SyncConfig::default()
                .request_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
        assert!(
            SyncConfig::default()
                .connect_timeout(Duration::from_secs(60))
                .validate()
                .is_err()
        );
    }
}

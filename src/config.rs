//! Runtime configuration loaded from the environment.
//!
//! `.env` is loaded by `main` before this runs, so every value here can come
//! from either the process environment or the dotenv file.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::warn;

use crate::schema::DriveFolder;

pub const DEFAULT_API_URL: &str = "http://localhost:5002/api";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5002";

const DEFAULT_DASHBOARD_REFRESH_SECS: u64 = 30;
const DEFAULT_LOGS_REFRESH_SECS: u64 = 10;
const DEFAULT_TRIGGER_REFRESH_SECS: u64 = 3;

#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Base URL of the admin REST API, without trailing slash.
    pub api_url: String,
    /// Listen address of the reference backend, checked by [`AdminConfig::bind_addr`]
    /// so client commands never fail on it.
    pub bind: String,
    pub dashboard_refresh: Duration,
    pub logs_refresh: Duration,
    /// Delay before re-fetching after a manual trigger.
    pub trigger_refresh: Duration,
    /// Folders exposed by the reference backend's `/drive/folders`.
    pub drive_folders: Vec<DriveFolder>,
}

impl AdminConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_url = get("AUTOPOST_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let bind = get("AUTOPOST_BIND").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let secs = |key: &str, default: u64| -> Duration {
            let value = match get(key) {
                Some(raw) => match raw.trim().parse::<u64>() {
                    Ok(v) if v > 0 => v,
                    _ => {
                        warn!("Ignoring invalid {}={:?}, using {}s", key, raw, default);
                        default
                    }
                },
                None => default,
            };
            Duration::from_secs(value)
        };

        Ok(Self {
            api_url,
            bind,
            dashboard_refresh: secs(
                "AUTOPOST_DASHBOARD_REFRESH_SECS",
                DEFAULT_DASHBOARD_REFRESH_SECS,
            ),
            logs_refresh: secs("AUTOPOST_LOGS_REFRESH_SECS", DEFAULT_LOGS_REFRESH_SECS),
            trigger_refresh: secs(
                "AUTOPOST_TRIGGER_REFRESH_SECS",
                DEFAULT_TRIGGER_REFRESH_SECS,
            ),
            drive_folders: get("AUTOPOST_DRIVE_FOLDERS")
                .map(|raw| parse_drive_folders(&raw))
                .unwrap_or_default(),
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind
            .trim()
            .parse()
            .with_context(|| format!("AUTOPOST_BIND is not a socket address: {}", self.bind))
    }

    /// Replace the API URL (from `--api-url`).
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Parse `id=name,id=name`. Entries without `=` use the id as name.
fn parse_drive_folders(raw: &str) -> Vec<DriveFolder> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((id, name)) => DriveFolder {
                id: id.trim().to_string(),
                name: name.trim().to_string(),
            },
            None => DriveFolder {
                id: entry.to_string(),
                name: entry.to_string(),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AdminConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AdminConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.api_url, "http://localhost:5002/api");
        assert_eq!(config.bind_addr().unwrap().port(), 5002);
        assert_eq!(config.dashboard_refresh, Duration::from_secs(30));
        assert_eq!(config.logs_refresh, Duration::from_secs(10));
        assert_eq!(config.trigger_refresh, Duration::from_secs(3));
        assert!(config.drive_folders.is_empty());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("AUTOPOST_API_URL", "https://admin.example.com/api/"),
            ("AUTOPOST_BIND", "127.0.0.1:8080"),
            ("AUTOPOST_LOGS_REFRESH_SECS", "5"),
            ("AUTOPOST_DASHBOARD_REFRESH_SECS", "zero"),
            ("AUTOPOST_DRIVE_FOLDERS", "f1=Memes, f2 = News ,f3"),
        ])
        .unwrap();
        assert_eq!(config.api_url, "https://admin.example.com/api");
        assert_eq!(config.bind_addr().unwrap().port(), 8080);
        assert_eq!(config.logs_refresh, Duration::from_secs(5));
        assert_eq!(config.dashboard_refresh, Duration::from_secs(30));
        assert_eq!(config.drive_folders.len(), 3);
        assert_eq!(config.drive_folders[1].name, "News");
        assert_eq!(config.drive_folders[2].name, "f3");
    }

    #[test]
    fn test_empty_url_falls_back() {
        let config = config_from(&[("AUTOPOST_API_URL", "  ")]).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_bad_bind_only_fails_serving() {
        let config = config_from(&[("AUTOPOST_BIND", "not-an-addr")]).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        let err = config.bind_addr().unwrap_err();
        assert!(err.to_string().contains("not-an-addr"));
    }

    #[test]
    fn test_with_api_url_trims() {
        let config = config_from(&[]).unwrap().with_api_url("http://x/api/");
        assert_eq!(config.api_url, "http://x/api");
    }
}

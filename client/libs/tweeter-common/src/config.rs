//! Environment-driven client configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ClientError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub feed: FeedConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the hosted backend, e.g. `https://xyz.example.co`
    pub url: String,
    /// Public API key sent as `apikey` on every request
    pub anon_key: String,
    #[serde(default = "default_posts_table")]
    pub posts_table: String,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
    /// Use the in-memory backend instead of the hosted one
    #[serde(default)]
    pub offline: bool,
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// How a refresh treats posts still waiting for backend confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPolicy {
    /// Keep in-flight pending posts at the front of the refreshed list
    #[default]
    MergePending,
    /// Replace the list wholesale, dropping in-flight pending posts
    Replace,
}

impl FromStr for RefreshPolicy {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge_pending" | "merge" => Ok(Self::MergePending),
            "replace" => Ok(Self::Replace),
            other => Err(ClientError::Config(format!(
                "unknown refresh policy '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub refresh_policy: RefreshPolicy,
    /// Stable-sort fetched posts by `created_at` descending
    #[serde(default)]
    pub sort_fallback: bool,
}

impl FeedConfig {
    /// Shortest interval the poller accepts
    pub const MIN_POLL_INTERVAL_SECS: u64 = 1;

    /// Poll period, never shorter than [`Self::MIN_POLL_INTERVAL_SECS`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(Self::MIN_POLL_INTERVAL_SECS))
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            refresh_policy: RefreshPolicy::default(),
            sort_fallback: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            email: None,
            password: None,
        }
    }
}

impl Config {
    /// Load from process environment, reading `.env` first when present
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let offline = parse_or(&lookup, "TWEETER_OFFLINE", false)?;

        let required = |key: &str| -> Result<String> {
            match lookup(key) {
                Some(v) if !v.trim().is_empty() => Ok(v),
                _ if offline => Ok(String::new()),
                _ => Err(ClientError::Config(format!("{} is not set", key))),
            }
        };

        let poll_interval_secs =
            parse_or(&lookup, "TWEETER_POLL_INTERVAL_SECS", default_poll_interval_secs())?;
        if poll_interval_secs == 0 {
            return Err(ClientError::Config(
                "TWEETER_POLL_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(Config {
            backend: BackendConfig {
                url: required("TWEETER_BACKEND_URL")?
                    .trim_end_matches('/')
                    .to_string(),
                anon_key: required("TWEETER_ANON_KEY")?,
                posts_table: lookup("TWEETER_POSTS_TABLE").unwrap_or_else(default_posts_table),
                timeout_secs: parse_or(
                    &lookup,
                    "TWEETER_HTTP_TIMEOUT_SECS",
                    default_http_timeout_secs(),
                )?,
                offline,
            },
            feed: FeedConfig {
                poll_interval_secs,
                refresh_policy: parse_or(
                    &lookup,
                    "TWEETER_REFRESH_POLICY",
                    RefreshPolicy::default(),
                )?,
                sort_fallback: parse_or(&lookup, "TWEETER_SORT_FALLBACK", false)?,
            },
            session: SessionConfig {
                storage_path: lookup("TWEETER_STORAGE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or_else(default_storage_path),
                email: lookup("TWEETER_EMAIL"),
                password: lookup("TWEETER_PASSWORD"),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| ClientError::Config(format!("invalid {}='{}': {}", key, raw, e))),
        None => Ok(default),
    }
}

fn default_posts_table() -> String {
    "Tweets".to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(".tweeter/storage.json")
}

// frontend/src/config.rs
//
// Client configuration:
//  - JSON file ($GCS_CLIENT_CONFIG or <config dir>/gcs/client.json)
//  - GCS_WS_URL env override
//  - CLI override applied by the binary

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::ClientError;

pub const DEFAULT_WS_URL: &str = "ws://localhost:8765";
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 3_000;

const CONFIG_PATH_ENV: &str = "GCS_CLIENT_CONFIG";
const WS_URL_ENV: &str = "GCS_WS_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub url: String,
    pub reconnect_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WS_URL.to_string(),
            reconnect_delay_ms: DEFAULT_RECONNECT_DELAY_MS,
        }
    }
}

impl ClientConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return PathBuf::from(path);
        }
        let mut base = dirs::config_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| ".".into()));
        base.push("gcs");
        base.push("client.json");
        base
    }

    /// Reads the file at `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ClientError> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no config at {path:?}, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };

        let cfg: ClientConfig = serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::Config(format!("invalid config {path:?}: {e}")))?;
        cfg.validated()
    }

    /// File, then `GCS_WS_URL`.
    pub fn load() -> Result<Self, ClientError> {
        let mut cfg = Self::load_from(&Self::default_path())?;
        if let Ok(url) = std::env::var(WS_URL_ENV)
            && !url.trim().is_empty()
        {
            cfg = cfg.with_url(&url)?;
        }
        Ok(cfg)
    }

    pub fn with_url(mut self, url: &str) -> Result<Self, ClientError> {
        self.url = url.to_string();
        self.validated()
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ClientError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(self)
            .map_err(|e| ClientError::Config(format!("cannot encode config: {e}")))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn validated(mut self) -> Result<Self, ClientError> {
        self.url = normalize_ws_url(&self.url)?;
        if self.reconnect_delay_ms == 0 {
            return Err(ClientError::Config(
                "reconnect_delay_ms must be greater than zero".into(),
            ));
        }
        Ok(self)
    }
}

/// Maps http(s) to ws(s), adds `ws://` to a bare host, drops any fragment.
pub fn normalize_ws_url(raw: &str) -> Result<String, ClientError> {
    let raw = raw.trim();
    let raw = match raw.find('#') {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    if raw.is_empty() {
        return Err(ClientError::Config("empty WebSocket URL".into()));
    }

    let with_scheme = if let Some(rest) = raw.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = raw.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if raw.starts_with("wss://") || raw.starts_with("ws://") {
        raw.to_string()
    } else if raw.contains("://") {
        return Err(ClientError::Config(format!(
            "unsupported scheme in {raw:?} (expected ws, wss, http or https)"
        )));
    } else {
        format!("ws://{raw}")
    };

    let parsed = Url::parse(&with_scheme)
        .map_err(|e| ClientError::Config(format!("invalid WebSocket URL {raw:?}: {e}")))?;
    if parsed.host_str().is_none() {
        return Err(ClientError::Config(format!("{raw:?} has no host")));
    }
    Ok(with_scheme)
}

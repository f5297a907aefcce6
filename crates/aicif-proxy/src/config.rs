use std::net::SocketAddr;
use std::time::Duration;

use aicif_common::error::env_parse;
use reqwest::Url;

use crate::error::ProxyError;

/// Proxy configuration loaded explicitly from environment variables.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub listen: SocketAddr,
    /// Mount point, always with a leading and no trailing slash.
    pub prefix: String,
    pub target: Url,
    pub strip_prefix: bool,
    pub timeout: Option<Duration>,
    pub max_body_bytes: usize,
}

pub const DEFAULT_PREFIX: &str = "/.netlify/functions/app";
pub const DEFAULT_TARGET: &str = "http://localhost:5000";
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

impl ProxyConfig {
    /// Defaults for everything but the upstream.
    pub fn new(target: Url) -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8888)),
            prefix: DEFAULT_PREFIX.to_string(),
            target,
            strip_prefix: true,
            timeout: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Optional:
    /// - `AICIF_PROXY_LISTEN` (default: "0.0.0.0:8888")
    /// - `AICIF_PROXY_PREFIX` (default: "/.netlify/functions/app")
    /// - `AICIF_PROXY_TARGET` (default: "http://localhost:5000")
    /// - `AICIF_PROXY_STRIP_PREFIX` (default: true)
    /// - `AICIF_PROXY_TIMEOUT_SECS` (default: no timeout)
    /// - `AICIF_PROXY_MAX_BODY_BYTES` (default: 2 MiB)
    pub fn from_env() -> Result<Self, ProxyError> {
        let target = parse_target(
            &std::env::var("AICIF_PROXY_TARGET").unwrap_or_else(|_| DEFAULT_TARGET.to_string()),
        )?;
        let defaults = Self::new(target);

        let listen = env_parse::<SocketAddr>("AICIF_PROXY_LISTEN")?.unwrap_or(defaults.listen);
        let prefix = match std::env::var("AICIF_PROXY_PREFIX") {
            Ok(raw) => normalize_prefix(&raw),
            Err(_) => defaults.prefix,
        };
        let strip_prefix =
            env_parse::<bool>("AICIF_PROXY_STRIP_PREFIX")?.unwrap_or(defaults.strip_prefix);
        let timeout = env_parse::<u64>("AICIF_PROXY_TIMEOUT_SECS")?.map(Duration::from_secs);
        let max_body_bytes =
            env_parse::<usize>("AICIF_PROXY_MAX_BODY_BYTES")?.unwrap_or(defaults.max_body_bytes);

        Ok(Self {
            listen,
            prefix,
            target: defaults.target,
            strip_prefix,
            timeout,
            max_body_bytes,
        })
    }
}

/// `"app/"` and `"/app"` both become `"/app"`; an empty prefix mounts at the root.
pub fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

pub fn parse_target(raw: &str) -> Result<Url, ProxyError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ProxyError::Config(format!("AICIF_PROXY_TARGET is not a valid URL: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ProxyError::Config(format!(
            "AICIF_PROXY_TARGET must be an http(s) URL with a host: {raw}"
        )));
    }
    Ok(url)
}

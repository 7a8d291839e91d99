use std::{env, fs, net::SocketAddr, path::Path, time::Duration};

use crate::{errors::Error, Result};

pub const DEFAULT_BASE_DOMAIN: &str = "https://open.feishu.cn";
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_EVENT_PATH: &str = "/webhook/event";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Typed configuration, read from the environment (and an optional `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    // Credentials
    pub app_id: String,
    pub app_secret: String,

    // Open Platform
    pub base_domain: String,
    pub request_timeout: Duration,

    // Webhook event source
    pub listen_addr: SocketAddr,
    pub event_path: String,
    pub verification_token: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        // Required env vars
        let app_id = get("APP_ID")
            .ok_or_else(|| Error::Config("APP_ID environment variable is required".to_string()))?;
        let app_secret = get("APP_SECRET").ok_or_else(|| {
            Error::Config("APP_SECRET environment variable is required".to_string())
        })?;

        let base_domain = get("BASE_DOMAIN")
            .unwrap_or_else(|| DEFAULT_BASE_DOMAIN.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();
        if !base_domain.starts_with("http://") && !base_domain.starts_with("https://") {
            return Err(Error::Config(format!(
                "BASE_DOMAIN must be an http(s) URL, got {base_domain}"
            )));
        }

        let request_timeout_ms = match get("REQUEST_TIMEOUT_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|ms| *ms > 0)
                .ok_or_else(|| {
                    Error::Config(format!(
                        "REQUEST_TIMEOUT_MS must be a positive integer, got {raw}"
                    ))
                })?,
            None => DEFAULT_REQUEST_TIMEOUT_MS,
        };

        let listen_raw = get("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| Error::Config(format!("LISTEN_ADDR {listen_raw:?} is invalid: {e}")))?;

        let mut event_path = get("EVENT_PATH").unwrap_or_else(|| DEFAULT_EVENT_PATH.to_string());
        if !event_path.starts_with('/') {
            event_path.insert(0, '/');
        }

        Ok(Self {
            app_id,
            app_secret,
            base_domain,
            request_timeout: Duration::from_millis(request_timeout_ms),
            listen_addr,
            event_path,
            verification_token: get("VERIFICATION_TOKEN"),
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

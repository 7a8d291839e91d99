//! Lark Open Platform HTTP client.
//!
//! Every API answers with a `{code, msg, data}` envelope; `code == 0` is the only
//! success. Calls authenticate with a tenant access token that is cached until
//! shortly before it expires.

use std::time::{Duration, Instant};

use reqwest::{header::HeaderMap, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tokio::sync::Mutex;

use ltb_core::{config::Config, errors::Error, Result};

const TENANT_TOKEN_PATH: &str = "/open-apis/auth/v3/tenant_access_token/internal";
const LOG_ID_HEADER: &str = "x-tt-logid";
/// Codes Lark returns for an expired or revoked tenant token.
const INVALID_TOKEN_CODES: [i64; 3] = [99991661, 99991663, 99991668];

#[derive(Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_valid(&self) -> bool {
        let refresh_skew = Duration::from_secs(60);
        self.expires_at > Instant::now() + refresh_skew
    }
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    app_id: &'a str,
    app_secret: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    tenant_access_token: String,
    #[serde(default)]
    expire: u64,
}

#[derive(Deserialize)]
struct Envelope<D> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<D>,
}

/// A successful API answer.
#[derive(Debug)]
pub struct ApiResponse<D> {
    pub data: Option<D>,
    pub log_id: Option<String>,
}

pub struct LarkClient {
    http: reqwest::Client,
    base_domain: String,
    app_id: String,
    app_secret: String,
    token: Mutex<Option<CachedToken>>,
}

impl LarkClient {
    pub fn new(cfg: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .build()
            .map_err(|e| Error::Config(format!("http client build failed: {e}")))?;
        Ok(Self {
            http,
            base_domain: cfg.base_domain.clone(),
            app_id: cfg.app_id.clone(),
            app_secret: cfg.app_secret.clone(),
            token: Mutex::new(None),
        })
    }

    /// Build an API URL from a fixed `path` plus `segments`, each appended as a
    /// single percent-encoded path segment.
    pub fn api_url(&self, path: &str, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_domain, path))
            .map_err(|e| Error::Config(format!("invalid lark url: {e}")))?;
        if segments.is_empty() {
            return Ok(url);
        }
        if let Some(bad) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(Error::External(format!("invalid path segment {bad:?}")));
        }
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("lark url cannot take a path: {path}")))?
            .extend(segments);
        Ok(url)
    }

    async fn tenant_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        if let Some(cached) = guard.as_ref() {
            if cached.is_valid() {
                return Ok(cached.token.clone());
            }
        }

        let resp = self
            .http
            .post(self.api_url(TENANT_TOKEN_PATH, &[])?)
            .json(&TokenRequest {
                app_id: &self.app_id,
                app_secret: &self.app_secret,
            })
            .send()
            .await
            .map_err(|e| Error::Transport(format!("lark token request error: {e}")))?;
        let log_id = log_id(resp.headers());
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::Transport(format!("lark token read error: {e}")))?;

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            Error::Transport(format!(
                "lark token response invalid ({status}): {e}: {}",
                preview(&body)
            ))
        })?;
        if parsed.code != 0 {
            return Err(Error::Rejected {
                code: parsed.code,
                msg: parsed.msg,
                log_id,
            });
        }
        if parsed.tenant_access_token.is_empty() {
            return Err(Error::Transport(
                "lark token response carried no tenant_access_token".to_string(),
            ));
        }

        let ttl = parsed.expire.max(120);
        let cached = CachedToken {
            token: parsed.tenant_access_token,
            expires_at: Instant::now() + Duration::from_secs(ttl),
        };
        let token = cached.token.clone();
        *guard = Some(cached);
        Ok(token)
    }

    async fn forget_token(&self) {
        *self.token.lock().await = None;
    }

    /// POST a JSON body to an Open Platform API path.
    pub async fn post<B, D>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<ApiResponse<D>>
    where
        B: Serialize + ?Sized,
        D: DeserializeOwned,
    {
        self.post_url(self.api_url(path, &[])?, query, body).await
    }

    /// POST a JSON body to a URL built with [`LarkClient::api_url`].
    pub async fn post_url<B, D>(
        &self,
        url: Url,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<ApiResponse<D>>
    where
        B: Serialize + ?Sized,
        D: DeserializeOwned,
    {
        let token = self.tenant_token().await?;
        let resp = self
            .http
            .post(url)
            .query(query)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("lark request error: {e}")))?;

        let log_id = log_id(resp.headers());
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| Error::Transport(format!("lark response read error: {e}")))?;

        let res = interpret_response(status, log_id, &text);
        if let Err(Error::Rejected { code, .. }) = &res {
            if INVALID_TOKEN_CODES.contains(code) {
                self.forget_token().await;
            }
        }
        res
    }
}

fn log_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(LOG_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}

/// Map a raw HTTP answer onto success, platform rejection or transport failure.
///
/// Lark reports most failures as a JSON envelope even with a 4xx status, so the
/// envelope takes precedence over the status code.
pub(crate) fn interpret_response<D: DeserializeOwned>(
    status: StatusCode,
    log_id: Option<String>,
    body: &str,
) -> Result<ApiResponse<D>> {
    match serde_json::from_str::<Envelope<D>>(body) {
        Ok(env) if env.code == 0 => Ok(ApiResponse {
            data: env.data,
            log_id,
        }),
        Ok(env) => Err(Error::Rejected {
            code: env.code,
            msg: env.msg,
            log_id,
        }),
        Err(e) if status.is_success() => Err(Error::Transport(format!(
            "lark response invalid: {e}: {}",
            preview(body)
        ))),
        Err(_) => Err(Error::Transport(format!(
            "lark http {status}: {}",
            preview(body)
        ))),
    }
}

use std::time::Duration;

/// Core error type for the task bot.
///
/// Adapter crates map their transport-specific failures into this type so the
/// router can tell a platform rejection (reported in the reply text) apart from
/// a failure that must be propagated to the event source.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The platform answered, but with a non-zero status code.
    #[error("request rejected: code {code}, msg {msg}{}", log_suffix(.log_id))]
    Rejected {
        code: i64,
        msg: String,
        log_id: Option<String>,
    },

    /// The request never produced a platform answer (network, decode, auth).
    #[error("transport error: {0}")]
    Transport(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("cancelled")]
    Cancelled,

    #[error("external error: {0}")]
    External(String),
}

fn log_suffix(log_id: &Option<String>) -> String {
    match log_id {
        Some(id) => format!(", log_id {id}"),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;

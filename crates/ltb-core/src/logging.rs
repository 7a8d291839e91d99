use crate::{errors::Error, Result};

/// Directives used when `RUST_LOG` is unset: info for our crates, warn for
/// everything else.
fn default_filter(service_name: &str) -> String {
    format!("warn,ltb_core=info,ltb_lark=info,{service_name}=info")
}

/// Initialize tracing for the bot.
///
/// Can be overridden with `RUST_LOG`.
pub fn init(service_name: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(service_name)));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .try_init()
        .map_err(|e| Error::Config(format!("logging init failed: {e}")))
}

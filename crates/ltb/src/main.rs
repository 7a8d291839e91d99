use std::sync::Arc;

use ltb_core::{config::Config, router::MessageRouter};
use ltb_lark::{LarkClient, LarkMessenger, LarkTaskBackend};

#[tokio::main]
async fn main() -> Result<(), ltb_core::Error> {
    ltb_core::logging::init("ltb")?;

    let cfg = Arc::new(Config::load()?);

    let client = Arc::new(LarkClient::new(&cfg)?);
    let router = Arc::new(MessageRouter::new(
        Arc::new(LarkTaskBackend::new(client.clone())),
        Arc::new(LarkMessenger::new(client)),
    ));

    tracing::info!(app_id = %cfg.app_id, base = %cfg.base_domain, "task bot starting");

    ltb_lark::server::run_webhook(cfg, router)
        .await
        .map_err(|e| ltb_core::Error::External(format!("webhook server failed: {e}")))?;

    Ok(())
}

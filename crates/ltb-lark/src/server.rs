//! Webhook event source: receives Lark callbacks and hands each message to the
//! core router on its own task.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_util::{sync::CancellationToken, task::TaskTracker};

use ltb_core::{config::Config, context::CallContext, router::MessageRouter};

use crate::events::{self, Callback};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub router: Arc<MessageRouter>,
    /// Root token; every event runs under a child of it.
    pub shutdown: CancellationToken,
    pub tasks: TaskTracker,
}

impl AppState {
    pub fn new(cfg: Arc<Config>, router: Arc<MessageRouter>) -> Self {
        Self {
            cfg,
            router,
            shutdown: CancellationToken::new(),
            tasks: TaskTracker::new(),
        }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route(&state.cfg.event_path, post(handle_callback))
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn run_webhook(cfg: Arc<Config>, router: Arc<MessageRouter>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(cfg.listen_addr).await?;
    tracing::info!(
        addr = %cfg.listen_addr,
        path = %cfg.event_path,
        "ltb webhook listening"
    );

    let state = Arc::new(AppState::new(cfg, router));
    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
        }
        shutdown.cancel();
    });

    serve(listener, state).await
}

/// Serve callbacks on `listener` until the state's shutdown token fires, then
/// wait for in-flight events (which observe the same cancellation).
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> anyhow::Result<()> {
    let shutdown = state.shutdown.clone();
    let tasks = state.tasks.clone();

    axum::serve(listener, app(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    tasks.close();
    tasks.wait().await;
    Ok(())
}

async fn handle_callback(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let callback = match events::decode(&body) {
        Ok(cb) => cb,
        Err(e) => {
            tracing::warn!("rejecting callback: {e}");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    if !callback.is_authentic(state.cfg.verification_token.as_deref()) {
        tracing::warn!("rejecting callback with wrong verification token");
        return StatusCode::UNAUTHORIZED.into_response();
    }

    match callback {
        Callback::UrlVerification { challenge, .. } => {
            Json(json!({ "challenge": challenge })).into_response()
        }
        Callback::Ignored { event_type, .. } => {
            tracing::debug!(event_type = %event_type, "ignoring event");
            Json(json!({})).into_response()
        }
        Callback::Message {
            event_id, message, ..
        } => {
            // Lark expects an answer within seconds; process off the request path.
            let router = state.router.clone();
            let ctx = CallContext::new(state.shutdown.child_token(), state.cfg.request_timeout);
            state.tasks.spawn(async move {
                if let Err(e) = router.dispatch(&message, &ctx).await {
                    tracing::error!(
                        event_id = %event_id,
                        message_id = %message.message_id,
                        "event handling failed: {e}"
                    );
                }
            });
            Json(json!({})).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{spawn_mock, test_config, MockLark};
    use crate::{LarkClient, LarkMessenger, LarkTaskBackend};
    use std::time::Duration;

    struct Running {
        url: String,
        state: Arc<AppState>,
        handle: tokio::task::JoinHandle<anyhow::Result<()>>,
    }

    async fn start(mock: Arc<MockLark>, extra: &[(&str, &str)]) -> Running {
        let base = spawn_mock(mock).await;
        let cfg = Arc::new(test_config(&base, extra));
        let client = Arc::new(LarkClient::new(&cfg).unwrap());
        let router = Arc::new(MessageRouter::new(
            Arc::new(LarkTaskBackend::new(client.clone())),
            Arc::new(LarkMessenger::new(client)),
        ));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!(
            "http://{}{}",
            listener.local_addr().unwrap(),
            cfg.event_path
        );
        let state = Arc::new(AppState::new(cfg, router));
        let handle = tokio::spawn(serve(listener, state.clone()));
        Running { url, state, handle }
    }

    impl Running {
        async fn stop(self) {
            self.state.shutdown.cancel();
            self.handle.await.unwrap().unwrap();
        }
    }

    fn message_event(chat_type: &str, text: &str) -> serde_json::Value {
        json!({
            "schema": "2.0",
            "header": {
                "event_id": "ev_1",
                "event_type": "im.message.receive_v1",
                "token": "tok"
            },
            "event": {
                "message": {
                    "message_id": "om_in",
                    "chat_id": "oc_in",
                    "chat_type": chat_type,
                    "message_type": "text",
                    "content": json!({ "text": text }).to_string()
                }
            }
        })
    }

    async fn wait_for(mock: &MockLark, prefix: &str, n: usize) -> Vec<crate::testing::Recorded> {
        for _ in 0..100 {
            let reqs = mock.requests_to(prefix);
            if reqs.len() >= n {
                return reqs;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("no request to {prefix} arrived");
    }

    #[tokio::test]
    async fn url_verification_is_answered() {
        let running = start(Arc::new(MockLark::default()), &[]).await;

        let resp: serde_json::Value = reqwest::Client::new()
            .post(&running.url)
            .json(&json!({ "challenge": "c-1", "token": "tok", "type": "url_verification" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(resp, json!({ "challenge": "c-1" }));

        running.stop().await;
    }

    #[tokio::test]
    async fn direct_message_creates_task_and_sends_to_chat() {
        let mock = Arc::new(MockLark::default());
        let running = start(mock.clone(), &[]).await;

        let resp = reqwest::Client::new()
            .post(&running.url)
            .json(&message_event("p2p", "创建任务: 写报告"))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());

        let sent = wait_for(&mock, "/open-apis/im/v1/messages", 1).await;
        let tasks = mock.requests_to("/open-apis/task/v2/tasks");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].body["summary"], "写报告");
        assert!(tasks[0].body["description"]
            .as_str()
            .unwrap()
            .contains("om_in"));

        assert_eq!(sent[0].body["receive_id"], "oc_in");
        let content: serde_json::Value =
            serde_json::from_str(sent[0].body["content"].as_str().unwrap()).unwrap();
        let text = content["text"].as_str().unwrap();
        assert!(text.contains("✅"));
        assert!(text.contains("写报告"));

        running.stop().await;
    }

    #[tokio::test]
    async fn group_message_gets_threaded_failure_reply() {
        let mock = Arc::new(MockLark {
            task_code: 1470400,
            ..MockLark::default()
        });
        let running = start(mock.clone(), &[]).await;

        reqwest::Client::new()
            .post(&running.url)
            .json(&message_event("group", "create task: Ship"))
            .send()
            .await
            .unwrap();

        let replies = wait_for(&mock, "/open-apis/im/v1/messages/om_in/reply", 1).await;
        let content: serde_json::Value =
            serde_json::from_str(replies[0].body["content"].as_str().unwrap()).unwrap();
        assert_eq!(
            content["text"],
            "❌ 创建任务失败 / Failed to create task: mock failure"
        );

        running.stop().await;
    }

    #[tokio::test]
    async fn wrong_token_and_bad_body_are_refused() {
        let mock = Arc::new(MockLark::default());
        let running = start(mock.clone(), &[("VERIFICATION_TOKEN", "expected")]).await;
        let http = reqwest::Client::new();

        let resp = http
            .post(&running.url)
            .json(&message_event("p2p", "create task: x"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);

        let resp = http
            .post(&running.url)
            .body("not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

        running.stop().await;
        assert!(mock.requests.lock().unwrap().is_empty());
    }
}

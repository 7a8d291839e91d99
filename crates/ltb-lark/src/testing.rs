//! In-process stand-in for the Lark Open Platform used by adapter tests.

use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use ltb_core::config::Config;

#[derive(Clone, Debug)]
pub struct Recorded {
    pub path: String,
    pub query: HashMap<String, String>,
    pub auth: Option<String>,
    pub body: Value,
}

#[derive(Default)]
pub struct MockLark {
    pub task_code: i64,
    pub message_code: i64,
    pub requests: Mutex<Vec<Recorded>>,
    pub token_calls: Mutex<usize>,
}

impl MockLark {
    pub fn requests_to(&self, prefix: &str) -> Vec<Recorded> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path.starts_with(prefix))
            .cloned()
            .collect()
    }

    fn record(
        &self,
        path: String,
        query: HashMap<String, String>,
        headers: &HeaderMap,
        body: Value,
    ) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        self.requests.lock().unwrap().push(Recorded {
            path,
            query,
            auth,
            body,
        });
    }
}

fn envelope(code: i64, data: Value) -> Response {
    let body = if code == 0 {
        json!({ "code": 0, "msg": "success", "data": data })
    } else {
        json!({ "code": code, "msg": "mock failure" })
    };
    let mut resp = Json(body).into_response();
    resp.headers_mut()
        .insert("x-tt-logid", HeaderValue::from_static("mock-log-id"));
    resp
}

async fn token(State(mock): State<Arc<MockLark>>) -> Json<Value> {
    *mock.token_calls.lock().unwrap() += 1;
    Json(json!({
        "code": 0,
        "msg": "ok",
        "tenant_access_token": "t-mock",
        "expire": 7200
    }))
}

async fn create_task(
    State(mock): State<Arc<MockLark>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    mock.record(
        "/open-apis/task/v2/tasks".to_string(),
        HashMap::new(),
        &headers,
        body,
    );
    envelope(mock.task_code, json!({ "task": { "guid": "guid-1" } }))
}

async fn send_message(
    State(mock): State<Arc<MockLark>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    mock.record("/open-apis/im/v1/messages".to_string(), query, &headers, body);
    envelope(mock.message_code, json!({ "message_id": "om_sent" }))
}

async fn reply_message(
    State(mock): State<Arc<MockLark>>,
    Path(message_id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    mock.record(
        format!("/open-apis/im/v1/messages/{message_id}/reply"),
        HashMap::new(),
        &headers,
        body,
    );
    envelope(mock.message_code, json!({ "message_id": "om_reply" }))
}

/// Start the mock on an ephemeral port and return its base URL.
pub async fn spawn_mock(mock: Arc<MockLark>) -> String {
    let app = Router::new()
        .route(
            "/open-apis/auth/v3/tenant_access_token/internal",
            post(token),
        )
        .route("/open-apis/task/v2/tasks", post(create_task))
        .route("/open-apis/im/v1/messages", post(send_message))
        .route(
            "/open-apis/im/v1/messages/{message_id}/reply",
            post(reply_message),
        )
        .with_state(mock);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn test_config(base_domain: &str, extra: &[(&str, &str)]) -> Config {
    let mut pairs: HashMap<String, String> = [
        ("APP_ID", "cli_test"),
        ("APP_SECRET", "secret"),
        ("BASE_DOMAIN", base_domain),
        ("LISTEN_ADDR", "127.0.0.1:0"),
        ("REQUEST_TIMEOUT_MS", "2000"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in extra {
        pairs.insert(k.to_string(), v.to_string());
    }
    Config::from_lookup(|key: &str| pairs.get(key).cloned()).unwrap()
}

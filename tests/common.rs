#![allow(dead_code, clippy::unwrap_used, clippy::missing_panics_doc, unreachable_pub, missing_debug_implementations)]
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, Once};
use transcript_relay::AppBuilder;
use transcript_relay::config::Config;

pub const TEST_BOT_TOKEN: &str = "123456:TEST-token";
pub const TEST_CHAT_ID: &str = "-1001234567890";

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("transcript_relay=debug".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

/// In-process stand-in for the Bot API. Records every `sendMessage` payload and rejects
/// the calls whose 1-based number is in `fail_on`.
#[derive(Clone, Default)]
pub struct FakeTelegram {
    received: Arc<Mutex<Vec<Value>>>,
    fail_on: Arc<HashSet<usize>>,
}

impl FakeTelegram {
    pub async fn spawn() -> (Self, String) {
        Self::spawn_failing_on(&[]).await
    }

    pub async fn spawn_failing_on(calls: &[usize]) -> (Self, String) {
        let fake = Self { received: Arc::default(), fail_on: Arc::new(calls.iter().copied().collect()) };

        let router = Router::new()
            .route("/{bot}/sendMessage", post(send_message))
            .route("/{bot}/getMe", get(get_me))
            .with_state(fake.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        (fake, format!("http://{addr}"))
    }

    pub fn received(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }

    pub fn received_texts(&self) -> Vec<String> {
        self.received().iter().map(|v| v["text"].as_str().unwrap().to_string()).collect()
    }
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (StatusCode::UNAUTHORIZED, Json(json!({"ok": false, "error_code": 401, "description": "Unauthorized"})))
}

async fn send_message(
    State(fake): State<FakeTelegram>,
    Path(bot): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if bot != format!("bot{TEST_BOT_TOKEN}") {
        return unauthorized();
    }

    let call = {
        let mut received = fake.received.lock().unwrap();
        received.push(body);
        received.len()
    };

    if fake.fail_on.contains(&call) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"ok": false, "error_code": 400, "description": "Bad Request: can't parse entities"})),
        );
    }

    (StatusCode::OK, Json(json!({"ok": true, "result": {"message_id": call}})))
}

async fn get_me(Path(bot): Path<String>) -> (StatusCode, Json<Value>) {
    if bot != format!("bot{TEST_BOT_TOKEN}") {
        return unauthorized();
    }
    (StatusCode::OK, Json(json!({"ok": true, "result": {"id": 123_456, "is_bot": true, "first_name": "Relay"}})))
}

pub fn get_test_config(telegram_url: &str) -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.server.mgmt_port = 0;
    config.telegram.api_url = telegram_url.to_string();
    config.telegram.bot_token = TEST_BOT_TOKEN.to_string();
    config.telegram.chat_id = TEST_CHAT_ID.to_string();
    config.telegram.request_timeout_secs = 5;
    config.delivery.part_pause_ms = 0;
    config.health.timeout_ms = 1000;
    config.telemetry.otlp_endpoint = None;
    config
}

pub struct TestApp {
    pub server_url: String,
    pub mgmt_url: String,
    pub client: reqwest::Client,
    pub config: Config,
}

impl TestApp {
    /// Spawns the relay against `FakeTelegram` running at `telegram_url`.
    pub async fn spawn(telegram_url: &str) -> Self {
        Self::spawn_with_config(get_test_config(telegram_url)).await
    }

    pub async fn spawn_with_config(config: Config) -> Self {
        setup_tracing();

        let app = AppBuilder::new(config.clone()).build().unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app_router = app.app_router;
        tokio::spawn(async move {
            axum::serve(listener, app_router.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });

        let mgmt_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mgmt_addr = mgmt_listener.local_addr().unwrap();
        let mgmt_router = app.mgmt_router;
        tokio::spawn(async move {
            axum::serve(mgmt_listener, mgmt_router.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });

        Self {
            server_url: format!("http://{addr}"),
            mgmt_url: format!("http://{mgmt_addr}"),
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn submit_url(&self) -> String {
        format!("{}/api/telegram", self.server_url)
    }

    pub async fn submit(&self, body: Value) -> reqwest::Response {
        self.client.post(self.submit_url()).json(&body).send().await.unwrap()
    }
}

/// Strips the `(Part i/n)` label the relay appends to multi-part messages.
pub fn strip_part_label(text: &str) -> &str {
    text.rfind("\n\n(Part ").map_or(text, |pos| &text[..pos])
}

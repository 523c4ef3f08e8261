//! Integration tests for the connection lifecycle: one request in, exactly
//! one terminal outcome out, browser collaborator released on every path.

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use {
    async_trait::async_trait,
    futures::{SinkExt, StreamExt},
    tokio::net::{TcpListener, TcpStream},
    tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message},
};

use {
    cookiegate_browser::{BrowserError, CookieSource},
    cookiegate_config::ServerConfig,
    cookiegate_gateway::{server::build_app, state::GatewayState},
    cookiegate_protocol::CookiePair,
};

/// Scripted stand-in for the browser. Tracks acquire/release so tests can
/// assert the scoped-resource invariant without a real Chromium.
struct ScriptedSource {
    fail_with: Option<String>,
    cookies: Vec<CookiePair>,
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl ScriptedSource {
    fn returning(cookies: Vec<CookiePair>) -> Arc<Self> {
        Arc::new(Self {
            fail_with: None,
            cookies,
            acquired: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            fail_with: Some(message.to_string()),
            cookies: Vec::new(),
            acquired: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl CookieSource for ScriptedSource {
    async fn fetch_cookies(&self) -> Result<Vec<CookiePair>, BrowserError> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        let result = match &self.fail_with {
            Some(msg) => Err(BrowserError::NavigationFailed(msg.clone())),
            None => Ok(self.cookies.clone()),
        };
        // Release happens on both arms, mirroring the production source.
        self.released.fetch_add(1, Ordering::SeqCst);
        result
    }
}

fn test_config() -> ServerConfig {
    ServerConfig {
        first_message_timeout_ms: 5_000,
        ..ServerConfig::default()
    }
}

async fn start_server(source: Arc<dyn CookieSource>, config: ServerConfig) -> SocketAddr {
    let state = GatewayState::new(config, source);
    let app = build_app(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Drain the stream, returning all text frames and the close frame (if any).
async fn collect_outcome(ws: &mut WsClient) -> (Vec<String>, Option<(u16, String)>) {
    let mut texts = Vec::new();
    let mut close = None;
    while let Some(Ok(msg)) = ws.next().await {
        match msg {
            Message::Text(t) => texts.push(t.to_string()),
            Message::Close(frame) => {
                close = frame.map(|f| (u16::from(f.code), f.reason.to_string()));
                break;
            },
            _ => {},
        }
    }
    (texts, close)
}

#[tokio::test]
async fn cookie_request_yields_header_then_normal_close() {
    let source = ScriptedSource::returning(vec![CookiePair::new("session", "xyz")]);
    let addr = start_server(Arc::clone(&source) as Arc<dyn CookieSource>, test_config()).await;

    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    ws.send(Message::Text(r#"{"type":"cookie"}"#.into()))
        .await
        .unwrap();

    let (texts, close) = collect_outcome(&mut ws).await;
    assert_eq!(texts.len(), 1);
    let payload: serde_json::Value = serde_json::from_str(&texts[0]).unwrap();
    assert_eq!(
        payload,
        serde_json::json!({"type": "cookies", "cookie": "session=xyz"})
    );
    assert_eq!(close, Some((1000, "Done".to_string())));

    assert_eq!(source.acquired.load(Ordering::SeqCst), 1);
    assert_eq!(source.released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn invalid_json_closes_with_policy_violation() {
    let source = ScriptedSource::returning(vec![]);
    let addr = start_server(Arc::clone(&source) as Arc<dyn CookieSource>, test_config()).await;

    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    ws.send(Message::Text("not json".into())).await.unwrap();

    let (texts, close) = collect_outcome(&mut ws).await;
    assert!(texts.is_empty());
    assert_eq!(close, Some((1008, "Invalid JSON".to_string())));
    // Browser must never be touched for rejected payloads.
    assert_eq!(source.acquired.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unrecognized_type_closes_with_malformed_request() {
    let source = ScriptedSource::returning(vec![]);
    let addr = start_server(Arc::clone(&source) as Arc<dyn CookieSource>, test_config()).await;

    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    ws.send(Message::Text(r#"{"type":"ping"}"#.into()))
        .await
        .unwrap();

    let (texts, close) = collect_outcome(&mut ws).await;
    assert!(texts.is_empty());
    assert_eq!(close, Some((1008, "Malformed request".to_string())));
    assert_eq!(source.acquired.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn collaborator_failure_is_reported_then_closed_normally() {
    let source = ScriptedSource::failing("net::ERR_TIMED_OUT loading target");
    let addr = start_server(Arc::clone(&source) as Arc<dyn CookieSource>, test_config()).await;

    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    ws.send(Message::Text(r#"{"type":"cookie"}"#.into()))
        .await
        .unwrap();

    let (texts, close) = collect_outcome(&mut ws).await;
    assert_eq!(texts.len(), 1);
    let payload: serde_json::Value = serde_json::from_str(&texts[0]).unwrap();
    assert_eq!(payload["type"], "error");
    let error = payload["error"].as_str().unwrap();
    assert!(error.contains("net::ERR_TIMED_OUT"), "got: {error}");

    // Failure is absorbed: normal close, not a policy close.
    assert_eq!(close, Some((1000, "Done".to_string())));
    assert_eq!(source.acquired.load(Ordering::SeqCst), 1);
    assert_eq!(source.released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn idle_connection_is_closed_with_no_message_received() {
    let source = ScriptedSource::returning(vec![]);
    let config = ServerConfig {
        first_message_timeout_ms: 100,
        ..ServerConfig::default()
    };
    let addr = start_server(Arc::clone(&source) as Arc<dyn CookieSource>, config).await;

    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    // Send nothing.
    let (texts, close) = collect_outcome(&mut ws).await;
    assert!(texts.is_empty());
    assert_eq!(close, Some((1008, "No message received".to_string())));
}

#[tokio::test]
async fn at_most_one_response_per_connection() {
    let source = ScriptedSource::returning(vec![CookiePair::new("a", "1")]);
    let addr = start_server(Arc::clone(&source) as Arc<dyn CookieSource>, test_config()).await;

    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    // Two requests back to back; the connection serves exactly one.
    ws.send(Message::Text(r#"{"type":"cookie"}"#.into()))
        .await
        .unwrap();
    ws.send(Message::Text(r#"{"type":"cookie"}"#.into()))
        .await
        .unwrap();

    let (texts, close) = collect_outcome(&mut ws).await;
    assert_eq!(texts.len(), 1);
    assert_eq!(close, Some((1000, "Done".to_string())));
    assert_eq!(source.acquired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn non_upgrade_requests_get_plaintext_health_response() {
    let source = ScriptedSource::returning(vec![]);
    let addr = start_server(Arc::clone(&source) as Arc<dyn CookieSource>, test_config()).await;

    for path in ["/", "/healthz", "/ws"] {
        let resp = reqwest::get(format!("http://{addr}{path}")).await.unwrap();
        assert_eq!(resp.status(), 200, "path {path}");
        let content_type = resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("text/plain"), "path {path}");
        assert_eq!(resp.text().await.unwrap(), "OK", "path {path}");
    }
}

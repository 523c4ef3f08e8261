use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Router,
        extract::{ConnectInfo, State, WebSocketUpgrade, ws::rejection::WebSocketUpgradeRejection},
        response::{IntoResponse, Response},
        routing::get,
    },
    tower_http::cors::{Any, CorsLayer},
    tracing::info,
};

use crate::{state::GatewayState, ws::handle_connection};

// ── Shared app state ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<GatewayState>,
}

// ── Server startup ───────────────────────────────────────────────────────────

/// Build the gateway router (shared between production startup and tests).
///
/// `/ws` upgrades to the message channel; every other request — including a
/// plain GET to `/ws` — gets the fixed health-probe response.
pub fn build_app(state: Arc<GatewayState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_upgrade_handler))
        .fallback(health_handler)
        .layer(cors)
        .with_state(AppState { gateway: state })
}

/// Bind the listener and serve until the process exits.
pub async fn start_gateway(state: Arc<GatewayState>) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", state.config.bind, state.config.port).parse()?;

    // Display-only: deploy platforms terminate TLS in front of us, so an
    // advertised hostname implies the secure scheme.
    let endpoint = match state.config.external_hostname {
        Some(ref host) => format!("wss://{host}"),
        None => format!("ws://{addr}"),
    };
    info!(version = %state.version, endpoint = %endpoint, "gateway listening");

    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// Fixed plaintext probe response for load balancers and uptime checks.
async fn health_handler() -> impl IntoResponse {
    "OK"
}

async fn ws_upgrade_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Response {
    match ws {
        Ok(ws) => ws
            .on_upgrade(move |socket| handle_connection(socket, state.gateway, addr))
            .into_response(),
        // Probe hit the channel path without upgrade headers.
        Err(_) => health_handler().await.into_response(),
    }
}

//! `RelayServer`: Axum HTTP + WebSocket server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use metrics::counter;
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::cors::{OriginPolicy, cors_layer};
use crate::error::{Result, ServerError};
use crate::health::{self, HealthResponse};
use crate::metrics::{WS_REJECTED_TOTAL, render};
use crate::relay::Relay;
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::session::run_ws_session;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Connection table, presence registry, router.
    pub relay: Arc<Relay>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Origin allow-list for upgrades.
    pub origins: Arc<OriginPolicy>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// One permit per admitted session, sized to `max_connections`.
    pub slots: Arc<Semaphore>,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus handle for `/metrics`.
    pub metrics: PrometheusHandle,
}

/// The presence relay server.
pub struct RelayServer {
    config: Arc<ServerConfig>,
    relay: Arc<Relay>,
    shutdown: Arc<ShutdownCoordinator>,
    slots: Arc<Semaphore>,
    metrics: PrometheusHandle,
    start_time: Instant,
}

impl RelayServer {
    /// Create a new server.
    pub fn new(config: ServerConfig, metrics: PrometheusHandle) -> Self {
        let relay = Arc::new(Relay::new(config.send_queue_capacity));
        let slots = Arc::new(Semaphore::new(
            config.max_connections.min(Semaphore::MAX_PERMITS),
        ));
        Self {
            config: Arc::new(config),
            relay,
            shutdown: Arc::new(ShutdownCoordinator::new()),
            slots,
            metrics,
            start_time: Instant::now(),
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Result<Router> {
        let cors = cors_layer(&self.config.cors)?;
        let state = AppState {
            relay: self.relay.clone(),
            config: self.config.clone(),
            origins: Arc::new(OriginPolicy::from_settings(&self.config.cors)),
            shutdown: self.shutdown.clone(),
            slots: self.slots.clone(),
            start_time: self.start_time,
            metrics: self.metrics.clone(),
        };

        Ok(Router::new()
            .route("/ws", get(ws_handler))
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .layer(cors)
            .with_state(state))
    }

    /// Bind the listener and serve in a background task.
    ///
    /// Returns the bound address (useful with port `0`) and the serve task.
    /// The task stops accepting once the shutdown token is cancelled.
    pub async fn listen(&self) -> Result<(SocketAddr, JoinHandle<()>)> {
        let router = self.router()?;
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        info!(
            %local_addr,
            heartbeat = self.config.heartbeat().is_some(),
            max_connections = self.config.max_connections,
            "relay server listening"
        );

        let token = self.shutdown.token();
        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, router)
                .with_graceful_shutdown(async move { token.cancelled().await });
            if let Err(e) = serve.await {
                error!(error = %e, "server error");
            }
        });
        Ok((local_addr, handle))
    }

    /// Get the relay.
    pub fn relay(&self) -> &Arc<Relay> {
        &self.relay
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// GET /ws
async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    let origin = headers.get(header::ORIGIN);
    if !state.origins.allows(origin) {
        warn!(origin = ?origin, "rejected upgrade from disallowed origin");
        counter!(WS_REJECTED_TOTAL, "reason" => "origin").increment(1);
        return (StatusCode::FORBIDDEN, "origin not allowed").into_response();
    }
    if state.shutdown.is_shutting_down() {
        counter!(WS_REJECTED_TOTAL, "reason" => "shutdown").increment(1);
        return (StatusCode::SERVICE_UNAVAILABLE, "server shutting down").into_response();
    }
    // Held until the session ends, or released if the upgrade never completes.
    let Ok(permit) = state.slots.clone().try_acquire_owned() else {
        warn!(
            connections = state.relay.connection_count(),
            "rejected upgrade, connection limit reached"
        );
        counter!(WS_REJECTED_TOTAL, "reason" => "capacity").increment(1);
        return (StatusCode::SERVICE_UNAVAILABLE, "too many connections").into_response();
    };

    let relay = state.relay.clone();
    let heartbeat = state.config.heartbeat();
    let token = state.shutdown.token();
    let sessions = state.shutdown.sessions().clone();
    ws.max_message_size(state.config.max_message_size)
        .on_upgrade(move |socket| {
            sessions.track_future(async move {
                let _ = run_ws_session(socket, relay, heartbeat, token).await;
                drop(permit);
            })
        })
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(
        state.start_time,
        state.relay.connection_count(),
        state.relay.online_count(),
        state.shutdown.is_shutting_down(),
    ))
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        render(&state.metrics),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use relay_settings::CorsSettings;
    use tower::ServiceExt;

    fn handle() -> PrometheusHandle {
        PrometheusBuilder::new().build_recorder().handle()
    }

    fn make_server() -> RelayServer {
        RelayServer::new(ServerConfig::default(), handle())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or_default())
    }

    #[test]
    fn server_with_default_config() {
        let server = make_server();
        assert_eq!(server.config().host, "127.0.0.1");
        assert_eq!(server.config().port, 0);
        assert_eq!(server.relay().connection_count(), 0);
        assert!(!server.shutdown().is_shutting_down());
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let server = make_server();
        let (status, body) = get_json(server.router().unwrap(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["connections"], 0);
        assert_eq!(body["online_users"], 0);
        assert!(body["uptime_secs"].is_number());
    }

    #[tokio::test]
    async fn health_reports_shutdown() {
        let server = make_server();
        server.shutdown().shutdown();
        let (_, body) = get_json(server.router().unwrap(), "/health").await;
        assert_eq!(body["status"], "shutting_down");
    }

    #[tokio::test]
    async fn metrics_endpoint_is_text() {
        let server = make_server();
        let req = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let resp = server.router().unwrap().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let ct = resp.headers().get(header::CONTENT_TYPE).unwrap();
        assert!(ct.to_str().unwrap().starts_with("text/plain"));
    }

    #[tokio::test]
    async fn ws_without_upgrade_headers_is_rejected() {
        let server = make_server();
        let req = Request::builder().uri("/ws").body(Body::empty()).unwrap();
        let resp = server.router().unwrap().oneshot(req).await.unwrap();
        assert!(resp.status().is_client_error());
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let server = make_server();
        let req = Request::builder()
            .uri("/nonexistent")
            .body(Body::empty())
            .unwrap();
        let resp = server.router().unwrap().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cors_preflight_allows_configured_origin() {
        let server = make_server();
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/health")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let resp = server.router().unwrap().oneshot(req).await.unwrap();
        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn cors_omits_header_for_unknown_origin() {
        let server = make_server();
        let req = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "http://evil.example")
            .body(Body::empty())
            .unwrap();
        let resp = server.router().unwrap().oneshot(req).await.unwrap();
        assert!(
            resp.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .is_none()
        );
    }

    #[test]
    fn invalid_cors_fails_router() {
        let config = ServerConfig {
            cors: CorsSettings {
                allowed_origins: vec!["*".into()],
                allow_credentials: true,
                ..CorsSettings::default()
            },
            ..ServerConfig::default()
        };
        let server = RelayServer::new(config, handle());
        assert_matches!(server.router(), Err(ServerError::InvalidCors(_)));
    }

    #[tokio::test]
    async fn listen_binds_ephemeral_port() {
        let server = make_server();
        let (addr, serve) = server.listen().await.unwrap();
        assert_ne!(addr.port(), 0);
        server.shutdown().shutdown();
        serve.await.unwrap();
    }

    #[tokio::test]
    async fn listen_reports_bind_error() {
        let first = make_server();
        let (addr, serve) = first.listen().await.unwrap();

        let second = RelayServer::new(
            ServerConfig {
                port: addr.port(),
                ..ServerConfig::default()
            },
            handle(),
        );
        assert_matches!(second.listen().await, Err(ServerError::Bind { .. }));

        first.shutdown().shutdown();
        serve.await.unwrap();
    }
}

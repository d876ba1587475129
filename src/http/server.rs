//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the dispatch handler
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Bind server to listener and stop on shutdown
//! - Hand each request to the dispatcher
//!
//! # Design Decisions
//! - One route, `/{route}`, answering GET and POST
//! - Dispatch runs on its own task so a client disconnect does not abort
//!   a send that is already in flight
//! - Every response, including unreadable bodies, goes through the
//!   dispatcher so it is logged exactly once
//! - Unmatched paths, undecodable route segments and other methods are
//!   refused through the dispatcher too, with the usual JSON error body

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection},
        ConnectInfo, Path, State,
    },
    http::{HeaderMap, Method, Uri},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::dispatch::{DispatchError, DispatchRequest, Dispatcher, RequestOutcome};
use crate::http::request::{self, PayloadError};
use crate::mail::MailHeaders;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub trust_forwarded_for: bool,
}

/// HTTP front of the dispatch service.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &ServerConfig, dispatcher: Arc<Dispatcher>) -> Self {
        let state = AppState {
            dispatcher,
            trust_forwarded_for: config.trust_forwarded_for,
        };
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route("/{route}", get(dispatch_handler).post(dispatch_handler))
            .fallback(unrouted_handler)
            .method_not_allowed_fallback(method_not_allowed_handler)
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The configured router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Route name for records of requests that never matched `/{route}`.
fn raw_route(uri: &Uri) -> &str {
    uri.path().trim_start_matches('/')
}

/// Refuse a request before dispatch, still producing one record.
fn refuse(
    state: &AppState,
    peer: SocketAddr,
    uri: &Uri,
    headers: &HeaderMap,
    error: DispatchError,
) -> RequestOutcome {
    let request_id = request::request_id(headers);
    let origin = request::client_origin(peer.ip(), headers, state.trust_forwarded_for);
    state
        .dispatcher
        .reject(&request_id, &origin, raw_route(uri), error)
}

/// Paths other than a single `/{route}` segment.
async fn unrouted_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    uri: Uri,
    headers: HeaderMap,
) -> RequestOutcome {
    refuse(&state, peer, &uri, &headers, DispatchError::NotFound)
}

async fn method_not_allowed_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> RequestOutcome {
    let error = DispatchError::BadRequest(format!("Method {} is not supported", method));
    refuse(&state, peer, &uri, &headers, error)
}

async fn dispatch_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    route: Result<Path<String>, PathRejection>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> RequestOutcome {
    let route = match route {
        Ok(Path(route)) => route,
        Err(e) => {
            tracing::debug!(error = %e, "Rejecting undecodable route");
            return refuse(&state, peer, &uri, &headers, DispatchError::NotFound);
        }
    };
    let request_id = request::request_id(&headers);
    let origin = request::client_origin(peer.ip(), &headers, state.trust_forwarded_for);

    let payload = body
        .map_err(PayloadError::Unreadable)
        .and_then(|body| request::build_payload(&method, &uri, &headers, &body));
    let payload = match payload {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!(request_id = %request_id, error = ?e, "Rejecting request body");
            return state.dispatcher.reject(
                &request_id,
                &origin,
                &route,
                DispatchError::BadRequest(e.to_string()),
            );
        }
    };

    let request = DispatchRequest {
        request_id: request_id.clone(),
        origin: origin.clone(),
        route: route.clone(),
        credential: request::credential(&payload, &headers),
        headers: MailHeaders::from_payload(&payload),
        payload,
    };

    let dispatcher = state.dispatcher.clone();
    match tokio::spawn(async move { dispatcher.handle(request).await }).await {
        Ok(outcome) => outcome,
        Err(e) => state.dispatcher.reject(
            &request_id,
            &origin,
            &route,
            DispatchError::Internal(e.to_string()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::log::MockDispatchLog;
    use crate::dispatch::DispatchContext;
    use crate::mail::transport::{MockMailTransport, TransportError};
    use crate::routing::{RouteEntry, RouteRegistry};
    use crate::security::{AuthorizationGate, WhitelistGate};
    use crate::template::{BindingEntry, BindingSpec, Template, TemplateRenderer};
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn server(gate: AuthorizationGate, transport: MockMailTransport) -> HttpServer {
        server_with_log(gate, transport, quiet_log())
    }

    fn quiet_log() -> MockDispatchLog {
        let mut log = MockDispatchLog::new();
        log.expect_record().return_const(());
        log
    }

    fn server_with_log(
        gate: AuthorizationGate,
        transport: MockMailTransport,
        log: MockDispatchLog,
    ) -> HttpServer {
        let registry = RouteRegistry::new(vec![RouteEntry::new(
            "welcome",
            Template::parse("<h1 data-bind=\"name\"></h1>").unwrap(),
            BindingSpec::new(vec![BindingEntry::new("name", "text").unwrap()]).unwrap(),
        )])
        .unwrap();
        let context = DispatchContext {
            registry,
            gate,
            renderer: TemplateRenderer::default(),
            default_from: Some("noreply@example.com".into()),
        };
        let dispatcher =
            Arc::new(Dispatcher::new(context, Arc::new(transport)).with_log(Arc::new(log)));
        HttpServer::new(&ServerConfig::default(), dispatcher)
    }

    fn sending_transport() -> MockMailTransport {
        let mut transport = MockMailTransport::new();
        transport.expect_send().returning(|_| Ok(()));
        transport
    }

    async fn call(server: &HttpServer, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let mut request = request;
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));
        let response = server.router().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_get_sends() {
        let server = server(AuthorizationGate::new(), sending_transport());
        let (status, headers, body) =
            call(&server, get("/welcome?name=Ada&to=a@example.com")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Email send" }));
        assert!(headers.contains_key(request::X_REQUEST_ID));
    }

    #[tokio::test]
    async fn test_post_json_sends() {
        let server = server(AuthorizationGate::new(), sending_transport());
        let request = Request::post("/welcome")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name": "Ada", "to": ["a@example.com"]}"#))
            .unwrap();
        let (status, _, body) = call(&server, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Email send" }));
    }

    #[tokio::test]
    async fn test_missing_data() {
        let server = server(AuthorizationGate::new(), sending_transport());
        let (status, _, body) = call(&server, get("/welcome?to=a@example.com")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Missing data 'name'" }));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let server = server(AuthorizationGate::new(), sending_transport());
        let (status, _, body) = call(&server, get("/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "The asked route is not available" }));
    }

    #[tokio::test]
    async fn test_not_whitelisted() {
        let gate = AuthorizationGate::new()
            .with_gate(WhitelistGate::new(true, vec!["10.1.1.1".to_string()]));
        let server = server(gate, sending_transport());
        let (status, _, body) = call(&server, get("/welcome?name=Ada")).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({ "error": "Your are not allowed to query this api" }));
    }

    #[tokio::test]
    async fn test_invalid_body() {
        let server = server(AuthorizationGate::new(), sending_transport());
        let request = Request::post("/welcome")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _, body) = call(&server, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid request body" }));
    }

    #[tokio::test]
    async fn test_unrouted_paths_are_json_not_found() {
        let server = server(AuthorizationGate::new(), sending_transport());
        for uri in ["/", "/welcome/extra", "/a/b/c"] {
            let (status, _, body) = call(&server, get(uri)).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
            assert_eq!(body, json!({ "error": "The asked route is not available" }));
        }
    }

    #[tokio::test]
    async fn test_undecodable_route_is_json_not_found() {
        let server = server(AuthorizationGate::new(), sending_transport());
        let (status, _, body) = call(&server, get("/%FF")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "The asked route is not available" }));
    }

    #[tokio::test]
    async fn test_unsupported_method_is_json_bad_request() {
        let server = server(AuthorizationGate::new(), sending_transport());
        let request = Request::delete("/welcome").body(Body::empty()).unwrap();
        let (status, _, body) = call(&server, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Method DELETE is not supported" }));
    }

    #[tokio::test]
    async fn test_refused_requests_are_logged_once() {
        let mut log = MockDispatchLog::new();
        log.expect_record()
            .withf(|r| r.status == 404 && r.route == "a/b")
            .times(1)
            .return_const(());
        log.expect_record()
            .withf(|r| r.status == 400 && r.route == "welcome")
            .times(1)
            .return_const(());

        let server = server_with_log(AuthorizationGate::new(), sending_transport(), log);
        call(&server, get("/a/b")).await;
        call(&server, Request::put("/welcome").body(Body::empty()).unwrap()).await;
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let mut transport = MockMailTransport::new();
        transport
            .expect_send()
            .returning(|_| Err(TransportError::Connection("refused".into())));
        let server = server(AuthorizationGate::new(), transport);
        let (status, _, body) = call(&server, get("/welcome?name=Ada&to=a@example.com")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().starts_with("Unable to send the email"));
    }
}

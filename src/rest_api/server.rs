//! # REST API HTTP Server
//!
//! Axum-based HTTP surface over the entity engine.
//!
//! | Method | Path            | Behaviour                           |
//! |--------|-----------------|-------------------------------------|
//! | GET    | `/schemas`      | registered type names               |
//! | GET    | `/schema/:name` | resolved schema                     |
//! | GET    | `/:type`        | search (query params)               |
//! | POST   | `/:type`        | create, 201                         |
//! | GET    | `/:type/:id`    | read                                |
//! | PUT    | `/:type/:id`    | full replace                        |
//! | DELETE | `/:type/:id`    | delete, 204                         |
//!
//! `Accept: application/ld+json` selects the linked-data projection.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::engine::{EntityEngine, Limits, SearchQuery};
use crate::serialize::{Representation, Serializer};

use super::access::{AccessPolicy, Capability, API_KEY_HEADER};
use super::errors::{RestError, RestResult};

/// REST API server state
pub struct RestServer {
    engine: Arc<EntityEngine>,
    serializer: Serializer,
    access: Arc<dyn AccessPolicy>,
    limits: Limits,
}

impl RestServer {
    pub fn new(
        engine: Arc<EntityEngine>,
        serializer: Serializer,
        access: Arc<dyn AccessPolicy>,
    ) -> Self {
        Self {
            engine,
            serializer,
            access,
            limits: Limits::default(),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Build the Axum router
    pub fn router(self) -> Router {
        let state = Arc::new(self);

        Router::new()
            .route("/health", get(health_handler))
            .route("/schemas", get(list_schemas_handler))
            .route("/schema/:name", get(get_schema_handler))
            .route("/:type", get(search_handler).post(create_handler))
            .route(
                "/:type/:id",
                get(get_handler).put(update_handler).delete(delete_handler),
            )
            .fallback(fallback_handler)
            .with_state(state)
    }

    fn authorize(&self, headers: &HeaderMap, capability: Capability) -> RestResult<()> {
        let api_key = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
        self.access.authorize(api_key, capability)?;
        Ok(())
    }

    fn respond(&self, status: StatusCode, value: Value, representation: Representation) -> Response {
        (
            status,
            [(header::CONTENT_TYPE, representation.content_type())],
            Json(value),
        )
            .into_response()
    }
}

/// Wraps a router with CORS and request tracing; no origins allows any.
pub fn build_app(router: Router, cors_origins: &[String]) -> Router {
    let cors = if cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = cors_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    router.layer(cors).layer(TraceLayer::new_for_http())
}

/// Binds and serves until the listener fails.
pub async fn serve(app: Router, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(event = "SERVER_LISTENING", addr = %addr, "Accepting connections");
    axum::serve(listener, app).await
}

/// Shared state type
type ServerState = Arc<RestServer>;

fn representation(headers: &HeaderMap) -> Representation {
    Representation::from_accept(headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()))
}

fn parse_body(body: &Bytes) -> RestResult<Value> {
    serde_json::from_slice(body).map_err(|e| RestError::InvalidBody(e.to_string()))
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

async fn list_schemas_handler(
    State(server): State<ServerState>,
    headers: HeaderMap,
) -> RestResult<Json<Value>> {
    server.authorize(&headers, Capability::Read)?;
    Ok(Json(json!({ "schemas": server.engine.registry().type_names() })))
}

async fn get_schema_handler(
    State(server): State<ServerState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> RestResult<Json<Value>> {
    server.authorize(&headers, Capability::Read)?;
    let definition = server
        .engine
        .registry()
        .get(&name)
        .ok_or_else(|| RestError::SchemaNotFound(name.clone()))?;
    Ok(Json(definition.resolved_schema().clone()))
}

async fn search_handler(
    State(server): State<ServerState>,
    Path(type_name): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> RestResult<Response> {
    server.authorize(&headers, Capability::Read)?;

    let query = SearchQuery::parse(params, &server.limits);
    let records = server.engine.search(&type_name, &query)?;

    let representation = representation(&headers);
    let body = server.serializer.project_all(&records, representation);
    Ok(server.respond(StatusCode::OK, body, representation))
}

async fn create_handler(
    State(server): State<ServerState>,
    Path(type_name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> RestResult<Response> {
    server.authorize(&headers, Capability::Write)?;

    if !server.engine.registry().contains(&type_name) {
        return Err(RestError::InvalidType(type_name));
    }
    let payload = parse_body(&body)?;
    let record = server.engine.create(&type_name, payload)?;

    let representation = representation(&headers);
    let body = server.serializer.project(&record, representation);
    Ok(server.respond(StatusCode::CREATED, body, representation))
}

async fn get_handler(
    State(server): State<ServerState>,
    Path((type_name, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> RestResult<Response> {
    server.authorize(&headers, Capability::Read)?;

    let record = server.engine.get(Some(&type_name), &id)?;

    let representation = representation(&headers);
    let body = server.serializer.project(&record, representation);
    Ok(server.respond(StatusCode::OK, body, representation))
}

async fn update_handler(
    State(server): State<ServerState>,
    Path((type_name, id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> RestResult<Response> {
    server.authorize(&headers, Capability::Write)?;

    let payload = parse_body(&body)?;
    let record = server.engine.update(&type_name, &id, payload)?;

    let representation = representation(&headers);
    let body = server.serializer.project(&record, representation);
    Ok(server.respond(StatusCode::OK, body, representation))
}

async fn delete_handler(
    State(server): State<ServerState>,
    Path((type_name, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> RestResult<StatusCode> {
    server.authorize(&headers, Capability::Write)?;

    server.engine.delete(&type_name, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn fallback_handler(uri: Uri) -> RestError {
    RestError::RouteNotFound(uri.path().to_string())
}

// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Models HTTP API
//!
//! Thin axum layer over [`ModelRegistry`] and [`LocalProviderScanner`].
//! Handlers translate registry results into status codes and JSON bodies.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

use crate::domain::llm::{GatewayError, GenerationRequest, ModelConfig};
use crate::infrastructure::llm::{LocalProviderScanner, ModelRegistry};

pub struct AppState {
    pub registry: Arc<ModelRegistry>,
    pub scanner: Arc<LocalProviderScanner>,
    pub start_time: Instant,
}

pub fn router(registry: Arc<ModelRegistry>, scanner: Arc<LocalProviderScanner>) -> Router {
    let state = Arc::new(AppState {
        registry,
        scanner,
        start_time: Instant::now(),
    });

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/models", get(list_models).post(add_model))
        .route("/api/models/health/all", get(health_all))
        .route("/api/models/providers/scan", post(scan_providers))
        .route("/api/models/{name}", get(describe_model).delete(remove_model))
        .route("/api/models/{name}/generate", post(generate))
        .route("/api/models/{name}/health", get(model_health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Maps gateway errors onto HTTP statuses
struct ApiError(GatewayError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Configuration(_) => StatusCode::BAD_REQUEST,
            GatewayError::Generation { .. } => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

fn not_found(name: &str) -> Response {
    ApiError(GatewayError::NotFound(name.to_string())).into_response()
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "models": state.registry.len(),
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

async fn list_models(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.registry.list())
}

async fn add_model(
    State(state): State<Arc<AppState>>,
    Json(config): Json<ModelConfig>,
) -> Response {
    let name = config.name.clone();
    if state.registry.add(config) {
        (
            StatusCode::CREATED,
            Json(json!({ "message": format!("Model {} added successfully", name) })),
        )
            .into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("Failed to add model {}", name) })),
        )
            .into_response()
    }
}

async fn describe_model(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> Response {
    match state.registry.describe(&name) {
        Some(listing) => Json(listing).into_response(),
        None => not_found(&name),
    }
}

async fn remove_model(State(state): State<Arc<AppState>>, Path(name): Path<String>) -> Response {
    if state.registry.remove(&name) {
        Json(json!({ "message": format!("Model {} removed successfully", name) })).into_response()
    } else {
        not_found(&name)
    }
}

async fn generate(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(request): Json<GenerationRequest>,
) -> Response {
    match state.registry.generate(&name, &request).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

async fn model_health(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Json<serde_json::Value> {
    let healthy = state.registry.health_check(&name).await;
    Json(json!({ "model": name, "healthy": healthy }))
}

async fn health_all(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.registry.health_check_all().await)
}

async fn scan_providers(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.scanner.scan().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gateway_config::DiscoveryConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app(registry: Arc<ModelRegistry>) -> Router {
        let dead = "http://127.0.0.1:9".to_string();
        let scanner = LocalProviderScanner::new(
            DiscoveryConfig {
                ollama: dead.clone(),
                llamacpp: dead.clone(),
                textgen: dead,
            },
            Duration::from_secs(2),
        )
        .unwrap();
        router(registry, Arc::new(scanner))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_add_then_list_and_describe() {
        let registry = Arc::new(ModelRegistry::default());

        let (status, _) = send(
            app(registry.clone()),
            json_request(
                "POST",
                "/api/models",
                json!({"name": "m1", "provider": "ollama", "model_id": "llama2"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send(app(registry.clone()), get_request("/api/models")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], json!("m1"));
        assert_eq!(body[0]["provider"], json!("ollama"));
        assert_eq!(body[0]["type"], json!("completion"));

        let (status, body) = send(app(registry), get_request("/api/models/m1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model"], json!("llama2"));
        assert_eq!(body["local"], json!(true));
    }

    #[tokio::test]
    async fn test_add_unknown_provider_is_bad_request() {
        let registry = Arc::new(ModelRegistry::default());
        let (status, body) = send(
            app(registry.clone()),
            json_request(
                "POST",
                "/api/models",
                json!({"name": "x", "provider": "cohere", "model_id": "command"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("x"));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_missing_model_routes_return_not_found() {
        let registry = Arc::new(ModelRegistry::default());

        let (status, _) = send(app(registry.clone()), get_request("/api/models/ghost")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let delete = Request::builder()
            .method("DELETE")
            .uri("/api/models/ghost")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app(registry.clone()), delete).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            app(registry),
            json_request("POST", "/api/models/ghost/generate", json!({"prompt": "hi"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], json!("Model not found: ghost"));
    }

    #[tokio::test]
    async fn test_generate_success_and_backend_failure() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server
            .mock("POST", "/completion")
            .with_status(200)
            .with_body(r#"{"content": "generated", "tokens_evaluated": 1, "tokens_predicted": 1}"#)
            .create_async()
            .await;

        let registry = Arc::new(ModelRegistry::default());
        registry.add(ModelConfig::new("cpp", "llamacpp", "local").with_base_url(server.url()));
        registry.add(ModelConfig::new("down", "llamacpp", "local").with_base_url("http://127.0.0.1:9"));

        let (status, body) = send(
            app(registry.clone()),
            json_request("POST", "/api/models/cpp/generate", json!({"prompt": "hi"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], json!("generated"));
        assert_eq!(body["provider"], json!("llamacpp"));

        let (status, body) = send(
            app(registry),
            json_request("POST", "/api/models/down/generate", json!({"prompt": "hi"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().starts_with("llamacpp generation failed"));
    }

    #[tokio::test]
    async fn test_health_routes() {
        let mut server = mockito::Server::new_async().await;
        let _health = server
            .mock("GET", "/health")
            .with_status(200)
            .create_async()
            .await;

        let registry = Arc::new(ModelRegistry::default());
        registry.add(ModelConfig::new("up", "llamacpp", "local").with_base_url(server.url()));
        registry.add(ModelConfig::new("down", "llamacpp", "local").with_base_url("http://127.0.0.1:9"));

        let (status, body) = send(app(registry.clone()), get_request("/api/models/up/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"model": "up", "healthy": true}));

        let (_, body) = send(app(registry.clone()), get_request("/api/models/health/all")).await;
        assert_eq!(body, json!({"down": false, "up": true}));

        let (status, body) = send(app(registry), get_request("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], json!("healthy"));
        assert_eq!(body["models"], json!(2));
    }

    #[tokio::test]
    async fn test_remove_then_scan() {
        let registry = Arc::new(ModelRegistry::default());
        registry.add(ModelConfig::new("m1", "textgen", "local"));

        let delete = Request::builder()
            .method("DELETE")
            .uri("/api/models/m1")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app(registry.clone()), delete).await;
        assert_eq!(status, StatusCode::OK);
        assert!(registry.get("m1").is_none());

        let scan = Request::builder()
            .method("POST")
            .uri("/api/models/providers/scan")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(app(registry), scan).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ollama"]["available"], json!(false));
        assert_eq!(body["textgen"]["available"], json!(false));
    }
}

//! Common test utilities for integration tests.
//!
//! Tests drive the full router against the in-memory storage backend, so no
//! database is required.

// Not every helper is used by every test binary.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use fake::{faker::name::en::FirstName, Fake};
use pettrack_api::{
    app::create_app,
    config::{
        Config, DatabaseConfig, GeofenceConfig, LimitsConfig, LoggingConfig, ServerConfig,
        StorageBackend, StorageConfig,
    },
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use domain::store::InMemoryStore;

/// Test configuration backed by in-memory storage.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 600,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        storage: StorageConfig {
            backend: StorageBackend::Memory,
        },
        limits: LimitsConfig {
            max_batch_size: 50,
            location_history_limit: 1000,
            notification_list_limit: 100,
        },
        geofence: GeofenceConfig {
            notify_on_entry: false,
        },
    }
}

/// A router plus a handle on its store for assertions and fault injection.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
}

impl TestApp {
    /// Sends one request through a clone of the router.
    pub async fn send(&self, request: Request<Body>) -> axum::response::Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Sends a request and returns the status with the parsed JSON body.
    pub async fn call(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.send(request).await;
        let status = response.status();
        (status, parse_response_body(response).await)
    }
}

pub fn create_test_app(config: Config) -> TestApp {
    let store = Arc::new(InMemoryStore::new());
    TestApp {
        router: create_app(config, store.clone()),
        store,
    }
}

/// Generate a unique entity ID for testing.
pub fn unique_entity_id() -> String {
    format!("dog-{}", uuid::Uuid::new_v4().simple())
}

/// Test tracked entity data.
pub struct TestEntity {
    pub entity_id: String,
    pub name: String,
}

impl TestEntity {
    pub fn new() -> Self {
        Self {
            entity_id: unique_entity_id(),
            name: FirstName().fake(),
        }
    }
}

impl Default for TestEntity {
    fn default() -> Self {
        Self::new()
    }
}

/// Registers an entity through the API.
pub async fn register_test_entity(app: &TestApp, entity: &TestEntity) -> Value {
    let (status, body) = app
        .call(json_request(
            Method::POST,
            "/api/v1/entities",
            json!({"entityId": entity.entity_id, "name": entity.name}),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "entity registration failed: {body}");
    body
}

/// GeoJSON polygon for an axis-aligned box, in GeoJSON `[lng, lat]` order.
pub fn square_geojson(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Value {
    json!({
        "type": "Polygon",
        "coordinates": [[
            [min_lng, min_lat],
            [max_lng, min_lat],
            [max_lng, max_lat],
            [min_lng, max_lat],
            [min_lng, min_lat]
        ]]
    })
}

/// Registers a boundary through the API and returns its ID.
pub async fn register_test_boundary(
    app: &TestApp,
    entity_id: &str,
    name: &str,
    geojson: Value,
) -> String {
    let (status, body) = app
        .call(json_request(
            Method::POST,
            &format!("/api/v1/entities/{entity_id}/boundaries"),
            json!({"name": name, "boundaryGeojson": geojson}),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "boundary registration failed: {body}");
    body["boundaryId"].as_str().unwrap().to_string()
}

/// Uploads one sample and returns the status and body.
pub async fn upload_location(
    app: &TestApp,
    entity_id: &str,
    latitude: f64,
    longitude: f64,
) -> (StatusCode, Value) {
    app.call(json_request(
        Method::POST,
        "/api/v1/locations",
        json!({
            "entityId": entity_id,
            "latitude": latitude,
            "longitude": longitude,
            "timestamp": chrono::Utc::now().timestamp_millis()
        }),
    ))
    .await
}

/// Build a JSON request.
pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a GET request.
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Build a DELETE request.
pub fn delete_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Build a body-less POST request.
pub fn post_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Parse response body as JSON; non-JSON bodies become `Null`.
pub async fn parse_response_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

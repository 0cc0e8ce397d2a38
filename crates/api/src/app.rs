use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::services::IngestionPipeline;
use domain::store::{GeofenceStore, TrackingCatalog};

use crate::config::Config;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{boundaries, entities, health, locations, notifications};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn GeofenceStore>,
    pub catalog: Arc<dyn TrackingCatalog>,
    pub pipeline: Arc<IngestionPipeline>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new<S>(config: Config, store: Arc<S>) -> Self
    where
        S: GeofenceStore + TrackingCatalog + 'static,
    {
        let geofence_store: Arc<dyn GeofenceStore> = store.clone();
        let pipeline = IngestionPipeline::new(geofence_store.clone(), config.geofence.policy());
        Self {
            store: geofence_store,
            catalog: store,
            pipeline: Arc::new(pipeline),
            config: Arc::new(config),
        }
    }
}

pub fn create_app<S>(config: Config, store: Arc<S>) -> Router
where
    S: GeofenceStore + TrackingCatalog + 'static,
{
    let request_timeout = Duration::from_secs(config.server.request_timeout_secs);
    let state = AppState::new(config, store);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let v1_routes = Router::new()
        .route("/locations", post(locations::upload_location))
        .route("/locations/batch", post(locations::upload_batch))
        .route("/entities", post(entities::create_entity))
        .route("/entities/:entity_id", get(entities::get_entity))
        .route(
            "/entities/:entity_id/locations",
            get(locations::get_location_history),
        )
        .route(
            "/entities/:entity_id/boundaries",
            post(boundaries::create_boundary).get(boundaries::list_boundaries),
        )
        .route(
            "/entities/:entity_id/containment",
            get(entities::get_containment_state),
        )
        .route(
            "/entities/:entity_id/notifications",
            get(notifications::list_notifications),
        )
        .route("/boundaries/:boundary_id", delete(boundaries::delete_boundary))
        .route(
            "/notifications/:notification_id/seen",
            post(notifications::mark_seen),
        );

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .nest("/api/v1", v1_routes)
        .merge(public_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}

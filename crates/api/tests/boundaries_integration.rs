//! Integration tests for entity registration, boundaries and containment state.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    create_test_app, delete_request, get_request, json_request, register_test_boundary,
    register_test_entity, square_geojson, test_config, upload_location, TestEntity,
};
use serde_json::json;

// ============================================================================
// Entity Tests
// ============================================================================

#[tokio::test]
async fn test_register_and_get_entity() {
    let app = create_test_app(test_config());
    let entity = TestEntity::new();

    let body = register_test_entity(&app, &entity).await;
    assert_eq!(body["entityId"], entity.entity_id);
    assert_eq!(body["name"], entity.name);

    let (status, body) = app
        .call(get_request(&format!("/api/v1/entities/{}", entity.entity_id)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entityId"], entity.entity_id);
}

#[tokio::test]
async fn test_register_duplicate_entity() {
    let app = create_test_app(test_config());
    let entity = TestEntity::new();
    register_test_entity(&app, &entity).await;

    let (status, body) = app
        .call(json_request(
            Method::POST,
            "/api/v1/entities",
            json!({"entityId": entity.entity_id, "name": "Again"}),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_register_entity_invalid_id() {
    let app = create_test_app(test_config());

    let (status, body) = app
        .call(json_request(
            Method::POST,
            "/api/v1/entities",
            json!({"entityId": "rex the dog!", "name": "Rex"}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_get_unknown_entity() {
    let app = create_test_app(test_config());

    let (status, body) = app.call(get_request("/api/v1/entities/dog-nobody")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_entity");
}

// ============================================================================
// Boundary Tests
// ============================================================================

#[tokio::test]
async fn test_register_and_list_boundaries() {
    let app = create_test_app(test_config());
    let entity = TestEntity::new();
    register_test_entity(&app, &entity).await;

    let yard = register_test_boundary(
        &app,
        &entity.entity_id,
        "Yard",
        square_geojson(-74.1, 39.9, -73.9, 40.1),
    )
    .await;
    register_test_boundary(
        &app,
        &entity.entity_id,
        "Park",
        square_geojson(-73.5, 40.5, -73.4, 40.6),
    )
    .await;

    let (status, body) = app
        .call(get_request(&format!(
            "/api/v1/entities/{}/boundaries",
            entity.entity_id
        )))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["boundaries"][0]["boundaryId"], yard);
    assert_eq!(body["boundaries"][0]["name"], "Yard");
    assert_eq!(body["boundaries"][0]["boundaryGeojson"]["type"], "Polygon");
}

#[tokio::test]
async fn test_register_boundary_rejects_invalid_polygons() {
    let app = create_test_app(test_config());
    let entity = TestEntity::new();
    register_test_entity(&app, &entity).await;
    let uri = format!("/api/v1/entities/{}/boundaries", entity.entity_id);

    let invalid = [
        json!({"type": "Point", "coordinates": [-74.0, 40.0]}),
        json!({"type": "Polygon", "coordinates": []}),
        json!({"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]]]}),
        json!({"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 1.0], [1.0, 0.0], [0.0, 1.0]]]}),
        json!("not even an object"),
    ];

    for geojson in invalid {
        let (status, body) = app
            .call(json_request(
                Method::POST,
                &uri,
                json!({"name": "Bad", "boundaryGeojson": geojson}),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {geojson}");
        assert_eq!(body["error"], "invalid_boundary");
    }

    let (_, body) = app.call(get_request(&uri)).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_register_boundary_blank_name_rejected() {
    let app = create_test_app(test_config());
    let entity = TestEntity::new();
    register_test_entity(&app, &entity).await;
    let uri = format!("/api/v1/entities/{}/boundaries", entity.entity_id);

    let (status, body) = app
        .call(json_request(
            Method::POST,
            &uri,
            json!({"name": "   ", "boundaryGeojson": square_geojson(0.0, 0.0, 1.0, 1.0)}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = app
        .call(json_request(
            Method::POST,
            &uri,
            json!({"name": "  Yard  ", "boundaryGeojson": square_geojson(0.0, 0.0, 1.0, 1.0)}),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Yard");

    let (_, body) = app.call(get_request(&uri)).await;
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn test_register_entity_blank_name_rejected() {
    let app = create_test_app(test_config());

    let (status, body) = app
        .call(json_request(
            Method::POST,
            "/api/v1/entities",
            json!({"entityId": "dog-blank", "name": "   "}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_register_boundary_unknown_entity() {
    let app = create_test_app(test_config());

    let (status, body) = app
        .call(json_request(
            Method::POST,
            "/api/v1/entities/dog-nobody/boundaries",
            json!({"name": "Yard", "boundaryGeojson": square_geojson(0.0, 0.0, 1.0, 1.0)}),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_entity");
}

#[tokio::test]
async fn test_delete_boundary() {
    let app = create_test_app(test_config());
    let entity = TestEntity::new();
    register_test_entity(&app, &entity).await;
    let boundary_id = register_test_boundary(
        &app,
        &entity.entity_id,
        "Yard",
        square_geojson(-74.1, 39.9, -73.9, 40.1),
    )
    .await;

    let response = app
        .send(delete_request(&format!("/api/v1/boundaries/{boundary_id}")))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, body) = app
        .call(delete_request(&format!("/api/v1/boundaries/{boundary_id}")))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) = upload_location(&app, &entity.entity_id, 40.0, -74.0).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["evaluation"]["status"], "no_boundaries");
}

// ============================================================================
// Containment State Tests
// ============================================================================

#[tokio::test]
async fn test_containment_state_follows_samples() {
    let app = create_test_app(test_config());
    let entity = TestEntity::new();
    register_test_entity(&app, &entity).await;
    let boundary_id = register_test_boundary(
        &app,
        &entity.entity_id,
        "Yard",
        square_geojson(-74.1, 39.9, -73.9, 40.1),
    )
    .await;
    let uri = format!("/api/v1/entities/{}/containment", entity.entity_id);

    let (status, body) = app.call(get_request(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["boundaries"].as_array().unwrap().len(), 0);
    assert_eq!(body["insideAny"], false);

    upload_location(&app, &entity.entity_id, 40.0, -74.0).await;
    let (_, body) = app.call(get_request(&uri)).await;
    assert_eq!(body["boundaries"][0]["boundaryId"], boundary_id);
    assert_eq!(body["boundaries"][0]["lastStatus"], "inside");
    assert_eq!(body["insideAny"], true);

    upload_location(&app, &entity.entity_id, 41.0, -74.0).await;
    let (_, body) = app.call(get_request(&uri)).await;
    assert_eq!(body["boundaries"][0]["lastStatus"], "outside");
    assert_eq!(body["insideAny"], false);

    app.send(delete_request(&format!("/api/v1/boundaries/{boundary_id}")))
        .await;
    let (_, body) = app.call(get_request(&uri)).await;
    assert_eq!(body["boundaries"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_containment_state_unknown_entity() {
    let app = create_test_app(test_config());

    let (status, body) = app
        .call(get_request("/api/v1/entities/dog-nobody/containment"))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_entity");
}

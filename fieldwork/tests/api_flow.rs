//! End-to-end API tests: login, dataset lifecycle, CSV import/export,
//! and mapping-area restrictions, driven through the axum router against
//! an in-memory SQLite database.

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use fieldwork::api::{AppState, app_router};
use fieldwork::auth::Auth;
use fieldwork::export::notify::LogNotifier;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database};
use std::sync::Arc;
use tower::ServiceExt;

const JWT_SECRET: &str = "test-jwt-secret-key-32-chars-pad";

async fn make_state() -> (AppState, tempfile::TempDir) {
    // A single pooled connection keeps every query on the same
    // in-memory database, including the spawned export worker.
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let media = tempfile::tempdir().unwrap();
    let state = AppState {
        auth: Arc::new(Auth::new(db.clone())),
        db,
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiry_hours: 1,
        media_root: media.path().to_path_buf(),
        notifier: Arc::new(LogNotifier),
    };
    (state, media)
}

async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(res: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn request(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = if let Some(json) = body {
        builder
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap()
    } else {
        builder.body(Body::empty()).unwrap()
    };
    router.clone().oneshot(request).await.unwrap()
}

async fn login(router: &Router, username: &str, password: &str) -> String {
    let res = request(
        router,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(serde_json::json!({"username": username, "password": password})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res).await["token"].as_str().unwrap().to_string()
}

async fn create_dataset(router: &Router, token: &str, name: &str) -> String {
    let res = request(
        router,
        Method::POST,
        "/api/v1/datasets",
        Some(token),
        Some(serde_json::json!({"name": name})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    body_json(res).await["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let (state, _media) = make_state().await;
    state.auth.create_user("owner", "pw", false).await.unwrap();
    let router = app_router(state);

    let res = request(
        &router,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(serde_json::json!({"username": "owner", "password": "wrong"})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = request(&router, Method::GET, "/api/v1/auth/me", None, None).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn import_then_export_roundtrip() {
    let (state, _media) = make_state().await;
    state.auth.create_user("owner", "pw", false).await.unwrap();
    let router = app_router(state);
    let token = login(&router, "owner", "pw").await;
    let dataset_id = create_dataset(&router, &token, "Survey").await;

    // Preview: delimiter + headers
    let res = request(
        &router,
        Method::POST,
        &format!("/api/v1/datasets/{dataset_id}/import/preview"),
        Some(&token),
        Some(serde_json::json!({
            "csv": "ID;X;Y;NUTZUNG\np1;16.37;48.21;640\np2;16.38;48.22;870"
        })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let preview = body_json(res).await;
    assert_eq!(preview["delimiter"], ";");
    assert_eq!(preview["headers"].as_array().unwrap().len(), 4);

    // Import: one row with bad coordinates is skipped but reported
    let res = request(
        &router,
        Method::POST,
        &format!("/api/v1/datasets/{dataset_id}/import"),
        Some(&token),
        Some(serde_json::json!({
            "csv": "ID,X,Y,NUTZUNG\np1,16.37,48.21,640\np2,oops,48.22,870\np3,16.39,48.23,999",
            "id_column": "ID",
            "x_column": "X",
            "y_column": "Y"
        })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let report = body_json(res).await;
    assert_eq!(report["imported"], 2);
    assert_eq!(report["total_errors"], 1);
    assert!(report["errors"][0].as_str().unwrap().contains("Invalid coordinates"));

    // Schema was materialized
    let res = request(
        &router,
        Method::GET,
        &format!("/api/v1/datasets/{dataset_id}/fields"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let fields = body_json(res).await;
    assert_eq!(fields.as_array().unwrap().len(), 1);
    assert_eq!(fields[0]["field_name"], "NUTZUNG");

    // CSV export: header + 2 rows
    let res = request(
        &router,
        Method::GET,
        &format!("/api/v1/datasets/{dataset_id}/export/csv"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let csv_text = body_text(res).await;
    let lines: Vec<&str> = csv_text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "ID,Address,X,Y,User,Entry_Name,Year,NUTZUNG");
    assert!(lines.iter().any(|l| l.starts_with("p1,") && l.ends_with(",640")));

    // Second import of the same IDs conflicts
    let res = request(
        &router,
        Method::POST,
        &format!("/api/v1/datasets/{dataset_id}/import"),
        Some(&token),
        Some(serde_json::json!({
            "csv": "ID,X,Y\np1,1.0,2.0",
            "id_column": "ID",
            "x_column": "X",
            "y_column": "Y"
        })),
    )
    .await;
    let report = body_json(res).await;
    assert_eq!(report["imported"], 0);
    assert_eq!(report["total_errors"], 1);
}

#[tokio::test]
async fn mapping_area_limits_member_visibility() {
    let (state, _media) = make_state().await;
    state.auth.create_user("owner", "pw", false).await.unwrap();
    let member = state.auth.create_user("member", "pw", false).await.unwrap();
    let router = app_router(state);

    let owner_token = login(&router, "owner", "pw").await;
    let member_token = login(&router, "member", "pw").await;
    let dataset_id = create_dataset(&router, &owner_token, "Restricted").await;

    // Share with the member
    let res = request(
        &router,
        Method::PUT,
        &format!("/api/v1/datasets/{dataset_id}"),
        Some(&owner_token),
        Some(serde_json::json!({"shared_user_ids": [member.id], "enable_mapping_areas": true})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    // Two points: inside and outside the future area
    for (id_kurz, lon, lat) in [("IN", 0.0, 0.0), ("OUT", 1.0, 1.0)] {
        let res = request(
            &router,
            Method::POST,
            &format!("/api/v1/datasets/{dataset_id}/geometries"),
            Some(&owner_token),
            Some(serde_json::json!({"id_kurz": id_kurz, "lon": lon, "lat": lat})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    // Owner draws the central square and binds the member to it
    let res = request(
        &router,
        Method::POST,
        &format!("/api/v1/datasets/{dataset_id}/mapping-areas"),
        Some(&owner_token),
        Some(serde_json::json!({
            "name": "Central",
            "coordinates": [[-0.1, -0.1], [-0.1, 0.1], [0.1, 0.1], [0.1, -0.1]]
        })),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let area = body_json(res).await;
    let area_id = area["id"].as_str().unwrap();

    let res = request(
        &router,
        Method::PUT,
        &format!("/api/v1/datasets/{dataset_id}/mapping-areas/{area_id}/allocations"),
        Some(&owner_token),
        Some(serde_json::json!({"user_ids": [member.id]})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // Owner sees both points, the member only the inside one
    let res = request(
        &router,
        Method::GET,
        &format!("/api/v1/datasets/{dataset_id}/map-data"),
        Some(&owner_token),
        None,
    )
    .await;
    assert_eq!(body_json(res).await["map_data"].as_array().unwrap().len(), 2);

    let res = request(
        &router,
        Method::GET,
        &format!("/api/v1/datasets/{dataset_id}/map-data"),
        Some(&member_token),
        None,
    )
    .await;
    let member_view = body_json(res).await;
    let points = member_view["map_data"].as_array().unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0]["id_kurz"], "IN");

    // Detail access follows the same rule
    let outside_id = {
        let res = request(
            &router,
            Method::GET,
            &format!("/api/v1/datasets/{dataset_id}/map-data"),
            Some(&owner_token),
            None,
        )
        .await;
        let all = body_json(res).await;
        all["map_data"]
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["id_kurz"] == "OUT")
            .unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string()
    };

    let res = request(
        &router,
        Method::GET,
        &format!("/api/v1/geometries/{outside_id}"),
        Some(&member_token),
        None,
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // A member placing a point outside their polygon is refused
    let res = request(
        &router,
        Method::POST,
        &format!("/api/v1/datasets/{dataset_id}/geometries"),
        Some(&member_token),
        Some(serde_json::json!({"id_kurz": "M1", "lon": 2.0, "lat": 2.0})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Inside works
    let res = request(
        &router,
        Method::POST,
        &format!("/api/v1/datasets/{dataset_id}/geometries"),
        Some(&member_token),
        Some(serde_json::json!({"id_kurz": "M2", "lon": 0.05, "lat": 0.05})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn non_owner_cannot_modify_schema_or_areas() {
    let (state, _media) = make_state().await;
    state.auth.create_user("owner", "pw", false).await.unwrap();
    let member = state.auth.create_user("member", "pw", false).await.unwrap();
    state.auth.create_user("root", "pw", true).await.unwrap();
    let router = app_router(state);

    let owner_token = login(&router, "owner", "pw").await;
    let member_token = login(&router, "member", "pw").await;
    let root_token = login(&router, "root", "pw").await;
    let dataset_id = create_dataset(&router, &owner_token, "Locked").await;

    // Share read access with the member
    let res = request(
        &router,
        Method::PUT,
        &format!("/api/v1/datasets/{dataset_id}"),
        Some(&owner_token),
        Some(serde_json::json!({"shared_user_ids": [member.id]})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    // Member can read but not mutate
    let res = request(
        &router,
        Method::GET,
        &format!("/api/v1/datasets/{dataset_id}"),
        Some(&member_token),
        None,
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let field_body = serde_json::json!({"label": "Usage Code"});
    let res = request(
        &router,
        Method::POST,
        &format!("/api/v1/datasets/{dataset_id}/fields"),
        Some(&member_token),
        Some(field_body.clone()),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Superuser passes the owner gate
    let res = request(
        &router,
        Method::POST,
        &format!("/api/v1/datasets/{dataset_id}/fields"),
        Some(&root_token),
        Some(field_body),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let field = body_json(res).await;
    assert_eq!(field["field_name"], "usage_code");

    // Duplicate field name conflicts
    let res = request(
        &router,
        Method::POST,
        &format!("/api/v1/datasets/{dataset_id}/fields"),
        Some(&owner_token),
        Some(serde_json::json!({"label": "Usage Code"})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Degenerate polygon rejected at the boundary
    let res = request(
        &router,
        Method::POST,
        &format!("/api/v1/datasets/{dataset_id}/mapping-areas"),
        Some(&owner_token),
        Some(serde_json::json!({"name": "Line", "coordinates": [[0.0, 0.0], [1.0, 1.0]]})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn entry_values_roundtrip_with_types() {
    let (state, _media) = make_state().await;
    state.auth.create_user("owner", "pw", false).await.unwrap();
    let router = app_router(state);
    let token = login(&router, "owner", "pw").await;
    let dataset_id = create_dataset(&router, &token, "Typed").await;

    // Declare an integer field so the value row copies its type
    let res = request(
        &router,
        Method::POST,
        &format!("/api/v1/datasets/{dataset_id}/fields"),
        Some(&token),
        Some(serde_json::json!({"label": "Count", "field_type": "integer"})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = request(
        &router,
        Method::POST,
        &format!("/api/v1/datasets/{dataset_id}/geometries"),
        Some(&token),
        Some(serde_json::json!({"id_kurz": "G1", "lon": 16.3, "lat": 48.2})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let geometry_id = body_json(res).await["id"].as_str().unwrap().to_string();

    let res = request(
        &router,
        Method::POST,
        &format!("/api/v1/geometries/{geometry_id}/entries"),
        Some(&token),
        Some(serde_json::json!({"name": "2024 survey", "year": 2024})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let entry_id = body_json(res).await["id"].as_str().unwrap().to_string();

    // Single-entry dataset: a second entry is refused
    let res = request(
        &router,
        Method::POST,
        &format!("/api/v1/geometries/{geometry_id}/entries"),
        Some(&token),
        Some(serde_json::json!({"name": "again"})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = request(
        &router,
        Method::PUT,
        &format!("/api/v1/entries/{entry_id}/values"),
        Some(&token),
        Some(serde_json::json!({"values": {"count": "42", "note": "ok", "broken": null}})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let values = body_json(res).await;
    // Integer-typed field decodes as a number, unknown fields as text
    assert_eq!(values["values"]["count"], 42);
    assert_eq!(values["values"]["note"], "ok");
    assert_eq!(values["values"]["broken"], serde_json::Value::Null);
}

#[tokio::test]
async fn file_export_task_fails_without_files() {
    let (state, _media) = make_state().await;
    state.auth.create_user("owner", "pw", false).await.unwrap();
    let router = app_router(state);
    let token = login(&router, "owner", "pw").await;
    let dataset_id = create_dataset(&router, &token, "Empty").await;

    let res = request(
        &router,
        Method::POST,
        &format!("/api/v1/datasets/{dataset_id}/export/files"),
        Some(&token),
        Some(serde_json::json!({"organize_by": "geometry"})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::ACCEPTED);
    let task = body_json(res).await;
    let task_id = task["id"].as_str().unwrap().to_string();

    // The worker is fire-and-forget; poll until it reaches a terminal
    // state.
    let mut status = String::new();
    for _ in 0..50 {
        let res = request(
            &router,
            Method::GET,
            &format!("/api/v1/export-tasks/{task_id}"),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        status = body_json(res).await["status"].as_str().unwrap().to_string();
        if status == "completed" || status == "failed" {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    assert_eq!(status, "failed");
}

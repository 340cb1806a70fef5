use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use credprint_server::config::Config;
use credprint_server::registry::{AppRegistry, Repositories};
use credprint_server::render::photo::HttpPhotoLoader;
use credprint_server::repository::memory::Latency;
use credprint_server::repository::seed::VIEWER_ROLE_ID;
use credprint_server::routes::create_routes;
use credprint_server::services::SettingsStore;

const ADMIN: &str = "1";

fn app() -> Router {
    let config = Config::from_lookup(|_| None).unwrap();
    let registry = AppRegistry::new(
        Repositories::in_memory(Latency::none(), &config.seed_admin_email),
        SettingsStore::in_memory(),
        Arc::new(HttpPhotoLoader::new(Duration::from_secs(1)).unwrap()),
    );
    create_routes(registry, &config)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = raw(app, method, uri, user, body).await;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn raw(
    app: &Router,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn create_conf(app: &Router) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/events",
        Some(ADMIN),
        Some(json!({
            "name": "Conf",
            "date": "2026-11-05",
            "schema": { "name": { "type": "text", "required": true, "label": "Name" } }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn health_check_needs_no_user() {
    let app = app();
    let response = raw(&app, Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn api_requires_a_known_user() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/v1/events", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_ERROR");

    let (status, _) = send(&app, Method::GET, "/api/v1/events", Some("99"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn conf_scenario_rejects_blank_name_then_accepts() {
    let app = app();
    let event_id = create_conf(&app).await;
    let attendees = format!("/api/v1/events/{event_id}/attendees");

    let (status, body) = send(
        &app,
        Method::POST,
        &attendees,
        Some(ADMIN),
        Some(json!({ "customData": { "name": "" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["message"].as_str().unwrap().contains("name"));

    let (status, body) = send(
        &app,
        Method::POST,
        &attendees,
        Some(ADMIN),
        Some(json!({ "customData": { "name": "Alice" } })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["data"]["id"].as_i64().is_some());
    assert_eq!(body["data"]["printStatus"], "not-printed");

    let (_, body) = send(&app, Method::GET, &attendees, Some(ADMIN), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn last_administrator_cannot_be_deleted() {
    let app = app();
    let (status, body) = send(&app, Method::DELETE, "/api/v1/users/1", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["error"]["message"],
        "Cannot delete the last administrator"
    );

    let (status, _) = send(&app, Method::GET, "/api/v1/users/1", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn viewers_cannot_write() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/users",
        Some(ADMIN),
        Some(json!({ "name": "Vic", "email": "vic@example.com", "roleId": VIEWER_ROLE_ID })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let viewer = body["data"]["id"].as_i64().unwrap().to_string();

    let (status, _) = send(&app, Method::GET, "/api/v1/events", Some(&viewer), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/events",
        Some(&viewer),
        Some(json!({ "name": "Nope", "date": "2026-01-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn credential_is_served_as_png() {
    let app = app();
    let event_id = create_conf(&app).await;
    let (_, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/events/{event_id}/attendees"),
        Some(ADMIN),
        Some(json!({ "customData": { "name": "Alice" } })),
    )
    .await;
    let attendee_id = body["data"]["id"].as_i64().unwrap();

    let response = raw(
        &app,
        Method::GET,
        &format!("/api/v1/events/{event_id}/attendees/{attendee_id}/credential"),
        Some(ADMIN),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/events/{event_id}/attendees/999/credential"),
        Some(ADMIN),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn printing_updates_stats_and_dashboard() {
    let app = app();
    let event_id = create_conf(&app).await;
    let mut ids = Vec::new();
    for name in ["Alice", "Bob"] {
        let (_, body) = send(
            &app,
            Method::POST,
            &format!("/api/v1/events/{event_id}/attendees"),
            Some(ADMIN),
            Some(json!({ "customData": { "name": name } })),
        )
        .await;
        ids.push(body["data"]["id"].as_i64().unwrap());
    }

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/events/{event_id}/print"),
        Some(ADMIN),
        Some(json!({ "attendeeIds": [ids[0]] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/events/{event_id}/stats"),
        Some(ADMIN),
        None,
    )
    .await;
    assert_eq!(body["data"], json!({ "total": 2, "printed": 1, "notPrinted": 1 }));

    let (_, body) = send(&app, Method::GET, "/api/v1/dashboard", Some(ADMIN), None).await;
    assert_eq!(body["data"]["printedCredentials"], 1);
    assert_eq!(body["data"]["totalEvents"], 1);
}

#[tokio::test]
async fn unknown_ids_are_not_found_for_every_kind() {
    let app = app();
    for uri in [
        "/api/v1/events/404",
        "/api/v1/templates/404",
        "/api/v1/users/404",
        "/api/v1/roles/404",
    ] {
        let (status, _) = send(&app, Method::DELETE, uri, Some(ADMIN), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "DELETE {uri}");
        let (status, _) = send(&app, Method::PUT, uri, Some(ADMIN), Some(json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "PUT {uri}");
    }
}

#[tokio::test]
async fn settings_round_trip_and_reset() {
    let app = app();
    let (_, body) = send(&app, Method::GET, "/api/v1/settings", Some(ADMIN), None).await;
    let mut settings = body["data"].clone();
    assert_eq!(settings["general"]["appName"], "CredPrint Pro");

    settings["general"]["appName"] = json!("Front Desk");
    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/v1/settings",
        Some(ADMIN),
        Some(settings),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = send(&app, Method::GET, "/api/v1/settings", Some(ADMIN), None).await;
    assert_eq!(body["data"]["general"]["appName"], "Front Desk");

    let (_, body) = send(&app, Method::POST, "/api/v1/settings/reset", Some(ADMIN), None).await;
    assert_eq!(body["data"]["general"]["appName"], "CredPrint Pro");
}

#[tokio::test]
async fn editing_an_attendee_keeps_print_status() {
    let app = app();
    let event_id = create_conf(&app).await;
    let (_, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/events/{event_id}/attendees"),
        Some(ADMIN),
        Some(json!({ "customData": { "name": "Alice" } })),
    )
    .await;
    let attendee_id = body["data"]["id"].as_i64().unwrap();
    let attendee = format!("/api/v1/events/{event_id}/attendees/{attendee_id}");

    let (status, body) = send(
        &app,
        Method::PUT,
        &attendee,
        Some(ADMIN),
        Some(json!({ "customData": { "name": "Alicia" }, "printStatus": "printed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["customData"]["name"], "Alicia");
    assert_eq!(body["data"]["printStatus"], "not-printed");

    send(
        &app,
        Method::POST,
        &format!("/api/v1/events/{event_id}/print"),
        Some(ADMIN),
        Some(json!({ "attendeeIds": [attendee_id] })),
    )
    .await;
    let (_, body) = send(
        &app,
        Method::PUT,
        &attendee,
        Some(ADMIN),
        Some(json!({ "printStatus": "not-printed" })),
    )
    .await;
    assert_eq!(body["data"]["printStatus"], "printed");
}

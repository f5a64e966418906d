use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use chrono::{TimeDelta, Utc};
use http_body_util::BodyExt;
use radar_db::Database;
use radar_db::models::NewInvestment;
use radar_session::{AdminCredentials, SessionAuthority, SessionConfig, SessionFormat};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::auth::{AppState, AppStateInner};
use crate::router;

fn test_state() -> AppState {
    let sessions = SessionAuthority::new(SessionConfig {
        admin: AdminCredentials::from_password("admin", "admin123").unwrap(),
        secret: "router-test-secret".into(),
        ttl: TimeDelta::hours(24),
        format: SessionFormat::Signed,
    })
    .unwrap();

    Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        sessions,
        secure_cookies: false,
    })
}

fn seed(state: &AppState, title: &str, approved: bool) -> i64 {
    let row = state
        .db
        .insert_investment(&NewInvestment {
            title: title.into(),
            description: "Beschreibung".into(),
            kind: "Bildung".into(),
            location: "Geisenheim".into(),
            author_name: "Kim".into(),
            author_address: "Hauptstr. 1".into(),
            ..Default::default()
        })
        .unwrap();
    if approved {
        state.db.approve_investment(row.id).unwrap();
    }
    row.id
}

fn admin_cookie(state: &AppState) -> String {
    let issued = state.sessions.issue("admin", "admin123").unwrap();
    format!("session={}", issued.token)
}

fn expired_cookie(state: &AppState) -> String {
    let issued = state
        .sessions
        .issue_at("admin", "admin123", Utc::now() - TimeDelta::hours(25))
        .unwrap();
    format!("session={}", issued.token)
}

fn request(method: &str, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> Response {
    app.clone().oneshot(req).await.unwrap()
}

async fn json_body(resp: Response) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_cookie(resp: &Response) -> Option<String> {
    resp.headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string())
}

// -- Session --

#[tokio::test]
async fn login_sets_cookie_and_session_reads_it_back() {
    let state = test_state();
    let app = router(state);

    let resp = send(
        &app,
        request("POST", "/api/auth/login", None, Some(json!({ "username": "admin", "password": "admin123" }))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = set_cookie(&resp).unwrap();
    assert!(cookie.starts_with("session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
    assert_eq!(json_body(resp).await, json!({ "username": "admin", "isAdmin": true }));

    let pair = cookie.split(';').next().unwrap().to_string();
    let resp = send(&app, request("GET", "/api/auth/session", Some(&pair), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["isAdmin"], true);
}

#[tokio::test]
async fn wrong_password_issues_no_cookie() {
    let app = router(test_state());
    let resp = send(
        &app,
        request("POST", "/api/auth/login", None, Some(json!({ "username": "admin", "password": "guess" }))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie(&resp).is_none());
    assert_eq!(json_body(resp).await["error"]["reason"], "invalid_credentials");
}

#[tokio::test]
async fn blank_login_is_a_validation_error() {
    let app = router(test_state());
    let resp = send(
        &app,
        request("POST", "/api/auth/login", None, Some(json!({ "username": "", "password": "" }))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn session_check_distinguishes_failures() {
    let state = test_state();
    let expired = expired_cookie(&state);
    let app = router(state);

    let resp = send(&app, request("GET", "/api/auth/session", None, None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie(&resp).is_none());
    assert_eq!(json_body(resp).await["error"]["reason"], "missing");

    let resp = send(&app, request("GET", "/api/auth/session", Some("session=garbage"), None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookie(&resp).unwrap().starts_with("session=;"));
    assert_eq!(json_body(resp).await["error"]["reason"], "malformed");

    let resp = send(&app, request("GET", "/api/auth/session", Some(&expired), None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["error"]["reason"], "expired");
}

#[tokio::test]
async fn logout_clears_cookie() {
    let state = test_state();
    let cookie = admin_cookie(&state);
    let app = router(state);

    let resp = send(&app, request("POST", "/api/auth/logout", Some(&cookie), None)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(set_cookie(&resp).unwrap().starts_with("session=;"));
}

// -- Admin gate --

#[tokio::test]
async fn expired_credential_cannot_delete() {
    let state = test_state();
    let id = seed(&state, "Kita", true);
    let cookie = expired_cookie(&state);
    let app = router(state.clone());

    let resp = send(&app, request("DELETE", &format!("/api/investment/{id}"), Some(&cookie), None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(resp).await["error"]["reason"], "expired");
    assert!(state.db.get_investment(id).unwrap().is_some());
}

#[tokio::test]
async fn admin_routes_reject_uniformly_without_session() {
    let state = test_state();
    let id = seed(&state, "Sportplatz", false);
    let app = router(state.clone());

    let attempts = [
        request("DELETE", &format!("/api/investment/{id}"), None, None),
        request("POST", &format!("/api/investment/{id}/approve"), None, None),
        request("PUT", &format!("/api/investment/{id}"), None, Some(json!({ "approved": true }))),
        request("POST", "/api/finished-investments", None, Some(json!({}))),
    ];
    for req in attempts {
        let resp = send(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(resp).await["error"]["reason"], "missing");
    }

    let row = state.db.get_investment(id).unwrap().unwrap();
    assert!(!row.approved);
}

#[tokio::test]
async fn admin_can_approve_update_and_delete() {
    let state = test_state();
    let id = seed(&state, "Feuerwehr", false);
    let cookie = admin_cookie(&state);
    let app = router(state);

    let resp = send(&app, request("POST", &format!("/api/investment/{id}/approve"), Some(&cookie), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["approved"], true);

    let resp = send(
        &app,
        request("PUT", &format!("/api/investment/{id}"), Some(&cookie), Some(json!({ "title": "Feuerwehrhaus" }))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["title"], "Feuerwehrhaus");

    let resp = send(&app, request("PUT", &format!("/api/investment/{id}"), Some(&cookie), Some(json!({})))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(&app, request("DELETE", &format!("/api/investment/{id}"), Some(&cookie), None)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(&app, request("DELETE", &format!("/api/investment/{id}"), Some(&cookie), None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn likes_cannot_be_set_through_update() {
    let state = test_state();
    let id = seed(&state, "Bücherei", true);
    let cookie = admin_cookie(&state);
    let app = router(state);

    let resp = send(
        &app,
        request("PUT", &format!("/api/investment/{id}"), Some(&cookie), Some(json!({ "likes": 1000 }))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"]["reason"], "validation");
}

#[tokio::test]
async fn admin_moves_and_clears_coordinates() {
    let state = test_state();
    let id = seed(&state, "Rheinsteig", true);
    let cookie = admin_cookie(&state);
    let app = router(state);
    let uri = format!("/api/investment/{id}");

    // Seeded without coordinates: a lone latitude would leave half a pair
    let resp = send(&app, request("PUT", &uri, Some(&cookie), Some(json!({ "lat": 49.98 })))).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(&app, request("PUT", &uri, Some(&cookie), Some(json!({ "lat": 49.98, "lng": 7.93 })))).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(&app, request("PUT", &uri, Some(&cookie), Some(json!({ "lng": 7.95 })))).await;
    let body = json_body(resp).await;
    assert_eq!(body["lat"], 49.98);
    assert_eq!(body["lng"], 7.95);

    let resp = send(&app, request("PUT", &uri, Some(&cookie), Some(json!({ "lat": null, "lng": null })))).await;
    let body = json_body(resp).await;
    assert_eq!(body["lat"], Value::Null);
    assert_eq!(body["lng"], Value::Null);
}

#[tokio::test]
async fn unreadable_body_gets_error_envelope() {
    let app = router(test_state());
    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let resp = send(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = json_body(resp).await;
    assert_eq!(body["error"]["code"], 400);
    assert_eq!(body["error"]["reason"], "validation");
}

// -- Visibility --

#[tokio::test]
async fn unapproved_suggestions_are_admin_only() {
    let state = test_state();
    let public_id = seed(&state, "Öffentlich", true);
    let hidden_id = seed(&state, "Verborgen", false);
    let cookie = admin_cookie(&state);
    let app = router(state);

    let resp = send(&app, request("GET", "/api/investment", None, None)).await;
    let ids: Vec<i64> = json_body(resp)
        .await
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![public_id]);

    let resp = send(&app, request("GET", &format!("/api/investment/{hidden_id}"), None, None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(&app, request("GET", "/api/investment", Some(&cookie), None)).await;
    assert_eq!(json_body(resp).await.as_array().unwrap().len(), 2);

    let resp = send(&app, request("GET", &format!("/api/investment/{hidden_id}"), Some(&cookie), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn suggestion_is_created_unapproved() {
    let state = test_state();
    let app = router(state.clone());

    let resp = send(
        &app,
        request(
            "POST",
            "/api/investment",
            None,
            Some(json!({
                "title": "Glasfaser",
                "description": "Glasfaser für Stephanshausen",
                "type": "Digitale Infrastruktur",
                "location": "Stephanshausen",
                "lat": 50.0,
                "lng": 7.9,
                "authorName": "Kim",
                "authorAddress": "Hauptstr. 1",
            })),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_body(resp).await;
    assert_eq!(body["approved"], false);
    assert_eq!(body["likes"], 0);

    let resp = send(
        &app,
        request("POST", "/api/investment", None, Some(json!({
            "title": "",
            "description": "x",
            "type": "Bildung",
            "location": "x",
            "authorName": "x",
            "authorAddress": "x",
        }))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await["error"]["reason"], "validation");
}

// -- Likes --

#[tokio::test]
async fn like_protocol_round_trip() {
    let state = test_state();
    let id = seed(&state, "Radweg", true);
    let app = router(state);
    let uri = format!("/api/investment/{id}/like");

    // First like: 0 -> 1
    let resp = send(&app, request("POST", &uri, None, Some(json!({ "voterToken": "v1", "liked": [] })))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["investment"]["likes"], 1);
    assert_eq!(body["liked"], true);
    assert_eq!(body["membership"], json!({ "voterToken": "v1", "liked": [id] }));

    // Repeated cast with the remembered membership stays at 1
    let resp = send(&app, request("PUT", &uri, None, Some(json!({ "voterToken": "v1", "liked": [id] })))).await;
    let body = json_body(resp).await;
    assert_eq!(body["investment"]["likes"], 1);
    assert_eq!(body["liked"], true);

    // Toggle with membership retracts: 1 -> 0
    let resp = send(&app, request("POST", &uri, None, Some(json!({ "voterToken": "v1", "liked": [id] })))).await;
    let body = json_body(resp).await;
    assert_eq!(body["investment"]["likes"], 0);
    assert_eq!(body["liked"], false);
    assert_eq!(body["membership"]["liked"], json!([]));

    // Retract without membership is absorbed
    let resp = send(&app, request("DELETE", &uri, None, Some(json!({ "voterToken": "v1", "liked": [] })))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["investment"]["likes"], 0);
}

#[tokio::test]
async fn like_mints_voter_token_when_absent() {
    let state = test_state();
    let id = seed(&state, "Park", true);
    let app = router(state);

    let resp = send(&app, request("POST", &format!("/api/investment/{id}/like"), None, Some(json!({})))).await;
    let body = json_body(resp).await;
    let token = body["membership"]["voterToken"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(token).is_ok());
}

#[tokio::test]
async fn like_on_missing_investment_is_not_found() {
    let app = router(test_state());
    let resp = send(
        &app,
        request("POST", "/api/investment/404/like", None, Some(json!({ "voterToken": "v1" }))),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unapproved_suggestion_cannot_be_liked_anonymously() {
    let state = test_state();
    let id = seed(&state, "Verborgen", false);
    let cookie = admin_cookie(&state);
    let app = router(state.clone());
    let uri = format!("/api/investment/{id}/like");

    for method in ["PUT", "POST"] {
        let resp = send(&app, request(method, &uri, None, Some(json!({ "voterToken": "x" })))).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = json_body(resp).await;
        assert!(body.get("investment").is_none());
        assert_eq!(body["error"]["reason"], "not_found");
    }
    assert_eq!(state.db.get_investment(id).unwrap().unwrap().likes, 0);

    let resp = send(&app, request("PUT", &uri, Some(&cookie), Some(json!({ "voterToken": "x" })))).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["investment"]["likes"], 1);
}

#[tokio::test]
async fn concurrent_likes_from_distinct_voters() {
    let state = test_state();
    let id = seed(&state, "Marktplatz", true);
    let app = router(state.clone());

    let tasks: Vec<_> = (0..20)
        .map(|n| {
            let app = app.clone();
            tokio::spawn(async move {
                let req = request(
                    "POST",
                    &format!("/api/investment/{id}/like"),
                    None,
                    Some(json!({ "voterToken": format!("voter-{n}"), "liked": [] })),
                );
                app.oneshot(req).await.unwrap().status()
            })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }

    assert_eq!(state.db.get_investment(id).unwrap().unwrap().likes, 20);
}

// -- Finished investments --

#[tokio::test]
async fn admin_adds_finished_investment() {
    let state = test_state();
    let cookie = admin_cookie(&state);
    let app = router(state);

    let resp = send(
        &app,
        request(
            "POST",
            "/api/finished-investments",
            Some(&cookie),
            Some(json!({
                "title": "Neubau Kindertagesstätte",
                "description": "Vier Gruppen",
                "budget": 3500000,
                "completed": true,
                "region": "Johannisberg",
                "type": "Neubau",
                "location": "Johannisberg",
                "completedDate": "2025-09-01",
                "contractor": "Bau GmbH",
            })),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = send(&app, request("GET", "/api/finished-investments", None, None)).await;
    let list = json_body(resp).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["completedDate"], "2025-09-01");
}

#[tokio::test]
async fn health_is_public() {
    let app = router(test_state());
    let resp = send(&app, request("GET", "/healthz", None, None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use notey::config::Config;
use tower::ServiceExt;

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.general.upload_path = std::env::temp_dir()
        .join(format!("notey-test-{}", uuid::Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();

    let state = notey::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    notey::api::router(state).await
}

fn json_request(uri: &str, method: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Register a user and return the session cookie.
async fn register(app: &Router, username: &str, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "/api/auth/register",
            "POST",
            serde_json::json!({
                "username": username,
                "email": email,
                "password": "correct horse battery",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("registration should start a session")
        .to_str()
        .unwrap();
    cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn protected_routes_require_authentication() {
    let app = spawn_app().await;

    for uri in ["/api/projects", "/api/profile", "/api/auth/me"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/projects")
                .header("X-Api-Key", "wrong-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_probes_are_public() {
    let app = spawn_app().await;

    for uri in ["/api/health/live", "/api/health/ready"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}

#[tokio::test]
async fn landing_page_is_public() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_logs_the_user_in() {
    let app = spawn_app().await;
    let cookie = register(&app, "alice", "alice@example.com").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body_json["data"]["username"], "alice");
    assert_eq!(body_json["data"]["email"], "alice@example.com");
}

#[tokio::test]
async fn registration_rejects_duplicate_email_with_field_message() {
    let app = spawn_app().await;
    register(&app, "alice", "alice@example.com").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "/api/auth/register",
            "POST",
            serde_json::json!({
                "username": "alice2",
                "email": "alice@example.com",
                "password": "correct horse battery",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body_json["success"], false);
    assert_eq!(body_json["field"], "email");
}

#[tokio::test]
async fn login_with_wrong_password_is_rejected() {
    let app = spawn_app().await;
    register(&app, "alice", "alice@example.com").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "/api/auth/login",
            "POST",
            serde_json::json!({
                "username": "alice",
                "password": "not the password",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_issues_a_working_session() {
    let app = spawn_app().await;
    register(&app, "alice", "alice@example.com").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "/api/auth/login",
            "POST",
            serde_json::json!({
                "username": "alice",
                "password": "correct horse battery",
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login should start a session")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/projects")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body_json["data"], serde_json::json!([]));
}

#[tokio::test]
async fn profile_is_created_with_the_account() {
    let app = spawn_app().await;
    let cookie = register(&app, "alice", "alice@example.com").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/profile")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body_json["data"]["color"], "#ffffff");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/profile")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(Body::from(
                    serde_json::json!({ "color": "#3fa7d6" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let body_json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body_json["data"]["color"], "#3fa7d6");
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let app = spawn_app().await;
    let cookie = register(&app, "alice", "alice@example.com").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::auth_routes;
use auth_cell::handlers::{validate_token, verify_token};
use auth_cell::services::pkce::challenge_for;
use shared_models::error::AppError;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

struct Harness {
    server: MockServer,
    app: Router,
    secret: String,
}

impl Harness {
    async fn start() -> Self {
        let server = MockServer::start().await;
        let config = TestConfig::with_mock_server(&server.uri());
        let secret = config.jwt_secret.clone();
        let app = auth_routes(config.to_arc());
        Self { server, app, secret }
    }
}

fn auth_header(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "authorization",
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    headers
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_validate_token_success() {
    let config = Arc::new(TestConfig::default().to_app_config());
    let user = TestUser::default();
    let token = JwtTestUtils::create_test_token(&user, &config.supabase_jwt_secret, Some(24));

    let response = validate_token(State(config), auth_header(&token)).await.unwrap().0;

    assert!(response.valid);
    assert_eq!(response.user_id, user.id);
    assert_eq!(response.email, Some(user.email));
    assert_eq!(response.role.as_deref(), Some("authenticated"));
}

#[tokio::test]
async fn test_validate_token_missing_header() {
    let config = Arc::new(TestConfig::default().to_app_config());

    let result = validate_token(State(config), HeaderMap::new()).await;

    match result.unwrap_err() {
        AppError::Auth(msg) => assert_eq!(msg, "Missing authorization header"),
        other => panic!("Expected Auth error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_validate_token_expired() {
    let config = Arc::new(TestConfig::default().to_app_config());
    let user = TestUser::default();
    let token = JwtTestUtils::create_expired_token(&user, &config.supabase_jwt_secret);

    let result = validate_token(State(config), auth_header(&token)).await;

    assert!(matches!(result, Err(AppError::Auth(_))));
}

#[tokio::test]
async fn test_verify_token_reports_forged_signature_as_invalid() {
    let config = Arc::new(TestConfig::default().to_app_config());
    let token = JwtTestUtils::create_invalid_signature_token(&TestUser::default());

    let response = verify_token(State(config), auth_header(&token)).await.unwrap().0;

    assert_eq!(response, json!({ "valid": false }));
}

#[tokio::test]
async fn test_signup_creates_account_and_profile() {
    let harness = Harness::start().await;
    let user = TestUser::patient("ada@example.com");

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .and(body_partial_json(json!({ "email": "ada@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": user.id,
            "email": "ada@example.com"
        })))
        .expect(1)
        .mount(&harness.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockSupabaseResponses::session_response(user.id, "ada@example.com"),
        ))
        .expect(1)
        .mount(&harness.server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .and(header("authorization", "Bearer access-token"))
        .and(body_partial_json(json!({
            "id": user.id,
            "first_name": "Ada",
            "role": "patient",
            "onboarded": false
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::user_profile_response(user.id, "patient", "Ada", "Lovelace")
        ])))
        .expect(1)
        .mount(&harness.server)
        .await;

    let response = harness.app.clone().oneshot(json_request("POST", "/signup", json!({
        "email": " Ada@Example.com ",
        "password": "correct horse",
        "first_name": "Ada",
        "last_name": "Lovelace",
        "age": 36,
        "gender": "female"
    }))).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["session"]["access_token"], "access-token");
    assert_eq!(body["profile"]["role"], "patient");
}

#[tokio::test]
async fn test_signup_refuses_admin_role() {
    let harness = Harness::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&harness.server)
        .await;

    let response = harness.app.clone().oneshot(json_request("POST", "/signup", json!({
        "email": "mallory@example.com",
        "password": "password123",
        "first_name": "Mallory",
        "last_name": "Admin",
        "role": "admin"
    }))).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_signup_rejects_invalid_email() {
    let harness = Harness::start().await;

    let response = harness.app.clone().oneshot(json_request("POST", "/signup", json!({
        "email": "not-an-email",
        "password": "password123",
        "first_name": "Ada",
        "last_name": "Lovelace"
    }))).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let harness = Harness::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&harness.server)
        .await;

    let response = harness.app.clone().oneshot(json_request("POST", "/login", json!({
        "email": "ada@example.com",
        "password": "wrong-password"
    }))).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_magic_link_sends_s256_challenge_for_returned_verifier() {
    let harness = Harness::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/otp"))
        .and(query_param("redirect_to", "http://localhost:3000/auth/callback"))
        .and(body_partial_json(json!({
            "email": "ada@example.com",
            "code_challenge_method": "s256"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&harness.server)
        .await;

    let response = harness.app.clone().oneshot(json_request("POST", "/magic-link", json!({
        "email": "ada@example.com"
    }))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let verifier = body["code_verifier"].as_str().unwrap().to_string();

    let requests = harness.server.received_requests().await.unwrap();
    let sent: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(sent["code_challenge"], json!(challenge_for(&verifier)));
}

#[tokio::test]
async fn test_callback_without_code_is_bad_request() {
    let harness = Harness::start().await;

    let response = harness.app.clone().oneshot(
        Request::builder()
            .uri("/callback?code_verifier=abc")
            .body(Body::empty())
            .unwrap(),
    ).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_exchanges_code_and_points_to_onboarding() {
    let harness = Harness::start().await;
    let user = TestUser::patient("ada@example.com");

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "pkce"))
        .and(body_partial_json(json!({
            "auth_code": "the-code",
            "code_verifier": "the-verifier"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            MockSupabaseResponses::session_response(user.id, "ada@example.com"),
        ))
        .expect(1)
        .mount(&harness.server)
        .await;

    let response = harness.app.clone().oneshot(
        Request::builder()
            .uri("/callback?code=the-code&code_verifier=the-verifier")
            .body(Body::empty())
            .unwrap(),
    ).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["redirect_to"], "/onboard");
    assert_eq!(body["session"]["user"]["id"], json!(user.id));
}

#[tokio::test]
async fn test_session_and_logout_require_a_token() {
    let harness = Harness::start().await;

    for (method, uri) in [("GET", "/session"), ("POST", "/logout")] {
        let response = harness.app.clone().oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        ).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{} {}", method, uri);
    }
}

#[tokio::test]
async fn test_session_returns_current_auth_user() {
    let harness = Harness::start().await;
    let user = TestUser::patient("ada@example.com");
    let token = JwtTestUtils::create_test_token(&user, &harness.secret, Some(1));

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": user.id,
            "email": "ada@example.com",
            "created_at": "2024-01-01T00:00:00Z",
            "last_sign_in_at": null
        })))
        .mount(&harness.server)
        .await;

    let response = harness.app.clone().oneshot(
        Request::builder()
            .uri("/session")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap(),
    ).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["user"]["email"], "ada@example.com");
}

#[tokio::test]
async fn test_logout_revokes_session() {
    let harness = Harness::start().await;
    let user = TestUser::patient("ada@example.com");
    let token = JwtTestUtils::create_test_token(&user, &harness.secret, Some(1));

    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&harness.server)
        .await;

    let response = harness.app.clone().oneshot(
        Request::builder()
            .method("POST")
            .uri("/logout")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap(),
    ).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

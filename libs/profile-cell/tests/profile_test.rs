use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use profile_cell::profile_routes;
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
        let app = profile_routes(config.to_arc());
        Self { server, app, secret }
    }

    fn token_for(&self, user: &TestUser) -> String {
        JwtTestUtils::create_test_token(user, &self.secret, Some(1))
    }

    async fn mount_profile(&self, user: &TestUser) {
        Mock::given(method("GET"))
            .and(path("/rest/v1/users"))
            .and(query_param("id", format!("eq.{}", user.id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([user.profile_json()])))
            .mount(&self.server)
            .await;
    }
}

fn request(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token));

    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_me_returns_own_profile() {
    let harness = Harness::start().await;
    let patient = TestUser::patient("patient@example.com");

    harness.mount_profile(&patient).await;

    let response = harness.app.clone().oneshot(request(
        "GET",
        "/me",
        &harness.token_for(&patient),
        None,
    )).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["id"], json!(patient.id));
    assert_eq!(body["role"], "patient");
}

#[tokio::test]
async fn test_me_without_profile_row_is_not_found() {
    let harness = Harness::start().await;
    let user = TestUser::patient("new@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&harness.server)
        .await;

    let response = harness.app.clone().oneshot(request(
        "GET",
        "/me",
        &harness.token_for(&user),
        None,
    )).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_onboard_patches_own_row() {
    let harness = Harness::start().await;
    let patient = TestUser::patient("patient@example.com");

    let mut updated = MockSupabaseResponses::user_profile_response(patient.id, "patient", "Ada", "Lovelace");
    updated["age"] = json!(36);

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", patient.id)))
        .and(body_partial_json(json!({
            "first_name": "Ada",
            "age": 36,
            "onboarded": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([updated])))
        .expect(1)
        .mount(&harness.server)
        .await;

    let response = harness.app.clone().oneshot(request(
        "POST",
        "/onboard",
        &harness.token_for(&patient),
        Some(json!({ "first_name": " Ada ", "age": 36 })),
    )).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["profile"]["onboarded"], true);
}

#[tokio::test]
async fn test_doctor_directory() {
    let harness = Harness::start().await;
    let patient = TestUser::patient("patient@example.com");
    let doctor = TestUser::doctor("doctor@example.com");

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("role", "eq.doctor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::user_profile_response(doctor.id, "doctor", "Grace", "Hopper")
        ])))
        .mount(&harness.server)
        .await;

    let response = harness.app.clone().oneshot(request(
        "GET",
        "/doctors",
        &harness.token_for(&patient),
        None,
    )).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["doctors"][0]["first_name"], "Grace");
}

#[tokio::test]
async fn test_doctor_searches_patients_by_last_name() {
    let harness = Harness::start().await;
    let doctor = TestUser::doctor("doctor@example.com");
    let patient = TestUser::patient("patient@example.com");

    harness.mount_profile(&doctor).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("role", "eq.patient"))
        .and(query_param("last_name", "ilike.*O'Brien*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::user_profile_response(patient.id, "patient", "Sean", "O'Brien")
        ])))
        .expect(1)
        .mount(&harness.server)
        .await;

    let response = harness.app.clone().oneshot(request(
        "GET",
        "/search?last_name=O%27Brien",
        &harness.token_for(&doctor),
        None,
    )).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["patients"][0]["last_name"], "O'Brien");
}

#[tokio::test]
async fn test_patients_cannot_search() {
    let harness = Harness::start().await;
    let patient = TestUser::patient("patient@example.com");

    harness.mount_profile(&patient).await;

    let response = harness.app.clone().oneshot(request(
        "GET",
        "/search?first_name=Ada",
        &harness.token_for(&patient),
        None,
    )).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_search_rejects_injected_filters() {
    let harness = Harness::start().await;
    let doctor = TestUser::doctor("doctor@example.com");

    harness.mount_profile(&doctor).await;

    let response = harness.app.clone().oneshot(request(
        "GET",
        "/search?first_name=a%2Crole.eq.admin",
        &harness.token_for(&doctor),
        None,
    )).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

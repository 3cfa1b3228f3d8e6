use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use prescription_cell::prescription_routes;
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
        let app = prescription_routes(config.to_arc());
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
async fn test_doctor_issues_prescription() {
    let harness = Harness::start().await;
    let doctor = TestUser::doctor("doctor@example.com");
    let patient = TestUser::patient("patient@example.com");
    let prescription_id = Uuid::new_v4();

    harness.mount_profile(&doctor).await;
    harness.mount_profile(&patient).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/prescriptions"))
        .and(body_partial_json(json!({
            "doctor_id": doctor.id,
            "patient_id": patient.id,
            "medication_name": "Amoxicillin",
            "dosage": "500mg",
            "status": "active"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::prescription_response(prescription_id, doctor.id, patient.id)
        ])))
        .expect(1)
        .mount(&harness.server)
        .await;

    let response = harness.app.clone().oneshot(request(
        "POST",
        "/",
        &harness.token_for(&doctor),
        Some(json!({
            "patient_id": patient.id,
            "medication_name": " Amoxicillin ",
            "dosage": "500mg",
            "instructions": "Three times daily"
        })),
    )).await.unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["prescription"]["id"], json!(prescription_id));
}

#[tokio::test]
async fn test_patient_cannot_issue_prescription() {
    let harness = Harness::start().await;
    let patient = TestUser::patient("patient@example.com");
    let other = TestUser::patient("other@example.com");

    harness.mount_profile(&patient).await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/prescriptions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&harness.server)
        .await;

    let response = harness.app.clone().oneshot(request(
        "POST",
        "/",
        &harness.token_for(&patient),
        Some(json!({
            "patient_id": other.id,
            "medication_name": "Aspirin",
            "dosage": "100mg"
        })),
    )).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_prescription_target_must_be_a_patient() {
    let harness = Harness::start().await;
    let doctor = TestUser::doctor("doctor@example.com");
    let colleague = TestUser::doctor("colleague@example.com");

    harness.mount_profile(&doctor).await;
    harness.mount_profile(&colleague).await;

    let response = harness.app.clone().oneshot(request(
        "POST",
        "/",
        &harness.token_for(&doctor),
        Some(json!({
            "patient_id": colleague.id,
            "medication_name": "Aspirin",
            "dosage": "100mg"
        })),
    )).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_dosage_is_rejected() {
    let harness = Harness::start().await;
    let doctor = TestUser::doctor("doctor@example.com");

    harness.mount_profile(&doctor).await;

    let response = harness.app.clone().oneshot(request(
        "POST",
        "/",
        &harness.token_for(&doctor),
        Some(json!({
            "patient_id": Uuid::new_v4(),
            "medication_name": "Aspirin",
            "dosage": "  "
        })),
    )).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_patient_listing_never_leaks_other_patients_rows() {
    let harness = Harness::start().await;
    let doctor = TestUser::doctor("doctor@example.com");
    let patient = TestUser::patient("patient@example.com");
    let stranger = TestUser::patient("stranger@example.com");

    harness.mount_profile(&patient).await;

    // a permissive policy returns a row that belongs to someone else
    Mock::given(method("GET"))
        .and(path("/rest/v1/prescriptions"))
        .and(query_param("patient_id", format!("eq.{}", patient.id)))
        .and(query_param("order", "issued_date.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::prescription_response(Uuid::new_v4(), doctor.id, patient.id),
            MockSupabaseResponses::prescription_response(Uuid::new_v4(), doctor.id, stranger.id),
        ])))
        .expect(1)
        .mount(&harness.server)
        .await;

    let response = harness.app.clone().oneshot(request(
        "GET",
        "/",
        &harness.token_for(&patient),
        None,
    )).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["prescriptions"][0]["patient_id"], json!(patient.id));
}

#[tokio::test]
async fn test_doctor_listing_is_scoped_to_issuer() {
    let harness = Harness::start().await;
    let doctor = TestUser::doctor("doctor@example.com");
    let patient = TestUser::patient("patient@example.com");

    harness.mount_profile(&doctor).await;

    let mut row = MockSupabaseResponses::prescription_response(Uuid::new_v4(), doctor.id, patient.id);
    row["patient"] = json!({ "first_name": "Ada", "last_name": "Lovelace" });

    Mock::given(method("GET"))
        .and(path("/rest/v1/prescriptions"))
        .and(query_param("doctor_id", format!("eq.{}", doctor.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .expect(1)
        .mount(&harness.server)
        .await;

    let response = harness.app.clone().oneshot(request(
        "GET",
        "/",
        &harness.token_for(&doctor),
        None,
    )).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["prescriptions"][0]["patient"]["first_name"], "Ada");
}

#[tokio::test]
async fn test_only_issuing_doctor_updates_status() {
    let harness = Harness::start().await;
    let issuer = TestUser::doctor("issuer@example.com");
    let admin = TestUser::admin("admin@example.com");
    let patient = TestUser::patient("patient@example.com");
    let prescription_id = Uuid::new_v4();

    harness.mount_profile(&admin).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/prescriptions"))
        .and(query_param("id", format!("eq.{}", prescription_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::prescription_response(prescription_id, issuer.id, patient.id)
        ])))
        .mount(&harness.server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/prescriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&harness.server)
        .await;

    let response = harness.app.clone().oneshot(request(
        "PATCH",
        &format!("/{}/status", prescription_id),
        &harness.token_for(&admin),
        Some(json!({ "status": "completed" })),
    )).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_issuer_completes_active_prescription() {
    let harness = Harness::start().await;
    let doctor = TestUser::doctor("doctor@example.com");
    let patient = TestUser::patient("patient@example.com");
    let prescription_id = Uuid::new_v4();

    harness.mount_profile(&doctor).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/prescriptions"))
        .and(query_param("id", format!("eq.{}", prescription_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::prescription_response(prescription_id, doctor.id, patient.id)
        ])))
        .mount(&harness.server)
        .await;

    let mut completed = MockSupabaseResponses::prescription_response(prescription_id, doctor.id, patient.id);
    completed["status"] = json!("completed");

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/prescriptions"))
        .and(query_param("status", "eq.active"))
        .and(body_partial_json(json!({ "status": "completed" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([completed])))
        .expect(1)
        .mount(&harness.server)
        .await;

    let response = harness.app.clone().oneshot(request(
        "PATCH",
        &format!("/{}/status", prescription_id),
        &harness.token_for(&doctor),
        Some(json!({ "status": "completed" })),
    )).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["prescription"]["status"], "completed");
}

#[tokio::test]
async fn test_completed_prescription_cannot_change_again() {
    let harness = Harness::start().await;
    let doctor = TestUser::doctor("doctor@example.com");
    let patient = TestUser::patient("patient@example.com");
    let prescription_id = Uuid::new_v4();

    harness.mount_profile(&doctor).await;

    let mut completed = MockSupabaseResponses::prescription_response(prescription_id, doctor.id, patient.id);
    completed["status"] = json!("completed");

    Mock::given(method("GET"))
        .and(path("/rest/v1/prescriptions"))
        .and(query_param("id", format!("eq.{}", prescription_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([completed])))
        .mount(&harness.server)
        .await;

    let response = harness.app.clone().oneshot(request(
        "PATCH",
        &format!("/{}/status", prescription_id),
        &harness.token_for(&doctor),
        Some(json!({ "status": "cancelled" })),
    )).await.unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

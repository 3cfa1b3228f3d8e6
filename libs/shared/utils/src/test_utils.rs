use std::sync::Arc;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use base64::{Engine as _, engine::general_purpose};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub hms_api_base_url: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            hms_api_base_url: "http://localhost:54322".to_string(),
        }
    }
}

impl TestConfig {
    /// Point both Supabase and 100ms at a mock server.
    pub fn with_mock_server(uri: &str) -> Self {
        Self {
            supabase_url: uri.to_string(),
            hms_api_base_url: uri.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            site_url: "http://localhost:3000".to_string(),
            bind_address: "127.0.0.1:0".to_string(),
            hms_access_key: "test-hms-access-key".to_string(),
            hms_app_secret: "test-hms-app-secret".to_string(),
            hms_api_base_url: self.hms_api_base_url.clone(),
            hms_template_id: None,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            role: "patient".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            email: Some(self.email.clone()),
            role: Some("authenticated".to_string()),
            metadata: None,
            created_at: Some(Utc::now()),
        }
    }

    /// The `users` row this test user would have.
    pub fn profile_json(&self) -> serde_json::Value {
        MockSupabaseResponses::user_profile_response(self.id, &self.role, "Test", &self.role)
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": "authenticated",
            "aud": "authenticated",
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn user_profile_response(user_id: Uuid, role: &str, first_name: &str, last_name: &str) -> serde_json::Value {
        json!({
            "id": user_id,
            "first_name": first_name,
            "last_name": last_name,
            "age": 40,
            "gender": "other",
            "role": role,
            "onboarded": true,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn session_response(user_id: Uuid, email: &str) -> serde_json::Value {
        json!({
            "access_token": "access-token",
            "refresh_token": "refresh-token",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": Utc::now().timestamp() + 3600,
            "user": {
                "id": user_id,
                "email": email,
                "created_at": "2024-01-01T00:00:00Z",
                "last_sign_in_at": null
            }
        })
    }

    pub fn booking_response(booking_id: Uuid, user_id: Uuid, date: &str, slot: &str) -> serde_json::Value {
        json!({
            "id": booking_id,
            "user_id": user_id,
            "scheduled_date": date,
            "time_slot": slot,
            "status": "confirmed",
            "reason": "Checkup",
            "notes": null,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn chat_room_response(room_id: Uuid, doctor_id: Uuid, patient_id: Uuid) -> serde_json::Value {
        json!({
            "id": room_id,
            "doctor_id": doctor_id,
            "patient_id": patient_id,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn message_response(seq: i64, room_id: Uuid, sender_id: Uuid, text: &str) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "seq": seq,
            "room_id": room_id,
            "sender_id": sender_id,
            "message": text,
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn prescription_response(prescription_id: Uuid, doctor_id: Uuid, patient_id: Uuid) -> serde_json::Value {
        json!({
            "id": prescription_id,
            "doctor_id": doctor_id,
            "patient_id": patient_id,
            "medication_name": "Amoxicillin",
            "dosage": "500mg",
            "instructions": "Three times daily",
            "issued_date": "2024-01-01T00:00:00Z",
            "status": "active"
        })
    }

    pub fn unique_violation_response(constraint: &str) -> serde_json::Value {
        json!({
            "code": "23505",
            "details": null,
            "hint": null,
            "message": format!("duplicate key value violates unique constraint \"{}\"", constraint)
        })
    }
}

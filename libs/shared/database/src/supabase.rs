use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{AuthUser, Session};
use shared_models::profile::UserProfile;

/// SQLSTATE raised by Postgres for a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Error, Debug)]
pub enum SupabaseError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SupabaseError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, SupabaseError::Conflict(_))
    }

    /// Classify a non-success response from PostgREST or GoTrue.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();

        let code = parsed
            .as_ref()
            .and_then(|v| v.get("code"))
            .and_then(|c| c.as_str().map(str::to_string).or_else(|| Some(c.to_string())));

        let message = parsed
            .as_ref()
            .and_then(|v| {
                ["message", "msg", "error_description", "error"]
                    .iter()
                    .find_map(|key| v.get(*key).and_then(Value::as_str))
            })
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string());

        if code.as_deref() == Some(UNIQUE_VIOLATION) {
            return SupabaseError::Conflict(message);
        }

        match status.as_u16() {
            401 | 403 => SupabaseError::Auth(message),
            404 => SupabaseError::NotFound(message),
            409 => SupabaseError::Conflict(message),
            other => SupabaseError::Api { status: other, message },
        }
    }
}

pub type SupabaseResult<T> = Result<T, SupabaseError>;

/// Thin client over Supabase's PostgREST (`/rest/v1`) and GoTrue (`/auth/v1`) APIs.
///
/// Requests forward the caller's access token so row-level security is
/// evaluated as that user.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        match HeaderValue::from_str(&self.anon_key) {
            Ok(value) => {
                headers.insert("apikey", value);
            }
            Err(_) => warn!("Supabase anon key is not a valid header value"),
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("Access token is not a valid header value"),
            }
        }

        headers
    }

    /// `Prefer` header for PostgREST writes, e.g. `return=representation`.
    pub fn prefer(directive: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static(directive));
        headers
    }

    pub async fn request<T>(&self, method: Method, path: &str,
                            auth_token: Option<&str>, body: Option<Value>)
                            -> SupabaseResult<T>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(&self, method: Method, path: &str,
                                         auth_token: Option<&str>, body: Option<Value>,
                                         extra_headers: Option<HeaderMap>)
                                         -> SupabaseResult<T>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers(auth_token);
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url)
            .headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            error!("API error ({}): {}", status, text);
            return Err(SupabaseError::from_response(status, &text));
        }

        // 204 and `return=minimal` responses carry no body
        let text = if text.trim().is_empty() { "null" } else { text.as_str() };
        let data = serde_json::from_str::<T>(text)?;
        Ok(data)
    }

    // ------------------------------------------------------------------
    // GoTrue
    // ------------------------------------------------------------------

    /// Register an email/password account. Depending on the project's email
    /// confirmation setting GoTrue answers with a session or a bare user.
    pub async fn sign_up(&self, email: &str, password: &str) -> SupabaseResult<Value> {
        self.request(
            Method::POST,
            "/auth/v1/signup",
            None,
            Some(json!({ "email": email, "password": password })),
        ).await
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> SupabaseResult<Session> {
        self.request(
            Method::POST,
            "/auth/v1/token?grant_type=password",
            None,
            Some(json!({ "email": email, "password": password })),
        ).await
    }

    /// Send a magic link using the PKCE flow.
    pub async fn sign_in_with_otp(
        &self,
        email: &str,
        redirect_to: &str,
        code_challenge: &str,
    ) -> SupabaseResult<Value> {
        let path = format!(
            "/auth/v1/otp?redirect_to={}",
            urlencoding::encode(redirect_to)
        );

        self.request(
            Method::POST,
            &path,
            None,
            Some(json!({
                "email": email,
                "create_user": true,
                "code_challenge": code_challenge,
                "code_challenge_method": "s256"
            })),
        ).await
    }

    pub async fn exchange_code_for_session(
        &self,
        auth_code: &str,
        code_verifier: &str,
    ) -> SupabaseResult<Session> {
        self.request(
            Method::POST,
            "/auth/v1/token?grant_type=pkce",
            None,
            Some(json!({ "auth_code": auth_code, "code_verifier": code_verifier })),
        ).await
    }

    pub async fn get_user(&self, auth_token: &str) -> SupabaseResult<AuthUser> {
        self.request(Method::GET, "/auth/v1/user", Some(auth_token), None).await
    }

    pub async fn sign_out(&self, auth_token: &str) -> SupabaseResult<()> {
        self.request::<Value>(Method::POST, "/auth/v1/logout", Some(auth_token), None)
            .await
            .map(|_| ())
    }

    // ------------------------------------------------------------------
    // Profiles
    // ------------------------------------------------------------------

    /// Fetch the application profile (`users` row) for a user.
    pub async fn get_profile(&self, user_id: Uuid, auth_token: &str) -> SupabaseResult<Option<UserProfile>> {
        let path = format!("/rest/v1/users?id=eq.{}&limit=1", user_id);

        let result: Vec<UserProfile> = self.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await?;

        Ok(result.into_iter().next())
    }
}

use std::sync::Arc;

use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_database::{SupabaseClient, SupabaseError};
use shared_models::auth::{AuthUser, Session};
use shared_models::profile::{Role, UserProfile};
use shared_utils::validation::validate_email;

use crate::models::{
    AuthError, CallbackResponse, LoginRequest, MagicLinkResponse, SignupRequest, SignupResponse,
    MIN_PASSWORD_LENGTH,
};
use crate::services::pkce::PkcePair;

pub const ONBOARD_PATH: &str = "/onboard";

pub struct AuthService {
    supabase: Arc<SupabaseClient>,
    site_url: String,
}

impl AuthService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
            site_url: config.site_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create the account, sign in, then create the matching `users` row
    /// with the new session so row-level security sees its owner.
    pub async fn signup(&self, request: SignupRequest) -> Result<SignupResponse, AuthError> {
        let email = normalize_email(&request.email)?;
        check_password(&request.password)?;

        let first_name = request.first_name.trim();
        let last_name = request.last_name.trim();
        if first_name.is_empty() {
            return Err(AuthError::MissingField("first_name"));
        }
        if last_name.is_empty() {
            return Err(AuthError::MissingField("last_name"));
        }

        let role = request.role.unwrap_or(Role::Patient);
        if role == Role::Admin {
            warn!("Rejected self-assigned admin signup for {}", email);
            return Err(AuthError::AdminSignupForbidden);
        }

        self.supabase.sign_up(&email, &request.password).await?;
        let session = self.supabase.sign_in_with_password(&email, &request.password).await?;

        let inserted: Result<Vec<UserProfile>, SupabaseError> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/users",
            Some(&session.access_token),
            Some(json!({
                "id": session.user.id,
                "first_name": first_name,
                "last_name": last_name,
                "age": request.age,
                "gender": request.gender.as_deref().map(str::trim).filter(|g| !g.is_empty()),
                "role": role,
                "onboarded": false,
            })),
            Some(SupabaseClient::prefer("return=representation")),
        ).await;

        let profile = match inserted {
            Ok(rows) => rows.into_iter().next().ok_or_else(|| SupabaseError::Api {
                status: 500,
                message: "Profile insert returned no rows".to_string(),
            })?,
            Err(e) if e.is_conflict() => return Err(AuthError::ProfileExists),
            Err(e) => return Err(e.into()),
        };

        info!("New {} account {}", role, session.user.id);
        Ok(SignupResponse { session, profile })
    }

    pub async fn login(&self, request: LoginRequest) -> Result<Session, AuthError> {
        let email = normalize_email(&request.email)?;
        if request.password.is_empty() {
            return Err(AuthError::MissingField("password"));
        }

        match self.supabase.sign_in_with_password(&email, &request.password).await {
            Ok(session) => {
                info!("User {} signed in", session.user.id);
                Ok(session)
            }
            // GoTrue answers bad credentials with 400 invalid_grant
            Err(SupabaseError::Auth(_)) | Err(SupabaseError::Api { status: 400, .. }) => {
                Err(AuthError::InvalidCredentials)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Send a PKCE magic link. The verifier goes back to the client, which
    /// presents it with the emailed code at the callback.
    pub async fn magic_link(&self, email: &str) -> Result<MagicLinkResponse, AuthError> {
        let email = normalize_email(email)?;
        let pkce = PkcePair::generate();
        let redirect_to = format!("{}/auth/callback", self.site_url);

        self.supabase.sign_in_with_otp(&email, &redirect_to, &pkce.challenge).await?;

        debug!("Magic link sent to {}", email);
        Ok(MagicLinkResponse {
            message: "Magic link sent!".to_string(),
            code_verifier: pkce.verifier,
            redirect_to,
        })
    }

    pub async fn callback(
        &self,
        code: Option<&str>,
        code_verifier: Option<&str>,
    ) -> Result<CallbackResponse, AuthError> {
        let code = code
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(AuthError::MissingCode)?;
        let code_verifier = code_verifier
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or(AuthError::MissingVerifier)?;

        let session = self.supabase.exchange_code_for_session(code, code_verifier).await?;

        info!("User {} completed magic link sign-in", session.user.id);
        Ok(CallbackResponse {
            session,
            redirect_to: ONBOARD_PATH.to_string(),
        })
    }

    pub async fn session(&self, auth_token: &str) -> Result<AuthUser, AuthError> {
        Ok(self.supabase.get_user(auth_token).await?)
    }

    pub async fn logout(&self, auth_token: &str) -> Result<(), AuthError> {
        self.supabase.sign_out(auth_token).await?;
        Ok(())
    }
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    if !validate_email(&email) {
        return Err(AuthError::InvalidEmail);
    }
    Ok(email)
}

fn check_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(MIN_PASSWORD_LENGTH));
    }
    Ok(())
}

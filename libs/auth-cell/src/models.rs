use serde::{Deserialize, Serialize};

use shared_database::SupabaseError;
use shared_models::auth::Session;
use shared_models::error::AppError;
use shared_models::profile::{Role, UserProfile};
use shared_utils::profile::map_supabase_error;

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MagicLinkRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MagicLinkResponse {
    pub message: String,
    /// Must be presented back at the callback with the emailed code.
    pub code_verifier: String,
    pub redirect_to: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub code_verifier: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignupResponse {
    pub session: Session,
    pub profile: UserProfile,
}

#[derive(Debug, Clone, Serialize)]
pub struct CallbackResponse {
    pub session: Session,
    pub redirect_to: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Password must be at least {0} characters")]
    WeakPassword(usize),

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("The admin role cannot be self-assigned")]
    AdminSignupForbidden,

    #[error("Missing authorization code")]
    MissingCode,

    #[error("Missing PKCE code verifier")]
    MissingVerifier,

    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Account already has a profile")]
    ProfileExists,

    #[error(transparent)]
    Supabase(#[from] SupabaseError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => AppError::Auth(err.to_string()),
            AuthError::AdminSignupForbidden => AppError::Forbidden(err.to_string()),
            AuthError::ProfileExists => AppError::Conflict(err.to_string()),
            AuthError::Supabase(e) => map_supabase_error(e),
            AuthError::InvalidEmail
            | AuthError::WeakPassword(_)
            | AuthError::MissingField(_)
            | AuthError::MissingCode
            | AuthError::MissingVerifier => AppError::BadRequest(err.to_string()),
        }
    }
}

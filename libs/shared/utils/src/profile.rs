use tracing::debug;

use shared_database::supabase::{SupabaseClient, SupabaseError};
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::profile::UserProfile;

/// Map a Supabase failure onto the HTTP error surfaced to the caller.
pub fn map_supabase_error(err: SupabaseError) -> AppError {
    match err {
        SupabaseError::Auth(msg) => AppError::Auth(msg),
        SupabaseError::NotFound(msg) => AppError::NotFound(msg),
        SupabaseError::Conflict(msg) => AppError::Conflict(msg),
        SupabaseError::Api { status, message } if status < 500 => AppError::BadRequest(message),
        SupabaseError::Api { message, .. } => AppError::Database(message),
        SupabaseError::Http(e) => AppError::ExternalService(e.to_string()),
        SupabaseError::Decode(e) => AppError::Internal(format!("Unexpected response shape: {}", e)),
    }
}

/// Resolve the caller's application profile. Protected screens need a role,
/// so a signed-in user without a `users` row is treated as not permitted.
pub async fn load_caller_profile(
    supabase: &SupabaseClient,
    user: &User,
    auth_token: &str,
) -> Result<UserProfile, AppError> {
    debug!("Resolving profile for user {}", user.id);

    supabase
        .get_profile(user.id, auth_token)
        .await
        .map_err(map_supabase_error)?
        .ok_or_else(|| AppError::Forbidden("No profile exists for this account".to_string()))
}

use serde::{Deserialize, Serialize};

use shared_models::error::AppError;

pub const MAX_AGE: i32 = 130;
pub const MAX_NAME_LENGTH: usize = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OnboardRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Which column a patient search matches against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameFilter {
    FirstName(String),
    LastName(String),
}

impl NameFilter {
    pub fn column(&self) -> &'static str {
        match self {
            NameFilter::FirstName(_) => "first_name",
            NameFilter::LastName(_) => "last_name",
        }
    }

    pub fn term(&self) -> &str {
        match self {
            NameFilter::FirstName(term) | NameFilter::LastName(term) => term,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Profile not found")]
    NotFound,

    #[error("Only doctors and admins can search patients")]
    SearchNotAllowed,

    #[error("Provide first_name or last_name to search")]
    MissingSearchTerm,

    #[error("Search terms may only contain letters, spaces, apostrophes and hyphens")]
    InvalidSearchTerm,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<ProfileError> for AppError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::NotFound => AppError::NotFound(err.to_string()),
            ProfileError::SearchNotAllowed => AppError::Forbidden(err.to_string()),
            ProfileError::MissingSearchTerm
            | ProfileError::InvalidSearchTerm
            | ProfileError::ValidationError(_) => AppError::BadRequest(err.to_string()),
            ProfileError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

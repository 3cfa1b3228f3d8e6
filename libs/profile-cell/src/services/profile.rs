use std::sync::Arc;

use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::profile::{Role, UserProfile};
use shared_utils::validation::validate_name_term;

use crate::models::{NameFilter, OnboardRequest, ProfileError, SearchQuery, MAX_AGE, MAX_NAME_LENGTH};

pub struct ProfileService {
    supabase: Arc<SupabaseClient>,
}

impl ProfileService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn me(&self, user_id: Uuid, auth_token: &str) -> Result<UserProfile, ProfileError> {
        self.supabase
            .get_profile(user_id, auth_token)
            .await
            .map_err(|e| ProfileError::DatabaseError(e.to_string()))?
            .ok_or(ProfileError::NotFound)
    }

    /// Apply the provided fields to the caller's own row and mark it onboarded.
    pub async fn onboard(
        &self,
        user_id: Uuid,
        request: OnboardRequest,
        auth_token: &str,
    ) -> Result<UserProfile, ProfileError> {
        let changes = onboarding_changes(request)?;

        let path = format!("/rest/v1/users?id=eq.{}", user_id);

        let updated: Vec<UserProfile> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(Value::Object(changes)),
            Some(SupabaseClient::prefer("return=representation")),
        ).await.map_err(|e| ProfileError::DatabaseError(e.to_string()))?;

        let profile = updated.into_iter().next().ok_or(ProfileError::NotFound)?;

        info!("User {} completed onboarding", user_id);
        Ok(profile)
    }

    pub async fn doctors(&self, auth_token: &str) -> Result<Vec<UserProfile>, ProfileError> {
        let path = format!(
            "/rest/v1/users?role=eq.{}&order=last_name.asc,first_name.asc",
            Role::Doctor
        );

        let mut doctors: Vec<UserProfile> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| ProfileError::DatabaseError(e.to_string()))?;

        doctors.retain(UserProfile::is_doctor);
        Ok(doctors)
    }

    /// Case-insensitive substring search over patients, for clinicians.
    pub async fn search_patients(
        &self,
        caller: &UserProfile,
        query: SearchQuery,
        auth_token: &str,
    ) -> Result<Vec<UserProfile>, ProfileError> {
        if !(caller.is_doctor() || caller.is_admin()) {
            return Err(ProfileError::SearchNotAllowed);
        }

        let filter = parse_search(query)?;

        debug!("Patient search on {} by {}", filter.column(), caller.id);

        let path = format!(
            "/rest/v1/users?role=eq.{}&{}=ilike.{}&order=last_name.asc",
            Role::Patient,
            filter.column(),
            urlencoding::encode(&format!("*{}*", filter.term()))
        );

        let mut patients: Vec<UserProfile> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| ProfileError::DatabaseError(e.to_string()))?;

        patients.retain(UserProfile::is_patient);
        Ok(patients)
    }
}

fn onboarding_changes(request: OnboardRequest) -> Result<Map<String, Value>, ProfileError> {
    let mut changes = Map::new();

    for (field, value) in [
        ("first_name", request.first_name),
        ("last_name", request.last_name),
        ("gender", request.gender),
    ] {
        let Some(value) = value.map(|v| v.trim().to_string()) else {
            continue;
        };
        if value.is_empty() {
            return Err(ProfileError::ValidationError(format!("{} cannot be empty", field)));
        }
        if value.chars().count() > MAX_NAME_LENGTH {
            return Err(ProfileError::ValidationError(format!(
                "{} must be at most {} characters",
                field, MAX_NAME_LENGTH
            )));
        }
        changes.insert(field.to_string(), json!(value));
    }

    if let Some(age) = request.age {
        if !(0..=MAX_AGE).contains(&age) {
            return Err(ProfileError::ValidationError(format!(
                "age must be between 0 and {}",
                MAX_AGE
            )));
        }
        changes.insert("age".to_string(), json!(age));
    }

    changes.insert("onboarded".to_string(), json!(true));
    Ok(changes)
}

fn parse_search(query: SearchQuery) -> Result<NameFilter, ProfileError> {
    let clean = |v: Option<String>| v.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());

    let filter = match (clean(query.first_name), clean(query.last_name)) {
        (Some(term), _) => NameFilter::FirstName(term),
        (None, Some(term)) => NameFilter::LastName(term),
        (None, None) => return Err(ProfileError::MissingSearchTerm),
    };

    if !validate_name_term(filter.term()) {
        return Err(ProfileError::InvalidSearchTerm);
    }

    Ok(filter)
}

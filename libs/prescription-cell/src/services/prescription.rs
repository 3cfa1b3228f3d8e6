// libs/prescription-cell/src/services/prescription.rs
use std::sync::Arc;

use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::profile::{Role, UserProfile};

use crate::models::{
    IssuePrescriptionRequest, Prescription, PrescriptionError, PrescriptionStatus,
    MAX_FIELD_LENGTH, MAX_INSTRUCTIONS_LENGTH,
};

const NAMES_SELECT: &str = "*,doctor:users!prescriptions_doctor_id_fkey(first_name,last_name),patient:users!prescriptions_patient_id_fkey(first_name,last_name)";

pub struct PrescriptionService {
    supabase: Arc<SupabaseClient>,
}

impl PrescriptionService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    pub async fn issue(
        &self,
        caller: &UserProfile,
        request: IssuePrescriptionRequest,
        auth_token: &str,
    ) -> Result<Prescription, PrescriptionError> {
        if !caller.is_doctor() {
            return Err(PrescriptionError::NotDoctor);
        }

        let medication_name = required("medication_name", &request.medication_name, MAX_FIELD_LENGTH)?;
        let dosage = required("dosage", &request.dosage, MAX_FIELD_LENGTH)?;
        let instructions = request.instructions
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty());

        if instructions.is_some_and(|v| v.chars().count() > MAX_INSTRUCTIONS_LENGTH) {
            return Err(PrescriptionError::ValidationError(format!(
                "instructions must be at most {} characters",
                MAX_INSTRUCTIONS_LENGTH
            )));
        }

        let patient = self.supabase
            .get_profile(request.patient_id, auth_token)
            .await
            .map_err(|e| PrescriptionError::DatabaseError(e.to_string()))?
            .ok_or(PrescriptionError::PatientNotFound)?;

        if !patient.is_patient() {
            return Err(PrescriptionError::NotAPatient);
        }

        info!("Doctor {} issuing {} to patient {}", caller.id, medication_name, patient.id);

        let created: Vec<Prescription> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/prescriptions",
            Some(auth_token),
            Some(json!({
                "doctor_id": caller.id,
                "patient_id": patient.id,
                "medication_name": medication_name,
                "dosage": dosage,
                "instructions": instructions,
                "status": PrescriptionStatus::Active,
            })),
            Some(SupabaseClient::prefer("return=representation")),
        ).await.map_err(|e| PrescriptionError::DatabaseError(e.to_string()))?;

        created.into_iter().next()
            .ok_or_else(|| PrescriptionError::DatabaseError("Failed to create prescription".to_string()))
    }

    /// Role-scoped listing, newest first. Rows the caller is not party to are
    /// dropped even if the query returned them.
    pub async fn list(
        &self,
        caller: &UserProfile,
        auth_token: &str,
    ) -> Result<Vec<Prescription>, PrescriptionError> {
        let scope = match caller.role {
            Role::Doctor => format!("&doctor_id=eq.{}", caller.id),
            Role::Patient => format!("&patient_id=eq.{}", caller.id),
            Role::Admin => String::new(),
        };

        let path = format!(
            "/rest/v1/prescriptions?select={}{}&order=issued_date.desc",
            NAMES_SELECT, scope
        );

        debug!("Listing prescriptions for {} ({})", caller.id, caller.role);

        let mut prescriptions: Vec<Prescription> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| PrescriptionError::DatabaseError(e.to_string()))?;

        let returned = prescriptions.len();
        prescriptions.retain(|p| Self::can_view(caller, p));

        if prescriptions.len() != returned {
            warn!(
                "Dropped {} prescriptions outside the scope of {}",
                returned - prescriptions.len(),
                caller.id
            );
        }

        Ok(prescriptions)
    }

    pub async fn get(
        &self,
        caller: &UserProfile,
        prescription_id: Uuid,
        auth_token: &str,
    ) -> Result<Prescription, PrescriptionError> {
        let path = format!(
            "/rest/v1/prescriptions?select={}&id=eq.{}",
            NAMES_SELECT, prescription_id
        );

        let rows: Vec<Prescription> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| PrescriptionError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .next()
            .filter(|p| Self::can_view(caller, p))
            .ok_or(PrescriptionError::NotFound)
    }

    pub fn can_view(caller: &UserProfile, prescription: &Prescription) -> bool {
        caller.is_admin() || prescription.involves(caller.id)
    }

    /// Issuing doctor closes out an active prescription.
    pub async fn update_status(
        &self,
        caller: &UserProfile,
        prescription_id: Uuid,
        status: PrescriptionStatus,
        auth_token: &str,
    ) -> Result<Prescription, PrescriptionError> {
        if status == PrescriptionStatus::Active {
            return Err(PrescriptionError::InvalidTransition);
        }

        let current = self.get(caller, prescription_id, auth_token).await?;

        if current.doctor_id != caller.id {
            return Err(PrescriptionError::NotIssuer);
        }
        if current.status != PrescriptionStatus::Active {
            return Err(PrescriptionError::NotActive(current.status));
        }

        let path = format!(
            "/rest/v1/prescriptions?id=eq.{}&doctor_id=eq.{}&status=eq.{}",
            prescription_id,
            caller.id,
            PrescriptionStatus::Active
        );

        let updated: Vec<Prescription> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(json!({ "status": status })),
            Some(SupabaseClient::prefer("return=representation")),
        ).await.map_err(|e| PrescriptionError::DatabaseError(e.to_string()))?;

        // a concurrent change won the race
        let prescription = updated.into_iter().next()
            .ok_or(PrescriptionError::NotActive(current.status))?;

        info!("Prescription {} marked {}", prescription_id, status);
        Ok(prescription)
    }
}

fn required(field: &str, value: &str, max: usize) -> Result<String, PrescriptionError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(PrescriptionError::ValidationError(format!("{} is required", field)));
    }
    if value.chars().count() > max {
        return Err(PrescriptionError::ValidationError(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }

    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_required_trims() {
        assert_eq!(required("dosage", "  5 ml ", 10).unwrap(), "5 ml");
    }

    #[test]
    fn test_required_rejects_blank_and_long() {
        assert_matches!(required("dosage", "   ", 10), Err(PrescriptionError::ValidationError(_)));
        assert_matches!(required("dosage", "12345678901", 10), Err(PrescriptionError::ValidationError(_)));
    }
}

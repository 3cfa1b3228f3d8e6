// libs/prescription-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::profile::PersonName;

pub const MAX_FIELD_LENGTH: usize = 255;
pub const MAX_INSTRUCTIONS_LENGTH: usize = 2000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrescriptionStatus {
    Active,
    Completed,
    Cancelled,
}

impl fmt::Display for PrescriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrescriptionStatus::Active => write!(f, "active"),
            PrescriptionStatus::Completed => write!(f, "completed"),
            PrescriptionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub medication_name: String,
    pub dosage: String,
    pub instructions: Option<String>,
    pub issued_date: DateTime<Utc>,
    pub status: PrescriptionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor: Option<PersonName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<PersonName>,
}

impl Prescription {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.doctor_id == user_id || self.patient_id == user_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuePrescriptionRequest {
    pub patient_id: Uuid,
    pub medication_name: String,
    pub dosage: String,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: PrescriptionStatus,
}

#[derive(Debug, thiserror::Error)]
pub enum PrescriptionError {
    #[error("Only doctors can issue prescriptions")]
    NotDoctor,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Prescriptions can only be issued to patients")]
    NotAPatient,

    #[error("Prescription not found")]
    NotFound,

    #[error("Only the issuing doctor can change this prescription")]
    NotIssuer,

    #[error("Prescription is already {0}")]
    NotActive(PrescriptionStatus),

    #[error("Cannot move a prescription back to active")]
    InvalidTransition,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<PrescriptionError> for AppError {
    fn from(err: PrescriptionError) -> Self {
        match err {
            PrescriptionError::NotDoctor | PrescriptionError::NotIssuer => {
                AppError::Forbidden(err.to_string())
            }
            PrescriptionError::PatientNotFound | PrescriptionError::NotFound => {
                AppError::NotFound(err.to_string())
            }
            PrescriptionError::NotActive(_) => AppError::Conflict(err.to_string()),
            PrescriptionError::NotAPatient
            | PrescriptionError::InvalidTransition
            | PrescriptionError::ValidationError(_) => AppError::BadRequest(err.to_string()),
            PrescriptionError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

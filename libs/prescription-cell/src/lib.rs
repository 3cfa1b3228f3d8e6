//! # Prescription Cell
//!
//! Doctors issue prescriptions to patients; each prescription is visible only
//! to its issuing doctor, its patient, and admins.

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Prescription, PrescriptionError, PrescriptionStatus};
pub use router::prescription_routes;
pub use services::PrescriptionService;

//! # Profile Cell
//!
//! Application profiles (`users` rows): the caller's own profile and
//! onboarding, the doctor directory, and patient lookup for clinicians.

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::ProfileError;
pub use router::profile_routes;
pub use services::ProfileService;

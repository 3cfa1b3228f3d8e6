//! # Auth Cell
//!
//! Account lifecycle on top of Supabase GoTrue: password sign-up and login,
//! PKCE magic links, session lookup and logout, plus local token checks.

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::AuthError;
pub use router::auth_routes;
pub use services::AuthService;

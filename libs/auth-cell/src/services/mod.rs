pub mod auth;
pub mod pkce;

pub use auth::AuthService;
pub use pkce::PkcePair;

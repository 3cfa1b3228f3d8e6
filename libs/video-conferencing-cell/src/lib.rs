// libs/video-conferencing-cell/src/lib.rs
//! # Video Conferencing Cell
//!
//! Video calls between the two participants of a chat conversation, hosted
//! on 100ms. The backend never relays media: it makes sure a 100ms room
//! exists for the conversation and mints the SDK auth token the client
//! joins with.
//!
//! ```text
//! +-----------------------------------------------------+
//! |  handlers.rs    |  HTTP endpoint handlers           |
//! |  router.rs      |  Route definitions                |
//! |  models.rs      |  Claims, DTOs, errors             |
//! |  services/      |                                   |
//! |    hms.rs       |  100ms REST client + token minting|
//! |    call.rs      |  Participant check, join flow     |
//! +-----------------------------------------------------+
//! ```
//!
//! ## API Endpoints
//!
//! - `POST /video/conversations/{id}/join` - Join the call for a conversation
//! - `GET /video/health` - Configuration and connectivity check
//!
//! ## Configuration
//!
//! - `HMS_ACCESS_KEY` / `HMS_APP_SECRET` - 100ms app credentials
//! - `HMS_API_BASE_URL` - REST base URL (optional, defaults to production)
//! - `HMS_TEMPLATE_ID` - Room template (optional)

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{CallRole, JoinCallResponse, VideoConferencingError};
pub use router::video_conferencing_routes;
pub use services::{HmsClient, VideoCallService};

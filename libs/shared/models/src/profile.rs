use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Application role stored in `users.role`.
///
/// This is distinct from the `role` claim in a Supabase access token, which is
/// always `authenticated` for signed-in users.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Doctor,
    Patient,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Doctor => write!(f, "doctor"),
            Role::Patient => write!(f, "patient"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    #[serde(default = "default_role")]
    pub role: Role,
    #[serde(default)]
    pub onboarded: bool,
    pub created_at: Option<DateTime<Utc>>,
}

fn default_role() -> Role {
    Role::Patient
}

impl UserProfile {
    pub fn is_doctor(&self) -> bool {
        self.role == Role::Doctor
    }

    pub fn is_patient(&self) -> bool {
        self.role == Role::Patient
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Name columns embedded by PostgREST resource joins, e.g. `user:users(first_name,last_name)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PersonName {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

// libs/booking-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::profile::PersonName;

// ==============================================================================
// SLOTS
// ==============================================================================

/// The five bookable windows of a day. 13:00-14:00 is not offered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeSlot {
    #[serde(rename = "SLOT_09_10")]
    Slot09To10,
    #[serde(rename = "SLOT_10_11")]
    Slot10To11,
    #[serde(rename = "SLOT_11_12")]
    Slot11To12,
    #[serde(rename = "SLOT_12_13")]
    Slot12To13,
    #[serde(rename = "SLOT_14_15")]
    Slot14To15,
}

impl TimeSlot {
    pub const ALL: [TimeSlot; 5] = [
        TimeSlot::Slot09To10,
        TimeSlot::Slot10To11,
        TimeSlot::Slot11To12,
        TimeSlot::Slot12To13,
        TimeSlot::Slot14To15,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            TimeSlot::Slot09To10 => "SLOT_09_10",
            TimeSlot::Slot10To11 => "SLOT_10_11",
            TimeSlot::Slot11To12 => "SLOT_11_12",
            TimeSlot::Slot12To13 => "SLOT_12_13",
            TimeSlot::Slot14To15 => "SLOT_14_15",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeSlot::Slot09To10 => "09:00 - 10:00",
            TimeSlot::Slot10To11 => "10:00 - 11:00",
            TimeSlot::Slot11To12 => "11:00 - 12:00",
            TimeSlot::Slot12To13 => "12:00 - 13:00",
            TimeSlot::Slot14To15 => "14:00 - 15:00",
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ==============================================================================
// BOOKINGS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
    Completed,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Confirmed => write!(f, "confirmed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
            BookingStatus::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub time_slot: TimeSlot,
    pub status: BookingStatus,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    /// Embedded booking owner, present on doctor/admin listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<PersonName>,
}

impl Booking {
    pub fn is_live(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }
}

/// Projection used by the availability query.
#[derive(Debug, Clone, Deserialize)]
pub struct BookedSlot {
    pub time_slot: TimeSlot,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveSlotRequest {
    pub scheduled_date: NaiveDate,
    pub time_slot: TimeSlot,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotView {
    pub slot: TimeSlot,
    pub label: String,
}

impl From<TimeSlot> for SlotView {
    fn from(slot: TimeSlot) -> Self {
        Self { slot, label: slot.label().to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotAvailability {
    pub date: NaiveDate,
    pub available: Vec<SlotView>,
    pub booked_count: usize,
}

// ==============================================================================
// ERRORS
// ==============================================================================

pub const MAX_TEXT_LENGTH: usize = 1000;

#[derive(Debug, Clone, thiserror::Error)]
pub enum BookingError {
    #[error("Slot {slot} on {date} is already booked")]
    SlotTaken { date: NaiveDate, slot: TimeSlot },

    #[error("Cannot book a date in the past: {0}")]
    PastDate(NaiveDate),

    #[error("Booking not found")]
    NotFound,

    #[error("Booking is already cancelled")]
    AlreadyCancelled,

    #[error("Not authorized to access this booking")]
    Unauthorized,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::SlotTaken { .. } | BookingError::AlreadyCancelled => {
                AppError::Conflict(err.to_string())
            }
            BookingError::PastDate(_) | BookingError::ValidationError(_) => {
                AppError::BadRequest(err.to_string())
            }
            BookingError::NotFound => AppError::NotFound(err.to_string()),
            BookingError::Unauthorized => AppError::Forbidden(err.to_string()),
            BookingError::DatabaseError(msg) => AppError::Database(msg),
        }
    }
}

//! # Booking Cell
//!
//! Appointment booking against five fixed daily time slots.
//!
//! Availability is computed from a snapshot and is advisory. Reservation is a
//! single insert guarded by the partial unique index on
//! `bookings (scheduled_date, time_slot) WHERE status <> 'cancelled'`, so two
//! concurrent requests for the same slot can never both succeed: the loser gets
//! `409 Conflict`.
//!
//! ## API Endpoints
//!
//! - `GET /bookings/slots?date=YYYY-MM-DD` - free slots for a date
//! - `POST /bookings` - reserve a slot
//! - `GET /bookings` - list bookings visible to the caller
//! - `GET /bookings/{id}` - fetch one booking
//! - `POST /bookings/{id}/cancel` - cancel and release the slot

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{Booking, BookingError, BookingStatus, ReserveSlotRequest, SlotAvailability, TimeSlot};
pub use router::booking_routes;
pub use services::BookingService;

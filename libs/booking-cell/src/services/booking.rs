// libs/booking-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::{SupabaseClient, SupabaseError};
use shared_models::auth::User;
use shared_models::profile::{Role, UserProfile};

use crate::models::{
    BookedSlot, Booking, BookingError, BookingStatus, ReserveSlotRequest, SlotAvailability,
    SlotView, MAX_TEXT_LENGTH,
};
use crate::services::availability::free_slots;

pub struct BookingService {
    supabase: Arc<SupabaseClient>,
}

impl BookingService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    /// Advisory view of the free slots on `date`. The snapshot may be stale by
    /// the time the caller reserves; [`BookingService::reserve`] is authoritative.
    pub async fn available_slots(
        &self,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<SlotAvailability, BookingError> {
        debug!("Fetching booked slots for {}", date);

        // bookings rows are owner-scoped; the rpc exposes only live slots
        let booked: Vec<BookedSlot> = self.supabase.request(
            Method::POST,
            "/rest/v1/rpc/booked_slots",
            Some(auth_token),
            Some(json!({ "p_date": date })),
        ).await.map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let booked: Vec<_> = booked.into_iter().map(|b| b.time_slot).collect();
        let available = free_slots(&booked).into_iter().map(SlotView::from).collect();

        Ok(SlotAvailability {
            date,
            available,
            booked_count: booked.len(),
        })
    }

    /// Reserve-or-reject. The insert is the check: the database's unique index
    /// on live `(scheduled_date, time_slot)` rejects a second reservation.
    pub async fn reserve(
        &self,
        user: &User,
        request: ReserveSlotRequest,
        auth_token: &str,
    ) -> Result<Booking, BookingError> {
        self.validate_reservation(&request)?;

        info!("User {} reserving {} on {}", user.id, request.time_slot, request.scheduled_date);

        let booking_data = json!({
            "user_id": user.id,
            "scheduled_date": request.scheduled_date,
            "time_slot": request.time_slot,
            "status": BookingStatus::Confirmed,
            "reason": clean_text(request.reason),
            "notes": clean_text(request.notes),
        });

        let result: Result<Vec<Booking>, SupabaseError> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/bookings",
            Some(auth_token),
            Some(booking_data),
            Some(SupabaseClient::prefer("return=representation")),
        ).await;

        let created = match result {
            Ok(rows) => rows,
            Err(e) if e.is_conflict() => {
                warn!("Slot {} on {} already taken", request.time_slot, request.scheduled_date);
                return Err(BookingError::SlotTaken {
                    date: request.scheduled_date,
                    slot: request.time_slot,
                });
            }
            Err(e) => return Err(BookingError::DatabaseError(e.to_string())),
        };

        let booking = created.into_iter().next()
            .ok_or_else(|| BookingError::DatabaseError("Failed to create booking".to_string()))?;

        info!("Booking {} confirmed", booking.id);
        Ok(booking)
    }

    /// Doctors and admins see every booking with the owner's name; patients
    /// see their own.
    pub async fn list_bookings(
        &self,
        caller: &UserProfile,
        auth_token: &str,
    ) -> Result<Vec<Booking>, BookingError> {
        let path = match caller.role {
            Role::Doctor | Role::Admin => {
                "/rest/v1/bookings?select=*,user:users(first_name,last_name)&order=scheduled_date.asc,time_slot.asc"
                    .to_string()
            }
            Role::Patient => format!(
                "/rest/v1/bookings?select=*&user_id=eq.{}&order=scheduled_date.asc,time_slot.asc",
                caller.id
            ),
        };

        let mut bookings: Vec<Booking> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        if caller.role == Role::Patient {
            bookings.retain(|b| b.user_id == caller.id);
        }

        Ok(bookings)
    }

    pub async fn get_booking(
        &self,
        booking_id: Uuid,
        auth_token: &str,
    ) -> Result<Booking, BookingError> {
        let path = format!("/rest/v1/bookings?id=eq.{}", booking_id);

        let result: Vec<Booking> = self.supabase.request(
            Method::GET,
            &path,
            Some(auth_token),
            None,
        ).await.map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        result.into_iter().next().ok_or(BookingError::NotFound)
    }

    pub fn can_view(caller: &UserProfile, booking: &Booking) -> bool {
        booking.user_id == caller.id || matches!(caller.role, Role::Doctor | Role::Admin)
    }

    /// Cancel a live booking, releasing its slot for new reservations.
    pub async fn cancel(
        &self,
        caller: &UserProfile,
        booking_id: Uuid,
        auth_token: &str,
    ) -> Result<Booking, BookingError> {
        let booking = self.get_booking(booking_id, auth_token).await?;

        if !Self::can_view(caller, &booking) {
            return Err(BookingError::Unauthorized);
        }
        if !booking.is_live() {
            return Err(BookingError::AlreadyCancelled);
        }

        // status guard makes a concurrent double-cancel update zero rows
        let path = format!(
            "/rest/v1/bookings?id=eq.{}&status=neq.{}",
            booking_id,
            BookingStatus::Cancelled
        );

        let updated: Vec<Booking> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(auth_token),
            Some(json!({ "status": BookingStatus::Cancelled })),
            Some(SupabaseClient::prefer("return=representation")),
        ).await.map_err(|e| BookingError::DatabaseError(e.to_string()))?;

        let cancelled = updated.into_iter().next().ok_or(BookingError::AlreadyCancelled)?;

        info!("Booking {} cancelled by {}", booking_id, caller.id);
        Ok(cancelled)
    }

    fn validate_reservation(&self, request: &ReserveSlotRequest) -> Result<(), BookingError> {
        let today = Utc::now().date_naive();
        if request.scheduled_date < today {
            return Err(BookingError::PastDate(request.scheduled_date));
        }

        for (field, value) in [("reason", &request.reason), ("notes", &request.notes)] {
            if value.as_ref().is_some_and(|v| v.chars().count() > MAX_TEXT_LENGTH) {
                return Err(BookingError::ValidationError(format!(
                    "{} must be at most {} characters",
                    field, MAX_TEXT_LENGTH
                )));
            }
        }

        Ok(())
    }
}

fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

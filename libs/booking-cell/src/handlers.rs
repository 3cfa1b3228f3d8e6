// libs/booking-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::profile::load_caller_profile;

use crate::models::{AvailabilityQuery, BookingError, ReserveSlotRequest};
use crate::services::BookingService;

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let booking_service = BookingService::new(&state);

    let availability = booking_service.available_slots(query.date, auth.token()).await?;

    Ok(Json(json!(availability)))
}

#[axum::debug_handler]
pub async fn reserve_slot(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<ReserveSlotRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let booking_service = BookingService::new(&state);

    let booking = booking_service.reserve(&user, request, auth.token()).await?;

    Ok((StatusCode::CREATED, Json(json!({
        "success": true,
        "booking": booking,
        "message": "Booking confirmed"
    }))))
}

#[axum::debug_handler]
pub async fn list_bookings(
    State(state): State<Arc<AppConfig>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let supabase = Arc::new(SupabaseClient::new(&state));
    let caller = load_caller_profile(&supabase, &user, auth.token()).await?;

    let bookings = BookingService::with_client(supabase)
        .list_bookings(&caller, auth.token())
        .await?;

    Ok(Json(json!({
        "role": caller.role,
        "bookings": bookings,
        "total": bookings.len()
    })))
}

#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<Arc<AppConfig>>,
    Path(booking_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let supabase = Arc::new(SupabaseClient::new(&state));
    let caller = load_caller_profile(&supabase, &user, auth.token()).await?;

    let booking = BookingService::with_client(supabase)
        .get_booking(booking_id, auth.token())
        .await?;

    if !BookingService::can_view(&caller, &booking) {
        return Err(BookingError::Unauthorized.into());
    }

    Ok(Json(json!(booking)))
}

#[axum::debug_handler]
pub async fn cancel_booking(
    State(state): State<Arc<AppConfig>>,
    Path(booking_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let supabase = Arc::new(SupabaseClient::new(&state));
    let caller = load_caller_profile(&supabase, &user, auth.token()).await?;

    let booking = BookingService::with_client(supabase)
        .cancel(&caller, booking_id, auth.token())
        .await?;

    Ok(Json(json!({
        "success": true,
        "booking": booking,
        "message": "Booking cancelled"
    })))
}

//! Booking endpoints.
//!
//! ```text
//! POST /api/bookings                     create
//! GET  /api/bookings/:id                 fetch
//! PUT  /api/bookings/:id/cancel?reason=  cancel
//! PUT  /api/bookings/:id/complete        complete
//! GET  /api/requesters/:id/bookings      requester's bookings, newest first
//! GET  /api/providers/:id/bookings       provider's bookings, by appointment
//! ```

use crate::{AppState, WebResult};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use booking_core::{Booking, BookingId, BookingProviders, CreateBooking, ProviderId, RequesterId};
use serde::Deserialize;

/// Query string of the cancel endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct CancelParams {
    /// Free-text reason stored on the booking.
    pub reason: Option<String>,
}

/// Create a booking.
///
/// Returns `201 Created` with the booking. A full slot is `409` and a held
/// slot lock is `503`; both carry `"retryable": true`.
///
/// # Errors
///
/// Any [`booking_core::BookingError`], mapped by [`crate::AppError`].
pub async fn create_booking<P: BookingProviders>(
    State(state): State<AppState<P>>,
    Json(request): Json<CreateBooking>,
) -> WebResult<(StatusCode, Json<Booking>)> {
    let booking = state.service.create_booking(request).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Fetch one booking.
///
/// # Errors
///
/// `422` for a malformed id, `404` if no such booking exists.
pub async fn get_booking<P: BookingProviders>(
    State(state): State<AppState<P>>,
    Path(id): Path<String>,
) -> WebResult<Json<Booking>> {
    let id: BookingId = id.parse()?;
    Ok(Json(state.service.get_booking(id).await?))
}

/// Cancel a booking, returning its unit of capacity.
///
/// # Errors
///
/// `404`, `409` for a terminal booking or one inside the cutoff.
pub async fn cancel_booking<P: BookingProviders>(
    State(state): State<AppState<P>>,
    Path(id): Path<String>,
    Query(params): Query<CancelParams>,
) -> WebResult<StatusCode> {
    let id: BookingId = id.parse()?;
    let reason = params.reason.filter(|r| !r.trim().is_empty());
    state.service.cancel_booking(id, reason).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mark a booking completed.
///
/// # Errors
///
/// `404`, `409` for a terminal booking.
pub async fn complete_booking<P: BookingProviders>(
    State(state): State<AppState<P>>,
    Path(id): Path<String>,
) -> WebResult<StatusCode> {
    let id: BookingId = id.parse()?;
    state.service.complete_booking(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// A requester's bookings.
///
/// # Errors
///
/// `404` for an unknown requester.
pub async fn list_for_requester<P: BookingProviders>(
    State(state): State<AppState<P>>,
    Path(id): Path<String>,
) -> WebResult<Json<Vec<Booking>>> {
    let bookings = state
        .service
        .list_for_requester(&RequesterId::new(id))
        .await?;
    Ok(Json(bookings))
}

/// A provider's bookings.
///
/// # Errors
///
/// `404` for an unknown provider.
pub async fn list_for_provider<P: BookingProviders>(
    State(state): State<AppState<P>>,
    Path(id): Path<String>,
) -> WebResult<Json<Vec<Booking>>> {
    let bookings = state
        .service
        .list_for_provider(&ProviderId::new(id))
        .await?;
    Ok(Json(bookings))
}

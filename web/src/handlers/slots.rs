//! Slot endpoints.

use crate::{AppState, WebResult};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use booking_core::{BookingProviders, NewSlot, ScheduleSlot, SlotAvailability, SlotId};

/// `POST /api/slots`: register a slot for a known provider.
///
/// # Errors
///
/// `404` for an unknown provider, `422` for an invalid time window.
pub async fn register_slot<P: BookingProviders>(
    State(state): State<AppState<P>>,
    Json(slot): Json<NewSlot>,
) -> WebResult<(StatusCode, Json<ScheduleSlot>)> {
    let slot = state.service.register_slot(slot).await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

/// `GET /api/slots/:id/availability`
///
/// # Errors
///
/// `404` for an unknown slot.
pub async fn availability<P: BookingProviders>(
    State(state): State<AppState<P>>,
    Path(id): Path<i64>,
) -> WebResult<Json<SlotAvailability>> {
    Ok(Json(state.service.slot_availability(SlotId(id)).await?))
}

/// `DELETE /api/slots/:id`: withdraw a slot with no bookings.
///
/// # Errors
///
/// `404`, `409` while the slot has bookings, `503` if a create holds the
/// slot's lock.
pub async fn withdraw<P: BookingProviders>(
    State(state): State<AppState<P>>,
    Path(id): Path<i64>,
) -> WebResult<StatusCode> {
    state.service.withdraw_slot(SlotId(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

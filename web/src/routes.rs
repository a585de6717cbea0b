//! Router assembly.

use crate::handlers::{bookings, health_check, slots};
use crate::{AppState, correlation_id_layer};
use axum::{
    Router,
    routing::{delete, get, post, put},
};
use booking_core::BookingProviders;
use tower_http::trace::TraceLayer;

/// API router with tracing and correlation ID layers.
///
/// `/metrics` is served separately, see [`crate::metrics::metrics_router`].
pub fn router<P: BookingProviders>(state: AppState<P>) -> Router {
    let api = Router::new()
        .route("/bookings", post(bookings::create_booking::<P>))
        .route("/bookings/:id", get(bookings::get_booking::<P>))
        .route("/bookings/:id/cancel", put(bookings::cancel_booking::<P>))
        .route("/bookings/:id/complete", put(bookings::complete_booking::<P>))
        .route(
            "/requesters/:id/bookings",
            get(bookings::list_for_requester::<P>),
        )
        .route(
            "/providers/:id/bookings",
            get(bookings::list_for_provider::<P>),
        )
        .route("/slots", post(slots::register_slot::<P>))
        .route("/slots/:id", delete(slots::withdraw::<P>))
        .route("/slots/:id/availability", get(slots::availability::<P>));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
}

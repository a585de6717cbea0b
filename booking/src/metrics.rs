//! Booking metrics.
//!
//! Outcome counters and slot gauges recorded through the `metrics` facade.
//! Nothing is exported unless the application installs a recorder.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `booking_attempts_total{outcome}` - Create attempts by outcome (`booked`
//!   or the error kind)
//! - `booking_transitions_total{status}` - Cancel and complete transitions
//! - `booking_lock_contention_total` - Lock acquisitions refused as busy
//!
//! ## Gauges
//! - `booking_slot_available{slot_id}` - Remaining capacity of a slot
//!
//! ## Histograms
//! - `booking_create_duration_seconds` - Duration of the create workflow

use crate::error::Result;
use crate::types::{Booking, BookingStatus, SlotAvailability};
use metrics::{describe_counter, describe_gauge, describe_histogram};
use std::time::Duration;

/// Register descriptions of all booking metrics.
///
/// Call once at startup, after installing the recorder.
pub fn register_booking_metrics() {
    describe_counter!(
        "booking_attempts_total",
        "Booking create attempts by outcome (booked, busy, capacity_exceeded, ...)"
    );
    describe_counter!(
        "booking_transitions_total",
        "Booking status transitions by target status (cancelled, completed)"
    );
    describe_counter!(
        "booking_lock_contention_total",
        "Slot lock acquisitions refused because another attempt held the lock"
    );
    describe_gauge!(
        "booking_slot_available",
        "Remaining capacity of a schedule slot"
    );
    describe_histogram!(
        "booking_create_duration_seconds",
        "Time taken by the create workflow, lock included"
    );

    tracing::info!("Booking metrics registered");
}

/// Record the outcome of one create attempt.
pub fn record_create_outcome(result: &Result<Booking>, elapsed: Duration) {
    let outcome = match result {
        Ok(_) => "booked",
        Err(e) => e.kind(),
    };
    metrics::counter!("booking_attempts_total", "outcome" => outcome).increment(1);
    metrics::histogram!("booking_create_duration_seconds").record(elapsed.as_secs_f64());
    tracing::debug!(outcome, elapsed_ms = elapsed.as_millis(), "Recorded create outcome");
}

/// Record a status transition.
pub fn record_transition(status: &BookingStatus) {
    metrics::counter!("booking_transitions_total", "status" => status.as_str()).increment(1);
}

/// Record a refused lock acquisition.
pub fn record_lock_contention() {
    metrics::counter!("booking_lock_contention_total").increment(1);
}

/// Record the current availability of a slot.
pub fn record_slot_availability(availability: &SlotAvailability) {
    metrics::gauge!(
        "booking_slot_available",
        "slot_id" => availability.slot_id.to_string()
    )
    .set(f64::from(availability.remaining));
}

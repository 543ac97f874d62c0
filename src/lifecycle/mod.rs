pub mod assignment;
pub mod escort;
pub mod expiry;
pub mod transitions;

use uuid::Uuid;

use crate::models::booking::BookingStatus;
use crate::state::AppState;

/// Counts a committed transition and fans it out on the event feed.
pub fn record_transition(state: &AppState, booking_id: Uuid, status: BookingStatus) {
    state
        .metrics
        .booking_transitions_total
        .with_label_values(&[status.as_str()])
        .inc();
    state.emit(booking_id, status);
}

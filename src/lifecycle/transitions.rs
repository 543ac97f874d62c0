use crate::error::AppError;
use crate::models::booking::BookingStatus;

pub fn can_transition(from: BookingStatus, to: BookingStatus) -> bool {
    use BookingStatus::*;

    matches!(
        (from, to),
        (PendingQuote, Quoted)
            | (PendingQuote, Cancelled)
            | (Quoted, Cancelled)
            | (Quoted, Booked)
            | (Booked, InTransit)
            | (InTransit, Delivered)
            | (Delivered, Completed)
    )
}

pub fn ensure(from: BookingStatus, to: BookingStatus) -> Result<(), AppError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition { from, to })
    }
}

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::access;
use crate::api::rest::{ok, Envelope};
use crate::error::AppError;
use crate::lifecycle::{record_transition, transitions};
use crate::models::account::Role;
use crate::models::booking::BookingStatus;
use crate::models::review::Review;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reviews", post(create_review))
        .route("/reviews/booking/:id", get(reviews_for_booking))
}

#[derive(Deserialize)]
pub struct CreateReviewRequest {
    pub booking_id: Uuid,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

/// A review closes out the booking: a delivered load moves to completed once
/// its shipper has signed off.
async fn create_review(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<Json<Envelope<Review>>, AppError> {
    let account = access::authorize(&state, &headers, &[Role::Shipper])?;

    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::BadRequest(
            "rating must be between 1 and 5".to_string(),
        ));
    }

    let mut booking = state
        .bookings
        .get_mut(&payload.booking_id)
        .ok_or_else(|| AppError::NotFound(format!("booking {} not found", payload.booking_id)))?;

    if booking.shipper_id != account.id {
        return Err(AppError::Forbidden(
            "booking belongs to another shipper".to_string(),
        ));
    }

    if !matches!(
        booking.status,
        BookingStatus::Delivered | BookingStatus::Completed
    ) {
        return Err(AppError::Conflict(
            "booking has not been delivered".to_string(),
        ));
    }

    let already_reviewed = state
        .reviews
        .iter()
        .any(|entry| entry.booking_id == booking.id);
    if already_reviewed {
        return Err(AppError::Conflict("booking already reviewed".to_string()));
    }

    let review = Review {
        id: Uuid::new_v4(),
        booking_id: booking.id,
        shipper_id: account.id,
        rating: payload.rating,
        comment: payload.comment,
        created_at: Utc::now(),
    };

    state.reviews.insert(review.id, review.clone());

    if booking.status == BookingStatus::Delivered {
        transitions::ensure(booking.status, BookingStatus::Completed)?;
        booking.status = BookingStatus::Completed;
        booking.updated_at = Utc::now();
        record_transition(&state, booking.id, BookingStatus::Completed);
    }

    info!(
        booking_id = %review.booking_id,
        rating = review.rating,
        "review submitted"
    );

    Ok(ok(review))
}

async fn reviews_for_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Vec<Review>>>, AppError> {
    access::authorize(
        &state,
        &headers,
        &[
            Role::Shipper,
            Role::Carrier,
            Role::Escort,
            Role::Admin,
            Role::Driver,
        ],
    )?;

    let reviews = state
        .reviews
        .iter()
        .filter(|entry| entry.booking_id == id)
        .map(|entry| entry.value().clone())
        .collect();

    Ok(ok(reviews))
}

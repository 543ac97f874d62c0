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
use crate::lifecycle::{assignment, record_transition};
use crate::lifecycle::assignment::AssignmentRequest;
use crate::models::account::Role;
use crate::models::booking::{Booking, BookingStatus};
use crate::models::fleet::{DriverStatus, VehicleStatus};
use crate::models::quote::{ProviderRole, Quote, QuoteStatus};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/quotes", post(submit_quote))
        .route("/quotes/available", get(available_bookings))
        .route("/quotes/my-quotes", get(my_quotes))
        .route("/quotes/won-jobs", get(won_jobs))
        .route("/quotes/booking/:id", get(quotes_for_booking))
        .route("/quotes/:id/accept", post(accept_quote))
}

#[derive(Deserialize)]
pub struct SubmitQuoteRequest {
    pub booking_id: Uuid,
    pub amount: f64,
    pub driver_id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub notes: String,
}

async fn submit_quote(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<SubmitQuoteRequest>,
) -> Result<Json<Envelope<Quote>>, AppError> {
    let account = access::authorize(&state, &headers, &[Role::Carrier, Role::Escort])?;
    let role = if account.role == Role::Carrier {
        ProviderRole::Carrier
    } else {
        ProviderRole::Escort
    };

    if payload.amount <= 0.0 {
        return Err(AppError::BadRequest(
            "amount must be greater than zero".to_string(),
        ));
    }

    if payload.notes.trim().is_empty() {
        return Err(AppError::BadRequest("notes are required".to_string()));
    }

    {
        let driver = state
            .drivers
            .get(&payload.driver_id)
            .ok_or_else(|| AppError::BadRequest("driver not found".to_string()))?;

        if driver.owner_id != account.id {
            return Err(AppError::BadRequest(
                "driver does not belong to provider".to_string(),
            ));
        }

        if driver.status != DriverStatus::Available {
            return Err(AppError::Conflict("driver is not available".to_string()));
        }
    }

    match role {
        ProviderRole::Carrier => {
            let vehicle_id = payload.vehicle_id.ok_or_else(|| {
                AppError::BadRequest("vehicle is required for carrier quotes".to_string())
            })?;

            let vehicle = state
                .vehicles
                .get(&vehicle_id)
                .ok_or_else(|| AppError::BadRequest("vehicle not found".to_string()))?;

            if vehicle.owner_id != account.id {
                return Err(AppError::BadRequest(
                    "vehicle does not belong to provider".to_string(),
                ));
            }

            if vehicle.status != VehicleStatus::Available {
                return Err(AppError::Conflict("vehicle is not available".to_string()));
            }
        }
        ProviderRole::Escort => {
            if payload.vehicle_id.is_some() {
                return Err(AppError::BadRequest(
                    "escort quotes do not carry a vehicle".to_string(),
                ));
            }
        }
    }

    let mut booking = state
        .bookings
        .get_mut(&payload.booking_id)
        .ok_or_else(|| AppError::NotFound(format!("booking {} not found", payload.booking_id)))?;

    if !matches!(
        booking.status,
        BookingStatus::PendingQuote | BookingStatus::Quoted
    ) {
        return Err(AppError::Conflict(
            "booking is no longer open for quotes".to_string(),
        ));
    }

    let duplicate = state.quotes.iter().any(|entry| {
        entry.booking_id == booking.id
            && entry.provider_id == account.id
            && entry.status == QuoteStatus::Pending
    });
    if duplicate {
        return Err(AppError::Conflict(
            "provider already has a pending quote for this booking".to_string(),
        ));
    }

    let quote = Quote {
        id: Uuid::new_v4(),
        booking_id: booking.id,
        provider_id: account.id,
        role,
        amount: payload.amount,
        driver_id: payload.driver_id,
        vehicle_id: payload.vehicle_id,
        notes: payload.notes,
        status: QuoteStatus::Pending,
        submitted_at: Utc::now(),
    };

    state.quotes.insert(quote.id, quote.clone());
    state.metrics.quotes_open.inc();

    if booking.status == BookingStatus::PendingQuote {
        booking.status = BookingStatus::Quoted;
        booking.updated_at = Utc::now();
        record_transition(&state, booking.id, BookingStatus::Quoted);
    }

    info!(
        quote_id = %quote.id,
        booking_id = %quote.booking_id,
        provider_id = %account.id,
        role = %quote.role,
        amount = quote.amount,
        "quote submitted"
    );

    Ok(ok(quote))
}

async fn available_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Envelope<Vec<Booking>>>, AppError> {
    let account = access::authorize(&state, &headers, &[Role::Carrier, Role::Escort])?;

    let bookings = state
        .bookings
        .iter()
        .filter(|entry| {
            matches!(
                entry.status,
                BookingStatus::PendingQuote | BookingStatus::Quoted
            )
        })
        .filter(|entry| account.role != Role::Escort || entry.requires_escort)
        .map(|entry| entry.value().clone())
        .collect();

    Ok(ok(bookings))
}

async fn my_quotes(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Envelope<Vec<Quote>>>, AppError> {
    let account = access::authorize(&state, &headers, &[Role::Carrier, Role::Escort])?;

    let quotes = state
        .quotes
        .iter()
        .filter(|entry| entry.provider_id == account.id)
        .map(|entry| entry.value().clone())
        .collect();

    Ok(ok(quotes))
}

async fn won_jobs(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Envelope<Vec<Quote>>>, AppError> {
    let account = access::authorize(&state, &headers, &[Role::Carrier, Role::Escort])?;

    let quotes = state
        .quotes
        .iter()
        .filter(|entry| {
            entry.provider_id == account.id && entry.status == QuoteStatus::Accepted
        })
        .map(|entry| entry.value().clone())
        .collect();

    Ok(ok(quotes))
}

async fn quotes_for_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Vec<Quote>>>, AppError> {
    let account = access::authorize(&state, &headers, &[Role::Admin, Role::Shipper])?;

    {
        let booking = state
            .bookings
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("booking {} not found", id)))?;

        if account.role == Role::Shipper && booking.shipper_id != account.id {
            return Err(AppError::Forbidden(
                "booking belongs to another shipper".to_string(),
            ));
        }
    }

    let quotes = state
        .quotes
        .iter()
        .filter(|entry| entry.booking_id == id)
        .map(|entry| entry.value().clone())
        .collect();

    Ok(ok(quotes))
}

#[derive(Deserialize)]
pub struct AcceptQuoteRequest {
    #[serde(default)]
    pub escort_quote_id: Option<Uuid>,
}

async fn accept_quote(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<AcceptQuoteRequest>,
) -> Result<Json<Envelope<Booking>>, AppError> {
    let account = access::authorize(&state, &headers, &[Role::Shipper])?;

    let booking_id = state
        .quotes
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("quote {} not found", id)))?
        .booking_id;

    {
        let booking = state
            .bookings
            .get(&booking_id)
            .ok_or_else(|| AppError::NotFound(format!("booking {} not found", booking_id)))?;

        if booking.shipper_id != account.id {
            return Err(AppError::Forbidden(
                "booking belongs to another shipper".to_string(),
            ));
        }
    }

    let request = AssignmentRequest {
        booking_id,
        carrier_quote_id: id,
        escort_quote_id: payload.escort_quote_id,
    };

    let booking = assignment::assign_providers(&state, &request)?;

    info!(
        booking_id = %booking.id,
        quote_id = %id,
        shipper_id = %account.id,
        "quote accepted by shipper"
    );

    Ok(ok(booking))
}

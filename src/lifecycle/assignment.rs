use std::time::Instant;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::lifecycle::{record_transition, transitions};
use crate::models::booking::{Booking, BookingStatus};
use crate::models::fleet::{DriverStatus, VehicleStatus};
use crate::models::quote::{ProviderRole, Quote, QuoteStatus};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AssignmentRequest {
    pub booking_id: Uuid,
    pub carrier_quote_id: Uuid,
    pub escort_quote_id: Option<Uuid>,
}

/// Binds one carrier quote (and optionally one escort quote) to a booking and
/// advances it to `booked`. The booking entry is held exclusively for the whole
/// commit, so a concurrent second acceptance observes `booked` and gets a 409.
pub fn assign_providers(state: &AppState, req: &AssignmentRequest) -> Result<Booking, AppError> {
    let start = Instant::now();
    let outcome = commit(state, req);

    let elapsed = start.elapsed().as_secs_f64();
    let label = if outcome.is_ok() { "success" } else { "error" };
    state
        .metrics
        .assignment_latency_seconds
        .with_label_values(&[label])
        .observe(elapsed);
    state
        .metrics
        .assignments_total
        .with_label_values(&[label])
        .inc();

    outcome
}

fn commit(state: &AppState, req: &AssignmentRequest) -> Result<Booking, AppError> {
    // Lock order: booking before quotes, everywhere.
    let mut booking = state
        .bookings
        .get_mut(&req.booking_id)
        .ok_or_else(|| AppError::NotFound(format!("booking {} not found", req.booking_id)))?;

    transitions::ensure(booking.status, BookingStatus::Booked)?;

    let carrier = validate_quote(state, req.carrier_quote_id, booking.id, ProviderRole::Carrier)?;
    let escort = match req.escort_quote_id {
        Some(id) => Some(validate_quote(state, id, booking.id, ProviderRole::Escort)?),
        None => None,
    };

    if booking.requires_escort && escort.is_none() {
        warn!(booking_id = %booking.id, "booking assigned without escort despite escort requirement");
    }

    accept_quote(state, carrier.id)?;
    if let Some(ref escort_quote) = escort {
        if let Err(err) = accept_quote(state, escort_quote.id) {
            // the expiry sweeper may have raced us on the escort quote; undo
            // the carrier acceptance so the booking stays assignable
            if let Some(mut quote) = state.quotes.get_mut(&carrier.id) {
                quote.status = QuoteStatus::Pending;
                state.metrics.quotes_open.inc();
            }
            return Err(err);
        }
    }

    claim_fleet(state, &carrier);

    booking.carrier_id = Some(carrier.provider_id);
    booking.escort_id = escort.as_ref().map(|quote| quote.provider_id);
    booking.agreed_price =
        Some(carrier.amount + escort.as_ref().map_or(0.0, |quote| quote.amount));
    booking.status = BookingStatus::Booked;
    booking.updated_at = Utc::now();

    let snapshot = booking.clone();
    drop(booking);

    state
        .metrics
        .provider_active_jobs
        .with_label_values(&[&carrier.provider_id.to_string()])
        .inc();
    if let Some(ref escort_quote) = escort {
        state
            .metrics
            .provider_active_jobs
            .with_label_values(&[&escort_quote.provider_id.to_string()])
            .inc();
    }

    record_transition(state, snapshot.id, snapshot.status);
    info!(
        booking_id = %snapshot.id,
        carrier_id = %carrier.provider_id,
        escort = escort.is_some(),
        agreed_price = snapshot.agreed_price,
        "providers assigned"
    );

    Ok(snapshot)
}

fn validate_quote(
    state: &AppState,
    quote_id: Uuid,
    booking_id: Uuid,
    role: ProviderRole,
) -> Result<Quote, AppError> {
    let quote = state
        .quotes
        .get(&quote_id)
        .ok_or_else(|| AppError::NotFound(format!("quote {} not found", quote_id)))?;

    if quote.booking_id != booking_id {
        return Err(AppError::BadRequest(format!(
            "quote {} does not belong to booking {}",
            quote_id, booking_id
        )));
    }

    if quote.role != role {
        return Err(AppError::BadRequest(format!(
            "quote {} is not a {} quote",
            quote_id, role
        )));
    }

    if quote.status != QuoteStatus::Pending {
        return Err(AppError::Conflict(format!(
            "quote {} is no longer pending",
            quote_id
        )));
    }

    Ok(quote.clone())
}

fn accept_quote(state: &AppState, quote_id: Uuid) -> Result<(), AppError> {
    let mut quote = state
        .quotes
        .get_mut(&quote_id)
        .ok_or_else(|| AppError::NotFound(format!("quote {} not found", quote_id)))?;

    if quote.status != QuoteStatus::Pending {
        return Err(AppError::Conflict(format!(
            "quote {} is no longer pending",
            quote_id
        )));
    }

    quote.status = QuoteStatus::Accepted;
    state.metrics.quotes_open.dec();
    Ok(())
}

fn claim_fleet(state: &AppState, carrier_quote: &Quote) {
    if let Some(mut driver) = state.drivers.get_mut(&carrier_quote.driver_id) {
        driver.status = DriverStatus::OnJob;
        driver.updated_at = Utc::now();
    }

    if let Some(vehicle_id) = carrier_quote.vehicle_id {
        if let Some(mut vehicle) = state.vehicles.get_mut(&vehicle_id) {
            vehicle.status = VehicleStatus::InUse;
            vehicle.updated_at = Utc::now();
        }
    }
}

/// Returns the accepted carrier quote that is moving a booking, if any.
pub fn accepted_carrier_quote(state: &AppState, booking_id: Uuid) -> Option<Quote> {
    state
        .quotes
        .iter()
        .find(|entry| {
            entry.booking_id == booking_id
                && entry.role == ProviderRole::Carrier
                && entry.status == QuoteStatus::Accepted
        })
        .map(|entry| entry.value().clone())
}

/// The login account of the driver named on the accepted carrier quote.
pub fn assigned_driver_account(state: &AppState, booking_id: Uuid) -> Option<Uuid> {
    let quote = accepted_carrier_quote(state, booking_id)?;
    let driver = state.drivers.get(&quote.driver_id)?;
    driver.account_id
}

/// Frees the driver and vehicle bound to a delivered booking and closes out
/// the provider job gauges.
pub fn release_fleet(state: &AppState, booking: &Booking) {
    if let Some(quote) = accepted_carrier_quote(state, booking.id) {
        if let Some(mut driver) = state.drivers.get_mut(&quote.driver_id) {
            driver.status = DriverStatus::Available;
            driver.updated_at = Utc::now();
        }

        if let Some(vehicle_id) = quote.vehicle_id {
            if let Some(mut vehicle) = state.vehicles.get_mut(&vehicle_id) {
                vehicle.status = VehicleStatus::Available;
                vehicle.updated_at = Utc::now();
            }
        }
    }

    for provider_id in [booking.carrier_id, booking.escort_id].into_iter().flatten() {
        state
            .metrics
            .provider_active_jobs
            .with_label_values(&[&provider_id.to_string()])
            .dec();
    }
}

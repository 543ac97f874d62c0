use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::access;
use crate::api::rest::{ok, Envelope};
use crate::error::AppError;
use crate::lifecycle::{assignment, escort, record_transition, transitions};
use crate::models::account::Role;
use crate::models::booking::{
    Address, Booking, BookingStatus, Cargo, DeliveryProof, Dimensions,
};
use crate::models::quote::QuoteStatus;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking).get(list_bookings))
        .route("/bookings/my-bookings", get(my_bookings))
        .route(
            "/bookings/:id",
            get(get_booking).put(update_booking).delete(delete_booking),
        )
        .route("/bookings/:id/status", patch(change_status))
}

#[derive(Deserialize)]
pub struct BookingPayload {
    pub cargo_type: String,
    pub description: String,
    pub dimensions: Dimensions,
    pub weight_lbs: f64,
    pub pickup: Address,
    pub delivery: Address,
    pub shipment_date: NaiveDate,
    #[serde(default)]
    pub flexible_dates: bool,
    #[serde(default)]
    pub requires_escort: bool,
    pub special_instructions: Option<String>,
}

fn validate_payload(payload: &BookingPayload) -> Result<(), AppError> {
    if payload.cargo_type.trim().is_empty() {
        return Err(AppError::BadRequest("cargo type is required".to_string()));
    }

    if payload.description.trim().is_empty() {
        return Err(AppError::BadRequest(
            "cargo description is required".to_string(),
        ));
    }

    let dims = &payload.dimensions;
    if dims.length_ft <= 0.0 || dims.width_ft <= 0.0 || dims.height_ft <= 0.0 {
        return Err(AppError::BadRequest(
            "dimensions must be positive".to_string(),
        ));
    }

    if payload.weight_lbs <= 0.0 {
        return Err(AppError::BadRequest("weight must be positive".to_string()));
    }

    for address in [&payload.pickup, &payload.delivery] {
        if address.street.trim().is_empty() || address.city.trim().is_empty() {
            return Err(AppError::BadRequest(
                "pickup and delivery addresses are required".to_string(),
            ));
        }
    }

    Ok(())
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<BookingPayload>,
) -> Result<Json<Envelope<Booking>>, AppError> {
    let account = access::authorize(&state, &headers, &[Role::Shipper])?;
    validate_payload(&payload)?;

    let requires_escort =
        escort::resolve_escort_flag(payload.requires_escort, &payload.dimensions);
    let now = Utc::now();

    let booking = Booking {
        id: Uuid::new_v4(),
        shipper_id: account.id,
        cargo: Cargo {
            cargo_type: payload.cargo_type,
            description: payload.description,
            dimensions: payload.dimensions,
            weight_lbs: payload.weight_lbs,
        },
        pickup: payload.pickup,
        delivery: payload.delivery,
        shipment_date: payload.shipment_date,
        flexible_dates: payload.flexible_dates,
        requires_escort,
        special_instructions: payload.special_instructions,
        status: BookingStatus::PendingQuote,
        carrier_id: None,
        escort_id: None,
        agreed_price: None,
        proof: None,
        created_at: now,
        updated_at: now,
    };

    state.bookings.insert(booking.id, booking.clone());
    record_transition(&state, booking.id, booking.status);

    info!(
        booking_id = %booking.id,
        shipper_id = %account.id,
        requires_escort,
        "booking created"
    );

    Ok(ok(booking))
}

async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Envelope<Vec<Booking>>>, AppError> {
    access::authorize(&state, &headers, &[Role::Admin])?;

    let bookings = state
        .bookings
        .iter()
        .map(|entry| entry.value().clone())
        .collect();

    Ok(ok(bookings))
}

async fn my_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Envelope<Vec<Booking>>>, AppError> {
    let account = access::authorize(
        &state,
        &headers,
        &[Role::Shipper, Role::Carrier, Role::Escort, Role::Driver],
    )?;

    let bookings: Vec<Booking> = match account.role {
        Role::Shipper => state
            .bookings
            .iter()
            .filter(|entry| entry.shipper_id == account.id)
            .map(|entry| entry.value().clone())
            .collect(),
        Role::Carrier => state
            .bookings
            .iter()
            .filter(|entry| entry.carrier_id == Some(account.id))
            .map(|entry| entry.value().clone())
            .collect(),
        Role::Escort => state
            .bookings
            .iter()
            .filter(|entry| entry.escort_id == Some(account.id))
            .map(|entry| entry.value().clone())
            .collect(),
        Role::Driver | Role::Admin => {
            let driver_ids: Vec<Uuid> = state
                .drivers
                .iter()
                .filter(|entry| entry.account_id == Some(account.id))
                .map(|entry| entry.id)
                .collect();

            let booking_ids: Vec<Uuid> = state
                .quotes
                .iter()
                .filter(|entry| {
                    entry.status == QuoteStatus::Accepted
                        && driver_ids.contains(&entry.driver_id)
                })
                .map(|entry| entry.booking_id)
                .collect();

            state
                .bookings
                .iter()
                .filter(|entry| booking_ids.contains(&entry.id))
                .map(|entry| entry.value().clone())
                .collect()
        }
    };

    Ok(ok(bookings))
}

async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Booking>>, AppError> {
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

    let booking = state
        .bookings
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("booking {} not found", id)))?;

    Ok(ok(booking.value().clone()))
}

async fn update_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<BookingPayload>,
) -> Result<Json<Envelope<Booking>>, AppError> {
    let account = access::authorize(&state, &headers, &[Role::Shipper])?;
    validate_payload(&payload)?;

    let mut booking = state
        .bookings
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("booking {} not found", id)))?;

    if booking.shipper_id != account.id {
        return Err(AppError::Forbidden(
            "booking belongs to another shipper".to_string(),
        ));
    }

    if !booking.status.is_editable() {
        return Err(AppError::Conflict(
            "booking can no longer be edited".to_string(),
        ));
    }

    let requires_escort =
        escort::resolve_escort_flag(payload.requires_escort, &payload.dimensions);

    booking.cargo = Cargo {
        cargo_type: payload.cargo_type,
        description: payload.description,
        dimensions: payload.dimensions,
        weight_lbs: payload.weight_lbs,
    };
    booking.pickup = payload.pickup;
    booking.delivery = payload.delivery;
    booking.shipment_date = payload.shipment_date;
    booking.flexible_dates = payload.flexible_dates;
    booking.requires_escort = requires_escort;
    booking.special_instructions = payload.special_instructions;
    booking.updated_at = Utc::now();

    Ok(ok(booking.clone()))
}

async fn delete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Booking>>, AppError> {
    let account = access::authorize(&state, &headers, &[Role::Shipper])?;

    {
        let booking = state
            .bookings
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("booking {} not found", id)))?;

        if booking.shipper_id != account.id {
            return Err(AppError::Forbidden(
                "booking belongs to another shipper".to_string(),
            ));
        }

        if !booking.status.is_editable() {
            return Err(AppError::Conflict(
                "booking can no longer be deleted".to_string(),
            ));
        }
    }

    let (_, booking) = state
        .bookings
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("booking {} not found", id)))?;

    reject_open_quotes(&state, id);

    info!(booking_id = %id, shipper_id = %account.id, "booking deleted");
    Ok(ok(booking))
}

#[derive(Deserialize)]
pub struct StatusChangeRequest {
    pub status: BookingStatus,
    pub proof: Option<DeliveryProof>,
}

fn validate_proof(proof: &DeliveryProof) -> Result<(), AppError> {
    if proof.photos.iter().filter(|p| !p.trim().is_empty()).count() == 0 {
        return Err(AppError::BadRequest(
            "at least one delivery photo is required".to_string(),
        ));
    }

    if proof.signature.trim().is_empty() {
        return Err(AppError::BadRequest("signature is required".to_string()));
    }

    if proof.receiver_name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "receiver name is required".to_string(),
        ));
    }

    Ok(())
}

async fn change_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusChangeRequest>,
) -> Result<Json<Envelope<Booking>>, AppError> {
    let account = access::authorize(
        &state,
        &headers,
        &[Role::Shipper, Role::Driver, Role::Admin],
    )?;

    let target = payload.status;
    // resolved before the booking entry is locked (lock order: booking, then quotes)
    let assigned_driver = assignment::assigned_driver_account(&state, id);

    let mut booking = state
        .bookings
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("booking {} not found", id)))?;

    match target {
        BookingStatus::Cancelled => {
            if account.role != Role::Admin && booking.shipper_id != account.id {
                return Err(AppError::Forbidden(
                    "booking belongs to another shipper".to_string(),
                ));
            }
            transitions::ensure(booking.status, target)?;
        }
        BookingStatus::InTransit => {
            if account.role != Role::Admin && assigned_driver != Some(account.id) {
                return Err(AppError::Forbidden(
                    "not the assigned driver for this load".to_string(),
                ));
            }
            transitions::ensure(booking.status, target)?;
        }
        BookingStatus::Delivered => {
            if account.role != Role::Admin && assigned_driver != Some(account.id) {
                return Err(AppError::Forbidden(
                    "not the assigned driver for this load".to_string(),
                ));
            }
            transitions::ensure(booking.status, target)?;

            let proof = payload
                .proof
                .ok_or_else(|| AppError::BadRequest("delivery proof is required".to_string()))?;
            validate_proof(&proof)?;
            booking.proof = Some(proof);
        }
        other => {
            return Err(AppError::BadRequest(format!(
                "status {other} cannot be set directly"
            )));
        }
    }

    booking.status = target;
    booking.updated_at = Utc::now();
    let snapshot = booking.clone();
    drop(booking);

    match target {
        BookingStatus::Cancelled => reject_open_quotes(&state, id),
        BookingStatus::Delivered => assignment::release_fleet(&state, &snapshot),
        _ => {}
    }

    record_transition(&state, id, target);
    info!(booking_id = %id, status = %target, "booking status changed");

    Ok(ok(snapshot))
}

fn reject_open_quotes(state: &AppState, booking_id: Uuid) {
    for mut entry in state.quotes.iter_mut() {
        if entry.booking_id == booking_id && entry.status == QuoteStatus::Pending {
            entry.status = QuoteStatus::Rejected;
            state.metrics.quotes_open.dec();
        }
    }
}

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Serialize;

use crate::access;
use crate::api::rest::{ok, Envelope};
use crate::error::AppError;
use crate::lifecycle::assignment::{self, AssignmentRequest};
use crate::models::account::Role;
use crate::models::booking::Booking;
use crate::models::quote::QuoteStatus;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/assign-providers", post(assign_providers))
        .route("/admin/stats", get(stats))
}

async fn assign_providers(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<AssignmentRequest>,
) -> Result<Json<Envelope<Booking>>, AppError> {
    access::authorize(&state, &headers, &[Role::Admin])?;

    let booking = assignment::assign_providers(&state, &payload)?;
    Ok(ok(booking))
}

#[derive(Serialize)]
struct AdminStats {
    bookings_total: usize,
    bookings_by_status: BTreeMap<&'static str, usize>,
    quotes_open: usize,
    quotes_accepted: usize,
    shippers: usize,
    providers: usize,
    drivers: usize,
}

async fn stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Envelope<AdminStats>>, AppError> {
    access::authorize(&state, &headers, &[Role::Admin])?;

    let mut bookings_by_status: BTreeMap<&'static str, usize> = BTreeMap::new();
    for entry in state.bookings.iter() {
        *bookings_by_status.entry(entry.status.as_str()).or_insert(0) += 1;
    }

    let quotes_open = state
        .quotes
        .iter()
        .filter(|entry| entry.status == QuoteStatus::Pending)
        .count();
    let quotes_accepted = state
        .quotes
        .iter()
        .filter(|entry| entry.status == QuoteStatus::Accepted)
        .count();

    let shippers = state
        .accounts
        .iter()
        .filter(|entry| entry.role == Role::Shipper)
        .count();
    let providers = state
        .accounts
        .iter()
        .filter(|entry| entry.role.is_provider())
        .count();
    let drivers = state
        .accounts
        .iter()
        .filter(|entry| entry.role == Role::Driver)
        .count();

    Ok(ok(AdminStats {
        bookings_total: state.bookings.len(),
        bookings_by_status,
        quotes_open,
        quotes_accepted,
        shippers,
        providers,
        drivers,
    }))
}

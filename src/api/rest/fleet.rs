use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::routing::{delete, patch, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::access;
use crate::api::rest::{ok, Envelope};
use crate::error::AppError;
use crate::models::account::Role;
use crate::models::fleet::{Driver, DriverStatus, Vehicle, VehicleStatus};
use crate::state::AppState;

const PROVIDER_ROLES: &[Role] = &[Role::Carrier, Role::Escort];

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/vehicles", post(create_vehicle).get(list_vehicles))
        .route("/vehicles/:id/status", patch(update_vehicle_status))
        .route("/vehicles/:id", delete(delete_vehicle))
        .route("/drivers", post(create_driver).get(list_drivers))
        .route("/drivers/:id/status", patch(update_driver_status))
        .route("/drivers/:id", delete(delete_driver))
}

#[derive(Deserialize)]
pub struct CreateVehicleRequest {
    pub label: String,
    pub vehicle_type: String,
    pub plate: String,
}

async fn create_vehicle(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateVehicleRequest>,
) -> Result<Json<Envelope<Vehicle>>, AppError> {
    let account = access::authorize(&state, &headers, PROVIDER_ROLES)?;

    if payload.label.trim().is_empty() {
        return Err(AppError::BadRequest("label is required".to_string()));
    }

    if payload.plate.trim().is_empty() {
        return Err(AppError::BadRequest("plate is required".to_string()));
    }

    let vehicle = Vehicle {
        id: Uuid::new_v4(),
        owner_id: account.id,
        label: payload.label,
        vehicle_type: payload.vehicle_type,
        plate: payload.plate,
        status: VehicleStatus::Available,
        updated_at: Utc::now(),
    };

    state.vehicles.insert(vehicle.id, vehicle.clone());
    Ok(ok(vehicle))
}

async fn list_vehicles(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Envelope<Vec<Vehicle>>>, AppError> {
    let account = access::authorize(&state, &headers, PROVIDER_ROLES)?;

    let vehicles = state
        .vehicles
        .iter()
        .filter(|entry| entry.owner_id == account.id)
        .map(|entry| entry.value().clone())
        .collect();

    Ok(ok(vehicles))
}

#[derive(Deserialize)]
pub struct UpdateVehicleStatusRequest {
    pub status: VehicleStatus,
}

async fn update_vehicle_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVehicleStatusRequest>,
) -> Result<Json<Envelope<Vehicle>>, AppError> {
    let account = access::authorize(&state, &headers, PROVIDER_ROLES)?;

    let mut vehicle = state
        .vehicles
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("vehicle {} not found", id)))?;

    if vehicle.owner_id != account.id {
        return Err(AppError::Forbidden(
            "vehicle belongs to another provider".to_string(),
        ));
    }

    vehicle.status = payload.status;
    vehicle.updated_at = Utc::now();

    Ok(ok(vehicle.clone()))
}

async fn delete_vehicle(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Vehicle>>, AppError> {
    let account = access::authorize(&state, &headers, PROVIDER_ROLES)?;

    {
        let vehicle = state
            .vehicles
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("vehicle {} not found", id)))?;

        if vehicle.owner_id != account.id {
            return Err(AppError::Forbidden(
                "vehicle belongs to another provider".to_string(),
            ));
        }

        if vehicle.status == VehicleStatus::InUse {
            return Err(AppError::Conflict(
                "vehicle is on an active job".to_string(),
            ));
        }
    }

    let (_, vehicle) = state
        .vehicles
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("vehicle {} not found", id)))?;

    Ok(ok(vehicle))
}

#[derive(Deserialize)]
pub struct CreateDriverRequest {
    pub name: String,
    pub license_number: String,
    pub account_id: Option<Uuid>,
}

async fn create_driver(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateDriverRequest>,
) -> Result<Json<Envelope<Driver>>, AppError> {
    let account = access::authorize(&state, &headers, PROVIDER_ROLES)?;

    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }

    if payload.license_number.trim().is_empty() {
        return Err(AppError::BadRequest(
            "license number is required".to_string(),
        ));
    }

    let driver = Driver {
        id: Uuid::new_v4(),
        owner_id: account.id,
        name: payload.name,
        license_number: payload.license_number,
        account_id: payload.account_id,
        status: DriverStatus::Available,
        updated_at: Utc::now(),
    };

    state.drivers.insert(driver.id, driver.clone());
    Ok(ok(driver))
}

async fn list_drivers(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Envelope<Vec<Driver>>>, AppError> {
    let account = access::authorize(&state, &headers, PROVIDER_ROLES)?;

    let drivers = state
        .drivers
        .iter()
        .filter(|entry| entry.owner_id == account.id)
        .map(|entry| entry.value().clone())
        .collect();

    Ok(ok(drivers))
}

#[derive(Deserialize)]
pub struct UpdateDriverStatusRequest {
    pub status: DriverStatus,
}

async fn update_driver_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDriverStatusRequest>,
) -> Result<Json<Envelope<Driver>>, AppError> {
    let account = access::authorize(&state, &headers, PROVIDER_ROLES)?;

    let mut driver = state
        .drivers
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("driver {} not found", id)))?;

    if driver.owner_id != account.id {
        return Err(AppError::Forbidden(
            "driver belongs to another provider".to_string(),
        ));
    }

    driver.status = payload.status;
    driver.updated_at = Utc::now();

    Ok(ok(driver.clone()))
}

async fn delete_driver(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Driver>>, AppError> {
    let account = access::authorize(&state, &headers, PROVIDER_ROLES)?;

    {
        let driver = state
            .drivers
            .get(&id)
            .ok_or_else(|| AppError::NotFound(format!("driver {} not found", id)))?;

        if driver.owner_id != account.id {
            return Err(AppError::Forbidden(
                "driver belongs to another provider".to_string(),
            ));
        }

        if driver.status == DriverStatus::OnJob {
            return Err(AppError::Conflict("driver is on an active job".to_string()));
        }
    }

    let (_, driver) = state
        .drivers
        .remove(&id)
        .ok_or_else(|| AppError::NotFound(format!("driver {} not found", id)))?;

    Ok(ok(driver))
}

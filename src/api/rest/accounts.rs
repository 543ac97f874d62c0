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
use crate::models::account::{Account, AccountStatus, Role};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", post(create_account))
        .route("/users/:id", get(get_account).patch(update_account))
}

#[derive(Deserialize)]
pub struct CreateAccountRequest {
    pub name: String,
    pub email: String,
    pub role: Role,
}

async fn create_account(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateAccountRequest>,
) -> Result<Json<Envelope<Account>>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name is required".to_string()));
    }

    if !payload.email.contains('@') {
        return Err(AppError::BadRequest("valid email is required".to_string()));
    }

    let account = Account {
        id: Uuid::new_v4(),
        name: payload.name,
        email: payload.email,
        role: payload.role,
        status: AccountStatus::Active,
        profile_completed: false,
        email_verified: false,
        created_at: Utc::now(),
    };

    state.accounts.insert(account.id, account.clone());
    info!(account_id = %account.id, role = %account.role, "account created");

    Ok(ok(account))
}

async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Account>>, AppError> {
    let account = state
        .accounts
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("account {} not found", id)))?;

    Ok(ok(account.value().clone()))
}

#[derive(Deserialize)]
pub struct UpdateAccountRequest {
    pub status: Option<AccountStatus>,
    pub profile_completed: Option<bool>,
    pub email_verified: Option<bool>,
}

/// Accounts may finish their own onboarding (profile, email verification);
/// status changes are an admin-only action.
async fn update_account(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<Json<Envelope<Account>>, AppError> {
    let actor = access::resolve(&state, &headers)?;

    if payload.status.is_some() || actor.id != id {
        access::authorize(&state, &headers, &[Role::Admin])?;
    }

    let mut account = state
        .accounts
        .get_mut(&id)
        .ok_or_else(|| AppError::NotFound(format!("account {} not found", id)))?;

    if let Some(status) = payload.status {
        account.status = status;
    }

    if let Some(profile_completed) = payload.profile_completed {
        account.profile_completed = profile_completed;
    }

    if let Some(email_verified) = payload.email_verified {
        account.email_verified = email_verified;
    }

    Ok(ok(account.clone()))
}

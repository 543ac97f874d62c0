use axum::http::HeaderMap;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::account::{Account, AccountStatus, Role};
use crate::state::AppState;

pub const ACCOUNT_HEADER: &str = "x-account-id";

/// Resolves the acting account from the request headers without applying the
/// status gate. Used by endpoints that must stay reachable for accounts that
/// have not finished onboarding (profile completion, email verification).
pub fn resolve(state: &AppState, headers: &HeaderMap) -> Result<Account, AppError> {
    let raw = headers
        .get(ACCOUNT_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("sign-in required".to_string()))?;

    let id = Uuid::parse_str(raw)
        .map_err(|_| AppError::Unauthorized("invalid account id".to_string()))?;

    let account = state
        .accounts
        .get(&id)
        .ok_or_else(|| AppError::Unauthorized("unknown account".to_string()))?;

    Ok(account.clone())
}

/// Priority-ordered account gate: disabled beats incomplete profile beats
/// unverified email beats role mismatch. Re-evaluated from scratch on every
/// call; no memory between requests.
pub fn gate(account: &Account, allowed: &[Role]) -> Result<(), AppError> {
    if account.status == AccountStatus::Disabled {
        return Err(AppError::Forbidden("account disabled".to_string()));
    }

    if !account.profile_completed {
        return Err(AppError::Forbidden("profile incomplete".to_string()));
    }

    if !account.email_verified {
        return Err(AppError::Forbidden("email not verified".to_string()));
    }

    if !allowed.contains(&account.role) {
        return Err(AppError::Forbidden(format!(
            "role {} not permitted",
            account.role
        )));
    }

    Ok(())
}

pub fn authorize(
    state: &AppState,
    headers: &HeaderMap,
    allowed: &[Role],
) -> Result<Account, AppError> {
    let account = resolve(state, headers)?;
    gate(&account, allowed)?;
    Ok(account)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::gate;
    use crate::error::AppError;
    use crate::models::account::{Account, AccountStatus, Role};

    fn account(status: AccountStatus, profile: bool, email: bool, role: Role) -> Account {
        Account {
            id: Uuid::new_v4(),
            name: "test".to_string(),
            email: "test@example.com".to_string(),
            role,
            status,
            profile_completed: profile,
            email_verified: email,
            created_at: Utc::now(),
        }
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::Forbidden(msg) => msg,
            other => panic!("expected forbidden, got {other:?}"),
        }
    }

    #[test]
    fn disabled_wins_over_incomplete_profile() {
        let acc = account(AccountStatus::Disabled, false, false, Role::Shipper);
        let err = gate(&acc, &[Role::Shipper]).unwrap_err();
        assert_eq!(message(err), "account disabled");
    }

    #[test]
    fn incomplete_profile_wins_over_unverified_email() {
        let acc = account(AccountStatus::Active, false, false, Role::Shipper);
        let err = gate(&acc, &[Role::Shipper]).unwrap_err();
        assert_eq!(message(err), "profile incomplete");
    }

    #[test]
    fn unverified_email_wins_over_role_mismatch() {
        let acc = account(AccountStatus::Active, true, false, Role::Carrier);
        let err = gate(&acc, &[Role::Shipper]).unwrap_err();
        assert_eq!(message(err), "email not verified");
    }

    #[test]
    fn role_mismatch_is_checked_last() {
        let acc = account(AccountStatus::Active, true, true, Role::Carrier);
        let err = gate(&acc, &[Role::Shipper]).unwrap_err();
        assert_eq!(message(err), "role carrier not permitted");
    }

    #[test]
    fn fully_onboarded_matching_role_passes() {
        let acc = account(AccountStatus::Active, true, true, Role::Shipper);
        assert!(gate(&acc, &[Role::Shipper, Role::Admin]).is_ok());
    }
}

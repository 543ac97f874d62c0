use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::time::interval;
use tracing::info;

use crate::models::quote::QuoteStatus;
use crate::state::AppState;

pub async fn run_expiry_sweeper(state: Arc<AppState>, ttl_hours: i64, sweep_secs: u64) {
    info!(ttl_hours, sweep_secs, "quote expiry sweeper started");

    let mut ticker = interval(std::time::Duration::from_secs(sweep_secs));
    loop {
        ticker.tick().await;
        let expired = expire_stale_quotes(&state, Utc::now(), ttl_hours);
        if expired > 0 {
            info!(expired, "expired stale quotes");
        }
    }
}

/// Sweeps every pending quote older than the TTL into `expired`.
pub fn expire_stale_quotes(state: &AppState, now: DateTime<Utc>, ttl_hours: i64) -> usize {
    let cutoff = now - Duration::hours(ttl_hours);
    let mut expired = 0;

    for mut entry in state.quotes.iter_mut() {
        if entry.status == QuoteStatus::Pending && entry.submitted_at < cutoff {
            entry.status = QuoteStatus::Expired;
            state.metrics.quotes_open.dec();
            expired += 1;
        }
    }

    expired
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::expire_stale_quotes;
    use crate::models::quote::{ProviderRole, Quote, QuoteStatus};
    use crate::state::AppState;

    fn quote(age_hours: i64, status: QuoteStatus) -> Quote {
        Quote {
            id: Uuid::new_v4(),
            booking_id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            role: ProviderRole::Carrier,
            amount: 1_000.0,
            driver_id: Uuid::new_v4(),
            vehicle_id: None,
            notes: "ready to haul".to_string(),
            status,
            submitted_at: Utc::now() - Duration::hours(age_hours),
        }
    }

    #[test]
    fn only_stale_pending_quotes_expire() {
        let state = AppState::new(8);

        let stale = quote(100, QuoteStatus::Pending);
        let fresh = quote(1, QuoteStatus::Pending);
        let accepted = quote(100, QuoteStatus::Accepted);
        state.quotes.insert(stale.id, stale.clone());
        state.quotes.insert(fresh.id, fresh.clone());
        state.quotes.insert(accepted.id, accepted.clone());

        let expired = expire_stale_quotes(&state, Utc::now(), 72);

        assert_eq!(expired, 1);
        assert_eq!(
            state.quotes.get(&stale.id).unwrap().status,
            QuoteStatus::Expired
        );
        assert_eq!(
            state.quotes.get(&fresh.id).unwrap().status,
            QuoteStatus::Pending
        );
        assert_eq!(
            state.quotes.get(&accepted.id).unwrap().status,
            QuoteStatus::Accepted
        );
    }

    #[test]
    fn sweep_is_idempotent() {
        let state = AppState::new(8);
        let stale = quote(200, QuoteStatus::Pending);
        state.quotes.insert(stale.id, stale.clone());

        assert_eq!(expire_stale_quotes(&state, Utc::now(), 72), 1);
        assert_eq!(expire_stale_quotes(&state, Utc::now(), 72), 0);
    }
}

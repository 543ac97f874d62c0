use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderRole {
    Carrier,
    Escort,
}

impl fmt::Display for ProviderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderRole::Carrier => "carrier",
            ProviderRole::Escort => "escort",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    Pending,
    Accepted,
    Rejected,
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub provider_id: Uuid,
    pub role: ProviderRole,
    pub amount: f64,
    pub driver_id: Uuid,
    pub vehicle_id: Option<Uuid>,
    pub notes: String,
    pub status: QuoteStatus,
    pub submitted_at: DateTime<Utc>,
}

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Shipper,
    Carrier,
    Escort,
    Admin,
    Driver,
}

impl Role {
    pub fn is_provider(&self) -> bool {
        matches!(self, Role::Carrier | Role::Escort)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Shipper => "shipper",
            Role::Carrier => "carrier",
            Role::Escort => "escort",
            Role::Admin => "admin",
            Role::Driver => "driver",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Active,
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
    pub profile_completed: bool,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

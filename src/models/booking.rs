use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dimensions {
    pub length_ft: f64,
    pub width_ft: f64,
    pub height_ft: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cargo {
    pub cargo_type: String,
    pub description: String,
    pub dimensions: Dimensions,
    pub weight_lbs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    PendingQuote,
    Quoted,
    Booked,
    InTransit,
    Delivered,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// A shipper may edit or delete a booking only before providers are bound.
    pub fn is_editable(&self) -> bool {
        matches!(self, BookingStatus::PendingQuote | BookingStatus::Quoted)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::PendingQuote => "pending_quote",
            BookingStatus::Quoted => "quoted",
            BookingStatus::Booked => "booked",
            BookingStatus::InTransit => "in_transit",
            BookingStatus::Delivered => "delivered",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryProof {
    pub photos: Vec<String>,
    pub signature: String,
    pub receiver_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub shipper_id: Uuid,
    pub cargo: Cargo,
    pub pickup: Address,
    pub delivery: Address,
    pub shipment_date: NaiveDate,
    pub flexible_dates: bool,
    pub requires_escort: bool,
    pub special_instructions: Option<String>,
    pub status: BookingStatus,
    pub carrier_id: Option<Uuid>,
    pub escort_id: Option<Uuid>,
    pub agreed_price: Option<f64>,
    pub proof: Option<DeliveryProof>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingEvent {
    pub booking_id: Uuid,
    pub status: BookingStatus,
    pub occurred_at: DateTime<Utc>,
}

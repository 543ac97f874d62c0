use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::account::Account;
use crate::models::booking::{Booking, BookingEvent, BookingStatus};
use crate::models::chat::Conversation;
use crate::models::fleet::{Driver, Vehicle};
use crate::models::quote::Quote;
use crate::models::review::Review;
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub accounts: DashMap<Uuid, Account>,
    pub bookings: DashMap<Uuid, Booking>,
    pub quotes: DashMap<Uuid, Quote>,
    pub vehicles: DashMap<Uuid, Vehicle>,
    pub drivers: DashMap<Uuid, Driver>,
    pub conversations: DashMap<Uuid, Conversation>,
    pub reviews: DashMap<Uuid, Review>,
    pub booking_events_tx: broadcast::Sender<BookingEvent>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(event_buffer_size: usize) -> Self {
        let (booking_events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            accounts: DashMap::new(),
            bookings: DashMap::new(),
            quotes: DashMap::new(),
            vehicles: DashMap::new(),
            drivers: DashMap::new(),
            conversations: DashMap::new(),
            reviews: DashMap::new(),
            booking_events_tx,
            metrics: Metrics::new(),
        }
    }

    pub fn emit(&self, booking_id: Uuid, status: BookingStatus) {
        let _ = self.booking_events_tx.send(BookingEvent {
            booking_id,
            status,
            occurred_at: Utc::now(),
        });
    }
}

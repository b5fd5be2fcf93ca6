//! Everything mocotray keeps on disk between runs.

pub mod settings;
pub mod timestamp_storage;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use settings::SettingsStore;
pub use timestamp_storage::FileTimestampStore;

pub const LAST_BOOKING_FILE: &str = "last_booking.json";
pub const SETTINGS_FILE: &str = "settings.json";

/// Time of the most recent successful booking. Shared by the booking flow (writer) and the
/// reminder (reader), possibly from different processes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LastBookingStore: Send + Sync {
    /// `None` if nothing was ever booked or the stored value can't be read.
    async fn load(&self) -> Result<Option<DateTime<Utc>>>;

    /// Stores `at` unless a later timestamp is already present.
    async fn record(&self, at: DateTime<Utc>) -> Result<()>;
}

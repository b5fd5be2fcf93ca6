use std::time::Duration;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReminderMode {
    #[default]
    Idle,
    Blinking,
}

/// Snapshot of the reminder. Lives only as long as the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReminderState {
    pub mode: ReminderMode,
    /// Wait before the next pulse, only known while a blink chain is running.
    pub next_blink_delay: Option<Duration>,
}

/// Time since the last booking. `None` means nothing was ever booked.
pub fn idle_duration(
    last_booking: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<chrono::Duration> {
    last_booking.map(|last| (now - last).max(chrono::Duration::zero()))
}

pub fn should_blink(
    last_booking: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    threshold: chrono::Duration,
) -> bool {
    match idle_duration(last_booking, now) {
        Some(idle) => idle >= threshold,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{idle_duration, should_blink};

    #[test]
    fn test_threshold_boundary() {
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 14, 0, 0).unwrap();
        let threshold = Duration::minutes(120);

        assert!(!should_blink(Some(now), now, threshold));
        assert!(!should_blink(Some(now - Duration::minutes(119)), now, threshold));
        assert!(!should_blink(
            Some(now - Duration::minutes(120) + Duration::seconds(1)),
            now,
            threshold
        ));
        assert!(should_blink(Some(now - Duration::minutes(120)), now, threshold));
        assert!(should_blink(Some(now - Duration::days(3)), now, threshold));
        assert!(should_blink(None, now, threshold));
    }

    #[test]
    fn test_future_booking_counts_as_just_booked() {
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 14, 0, 0).unwrap();

        assert_eq!(
            idle_duration(Some(now + Duration::minutes(5)), now),
            Some(Duration::zero())
        );
        assert_eq!(idle_duration(None, now), None);
    }
}

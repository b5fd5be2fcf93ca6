//! Nags the user when nothing was booked for a while. The scheduler owns all reminder state and
//! runs on a single task; bookings reach it as events.

pub mod blink;
pub mod indicator;
pub mod state;

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::{
    select,
    sync::{mpsc, watch},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{booking::BookingListener, storage::LastBookingStore, utils::clock::Clock};

pub use blink::{BlinkChain, BlinkTiming};
pub use indicator::{Indicator, LogIndicator, TerminalIndicator};
pub use state::{ReminderMode, ReminderState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderConfig {
    pub tick_interval: Duration,
    pub idle_threshold: chrono::Duration,
    pub timing: BlinkTiming,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(60),
            idle_threshold: chrono::Duration::minutes(120),
            timing: BlinkTiming::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderEvent {
    BookingCompleted(DateTime<Utc>),
}

/// Sending half handed to the booking flow.
#[derive(Clone)]
pub struct ReminderHandle {
    sender: mpsc::UnboundedSender<ReminderEvent>,
}

pub fn channel() -> (ReminderHandle, mpsc::UnboundedReceiver<ReminderEvent>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (ReminderHandle { sender }, receiver)
}

impl BookingListener for ReminderHandle {
    fn on_booking_completed(&self, booked_at: DateTime<Utc>) {
        if self
            .sender
            .send(ReminderEvent::BookingCompleted(booked_at))
            .is_err()
        {
            debug!("Reminder is not running, dropping booking event");
        }
    }
}

pub struct ReminderScheduler {
    store: Arc<dyn LastBookingStore>,
    indicator: Arc<dyn Indicator>,
    clock: Arc<dyn Clock>,
    config: ReminderConfig,
    shutdown: CancellationToken,
    last_booking: Option<DateTime<Utc>>,
    chain: Option<BlinkChain>,
    state: Arc<watch::Sender<ReminderState>>,
}

impl ReminderScheduler {
    pub fn new(
        store: Arc<dyn LastBookingStore>,
        indicator: Arc<dyn Indicator>,
        clock: Arc<dyn Clock>,
        config: ReminderConfig,
        shutdown: CancellationToken,
    ) -> Self {
        let (state, _) = watch::channel(ReminderState::default());
        Self {
            store,
            indicator,
            clock,
            config,
            shutdown,
            last_booking: None,
            chain: None,
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> ReminderState {
        *self.state.borrow()
    }

    pub fn mode(&self) -> ReminderMode {
        self.state().mode
    }

    /// Follows the state once the scheduler has moved into its own task.
    pub fn subscribe(&self) -> watch::Receiver<ReminderState> {
        self.state.subscribe()
    }

    pub fn last_booking(&self) -> Option<DateTime<Utc>> {
        self.last_booking
    }

    /// Re-reads the stored booking time and moves between idle and blinking. A booking made by
    /// another process is picked up here.
    pub async fn tick(&mut self) {
        let stored = self.store.load().await.unwrap_or_else(|e| {
            warn!("Couldn't read last booking time, assuming none: {e:?}");
            None
        });
        self.last_booking = self.last_booking.max(stored);

        let now = self.clock.time();
        if state::should_blink(self.last_booking, now, self.config.idle_threshold) {
            self.start_blinking();
        } else {
            self.stop_blinking().await;
        }
    }

    /// No-op while a chain is already running.
    pub fn start_blinking(&mut self) {
        if self.chain.is_some() {
            return;
        }

        match state::idle_duration(self.last_booking, self.clock.time()) {
            Some(idle) => info!("Nothing booked for {}", crate::utils::time::format_idle(idle)),
            None => info!("Nothing booked yet"),
        }

        self.state.send_modify(|s| s.mode = ReminderMode::Blinking);
        self.chain = Some(BlinkChain::spawn(
            self.indicator.clone(),
            self.clock.clone(),
            self.config.timing,
            &self.shutdown,
            self.state.clone(),
        ));
    }

    /// Cancels the running chain, if any, and leaves the indicator lit.
    pub async fn stop_blinking(&mut self) {
        let Some(chain) = self.chain.take() else {
            return;
        };

        chain.cancel().await;
        self.indicator.set_visible(true);
        self.state.send_replace(ReminderState {
            mode: ReminderMode::Idle,
            next_blink_delay: None,
        });
        debug!("Stopped blinking");
    }

    pub async fn on_booking_completed(&mut self, booked_at: DateTime<Utc>) {
        self.last_booking = self.last_booking.max(Some(booked_at));
        self.stop_blinking().await;
    }

    /// Executes the reminder event loop until shutdown.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<ReminderEvent>) -> Result<()> {
        info!(
            "Reminding after {} minutes without booking",
            self.config.idle_threshold.num_minutes()
        );
        let mut tick_point = self.clock.instant();
        loop {
            tick_point += self.config.tick_interval;
            self.tick().await;

            // Missed ticks (e.g. after suspend) collapse into the one that just ran.
            let now = self.clock.instant();
            if tick_point <= now {
                debug!("Reminder fell behind, skipping missed ticks");
                tick_point = now + self.config.tick_interval;
            }

            loop {
                select! {
                    _ = self.shutdown.cancelled() => {
                        self.stop_blinking().await;
                        return Ok(());
                    }
                    Some(event) = events.recv() => match event {
                        ReminderEvent::BookingCompleted(at) => self.on_booking_completed(at).await,
                    },
                    _ = self.clock.sleep_until(tick_point) => break,
                }
            }
        }
    }
}

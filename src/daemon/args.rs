use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser};
use tracing::level_filters::LevelFilter;

use crate::reminder::ReminderConfig;

#[derive(Parser)]
pub struct DaemonArgs {
    #[arg(long)]
    pub force: bool,
    #[arg(long)]
    pub dir: Option<PathBuf>,
    /// This option is for debugging purposes only.
    #[arg(long = "log-console")]
    pub log_console: bool,
    #[arg(long = "log-filter")]
    pub log: Option<LevelFilter>,
    #[command(flatten)]
    pub reminder: ReminderArgs,
}

/// Reminder knobs shared by `mocotray serve`, `mocotray init` and the daemon binary.
#[derive(Args, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderArgs {
    #[arg(
        long = "threshold-minutes",
        default_value_t = 120,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Start blinking after this many minutes without a booking"
    )]
    pub threshold_minutes: u32,
    #[arg(
        long = "tick-seconds",
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "How often the last booking time is checked"
    )]
    pub tick_seconds: u64,
}

impl Default for ReminderArgs {
    fn default() -> Self {
        Self {
            threshold_minutes: 120,
            tick_seconds: 60,
        }
    }
}

impl ReminderArgs {
    pub fn config(&self) -> ReminderConfig {
        ReminderConfig {
            tick_interval: Duration::from_secs(self.tick_seconds),
            idle_threshold: chrono::Duration::minutes(i64::from(self.threshold_minutes)),
            ..ReminderConfig::default()
        }
    }

    /// Same settings as command line arguments, for handing over to a spawned daemon.
    pub fn to_args(&self) -> Vec<String> {
        vec![
            "--threshold-minutes".into(),
            self.threshold_minutes.to_string(),
            "--tick-seconds".into(),
            self.tick_seconds.to_string(),
        ]
    }
}

use std::{
    io::Write,
    sync::atomic::{AtomicBool, Ordering},
};

use tracing::{debug, trace};

/// The thing that blinks. Implementations must tolerate being toggled from the blink chain task.
#[cfg_attr(test, mockall::automock)]
pub trait Indicator: Send + Sync {
    fn set_visible(&self, visible: bool);
}

/// Blinks the terminal title. Leaves the input line alone so the booking console stays usable.
pub struct TerminalIndicator;

impl Indicator for TerminalIndicator {
    fn set_visible(&self, visible: bool) {
        let title = if visible { "⏱ mocotray" } else { "mocotray" };
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = write!(stdout, "\x1b]0;{title}\x07").and_then(|_| stdout.flush()) {
            debug!("Couldn't update terminal title {e}");
        }
    }
}

/// Used by the background daemon where there is nothing to draw on. Starts lit, like any
/// indicator at rest.
pub struct LogIndicator {
    visible: AtomicBool,
}

impl Default for LogIndicator {
    fn default() -> Self {
        Self {
            visible: AtomicBool::new(true),
        }
    }
}

impl LogIndicator {
    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Relaxed)
    }
}

impl Indicator for LogIndicator {
    fn set_visible(&self, visible: bool) {
        let previous = self.visible.swap(visible, Ordering::Relaxed);
        if previous != visible {
            trace!(visible, "Indicator toggled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Indicator, LogIndicator};

    #[test]
    fn test_log_indicator_starts_lit() {
        let indicator = LogIndicator::default();
        assert!(indicator.is_visible());

        indicator.set_visible(false);
        assert!(!indicator.is_visible());

        indicator.set_visible(true);
        assert!(indicator.is_visible());
    }
}

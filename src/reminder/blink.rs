use std::{sync::Arc, time::Duration};

use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::{select, sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::utils::clock::Clock;

use super::{indicator::Indicator, state::ReminderState};

/// Shape of a single blink: the indicator goes dark for `pulse`, then stays lit for a random
/// delay between `min_delay` and `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkTiming {
    pub pulse: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for BlinkTiming {
    fn default() -> Self {
        Self {
            pulse: Duration::from_millis(300),
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl BlinkTiming {
    pub fn sample_delay(&self, rng: &mut impl Rng) -> Duration {
        if self.max_delay <= self.min_delay {
            return self.min_delay;
        }
        rng.gen_range(self.min_delay..=self.max_delay)
    }
}

/// A running blink loop. Owns its own token, cancelling it never touches the parent.
pub struct BlinkChain {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl BlinkChain {
    pub fn spawn(
        indicator: Arc<dyn Indicator>,
        clock: Arc<dyn Clock>,
        timing: BlinkTiming,
        parent: &CancellationToken,
        state: Arc<watch::Sender<ReminderState>>,
    ) -> Self {
        let token = parent.child_token();
        let handle = tokio::spawn(run_chain(
            indicator,
            clock,
            timing,
            token.clone(),
            state,
            StdRng::from_entropy(),
        ));

        Self { token, handle }
    }

    /// Stops the chain and waits until it's gone, so no toggle can land after this returns.
    pub async fn cancel(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            error!("Blink chain ended abnormally {e:?}");
        }
    }
}

async fn run_chain(
    indicator: Arc<dyn Indicator>,
    clock: Arc<dyn Clock>,
    timing: BlinkTiming,
    token: CancellationToken,
    state: Arc<watch::Sender<ReminderState>>,
    mut rng: StdRng,
) {
    debug!("Blink chain started");
    loop {
        indicator.set_visible(false);
        select! {
            biased;
            _ = token.cancelled() => break,
            _ = clock.sleep(timing.pulse) => (),
        }
        indicator.set_visible(true);

        let delay = timing.sample_delay(&mut rng);
        state.send_modify(|s| s.next_blink_delay = Some(delay));

        // Re-arm only if nobody cancelled while we were waiting.
        select! {
            biased;
            _ = token.cancelled() => break,
            _ = clock.sleep(delay) => (),
        }
    }
    debug!("Blink chain stopped");
}

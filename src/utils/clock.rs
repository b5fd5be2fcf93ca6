use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, Utc};
use tokio::time::Instant;

/// Represents an entity responsible for providing dates across application. The reminder and the
/// booking flow never call `Utc::now` directly so tests can move time around.
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Utc>;

    fn instant(&self) -> Instant;

    async fn sleep(&self, duration: Duration);

    async fn sleep_until(&self, deadline: Instant);

    /// Calendar day a booking made right now belongs to.
    fn today(&self) -> NaiveDate {
        self.time().with_timezone(&Local).date_naive()
    }
}

pub struct DefaultClock;

#[async_trait]
impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn sleep_until(&self, deadline: Instant) {
        tokio::time::sleep_until(deadline).await;
    }
}

#[cfg(test)]
pub use manual::ManualClock;

#[cfg(test)]
mod manual {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use tokio::time::Instant;

    use super::Clock;

    /// Wall clock that follows tokio's (possibly paused) time and can additionally be pushed
    /// forward without sleeping.
    #[derive(Clone)]
    pub struct ManualClock {
        start: DateTime<Utc>,
        reference: Instant,
        offset: Arc<Mutex<chrono::Duration>>,
    }

    impl ManualClock {
        pub fn starting_at(start: DateTime<Utc>) -> Self {
            Self {
                start,
                reference: Instant::now(),
                offset: Arc::new(Mutex::new(chrono::Duration::zero())),
            }
        }

        pub fn advance(&self, by: chrono::Duration) {
            *self.offset.lock().unwrap() += by;
        }
    }

    #[async_trait]
    impl Clock for ManualClock {
        fn time(&self) -> DateTime<Utc> {
            let elapsed = chrono::Duration::from_std(self.reference.elapsed()).unwrap();
            self.start + elapsed + *self.offset.lock().unwrap()
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }

        async fn sleep(&self, duration: Duration) {
            tokio::time::sleep(duration).await;
        }

        async fn sleep_until(&self, deadline: Instant) {
            tokio::time::sleep_until(deadline).await;
        }
    }
}

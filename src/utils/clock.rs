use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::Instant;

/// Source of wall time for usage events and of monotonic time for countdowns. Countdowns only
/// rely on tokio time, so tests can pause and advance it.
#[async_trait]
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Utc>;

    fn instant(&self) -> Instant;

    async fn sleep_until(&self, instant: Instant);
}

pub type SharedClock = Arc<dyn Clock>;

pub struct DefaultClock;

impl DefaultClock {
    pub fn shared() -> SharedClock {
        Arc::new(DefaultClock)
    }
}

#[async_trait]
impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }

    async fn sleep_until(&self, instant: Instant) {
        tokio::time::sleep_until(instant).await;
    }
}

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, Instrument};

use crate::utils::clock::SharedClock;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// One elapsed second of the countdown identified by `generation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

/// Handle to a running tick task. The task stops when the handle is cancelled or dropped, so
/// replacing the handle is enough to silence the previous countdown.
pub struct CountdownTicker {
    cancel: CancellationToken,
}

impl CountdownTicker {
    pub fn spawn(
        generation: u64,
        clock: SharedClock,
        sender: mpsc::Sender<Tick>,
        parent: &CancellationToken,
    ) -> Self {
        let cancel = parent.child_token();
        let span = info_span!("countdown", generation);
        tokio::spawn(run_ticker(generation, clock, sender, cancel.clone()).instrument(span));
        Self { cancel }
    }
}

impl Drop for CountdownTicker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_ticker(
    generation: u64,
    clock: SharedClock,
    sender: mpsc::Sender<Tick>,
    cancel: CancellationToken,
) {
    // Ticks follow a fixed schedule from the start instead of sleeping a second after each send.
    let mut next_tick = clock.instant();
    loop {
        next_tick += TICK_PERIOD;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Countdown cancelled");
                return;
            }
            _ = clock.sleep_until(next_tick) => ()
        }

        if cancel.is_cancelled() || sender.send(Tick { generation }).await.is_err() {
            debug!("Countdown receiver is gone");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    use super::{CountdownTicker, Tick};
    use crate::utils::clock::DefaultClock;

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_second() {
        let (sender, mut receiver) = mpsc::channel(16);
        let root = CancellationToken::new();
        let _ticker = CountdownTicker::spawn(7, DefaultClock::shared(), sender, &root);

        let start = tokio::time::Instant::now();
        for _ in 0..3 {
            assert_eq!(receiver.recv().await, Some(Tick { generation: 7 }));
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3) && elapsed < Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_stops_ticks() {
        let (sender, mut receiver) = mpsc::channel(16);
        let root = CancellationToken::new();
        let ticker = CountdownTicker::spawn(1, DefaultClock::shared(), sender, &root);

        assert_eq!(receiver.recv().await, Some(Tick { generation: 1 }));
        drop(ticker);

        // The task ends and drops its sender, closing the channel.
        let next = tokio::time::timeout(Duration::from_secs(10), receiver.recv()).await;
        assert_eq!(next, Ok(None));
    }

    #[tokio::test(start_paused = true)]
    async fn parent_cancellation_stops_ticks() {
        let (sender, mut receiver) = mpsc::channel(16);
        let root = CancellationToken::new();
        let _ticker = CountdownTicker::spawn(1, DefaultClock::shared(), sender, &root);

        root.cancel();
        let next = tokio::time::timeout(Duration::from_secs(10), receiver.recv()).await;
        assert_eq!(next, Ok(None));
    }
}

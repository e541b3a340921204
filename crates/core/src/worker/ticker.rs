//! Tick sources for the poll loop.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{self, Interval, MissedTickBehavior};

/// Drives the worker's poll loop. Each completed `tick` is one claim attempt.
#[async_trait]
pub trait Ticker: Send {
    async fn tick(&mut self);
}

/// Fixed-period ticker backed by a tokio interval.
///
/// The first tick fires one period after creation. Ticks missed while the
/// loop was busy are skipped rather than burst.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        let period = period.max(Duration::from_millis(1));
        let mut interval = time::interval_at(time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

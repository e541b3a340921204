//! Manually driven ticker for deterministic worker tests.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::worker::Ticker;

/// Ticker that fires only when its [`TickHandle`] says so.
///
/// Once every handle is dropped the ticker never fires again.
pub struct ManualTicker {
    rx: mpsc::UnboundedReceiver<oneshot::Sender<()>>,
    /// Acknowledges the previous tick once the loop asks for the next one.
    pending_ack: Option<oneshot::Sender<()>>,
}

/// Drives a [`ManualTicker`].
#[derive(Clone)]
pub struct TickHandle {
    tx: mpsc::UnboundedSender<oneshot::Sender<()>>,
}

impl ManualTicker {
    pub fn new() -> (Self, TickHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                rx,
                pending_ack: None,
            },
            TickHandle { tx },
        )
    }
}

#[async_trait]
impl Ticker for ManualTicker {
    async fn tick(&mut self) {
        if let Some(ack) = self.pending_ack.take() {
            let _ = ack.send(());
        }

        match self.rx.recv().await {
            Some(ack) => self.pending_ack = Some(ack),
            None => std::future::pending().await,
        }
    }
}

impl TickHandle {
    /// Fire one tick and wait until the loop has processed it.
    ///
    /// "Processed" means the claim happened and any handler was spawned;
    /// the handler itself may still be running. Returns early if the loop
    /// has stopped.
    pub async fn tick(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(ack_tx).is_err() {
            return;
        }
        let _ = ack_rx.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tick_is_acknowledged_on_next_wait() {
        let (mut ticker, handle) = ManualTicker::new();

        let driver = tokio::spawn(async move {
            ticker.tick().await;
            ticker.tick().await;
        });

        // First tick: acknowledged when the loop waits for the second
        handle.tick().await;
        drop(handle);
        driver.abort();
    }

    #[tokio::test]
    async fn test_stopped_loop_does_not_block_handle() {
        let (ticker, handle) = ManualTicker::new();
        drop(ticker);

        handle.tick().await;
    }
}

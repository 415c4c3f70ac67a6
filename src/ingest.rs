//! Fire-and-forget status fetches.
//!
//! Each tick spawns one fetch task. The task never touches dashboard state;
//! it sends its outcome back over a channel and the monitor applies it on
//! its own task. Ticks do not wait for fetches, nothing is cancelled, and
//! outcomes arrive in completion order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::feed::{StatusSample, StatusSource};

/// Result of the fetch issued on `tick`.
#[derive(Debug)]
pub struct FetchOutcome {
    pub tick: u64,
    pub result: Result<StatusSample>,
}

pub struct SampleIngestor {
    source: Arc<dyn StatusSource + Send + Sync>,
    sender: mpsc::UnboundedSender<FetchOutcome>,
    in_flight: Arc<AtomicU64>,
}

impl SampleIngestor {
    pub fn new(
        source: Arc<dyn StatusSource + Send + Sync>,
    ) -> (Self, mpsc::UnboundedReceiver<FetchOutcome>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                source,
                sender,
                in_flight: Arc::new(AtomicU64::new(0)),
            },
            receiver,
        )
    }

    /// Issue the fetch for `tick` and return immediately.
    pub fn dispatch(&self, tick: u64) {
        let source = Arc::clone(&self.source);
        let sender = self.sender.clone();
        let in_flight = Arc::clone(&self.in_flight);
        in_flight.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(async move {
            let result = source.fetch().await;
            in_flight.fetch_sub(1, Ordering::SeqCst);
            // Receiver gone means the monitor shut down; drop the result.
            let _ = sender.send(FetchOutcome { tick, result });
        });
    }

    /// Fetches issued but not yet resolved.
    pub fn in_flight(&self) -> u64 {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }
}

//! Channel-backed event streams.
//!
//! A stream is an ordinary subscription whose callback forwards each
//! [`RegionEvent`] into a bounded channel. Forwarding never fails the dispatch:
//! when the buffer is full or the stream was dropped, the event is discarded
//! and counted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, TryRecvError, TrySendError};
use tracing::warn;

use crate::callbacks::{Callback, RegionEvent, SubscriptionId};
use crate::error::StreamError;

/// Stream whose forwarding callback has not been subscribed yet.
#[derive(Debug)]
pub(crate) struct PendingStream {
    rx: Receiver<RegionEvent>,
    dropped: Arc<AtomicU64>,
}

impl PendingStream {
    pub(crate) fn attach(self, subscription_id: SubscriptionId) -> EventStream {
        EventStream {
            subscription_id,
            rx: self.rx,
            dropped: self.dropped,
        }
    }
}

/// Receiving half of a stream subscription.
///
/// Dropping the stream does not unsubscribe it; pass
/// [`subscription_id`](Self::subscription_id) to `Corral::unsubscribe` for that.
#[derive(Debug)]
pub struct EventStream {
    subscription_id: SubscriptionId,
    rx: Receiver<RegionEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventStream {
    /// Creates the callback that feeds a stream, plus the not-yet-subscribed stream.
    pub(crate) fn channel(capacity: usize) -> (Callback, PendingStream) {
        let (tx, rx) = bounded::<RegionEvent>(capacity.max(1));
        let dropped = Arc::new(AtomicU64::new(0));

        let counter = Arc::clone(&dropped);
        let forward = Callback::infallible(move |event| match tx.try_send(event.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                counter.fetch_add(1, Ordering::Relaxed);
                warn!(region = %event.region, event = %event.key, "stream dropped event");
            }
        });

        (forward, PendingStream { rx, dropped })
    }

    /// The subscription id backing this stream.
    #[must_use]
    pub const fn subscription_id(&self) -> SubscriptionId {
        self.subscription_id
    }

    /// Next buffered event, if any.
    pub fn try_recv(&self) -> Option<RegionEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Every buffered event, oldest first.
    pub fn drain(&self) -> Vec<RegionEvent> {
        self.rx.try_iter().collect()
    }

    /// Receive the next event with a timeout.
    ///
    /// Only useful when the stream was moved to a thread other than the one
    /// driving rechecks.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<RegionEvent, StreamError> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => StreamError::Timeout {
                duration_ms: timeout.as_millis().min(u128::from(u64::MAX)) as u64,
            },
            RecvTimeoutError::Disconnected => StreamError::Disconnected,
        })
    }

    /// Events discarded because the buffer was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

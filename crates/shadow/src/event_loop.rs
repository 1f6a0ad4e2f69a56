//! Single consumer of inbound platform events.
//!
//! Recalls and messages arrive on separate queues. The loop polls the recall
//! queue first on every iteration, so a recall is never starved behind a
//! backlog of ordinary messages. Each event is handled on its own task so a
//! slow remote fetch stalls only that event.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;
use tracing::{error, info};

use recallguard_core::{InboundMessage, PlatformEvent, RecallNotice};

use crate::error::ShadowError;
use crate::guard::RecallGuard;

/// Default capacity of each inbound queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1_024;

/// Cloneable handle used to feed events into an [`EventLoop`].
#[derive(Debug, Clone)]
pub struct EventSender {
    recalls: mpsc::Sender<RecallNotice>,
    messages: mpsc::Sender<InboundMessage>,
}

impl EventSender {
    /// Queue an event, waiting for capacity if the queue is full.
    pub async fn send(&self, event: PlatformEvent) -> Result<(), ShadowError> {
        match event {
            PlatformEvent::Recall(notice) => self
                .recalls
                .send(notice)
                .await
                .map_err(|_| ShadowError::Closed),
            PlatformEvent::Message(message) => self
                .messages
                .send(message)
                .await
                .map_err(|_| ShadowError::Closed),
        }
    }

    /// Whether the loop has stopped accepting events.
    pub fn is_closed(&self) -> bool {
        self.recalls.is_closed() || self.messages.is_closed()
    }
}

/// Dispatches queued events to a [`RecallGuard`].
pub struct EventLoop {
    guard: Arc<RecallGuard>,
    recalls: mpsc::Receiver<RecallNotice>,
    messages: mpsc::Receiver<InboundMessage>,
    shutdown_rx: mpsc::Receiver<()>,
    tracker: TaskTracker,
}

impl std::fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLoop")
            .field("in_flight", &self.tracker.len())
            .finish_non_exhaustive()
    }
}

impl EventLoop {
    /// Create a loop, its event sender, and the sender that stops it.
    pub fn new(
        guard: Arc<RecallGuard>,
        capacity: usize,
    ) -> (Self, EventSender, mpsc::Sender<()>) {
        let capacity = capacity.max(1);
        let (recall_tx, recall_rx) = mpsc::channel(capacity);
        let (message_tx, message_rx) = mpsc::channel(capacity);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let event_loop = Self {
            guard,
            recalls: recall_rx,
            messages: message_rx,
            shutdown_rx,
            tracker: TaskTracker::new(),
        };
        let sender = EventSender {
            recalls: recall_tx,
            messages: message_tx,
        };
        (event_loop, sender, shutdown_tx)
    }

    /// Consume events until shutdown, then wait for in-flight handlers.
    ///
    /// Events already accepted by an [`EventSender`] when shutdown arrives
    /// are still dispatched, recalls first.
    pub async fn run(mut self) {
        info!("event loop starting");

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.recv() => {
                    info!("event loop received shutdown signal");
                    break;
                }
                Some(notice) = self.recalls.recv() => self.spawn_recall(notice),
                Some(message) = self.messages.recv() => self.spawn_message(message),
                else => {
                    info!("all event senders dropped");
                    break;
                }
            }
        }

        self.recalls.close();
        self.messages.close();
        let mut drained = 0_usize;
        while let Some(notice) = self.recalls.recv().await {
            self.spawn_recall(notice);
            drained += 1;
        }
        while let Some(message) = self.messages.recv().await {
            self.spawn_message(message);
            drained += 1;
        }
        if drained > 0 {
            info!(drained, "dispatched events queued before shutdown");
        }

        self.tracker.close();
        self.tracker.wait().await;
        info!("event loop stopped");
    }

    fn spawn_recall(&self, notice: RecallNotice) {
        let guard = Arc::clone(&self.guard);
        let message_id = notice.message_id.clone();
        self.tracker.spawn(async move {
            let outcome = AssertUnwindSafe(guard.handle_recall(notice))
                .catch_unwind()
                .await;
            if outcome.is_err() {
                guard.metrics().increment_handler_panics();
                error!(message_id = %message_id, "recall handler panicked");
            }
        });
    }

    fn spawn_message(&self, message: InboundMessage) {
        let guard = Arc::clone(&self.guard);
        let message_id = message.message_id.clone();
        self.tracker.spawn(async move {
            let outcome = AssertUnwindSafe(guard.handle_message(message))
                .catch_unwind()
                .await;
            if outcome.is_err() {
                guard.metrics().increment_handler_panics();
                error!(message_id = %message_id, "message handler panicked");
            }
        });
    }
}

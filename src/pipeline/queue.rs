//! Bounded descriptor queue.
//!
//! # Responsibilities
//! - Single-producer push that waits while the queue is full
//! - Multi-consumer pop shared by the worker pool
//! - Close semantics: once the producer is gone, `pop` drains the remaining
//!   items and then returns `None` instead of waiting forever

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use crate::dashboard::{QueryDescriptor, SinkClosed};

/// Create a bounded queue with room for `capacity` descriptors.
pub fn bounded(capacity: usize) -> (QueueProducer, QueueConsumer) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        QueueProducer { tx },
        QueueConsumer {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Producer half. Dropping it (or calling [`QueueProducer::close`]) closes the queue.
#[derive(Debug)]
pub struct QueueProducer {
    tx: mpsc::Sender<QueryDescriptor>,
}

impl QueueProducer {
    /// Push from synchronous code, blocking the thread while the queue is full.
    ///
    /// Must not be called from inside the async runtime; run the caller under
    /// `spawn_blocking`.
    pub fn blocking_push(&self, descriptor: QueryDescriptor) -> Result<(), SinkClosed> {
        self.tx.blocking_send(descriptor).map_err(|_| SinkClosed)
    }

    /// Signal that no more descriptors will arrive.
    pub fn close(self) {}
}

/// Consumer half, cloned once per worker.
#[derive(Debug, Clone)]
pub struct QueueConsumer {
    rx: Arc<Mutex<mpsc::Receiver<QueryDescriptor>>>,
}

impl QueueConsumer {
    /// Next descriptor, or `None` once the queue is closed and drained.
    pub async fn pop(&self) -> Option<QueryDescriptor> {
        self.rx.lock().await.recv().await
    }
}

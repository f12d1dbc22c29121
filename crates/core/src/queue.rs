//! Bounded FIFO task queue.
//!
//! Backed by a bounded `tokio::sync::mpsc` channel: multiple producers
//! (concurrent submission handlers), exactly one consumer (the worker
//! loop). Enqueueing past capacity fails immediately instead of
//! blocking -- backpressure is surfaced to the submitter as
//! [`CoreError::QueueFull`] rather than buffering a resource-exclusive
//! operation without bound.

use tokio::sync::mpsc;

use crate::error::CoreError;
use crate::job::JobEnvelope;

/// Create a queue with the given capacity.
///
/// Returns the cloneable producer handle and the single consumer half.
pub fn bounded(capacity: usize) -> (JobQueue, JobReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (JobQueue { tx, capacity }, JobReceiver { rx })
}

/// Producer handle for job submission. Cheap to clone; safe to use from
/// any number of concurrent request handlers.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::Sender<JobEnvelope>,
    capacity: usize,
}

impl JobQueue {
    /// Enqueue a job without blocking.
    ///
    /// Fails with [`CoreError::QueueFull`] when the queue already holds
    /// `capacity` unconsumed jobs.
    pub fn enqueue(&self, job: JobEnvelope) -> Result<(), CoreError> {
        self.tx.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => CoreError::QueueFull {
                capacity: self.capacity,
            },
            mpsc::error::TrySendError::Closed(_) => {
                CoreError::Internal("job queue receiver dropped".into())
            }
        })
    }

    /// Number of jobs currently buffered.
    ///
    /// Diagnostic only: the value may be stale by the time the caller
    /// observes it.
    pub fn depth(&self) -> usize {
        self.capacity - self.tx.capacity()
    }

    /// Configured maximum capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Consumer half of the queue, owned exclusively by the worker loop.
pub struct JobReceiver {
    rx: mpsc::Receiver<JobEnvelope>,
}

impl JobReceiver {
    /// Await the next job in strict FIFO order.
    ///
    /// Returns `None` only once every producer handle has been dropped,
    /// which signals the worker loop to exit.
    pub async fn dequeue(&mut self) -> Option<JobEnvelope> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::JobOptions;

    fn job() -> JobEnvelope {
        JobEnvelope::new("/tmp/input.wav".into(), JobOptions::default())
    }

    #[tokio::test]
    async fn enqueue_past_capacity_fails_immediately() {
        let (queue, _rx) = bounded(2);

        queue.enqueue(job()).unwrap();
        queue.enqueue(job()).unwrap();

        let err = queue.enqueue(job()).unwrap_err();
        assert!(matches!(err, CoreError::QueueFull { capacity: 2 }));
    }

    #[tokio::test]
    async fn dequeue_preserves_fifo_order() {
        let (queue, mut rx) = bounded(4);

        let jobs: Vec<_> = (0..4).map(|_| job()).collect();
        let ids: Vec<_> = jobs.iter().map(|j| j.id).collect();
        for j in jobs {
            queue.enqueue(j).unwrap();
        }

        for expected in ids {
            let got = rx.dequeue().await.unwrap();
            assert_eq!(got.id, expected);
        }
    }

    #[tokio::test]
    async fn capacity_frees_up_after_dequeue() {
        let (queue, mut rx) = bounded(1);

        queue.enqueue(job()).unwrap();
        assert!(queue.enqueue(job()).is_err());

        rx.dequeue().await.unwrap();
        queue.enqueue(job()).unwrap();
    }

    #[tokio::test]
    async fn depth_tracks_buffered_jobs() {
        let (queue, mut rx) = bounded(3);
        assert_eq!(queue.depth(), 0);

        queue.enqueue(job()).unwrap();
        queue.enqueue(job()).unwrap();
        assert_eq!(queue.depth(), 2);

        rx.dequeue().await.unwrap();
        assert_eq!(queue.depth(), 1);
    }

    #[tokio::test]
    async fn concurrent_producers_are_all_accepted() {
        let (queue, mut rx) = bounded(16);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let q = queue.clone();
            handles.push(tokio::spawn(async move { q.enqueue(job()) }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let mut seen = 0;
        while seen < 8 {
            rx.dequeue().await.unwrap();
            seen += 1;
        }
        assert_eq!(queue.depth(), 0);
    }

    #[tokio::test]
    async fn dequeue_returns_none_when_producers_dropped() {
        let (queue, mut rx) = bounded(1);
        drop(queue);
        assert!(rx.dequeue().await.is_none());
    }
}

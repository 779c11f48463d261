//! A single refresh stream: the latest-issued-wins state machine behind
//! the stats and reviews panels.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use review_core::{ReviewError, ReviewResult};
use review_observability::{StreamMetrics, StreamRecorder};

/// Phase of a refresh stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamPhase {
    /// Nothing issued yet, or detached while fetching.
    Idle,
    /// The latest issued fetch is outstanding.
    Fetching,
    /// The latest applied completion succeeded.
    Settled,
    /// The latest applied completion failed.
    Failed,
}

/// What observers of a stream see.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSnapshot<T> {
    pub phase: StreamPhase,
    /// Last settled value. Kept across failures.
    pub data: Option<T>,
    /// Last error, kept until the next success.
    pub last_error: Option<ReviewError>,
    /// True only while the latest issued fetch is outstanding.
    pub loading: bool,
    /// Sequence number of the latest issued fetch.
    pub seq: u64,
}

impl<T> Default for StreamSnapshot<T> {
    fn default() -> Self {
        Self {
            phase: StreamPhase::Idle,
            data: None,
            last_error: None,
            loading: false,
            seq: 0,
        }
    }
}

/// Handle for one issued fetch.
#[derive(Debug)]
pub struct FetchTicket {
    seq: u64,
    issued_at: Instant,
}

impl FetchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// Refresh stream state.
///
/// Every fetch takes a ticket from [`begin`](Self::begin). A completion is
/// applied only if its ticket is the most recently issued one and the
/// stream is attached; anything else is discarded.
#[derive(Debug)]
pub struct RefreshStream<T> {
    name: &'static str,
    latest: AtomicU64,
    attached: AtomicBool,
    tx: watch::Sender<StreamSnapshot<T>>,
    metrics: StreamRecorder,
}

impl<T: Clone + Send + Sync + 'static> RefreshStream<T> {
    /// Create a new, detached stream.
    pub fn new(name: &'static str) -> Self {
        let (tx, _rx) = watch::channel(StreamSnapshot::default());
        Self {
            name,
            latest: AtomicU64::new(0),
            attached: AtomicBool::new(false),
            tx,
            metrics: StreamRecorder::new(name),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Sequence number of the most recently issued fetch.
    pub fn latest_seq(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    /// Start accepting completions.
    pub fn attach(&self) {
        self.attached.store(true, Ordering::SeqCst);
    }

    /// Stop accepting completions. In-flight fetches become no-ops.
    pub fn detach(&self) {
        self.tx.send_modify(|snap| {
            self.attached.store(false, Ordering::SeqCst);
            snap.loading = false;
            if snap.phase == StreamPhase::Fetching {
                snap.phase = StreamPhase::Idle;
            }
        });
    }

    /// Issue a new fetch.
    ///
    /// A detached stream issues nothing: it returns `None` and leaves the
    /// snapshot untouched.
    pub fn begin(&self) -> Option<FetchTicket> {
        let mut issued = None;
        self.tx.send_if_modified(|snap| {
            if !self.is_attached() {
                return false;
            }
            let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            snap.seq = seq;
            snap.loading = true;
            snap.phase = StreamPhase::Fetching;
            issued = Some(seq);
            true
        });

        let Some(seq) = issued else {
            debug!(stream = self.name, "detached, fetch not issued");
            return None;
        };
        self.metrics.record_issued();
        debug!(stream = self.name, seq, "fetch issued");
        Some(FetchTicket {
            seq,
            issued_at: Instant::now(),
        })
    }

    /// Whether the latest issued fetch is still outstanding.
    pub fn is_fetching(&self) -> bool {
        self.tx.borrow().phase == StreamPhase::Fetching
    }

    /// Apply a completion. Returns whether it changed the visible state.
    pub fn complete(&self, ticket: FetchTicket, result: ReviewResult<T>) -> bool {
        let latency = ticket.issued_at.elapsed();
        let mut outcome = None;

        self.tx.send_if_modified(|snap| {
            if ticket.seq != self.latest.load(Ordering::SeqCst) || !self.is_attached() {
                return false;
            }
            snap.loading = false;
            match &result {
                Ok(data) => {
                    snap.phase = StreamPhase::Settled;
                    snap.data = Some(data.clone());
                    snap.last_error = None;
                    outcome = Some(Ok(()));
                }
                Err(e) => {
                    snap.phase = StreamPhase::Failed;
                    snap.last_error = Some(e.clone());
                    outcome = Some(Err(e.kind()));
                }
            }
            true
        });

        match outcome {
            Some(Ok(())) => {
                self.metrics.record_settled(latency);
                true
            }
            Some(Err(kind)) => {
                if let Err(e) = &result {
                    warn!(stream = self.name, seq = ticket.seq, error = %e, "fetch failed");
                }
                self.metrics.record_failed(latency, kind);
                true
            }
            None => {
                debug!(
                    stream = self.name,
                    seq = ticket.seq,
                    latest = self.latest_seq(),
                    "discarded stale completion"
                );
                self.metrics.record_discarded();
                false
            }
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> StreamSnapshot<T> {
        self.tx.borrow().clone()
    }

    /// Observe snapshots as they change.
    pub fn subscribe(&self) -> watch::Receiver<StreamSnapshot<T>> {
        self.tx.subscribe()
    }

    pub fn metrics(&self) -> StreamMetrics {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attached() -> RefreshStream<&'static str> {
        let stream = RefreshStream::new("test");
        stream.attach();
        stream
    }

    #[test]
    fn test_latest_issued_wins_over_late_completion() {
        let stream = attached();
        let a = stream.begin().unwrap();
        let b = stream.begin().unwrap();

        assert!(stream.complete(b, Ok("B")));
        assert!(!stream.complete(a, Ok("A")));

        let snap = stream.snapshot();
        assert_eq!(snap.data, Some("B"));
        assert_eq!(snap.phase, StreamPhase::Settled);
        assert_eq!(snap.seq, 2);
        assert_eq!(stream.metrics().discarded, 1);
    }

    #[test]
    fn test_earlier_completion_is_discarded_while_newer_pending() {
        let stream = attached();
        let a = stream.begin().unwrap();
        let b = stream.begin().unwrap();

        assert!(!stream.complete(a, Ok("A")));
        let snap = stream.snapshot();
        assert!(snap.loading);
        assert_eq!(snap.data, None);

        assert!(stream.complete(b, Ok("B")));
        assert!(!stream.snapshot().loading);
    }

    #[test]
    fn test_failure_keeps_data_until_next_success() {
        let stream = attached();
        let t = stream.begin().unwrap();
        stream.complete(t, Ok("first"));

        let t = stream.begin().unwrap();
        stream.complete(t, Err(ReviewError::network("connection refused")));
        let snap = stream.snapshot();
        assert_eq!(snap.phase, StreamPhase::Failed);
        assert_eq!(snap.data, Some("first"));
        assert!(!snap.loading);
        assert_eq!(snap.last_error, Some(ReviewError::network("connection refused")));

        // Error stays visible while the next fetch is outstanding.
        let t = stream.begin().unwrap();
        assert!(stream.snapshot().last_error.is_some());
        stream.complete(t, Ok("second"));
        let snap = stream.snapshot();
        assert_eq!(snap.data, Some("second"));
        assert_eq!(snap.last_error, None);

        let m = stream.metrics();
        assert_eq!((m.issued, m.settled, m.failed), (3, 2, 1));
    }

    #[test]
    fn test_detached_stream_ignores_completions() {
        let stream = attached();
        let t = stream.begin().unwrap();
        stream.detach();

        assert!(!stream.complete(t, Ok("late")));
        let snap = stream.snapshot();
        assert_eq!(snap.phase, StreamPhase::Idle);
        assert!(!snap.loading);
        assert_eq!(snap.data, None);
    }

    #[test]
    fn test_detached_stream_issues_nothing() {
        let stream: RefreshStream<&'static str> = RefreshStream::new("test");
        assert!(stream.begin().is_none());
        assert_eq!(stream.snapshot(), StreamSnapshot::default());
        assert!(!stream.is_fetching());

        stream.attach();
        let t = stream.begin().unwrap();
        assert!(stream.is_fetching());
        stream.detach();
        assert!(stream.begin().is_none());
        assert!(!stream.complete(t, Ok("late")));

        let snap = stream.snapshot();
        assert_eq!(snap.phase, StreamPhase::Idle);
        assert!(!snap.loading);
        assert_eq!(snap.seq, 1);
        assert_eq!(stream.metrics().issued, 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_settled_value() {
        let stream = attached();
        let mut rx = stream.subscribe();
        let t = stream.begin().unwrap();
        stream.complete(t, Ok("done"));

        let snap = rx
            .wait_for(|s| s.phase == StreamPhase::Settled)
            .await
            .unwrap()
            .clone();
        assert_eq!(snap.data, Some("done"));
    }
}

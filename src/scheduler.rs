use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

use crate::error::FetchError;

/// Result of one issued fetch, tagged with the order it was issued in.
#[derive(Debug)]
pub struct Tick<T> {
    pub seq: u64,
    pub result: Result<T, FetchError>,
}

/// Admits only completions newer than the last applied success.
#[derive(Debug, Default)]
pub struct SequenceGate {
    applied: Option<u64>,
}

impl SequenceGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_stale(&self, seq: u64) -> bool {
        matches!(self.applied, Some(last) if seq <= last)
    }

    /// Records `seq` as applied; returns false when it is stale.
    pub fn admit(&mut self, seq: u64) -> bool {
        if self.is_stale(seq) {
            return false;
        }
        self.applied = Some(seq);
        true
    }
}

/// Fixed-cadence driver for one fetch operation.
///
/// The first fetch is issued immediately, then one per `period`. Ticks are
/// never coalesced: a slow fetch keeps running while later ones are issued.
/// Dropping the poller stops the ticker; fetches still in flight finish on
/// their own but their results have nowhere to go.
pub struct Poller<T> {
    name: &'static str,
    rx: mpsc::UnboundedReceiver<Tick<T>>,
    nudge: Arc<Notify>,
    cancel: CancellationToken,
    gate: SequenceGate,
}

impl<T: Send + 'static> Poller<T> {
    pub fn spawn<F, Fut>(name: &'static str, view_id: Uuid, period: Duration, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let nudge = Arc::new(Notify::new());
        let cancel = CancellationToken::new();
        let span = info_span!("poller", poller = name, view = %view_id);

        tokio::spawn(
            run_ticker(period, fetch, tx, Arc::clone(&nudge), cancel.clone()).instrument(span),
        );

        Self {
            name,
            rx,
            nudge,
            cancel,
            gate: SequenceGate::new(),
        }
    }
}

impl<T> Poller<T> {
    /// Next result worth applying. Stale completions are dropped here.
    pub async fn next(&mut self) -> Option<Tick<T>> {
        loop {
            let tick = self.rx.recv().await?;
            let fresh = match tick.result {
                Ok(_) => self.gate.admit(tick.seq),
                Err(_) => !self.gate.is_stale(tick.seq),
            };
            if fresh {
                return Some(tick);
            }
            debug!(poller = self.name, seq = tick.seq, "discarding out-of-order completion");
        }
    }

    /// Issues an extra fetch right away without disturbing the cadence.
    pub fn refresh_now(&self) {
        self.nudge.notify_one();
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stops issuing fetches. Same as dropping the poller.
    pub fn stop(self) {
        debug!(poller = self.name, "stopping");
    }
}

impl<T> Drop for Poller<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_ticker<T, F, Fut>(
    period: Duration,
    fetch: F,
    tx: mpsc::UnboundedSender<Tick<T>>,
    nudge: Arc<Notify>,
    cancel: CancellationToken,
) where
    T: Send + 'static,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut seq = 0u64;
    debug!(?period, "poller started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
            _ = nudge.notified() => debug!("refresh requested"),
        }
        if tx.is_closed() {
            break;
        }

        seq += 1;
        let pending = fetch();
        let tx = tx.clone();
        tokio::spawn(
            async move {
                let result = pending.await;
                if let Err(err) = &result {
                    debug!(seq, error = %err, "fetch failed");
                }
                let _ = tx.send(Tick { seq, result });
            }
            .in_current_span(),
        );
    }

    debug!("poller stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::time::Instant;

    use super::*;

    const PERIOD: Duration = Duration::from_millis(3000);

    fn counting_poller(calls: Arc<AtomicUsize>) -> Poller<usize> {
        Poller::spawn("counter", Uuid::new_v4(), PERIOD, move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok::<usize, FetchError>(n) }
        })
    }

    #[test]
    fn gate_rejects_older_sequences() {
        let mut gate = SequenceGate::new();
        assert!(gate.admit(2));
        assert!(!gate.admit(1));
        assert!(!gate.admit(2));
        assert!(gate.admit(5));
        assert!(gate.is_stale(4));
        assert!(!gate.is_stale(6));
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_immediately_then_on_cadence() {
        let started = Instant::now();
        let mut poller = counting_poller(Arc::new(AtomicUsize::new(0)));

        let first = poller.next().await.unwrap();
        assert_eq!(first.seq, 1);
        assert!(started.elapsed() < PERIOD);

        let second = poller.next().await.unwrap();
        let third = poller.next().await.unwrap();
        assert_eq!((second.seq, third.seq), (2, 3));
        assert!(started.elapsed() >= PERIOD * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_tick_does_not_stop_later_ticks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut poller = Poller::spawn("flaky", Uuid::new_v4(), PERIOD, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n == 1 {
                    Err(FetchError::Decode("truncated body".to_string()))
                } else {
                    Ok(n)
                }
            }
        });

        assert!(poller.next().await.unwrap().result.is_err());
        assert_eq!(poller.next().await.unwrap().result.unwrap(), 2);
        assert_eq!(poller.next().await.unwrap().result.unwrap(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn late_completion_of_earlier_fetch_is_discarded() {
        crate::logging::init_test();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut poller = Poller::spawn("slow-first", Uuid::new_v4(), PERIOD, move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                let delay = if n == 1 { 5000 } else { 10 };
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok::<usize, FetchError>(n)
            }
        });

        let applied = poller.next().await.unwrap();
        assert_eq!(applied.seq, 2);
        let applied = poller.next().await.unwrap();
        assert_eq!(applied.seq, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_now_issues_an_extra_fetch() {
        let started = Instant::now();
        let mut poller = counting_poller(Arc::new(AtomicUsize::new(0)));
        poller.next().await.unwrap();

        poller.refresh_now();
        let extra = poller.next().await.unwrap();
        assert_eq!(extra.seq, 2);
        assert!(started.elapsed() < PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_poller_stops_new_ticks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut poller = counting_poller(Arc::clone(&calls));
        poller.next().await.unwrap();
        drop(poller);

        tokio::time::sleep(PERIOD * 4).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

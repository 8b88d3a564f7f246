//! Cycle driver over a transaction source.

use crate::config::PollerConfig;
use crate::error::WatchError;
use crate::state::{PollSnapshot, PollState};
use crate::ticker::Ticker;
use std::future::{Future, pending};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use txscope_data::{FetchError, TxEndpoint, TxSource};
use txscope_domain::Transaction;

type FetchResult = Result<Option<Transaction>, FetchError>;

/// Outstanding request of one source, if any.
type InFlight<'a> = Option<Pin<Box<dyn Future<Output = FetchResult> + Send + 'a>>>;

/// Checks a transaction hash before any request is made.
///
/// # Errors
/// Returns [`WatchError::InvalidInput`] for an empty or blank hash.
pub fn validate_hash(hash: &str) -> Result<&str, WatchError> {
    let hash = hash.trim();
    if hash.is_empty() {
        return Err(WatchError::InvalidInput(
            "transaction hash must not be empty".to_string(),
        ));
    }
    Ok(hash)
}

/// Polls one transaction hash against a [`TxSource`].
pub struct TxPoller<S: ?Sized> {
    source: Arc<S>,
    state: PollState,
}

impl<S: TxSource + ?Sized> TxPoller<S> {
    /// Creates a poller for `hash`.
    ///
    /// # Errors
    /// Returns [`WatchError::InvalidInput`] if the hash is empty.
    pub fn new(hash: &str, source: Arc<S>, config: &PollerConfig) -> Result<Self, WatchError> {
        let hash = validate_hash(hash)?;
        Ok(Self {
            source,
            state: PollState::new(hash, config),
        })
    }

    /// Current poll state.
    pub fn state(&self) -> &PollState {
        &self.state
    }

    /// Runs one complete cycle: fetch every due source, wait for all of them,
    /// reconcile once.
    ///
    /// [`TxPoller::run`] does not wait like this; there each source settles
    /// on its own schedule.
    pub async fn poll_once(&mut self) -> PollSnapshot {
        let hash = self.state.hash().to_string();
        let due = self.state.due_sources();
        for endpoint in &due {
            self.state.begin_fetch(*endpoint);
        }

        let source = self.source.as_ref();
        let (confirmed, pending) = tokio::join!(
            fetch_if(source, due.contains(&TxEndpoint::Confirmed), TxEndpoint::Confirmed, &hash),
            fetch_if(source, due.contains(&TxEndpoint::Pending), TxEndpoint::Pending, &hash),
        );

        if let Some(result) = confirmed {
            self.state.record(TxEndpoint::Confirmed, &hash, result);
        }
        if let Some(result) = pending {
            self.state.record(TxEndpoint::Pending, &hash, result);
        }

        self.state.reconcile();
        self.state.snapshot()
    }

    /// Polls on every tick until cancelled, resolved, or the ticker ends.
    ///
    /// Each tick reconciles and then issues a request for every enabled source
    /// that has none outstanding, so a slow mempool lookup never delays the
    /// confirmed one. Results are applied as soon as they settle. A snapshot
    /// is published after every tick and every settled request.
    ///
    /// Requests still outstanding when the loop ends are dropped; nothing
    /// from them reaches `updates`.
    pub async fn run<T: Ticker>(
        mut self,
        mut ticker: T,
        cancel: CancellationToken,
        updates: watch::Sender<PollSnapshot>,
    ) {
        info!(hash = %self.state.hash(), session = %self.state.session(), "Starting transaction poller");

        let source = Arc::clone(&self.source);
        let hash = self.state.hash().to_string();
        let mut confirmed_request: InFlight<'_> = None;
        let mut pending_request: InFlight<'_> = None;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(hash = %hash, "Poller cancelled");
                    break;
                }
                result = next_result(&mut confirmed_request) => {
                    confirmed_request = None;
                    self.state.record(TxEndpoint::Confirmed, &hash, result);
                    self.state.apply_results();
                }
                result = next_result(&mut pending_request) => {
                    pending_request = None;
                    self.state.record(TxEndpoint::Pending, &hash, result);
                    self.state.apply_results();
                }
                ticked = ticker.tick() => {
                    if !ticked {
                        debug!(hash = %hash, "Ticker closed");
                        break;
                    }
                    self.state.reconcile();
                    for endpoint in self.state.due_sources() {
                        self.state.begin_fetch(endpoint);
                        let request = Some(source.fetch(endpoint, &hash));
                        match endpoint {
                            TxEndpoint::Confirmed => confirmed_request = request,
                            TxEndpoint::Pending => pending_request = request,
                        }
                    }
                }
            }

            let snapshot = self.state.snapshot();
            let resolved = snapshot.resolved;
            if updates.send(snapshot).is_err() {
                debug!(hash = %hash, "No more readers, stopping poller");
                break;
            }
            if resolved {
                break;
            }
        }

        info!(
            hash = %hash,
            cycles = self.state.cycles(),
            resolved = self.state.is_resolved(),
            "Transaction poller stopped"
        );
    }
}

/// Waits for the outstanding request; never completes when there is none.
async fn next_result(request: &mut InFlight<'_>) -> FetchResult {
    match request {
        Some(request) => request.await,
        None => pending().await,
    }
}

async fn fetch_if<S: TxSource + ?Sized>(
    source: &S,
    enabled: bool,
    endpoint: TxEndpoint,
    hash: &str,
) -> Option<Result<Option<Transaction>, FetchError>> {
    if !enabled {
        return None;
    }
    Some(source.fetch(endpoint, hash).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use crate::ticker::ManualTicker;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Source answering from per-endpoint scripts; an exhausted script keeps
    /// answering "not found".
    #[derive(Default)]
    struct ScriptedSource {
        confirmed: Mutex<VecDeque<Result<Option<Transaction>, FetchError>>>,
        pending: Mutex<VecDeque<Result<Option<Transaction>, FetchError>>>,
        calls: Mutex<Vec<(TxEndpoint, String)>>,
    }

    impl ScriptedSource {
        fn script(&self, endpoint: TxEndpoint, results: Vec<Result<Option<Transaction>, FetchError>>) {
            let queue = match endpoint {
                TxEndpoint::Confirmed => &self.confirmed,
                TxEndpoint::Pending => &self.pending,
            };
            queue.lock().unwrap().extend(results);
        }

        fn calls(&self, endpoint: TxEndpoint) -> usize {
            self.calls.lock().unwrap().iter().filter(|(e, _)| *e == endpoint).count()
        }
    }

    #[async_trait]
    impl TxSource for ScriptedSource {
        async fn fetch(&self, endpoint: TxEndpoint, hash: &str) -> Result<Option<Transaction>, FetchError> {
            self.calls.lock().unwrap().push((endpoint, hash.to_string()));
            let queue = match endpoint {
                TxEndpoint::Confirmed => &self.confirmed,
                TxEndpoint::Pending => &self.pending,
            };
            queue.lock().unwrap().pop_front().unwrap_or(Ok(None))
        }
    }

    fn tx(payload: serde_json::Value) -> Transaction {
        Transaction::from_payload(payload).unwrap().unwrap()
    }

    #[test]
    fn test_empty_hash_is_rejected() {
        let source = Arc::new(ScriptedSource::default());
        let err = TxPoller::new("", source.clone(), &PollerConfig::default()).err();
        assert!(matches!(err, Some(WatchError::InvalidInput(_))));
        assert!(TxPoller::new("   ", source.clone(), &PollerConfig::default()).is_err());
        assert!(source.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_confirmed_on_first_cycle() {
        let source = Arc::new(ScriptedSource::default());
        source.script(TxEndpoint::Confirmed, vec![Ok(Some(tx(json!({ "height": 100 }))))]);
        let mut poller = TxPoller::new("ABC", source.clone(), &PollerConfig::default()).unwrap();

        let snapshot = poller.poll_once().await;
        assert_eq!(snapshot.stored_result.and_then(|t| t.height), Some(100));
        assert!(!snapshot.confirmed_polling_enabled);
        assert!(!snapshot.pending_polling_enabled);
        assert!(snapshot.resolved);

        // Terminal: later cycles issue no requests.
        poller.poll_once().await;
        poller.poll_once().await;
        assert_eq!(source.calls(TxEndpoint::Confirmed), 1);
        assert_eq!(source.calls(TxEndpoint::Pending), 0);
    }

    #[tokio::test]
    async fn test_found_in_mempool() {
        let source = Arc::new(ScriptedSource::default());
        let pooled = tx(json!({ "height": null, "pool": true }));
        source.script(TxEndpoint::Pending, vec![Ok(Some(pooled.clone()))]);
        let mut poller = TxPoller::new("DEF", source.clone(), &PollerConfig::default()).unwrap();

        let first = poller.poll_once().await;
        assert!(first.pending_polling_enabled);
        assert!(first.confirmed_polling_enabled);
        assert!(first.stored_result.is_none());
        assert_eq!(source.calls(TxEndpoint::Pending), 0);

        let second = poller.poll_once().await;
        assert_eq!(second.stored_result, Some(pooled));
        assert!(!second.pending_polling_enabled);
        assert!(second.confirmed_polling_enabled);
        assert_eq!(source.calls(TxEndpoint::Pending), 1);

        poller.poll_once().await;
        assert_eq!(source.calls(TxEndpoint::Confirmed), 3);
        assert_eq!(source.calls(TxEndpoint::Pending), 1);
    }

    #[tokio::test]
    async fn test_confirmed_after_empty_cycles() {
        let source = Arc::new(ScriptedSource::default());
        source.script(
            TxEndpoint::Confirmed,
            vec![Ok(None), Ok(None), Ok(None), Ok(Some(tx(json!({ "height": 50 }))))],
        );
        let mut poller = TxPoller::new("GHI", source.clone(), &PollerConfig::default()).unwrap();

        let first = poller.poll_once().await;
        assert!(first.pending_polling_enabled);

        poller.poll_once().await;
        poller.poll_once().await;
        let fourth = poller.poll_once().await;

        assert!(!fourth.pending_polling_enabled);
        assert!(!fourth.confirmed_polling_enabled);
        assert_eq!(fourth.stored_result.and_then(|t| t.height), Some(50));
        assert_eq!(source.calls(TxEndpoint::Pending), 3);
    }

    #[tokio::test]
    async fn test_transient_failures_are_absorbed() {
        let source = Arc::new(ScriptedSource::default());
        let failure = || {
            Err(FetchError::Status {
                url: "http://fcd/v1/tx/JKL".into(),
                status: 503,
            })
        };
        source.script(
            TxEndpoint::Confirmed,
            vec![failure(), failure(), Ok(Some(tx(json!({ "height": 7 }))))],
        );
        source.script(TxEndpoint::Pending, vec![failure()]);
        let mut poller = TxPoller::new("JKL", source.clone(), &PollerConfig::default()).unwrap();

        let first = poller.poll_once().await;
        assert!(first.pending_polling_enabled);
        let second = poller.poll_once().await;
        assert!(second.pending_polling_enabled);
        assert!(second.stored_result.is_none());

        let third = poller.poll_once().await;
        assert!(third.resolved);
        assert_eq!(third.stored_result.and_then(|t| t.height), Some(7));
        assert!((third.progress - 3.0 * 0.0333).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_requests_carry_the_polled_hash() {
        let source = Arc::new(ScriptedSource::default());
        let mut poller = TxPoller::new("  MNO  ", source.clone(), &PollerConfig::default()).unwrap();
        poller.poll_once().await;
        poller.poll_once().await;

        let calls = source.calls.lock().unwrap();
        assert!(calls.iter().all(|(_, hash)| hash == "MNO"));
    }

    #[tokio::test]
    async fn test_malformed_display_fields_still_resolve() {
        let source = Arc::new(ScriptedSource::default());
        let payload = Transaction::from_payload(json!({
            "txhash": "ABC",
            "height": "100",
            "tx": { "value": { "msg": null, "fee": { "amount": null } } }
        }));
        source.script(TxEndpoint::Confirmed, vec![payload.map_err(FetchError::from)]);
        let mut poller = TxPoller::new("ABC", source.clone(), &PollerConfig::default()).unwrap();

        let snapshot = poller.poll_once().await;
        assert!(snapshot.resolved);
        assert!(!snapshot.pending_polling_enabled);
        assert_eq!(snapshot.stored_result.and_then(|t| t.height), Some(100));
        assert!(poller.state().source(TxEndpoint::Confirmed).last_error.is_none());
    }

    /// Confirmed lookups answer from a script; mempool lookups never finish.
    #[derive(Default)]
    struct StuckMempoolSource {
        confirmed: Mutex<VecDeque<Option<Transaction>>>,
        confirmed_calls: AtomicUsize,
        pending_calls: AtomicUsize,
    }

    #[async_trait]
    impl TxSource for StuckMempoolSource {
        async fn fetch(&self, endpoint: TxEndpoint, _hash: &str) -> Result<Option<Transaction>, FetchError> {
            match endpoint {
                TxEndpoint::Confirmed => {
                    self.confirmed_calls.fetch_add(1, Ordering::SeqCst);
                    Ok(self.confirmed.lock().unwrap().pop_front().flatten())
                }
                TxEndpoint::Pending => {
                    self.pending_calls.fetch_add(1, Ordering::SeqCst);
                    pending::<()>().await;
                    Ok(None)
                }
            }
        }
    }

    async fn wait_for_calls(counter: &AtomicUsize, expected: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while counter.load(Ordering::SeqCst) < expected {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("request not issued");
    }

    #[tokio::test]
    async fn test_slow_mempool_does_not_hold_back_confirmed_polling() {
        let source = Arc::new(StuckMempoolSource::default());
        source
            .confirmed
            .lock()
            .unwrap()
            .extend([None, None, None, None, Some(tx(json!({ "height": 7 })))]);

        let poller = TxPoller::new("SLOW", source.clone(), &PollerConfig::default()).unwrap();
        let (trigger, ticker) = ManualTicker::channel(1);
        let (updates, mut rx) = watch::channel(poller.state().snapshot());
        let task = tokio::spawn(poller.run(ticker, CancellationToken::new(), updates));

        for round in 1..=4 {
            trigger.tick().await;
            wait_for_calls(&source.confirmed_calls, round).await;
        }
        // The mempool lookup issued on the second tick is still outstanding.
        assert_eq!(source.pending_calls.load(Ordering::SeqCst), 1);
        assert!(!rx.borrow().resolved);

        trigger.tick().await;
        let snapshot = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.resolved))
            .await
            .expect("not resolved")
            .expect("poll task ended")
            .clone();

        assert_eq!(snapshot.stored_result.and_then(|t| t.height), Some(7));
        assert!(!snapshot.pending_polling_enabled);
        assert_eq!(source.confirmed_calls.load(Ordering::SeqCst), 5);
        assert_eq!(source.pending_calls.load(Ordering::SeqCst), 1);
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("poll task did not end")
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel_with_request_outstanding() {
        let source = Arc::new(StuckMempoolSource::default());
        let poller = TxPoller::new("STUCK", source.clone(), &PollerConfig::default()).unwrap();
        let (trigger, ticker) = ManualTicker::channel(1);
        let (updates, _rx) = watch::channel(poller.state().snapshot());
        let cancel = CancellationToken::new();
        let task = tokio::spawn(poller.run(ticker, cancel.clone(), updates));

        trigger.tick().await;
        wait_for_calls(&source.confirmed_calls, 1).await;
        trigger.tick().await;
        wait_for_calls(&source.pending_calls, 1).await;

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("poll task did not stop")
            .unwrap();
    }
}

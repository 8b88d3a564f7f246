//! Poll task handles and the watcher owning them.

use crate::config::PollerConfig;
use crate::error::WatchError;
use crate::poller::{TxPoller, validate_hash};
use crate::state::PollSnapshot;
use crate::ticker::{IntervalTicker, Ticker};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use txscope_data::{FcdClient, TxSource};
use txscope_domain::{NetworkConfig, Transaction};
use uuid::Uuid;

/// Starts polling `hash` against the FCD API of `network`.
///
/// Cycles run every `config.interval`, the first one immediately. Must be
/// called from within a Tokio runtime.
///
/// # Errors
/// Returns [`WatchError::InvalidInput`] if the hash is empty or the network's
/// base URL is unusable. No request is issued in that case.
pub fn start(hash: &str, network: &NetworkConfig, config: PollerConfig) -> Result<PollHandle, WatchError> {
    validate_hash(hash)?;
    let client = FcdClient::new(network.clone())
        .map_err(|e| WatchError::InvalidInput(format!("network {}: {e}", network.chain_id)))?;
    let ticker = IntervalTicker::new(config.interval);
    PollHandle::spawn(hash, Arc::new(client), &config, ticker)
}

/// Handle to a running poll task for one hash.
///
/// Dropping the handle stops the task.
pub struct PollHandle {
    session: Uuid,
    hash: String,
    cancel: CancellationToken,
    state: watch::Receiver<PollSnapshot>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Spawns a poll task driven by `ticker`.
    ///
    /// # Errors
    /// Returns [`WatchError::InvalidInput`] if the hash is empty.
    pub fn spawn<S, T>(
        hash: &str,
        source: Arc<S>,
        config: &PollerConfig,
        ticker: T,
    ) -> Result<Self, WatchError>
    where
        S: TxSource + ?Sized + 'static,
        T: Ticker + 'static,
    {
        let poller = TxPoller::new(hash, source, config)?;
        let initial = poller.state().snapshot();
        let session = initial.session;
        let hash = initial.hash.clone();

        let (updates, state) = watch::channel(initial);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(poller.run(ticker, cancel.clone(), updates));

        debug!(hash = %hash, session = %session, "Spawned poll task");
        Ok(Self {
            session,
            hash,
            cancel,
            state,
            task,
        })
    }

    /// Identifies this poll session; a new hash always gets a new session.
    pub fn session(&self) -> Uuid {
        self.session
    }

    /// Hash being polled, trimmed.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Stops both sources. Safe to call repeatedly or after the task ended.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            debug!(hash = %self.hash, session = %self.session, "Stopping poll task");
            self.cancel.cancel();
        }
    }

    /// Latest stored transaction and progress value. Never blocks.
    pub fn current_state(&self) -> (Option<Transaction>, f64) {
        let snapshot = self.state.borrow();
        (snapshot.stored_result.clone(), snapshot.progress)
    }

    /// Full copy of the latest published state.
    pub fn snapshot(&self) -> PollSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified after every tick and every settled request.
    pub fn subscribe(&self) -> watch::Receiver<PollSnapshot> {
        self.state.clone()
    }

    /// Whether the task has ended (resolved, stopped, or ticker closed).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits until the confirmed source returns the transaction.
    ///
    /// Returns `None` if the task ends first.
    pub async fn resolved(&self) -> Option<Transaction> {
        let mut rx = self.state.clone();
        let snapshot = rx.wait_for(|s| s.resolved).await.ok()?;
        snapshot.stored_result.clone()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Owns the poll task for the currently watched hash.
///
/// Switching hashes goes through [`TxWatcher::reset`], which stops the old
/// task before the new state exists, so results for the old hash can never
/// reach the new one.
pub struct TxWatcher<S: ?Sized> {
    source: Arc<S>,
    config: PollerConfig,
    active: Option<PollHandle>,
}

impl<S: TxSource + ?Sized + 'static> TxWatcher<S> {
    /// Creates a watcher with nothing to watch yet.
    pub fn new(source: Arc<S>, config: PollerConfig) -> Self {
        Self {
            source,
            config,
            active: None,
        }
    }

    /// Watches `hash` on a fixed interval, replacing any current watch.
    ///
    /// # Errors
    /// Returns [`WatchError::InvalidInput`] if the hash is empty; the current
    /// watch is left untouched in that case.
    pub fn reset(&mut self, hash: &str) -> Result<&PollHandle, WatchError> {
        validate_hash(hash)?;
        let ticker = IntervalTicker::new(self.config.interval);
        self.reset_with_ticker(hash, ticker)
    }

    /// Same as [`TxWatcher::reset`] with an explicit ticker.
    ///
    /// # Errors
    /// Returns [`WatchError::InvalidInput`] if the hash is empty.
    pub fn reset_with_ticker<T: Ticker + 'static>(
        &mut self,
        hash: &str,
        ticker: T,
    ) -> Result<&PollHandle, WatchError> {
        validate_hash(hash)?;

        if let Some(previous) = self.active.take() {
            info!(from = %previous.hash(), to = %hash.trim(), "Switching watched transaction");
            previous.stop();
        }

        let handle = PollHandle::spawn(hash, self.source.clone(), &self.config, ticker)?;
        Ok(self.active.insert(handle))
    }

    /// Stops the current watch, if any.
    pub fn stop(&mut self) {
        if let Some(handle) = self.active.take() {
            handle.stop();
        }
    }

    /// Handle of the current watch.
    pub fn current(&self) -> Option<&PollHandle> {
        self.active.as_ref()
    }

    /// Latest state of the current watch.
    pub fn current_state(&self) -> Option<(Option<Transaction>, f64)> {
        self.active.as_ref().map(PollHandle::current_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticker::ManualTicker;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;
    use txscope_data::{FetchError, TxEndpoint};

    fn tx(payload: serde_json::Value) -> Transaction {
        Transaction::from_payload(payload).unwrap().unwrap()
    }

    /// Confirmed answers per hash; hashes listed in `gated` block until
    /// `release` is notified. Mempool lookups always answer "not found".
    #[derive(Default)]
    struct GatedSource {
        confirmed: Mutex<HashMap<String, Transaction>>,
        gated: Mutex<Vec<String>>,
        release: Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TxSource for GatedSource {
        async fn fetch(&self, endpoint: TxEndpoint, hash: &str) -> Result<Option<Transaction>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if endpoint == TxEndpoint::Pending {
                return Ok(None);
            }
            let gated = self.gated.lock().unwrap().iter().any(|h| h == hash);
            if gated {
                self.release.notified().await;
            }
            Ok(self.confirmed.lock().unwrap().get(hash).cloned())
        }
    }

    async fn wait_until(
        rx: &mut watch::Receiver<PollSnapshot>,
        done: impl FnMut(&PollSnapshot) -> bool,
    ) -> PollSnapshot {
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(done))
            .await
            .expect("state timed out")
            .expect("poll task ended")
            .clone()
    }

    #[tokio::test]
    async fn test_spawn_rejects_empty_hash() {
        let source = Arc::new(GatedSource::default());
        let (_trigger, ticker) = ManualTicker::channel(1);
        let result = PollHandle::spawn("", source.clone(), &PollerConfig::default(), ticker);

        assert!(matches!(result, Err(WatchError::InvalidInput(_))));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_start_rejects_empty_hash() {
        let result = start("", &NetworkConfig::mainnet(), PollerConfig::default());
        assert!(matches!(result, Err(WatchError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_handle_publishes_cycles_and_stops() {
        let source = Arc::new(GatedSource::default());
        let (trigger, ticker) = ManualTicker::channel(4);
        let handle = PollHandle::spawn("DEF", source.clone(), &PollerConfig::default(), ticker).unwrap();
        let mut rx = handle.subscribe();

        assert_eq!(handle.current_state(), (None, 0.0));

        trigger.tick().await;
        let first = wait_until(&mut rx, |s| s.pending_polling_enabled).await;
        assert!(first.confirmed_polling_enabled);
        assert_eq!(first.cycles, 1);

        trigger.tick().await;
        let second = wait_until(&mut rx, |s| s.cycles == 2).await;
        assert!(second.stored_result.is_none());
        let (stored, progress) = handle.current_state();
        assert!(stored.is_none());
        assert!((progress - 2.0 * 0.0333).abs() < 1e-9);

        handle.stop();
        handle.stop();
        tokio::time::timeout(Duration::from_secs(5), async {
            while !handle.is_finished() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("task did not stop");

        let calls = source.calls.load(Ordering::SeqCst);
        trigger.tick().await;
        tokio::task::yield_now().await;
        assert_eq!(source.calls.load(Ordering::SeqCst), calls);
        handle.stop();
    }

    #[tokio::test]
    async fn test_task_ends_once_resolved() {
        let source = Arc::new(GatedSource::default());
        source
            .confirmed
            .lock()
            .unwrap()
            .insert("ABC".into(), tx(json!({ "txhash": "ABC", "height": 100 })));
        let (trigger, ticker) = ManualTicker::channel(4);
        let handle = PollHandle::spawn("ABC", source.clone(), &PollerConfig::default(), ticker).unwrap();

        trigger.tick().await;
        let resolved = tokio::time::timeout(Duration::from_secs(5), handle.resolved())
            .await
            .expect("not resolved");
        assert_eq!(resolved.and_then(|t| t.height), Some(100));

        let snapshot = handle.snapshot();
        assert!(!snapshot.confirmed_polling_enabled);
        assert!(!snapshot.pending_polling_enabled);

        // Stopping after natural termination is a no-op.
        handle.stop();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_reset_discards_late_result_for_old_hash() {
        let source = Arc::new(GatedSource::default());
        source.gated.lock().unwrap().push("OLD".into());
        source
            .confirmed
            .lock()
            .unwrap()
            .insert("OLD".into(), tx(json!({ "txhash": "OLD", "height": 9 })));

        let mut watcher = TxWatcher::new(source.clone(), PollerConfig::default());

        let (old_trigger, old_ticker) = ManualTicker::channel(4);
        let old_session = watcher.reset_with_ticker("OLD", old_ticker).unwrap().session();
        let old_rx = watcher.current().unwrap().subscribe();
        old_trigger.tick().await;
        // Let the old cycle reach the gated fetch.
        while source.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let (new_trigger, new_ticker) = ManualTicker::channel(4);
        let handle = watcher.reset_with_ticker("NEW", new_ticker).unwrap();
        assert_ne!(handle.session(), old_session);
        assert_eq!(handle.hash(), "NEW");
        let mut new_rx = handle.subscribe();

        // The old request completes only after the switch.
        source.release.notify_waiters();
        new_trigger.tick().await;
        let snapshot = wait_until(&mut new_rx, |s| s.cycles >= 1).await;

        assert_eq!(snapshot.hash, "NEW");
        assert!(snapshot.stored_result.is_none());
        assert!(snapshot.confirmed_polling_enabled);
        assert!(old_rx.borrow().stored_result.is_none());
        assert_eq!(watcher.current_state(), Some((None, snapshot.progress)));
    }

    #[tokio::test]
    async fn test_reset_with_empty_hash_keeps_current_watch() {
        let source = Arc::new(GatedSource::default());
        let mut watcher = TxWatcher::new(source, PollerConfig::default());
        let (_trigger, ticker) = ManualTicker::channel(1);
        let session = watcher.reset_with_ticker("ABC", ticker).unwrap().session();

        assert!(matches!(watcher.reset(" "), Err(WatchError::InvalidInput(_))));
        assert_eq!(watcher.current().map(PollHandle::session), Some(session));

        watcher.stop();
        watcher.stop();
        assert!(watcher.current().is_none());
    }
}

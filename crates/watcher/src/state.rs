//! Poll state and reconciliation.
//!
//! [`PollState`] is the whole memory of one transaction lookup. Fetch results
//! are recorded per source with [`PollState::record`] as they settle, and
//! [`PollState::apply_results`] decides which sources keep polling:
//!
//! 1. A payload from the confirmed source is final: store it and stop both
//!    sources for good.
//! 2. A settled, empty confirmed lookup enables the mempool probe.
//! 3. A payload from the mempool is stored and stops the mempool probe; the
//!    confirmed source keeps polling until the transaction lands in a block.
//! 4. Progress advances, whatever happened.
//!
//! Steps 1 to 3 run after every settled request; [`PollState::reconcile`]
//! runs all four once per cycle. The steps are independent checks applied in
//! order, so step 3 wins over step 2 within the same pass.

use crate::config::PollerConfig;
use crate::progress::ProgressAnimator;
use serde::Serialize;
use tracing::{debug, info};
use txscope_data::{FetchError, TxEndpoint};
use txscope_domain::Transaction;
use uuid::Uuid;

/// What is known about one source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceState {
    /// Whether the source is fetched on the next cycle.
    pub enabled: bool,
    /// A request is outstanding.
    pub in_flight: bool,
    /// Latest non-empty payload.
    pub payload: Option<Transaction>,
    /// The source has answered successfully at least once.
    pub answered: bool,
    /// Message of the most recent failure, cleared by the next success.
    pub last_error: Option<String>,
    /// Completed requests, successful or not.
    pub attempts: u64,
}

impl SourceState {
    fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }
}

/// State of the lookup for a single transaction hash.
#[derive(Debug, Clone)]
pub struct PollState {
    session: Uuid,
    hash: String,
    stored_result: Option<Transaction>,
    confirmed: SourceState,
    pending: SourceState,
    progress: ProgressAnimator,
    resolved: bool,
    cycles: u64,
    treat_errors_as_not_found: bool,
}

/// Read-only copy of a [`PollState`], published after every tick and every
/// settled request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollSnapshot {
    /// Poll session this copy belongs to.
    pub session: Uuid,
    /// Hash being looked up.
    pub hash: String,
    /// Best known payload: the mempool copy until the confirmed one arrives.
    pub stored_result: Option<Transaction>,
    /// Whether the confirmed source is still polled.
    pub confirmed_polling_enabled: bool,
    /// Whether the mempool source is polled.
    pub pending_polling_enabled: bool,
    /// Spinner value in `[0, 1)`.
    pub progress: f64,
    /// The confirmed source returned the transaction; polling is over.
    pub resolved: bool,
    /// Completed cycles.
    pub cycles: u64,
}

impl PollState {
    /// Creates the initial state: confirmed polling on, mempool polling off.
    pub fn new(hash: impl Into<String>, config: &PollerConfig) -> Self {
        Self {
            session: Uuid::new_v4(),
            hash: hash.into(),
            stored_result: None,
            confirmed: SourceState::new(true),
            pending: SourceState::new(false),
            progress: ProgressAnimator::new(config.progress_step),
            resolved: false,
            cycles: 0,
            treat_errors_as_not_found: config.treat_errors_as_not_found,
        }
    }

    /// Unique id of this lookup.
    pub fn session(&self) -> Uuid {
        self.session
    }

    /// Hash being looked up, already trimmed.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Best known payload for the hash.
    pub fn stored_result(&self) -> Option<&Transaction> {
        self.stored_result.as_ref()
    }

    /// Whether the confirmed source is still polled.
    pub fn confirmed_polling_enabled(&self) -> bool {
        self.confirmed.enabled
    }

    /// Whether the mempool source is polled.
    pub fn pending_polling_enabled(&self) -> bool {
        self.pending.enabled
    }

    /// Current spinner value in `[0, 1)`.
    pub fn progress(&self) -> f64 {
        self.progress.value()
    }

    /// Whether the confirmed source has returned the transaction.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Number of completed cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// What is known about one source.
    pub fn source(&self, endpoint: TxEndpoint) -> &SourceState {
        match endpoint {
            TxEndpoint::Confirmed => &self.confirmed,
            TxEndpoint::Pending => &self.pending,
        }
    }

    fn source_mut(&mut self, endpoint: TxEndpoint) -> &mut SourceState {
        match endpoint {
            TxEndpoint::Confirmed => &mut self.confirmed,
            TxEndpoint::Pending => &mut self.pending,
        }
    }

    /// Sources to fetch this cycle.
    pub fn due_sources(&self) -> Vec<TxEndpoint> {
        [TxEndpoint::Confirmed, TxEndpoint::Pending]
            .into_iter()
            .filter(|endpoint| {
                let source = self.source(*endpoint);
                source.enabled && !source.in_flight
            })
            .collect()
    }

    /// Marks a request as issued.
    pub fn begin_fetch(&mut self, endpoint: TxEndpoint) {
        self.source_mut(endpoint).in_flight = true;
    }

    /// Records a settled request.
    ///
    /// Results issued for another hash are dropped and `false` is returned.
    pub fn record(
        &mut self,
        endpoint: TxEndpoint,
        hash: &str,
        result: Result<Option<Transaction>, FetchError>,
    ) -> bool {
        if hash != self.hash {
            debug!(
                expected = %self.hash,
                got = %hash,
                source = %endpoint,
                "Discarding result for another hash"
            );
            return false;
        }

        let source = self.source_mut(endpoint);
        source.in_flight = false;
        source.attempts += 1;

        match result {
            Ok(Some(tx)) => {
                source.answered = true;
                source.last_error = None;
                source.payload = Some(tx);
            }
            Ok(None) => {
                source.answered = true;
                source.last_error = None;
            }
            Err(e) => {
                debug!(hash = %hash, source = %endpoint, error = %e, "Fetch failed, retrying next cycle");
                source.last_error = Some(e.to_string());
            }
        }
        true
    }

    /// Runs one full cycle pass: [`PollState::apply_results`], then progress.
    pub fn reconcile(&mut self) {
        self.apply_results();
        self.progress.advance();
        self.cycles += 1;
    }

    /// Applies the recorded results to the polling flags and stored payload.
    ///
    /// Does not advance progress; safe to call after every settled request.
    pub fn apply_results(&mut self) {
        let pending_before = self.pending.enabled;

        if let Some(tx) = &self.confirmed.payload {
            if !self.resolved {
                info!(hash = %self.hash, height = ?tx.height, "Transaction confirmed");
            }
            self.stored_result = Some(tx.clone());
            self.confirmed.enabled = false;
            self.pending.enabled = false;
            self.resolved = true;
        }

        if !self.resolved && !self.confirmed.in_flight && self.confirmed_reported_empty() {
            self.pending.enabled = true;
        }

        if let Some(tx) = &self.pending.payload {
            // The confirmed payload is final; a mempool copy never replaces it.
            if !self.resolved {
                self.stored_result = Some(tx.clone());
            }
            self.pending.enabled = false;
        }

        if self.pending.enabled != pending_before {
            if self.pending.enabled {
                info!(hash = %self.hash, "Not found on the ledger, probing mempool");
            } else {
                debug!(hash = %self.hash, "Mempool polling stopped");
            }
        }
    }

    fn confirmed_reported_empty(&self) -> bool {
        if self.confirmed.payload.is_some() {
            return false;
        }
        if self.treat_errors_as_not_found {
            self.confirmed.attempts > 0
        } else {
            self.confirmed.answered
        }
    }

    /// Copies the state for publication.
    pub fn snapshot(&self) -> PollSnapshot {
        PollSnapshot {
            session: self.session,
            hash: self.hash.clone(),
            stored_result: self.stored_result.clone(),
            confirmed_polling_enabled: self.confirmed.enabled,
            pending_polling_enabled: self.pending.enabled,
            progress: self.progress.value(),
            resolved: self.resolved,
            cycles: self.cycles,
        }
    }
}

//! Transaction submission and confirmation monitoring.
//!
//! # Responsibilities
//! - Forward payloads to the wallet provider for signing and submission
//! - Poll the chain until the transaction commits or the wait times out
//! - Serialize mutating calls: at most one submission in flight per session

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{interval, timeout, Instant, MissedTickBehavior};

use crate::blockchain::client::ChainReader;
use crate::blockchain::types::{SubmitError, TransactionPayload, TransactionResult, TxStatus};
use crate::config::SubmitterConfig;
use crate::observability::metrics;
use crate::provider::ProviderBinding;

/// Submits through the provider binding and waits for commitment.
pub struct TransactionSubmitter {
    binding: ProviderBinding,
    reader: Arc<dyn ChainReader>,
    confirmation_timeout: Duration,
    poll_interval: Duration,
    /// Held from submission until the wait ends.
    in_flight: Mutex<()>,
}

impl TransactionSubmitter {
    pub fn new(binding: ProviderBinding, reader: Arc<dyn ChainReader>, config: &SubmitterConfig) -> Self {
        Self::with_timing(
            binding,
            reader,
            Duration::from_secs(config.confirmation_timeout_secs),
            Duration::from_millis(config.poll_interval_ms),
        )
    }

    pub fn with_timing(
        binding: ProviderBinding,
        reader: Arc<dyn ChainReader>,
        confirmation_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            binding,
            reader,
            confirmation_timeout,
            poll_interval,
            in_flight: Mutex::new(()),
        }
    }

    /// Submit `payload` and wait until the chain reports it committed.
    ///
    /// Dropping the returned future abandons the wait; a transaction that
    /// was already handed to the provider is not recalled.
    pub async fn submit_and_confirm(&self, payload: &TransactionPayload) -> Result<TransactionResult, SubmitError> {
        let _guard = self.in_flight.lock().await;

        let hash = match self.binding.submit(payload).await {
            Ok(hash) => hash,
            Err(e) => {
                metrics::record_submission("rejected");
                return Err(SubmitError::Rejected(e));
            }
        };

        let result = self.wait_for_confirmation(&hash).await;
        metrics::record_submission(match &result {
            Ok(_) => "confirmed",
            Err(SubmitError::Timeout { .. }) => "timeout",
            Err(SubmitError::Aborted { .. }) => "aborted",
            Err(SubmitError::Rejected(_)) => "rejected",
        });
        result
    }

    /// Wait for a transaction to commit.
    ///
    /// Transient read failures while polling are logged and polling
    /// continues; only the deadline ends the wait without an answer.
    pub async fn wait_for_confirmation(&self, hash: &str) -> Result<TransactionResult, SubmitError> {
        let started = Instant::now();

        let result = timeout(self.confirmation_timeout, async {
            let mut ticker = interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                match self.reader.transaction_status(hash).await {
                    Ok(TxStatus::Committed { success: true, version, .. }) => {
                        return Ok(TransactionResult {
                            hash: hash.to_string(),
                            confirmed: true,
                            version,
                        });
                    }
                    Ok(TxStatus::Committed { success: false, vm_status, .. }) => {
                        return Err(SubmitError::Aborted {
                            hash: hash.to_string(),
                            vm_status,
                        });
                    }
                    Ok(status) => {
                        tracing::debug!(hash, status = ?status, "Transaction not committed yet");
                    }
                    Err(e) => {
                        tracing::warn!(hash, error = %e, "Status poll failed; will retry");
                    }
                }
            }
        })
        .await;

        match result {
            Ok(outcome) => {
                if outcome.is_ok() {
                    metrics::record_confirmation_latency(started.elapsed());
                    tracing::info!(hash, elapsed_ms = started.elapsed().as_millis() as u64, "Transaction confirmed");
                }
                outcome
            }
            Err(_) => {
                tracing::warn!(
                    hash,
                    waited_secs = self.confirmation_timeout.as_secs(),
                    "Confirmation not observed in time; transaction may still land"
                );
                Err(SubmitError::Timeout {
                    hash: hash.to_string(),
                    waited_secs: self.confirmation_timeout.as_secs(),
                })
            }
        }
    }

    pub fn binding(&self) -> &ProviderBinding {
        &self.binding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::{AccountAddress, ChainError, ChainResult};
    use crate::provider::{WalletError, WalletProvider, WalletResult};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    /// Provider that hands out sequential hashes and logs submissions.
    #[derive(Default)]
    struct CountingProvider {
        submitted: StdMutex<u32>,
        events: Arc<StdMutex<Vec<String>>>,
        reject: bool,
    }

    #[async_trait]
    impl WalletProvider for CountingProvider {
        async fn connect(&self) -> WalletResult<AccountAddress> {
            Ok(AccountAddress::new([1; 32]))
        }
        async fn disconnect(&self) -> WalletResult<()> {
            Ok(())
        }
        async fn account(&self) -> WalletResult<Option<AccountAddress>> {
            Ok(Some(AccountAddress::new([1; 32])))
        }
        async fn sign_and_submit_transaction(&self, _: &TransactionPayload) -> WalletResult<String> {
            if self.reject {
                return Err(WalletError::SigningRejected("declined".into()));
            }
            let mut n = self.submitted.lock().unwrap();
            *n += 1;
            let hash = format!("0x{:02}", *n);
            self.events.lock().unwrap().push(format!("submit:{}", hash));
            Ok(hash)
        }
    }

    /// Chain that commits each hash after a number of polls.
    struct ScriptedChain {
        polls_before_commit: Option<u32>,
        success: bool,
        polls: StdMutex<HashMap<String, u32>>,
        events: Arc<StdMutex<Vec<String>>>,
    }

    impl ScriptedChain {
        fn new(polls_before_commit: Option<u32>, success: bool, events: Arc<StdMutex<Vec<String>>>) -> Self {
            Self {
                polls_before_commit,
                success,
                polls: StdMutex::new(HashMap::new()),
                events,
            }
        }
    }

    #[async_trait]
    impl ChainReader for ScriptedChain {
        async fn fetch_resource(&self, address: &AccountAddress, resource_type: &str) -> ChainResult<Value> {
            Err(ChainError::ResourceNotFound {
                address: *address,
                resource_type: resource_type.to_string(),
            })
        }
        async fn fetch_view(&self, _: &str, _: Vec<Value>) -> ChainResult<Vec<Value>> {
            Ok(vec![])
        }
        async fn transaction_status(&self, hash: &str) -> ChainResult<TxStatus> {
            let mut polls = self.polls.lock().unwrap();
            let count = polls.entry(hash.to_string()).or_insert(0);
            *count += 1;
            match self.polls_before_commit {
                Some(n) if *count > n => {
                    self.events.lock().unwrap().push(format!("committed:{}", hash));
                    Ok(TxStatus::Committed {
                        success: self.success,
                        vm_status: if self.success { "Executed successfully".into() } else { "Move abort".into() },
                        version: Some(7),
                    })
                }
                Some(_) if *count == 1 => Err(ChainError::Rpc("flaky".into())),
                _ => Ok(TxStatus::Pending),
            }
        }
    }

    fn payload() -> TransactionPayload {
        TransactionPayload::entry_function("0x1::health_record::grant_access", vec![], vec![json!("0x2")])
            .unwrap()
    }

    fn submitter(provider: CountingProvider, chain: ScriptedChain, timeout_secs: u64) -> TransactionSubmitter {
        TransactionSubmitter::with_timing(
            ProviderBinding::new(Some(Arc::new(provider)), "https://install"),
            Arc::new(chain),
            Duration::from_secs(timeout_secs),
            Duration::from_secs(1),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirms_after_pending_polls() {
        let events = Arc::new(StdMutex::new(Vec::new()));
        let provider = CountingProvider { events: events.clone(), ..Default::default() };
        let chain = ScriptedChain::new(Some(2), true, events);
        let submitter = submitter(provider, chain, 30);

        let result = submitter.submit_and_confirm(&payload()).await.unwrap();
        assert_eq!(result, TransactionResult { hash: "0x01".into(), confirmed: true, version: Some(7) });
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_at_deadline_not_before() {
        let events = Arc::new(StdMutex::new(Vec::new()));
        let provider = CountingProvider { events: events.clone(), ..Default::default() };
        let chain = ScriptedChain::new(None, true, events);
        let submitter = submitter(provider, chain, 5);

        let started = Instant::now();
        let err = submitter.submit_and_confirm(&payload()).await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, SubmitError::Timeout { ref hash, waited_secs: 5 } if hash == "0x01"));
        assert!(elapsed >= Duration::from_secs(5), "returned early: {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(6), "returned late: {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_execution() {
        let events = Arc::new(StdMutex::new(Vec::new()));
        let provider = CountingProvider { events: events.clone(), ..Default::default() };
        let chain = ScriptedChain::new(Some(0), false, events);
        let submitter = submitter(provider, chain, 30);

        let err = submitter.submit_and_confirm(&payload()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Aborted { ref vm_status, .. } if vm_status == "Move abort"));
    }

    #[tokio::test]
    async fn test_rejection_passes_through_without_polling() {
        let events = Arc::new(StdMutex::new(Vec::new()));
        let provider = CountingProvider { reject: true, events: events.clone(), ..Default::default() };
        let chain = ScriptedChain::new(Some(0), true, events.clone());
        let submitter = submitter(provider, chain, 30);

        let err = submitter.submit_and_confirm(&payload()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Rejected(WalletError::SigningRejected(_))));
        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_absent_provider_is_rejected() {
        let events = Arc::new(StdMutex::new(Vec::new()));
        let submitter = TransactionSubmitter::with_timing(
            ProviderBinding::absent("https://install"),
            Arc::new(ScriptedChain::new(Some(0), true, events)),
            Duration::from_secs(5),
            Duration::from_secs(1),
        );
        let err = submitter.submit_and_confirm(&payload()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Rejected(WalletError::ProviderAbsent { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_submissions_are_serialized() {
        let events = Arc::new(StdMutex::new(Vec::new()));
        let provider = CountingProvider { events: events.clone(), ..Default::default() };
        let chain = ScriptedChain::new(Some(2), true, events.clone());
        let submitter = submitter(provider, chain, 30);

        let first = payload();
        let second = payload();
        let (a, b) = tokio::join!(
            submitter.submit_and_confirm(&first),
            submitter.submit_and_confirm(&second)
        );
        assert!(a.is_ok() && b.is_ok());

        let log = events.lock().unwrap().clone();
        assert_eq!(log, vec!["submit:0x01", "committed:0x01", "submit:0x02", "committed:0x02"]);
    }
}

//! The sign-and-send engine.
//!
//! One call to [`SignAndSend::execute`] is one pass over a transaction list:
//!
//! 1. Transactions are grouped by target point.
//! 2. Each group gets the signer for its point, created once through a
//!    memoized factory.
//! 3. A group's transactions are signed, submitted and confirmed one at a
//!    time, in input order. Groups are scheduled according to
//!    [`SignAndSendConfig::mode`].
//! 4. Every outcome is recorded. A failure never stops other transactions
//!    from being attempted.
//!
//! The engine never retries on its own. The caller decides whether to run
//! another pass over [`SignAndSendResult::pending`] (see
//! [`crate::run_with_retries`]).

use crate::SignAndSendConfig;
use omnigraph_core::{
    run_all, MemoizedFactory, OmniFactory, OmniSigner, OmniSignerFactory, SignerError,
};
use omnigraph_types::{
    group_transactions_by_point, OmniTransaction, OmniTransactionReceipt,
    OmniTransactionWithError, OmniTransactionWithReceipt,
};
use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Outcome of one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignAndSendResult {
    /// Confirmed transactions, in input order.
    pub succeeded: Vec<OmniTransactionWithReceipt>,

    /// Transactions that were attempted and failed, in input order.
    pub failed: Vec<OmniTransactionWithError<SignerError>>,

    /// Every input transaction that did not succeed, in input order. This
    /// includes failed transactions and those never attempted because of
    /// cancellation.
    pub pending: Vec<OmniTransaction>,
}

impl SignAndSendResult {
    /// Whether every transaction succeeded.
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Outcome of a single transaction, reported as it happens.
#[derive(Debug, Clone, Copy)]
pub enum TransactionOutcome<'a> {
    Succeeded(&'a OmniTransactionWithReceipt),
    Failed(&'a OmniTransactionWithError<SignerError>),
}

/// Progress notification passed to the callback of
/// [`SignAndSend::execute_with_progress`].
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    pub outcome: TransactionOutcome<'a>,
    /// Transactions finished so far in this pass, including this one.
    pub completed: usize,
    /// Transactions in this pass.
    pub total: usize,
}

type Outcome = Result<OmniTransactionReceipt, SignerError>;

/// Signs, submits and confirms transactions.
pub struct SignAndSend {
    signers: MemoizedFactory<Arc<OmniSignerFactory>, dyn OmniSigner>,
    config: SignAndSendConfig,
    cancellation: CancellationToken,
}

impl SignAndSend {
    pub fn new(signer_factory: Arc<OmniSignerFactory>, config: SignAndSendConfig) -> Self {
        Self {
            signers: MemoizedFactory::new(signer_factory),
            config,
            cancellation: CancellationToken::new(),
        }
    }

    /// Use `token` to stop the engine between transactions.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Token that stops the engine between transactions when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn config(&self) -> &SignAndSendConfig {
        &self.config
    }

    /// Run one pass over `transactions`.
    pub async fn execute(&self, transactions: &[OmniTransaction]) -> SignAndSendResult {
        self.execute_with_progress(transactions, |_| {}).await
    }

    /// Run one pass over `transactions`, reporting every outcome to
    /// `on_progress` as soon as it is known.
    #[instrument(skip_all, fields(transactions = transactions.len(), mode = %self.config.mode))]
    pub async fn execute_with_progress(
        &self,
        transactions: &[OmniTransaction],
        on_progress: impl Fn(Progress<'_>) + Send + Sync,
    ) -> SignAndSendResult {
        let total = transactions.len();
        let completed = AtomicUsize::new(0);
        let groups = group_transactions_by_point(transactions);
        debug!(groups = groups.len(), "Grouped transactions by point");

        let tasks = groups.into_iter().map(|group| {
            let on_progress = &on_progress;
            let completed = &completed;
            async move {
                Ok::<_, Infallible>(self.run_group(group, total, completed, on_progress).await)
            }
        });
        let outcomes = match run_all(self.config.mode, tasks).await {
            Ok(outcomes) => outcomes,
            Err(never) => match never {},
        };

        let mut by_index: Vec<Option<Outcome>> = vec![None; total];
        for (index, outcome) in outcomes.into_iter().flatten() {
            by_index[index] = Some(outcome);
        }

        let mut result = SignAndSendResult::default();
        for (transaction, outcome) in transactions.iter().zip(by_index) {
            match outcome {
                Some(Ok(receipt)) => result.succeeded.push(OmniTransactionWithReceipt {
                    transaction: transaction.clone(),
                    receipt,
                }),
                Some(Err(error)) => {
                    result.failed.push(OmniTransactionWithError {
                        transaction: transaction.clone(),
                        error,
                    });
                    result.pending.push(transaction.clone());
                }
                None => result.pending.push(transaction.clone()),
            }
        }

        info!(
            succeeded = result.succeeded.len(),
            failed = result.failed.len(),
            pending = result.pending.len(),
            "Sign and send finished"
        );
        result
    }

    async fn run_group(
        &self,
        group: Vec<(usize, &OmniTransaction)>,
        total: usize,
        completed: &AtomicUsize,
        on_progress: &(impl Fn(Progress<'_>) + Send + Sync),
    ) -> Vec<(usize, Outcome)> {
        let mut outcomes = Vec::with_capacity(group.len());
        let mut signer: Option<Result<Arc<dyn OmniSigner>, SignerError>> = None;

        for (index, transaction) in group {
            if self.cancellation.is_cancelled() {
                debug!(point = %transaction.point, "Cancelled, leaving remaining transactions pending");
                break;
            }

            if signer.is_none() {
                let created = self
                    .signers
                    .create(&transaction.point)
                    .await
                    .map_err(SignerError::from);
                signer = Some(created);
            }
            let outcome = match &signer {
                Some(Ok(signer)) => self.send(signer.as_ref(), transaction).await,
                Some(Err(error)) => Err(error.clone()),
                None => continue,
            };

            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            match &outcome {
                Ok(receipt) => {
                    debug!(%transaction, hash = %receipt.transaction_hash, "Transaction confirmed");
                    let entry = OmniTransactionWithReceipt {
                        transaction: transaction.clone(),
                        receipt: receipt.clone(),
                    };
                    on_progress(Progress {
                        outcome: TransactionOutcome::Succeeded(&entry),
                        completed: done,
                        total,
                    });
                }
                Err(error) => {
                    warn!(%transaction, %error, "Transaction failed");
                    let entry = OmniTransactionWithError {
                        transaction: transaction.clone(),
                        error: error.clone(),
                    };
                    on_progress(Progress {
                        outcome: TransactionOutcome::Failed(&entry),
                        completed: done,
                        total,
                    });
                }
            }
            outcomes.push((index, outcome));
        }

        outcomes
    }

    async fn send(&self, signer: &dyn OmniSigner, transaction: &OmniTransaction) -> Outcome {
        let response = signer.sign_and_send(transaction).await?;
        debug!(%transaction, hash = %response.transaction_hash, "Transaction submitted");
        signer
            .wait_for_receipt(&response, self.config.confirmations)
            .await
    }
}

//! Repeated sign-and-send passes.

use crate::{SignAndSend, SignAndSendResult};
use omnigraph_core::{with_retry, RetryAttempt, RetryConfig, SignerError};
use omnigraph_types::{OmniTransaction, OmniTransactionWithError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, info, warn};

/// A pass that left transactions pending.
#[derive(Debug)]
pub struct IncompletePass {
    /// Transactions that failed during the pass.
    pub failed: Vec<OmniTransactionWithError<SignerError>>,
    /// Every transaction of the pass that did not succeed, in input order.
    pub pending: Vec<OmniTransaction>,
}

/// Run passes of `engine` until every transaction succeeded, the attempt
/// budget of `config` is spent or the engine is cancelled.
///
/// Each pass after the first only covers the previous pass's pending
/// transactions and is preceded by the backoff delay of `config`. The result
/// holds the successes of every pass, in the order they were confirmed, and
/// the failures and pending transactions of the last pass.
pub async fn run_with_retries(
    engine: &SignAndSend,
    transactions: &[OmniTransaction],
    config: &RetryConfig,
) -> SignAndSendResult {
    run_with_retries_inspect(engine, transactions, config, |_| true).await
}

/// [`run_with_retries`] with a hook inspecting every incomplete pass before
/// the next one. Returning `false` from `on_retry` stops retrying.
pub async fn run_with_retries_inspect(
    engine: &SignAndSend,
    transactions: &[OmniTransaction],
    config: &RetryConfig,
    on_retry: impl Fn(RetryAttempt<'_, (), IncompletePass>) -> bool + Send + Sync + 'static,
) -> SignAndSendResult {
    let remaining = &Mutex::new(transactions.to_vec());
    let succeeded = &Mutex::new(Vec::new());
    let passes = &AtomicU32::new(0);

    let pass = move |()| async move {
        passes.fetch_add(1, Ordering::Relaxed);
        let batch = remaining.lock().clone();
        let mut result = engine.execute(&batch).await;
        succeeded.lock().append(&mut result.succeeded);
        if result.pending.is_empty() {
            return Ok(());
        }
        *remaining.lock() = result.pending.clone();
        Err(IncompletePass {
            failed: result.failed,
            pending: result.pending,
        })
    };

    let retrying = with_retry(pass, config.clone())
        .on_retry(move |attempt| {
            let (pass, pending) = (attempt.attempt, attempt.error.pending.len());
            let proceed = on_retry(attempt);
            if proceed {
                debug!(pass, pending, "Retrying pending transactions");
            }
            proceed
        })
        .with_cancellation(engine.cancellation_token());

    let (failed, pending) = match retrying.call(()).await {
        Ok(()) => (Vec::new(), Vec::new()),
        Err(IncompletePass { failed, pending }) => {
            warn!(
                passes = passes.load(Ordering::Relaxed),
                pending = pending.len(),
                "Giving up on pending transactions"
            );
            (failed, pending)
        }
    };

    let succeeded = std::mem::take(&mut *succeeded.lock());
    info!(
        passes = passes.load(Ordering::Relaxed),
        succeeded = succeeded.len(),
        pending = pending.len(),
        "Retries finished"
    );
    SignAndSendResult {
        succeeded,
        failed,
        pending,
    }
}

//! Sign-and-send engine for omnigraph.
//!
//! Takes the transactions produced by configurators and lands them:
//!
//! - [`SignAndSend`] runs one pass. Transactions for the same point are sent
//!   strictly one after another; groups for different points may run
//!   concurrently.
//! - [`run_with_retries`] repeats passes over whatever is still pending;
//!   [`run_with_retries_inspect`] lets the caller veto each retry.
//!
//! Every input transaction ends up in exactly one of
//! [`SignAndSendResult::succeeded`] or [`SignAndSendResult::pending`].

mod config;
mod engine;
mod retry;

pub use config::SignAndSendConfig;
pub use engine::{Progress, SignAndSend, SignAndSendResult, TransactionOutcome};
pub use retry::{run_with_retries, run_with_retries_inspect, IncompletePass};

//! Signer boundary.

use crate::{OmniFactory, SignerError};
use async_trait::async_trait;
use omnigraph_types::{OmniTransaction, OmniTransactionReceipt, OmniTransactionResponse};

/// Signs and submits transactions for one point.
///
/// Implementations are provided by chain adapters. They may retry transient
/// failures internally (see [`crate::with_retry`]); callers treat each method
/// call as one logical attempt.
#[async_trait]
pub trait OmniSigner: Send + Sync {
    /// Sign `transaction` and submit it to the network.
    async fn sign_and_send(
        &self,
        transaction: &OmniTransaction,
    ) -> Result<OmniTransactionResponse, SignerError>;

    /// Wait until a submitted transaction is confirmed.
    ///
    /// `confirmations` of `None` leaves the depth to the adapter's default.
    async fn wait_for_receipt(
        &self,
        response: &OmniTransactionResponse,
        confirmations: Option<u32>,
    ) -> Result<OmniTransactionReceipt, SignerError>;
}

/// Factory producing the signer for a point.
pub type OmniSignerFactory = dyn OmniFactory<dyn OmniSigner>;

//! Signer submitting transactions to the simulated network.

use crate::state::contract_key;
use crate::SimulatedNetwork;
use async_trait::async_trait;
use omnigraph_core::{OmniSigner, SignerError};
use omnigraph_types::{
    OmniPoint, OmniTransaction, OmniTransactionReceipt, OmniTransactionResponse,
};
use tracing::{debug, warn};

/// Signer for one contract of a [`SimulatedNetwork`].
///
/// Submitting applies the transaction's call immediately; every accepted
/// transaction is its own block.
pub struct SimulatedSigner {
    network: SimulatedNetwork,
    point: OmniPoint,
}

impl SimulatedSigner {
    pub(crate) fn new(network: SimulatedNetwork, point: OmniPoint) -> Self {
        Self { network, point }
    }
}

#[async_trait]
impl OmniSigner for SimulatedSigner {
    async fn sign_and_send(
        &self,
        transaction: &OmniTransaction,
    ) -> Result<OmniTransactionResponse, SignerError> {
        if contract_key(&transaction.point) != contract_key(&self.point) {
            return Err(SignerError::Signing(format!(
                "signer for {} cannot sign for {}",
                self.point, transaction.point
            )));
        }

        let outcome = self.network.write(|state| {
            if let Some(reason) = state.take_failure(&transaction.point) {
                return Err(SignerError::Submission(reason));
            }
            state
                .apply(transaction)
                .map_err(|revert| SignerError::Submission(format!("reverted: {}", revert)))
        });

        match outcome {
            Ok((transaction_hash, block_number)) => {
                debug!(%transaction, block_number, "Transaction mined");
                Ok(OmniTransactionResponse { transaction_hash })
            }
            Err(error) => {
                warn!(%transaction, %error, "Submission rejected");
                Err(error)
            }
        }
    }

    async fn wait_for_receipt(
        &self,
        response: &OmniTransactionResponse,
        _confirmations: Option<u32>,
    ) -> Result<OmniTransactionReceipt, SignerError> {
        let block_number = self
            .network
            .read(|state| state.receipts.get(&response.transaction_hash).copied())
            .ok_or_else(|| SignerError::Confirmation {
                transaction_hash: response.transaction_hash.clone(),
                reason: "transaction is not known to the network".into(),
            })?;
        Ok(OmniTransactionReceipt {
            transaction_hash: response.transaction_hash.clone(),
            block_number: Some(block_number),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call::SimulatedCall;
    use omnigraph_types::{Address, EndpointId};
    use tracing_test::traced_test;

    fn register(point: &OmniPoint, library: &str) -> OmniTransaction {
        SimulatedCall::RegisterLibrary {
            library: Address::new(library),
        }
        .into_transaction(point, "register")
        .unwrap()
    }

    #[tokio::test]
    async fn test_submit_and_confirm() {
        let network = SimulatedNetwork::new();
        let endpoint = network.add_endpoint(EndpointId(1), "0xe1").unwrap();
        let signer = SimulatedSigner::new(network.clone(), endpoint.clone());

        let response = signer
            .sign_and_send(&register(&endpoint, "0x11"))
            .await
            .unwrap();
        let receipt = signer.wait_for_receipt(&response, Some(1)).await.unwrap();

        assert_eq!(receipt.block_number, Some(1));
        assert_eq!(network.submitted().len(), 1);
    }

    #[traced_test]
    #[tokio::test]
    async fn test_revert_is_a_submission_error() {
        let network = SimulatedNetwork::new();
        let endpoint = network.add_endpoint(EndpointId(1), "0xe1").unwrap();
        let signer = SimulatedSigner::new(network.clone(), endpoint.clone());
        signer
            .sign_and_send(&register(&endpoint, "0x11"))
            .await
            .unwrap();

        let error = signer
            .sign_and_send(&register(&endpoint, "0x11"))
            .await
            .unwrap_err();

        assert!(
            matches!(error, SignerError::Submission(ref reason) if reason.contains("already registered"))
        );
        assert_eq!(network.block_number(), 1);
        assert!(logs_contain("Submission rejected"));
    }

    #[tokio::test]
    async fn test_foreign_transaction_is_refused() {
        let network = SimulatedNetwork::new();
        let endpoint = network.add_endpoint(EndpointId(1), "0xe1").unwrap();
        let other = network.add_endpoint(EndpointId(2), "0xe2").unwrap();
        let signer = SimulatedSigner::new(network, endpoint);

        let error = signer
            .sign_and_send(&register(&other, "0x11"))
            .await
            .unwrap_err();

        assert!(matches!(error, SignerError::Signing(_)));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let network = SimulatedNetwork::new();
        let endpoint = network.add_endpoint(EndpointId(1), "0xe1").unwrap();
        network.inject_failures(&endpoint, 1, "connection reset");
        let signer = SimulatedSigner::new(network.clone(), endpoint.clone());

        let first = signer.sign_and_send(&register(&endpoint, "0x11")).await;
        let second = signer.sign_and_send(&register(&endpoint, "0x11")).await;

        assert_eq!(first, Err(SignerError::Submission("connection reset".into())));
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_receipt() {
        let network = SimulatedNetwork::new();
        let endpoint = network.add_endpoint(EndpointId(1), "0xe1").unwrap();
        let signer = SimulatedSigner::new(network, endpoint);

        let error = signer
            .wait_for_receipt(
                &OmniTransactionResponse {
                    transaction_hash: "0x00".into(),
                },
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(error, SignerError::Confirmation { .. }));
    }
}

//! The simulated network and its factories.

use crate::sdk::{SimulatedEndpoint, SimulatedOApp};
use crate::signer::SimulatedSigner;
use crate::state::{contract_key, EndpointState, NetworkState, OAppState};
use async_trait::async_trait;
use omnigraph_core::{
    retry, FactoryError, OmniFactory, OmniSigner, OmniSignerFactory, RetryConfig, SdkError,
};
use omnigraph_protocol::{EndpointSdk, OAppReadSdk, OAppSdk};
use omnigraph_types::{Address, EndpointId, OmniPoint, OmniTransaction};
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Misuse of the network setup API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("An endpoint is already deployed for {0}")]
    DuplicateEndpoint(EndpointId),

    #[error("No endpoint is deployed for {0}")]
    MissingEndpoint(EndpointId),

    #[error("A contract is already deployed at {0}")]
    DuplicateContract(OmniPoint),
}

/// A set of endpoints and OApps living in memory.
///
/// Clones share the same state. The network hands out SDKs and signers for
/// its contracts through [`OmniFactory`]; transactions built by the SDKs take
/// effect only once a signer submits them.
///
/// Every SDK read runs under the network's read retry configuration, so
/// injected read failures within its budget never reach a configurator.
#[derive(Clone, Default)]
pub struct SimulatedNetwork {
    state: Arc<RwLock<NetworkState>>,
    read_retry: RetryConfig,
}

impl SimulatedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retry SDK reads according to `config`.
    ///
    /// Clones made before this call keep their previous configuration.
    pub fn with_read_retry(mut self, config: RetryConfig) -> Self {
        self.read_retry = config;
        self
    }

    /// Deploy the endpoint for `eid` at `address`.
    pub fn add_endpoint(
        &self,
        eid: EndpointId,
        address: impl Into<Address>,
    ) -> Result<OmniPoint, SetupError> {
        let address = address.into();
        let mut state = self.state.write();
        if state.endpoints.contains_key(&eid) {
            return Err(SetupError::DuplicateEndpoint(eid));
        }
        state
            .endpoints
            .insert(eid, EndpointState::new(address.clone()));
        debug!(%eid, %address, "Deployed endpoint");
        Ok(OmniPoint::new(eid, address))
    }

    /// Deploy an OApp at `point`. The endpoint for its eid must exist.
    pub fn add_oapp(&self, point: &OmniPoint) -> Result<(), SetupError> {
        let mut state = self.state.write();
        let Some(endpoint) = state.endpoints.get(&point.eid) else {
            return Err(SetupError::MissingEndpoint(point.eid));
        };
        let key = contract_key(point);
        if endpoint.address == point.address || state.oapps.contains_key(&key) {
            return Err(SetupError::DuplicateContract(point.clone()));
        }
        state.oapps.insert(key, OAppState::default());
        debug!(%point, "Deployed OApp");
        Ok(())
    }

    /// Make the next `count` submissions to `point` fail with `reason`.
    pub fn inject_failures(&self, point: &OmniPoint, count: u32, reason: impl Into<String>) {
        let mut state = self.state.write();
        if count == 0 {
            state.failures.remove(&contract_key(point));
        } else {
            state
                .failures
                .insert(contract_key(point), (count, reason.into()));
        }
    }

    /// Make the next `count` SDK reads at `point` fail with `reason`.
    ///
    /// Each read attempt consumes one failure, retries included.
    pub fn inject_read_failures(&self, point: &OmniPoint, count: u32, reason: impl Into<String>) {
        let mut state = self.state.write();
        if count == 0 {
            state.read_failures.remove(&contract_key(point));
        } else {
            state
                .read_failures
                .insert(contract_key(point), (count, reason.into()));
        }
    }

    /// Transactions accepted so far, in submission order.
    pub fn submitted(&self) -> Vec<OmniTransaction> {
        self.state.read().submitted.clone()
    }

    /// Number of transactions mined so far.
    pub fn block_number(&self) -> u64 {
        self.state.read().block_number
    }

    /// Factory for signers of this network's contracts.
    pub fn signer_factory(&self) -> Arc<OmniSignerFactory> {
        Arc::new(self.clone())
    }

    pub(crate) fn read<R>(&self, read: impl FnOnce(&NetworkState) -> R) -> R {
        read(&self.state.read())
    }

    pub(crate) fn write<R>(&self, write: impl FnOnce(&mut NetworkState) -> R) -> R {
        write(&mut self.state.write())
    }

    /// An SDK read of the contract at `point`, retried on failure.
    pub(crate) async fn query<R>(
        &self,
        point: &OmniPoint,
        read: impl Fn(&NetworkState) -> Result<R, SdkError>,
    ) -> Result<R, SdkError> {
        let read = &read;
        retry(self.read_retry.clone(), move || async move {
            if let Some(reason) = self.write(|state| state.take_read_failure(point)) {
                debug!(%point, %reason, "Injected read failure");
                return Err(SdkError::Rpc(reason));
            }
            self.read(read)
        })
        .await
    }

    fn endpoint(&self, point: &OmniPoint) -> Result<Arc<SimulatedEndpoint>, FactoryError> {
        if self.read(|state| state.endpoint_at(point).is_some()) {
            Ok(Arc::new(SimulatedEndpoint::new(self.clone(), point.clone())))
        } else {
            Err(FactoryError::Unsupported(point.clone()))
        }
    }

    fn oapp(&self, point: &OmniPoint) -> Result<Arc<SimulatedOApp>, FactoryError> {
        if self.read(|state| state.oapps.contains_key(&contract_key(point))) {
            Ok(Arc::new(SimulatedOApp::new(self.clone(), point.clone())))
        } else {
            Err(FactoryError::Unsupported(point.clone()))
        }
    }
}

#[async_trait]
impl OmniFactory<dyn EndpointSdk> for SimulatedNetwork {
    async fn create(&self, point: &OmniPoint) -> Result<Arc<dyn EndpointSdk>, FactoryError> {
        Ok(self.endpoint(point)?)
    }
}

#[async_trait]
impl OmniFactory<dyn OAppSdk> for SimulatedNetwork {
    async fn create(&self, point: &OmniPoint) -> Result<Arc<dyn OAppSdk>, FactoryError> {
        Ok(self.oapp(point)?)
    }
}

#[async_trait]
impl OmniFactory<dyn OAppReadSdk> for SimulatedNetwork {
    async fn create(&self, point: &OmniPoint) -> Result<Arc<dyn OAppReadSdk>, FactoryError> {
        Ok(self.oapp(point)?)
    }
}

#[async_trait]
impl OmniFactory<dyn OmniSigner> for SimulatedNetwork {
    async fn create(&self, point: &OmniPoint) -> Result<Arc<dyn OmniSigner>, FactoryError> {
        let known = self.read(|state| {
            state.endpoint_at(point).is_some() || state.oapps.contains_key(&contract_key(point))
        });
        if !known {
            return Err(FactoryError::Unsupported(point.clone()));
        }
        Ok(Arc::new(SimulatedSigner::new(self.clone(), point.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oapp_needs_endpoint() {
        let network = SimulatedNetwork::new();
        let oapp = OmniPoint::new(EndpointId(1), "0xa");

        assert_eq!(
            network.add_oapp(&oapp),
            Err(SetupError::MissingEndpoint(EndpointId(1)))
        );

        network.add_endpoint(EndpointId(1), "0xe1").unwrap();
        assert_eq!(network.add_oapp(&oapp), Ok(()));
        assert_eq!(
            network.add_oapp(&oapp.clone().with_name("again")),
            Err(SetupError::DuplicateContract(oapp.with_name("again")))
        );
    }

    #[test]
    fn test_duplicate_endpoint() {
        let network = SimulatedNetwork::new();
        network.add_endpoint(EndpointId(1), "0xe1").unwrap();

        assert_eq!(
            network.add_endpoint(EndpointId(1), "0xe2"),
            Err(SetupError::DuplicateEndpoint(EndpointId(1)))
        );
    }

    #[tokio::test]
    async fn test_factories_only_serve_deployed_contracts() {
        let network = SimulatedNetwork::new();
        let endpoint = network.add_endpoint(EndpointId(1), "0xE1").unwrap();
        let oapp = OmniPoint::new(EndpointId(1), "0xa");
        network.add_oapp(&oapp).unwrap();

        let endpoints: &dyn OmniFactory<dyn EndpointSdk> = &network;
        let oapps: &dyn OmniFactory<dyn OAppSdk> = &network;
        let signers: &dyn OmniFactory<dyn OmniSigner> = &network;

        assert!(endpoints.create(&endpoint).await.is_ok());
        assert!(endpoints.create(&oapp).await.is_err());
        assert!(oapps.create(&oapp).await.is_ok());
        assert!(oapps.create(&endpoint).await.is_err());
        assert!(signers.create(&oapp).await.is_ok());
        assert!(matches!(
            signers.create(&OmniPoint::new(EndpointId(2), "0xa")).await,
            Err(FactoryError::Unsupported(_))
        ));
    }
}

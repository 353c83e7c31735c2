//! Endpoint and OApp SDKs backed by the simulated network.

use crate::call::{ConfigEntry, EnforcedOptionsEntry, SimulatedCall};
use crate::state::{contract_key, EndpointState, OAppState};
use crate::SimulatedNetwork;
use async_trait::async_trait;
use omnigraph_core::{FactoryError, SdkError};
use omnigraph_protocol::{
    EndpointSdk, EnforcedOptionParam, ExecutorConfig, OAppReadSdk, OAppSdk, ReceiveLibrary,
    SetConfigParam, UlnConfig,
};
use omnigraph_types::{Address, EndpointId, OmniPoint, OmniTransaction};
use std::sync::Arc;

/// The endpoint contract at one point of a [`SimulatedNetwork`].
pub struct SimulatedEndpoint {
    network: SimulatedNetwork,
    point: OmniPoint,
}

impl SimulatedEndpoint {
    pub(crate) fn new(network: SimulatedNetwork, point: OmniPoint) -> Self {
        Self { network, point }
    }

    async fn query<R>(&self, query: impl Fn(&EndpointState) -> R) -> Result<R, SdkError> {
        self.network
            .query(&self.point, |state| {
                state
                    .endpoint_at(&self.point)
                    .map(&query)
                    .ok_or_else(|| SdkError::Rpc(format!("no endpoint deployed at {}", self.point)))
            })
            .await
    }

    fn call(
        &self,
        call: SimulatedCall,
        description: String,
    ) -> Result<OmniTransaction, SdkError> {
        call.into_transaction(&self.point, description)
    }
}

#[async_trait]
impl EndpointSdk for SimulatedEndpoint {
    fn point(&self) -> &OmniPoint {
        &self.point
    }

    async fn is_registered_library(&self, library: &Address) -> Result<bool, SdkError> {
        self.query(|endpoint| endpoint.registered.contains(library)).await
    }

    async fn register_library(&self, library: &Address) -> Result<OmniTransaction, SdkError> {
        self.call(
            SimulatedCall::RegisterLibrary {
                library: library.clone(),
            },
            format!("Registering library {}", library),
        )
    }

    async fn get_default_send_library(&self, eid: EndpointId) -> Result<Option<Address>, SdkError> {
        self.query(|endpoint| endpoint.default_send.get(&eid).cloned()).await
    }

    async fn set_default_send_library(
        &self,
        eid: EndpointId,
        library: &Address,
    ) -> Result<OmniTransaction, SdkError> {
        self.call(
            SimulatedCall::SetDefaultSendLibrary {
                eid,
                library: library.clone(),
            },
            format!("Setting default send library for {} to {}", eid, library),
        )
    }

    async fn get_default_receive_library(
        &self,
        eid: EndpointId,
    ) -> Result<Option<Address>, SdkError> {
        self.query(|endpoint| {
            endpoint
                .default_receive
                .get(&eid)
                .map(|(library, _)| library.clone())
        })
        .await
    }

    async fn set_default_receive_library(
        &self,
        eid: EndpointId,
        library: &Address,
        grace_period: u64,
    ) -> Result<OmniTransaction, SdkError> {
        self.call(
            SimulatedCall::SetDefaultReceiveLibrary {
                eid,
                library: library.clone(),
                grace_period,
            },
            format!(
                "Setting default receive library for {} to {} with grace period {}",
                eid, library, grace_period
            ),
        )
    }

    async fn get_send_library(
        &self,
        oapp: &Address,
        eid: EndpointId,
    ) -> Result<Option<Address>, SdkError> {
        self.query(|endpoint| {
            endpoint
                .send_libraries
                .get(&(oapp.clone(), eid))
                .or_else(|| endpoint.default_send.get(&eid))
                .cloned()
        })
        .await
    }

    async fn is_default_send_library(
        &self,
        oapp: &Address,
        eid: EndpointId,
    ) -> Result<bool, SdkError> {
        self.query(|endpoint| !endpoint.send_libraries.contains_key(&(oapp.clone(), eid)))
            .await
    }

    async fn set_send_library(
        &self,
        oapp: &Address,
        eid: EndpointId,
        library: &Address,
    ) -> Result<OmniTransaction, SdkError> {
        self.call(
            SimulatedCall::SetSendLibrary {
                oapp: oapp.clone(),
                eid,
                library: library.clone(),
            },
            format!("Setting send library for {} on {} to {}", eid, oapp, library),
        )
    }

    async fn get_receive_library(
        &self,
        oapp: &Address,
        eid: EndpointId,
    ) -> Result<Option<ReceiveLibrary>, SdkError> {
        self.query(|endpoint| {
            match endpoint.receive_libraries.get(&(oapp.clone(), eid)) {
                Some((library, _)) => Some(ReceiveLibrary {
                    library: library.clone(),
                    is_default: false,
                }),
                None => endpoint
                    .default_receive
                    .get(&eid)
                    .map(|(library, _)| ReceiveLibrary {
                        library: library.clone(),
                        is_default: true,
                    }),
            }
        })
        .await
    }

    async fn set_receive_library(
        &self,
        oapp: &Address,
        eid: EndpointId,
        library: &Address,
        grace_period: u64,
    ) -> Result<OmniTransaction, SdkError> {
        self.call(
            SimulatedCall::SetReceiveLibrary {
                oapp: oapp.clone(),
                eid,
                library: library.clone(),
                grace_period,
            },
            format!(
                "Setting receive library for {} on {} to {} with grace period {}",
                eid, oapp, library, grace_period
            ),
        )
    }

    async fn get_executor_config(
        &self,
        oapp: &Address,
        library: &Address,
        eid: EndpointId,
    ) -> Result<ExecutorConfig, SdkError> {
        self.query(|endpoint| {
            endpoint
                .executor_configs
                .get(&(oapp.clone(), library.clone(), eid))
                .cloned()
        })
        .await?
        .ok_or_else(|| SdkError::Unset(format!("executor config of {} for {}", oapp, eid)))
    }

    async fn get_uln_config(
        &self,
        oapp: &Address,
        library: &Address,
        eid: EndpointId,
    ) -> Result<UlnConfig, SdkError> {
        self.query(|endpoint| {
            endpoint
                .uln_configs
                .get(&(oapp.clone(), library.clone(), eid))
                .cloned()
        })
        .await?
        .ok_or_else(|| SdkError::Unset(format!("ULN config of {} for {}", oapp, eid)))
    }

    async fn set_config(
        &self,
        oapp: &Address,
        library: &Address,
        params: &[SetConfigParam],
    ) -> Result<OmniTransaction, SdkError> {
        self.call(
            SimulatedCall::SetConfig {
                oapp: oapp.clone(),
                library: library.clone(),
                params: params.iter().map(ConfigEntry::from).collect(),
            },
            format!(
                "Setting {} config entries for {} on library {}",
                params.len(),
                oapp,
                library
            ),
        )
    }
}

/// An OApp contract at one point of a [`SimulatedNetwork`].
///
/// Every simulated OApp supports read channels.
pub struct SimulatedOApp {
    network: SimulatedNetwork,
    point: OmniPoint,
}

impl SimulatedOApp {
    pub(crate) fn new(network: SimulatedNetwork, point: OmniPoint) -> Self {
        Self { network, point }
    }

    async fn query<R>(&self, query: impl Fn(&OAppState) -> R) -> Result<R, SdkError> {
        self.network
            .query(&self.point, |state| {
                state
                    .oapps
                    .get(&contract_key(&self.point))
                    .map(&query)
                    .ok_or_else(|| SdkError::Rpc(format!("no OApp deployed at {}", self.point)))
            })
            .await
    }

    fn call(
        &self,
        call: SimulatedCall,
        description: String,
    ) -> Result<OmniTransaction, SdkError> {
        call.into_transaction(&self.point, description)
    }
}

#[async_trait]
impl OAppSdk for SimulatedOApp {
    fn point(&self) -> &OmniPoint {
        &self.point
    }

    async fn get_endpoint_sdk(&self) -> Result<Arc<dyn EndpointSdk>, SdkError> {
        let eid = self.point.eid;
        let address = self
            .network
            .query(&self.point, |state| {
                Ok(state.endpoints.get(&eid).map(|endpoint| endpoint.address.clone()))
            })
            .await?
            .ok_or_else(|| FactoryError::Unsupported(self.point.clone()))?;
        Ok(Arc::new(SimulatedEndpoint::new(
            self.network.clone(),
            OmniPoint::new(eid, address),
        )))
    }

    async fn get_peer(&self, eid: EndpointId) -> Result<Option<Address>, SdkError> {
        self.query(|oapp| oapp.peers.get(&eid).cloned()).await
    }

    async fn set_peer(&self, eid: EndpointId, peer: &Address) -> Result<OmniTransaction, SdkError> {
        self.call(
            SimulatedCall::SetPeer {
                eid,
                peer: peer.clone(),
            },
            format!("Setting peer for {} to {}", eid, peer),
        )
    }

    async fn get_delegate(&self) -> Result<Option<Address>, SdkError> {
        self.query(|oapp| oapp.delegate.clone()).await
    }

    async fn set_delegate(&self, delegate: &Address) -> Result<OmniTransaction, SdkError> {
        self.call(
            SimulatedCall::SetDelegate {
                delegate: delegate.clone(),
            },
            format!("Setting delegate to {}", delegate),
        )
    }

    async fn get_enforced_options(
        &self,
        eid: EndpointId,
        msg_type: u16,
    ) -> Result<Vec<u8>, SdkError> {
        self.query(|oapp| {
            oapp.enforced_options
                .get(&(eid, msg_type))
                .cloned()
                .unwrap_or_default()
        })
        .await
    }

    async fn set_enforced_options(
        &self,
        params: &[EnforcedOptionParam],
    ) -> Result<OmniTransaction, SdkError> {
        let targets: Vec<String> = params
            .iter()
            .map(|param| format!("{} (message type {})", param.eid, param.msg_type))
            .collect();
        self.call(
            SimulatedCall::SetEnforcedOptions {
                params: params.iter().map(EnforcedOptionsEntry::from).collect(),
            },
            format!("Setting enforced options for {}", targets.join(", ")),
        )
    }
}

#[async_trait]
impl OAppReadSdk for SimulatedOApp {
    async fn is_read_channel_active(&self, channel: EndpointId) -> Result<bool, SdkError> {
        self.query(|oapp| oapp.read_channels.get(&channel).copied().unwrap_or(false))
            .await
    }

    async fn set_read_channel(
        &self,
        channel: EndpointId,
        active: bool,
    ) -> Result<OmniTransaction, SdkError> {
        let action = if active { "Activating" } else { "Deactivating" };
        self.call(
            SimulatedCall::SetReadChannel { channel, active },
            format!("{} read channel {}", action, channel.get()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omnigraph_core::RetryConfig;
    use std::time::Duration;

    fn network() -> (SimulatedNetwork, OmniPoint, OmniPoint) {
        let network = SimulatedNetwork::new();
        let endpoint = network.add_endpoint(EndpointId(1), "0xe1").unwrap();
        let oapp = OmniPoint::new(EndpointId(1), "0xa");
        network.add_oapp(&oapp).unwrap();
        (network, endpoint, oapp)
    }

    #[tokio::test]
    async fn test_writes_do_not_touch_state() {
        let (network, _, oapp) = network();
        let sdk = SimulatedOApp::new(network.clone(), oapp);

        let transaction = sdk
            .set_peer(EndpointId(2), &Address::new("0xBEEF"))
            .await
            .unwrap();

        assert_eq!(transaction.description, "Setting peer for Endpoint(2) to 0xbeef");
        assert_eq!(sdk.get_peer(EndpointId(2)).await.unwrap(), None);
        assert_eq!(network.block_number(), 0);
    }

    #[tokio::test]
    async fn test_unset_library_configs() {
        let (network, endpoint, oapp) = network();
        let sdk = SimulatedEndpoint::new(network, endpoint);

        let executor = sdk
            .get_executor_config(&oapp.address, &Address::new("0x11"), EndpointId(2))
            .await;
        let uln = sdk
            .get_uln_config(&oapp.address, &Address::new("0x11"), EndpointId(2))
            .await;

        assert!(matches!(executor, Err(SdkError::Unset(_))));
        assert!(matches!(uln, Err(SdkError::Unset(_))));
    }

    #[tokio::test]
    async fn test_oapp_resolves_its_endpoint() {
        let (network, endpoint, oapp) = network();
        let sdk = SimulatedOApp::new(network, oapp);

        let endpoint_sdk = sdk.get_endpoint_sdk().await.unwrap();

        assert_eq!(endpoint_sdk.point(), &endpoint);
        assert!(endpoint_sdk
            .is_default_send_library(&Address::new("0xa"), EndpointId(2))
            .await
            .unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reads_retry_injected_failures() {
        let (network, _, oapp) = network();
        let network = network.with_read_retry(
            RetryConfig::default()
                .with_num_attempts(3)
                .with_initial_delay(Duration::from_millis(10)),
        );
        let sdk = SimulatedOApp::new(network.clone(), oapp.clone());

        network.inject_read_failures(&oapp, 2, "timeout");
        assert_eq!(sdk.get_delegate().await.unwrap(), None);

        network.inject_read_failures(&oapp, 3, "timeout");
        assert!(matches!(
            sdk.get_delegate().await,
            Err(SdkError::Rpc(reason)) if reason == "timeout"
        ));
        // Every attempt consumed one failure.
        assert_eq!(sdk.get_delegate().await.unwrap(), None);
    }
}

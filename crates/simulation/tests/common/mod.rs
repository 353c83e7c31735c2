//! Shared fixtures for the end-to-end tests.

#![allow(dead_code)]

use omnigraph_core::{Configurator, ExecutionMode, RetryConfig};
use omnigraph_execution::{SignAndSend, SignAndSendConfig, SignAndSendResult};
use omnigraph_protocol::{
    configure_endpoint, EndpointEdgeConfig, EndpointNodeConfig, EndpointOmniGraph, EndpointSdk,
};
use omnigraph_simulation::SimulatedNetwork;
use omnigraph_test_helpers::{fully_connected, point};
use omnigraph_types::{Address, EndpointId, OmniEdge, OmniPoint, OmniTransaction};
use std::time::Duration;

pub const SEND_LIBRARY: &str = "0x5e00000000000000000000000000000000000001";
pub const RECEIVE_LIBRARY: &str = "0x7e00000000000000000000000000000000000002";

/// Two endpoints with one OApp each.
pub struct Deployment {
    pub network: SimulatedNetwork,
    pub endpoints: [OmniPoint; 2],
    pub oapps: [OmniPoint; 2],
}

impl Deployment {
    pub fn new() -> Self {
        let network = SimulatedNetwork::new()
            .with_read_retry(RetryConfig::default().with_initial_delay(Duration::from_millis(1)));
        let endpoints = [
            network.add_endpoint(EndpointId(30_101), "0xe1").unwrap(),
            network.add_endpoint(EndpointId(30_102), "0xe2").unwrap(),
        ];
        let oapps = [point(30_101, "0xaa01"), point(30_102, "0xBEEF")];
        for oapp in &oapps {
            network.add_oapp(oapp).unwrap();
        }
        Self {
            network,
            endpoints,
            oapps,
        }
    }

    pub fn engine(&self) -> SignAndSend {
        SignAndSend::new(self.network.signer_factory(), SignAndSendConfig::default())
    }

    pub async fn execute(&self, transactions: &[OmniTransaction]) -> SignAndSendResult {
        self.engine().execute(transactions).await
    }

    /// Endpoint graph declaring both libraries as defaults on every pathway.
    pub fn endpoint_graph(&self) -> EndpointOmniGraph {
        let mut builder =
            fully_connected::<EndpointNodeConfig, EndpointEdgeConfig>(&self.endpoints);
        let edges: Vec<_> = builder
            .edges()
            .map(|edge| {
                OmniEdge::new(
                    edge.vector.clone(),
                    EndpointEdgeConfig {
                        default_send_library: Some(Address::new(SEND_LIBRARY)),
                        default_receive_library: Some(Address::new(RECEIVE_LIBRARY)),
                        default_receive_library_grace_period: None,
                    },
                )
            })
            .collect();
        builder.add_edges(edges).unwrap();
        builder.into_graph()
    }

    /// Register the libraries and set the defaults on both endpoints.
    pub async fn wire_endpoints(&self) {
        let transactions = configure_endpoint::<EndpointNodeConfig, dyn EndpointSdk>()
            .configure(&self.endpoint_graph(), &self.network, ExecutionMode::Parallel)
            .await
            .unwrap();
        let result = self.execute(&transactions).await;
        assert!(result.is_complete(), "endpoint wiring failed: {:?}", result.failed);
    }
}

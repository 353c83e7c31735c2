//! Declared configuration payloads.
//!
//! These are the node and edge configs an operator attaches to a graph. All
//! of them deserialize from camelCase keys. Every facet is optional: a facet
//! that is not declared is left alone by the configurators.

use omnigraph_types::{Address, EndpointId, OmniGraph};
use serde::{Deserialize, Serialize};

/// Endpoint graph: nodes are endpoint deployments, edges configure the
/// defaults used towards a remote endpoint.
pub type EndpointOmniGraph = OmniGraph<EndpointNodeConfig, EndpointEdgeConfig>;

/// OApp graph: nodes are application deployments, edges are pathways.
pub type OAppOmniGraph = OmniGraph<OAppNodeConfig, OAppEdgeConfig>;

/// OApp graph whose nodes also declare read channels.
pub type OAppReadOmniGraph = OmniGraph<OAppReadNodeConfig, OAppEdgeConfig>;

/// Endpoint deployments carry no node level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointNodeConfig {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointEdgeConfig {
    /// Default library for messages sent to the remote endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_send_library: Option<Address>,

    /// Default library for messages received from the remote endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_receive_library: Option<Address>,

    /// Blocks during which the previous default receive library stays valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_receive_library_grace_period: Option<u64>,
}

impl EndpointEdgeConfig {
    /// Libraries this edge refers to, send library first.
    pub fn libraries(&self) -> impl Iterator<Item = &Address> {
        self.default_send_library
            .iter()
            .chain(self.default_receive_library.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAppNodeConfig {
    /// Account allowed to configure the OApp on its endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegate: Option<Address>,
}

impl AsRef<OAppNodeConfig> for OAppNodeConfig {
    fn as_ref(&self) -> &OAppNodeConfig {
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAppReadNodeConfig {
    #[serde(flatten)]
    pub oapp: OAppNodeConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_channel_configs: Option<Vec<ReadChannelConfig>>,
}

impl AsRef<OAppNodeConfig> for OAppReadNodeConfig {
    fn as_ref(&self) -> &OAppNodeConfig {
        &self.oapp
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadChannelConfig {
    pub channel_id: u32,

    /// Whether the OApp should listen on the channel. Defaults to active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl ReadChannelConfig {
    pub fn channel(&self) -> EndpointId {
        EndpointId(self.channel_id)
    }

    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(true)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAppEdgeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_library: Option<Address>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive_library_config: Option<ReceiveLibraryConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_config: Option<SendConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receive_config: Option<ReceiveConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforced_options: Option<Vec<EnforcedOption>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveLibraryConfig {
    pub receive_library: Address,

    #[serde(default)]
    pub grace_period: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor_config: Option<ExecutorConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uln_config: Option<UlnConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uln_config: Option<UlnConfig>,
}

/// Verification settings of an ultra light node library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UlnConfig {
    /// Block confirmations required before verification.
    #[serde(default)]
    pub confirmations: u64,

    /// Verifiers that must all sign.
    #[serde(default, alias = "requiredDVNs")]
    pub required_dvns: Vec<Address>,

    /// Verifiers of which `optional_dvn_threshold` must sign.
    #[serde(default, alias = "optionalDVNs")]
    pub optional_dvns: Vec<Address>,

    #[serde(default, alias = "optionalDVNThreshold")]
    pub optional_dvn_threshold: u8,
}

impl UlnConfig {
    /// Canonical form used for comparison.
    ///
    /// Verifier sets are unordered on chain, so both lists are sorted and
    /// deduplicated. Addresses are already case-normalized.
    pub fn normalized(&self) -> Self {
        let canonical = |dvns: &[Address]| {
            let mut dvns = dvns.to_vec();
            dvns.sort();
            dvns.dedup();
            dvns
        };

        Self {
            confirmations: self.confirmations,
            required_dvns: canonical(&self.required_dvns),
            optional_dvns: canonical(&self.optional_dvns),
            optional_dvn_threshold: self.optional_dvn_threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorConfig {
    #[serde(default)]
    pub max_message_size: u32,

    #[serde(default = "Address::zero")]
    pub executor: Address,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_message_size: 0,
            executor: Address::zero(),
        }
    }
}

impl ExecutorConfig {
    /// Canonical form used for comparison.
    pub fn normalized(&self) -> Self {
        let executor = if self.executor.is_zero() {
            Address::zero()
        } else {
            self.executor.clone()
        };
        Self {
            max_message_size: self.max_message_size,
            executor,
        }
    }
}

/// Kind of an executor option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecutorOptionType {
    /// Gas (and native value) for `lzReceive`.
    LzReceive,
    /// Native token airdrop to `receiver`.
    NativeDrop,
    /// Gas (and native value) for the compose call at `index`.
    Compose,
    /// Deliver messages in nonce order.
    OrderedExecution,
}

/// One executor option enforced for a message type.
///
/// Fields not used by `option_type` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnforcedOption {
    pub msg_type: u16,

    pub option_type: ExecutorOptionType,

    #[serde(default)]
    pub gas: u64,

    #[serde(default)]
    pub value: u128,

    #[serde(default)]
    pub index: u16,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<Address>,
}

impl EnforcedOption {
    pub fn lz_receive(msg_type: u16, gas: u64, value: u128) -> Self {
        Self {
            msg_type,
            option_type: ExecutorOptionType::LzReceive,
            gas,
            value,
            index: 0,
            receiver: None,
        }
    }

    pub fn native_drop(msg_type: u16, value: u128, receiver: Address) -> Self {
        Self {
            msg_type,
            option_type: ExecutorOptionType::NativeDrop,
            gas: 0,
            value,
            index: 0,
            receiver: Some(receiver),
        }
    }

    pub fn compose(msg_type: u16, index: u16, gas: u64, value: u128) -> Self {
        Self {
            msg_type,
            option_type: ExecutorOptionType::Compose,
            gas,
            value,
            index,
            receiver: None,
        }
    }

    pub fn ordered_execution(msg_type: u16) -> Self {
        Self {
            msg_type,
            option_type: ExecutorOptionType::OrderedExecution,
            gas: 0,
            value: 0,
            index: 0,
            receiver: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use omnigraph_types::OmniEdge;

    #[test]
    fn test_uln_normalization_ignores_order_case_and_duplicates() {
        let declared = UlnConfig {
            confirmations: 15,
            required_dvns: vec![Address::new("0xBB"), Address::new("0xaa"), Address::new("0xbb")],
            optional_dvns: vec![],
            optional_dvn_threshold: 0,
        };
        let on_chain = UlnConfig {
            confirmations: 15,
            required_dvns: vec![Address::new("0xaa"), Address::new("0xbb")],
            ..Default::default()
        };

        assert_ne!(declared, on_chain);
        assert_eq!(declared.normalized(), on_chain.normalized());
    }

    #[test]
    fn test_executor_config_defaults_to_zero_executor() {
        let config: ExecutorConfig = serde_json::from_str(r#"{"maxMessageSize": 10000}"#).unwrap();
        assert_eq!(config.max_message_size, 10_000);
        assert!(config.executor.is_zero());
    }

    #[test]
    fn test_edge_config_from_json() {
        let edge: OmniEdge<OAppEdgeConfig> = serde_json::from_str(
            r#"{
                "vector": {
                    "from": {"eid": 30101, "address": "0xAA"},
                    "to": {"eid": 30102, "address": "0xBB"}
                },
                "config": {
                    "sendLibrary": "0x5E",
                    "receiveLibraryConfig": {"receiveLibrary": "0x7E", "gracePeriod": 0},
                    "sendConfig": {
                        "ulnConfig": {"confirmations": 42, "requiredDVNs": ["0xD1"]}
                    },
                    "enforcedOptions": [
                        {"msgType": 1, "optionType": "lzReceive", "gas": 200000},
                        {"msgType": 2, "optionType": "orderedExecution"}
                    ]
                }
            }"#,
        )
        .unwrap();

        let config = edge.config.unwrap();
        assert_eq!(config.send_library, Some(Address::new("0x5e")));
        let uln = config.send_config.unwrap().uln_config.unwrap();
        assert_eq!(uln.confirmations, 42);
        assert_eq!(uln.required_dvns, vec![Address::new("0xd1")]);
        assert_eq!(
            config.enforced_options.unwrap(),
            vec![
                EnforcedOption::lz_receive(1, 200_000, 0),
                EnforcedOption::ordered_execution(2),
            ]
        );
    }

    #[test]
    fn test_oapp_graph_from_toml() {
        let graph: OAppOmniGraph = toml::from_str(
            r#"
            [[nodes]]
            point = { eid = 30101, address = "0xAA", name = "ethereum" }
            config = { delegate = "0xDE" }

            [[nodes]]
            point = { eid = 30102, address = "0xBB" }

            [[edges]]
            vector = { from = { eid = 30101, address = "0xAA", name = "ethereum" }, to = { eid = 30102, address = "0xBB" } }

            [edges.config]
            sendLibrary = "0x5E"
            receiveLibraryConfig = { receiveLibrary = "0x7E" }

            [[edges.config.enforcedOptions]]
            msgType = 1
            optionType = "lzReceive"
            gas = 200000

            [[edges]]
            vector = { from = { eid = 30102, address = "0xBB" }, to = { eid = 30101, address = "0xAA", name = "ethereum" } }
            "#,
        )
        .unwrap();

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[0].point.name.as_deref(), Some("ethereum"));
        assert!(graph.nodes[1].config.is_none());

        let config = graph.edges[0].config.as_ref().unwrap();
        assert_eq!(
            config.receive_library_config,
            Some(ReceiveLibraryConfig {
                receive_library: Address::new("0x7e"),
                grace_period: 0,
            })
        );
        assert_eq!(
            config.enforced_options.as_deref(),
            Some(&[EnforcedOption::lz_receive(1, 200_000, 0)][..])
        );
        assert!(graph.edges[1].config.is_none());
    }

    #[test]
    fn test_read_node_config_flattens_oapp_config() {
        let config: OAppReadNodeConfig = serde_json::from_str(
            r#"{"delegate": "0xDE", "readChannelConfigs": [{"channelId": 4294967295}]}"#,
        )
        .unwrap();

        assert_eq!(config.as_ref().delegate, Some(Address::new("0xde")));
        let channels = config.read_channel_configs.unwrap();
        assert!(channels[0].is_active());
        assert_eq!(channels[0].channel(), EndpointId(u32::MAX));
    }
}

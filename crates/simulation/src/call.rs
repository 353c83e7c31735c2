//! Call data of simulated transactions.
//!
//! Simulated SDKs encode every write as a JSON [`SimulatedCall`] in
//! [`OmniTransaction::data`]; the simulated signer decodes and applies it.

use omnigraph_core::SdkError;
use omnigraph_protocol::{EnforcedOptionParam, ExecutorConfig, SetConfigParam, UlnConfig};
use omnigraph_types::{Address, EndpointId, OmniPoint, OmniTransaction};
use serde::{Deserialize, Serialize};

/// A contract call understood by the simulated network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum SimulatedCall {
    #[serde(rename_all = "camelCase")]
    RegisterLibrary { library: Address },

    #[serde(rename_all = "camelCase")]
    SetDefaultSendLibrary { eid: EndpointId, library: Address },

    #[serde(rename_all = "camelCase")]
    SetDefaultReceiveLibrary {
        eid: EndpointId,
        library: Address,
        grace_period: u64,
    },

    #[serde(rename_all = "camelCase")]
    SetSendLibrary {
        oapp: Address,
        eid: EndpointId,
        library: Address,
    },

    #[serde(rename_all = "camelCase")]
    SetReceiveLibrary {
        oapp: Address,
        eid: EndpointId,
        library: Address,
        grace_period: u64,
    },

    #[serde(rename_all = "camelCase")]
    SetConfig {
        oapp: Address,
        library: Address,
        params: Vec<ConfigEntry>,
    },

    #[serde(rename_all = "camelCase")]
    SetPeer { eid: EndpointId, peer: Address },

    #[serde(rename_all = "camelCase")]
    SetDelegate { delegate: Address },

    #[serde(rename_all = "camelCase")]
    SetEnforcedOptions { params: Vec<EnforcedOptionsEntry> },

    #[serde(rename_all = "camelCase")]
    SetReadChannel { channel: EndpointId, active: bool },
}

impl SimulatedCall {
    /// Wrap the call in a transaction targeting `point`.
    pub fn into_transaction(
        self,
        point: &OmniPoint,
        description: impl Into<String>,
    ) -> Result<OmniTransaction, SdkError> {
        let data =
            serde_json::to_vec(&self).map_err(|error| SdkError::Encoding(error.to_string()))?;
        Ok(OmniTransaction::new(point.clone(), data, description))
    }

    /// Decode the call carried by `transaction`.
    pub fn decode(transaction: &OmniTransaction) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(&transaction.data)
    }
}

/// Serializable form of [`SetConfigParam`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "configType", rename_all = "camelCase")]
pub enum ConfigEntry {
    Executor {
        eid: EndpointId,
        config: ExecutorConfig,
    },
    Uln {
        eid: EndpointId,
        config: UlnConfig,
    },
}

impl From<&SetConfigParam> for ConfigEntry {
    fn from(param: &SetConfigParam) -> Self {
        match param {
            SetConfigParam::Executor { eid, config } => ConfigEntry::Executor {
                eid: *eid,
                config: config.clone(),
            },
            SetConfigParam::Uln { eid, config } => ConfigEntry::Uln {
                eid: *eid,
                config: config.clone(),
            },
        }
    }
}

/// Serializable form of [`EnforcedOptionParam`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnforcedOptionsEntry {
    pub eid: EndpointId,
    pub msg_type: u16,
    pub options: String,
}

impl From<&EnforcedOptionParam> for EnforcedOptionsEntry {
    fn from(param: &EnforcedOptionParam) -> Self {
        Self {
            eid: param.eid,
            msg_type: param.msg_type,
            options: format!("0x{}", hex::encode(&param.options)),
        }
    }
}

impl EnforcedOptionsEntry {
    pub fn decoded_options(&self) -> Result<Vec<u8>, hex::FromHexError> {
        hex::decode(self.options.trim_start_matches("0x"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_json_shape() {
        let call = SimulatedCall::SetDefaultReceiveLibrary {
            eid: EndpointId(30_102),
            library: Address::new("0xAB"),
            grace_period: 5,
        };

        let json = serde_json::to_value(&call).unwrap();

        assert_eq!(json["method"], "setDefaultReceiveLibrary");
        assert_eq!(json["eid"], 30_102);
        assert_eq!(json["library"], "0xab");
        assert_eq!(json["gracePeriod"], 5);
    }

    #[test]
    fn test_transaction_carries_call() {
        let at = OmniPoint::new(EndpointId(1), "0x01");
        let call = SimulatedCall::SetEnforcedOptions {
            params: vec![EnforcedOptionsEntry::from(&EnforcedOptionParam {
                eid: EndpointId(2),
                msg_type: 1,
                options: vec![0x00, 0x03],
            })],
        };

        let transaction = call.clone().into_transaction(&at, "options").unwrap();

        assert_eq!(transaction.point, at);
        assert_eq!(SimulatedCall::decode(&transaction).unwrap(), call);
        match call {
            SimulatedCall::SetEnforcedOptions { params } => {
                assert_eq!(params[0].options, "0x0003");
                assert_eq!(params[0].decoded_options().unwrap(), vec![0x00, 0x03]);
            }
            other => panic!("unexpected call {:?}", other),
        }
    }
}

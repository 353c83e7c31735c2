//! In-memory contract state and call application.

use crate::call::{ConfigEntry, SimulatedCall};
use omnigraph_protocol::{ExecutorConfig, UlnConfig};
use omnigraph_types::{Address, EndpointId, OmniPoint, OmniTransaction};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;
use tracing::trace;

/// Reason a simulated call was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Revert {
    #[error("no contract deployed at {0}")]
    NoContract(OmniPoint),

    #[error("{method} is not a method of the contract at {point}")]
    UnknownMethod { point: OmniPoint, method: &'static str },

    #[error("library {0} is not registered")]
    UnregisteredLibrary(Address),

    #[error("library {0} is already registered")]
    AlreadyRegistered(Address),

    #[error("malformed call data: {0}")]
    Malformed(String),
}

/// Endpoint contract storage.
#[derive(Debug, Clone)]
pub(crate) struct EndpointState {
    pub address: Address,
    pub registered: BTreeSet<Address>,
    pub default_send: BTreeMap<EndpointId, Address>,
    pub default_receive: BTreeMap<EndpointId, (Address, u64)>,
    pub send_libraries: HashMap<(Address, EndpointId), Address>,
    pub receive_libraries: HashMap<(Address, EndpointId), (Address, u64)>,
    pub executor_configs: HashMap<(Address, Address, EndpointId), ExecutorConfig>,
    pub uln_configs: HashMap<(Address, Address, EndpointId), UlnConfig>,
}

impl EndpointState {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            registered: BTreeSet::new(),
            default_send: BTreeMap::new(),
            default_receive: BTreeMap::new(),
            send_libraries: HashMap::new(),
            receive_libraries: HashMap::new(),
            executor_configs: HashMap::new(),
            uln_configs: HashMap::new(),
        }
    }

    fn require_registered(&self, library: &Address) -> Result<(), Revert> {
        if self.registered.contains(library) {
            Ok(())
        } else {
            Err(Revert::UnregisteredLibrary(library.clone()))
        }
    }

    fn apply(&mut self, point: &OmniPoint, call: SimulatedCall) -> Result<(), Revert> {
        match call {
            SimulatedCall::RegisterLibrary { library } => {
                if !self.registered.insert(library.clone()) {
                    return Err(Revert::AlreadyRegistered(library));
                }
            }
            SimulatedCall::SetDefaultSendLibrary { eid, library } => {
                self.require_registered(&library)?;
                self.default_send.insert(eid, library);
            }
            SimulatedCall::SetDefaultReceiveLibrary {
                eid,
                library,
                grace_period,
            } => {
                self.require_registered(&library)?;
                self.default_receive.insert(eid, (library, grace_period));
            }
            // The zero library resets the OApp to the endpoint default.
            SimulatedCall::SetSendLibrary { oapp, eid, library } => {
                if library.is_zero() {
                    self.send_libraries.remove(&(oapp, eid));
                } else {
                    self.require_registered(&library)?;
                    self.send_libraries.insert((oapp, eid), library);
                }
            }
            SimulatedCall::SetReceiveLibrary {
                oapp,
                eid,
                library,
                grace_period,
            } => {
                if library.is_zero() {
                    self.receive_libraries.remove(&(oapp, eid));
                } else {
                    self.require_registered(&library)?;
                    self.receive_libraries
                        .insert((oapp, eid), (library, grace_period));
                }
            }
            SimulatedCall::SetConfig {
                oapp,
                library,
                params,
            } => {
                self.require_registered(&library)?;
                for param in params {
                    match param {
                        ConfigEntry::Executor { eid, config } => {
                            self.executor_configs
                                .insert((oapp.clone(), library.clone(), eid), config);
                        }
                        ConfigEntry::Uln { eid, config } => {
                            self.uln_configs
                                .insert((oapp.clone(), library.clone(), eid), config);
                        }
                    }
                }
            }
            other => {
                return Err(Revert::UnknownMethod {
                    point: point.clone(),
                    method: other.method(),
                })
            }
        }
        Ok(())
    }
}

/// OApp contract storage.
#[derive(Debug, Clone, Default)]
pub(crate) struct OAppState {
    pub peers: BTreeMap<EndpointId, Address>,
    pub delegate: Option<Address>,
    pub enforced_options: BTreeMap<(EndpointId, u16), Vec<u8>>,
    pub read_channels: BTreeMap<EndpointId, bool>,
}

impl OAppState {
    fn apply(&mut self, point: &OmniPoint, call: SimulatedCall) -> Result<(), Revert> {
        match call {
            SimulatedCall::SetPeer { eid, peer } => {
                self.peers.insert(eid, peer);
            }
            SimulatedCall::SetDelegate { delegate } => {
                self.delegate = Some(delegate);
            }
            SimulatedCall::SetEnforcedOptions { params } => {
                for param in params {
                    let options = param
                        .decoded_options()
                        .map_err(|error| Revert::Malformed(error.to_string()))?;
                    self.enforced_options
                        .insert((param.eid, param.msg_type), options);
                }
            }
            SimulatedCall::SetReadChannel { channel, active } => {
                self.read_channels.insert(channel, active);
            }
            other => {
                return Err(Revert::UnknownMethod {
                    point: point.clone(),
                    method: other.method(),
                })
            }
        }
        Ok(())
    }
}

impl SimulatedCall {
    fn method(&self) -> &'static str {
        match self {
            SimulatedCall::RegisterLibrary { .. } => "registerLibrary",
            SimulatedCall::SetDefaultSendLibrary { .. } => "setDefaultSendLibrary",
            SimulatedCall::SetDefaultReceiveLibrary { .. } => "setDefaultReceiveLibrary",
            SimulatedCall::SetSendLibrary { .. } => "setSendLibrary",
            SimulatedCall::SetReceiveLibrary { .. } => "setReceiveLibrary",
            SimulatedCall::SetConfig { .. } => "setConfig",
            SimulatedCall::SetPeer { .. } => "setPeer",
            SimulatedCall::SetDelegate { .. } => "setDelegate",
            SimulatedCall::SetEnforcedOptions { .. } => "setEnforcedOptions",
            SimulatedCall::SetReadChannel { .. } => "setReadChannel",
        }
    }
}

/// Contracts are identified by endpoint and address; point names are labels.
pub(crate) type ContractKey = (EndpointId, Address);

pub(crate) fn contract_key(point: &OmniPoint) -> ContractKey {
    (point.eid, point.address.clone())
}

fn take_injected(
    failures: &mut BTreeMap<ContractKey, (u32, String)>,
    point: &OmniPoint,
) -> Option<String> {
    let key = contract_key(point);
    let (left, reason) = failures.get_mut(&key)?;
    let reason = reason.clone();
    *left = left.saturating_sub(1);
    if *left == 0 {
        failures.remove(&key);
    }
    Some(reason)
}

/// Whole-network state.
#[derive(Debug, Default)]
pub(crate) struct NetworkState {
    pub endpoints: BTreeMap<EndpointId, EndpointState>,
    pub oapps: BTreeMap<ContractKey, OAppState>,
    /// Remaining injected submission failures per contract.
    pub failures: BTreeMap<ContractKey, (u32, String)>,
    /// Remaining injected read failures per contract.
    pub read_failures: BTreeMap<ContractKey, (u32, String)>,
    /// Accepted transactions in submission order.
    pub submitted: Vec<OmniTransaction>,
    /// Block number of every accepted transaction, by hash.
    pub receipts: HashMap<String, u64>,
    pub block_number: u64,
}

impl NetworkState {
    pub fn endpoint_at(&self, point: &OmniPoint) -> Option<&EndpointState> {
        self.endpoints
            .get(&point.eid)
            .filter(|endpoint| endpoint.address == point.address)
    }

    /// Take one injected submission failure for `point`, if any are left.
    pub fn take_failure(&mut self, point: &OmniPoint) -> Option<String> {
        take_injected(&mut self.failures, point)
    }

    /// Take one injected read failure for `point`, if any are left.
    pub fn take_read_failure(&mut self, point: &OmniPoint) -> Option<String> {
        take_injected(&mut self.read_failures, point)
    }

    /// Apply the call carried by `transaction` and mine it.
    ///
    /// A reverted call leaves the state untouched.
    pub fn apply(&mut self, transaction: &OmniTransaction) -> Result<(String, u64), Revert> {
        let call = SimulatedCall::decode(transaction)
            .map_err(|error| Revert::Malformed(error.to_string()))?;
        let point = &transaction.point;
        trace!(%point, method = call.method(), "Applying call");

        let is_endpoint = self.endpoint_at(point).is_some();
        if is_endpoint {
            let mut endpoint = self
                .endpoints
                .get(&point.eid)
                .cloned()
                .ok_or_else(|| Revert::NoContract(point.clone()))?;
            endpoint.apply(point, call)?;
            self.endpoints.insert(point.eid, endpoint);
        } else {
            let key = contract_key(point);
            let mut oapp = self
                .oapps
                .get(&key)
                .cloned()
                .ok_or_else(|| Revert::NoContract(point.clone()))?;
            oapp.apply(point, call)?;
            self.oapps.insert(key, oapp);
        }

        self.block_number += 1;
        let hash = format!("0x{:064x}", self.block_number);
        self.receipts.insert(hash.clone(), self.block_number);
        self.submitted.push(transaction.clone());
        Ok((hash, self.block_number))
    }
}

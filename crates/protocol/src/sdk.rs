//! Chain SDK boundary of the messaging protocol.
//!
//! Chain adapters implement these traits for their contracts. Reads return
//! the current on-chain value; writes never touch the chain and instead
//! return the [`OmniTransaction`] that would perform the change. A read of a
//! value the protocol reports as never configured may fail with
//! [`SdkError::Unset`], which configurators treat as the facet's default.

use crate::{ExecutorConfig, UlnConfig};
use async_trait::async_trait;
use omnigraph_core::{OmniFactory, SdkError};
use omnigraph_types::{Address, EndpointId, OmniPoint, OmniTransaction};
use std::sync::Arc;

/// One entry of a `setConfig` call on a message library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetConfigParam {
    Executor { eid: EndpointId, config: ExecutorConfig },
    Uln { eid: EndpointId, config: UlnConfig },
}

impl SetConfigParam {
    pub fn eid(&self) -> EndpointId {
        match self {
            SetConfigParam::Executor { eid, .. } | SetConfigParam::Uln { eid, .. } => *eid,
        }
    }
}

/// Receive library in use by an OApp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveLibrary {
    pub library: Address,
    /// Whether the OApp falls back to the endpoint default.
    pub is_default: bool,
}

/// The endpoint contract at one point.
#[async_trait]
pub trait EndpointSdk: Send + Sync {
    fn point(&self) -> &OmniPoint;

    async fn is_registered_library(&self, library: &Address) -> Result<bool, SdkError>;

    async fn register_library(&self, library: &Address) -> Result<OmniTransaction, SdkError>;

    /// Default send library towards `eid`, `None` if not set.
    async fn get_default_send_library(&self, eid: EndpointId) -> Result<Option<Address>, SdkError>;

    async fn set_default_send_library(
        &self,
        eid: EndpointId,
        library: &Address,
    ) -> Result<OmniTransaction, SdkError>;

    /// Default receive library for messages from `eid`, `None` if not set.
    async fn get_default_receive_library(
        &self,
        eid: EndpointId,
    ) -> Result<Option<Address>, SdkError>;

    async fn set_default_receive_library(
        &self,
        eid: EndpointId,
        library: &Address,
        grace_period: u64,
    ) -> Result<OmniTransaction, SdkError>;

    /// Send library `oapp` uses towards `eid`, after applying the default.
    async fn get_send_library(
        &self,
        oapp: &Address,
        eid: EndpointId,
    ) -> Result<Option<Address>, SdkError>;

    async fn is_default_send_library(
        &self,
        oapp: &Address,
        eid: EndpointId,
    ) -> Result<bool, SdkError>;

    async fn set_send_library(
        &self,
        oapp: &Address,
        eid: EndpointId,
        library: &Address,
    ) -> Result<OmniTransaction, SdkError>;

    async fn get_receive_library(
        &self,
        oapp: &Address,
        eid: EndpointId,
    ) -> Result<Option<ReceiveLibrary>, SdkError>;

    async fn set_receive_library(
        &self,
        oapp: &Address,
        eid: EndpointId,
        library: &Address,
        grace_period: u64,
    ) -> Result<OmniTransaction, SdkError>;

    async fn get_executor_config(
        &self,
        oapp: &Address,
        library: &Address,
        eid: EndpointId,
    ) -> Result<ExecutorConfig, SdkError>;

    async fn get_uln_config(
        &self,
        oapp: &Address,
        library: &Address,
        eid: EndpointId,
    ) -> Result<UlnConfig, SdkError>;

    /// Build one transaction applying every entry of `params` on `library`.
    async fn set_config(
        &self,
        oapp: &Address,
        library: &Address,
        params: &[SetConfigParam],
    ) -> Result<OmniTransaction, SdkError>;
}

/// Enforced options for one message type towards one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnforcedOptionParam {
    pub eid: EndpointId,
    pub msg_type: u16,
    pub options: Vec<u8>,
}

/// An OApp contract at one point.
#[async_trait]
pub trait OAppSdk: Send + Sync {
    fn point(&self) -> &OmniPoint;

    /// The endpoint this OApp is wired to.
    async fn get_endpoint_sdk(&self) -> Result<Arc<dyn EndpointSdk>, SdkError>;

    /// Peer registered for `eid`, `None` if not set.
    async fn get_peer(&self, eid: EndpointId) -> Result<Option<Address>, SdkError>;

    async fn set_peer(&self, eid: EndpointId, peer: &Address) -> Result<OmniTransaction, SdkError>;

    async fn get_delegate(&self) -> Result<Option<Address>, SdkError>;

    async fn set_delegate(&self, delegate: &Address) -> Result<OmniTransaction, SdkError>;

    /// Encoded options enforced for `msg_type` towards `eid`. Empty if unset.
    async fn get_enforced_options(
        &self,
        eid: EndpointId,
        msg_type: u16,
    ) -> Result<Vec<u8>, SdkError>;

    async fn set_enforced_options(
        &self,
        params: &[EnforcedOptionParam],
    ) -> Result<OmniTransaction, SdkError>;
}

/// An OApp that also reads state through read channels.
#[async_trait]
pub trait OAppReadSdk: OAppSdk {
    async fn is_read_channel_active(&self, channel: EndpointId) -> Result<bool, SdkError>;

    async fn set_read_channel(
        &self,
        channel: EndpointId,
        active: bool,
    ) -> Result<OmniTransaction, SdkError>;
}

pub type EndpointSdkFactory = dyn OmniFactory<dyn EndpointSdk>;
pub type OAppSdkFactory = dyn OmniFactory<dyn OAppSdk>;
pub type OAppReadSdkFactory = dyn OmniFactory<dyn OAppReadSdk>;

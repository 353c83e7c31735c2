//! Messaging protocol configurators for omnigraph.
//!
//! # Architecture
//!
//! - [`sdk`]: the traits chain adapters implement for endpoint and OApp
//!   contracts. The configurators only ever talk to these.
//! - [`config`]: node and edge payloads an operator declares.
//! - [`endpoint`], [`oapp`], [`read`]: configurators diffing declared payloads
//!   against live state, one per facet, each composable through
//!   [`omnigraph_core::CompositeConfigurator`].
//!
//! Values read from chain and values declared by the operator are brought
//! into one canonical form before comparison (padded peers, sorted verifier
//! lists, encoded executor options), so equal settings never produce a
//! transaction.

pub mod config;
pub mod endpoint;
pub mod oapp;
pub mod options;
pub mod read;
mod reconcile;
pub mod sdk;

pub use config::{
    EndpointEdgeConfig, EndpointNodeConfig, EndpointOmniGraph, EnforcedOption, ExecutorConfig,
    ExecutorOptionType, OAppEdgeConfig, OAppNodeConfig, OAppOmniGraph, OAppReadNodeConfig,
    OAppReadOmniGraph, ReadChannelConfig, ReceiveConfig, ReceiveLibraryConfig, SendConfig,
    UlnConfig,
};
pub use endpoint::{
    configure_default_receive_libraries, configure_default_send_libraries, configure_endpoint,
    configure_register_libraries, DefaultReceiveLibraries, DefaultSendLibraries,
    RegisterLibraries,
};
pub use oapp::{
    configure_enforced_options, configure_oapp, configure_oapp_delegates, configure_oapp_peers,
    configure_receive_config, configure_receive_libraries, configure_send_config,
    configure_send_libraries, OAppDelegates, OAppEnforcedOptions, OAppPeers, ReceiveConfigs,
    ReceiveLibraries, SendConfigs, SendLibraries,
};
pub use options::{decode_options, encode_enforced_options, ExecutorOptions, OptionsError};
pub use read::{configure_oapp_read, configure_read_channels, ReadChannels};
pub use sdk::{
    EndpointSdk, EndpointSdkFactory, EnforcedOptionParam, OAppReadSdk, OAppReadSdkFactory,
    OAppSdk, OAppSdkFactory, ReceiveLibrary, SetConfigParam,
};

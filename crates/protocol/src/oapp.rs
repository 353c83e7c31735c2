//! OApp configurators.
//!
//! Each configurator handles one facet of an OApp deployment. Node facets
//! (the delegate) come from [`OAppNodeConfig`]; pathway facets come from the
//! [`OAppEdgeConfig`] of the edge `from -> to` and are applied at `from`.
//!
//! [`configure_oapp`] runs them in this order:
//!
//! 1. delegates
//! 2. peers
//! 3. send libraries
//! 4. receive libraries
//! 5. send configs
//! 6. receive configs
//! 7. enforced options

use crate::options::encode_enforced_options;
use crate::reconcile::{for_each_edge, for_each_node, reconcile};
use crate::{
    EndpointSdk, EnforcedOption, EnforcedOptionParam, ExecutorConfig, OAppEdgeConfig,
    OAppNodeConfig, OAppSdk, SetConfigParam, UlnConfig,
};
use async_trait::async_trait;
use omnigraph_core::{
    create_property, factory_fn, CompositeConfigurator, ConfigureError, Configurator,
    ExecutionMode, FactoryError, MemoizedFactory, OmniFactory, SdkError, SdkResultExt,
};
use omnigraph_types::{Address, EndpointId, OmniGraph, OmniPoint, OmniTransaction, OmniVector};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A peer address compared in its 32-byte padded form.
#[derive(Debug, Clone)]
struct Peer(Address);

impl PartialEq for Peer {
    fn eq(&self, other: &Self) -> bool {
        self.0.same_as_bytes32(&other.0)
    }
}

/// Set the delegate of every OApp declaring one.
pub async fn configure_oapp_delegates<N, S>(
    graph: &OmniGraph<N, OAppEdgeConfig>,
    factory: &dyn OmniFactory<S>,
    mode: ExecutionMode,
) -> Result<Vec<OmniTransaction>, ConfigureError>
where
    N: AsRef<OAppNodeConfig>,
    S: OAppSdk + ?Sized + 'static,
{
    for_each_node(graph, mode, |point, config| async move {
        let Some(delegate) = &config.as_ref().delegate else {
            return Ok(None);
        };
        let sdk = factory.create(point).await?;

        reconcile(
            point,
            "delegate",
            sdk,
            |sdk: Arc<S>| async move {
                let current = sdk.get_delegate().await.or_default_on_unset()?;
                Ok::<_, SdkError>(current.unwrap_or_else(Address::zero))
            },
            delegate.clone(),
            |sdk: Arc<S>, delegate: Address| async move { sdk.set_delegate(&delegate).await },
        )
        .await
    })
    .await
}

/// Point every OApp at the OApp on the other end of each of its edges.
pub async fn configure_oapp_peers<N, S>(
    graph: &OmniGraph<N, OAppEdgeConfig>,
    factory: &dyn OmniFactory<S>,
    mode: ExecutionMode,
) -> Result<Vec<OmniTransaction>, ConfigureError>
where
    S: OAppSdk + ?Sized + 'static,
{
    let factory = &MemoizedFactory::<_, S>::new(factory);
    for_each_edge(graph, mode, |vector, _| async move {
        let sdk = factory.create(&vector.from).await?;
        let eid = vector.to.eid;

        reconcile(
            &vector.from,
            "peer",
            sdk,
            move |sdk: Arc<S>| async move {
                let current = sdk.get_peer(eid).await.or_default_on_unset()?;
                Ok::<_, SdkError>(Peer(current.unwrap_or_else(Address::zero)))
            },
            Peer(vector.to.address.clone()),
            move |sdk: Arc<S>, peer: Peer| async move { sdk.set_peer(eid, &peer.0).await },
        )
        .await
    })
    .await
}

/// Endpoint handle together with the OApp and remote endpoint it is queried for.
#[derive(Clone)]
struct Pathway {
    endpoint: Arc<dyn EndpointSdk>,
    oapp: Address,
    eid: EndpointId,
}

impl Pathway {
    async fn resolve(
        endpoints: &dyn OmniFactory<dyn EndpointSdk>,
        vector: &OmniVector,
    ) -> Result<Self, ConfigureError> {
        let endpoint = endpoints.create(&vector.from).await?;
        Ok(Self {
            endpoint,
            oapp: vector.from.address.clone(),
            eid: vector.to.eid,
        })
    }
}

/// Endpoint handles keyed by OApp point, each resolved once through the
/// OApp's own handle.
fn endpoint_handles<'f, S>(
    oapps: &'f dyn OmniFactory<S>,
) -> impl OmniFactory<dyn EndpointSdk> + 'f
where
    S: OAppSdk + ?Sized + 'static,
{
    MemoizedFactory::<_, dyn EndpointSdk>::new(factory_fn(move |point: OmniPoint| async move {
        let oapp = oapps.create(&point).await?;
        oapp.get_endpoint_sdk().await.map_err(|error| match error {
            SdkError::Factory(error) => error,
            other => FactoryError::Creation {
                point,
                reason: other.to_string(),
            },
        })
    }))
}

/// Pin the send library of each pathway that declares one.
///
/// An OApp falling back to the endpoint default is treated as misconfigured
/// even when the default equals the declared library.
pub async fn configure_send_libraries<N, S>(
    graph: &OmniGraph<N, OAppEdgeConfig>,
    factory: &dyn OmniFactory<S>,
    mode: ExecutionMode,
) -> Result<Vec<OmniTransaction>, ConfigureError>
where
    S: OAppSdk + ?Sized + 'static,
{
    let endpoints = &endpoint_handles(factory);
    for_each_edge(graph, mode, |vector, config| async move {
        let Some(library) = &config.send_library else {
            return Ok(None);
        };
        let pathway = Pathway::resolve(endpoints, vector).await?;

        reconcile(
            &vector.from,
            "send library",
            pathway,
            |pathway: Pathway| async move {
                let Pathway { endpoint, oapp, eid } = pathway;
                if endpoint
                    .is_default_send_library(&oapp, eid)
                    .await
                    .or_default_on_unset()?
                {
                    return Ok::<_, SdkError>(Address::zero());
                }
                let current = endpoint.get_send_library(&oapp, eid).await.or_default_on_unset()?;
                Ok(current.unwrap_or_else(Address::zero))
            },
            library.clone(),
            |pathway: Pathway, library: Address| async move {
                pathway
                    .endpoint
                    .set_send_library(&pathway.oapp, pathway.eid, &library)
                    .await
            },
        )
        .await
    })
    .await
}

/// Pin the receive library of each pathway that declares one.
pub async fn configure_receive_libraries<N, S>(
    graph: &OmniGraph<N, OAppEdgeConfig>,
    factory: &dyn OmniFactory<S>,
    mode: ExecutionMode,
) -> Result<Vec<OmniTransaction>, ConfigureError>
where
    S: OAppSdk + ?Sized + 'static,
{
    let endpoints = &endpoint_handles(factory);
    for_each_edge(graph, mode, |vector, config| async move {
        let Some(declared) = &config.receive_library_config else {
            return Ok(None);
        };
        let pathway = Pathway::resolve(endpoints, vector).await?;
        let grace_period = declared.grace_period;

        reconcile(
            &vector.from,
            "receive library",
            pathway,
            |pathway: Pathway| async move {
                let current = pathway
                    .endpoint
                    .get_receive_library(&pathway.oapp, pathway.eid)
                    .await
                    .or_default_on_unset()?;
                Ok::<_, SdkError>(match current {
                    Some(current) if !current.is_default => current.library,
                    _ => Address::zero(),
                })
            },
            declared.receive_library.clone(),
            move |pathway: Pathway, library: Address| async move {
                pathway
                    .endpoint
                    .set_receive_library(&pathway.oapp, pathway.eid, &library, grace_period)
                    .await
            },
        )
        .await
    })
    .await
}

/// Executor and ULN config entries of `library` that differ from `executor`
/// and `uln`.
async fn library_config_params(
    pathway: &Pathway,
    library: &Address,
    executor: Option<&ExecutorConfig>,
    uln: Option<&UlnConfig>,
) -> Result<Vec<SetConfigParam>, SdkError> {
    let context = (pathway.clone(), library.clone());
    let mut params = Vec::new();

    if let Some(executor) = executor {
        let state = create_property(
            |(pathway, library): (Pathway, Address)| async move {
                let current = pathway
                    .endpoint
                    .get_executor_config(&pathway.oapp, &library, pathway.eid)
                    .await
                    .or_default_on_unset()?;
                Ok::<_, SdkError>(current.normalized())
            },
            |_: (Pathway, Address)| futures::future::ok::<_, SdkError>(executor.normalized()),
            |(pathway, _): (Pathway, Address), config: ExecutorConfig| SetConfigParam::Executor {
                eid: pathway.eid,
                config,
            },
        )
        .evaluate(context.clone())
        .await?;
        params.extend(state.configure());
    }

    if let Some(uln) = uln {
        let state = create_property(
            |(pathway, library): (Pathway, Address)| async move {
                let current = pathway
                    .endpoint
                    .get_uln_config(&pathway.oapp, &library, pathway.eid)
                    .await
                    .or_default_on_unset()?;
                Ok::<_, SdkError>(current.normalized())
            },
            |_: (Pathway, Address)| futures::future::ok::<_, SdkError>(uln.normalized()),
            |(pathway, _): (Pathway, Address), config: UlnConfig| SetConfigParam::Uln {
                eid: pathway.eid,
                config,
            },
        )
        .evaluate(context)
        .await?;
        params.extend(state.configure());
    }

    Ok(params)
}

/// Build one `setConfig` transaction for the entries that differ, if any.
async fn configure_library(
    point: &OmniPoint,
    pathway: &Pathway,
    library: &Address,
    executor: Option<&ExecutorConfig>,
    uln: Option<&UlnConfig>,
) -> Result<Option<OmniTransaction>, ConfigureError> {
    let params = library_config_params(pathway, library, executor, uln)
        .await
        .at_point(point)?;
    if params.is_empty() {
        return Ok(None);
    }
    let transaction = pathway
        .endpoint
        .set_config(&pathway.oapp, library, &params)
        .await
        .at_point(point)?;
    Ok(Some(transaction))
}

/// Apply declared executor and send ULN configs on the pathway's send library.
///
/// The library is the declared send library, or the one currently in use.
pub async fn configure_send_config<N, S>(
    graph: &OmniGraph<N, OAppEdgeConfig>,
    factory: &dyn OmniFactory<S>,
    mode: ExecutionMode,
) -> Result<Vec<OmniTransaction>, ConfigureError>
where
    S: OAppSdk + ?Sized + 'static,
{
    let endpoints = &endpoint_handles(factory);
    for_each_edge(graph, mode, |vector, config| async move {
        let Some(send_config) = &config.send_config else {
            return Ok(None);
        };
        let pathway = Pathway::resolve(endpoints, vector).await?;
        let library = match &config.send_library {
            Some(library) => library.clone(),
            None => pathway
                .endpoint
                .get_send_library(&pathway.oapp, pathway.eid)
                .await
                .or_default_on_unset()
                .at_point(&vector.from)?
                .ok_or_else(|| ConfigureError::Invalid {
                    point: vector.from.clone(),
                    reason: format!("no send library in use towards {}", vector.to.eid),
                })?,
        };

        configure_library(
            &vector.from,
            &pathway,
            &library,
            send_config.executor_config.as_ref(),
            send_config.uln_config.as_ref(),
        )
        .await
    })
    .await
}

/// Apply declared receive ULN configs on the pathway's receive library.
///
/// The library is the declared receive library, or the one currently in use.
pub async fn configure_receive_config<N, S>(
    graph: &OmniGraph<N, OAppEdgeConfig>,
    factory: &dyn OmniFactory<S>,
    mode: ExecutionMode,
) -> Result<Vec<OmniTransaction>, ConfigureError>
where
    S: OAppSdk + ?Sized + 'static,
{
    let endpoints = &endpoint_handles(factory);
    for_each_edge(graph, mode, |vector, config| async move {
        let Some(receive_config) = &config.receive_config else {
            return Ok(None);
        };
        let pathway = Pathway::resolve(endpoints, vector).await?;
        let library = match &config.receive_library_config {
            Some(declared) => declared.receive_library.clone(),
            None => pathway
                .endpoint
                .get_receive_library(&pathway.oapp, pathway.eid)
                .await
                .or_default_on_unset()
                .at_point(&vector.from)?
                .map(|current| current.library)
                .ok_or_else(|| ConfigureError::Invalid {
                    point: vector.from.clone(),
                    reason: format!("no receive library in use for {}", vector.to.eid),
                })?,
        };

        configure_library(
            &vector.from,
            &pathway,
            &library,
            None,
            receive_config.uln_config.as_ref(),
        )
        .await
    })
    .await
}

/// Enforce declared executor options, one transaction per pathway covering
/// every message type whose options differ.
pub async fn configure_enforced_options<N, S>(
    graph: &OmniGraph<N, OAppEdgeConfig>,
    factory: &dyn OmniFactory<S>,
    mode: ExecutionMode,
) -> Result<Vec<OmniTransaction>, ConfigureError>
where
    S: OAppSdk + ?Sized + 'static,
{
    let factory = &MemoizedFactory::<_, S>::new(factory);
    for_each_edge(graph, mode, |vector, config| async move {
        let Some(declared) = &config.enforced_options else {
            return Ok(None);
        };
        if declared.is_empty() {
            return Ok(None);
        }

        let mut by_msg_type: BTreeMap<u16, Vec<&EnforcedOption>> = BTreeMap::new();
        for option in declared {
            by_msg_type.entry(option.msg_type).or_default().push(option);
        }

        let sdk = factory.create(&vector.from).await?;
        let eid = vector.to.eid;
        let mut params = Vec::new();
        for (msg_type, options) in by_msg_type {
            let desired =
                encode_enforced_options(options).map_err(|error| ConfigureError::Invalid {
                    point: vector.from.clone(),
                    reason: error.to_string(),
                })?;
            let state = create_property(
                move |sdk: Arc<S>| async move {
                    sdk.get_enforced_options(eid, msg_type)
                        .await
                        .or_default_on_unset()
                },
                |_: Arc<S>| futures::future::ok::<_, SdkError>(desired.clone()),
                move |_: Arc<S>, options: Vec<u8>| EnforcedOptionParam {
                    eid,
                    msg_type,
                    options,
                },
            )
            .evaluate(sdk.clone())
            .await
            .at_point(&vector.from)?;
            params.extend(state.configure());
        }

        if params.is_empty() {
            return Ok(None);
        }
        let transaction = sdk
            .set_enforced_options(&params)
            .await
            .at_point(&vector.from)?;
        Ok::<_, ConfigureError>(Some(transaction))
    })
    .await
}

macro_rules! oapp_configurator {
    ($(#[$doc:meta])* $name:ident, $label:literal, $function:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        #[async_trait]
        impl<N, S> Configurator<OmniGraph<N, OAppEdgeConfig>, S> for $name
        where
            N: AsRef<OAppNodeConfig> + Send + Sync + 'static,
            S: OAppSdk + ?Sized + 'static,
        {
            fn name(&self) -> &'static str {
                $label
            }

            async fn configure(
                &self,
                graph: &OmniGraph<N, OAppEdgeConfig>,
                factory: &dyn OmniFactory<S>,
                mode: ExecutionMode,
            ) -> Result<Vec<OmniTransaction>, ConfigureError> {
                $function(graph, factory, mode).await
            }
        }
    };
}

oapp_configurator!(
    /// See [`configure_oapp_delegates`].
    OAppDelegates,
    "oapp-delegates",
    configure_oapp_delegates
);
oapp_configurator!(
    /// See [`configure_oapp_peers`].
    OAppPeers,
    "oapp-peers",
    configure_oapp_peers
);
oapp_configurator!(
    /// See [`configure_send_libraries`].
    SendLibraries,
    "send-libraries",
    configure_send_libraries
);
oapp_configurator!(
    /// See [`configure_receive_libraries`].
    ReceiveLibraries,
    "receive-libraries",
    configure_receive_libraries
);
oapp_configurator!(
    /// See [`configure_send_config`].
    SendConfigs,
    "send-config",
    configure_send_config
);
oapp_configurator!(
    /// See [`configure_receive_config`].
    ReceiveConfigs,
    "receive-config",
    configure_receive_config
);
oapp_configurator!(
    /// See [`configure_enforced_options`].
    OAppEnforcedOptions,
    "enforced-options",
    configure_enforced_options
);

/// Every OApp facet, in the order documented on this module.
pub fn configure_oapp<N, S>() -> CompositeConfigurator<OmniGraph<N, OAppEdgeConfig>, S>
where
    N: AsRef<OAppNodeConfig> + Send + Sync + 'static,
    S: OAppSdk + ?Sized + 'static,
{
    CompositeConfigurator::new("oapp")
        .then(OAppDelegates)
        .then(OAppPeers)
        .then(SendLibraries)
        .then(ReceiveLibraries)
        .then(SendConfigs)
        .then(ReceiveConfigs)
        .then(OAppEnforcedOptions)
}

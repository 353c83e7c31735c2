//! Endpoint configurators.
//!
//! Libraries must be registered on an endpoint before they can become a
//! default, so [`configure_endpoint`] runs registration first, then the
//! default receive libraries, then the default send libraries.

use crate::reconcile::{for_each_edge, reconcile};
use crate::{EndpointEdgeConfig, EndpointSdk};
use async_trait::async_trait;
use omnigraph_core::{
    run_all, CompositeConfigurator, Configurator, ConfigureError, ExecutionMode, MemoizedFactory,
    OmniFactory, SdkError, SdkResultExt,
};
use omnigraph_types::{flatten_transactions, Address, OmniGraph, OmniTransaction, PointMap};
use std::sync::Arc;
use tracing::debug;

/// Register every library referenced by an endpoint's edges that is not yet
/// registered there.
///
/// Libraries are registered in the order they are first referenced, send
/// library before receive library within an edge.
pub async fn configure_register_libraries<N, S>(
    graph: &OmniGraph<N, EndpointEdgeConfig>,
    factory: &dyn OmniFactory<S>,
    mode: ExecutionMode,
) -> Result<Vec<OmniTransaction>, ConfigureError>
where
    S: EndpointSdk + ?Sized + 'static,
{
    let mut libraries: PointMap<Vec<&Address>> = PointMap::new();
    for edge in &graph.edges {
        let Some(config) = &edge.config else { continue };
        let referenced = libraries.get_or_insert_with(&edge.vector.from, Vec::new);
        for library in config.libraries() {
            if !referenced.contains(&library) {
                referenced.push(library);
            }
        }
    }

    let tasks = libraries
        .iter()
        .map(|(point, libraries)| async move {
            let sdk = factory.create(point).await?;
            let mut transactions = Vec::new();
            for library in libraries {
                let registration = reconcile(
                    point,
                    "registered library",
                    (sdk.clone(), (*library).clone()),
                    |(sdk, library): (Arc<S>, Address)| async move {
                        sdk.is_registered_library(&library)
                            .await
                            .or_default_on_unset()
                    },
                    true,
                    |(sdk, library): (Arc<S>, Address), _| async move {
                        sdk.register_library(&library).await
                    },
                )
                .await?;
                transactions.extend(registration);
            }
            Ok::<_, ConfigureError>(transactions)
        })
        .collect::<Vec<_>>();

    let transactions = flatten_transactions(run_all(mode, tasks).await?);
    debug!(count = transactions.len(), "Library registrations computed");
    Ok(transactions)
}

/// Set the default receive library of the source endpoint for messages from
/// the destination endpoint.
pub async fn configure_default_receive_libraries<N, S>(
    graph: &OmniGraph<N, EndpointEdgeConfig>,
    factory: &dyn OmniFactory<S>,
    mode: ExecutionMode,
) -> Result<Vec<OmniTransaction>, ConfigureError>
where
    S: EndpointSdk + ?Sized + 'static,
{
    let factory = &MemoizedFactory::<_, S>::new(factory);
    for_each_edge(graph, mode, |vector, config| async move {
        let Some(library) = &config.default_receive_library else {
            return Ok(None);
        };
        let sdk = factory.create(&vector.from).await?;
        let eid = vector.to.eid;
        let grace_period = config.default_receive_library_grace_period.unwrap_or(0);

        reconcile(
            &vector.from,
            "default receive library",
            sdk,
            move |sdk: Arc<S>| async move {
                let current = sdk
                    .get_default_receive_library(eid)
                    .await
                    .or_default_on_unset()?;
                Ok::<_, SdkError>(current.unwrap_or_else(Address::zero))
            },
            library.clone(),
            move |sdk: Arc<S>, library: Address| async move {
                sdk.set_default_receive_library(eid, &library, grace_period)
                    .await
            },
        )
        .await
    })
    .await
}

/// Set the default send library of the source endpoint towards the
/// destination endpoint.
pub async fn configure_default_send_libraries<N, S>(
    graph: &OmniGraph<N, EndpointEdgeConfig>,
    factory: &dyn OmniFactory<S>,
    mode: ExecutionMode,
) -> Result<Vec<OmniTransaction>, ConfigureError>
where
    S: EndpointSdk + ?Sized + 'static,
{
    let factory = &MemoizedFactory::<_, S>::new(factory);
    for_each_edge(graph, mode, |vector, config| async move {
        let Some(library) = &config.default_send_library else {
            return Ok(None);
        };
        let sdk = factory.create(&vector.from).await?;
        let eid = vector.to.eid;

        reconcile(
            &vector.from,
            "default send library",
            sdk,
            move |sdk: Arc<S>| async move {
                let current = sdk
                    .get_default_send_library(eid)
                    .await
                    .or_default_on_unset()?;
                Ok::<_, SdkError>(current.unwrap_or_else(Address::zero))
            },
            library.clone(),
            move |sdk: Arc<S>, library: Address| async move {
                sdk.set_default_send_library(eid, &library).await
            },
        )
        .await
    })
    .await
}

macro_rules! endpoint_configurator {
    ($(#[$doc:meta])* $name:ident, $label:literal, $function:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        #[async_trait]
        impl<N, S> Configurator<OmniGraph<N, EndpointEdgeConfig>, S> for $name
        where
            N: Send + Sync + 'static,
            S: EndpointSdk + ?Sized + 'static,
        {
            fn name(&self) -> &'static str {
                $label
            }

            async fn configure(
                &self,
                graph: &OmniGraph<N, EndpointEdgeConfig>,
                factory: &dyn OmniFactory<S>,
                mode: ExecutionMode,
            ) -> Result<Vec<OmniTransaction>, ConfigureError> {
                $function(graph, factory, mode).await
            }
        }
    };
}

endpoint_configurator!(
    /// See [`configure_register_libraries`].
    RegisterLibraries,
    "register-libraries",
    configure_register_libraries
);
endpoint_configurator!(
    /// See [`configure_default_receive_libraries`].
    DefaultReceiveLibraries,
    "default-receive-libraries",
    configure_default_receive_libraries
);
endpoint_configurator!(
    /// See [`configure_default_send_libraries`].
    DefaultSendLibraries,
    "default-send-libraries",
    configure_default_send_libraries
);

/// Everything an endpoint needs, in dependency order.
pub fn configure_endpoint<N, S>() -> CompositeConfigurator<OmniGraph<N, EndpointEdgeConfig>, S>
where
    N: Send + Sync + 'static,
    S: EndpointSdk + ?Sized + 'static,
{
    CompositeConfigurator::new("endpoint")
        .then(RegisterLibraries)
        .then(DefaultReceiveLibraries)
        .then(DefaultSendLibraries)
}

//! OApp read configurators.

use crate::oapp::configure_oapp;
use crate::reconcile::{for_each_node, reconcile};
use crate::{OAppEdgeConfig, OAppReadNodeConfig, OAppReadSdk, ReadChannelConfig};
use async_trait::async_trait;
use omnigraph_core::{
    CompositeConfigurator, ConfigureError, Configurator, ExecutionMode, OmniFactory,
    SdkResultExt,
};
use omnigraph_types::{EndpointId, OmniGraph, OmniTransaction};
use std::sync::Arc;

/// Activate or deactivate the declared read channels of every node.
///
/// Channels are handled in declaration order within a node.
pub async fn configure_read_channels<S>(
    graph: &OmniGraph<OAppReadNodeConfig, OAppEdgeConfig>,
    factory: &dyn OmniFactory<S>,
    mode: ExecutionMode,
) -> Result<Vec<OmniTransaction>, ConfigureError>
where
    S: OAppReadSdk + ?Sized + 'static,
{
    for_each_node(graph, mode, |point, config| async move {
        let channels: &[ReadChannelConfig] = match &config.read_channel_configs {
            Some(channels) if !channels.is_empty() => channels,
            _ => return Ok(Vec::new()),
        };
        let sdk = factory.create(point).await?;

        let mut transactions = Vec::new();
        for channel in channels {
            let transaction = reconcile(
                point,
                "read channel",
                (sdk.clone(), channel.channel()),
                |(sdk, channel): (Arc<S>, EndpointId)| async move {
                    sdk.is_read_channel_active(channel)
                        .await
                        .or_default_on_unset()
                },
                channel.is_active(),
                |(sdk, channel): (Arc<S>, EndpointId), active: bool| async move {
                    sdk.set_read_channel(channel, active).await
                },
            )
            .await?;
            transactions.extend(transaction);
        }
        Ok::<_, ConfigureError>(transactions)
    })
    .await
}

/// See [`configure_read_channels`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadChannels;

#[async_trait]
impl<S> Configurator<OmniGraph<OAppReadNodeConfig, OAppEdgeConfig>, S> for ReadChannels
where
    S: OAppReadSdk + ?Sized + 'static,
{
    fn name(&self) -> &'static str {
        "read-channels"
    }

    async fn configure(
        &self,
        graph: &OmniGraph<OAppReadNodeConfig, OAppEdgeConfig>,
        factory: &dyn OmniFactory<S>,
        mode: ExecutionMode,
    ) -> Result<Vec<OmniTransaction>, ConfigureError> {
        configure_read_channels(graph, factory, mode).await
    }
}

/// Every OApp facet followed by the read channels.
pub fn configure_oapp_read<S>(
) -> CompositeConfigurator<OmniGraph<OAppReadNodeConfig, OAppEdgeConfig>, S>
where
    S: OAppReadSdk + ?Sized + 'static,
{
    CompositeConfigurator::new("oapp-read")
        .then(configure_oapp())
        .then(ReadChannels)
}

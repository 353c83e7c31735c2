//! Fan-out and single-facet reconciliation shared by the configurators.

use omnigraph_core::{
    create_property, run_all, ConfigureError, ExecutionMode, SdkError, SdkResultExt,
};
use omnigraph_types::{
    flatten_transactions, OmniGraph, OmniPoint, OmniTransaction, OmniVector, TransactionSet,
};
use std::fmt;
use std::future::Future;
use tracing::{debug, trace};

/// Compare one facet at `point` and build its transaction if it differs.
///
/// `get` reads the current value for `context`; `set` builds the transaction
/// moving it to `desired`. Both values must already be in canonical form.
pub(crate) async fn reconcile<C, V, G, GFut, S, SFut>(
    point: &OmniPoint,
    facet: &'static str,
    context: C,
    get: G,
    desired: V,
    set: S,
) -> Result<Option<OmniTransaction>, ConfigureError>
where
    C: Clone + Send + 'static,
    V: PartialEq + Clone + fmt::Debug + Send + Sync + 'static,
    G: Fn(C) -> GFut + Send + Sync,
    GFut: Future<Output = Result<V, SdkError>> + Send,
    S: Fn(C, V) -> SFut + Send + Sync + 'static,
    SFut: Future<Output = Result<OmniTransaction, SdkError>> + Send + 'static,
{
    let property = create_property(
        get,
        move |_: C| futures::future::ok::<V, SdkError>(desired.clone()),
        set,
    );
    let state = property.evaluate(context).await.at_point(point)?;

    if state.is_configured() {
        trace!(%point, facet, value = ?state.value(), "Facet configured");
        return Ok(None);
    }

    debug!(
        %point,
        facet,
        current = ?state.value(),
        desired = ?state.desired_value(),
        "Facet misconfigured"
    );
    match state.configure() {
        Some(transaction) => Ok(Some(transaction.await.at_point(point)?)),
        None => Ok(None),
    }
}

/// Run `configure` for every edge that carries a config, flattening the
/// results in edge order.
pub(crate) async fn for_each_edge<'g, N, E, Fut, T>(
    graph: &'g OmniGraph<N, E>,
    mode: ExecutionMode,
    configure: impl Fn(&'g OmniVector, &'g E) -> Fut,
) -> Result<Vec<OmniTransaction>, ConfigureError>
where
    Fut: Future<Output = Result<T, ConfigureError>>,
    T: Into<TransactionSet>,
{
    let tasks: Vec<Fut> = graph
        .edges
        .iter()
        .filter_map(|edge| {
            edge.config
                .as_ref()
                .map(|config| configure(&edge.vector, config))
        })
        .collect();
    Ok(flatten_transactions(run_all(mode, tasks).await?))
}

/// Run `configure` for every node that carries a config, flattening the
/// results in node order.
pub(crate) async fn for_each_node<'g, N, E, Fut, T>(
    graph: &'g OmniGraph<N, E>,
    mode: ExecutionMode,
    configure: impl Fn(&'g OmniPoint, &'g N) -> Fut,
) -> Result<Vec<OmniTransaction>, ConfigureError>
where
    Fut: Future<Output = Result<T, ConfigureError>>,
    T: Into<TransactionSet>,
{
    let tasks: Vec<Fut> = graph
        .nodes
        .iter()
        .filter_map(|node| {
            node.config
                .as_ref()
                .map(|config| configure(&node.point, config))
        })
        .collect();
    Ok(flatten_transactions(run_all(mode, tasks).await?))
}

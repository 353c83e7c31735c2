mod common;

use common::{Deployment, RECEIVE_LIBRARY, SEND_LIBRARY};
use omnigraph_core::{Configurator, ExecutionMode};
use omnigraph_protocol::{
    configure_default_send_libraries, configure_endpoint, configure_register_libraries,
    EndpointNodeConfig, EndpointSdk,
};
use omnigraph_simulation::SimulatedCall;
use omnigraph_types::Address;

#[tokio::test]
async fn test_registration_precedes_defaults() {
    let deployment = Deployment::new();
    let graph = deployment.endpoint_graph();

    let transactions = configure_endpoint::<EndpointNodeConfig, dyn EndpointSdk>()
        .configure(&graph, &deployment.network, ExecutionMode::Parallel)
        .await
        .unwrap();

    let at_first: Vec<_> = transactions
        .iter()
        .filter(|tx| tx.point == deployment.endpoints[0])
        .map(|tx| SimulatedCall::decode(tx).unwrap())
        .collect();
    assert_eq!(
        at_first,
        vec![
            SimulatedCall::RegisterLibrary {
                library: Address::new(SEND_LIBRARY)
            },
            SimulatedCall::RegisterLibrary {
                library: Address::new(RECEIVE_LIBRARY)
            },
            SimulatedCall::SetDefaultReceiveLibrary {
                eid: deployment.endpoints[1].eid,
                library: Address::new(RECEIVE_LIBRARY),
                grace_period: 0,
            },
            SimulatedCall::SetDefaultSendLibrary {
                eid: deployment.endpoints[1].eid,
                library: Address::new(SEND_LIBRARY),
            },
        ]
    );
    assert_eq!(transactions.len(), 8);

    let result = deployment.execute(&transactions).await;
    assert!(result.is_complete());
    assert_eq!(deployment.network.block_number(), 8);
}

#[tokio::test]
async fn test_wired_endpoints_need_nothing() {
    let deployment = Deployment::new();
    deployment.wire_endpoints().await;

    let transactions = configure_endpoint::<EndpointNodeConfig, dyn EndpointSdk>()
        .configure(
            &deployment.endpoint_graph(),
            &deployment.network,
            ExecutionMode::Sequential,
        )
        .await
        .unwrap();

    assert!(transactions.is_empty());
}

#[tokio::test]
async fn test_default_before_registration_reverts() {
    let deployment = Deployment::new();
    let graph = deployment.endpoint_graph();

    let defaults = configure_default_send_libraries::<EndpointNodeConfig, dyn EndpointSdk>(
        &graph,
        &deployment.network,
        ExecutionMode::Parallel,
    )
    .await
    .unwrap();
    let result = deployment.execute(&defaults).await;

    assert_eq!(result.failed.len(), 2);
    assert!(result.failed[0].error.to_string().contains("not registered"));

    let registrations = configure_register_libraries::<EndpointNodeConfig, dyn EndpointSdk>(
        &graph,
        &deployment.network,
        ExecutionMode::Parallel,
    )
    .await
    .unwrap();
    assert!(deployment.execute(&registrations).await.is_complete());
    assert!(deployment.execute(&result.pending).await.is_complete());
}

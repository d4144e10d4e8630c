//! End-to-end tests driving the canvas the way a controller does.

use std::time::Duration;

use agent_canvas::bridge::{BridgeConfig, OutboundMessage};
use agent_canvas::core::{AgentDocument, EdgePolicy, Graph};
use canvas_tests::{call, connect, test_config};
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test(start_paused = true)]
async fn build_validate_and_export_an_agent() {
    // === SETUP ===
    let (_source, _handle, mut peer) = connect(&test_config()).await;

    // === BUILD: input -> llm -> output ===
    let (input, _) = call(&mut peer, 1, "create_node", json!({"type": "input"})).await;
    let (llm, _) = call(&mut peer, 2, "create_node", json!({"type": "llm", "label": "Planner"})).await;
    let (output, pushed) = call(&mut peer, 3, "create_node", json!({"type": "output"})).await;

    let graph = pushed.expect("create_node pushes state");
    let xs: Vec<f64> = graph.nodes.iter().map(|n| n.position.x).collect();
    assert_eq!(xs, vec![100.0, 300.0, 500.0]);

    let (input, llm, output) = (
        input["nodeId"].as_str().unwrap().to_string(),
        llm["nodeId"].as_str().unwrap().to_string(),
        output["nodeId"].as_str().unwrap().to_string(),
    );

    let (result, _) = call(&mut peer, 4, "validate_agent", json!({})).await;
    assert_eq!(result["valid"], json!(false));
    assert!(result["message"].as_str().unwrap().contains("Disconnected nodes"));

    call(&mut peer, 5, "connect_nodes", json!({"sourceId": input, "targetId": llm})).await;
    let (_, pushed) = call(&mut peer, 6, "connect_nodes", json!({"sourceId": llm, "targetId": output})).await;
    assert_eq!(pushed.unwrap().edges.len(), 2);

    // === VALIDATE ===
    let (result, pushed) = call(&mut peer, 7, "validate_agent", json!({})).await;
    assert_eq!(result["valid"], json!(true), "{:?}", result["errors"]);
    assert!(pushed.is_none());

    // === EXPORT ===
    let (result, _) = call(&mut peer, 8, "export_agent", json!({"name": "Planner Agent"})).await;
    let document = AgentDocument::parse(result["json"].as_str().unwrap()).unwrap();
    assert_eq!(document.metadata.name, "Planner Agent");
    assert_eq!(document.nodes.len(), 3);
    assert_eq!(document.edges.len(), 2);

    // === DELETE cascades ===
    let (_, pushed) = call(&mut peer, 9, "delete_node", json!({"nodeId": llm})).await;
    let graph = pushed.unwrap();
    assert_eq!(graph.nodes.len(), 2);
    assert!(graph.edges.is_empty());
}

#[tokio::test(start_paused = true)]
async fn templates_replace_the_canvas() {
    let (_source, _handle, mut peer) = connect(&test_config()).await;

    call(&mut peer, 1, "create_node", json!({"type": "function"})).await;

    let (result, pushed) = call(&mut peer, 2, "load_template", json!({"templateId": "multi-agent"})).await;
    assert_eq!(result["success"], json!(true));
    let graph = pushed.unwrap();
    assert_eq!(result["nodeCount"], json!(graph.nodes.len()));
    assert!(graph.nodes.iter().all(|n| n.kind != "function"));

    let (result, _) = call(&mut peer, 3, "validate_agent", json!({})).await;
    assert_eq!(result["valid"], json!(true), "{:?}", result["errors"]);

    let (result, pushed) = call(&mut peer, 4, "clear_canvas", json!({})).await;
    assert_eq!(result["success"], json!(true));
    assert_eq!(pushed, Some(Graph::new()));
}

#[tokio::test(start_paused = true)]
async fn dangling_edges_follow_the_configured_policy() {
    let (_source, _permissive_handle, mut permissive) = connect(&test_config()).await;
    let (result, pushed) = call(
        &mut permissive,
        1,
        "connect_nodes",
        json!({"sourceId": "ghost-a", "targetId": "ghost-b"}),
    )
    .await;
    assert_eq!(result["success"], json!(true));
    assert_eq!(pushed.unwrap().edges.len(), 1);

    let (result, _) = call(&mut permissive, 2, "validate_agent", json!({})).await;
    let errors: Vec<String> = serde_json::from_value(result["errors"].clone()).unwrap();
    assert!(errors.iter().any(|e| e.contains("ghost-a")));

    let reject = BridgeConfig {
        dangling_edges: EdgePolicy::Reject,
        ..test_config()
    };
    let (_source, _strict_handle, mut strict) = connect(&reject).await;
    let (result, pushed) = call(
        &mut strict,
        1,
        "connect_nodes",
        json!({"sourceId": "ghost-a", "targetId": "ghost-b"}),
    )
    .await;
    assert_eq!(result["success"], json!(false));
    assert_eq!(pushed.unwrap().edges.len(), 0);
}

#[tokio::test(start_paused = true)]
async fn controller_outage_resyncs_on_return() {
    let (source, _handle, mut peer) = connect(&test_config()).await;
    call(&mut peer, 1, "create_node", json!({"type": "router"})).await;

    source.refuse_next(2);
    peer.close();

    // Refused after 3s and 6s; accepted after a further 9s.
    let mut peer = tokio::time::timeout(Duration::from_secs(30), source.accept())
        .await
        .expect("bridge reconnects");
    assert_eq!(source.attempts().len(), 4);
    assert_eq!(peer.recv().await, Some(OutboundMessage::FrontendConnect));
    match peer.recv().await {
        Some(OutboundMessage::CanvasState(graph)) => assert_eq!(graph.nodes.len(), 1),
        other => panic!("expected canvas-state, got {:?}", other),
    }
}

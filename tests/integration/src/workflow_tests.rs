//! Multi-step tools driven through a full server session
//!
//! These check call ordering and waiting against the recording client:
//! which provider calls a tool issues, in what order, and what it does when
//! an intermediate operation is still running or has failed.

use std::sync::Arc;

use gce_compute::{ComputeApi, workflow};
use gce_mcp::{GceMcpServer, ToolContext};
use gce_test_utils::{MockCompute, fixtures};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

async fn setup() -> (Arc<MockCompute>, GceMcpServer) {
    let mock = Arc::new(MockCompute::new());
    let ctx = ToolContext::new(mock.clone(), "us-west1-a", "us-west1");
    let mut server = GceMcpServer::new(ctx);
    server.initialize().await.unwrap();
    (mock, server)
}

async fn call(server: &GceMcpServer, tool: &str, arguments: Value) -> Value {
    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": {"name": tool, "arguments": arguments}
    });
    let response = server.handle_message(&request.to_string()).await.unwrap();
    serde_json::from_str(&response).unwrap()
}

fn payload(response: &Value) -> Value {
    assert!(response["result"].get("isError").is_none(), "{}", response);
    serde_json::from_str(response["result"]["content"][0]["text"].as_str().unwrap()).unwrap()
}

// =============================================================================
// Restart
// =============================================================================

#[tokio::test]
async fn restart_stops_then_starts() {
    let (mock, server) = setup().await;

    let result = payload(&call(&server, "restart_instance", json!({"name": "web-1"})).await);

    assert_eq!(mock.methods(), vec!["stop_instance", "start_instance"]);
    assert_eq!(result["stop"]["operationType"], "stop_instance");
    assert_eq!(result["start"]["operationType"], "start_instance");
}

#[tokio::test]
async fn restart_waits_for_pending_stop() {
    let (mock, server) = setup().await;
    mock.respond("stop_instance", fixtures::pending_operation("op-stop", "stop"));
    mock.respond("wait_operation", fixtures::pending_operation("op-stop", "stop"));

    call(&server, "restart_instance", json!({"name": "web-1"})).await;

    assert_eq!(
        mock.methods(),
        vec!["stop_instance", "wait_operation", "wait_operation", "start_instance"]
    );
    assert_eq!(
        mock.calls_to("wait_operation")[0],
        json!({"zone": "us-west1-a", "name": "op-stop"})
    );
}

#[tokio::test]
async fn restart_aborts_when_stop_fails() {
    let (mock, server) = setup().await;
    mock.respond("stop_instance", fixtures::pending_operation("op-stop", "stop"));
    mock.respond(
        "wait_operation",
        fixtures::failed_operation("op-stop", "RESOURCE_NOT_READY", "instance is being repaired"),
    );

    let response = call(&server, "restart_instance", json!({"name": "web-1"})).await;

    assert_eq!(response["result"]["isError"], true);
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("instance is being repaired"), "{}", text);
    assert!(mock.calls_to("start_instance").is_empty());
}

// =============================================================================
// Modify instance
// =============================================================================

#[tokio::test]
async fn machine_type_change_cycles_running_instance() {
    let (mock, server) = setup().await;

    let result = payload(
        &call(
            &server,
            "modify_instance",
            json!({"name": "web-1", "machine_type": "e2-standard-4"}),
        )
        .await,
    );

    assert_eq!(
        mock.methods(),
        vec!["get_instance", "stop_instance", "set_machine_type", "start_instance"]
    );
    assert_eq!(
        mock.calls_to("set_machine_type")[0]["machine_type"],
        "e2-standard-4"
    );
    assert!(result["machine_type"]["stop"].is_object());
    assert!(result["machine_type"]["start"].is_object());
}

#[tokio::test]
async fn machine_type_change_leaves_stopped_instance_stopped() {
    let (mock, server) = setup().await;
    mock.respond(
        "get_instance",
        fixtures::instance_with_status("web-1", "TERMINATED"),
    );

    let result = payload(
        &call(
            &server,
            "modify_instance",
            json!({"name": "web-1", "machine_type": "e2-micro"}),
        )
        .await,
    );

    assert_eq!(mock.methods(), vec!["get_instance", "set_machine_type"]);
    assert!(result["machine_type"].get("stop").is_none());
    assert!(result["machine_type"].get("start").is_none());
}

#[tokio::test]
async fn labels_and_metadata_use_current_fingerprints() {
    let (mock, server) = setup().await;

    payload(
        &call(
            &server,
            "modify_instance",
            json!({
                "name": "web-1",
                "labels": {"env": "prod"},
                "metadata": {"startup-script": "echo hi"}
            }),
        )
        .await,
    );

    assert_eq!(
        mock.methods(),
        vec!["get_instance", "set_instance_labels", "set_instance_metadata"]
    );
    let labels = &mock.calls_to("set_instance_labels")[0];
    assert_eq!(labels["labels"], json!({"env": "prod"}));
    assert_eq!(labels["fingerprint"], "fp-labels");
    let metadata = &mock.calls_to("set_instance_metadata")[0];
    assert_eq!(metadata["items"], json!({"startup-script": "echo hi"}));
    assert_eq!(metadata["fingerprint"], "fp-metadata");
}

// =============================================================================
// Disks
// =============================================================================

#[tokio::test]
async fn add_disk_without_instance_only_creates() {
    let (mock, server) = setup().await;

    let result = payload(
        &call(&server, "add_disk", json!({"name": "data-1", "size_gb": 100})).await,
    );

    assert_eq!(mock.methods(), vec!["insert_disk"]);
    assert_eq!(
        mock.calls_to("insert_disk")[0]["spec"],
        json!({"name": "data-1", "size_gb": 100, "labels": {}})
    );
    assert!(result.get("attach").is_none());
}

#[tokio::test]
async fn add_disk_attaches_after_creation_finishes() {
    let (mock, server) = setup().await;
    mock.respond("insert_disk", fixtures::pending_operation("op-disk", "insert"));

    let result = payload(
        &call(
            &server,
            "add_disk",
            json!({"name": "data-1", "size_gb": 50, "instance": "web-1", "auto_delete": true}),
        )
        .await,
    );

    assert_eq!(
        mock.methods(),
        vec!["insert_disk", "wait_operation", "attach_disk"]
    );
    let attach = &mock.calls_to("attach_disk")[0];
    assert_eq!(attach["instance"], "web-1");
    assert_eq!(attach["spec"], json!({"source": "data-1", "auto_delete": true}));
    assert_eq!(result["attach"]["operationType"], "attach_disk");
}

#[tokio::test]
async fn modify_disk_applies_each_change_in_order() {
    let (mock, server) = setup().await;

    let result = payload(
        &call(
            &server,
            "modify_disk",
            json!({
                "name": "data-1",
                "size_gb": 500,
                "labels": {"tier": "hot"},
                "instance": "web-1",
                "auto_delete": false
            }),
        )
        .await,
    );

    assert_eq!(
        mock.methods(),
        vec!["resize_disk", "get_disk", "set_disk_labels", "set_disk_auto_delete"]
    );
    assert_eq!(mock.calls_to("set_disk_labels")[0]["fingerprint"], "fp-disk");
    assert_eq!(
        mock.calls_to("set_disk_auto_delete")[0],
        json!({"zone": "us-west1-a", "instance": "web-1", "device_name": "data-1", "auto_delete": false})
    );
    for key in ["resize", "labels", "auto_delete"] {
        assert!(result[key].is_object(), "missing {}", key);
    }
}

#[tokio::test]
async fn modify_disk_stops_at_first_provider_error() {
    let (mock, server) = setup().await;
    mock.fail(
        "resize_disk",
        400,
        "INVALID_ARGUMENT",
        "Requested disk size cannot be smaller than the current size",
    );

    let response = call(
        &server,
        "modify_disk",
        json!({"name": "data-1", "size_gb": 10, "labels": {"tier": "cold"}}),
    )
    .await;

    assert_eq!(response["result"]["isError"], true);
    assert_eq!(mock.methods(), vec!["resize_disk"]);
}

// =============================================================================
// Library workflows without the server
// =============================================================================

#[tokio::test]
async fn wait_for_returns_finished_operation_untouched() {
    let mock = MockCompute::new();
    let api: &dyn ComputeApi = &mock;
    let done = serde_json::from_value(json!({"name": "op-9", "status": "DONE"})).unwrap();

    let operation = workflow::wait_for(api, "us-west1-a", done).await.unwrap();

    assert_eq!(operation.name, "op-9");
    assert_eq!(mock.call_count(), 0);
}

//! End-to-end JSON-RPC sessions against a recording Compute client
//!
//! Every test drives the server the way an MCP client does: initialize,
//! acknowledge, then call tools. The mock stands in for the provider and
//! records exactly what was forwarded.

use std::sync::Arc;

use gce_mcp::{GceMcpServer, ToolContext, get_tool_definitions};
use gce_test_utils::{MockCompute, fixtures};
use rstest::rstest;
use serde_json::{Value, json};

// =============================================================================
// Test Infrastructure
// =============================================================================

/// An initialized client session over a fresh mock
struct TestSession {
    mock: Arc<MockCompute>,
    server: GceMcpServer,
    next_id: u64,
}

impl TestSession {
    async fn start() -> Self {
        let mock = Arc::new(MockCompute::new());
        let ctx = ToolContext::new(mock.clone(), "europe-west1-b", "europe-west1");
        let mut server = GceMcpServer::new(ctx);
        server.initialize().await.unwrap();

        let mut session = Self {
            mock,
            server,
            next_id: 0,
        };
        let init = session
            .request("initialize", json!({"protocolVersion": "2024-11-05", "capabilities": {}}))
            .await;
        assert_eq!(init["result"]["serverInfo"]["name"], "gce-mcp");
        let ack = session
            .server
            .handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await
            .unwrap();
        assert!(ack.is_empty());
        session
    }

    async fn request(&mut self, method: &str, params: Value) -> Value {
        self.next_id += 1;
        let message = json!({
            "jsonrpc": "2.0",
            "id": self.next_id,
            "method": method,
            "params": params,
        });
        let response = self
            .server
            .handle_message(&message.to_string())
            .await
            .unwrap();
        let response: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(response["id"], self.next_id);
        response
    }

    async fn call(&mut self, tool: &str, arguments: Value) -> Value {
        self.request("tools/call", json!({"name": tool, "arguments": arguments}))
            .await
    }

    /// Call a tool that must succeed and return its decoded payload
    async fn call_ok(&mut self, tool: &str, arguments: Value) -> Value {
        let response = self.call(tool, arguments).await;
        let result = &response["result"];
        assert!(
            result.get("isError").is_none(),
            "{} failed: {}",
            tool,
            response
        );
        serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap()
    }
}

// =============================================================================
// One tool, one forwarded call
// =============================================================================

#[rstest]
#[case::list_instances("list_instances", json!({}), "list_instances", json!({"zone": "europe-west1-b", "page_token": null}))]
#[case::get_instance("get_instance", json!({"name": "web-1"}), "get_instance", json!({"zone": "europe-west1-b", "name": "web-1"}))]
#[case::delete_instance("delete_instance", json!({"name": "web-1", "zone": "us-east1-c"}), "delete_instance", json!({"zone": "us-east1-c", "name": "web-1"}))]
#[case::start_instance("start_instance", json!({"name": "web-1"}), "start_instance", json!({"zone": "europe-west1-b", "name": "web-1"}))]
#[case::stop_instance("stop_instance", json!({"name": "web-1"}), "stop_instance", json!({"zone": "europe-west1-b", "name": "web-1"}))]
#[case::list_disks("list_disks", json!({"page_token": "next-page"}), "list_disks", json!({"zone": "europe-west1-b", "page_token": "next-page"}))]
#[case::get_disk("get_disk", json!({"name": "data-1"}), "get_disk", json!({"zone": "europe-west1-b", "name": "data-1"}))]
#[case::attach_disk(
    "attach_disk",
    json!({"instance": "web-1", "disk": "data-1", "mode": "READ_ONLY"}),
    "attach_disk",
    json!({"zone": "europe-west1-b", "instance": "web-1", "spec": {"source": "data-1", "mode": "READ_ONLY"}})
)]
#[case::detach_disk(
    "detach_disk",
    json!({"instance": "web-1", "device_name": "data-1"}),
    "detach_disk",
    json!({"zone": "europe-west1-b", "instance": "web-1", "device_name": "data-1"})
)]
#[case::delete_access_config(
    "configure_network_interface",
    json!({"instance": "web-1", "action": "delete_access_config", "access_config_name": "public"}),
    "delete_access_config",
    json!({"zone": "europe-west1-b", "instance": "web-1", "network_interface": "nic0", "access_config": "public"})
)]
#[case::get_operation("get_operation", json!({"name": "op-1"}), "get_operation", json!({"zone": "europe-west1-b", "name": "op-1"}))]
#[case::wait_operation("get_operation", json!({"name": "op-1", "wait": true}), "wait_operation", json!({"zone": "europe-west1-b", "name": "op-1"}))]
#[case::list_clusters("list_clusters", json!({}), "list_clusters", json!({"location": "-"}))]
#[case::get_cluster("get_cluster", json!({"name": "prod"}), "get_cluster", json!({"location": "europe-west1", "name": "prod"}))]
#[case::list_node_pools(
    "list_node_pools",
    json!({"cluster": "prod", "location": "europe-west1-b"}),
    "list_node_pools",
    json!({"location": "europe-west1-b", "cluster": "prod"})
)]
#[case::delete_cluster("delete_cluster", json!({"name": "prod"}), "delete_cluster", json!({"location": "europe-west1", "name": "prod"}))]
#[case::delete_node_pool(
    "delete_node_pool",
    json!({"cluster": "prod", "node_pool": "batch", "location": "europe-west1-b"}),
    "delete_node_pool",
    json!({"location": "europe-west1-b", "cluster": "prod", "node_pool": "batch"})
)]
#[case::resize_node_pool(
    "resize_node_pool",
    json!({"cluster": "prod", "node_pool": "default-pool", "node_count": 5}),
    "set_node_pool_size",
    json!({"location": "europe-west1", "cluster": "prod", "node_pool": "default-pool", "node_count": 5})
)]
#[tokio::test]
async fn tool_forwards_exactly_one_call(
    #[case] tool: &str,
    #[case] arguments: Value,
    #[case] method: &str,
    #[case] expected: Value,
) {
    let mut session = TestSession::start().await;

    session.call_ok(tool, arguments).await;

    assert_eq!(session.mock.methods(), vec![method]);
    assert_eq!(session.mock.calls_to(method)[0], expected);
}

#[tokio::test]
async fn every_listed_tool_dispatches() {
    let mut session = TestSession::start().await;
    let listed = session.request("tools/list", json!({})).await;
    let listed = listed["result"]["tools"].as_array().unwrap().clone();
    assert_eq!(listed.len(), get_tool_definitions().len());

    for tool in listed {
        let name = tool["name"].as_str().unwrap();
        let response = session.call(name, json!({"__unused": true})).await;
        if let Some(error) = response.get("error") {
            // Only argument problems may be reported, never an unknown tool
            assert_eq!(error["code"], -32602, "{}", name);
            assert!(
                !error["message"].as_str().unwrap().starts_with("unknown tool"),
                "{} is listed but not dispatched",
                name
            );
        }
    }
}

// =============================================================================
// Invocation errors
// =============================================================================

#[tokio::test]
async fn unknown_tool_is_reported_without_provider_call() {
    let mut session = TestSession::start().await;

    let response = session.call("resize_instance", json!({"name": "web-1"})).await;

    assert_eq!(response["error"]["code"], -32602);
    assert_eq!(response["error"]["message"], "unknown tool: resize_instance");
    assert_eq!(session.mock.call_count(), 0);
}

#[rstest]
#[case("create_instance", json!({"machine_type": "e2-small"}), "name")]
#[case("add_disk", json!({"name": "data-1"}), "size_gb")]
#[case("attach_disk", json!({"instance": "web-1"}), "disk")]
#[case("configure_network_interface", json!({"instance": "web-1"}), "action")]
#[case("resize_node_pool", json!({"cluster": "prod", "node_pool": "p"}), "node_count")]
#[tokio::test]
async fn missing_argument_is_reported_without_provider_call(
    #[case] tool: &str,
    #[case] arguments: Value,
    #[case] missing: &str,
) {
    let mut session = TestSession::start().await;

    let response = session.call(tool, arguments).await;

    assert_eq!(response["error"]["code"], -32602);
    let message = response["error"]["message"].as_str().unwrap();
    assert!(message.contains(missing), "{}", message);
    assert_eq!(session.mock.call_count(), 0);
}

#[rstest]
#[case("delete_instance", json!({"name": ".."}))]
#[case("stop_instance", json!({"name": "web-1", "zone": "."}))]
#[case("attach_disk", json!({"instance": "..", "disk": "data-1"}))]
#[case("resize_node_pool", json!({"cluster": "..", "node_pool": "p", "node_count": 1}))]
#[tokio::test]
async fn dot_segment_name_is_rejected_without_provider_call(
    #[case] tool: &str,
    #[case] arguments: Value,
) {
    let mut session = TestSession::start().await;

    let response = session.call(tool, arguments).await;

    assert_eq!(response["error"]["code"], -32602, "{}", response);
    assert!(response.get("result").is_none());
    assert_eq!(session.mock.call_count(), 0);
}

#[tokio::test]
async fn cluster_lifecycle_forwards_each_step() {
    let mut session = TestSession::start().await;

    session
        .call_ok("create_cluster", json!({"name": "prod", "node_count": 1}))
        .await;
    session
        .call_ok(
            "create_node_pool",
            json!({"cluster": "prod", "name": "batch", "machine_type": "n2-standard-8"}),
        )
        .await;
    session
        .call_ok("delete_node_pool", json!({"cluster": "prod", "node_pool": "batch"}))
        .await;
    let deleted = session.call_ok("delete_cluster", json!({"name": "prod"})).await;

    assert_eq!(
        session.mock.methods(),
        vec!["create_cluster", "create_node_pool", "delete_node_pool", "delete_cluster"]
    );
    let created = &session.mock.calls_to("create_cluster")[0];
    assert_eq!(created["location"], "europe-west1");
    assert_eq!(created["spec"]["node_pool"]["node_count"], 1);
    let pool = &session.mock.calls_to("create_node_pool")[0];
    assert_eq!(pool["spec"]["machine_type"], "n2-standard-8");
    assert_eq!(deleted["operationType"], "DELETE_CLUSTER");
}

#[tokio::test]
async fn modify_without_changes_is_rejected() {
    let mut session = TestSession::start().await;

    let instance = session.call("modify_instance", json!({"name": "web-1"})).await;
    let disk = session.call("modify_disk", json!({"name": "data-1"})).await;

    assert_eq!(instance["error"]["code"], -32602);
    assert_eq!(disk["error"]["code"], -32602);
    assert_eq!(session.mock.call_count(), 0);
}

// =============================================================================
// Provider results pass through
// =============================================================================

#[tokio::test]
async fn create_web_server_in_requested_zone() {
    let mut session = TestSession::start().await;

    let operation = session
        .call_ok(
            "create_instance",
            json!({"name": "web-server", "machine_type": "n2-standard-2", "zone": "asia-southeast1-b"}),
        )
        .await;

    let call = &session.mock.calls_to("insert_instance")[0];
    assert_eq!(call["zone"], "asia-southeast1-b");
    assert_eq!(call["spec"]["name"], "web-server");
    assert_eq!(call["spec"]["machine_type"], "n2-standard-2");
    assert_eq!(operation["operationType"], "insert_instance");
}

#[tokio::test]
async fn empty_instance_list_is_returned_verbatim() {
    let mut session = TestSession::start().await;
    session.mock.respond(
        "list_instances",
        json!({"kind": "compute#instanceList", "id": "projects/demo/zones/europe-west1-b/instances"}),
    );

    let list = session.call_ok("list_instances", json!({})).await;

    assert_eq!(
        list,
        json!({"kind": "compute#instanceList", "id": "projects/demo/zones/europe-west1-b/instances"})
    );
}

#[tokio::test]
async fn disk_descriptor_is_returned_verbatim() {
    let mut session = TestSession::start().await;
    session.mock.respond("get_disk", fixtures::disk());

    let disk = session.call_ok("get_disk", json!({"name": "data-disk"})).await;

    assert_eq!(disk, fixtures::disk());
}

#[tokio::test]
async fn deleting_missing_instance_surfaces_provider_message() {
    let mut session = TestSession::start().await;
    let message = "The resource 'projects/demo/zones/europe-west1-b/instances/ghost' was not found";
    session.mock.fail("delete_instance", 404, "NOT_FOUND", message);

    let response = session.call("delete_instance", json!({"name": "ghost"})).await;

    assert!(response.get("error").is_none());
    assert_eq!(response["result"]["isError"], true);
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("404"), "{}", text);
    assert!(text.contains(message), "{}", text);
}

#[tokio::test]
async fn session_survives_provider_failure() {
    let mut session = TestSession::start().await;
    session.mock.fail("start_instance", 403, "PERMISSION_DENIED", "Required 'compute.instances.start' permission");

    let failed = session.call("start_instance", json!({"name": "web-1"})).await;
    assert_eq!(failed["result"]["isError"], true);

    let retried = session.call_ok("start_instance", json!({"name": "web-1"})).await;
    assert_eq!(retried["operationType"], "start_instance");

    let ping = session.request("ping", json!({})).await;
    assert_eq!(ping["result"], json!({}));
}

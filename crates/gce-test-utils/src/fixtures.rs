//! Provider-shaped JSON documents for tests.

use std::path::PathBuf;

use serde_json::{Value, json};

/// Directory holding the shared GCP fixtures
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../test-fixtures/gcp")
}

/// Path of the throwaway service-account key used by auth tests
pub fn service_account_path() -> PathBuf {
    fixtures_dir().join("service-account.json")
}

/// Load a fixture by file name, e.g. `load("instance.json")`
pub fn load(name: &str) -> Value {
    let path = fixtures_dir().join(name);
    let contents = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&contents)
        .unwrap_or_else(|e| panic!("invalid JSON in fixture {}: {}", path.display(), e))
}

/// A full instance resource as returned by `instances.get`
pub fn instance() -> Value {
    load("instance.json")
}

/// A full disk resource as returned by `disks.get`
pub fn disk() -> Value {
    load("disk.json")
}

/// A minimal instance with the given status
pub fn instance_with_status(name: &str, status: &str) -> Value {
    json!({
        "name": name,
        "status": status,
        "labelFingerprint": "fp-labels",
        "metadata": {"fingerprint": "fp-metadata"}
    })
}

/// A pending zonal operation
pub fn pending_operation(name: &str, operation_type: &str) -> Value {
    json!({
        "kind": "compute#operation",
        "name": name,
        "operationType": operation_type,
        "status": "RUNNING",
        "progress": 0
    })
}

/// A finished operation that carries provider errors
pub fn failed_operation(name: &str, code: &str, message: &str) -> Value {
    json!({
        "name": name,
        "status": "DONE",
        "error": {"errors": [{"code": code, "message": message}]}
    })
}

//! Multi-step sequences over [`ComputeApi`]
//!
//! Each step is an ordinary client call; the provider decides whether the
//! sequence succeeds. Steps that require the previous mutation to finish
//! block on the provider's `operations/wait` endpoint.

use serde::Serialize;

use crate::api::ComputeApi;
use crate::models::{AttachDiskSpec, DiskSpec, Operation};
use crate::{Error, Result};

/// Wait until `operation` is done, surfacing any provider-reported failure
pub async fn wait_for(api: &dyn ComputeApi, zone: &str, operation: Operation) -> Result<Operation> {
    let mut current = operation;
    while !current.is_done() {
        tracing::debug!(zone, operation = %current.name, status = ?current.status, "Waiting for operation");
        current = api.wait_operation(zone, &current.name).await?;
    }

    if let Some(message) = current.failure_message() {
        return Err(Error::OperationFailed {
            operation: current.name,
            message,
        });
    }
    Ok(current)
}

/// Operations issued by a restart
#[derive(Debug, Clone, Serialize)]
pub struct RestartOutcome {
    pub stop: Operation,
    pub start: Operation,
}

/// Stop an instance, wait for it to halt, then start it again
pub async fn restart_instance(
    api: &dyn ComputeApi,
    zone: &str,
    name: &str,
) -> Result<RestartOutcome> {
    tracing::info!(zone, name, "Restarting instance");
    let stop = api.stop_instance(zone, name).await?;
    let stop = wait_for(api, zone, stop).await?;
    let start = api.start_instance(zone, name).await?;
    Ok(RestartOutcome { stop, start })
}

/// Operations issued by a machine-type change
#[derive(Debug, Clone, Serialize)]
pub struct ResizeOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Operation>,
    pub set_machine_type: Operation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<Operation>,
}

/// Change an instance's machine type.
///
/// The provider only accepts the change on a stopped instance, so a running
/// instance is stopped first and started again afterwards.
pub async fn change_machine_type(
    api: &dyn ComputeApi,
    zone: &str,
    name: &str,
    machine_type: &str,
) -> Result<ResizeOutcome> {
    let instance = api.get_instance(zone, name).await?;
    let was_running = instance.is_running();

    let stop = if was_running {
        let op = api.stop_instance(zone, name).await?;
        Some(wait_for(api, zone, op).await?)
    } else {
        None
    };

    let mut set_machine_type = api.set_machine_type(zone, name, machine_type).await?;

    let start = if was_running {
        set_machine_type = wait_for(api, zone, set_machine_type).await?;
        Some(api.start_instance(zone, name).await?)
    } else {
        None
    };

    Ok(ResizeOutcome {
        stop,
        set_machine_type,
        start,
    })
}

/// Operations issued when creating a disk
#[derive(Debug, Clone, Serialize)]
pub struct AddDiskOutcome {
    pub insert: Operation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attach: Option<Operation>,
}

/// Create a disk and, when `attach_to` is given, attach it once it exists
pub async fn add_disk(
    api: &dyn ComputeApi,
    zone: &str,
    spec: &DiskSpec,
    attach_to: Option<(&str, &AttachDiskSpec)>,
) -> Result<AddDiskOutcome> {
    let insert = api.insert_disk(zone, spec).await?;

    let Some((instance, attach_spec)) = attach_to else {
        return Ok(AddDiskOutcome {
            insert,
            attach: None,
        });
    };

    let insert = wait_for(api, zone, insert).await?;
    let attach = api.attach_disk(zone, instance, attach_spec).await?;
    Ok(AddDiskOutcome {
        insert,
        attach: Some(attach),
    })
}

//! Scheduled task operations on a single VM
//!
//! Both operations look the VM up by name first and abort with
//! `InventoryError::VmNotFound` when it does not exist.

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::error::AppError;
use crate::vsphere::{ManagementClient, ScheduledTask};

pub mod schedule;

pub use schedule::{guest_shutdown_spec, parse_trigger_time};

/// Outcome of a run-once task cleanup
#[derive(Debug, Clone)]
pub struct RemovalReport {
    pub vm_name: String,
    pub removed: Vec<ScheduledTask>,
    pub kept: Vec<ScheduledTask>,
    pub dry_run: bool,
}

/// Remove every run-once scheduled task bound to `vm_name`
///
/// Recurring and after-startup tasks are left in place. With `dry_run` the
/// tasks that would be removed are reported but not touched.
pub async fn remove_once_tasks<C: ManagementClient>(
    client: &mut C,
    vm_name: &str,
    dry_run: bool,
) -> Result<RemovalReport, AppError> {
    let vm = client.find_virtual_machine(vm_name).await?;
    let tasks = client.scheduled_tasks(&vm).await?;
    info!("Retrieved {} scheduled tasks for {}", tasks.len(), vm.name);

    let mut removed = Vec::new();
    let mut kept = Vec::new();

    for task in tasks {
        debug!(
            "Scheduled task {} '{}': {}",
            task.key, task.spec.name, task.spec.scheduler
        );

        if !task.spec.scheduler.is_once() {
            kept.push(task);
            continue;
        }

        if !dry_run {
            client.remove_scheduled_task(&task).await?;
        }
        info!(
            "{} run-once task '{}'",
            if dry_run { "Would remove" } else { "Removed" },
            task.spec.name
        );
        removed.push(task);
    }

    Ok(RemovalReport {
        vm_name: vm.name,
        removed,
        kept,
        dry_run,
    })
}

/// Register a run-once guest shutdown of `vm_name` at `run_at`
pub async fn schedule_guest_shutdown<C: ManagementClient>(
    client: &mut C,
    vm_name: &str,
    run_at: NaiveDateTime,
    now: NaiveDateTime,
) -> Result<ScheduledTask, AppError> {
    let vm = client.find_virtual_machine(vm_name).await?;
    let spec = guest_shutdown_spec(&vm.name, run_at, now);
    let task = client.create_scheduled_task(&vm, spec).await?;
    info!(
        "Scheduled guest shutdown of {} at {} ({})",
        vm.name, run_at, task.key
    );
    Ok(task)
}

//! Guest shutdown task construction

use chrono::NaiveDateTime;

use crate::error::ScheduleError;
use crate::vsphere::{ScheduledTaskSpec, TaskScheduler, SHUTDOWN_GUEST_ACTION};

/// Accepted `--date` layout, day first
pub const TRIGGER_TIME_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Parse a `d/m/Y H:M` trigger time
pub fn parse_trigger_time(input: &str) -> Result<NaiveDateTime, ScheduleError> {
    NaiveDateTime::parse_from_str(input.trim(), TRIGGER_TIME_FORMAT).map_err(|e| {
        ScheduleError::InvalidDate {
            input: input.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Task name prefixed with the creation time so repeated runs don't collide
pub fn shutdown_task_name(vm_name: &str, now: NaiveDateTime) -> String {
    format!(
        "{}Planned GuestShutdown vm {}",
        now.format("%Y-%m-%d %H:%M:%S"),
        vm_name
    )
}

/// Run-once `ShutdownGuest` task for `vm_name` firing at `run_at`
pub fn guest_shutdown_spec(
    vm_name: &str,
    run_at: NaiveDateTime,
    now: NaiveDateTime,
) -> ScheduledTaskSpec {
    ScheduledTaskSpec {
        name: shutdown_task_name(vm_name, now),
        description: String::new(),
        scheduler: TaskScheduler::Once { run_at },
        action_name: SHUTDOWN_GUEST_ACTION.to_string(),
        enabled: true,
    }
}

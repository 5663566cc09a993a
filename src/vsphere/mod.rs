//! vSphere object model and management client seam
//!
//! Typed views of the inventory objects the tool reads (hosts, VMs, virtual
//! switches) and mutates (scheduled tasks), plus the session-based client
//! trait every backend implements.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use tracing::warn;

use crate::error::{AppError, InventoryError, ScheduleError, SessionError};

pub mod inventory;
pub mod resolver;

/// Login parameters for a management endpoint
#[derive(Clone)]
pub struct Credentials {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// ESXi host with the portgroups configured on its standard switches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Host {
    pub name: String,
    #[serde(default)]
    pub portgroups: Vec<PortgroupConfig>,
}

/// Standard switch portgroup as reported by a host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortgroupConfig {
    /// Host-assigned key, embeds the portgroup name
    pub key: String,
    pub vswitch_name: String,
    /// 0 means untagged
    pub vlan_id: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PowerState {
    PoweredOn,
    PoweredOff,
    Suspended,
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PowerState::PoweredOn => "poweredOn",
            PowerState::PoweredOff => "poweredOff",
            PowerState::Suspended => "suspended",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualMachine {
    pub name: String,
    pub power_state: PowerState,
    /// Name of the host currently running the VM
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub adapters: Vec<VirtualAdapter>,
}

/// Virtual ethernet card attached to a VM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualAdapter {
    pub label: String,
    pub mac_address: String,
    pub backing: AdapterBacking,
}

/// What a virtual NIC is plugged into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AdapterBacking {
    /// Port on a distributed virtual switch
    DistributedPort {
        switch_uuid: String,
        portgroup_key: String,
    },
    /// Standard switch network referenced by name
    Network { name: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributedSwitch {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub portgroups: Vec<DvPortgroup>,
}

impl DistributedSwitch {
    pub fn lookup_portgroup(&self, key: &str) -> Option<&DvPortgroup> {
        self.portgroups.iter().find(|pg| pg.key == key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DvPortgroup {
    pub key: String,
    pub name: String,
    pub default_vlan: VlanSpec,
}

/// Default VLAN setting of a distributed portgroup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VlanSpec {
    Vlan { vlan_id: u16 },
    Trunk { ranges: Vec<VlanRange> },
    Pvlan { pvlan_id: u16 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VlanRange {
    pub start: u16,
    pub end: u16,
}

impl fmt::Display for VlanSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VlanSpec::Vlan { vlan_id } => write!(f, "{}", vlan_id),
            VlanSpec::Pvlan { pvlan_id } => write!(f, "{}", pvlan_id),
            VlanSpec::Trunk { ranges } => {
                for (i, range) in ranges.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}-{}", range.start, range.end)?;
                }
                Ok(())
            }
        }
    }
}

/// Method invoked on the VM when a guest shutdown task fires
pub const SHUTDOWN_GUEST_ACTION: &str = "ShutdownGuest";

/// When a scheduled task fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskScheduler {
    Once { run_at: NaiveDateTime },
    AfterStartup { delay_minutes: u32 },
    Daily { hour: u8, minute: u8 },
    Hourly { minute: u8 },
}

impl TaskScheduler {
    pub fn is_once(&self) -> bool {
        matches!(self, TaskScheduler::Once { .. })
    }
}

impl fmt::Display for TaskScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskScheduler::Once { run_at } => write!(f, "once at {}", run_at),
            TaskScheduler::AfterStartup { delay_minutes } => {
                write!(f, "{} minutes after startup", delay_minutes)
            }
            TaskScheduler::Daily { hour, minute } => {
                write!(f, "daily at {:02}:{:02}", hour, minute)
            }
            TaskScheduler::Hourly { minute } => write!(f, "hourly at minute {}", minute),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTaskSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub scheduler: TaskScheduler,
    pub action_name: String,
    pub enabled: bool,
}

/// Scheduled task registered against a managed entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub key: String,
    /// Name of the VM the task is bound to
    pub entity: String,
    #[serde(flatten)]
    pub spec: ScheduledTaskSpec,
}

/// Session-based client for a virtualization management endpoint
///
/// One session is opened per run. Enumeration calls walk the whole inventory
/// from the root folder.
#[allow(async_fn_in_trait)]
pub trait ManagementClient {
    async fn hosts(&self) -> Result<Vec<Host>, InventoryError>;

    async fn virtual_machines(&self) -> Result<Vec<VirtualMachine>, InventoryError>;

    async fn distributed_switches(&self) -> Result<Vec<DistributedSwitch>, InventoryError>;

    async fn scheduled_tasks(
        &self,
        vm: &VirtualMachine,
    ) -> Result<Vec<ScheduledTask>, ScheduleError>;

    async fn remove_scheduled_task(&mut self, task: &ScheduledTask) -> Result<(), ScheduleError>;

    async fn create_scheduled_task(
        &mut self,
        vm: &VirtualMachine,
        spec: ScheduledTaskSpec,
    ) -> Result<ScheduledTask, ScheduleError>;

    async fn disconnect(self) -> Result<(), SessionError>;

    /// First VM whose name matches exactly
    async fn find_virtual_machine(&self, name: &str) -> Result<VirtualMachine, InventoryError> {
        self.virtual_machines()
            .await?
            .into_iter()
            .find(|vm| vm.name == name)
            .ok_or_else(|| InventoryError::VmNotFound {
                name: name.to_string(),
            })
    }
}

/// Close the session and hand back the outcome of the work done in it
///
/// An operation error takes priority over a failed disconnect, which is then
/// only logged.
pub async fn finish_session<C, T>(client: C, result: Result<T, AppError>) -> Result<T, AppError>
where
    C: ManagementClient,
{
    match (client.disconnect().await, result) {
        (Ok(()), result) => result,
        (Err(e), Ok(_)) => Err(e.into()),
        (Err(e), Err(op_err)) => {
            warn!("Disconnect failed after an earlier error: {}", e);
            Err(op_err)
        }
    }
}

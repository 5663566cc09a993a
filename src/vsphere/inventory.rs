//! Inventory snapshot backend
//!
//! Serves the management client API from a JSON document exported from an
//! endpoint. Scheduled task changes are kept in memory and written back when
//! the session is closed.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{InventoryError, ScheduleError, SessionError};
use crate::vsphere::{
    Credentials, DistributedSwitch, Host, ManagementClient, ScheduledTask, ScheduledTaskSpec,
    VirtualMachine,
};

const TASK_KEY_PREFIX: &str = "schedtask-";

/// Account allowed to open a session against the snapshot
#[derive(Clone, Serialize, Deserialize)]
pub struct Account {
    pub user: String,
    pub password: String,
}

/// On-disk inventory layout
#[derive(Default, Serialize, Deserialize)]
pub struct InventoryDocument {
    #[serde(default)]
    pub credentials: Vec<Account>,
    #[serde(default)]
    pub hosts: Vec<Host>,
    #[serde(default)]
    pub virtual_machines: Vec<VirtualMachine>,
    #[serde(default)]
    pub distributed_switches: Vec<DistributedSwitch>,
    #[serde(default)]
    pub scheduled_tasks: Vec<ScheduledTask>,
}

/// Management client session over an inventory snapshot
pub struct InventoryClient {
    path: PathBuf,
    endpoint: String,
    document: InventoryDocument,
    dirty: bool,
}

impl InventoryClient {
    /// Load the snapshot at `path` and log in with `credentials`
    pub async fn connect(
        path: impl AsRef<Path>,
        credentials: &Credentials,
    ) -> Result<Self, SessionError> {
        let path = path.as_ref().to_path_buf();
        debug!("Loading inventory snapshot from {}", path.display());

        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| SessionError::ConnectionFailed {
                host: credentials.host.clone(),
                port: credentials.port,
                reason: format!("cannot read inventory {}: {}", path.display(), e),
            })?;

        let document: InventoryDocument =
            serde_json::from_str(&raw).map_err(|e| SessionError::ConnectionFailed {
                host: credentials.host.clone(),
                port: credentials.port,
                reason: format!("malformed inventory {}: {}", path.display(), e),
            })?;

        Self::from_document(path, document, credentials)
    }

    /// Open a session over an already loaded document
    pub fn from_document(
        path: PathBuf,
        document: InventoryDocument,
        credentials: &Credentials,
    ) -> Result<Self, SessionError> {
        let authorized = document
            .credentials
            .iter()
            .any(|acct| acct.user == credentials.user && acct.password == credentials.password);
        if !authorized {
            return Err(SessionError::AuthenticationFailed {
                host: credentials.host.clone(),
                user: credentials.user.clone(),
            });
        }

        let endpoint = format!("{}:{}", credentials.host, credentials.port);
        info!("Connected to {} as {}", endpoint, credentials.user);

        Ok(Self {
            path,
            endpoint,
            document,
            dirty: false,
        })
    }

    pub fn document(&self) -> &InventoryDocument {
        &self.document
    }

    fn next_task_key(&self) -> String {
        let next = self
            .document
            .scheduled_tasks
            .iter()
            .filter_map(|t| t.key.strip_prefix(TASK_KEY_PREFIX)?.parse::<u64>().ok())
            .max()
            .map_or(1, |n| n + 1);
        format!("{}{}", TASK_KEY_PREFIX, next)
    }
}

impl ManagementClient for InventoryClient {
    async fn hosts(&self) -> Result<Vec<Host>, InventoryError> {
        Ok(self.document.hosts.clone())
    }

    async fn virtual_machines(&self) -> Result<Vec<VirtualMachine>, InventoryError> {
        Ok(self.document.virtual_machines.clone())
    }

    async fn distributed_switches(&self) -> Result<Vec<DistributedSwitch>, InventoryError> {
        Ok(self.document.distributed_switches.clone())
    }

    async fn scheduled_tasks(
        &self,
        vm: &VirtualMachine,
    ) -> Result<Vec<ScheduledTask>, ScheduleError> {
        Ok(self
            .document
            .scheduled_tasks
            .iter()
            .filter(|t| t.entity == vm.name)
            .cloned()
            .collect())
    }

    async fn remove_scheduled_task(&mut self, task: &ScheduledTask) -> Result<(), ScheduleError> {
        let pos = self
            .document
            .scheduled_tasks
            .iter()
            .position(|t| t.key == task.key)
            .ok_or_else(|| ScheduleError::TaskNotFound {
                key: task.key.clone(),
            })?;

        let removed = self.document.scheduled_tasks.remove(pos);
        self.dirty = true;
        debug!("Removed scheduled task {} ({})", removed.key, removed.spec.name);
        Ok(())
    }

    async fn create_scheduled_task(
        &mut self,
        vm: &VirtualMachine,
        spec: ScheduledTaskSpec,
    ) -> Result<ScheduledTask, ScheduleError> {
        if !self
            .document
            .virtual_machines
            .iter()
            .any(|candidate| candidate.name == vm.name)
        {
            return Err(ScheduleError::Rejected(format!(
                "entity {} does not exist",
                vm.name
            )));
        }

        if self
            .document
            .scheduled_tasks
            .iter()
            .any(|t| t.spec.name == spec.name)
        {
            return Err(ScheduleError::Rejected(format!(
                "a scheduled task named '{}' already exists",
                spec.name
            )));
        }

        let task = ScheduledTask {
            key: self.next_task_key(),
            entity: vm.name.clone(),
            spec,
        };
        self.document.scheduled_tasks.push(task.clone());
        self.dirty = true;
        debug!("Created scheduled task {} on {}", task.key, task.entity);
        Ok(task)
    }

    async fn disconnect(self) -> Result<(), SessionError> {
        if self.dirty {
            let raw = serde_json::to_string_pretty(&self.document)
                .map_err(|e| SessionError::DisconnectFailed(e.to_string()))?;
            tokio::fs::write(&self.path, raw)
                .await
                .map_err(|e| {
                    SessionError::DisconnectFailed(format!(
                        "cannot write inventory {}: {}",
                        self.path.display(),
                        e
                    ))
                })?;
            debug!("Inventory changes written to {}", self.path.display());
        }
        info!("Disconnected from {}", self.endpoint);
        Ok(())
    }
}

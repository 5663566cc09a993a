//! Virtual NIC report across all VMs

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::AppError;
use crate::vsphere::resolver::{resolve, DvsDirectory, PortgroupSnapshot, ResolvedNicInfo};
use crate::vsphere::{ManagementClient, PowerState};

/// Adapters of one VM with their resolved network placement
#[derive(Debug, Clone, Serialize)]
pub struct VmNicReport {
    pub vm_name: String,
    pub power_state: PowerState,
    pub nics: Vec<ResolvedNicInfo>,
}

/// Walk hosts, switches and VMs once and resolve every virtual NIC
///
/// Portgroups and distributed switches are snapshotted before the VMs are
/// enumerated; `vm_filter` restricts the report to VMs whose name matches.
pub async fn collect_vnic_report<C: ManagementClient>(
    client: &C,
    vm_filter: Option<&Regex>,
) -> Result<Vec<VmNicReport>, AppError> {
    info!("Getting all ESX hosts ...");
    let hosts = client.hosts().await?;

    info!("Collecting portgroups on all hosts ...");
    let portgroups = PortgroupSnapshot::collect(&hosts);
    info!(
        "Portgroup collection complete ({} hosts)",
        portgroups.host_count()
    );

    let switches = DvsDirectory::new(client.distributed_switches().await?);
    debug!("Loaded {} distributed switches", switches.len());

    info!("Getting all VMs ...");
    let vms = client.virtual_machines().await?;

    let report = vms
        .into_iter()
        .filter(|vm| vm_filter.map_or(true, |re| re.is_match(&vm.name)))
        .map(|vm| {
            let nics = vm
                .adapters
                .iter()
                .map(|adapter| resolve(adapter, vm.host.as_deref(), &portgroups, &switches))
                .collect();
            VmNicReport {
                vm_name: vm.name,
                power_state: vm.power_state,
                nics,
            }
        })
        .collect::<Vec<_>>();

    info!("Resolved adapters for {} VMs", report.len());
    Ok(report)
}

/// Plain text rendering, one header line per VM and one line per adapter
pub fn render_text(report: &[VmNicReport]) -> String {
    let mut out = String::new();
    for vm in report {
        out.push_str(&format!("#Found VM: {}({})\n", vm.vm_name, vm.power_state));
        for nic in &vm.nics {
            out.push_str(&format!(
                "\t{}->{} @ {}->{} (VLAN {} {})\n",
                nic.label, nic.mac_address, nic.vswitch_name, nic.portgroup_name, nic.vlan_id,
                vm.vm_name
            ));
        }
    }
    out
}

pub fn render_json(report: &[VmNicReport]) -> Result<String, AppError> {
    Ok(serde_json::to_string_pretty(report)?)
}

//! Virtual NIC to portgroup/VLAN resolution
//!
//! Joins a VM's adapter backings against the per-host portgroup snapshot
//! (standard switches) or the distributed switch directory (DVS ports).
//! Resolution never fails: anything that cannot be determined is reported
//! with the `NA` sentinel so the report can continue with other adapters.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::InventoryError;
use crate::vsphere::{AdapterBacking, DistributedSwitch, Host, PortgroupConfig, VirtualAdapter};

/// Placeholder for any field that could not be resolved
pub const NOT_AVAILABLE: &str = "NA";

/// Portgroup name reported when the backing switch UUID cannot be looked up
pub const DVS_NOT_FOUND: &str = "** Error: DVS not found **";

/// Resolved view of one virtual NIC
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedNicInfo {
    pub label: String,
    pub mac_address: String,
    pub vswitch_name: String,
    pub portgroup_name: String,
    pub vlan_id: String,
}

/// Lookup of distributed switches by UUID
///
/// `Ok(None)` means the switch does not exist; `Err` is a genuine lookup
/// fault. The resolver degrades both to sentinels but logs them differently.
pub trait DistributedSwitchLookup {
    fn switch_by_uuid(&self, uuid: &str) -> Result<Option<&DistributedSwitch>, InventoryError>;
}

/// Distributed switches keyed by UUID, collected once per run
#[derive(Debug, Default)]
pub struct DvsDirectory {
    switches: HashMap<String, DistributedSwitch>,
}

impl DvsDirectory {
    pub fn new(switches: Vec<DistributedSwitch>) -> Self {
        let switches = switches
            .into_iter()
            .map(|dvs| (dvs.uuid.clone(), dvs))
            .collect();
        Self { switches }
    }

    pub(crate) fn len(&self) -> usize {
        self.switches.len()
    }
}

impl DistributedSwitchLookup for DvsDirectory {
    fn switch_by_uuid(&self, uuid: &str) -> Result<Option<&DistributedSwitch>, InventoryError> {
        Ok(self.switches.get(uuid))
    }
}

/// Standard switch portgroups per host, taken once at the start of a run
#[derive(Debug, Default)]
pub struct PortgroupSnapshot {
    by_host: HashMap<String, Vec<PortgroupConfig>>,
}

impl PortgroupSnapshot {
    pub fn collect(hosts: &[Host]) -> Self {
        let mut by_host = HashMap::with_capacity(hosts.len());
        for host in hosts {
            if by_host.contains_key(&host.name) {
                warn!(
                    "Duplicate host name {}; keeping the portgroups of the first one",
                    host.name
                );
                continue;
            }
            by_host.insert(host.name.clone(), host.portgroups.clone());
            debug!(
                "Host {} done ({} portgroups)",
                host.name,
                host.portgroups.len()
            );
        }
        Self { by_host }
    }

    /// Portgroups of `host` in the order the host reported them
    pub fn for_host(&self, host: &str) -> &[PortgroupConfig] {
        self.by_host.get(host).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn host_count(&self) -> usize {
        self.by_host.len()
    }
}

/// Resolve switch, portgroup and VLAN for a single adapter
///
/// `owner_host` is the host currently running the adapter's VM. Standard
/// switch backings match the first portgroup whose key *contains* the
/// network name, so overlapping names such as `Prod` and `Prod-DR` resolve
/// to whichever the host lists first.
pub fn resolve<L>(
    adapter: &VirtualAdapter,
    owner_host: Option<&str>,
    host_portgroups: &PortgroupSnapshot,
    dvs_lookup: &L,
) -> ResolvedNicInfo
where
    L: DistributedSwitchLookup + ?Sized,
{
    let mut portgroup: Option<String> = None;
    let mut vlan: Option<String> = None;
    let mut vswitch: Option<String> = None;

    match &adapter.backing {
        AdapterBacking::DistributedPort {
            switch_uuid,
            portgroup_key,
        } => match dvs_lookup.switch_by_uuid(switch_uuid) {
            Ok(Some(dvs)) => {
                vswitch = Some(dvs.name.clone());
                match dvs.lookup_portgroup(portgroup_key) {
                    Some(pg) => {
                        portgroup = Some(pg.name.clone());
                        vlan = Some(pg.default_vlan.to_string());
                    }
                    None => debug!(
                        "Portgroup {} not present on DVS {}",
                        portgroup_key, dvs.name
                    ),
                }
            }
            Ok(None) => {
                debug!("DVS {} not found for {}", switch_uuid, adapter.label);
                portgroup = Some(DVS_NOT_FOUND.to_string());
            }
            Err(e) => {
                warn!("DVS lookup for {} failed: {}", switch_uuid, e);
                portgroup = Some(DVS_NOT_FOUND.to_string());
            }
        },
        AdapterBacking::Network { name } => {
            portgroup = Some(name.clone());
            let pgs: &[PortgroupConfig] = match owner_host {
                Some(host) => host_portgroups.for_host(host),
                None => &[],
            };
            if let Some(pg) = pgs.iter().find(|pg| pg.key.contains(name.as_str())) {
                vlan = Some(pg.vlan_id.to_string());
                vswitch = Some(pg.vswitch_name.clone());
            }
        }
    }

    ResolvedNicInfo {
        label: or_na(Some(adapter.label.clone()).filter(|l| !l.is_empty())),
        mac_address: adapter.mac_address.clone(),
        vswitch_name: or_na(vswitch),
        portgroup_name: or_na(portgroup),
        vlan_id: or_na(vlan),
    }
}

fn or_na(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vsphere::{DvPortgroup, VlanRange, VlanSpec};

    struct FailingLookup;

    impl DistributedSwitchLookup for FailingLookup {
        fn switch_by_uuid(
            &self,
            _uuid: &str,
        ) -> Result<Option<&DistributedSwitch>, InventoryError> {
            Err(InventoryError::Unavailable("dvSwitchManager timed out".to_string()))
        }
    }

    fn pg(key: &str, vswitch: &str, vlan_id: u16) -> PortgroupConfig {
        PortgroupConfig {
            key: key.to_string(),
            vswitch_name: vswitch.to_string(),
            vlan_id,
        }
    }

    fn network_adapter(name: &str) -> VirtualAdapter {
        VirtualAdapter {
            label: "Network adapter 1".to_string(),
            mac_address: "00:50:56:aa:bb:01".to_string(),
            backing: AdapterBacking::Network {
                name: name.to_string(),
            },
        }
    }

    fn dvs_adapter(uuid: &str, key: &str) -> VirtualAdapter {
        VirtualAdapter {
            label: "Network adapter 2".to_string(),
            mac_address: "00:50:56:aa:bb:02".to_string(),
            backing: AdapterBacking::DistributedPort {
                switch_uuid: uuid.to_string(),
                portgroup_key: key.to_string(),
            },
        }
    }

    fn snapshot(host: &str, portgroups: Vec<PortgroupConfig>) -> PortgroupSnapshot {
        PortgroupSnapshot::collect(&[Host {
            name: host.to_string(),
            portgroups,
        }])
    }

    fn directory() -> DvsDirectory {
        DvsDirectory::new(vec![DistributedSwitch {
            uuid: "50 1d 2e 3f".to_string(),
            name: "dvSwitch-Core".to_string(),
            portgroups: vec![
                DvPortgroup {
                    key: "dvportgroup-21".to_string(),
                    name: "DPG-App".to_string(),
                    default_vlan: VlanSpec::Vlan { vlan_id: 120 },
                },
                DvPortgroup {
                    key: "dvportgroup-22".to_string(),
                    name: "DPG-Trunk".to_string(),
                    default_vlan: VlanSpec::Trunk {
                        ranges: vec![VlanRange { start: 0, end: 4094 }],
                    },
                },
            ],
        }])
    }

    #[test]
    fn test_standard_switch_scenario() {
        let snap = snapshot(
            "Prod-A",
            vec![pg("dvportgroup-1::VM Network", "vSwitch0", 10)],
        );
        let info = resolve(
            &network_adapter("VM Network"),
            Some("Prod-A"),
            &snap,
            &DvsDirectory::default(),
        );

        assert_eq!(info.vlan_id, "10");
        assert_eq!(info.vswitch_name, "vSwitch0");
        assert_eq!(info.portgroup_name, "VM Network");
        assert_eq!(info.label, "Network adapter 1");
        assert_eq!(info.mac_address, "00:50:56:aa:bb:01");
    }

    #[test]
    fn test_standard_switch_exact_key() {
        let snap = snapshot(
            "esx01",
            vec![pg("Backup", "vSwitch1", 30), pg("Storage", "vSwitch2", 40)],
        );
        let info = resolve(
            &network_adapter("Storage"),
            Some("esx01"),
            &snap,
            &DvsDirectory::default(),
        );

        assert_eq!(info.vlan_id, "40");
        assert_eq!(info.vswitch_name, "vSwitch2");
    }

    #[test]
    fn test_untagged_portgroup_reports_zero() {
        let snap = snapshot("esx01", vec![pg("Mgmt", "vSwitch0", 0)]);
        let info = resolve(
            &network_adapter("Mgmt"),
            Some("esx01"),
            &snap,
            &DvsDirectory::default(),
        );
        assert_eq!(info.vlan_id, "0");
    }

    #[test]
    fn test_standard_switch_no_match() {
        let snap = snapshot("esx01", vec![pg("Backup", "vSwitch1", 30)]);
        let info = resolve(
            &network_adapter("DMZ"),
            Some("esx01"),
            &snap,
            &DvsDirectory::default(),
        );

        assert_eq!(info.portgroup_name, "DMZ");
        assert_eq!(info.vlan_id, NOT_AVAILABLE);
        assert_eq!(info.vswitch_name, NOT_AVAILABLE);
    }

    #[test]
    fn test_overlapping_names_depend_on_host_order() {
        // Known ambiguity: "Prod" is a substring of "Prod-DR", so whichever
        // the host lists first wins.
        let adapter = network_adapter("Prod");

        let dr_first = snapshot(
            "esx01",
            vec![pg("Prod-DR", "vSwitch9", 900), pg("Prod", "vSwitch1", 100)],
        );
        let info = resolve(&adapter, Some("esx01"), &dr_first, &DvsDirectory::default());
        assert_eq!(info.vlan_id, "900");
        assert_eq!(info.vswitch_name, "vSwitch9");

        let prod_first = snapshot(
            "esx01",
            vec![pg("Prod", "vSwitch1", 100), pg("Prod-DR", "vSwitch9", 900)],
        );
        let info = resolve(&adapter, Some("esx01"), &prod_first, &DvsDirectory::default());
        assert_eq!(info.vlan_id, "100");
        assert_eq!(info.vswitch_name, "vSwitch1");
    }

    #[test]
    fn test_portgroups_of_other_hosts_are_ignored() {
        let snap = PortgroupSnapshot::collect(&[
            Host {
                name: "esx01".to_string(),
                portgroups: vec![pg("Web", "vSwitch0", 11)],
            },
            Host {
                name: "esx02".to_string(),
                portgroups: vec![pg("Web", "vSwitch5", 55)],
            },
        ]);
        let info = resolve(
            &network_adapter("Web"),
            Some("esx02"),
            &snap,
            &DvsDirectory::default(),
        );
        assert_eq!(info.vlan_id, "55");
        assert_eq!(info.vswitch_name, "vSwitch5");
    }

    #[test]
    fn test_duplicate_host_name_keeps_first() {
        let snap = PortgroupSnapshot::collect(&[
            Host {
                name: "esx01".to_string(),
                portgroups: vec![pg("Web", "vSwitch0", 11)],
            },
            Host {
                name: "esx01".to_string(),
                portgroups: vec![pg("Web", "vSwitch7", 77)],
            },
        ]);

        assert_eq!(snap.host_count(), 1);
        assert_eq!(snap.for_host("esx01"), [pg("Web", "vSwitch0", 11)]);
    }

    #[test]
    fn test_unknown_owner_host() {
        let snap = snapshot("esx01", vec![pg("Web", "vSwitch0", 11)]);
        let dvs = DvsDirectory::default();

        let info = resolve(&network_adapter("Web"), Some("esx99"), &snap, &dvs);
        assert_eq!(info.vlan_id, NOT_AVAILABLE);
        assert_eq!(info.vswitch_name, NOT_AVAILABLE);

        let info = resolve(&network_adapter("Web"), None, &snap, &dvs);
        assert_eq!(info.portgroup_name, "Web");
        assert_eq!(info.vlan_id, NOT_AVAILABLE);
    }

    #[test]
    fn test_distributed_port_known_switch() {
        let info = resolve(
            &dvs_adapter("50 1d 2e 3f", "dvportgroup-21"),
            Some("esx01"),
            &PortgroupSnapshot::default(),
            &directory(),
        );

        assert_eq!(info.portgroup_name, "DPG-App");
        assert_eq!(info.vswitch_name, "dvSwitch-Core");
        assert_eq!(info.vlan_id, "120");
    }

    #[test]
    fn test_distributed_port_trunk_vlan_is_opaque() {
        let info = resolve(
            &dvs_adapter("50 1d 2e 3f", "dvportgroup-22"),
            None,
            &PortgroupSnapshot::default(),
            &directory(),
        );
        assert_eq!(info.portgroup_name, "DPG-Trunk");
        assert_eq!(info.vlan_id, "0-4094");
    }

    #[test]
    fn test_distributed_port_unknown_switch() {
        let info = resolve(
            &dvs_adapter("ff ff ff ff", "dvportgroup-21"),
            Some("esx01"),
            &PortgroupSnapshot::default(),
            &directory(),
        );

        assert_eq!(info.portgroup_name, DVS_NOT_FOUND);
        assert_eq!(info.vlan_id, NOT_AVAILABLE);
        assert_eq!(info.vswitch_name, NOT_AVAILABLE);
    }

    #[test]
    fn test_distributed_lookup_fault_degrades() {
        let info = resolve(
            &dvs_adapter("50 1d 2e 3f", "dvportgroup-21"),
            Some("esx01"),
            &PortgroupSnapshot::default(),
            &FailingLookup,
        );

        assert_eq!(info.portgroup_name, DVS_NOT_FOUND);
        assert_eq!(info.vlan_id, NOT_AVAILABLE);
        assert_eq!(info.vswitch_name, NOT_AVAILABLE);
    }

    #[test]
    fn test_distributed_port_unknown_portgroup_keeps_switch() {
        let info = resolve(
            &dvs_adapter("50 1d 2e 3f", "dvportgroup-99"),
            None,
            &PortgroupSnapshot::default(),
            &directory(),
        );

        assert_eq!(info.vswitch_name, "dvSwitch-Core");
        assert_eq!(info.portgroup_name, NOT_AVAILABLE);
        assert_eq!(info.vlan_id, NOT_AVAILABLE);
    }

    #[test]
    fn test_missing_label_defaults_to_sentinel() {
        let mut adapter = network_adapter("Web");
        adapter.label.clear();
        let info = resolve(
            &adapter,
            None,
            &PortgroupSnapshot::default(),
            &DvsDirectory::default(),
        );
        assert_eq!(info.label, NOT_AVAILABLE);
    }
}

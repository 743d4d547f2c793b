//! Subnet registration.
//!
//! Decides which subnets enter the inventory, hangs them under their resolved
//! group and fills them with hosts.

use super::fields::{FieldSelection, HostFields};
use super::forest::FilterForest;
use super::hierarchy::{safe_name, GroupTree, IndexEntry, SupernetRoots};
use crate::config::InventorySettings;
use crate::error::{Error, Result};
use crate::ipam::IpamSource;
use crate::models::{Inventory, Ipv4, NetworkRecord};
use colored::Colorize;
use std::net::Ipv4Addr;

/// Include/exclude decision for subnet networks.
#[derive(Debug, Clone, Default)]
pub struct SubnetFilter {
    include: FilterForest,
    exclude: FilterForest,
    include_root_net: bool,
}

/// Outcome of matching a subnet against both forests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Triage {
    Include,
    /// Covered by no include network and the root network is not admitted.
    Uncovered,
    /// Covered by an exclude network that wins over any include network.
    Excluded(Ipv4),
}

impl SubnetFilter {
    pub fn new(include: &[Ipv4], exclude: &[Ipv4], include_root_net: bool) -> SubnetFilter {
        SubnetFilter {
            include: FilterForest::build(include),
            exclude: FilterForest::build(exclude),
            include_root_net,
        }
    }

    pub fn from_settings(settings: &InventorySettings) -> SubnetFilter {
        SubnetFilter::new(
            &settings.include_nets,
            &settings.exclude_nets,
            settings.include_root_net,
        )
    }

    /// Decide whether `net` belongs in the inventory.
    ///
    /// An exclusion nested inside (or equal to) the matching inclusion wins.
    /// An exclusion with no include match always wins.
    pub fn triage(&self, net: &Ipv4) -> Triage {
        match (self.include.find(net), self.exclude.find(net)) {
            (None, None) if self.include_root_net => Triage::Include,
            (None, None) => Triage::Uncovered,
            (None, Some(excl)) => Triage::Excluded(excl),
            (Some(incl), Some(excl)) if excl.subnet_of(&incl) => Triage::Excluded(excl),
            (Some(_), _) => Triage::Include,
        }
    }
}

/// What happened to one subnet record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// Attached with this many hosts.
    Attached(usize),
    Filtered(Triage),
    /// Parent group left out by name.
    ExcludedGroup,
    /// No group to attach to.
    Orphaned,
    /// Address or prefix missing or not IPv4.
    Unaddressable,
}

/// Attaches subnets and their hosts to a group tree.
///
/// Consumes the tree; [`SubnetRegistrar::finish`] hands back the inventory.
pub struct SubnetRegistrar {
    tree: GroupTree,
    supernets: SupernetRoots,
    filter: SubnetFilter,
    subnet_vars: FieldSelection,
    internal: FieldSelection,
    hosts: HostFields,
}

impl SubnetRegistrar {
    pub fn new(
        tree: GroupTree,
        supernets: SupernetRoots,
        filter: SubnetFilter,
        settings: &InventorySettings,
    ) -> SubnetRegistrar {
        SubnetRegistrar {
            tree,
            supernets,
            filter,
            subnet_vars: FieldSelection::new(&settings.subnet_vars),
            internal: FieldSelection::new(&settings.internal),
            hosts: HostFields::new(settings),
        }
    }

    /// Register one subnet record, fetching its hosts from `source` if admitted.
    pub fn register(
        &mut self,
        subnet: &NetworkRecord,
        source: &mut dyn IpamSource,
    ) -> Result<Registration> {
        let parent_id = self
            .supernets
            .root(subnet.parent_id)
            .unwrap_or(subnet.parent_id);
        if self.tree.is_excluded(parent_id) {
            log::debug!(
                "Filtered subnet '{}' (id {}): group {parent_id} is excluded",
                subnet.display_name,
                subnet.id
            );
            return Ok(Registration::ExcludedGroup);
        }
        let parent = match self.tree.get(parent_id) {
            Some(entry) => entry.node,
            None => {
                log::warn!(
                    "{} subnet '{}' (id {}): parent {} is not a known group",
                    "Skipping".on_red(),
                    subnet.display_name,
                    subnet.id,
                    parent_id
                );
                return Ok(Registration::Orphaned);
            }
        };

        let net = match (&subnet.address, subnet.prefix_length) {
            (Some(addr), Some(len)) => Ipv4::from_parts(addr, len).map(|n| n.network()),
            _ => Err(Error::InvalidCidr(
                "missing address or prefix length".to_string(),
            )),
        };
        let net = match net {
            Ok(net) => net,
            Err(e) => {
                log::warn!(
                    "{} subnet '{}' (id {}): {e}",
                    "Skipping".on_red(),
                    subnet.display_name,
                    subnet.id
                );
                return Ok(Registration::Unaddressable);
            }
        };

        let triage = self.filter.triage(&net);
        if triage != Triage::Include {
            log::debug!("Filtered subnet {net} '{}': {triage:?}", subnet.display_name);
            return Ok(Registration::Filtered(triage));
        }

        let name = safe_name(&subnet.display_name);
        let inventory = &mut self.tree.inventory;
        if inventory.is_taken(&name) {
            return Err(Error::DuplicateName {
                name,
                display_name: subnet.display_name.clone(),
            });
        }
        let node = inventory.add_placeholder();
        inventory.claim_name(node, &name, &subnet.display_name)?;
        {
            let group = inventory.node_mut(node);
            group.vars = Some(self.subnet_vars.project(&subnet.fields));
            group.hosts = Some(Vec::new());
        }
        inventory.add_child(parent, &name);
        self.tree.insert(
            subnet.id,
            IndexEntry {
                node,
                internal: self.internal.project(&subnet.fields),
            },
        );

        let mut count = 0;
        for host in source.fetch_host_records(subnet.id)? {
            let Some((address, fields)) = self.hosts.split(&host.fields) else {
                log::warn!("Host row without address in subnet {net}: {:?}", host.fields);
                continue;
            };
            if is_network_or_broadcast(&address, &net) {
                continue;
            }
            let inventory = &mut self.tree.inventory;
            inventory.add_host(node, &address)?;
            let vars = self.hosts.finish(fields);
            if !vars.is_empty() {
                inventory.set_hostvars(&address, vars);
            }
            count += 1;
        }
        log::debug!("Attached subnet {net} '{name}' with {count} hosts");
        Ok(Registration::Attached(count))
    }

    /// Hand back the finished inventory.
    pub fn finish(self) -> Inventory {
        self.tree.inventory
    }
}

fn is_network_or_broadcast(address: &str, net: &Ipv4) -> bool {
    match address.parse::<Ipv4Addr>() {
        Ok(ip) => ip == net.lo() || ip == net.hi(),
        Err(_) => false,
    }
}

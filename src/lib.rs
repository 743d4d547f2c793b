//! SolarWinds IPAM as an Ansible dynamic inventory.
//!
//! Groups, supernets and subnets fetched from IPAM become a group tree, hosts
//! hang off the subnet they live in, and the resulting document is cached
//! until the end of the day.

pub mod cache;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod ipam;
pub mod models;
pub mod output;
pub mod processing;

pub use error::{Error, Result};

use config::InventorySettings;
use ipam::IpamSource;
use models::{Inventory, RecordKind};
use processing::{GroupHierarchyBuilder, Registration, SubnetFilter, SubnetRegistrar};

/// Fetch one snapshot from `source` and build the inventory from it.
pub fn build_inventory(
    source: &mut dyn IpamSource,
    settings: &InventorySettings,
) -> Result<Inventory> {
    log::info!("#Start build_inventory()");
    let records = source.fetch_group_records()?;
    let (tree, supernets) = GroupHierarchyBuilder::new(settings).build(&records)?;

    let filter = SubnetFilter::from_settings(settings);
    let mut registrar = SubnetRegistrar::new(tree, supernets, filter, settings);

    let (mut attached, mut filtered, mut skipped) = (0, 0, 0);
    for subnet in records.iter().filter(|r| r.kind == RecordKind::Subnet) {
        match registrar.register(subnet, source)? {
            Registration::Attached(_) => attached += 1,
            Registration::Filtered(_) | Registration::ExcludedGroup => filtered += 1,
            Registration::Orphaned | Registration::Unaddressable => skipped += 1,
        }
    }

    let inventory = registrar.finish();
    log::info!(
        "Subnets: {attached} attached, {filtered} filtered, {skipped} skipped; {} hosts",
        inventory.host_count()
    );
    if skipped > 0 {
        log::warn!("{skipped} subnets could not be attached, see warnings above");
    }
    Ok(inventory)
}

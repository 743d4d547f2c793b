//! Inventory building logic.
//!
//! This module contains the hierarchy and filter engine:
//! - [`forest`] - Containment forests of include/exclude networks
//! - [`hierarchy`] - Group tree and supernet root resolution
//! - [`registrar`] - Subnet admission, attachment and host collection
//! - [`fields`] - Column selection and renaming tables

mod fields;
mod forest;
mod hierarchy;
mod registrar;

// Re-export public types and functions
pub use fields::{is_truthy, FieldSelection, HostFields};
pub use forest::FilterForest;
pub use hierarchy::{safe_name, GroupHierarchyBuilder, GroupTree, IndexEntry, SupernetRoots};
pub use registrar::{Registration, SubnetFilter, SubnetRegistrar, Triage};

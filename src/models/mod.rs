//! Domain models for the IPAM inventory.
//!
//! This module contains the core data structures used throughout the application:
//! - [`Ipv4`] - IPv4 network with CIDR notation support
//! - [`NetworkRecord`] and [`HostRecord`] - rows fetched from IPAM
//! - [`Inventory`] and [`GroupNode`] - the produced inventory document

mod inventory;
mod ipv4;
mod record;

// Re-export public types
pub use inventory::{GroupNode, Inventory, NodeId, META_NAME, ROOT_NAME, ROOT_NODE};
pub use ipv4::{Ipv4, MAX_LENGTH};
pub use record::{
    HostRecord, NetworkRecord, RecordId, RecordKind, Row, ADDRESS_COLUMN, ID_COLUMN, KIND_COLUMN,
    NAME_COLUMN, PARENT_COLUMN, PREFIX_COLUMN, REQUIRED_COLUMNS, ROOT_ID,
};

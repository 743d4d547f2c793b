//! IPAM backend access.
//!
//! This module handles all backend-related operations:
//! - [`client`] - SWIS JSON query client
//! - [`query`] - SWQL query text and pagination
//! - [`snapshot`] - Recorded snapshots for offline runs and tests, and recording them

mod client;
mod query;
mod snapshot;

use crate::error::Result;
use crate::models::{HostRecord, NetworkRecord, RecordId};

// Re-export public types and functions
pub use client::SwisClient;
pub use query::{fetch_pages, group_query, host_query, paged};
pub use snapshot::{RecordingSource, SnapshotSource};

/// The two backend operations the inventory pipeline consumes.
pub trait IpamSource {
    /// All Group, Supernet and Subnet rows, ordered by address.
    fn fetch_group_records(&mut self) -> Result<Vec<NetworkRecord>>;

    /// In-use IP nodes of one subnet, ordered by numeric address.
    fn fetch_host_records(&mut self, subnet_id: RecordId) -> Result<Vec<HostRecord>>;
}

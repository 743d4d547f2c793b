//! File-backed IPAM source.
//!
//! A snapshot is a recorded JSON dump of the rows the backend would return:
//!
//! ```json
//! { "records": [ {"SubnetId": 1, ...} ], "hosts": { "20": [ {"IPAddress": "10.2.0.5"} ] } }
//! ```

use super::IpamSource;
use crate::error::{Error, Result};
use crate::models::{HostRecord, NetworkRecord, RecordId, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
struct Snapshot {
    records: Vec<Row>,
    #[serde(default)]
    hosts: BTreeMap<RecordId, Vec<HostRecord>>,
}

/// IPAM source replaying a recorded snapshot.
#[derive(Debug, Default, Clone)]
pub struct SnapshotSource {
    snapshot: Snapshot,
    host_fetches: usize,
}

impl SnapshotSource {
    /// Load a snapshot file.
    pub fn from_file(path: &Path) -> Result<SnapshotSource> {
        let json = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        log::info!("Reading IPAM snapshot: {}", path.display());
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<SnapshotSource> {
        let mut deserializer = serde_json::Deserializer::from_str(json);
        let snapshot: Snapshot =
            serde_path_to_error::deserialize(&mut deserializer).map_err(|e| Error::Parse {
                context: "snapshot".to_string(),
                path: e.path().to_string(),
                message: e.inner().to_string(),
            })?;
        Ok(SnapshotSource {
            snapshot,
            host_fetches: 0,
        })
    }

    /// Add a raw record row.
    pub fn with_record(mut self, row: Row) -> Self {
        self.snapshot.records.push(row);
        self
    }

    /// Set the hosts returned for `subnet_id`.
    pub fn with_hosts(mut self, subnet_id: RecordId, hosts: Vec<HostRecord>) -> Self {
        self.snapshot.hosts.insert(subnet_id, hosts);
        self
    }

    /// How many host fetches were served.
    pub fn host_fetches(&self) -> usize {
        self.host_fetches
    }
}

impl IpamSource for SnapshotSource {
    fn fetch_group_records(&mut self) -> Result<Vec<NetworkRecord>> {
        self.snapshot
            .records
            .iter()
            .cloned()
            .map(NetworkRecord::from_row)
            .collect()
    }

    fn fetch_host_records(&mut self, subnet_id: RecordId) -> Result<Vec<HostRecord>> {
        self.host_fetches += 1;
        Ok(self
            .snapshot
            .hosts
            .get(&subnet_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Passes fetches through to another source and keeps every row it returns.
///
/// The recorded rows serialize to the snapshot format [`SnapshotSource`] reads.
pub struct RecordingSource<'a> {
    inner: &'a mut dyn IpamSource,
    snapshot: Snapshot,
}

impl<'a> RecordingSource<'a> {
    pub fn new(inner: &'a mut dyn IpamSource) -> RecordingSource<'a> {
        RecordingSource {
            inner,
            snapshot: Snapshot::default(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.snapshot)?)
    }
}

impl IpamSource for RecordingSource<'_> {
    fn fetch_group_records(&mut self) -> Result<Vec<NetworkRecord>> {
        let records = self.inner.fetch_group_records()?;
        self.snapshot.records = records.iter().map(|r| r.fields.clone()).collect();
        Ok(records)
    }

    fn fetch_host_records(&mut self, subnet_id: RecordId) -> Result<Vec<HostRecord>> {
        let hosts = self.inner.fetch_host_records(subnet_id)?;
        self.snapshot.hosts.insert(subnet_id, hosts.clone());
        Ok(hosts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordKind;

    #[test]
    fn test_read_snapshot_file() {
        let mut source =
            SnapshotSource::from_file(Path::new("src/tests/test_data/ipam_snapshot_01.json"))
                .expect("Error reading IPAM snapshot");
        let records = source.fetch_group_records().unwrap();
        assert!(!records.is_empty(), "Records should not be empty");
        assert_eq!(records[0].kind, RecordKind::Group);
        assert_eq!(records[0].display_name, "Europe");
        let hosts = source.fetch_host_records(200).unwrap();
        assert_eq!(hosts.len(), 5);
        assert!(source.fetch_host_records(9999).unwrap().is_empty());
        assert_eq!(source.host_fetches(), 2);
    }

    #[test]
    fn test_recording_replays_through_snapshot() {
        let mut source =
            SnapshotSource::from_file(Path::new("src/tests/test_data/ipam_snapshot_01.json"))
                .unwrap();
        let mut recorder = RecordingSource::new(&mut source);
        let records = recorder.fetch_group_records().unwrap();
        let hosts = recorder.fetch_host_records(200).unwrap();
        let json = recorder.to_json().unwrap();
        assert_eq!(source.host_fetches(), 1);

        let mut replay = SnapshotSource::from_json(&json).unwrap();
        assert_eq!(replay.fetch_group_records().unwrap(), records);
        assert_eq!(replay.fetch_host_records(200).unwrap(), hosts);
        // only fetched subnets are recorded
        assert!(replay.fetch_host_records(202).unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_parse_error_path() {
        let err = SnapshotSource::from_json(r#"{"records": [], "hosts": {"20": 5}}"#).unwrap_err();
        assert!(matches!(err, Error::Parse { ref path, .. } if path.starts_with("hosts")));
    }
}

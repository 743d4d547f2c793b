//! IPAM record data models.
//!
//! Rows come back from the backend as JSON objects keyed by column name. The
//! handful of columns the hierarchy needs are lifted into typed fields; the
//! full row is kept so configured variables can be projected from it.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of a Group/Supernet/Subnet row.
pub type RecordId = i64;

/// Parent id used by top-level rows.
pub const ROOT_ID: RecordId = 0;

/// Row id column.
pub const ID_COLUMN: &str = "SubnetId";
/// Parent row id column.
pub const PARENT_COLUMN: &str = "ParentId";
/// Record kind column.
pub const KIND_COLUMN: &str = "GroupTypeText";
/// Display name column.
pub const NAME_COLUMN: &str = "DisplayName";
/// Network address column.
pub const ADDRESS_COLUMN: &str = "Address";
/// Prefix length column.
pub const PREFIX_COLUMN: &str = "CIDR";

/// Columns every group query must return.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    ID_COLUMN,
    PARENT_COLUMN,
    KIND_COLUMN,
    NAME_COLUMN,
    ADDRESS_COLUMN,
    PREFIX_COLUMN,
];

/// A raw result row.
pub type Row = Map<String, Value>;

/// Kind of a network record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKind {
    Group,
    Supernet,
    Subnet,
    /// Anything else the backend knows about (IPv6 prefixes, DHCP scopes, ...).
    Other(String),
}

impl From<&str> for RecordKind {
    fn from(s: &str) -> Self {
        match s {
            "Group" => RecordKind::Group,
            "Supernet" => RecordKind::Supernet,
            "Subnet" => RecordKind::Subnet,
            other => RecordKind::Other(other.to_string()),
        }
    }
}

/// One Group, Supernet or Subnet row.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkRecord {
    pub id: RecordId,
    pub parent_id: RecordId,
    pub kind: RecordKind,
    pub display_name: String,
    pub address: Option<String>,
    pub prefix_length: Option<u8>,
    /// The complete row, typed columns included.
    pub fields: Row,
}

impl NetworkRecord {
    /// Lift the typed columns out of a raw row.
    ///
    /// A null or missing parent id means the record hangs off the root.
    pub fn from_row(row: Row) -> Result<NetworkRecord> {
        let id = row
            .get(ID_COLUMN)
            .and_then(Value::as_i64)
            .ok_or_else(|| column_error(&row, ID_COLUMN))?;
        let parent_id = match row.get(PARENT_COLUMN) {
            None | Some(Value::Null) => ROOT_ID,
            Some(v) => v.as_i64().ok_or_else(|| column_error(&row, PARENT_COLUMN))?,
        };
        let kind = row
            .get(KIND_COLUMN)
            .and_then(Value::as_str)
            .map(RecordKind::from)
            .ok_or_else(|| column_error(&row, KIND_COLUMN))?;
        let display_name = row
            .get(NAME_COLUMN)
            .and_then(Value::as_str)
            .ok_or_else(|| column_error(&row, NAME_COLUMN))?
            .to_string();
        let address = row
            .get(ADDRESS_COLUMN)
            .and_then(Value::as_str)
            .map(str::to_string);
        let prefix_length = row
            .get(PREFIX_COLUMN)
            .and_then(Value::as_u64)
            .and_then(|p| u8::try_from(p).ok());

        Ok(NetworkRecord {
            id,
            parent_id,
            kind,
            display_name,
            address,
            prefix_length,
            fields: row,
        })
    }
}

fn column_error(row: &Row, column: &str) -> Error {
    Error::Parse {
        context: "network record".to_string(),
        path: column.to_string(),
        message: format!(
            "missing or mistyped column in row {}",
            Value::Object(row.clone())
        ),
    }
}

/// One IP node row returned for a subnet.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct HostRecord {
    pub fields: Row,
}

impl From<Row> for HostRecord {
    fn from(fields: Row) -> Self {
        HostRecord { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Row {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_from_row_subnet() {
        let rec = NetworkRecord::from_row(row(json!({
            "SubnetId": 42, "ParentId": 7, "GroupTypeText": "Subnet",
            "DisplayName": "Office LAN", "Address": "10.2.0.0", "CIDR": 24,
            "VLAN": "100"
        })))
        .unwrap();
        assert_eq!(rec.id, 42);
        assert_eq!(rec.parent_id, 7);
        assert_eq!(rec.kind, RecordKind::Subnet);
        assert_eq!(rec.address.as_deref(), Some("10.2.0.0"));
        assert_eq!(rec.prefix_length, Some(24));
        assert_eq!(rec.fields["VLAN"], json!("100"));
        assert!(!rec.fields.contains_key("Comments"));
    }

    #[test]
    fn test_from_row_group_without_parent() {
        let rec = NetworkRecord::from_row(row(json!({
            "SubnetId": 3, "ParentId": null, "GroupTypeText": "Group",
            "DisplayName": "Europe", "Address": null, "CIDR": null
        })))
        .unwrap();
        assert_eq!(rec.parent_id, ROOT_ID);
        assert_eq!(rec.kind, RecordKind::Group);
        assert!(rec.address.is_none());
        assert!(rec.prefix_length.is_none());
    }

    #[test]
    fn test_from_row_other_kind() {
        let rec = NetworkRecord::from_row(row(json!({
            "SubnetId": 5, "ParentId": 0, "GroupTypeText": "IPv6 Global Prefix",
            "DisplayName": "v6"
        })))
        .unwrap();
        assert_eq!(rec.kind, RecordKind::Other("IPv6 Global Prefix".to_string()));
    }

    #[test]
    fn test_from_row_missing_id() {
        let err = NetworkRecord::from_row(row(json!({
            "GroupTypeText": "Group", "DisplayName": "x"
        })))
        .unwrap_err();
        assert!(err.to_string().contains("SubnetId"));
    }
}

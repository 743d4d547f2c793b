//! Field selection and renaming.
//!
//! Which columns become which output keys is fixed by configuration. These
//! tables are built once per run and applied to every row.

use crate::config::InventorySettings;
use crate::models::Row;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Ordered list of columns to copy out of a row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSelection {
    columns: Vec<String>,
}

impl FieldSelection {
    pub fn new(columns: &[String]) -> FieldSelection {
        FieldSelection {
            columns: columns.to_vec(),
        }
    }

    /// Copy the selected columns in selection order; absent columns become `null`.
    pub fn project(&self, row: &Row) -> Map<String, Value> {
        self.columns
            .iter()
            .map(|c| (c.clone(), row.get(c).cloned().unwrap_or(Value::Null)))
            .collect()
    }
}

/// How IP node rows turn into host variables.
#[derive(Debug, Clone, PartialEq)]
pub struct HostFields {
    select: FieldSelection,
    rename: BTreeMap<String, String>,
    address_field: String,
}

impl HostFields {
    pub fn new(settings: &InventorySettings) -> HostFields {
        HostFields {
            select: FieldSelection::new(&settings.host_vars),
            rename: settings.host_var_map.clone(),
            address_field: settings.address_field.clone(),
        }
    }

    /// Project a row and take its address out.
    ///
    /// Returns `None` when the row carries no textual address.
    pub fn split(&self, row: &Row) -> Option<(String, Map<String, Value>)> {
        let mut address = None;
        let fields = self
            .select
            .project(row)
            .into_iter()
            .filter_map(|(k, v)| {
                if k == self.address_field {
                    address = Some(v);
                    None
                } else {
                    Some((k, v))
                }
            })
            .collect();
        match address {
            Some(Value::String(address)) => Some((address, fields)),
            _ => None,
        }
    }

    /// Rename fields through the map and drop empty values.
    pub fn finish(&self, fields: Map<String, Value>) -> Map<String, Value> {
        fields
            .into_iter()
            .filter(|(_, v)| is_truthy(v))
            .map(|(k, v)| match self.rename.get(&k) {
                Some(renamed) => (renamed.clone(), v),
                None => (k, v),
            })
            .collect()
    }
}

/// `null`, `false`, zero and empty strings/arrays/objects count as empty.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

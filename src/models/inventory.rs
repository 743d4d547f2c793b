//! Inventory document model.
//!
//! Groups and subnets live in a flat arena addressed by [`NodeId`]. A node is
//! created as a nameless placeholder the first time something names it as a
//! parent and receives its name and variables once its own record is seen.

use crate::error::{Error, Result};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// Index of a node in the [`Inventory`] arena.
pub type NodeId = usize;

/// The distinguished top-level group.
pub const ROOT_NODE: NodeId = 0;
/// Name of the top-level group.
pub const ROOT_NAME: &str = "all";
/// Name of the metadata section.
pub const META_NAME: &str = "_meta";

/// A group or subnet entry of the inventory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupNode {
    /// Unique safe name, `None` while the node is only a placeholder.
    pub name: Option<String>,
    /// Names of child groups and subnets in attachment order.
    pub children: Vec<String>,
    /// Variables exposed to the automation tool.
    pub vars: Option<Map<String, Value>>,
    /// Host addresses, present on subnet nodes only.
    pub hosts: Option<Vec<String>>,
}

impl GroupNode {
    pub fn is_placeholder(&self) -> bool {
        self.name.is_none()
    }
}

impl Serialize for GroupNode {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        if let Some(hosts) = &self.hosts {
            map.serialize_entry("hosts", hosts)?;
        }
        if !self.children.is_empty() {
            map.serialize_entry("children", &self.children)?;
        }
        if let Some(vars) = &self.vars {
            map.serialize_entry("vars", vars)?;
        }
        map.end()
    }
}

/// The whole inventory: group arena, name registry and host variables.
#[derive(Debug, Clone)]
pub struct Inventory {
    nodes: Vec<GroupNode>,
    names: HashMap<String, NodeId>,
    /// Named nodes in the order they were named.
    order: Vec<NodeId>,
    addresses: HashSet<String>,
    hostvars: Map<String, Value>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new()
    }
}

impl Inventory {
    /// An inventory holding only the root group.
    pub fn new() -> Inventory {
        Inventory {
            nodes: vec![GroupNode {
                name: Some(ROOT_NAME.to_string()),
                ..Default::default()
            }],
            names: HashMap::new(),
            order: Vec::new(),
            addresses: HashSet::new(),
            hostvars: Map::new(),
        }
    }

    /// Allocate a nameless node.
    pub fn add_placeholder(&mut self) -> NodeId {
        self.nodes.push(GroupNode::default());
        self.nodes.len() - 1
    }

    pub fn node(&self, id: NodeId) -> &GroupNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut GroupNode {
        &mut self.nodes[id]
    }

    /// True if `name` is already used by a node or a reserved section.
    pub fn is_taken(&self, name: &str) -> bool {
        name == ROOT_NAME || name == META_NAME || self.names.contains_key(name)
    }

    /// Look up a named node.
    pub fn find(&self, name: &str) -> Option<&GroupNode> {
        if name == ROOT_NAME {
            return Some(&self.nodes[ROOT_NODE]);
        }
        self.names.get(name).map(|&id| &self.nodes[id])
    }

    /// Give `id` its unique name.
    ///
    /// A node is named once; naming it again counts as a duplicate.
    pub fn claim_name(&mut self, id: NodeId, name: &str, display_name: &str) -> Result<()> {
        if self.is_taken(name) || !self.nodes[id].is_placeholder() {
            return Err(Error::DuplicateName {
                name: name.to_string(),
                display_name: display_name.to_string(),
            });
        }
        self.names.insert(name.to_string(), id);
        self.order.push(id);
        self.nodes[id].name = Some(name.to_string());
        Ok(())
    }

    pub fn add_child(&mut self, parent: NodeId, name: &str) {
        self.nodes[parent].children.push(name.to_string());
    }

    /// Append a host address to a subnet node.
    ///
    /// Addresses are unique across the whole inventory.
    pub fn add_host(&mut self, id: NodeId, address: &str) -> Result<()> {
        if !self.addresses.insert(address.to_string()) {
            return Err(Error::DuplicateAddress(address.to_string()));
        }
        self.nodes[id]
            .hosts
            .get_or_insert_with(Vec::new)
            .push(address.to_string());
        Ok(())
    }

    pub fn set_hostvars(&mut self, address: &str, vars: Map<String, Value>) {
        self.hostvars.insert(address.to_string(), Value::Object(vars));
    }

    pub fn hostvars(&self) -> &Map<String, Value> {
        &self.hostvars
    }

    /// Number of named groups and subnets, root excluded.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of distinct host addresses.
    pub fn host_count(&self) -> usize {
        self.addresses.len()
    }

    /// Named nodes in creation order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &GroupNode)> {
        self.order.iter().filter_map(|&id| {
            let node = &self.nodes[id];
            node.name.as_deref().map(|name| (name, node))
        })
    }
}

struct Meta<'a> {
    hostvars: &'a Map<String, Value>,
}

impl Serialize for Meta<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("hostvars", self.hostvars)?;
        map.end()
    }
}

impl Serialize for Inventory {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.order.len() + 2))?;
        map.serialize_entry(
            META_NAME,
            &Meta {
                hostvars: &self.hostvars,
            },
        )?;
        map.serialize_entry(ROOT_NAME, &self.nodes[ROOT_NODE])?;
        for (name, node) in self.groups() {
            map.serialize_entry(name, node)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_claim_name_rejects_duplicates() {
        let mut inv = Inventory::new();
        let a = inv.add_placeholder();
        let b = inv.add_placeholder();
        inv.claim_name(a, "Europe/Paris", "Europe /Paris").unwrap();
        let err = inv.claim_name(b, "Europe/Paris", "Europe/Paris").unwrap_err();
        assert!(matches!(err, Error::DuplicateName { .. }));
        assert!(inv.node(b).is_placeholder());
    }

    #[test]
    fn test_reserved_names_are_taken() {
        let mut inv = Inventory::new();
        let a = inv.add_placeholder();
        assert!(inv.claim_name(a, "all", "all").is_err());
        assert!(inv.claim_name(a, "_meta", "_meta").is_err());
    }

    #[test]
    fn test_add_host_rejects_duplicate_address() {
        let mut inv = Inventory::new();
        let a = inv.add_placeholder();
        let b = inv.add_placeholder();
        inv.add_host(a, "10.0.0.1").unwrap();
        let err = inv.add_host(b, "10.0.0.1").unwrap_err();
        assert!(matches!(err, Error::DuplicateAddress(addr) if addr == "10.0.0.1"));
        assert_eq!(inv.host_count(), 1);
    }

    #[test]
    fn test_serialize_document_shape() {
        let mut inv = Inventory::new();
        let g = inv.add_placeholder();
        inv.claim_name(g, "Europe", "Europe").unwrap();
        inv.node_mut(g).vars = Some(Map::new());
        inv.add_child(ROOT_NODE, "Europe");
        let s = inv.add_placeholder();
        inv.claim_name(s, "Paris", "Paris").unwrap();
        inv.node_mut(s).vars = Some(json!({"VLAN": "10"}).as_object().cloned().unwrap());
        inv.node_mut(s).hosts = Some(Vec::new());
        inv.add_child(g, "Paris");
        inv.add_host(s, "10.2.0.5").unwrap();
        inv.set_hostvars("10.2.0.5", json!({"name": "srv"}).as_object().cloned().unwrap());
        // placeholders never show up
        inv.add_placeholder();

        let out = serde_json::to_string(&inv).unwrap();
        assert_eq!(
            out,
            r#"{"_meta":{"hostvars":{"10.2.0.5":{"name":"srv"}}},"all":{"children":["Europe"]},"Europe":{"children":["Paris"],"vars":{}},"Paris":{"hosts":["10.2.0.5"],"vars":{"VLAN":"10"}}}"#
        );
    }
}

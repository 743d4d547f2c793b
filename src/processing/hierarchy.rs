//! Group and supernet hierarchy.
//!
//! Turns the flat Group rows into a tree of named inventory groups and
//! collapses every supernet chain onto the record it ultimately hangs off.

use super::fields::FieldSelection;
use crate::config::InventorySettings;
use crate::error::{Error, Result};
use crate::models::{Inventory, NetworkRecord, NodeId, RecordId, RecordKind, ROOT_ID, ROOT_NODE};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// Normalized group name: `" /"` collapses to `"/"`, nothing else changes.
pub fn safe_name(display_name: &str) -> String {
    display_name.replace(" /", "/")
}

/// Where a record id lives in the inventory.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub node: NodeId,
    /// Internal columns, never exported.
    pub internal: Map<String, Value>,
}

/// Inventory under construction plus the id index used to attach children.
#[derive(Debug, Clone)]
pub struct GroupTree {
    pub inventory: Inventory,
    index: HashMap<RecordId, IndexEntry>,
    /// Groups left out by name.
    excluded: HashSet<RecordId>,
}

impl Default for GroupTree {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupTree {
    /// A tree holding only the root group, indexed under [`ROOT_ID`].
    pub fn new() -> GroupTree {
        let mut index = HashMap::new();
        index.insert(
            ROOT_ID,
            IndexEntry {
                node: ROOT_NODE,
                internal: Map::new(),
            },
        );
        GroupTree {
            inventory: Inventory::new(),
            index,
            excluded: HashSet::new(),
        }
    }

    pub fn get(&self, id: RecordId) -> Option<&IndexEntry> {
        self.index.get(&id)
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.index.contains_key(&id)
    }

    /// Node of `id`, allocating a placeholder the first time it is referenced.
    pub fn entry(&mut self, id: RecordId) -> &mut IndexEntry {
        let inventory = &mut self.inventory;
        self.index.entry(id).or_insert_with(|| IndexEntry {
            node: inventory.add_placeholder(),
            internal: Map::new(),
        })
    }

    /// Index a freshly created node under `id`.
    pub fn insert(&mut self, id: RecordId, entry: IndexEntry) {
        self.index.insert(id, entry);
    }

    /// True if `id` is a group left out by name.
    pub fn is_excluded(&self, id: RecordId) -> bool {
        self.excluded.contains(&id)
    }
}

/// Supernet id to the id its chain of supernets ultimately hangs off.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupernetRoots {
    roots: HashMap<RecordId, RecordId>,
}

impl SupernetRoots {
    /// Resolve every supernet in a `{id -> parent}` map.
    ///
    /// Walks each chain iteratively and fails on a cycle instead of looping.
    pub fn resolve(parents: &HashMap<RecordId, RecordId>) -> Result<SupernetRoots> {
        let mut roots = HashMap::with_capacity(parents.len());
        for &id in parents.keys() {
            let mut visited = HashSet::from([id]);
            let mut current = id;
            while let Some(&parent) = parents.get(&current) {
                if !visited.insert(parent) {
                    return Err(Error::SupernetCycle(id));
                }
                current = parent;
            }
            roots.insert(id, current);
        }
        Ok(SupernetRoots { roots })
    }

    /// Root of a supernet, `None` if `id` is not a supernet.
    pub fn root(&self, id: RecordId) -> Option<RecordId> {
        self.roots.get(&id).copied()
    }

    pub(crate) fn len(&self) -> usize {
        self.roots.len()
    }
}

/// Builds the group tree from Group rows.
#[derive(Debug, Clone)]
pub struct GroupHierarchyBuilder {
    excluded: HashSet<String>,
    group_vars: FieldSelection,
    internal: FieldSelection,
}

impl GroupHierarchyBuilder {
    pub fn new(settings: &InventorySettings) -> GroupHierarchyBuilder {
        GroupHierarchyBuilder {
            excluded: settings.exclude.clone(),
            group_vars: FieldSelection::new(&settings.group_vars),
            internal: FieldSelection::new(&settings.internal),
        }
    }

    /// Build the group tree and supernet roots from one snapshot of records.
    pub fn build(&self, records: &[NetworkRecord]) -> Result<(GroupTree, SupernetRoots)> {
        let mut tree = GroupTree::new();

        for record in records.iter().filter(|r| r.kind == RecordKind::Group) {
            if self.excluded.contains(&record.display_name) {
                log::debug!("Excluding group '{}'", record.display_name);
                tree.excluded.insert(record.id);
                continue;
            }
            self.add_group(&mut tree, record)?;
        }

        let parents: HashMap<RecordId, RecordId> = records
            .iter()
            .filter(|r| r.kind == RecordKind::Supernet)
            .map(|r| (r.id, r.parent_id))
            .collect();
        let supernets = SupernetRoots::resolve(&parents)?;

        log::info!(
            "Built {} groups, {} supernets resolved",
            tree.inventory.len(),
            supernets.len()
        );
        Ok((tree, supernets))
    }

    fn add_group(&self, tree: &mut GroupTree, record: &NetworkRecord) -> Result<()> {
        let name = safe_name(&record.display_name);
        if tree.inventory.is_taken(&name) {
            return Err(Error::DuplicateName {
                name,
                display_name: record.display_name.clone(),
            });
        }

        let entry = tree.entry(record.id);
        entry.internal.extend(self.internal.project(&record.fields));
        let node = entry.node;
        tree.inventory.node_mut(node).vars = Some(self.group_vars.project(&record.fields));
        tree.inventory.claim_name(node, &name, &record.display_name)?;

        let parent = tree.entry(record.parent_id).node;
        tree.inventory.add_child(parent, &name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ROOT_NAME;
    use serde_json::json;

    fn record(id: i64, parent: i64, kind: &str, name: &str) -> NetworkRecord {
        NetworkRecord::from_row(
            json!({
                "SubnetId": id, "ParentId": parent, "GroupTypeText": kind,
                "DisplayName": name, "Comments": format!("{name} comment"), "Location": "HQ"
            })
            .as_object()
            .cloned()
            .unwrap(),
        )
        .unwrap()
    }

    fn settings() -> InventorySettings {
        InventorySettings {
            group_vars: vec!["Comments".to_string()],
            internal: vec!["Location".to_string()],
            exclude: HashSet::from(["Lab".to_string()]),
            ..Default::default()
        }
    }

    fn children<'a>(tree: &'a GroupTree, name: &str) -> Vec<&'a str> {
        tree.inventory
            .find(name)
            .unwrap()
            .children
            .iter()
            .map(String::as_str)
            .collect()
    }

    #[test]
    fn test_safe_name() {
        assert_eq!(safe_name("Europe /Paris"), "Europe/Paris");
        assert_eq!(safe_name("Europe / Paris"), "Europe/ Paris");
        assert_eq!(safe_name("A B-c_d"), "A B-c_d");
    }

    #[test]
    fn test_build_parent_before_child() {
        let records = vec![
            record(1, 0, "Group", "Europe"),
            record(2, 1, "Group", "France"),
            record(3, 1, "Group", "Germany"),
        ];
        let (tree, _) = GroupHierarchyBuilder::new(&settings()).build(&records).unwrap();
        assert_eq!(children(&tree, ROOT_NAME), vec!["Europe"]);
        assert_eq!(children(&tree, "Europe"), vec!["France", "Germany"]);
        let vars = tree.inventory.find("France").unwrap().vars.clone().unwrap();
        assert_eq!(vars["Comments"], json!("France comment"));
        assert_eq!(tree.get(2).unwrap().internal["Location"], json!("HQ"));
    }

    #[test]
    fn test_build_child_before_parent_fills_placeholder() {
        let records = vec![
            record(2, 1, "Group", "France"),
            record(1, 0, "Group", "Europe"),
        ];
        let (tree, _) = GroupHierarchyBuilder::new(&settings()).build(&records).unwrap();
        assert_eq!(children(&tree, "Europe"), vec!["France"]);
        assert_eq!(children(&tree, ROOT_NAME), vec!["Europe"]);
        assert!(tree.inventory.find("Europe").unwrap().vars.is_some());
    }

    #[test]
    fn test_build_missing_parent_stays_placeholder() {
        let records = vec![record(2, 99, "Group", "Orphan")];
        let (tree, _) = GroupHierarchyBuilder::new(&settings()).build(&records).unwrap();
        assert!(tree.contains(99));
        let placeholder = tree.inventory.node(tree.get(99).unwrap().node);
        assert!(placeholder.is_placeholder());
        assert_eq!(placeholder.children, vec!["Orphan".to_string()]);
        assert!(children(&tree, ROOT_NAME).is_empty());
        assert_eq!(tree.inventory.len(), 1);
    }

    #[test]
    fn test_build_skips_excluded() {
        let records = vec![
            record(1, 0, "Group", "Lab"),
            record(2, 0, "Group", "Prod"),
        ];
        let (tree, _) = GroupHierarchyBuilder::new(&settings()).build(&records).unwrap();
        assert!(tree.inventory.find("Lab").is_none());
        assert_eq!(children(&tree, ROOT_NAME), vec!["Prod"]);
    }

    #[test]
    fn test_build_duplicate_safe_name() {
        let records = vec![
            record(1, 0, "Group", "Europe /Paris"),
            record(2, 0, "Group", "Europe/Paris"),
        ];
        let err = GroupHierarchyBuilder::new(&settings())
            .build(&records)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateName { ref name, .. } if name == "Europe/Paris"));
    }

    #[test]
    fn test_supernet_chain() {
        let parents = HashMap::from([(10, 11), (11, 12)]);
        let roots = SupernetRoots::resolve(&parents).unwrap();
        assert_eq!(roots.root(10), Some(12));
        assert_eq!(roots.root(11), Some(12));
        assert_eq!(roots.root(12), None);
    }

    #[test]
    fn test_supernet_cycle_is_an_error() {
        let parents = HashMap::from([(10, 11), (11, 10), (12, 10)]);
        assert!(matches!(
            SupernetRoots::resolve(&parents),
            Err(Error::SupernetCycle(_))
        ));
        let parents = HashMap::from([(5, 5)]);
        assert!(matches!(
            SupernetRoots::resolve(&parents),
            Err(Error::SupernetCycle(5))
        ));
    }

    #[test]
    fn test_build_collects_supernets() {
        let records = vec![
            record(1, 0, "Group", "Europe"),
            record(10, 1, "Supernet", "10/8"),
            record(11, 10, "Supernet", "10.1/16"),
        ];
        let (_, roots) = GroupHierarchyBuilder::new(&settings()).build(&records).unwrap();
        assert_eq!(roots.root(11), Some(1));
        assert_eq!(roots.root(10), Some(1));
    }
}

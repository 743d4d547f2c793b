//! Containment forests of include/exclude networks.
//!
//! Networks are nested so every node lies inside its parent. Matching walks
//! children before parents, so the most specific covering network wins.

use crate::models::Ipv4;
use itertools::Itertools;

#[derive(Debug, Clone, PartialEq)]
struct ForestNode {
    net: Ipv4,
    children: Vec<usize>,
}

/// Forest of networks nested by containment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterForest {
    nodes: Vec<ForestNode>,
    roots: Vec<usize>,
}

impl FilterForest {
    /// Build the forest from networks in any order.
    ///
    /// Networks are normalized and visited in ascending (address, prefix)
    /// order, so every container is inserted before what it contains. Each
    /// new network is placed under the first entry of the scan list that
    /// contains it and then put just ahead of that entry, so deeper
    /// containers are always tried before shallower ones.
    pub fn build(networks: &[Ipv4]) -> FilterForest {
        let mut forest = FilterForest::default();
        let mut scan: Vec<usize> = Vec::new();

        for net in networks.iter().map(Ipv4::network).sorted() {
            let id = forest.nodes.len();
            forest.nodes.push(ForestNode {
                net,
                children: Vec::new(),
            });
            match scan
                .iter()
                .position(|&other| net.subnet_of(&forest.nodes[other].net))
            {
                Some(i) => {
                    let parent = scan[i];
                    forest.nodes[parent].children.push(id);
                    scan.insert(i, id);
                }
                None => {
                    forest.roots.push(id);
                    scan.push(id);
                }
            }
        }
        forest
    }

    /// Most specific network in the forest containing `net`.
    pub fn find(&self, net: &Ipv4) -> Option<Ipv4> {
        self.find_in(&self.roots, net)
    }

    fn find_in(&self, level: &[usize], net: &Ipv4) -> Option<Ipv4> {
        for &id in level {
            let node = &self.nodes[id];
            if let Some(m) = self.find_in(&node.children, net) {
                return Some(m);
            }
            if net.subnet_of(&node.net) {
                return Some(node.net);
            }
        }
        None
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Top-level networks in ascending order.
    #[cfg(test)]
    fn roots(&self) -> Vec<Ipv4> {
        self.roots.iter().map(|&id| self.nodes[id].net).collect()
    }

    /// Networks directly nested under `net`.
    #[cfg(test)]
    fn children_of(&self, net: &Ipv4) -> Vec<Ipv4> {
        self.nodes
            .iter()
            .find(|n| n.net == *net)
            .map(|n| n.children.iter().map(|&c| self.nodes[c].net).collect())
            .unwrap_or_default()
    }
}

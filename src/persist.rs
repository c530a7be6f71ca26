//! JSON form of a full engine state: configuration, tree and clusters.
//!
//! Leaves carry the clusters themselves together with their store position, so a
//! reload rebuilds both the tree and the flat cluster list from one document.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::cluster::{Cluster, ClusterId, ClusterStore, LineId};
use crate::config::DrainConfig;
use crate::error::StateError;
use crate::token::WILDCARD;
use crate::tree::{Children, Node, NodeKey, PrefixTree};

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct StateRecord {
    pub config: DrainConfig,
    pub tree: NodeRecord,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct NodeRecord {
    depth: usize,
    key: Option<KeyRecord>,
    children: ChildrenRecord,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum KeyRecord {
    Length(u64),
    Token(String),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ChildrenRecord {
    Branch(BTreeMap<String, NodeRecord>),
    Leaf(Vec<ClusterRecord>),
}

#[derive(Debug, Serialize, Deserialize)]
struct ClusterRecord {
    id: usize,
    template: Vec<String>,
    member_ids: Vec<LineId>,
}

pub(crate) fn snapshot(config: &DrainConfig, tree: &PrefixTree, store: &ClusterStore) -> StateRecord {
    let children = tree
        .roots
        .iter()
        .map(|(len, node)| (len.to_string(), node_record(node, store)))
        .collect();
    StateRecord {
        config: config.clone(),
        tree: NodeRecord { depth: 0, key: None, children: ChildrenRecord::Branch(children) },
    }
}

fn node_record(node: &Node, store: &ClusterStore) -> NodeRecord {
    let key = match &node.key {
        NodeKey::Length(n) => KeyRecord::Length(*n as u64),
        NodeKey::Token(t) => KeyRecord::Token(t.clone()),
    };
    let children = match &node.children {
        Children::Branch(map) => ChildrenRecord::Branch(
            map.iter().map(|(k, child)| (k.clone(), node_record(child, store))).collect(),
        ),
        Children::Leaf(ids) => ChildrenRecord::Leaf(
            ids.iter()
                .filter_map(|&id| {
                    store.get(id).map(|c| ClusterRecord {
                        id: id.index(),
                        template: c.template().to_vec(),
                        member_ids: c.member_ids().to_vec(),
                    })
                })
                .collect(),
        ),
    };
    NodeRecord { depth: node.depth, key: Some(key), children }
}

/// Parses and checks a saved state. Nothing is built unless the whole document is
/// consistent.
pub(crate) fn restore(json: &str) -> Result<(DrainConfig, PrefixTree, ClusterStore), StateError> {
    let record: StateRecord = serde_json::from_str(json).map_err(|e| StateError::malformed(e.to_string()))?;
    record.config.validate()?;

    let root = record.tree;
    if root.depth != 0 {
        return Err(StateError::malformed(format!("root node has depth {}", root.depth)));
    }
    if root.key.is_some() {
        return Err(StateError::malformed("root node carries a key"));
    }
    let ChildrenRecord::Branch(lengths) = root.children else {
        return Err(StateError::malformed("root node holds clusters instead of length nodes"));
    };

    let mut restorer = Restorer {
        tree: PrefixTree::new(record.config.max_node_depth(), record.config.max_children),
        clusters: BTreeMap::new(),
        lines: HashSet::new(),
        path: Vec::new(),
    };
    let mut roots = Vec::with_capacity(lengths.len());
    for (k, child) in lengths {
        let len: usize = k
            .parse()
            .map_err(|_| StateError::malformed(format!("length key {k:?} is not an integer")))?;
        roots.push((len, restorer.node(child, 1, NodeKey::Length(len), len)?));
    }

    let mut clusters = Vec::with_capacity(restorer.clusters.len());
    for (expected, (id, cluster)) in restorer.clusters.into_iter().enumerate() {
        if id != expected {
            return Err(StateError::malformed(format!("cluster id {expected} is missing")));
        }
        clusters.push(cluster);
    }

    let mut tree = restorer.tree;
    tree.roots.extend(roots);
    Ok((record.config, tree, ClusterStore::from_clusters(clusters)))
}

struct Restorer {
    tree: PrefixTree,
    clusters: BTreeMap<usize, Cluster>,
    lines: HashSet<LineId>,
    /// Token keys from the depth-1 node down to the node being restored.
    path: Vec<String>,
}

impl Restorer {
    fn node(&mut self, rec: NodeRecord, depth: usize, key: NodeKey, len: usize) -> Result<Node, StateError> {
        if rec.depth != depth {
            return Err(StateError::malformed(format!("node {key:?} records depth {}, expected {depth}", rec.depth)));
        }
        let key_matches = match (&key, &rec.key) {
            (NodeKey::Length(n), Some(KeyRecord::Length(m))) => *n as u64 == *m,
            (NodeKey::Token(t), Some(KeyRecord::Token(s))) => t == s,
            _ => false,
        };
        if !key_matches {
            return Err(StateError::malformed(format!("node at depth {depth} has key {:?}, expected {key:?}", rec.key)));
        }

        let leaf = self.tree.is_leaf_depth(depth, len);
        let children = match (leaf, rec.children) {
            (true, ChildrenRecord::Leaf(entries)) => {
                let mut ids = Vec::with_capacity(entries.len());
                for entry in entries {
                    if entry.template.len() != len {
                        return Err(StateError::malformed(format!(
                            "cluster {} has a template of length {} under length {len}",
                            entry.id,
                            entry.template.len()
                        )));
                    }
                    if entry.member_ids.is_empty() {
                        return Err(StateError::malformed(format!("cluster {} has no members", entry.id)));
                    }
                    if let Some(pos) = self
                        .path
                        .iter()
                        .zip(&entry.template)
                        .position(|(key, tok)| key != WILDCARD && key != tok)
                    {
                        return Err(StateError::malformed(format!(
                            "cluster {} is filed under {:?} at position {pos} but its template has {:?}",
                            entry.id, self.path[pos], entry.template[pos]
                        )));
                    }
                    if let Some(line) = entry.member_ids.iter().find(|&&line| !self.lines.insert(line)) {
                        return Err(StateError::malformed(format!("line {line} is a member more than once")));
                    }
                    if self.clusters.contains_key(&entry.id) {
                        return Err(StateError::malformed(format!("cluster id {} appears twice", entry.id)));
                    }
                    ids.push(ClusterId(entry.id));
                    self.clusters.insert(entry.id, Cluster::from_parts(entry.template, entry.member_ids));
                }
                Children::Leaf(ids)
            }
            (false, ChildrenRecord::Branch(map)) => {
                if map.len() > self.tree.max_children() {
                    return Err(StateError::malformed(format!(
                        "node {key:?} at depth {depth} has {} children, limit is {}",
                        map.len(),
                        self.tree.max_children()
                    )));
                }
                let mut children = ahash::AHashMap::with_capacity(map.len());
                for (k, child) in map {
                    self.path.push(k.clone());
                    let node = self.node(child, depth + 1, NodeKey::Token(k.clone()), len);
                    self.path.pop();
                    children.insert(k, node?);
                }
                Children::Branch(children)
            }
            (true, ChildrenRecord::Branch(_)) => {
                return Err(StateError::malformed(format!("expected clusters at depth {depth}, found child nodes")));
            }
            (false, ChildrenRecord::Leaf(_)) => {
                return Err(StateError::malformed(format!("expected child nodes at depth {depth}, found clusters")));
            }
        };
        Ok(Node { depth, key, children })
    }
}

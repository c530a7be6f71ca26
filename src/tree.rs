//! Fixed-depth prefix tree indexing clusters by token count and leading tokens.
//!
//! The root maps a sequence length to a depth-1 node. Below it, token-keyed branch
//! nodes narrow the search one token per layer until the leaf layer, where a node
//! holds the handles of every cluster that reached it. Whether a node is a branch or
//! a leaf is decided once, from its depth, when the node is created.
//!
//! A line with fewer tokens than the tree depth, blank lines included, is filed in a
//! leaf right after its last token, so such lines can still merge into one cluster.

use std::fmt::Write as _;

use ahash::AHashMap;
use itertools::Itertools;

use crate::cluster::{ClusterId, ClusterStore};
use crate::matcher::fast_match;
use crate::token::{is_numeric, WILDCARD};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKey {
    Length(usize),
    Token(String),
}

#[derive(Debug, Clone)]
pub enum Children {
    Branch(AHashMap<String, Node>),
    Leaf(Vec<ClusterId>),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) depth: usize,
    pub(crate) key: NodeKey,
    pub(crate) children: Children,
}

impl Node {
    pub(crate) fn new(depth: usize, key: NodeKey, leaf: bool) -> Self {
        let children = if leaf { Children::Leaf(Vec::new()) } else { Children::Branch(AHashMap::new()) };
        Self { depth, key, children }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    pub fn children(&self) -> &Children {
        &self.children
    }
}

#[derive(Debug, Clone)]
pub struct PrefixTree {
    max_node_depth: usize,
    max_children: usize,
    pub(crate) roots: AHashMap<usize, Node>,
}

impl PrefixTree {
    pub fn new(max_node_depth: usize, max_children: usize) -> Self {
        Self { max_node_depth, max_children, roots: AHashMap::new() }
    }

    pub fn max_node_depth(&self) -> usize {
        self.max_node_depth
    }

    pub fn max_children(&self) -> usize {
        self.max_children
    }

    /// Leaf layer for sequences of length `len`: the configured depth, or right after
    /// the last token for shorter sequences.
    pub(crate) fn is_leaf_depth(&self, depth: usize, len: usize) -> bool {
        depth >= self.max_node_depth || depth > len
    }

    /// Leaf bucket reached by following `tokens`, exact key first, wildcard second.
    pub fn candidates(&self, tokens: &[String]) -> Option<&[ClusterId]> {
        let len = tokens.len();
        let mut node = self.roots.get(&len)?;
        let mut depth = 1;
        for token in tokens {
            if self.is_leaf_depth(depth, len) {
                break;
            }
            let Children::Branch(map) = &node.children else { break };
            node = map.get(token.as_str()).or_else(|| map.get(WILDCARD))?;
            depth += 1;
        }
        match &node.children {
            Children::Leaf(ids) => Some(ids.as_slice()),
            Children::Branch(_) => None,
        }
    }

    pub fn search(&self, tokens: &[String], store: &ClusterStore, threshold: f64) -> Option<ClusterId> {
        let bucket = self.candidates(tokens)?;
        fast_match(bucket, store, tokens, threshold)
    }

    /// Files cluster `id` under `template`, growing branches as needed.
    pub fn insert(&mut self, id: ClusterId, template: &[String]) {
        let len = template.len();
        let max_node_depth = self.max_node_depth;
        let max_children = self.max_children;
        let leaf_at = |depth: usize| depth >= max_node_depth || depth > len;

        let mut node = self
            .roots
            .entry(len)
            .or_insert_with(|| Node::new(1, NodeKey::Length(len), leaf_at(1)));
        let mut depth = 1;
        loop {
            let current = node;
            match &mut current.children {
                Children::Leaf(ids) => {
                    ids.push(id);
                    return;
                }
                Children::Branch(map) => {
                    let key = branch_for(map, &template[depth - 1], max_children);
                    let child_depth = depth + 1;
                    node = map
                        .entry(key.clone())
                        .or_insert_with(|| Node::new(child_depth, NodeKey::Token(key), leaf_at(child_depth)));
                    depth = child_depth;
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        fn count(node: &Node) -> usize {
            match &node.children {
                Children::Branch(map) => 1 + map.values().map(count).sum::<usize>(),
                Children::Leaf(_) => 1,
            }
        }
        self.roots.values().map(count).sum()
    }

    /// Largest number of children held by any branch node.
    pub fn widest_branch(&self) -> usize {
        fn widest(node: &Node) -> usize {
            match &node.children {
                Children::Branch(map) => map.values().map(widest).max().unwrap_or(0).max(map.len()),
                Children::Leaf(_) => 0,
            }
        }
        self.roots.values().map(widest).max().unwrap_or(0)
    }

    /// Indented dump: `Root`, then `<len>` nodes, then tokens, one tab per level.
    pub fn render(&self) -> String {
        let mut out = String::from("Root\n");
        for (_, node) in self.roots.iter().sorted_by_key(|(len, _)| **len) {
            render_node(&mut out, node, 1);
        }
        out
    }
}

/// Key of the child a token is filed under. Numeric tokens always go to the wildcard;
/// an unseen literal gets its own branch until the node is about to fill up, at which
/// point the node gains a wildcard branch that absorbs every later newcomer.
fn branch_for(map: &AHashMap<String, Node>, token: &str, max_children: usize) -> String {
    if map.contains_key(token) {
        return token.to_string();
    }
    if is_numeric(token) {
        return WILDCARD.to_string();
    }
    let literal_fits = if map.contains_key(WILDCARD) {
        map.len() < max_children
    } else {
        map.len() + 1 < max_children
    };
    if literal_fits { token.to_string() } else { WILDCARD.to_string() }
}

fn render_node(out: &mut String, node: &Node, indent: usize) {
    let label = match &node.key {
        NodeKey::Length(n) => format!("<{n}>"),
        NodeKey::Token(t) => t.clone(),
    };
    let _ = writeln!(out, "{}{}", "\t".repeat(indent), label);
    if let Children::Branch(map) = &node.children {
        for (_, child) in map.iter().sorted_by(|a, b| a.0.cmp(b.0)) {
            render_node(out, child, indent + 1);
        }
    }
}

use std::fs;
use std::path::Path;

use tracing::{debug, trace};

use crate::cluster::{Cluster, ClusterId, ClusterStore, LineId};
use crate::config::DrainConfig;
use crate::error::{ConfigError, StateError};
use crate::masking::Preprocessor;
use crate::matcher::merge_template;
use crate::persist;
use crate::token::tokenize;
use crate::tree::PrefixTree;

/// Online template miner. Owns the prefix tree and the clusters it indexes.
#[derive(Debug, Clone)]
pub struct Drain {
    config: DrainConfig,
    preprocessor: Preprocessor,
    tree: PrefixTree,
    store: ClusterStore,
}

impl Drain {
    pub fn new(config: DrainConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let preprocessor = Preprocessor::new(&config.preprocess_rules)?;
        let tree = PrefixTree::new(config.max_node_depth(), config.max_children);
        Ok(Self { config, preprocessor, tree, store: ClusterStore::new() })
    }

    pub fn new_default() -> Self {
        let config = DrainConfig::default();
        let tree = PrefixTree::new(config.max_node_depth(), config.max_children);
        Self { config, preprocessor: Preprocessor::default(), tree, store: ClusterStore::new() }
    }

    pub fn config(&self) -> &DrainConfig {
        &self.config
    }

    pub fn tree(&self) -> &PrefixTree {
        &self.tree
    }

    /// Feeds one raw line: preprocess, tokenize, then match or start a cluster.
    /// Returns the cluster the line was assigned to. A saved state only reloads if
    /// every line id in it is distinct.
    pub fn process(&mut self, line_id: LineId, raw: &str) -> ClusterId {
        let tokens = if self.preprocessor.is_empty() {
            tokenize(raw)
        } else {
            tokenize(&self.preprocessor.apply(raw))
        };
        self.process_tokens(line_id, tokens)
    }

    /// Same as `process` for a line that is already tokenized.
    pub fn process_tokens(&mut self, line_id: LineId, tokens: Vec<String>) -> ClusterId {
        let threshold = self.config.similarity_threshold;
        if let Some(id) = self.tree.search(&tokens, &self.store, threshold) {
            if let Some(cluster) = self.store.get_mut(id) {
                let merged = merge_template(cluster.template(), &tokens);
                if cluster.absorb(line_id, merged) {
                    trace!(line_id, cluster = id.index(), template = %cluster.template_string(), "template generalized");
                } else {
                    trace!(line_id, cluster = id.index(), "line matched");
                }
                return id;
            }
        }
        let id = self.store.push(Cluster::new(tokens, line_id));
        if let Some(cluster) = self.store.get(id) {
            self.tree.insert(id, cluster.template());
            debug!(line_id, cluster = id.index(), template = %cluster.template_string(), "new cluster");
        }
        id
    }

    /// Clusters in creation order.
    pub fn clusters(&self) -> &[Cluster] {
        self.store.as_slice()
    }

    pub fn cluster(&self, id: ClusterId) -> Option<&Cluster> {
        self.store.get(id)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Every processed line with the cluster holding it, ordered by line id.
    pub fn assignments(&self) -> Vec<(LineId, ClusterId)> {
        let mut out: Vec<(LineId, ClusterId)> = self
            .store
            .iter()
            .flat_map(|(id, c)| c.member_ids().iter().map(move |&line| (line, id)))
            .collect();
        out.sort_by_key(|&(line, id)| (line, id));
        out
    }

    pub fn render_tree(&self) -> String {
        self.tree.render()
    }

    pub fn save(&self) -> Result<String, StateError> {
        let record = persist::snapshot(&self.config, &self.tree, &self.store);
        let json = serde_json::to_string(&record)?;
        debug!(clusters = self.store.len(), nodes = self.tree.node_count(), bytes = json.len(), "state saved");
        Ok(json)
    }

    /// Replaces the whole state with a saved one. On error the engine is left as it was.
    pub fn load(&mut self, json: &str) -> Result<(), StateError> {
        *self = Self::from_json(json)?;
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, StateError> {
        let (config, tree, store) = persist::restore(json)?;
        let preprocessor = Preprocessor::new(&config.preprocess_rules)?;
        debug!(clusters = store.len(), nodes = tree.node_count(), "state loaded");
        Ok(Self { config, preprocessor, tree, store })
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<(), StateError> {
        fs::write(path, self.save()?)?;
        Ok(())
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, StateError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Engine parameters, fixed for the lifetime of one tree and persisted alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrainConfig {
    /// Depth of all leaf nodes counting the root and the length layer.
    pub depth: usize,
    pub similarity_threshold: f64,
    /// Maximum children of an internal node, wildcard included.
    pub max_children: usize,
    /// Regex patterns replaced by the wildcard before tokenizing, applied in order.
    #[serde(default)]
    pub preprocess_rules: Vec<String>,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            depth: 4,
            similarity_threshold: 0.4,
            max_children: 100,
            preprocess_rules: Vec::new(),
        }
    }
}

impl DrainConfig {
    pub fn new(depth: usize, similarity_threshold: f64, max_children: usize) -> Self {
        Self { depth, similarity_threshold, max_children, preprocess_rules: Vec::new() }
    }

    pub fn with_rules<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preprocess_rules = rules.into_iter().map(Into::into).collect();
        self
    }

    /// Depth limit of the token-keyed layers; leaves live at this depth.
    pub fn max_node_depth(&self) -> usize {
        self.depth.saturating_sub(2)
    }

    /// Checks the numeric parameters. Rule patterns are checked when compiled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.depth < 3 {
            return Err(ConfigError::DepthTooSmall(self.depth));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::ThresholdOutOfRange(self.similarity_threshold));
        }
        if self.max_children == 0 {
            return Err(ConfigError::NoChildren);
        }
        Ok(())
    }
}

pub mod token;
pub mod config;
pub mod error;
pub mod masking;
pub mod cluster;
pub mod matcher;
pub mod tree;
mod persist;
pub mod engine;
pub mod report;
pub mod source;
pub mod shard;

pub use cluster::{Cluster, ClusterId, LineId};
pub use config::DrainConfig;
pub use engine::Drain;
pub use error::{ConfigError, StateError};

use rayon::prelude::*;
use tracing::debug;

use crate::cluster::LineId;
use crate::config::DrainConfig;
use crate::engine::Drain;
use crate::error::ConfigError;

/// Mines independent shards in parallel, one engine per shard, results in shard order.
/// Clusters are never merged across shards.
pub fn mine_shards(config: &DrainConfig, shards: &[Vec<(LineId, String)>]) -> Result<Vec<Drain>, ConfigError> {
    // Built once, cloned into every worker.
    let template = Drain::new(config.clone())?;
    let engines: Vec<Drain> = shards
        .par_iter()
        .enumerate()
        .map(|(idx, shard)| {
            let mut drain = template.clone();
            for (line_id, line) in shard {
                drain.process(*line_id, line);
            }
            debug!(shard = idx, lines = shard.len(), clusters = drain.len(), "shard mined");
            drain
        })
        .collect();
    Ok(engines)
}

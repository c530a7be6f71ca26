use logdrain::shard::mine_shards;
use logdrain::{Drain, DrainConfig};

fn shard(prefix: &str, n: u64) -> Vec<(u64, String)> {
    (1..=n).map(|i| (i, format!("{prefix} request {i} served in {} ms", i * 3))).collect()
}

#[test]
fn shards_match_sequential_mining() {
    let config = DrainConfig::new(4, 0.4, 10);
    let shards = vec![shard("GET", 50), shard("POST", 30), Vec::new()];
    let engines = mine_shards(&config, &shards).unwrap();
    assert_eq!(engines.len(), 3);
    for (engine, lines) in engines.iter().zip(&shards) {
        let mut seq = Drain::new(config.clone()).unwrap();
        for (id, line) in lines {
            seq.process(*id, line);
        }
        assert_eq!(engine.clusters(), seq.clusters());
    }
    assert!(engines[2].is_empty());
    assert_eq!(engines[0].clusters()[0].template_string(), "GET request <*> served in <*> ms");
}

#[test]
fn shards_never_share_clusters() {
    let config = DrainConfig::default();
    let shards = vec![shard("GET", 5), shard("GET", 5)];
    let engines = mine_shards(&config, &shards).unwrap();
    assert_eq!(engines[0].len(), 1);
    assert_eq!(engines[1].len(), 1);
    assert_eq!(engines[0].clusters()[0].size(), 5);
}

#[test]
fn bad_config_fails_before_mining() {
    assert!(mine_shards(&DrainConfig::new(1, 0.4, 10), &[shard("GET", 3)]).is_err());
}

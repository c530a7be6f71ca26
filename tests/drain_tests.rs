use std::collections::HashMap;

use logdrain::token::{tokenize, WILDCARD};
use logdrain::{ConfigError, Drain, DrainConfig};
use rstest::rstest;

fn templates(drain: &Drain) -> Vec<String> {
    drain.clusters().iter().map(|c| c.template_string()).collect()
}

fn hdfs_lines() -> Vec<&'static str> {
    vec![
        "Receiving block blk_-1608999687919862906 src: /10.250.19.102:54106 dest: /10.250.19.102:50010",
        "BLOCK* NameSystem.allocateBlock: /mnt/hadoop/mapred/system/job_200811092030_0001/job.jar. blk_-1608999687919862906",
        "Receiving block blk_-1608999687919862906 src: /10.250.10.6:40524 dest: /10.250.10.6:50010",
        "Receiving block blk_-1608999687919862906 src: /10.250.14.224:42420 dest: /10.250.14.224:50010",
        "PacketResponder 1 for block blk_-1608999687919862906 terminating",
        "PacketResponder 2 for block blk_-1608999687919862906 terminating",
        "Received block blk_-1608999687919862906 of size 91178 from /10.250.10.6",
        "Received block blk_-1608999687919862906 of size 91178 from /10.250.19.102",
        "PacketResponder 0 for block blk_-1608999687919862906 terminating",
        "Verification succeeded for blk_-1608999687919862906",
        "",
        "Deleting block blk_-1608999687919862906 file /mnt/hadoop/dfs/data/current/subdir1/blk_-1608999687919862906",
        "Served block blk_-1608999687919862906 to /10.250.11.100",
    ]
}

fn mine(config: DrainConfig, lines: &[&str]) -> Drain {
    let mut drain = Drain::new(config).unwrap();
    for (i, line) in lines.iter().enumerate() {
        drain.process(i as u64 + 1, line);
    }
    drain
}

#[test]
fn connect_scenario_yields_two_clusters() {
    let drain = mine(DrainConfig::new(4, 0.5, 3), &["connect 10 ok", "connect 11 ok", "connect 12 fail"]);
    // line 2 vs "connect 10 ok": 2/3 >= 0.5, joins
    // line 3 vs "connect <*> ok": 1/3 < 0.5, starts a new cluster
    assert_eq!(drain.len(), 2);
    assert_eq!(drain.clusters()[0].template(), tokenize("connect <*> ok").as_slice());
    assert_eq!(drain.clusters()[0].member_ids(), &[1, 2]);
    assert_eq!(drain.clusters()[1].template(), tokenize("connect 12 fail").as_slice());
    assert_eq!(drain.clusters()[1].member_ids(), &[3]);
}

#[rstest]
#[case(0.5, 1)] // 2/4 == threshold joins
#[case(0.51, 2)] // 2/4 < threshold splits
fn threshold_boundary_is_inclusive(#[case] st: f64, #[case] expected_clusters: usize) {
    let drain = mine(DrainConfig::new(4, st, 100), &["a b c d", "a b x y"]);
    assert_eq!(drain.len(), expected_clusters);
}

#[test]
fn process_returns_the_owning_cluster() {
    let mut drain = Drain::new(DrainConfig::new(4, 0.5, 100)).unwrap();
    let first = drain.process(1, "disk full on sda");
    let second = drain.process(2, "disk full on sdb");
    let third = drain.process(3, "fan speed low");
    assert_eq!(first, second);
    assert_ne!(first, third);
    assert_eq!(drain.cluster(first).unwrap().template_string(), "disk full on <*>");
}

#[test]
fn blank_lines_share_a_length_zero_cluster() {
    let drain = mine(DrainConfig::default(), &["", "   ", "\t"]);
    assert_eq!(drain.len(), 1);
    assert!(drain.clusters()[0].template().is_empty());
    assert_eq!(drain.clusters()[0].member_ids(), &[1, 2, 3]);
    assert_eq!(drain.render_tree(), "Root\n\t<0>\n");
}

#[test]
fn short_lines_under_a_deep_tree_still_match() {
    let drain = mine(DrainConfig::new(6, 0.4, 100), &["restart", "restart", "halt"]);
    assert_eq!(templates(&drain), vec!["restart", "halt"]);
    assert_eq!(drain.clusters()[0].size(), 2);
}

#[test]
fn preprocess_rules_run_before_tokenizing() {
    let config = DrainConfig::new(4, 0.5, 100).with_rules([r"blk_-?\d+"]);
    let drain = mine(config, &["Deleting blk_-12 now", "Deleting blk_7 now"]);
    assert_eq!(templates(&drain), vec!["Deleting <*> now"]);
    assert_eq!(drain.clusters()[0].size(), 2);
}

#[test]
fn mining_is_deterministic() {
    let a = mine(DrainConfig::new(4, 0.4, 3), &hdfs_lines());
    let b = mine(DrainConfig::new(4, 0.4, 3), &hdfs_lines());
    assert_eq!(a.clusters(), b.clusters());
    assert_eq!(a.render_tree(), b.render_tree());
}

#[test]
fn every_line_lands_in_exactly_one_cluster() {
    let lines = hdfs_lines();
    let drain = mine(DrainConfig::new(4, 0.4, 3), &lines);
    let assigned = drain.assignments();
    let ids: Vec<u64> = assigned.iter().map(|(line, _)| *line).collect();
    assert_eq!(ids, (1..=lines.len() as u64).collect::<Vec<_>>());
    let total: usize = drain.clusters().iter().map(|c| c.size()).sum();
    assert_eq!(total, lines.len());
}

#[test]
fn templates_only_ever_generalize() {
    let lines = hdfs_lines();
    let mut drain = Drain::new(DrainConfig::new(4, 0.4, 3)).unwrap();
    let mut seen: HashMap<u64, Vec<String>> = HashMap::new();
    for (i, line) in lines.iter().enumerate() {
        let before: Vec<Vec<String>> = drain.clusters().iter().map(|c| c.template().to_vec()).collect();
        let id = i as u64 + 1;
        drain.process(id, line);
        seen.insert(id, tokenize(line));
        for (old, now) in before.iter().zip(drain.clusters()) {
            assert_eq!(old.len(), now.template().len());
            for (o, n) in old.iter().zip(now.template()) {
                assert!(o == n || n == WILDCARD, "{o} became {n}");
            }
        }
    }
    // a literal template position means every member carried that token there
    for cluster in drain.clusters() {
        for (pos, tok) in cluster.template().iter().enumerate() {
            if tok == WILDCARD {
                continue;
            }
            for member in cluster.member_ids() {
                assert_eq!(&seen[member][pos], tok);
            }
        }
    }
}

#[test]
fn hdfs_sample_groups_by_event() {
    let drain = mine(DrainConfig::new(4, 0.4, 100), &hdfs_lines());
    let t = templates(&drain);
    assert!(t.contains(&"PacketResponder <*> for block blk_-1608999687919862906 terminating".to_string()));
    assert!(t.contains(&"Received block blk_-1608999687919862906 of size 91178 from <*>".to_string()));
    assert!(t.contains(&"Receiving block blk_-1608999687919862906 src: <*> dest: <*>".to_string()));
    assert!(t.contains(&String::new()));
}

#[rstest]
#[case(DrainConfig::new(2, 0.4, 100))]
#[case(DrainConfig::new(4, 1.5, 100))]
#[case(DrainConfig::new(4, -0.1, 100))]
#[case(DrainConfig::new(4, f64::NAN, 100))]
#[case(DrainConfig::new(4, 0.4, 0))]
#[case(DrainConfig::new(4, 0.4, 10).with_rules(["[oops"]))]
fn invalid_configs_are_rejected(#[case] config: DrainConfig) {
    assert!(Drain::new(config).is_err());
}

#[test]
fn config_errors_name_the_problem() {
    assert!(matches!(Drain::new(DrainConfig::new(2, 0.4, 1)), Err(ConfigError::DepthTooSmall(2))));
    assert!(matches!(Drain::new(DrainConfig::new(3, 0.4, 0)), Err(ConfigError::NoChildren)));
    assert!(Drain::new(DrainConfig::new(3, 0.0, 1)).is_ok());
    assert!(Drain::new(DrainConfig::new(3, 1.0, 1)).is_ok());
}

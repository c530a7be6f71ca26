use crate::cluster::{ClusterId, ClusterStore};
use crate::token::{is_wildcard, WILDCARD};

/// Similarity of `tokens` to `template`: the share of positions where the template
/// holds a literal equal to the input token, plus the number of wildcard positions.
///
/// Both sequences must have the same length; the tree only ever pairs a line with
/// templates of its own length, so a mismatch is a bug and panics.
pub fn seq_dist(template: &[String], tokens: &[String]) -> (f64, usize) {
    assert_eq!(template.len(), tokens.len(), "similarity scoring needs equal-length sequences");
    if template.is_empty() {
        return (1.0, 0);
    }
    let mut same = 0usize;
    let mut wildcards = 0usize;
    for (t, tok) in template.iter().zip(tokens) {
        if is_wildcard(t) {
            wildcards += 1;
        } else if t == tok {
            same += 1;
        }
    }
    (same as f64 / template.len() as f64, wildcards)
}

/// Picks the most similar candidate, preferring the more wildcarded template on equal
/// similarity and the earlier candidate after that. Returns `None` below `threshold`.
pub fn fast_match(
    candidates: &[ClusterId],
    store: &ClusterStore,
    tokens: &[String],
    threshold: f64,
) -> Option<ClusterId> {
    let mut best: Option<(ClusterId, f64, usize)> = None;
    for &id in candidates {
        let Some(cluster) = store.get(id) else { continue };
        let (sim, wildcards) = seq_dist(cluster.template(), tokens);
        let better = match best {
            None => true,
            Some((_, best_sim, best_wc)) => sim > best_sim || (sim == best_sim && wildcards > best_wc),
        };
        if better {
            best = Some((id, sim, wildcards));
        }
    }
    best.filter(|&(_, sim, _)| sim >= threshold).map(|(id, _, _)| id)
}

/// Position-wise generalization: equal tokens are kept, differing ones become wildcards.
pub fn merge_template(template: &[String], tokens: &[String]) -> Vec<String> {
    assert_eq!(template.len(), tokens.len(), "template merge needs equal-length sequences");
    template
        .iter()
        .zip(tokens)
        .map(|(t, tok)| if t == tok { t.clone() } else { WILDCARD.to_string() })
        .collect()
}

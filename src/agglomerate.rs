//! Agglomerative Post-Processing
//!
//! Average-link merging of the mined patterns: the pair of patterns with
//! the highest mean per-dimension Jaccard overlap is merged into its
//! componentwise union, as long as the union stays denser than the
//! relation's shifted mean cell noise. The shift is derived from the mean
//! hyperplane noise of the relation at construction time, scaled by the
//! configured multiplier: a merge is kept when
//!
//! ```text
//! noise(union) / area(union) <= noisePerUnit + shift
//! ```
//!
//! The number of candidate pair evaluations is bounded by the configured
//! budget; past it, merging stops and the current patterns are emitted.

use tracing::debug;

use crate::output::Pattern;
use crate::trie::NoiseStore;

/// Merge overlapping patterns until no candidate passes the density test.
pub fn agglomerate(
    mut patterns: Vec<Pattern>,
    store: &NoiseStore,
    similarity_shift: f64,
    max_candidate_agglomerates: f64,
) -> Vec<Pattern> {
    let threshold = store.noise_per_unit() as f64 + similarity_shift;
    let mut budget = (max_candidate_agglomerates * 1_000_000.0) as u64;
    loop {
        let mut best: Option<(f64, usize, usize)> = None;
        'pairs: for p in 0..patterns.len() {
            for q in p + 1..patterns.len() {
                if budget == 0 {
                    break 'pairs;
                }
                budget -= 1;
                let score = similarity(&patterns[p], &patterns[q]);
                if score > 0.0 && best.map_or(true, |(s, _, _)| score > s) {
                    best = Some((score, p, q));
                }
            }
        }
        let Some((_, p, q)) = best else {
            break;
        };
        let union = merge(&patterns[p], &patterns[q]);
        let mean_noise = store.noise_sum_on_box(&union.ids) as f64 / union.area() as f64;
        if mean_noise > threshold {
            // The closest overlap fails the density test; looser ones only
            // fail harder.
            break;
        }
        debug!(mean_noise, threshold, "agglomerating overlapping patterns");
        patterns.swap_remove(q);
        patterns.swap_remove(p);
        patterns.push(union);
    }
    patterns.dedup_by(|a, b| a == b);
    patterns
}

/// Mean per-dimension Jaccard overlap; ids are sorted.
fn similarity(p: &Pattern, q: &Pattern) -> f64 {
    let n = p.ids.len();
    let mut total = 0.0;
    for dim in 0..n {
        let shared = intersection_len(&p.ids[dim], &q.ids[dim]);
        let union = p.ids[dim].len() + q.ids[dim].len() - shared;
        if union > 0 {
            total += shared as f64 / union as f64;
        }
    }
    total / n as f64
}

fn intersection_len(a: &[usize], b: &[usize]) -> usize {
    let mut count = 0;
    let mut i = 0;
    let mut j = 0;
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                count += 1;
                i += 1;
                j += 1;
            }
        }
    }
    count
}

fn merge(p: &Pattern, q: &Pattern) -> Pattern {
    let ids = p
        .ids
        .iter()
        .zip(&q.ids)
        .map(|(a, b)| {
            let mut union = a.clone();
            union.extend_from_slice(b);
            union.sort_unstable();
            union.dedup();
            union
        })
        .collect();
    Pattern { ids }
}

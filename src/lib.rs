//! # nsetmine
//!
//! Miner for closed error-tolerant n-sets: given an n-dimensional relation
//! whose cells carry membership degrees in [0, 1], it enumerates every
//! maximal n-set of elements whose missing mass, summed along each
//! hyperplane, stays within a per-dimension budget ε, under minimal and
//! maximal size/area constraints, group covers, utility, slope,
//! almost-contiguity (tau) and clique (symmetric) requirements.
//!
//! ## Pipeline
//!
//! ```text
//! Noisy relation (text)
//!     ↓
//! [Parser]          → tuples, per-dimension domains, crispness
//!     ↓
//! [Pre-processor]   → reduced relation, dense ids (label-ordered for
//!     ↓               metric dimensions, shared for the clique pair)
//! [Miner]           → depth-first enumeration over the noise store
//!     ↓
//! [Pattern sink]    → formatted patterns or agglomerated merges
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use nsetmine::{mine_relation, CollectingSink, MiningConfig};
//! use std::io::Cursor;
//!
//! let mut config = MiningConfig::default();
//! config.constraints.epsilon = vec![0.0, 0.5];
//! config.constraints.min_sizes = vec![1, 1];
//!
//! let relation = "a x 1\na y 1\nb x 1\nb y 0.5\n";
//! let mut sink = CollectingSink::default();
//! let stats = mine_relation(&config, Cursor::new(relation), "inline", &mut sink)?;
//! println!("{} closed sets", stats.closed_n_sets);
//! # Ok::<(), nsetmine::MiningError>(())
//! ```

pub mod agglomerate;
pub mod attribute;
pub mod config;
pub mod error;
pub mod irrelevancy;
pub mod measure;
pub mod miner;
pub mod output;
pub mod parser;
pub mod preprocess;
pub mod trie;

pub use config::MiningConfig;
pub use error::{MiningError, MiningResult};
pub use miner::{Miner, MiningContext, MiningStats};
pub use output::{CollectingSink, FormattingSink, Pattern, PatternSink};

use std::io::{BufRead, Write};
use std::time::Instant;
use tracing::{info, warn};

use preprocess::{ReducedRelation, ReductionParams};

/// Parse and reduce a relation, returning it with the effective epsilon and
/// minimal-size vectors (crisp normalization and clique unification
/// applied) and the phase durations.
pub fn prepare<R: BufRead>(
    config: &MiningConfig,
    input: R,
    input_name: &str,
) -> MiningResult<(ReducedRelation, Vec<f64>, Vec<usize>, MiningStats)> {
    config.validate()?;
    let mut stats = MiningStats::default();

    // A tuple whose missing mass already exceeds the smallest budget
    // cannot be in any pattern; unless agglomeration wants it, skip it.
    let min_membership = if config.agglomeration.enabled {
        0.0
    } else {
        // Dimensions without an explicit epsilon tolerate no noise at all.
        let min_epsilon = config
            .constraints
            .epsilon
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);
        let min_epsilon = if min_epsilon.is_finite() { min_epsilon } else { 0.0 };
        (1.0 - min_epsilon).clamp(0.0, 1.0)
    };

    let parse_start = Instant::now();
    let reader = parser::NoisyTupleReader::new(
        input_name,
        &config.input.element_separator,
        &config.input.dimension_separator,
        config.input.fuzzy,
        &config.constraints.clique_dimensions,
        min_membership,
    );
    let relation = reader.read(input)?;
    stats.parse_seconds = parse_start.elapsed().as_secs_f64();
    let n = relation.n;
    config.validate_arity(n)?;

    let mut epsilon = config.constraints.epsilon.clone();
    epsilon.resize(n, 0.0);
    if relation.crisp {
        if epsilon.iter().all(|&e| e >= 1.0) {
            for e in &mut epsilon {
                *e = e.floor() + 0.5;
            }
        } else {
            warn!("crisp relation (a crisp-only miner is applicable and probably faster)");
            epsilon = vec![0.5; n];
        }
    }

    // Minimal sizes decide whether the reduction can remove anything.
    let mut min_sizes = config.constraints.min_sizes.clone();
    let mut reduce_enabled = config.engine.pre_process;
    if config.constraints.min_area == 0 {
        if min_sizes.len() != n || min_sizes.contains(&0) {
            reduce_enabled = false;
        }
        min_sizes.resize(n, 0);
    } else {
        min_sizes.resize(n, 1);
    }
    if let [first, second] = config.constraints.clique_dimensions[..] {
        let unified = min_sizes[first].max(min_sizes[second]);
        min_sizes[first] = unified;
        min_sizes[second] = unified;
    }
    let mut tau = config.constraints.tau.clone();
    tau.resize(n, 0.0);

    let reduce_start = Instant::now();
    let reduced = preprocess::reduce(
        relation,
        &ReductionParams {
            epsilon: &epsilon,
            min_sizes: &min_sizes,
            clique_dimensions: &config.constraints.clique_dimensions,
            tau: &tau,
            enabled: reduce_enabled,
        },
    )?;
    stats.reduce_seconds = reduce_start.elapsed().as_secs_f64();
    Ok((reduced, epsilon, min_sizes, stats))
}

/// Full pipeline onto a pattern sink. Agglomeration, when enabled, merges
/// the collected patterns before they reach the sink.
pub fn mine_relation<R: BufRead>(
    config: &MiningConfig,
    input: R,
    input_name: &str,
    sink: &mut dyn PatternSink,
) -> MiningResult<MiningStats> {
    let (reduced, epsilon, min_sizes, mut stats) = prepare(config, input, input_name)?;
    if reduced.cardinalities().contains(&0) {
        info!("the reduction erased every tuple; no pattern can exist");
        return Ok(stats);
    }
    let mut miner = Miner::build(&reduced, config, &epsilon, &min_sizes)?;
    stats.noise_precision = 1.0 / miner.store().noise_per_unit() as f64;

    let mine_start = Instant::now();
    let mined = if config.agglomeration.enabled {
        let mut collector = CollectingSink::default();
        let mined = miner.mine(&mut collector)?;
        stats.mine_seconds = mine_start.elapsed().as_secs_f64();
        let agglomerate_start = Instant::now();
        let merged = agglomerate::agglomerate(
            collector.patterns,
            miner.store(),
            miner.similarity_shift,
            config.agglomeration.max_candidate_agglomerates,
        );
        for pattern in &merged {
            sink.emit(pattern, miner.context())?;
        }
        stats.agglomerate_seconds = agglomerate_start.elapsed().as_secs_f64();
        mined
    } else {
        let mined = miner.mine(sink)?;
        stats.mine_seconds = mine_start.elapsed().as_secs_f64();
        mined
    };
    stats.closed_n_sets = mined.closed_n_sets;
    stats.left_nodes = mined.left_nodes;
    info!(
        closed_n_sets = stats.closed_n_sets,
        left_nodes = stats.left_nodes,
        mine_seconds = stats.mine_seconds,
        "mining finished"
    );
    Ok(stats)
}

/// Full pipeline onto a writer: formatted patterns, or the reduced relation
/// in reduction-only mode.
pub fn run<R: BufRead>(
    config: &MiningConfig,
    input: R,
    input_name: &str,
    out: &mut dyn Write,
) -> MiningResult<MiningStats> {
    if config.engine.reduction_only {
        let (reduced, _, _, stats) = prepare(config, input, input_name)?;
        reduced.write(out, &config.output.dimension_separator)?;
        return Ok(stats);
    }
    let mut sink = FormattingSink::new(out, config.output.clone());
    mine_relation(config, input, input_name, &mut sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_two_block_crisp_relation() {
        let mut config = MiningConfig::default();
        config.constraints.epsilon = vec![0.0, 0.0];
        config.constraints.min_sizes = vec![1, 1];
        config.engine.audit_noise_counters = true;

        let relation = "a x\na y\nb x\nb y\nc z\n";
        let mut sink = CollectingSink::default();
        let stats = mine_relation(&config, Cursor::new(relation), "inline", &mut sink)
            .expect("mines");
        assert_eq!(stats.closed_n_sets, 2);
    }

    #[test]
    fn test_reduction_only_run() {
        let mut config = MiningConfig::default();
        config.constraints.epsilon = vec![0.0, 0.0];
        config.constraints.min_sizes = vec![2, 2];
        config.engine.reduction_only = true;

        let relation = "a x\na y\nb x\nb y\nc z\n";
        let mut out = Vec::new();
        run(&config, Cursor::new(relation), "inline", &mut out).expect("runs");
        let text = String::from_utf8(out).expect("utf8");
        assert!(!text.contains('c'));
        assert_eq!(text.lines().count(), 4);
    }
}

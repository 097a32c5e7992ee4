//! Depth-First Enumeration Engine
//!
//! The miner enumerates every closed error-tolerant n-set by branching on
//! one candidate element at a time: the left subtree commits the element to
//! the pattern, the right subtree excludes it. A node owns its attributes
//! and measures (deep-cloned on the left branch); the noise store is shared
//! by the whole search and visited through counter-propagation walks.
//!
//! One recursion (`peel`):
//! 1. closedness validation: a retained absent element that could still be
//!    adjoined makes every pattern below non-maximal;
//! 2. finalization: when every attribute could commit its whole potential
//!    region within budget, do so and fall through to emission;
//! 3. emission of the pattern once no potential remains;
//! 4. pivot choice by appeal, then the left and right subtrees with
//!    irrelevancy cleaning, absent propagation and min-size element pruning
//!    between them.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::attribute::{sym_find_irrelevant, sym_find_pp_irrelevant, AppealMode, Attribute};
use crate::config::MiningConfig;
use crate::error::{MiningError, MiningResult};
use crate::irrelevancy::{irrelevancy_thresholds, PatternShape};
use crate::measure::{
    order_monotone_first, AssociationKind, GroupCoverAssociation, MaxArea, MaxGroupCover, MaxSize,
    Measure, MinArea, MinGroupCover, MinSize, MinSlope, MinUtility, PatternGroup, SlopeData,
    UtilityData,
};
use crate::output::{Pattern, PatternSink};
use crate::preprocess::ReducedRelation;
use crate::trie::NoiseStore;

/// Immutable facts shared by the whole search.
#[derive(Debug)]
pub struct MiningContext {
    pub n: usize,
    /// internal dimension id -> external dimension id
    pub external_of_internal: Vec<usize>,
    /// external dimension id -> internal dimension id
    pub internal_of_external: Vec<usize>,
    /// Labels per internal dimension, in data-id order
    pub labels: Vec<Vec<String>>,
    pub noise_per_unit: u64,
    /// Minimal sizes in internal order (clique pair unified)
    pub min_sizes: Vec<usize>,
    pub min_area: f64,
    /// Internal ids of the clique pair, if any (adjacent, first < second)
    pub symmetric: Option<(usize, usize)>,
    pub appeal_mode: AppealMode,
    pub min_size_element_pruning: bool,
    pub audit_noise_counters: bool,
}

/// Counters and phase durations of one run.
#[derive(Debug, Clone, Default)]
pub struct MiningStats {
    pub closed_n_sets: u64,
    /// Patterns considered (left branches taken)
    pub left_nodes: u64,
    pub parse_seconds: f64,
    pub reduce_seconds: f64,
    pub mine_seconds: f64,
    pub agglomerate_seconds: f64,
    /// Maximal round-off of one stored membership degree (1/noisePerUnit)
    pub noise_precision: f64,
}

/// Per-node search state: deep-cloned at every left branch.
struct NodeState {
    attributes: Vec<Attribute>,
    measures: Vec<Box<dyn Measure>>,
    /// Set when some excluded element may still prevent the closedness of a
    /// descendant pattern.
    prevent_closedness: bool,
}

/// The search driver.
pub struct Miner {
    ctx: MiningContext,
    data: NoiseStore,
    root: Option<NodeState>,
    stats: MiningStats,
    /// Mean hyperplane noise shift used by the agglomeration
    /// post-processing.
    pub similarity_shift: f64,
}

impl Miner {
    /// Assemble the search state from a reduced relation.
    ///
    /// `epsilon` and `min_sizes` are in external dimension order, with the
    /// crisp normalization and the clique unification already applied.
    pub fn build(
        reduced: &ReducedRelation,
        config: &MiningConfig,
        epsilon: &[f64],
        min_sizes: &[usize],
    ) -> MiningResult<Self> {
        let n = reduced.n;
        let cardinalities_ext = reduced.cardinalities();
        let clique_ext = &config.constraints.clique_dimensions;

        // Order the dimensions by increasing cardinality, keeping the
        // clique pair adjacent among equal cardinalities.
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&d| (cardinalities_ext[d], clique_ext.contains(&d), d));
        let external_of_internal = order;
        let mut internal_of_external = vec![0usize; n];
        for (internal, &external) in external_of_internal.iter().enumerate() {
            internal_of_external[external] = internal;
        }
        let symmetric = if clique_ext.is_empty() {
            None
        } else {
            let mut pair: Vec<usize> = clique_ext.iter().map(|&d| internal_of_external[d]).collect();
            pair.sort_unstable();
            debug_assert_eq!(pair[1], pair[0] + 1, "equal cardinalities sort adjacently");
            Some((pair[0], pair[1]))
        };

        let cardinalities: Vec<usize> = external_of_internal
            .iter()
            .map(|&e| cardinalities_ext[e])
            .collect();

        // Noise is stored in integers scaled so that the largest hyperplane
        // total cannot overflow.
        let largest_noise: u64 = cardinalities.iter().skip(1).map(|&c| c as u64).product();
        let noise_per_unit = (u64::from(u32::MAX) / largest_noise.max(1)).max(1);
        debug!(
            noise_precision = 1.0 / noise_per_unit as f64,
            "membership degrees quantized"
        );

        // Round, not truncate: a budget matching a stored degree exactly
        // must admit it (round-off stays within one noise unit).
        let epsilon_units: Vec<u64> = external_of_internal
            .iter()
            .map(|&e| (epsilon[e] * noise_per_unit as f64).round() as u64)
            .collect();
        let min_sizes_internal: Vec<usize> =
            external_of_internal.iter().map(|&e| min_sizes[e]).collect();

        // Closedness requirements: a clique pair is unclosed only when the
        // whole pair is.
        let mut closed = vec![true; n];
        let mut unclosed_symmetric = 0usize;
        for &external in &config.constraints.unclosed_dimensions {
            let internal = internal_of_external[external];
            match symmetric {
                Some((first, second)) if internal == first || internal == second => {
                    unclosed_symmetric += 1;
                }
                _ => closed[internal] = false,
            }
        }
        if let Some((first, second)) = symmetric {
            if unclosed_symmetric == 2 {
                closed[first] = false;
                closed[second] = false;
            }
        }

        // Attributes with their initial present-and-potential noise: the
        // full hyperplane, self-loop cells included (the store withdraws
        // them right away).
        let total_cells: u64 = cardinalities.iter().map(|&c| c as u64).product();
        let mut attributes: Vec<Attribute> = (0..n)
            .map(|internal| {
                let hyperplane_cells = total_cells / cardinalities[internal] as u64;
                let attr = Attribute::new(
                    internal,
                    cardinalities[internal],
                    epsilon_units[internal],
                    noise_per_unit * hyperplane_cells,
                    closed[internal],
                );
                let external = external_of_internal[internal];
                match (symmetric, &reduced.metric_values[external]) {
                    (Some((first, second)), _) if internal == first => attr.into_symmetric(second),
                    (Some((first, second)), _) if internal == second => attr.into_symmetric(first),
                    (_, Some(values)) => {
                        let tau = config.constraints.tau.get(external).copied().unwrap_or(0.0);
                        attr.into_metric(tau, Arc::new(values.clone()))
                    }
                    _ => attr,
                }
            })
            .collect();

        // Populate the store: self-loops first, then the reduced tuples
        // grouped by their hyperplane of the first internal dimension.
        let mut data = NoiseStore::new(
            cardinalities.clone(),
            noise_per_unit,
            reduced.crisp,
            config.engine.density_threshold,
        );
        if let Some((first, second)) = symmetric {
            data.set_self_loops(first, second, &mut attributes);
        }
        let mut hyperplanes: Vec<Vec<(Vec<usize>, u64)>> = vec![Vec::new(); cardinalities[0]];
        for tuple in &reduced.tuples {
            let coords: Vec<usize> = external_of_internal
                .iter()
                .map(|&e| tuple.coords[e])
                .collect();
            let noise = (noise_per_unit as f64 * (1.0 - tuple.membership)).round() as u64;
            hyperplanes[coords[0]].push((coords, noise));
        }
        for (hyperplane_id, cells) in hyperplanes.iter().enumerate() {
            if !cells.is_empty() {
                data.set_hyperplane(hyperplane_id, cells, &mut attributes);
            }
        }
        if n == 1 {
            attributes[0].mirror_pp_into_present();
        }

        let similarity_shift = config.agglomeration.shift_multiplier
            * (attributes[0].average_pp_noise() / largest_noise.max(1) as f64
                - noise_per_unit as f64);

        let labels: Vec<Vec<String>> = external_of_internal
            .iter()
            .map(|&external| reduced.labels[external].clone())
            .collect();
        let ctx = MiningContext {
            n,
            external_of_internal,
            internal_of_external,
            labels,
            noise_per_unit,
            min_sizes: min_sizes_internal,
            min_area: config.constraints.min_area as f64,
            symmetric,
            appeal_mode: AppealMode::from(config.engine.enumeration_process),
            min_size_element_pruning: config.engine.min_size_element_pruning,
            audit_noise_counters: config.engine.audit_noise_counters,
        };

        let measures = init_measures(&ctx, config, reduced, &cardinalities)?;
        let root = NodeState {
            attributes,
            measures,
            prevent_closedness: false,
        };
        Ok(Miner {
            ctx,
            data,
            root: Some(root),
            stats: MiningStats {
                noise_precision: 1.0 / noise_per_unit as f64,
                ..MiningStats::default()
            },
            similarity_shift,
        })
    }

    pub fn context(&self) -> &MiningContext {
        &self.ctx
    }

    pub fn store(&self) -> &NoiseStore {
        &self.data
    }

    /// Run the search to completion.
    pub fn mine(&mut self, sink: &mut dyn PatternSink) -> MiningResult<MiningStats> {
        if let Some(mut root) = self.root.take() {
            self.peel(&mut root, sink)?;
        }
        Ok(self.stats.clone())
    }

    fn peel(&mut self, node: &mut NodeState, sink: &mut dyn PatternSink) -> MiningResult<()> {
        if self.ctx.audit_noise_counters {
            self.audit(node);
        }
        // Validation: an adjoinable absent element elsewhere means the
        // pattern will be found in another branch.
        let mut unclosed_in_metric = false;
        for attribute in &node.attributes {
            if attribute.unclosed() {
                if !attribute.is_metric() {
                    return Ok(());
                }
                unclosed_in_metric = true;
            }
        }
        if unclosed_in_metric {
            node.prevent_closedness = true;
            return Ok(());
        }
        // Finalization.
        if node.attributes.iter().all(Attribute::finalizable) {
            for idx in 0..node.attributes.len() {
                let moved = node.attributes[idx].finalize();
                if !moved.is_empty() && Self::violation_adding(node, idx, &moved) {
                    return Ok(());
                }
            }
            if Self::dominated() {
                return Ok(());
            }
        }
        // Leaf emission.
        if node.attributes.iter().all(Attribute::potential_is_empty) {
            let pattern = Pattern {
                ids: node
                    .attributes
                    .iter()
                    .map(|a| {
                        let mut ids = a.present_data_ids();
                        ids.sort_unstable();
                        ids
                    })
                    .collect(),
            };
            sink.emit(&pattern, &self.ctx)?;
            self.stats.closed_n_sets += 1;
            node.prevent_closedness = true;
            return Ok(());
        }
        // Pivot choice.
        let mut best: Option<((u64, u64), usize)> = None;
        for idx in 0..node.attributes.len() {
            if node.attributes[idx].potential_is_empty() {
                continue;
            }
            let effective = match self.ctx.symmetric {
                Some((first, second)) if idx == second => first,
                _ => idx,
            };
            if let Some(cost) = node.attributes[idx].appeal_cost(self.ctx.appeal_mode) {
                if best.as_ref().map_or(true, |(b, _)| cost < *b) {
                    best = Some((cost, effective));
                }
            }
        }
        let (_, pivot_attr) = best.expect("a non-leaf node has potential elements");
        node.attributes[pivot_attr].choose_value(self.ctx.appeal_mode);
        if let Some((first, second)) = self.ctx.symmetric {
            if pivot_attr == first {
                let pivot = node.attributes[first].chosen_data_id();
                node.attributes[second].align_pivot(pivot);
            }
        }
        // Subtrees.
        let left_flag = self.left_subtree(node, pivot_attr, sink)?;
        self.right_subtree(node, pivot_attr, left_flag, sink)?;
        if left_flag {
            node.prevent_closedness = true;
        }
        Ok(())
    }

    /// Build and explore the subtree where the pivot is present. Returns
    /// true when some descendant's closedness could be affected by the
    /// pivot.
    fn left_subtree(
        &mut self,
        node: &NodeState,
        pivot_attr: usize,
        sink: &mut dyn PatternSink,
    ) -> MiningResult<bool> {
        let pivot = node.attributes[pivot_attr].chosen_data_id();
        let pivot_set = [pivot];
        let mut child_measures: Vec<Box<dyn Measure>> = Vec::with_capacity(node.measures.len());
        for measure in &node.measures {
            let mut child = measure.clone();
            if child.violation_after_adding(pivot_attr, &pivot_set) {
                return Ok(true);
            }
            child_measures.push(child);
        }
        if let Some((first, second)) = self.ctx.symmetric {
            if pivot_attr == first {
                for child in &mut child_measures {
                    if child.violation_after_adding(second, &pivot_set) {
                        return Ok(true);
                    }
                }
            }
        }
        self.stats.left_nodes += 1;
        let mut child = NodeState {
            attributes: node.attributes.clone(),
            measures: child_measures,
            prevent_closedness: false,
        };
        self.set_present(&mut child, pivot_attr, pivot, sink)?;
        Ok(child.prevent_closedness)
    }

    /// Commit the pivot in a freshly cloned node, clean up and recurse.
    fn set_present(
        &mut self,
        node: &mut NodeState,
        pivot_attr: usize,
        pivot: usize,
        sink: &mut dyn PatternSink,
    ) -> MiningResult<()> {
        match self.ctx.symmetric {
            Some((first, second)) if pivot_attr == first => {
                node.attributes[first].set_chosen_present();
                node.attributes[second].set_chosen_present();
                self.data
                    .set_symmetric_present(&mut node.attributes, first, second, pivot);
            }
            _ => {
                node.attributes[pivot_attr].set_chosen_present();
                self.data.set_present(&mut node.attributes, pivot_attr, pivot);
            }
        }
        // Irrelevancy cleaning: elements already over their present budget
        // leave the search space; the removal must satisfy the measures.
        for idx in 0..node.attributes.len() {
            let (violated, irrelevant, announce) = match self.ctx.symmetric {
                Some((first, second)) if idx == first => {
                    let violated = sym_find_irrelevant(&mut node.attributes, first, second);
                    let ids = irrelevant_data_ids(&node.attributes[first]);
                    (violated, ids, vec![first, second])
                }
                Some((_, second)) if idx == second => continue,
                _ => {
                    let violated = node.attributes[idx].find_irrelevant_and_check_tau();
                    let ids = irrelevant_data_ids(&node.attributes[idx]);
                    (violated, ids, vec![idx])
                }
            };
            if violated {
                // A present element over budget (or an unbridgeable span):
                // the pivot may still be adjoinable to patterns of the right
                // subtree, so it must stay observable there.
                node.prevent_closedness = true;
                return Ok(());
            }
            if !irrelevant.is_empty() {
                for dim in announce {
                    if Self::violation_removing(node, dim, &irrelevant) {
                        return Ok(());
                    }
                }
            }
        }
        if Self::dominated() {
            return Ok(());
        }
        for attribute in &mut node.attributes {
            attribute.clean_absent();
        }
        if self.set_absent_cascade(node)? {
            self.peel(node, sink)?;
        }
        Ok(())
    }

    /// Exclude the pivot from the current node and recurse.
    fn right_subtree(
        &mut self,
        node: &mut NodeState,
        pivot_attr: usize,
        left_flag: bool,
        sink: &mut dyn PatternSink,
    ) -> MiningResult<()> {
        let (tau_violated, removed) = node.attributes[pivot_attr].tau_far_ids_and_check_tau();
        if tau_violated {
            return Ok(());
        }
        let announce: Vec<usize> = match self.ctx.symmetric {
            Some((first, second)) if pivot_attr == first => vec![first, second],
            _ => vec![pivot_attr],
        };
        for &dim in &announce {
            if Self::violation_removing(node, dim, &removed) {
                return Ok(());
            }
        }
        if Self::dominated() {
            return Ok(());
        }
        match self.ctx.symmetric {
            Some((first, second)) if pivot_attr == first => {
                self.data
                    .set_symmetric_absent(&mut node.attributes, first, second, &removed);
                node.attributes[first].set_chosen_absent(left_flag);
                node.attributes[second].set_chosen_absent(left_flag);
            }
            _ => {
                self.data.set_absent(&mut node.attributes, pivot_attr, &removed);
                node.attributes[pivot_attr].set_chosen_absent(left_flag);
                for &id in &removed[1..] {
                    node.attributes[pivot_attr].move_to_absent(id);
                }
            }
        }
        if self.ctx.min_size_element_pruning {
            if self.find_min_size_irrelevant(node, Some(pivot_attr)) && self.set_absent_cascade(node)?
            {
                self.peel(node, sink)?;
            }
            return Ok(());
        }
        self.peel(node, sink)
    }

    /// Erase flagged elements, propagate their noise and keep pruning until
    /// no irrelevant element remains. Returns false when the node dies.
    fn set_absent_cascade(&mut self, node: &mut NodeState) -> MiningResult<bool> {
        loop {
            let purge = (0..node.attributes.len())
                .filter(|&idx| match self.ctx.symmetric {
                    Some((_, second)) => idx != second,
                    None => true,
                })
                .max_by_key(|&idx| node.attributes[idx].irrelevant_count());
            let Some(purge) = purge else {
                return Ok(true);
            };
            if node.attributes[purge].irrelevant_is_empty() {
                return Ok(true);
            }
            match self.ctx.symmetric {
                Some((first, second)) if purge == first => {
                    let removed = node.attributes[first].erase_irrelevant_values();
                    let twin_removed = node.attributes[second].erase_irrelevant_values();
                    debug_assert_eq!(
                        {
                            let mut a = removed.clone();
                            a.sort_unstable();
                            a
                        },
                        {
                            let mut b = twin_removed;
                            b.sort_unstable();
                            b
                        }
                    );
                    self.data
                        .set_symmetric_absent(&mut node.attributes, first, second, &removed);
                }
                _ => {
                    let removed = node.attributes[purge].erase_irrelevant_values();
                    self.data.set_absent(&mut node.attributes, purge, &removed);
                }
            }
            if self.ctx.min_size_element_pruning && !self.find_min_size_irrelevant(node, Some(purge))
            {
                return Ok(false);
            }
        }
    }

    /// Min-size element pruning: flag elements whose present-and-potential
    /// noise exceeds what any feasible descendant could tolerate. Returns
    /// false when the node dies.
    fn find_min_size_irrelevant(&mut self, node: &mut NodeState, previous: Option<usize>) -> bool {
        let present_sizes: Vec<usize> = node.attributes.iter().map(Attribute::size_of_present).collect();
        let pp_sizes: Vec<usize> = node
            .attributes
            .iter()
            .map(Attribute::size_of_present_and_potential)
            .collect();
        // An emptied dimension under an areal minimum cannot recover.
        if self.ctx.min_area > 0.0 && pp_sizes.contains(&0) {
            return false;
        }
        let epsilon_units: Vec<u64> = node.attributes.iter().map(Attribute::epsilon).collect();
        let thresholds = irrelevancy_thresholds(
            &PatternShape {
                min_sizes: &self.ctx.min_sizes,
                present_sizes: &present_sizes,
                pp_sizes: &pp_sizes,
                min_area: self.ctx.min_area,
                symmetric: self.ctx.symmetric,
            },
            &epsilon_units,
            self.ctx.noise_per_unit,
        );
        // A present element past the threshold kills the node outright.
        for (idx, attribute) in node.attributes.iter().enumerate() {
            let skip = previous == Some(idx) && attribute.twin().is_none();
            if !skip && attribute.present_and_potential_irrelevant(thresholds[idx]) {
                return false;
            }
        }
        for idx in 0..node.attributes.len() {
            match self.ctx.symmetric {
                Some((first, second)) if idx == first => {
                    let flagged = sym_find_pp_irrelevant(
                        &mut node.attributes,
                        first,
                        second,
                        thresholds[first],
                        thresholds[second],
                    );
                    if !flagged.is_empty() {
                        for dim in [first, second] {
                            if Self::violation_removing(node, dim, &flagged) {
                                return false;
                            }
                        }
                    }
                    node.attributes[first].pp_clean_absent(thresholds[first]);
                    node.attributes[second].pp_clean_absent(thresholds[second]);
                }
                Some((_, second)) if idx == second => {}
                _ => {
                    if previous == Some(idx) {
                        continue;
                    }
                    let (violated, flagged) =
                        node.attributes[idx].find_pp_irrelevant_and_check_tau(thresholds[idx]);
                    if violated {
                        return false;
                    }
                    if !flagged.is_empty() && Self::violation_removing(node, idx, &flagged) {
                        return false;
                    }
                    node.attributes[idx].pp_clean_absent(thresholds[idx]);
                }
            }
        }
        !Self::dominated()
    }

    fn violation_adding(node: &mut NodeState, dim: usize, ids: &[usize]) -> bool {
        for measure in &mut node.measures {
            if measure.violation_after_adding(dim, ids) {
                node.prevent_closedness = true;
                return true;
            }
        }
        false
    }

    fn violation_removing(node: &mut NodeState, dim: usize, ids: &[usize]) -> bool {
        for measure in &mut node.measures {
            if measure.violation_after_removing(dim, ids) {
                if !measure.monotone() {
                    node.prevent_closedness = true;
                }
                return true;
            }
        }
        false
    }

    /// Domination pruning hook; no heuristic is implemented.
    fn dominated() -> bool {
        false
    }

    /// Cross-check every incremental counter against a from-scratch count.
    fn audit(&self, node: &NodeState) {
        for (idx, attribute) in node.attributes.iter().enumerate() {
            for vi in 0..attribute.retained_len() {
                let data_id = attribute.data_id(vi);
                let actual = self
                    .data
                    .count_noise_on_present(&node.attributes, idx, data_id);
                assert_eq!(
                    attribute.present_noise(vi),
                    actual,
                    "present noise of element {data_id} in dimension {idx} drifted"
                );
                let actual = self
                    .data
                    .count_noise_on_present_and_potential(&node.attributes, idx, data_id);
                assert_eq!(
                    attribute.present_and_potential_noise(vi),
                    actual,
                    "present-and-potential noise of element {data_id} in dimension {idx} drifted"
                );
            }
        }
    }
}

fn irrelevant_data_ids(attribute: &Attribute) -> Vec<usize> {
    let start = attribute.size_of_present_and_potential() - attribute.irrelevant_count();
    (start..attribute.size_of_present_and_potential())
        .map(|vi| attribute.data_id(vi))
        .collect()
}

/// Load the side files and build the measure sequence in increasing update
/// cost, monotone measures first.
fn init_measures(
    ctx: &MiningContext,
    config: &MiningConfig,
    reduced: &ReducedRelation,
    cardinalities: &[usize],
) -> MiningResult<Vec<Box<dyn Measure>>> {
    let n = ctx.n;
    let mut measures: Vec<Box<dyn Measure>> = Vec::new();

    // Maximal sizes in internal order, unified to the smaller bound inside
    // the clique pair.
    let mut max_sizes: Vec<usize> = cardinalities.to_vec();
    for (external, &max) in config.constraints.max_sizes.iter().enumerate() {
        max_sizes[ctx.internal_of_external[external]] = max;
    }
    if let Some((first, second)) = ctx.symmetric {
        let unified = max_sizes[first].min(max_sizes[second]);
        max_sizes[first] = unified;
        max_sizes[second] = unified;
    }

    let mut min_area_according_to_sizes: u128 = 1;
    for internal in 0..n {
        let min_size = ctx.min_sizes[internal];
        min_area_according_to_sizes *= min_size as u128;
        if min_size != 0 {
            measures.push(Box::new(MinSize::new(
                internal,
                cardinalities[internal],
                min_size,
            )));
        }
    }
    if (config.constraints.min_area as u128) > min_area_according_to_sizes {
        measures.push(Box::new(MinArea::new(
            cardinalities.to_vec(),
            config.constraints.min_area,
        )));
    }
    for internal in 0..n {
        if max_sizes[internal] < cardinalities[internal] {
            measures.push(Box::new(MaxSize::new(internal, max_sizes[internal])));
        }
    }
    if config.constraints.max_area != 0 {
        measures.push(Box::new(MaxArea::new(n, config.constraints.max_area)));
    }

    if !config.groups.files.is_empty() {
        let groups = Arc::new(load_groups(ctx, config, reduced)?);
        let mut group_min_sizes = config.groups.min_sizes.clone();
        group_min_sizes.resize(groups.len(), 0);
        let matrices: [(&Vec<Vec<f64>>, AssociationKind); 6] = [
            (&config.groups.min_ratios, AssociationKind::Ratio),
            (
                &config.groups.min_piatetsky_shapiros,
                AssociationKind::PiatetskyShapiro,
            ),
            (&config.groups.min_leverages, AssociationKind::Leverage),
            (&config.groups.min_forces, AssociationKind::Force),
            (&config.groups.min_yules_qs, AssociationKind::YulesQ),
            (&config.groups.min_yules_ys, AssociationKind::YulesY),
        ];
        for &(matrix, kind) in &matrices {
            for (row, coefficients) in matrix.iter().enumerate() {
                for (column, &minimum) in coefficients.iter().enumerate() {
                    if row == column {
                        // The diagonal states a minimal self-cover.
                        if minimum > 0.0 && minimum as usize > group_min_sizes[row] {
                            group_min_sizes[row] = minimum as usize;
                        }
                        continue;
                    }
                    let trivial = match kind {
                        AssociationKind::Ratio | AssociationKind::Force => minimum <= 0.0,
                        AssociationKind::PiatetskyShapiro | AssociationKind::Leverage => {
                            let max_row = groups[row].size() as f64;
                            let max_column = groups[column].size() as f64;
                            max_column == 0.0 || -max_row >= minimum * max_column
                        }
                        AssociationKind::YulesQ | AssociationKind::YulesY => minimum <= -1.0,
                    };
                    if !trivial {
                        measures.push(Box::new(GroupCoverAssociation::new(
                            Arc::clone(&groups),
                            kind,
                            row,
                            column,
                            minimum,
                        )));
                    }
                }
            }
        }
        let no_group_option_given = config.groups.min_sizes.is_empty()
            && config.groups.max_sizes.is_empty()
            && matrices.iter().all(|(m, _)| m.is_empty());
        for (group_id, &min) in group_min_sizes.iter().enumerate() {
            if min != 0 {
                measures.push(Box::new(MinGroupCover::new(Arc::clone(&groups), group_id, min)));
            }
        }
        for (group_id, &max) in config.groups.max_sizes.iter().enumerate() {
            if group_id < groups.len() && max < groups[group_id].size() {
                measures.push(Box::new(MaxGroupCover::new(Arc::clone(&groups), group_id, max)));
            }
        }
        if no_group_option_given {
            // Groups without any constraint ask for full covers.
            for group_id in 0..groups.len() {
                let size = groups[group_id].size();
                measures.push(Box::new(MinGroupCover::new(
                    Arc::clone(&groups),
                    group_id,
                    size,
                )));
            }
        }
    }

    if let Some(path) = &config.utility.file {
        let tuples = load_valued_tuples(ctx, reduced, path, 1)?;
        let data = Arc::new(UtilityData::new(
            tuples.into_iter().map(|(c, v)| (c, v[0])).collect(),
        ));
        measures.push(Box::new(MinUtility::new(data, n, config.utility.min_utility)));
    }
    if let Some(path) = &config.slope.file {
        let tuples = load_valued_tuples(ctx, reduced, path, 2)?;
        let data = Arc::new(SlopeData::new(
            tuples.into_iter().map(|(c, v)| (c, v[0], v[1])).collect(),
        ));
        measures.push(Box::new(MinSlope::new(data, n, config.slope.min_slope)));
    }

    order_monotone_first(&mut measures);
    Ok(measures)
}

/// Group file: one line per external dimension, member labels joined by the
/// group element separator. Labels of pruned elements are skipped.
fn load_groups(
    ctx: &MiningContext,
    config: &MiningConfig,
    reduced: &ReducedRelation,
) -> MiningResult<Vec<PatternGroup>> {
    let label_ids = label_maps(reduced);
    let mut groups = Vec::with_capacity(config.groups.files.len());
    for path in &config.groups.files {
        let file = File::open(path)?;
        let mut members: Vec<std::collections::HashSet<usize>> =
            (0..ctx.n).map(|_| std::collections::HashSet::new()).collect();
        for (external, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if external >= ctx.n {
                return Err(MiningError::usage(format!(
                    "group file {} has more lines than the relation has dimensions",
                    path.display()
                )));
            }
            let internal = ctx.internal_of_external[external];
            for label in line
                .split(&config.groups.element_separator)
                .map(str::trim)
                .filter(|l| !l.is_empty())
            {
                match label_ids[external].get(label) {
                    Some(&id) => {
                        members[internal].insert(id);
                    }
                    None => warn!(
                        group = %path.display(),
                        dimension = external,
                        label,
                        "group member absent from the reduced relation"
                    ),
                }
            }
        }
        groups.push(PatternGroup { members });
    }
    Ok(groups)
}

/// Value file: one tuple per line, n labels then `values` numbers,
/// whitespace separated. Tuples referencing pruned elements are dropped:
/// they cannot belong to any pattern.
fn load_valued_tuples(
    ctx: &MiningContext,
    reduced: &ReducedRelation,
    path: &Path,
    values: usize,
) -> MiningResult<Vec<(Vec<usize>, Vec<f64>)>> {
    let label_ids = label_maps(reduced);
    let file = File::open(path)?;
    let mut tuples = Vec::new();
    'lines: for (line_number, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() != ctx.n + values {
            return Err(MiningError::Parse {
                path: path.display().to_string(),
                line: line_number + 1,
                message: format!(
                    "expected {} label(s) and {values} value(s), found {} fields",
                    ctx.n,
                    fields.len()
                ),
            });
        }
        let mut coords = vec![0usize; ctx.n];
        for (external, label) in fields[..ctx.n].iter().enumerate() {
            match label_ids[external].get(*label) {
                Some(&id) => coords[ctx.internal_of_external[external]] = id,
                None => continue 'lines,
            }
        }
        let mut parsed = Vec::with_capacity(values);
        for raw in &fields[ctx.n..] {
            let value: f64 = raw.parse().map_err(|_| MiningError::Parse {
                path: path.display().to_string(),
                line: line_number + 1,
                message: format!("invalid value '{raw}'"),
            })?;
            parsed.push(value);
        }
        tuples.push((coords, parsed));
    }
    Ok(tuples)
}

fn label_maps(reduced: &ReducedRelation) -> Vec<HashMap<String, usize>> {
    reduced
        .labels
        .iter()
        .map(|labels| {
            labels
                .iter()
                .enumerate()
                .map(|(id, label)| (label.clone(), id))
                .collect()
        })
        .collect()
}

//! Attributes and Values
//!
//! An [`Attribute`] owns one internal dimension of the search state: its
//! elements, each carrying two incrementally-maintained noise counters, are
//! kept in one vector partitioned into four runs:
//!
//! ```text
//! [ present | potential | irrelevant | absent ]
//!            ^present_end ^irrelevant_start ^potential_end
//! ```
//!
//! The irrelevant run is the tail of the potential region: elements flagged
//! for removal that still await their propagation walk. Absent elements
//! keep their counters maintained (closedness needs them) until they
//! provably cannot prevent the closedness of any descendant pattern, at
//! which point they are dropped from the vector altogether.
//!
//! Metric dimensions carry an ordered numeric label per element (data-id
//! order is label order) and restrict patterns to spans whose consecutive
//! labels are at most tau apart. The two attributes of a clique pair hold
//! identical partitions at all times and refer to each other by index.

use std::sync::Arc;

/// Pivot selection heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppealMode {
    /// Score a candidate by the noise it carries in the present-and-
    /// potential space.
    PotentialNoise,
    /// Score by the noise in the present space, present-and-potential as
    /// tie-break.
    PresentNoise,
}

impl From<u8> for AppealMode {
    fn from(value: u8) -> Self {
        if value == 1 {
            AppealMode::PresentNoise
        } else {
            AppealMode::PotentialNoise
        }
    }
}

/// Classification of one element at the current search node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Present,
    Potential,
    Absent,
}

/// One element of a dimension with its noise counters.
#[derive(Debug, Clone, Copy)]
pub struct Value {
    data_id: usize,
    present_noise: u64,
    present_and_potential_noise: u64,
}

#[derive(Debug, Clone)]
enum AttributeKind {
    Plain,
    Metric {
        tau: f64,
        /// Numeric label per data id, increasing.
        labels: Arc<Vec<f64>>,
    },
    Symmetric {
        twin: usize,
    },
}

/// One internal dimension of the search state.
#[derive(Debug, Clone)]
pub struct Attribute {
    id: usize,
    epsilon: u64,
    closed: bool,
    values: Vec<Value>,
    present_end: usize,
    irrelevant_start: usize,
    potential_end: usize,
    kind: AttributeKind,
}

impl Attribute {
    pub fn new(id: usize, cardinality: usize, epsilon: u64, initial_pp_noise: u64, closed: bool) -> Self {
        Attribute {
            id,
            epsilon,
            closed,
            values: (0..cardinality)
                .map(|data_id| Value {
                    data_id,
                    present_noise: 0,
                    present_and_potential_noise: initial_pp_noise,
                })
                .collect(),
            present_end: 0,
            irrelevant_start: cardinality,
            potential_end: cardinality,
            kind: AttributeKind::Plain,
        }
    }

    pub fn into_metric(mut self, tau: f64, labels: Arc<Vec<f64>>) -> Self {
        debug_assert_eq!(labels.len(), self.values.len());
        self.kind = AttributeKind::Metric { tau, labels };
        self
    }

    pub fn into_symmetric(mut self, twin: usize) -> Self {
        self.kind = AttributeKind::Symmetric { twin };
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn epsilon(&self) -> u64 {
        self.epsilon
    }

    pub fn is_metric(&self) -> bool {
        matches!(self.kind, AttributeKind::Metric { .. })
    }

    pub fn twin(&self) -> Option<usize> {
        match self.kind {
            AttributeKind::Symmetric { twin } => Some(twin),
            _ => None,
        }
    }

    // ---- region bookkeeping -------------------------------------------

    pub fn retained_len(&self) -> usize {
        self.values.len()
    }

    pub fn size_of_present(&self) -> usize {
        self.present_end
    }

    pub fn size_of_present_and_potential(&self) -> usize {
        self.potential_end
    }

    pub fn potential_is_empty(&self) -> bool {
        self.present_end == self.potential_end
    }

    pub fn irrelevant_count(&self) -> usize {
        self.potential_end - self.irrelevant_start
    }

    pub fn irrelevant_is_empty(&self) -> bool {
        self.irrelevant_start == self.potential_end
    }

    pub fn region_of(&self, vi: usize) -> Region {
        if vi < self.present_end {
            Region::Present
        } else if vi < self.potential_end {
            Region::Potential
        } else {
            Region::Absent
        }
    }

    pub fn data_id(&self, vi: usize) -> usize {
        self.values[vi].data_id
    }

    pub fn present_noise(&self, vi: usize) -> u64 {
        self.values[vi].present_noise
    }

    pub fn present_and_potential_noise(&self, vi: usize) -> u64 {
        self.values[vi].present_and_potential_noise
    }

    pub fn present_data_ids(&self) -> Vec<usize> {
        self.values[..self.present_end]
            .iter()
            .map(|v| v.data_id)
            .collect()
    }

    // ---- counter maintenance ------------------------------------------

    pub fn add_present_noise(&mut self, vi: usize, amount: u64) {
        self.values[vi].present_noise += amount;
    }

    pub fn subtract_pp_noise(&mut self, vi: usize, amount: u64) {
        debug_assert!(self.values[vi].present_and_potential_noise >= amount);
        self.values[vi].present_and_potential_noise -= amount;
    }

    /// Construction only: withdraw recovered mass of one stored cell while
    /// value indices still equal data ids.
    pub fn recover_initial_noise(&mut self, data_id: usize, amount: u64) {
        self.values[data_id].present_and_potential_noise -= amount;
    }

    /// Construction only, one-dimensional relations: with no other
    /// dimension to condition on, the present noise of an element is the
    /// noise of its single cell.
    pub fn mirror_pp_into_present(&mut self) {
        for value in &mut self.values {
            value.present_noise = value.present_and_potential_noise;
        }
    }

    /// Mean present-and-potential noise over the retained elements.
    pub fn average_pp_noise(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let total: u64 = self
            .values
            .iter()
            .map(|v| v.present_and_potential_noise)
            .sum();
        total as f64 / self.values.len() as f64
    }

    // ---- pivot selection ----------------------------------------------

    /// Cost of the best branching candidate: lower is more appealing.
    /// Returns None when the potential region is empty.
    pub fn appeal_cost(&self, mode: AppealMode) -> Option<(u64, u64)> {
        self.values[self.present_end..self.irrelevant_start]
            .iter()
            .map(|v| match mode {
                AppealMode::PotentialNoise => (v.present_and_potential_noise, 0),
                AppealMode::PresentNoise => (v.present_noise, v.present_and_potential_noise),
            })
            .min()
    }

    /// Pin the best candidate at the head of the potential region.
    pub fn choose_value(&mut self, mode: AppealMode) {
        let offset = self.values[self.present_end..self.irrelevant_start]
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| match mode {
                AppealMode::PotentialNoise => (v.present_and_potential_noise, 0),
                AppealMode::PresentNoise => (v.present_noise, v.present_and_potential_noise),
            })
            .map(|(i, _)| i)
            .expect("choose_value requires a non-empty potential region");
        self.values.swap(self.present_end, self.present_end + offset);
    }

    /// Pin a specific element (the twin's pivot) at the head of the
    /// potential region.
    pub fn align_pivot(&mut self, data_id: usize) {
        let vi = self.find_potential(data_id).expect("twin pivot is potential");
        self.values.swap(self.present_end, vi);
    }

    pub fn chosen_data_id(&self) -> usize {
        self.values[self.present_end].data_id
    }

    /// Commit the pivot to the pattern.
    pub fn set_chosen_present(&mut self) {
        self.present_end += 1;
    }

    /// Exclude the pivot. When the left subtree proved that it cannot
    /// prevent the closedness of any descendant pattern, the element is
    /// dropped instead of being retained in the absent region.
    pub fn set_chosen_absent(&mut self, can_prevent_closedness: bool) {
        debug_assert!(self.irrelevant_is_empty());
        self.values.swap(self.present_end, self.potential_end - 1);
        self.potential_end -= 1;
        self.irrelevant_start = self.potential_end;
        if !can_prevent_closedness {
            self.values.swap_remove(self.potential_end);
        }
    }

    /// Move one still-potential element straight to the absent region
    /// (tau-far elements of a right branch).
    pub fn move_to_absent(&mut self, data_id: usize) {
        debug_assert!(self.irrelevant_is_empty());
        let vi = self.find_potential(data_id).expect("element is potential");
        self.values.swap(vi, self.potential_end - 1);
        self.potential_end -= 1;
        self.irrelevant_start = self.potential_end;
    }

    fn find_potential(&self, data_id: usize) -> Option<usize> {
        (self.present_end..self.irrelevant_start).find(|&vi| self.values[vi].data_id == data_id)
    }

    fn flag_irrelevant_at(&mut self, vi: usize) {
        debug_assert!(vi >= self.present_end && vi < self.irrelevant_start);
        self.irrelevant_start -= 1;
        self.values.swap(vi, self.irrelevant_start);
    }

    pub fn flag_irrelevant_by_data_id(&mut self, data_id: usize) {
        if let Some(vi) = self.find_potential(data_id) {
            self.flag_irrelevant_at(vi);
        }
    }

    /// Irrelevant -> absent; returns the data ids for the propagation walk.
    pub fn erase_irrelevant_values(&mut self) -> Vec<usize> {
        let ids = self.values[self.irrelevant_start..self.potential_end]
            .iter()
            .map(|v| v.data_id)
            .collect();
        self.potential_end = self.irrelevant_start;
        ids
    }

    // ---- irrelevancy & tau-contiguity ---------------------------------

    /// Flag potential elements whose present noise already exceeds ε and,
    /// for a metric dimension, elements out of tau reach. Returns true when
    /// the node is infeasible: a present element over budget, or a present
    /// span no longer bridgeable within tau.
    pub fn find_irrelevant_and_check_tau(&mut self) -> bool {
        if self.values[..self.present_end]
            .iter()
            .any(|v| v.present_noise > self.epsilon)
        {
            return true;
        }
        let mut vi = self.present_end;
        while vi < self.irrelevant_start {
            if self.values[vi].present_noise > self.epsilon {
                self.flag_irrelevant_at(vi);
            } else {
                vi += 1;
            }
        }
        self.metric_prune().0
    }

    /// Same against the present-and-potential counters and an externally
    /// supplied threshold. Returns the violation flag and the data ids
    /// flagged by this call.
    pub fn find_pp_irrelevant_and_check_tau(&mut self, threshold: u64) -> (bool, Vec<usize>) {
        let mut flagged = Vec::new();
        let mut vi = self.present_end;
        while vi < self.irrelevant_start {
            if self.values[vi].present_and_potential_noise > threshold {
                flagged.push(self.values[vi].data_id);
                self.flag_irrelevant_at(vi);
            } else {
                vi += 1;
            }
        }
        let (violated, tau_flagged) = self.metric_prune();
        flagged.extend(tau_flagged);
        (violated, flagged)
    }

    /// True when a present element misses more mass than any feasible
    /// descendant could tolerate.
    pub fn present_and_potential_irrelevant(&self, threshold: u64) -> bool {
        self.values[..self.present_end]
            .iter()
            .any(|v| v.present_and_potential_noise > threshold)
    }

    /// Drop absent elements whose present noise exceeds ε: present noise
    /// only grows down the tree, so they can never become adjoinable again.
    pub fn clean_absent(&mut self) {
        let mut vi = self.potential_end;
        while vi < self.values.len() {
            if self.values[vi].present_noise > self.epsilon {
                self.values.swap_remove(vi);
            } else {
                vi += 1;
            }
        }
    }

    /// Drop absent elements above the min-size pruning threshold.
    pub fn pp_clean_absent(&mut self, threshold: u64) {
        let mut vi = self.potential_end;
        while vi < self.values.len() {
            if self.values[vi].present_and_potential_noise > threshold {
                self.values.swap_remove(vi);
            } else {
                vi += 1;
            }
        }
    }

    // ---- leaves and closedness ----------------------------------------

    /// True when every present-or-potential element would stay within
    /// budget if all of the potential were committed; a metric dimension
    /// additionally requires the committed span to be tau-contiguous.
    pub fn finalizable(&self) -> bool {
        if !self.values[..self.potential_end]
            .iter()
            .all(|v| v.present_and_potential_noise <= self.epsilon)
        {
            return false;
        }
        let AttributeKind::Metric { tau, labels } = &self.kind else {
            return true;
        };
        let mut span: Vec<f64> = self.values[..self.potential_end]
            .iter()
            .map(|v| labels[v.data_id])
            .collect();
        span.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        span.windows(2).all(|w| w[1] - w[0] <= *tau)
    }

    /// Commit the whole potential region; returns the moved data ids.
    pub fn finalize(&mut self) -> Vec<usize> {
        debug_assert!(self.irrelevant_is_empty());
        let moved = self.values[self.present_end..self.potential_end]
            .iter()
            .map(|v| v.data_id)
            .collect();
        self.present_end = self.potential_end;
        moved
    }

    /// True when a retained absent element could still be adjoined, which
    /// makes every pattern below this node non-maximal. Metric dimensions
    /// only consider elements within tau reach of the current span.
    pub fn unclosed(&self) -> bool {
        if !self.closed {
            return false;
        }
        match &self.kind {
            AttributeKind::Metric { tau, labels } => {
                self.values[self.potential_end..].iter().any(|v| {
                    v.present_and_potential_noise <= self.epsilon
                        && self.values[..self.potential_end].iter().any(|x| {
                            (labels[v.data_id] - labels[x.data_id]).abs() <= *tau
                        })
                })
            }
            _ => self.values[self.potential_end..]
                .iter()
                .any(|v| v.present_and_potential_noise <= self.epsilon),
        }
    }

    /// Ids leaving the search space when the pivot goes absent: the pivot
    /// itself plus, in a metric dimension, every element its removal puts
    /// out of tau reach. The flag reports a present span that can no longer
    /// be bridged.
    pub fn tau_far_ids_and_check_tau(&self) -> (bool, Vec<usize>) {
        let pivot = self.chosen_data_id();
        let AttributeKind::Metric { tau, labels } = &self.kind else {
            return (false, vec![pivot]);
        };
        if self.present_end == 0 {
            return (false, vec![pivot]);
        }
        let mut span: Vec<(f64, bool, usize)> = self.values[..self.irrelevant_start]
            .iter()
            .enumerate()
            .filter(|(vi, v)| *vi < self.present_end || v.data_id != pivot)
            .map(|(vi, v)| (labels[v.data_id], vi < self.present_end, v.data_id))
            .collect();
        span.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        let (violated, mut far) = Self::scan_span(&span, *tau);
        let mut ids = vec![pivot];
        ids.append(&mut far);
        (violated, ids)
    }

    /// Tau-contiguity over the present span and reachability beyond it.
    /// Flags unreachable potential elements as irrelevant; returns the
    /// violation flag and their data ids.
    fn metric_prune(&mut self) -> (bool, Vec<usize>) {
        let AttributeKind::Metric { tau, labels } = &self.kind else {
            return (false, Vec::new());
        };
        if self.present_end == 0 {
            return (false, Vec::new());
        }
        let tau = *tau;
        let mut span: Vec<(f64, bool, usize)> = self.values[..self.irrelevant_start]
            .iter()
            .enumerate()
            .map(|(vi, v)| (labels[v.data_id], vi < self.present_end, v.data_id))
            .collect();
        span.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        let (violated, far) = Self::scan_span(&span, tau);
        if violated {
            return (true, Vec::new());
        }
        for &data_id in &far {
            self.flag_irrelevant_by_data_id(data_id);
        }
        (false, far)
    }

    /// Walk a label-sorted span of (label, is_present, data_id): check that
    /// the present range stays bridgeable and collect the potential
    /// elements beyond the first too-wide gap on each side.
    fn scan_span(span: &[(f64, bool, usize)], tau: f64) -> (bool, Vec<usize>) {
        let first_present = span.iter().position(|e| e.1);
        let Some(first_present) = first_present else {
            return (false, Vec::new());
        };
        let last_present = span.iter().rposition(|e| e.1).unwrap_or(first_present);
        for window in span[first_present..=last_present].windows(2) {
            if window[1].0 - window[0].0 > tau {
                return (true, Vec::new());
            }
        }
        let mut far = Vec::new();
        let mut reach = span[last_present].0;
        let mut broken = false;
        for entry in &span[last_present + 1..] {
            if broken || entry.0 - reach > tau {
                broken = true;
                far.push(entry.2);
            } else {
                reach = entry.0;
            }
        }
        reach = span[first_present].0;
        broken = false;
        for entry in span[..first_present].iter().rev() {
            if broken || reach - entry.0 > tau {
                broken = true;
                far.push(entry.2);
            } else {
                reach = entry.0;
            }
        }
        (false, far)
    }
}

// ---- clique-pair coordination ----------------------------------------

/// Present-noise irrelevancy over a clique pair: an element over budget on
/// either twin leaves both. Returns true when a present element is over
/// budget (the node is infeasible).
pub fn sym_find_irrelevant(attributes: &mut [Attribute], first: usize, second: usize) -> bool {
    for &attr in &[first, second] {
        let a = &attributes[attr];
        if a.values[..a.present_end]
            .iter()
            .any(|v| v.present_noise > a.epsilon)
        {
            return true;
        }
    }
    let flagged = {
        let a = &attributes[first];
        let b = &attributes[second];
        a.values[a.present_end..a.irrelevant_start]
            .iter()
            .filter(|v| {
                v.present_noise > a.epsilon
                    || b.find_potential(v.data_id)
                        .is_some_and(|vi| b.values[vi].present_noise > b.epsilon)
            })
            .map(|v| v.data_id)
            .collect::<Vec<_>>()
    };
    for data_id in flagged {
        attributes[first].flag_irrelevant_by_data_id(data_id);
        attributes[second].flag_irrelevant_by_data_id(data_id);
    }
    false
}

/// Min-size irrelevancy over a clique pair; returns the newly flagged ids.
pub fn sym_find_pp_irrelevant(
    attributes: &mut [Attribute],
    first: usize,
    second: usize,
    first_threshold: u64,
    second_threshold: u64,
) -> Vec<usize> {
    let flagged = {
        let a = &attributes[first];
        let b = &attributes[second];
        a.values[a.present_end..a.irrelevant_start]
            .iter()
            .filter(|v| {
                v.present_and_potential_noise > first_threshold
                    || b.find_potential(v.data_id).is_some_and(|vi| {
                        b.values[vi].present_and_potential_noise > second_threshold
                    })
            })
            .map(|v| v.data_id)
            .collect::<Vec<_>>()
    };
    for &data_id in &flagged {
        attributes[first].flag_irrelevant_by_data_id(data_id);
        attributes[second].flag_irrelevant_by_data_id(data_id);
    }
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribute(noises: &[(u64, u64)], epsilon: u64) -> Attribute {
        let mut attr = Attribute::new(0, noises.len(), epsilon, 0, true);
        for (vi, &(present, pp)) in noises.iter().enumerate() {
            attr.values[vi].present_noise = present;
            attr.values[vi].present_and_potential_noise = pp;
        }
        attr
    }

    #[test]
    fn test_region_partition() {
        let mut attr = attribute(&[(0, 5), (0, 7), (0, 9)], 10);
        assert_eq!(attr.region_of(0), Region::Potential);
        attr.choose_value(AppealMode::PotentialNoise);
        assert_eq!(attr.chosen_data_id(), 0);
        attr.set_chosen_present();
        assert_eq!(attr.region_of(0), Region::Present);
        assert_eq!(attr.size_of_present(), 1);
    }

    #[test]
    fn test_choose_value_picks_least_noisy() {
        let mut attr = attribute(&[(0, 9), (0, 3), (0, 7)], 10);
        attr.choose_value(AppealMode::PotentialNoise);
        assert_eq!(attr.chosen_data_id(), 1);
    }

    #[test]
    fn test_chosen_absent_kept_or_dropped() {
        let mut attr = attribute(&[(0, 5), (0, 7)], 10);
        attr.choose_value(AppealMode::PotentialNoise);
        attr.set_chosen_absent(true);
        assert_eq!(attr.retained_len(), 2);
        assert_eq!(attr.size_of_present_and_potential(), 1);
        assert_eq!(attr.region_of(1), Region::Absent);

        let mut attr = attribute(&[(0, 5), (0, 7)], 10);
        attr.choose_value(AppealMode::PotentialNoise);
        attr.set_chosen_absent(false);
        assert_eq!(attr.retained_len(), 1);
    }

    #[test]
    fn test_irrelevancy_flags_over_budget_potential() {
        let mut attr = attribute(&[(3, 20), (15, 20), (4, 20)], 10);
        assert!(!attr.find_irrelevant_and_check_tau());
        assert_eq!(attr.irrelevant_count(), 1);
        let erased = attr.erase_irrelevant_values();
        assert_eq!(erased, vec![1]);
        assert_eq!(attr.region_of(attr.retained_len() - 1), Region::Absent);
    }

    #[test]
    fn test_present_over_budget_is_violation() {
        let mut attr = attribute(&[(15, 20), (0, 5)], 10);
        attr.present_end = 1;
        assert!(attr.find_irrelevant_and_check_tau());
    }

    #[test]
    fn test_finalizable_and_finalize() {
        let mut attr = attribute(&[(0, 5), (0, 9)], 10);
        assert!(attr.finalizable());
        let moved = attr.finalize();
        assert_eq!(moved, vec![0, 1]);
        assert!(attr.potential_is_empty());

        let attr = attribute(&[(0, 5), (0, 11)], 10);
        assert!(!attr.finalizable());
    }

    #[test]
    fn test_unclosed_detects_adjoinable_absent() {
        let mut attr = attribute(&[(0, 5), (0, 7)], 10);
        attr.choose_value(AppealMode::PotentialNoise);
        attr.set_chosen_absent(true);
        assert!(attr.unclosed());

        let mut attr = attribute(&[(0, 5), (0, 7)], 10);
        attr.values[1].present_and_potential_noise = 40;
        attr.choose_value(AppealMode::PotentialNoise);
        attr.set_chosen_absent(true);
        // The retained absent element is over budget.
        assert!(!attr.unclosed());
    }

    #[test]
    fn test_clean_absent_drops_hopeless_elements() {
        let mut attr = attribute(&[(0, 5), (0, 7), (0, 9)], 10);
        attr.choose_value(AppealMode::PotentialNoise);
        attr.set_chosen_absent(true);
        let absent_vi = attr.retained_len() - 1;
        attr.values[absent_vi].present_noise = 11;
        attr.clean_absent();
        assert_eq!(attr.retained_len(), 2);
    }

    fn metric_attribute(labels: &[f64], tau: f64, epsilon: u64) -> Attribute {
        Attribute::new(0, labels.len(), epsilon, 0, true)
            .into_metric(tau, Arc::new(labels.to_vec()))
    }

    #[test]
    fn test_metric_flags_unreachable_elements() {
        // Labels 10 20 30 50; present = {10}; tau = 10: 50 cannot be
        // reached through the 30 -> 50 gap.
        let mut attr = metric_attribute(&[10.0, 20.0, 30.0, 50.0], 10.0, 10);
        attr.align_pivot(0);
        attr.set_chosen_present();
        assert!(!attr.find_irrelevant_and_check_tau());
        let erased = attr.erase_irrelevant_values();
        assert_eq!(erased, vec![3]);
    }

    #[test]
    fn test_metric_violation_when_present_span_breaks() {
        // Present = {10, 30} and the only bridge (20) is the pivot about to
        // leave: the span cannot survive.
        let mut attr = metric_attribute(&[10.0, 20.0, 30.0], 10.0, 10);
        attr.align_pivot(0);
        attr.set_chosen_present();
        attr.align_pivot(2);
        attr.set_chosen_present();
        attr.align_pivot(1);
        let (violated, _) = attr.tau_far_ids_and_check_tau();
        assert!(violated);
    }

    #[test]
    fn test_tau_far_ids_include_stranded_elements() {
        // Present = {10}; removing the pivot 20 strands 30.
        let mut attr = metric_attribute(&[10.0, 20.0, 30.0], 10.0, 10);
        attr.align_pivot(0);
        attr.set_chosen_present();
        attr.align_pivot(1);
        let (violated, ids) = attr.tau_far_ids_and_check_tau();
        assert!(!violated);
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_sym_irrelevancy_mirrors_both_twins() {
        let mut attrs = vec![
            attribute(&[(3, 20), (15, 20)], 10).into_symmetric(1),
            attribute(&[(3, 20), (3, 20)], 10).into_symmetric(0),
        ];
        assert!(!sym_find_irrelevant(&mut attrs, 0, 1));
        assert_eq!(attrs[0].irrelevant_count(), 1);
        assert_eq!(attrs[1].irrelevant_count(), 1);
        assert_eq!(attrs[0].erase_irrelevant_values(), vec![1]);
        assert_eq!(attrs[1].erase_irrelevant_values(), vec![1]);
    }
}

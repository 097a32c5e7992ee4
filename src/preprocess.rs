//! Relation Reduction
//!
//! Before mining, elements that cannot belong to any pattern satisfying the
//! minimal size and area constraints are removed, together with their
//! tuples, until a fixpoint is reached. An element of dimension d survives
//! only if the m_d least-noisy cells of its hyperplane fit within ε_d,
//! where m_d is the number of non-self-loop cells in one hyperplane of the
//! smallest allowed pattern; removing an element shrinks the hyperplanes of
//! every other dimension, which may make further elements infeasible.
//!
//! The surviving elements are then remapped to dense ids: metric dimensions
//! in label order (so id order is label order), the two dimensions of a
//! clique pair through one shared mapping, every other dimension in first-
//! appearance order.

use rayon::prelude::*;
use std::io::Write;

use crate::error::{MiningError, MiningResult};
use crate::irrelevancy::non_self_loop_tuples;
use crate::parser::{NoisyTuple, ParsedRelation};

/// Reduction parameters, in external dimension order.
pub struct ReductionParams<'a> {
    /// Per-dimension tolerance in membership units (post crisp
    /// normalization)
    pub epsilon: &'a [f64],
    /// Per-dimension minimal sizes (clique pair already unified)
    pub min_sizes: &'a [usize],
    pub clique_dimensions: &'a [usize],
    /// Per-dimension tau (0 = not metric)
    pub tau: &'a [f64],
    /// Run the pruning fixpoint (the remap always runs)
    pub enabled: bool,
}

/// The reduced relation, still in external dimension order.
#[derive(Debug)]
pub struct ReducedRelation {
    pub n: usize,
    /// Tuples with remapped coordinates
    pub tuples: Vec<NoisyTuple>,
    /// New-id-to-label tables
    pub labels: Vec<Vec<String>>,
    /// Numeric label values for metric dimensions, in new-id order
    pub metric_values: Vec<Option<Vec<f64>>>,
    pub crisp: bool,
}

impl ReducedRelation {
    pub fn cardinalities(&self) -> Vec<usize> {
        self.labels.iter().map(Vec::len).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// Serialize the reduced relation in the input format. A crisp relation
    /// is written without membership degrees so that re-reading it keeps it
    /// crisp.
    pub fn write(&self, out: &mut dyn Write, dimension_separator: &str) -> MiningResult<()> {
        let sep = if dimension_separator.is_empty() {
            " "
        } else {
            dimension_separator
        };
        for tuple in &self.tuples {
            let mut first = true;
            for (dim, &id) in tuple.coords.iter().enumerate() {
                if first {
                    first = false;
                } else {
                    write!(out, "{sep}")?;
                }
                write!(out, "{}", self.labels[dim][id])?;
            }
            if !self.crisp {
                write!(out, "{sep}{}", tuple.membership)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

/// Reduce a parsed relation.
pub fn reduce(relation: ParsedRelation, params: &ReductionParams<'_>) -> MiningResult<ReducedRelation> {
    let n = relation.n;
    let cardinalities = relation.cardinalities();
    let mut alive_tuple = vec![true; relation.tuples.len()];
    let mut alive_elem: Vec<Vec<bool>> = cardinalities.iter().map(|&c| vec![true; c]).collect();
    let mut alive_counts = cardinalities.clone();

    // Tuple indices per (dimension, element)
    let mut occurrences: Vec<Vec<Vec<usize>>> =
        cardinalities.iter().map(|&c| vec![Vec::new(); c]).collect();
    for (t, tuple) in relation.tuples.iter().enumerate() {
        for (dim, &id) in tuple.coords.iter().enumerate() {
            occurrences[dim][id].push(t);
        }
    }

    if params.enabled {
        let sym_min = params
            .clique_dimensions
            .iter()
            .map(|&d| params.min_sizes[d])
            .max()
            .unwrap_or(0);
        loop {
            let sym_current = params
                .clique_dimensions
                .first()
                .map_or(0, |&d| alive_counts[d]);
            let doomed: Vec<(usize, usize)> = (0..n)
                .into_par_iter()
                .flat_map_iter(|dim| {
                    let min_cells = non_self_loop_tuples(
                        params.min_sizes,
                        dim,
                        params.clique_dimensions,
                        sym_min,
                    );
                    let current_cells = non_self_loop_tuples(
                        &alive_counts,
                        dim,
                        params.clique_dimensions,
                        sym_current,
                    );
                    let epsilon = params.epsilon[dim];
                    let occurrences = &occurrences;
                    let alive_elem = &alive_elem;
                    let alive_tuple = &alive_tuple;
                    let tuples = &relation.tuples;
                    (0..cardinalities[dim]).filter_map(move |elem| {
                        if !alive_elem[dim][elem] {
                            return None;
                        }
                        let infeasible = hyperplane_infeasible(
                            &occurrences[dim][elem],
                            alive_tuple,
                            tuples,
                            min_cells,
                            current_cells,
                            epsilon,
                        );
                        infeasible.then_some((dim, elem))
                    })
                })
                .collect();
            if doomed.is_empty() {
                break;
            }
            for (dim, elem) in doomed {
                kill_element(
                    dim,
                    elem,
                    params.clique_dimensions,
                    &occurrences,
                    &mut alive_elem,
                    &mut alive_counts,
                    &mut alive_tuple,
                );
            }
        }
    }

    remap(&relation, params, &alive_elem, &alive_tuple)
}

/// True when even the least-noisy admissible sub-hyperplane of this element
/// misses more mass than the dimension tolerates.
fn hyperplane_infeasible(
    occurrence: &[usize],
    alive_tuple: &[bool],
    tuples: &[NoisyTuple],
    min_cells: usize,
    current_cells: usize,
    epsilon: f64,
) -> bool {
    if min_cells == 0 {
        return false;
    }
    if min_cells > current_cells {
        return true;
    }
    let mut noises: Vec<f64> = occurrence
        .iter()
        .filter(|&&t| alive_tuple[t])
        .map(|&t| 1.0 - tuples[t].membership)
        .collect();
    let stored = noises.len();
    let minimal_noise = if stored >= min_cells {
        noises.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        noises[..min_cells].iter().sum::<f64>()
    } else {
        noises.iter().sum::<f64>() + (min_cells - stored) as f64
    };
    minimal_noise > epsilon
}

fn kill_element(
    dim: usize,
    elem: usize,
    clique: &[usize],
    occurrences: &[Vec<Vec<usize>>],
    alive_elem: &mut [Vec<bool>],
    alive_counts: &mut [usize],
    alive_tuple: &mut [bool],
) {
    let dims: Vec<usize> = if clique.contains(&dim) {
        clique.to_vec()
    } else {
        vec![dim]
    };
    for d in dims {
        if !alive_elem[d][elem] {
            continue;
        }
        alive_elem[d][elem] = false;
        alive_counts[d] -= 1;
        for &t in &occurrences[d][elem] {
            alive_tuple[t] = false;
        }
    }
}

fn remap(
    relation: &ParsedRelation,
    params: &ReductionParams<'_>,
    alive_elem: &[Vec<bool>],
    alive_tuple: &[bool],
) -> MiningResult<ReducedRelation> {
    let n = relation.n;
    let mut new_ids: Vec<Vec<Option<usize>>> = Vec::with_capacity(n);
    let mut labels: Vec<Vec<String>> = Vec::with_capacity(n);
    let mut metric_values: Vec<Option<Vec<f64>>> = Vec::with_capacity(n);
    let mut shared_clique: Option<(Vec<Option<usize>>, Vec<String>)> = None;

    for dim in 0..n {
        if params.clique_dimensions.contains(&dim) {
            if shared_clique.is_none() {
                shared_clique = Some(identity_order(dim, relation, alive_elem));
            }
            let (ids, labs) = shared_clique.clone().unwrap_or_default();
            new_ids.push(ids);
            labels.push(labs);
            metric_values.push(None);
            continue;
        }
        if params.tau.get(dim).copied().unwrap_or(0.0) != 0.0 {
            // Metric dimension: ids in increasing label order.
            let mut survivors: Vec<(f64, usize)> = Vec::new();
            for (old, &alive) in alive_elem[dim].iter().enumerate() {
                if !alive {
                    continue;
                }
                let label = &relation.labels[dim][old];
                let value: f64 = label.parse().map_err(|_| {
                    MiningError::usage(format!(
                        "tau option requires numeric labels in dimension {dim}; found '{label}'"
                    ))
                })?;
                survivors.push((value, old));
            }
            survivors.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
            let mut ids = vec![None; relation.labels[dim].len()];
            let mut labs = Vec::with_capacity(survivors.len());
            let mut values = Vec::with_capacity(survivors.len());
            for (new, (value, old)) in survivors.into_iter().enumerate() {
                ids[old] = Some(new);
                labs.push(relation.labels[dim][old].clone());
                values.push(value);
            }
            new_ids.push(ids);
            labels.push(labs);
            metric_values.push(Some(values));
        } else {
            let (ids, labs) = identity_order(dim, relation, alive_elem);
            new_ids.push(ids);
            labels.push(labs);
            metric_values.push(None);
        }
    }

    let tuples = relation
        .tuples
        .iter()
        .enumerate()
        .filter(|&(t, _)| alive_tuple[t])
        .map(|(_, tuple)| {
            let coords = tuple
                .coords
                .iter()
                .enumerate()
                .map(|(dim, &old)| {
                    new_ids[dim][old].expect("a live tuple only references live elements")
                })
                .collect();
            NoisyTuple {
                coords,
                membership: tuple.membership,
            }
        })
        .collect();

    Ok(ReducedRelation {
        n,
        tuples,
        labels,
        metric_values,
        crisp: relation.crisp,
    })
}

fn identity_order(
    dim: usize,
    relation: &ParsedRelation,
    alive_elem: &[Vec<bool>],
) -> (Vec<Option<usize>>, Vec<String>) {
    let mut ids = vec![None; relation.labels[dim].len()];
    let mut labels = Vec::new();
    for (old, &alive) in alive_elem[dim].iter().enumerate() {
        if alive {
            ids[old] = Some(labels.len());
            labels.push(relation.labels[dim][old].clone());
        }
    }
    (ids, labels)
}

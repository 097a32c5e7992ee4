//! Min-Size Element Pruning Thresholds
//!
//! Given the current minimal and maximal pattern shapes, computes a
//! per-dimension bound on the present-and-potential noise an element may
//! carry: an element whose hyperplane already misses more mass than the
//! bound cannot survive in any feasible descendant pattern, so it can be
//! discarded from the search space.
//!
//! All floating-point subexpressions are `ceil`ed before use; the accepted
//! round-off is bounded by one noise unit (1/noisePerUnit).

/// Number of non-self-loop cells in one hyperplane of a pattern whose
/// per-dimension sizes are `sizes`, fixing one element of `dim`.
///
/// `clique` lists the dimensions sharing a symmetric domain (empty when no
/// dimension is symmetric) and `sym_size` the number of symmetric elements
/// to assume when counting self-loops from outside the clique.
pub fn non_self_loop_tuples(sizes: &[usize], dim: usize, clique: &[usize], sym_size: usize) -> usize {
    let full: usize = sizes
        .iter()
        .enumerate()
        .filter(|(d, _)| *d != dim)
        .map(|(_, s)| *s)
        .product();
    if clique.is_empty() {
        return full;
    }
    if clique.contains(&dim) {
        // Self-loops in the hyperplane of a symmetric element: the other
        // clique coordinates equal the fixed element.
        let loops: usize = sizes
            .iter()
            .enumerate()
            .filter(|(d, _)| !clique.contains(d))
            .map(|(_, s)| *s)
            .product();
        full.saturating_sub(loops)
    } else {
        let loops: usize = sizes
            .iter()
            .enumerate()
            .filter(|(d, _)| *d != dim && !clique.contains(d))
            .map(|(_, s)| *s)
            .product();
        full.saturating_sub(sym_size * loops)
    }
}

/// Shape of the current search node, in internal dimension order.
pub struct PatternShape<'a> {
    /// Configured minimal sizes
    pub min_sizes: &'a [usize],
    /// |present| per dimension
    pub present_sizes: &'a [usize],
    /// |present ∪ potential| per dimension
    pub pp_sizes: &'a [usize],
    /// Minimal area
    pub min_area: f64,
    /// Internal ids of the symmetric pair, if any (always adjacent)
    pub symmetric: Option<(usize, usize)>,
}

/// Per-dimension present-and-potential noise thresholds for min-size
/// element pruning.
pub fn irrelevancy_thresholds(
    shape: &PatternShape<'_>,
    epsilon_units: &[u64],
    noise_per_unit: u64,
) -> Vec<u64> {
    let n = shape.pp_sizes.len();
    let npu = noise_per_unit as f64;
    let mut min_pattern: Vec<usize> = (0..n)
        .map(|d| shape.min_sizes[d].max(shape.present_sizes[d]))
        .collect();
    let max_pattern: Vec<usize> = shape.pp_sizes.to_vec();

    match shape.symmetric {
        None => (0..n)
            .map(|d| {
                let reachable = non_self_loop_tuples(&max_pattern, d, &[], 0) as f64;
                let needed = (non_self_loop_tuples(&min_pattern, d, &[], 0) as f64)
                    .max((shape.min_area / max_pattern[d] as f64).ceil());
                add_slack(epsilon_units[d], npu * (reachable - needed))
            })
            .collect(),
        Some((first, second)) => {
            let clique = [first, second];
            let min_sym_by_sizes = min_pattern[first].min(min_pattern[second]);
            let max_sym = max_pattern[first].min(max_pattern[second]);
            let max_area_ignoring_sym: f64 = (0..n)
                .filter(|d| !clique.contains(d))
                .map(|d| max_pattern[d] as f64)
                .product();
            let min_sym_by_area = (shape.min_area / max_area_ignoring_sym)
                .powf(1.0 / clique.len() as f64)
                .ceil();
            let min_sym = if min_sym_by_area > min_sym_by_sizes as f64 {
                min_sym_by_area as usize
            } else {
                min_sym_by_sizes
            };
            min_pattern[first] = min_sym;
            min_pattern[second] = min_sym;
            (0..n)
                .map(|d| {
                    let reachable = non_self_loop_tuples(&max_pattern, d, &clique, min_sym) as f64;
                    let area_correction = if clique.contains(&d) {
                        (shape.min_area / max_pattern[d] as f64 - max_area_ignoring_sym).ceil()
                    } else {
                        ((shape.min_area - max_area_ignoring_sym * max_sym as f64)
                            / max_pattern[d] as f64)
                            .ceil()
                    };
                    let needed = (non_self_loop_tuples(&min_pattern, d, &clique, min_sym) as f64)
                        .max(area_correction);
                    add_slack(epsilon_units[d], npu * (reachable - needed))
                })
                .collect()
        }
    }
}

/// ε_d·N plus the (possibly negative) noise slack between the maximal and
/// the minimal pattern shape, saturating at zero.
fn add_slack(epsilon_units: u64, slack: f64) -> u64 {
    let total = epsilon_units as f64 + slack;
    if total <= 0.0 {
        0
    } else {
        total as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_hyperplane_count() {
        // 3 x 4 x 5 tensor: a hyperplane of dimension 1 holds 3*5 cells.
        assert_eq!(non_self_loop_tuples(&[3, 4, 5], 1, &[], 0), 15);
    }

    #[test]
    fn test_symmetric_hyperplane_excludes_self_loops() {
        // 2-D clique over 4 shared elements: a hyperplane holds 4 cells, one
        // of which is the self-loop.
        assert_eq!(non_self_loop_tuples(&[4, 4], 0, &[0, 1], 4), 3);
        // From a non-clique dimension of a 3-D relation, one self-loop per
        // symmetric element.
        assert_eq!(non_self_loop_tuples(&[4, 4, 5], 2, &[0, 1], 4), 12);
    }

    #[test]
    fn test_thresholds_shrink_with_larger_min_sizes() {
        let eps = [10u64, 10];
        let loose = irrelevancy_thresholds(
            &PatternShape {
                min_sizes: &[1, 1],
                present_sizes: &[0, 0],
                pp_sizes: &[3, 3],
                min_area: 0.0,
                symmetric: None,
            },
            &eps,
            100,
        );
        let tight = irrelevancy_thresholds(
            &PatternShape {
                min_sizes: &[3, 3],
                present_sizes: &[0, 0],
                pp_sizes: &[3, 3],
                min_area: 0.0,
                symmetric: None,
            },
            &eps,
            100,
        );
        assert!(tight[0] < loose[0]);
        // With the minimal pattern equal to the maximal one, only ε slack
        // remains.
        assert_eq!(tight[0], 10);
    }

    #[test]
    fn test_min_area_tightens_threshold() {
        let eps = [0u64, 0];
        let shape = PatternShape {
            min_sizes: &[1, 1],
            present_sizes: &[0, 0],
            pp_sizes: &[3, 3],
            min_area: 6.0,
            symmetric: None,
        };
        let th = irrelevancy_thresholds(&shape, &eps, 100);
        // An element must reach ceil(6 / 3) = 2 cells; slack is 3 - 2 = 1.
        assert_eq!(th[0], 100);
    }

    #[test]
    fn test_infeasible_shape_saturates_to_zero() {
        let eps = [5u64];
        let shape = PatternShape {
            min_sizes: &[4],
            present_sizes: &[0],
            pp_sizes: &[2],
            min_area: 0.0,
            symmetric: None,
        };
        // One-dimensional corner case: hyperplane counts are empty products.
        let th = irrelevancy_thresholds(&shape, &eps, 100);
        assert_eq!(th[0], 5);
    }
}

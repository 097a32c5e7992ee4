//! Tuple-Valued Measures
//!
//! Side files may attach a value (utility) or a point (slope) to
//! individual tuples. A tuple is *committed* once every coordinate is
//! present and *dead* once any coordinate is absent; present elements
//! never leave a pattern, so committed tuples are permanent and dead
//! tuples stay dead along a branch.

use super::Measure;
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable tuple values shared by every clone of a measure.
#[derive(Debug)]
pub struct UtilityData {
    /// (internal coordinates, value)
    pub tuples: Vec<(Vec<usize>, f64)>,
    /// (dimension, data id) -> indices into `tuples`
    pub index: HashMap<(usize, usize), Vec<usize>>,
}

impl UtilityData {
    pub fn new(tuples: Vec<(Vec<usize>, f64)>) -> Self {
        let mut index: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for (t, (coords, _)) in tuples.iter().enumerate() {
            for (dim, &id) in coords.iter().enumerate() {
                index.entry((dim, id)).or_default().push(t);
            }
        }
        UtilityData { tuples, index }
    }
}

/// Minimal total utility of the tuples inside the pattern.
///
/// The maintained bound is an upper bound on any descendant's utility: the
/// positive values of every live tuple plus the negative values already
/// committed.
#[derive(Debug, Clone)]
pub struct MinUtility {
    data: Arc<UtilityData>,
    min_utility: f64,
    alive: Vec<bool>,
    /// Coordinates not yet present, per tuple
    remaining: Vec<u32>,
    bound: f64,
}

impl MinUtility {
    pub fn new(data: Arc<UtilityData>, n: usize, min_utility: f64) -> Self {
        let alive = vec![true; data.tuples.len()];
        let remaining = vec![n as u32; data.tuples.len()];
        let bound = data.tuples.iter().map(|(_, v)| v.max(0.0)).sum();
        MinUtility {
            data,
            min_utility,
            alive,
            remaining,
            bound,
        }
    }

    fn tuples_through<'a>(
        data: &'a UtilityData,
        dim: usize,
        ids: &[usize],
    ) -> impl Iterator<Item = usize> + 'a {
        let ids = ids.to_vec();
        ids.into_iter()
            .flat_map(move |id| data.index.get(&(dim, id)).into_iter().flatten().copied())
    }
}

impl Measure for MinUtility {
    fn violation_after_adding(&mut self, dim: usize, ids: &[usize]) -> bool {
        let data = Arc::clone(&self.data);
        for t in Self::tuples_through(&data, dim, ids) {
            if !self.alive[t] {
                continue;
            }
            self.remaining[t] -= 1;
            let value = data.tuples[t].1;
            if self.remaining[t] == 0 && value < 0.0 {
                self.bound += value;
            }
        }
        self.bound < self.min_utility
    }

    fn violation_after_removing(&mut self, dim: usize, ids: &[usize]) -> bool {
        let data = Arc::clone(&self.data);
        for t in Self::tuples_through(&data, dim, ids) {
            if !self.alive[t] {
                continue;
            }
            self.alive[t] = false;
            let value = data.tuples[t].1;
            if value > 0.0 {
                self.bound -= value;
            }
        }
        self.bound < self.min_utility
    }
}

/// Immutable slope points shared by every clone of a measure.
#[derive(Debug)]
pub struct SlopeData {
    /// (internal coordinates, x, y)
    pub tuples: Vec<(Vec<usize>, f64, f64)>,
    pub index: HashMap<(usize, usize), Vec<usize>>,
}

impl SlopeData {
    pub fn new(tuples: Vec<(Vec<usize>, f64, f64)>) -> Self {
        let mut index: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
        for (t, (coords, _, _)) in tuples.iter().enumerate() {
            for (dim, &id) in coords.iter().enumerate() {
                index.entry((dim, id)).or_default().push(t);
            }
        }
        SlopeData { tuples, index }
    }
}

/// Minimal least-squares slope over the points of the tuples inside the
/// pattern.
///
/// A free subset of potential tuples admits no sound slope bound, so the
/// constraint only fires once every live point is committed (which is
/// always the case at a leaf); patterns covering fewer than two distinct
/// abscissas count as flat.
#[derive(Debug, Clone)]
pub struct MinSlope {
    data: Arc<SlopeData>,
    min_slope: f64,
    alive: Vec<bool>,
    remaining: Vec<u32>,
    uncommitted: usize,
    count: f64,
    sum_x: f64,
    sum_y: f64,
    sum_xx: f64,
    sum_xy: f64,
}

impl MinSlope {
    pub fn new(data: Arc<SlopeData>, n: usize, min_slope: f64) -> Self {
        let alive = vec![true; data.tuples.len()];
        let remaining = vec![n as u32; data.tuples.len()];
        let uncommitted = data.tuples.len();
        MinSlope {
            data,
            min_slope,
            alive,
            remaining,
            uncommitted,
            count: 0.0,
            sum_x: 0.0,
            sum_y: 0.0,
            sum_xx: 0.0,
            sum_xy: 0.0,
        }
    }

    fn violated(&self) -> bool {
        if self.uncommitted > 0 {
            return false;
        }
        let denominator = self.count * self.sum_xx - self.sum_x * self.sum_x;
        let slope = if denominator > 0.0 {
            (self.count * self.sum_xy - self.sum_x * self.sum_y) / denominator
        } else {
            0.0
        };
        slope < self.min_slope
    }
}

impl Measure for MinSlope {
    fn violation_after_adding(&mut self, dim: usize, ids: &[usize]) -> bool {
        let data = Arc::clone(&self.data);
        for &id in ids {
            let Some(tuples) = data.index.get(&(dim, id)) else {
                continue;
            };
            for &t in tuples {
                if !self.alive[t] {
                    continue;
                }
                self.remaining[t] -= 1;
                if self.remaining[t] == 0 {
                    let (_, x, y) = data.tuples[t];
                    self.uncommitted -= 1;
                    self.count += 1.0;
                    self.sum_x += x;
                    self.sum_y += y;
                    self.sum_xx += x * x;
                    self.sum_xy += x * y;
                }
            }
        }
        self.violated()
    }

    fn violation_after_removing(&mut self, dim: usize, ids: &[usize]) -> bool {
        let data = Arc::clone(&self.data);
        for &id in ids {
            let Some(tuples) = data.index.get(&(dim, id)) else {
                continue;
            };
            for &t in tuples {
                if self.alive[t] {
                    self.alive[t] = false;
                    self.uncommitted -= 1;
                }
            }
        }
        self.violated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_utility_bound_shrinks() {
        let data = Arc::new(UtilityData::new(vec![
            (vec![0, 0], 5.0),
            (vec![0, 1], 3.0),
            (vec![1, 0], -4.0),
        ]));
        let mut measure = MinUtility::new(data, 2, 4.0);
        // Initial bound: 5 + 3 = 8.
        assert!(!measure.violation_after_removing(1, &[1]));
        // Bound is now 5; committing the negative tuple drops it to 1.
        assert!(!measure.violation_after_adding(0, &[1]));
        assert!(measure.violation_after_adding(1, &[0]));
    }

    #[test]
    fn test_min_slope_fires_once_committed() {
        let data = Arc::new(SlopeData::new(vec![
            (vec![0, 0], 1.0, 1.0),
            (vec![1, 1], 2.0, 5.0),
        ]));
        let mut measure = MinSlope::new(Arc::clone(&data), 2, 2.0);
        assert!(!measure.violation_after_adding(0, &[0]));
        assert!(!measure.violation_after_adding(1, &[0]));
        assert!(!measure.violation_after_adding(0, &[1]));
        // Last commitment: slope (5-1)/(2-1) = 4 >= 2.
        assert!(!measure.violation_after_adding(1, &[1]));

        let mut steep = MinSlope::new(data, 2, 5.0);
        assert!(!steep.violation_after_adding(0, &[0]));
        assert!(!steep.violation_after_adding(1, &[0]));
        assert!(!steep.violation_after_adding(0, &[1]));
        assert!(steep.violation_after_adding(1, &[1]));
    }
}

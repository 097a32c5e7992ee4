//! Size and Area Measures

use super::Measure;

/// Minimal number of elements in one dimension.
#[derive(Debug, Clone)]
pub struct MinSize {
    dim: usize,
    min: usize,
    /// |present ∪ potential| of the dimension
    possible: usize,
}

impl MinSize {
    pub fn new(dim: usize, cardinality: usize, min: usize) -> Self {
        MinSize {
            dim,
            min,
            possible: cardinality,
        }
    }
}

impl Measure for MinSize {
    fn monotone(&self) -> bool {
        true
    }

    fn violation_after_adding(&mut self, _dim: usize, _ids: &[usize]) -> bool {
        false
    }

    fn violation_after_removing(&mut self, dim: usize, ids: &[usize]) -> bool {
        if dim == self.dim {
            self.possible -= ids.len().min(self.possible);
            return self.possible < self.min;
        }
        false
    }
}

/// Maximal number of elements in one dimension.
#[derive(Debug, Clone)]
pub struct MaxSize {
    dim: usize,
    max: usize,
    present: usize,
}

impl MaxSize {
    pub fn new(dim: usize, max: usize) -> Self {
        MaxSize {
            dim,
            max,
            present: 0,
        }
    }
}

impl Measure for MaxSize {
    fn violation_after_adding(&mut self, dim: usize, ids: &[usize]) -> bool {
        if dim == self.dim {
            self.present += ids.len();
            return self.present > self.max;
        }
        false
    }

    fn violation_after_removing(&mut self, _dim: usize, _ids: &[usize]) -> bool {
        false
    }
}

/// Minimal area: the product of the per-dimension sizes.
#[derive(Debug, Clone)]
pub struct MinArea {
    /// |present ∪ potential| per dimension
    possible_sizes: Vec<usize>,
    min_area: u128,
}

impl MinArea {
    pub fn new(cardinalities: Vec<usize>, min_area: usize) -> Self {
        MinArea {
            possible_sizes: cardinalities,
            min_area: min_area as u128,
        }
    }

    fn possible_area(&self) -> u128 {
        self.possible_sizes.iter().map(|&s| s as u128).product()
    }
}

impl Measure for MinArea {
    fn monotone(&self) -> bool {
        true
    }

    fn violation_after_adding(&mut self, _dim: usize, _ids: &[usize]) -> bool {
        // The reachable area may already be below the minimum without any
        // removal in this dimension (small relation, tight budget).
        self.possible_area() < self.min_area
    }

    fn violation_after_removing(&mut self, dim: usize, ids: &[usize]) -> bool {
        self.possible_sizes[dim] -= ids.len().min(self.possible_sizes[dim]);
        self.possible_area() < self.min_area
    }
}

/// Maximal area.
#[derive(Debug, Clone)]
pub struct MaxArea {
    present_sizes: Vec<usize>,
    max_area: u128,
}

impl MaxArea {
    pub fn new(n: usize, max_area: usize) -> Self {
        MaxArea {
            present_sizes: vec![0; n],
            max_area: max_area as u128,
        }
    }
}

impl Measure for MaxArea {
    fn violation_after_adding(&mut self, dim: usize, ids: &[usize]) -> bool {
        self.present_sizes[dim] += ids.len();
        let area: u128 = self.present_sizes.iter().map(|&s| s as u128).product();
        area > self.max_area
    }

    fn violation_after_removing(&mut self, _dim: usize, _ids: &[usize]) -> bool {
        false
    }
}

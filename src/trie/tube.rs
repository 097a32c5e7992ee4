//! Tube Variants
//!
//! A tube is the last trie level: the noise values of the cells obtained by
//! fixing every coordinate but the last. Missing cells carry the full noise
//! of one unit of membership mass. A tube starts sparse and is converted to
//! its dense counterpart when the occupancy ratio crosses the density
//! threshold at construction; no conversion happens while mining.

use bitvec::prelude::*;
use std::collections::{HashMap, HashSet};

/// Construction parameters shared by every tube of a store.
#[derive(Debug, Clone, Copy)]
pub struct TubeLayout {
    pub cardinality: usize,
    pub full_noise: u64,
    pub crisp: bool,
    pub density_threshold: f64,
}

#[derive(Debug, Clone)]
pub enum Tube {
    /// No stored cell: everything in this tube is fully noisy.
    Empty,
    /// Cell id -> noise; missing ids are fully noisy.
    Sparse(HashMap<usize, u64>),
    /// Noise per cell id, initialized to full noise.
    Dense(Vec<u64>),
    /// Present cell ids of a crisp relation.
    CrispSparse(HashSet<usize>),
    /// Presence bit per cell id of a crisp relation.
    CrispDense(BitVec),
}

impl Tube {
    /// Noise of one cell.
    pub fn noise(&self, id: usize, full_noise: u64) -> u64 {
        match self {
            Tube::Empty => full_noise,
            Tube::Sparse(cells) => cells.get(&id).copied().unwrap_or(full_noise),
            Tube::Dense(cells) => cells[id],
            Tube::CrispSparse(cells) => {
                if cells.contains(&id) {
                    0
                } else {
                    full_noise
                }
            }
            Tube::CrispDense(bits) => {
                if bits[id] {
                    0
                } else {
                    full_noise
                }
            }
        }
    }

    /// Store one cell, converting sparse to dense past the density
    /// threshold.
    pub fn set(&mut self, id: usize, noise: u64, layout: &TubeLayout) {
        if matches!(self, Tube::Empty) {
            *self = if layout.crisp {
                Tube::CrispSparse(HashSet::new())
            } else {
                Tube::Sparse(HashMap::new())
            };
        }
        match self {
            Tube::Sparse(cells) => {
                cells.insert(id, noise);
                if cells.len() as f64 > layout.density_threshold * layout.cardinality as f64 {
                    let mut dense = vec![layout.full_noise; layout.cardinality];
                    for (&cell, &value) in cells.iter() {
                        dense[cell] = value;
                    }
                    *self = Tube::Dense(dense);
                }
            }
            Tube::Dense(cells) => cells[id] = noise,
            Tube::CrispSparse(cells) => {
                debug_assert_eq!(noise, 0, "a crisp cell is either fully present or missing");
                cells.insert(id);
                if cells.len() as f64 > layout.density_threshold * layout.cardinality as f64 {
                    let mut bits = bitvec![0; layout.cardinality];
                    for &cell in cells.iter() {
                        bits.set(cell, true);
                    }
                    *self = Tube::CrispDense(bits);
                }
            }
            Tube::CrispDense(bits) => {
                debug_assert_eq!(noise, 0, "a crisp cell is either fully present or missing");
                bits.set(id, true);
            }
            Tube::Empty => unreachable!("empty tubes are materialized above"),
        }
    }
}

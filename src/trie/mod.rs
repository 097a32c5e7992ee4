//! Noise Store
//!
//! A prefix trie over the internal dimensions holding the noise of every
//! cell of the reduced tensor. Interior levels are dense child vectors over
//! the post-reduction cardinalities; the last level holds [`Tube`]s whose
//! missing cells carry one full unit of noise.
//!
//! The store's content is immutable while mining. Declaring an element
//! present or absent runs a *walk*: a traversal of the element's slice,
//! scoped by the calling node's attribute regions, that pushes the affected
//! noise into the per-element counters of every other dimension. Absent
//! elements never lie on a qualifying path, so branches that left the
//! search space are never visited again, and the single store can be shared
//! by the whole depth-first search without unwinding.

mod tube;

pub use tube::{Tube, TubeLayout};

use crate::attribute::{Attribute, Region};

#[derive(Debug)]
enum TrieNode {
    Interior(Vec<TrieNode>),
    Leaf(Tube),
}

/// The shared noise store.
#[derive(Debug)]
pub struct NoiseStore {
    root: TrieNode,
    cardinalities: Vec<usize>,
    noise_per_unit: u64,
    crisp: bool,
    density_threshold: f64,
}

impl NoiseStore {
    /// Build an all-noisy store over the reduced cardinalities (internal
    /// dimension order).
    pub fn new(
        cardinalities: Vec<usize>,
        noise_per_unit: u64,
        crisp: bool,
        density_threshold: f64,
    ) -> Self {
        let root = Self::build(&cardinalities, 0);
        NoiseStore {
            root,
            cardinalities,
            noise_per_unit,
            crisp,
            density_threshold,
        }
    }

    fn build(cardinalities: &[usize], level: usize) -> TrieNode {
        if level + 1 == cardinalities.len() {
            TrieNode::Leaf(Tube::Empty)
        } else {
            TrieNode::Interior(
                (0..cardinalities[level])
                    .map(|_| Self::build(cardinalities, level + 1))
                    .collect(),
            )
        }
    }

    pub fn noise_per_unit(&self) -> u64 {
        self.noise_per_unit
    }

    fn layout(&self) -> TubeLayout {
        TubeLayout {
            cardinality: self.cardinalities[self.cardinalities.len() - 1],
            full_noise: self.noise_per_unit,
            crisp: self.crisp,
            density_threshold: self.density_threshold,
        }
    }

    /// Store one cell and withdraw its stored mass from the
    /// present-and-potential counters of its coordinates. Only valid during
    /// construction, while value indices still equal data ids.
    fn set_cell(&mut self, coords: &[usize], noise: u64, attributes: &mut [Attribute]) {
        let layout = self.layout();
        let (tube, level) = Self::leaf_mut(&mut self.root, coords, 0);
        tube.set(coords[level], noise, &layout);
        let recovered = self.noise_per_unit - noise;
        for (dim, &id) in coords.iter().enumerate() {
            attributes[dim].recover_initial_noise(id, recovered);
        }
    }

    fn leaf_mut<'a>(node: &'a mut TrieNode, coords: &[usize], level: usize) -> (&'a mut Tube, usize) {
        match node {
            TrieNode::Interior(children) => {
                Self::leaf_mut(&mut children[coords[level]], coords, level + 1)
            }
            TrieNode::Leaf(tube) => (tube, level),
        }
    }

    /// Insert a zero-noise cell at every position whose symmetric
    /// coordinates are equal, so self-loops never contribute to any noise
    /// total. Must run before the regular cells are inserted.
    pub fn set_self_loops(&mut self, first: usize, second: usize, attributes: &mut [Attribute]) {
        let n = self.cardinalities.len();
        let mut coords = vec![0usize; n];
        let sym_cardinality = self.cardinalities[first];
        for e in 0..sym_cardinality {
            coords[first] = e;
            coords[second] = e;
            self.fill_self_loops(&mut coords, 0, first, second, attributes);
        }
    }

    fn fill_self_loops(
        &mut self,
        coords: &mut Vec<usize>,
        dim: usize,
        first: usize,
        second: usize,
        attributes: &mut [Attribute],
    ) {
        if dim == coords.len() {
            let cell = coords.clone();
            self.set_cell(&cell, 0, attributes);
            return;
        }
        if dim == first || dim == second {
            self.fill_self_loops(coords, dim + 1, first, second, attributes);
            return;
        }
        for id in 0..self.cardinalities[dim] {
            coords[dim] = id;
            self.fill_self_loops(coords, dim + 1, first, second, attributes);
        }
    }

    /// Bulk-insert the cells of one hyperplane of the first internal
    /// dimension. `cells` holds full internal coordinates.
    pub fn set_hyperplane(
        &mut self,
        hyperplane_id: usize,
        cells: &[(Vec<usize>, u64)],
        attributes: &mut [Attribute],
    ) {
        for (coords, noise) in cells {
            debug_assert_eq!(coords[0], hyperplane_id);
            self.set_cell(coords, *noise, attributes);
        }
    }

    /// Declare the chosen value of `dim` present: push the noise of every
    /// cell of its slice onto the present counters of the other dimensions.
    /// A cell qualifies for an element's counter when every remaining
    /// coordinate is present, so paths carrying two non-present coordinates
    /// are dead.
    pub fn set_present(&self, attributes: &mut [Attribute], dim: usize, pivot: usize) {
        let mut path = Vec::with_capacity(self.cardinalities.len());
        self.present_walk(&self.root, 0, dim, pivot, attributes, &mut path, None);
    }

    /// [`Self::set_present`] mirrored over a clique pair; both twins must
    /// already hold the pivot in their present region. Self-loop cells
    /// carry no noise, so the two slices never double-count.
    pub fn set_symmetric_present(
        &self,
        attributes: &mut [Attribute],
        first: usize,
        second: usize,
        pivot: usize,
    ) {
        self.set_present(attributes, first, pivot);
        self.set_present(attributes, second, pivot);
    }

    /// Withdraw the elements of `removed` (dimension `dim`) from the
    /// present-and-potential counters of every other dimension. A cell
    /// qualifies when every remaining coordinate is present or potential,
    /// so paths carrying two absent coordinates are dead.
    pub fn set_absent(&self, attributes: &mut [Attribute], dim: usize, removed: &[usize]) {
        let mut path = Vec::with_capacity(self.cardinalities.len());
        for &id in removed {
            self.absent_walk(&self.root, 0, dim, id, attributes, &mut path, None);
        }
    }

    /// [`Self::set_absent`] mirrored over a clique pair.
    pub fn set_symmetric_absent(
        &self,
        attributes: &mut [Attribute],
        first: usize,
        second: usize,
        removed: &[usize],
    ) {
        self.set_absent(attributes, first, removed);
        self.set_absent(attributes, second, removed);
    }

    fn present_walk(
        &self,
        node: &TrieNode,
        level: usize,
        fixed_dim: usize,
        fixed_id: usize,
        attributes: &mut [Attribute],
        path: &mut Vec<(usize, usize)>,
        nonpresent: Option<(usize, usize)>,
    ) {
        match node {
            TrieNode::Interior(children) => {
                if level == fixed_dim {
                    self.present_walk(
                        &children[fixed_id],
                        level + 1,
                        fixed_dim,
                        fixed_id,
                        attributes,
                        path,
                        nonpresent,
                    );
                    return;
                }
                for vi in 0..attributes[level].retained_len() {
                    let carried = match attributes[level].region_of(vi) {
                        Region::Present => nonpresent,
                        _ => {
                            if nonpresent.is_some() {
                                continue;
                            }
                            Some((level, vi))
                        }
                    };
                    let child = &children[attributes[level].data_id(vi)];
                    path.push((level, vi));
                    self.present_walk(
                        child,
                        level + 1,
                        fixed_dim,
                        fixed_id,
                        attributes,
                        path,
                        carried,
                    );
                    path.pop();
                }
            }
            TrieNode::Leaf(tube) => {
                if level == fixed_dim {
                    let noise = tube.noise(fixed_id, self.noise_per_unit);
                    if noise != 0 {
                        Self::credit_present(noise, path, nonpresent, attributes);
                    }
                    return;
                }
                for vi in 0..attributes[level].retained_len() {
                    let noise = tube.noise(attributes[level].data_id(vi), self.noise_per_unit);
                    if noise == 0 {
                        continue;
                    }
                    match attributes[level].region_of(vi) {
                        Region::Present => match nonpresent {
                            Some((a, pv)) => attributes[a].add_present_noise(pv, noise),
                            None => {
                                for &(a, pv) in path.iter() {
                                    attributes[a].add_present_noise(pv, noise);
                                }
                                attributes[level].add_present_noise(vi, noise);
                            }
                        },
                        _ => {
                            if nonpresent.is_none() {
                                attributes[level].add_present_noise(vi, noise);
                            }
                        }
                    }
                }
            }
        }
    }

    fn credit_present(
        noise: u64,
        path: &[(usize, usize)],
        nonpresent: Option<(usize, usize)>,
        attributes: &mut [Attribute],
    ) {
        match nonpresent {
            Some((a, pv)) => attributes[a].add_present_noise(pv, noise),
            None => {
                for &(a, pv) in path {
                    attributes[a].add_present_noise(pv, noise);
                }
            }
        }
    }

    fn absent_walk(
        &self,
        node: &TrieNode,
        level: usize,
        fixed_dim: usize,
        fixed_id: usize,
        attributes: &mut [Attribute],
        path: &mut Vec<(usize, usize)>,
        absent: Option<(usize, usize)>,
    ) {
        match node {
            TrieNode::Interior(children) => {
                if level == fixed_dim {
                    self.absent_walk(
                        &children[fixed_id],
                        level + 1,
                        fixed_dim,
                        fixed_id,
                        attributes,
                        path,
                        absent,
                    );
                    return;
                }
                for vi in 0..attributes[level].retained_len() {
                    let carried = match attributes[level].region_of(vi) {
                        Region::Absent => {
                            if absent.is_some() {
                                continue;
                            }
                            Some((level, vi))
                        }
                        _ => absent,
                    };
                    let child = &children[attributes[level].data_id(vi)];
                    path.push((level, vi));
                    self.absent_walk(
                        child,
                        level + 1,
                        fixed_dim,
                        fixed_id,
                        attributes,
                        path,
                        carried,
                    );
                    path.pop();
                }
            }
            TrieNode::Leaf(tube) => {
                if level == fixed_dim {
                    let noise = tube.noise(fixed_id, self.noise_per_unit);
                    if noise != 0 {
                        Self::debit_present_and_potential(noise, path, absent, attributes);
                    }
                    return;
                }
                for vi in 0..attributes[level].retained_len() {
                    let noise = tube.noise(attributes[level].data_id(vi), self.noise_per_unit);
                    if noise == 0 {
                        continue;
                    }
                    match attributes[level].region_of(vi) {
                        Region::Absent => {
                            if absent.is_none() {
                                attributes[level].subtract_pp_noise(vi, noise);
                            }
                        }
                        _ => match absent {
                            Some((a, av)) => attributes[a].subtract_pp_noise(av, noise),
                            None => {
                                for &(a, av) in path.iter() {
                                    attributes[a].subtract_pp_noise(av, noise);
                                }
                                attributes[level].subtract_pp_noise(vi, noise);
                            }
                        },
                    }
                }
            }
        }
    }

    fn debit_present_and_potential(
        noise: u64,
        path: &[(usize, usize)],
        absent: Option<(usize, usize)>,
        attributes: &mut [Attribute],
    ) {
        match absent {
            Some((a, av)) => attributes[a].subtract_pp_noise(av, noise),
            None => {
                for &(a, av) in path {
                    attributes[a].subtract_pp_noise(av, noise);
                }
            }
        }
    }

    /// Recompute from scratch the noise an element gathers over the present
    /// elements of the other dimensions. Only used by audits and tests.
    pub fn count_noise_on_present(
        &self,
        attributes: &[Attribute],
        dim: usize,
        data_id: usize,
    ) -> u64 {
        self.count_walk(&self.root, 0, dim, data_id, attributes, false)
    }

    /// Recompute from scratch the noise an element gathers over the present
    /// and potential elements of the other dimensions.
    pub fn count_noise_on_present_and_potential(
        &self,
        attributes: &[Attribute],
        dim: usize,
        data_id: usize,
    ) -> u64 {
        self.count_walk(&self.root, 0, dim, data_id, attributes, true)
    }

    fn count_walk(
        &self,
        node: &TrieNode,
        level: usize,
        fixed_dim: usize,
        fixed_id: usize,
        attributes: &[Attribute],
        include_potential: bool,
    ) -> u64 {
        match node {
            TrieNode::Interior(children) => {
                if level == fixed_dim {
                    return self.count_walk(
                        &children[fixed_id],
                        level + 1,
                        fixed_dim,
                        fixed_id,
                        attributes,
                        include_potential,
                    );
                }
                let attribute = &attributes[level];
                (0..attribute.retained_len())
                    .filter(|&vi| {
                        matches!(
                            (attribute.region_of(vi), include_potential),
                            (Region::Present, _) | (Region::Potential, true)
                        )
                    })
                    .map(|vi| {
                        self.count_walk(
                            &children[attribute.data_id(vi)],
                            level + 1,
                            fixed_dim,
                            fixed_id,
                            attributes,
                            include_potential,
                        )
                    })
                    .sum()
            }
            TrieNode::Leaf(tube) => {
                if level == fixed_dim {
                    return tube.noise(fixed_id, self.noise_per_unit);
                }
                let attribute = &attributes[level];
                (0..attribute.retained_len())
                    .filter(|&vi| {
                        matches!(
                            (attribute.region_of(vi), include_potential),
                            (Region::Present, _) | (Region::Potential, true)
                        )
                    })
                    .map(|vi| tube.noise(attribute.data_id(vi), self.noise_per_unit))
                    .sum()
            }
        }
    }

    /// Total noise over an explicit box of data ids (internal dimension
    /// order). Used by the agglomeration post-processing.
    pub fn noise_sum_on_box(&self, box_ids: &[Vec<usize>]) -> u64 {
        self.box_walk(&self.root, 0, box_ids)
    }

    fn box_walk(&self, node: &TrieNode, level: usize, box_ids: &[Vec<usize>]) -> u64 {
        match node {
            TrieNode::Interior(children) => box_ids[level]
                .iter()
                .map(|&id| self.box_walk(&children[id], level + 1, box_ids))
                .sum(),
            TrieNode::Leaf(tube) => box_ids[level]
                .iter()
                .map(|&id| tube.noise(id, self.noise_per_unit))
                .sum(),
        }
    }
}

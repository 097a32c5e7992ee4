//! Constraint Measures
//!
//! A measure answers, incrementally, whether moving a set of elements into
//! the pattern (`violation_after_adding`) or out of the search space
//! (`violation_after_removing`) makes the constraint unsatisfiable for
//! every descendant pattern. Each concrete kind holds only its own
//! incremental state and is deep-cloned at every left branch.
//!
//! Monotone measures (those whose violation can only be triggered by
//! removals and is then definitive) are kept at the front of the measure
//! sequence: they prune earlier and more cheaply. The stable partition is
//! done once at construction.

mod group;
mod size;
mod value;

pub use group::{AssociationKind, GroupCoverAssociation, MaxGroupCover, MinGroupCover, PatternGroup};
pub use size::{MaxArea, MaxSize, MinArea, MinSize};
pub use value::{MinSlope, MinUtility, SlopeData, UtilityData};

use std::fmt;

/// The constraint interface. Elements are data ids of the internal
/// dimension `dim`.
pub trait Measure: fmt::Debug + MeasureBoxClone {
    /// True when a violation can only be caused by removals and is then
    /// definitive for the whole subtree.
    fn monotone(&self) -> bool {
        false
    }

    /// Elements of `dim` moved from potential to present.
    fn violation_after_adding(&mut self, dim: usize, ids: &[usize]) -> bool;

    /// Elements of `dim` moved from potential to absent.
    fn violation_after_removing(&mut self, dim: usize, ids: &[usize]) -> bool;
}

/// Deep cloning for boxed measures.
pub trait MeasureBoxClone {
    fn clone_box(&self) -> Box<dyn Measure>;
}

impl<T: Measure + Clone + 'static> MeasureBoxClone for T {
    fn clone_box(&self) -> Box<dyn Measure> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn Measure> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Stable partition: monotone measures first.
pub fn order_monotone_first(measures: &mut Vec<Box<dyn Measure>>) {
    let mut rest = Vec::new();
    let mut ordered = Vec::with_capacity(measures.len());
    for measure in measures.drain(..) {
        if measure.monotone() {
            ordered.push(measure);
        } else {
            rest.push(measure);
        }
    }
    ordered.append(&mut rest);
    *measures = ordered;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monotone_measures_come_first() {
        let mut measures: Vec<Box<dyn Measure>> = vec![
            Box::new(MaxSize::new(0, 5)),
            Box::new(MinSize::new(0, 10, 2)),
            Box::new(MaxArea::new(2, 100)),
            Box::new(MinArea::new(vec![10, 10], 4)),
        ];
        order_monotone_first(&mut measures);
        assert!(measures[0].monotone());
        assert!(measures[1].monotone());
        assert!(!measures[2].monotone());
        assert!(!measures[3].monotone());
    }

    #[test]
    fn test_boxed_clone_preserves_state() {
        let mut original: Box<dyn Measure> = Box::new(MinSize::new(0, 3, 2));
        let mut clone = original.clone();
        assert!(!original.violation_after_removing(0, &[0]));
        // The clone did not see the removal.
        assert!(original.violation_after_removing(0, &[1]));
        assert!(!clone.violation_after_removing(0, &[1]));
    }
}

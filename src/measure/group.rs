//! Group Cover Measures
//!
//! A group is a set of elements, possibly spread over several dimensions.
//! The cover of a group is the number of its elements committed to the
//! pattern. Cross-group measures compare the covers of two groups through
//! the 2x2 table
//!
//! ```text
//!              covered   not covered
//!   group r       a        A - a
//!   group c       b        B - b
//! ```
//!
//! where A and B are the group sizes. Every constraint is tested against
//! its optimistic bound: the row cover may still reach everything possible
//! (present ∪ potential) while the column cover is already at least the
//! present count, so a violated bound is violated in every descendant.

use super::Measure;
use std::collections::HashSet;
use std::sync::Arc;

/// One element group, resolved to internal dimension order and data ids.
#[derive(Debug)]
pub struct PatternGroup {
    /// Member data ids per internal dimension
    pub members: Vec<HashSet<usize>>,
}

impl PatternGroup {
    pub fn size(&self) -> usize {
        self.members.iter().map(HashSet::len).sum()
    }

    fn count(&self, dim: usize, ids: &[usize]) -> usize {
        ids.iter().filter(|id| self.members[dim].contains(id)).count()
    }
}

/// Minimal cover of one group.
#[derive(Debug, Clone)]
pub struct MinGroupCover {
    groups: Arc<Vec<PatternGroup>>,
    group: usize,
    min: usize,
    possible: usize,
}

impl MinGroupCover {
    pub fn new(groups: Arc<Vec<PatternGroup>>, group: usize, min: usize) -> Self {
        let possible = groups[group].size();
        MinGroupCover {
            groups,
            group,
            min,
            possible,
        }
    }
}

impl Measure for MinGroupCover {
    fn monotone(&self) -> bool {
        true
    }

    fn violation_after_adding(&mut self, _dim: usize, _ids: &[usize]) -> bool {
        false
    }

    fn violation_after_removing(&mut self, dim: usize, ids: &[usize]) -> bool {
        self.possible -= self.groups[self.group].count(dim, ids);
        self.possible < self.min
    }
}

/// Maximal cover of one group.
#[derive(Debug, Clone)]
pub struct MaxGroupCover {
    groups: Arc<Vec<PatternGroup>>,
    group: usize,
    max: usize,
    present: usize,
}

impl MaxGroupCover {
    pub fn new(groups: Arc<Vec<PatternGroup>>, group: usize, max: usize) -> Self {
        MaxGroupCover {
            groups,
            group,
            max,
            present: 0,
        }
    }
}

impl Measure for MaxGroupCover {
    fn violation_after_adding(&mut self, dim: usize, ids: &[usize]) -> bool {
        self.present += self.groups[self.group].count(dim, ids);
        self.present > self.max
    }

    fn violation_after_removing(&mut self, _dim: usize, _ids: &[usize]) -> bool {
        false
    }
}

/// Cross-group association constraints over the covers of a (row, column)
/// group pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationKind {
    /// a >= min * b
    Ratio,
    /// a - A*b/B >= min
    PiatetskyShapiro,
    /// a/A - b/B >= min
    Leverage,
    /// (a/A) / (b/B) >= min
    Force,
    /// (a(B-b) - (A-a)b) / (a(B-b) + (A-a)b) >= min
    YulesQ,
    /// Yule's Q over square roots of the table products
    YulesY,
}

#[derive(Debug, Clone)]
pub struct GroupCoverAssociation {
    groups: Arc<Vec<PatternGroup>>,
    kind: AssociationKind,
    row: usize,
    column: usize,
    min: f64,
    possible_row: usize,
    present_column: usize,
}

impl GroupCoverAssociation {
    pub fn new(
        groups: Arc<Vec<PatternGroup>>,
        kind: AssociationKind,
        row: usize,
        column: usize,
        min: f64,
    ) -> Self {
        let possible_row = groups[row].size();
        GroupCoverAssociation {
            groups,
            kind,
            row,
            column,
            min,
            possible_row,
            present_column: 0,
        }
    }

    fn violated(&self) -> bool {
        let a = self.possible_row as f64;
        let b = self.present_column as f64;
        let max_row = self.groups[self.row].size() as f64;
        let max_column = self.groups[self.column].size() as f64;
        match self.kind {
            AssociationKind::Ratio => a < self.min * b,
            AssociationKind::PiatetskyShapiro => a - max_row * b / max_column < self.min,
            AssociationKind::Leverage => a / max_row - b / max_column < self.min,
            AssociationKind::Force => b > 0.0 && (a * max_column) / (b * max_row) < self.min,
            AssociationKind::YulesQ => {
                let concordant = a * (max_column - b);
                let discordant = (max_row - a) * b;
                let denominator = concordant + discordant;
                denominator > 0.0 && (concordant - discordant) / denominator < self.min
            }
            AssociationKind::YulesY => {
                let concordant = (a * (max_column - b)).sqrt();
                let discordant = ((max_row - a) * b).sqrt();
                let denominator = concordant + discordant;
                denominator > 0.0 && (concordant - discordant) / denominator < self.min
            }
        }
    }
}

impl Measure for GroupCoverAssociation {
    fn violation_after_adding(&mut self, dim: usize, ids: &[usize]) -> bool {
        self.present_column += self.groups[self.column].count(dim, ids);
        self.violated()
    }

    fn violation_after_removing(&mut self, dim: usize, ids: &[usize]) -> bool {
        self.possible_row -= self.groups[self.row].count(dim, ids);
        self.violated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_groups() -> Arc<Vec<PatternGroup>> {
        // Group 0: elements {0, 1, 2} of dimension 0.
        // Group 1: elements {3, 4} of dimension 0 and {0} of dimension 1.
        Arc::new(vec![
            PatternGroup {
                members: vec![HashSet::from([0, 1, 2]), HashSet::new()],
            },
            PatternGroup {
                members: vec![HashSet::from([3, 4]), HashSet::from([0])],
            },
        ])
    }

    #[test]
    fn test_min_group_cover() {
        let mut measure = MinGroupCover::new(two_groups(), 0, 2);
        assert!(!measure.violation_after_removing(0, &[0]));
        assert!(!measure.violation_after_removing(0, &[4]));
        assert!(measure.violation_after_removing(0, &[1]));
    }

    #[test]
    fn test_max_group_cover() {
        let mut measure = MaxGroupCover::new(two_groups(), 1, 2);
        assert!(!measure.violation_after_adding(0, &[3, 4]));
        assert!(!measure.violation_after_adding(1, &[1]));
        assert!(measure.violation_after_adding(1, &[0]));
    }

    #[test]
    fn test_ratio_uses_optimistic_bound() {
        let mut measure = GroupCoverAssociation::new(
            two_groups(),
            AssociationKind::Ratio,
            0,
            1,
            1.5,
        );
        // Optimistic row cover 3 against committed column cover 2.
        assert!(!measure.violation_after_adding(0, &[3, 4]));
        // Row can no longer reach 1.5 * 2 = 3.
        assert!(measure.violation_after_removing(0, &[2]));
    }

    #[test]
    fn test_yules_q_bounds() {
        let mut measure = GroupCoverAssociation::new(
            two_groups(),
            AssociationKind::YulesQ,
            0,
            1,
            0.0,
        );
        // Full optimistic row cover keeps Q at its maximum.
        assert!(!measure.violation_after_adding(0, &[3]));
        // Losing the whole row group drives Q to -1.
        assert!(measure.violation_after_removing(0, &[0, 1, 2]));
    }
}

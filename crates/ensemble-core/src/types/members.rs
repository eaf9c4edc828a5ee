//! Member index sets.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Ordered subset of ensemble member indices owned by a decomposition node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberSet(Vec<usize>);

impl MemberSet {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    /// `0..member_count`, the root member set.
    pub fn all(member_count: usize) -> Self {
        Self((0..member_count).collect())
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<usize> {
        self.0
    }

    /// Split by a per-member assignment: `false` goes to the first set,
    /// `true` to the second. Order within each set follows `self`.
    ///
    /// `assignment` must have one entry per member; extra entries are ignored
    /// and missing ones count as `false`.
    pub fn partition(&self, assignment: &[bool]) -> (MemberSet, MemberSet) {
        let mut first = Vec::new();
        let mut second = Vec::new();
        for (i, &member) in self.0.iter().enumerate() {
            if assignment.get(i).copied().unwrap_or(false) {
                second.push(member);
            } else {
                first.push(member);
            }
        }
        (MemberSet(first), MemberSet(second))
    }

    /// True when `first` and `second` are disjoint and their union is `self`.
    pub fn is_partitioned_by(&self, first: &MemberSet, second: &MemberSet) -> bool {
        let parent: BTreeSet<usize> = self.0.iter().copied().collect();
        let a: BTreeSet<usize> = first.0.iter().copied().collect();
        let b: BTreeSet<usize> = second.0.iter().copied().collect();
        a.len() == first.len()
            && b.len() == second.len()
            && a.is_disjoint(&b)
            && a.union(&b).copied().collect::<BTreeSet<_>>() == parent
    }
}

impl From<Vec<usize>> for MemberSet {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

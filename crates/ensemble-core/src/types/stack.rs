//! In-memory ensemble volume stack and borrowed member views.

use super::GridShape;
use crate::errors::EnsembleError;

/// Ordered sequence of 3D scalar fields, one per ensemble member, on an
/// identical grid. Stored member-major in a single flat buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleStack {
    shape: GridShape,
    member_count: usize,
    values: Vec<f32>,
}

impl EnsembleStack {
    /// Build a stack from one flat field per member.
    pub fn new(shape: GridShape, members: Vec<Vec<f32>>) -> Result<Self, EnsembleError> {
        if members.is_empty() {
            return Err(EnsembleError::EmptyEnsemble);
        }
        let voxel_count = shape.voxel_count();
        let mut values = Vec::with_capacity(members.len() * voxel_count);
        for (member, field) in members.iter().enumerate() {
            if field.len() != voxel_count {
                return Err(EnsembleError::MemberLength {
                    member,
                    expected: voxel_count,
                    actual: field.len(),
                });
            }
            values.extend_from_slice(field);
        }
        Ok(Self {
            shape,
            member_count: members.len(),
            values,
        })
    }

    /// Build a stack from a member-major flat buffer.
    pub fn from_flat(
        shape: GridShape,
        member_count: usize,
        values: Vec<f32>,
    ) -> Result<Self, EnsembleError> {
        if member_count == 0 {
            return Err(EnsembleError::EmptyEnsemble);
        }
        let expected = member_count * shape.voxel_count();
        if values.len() != expected {
            return Err(EnsembleError::FieldLength {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self {
            shape,
            member_count,
            values,
        })
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn member_count(&self) -> usize {
        self.member_count
    }

    pub fn voxel_count(&self) -> usize {
        self.shape.voxel_count()
    }

    /// The full field of one member.
    pub fn member(&self, member: usize) -> Option<&[f32]> {
        if member >= self.member_count {
            return None;
        }
        let voxel_count = self.voxel_count();
        Some(&self.values[member * voxel_count..(member + 1) * voxel_count])
    }

    /// Value of `member` at `voxel`.
    ///
    /// # Panics
    /// Panics if either index is out of range.
    pub fn value(&self, member: usize, voxel: usize) -> f32 {
        self.values[member * self.voxel_count() + voxel]
    }

    /// Restrict the stack to `members` without copying any field data.
    pub fn view<'a>(&'a self, members: &'a [usize]) -> Result<EnsembleView<'a>, EnsembleError> {
        if let Some(&index) = members.iter().find(|&&m| m >= self.member_count) {
            return Err(EnsembleError::MemberOutOfRange {
                index,
                member_count: self.member_count,
            });
        }
        Ok(EnsembleView {
            stack: self,
            members,
        })
    }
}

/// A stack restricted to a subset of its members. Local member `i` is global
/// member `members()[i]`.
#[derive(Debug, Clone, Copy)]
pub struct EnsembleView<'a> {
    stack: &'a EnsembleStack,
    members: &'a [usize],
}

impl<'a> EnsembleView<'a> {
    pub fn stack(&self) -> &'a EnsembleStack {
        self.stack
    }

    pub fn members(&self) -> &'a [usize] {
        self.members
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn shape(&self) -> GridShape {
        self.stack.shape()
    }

    /// Value of local member `local` at `voxel`.
    ///
    /// # Panics
    /// Panics if either index is out of range.
    pub fn value(&self, local: usize, voxel: usize) -> f32 {
        self.stack.value(self.members[local], voxel)
    }

    /// Replace `samples` with every member's value at `voxel`, in member order.
    pub fn voxel_samples(&self, voxel: usize, samples: &mut Vec<f64>) {
        samples.clear();
        samples.extend(
            self.members
                .iter()
                .map(|&m| f64::from(self.stack.value(m, voxel))),
        );
    }
}

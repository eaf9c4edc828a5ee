//! Decomposition node identity and persisted node state.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{MemberSet, NormalityField, VoxelMask};
use crate::constants::ROOT_KEY;
use crate::errors::EnsembleError;

/// Which child of a split a node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Branch {
    /// Members the splitter assigned `false`.
    First,
    /// Members the splitter assigned `true`.
    Second,
}

impl Branch {
    pub fn label(self) -> char {
        match self {
            Branch::First => 'A',
            Branch::Second => 'B',
        }
    }

    pub fn from_label(label: char) -> Option<Self> {
        match label {
            'A' => Some(Branch::First),
            'B' => Some(Branch::Second),
            _ => None,
        }
    }
}

/// Sequence of branch choices from the root. The root is the empty path;
/// depth equals the path length.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodePath(Vec<Branch>);

impl NodePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn branches(&self) -> &[Branch] {
        &self.0
    }

    pub fn child(&self, branch: Branch) -> Self {
        let mut branches = Vec::with_capacity(self.0.len() + 1);
        branches.extend_from_slice(&self.0);
        branches.push(branch);
        Self(branches)
    }

    /// Branch labels joined by `_`, e.g. `A_B_A`. Empty for the root.
    pub fn label(&self) -> String {
        let mut out = String::with_capacity(self.0.len() * 2);
        for (i, branch) in self.0.iter().enumerate() {
            if i > 0 {
                out.push('_');
            }
            out.push(branch.label());
        }
        out
    }

    /// Parse a label produced by [`NodePath::label`].
    pub fn parse_label(label: &str) -> Option<Self> {
        if label.is_empty() {
            return Some(Self::root());
        }
        label
            .split('_')
            .map(|part| {
                let mut chars = part.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Branch::from_label(c),
                    _ => None,
                }
            })
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }
}

/// Storage identity of a node.
///
/// The root has no namespace: its normality does not depend on the splitter,
/// so every splitter shares it. Descendants live in the namespace of the
/// splitter that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey {
    namespace: Option<String>,
    path: NodePath,
}

impl NodeKey {
    pub fn root() -> Self {
        Self {
            namespace: None,
            path: NodePath::root(),
        }
    }

    pub fn new(namespace: &str, path: NodePath) -> Self {
        if path.is_root() {
            return Self::root();
        }
        Self {
            namespace: Some(namespace.to_string()),
            path,
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.path.depth()
    }

    pub fn child(&self, namespace: &str, branch: Branch) -> Self {
        let ns = self.namespace.as_deref().unwrap_or(namespace);
        Self::new(ns, self.path.child(branch))
    }

    /// Parse the string form produced by `Display`.
    pub fn parse(key: &str) -> Option<Self> {
        if key == ROOT_KEY {
            return Some(Self::root());
        }
        let (namespace, label) = key.split_once('/')?;
        if namespace.is_empty() || label.is_empty() {
            return None;
        }
        let path = NodePath::parse_label(label)?;
        Some(Self::new(namespace, path))
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            None => f.write_str(ROOT_KEY),
            Some(ns) => write!(f, "{}/{}", ns, self.path.label()),
        }
    }
}

/// Persisted state of one decomposition node: its members, its active mask,
/// and the p-values computed over that mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    pub members: MemberSet,
    pub mask: VoxelMask,
    pub p_values: NormalityField,
}

impl NodeState {
    pub fn new(
        members: MemberSet,
        mask: VoxelMask,
        p_values: NormalityField,
    ) -> Result<Self, EnsembleError> {
        mask.shape().ensure_matches(&p_values.shape())?;
        Ok(Self {
            members,
            mask,
            p_values,
        })
    }

    /// Active voxels classified normal at `significance`.
    pub fn normal_mask(&self, significance: f64) -> Result<VoxelMask, EnsembleError> {
        self.p_values.classify(&self.mask, significance)
    }

    /// Active voxels not yet explained: `mask AND NOT normal`.
    pub fn remaining_mask(&self, significance: f64) -> Result<VoxelMask, EnsembleError> {
        self.mask.and_not(&self.normal_mask(significance)?)
    }
}

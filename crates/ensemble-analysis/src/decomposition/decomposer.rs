//! Worklist-driven decomposer.
//!
//! Each node is either loaded from the repository or computed and stored, then
//! becomes a leaf or is split in two. Children are visited depth-first, first
//! child before second, with depth carried on the worklist.

use std::sync::Arc;
use std::time::Instant;

use ensemble_core::config::DecompositionConfig;
use ensemble_core::errors::{DecompositionError, SplitError};
use ensemble_core::events::types::{
    DecompositionCompleteEvent, LeafEvent, LeafReason, NodeStartedEvent, NodeSummaryEvent,
    SplitCompletedEvent,
};
use ensemble_core::events::EventDispatcher;
use ensemble_core::traits::{EnsembleSplitter, NodeRepository, StoreOutcome};
use ensemble_core::types::{Branch, EnsembleStack, MemberSet, NodeKey, NodeState, VoxelMask};

use super::report::{DecompositionReport, NodeSummary};
use crate::normality::NormalityTester;

struct WorkItem {
    key: NodeKey,
    members: MemberSet,
    mask: VoxelMask,
    /// State already loaded while checking the parent's children.
    preloaded: Option<NodeState>,
}

/// Builds the sub-ensemble tree for one splitter over a node repository.
pub struct Decomposer {
    repository: Arc<dyn NodeRepository>,
    tester: NormalityTester,
    max_depth: usize,
    min_split_members: usize,
    events: EventDispatcher,
}

impl Decomposer {
    pub fn new(repository: Arc<dyn NodeRepository>, config: &DecompositionConfig) -> Self {
        Self {
            repository,
            tester: NormalityTester::new(config.effective_significance()),
            max_depth: config.effective_max_depth(),
            min_split_members: config.effective_min_split_members(),
            events: EventDispatcher::new(),
        }
    }

    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    pub fn repository(&self) -> &Arc<dyn NodeRepository> {
        &self.repository
    }

    /// Decompose `stack` restricted to `mask` with `splitter`.
    ///
    /// The root node is shared by every splitter; all other nodes live in the
    /// splitter's namespace. Nodes already in the repository are loaded, not
    /// recomputed, and an internal node whose children are both persisted is
    /// not split again.
    pub fn decompose(
        &self,
        stack: &EnsembleStack,
        mask: &VoxelMask,
        splitter: &dyn EnsembleSplitter,
    ) -> Result<DecompositionReport, DecompositionError> {
        stack.shape().ensure_matches(&mask.shape())?;
        let started = Instant::now();
        let namespace = splitter.identifier().to_string();
        let significance = self.tester.significance();

        let mut report = DecompositionReport {
            splitter: namespace.clone(),
            total_member_count: 0,
            total_voxel_count: 0,
            nodes: Vec::new(),
            computed: 0,
            cached: 0,
            splits_performed: 0,
            splits_reused: 0,
            duration_ms: 0,
        };

        let mut worklist = vec![WorkItem {
            key: NodeKey::root(),
            members: MemberSet::all(stack.member_count()),
            mask: mask.clone(),
            preloaded: None,
        }];

        while let Some(item) = worklist.pop() {
            let key = item.key.clone();
            let key_label = key.to_string();
            let depth = key.depth();
            self.events.emit_node_started(&NodeStartedEvent {
                key: key_label.clone(),
                depth,
                member_count: item.members.len(),
            });

            let (state, cached) = self.resolve(stack, item)?;
            if cached {
                report.cached += 1;
            } else {
                report.computed += 1;
            }
            if depth == 0 {
                report.total_member_count = state.members.len();
                report.total_voxel_count = state.mask.count();
            }

            let normal = state.normal_mask(significance)?;
            let remaining = state.mask.and_not(&normal)?;
            let remaining_count = remaining.count();
            let summary = NodeSummaryEvent {
                key: key_label.clone(),
                depth,
                member_count: state.members.len(),
                total_member_count: report.total_member_count,
                mask_voxel_count: state.mask.count(),
                total_voxel_count: report.total_voxel_count,
                normal_voxel_count: normal.count(),
                remaining_voxel_count: remaining_count,
                cached,
            };
            if cached {
                self.events.emit_node_cached(&summary);
            } else {
                self.events.emit_node_computed(&summary);
            }

            let leaf = self.leaf_reason(state.members.len(), remaining_count, depth);
            report.nodes.push(NodeSummary {
                key: key_label.clone(),
                depth,
                member_count: summary.member_count,
                mask_voxel_count: summary.mask_voxel_count,
                normal_voxel_count: summary.normal_voxel_count,
                remaining_voxel_count: remaining_count,
                cached,
                leaf,
            });
            if let Some(reason) = leaf {
                self.events.emit_leaf(&LeafEvent {
                    key: key_label,
                    reason,
                });
                continue;
            }

            let first_key = key.child(&namespace, Branch::First);
            let second_key = key.child(&namespace, Branch::Second);

            let persisted = match (
                self.repository.load(&first_key)?,
                self.repository.load(&second_key)?,
            ) {
                (Some(first), Some(second)) => Some((first, second)),
                _ => None,
            };

            let (first, second, reused) = match persisted {
                Some((first_state, second_state)) => {
                    report.splits_reused += 1;
                    (
                        WorkItem {
                            key: first_key,
                            members: first_state.members.clone(),
                            mask: first_state.mask.clone(),
                            preloaded: Some(first_state),
                        },
                        WorkItem {
                            key: second_key,
                            members: second_state.members.clone(),
                            mask: second_state.mask.clone(),
                            preloaded: Some(second_state),
                        },
                        true,
                    )
                }
                None => {
                    let view = stack.view(state.members.indices())?;
                    let assignment = splitter.split(&view, &remaining, &self.events)?;
                    if assignment.len() != state.members.len() {
                        return Err(SplitError::AssignmentLength {
                            splitter: namespace.clone(),
                            expected: state.members.len(),
                            actual: assignment.len(),
                        }
                        .into());
                    }
                    report.splits_performed += 1;
                    let (first_members, second_members) = state.members.partition(&assignment);
                    if first_members.is_empty() || second_members.is_empty() {
                        tracing::warn!(
                            key = %key_label,
                            splitter = %namespace,
                            "splitter produced a one-sided partition"
                        );
                    }
                    (
                        WorkItem {
                            key: first_key,
                            members: first_members,
                            mask: remaining.clone(),
                            preloaded: None,
                        },
                        WorkItem {
                            key: second_key,
                            members: second_members,
                            mask: remaining,
                            preloaded: None,
                        },
                        false,
                    )
                }
            };

            self.events.emit_split_completed(&SplitCompletedEvent {
                key: key_label,
                splitter: namespace.clone(),
                first_count: first.members.len(),
                second_count: second.members.len(),
                reused,
            });
            worklist.push(second);
            worklist.push(first);
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        self.events.emit_decomposition_complete(&DecompositionCompleteEvent {
            splitter: namespace,
            computed: report.computed,
            cached: report.cached,
            leaves: report.leaf_count(),
            duration_ms: report.duration_ms,
        });
        Ok(report)
    }

    fn leaf_reason(&self, member_count: usize, remaining: usize, depth: usize) -> Option<LeafReason> {
        if member_count < self.min_split_members {
            Some(LeafReason::TooFewMembers)
        } else if remaining == 0 {
            Some(LeafReason::FullyExplained)
        } else if depth >= self.max_depth {
            Some(LeafReason::MaxDepth)
        } else {
            None
        }
    }

    /// Load the node's state, or compute and store it. Returns the state and
    /// whether it came from the repository.
    fn resolve(
        &self,
        stack: &EnsembleStack,
        item: WorkItem,
    ) -> Result<(NodeState, bool), DecompositionError> {
        let loaded = match item.preloaded {
            Some(state) => Some(state),
            None => self.repository.load(&item.key)?,
        };
        if let Some(state) = loaded {
            if state.members != item.members {
                tracing::warn!(
                    key = %item.key,
                    persisted = state.members.len(),
                    derived = item.members.len(),
                    "persisted members differ from derived members, using persisted state"
                );
            }
            return Ok((state, true));
        }

        let view = stack.view(item.members.indices())?;
        let p_values = self.tester.compute(&view, &item.mask, &self.events)?;
        let state = NodeState::new(item.members, item.mask, p_values)?;
        match self.repository.store(&item.key, &state)? {
            StoreOutcome::Written => Ok((state, false)),
            StoreOutcome::AlreadyPresent => {
                // Another writer committed this node first.
                tracing::debug!(key = %item.key, "node stored concurrently, reloading");
                let persisted = self.repository.load(&item.key)?;
                Ok((persisted.unwrap_or(state), false))
            }
        }
    }
}

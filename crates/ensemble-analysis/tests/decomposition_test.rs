//! Recursive decomposition: tree invariants, leaf rules, and resumption.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ensemble_analysis::{Decomposer, DecompositionReport, KMeansSplitter, RankSplitter};
use ensemble_core::config::DecompositionConfig;
use ensemble_core::errors::{DecompositionError, SplitError};
use ensemble_core::events::handler::EnsembleEventHandler;
use ensemble_core::events::types::{LeafEvent, LeafReason, NodeStartedEvent, NodeSummaryEvent};
use ensemble_core::events::EventDispatcher;
use ensemble_core::traits::{EnsembleSplitter, NodeRepository};
use ensemble_core::types::{
    Branch, EnsembleStack, EnsembleView, MemberSet, NodeKey, NodeState, NormalityField, VoxelMask,
};
use ensemble_storage::InMemoryNodeStore;
use proptest::prelude::*;
use test_fixtures::{
    bimodal_ensemble, constant_ensemble, full_mask, gaussian_ensemble, grid, load_ensemble,
};

const SIGNIFICANCE: f64 = 0.05;

fn config(max_depth: usize) -> DecompositionConfig {
    DecompositionConfig {
        max_depth: Some(max_depth),
        ..Default::default()
    }
}

fn decomposer(store: &Arc<InMemoryNodeStore>, max_depth: usize) -> Decomposer {
    Decomposer::new(store.clone(), &config(max_depth))
}

/// Check every split node against its persisted children.
fn assert_tree_invariants(
    store: &InMemoryNodeStore,
    report: &DecompositionReport,
    max_depth: usize,
) {
    for node in &report.nodes {
        assert!(node.depth <= max_depth, "{} deeper than {max_depth}", node.key);
        let key = NodeKey::parse(&node.key).unwrap();
        let state = store.load(&key).unwrap().unwrap();
        assert_eq!(state.members.len(), node.member_count);
        if node.leaf.is_some() {
            continue;
        }
        let child = |branch| store.load(&key.child(&report.splitter, branch)).unwrap().unwrap();
        let (first, second) = (child(Branch::First), child(Branch::Second));
        assert!(state.members.is_partitioned_by(&first.members, &second.members), "{}", node.key);

        let remaining = state.remaining_mask(SIGNIFICANCE).unwrap();
        for child in [&first, &second] {
            assert_eq!(child.mask, remaining, "{}", node.key);
            assert!(child.mask.is_subset_of(&state.mask));
        }
    }
}

struct CountingSplitter<S> {
    inner: S,
    calls: AtomicUsize,
}

impl<S> CountingSplitter<S> {
    fn new(inner: S) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<S: EnsembleSplitter> EnsembleSplitter for CountingSplitter<S> {
    fn identifier(&self) -> &str {
        self.inner.identifier()
    }

    fn split(
        &self,
        ensemble: &EnsembleView<'_>,
        mask: &VoxelMask,
        events: &EventDispatcher,
    ) -> Result<Vec<bool>, SplitError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.split(ensemble, mask, events)
    }
}

/// Puts every member into the first group.
struct AllFirst;

impl EnsembleSplitter for AllFirst {
    fn identifier(&self) -> &str {
        "all_first"
    }

    fn split(
        &self,
        ensemble: &EnsembleView<'_>,
        _mask: &VoxelMask,
        _events: &EventDispatcher,
    ) -> Result<Vec<bool>, SplitError> {
        Ok(vec![false; ensemble.member_count()])
    }
}

/// Returns one assignment too few.
struct ShortAssignment;

impl EnsembleSplitter for ShortAssignment {
    fn identifier(&self) -> &str {
        "short"
    }

    fn split(
        &self,
        ensemble: &EnsembleView<'_>,
        _mask: &VoxelMask,
        _events: &EventDispatcher,
    ) -> Result<Vec<bool>, SplitError> {
        Ok(vec![true; ensemble.member_count() - 1])
    }
}

#[test]
fn bimodal_root_splits_into_normal_children() {
    let store = Arc::new(InMemoryNodeStore::new());
    let stack = bimodal_ensemble([3, 3, 2], 16, 20.0, 8);
    let report = decomposer(&store, 4)
        .decompose(&stack, &full_mask(&stack), &KMeansSplitter::default())
        .unwrap();

    assert_eq!(report.splitter, "kmeans");
    assert_eq!(report.total_member_count, 16);
    assert_eq!(report.total_voxel_count, 18);
    let root = report.node("root").unwrap();
    assert!(root.leaf.is_none());
    assert!(root.remaining_voxel_count > 9, "bimodal voxels are not normal");

    let first = report.node("kmeans/A").unwrap();
    let second = report.node("kmeans/B").unwrap();
    assert_eq!(first.member_count, 8);
    assert_eq!(second.member_count, 8);
    assert_tree_invariants(&store, &report, 4);
}

#[test]
fn nodes_are_visited_depth_first() {
    let store = Arc::new(InMemoryNodeStore::new());
    let stack = bimodal_ensemble([2, 2, 1], 12, 20.0, 3);
    let report = decomposer(&store, 1)
        .decompose(&stack, &full_mask(&stack), &AllFirst)
        .unwrap();
    let keys: Vec<&str> = report.nodes.iter().map(|n| n.key.as_str()).collect();
    assert_eq!(keys, ["root", "all_first/A", "all_first/B"]);
}

#[test]
fn one_sided_split_terminates() {
    let store = Arc::new(InMemoryNodeStore::new());
    let stack = bimodal_ensemble([2, 2, 1], 12, 20.0, 3);
    let report = decomposer(&store, 2)
        .decompose(&stack, &full_mask(&stack), &AllFirst)
        .unwrap();

    assert_eq!(report.nodes.len(), 5);
    assert_eq!(report.node("all_first/B").unwrap().member_count, 0);
    assert_eq!(report.node("all_first/B").unwrap().leaf, Some(LeafReason::TooFewMembers));
    assert_eq!(report.node("all_first/A_A").unwrap().leaf, Some(LeafReason::MaxDepth));
    assert_tree_invariants(&store, &report, 2);
}

#[test]
fn small_ensemble_is_a_single_leaf() {
    let store = Arc::new(InMemoryNodeStore::new());
    let stack = bimodal_ensemble([2, 2, 1], 5, 20.0, 3);
    let splitter = CountingSplitter::new(KMeansSplitter::default());
    let report = decomposer(&store, 4)
        .decompose(&stack, &full_mask(&stack), &splitter)
        .unwrap();
    assert_eq!(report.nodes.len(), 1);
    assert_eq!(report.nodes[0].leaf, Some(LeafReason::TooFewMembers));
    assert_eq!(splitter.calls(), 0);
    assert_eq!(store.keys(), ["root"]);
}

#[test]
fn fully_explained_root_is_not_split() {
    let store = Arc::new(InMemoryNodeStore::new());
    let stack = constant_ensemble([3, 1, 1], 10, 2.0);
    let splitter = CountingSplitter::new(KMeansSplitter::default());
    let report = decomposer(&store, 4)
        .decompose(&stack, &full_mask(&stack), &splitter)
        .unwrap();
    assert_eq!(report.nodes.len(), 1);
    assert_eq!(report.nodes[0].leaf, Some(LeafReason::FullyExplained));
    assert_eq!(report.nodes[0].normal_voxel_count, 3);
    assert_eq!(splitter.calls(), 0);
}

#[test]
fn zero_depth_limit_keeps_only_the_root() {
    let store = Arc::new(InMemoryNodeStore::new());
    let stack = bimodal_ensemble([2, 2, 1], 12, 20.0, 3);
    let report = decomposer(&store, 0)
        .decompose(&stack, &full_mask(&stack), &KMeansSplitter::default())
        .unwrap();
    assert_eq!(report.nodes.len(), 1);
    assert_eq!(report.nodes[0].leaf, Some(LeafReason::MaxDepth));
}

#[test]
fn inactive_voxels_stay_out_of_every_node() {
    let store = Arc::new(InMemoryNodeStore::new());
    let stack = bimodal_ensemble([4, 1, 1], 12, 20.0, 6);
    let mask = VoxelMask::from_bits(stack.shape(), vec![true, false, true, false]).unwrap();
    let report = decomposer(&store, 3)
        .decompose(&stack, &mask, &KMeansSplitter::default())
        .unwrap();
    assert_eq!(report.total_voxel_count, 2);
    for key in store.keys() {
        let state = store.load(&NodeKey::parse(&key).unwrap()).unwrap().unwrap();
        assert!(state.mask.is_subset_of(&mask), "{key}");
        assert_eq!(state.p_values.p_value(1), Some(1.0));
        assert_eq!(state.p_values.p_value(3), Some(1.0));
    }
    assert_tree_invariants(&store, &report, 3);
}

#[test]
fn rerun_loads_every_node_and_never_splits() {
    let store = Arc::new(InMemoryNodeStore::new());
    let stack = bimodal_ensemble([3, 3, 1], 14, 20.0, 21);
    let mask = full_mask(&stack);
    let first = decomposer(&store, 3)
        .decompose(&stack, &mask, &KMeansSplitter::default())
        .unwrap();
    assert!(first.computed > 1);
    assert_eq!(first.cached, 0);
    let stored = store.len();

    let splitter = CountingSplitter::new(KMeansSplitter::default());
    let second = decomposer(&store, 3).decompose(&stack, &mask, &splitter).unwrap();
    assert!(second.fully_cached());
    assert_eq!(splitter.calls(), 0);
    assert_eq!(second.cached, first.computed);
    assert_eq!(store.len(), stored);

    let keys = |r: &DecompositionReport| r.nodes.iter().map(|n| n.key.clone()).collect::<Vec<_>>();
    assert_eq!(keys(&first), keys(&second));
    assert!(second.nodes.iter().all(|n| n.cached));
}

#[test]
fn deeper_rerun_resumes_below_persisted_nodes() {
    let store = Arc::new(InMemoryNodeStore::new());
    let stack = bimodal_ensemble([3, 3, 1], 24, 20.0, 17);
    let mask = full_mask(&stack);
    let shallow = decomposer(&store, 1)
        .decompose(&stack, &mask, &RankSplitter::default())
        .unwrap();
    assert_eq!(shallow.nodes.len(), 3);

    let deep = decomposer(&store, 3)
        .decompose(&stack, &mask, &RankSplitter::default())
        .unwrap();
    assert!(deep.node("root").unwrap().cached);
    assert!(deep.node("ranking/A").unwrap().cached);
    assert!(deep.node("ranking/B").unwrap().cached);
    assert_eq!(deep.splits_reused, 1);
    assert_eq!(deep.cached, 3);
    assert_tree_invariants(&store, &deep, 3);
}

#[test]
fn splitters_share_the_root_but_not_the_tree() {
    let store = Arc::new(InMemoryNodeStore::new());
    let stack = bimodal_ensemble([2, 2, 2], 12, 20.0, 2);
    let mask = full_mask(&stack);
    let decomposer = decomposer(&store, 2);

    let kmeans = decomposer.decompose(&stack, &mask, &KMeansSplitter::default()).unwrap();
    let ranking = decomposer.decompose(&stack, &mask, &RankSplitter::default()).unwrap();
    assert!(!kmeans.node("root").unwrap().cached);
    assert!(ranking.node("root").unwrap().cached);
    assert!(ranking.nodes.iter().skip(1).all(|n| !n.cached));
    assert!(store.keys().iter().any(|k| k.starts_with("kmeans/")));
    assert!(store.keys().iter().any(|k| k.starts_with("ranking/")));
}

#[test]
fn persisted_state_wins_over_derived_state() {
    let store = Arc::new(InMemoryNodeStore::new());
    let stack = bimodal_ensemble([2, 2, 1], 12, 20.0, 3);
    let mask = full_mask(&stack);
    let persisted = NodeState::new(
        MemberSet::all(10),
        mask.clone(),
        NormalityField::filled(stack.shape(), 0.9),
    )
    .unwrap();
    store.store(&NodeKey::root(), &persisted).unwrap();

    let report = decomposer(&store, 4)
        .decompose(&stack, &mask, &KMeansSplitter::default())
        .unwrap();
    assert_eq!(report.total_member_count, 10);
    assert_eq!(report.computed, 0);
    assert_eq!(report.nodes[0].leaf, Some(LeafReason::FullyExplained));
}

#[test]
fn wrong_assignment_length_is_an_error() {
    let store = Arc::new(InMemoryNodeStore::new());
    let stack = bimodal_ensemble([2, 2, 1], 12, 20.0, 3);
    let err = decomposer(&store, 4)
        .decompose(&stack, &full_mask(&stack), &ShortAssignment)
        .unwrap_err();
    assert!(matches!(
        err,
        DecompositionError::Split(SplitError::AssignmentLength { expected: 12, actual: 11, .. })
    ));
}

#[test]
fn mismatched_mask_is_an_error() {
    let store = Arc::new(InMemoryNodeStore::new());
    let stack = gaussian_ensemble([2, 2, 1], 8, 1);
    let mask = VoxelMask::full(grid([4, 1, 1]));
    assert!(matches!(
        decomposer(&store, 4).decompose(&stack, &mask, &KMeansSplitter::default()),
        Err(DecompositionError::Ensemble(_))
    ));
}

#[test]
fn zero_variance_members_decompose_cleanly() {
    let (stack, mask) = load_ensemble("zero_variance_2x2");
    let store = Arc::new(InMemoryNodeStore::new());
    let report = decomposer(&store, 4)
        .decompose(&stack, &mask, &KMeansSplitter::default())
        .unwrap();
    let root = store.load(&NodeKey::root()).unwrap().unwrap();
    // Voxel 3 holds the same value in every member.
    assert_eq!(root.p_values.p_value(3), Some(1.0));
    assert!(report.node("root").unwrap().normal_voxel_count >= 1);
    assert_tree_invariants(&store, &report, 4);
}

#[derive(Default)]
struct Tally {
    started: AtomicUsize,
    computed: AtomicUsize,
    cached: AtomicUsize,
    leaves: AtomicUsize,
}

impl EnsembleEventHandler for Tally {
    fn on_node_started(&self, _: &NodeStartedEvent) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }
    fn on_node_computed(&self, _: &NodeSummaryEvent) {
        self.computed.fetch_add(1, Ordering::SeqCst);
    }
    fn on_node_cached(&self, _: &NodeSummaryEvent) {
        self.cached.fetch_add(1, Ordering::SeqCst);
    }
    fn on_leaf(&self, _: &LeafEvent) {
        self.leaves.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn events_mirror_the_report() {
    let store = Arc::new(InMemoryNodeStore::new());
    let stack = bimodal_ensemble([2, 2, 2], 12, 20.0, 4);
    let mask = full_mask(&stack);
    let tally = Arc::new(Tally::default());
    let decomposer =
        decomposer(&store, 3).with_events(EventDispatcher::new().with_handler(tally.clone()));

    let first = decomposer.decompose(&stack, &mask, &KMeansSplitter::default()).unwrap();
    let second = decomposer.decompose(&stack, &mask, &KMeansSplitter::default()).unwrap();

    let total = first.nodes.len() + second.nodes.len();
    assert_eq!(tally.started.load(Ordering::SeqCst), total);
    assert_eq!(tally.computed.load(Ordering::SeqCst), first.computed);
    assert_eq!(tally.cached.load(Ordering::SeqCst), second.cached);
    assert_eq!(tally.leaves.load(Ordering::SeqCst), first.leaf_count() + second.leaf_count());
}

fn small_stack() -> impl Strategy<Value = EnsembleStack> {
    (6usize..14).prop_flat_map(|members| {
        prop::collection::vec(prop::collection::vec(-10.0f32..10.0, 4), members)
            .prop_map(|fields| EnsembleStack::new(grid([2, 2, 1]), fields).unwrap())
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn random_ensembles_keep_tree_invariants(stack in small_stack(), seed in any::<u64>()) {
        let store = Arc::new(InMemoryNodeStore::new());
        let report = decomposer(&store, 3)
            .decompose(&stack, &full_mask(&stack), &KMeansSplitter::new(seed, 50, 1e-4))
            .unwrap();
        prop_assert_eq!(report.total_member_count, stack.member_count());
        prop_assert_eq!(report.computed, store.len());
        assert_tree_invariants(&store, &report, 3);
    }
}

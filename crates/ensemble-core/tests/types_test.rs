//! Property tests for the ensemble data model.

use proptest::prelude::*;

use ensemble_core::types::{Branch, GridShape, MemberSet, NodeKey, NodePath, VoxelMask};

fn branch() -> impl Strategy<Value = Branch> {
    prop_oneof![Just(Branch::First), Just(Branch::Second)]
}

proptest! {
    #[test]
    fn partition_is_always_exact(
        members in proptest::collection::btree_set(0usize..500, 0..60),
        seed in any::<u64>(),
    ) {
        let set = MemberSet::new(members.into_iter().collect());
        let assignment: Vec<bool> = (0..set.len()).map(|i| (seed >> (i % 64)) & 1 == 1).collect();
        let (first, second) = set.partition(&assignment);
        prop_assert!(set.is_partitioned_by(&first, &second));
        prop_assert_eq!(first.len() + second.len(), set.len());
    }

    #[test]
    fn and_not_is_subset_of_parent(bits in proptest::collection::vec(any::<(bool, bool)>(), 12)) {
        let shape = GridShape::new([3, 2, 2]).unwrap();
        let parent = VoxelMask::from_bits(shape, bits.iter().map(|b| b.0).collect()).unwrap();
        let other = VoxelMask::from_bits(shape, bits.iter().map(|b| b.1).collect()).unwrap();
        let child = parent.and_not(&other).unwrap();
        prop_assert!(child.is_subset_of(&parent));
        prop_assert_eq!(child.count() + parent.and(&other).unwrap().count(), parent.count());
    }

    #[test]
    fn node_keys_round_trip(branches in proptest::collection::vec(branch(), 1..12)) {
        let mut path = NodePath::root();
        for b in &branches {
            path = path.child(*b);
        }
        let key = NodeKey::new("field_similarity", path.clone());
        prop_assert_eq!(key.depth(), branches.len());
        prop_assert_eq!(NodeKey::parse(&key.to_string()), Some(key));
    }
}

//! Property-based tests for the position allocator

use proptest::prelude::*;
use taskboard::shared::{AllocationWarning, Placement, Position, PositionAllocator};

/// Strictly increasing positions with room to split between each pair
fn sibling_positions() -> impl Strategy<Value = Vec<Position>> {
    prop::collection::btree_set(1i64..1_000_000, 1..20).prop_map(|units| {
        units
            .into_iter()
            .map(|u| Position::from_units(u * 10))
            .collect()
    })
}

fn named(positions: &[Position]) -> Vec<(usize, Position)> {
    positions.iter().copied().enumerate().collect()
}

proptest! {
    #[test]
    fn test_insert_after_lands_between_neighbours(
        positions in sibling_positions(),
        pick in any::<prop::sample::Index>(),
    ) {
        let allocator = PositionAllocator::default();
        let siblings = named(&positions);
        let index = pick.index(siblings.len());

        let allocation = allocator.allocate(&siblings, None, &Placement::after(index));

        prop_assert_eq!(allocation.warning, None);
        prop_assert!(allocation.position > positions[index]);
        if let Some(next) = positions.get(index + 1) {
            prop_assert!(allocation.position < *next);
        }
    }

    #[test]
    fn test_append_exceeds_every_sibling(positions in sibling_positions()) {
        let allocator = PositionAllocator::default();
        let allocation = allocator.allocate(&named(&positions), None, &Placement::end());

        let last = positions[positions.len() - 1];
        prop_assert_eq!(allocation.position, last.saturating_add(Position::from_units(1000)));
    }

    #[test]
    fn test_top_insert_stays_positive(positions in sibling_positions()) {
        let allocator = PositionAllocator::default();
        let allocation = allocator.allocate(&named(&positions), None, &Placement::start());

        prop_assert!(allocation.position.is_positive());
        prop_assert!(allocation.position < positions[0]);
    }

    #[test]
    fn test_unknown_target_appends_with_warning(positions in sibling_positions()) {
        let allocator = PositionAllocator::default();
        let siblings = named(&positions);

        let allocation = allocator.allocate(&siblings, None, &Placement::before(usize::MAX));

        prop_assert_eq!(allocation.warning, Some(AllocationWarning::TargetNotFound));
        prop_assert!(allocation.position > positions[positions.len() - 1]);
    }

    #[test]
    fn test_moving_item_is_not_its_own_neighbour(
        positions in sibling_positions(),
        pick in any::<prop::sample::Index>(),
        target in any::<prop::sample::Index>(),
    ) {
        let allocator = PositionAllocator::default();
        let siblings = named(&positions);
        let moving = pick.index(siblings.len());
        let target = target.index(siblings.len());
        prop_assume!(moving != target);

        let without: Vec<(usize, Position)> = siblings
            .iter()
            .copied()
            .filter(|(id, _)| *id != moving)
            .collect();

        prop_assert_eq!(
            allocator.allocate(&siblings, Some(&moving), &Placement::after(target)),
            allocator.allocate(&without, None, &Placement::after(target))
        );
    }

    #[test]
    fn test_renumber_preserves_order(positions in prop::collection::vec(1i64..1_000_000_000, 0..50)) {
        let allocator = PositionAllocator::default();
        let items: Vec<(usize, Position)> = positions
            .iter()
            .map(|p| Position::from_raw(*p))
            .enumerate()
            .collect();

        let renumbered = allocator.renumber(&items);

        let mut expected = items.clone();
        expected.sort_by_key(|(i, position)| (*position, *i));
        let order: Vec<usize> = renumbered.iter().map(|(i, _)| *i).collect();
        let expected_order: Vec<usize> = expected.iter().map(|(i, _)| *i).collect();
        prop_assert_eq!(order, expected_order);
        for (rank, (_, position)) in renumbered.iter().enumerate() {
            prop_assert_eq!(*position, Position::from_units((rank as i64 + 1) * 1000));
        }
        prop_assert!(!allocator.needs_rebalance(
            &renumbered.iter().map(|(_, p)| *p).collect::<Vec<_>>()
        ));
    }
}

#[test]
fn test_repeated_top_inserts_between_close_positions_trigger_renumber() {
    let allocator = PositionAllocator::default();
    let mut siblings: Vec<(String, Position)> = vec![
        ("a".to_string(), Position::from_raw(1_000)),
        ("b".to_string(), Position::from_raw(1_001)),
    ];

    let mut rebalanced = false;
    for round in 0..30 {
        let allocation = allocator.allocate(&siblings, None, &Placement::start());
        if allocation.needs_rebalance() {
            siblings = allocator.renumber(&siblings);
            rebalanced = true;
            let again = allocator.allocate(&siblings, None, &Placement::start());
            assert!(!again.needs_rebalance());
            siblings.push((format!("n{}", round), again.position));
        } else {
            siblings.push((format!("n{}", round), allocation.position));
        }
    }

    assert!(rebalanced);
    let before: Vec<String> = {
        let mut sorted = siblings.clone();
        sorted.sort_by_key(|(_, position)| *position);
        sorted.into_iter().map(|(id, _)| id).collect()
    };
    let renumbered = allocator.renumber(&siblings);
    let after: Vec<String> = renumbered.iter().map(|(id, _)| id.clone()).collect();
    assert_eq!(before, after);
    assert!(renumbered
        .iter()
        .all(|(_, position)| position.is_whole()));
}

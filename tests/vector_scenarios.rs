//! End-to-end scenarios for `RadixVector`.
//!
//! These exercise the documented usage patterns at realistic sizes:
//! bulk construction of large vectors, tail promotion on push, sparse
//! updates that leave the original intact, and pop sequences that cross
//! leaf and tree-height boundaries.

use radixvec::{RadixVector, VectorError};
use rstest::rstest;

#[rstest]
fn million_element_bulk_build() {
    let vector: RadixVector<usize> = (0..1_000_000).collect();

    assert_eq!(vector.len(), 1_000_000);
    assert_eq!(vector.get(0), Ok(&0));
    assert_eq!(vector.get(500_000), Ok(&500_000));
    assert_eq!(vector.get(999_999), Ok(&999_999));
    assert_eq!(
        vector.get(1_000_000),
        Err(VectorError::IndexOutOfRange {
            index: 1_000_000,
            length: 1_000_000
        })
    );
}

#[rstest]
fn thirty_three_pushes_promote_the_tail() {
    let mut vector: RadixVector<usize> = RadixVector::new();
    for value in 0..33 {
        vector = vector.push(value);
    }

    assert_eq!(vector.len(), 33);
    for index in 0..33 {
        assert_eq!(vector.get(index), Ok(&index));
    }
}

#[rstest]
fn sparse_update_shares_everything_else() {
    let vector: RadixVector<usize> = (0..1000).collect();
    let updated = vector.set(0, 99).unwrap();

    assert_eq!(updated.get(0), Ok(&99));
    assert_eq!(vector.get(0), Ok(&0));
    for index in 1..1000 {
        assert_eq!(updated.get(index), vector.get(index));
    }
}

#[rstest]
fn many_snapshots_stay_independent() {
    let base: RadixVector<usize> = (0..100).collect();

    // Every snapshot extends the same base by one distinct element
    let snapshots: Vec<RadixVector<usize>> =
        (0..50).map(|value| base.push(value * 10)).collect();

    assert_eq!(base.len(), 100);
    for (offset, snapshot) in snapshots.iter().enumerate() {
        assert_eq!(snapshot.len(), 101);
        assert_eq!(snapshot.get(100), Ok(&(offset * 10)));
        assert_eq!(snapshot.get(50), Ok(&50));
    }
}

#[rstest]
fn pop_walks_back_through_tree_heights() {
    // 1100 elements build a two-level tree; popping everything must
    // demote the root, refill the tail from leaves, and finally reach
    // the empty vector without losing an element.
    let mut vector: RadixVector<usize> = (0..1100).collect();

    for expected in (0..1100).rev() {
        let (remaining, element) = vector.pop().expect("vector is non-empty");
        assert_eq!(element, expected);
        assert_eq!(remaining.len(), expected);
        vector = remaining;
    }

    assert!(vector.is_empty());
    assert_eq!(vector.pop(), Err(VectorError::EmptyVector));
}

#[rstest]
fn push_after_deep_pop_rebuilds_correctly() {
    let vector: RadixVector<usize> = (0..1057).collect();

    // Pop across the root-demotion boundary, then push back past it
    let (mut vector, _) = vector.pop().unwrap();
    for value in 1056..1200 {
        vector = vector.push(value);
    }

    assert_eq!(vector.len(), 1200);
    for index in (0..1200).step_by(97) {
        assert_eq!(vector.get(index), Ok(&index));
    }
    assert_eq!(vector.get(1199), Ok(&1199));
}

#[rstest]
fn iteration_matches_indexing_at_scale() {
    let vector: RadixVector<usize> = (0..100_000).collect();

    let mut count = 0;
    for (index, element) in vector.iter().enumerate() {
        assert_eq!(*element, index);
        count += 1;
    }
    assert_eq!(count, 100_000);
}

#[rstest]
fn collected_vector_round_trips_through_vec() {
    let original: Vec<String> = (0..300).map(|value| format!("item-{value}")).collect();
    let vector: RadixVector<String> = original.iter().cloned().collect();
    let round_tripped: Vec<String> = vector.into_iter().collect();

    assert_eq!(round_tripped, original);
}

#[rstest]
fn undo_history_via_snapshots() {
    // A typical undo stack: keep each version, restore an old one later
    let mut history = vec![RadixVector::<i32>::new()];

    for value in 0..200 {
        let next = history.last().expect("history is non-empty").push(value);
        history.push(next);
    }

    let current = history.last().expect("history is non-empty");
    assert_eq!(current.len(), 200);

    // Restore the state from 150 edits ago
    let restored = &history[50];
    assert_eq!(restored.len(), 50);
    assert_eq!(restored.get(49), Ok(&49));
    assert_eq!(
        restored.get(50),
        Err(VectorError::IndexOutOfRange {
            index: 50,
            length: 50
        })
    );

    // The restored version can diverge without touching the rest
    let diverged = restored.push(-1);
    assert_eq!(diverged.get(50), Ok(&-1));
    assert_eq!(current.get(50), Ok(&50));
}

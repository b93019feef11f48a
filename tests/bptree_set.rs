use std::collections::BTreeSet;

use bptree::{BPTreeSet, Error, Rank, ScoreOrder, ScoredMember};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn check<T, P: bptree::OrderPolicy<T>>(set: &BPTreeSet<T, P>) {
    assert_eq!(set.validate(), Ok(()));
}

fn collect_window(set: &BPTreeSet<u64>, from: usize, to: usize) -> Vec<u64> {
    let mut keys = Vec::new();
    set.iterate(from, to, |&key| keys.push(key));
    keys
}

fn collect_window_reverse(set: &BPTreeSet<u64>, from: usize, to: usize) -> Vec<u64> {
    let mut keys = Vec::new();
    set.iterate_reverse(from, to, |&key| keys.push(key));
    keys
}

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[test]
fn ascending_inserts_rank_round_trip() {
    init_tracing();
    let mut set = BPTreeSet::new();
    for i in 1..7000u64 {
        assert!(set.insert(i));
    }
    assert_eq!(set.len(), 6999);
    for i in 1..7000u64 {
        assert_eq!(set.get_rank(&i), usize::try_from(i - 1).unwrap());
    }
    check(&set);
}

#[test]
fn descending_inserts_rank_round_trip() {
    let mut set = BPTreeSet::new();
    for i in (2..=20_000u64).rev() {
        assert!(set.insert(i));
    }
    for i in 2..=20_000u64 {
        assert_eq!(set.get_rank(&i), usize::try_from(i - 2).unwrap());
    }
    check(&set);
}

#[test]
fn even_keys_window() {
    let set: BPTreeSet<u64> = (0..7000u64).map(|i| i * 2).collect();
    let window = collect_window(&set, 31, 543);
    assert_eq!(window.len(), 513);
    assert_eq!(window, (31..=543u64).map(|i| i * 2).collect::<Vec<_>>());
    assert_eq!(window.first(), Some(&62));
    assert_eq!(window.last(), Some(&1086));
}

#[test]
fn ascending_deletes_drain_to_empty() {
    init_tracing();
    let mut set: BPTreeSet<u64> = (0..7000u64).collect();
    for i in 0..7000u64 {
        let before = set.len();
        assert_eq!(set.get_rank(&6999), before - 1);
        assert!(set.remove(&i));
        assert_eq!(set.len(), before - 1);
    }
    assert_eq!(set.height(), 0);
    assert_eq!(set.node_count(), 0);
    assert_eq!(set.used_bytes(), 0);
    check(&set);
}

// ─── Set semantics ───────────────────────────────────────────────────────────

#[test]
fn duplicates_are_rejected_without_change() {
    let mut set = BPTreeSet::from([1u64, 2, 3]);
    let nodes = set.node_count();
    assert!(!set.insert(2));
    assert_eq!(set.len(), 3);
    assert_eq!(set.node_count(), nodes);
}

#[test]
fn deleting_absent_keys_is_a_no_op() {
    let mut set: BPTreeSet<u64> = (0..100).map(|i| i * 2).collect();
    let bytes = set.used_bytes();
    assert!(!set.remove(&7));
    assert!(!set.remove(&1000));
    assert_eq!(set.take(&9), None);
    assert_eq!(set.len(), 100);
    assert_eq!(set.used_bytes(), bytes);

    let mut empty: BPTreeSet<u64> = BPTreeSet::new();
    assert!(!empty.remove(&1));
}

#[test]
fn clear_releases_all_memory() {
    init_tracing();
    let mut set = BPTreeSet::new();
    for i in 0..50_000u64 {
        set.insert(i.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    }
    for i in 0..10_000u64 {
        set.remove(&i.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    }
    assert!(set.used_bytes() > 0);

    set.clear();
    assert_eq!(set.used_bytes(), 0);
    assert_eq!(set.node_count(), 0);
    assert_eq!(set.height(), 0);
    assert!(set.is_empty());

    assert!(set.insert(1));
    assert_eq!(set.select(0), Some(&1));
}

#[test]
fn first_last_and_pops() {
    let mut set: BPTreeSet<u64> = (10..=90).collect();
    assert_eq!(set.first(), Some(&10));
    assert_eq!(set.last(), Some(&90));
    assert_eq!(set.pop_first(), Some(10));
    assert_eq!(set.pop_last(), Some(90));
    assert_eq!(set.first(), Some(&11));
    assert_eq!(set.len(), 79);
    check(&set);
}

// ─── Order statistics ────────────────────────────────────────────────────────

#[test]
fn forward_window_equals_successive_selects() {
    let set: BPTreeSet<u64> = (0..5000u64).map(|i| i * 7 % 10_007).collect();
    for (from, to) in [(0, 0), (0, 4999), (17, 18), (1000, 3999), (4999, 4999)] {
        let selected: Vec<u64> = (from..=to).map(|rank| *set.select(rank).unwrap()).collect();
        assert_eq!(collect_window(&set, from, to), selected);
    }
}

#[test]
fn reverse_window_is_forward_reversed() {
    let set: BPTreeSet<u64> = (0..5000u64).collect();
    let (from, to) = (123, 4321);
    let reversed = collect_window_reverse(&set, from, to);
    assert_eq!(reversed.first(), set.select(to));
    assert_eq!(reversed.last(), set.select(from));
    let mut forward = collect_window(&set, from, to);
    forward.reverse();
    assert_eq!(reversed, forward);
}

#[test]
fn range_by_rank_reports_invalid_windows() {
    let set: BPTreeSet<u64> = (0..10).collect();
    assert_eq!(set.range_by_rank(4..=3).err(), Some(Error::InvalidRange { from: 4, to: 3, len: 10 }));
    assert_eq!(set.range_by_rank(0..=10).err(), Some(Error::InvalidRange { from: 0, to: 10, len: 10 }));
    assert_eq!(set.range_by_rank(9..=9).map(|window| window.len()), Ok(1));
}

#[test]
#[should_panic(expected = "invalid rank range 0..=10 for a set of 10 keys")]
fn iterate_past_end_fails_fast() {
    let set: BPTreeSet<u64> = (0..10).collect();
    set.iterate(0, 10, |_| {});
}

#[test]
fn index_by_rank() {
    let set = BPTreeSet::from(["pear", "apple", "fig"]);
    assert_eq!(set[Rank(0)], "apple");
    assert_eq!(set[Rank(2)], "pear");
    assert_eq!(set.rank_of(&"fig"), Some(1));
    assert_eq!(set.rank_of(&"kiwi"), None);
}

// ─── Sorted-set keys ─────────────────────────────────────────────────────────

#[test]
fn scored_members_order_by_score_then_member() {
    let mut zset: BPTreeSet<ScoredMember, ScoreOrder> = BPTreeSet::with_policy();
    for (score, member) in [(3.0, "c"), (1.0, "x"), (2.0, "b"), (2.0, "a"), (-1.5, "neg")] {
        assert!(zset.insert(ScoredMember::new(score, member)));
    }
    assert!(!zset.insert(ScoredMember::new(2.0, "a")));
    assert!(zset.insert(ScoredMember::new(2.5, "a")));

    let members: Vec<&[u8]> = zset.iter().map(ScoredMember::member).collect();
    let expected: [&[u8]; 6] = [b"neg", b"x", b"a", b"b", b"a", b"c"];
    assert_eq!(members, expected);

    // Keys scoring within [1.0, 2.0].
    let lo = ScoredMember::new(1.0, "");
    let hi = ScoredMember::new(2.0, [0xFF; 8]);
    assert_eq!(zset.upper_rank(&hi) - zset.get_rank(&lo), 3);

    assert!(zset.remove(&ScoredMember::new(2.0, "b")));
    assert_eq!(zset.rank_of(&ScoredMember::new(2.5, "a")), Some(3));
    check(&zset);
}

#[test]
fn both_zero_scores_name_one_entry() {
    let mut zset: BPTreeSet<ScoredMember, ScoreOrder> = BPTreeSet::with_policy();
    assert!(zset.insert(ScoredMember::new(-0.0, "m")));
    assert!(zset.contains(&ScoredMember::new(0.0, "m")));
    assert!(!zset.insert(ScoredMember::new(0.0, "m")));
    assert_eq!(zset.len(), 1);

    zset.insert(ScoredMember::new(-0.0, "n"));
    zset.insert(ScoredMember::new(-1.0, "below"));

    // Keys scoring within [0.0, 0.0] include the ones built from -0.0.
    let lo = ScoredMember::new(0.0, "");
    let hi = ScoredMember::new(0.0, [0xFF; 8]);
    assert_eq!(zset.upper_rank(&hi) - zset.get_rank(&lo), 2);

    let copy = zset.clone();
    assert!(copy == zset);
    check(&zset);
}

#[test]
fn nan_scores_never_reach_the_set() {
    assert_eq!(ScoredMember::try_new(f64::NAN, "m"), Err(Error::NanScore));
    assert_eq!(Error::NanScore.to_string(), "score is not a number");
}

// ─── Model-based ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
enum Op {
    Insert(u32),
    Remove(u32),
    PopFirst,
    PopLast,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        5 => (0u32..4000).prop_map(Op::Insert),
        3 => (0u32..4000).prop_map(Op::Remove),
        1 => Just(Op::PopFirst),
        1 => Just(Op::PopLast),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn behaves_like_btreeset(ops in prop::collection::vec(op_strategy(), 0..2000)) {
        let mut set = BPTreeSet::new();
        let mut model = BTreeSet::new();

        for op in ops {
            match op {
                Op::Insert(key) => prop_assert_eq!(set.insert(key), model.insert(key)),
                Op::Remove(key) => prop_assert_eq!(set.remove(&key), model.remove(&key)),
                Op::PopFirst => prop_assert_eq!(set.pop_first(), model.pop_first()),
                Op::PopLast => prop_assert_eq!(set.pop_last(), model.pop_last()),
            }
        }
        check(&set);

        prop_assert_eq!(set.len(), model.len());
        prop_assert!(set.iter().eq(model.iter()));
        prop_assert!(set.iter().rev().eq(model.iter().rev()));
        for (rank, key) in model.iter().enumerate() {
            prop_assert_eq!(set.get_rank(key), rank);
            prop_assert_eq!(set.select(rank), Some(key));
        }
    }

    #[test]
    fn windows_match_model(
        keys in prop::collection::btree_set(any::<u32>(), 1..1500),
        a in any::<prop::sample::Index>(),
        b in any::<prop::sample::Index>(),
    ) {
        let set: BPTreeSet<u32> = keys.iter().copied().collect();
        let (from, to) = {
            let (x, y) = (a.index(keys.len()), b.index(keys.len()));
            (x.min(y), x.max(y))
        };
        let expected: Vec<&u32> = keys.iter().skip(from).take(to - from + 1).collect();

        let window: Vec<&u32> = set.range_by_rank(from..=to).unwrap().collect();
        prop_assert_eq!(&window, &expected);

        let mut reversed: Vec<&u32> = set.range_by_rank(from..=to).unwrap().rev().collect();
        reversed.reverse();
        prop_assert_eq!(reversed, expected);
    }
}

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::Rope;

#[test]
fn test_from_changes_apply() {
	let mut doc = Rope::from("hello world");
	let cs = ChangeSet::from_changes(doc.len_chars(), [Change::replace(0, 5, "howdy"), Change::insert(11, "!")]);
	cs.apply(&mut doc);
	assert_eq!(doc.to_string(), "howdy world!");
	assert_eq!(cs.len(), 11);
	assert_eq!(cs.len_after(), 12);
}

#[test]
fn test_identity_is_empty() {
	let cs = ChangeSet::identity(42);
	assert!(cs.is_empty());
	assert_eq!(cs.changed_ranges().count(), 0);
	assert_eq!(cs.map_pos(17, Bias::Right), 17);

	let cs = ChangeSet::from_changes(42, []);
	assert!(cs.is_empty());
}

#[test]
fn test_builders_match_from_changes() {
	let mut cs = ChangeSet::default();
	cs.retain(3);
	cs.delete(2);
	cs.insert("xyz".into());
	cs.retain(5);
	assert_eq!(cs, ChangeSet::from_changes(10, [Change::replace(3, 5, "xyz")]));
	assert_eq!(cs.len_after(), 11);
}

#[test]
#[should_panic(expected = "out of order")]
fn test_from_changes_rejects_overlap() {
	let _ = ChangeSet::from_changes(20, [Change::delete(5, 10), Change::delete(8, 12)]);
}

#[test]
fn test_map_pos_insert_bias() {
	let cs = ChangeSet::from_changes(10, [Change::insert(4, "abc")]);
	assert_eq!(cs.map_pos(4, Bias::Left), 4);
	assert_eq!(cs.map_pos(4, Bias::Right), 7);
	assert_eq!(cs.map_pos(3, Bias::Right), 3);
	assert_eq!(cs.map_pos(5, Bias::Left), 8);
	assert_eq!(cs.map_pos(10, Bias::Left), 13);
}

#[test]
fn test_map_pos_inside_delete_collapses() {
	let cs = ChangeSet::from_changes(20, [Change::delete(5, 10)]);
	assert_eq!(cs.map_pos(5, Bias::Right), 5);
	assert_eq!(cs.map_pos(7, Bias::Left), 5);
	assert_eq!(cs.map_pos(10, Bias::Left), 5);
	assert_eq!(cs.map_pos(15, Bias::Left), 10);
}

#[test]
fn test_changed_ranges_coalesces_replacement() {
	let cs = ChangeSet::from_changes(
		30,
		[Change::replace(2, 4, "xyz"), Change::insert(10, "12345"), Change::delete(20, 25)],
	);
	let ranges: Vec<_> = cs.changed_ranges().collect();
	assert_eq!(
		ranges,
		vec![
			ChangedRange {
				from_a: 2,
				to_a: 4,
				from_b: 2,
				to_b: 5
			},
			ChangedRange {
				from_a: 10,
				to_a: 10,
				from_b: 11,
				to_b: 16
			},
			ChangedRange {
				from_a: 20,
				to_a: 25,
				from_b: 26,
				to_b: 26
			},
		]
	);
	assert_eq!(ranges[2].shift(), 1);
}

#[test]
fn test_changed_range_shift_is_cumulative() {
	let cs = ChangeSet::from_changes(100, [Change::insert(10, "aaaaa"), Change::delete(50, 53)]);
	let shifts: Vec<_> = cs.changed_ranges().map(|r| r.shift()).collect();
	assert_eq!(shifts, vec![5, 2]);
}

fn arb_changes(len: usize) -> impl Strategy<Value = Vec<Change>> {
	prop::collection::vec((0..=len, 0usize..8, "[a-z]{0,6}"), 0..6).prop_map(move |mut raw| {
		raw.sort_by_key(|(start, ..)| *start);
		let mut out = Vec::new();
		let mut last = 0;
		for (start, del, text) in raw {
			if start < last {
				continue;
			}
			let end = (start + del).min(len);
			out.push(Change::replace(start, end, text));
			last = end;
		}
		out
	})
}

proptest! {
	#[test]
	fn prop_map_pos_is_monotonic(changes in arb_changes(64), a in 0usize..=64, b in 0usize..=64) {
		let cs = ChangeSet::from_changes(64, changes);
		let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
		prop_assert!(cs.map_pos(lo, Bias::Left) <= cs.map_pos(hi, Bias::Left));
		prop_assert!(cs.map_pos(lo, Bias::Right) <= cs.map_pos(hi, Bias::Right));
		prop_assert!(cs.map_pos(lo, Bias::Left) <= cs.map_pos(lo, Bias::Right));
		prop_assert!(cs.map_pos(hi, Bias::Right) <= cs.len_after());
	}

	#[test]
	fn prop_changed_ranges_are_sorted_and_consistent(changes in arb_changes(64)) {
		let cs = ChangeSet::from_changes(64, changes);
		let mut doc = Rope::from("x".repeat(64));
		cs.apply(&mut doc);
		prop_assert_eq!(doc.len_chars(), cs.len_after());

		let mut prev_a = 0;
		let mut prev_b = 0;
		for r in cs.changed_ranges() {
			prop_assert!(r.from_a >= prev_a && r.from_b >= prev_b);
			prop_assert!(r.from_a <= r.to_a && r.from_b <= r.to_b);
			prop_assert_eq!(r.from_a as isize - r.from_b as isize, prev_a as isize - prev_b as isize);
			prev_a = r.to_a;
			prev_b = r.to_b;
		}
	}
}

//! An order-statistic B-tree set for sorted-set engines.
//!
//! [`BPTreeSet`] stores unique keys in a B-tree whose internal nodes cache the number of keys
//! below them. That one extra field turns rank queries into O(log n) descents:
//!
//! - [`get_rank`](BPTreeSet::get_rank) - how many keys sort before a given key
//! - [`select`](BPTreeSet::select) - the key at a given ascending position
//! - [`range_by_rank`](BPTreeSet::range_by_rank) - a lazy window of ranks, walked from either end
//! - Indexing by [`Rank`], e.g. `set[Rank(0)]` for the smallest key
//!
//! # Example
//!
//! ```
//! use bptree::{BPTreeSet, ScoreOrder, ScoredMember};
//!
//! let mut board: BPTreeSet<ScoredMember, ScoreOrder> = BPTreeSet::with_policy();
//! board.insert(ScoredMember::new(310.0, "carol"));
//! board.insert(ScoredMember::new(120.5, "alice"));
//! board.insert(ScoredMember::new(120.5, "bob"));
//!
//! // Equal scores fall back to the member bytes.
//! assert_eq!(board.select(1).map(ScoredMember::member), Some(&b"bob"[..]));
//!
//! // Everyone scoring at most 200.
//! assert_eq!(board.upper_rank(&ScoredMember::new(200.0, "")), 2);
//!
//! let top: Vec<_> = board.iter().rev().take(2).map(ScoredMember::score).collect();
//! assert_eq!(top, [310.0, 120.5]);
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - only requires `alloc`
//! - **Pluggable ordering** - the comparison policy is a type parameter, dispatched statically
//! - **Exact memory accounting** - [`used_bytes`](BPTreeSet::used_bytes) returns to zero once
//!   the set is emptied
//! - **`validate`** (cargo feature) - exposes [`BPTreeSet::validate`], a full invariant check
//!
//! # Implementation
//!
//! A classic B-tree: every node holds keys, and internal nodes own one more child than keys.
//! Nodes live in an arena and are addressed by compact handles; there are no parent pointers,
//! so every operation carries its own root-to-leaf path.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

mod order_statistic;
mod raw;

pub mod bptree_set;
pub mod error;
pub mod policy;

pub use bptree_set::{BPTreeSet, RankRange};
pub use error::{Error, Result};
pub use order_statistic::Rank;
pub use policy::{NaturalOrder, OrderPolicy, ScoreOrder, ScoredMember};

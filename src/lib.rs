//! probe-table: a single-threaded open-addressing hash map with linear
//! probing, pluggable hash/equality strategies, and tombstone deletion.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small, fully-owned associative container whose probing,
//!   growth and deletion rules are simple enough to check slot by slot.
//! - Pieces:
//!   - ProbeTable<K, V, S>: the map. One `Vec` of slots; each slot is
//!     `Empty`, `Tombstone`, or `Occupied { hash, key, value }`.
//!   - KeyStrategy<Q>: the (hash, equality) capability pair chosen at
//!     construction. `StdStrategy<B>` covers `Hash + Eq` keys with any
//!     `BuildHasher`; `FnStrategy<Q>` takes two plain function pointers;
//!     `Djb2` is the classic string hash as a `BuildHasher`.
//!   - word_count: the reference consumer. Counts words of a text through
//!     `ProbeTable::entry` and ranks them; the `wordfreq` binary wraps it.
//!
//! Probing
//! - Home slot is `hash & (capacity - 1)`; capacity is always 0 or a power
//!   of two. Probes walk forward with wraparound and visit each slot at
//!   most once.
//! - Lookups skip tombstones and stop at the first empty slot.
//! - Inserts remember the first tombstone on the chain and reuse it once
//!   the key is known to be absent.
//!
//! Growth
//! - Load factor is 3/4 and counts tombstones, so an allocated table always
//!   has an empty slot and every probe terminates.
//! - Growth runs before a slot is claimed: double the capacity (first
//!   allocation: `INITIAL_CAPACITY`), or rehash in place when the pressure
//!   comes from tombstones and the live entries fit in half the budget.
//!   There is no shrinking.
//! - Each slot caches its key's hash; rehashing uses the cached value and
//!   never calls back into the strategy, so it cannot fail half-way.
//!
//! Deletion
//! - Removing a key leaves a tombstone so chains through the slot stay
//!   intact. If the following slot is empty no chain passes through, and the
//!   slot is emptied instead.
//!
//! Handles
//! - `entry`, `insert` and `get_mut` return `&mut V` borrowed from the table.
//!   Growth moves the backing array, and the borrow checker rejects any use
//!   of such a reference across a later mutating call. Copy the value out if
//!   it has to outlive the next call.
//!
//! Reentrancy
//! - Strategies run user code during probes. In debug builds a per-table
//!   guard panics if that code re-enters the same table; release builds
//!   compile the guard away.
//!
//! Notes and non-goals
//! - No internal locking: `ProbeTable` is `Send` when its contents are, and
//!   callers needing shared access wrap it in their own `Mutex`.
//! - Keys are owned by the table. Borrowed keys are expressed with a
//!   reference key type such as `&'a str`.
//! - No shrink, no eviction, no persistence.
//!
//! Logging goes through the `log` facade (`debug!` on every rehash); the
//! `wordfreq` binary installs `env_logger`.

mod guard;
pub mod probe_table;
mod probe_table_proptest;
pub mod strategy;
pub mod word_count;

// Public surface
pub use probe_table::{InsertError, ProbeTable, INITIAL_CAPACITY};
pub use strategy::{djb2, Djb2, FnStrategy, KeyStrategy, StdStrategy};

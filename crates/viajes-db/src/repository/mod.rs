// ============================================================================
// Repositories
// ============================================================================
//
// One repository per aggregate, each holding a cloned `SqlitePool` handle.
// Plain reads and writes go through the pool directly; anything that must
// participate in a multi-statement transaction (stock adjustments, the
// reservation insert trio) is exposed as an associated function taking a
// `&mut SqliteConnection` so the calling engine owns the transaction.

pub mod cart;
pub mod catalog;
pub mod reservation;
pub mod user;

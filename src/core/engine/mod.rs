//! The split and settlement engine. Synchronous, no I/O: every function takes the
//! data it needs and returns its result.

pub mod identity;
pub mod ledger;
pub mod settlement;
pub mod split;

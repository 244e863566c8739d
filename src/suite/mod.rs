//! Suite structure and fixtures
//!
//! Classification of tree nodes, conversion into the canonical four-level
//! shape, and the run-scoped fixture ledger with its hook invocation.

pub mod classify;
mod convert;
pub mod fixtures;
mod ledger;

pub use classify::check_well_formed;
pub use convert::convert;
pub use ledger::{FixtureLedger, FixtureState};

//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod dispatch_turn;
pub mod run_turn;
pub mod synthesize;

#[cfg(test)]
pub(crate) mod test_support;

// tests/property_test.rs

//! Property-based tests for Cobalt.
//!
//! These check invariants that must hold for every input, not just the
//! handful of cases the integration tests happen to cover.

mod property {
    pub mod fault_code_test;
    pub mod reservation_overlap_test;
    pub mod spec_match_test;
    pub mod topology_test;
}

// tests/property/fault_code_test.rs

//! The numeric fault code carried by each `CobaltError` variant is part of
//! the wire contract and must never depend on the message text.

use cobalt::core::errors::CobaltError;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 200,
        max_shrink_iters: 1000,
        ..ProptestConfig::default()
    })]

    #[test]
    fn validation_errors_always_carry_code_thirty(message in ".{0,500}") {
        prop_assert_eq!(CobaltError::validation(message).fault_code(), 30);
    }

    #[test]
    fn conflict_errors_always_carry_code_twenty(message in ".{0,500}") {
        prop_assert_eq!(CobaltError::conflict(message).fault_code(), 20);
    }

    #[test]
    fn transient_errors_always_carry_code_ten(component in ".{0,100}", message in ".{0,500}") {
        prop_assert_eq!(CobaltError::transient(component, message).fault_code(), 10);
    }

    #[test]
    fn internal_errors_always_carry_code_one(message in ".{0,500}") {
        prop_assert_eq!(CobaltError::internal(message).fault_code(), 1);
    }
}

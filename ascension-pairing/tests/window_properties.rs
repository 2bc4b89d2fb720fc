//! Property-based tests for pairing windows.
//!
//! - a code is accepted throughout its own window and the next one
//! - it is rejected from two windows later onwards
//! - it is never accepted in an earlier window

mod common;

use common::{generator_at, PAIRING_SEED};
use proptest::prelude::*;

proptest! {
    #[test]
    fn accepted_in_w_and_w_plus_one(window in 1i64..10_000_000, offset in 0i64..600, later in 0i64..600) {
        let (generator, clock) = generator_at(window * 600 + offset);
        let code = generator.code_for_window(window);
        prop_assert!(generator.is_current_or_previous(&code));
        clock.set_unix((window + 1) * 600 + later);
        prop_assert!(generator.is_current_or_previous(&code));
    }

    #[test]
    fn rejected_from_w_plus_two(window in 1i64..10_000_000, gap in 2i64..50, offset in 0i64..600) {
        let (generator, _) = generator_at((window + gap) * 600 + offset);
        let code = generator.code_for_window(window);
        prop_assert!(!generator.is_current_or_previous(&code));
    }

    #[test]
    fn rejected_before_its_window(window in 1i64..10_000_000, ahead in 1i64..50) {
        let (generator, _) = generator_at((window - ahead) * 600);
        let code = generator.code_for_window(window);
        prop_assert!(!generator.is_current_or_previous(&code));
    }

    #[test]
    fn codes_have_six_known_words(window in any::<i64>()) {
        let (generator, _) = generator_at(0);
        let code = generator.code_for_window(window);
        prop_assert_eq!(code.split('-').count(), 6);
        prop_assert!(code.chars().all(|c| c.is_ascii_lowercase() || c == '-'));
        prop_assert!(!code.contains(std::str::from_utf8(PAIRING_SEED).unwrap()));
    }
}

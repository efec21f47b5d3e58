// tests/property/reservation_overlap_test.rs

//! `Reservation::overlaps` must be monotonic in the span it's asked about:
//! widening the job's prospective run can only ever add more overlapping
//! reservations, never remove one.

use cobalt::core::types::Reservation;
use proptest::prelude::*;

fn reservation(start: i64, duration: i64, cycle: i64) -> Reservation {
    Reservation {
        name: "maint".into(),
        start,
        duration,
        cycle,
        users: vec![],
        partitions: vec!["p0".into()],
        res_id: None,
        cycle_id: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 1000,
        ..ProptestConfig::default()
    })]

    #[test]
    fn widening_the_span_never_loses_an_overlap(
        start in -100_000i64..100_000,
        duration in 1i64..50_000,
        cycle in 0i64..20_000,
        from in -100_000i64..100_000,
        span in 0i64..50_000,
        extra in 0i64..50_000,
    ) {
        let r = reservation(start, duration, cycle);
        if r.overlaps(from, span) {
            prop_assert!(r.overlaps(from, span + extra));
        }
    }

    #[test]
    fn an_active_instant_always_overlaps_a_nonzero_span_starting_there(
        start in -100_000i64..100_000,
        duration in 1i64..50_000,
        span in 1i64..50_000,
    ) {
        // Non-cyclic only: with a cycle, wraparound can put `now` inside one
        // repetition while the span-widened window still misses the next.
        let r = reservation(start, duration, 0);
        for now in [start, start + duration - 1] {
            if r.is_active(now) {
                prop_assert!(r.overlaps(now, span));
            }
        }
    }
}

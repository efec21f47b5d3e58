// tests/property/spec_match_test.rs

//! The "spec dict" query protocol (`core::spec`) must behave the same for
//! every entity that implements `Matchable`: an exact-field spec always
//! matches the entity it was built from, and the wildcard always matches
//! regardless of the entity's actual value.

use cobalt::core::spec::{Matchable, Spec, WILDCARD};
use cobalt::core::types::{Job, JobState, Mode};
use proptest::prelude::*;

fn job(jobid: i64, queue: &str, nodes: u32) -> Job {
    Job {
        jobid,
        user: "alice".into(),
        queue: queue.to_string(),
        nodes,
        procs: nodes,
        mode: Mode::Co,
        walltime: 30,
        walltime_p: None,
        kernel: None,
        location: None,
        all_dependencies: Default::default(),
        satisfied_dependencies: Default::default(),
        state: JobState::Queued,
        exit_status: None,
        submittime: 0,
        starttime: None,
        index: None,
        stdin: None,
        stdout: None,
        stderr: None,
        cwd: "/".into(),
        env: vec![],
        args: vec![],
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 200,
        max_shrink_iters: 1000,
        ..ProptestConfig::default()
    })]

    #[test]
    fn an_exact_jobid_spec_always_matches_its_own_job(jobid in any::<i64>(), nodes in 1u32..4096) {
        let j = job(jobid, "default", nodes);
        let spec = Spec::new().with("jobid", jobid);
        prop_assert!(j.matches(&spec));
    }

    #[test]
    fn an_exact_jobid_spec_never_matches_a_different_jobid(a in any::<i64>(), b in any::<i64>()) {
        prop_assume!(a != b);
        let j = job(a, "default", 32);
        let spec = Spec::new().with("jobid", b);
        prop_assert!(!j.matches(&spec));
    }

    #[test]
    fn a_wildcard_queue_spec_matches_every_queue_name(queue in "[a-zA-Z0-9_.-]{1,32}") {
        let j = job(1, &queue, 32);
        let spec = Spec::new().with("queue", WILDCARD);
        prop_assert!(j.matches(&spec));
    }

    #[test]
    fn an_unknown_field_spec_never_matches(field in "[a-z_]{1,16}", value in any::<i64>()) {
        prop_assume!(!["jobid", "user", "queue", "nodes", "procs", "state", "location", "exit_status"].contains(&field.as_str()));
        let j = job(1, "default", 32);
        let spec = Spec::new().with(field, value);
        prop_assert!(!j.matches(&spec));
    }
}

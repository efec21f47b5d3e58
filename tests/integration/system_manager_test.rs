// tests/integration/system_manager_test.rs

use crate::integration::fixtures;
use cobalt::core::collaborators::bridge::{Bridge, BridgeNodeCardStatus, BridgePartitionStatus};
use cobalt::core::collaborators::forker::{ChildStatus, Forker, ForkerChild, StartSpec};
use cobalt::core::errors::CobaltError;
use cobalt::core::types::Mode;
use cobalt::system_manager::process_groups::{self, NewProcessGroupSpec};
use cobalt::system_manager::state::{SystemManagerState, ValidationLimits};
use cobalt::system_manager::topology;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

fn limits() -> ValidationLimits {
    ValidationLimits { max_nodecount: 4096, known_kernels: vec!["default".into(), "custom-a".into()], custom_kernels_enabled: true }
}

#[test]
fn validate_job_enforces_nodecount_walltime_and_mode_multiplier() {
    let state = SystemManagerState::new(limits());

    assert!(state.validate_job(0, 30, Mode::Co, 0, None).is_err(), "zero nodecount must be rejected");
    assert!(state.validate_job(5000, 30, Mode::Co, 5000, None).is_err(), "nodecount over the limit must be rejected");
    assert!(state.validate_job(32, 4, Mode::Co, 32, None).is_err(), "walltime under 5 minutes must be rejected");

    // VN mode allows up to 4x nodecount in proccount, CO only 1x.
    assert!(state.validate_job(32, 30, Mode::Vn, 128, None).is_ok());
    assert!(state.validate_job(32, 30, Mode::Co, 128, None).is_err());
    assert!(state.validate_job(32, 30, Mode::Co, 32, None).is_ok());
}

#[test]
fn validate_job_rejects_an_unknown_kernel_only_when_custom_kernels_are_enabled() {
    let state = SystemManagerState::new(limits());
    assert!(state.validate_job(32, 30, Mode::Co, 32, Some("custom-a")).is_ok());
    assert!(state.validate_job(32, 30, Mode::Co, 32, Some("nonexistent")).is_err());

    let mut disabled = limits();
    disabled.custom_kernels_enabled = false;
    let state = SystemManagerState::new(disabled);
    assert!(state.validate_job(32, 30, Mode::Co, 32, Some("nonexistent")).is_ok());
}

#[test]
fn reserve_resources_until_goes_idle_to_held_extends_then_releases() {
    let mut state = SystemManagerState::new(limits());
    state.add_partition(fixtures::partition("p0", 32, "default")).unwrap();

    state.reserve_resources_until("p0", Some(100), 5).unwrap();
    assert_eq!(state.partitions["p0"].used_by, Some(5));
    assert_eq!(state.partitions["p0"].reserved_until, Some(100));

    // Same owner extending the deadline only ever moves it forward.
    state.reserve_resources_until("p0", Some(50), 5).unwrap();
    assert_eq!(state.partitions["p0"].reserved_until, Some(100));
    state.reserve_resources_until("p0", Some(200), 5).unwrap();
    assert_eq!(state.partitions["p0"].reserved_until, Some(200));

    // A different job can't steal a held partition.
    assert!(state.reserve_resources_until("p0", Some(300), 6).is_err());

    state.reserve_resources_until("p0", None, 5).unwrap();
    assert!(state.partitions["p0"].used_by.is_none());
}

#[test]
fn add_partition_recomputes_containment_across_the_whole_table() {
    let mut state = SystemManagerState::new(limits());
    let mut big = fixtures::partition("big", 64, "default");
    big.node_cards = vec!["n0".into(), "n1".into()];
    let mut small = fixtures::partition("small", 32, "default");
    small.node_cards = vec!["n0".into()];

    state.add_partition(big).unwrap();
    state.add_partition(small).unwrap();

    assert!(state.partitions["big"].children.contains("small"));
    assert!(state.partitions["small"].parents.contains("big"));
}

struct FakeBridge {
    boot_image_fails: bool,
}

#[async_trait::async_trait]
impl Bridge for FakeBridge {
    async fn list_partitions(&self) -> Result<Vec<BridgePartitionStatus>, CobaltError> {
        Ok(vec![])
    }

    async fn list_node_cards(&self) -> Result<Vec<BridgeNodeCardStatus>, CobaltError> {
        Ok(vec![])
    }

    async fn destroy(&self, _partition_id: &str) -> Result<(), CobaltError> {
        Ok(())
    }

    async fn set_boot_image(&self, _partition_id: &str, _kernel: &str) -> Result<(), CobaltError> {
        if self.boot_image_fails {
            Err(CobaltError::internal("boot image service unavailable"))
        } else {
            Ok(())
        }
    }
}

struct FakeForker {
    next_pid: AtomicI64,
    start_fails_transient: bool,
}

impl FakeForker {
    fn new() -> Self {
        Self { next_pid: AtomicI64::new(1000), start_fails_transient: false }
    }
}

#[async_trait::async_trait]
impl Forker for FakeForker {
    async fn start(&self, _spec: StartSpec) -> Result<i64, CobaltError> {
        if self.start_fails_transient {
            return Err(CobaltError::transient("bg_mpirun_forker", "connection refused"));
        }
        Ok(self.next_pid.fetch_add(1, Ordering::SeqCst))
    }

    async fn signal(&self, _pid: i64, _name: &str) -> Result<(), CobaltError> {
        Ok(())
    }

    async fn get_status(&self, _pid: i64) -> Result<Option<ChildStatus>, CobaltError> {
        Ok(Some(ChildStatus { exit_status: Some(0), signum: None, core_dump: false }))
    }

    async fn get_children(&self) -> Result<Vec<ForkerChild>, CobaltError> {
        Ok(vec![])
    }

    async fn cleanup_children(&self, _ids: Vec<i64>) -> Result<(), CobaltError> {
        Ok(())
    }

    async fn active_list(&self) -> Result<Vec<i64>, CobaltError> {
        Ok(vec![])
    }
}

fn new_pg_spec(jobid: i64, location: &str) -> NewProcessGroupSpec {
    NewProcessGroupSpec {
        jobid,
        user: "alice".into(),
        location: location.into(),
        mode: Mode::Co,
        kernel: None,
        walltime: 30,
        killtime: 5,
        stdin: None,
        stdout: None,
        stderr: None,
        cwd: "/".into(),
        env: vec![],
        args: vec![],
        executable: "/bin/true".into(),
        umask: 0,
    }
}

#[tokio::test]
async fn add_one_reserves_the_partition_and_records_the_forker_pid() {
    let mut inner = SystemManagerState::new(limits());
    inner.add_partition(fixtures::partition("p0", 32, "default")).unwrap();
    let state = Arc::new(Mutex::new(inner));
    let bridge: Arc<dyn Bridge> = Arc::new(FakeBridge { boot_image_fails: false });
    let forker: Arc<dyn Forker> = Arc::new(FakeForker::new());

    let pg = process_groups::add_one(&state, &bridge, &forker, &forker, new_pg_spec(42, "p0"), 1_000).await.unwrap();

    assert!(pg.head_pid.is_some());
    assert!(pg.exit_status.is_none());
    let guard = state.lock().await;
    assert_eq!(guard.partitions["p0"].used_by, Some(42));
}

#[tokio::test]
async fn add_one_completes_with_255_when_the_partition_is_already_held() {
    let mut inner = SystemManagerState::new(limits());
    inner.add_partition(fixtures::partition("p0", 32, "default")).unwrap();
    inner.reserve_resources_until("p0", Some(5_000), 7).unwrap();
    let state = Arc::new(Mutex::new(inner));
    let bridge: Arc<dyn Bridge> = Arc::new(FakeBridge { boot_image_fails: false });
    let forker: Arc<dyn Forker> = Arc::new(FakeForker::new());

    let pg = process_groups::add_one(&state, &bridge, &forker, &forker, new_pg_spec(42, "p0"), 1_000).await.unwrap();

    assert_eq!(pg.exit_status, Some(255));
    assert!(pg.head_pid.is_none());
}

#[tokio::test]
async fn add_one_completes_with_255_when_the_boot_image_change_fails() {
    let mut inner = SystemManagerState::new(limits());
    inner.add_partition(fixtures::partition("p0", 32, "default")).unwrap();
    let state = Arc::new(Mutex::new(inner));
    let bridge: Arc<dyn Bridge> = Arc::new(FakeBridge { boot_image_fails: true });
    let forker: Arc<dyn Forker> = Arc::new(FakeForker::new());

    let mut spec = new_pg_spec(42, "p0");
    spec.kernel = Some("custom-a".into());
    let pg = process_groups::add_one(&state, &bridge, &forker, &forker, spec, 1_000).await.unwrap();

    assert_eq!(pg.exit_status, Some(255));
    let guard = state.lock().await;
    assert!(guard.partitions["p0"].used_by.is_none(), "the reservation must be released on boot-image failure");
}

#[tokio::test]
async fn add_one_reraises_a_transient_forker_failure_instead_of_completing_the_pg() {
    let mut inner = SystemManagerState::new(limits());
    inner.add_partition(fixtures::partition("p0", 32, "default")).unwrap();
    let state = Arc::new(Mutex::new(inner));
    let bridge: Arc<dyn Bridge> = Arc::new(FakeBridge { boot_image_fails: false });
    let forker: Arc<dyn Forker> = Arc::new(FakeForker { next_pid: AtomicI64::new(1000), start_fails_transient: true });

    let err = process_groups::add_one(&state, &bridge, &forker, &forker, new_pg_spec(42, "p0"), 1_000).await.unwrap_err();
    assert!(matches!(err, CobaltError::Transient { .. }));
}

#[test]
fn wiring_conflict_is_derived_for_equal_sized_partitions_sharing_a_switch() {
    let mut partitions = indexmap::IndexMap::new();
    let mut a = fixtures::partition("a", 32, "default");
    a.switches = vec!["sw0".into()];
    let mut b = fixtures::partition("b", 32, "default");
    b.switches = vec!["sw0".into()];
    partitions.insert("a".to_string(), a);
    partitions.insert("b".to_string(), b);

    topology::update_relatives(&mut partitions);
    assert!(partitions["a"].wiring_conflicts.contains("b"));
    assert!(partitions["b"].wiring_conflicts.contains("a"));
}

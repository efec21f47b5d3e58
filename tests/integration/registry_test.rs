// tests/integration/registry_test.rs

use cobalt::registry::state::PersistedRegistry;
use cobalt::registry::RegistryState;
use std::collections::HashMap;
use std::time::Duration;

#[test]
fn register_then_locate_round_trips_through_persistence() {
    let mut state = RegistryState::new();
    state.register("queue-manager".into(), "http://10.0.0.1:9001/".into());
    state.register("scheduler".into(), "http://10.0.0.2:9002/".into());

    let persisted = PersistedRegistry::from(&state);
    assert_eq!(persisted.endpoints.len(), 2);

    let restored = RegistryState::from(persisted);
    assert_eq!(restored.locate("queue-manager").as_deref(), Some("http://10.0.0.1:9001/"));
    assert_eq!(restored.locate("scheduler").as_deref(), Some("http://10.0.0.2:9002/"));
}

#[test]
fn restored_entries_are_fresh_and_survive_a_sweep() {
    let mut endpoints = HashMap::new();
    endpoints.insert("system-manager".to_string(), "http://10.0.0.3:9003/".to_string());
    let mut state = RegistryState::from(PersistedRegistry { endpoints });

    // A restart shouldn't immediately expire everything it just loaded.
    state.expire_stale(Duration::from_secs(120));
    assert!(state.locate("system-manager").is_some());
}

#[test]
fn snapshot_lists_every_registered_component() {
    let mut state = RegistryState::new();
    state.register("a".into(), "http://a/".into());
    state.register("b".into(), "http://b/".into());

    let snapshot = state.snapshot();
    let mut names: Vec<_> = snapshot.iter().map(|c| c.name.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
}

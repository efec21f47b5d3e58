// tests/integration/rpc_dispatch_test.rs

use cobalt::core::errors::CobaltError;
use cobalt::core::protocol::{MethodTable, RpcResponse, SharedSecret};
use serde_json::{json, Value};
use std::io::Write;

#[tokio::test]
async fn dispatch_routes_by_name_and_returns_the_handler_result() {
    let mut methods = MethodTable::new();
    methods.register("echo", false, |params: Value| async move { Ok(params) });

    let result = methods.dispatch("echo", json!({"hello": "world"})).await.unwrap();
    assert_eq!(result, json!({"hello": "world"}));
}

#[tokio::test]
async fn dispatch_of_an_unregistered_method_is_a_fault_with_code_two() {
    let methods = MethodTable::new();
    let err = methods.dispatch("nonexistent", Value::Null).await.unwrap_err();
    assert!(matches!(err, CobaltError::UnknownMethod(_)));
    assert_eq!(err.fault_code(), 2);
}

#[tokio::test]
async fn a_failing_handler_s_fault_code_survives_the_envelope() {
    let mut methods = MethodTable::new();
    methods.register("always_conflicts", true, |_: Value| async move {
        Err(CobaltError::conflict("partition already held"))
    });

    let outcome = methods.dispatch("always_conflicts", Value::Null).await;
    let response = RpcResponse::from_result(outcome);
    match response {
        RpcResponse::Fault { fault } => assert_eq!(fault.code, 20),
        RpcResponse::Ok { .. } => panic!("expected a fault envelope"),
    }
}

#[test]
fn registered_methods_report_their_locking_flag() {
    let mut methods = MethodTable::new();
    methods.register("get_jobs", false, |_: Value| async move { Ok(Value::Null) });
    methods.register("set_jobs", true, |_: Value| async move { Ok(Value::Null) });

    assert_eq!(methods.is_locking("get_jobs"), Some(false));
    assert_eq!(methods.is_locking("set_jobs"), Some(true));
    assert_eq!(methods.is_locking("nonexistent"), None);
}

#[test]
fn shared_secret_accepts_the_exact_token_and_rejects_anything_else() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "topsecret").unwrap();

    let secret = SharedSecret::load(file.path().to_str().unwrap()).unwrap();
    assert!(secret.verify("topsecret").is_ok());
    assert!(secret.verify("topsecre").is_err());
    assert!(secret.verify("topsecrett").is_err());
}

// src/main.rs

//! Entry point for every role. Which one a process plays is picked with
//! `--role <registry|queue-manager|system-manager|scheduler>`; which config
//! file it reads with `--config <path>` (default `config.toml`).

use anyhow::{Context, Result, anyhow};
use cobalt::config::{CommonConfig, QueueManagerConfig, RegistryConfig, SchedulerConfig, SystemManagerConfig};
use cobalt::core::collaborators::{RpcBridge, RpcForker};
use cobalt::core::persistence::StateStore;
use cobalt::core::rpc_client::{ComponentClient, RegistryResolver};
use cobalt::core::state::Runtime;
use cobalt::core::types::Mode;
use cobalt::queue_manager::QueueManagerState;
use cobalt::registry::state::PersistedRegistry;
use cobalt::registry::RegistryState;
use cobalt::scheduler::SchedulerState;
use cobalt::server::{self, Registration};
use cobalt::system_manager::state::ValidationLimits;
use cobalt::system_manager::SystemManagerState;
use cobalt::{queue_manager, registry, scheduler, system_manager};
use std::env;
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{filter::EnvFilter, prelude::*, reload};

type LogReloadHandle = Arc<reload::Handle<EnvFilter, tracing_subscriber::Registry>>;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let role = arg_value(&args, "--role")
        .ok_or_else(|| anyhow!("usage: cobalt --role <registry|queue-manager|system-manager|scheduler> --config <path>"))?;
    let config_path = arg_value(&args, "--config").unwrap_or_else(|| "config.toml".to_string());

    let initial_log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let (filter, reload_handle) = reload::Layer::new(EnvFilter::new(initial_log_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact().with_ansi(true))
        .init();
    let log_reload_handle = Arc::new(reload_handle);

    let result = match role.as_str() {
        "registry" => run_registry(&config_path, log_reload_handle).await,
        "queue-manager" => run_queue_manager(&config_path, log_reload_handle).await,
        "system-manager" => run_system_manager(&config_path, log_reload_handle).await,
        "scheduler" => run_scheduler(&config_path, log_reload_handle).await,
        other => Err(anyhow!("unknown role '{other}'")),
    };

    if let Err(e) = &result {
        error!(error = %e, "role exited with an error");
    }
    result
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag).and_then(|i| args.get(i + 1)).cloned()
}

/// The URL peers should use to reach this role. `0.0.0.0` is a bind address,
/// not a reachable one, so advertise loopback in that case.
fn own_endpoint(host: &str, port: u16) -> String {
    let advertise_host = if host == "0.0.0.0" { "127.0.0.1" } else { host };
    format!("http://{advertise_host}:{port}/")
}

fn auth_token(common: &CommonConfig) -> Option<String> {
    common.key_file.as_ref().and_then(|path| fs::read_to_string(path).ok()).map(|s| s.trim().to_string())
}

/// Builds a client for calling `component`, resolved through this role's
/// Registry and authenticated with the shared secret if one is configured.
fn peer_client(component: &str, common: &CommonConfig) -> Arc<ComponentClient> {
    let resolver = Arc::new(RegistryResolver::new(common.registry_endpoint.clone(), Duration::from_secs(common.rpc_timeout_secs)));
    Arc::new(ComponentClient::new(component.to_string(), resolver, Duration::from_secs(common.rpc_timeout_secs), auth_token(common)))
}

async fn run_registry(config_path: &str, log_reload_handle: LogReloadHandle) -> Result<()> {
    let config = RegistryConfig::from_file(config_path).with_context(|| format!("loading {config_path}"))?;
    let store = StateStore::new(&config.common.spool_dir, "registry");
    let state = match store.load::<PersistedRegistry>().await? {
        Some(persisted) => RegistryState::from(persisted),
        None => RegistryState::new(),
    };

    let mut runtime = Runtime::new(state, store.clone(), log_reload_handle);
    registry::build_runtime(&mut runtime, Duration::from_secs(config.liveness_timeout_secs)).await;

    // The Registry doesn't serialize cleanly as-is (its entries carry an
    // `Instant`), so it persists through `PersistedRegistry` rather than the
    // generic `persist_state` task the other roles register themselves.
    let persist_state = runtime.state.clone();
    runtime
        .tasks
        .register("persist_state", Duration::from_secs(30), move || {
            let state = persist_state.clone();
            let store = store.clone();
            async move {
                let persisted = PersistedRegistry::from(&*state.lock().await);
                store.save(&persisted).await
            }
        })
        .await;

    info!("registry ready");
    server::run(runtime, &config.common, None).await
}

async fn run_queue_manager(config_path: &str, log_reload_handle: LogReloadHandle) -> Result<()> {
    let config = QueueManagerConfig::from_file(config_path).with_context(|| format!("loading {config_path}"))?;
    let (state, store) = server::initialization::load_state::<QueueManagerState>(&config.common, &config.state_file).await?;
    let state = state.unwrap_or_else(QueueManagerState::new);

    let mut runtime = Runtime::new(state, store, log_reload_handle);
    let system_manager = peer_client("system-manager", &config.common);
    queue_manager::build_runtime(&mut runtime, system_manager).await;

    info!("queue manager ready");
    let registration = Registration {
        registry: peer_client("registry", &config.common),
        component_name: "queue-manager",
        own_endpoint: own_endpoint(&config.common.host, config.common.port),
    };
    server::run(runtime, &config.common, Some(registration)).await
}

async fn run_system_manager(config_path: &str, log_reload_handle: LogReloadHandle) -> Result<()> {
    let config = SystemManagerConfig::from_file(config_path).with_context(|| format!("loading {config_path}"))?;
    let limits = ValidationLimits {
        max_nodecount: config.max_nodecount,
        known_kernels: config.known_kernels.clone(),
        custom_kernels_enabled: config.custom_kernels_enabled,
    };
    let (state, store) = server::initialization::load_state::<SystemManagerState>(&config.common, &config.state_file).await?;
    let state = state.unwrap_or_else(|| SystemManagerState::new(limits));

    let mut runtime = Runtime::new(state, store, log_reload_handle);

    let bridge = Arc::new(RpcBridge::new(ComponentClient::new(
        "bridge".to_string(),
        Arc::new(RegistryResolver::new(config.common.registry_endpoint.clone(), Duration::from_secs(config.common.rpc_timeout_secs))),
        Duration::from_secs(config.common.rpc_timeout_secs),
        auth_token(&config.common),
    )));
    let mpirun_forker = Arc::new(RpcForker::new(ComponentClient::new(
        RpcForker::component_name_for_mode(Mode::Co).to_string(),
        Arc::new(RegistryResolver::new(config.common.registry_endpoint.clone(), Duration::from_secs(config.common.rpc_timeout_secs))),
        Duration::from_secs(config.common.rpc_timeout_secs),
        auth_token(&config.common),
    )));
    let script_forker = Arc::new(RpcForker::new(ComponentClient::new(
        RpcForker::component_name_for_mode(Mode::Script).to_string(),
        Arc::new(RegistryResolver::new(config.common.registry_endpoint.clone(), Duration::from_secs(config.common.rpc_timeout_secs))),
        Duration::from_secs(config.common.rpc_timeout_secs),
        auth_token(&config.common),
    )));

    system_manager::build_runtime(&mut runtime, bridge, mpirun_forker, script_forker).await;

    info!("system manager ready");
    let registration = Registration {
        registry: peer_client("registry", &config.common),
        component_name: "system-manager",
        own_endpoint: own_endpoint(&config.common.host, config.common.port),
    };
    server::run(runtime, &config.common, Some(registration)).await
}

async fn run_scheduler(config_path: &str, log_reload_handle: LogReloadHandle) -> Result<()> {
    let config = SchedulerConfig::from_file(config_path).with_context(|| format!("loading {config_path}"))?;
    let (state, store) = server::initialization::load_state::<SchedulerState>(&config.common, &config.state_file).await?;
    let state = state.unwrap_or_else(SchedulerState::new);

    let mut runtime = Runtime::new(state, store, log_reload_handle);
    let queue_manager = peer_client("queue-manager", &config.common);
    let system_manager = peer_client("system-manager", &config.common);
    scheduler::build_runtime(&mut runtime, queue_manager, system_manager, &config).await;

    info!("scheduler ready");
    let registration = Registration {
        registry: peer_client("registry", &config.common),
        component_name: "scheduler",
        own_endpoint: own_endpoint(&config.common.host, config.common.port),
    };
    server::run(runtime, &config.common, Some(registration)).await
}

// src/config.rs

//! Manages role configuration: loading from TOML, resolving defaults, and
//! validation, following a `RawConfig` -> `Config` resolution shape.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::warn;

/// Settings shared by every role: where to listen, how to log, where to park
/// state on disk, how to reach the Registry, and the shared secret used to
/// authenticate RPC calls under a trusted-network assumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommonConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub spool_dir: String,
    pub registry_endpoint: String,
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_file: Option<String>,
    #[serde(default)]
    pub tls: TlsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

fn default_rpc_timeout_secs() -> u64 {
    30
}

/// Configuration for TLS on the role's RPC listener, same shape as the
/// teacher's `TlsConfig`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct TlsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_cert_path")]
    pub cert_path: String,
    #[serde(default = "default_key_path")]
    pub key_path: String,
}

fn default_cert_path() -> String {
    "cobalt.crt".to_string()
}
fn default_key_path() -> String {
    "cobalt.key".to_string()
}

/// Configuration for the Prometheus metrics exporter, same shape as the
/// teacher's `MetricsConfig`.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_metrics_port() -> u16 {
    8878
}

#[derive(Deserialize)]
struct RawCommonConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_spool_dir")]
    spool_dir: String,
    registry_endpoint: String,
    #[serde(default = "default_rpc_timeout_secs")]
    rpc_timeout_secs: u64,
    #[serde(default)]
    key_file: Option<String>,
    #[serde(default)]
    tls: TlsConfig,
    #[serde(default)]
    metrics: MetricsConfig,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    0
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_spool_dir() -> String {
    "/var/spool/cobalt".to_string()
}

impl RawCommonConfig {
    fn resolve(self) -> CommonConfig {
        CommonConfig {
            host: self.host,
            port: self.port,
            log_level: self.log_level,
            spool_dir: self.spool_dir,
            registry_endpoint: self.registry_endpoint,
            rpc_timeout_secs: self.rpc_timeout_secs,
            key_file: self.key_file,
            tls: self.tls,
            metrics: self.metrics,
        }
    }
}

impl CommonConfig {
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port cannot be 0"));
        }
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.registry_endpoint.trim().is_empty() {
            return Err(anyhow!("registry_endpoint cannot be empty"));
        }
        if self.tls.enabled {
            if self.tls.cert_path.trim().is_empty() {
                return Err(anyhow!("tls.cert_path cannot be empty when TLS is enabled"));
            }
            if self.tls.key_path.trim().is_empty() {
                return Err(anyhow!("tls.key_path cannot be empty when TLS is enabled"));
            }
        }
        if self.metrics.enabled {
            if self.metrics.port == 0 {
                return Err(anyhow!("metrics.port cannot be 0"));
            }
            if self.metrics.port == self.port {
                return Err(anyhow!(
                    "metrics.port cannot be the same as the RPC listener port"
                ));
            }
        }
        if self.key_file.is_none() {
            warn!("no key_file configured; RPC calls will not be authenticated");
        }
        Ok(())
    }
}

/// The Registry is the degenerate case: it has no role-specific settings
/// beyond the shared ones, since its job is purely to hold name -> endpoint
/// mappings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    /// Endpoints that haven't re-registered within this many seconds are
    /// treated as dead (resolved Open Question, see DESIGN.md).
    #[serde(default = "default_liveness_timeout_secs")]
    pub liveness_timeout_secs: u64,
}

fn default_liveness_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueManagerConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    #[serde(default = "default_state_file")]
    pub state_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemManagerConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    #[serde(default = "default_state_file")]
    pub state_file: String,
    /// Whether diagnostics must pass before a partition returns to service.
    #[serde(default)]
    pub diagnostics_required: bool,
    /// Largest `nodecount` `validate_job` will accept.
    #[serde(default = "default_max_nodecount")]
    pub max_nodecount: u32,
    /// Non-empty iff custom kernels are restricted to a known set.
    #[serde(default)]
    pub known_kernels: Vec<String>,
    #[serde(default)]
    pub custom_kernels_enabled: bool,
}

fn default_max_nodecount() -> u32 {
    4096
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    #[serde(default = "default_state_file")]
    pub state_file: String,
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,
    /// Use `walltime_p` instead of `walltime` for backfill eligibility.
    /// Off by default.
    #[serde(default)]
    pub walltime_prediction: bool,
    /// Placement policy used when a queue names none explicitly.
    #[serde(default = "default_policy")]
    pub default_policy: String,
    /// Longest drain window (hours) a backfill placement may impose on a
    /// partition before it's rejected.
    #[serde(default = "default_max_drain_hours")]
    pub max_drain_hours: u32,
}

fn default_max_drain_hours() -> u32 {
    24
}

fn default_state_file() -> String {
    "state.json".to_string()
}
fn default_tick_interval_secs() -> u64 {
    10
}
fn default_policy() -> String {
    "default".to_string()
}

macro_rules! impl_from_file {
    ($config:ty, $raw:ty) => {
        impl $config {
            /// Reads and parses a TOML config file, resolving defaults and
            /// validating the result.
            pub fn from_file(path: &str) -> Result<Self> {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config file at '{path}'"))?;
                let raw: $raw = toml::from_str(&contents)
                    .with_context(|| format!("failed to parse TOML from '{path}'"))?;
                let resolved = raw.resolve();
                resolved.common.validate()?;
                Ok(resolved)
            }
        }
    };
}

#[derive(Deserialize)]
struct RawRegistryConfig {
    #[serde(flatten)]
    common: RawCommonConfig,
    #[serde(default = "default_liveness_timeout_secs")]
    liveness_timeout_secs: u64,
}

impl RawRegistryConfig {
    fn resolve(self) -> RegistryConfig {
        RegistryConfig {
            common: self.common.resolve(),
            liveness_timeout_secs: self.liveness_timeout_secs,
        }
    }
}

#[derive(Deserialize)]
struct RawQueueManagerConfig {
    #[serde(flatten)]
    common: RawCommonConfig,
    #[serde(default = "default_state_file")]
    state_file: String,
}

impl RawQueueManagerConfig {
    fn resolve(self) -> QueueManagerConfig {
        QueueManagerConfig {
            common: self.common.resolve(),
            state_file: self.state_file,
        }
    }
}

#[derive(Deserialize)]
struct RawSystemManagerConfig {
    #[serde(flatten)]
    common: RawCommonConfig,
    #[serde(default = "default_state_file")]
    state_file: String,
    #[serde(default)]
    diagnostics_required: bool,
    #[serde(default = "default_max_nodecount")]
    max_nodecount: u32,
    #[serde(default)]
    known_kernels: Vec<String>,
    #[serde(default)]
    custom_kernels_enabled: bool,
}

impl RawSystemManagerConfig {
    fn resolve(self) -> SystemManagerConfig {
        SystemManagerConfig {
            common: self.common.resolve(),
            state_file: self.state_file,
            diagnostics_required: self.diagnostics_required,
            max_nodecount: self.max_nodecount,
            known_kernels: self.known_kernels,
            custom_kernels_enabled: self.custom_kernels_enabled,
        }
    }
}

#[derive(Deserialize)]
struct RawSchedulerConfig {
    #[serde(flatten)]
    common: RawCommonConfig,
    #[serde(default = "default_state_file")]
    state_file: String,
    #[serde(default = "default_tick_interval_secs")]
    tick_interval_secs: u64,
    #[serde(default)]
    walltime_prediction: bool,
    #[serde(default = "default_policy")]
    default_policy: String,
    #[serde(default = "default_max_drain_hours")]
    max_drain_hours: u32,
}

impl RawSchedulerConfig {
    fn resolve(self) -> SchedulerConfig {
        SchedulerConfig {
            common: self.common.resolve(),
            state_file: self.state_file,
            tick_interval_secs: self.tick_interval_secs,
            walltime_prediction: self.walltime_prediction,
            default_policy: self.default_policy,
            max_drain_hours: self.max_drain_hours,
        }
    }
}

impl_from_file!(RegistryConfig, RawRegistryConfig);
impl_from_file!(QueueManagerConfig, RawQueueManagerConfig);
impl_from_file!(SystemManagerConfig, RawSystemManagerConfig);
impl_from_file!(SchedulerConfig, RawSchedulerConfig);

// src/queue_manager/filters.rs

//! Submission filters: an ordered list of external commands, each receiving
//! the job spec as `key=value` argv and emitting
//! `key=value` lines on stdout to be merged back into the spec. A non-zero
//! exit from any filter rejects the submission.

use crate::core::errors::CobaltError;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::process::Command;

pub struct FilterChain {
    commands: Vec<String>,
}

impl FilterChain {
    pub fn new(commands: Vec<String>) -> Self {
        Self { commands }
    }

    /// Runs every configured filter in order over `spec`, merging each
    /// filter's stdout back in before the next one runs. Fails the whole
    /// submission on the first non-zero exit.
    pub async fn apply(&self, mut spec: BTreeMap<String, Value>) -> Result<BTreeMap<String, Value>, CobaltError> {
        for command in &self.commands {
            let args: Vec<String> = spec
                .iter()
                .map(|(k, v)| format!("{k}={}", value_to_arg(v)))
                .collect();

            let output = Command::new(command)
                .args(&args)
                .output()
                .await
                .map_err(|e| CobaltError::validation(format!("filter '{command}' failed to start: {e}")))?;

            if !output.status.success() {
                return Err(CobaltError::validation(format!(
                    "filter '{command}' rejected submission (exit {:?})",
                    output.status.code()
                )));
            }

            for line in String::from_utf8_lossy(&output.stdout).lines() {
                if let Some((key, value)) = line.split_once('=') {
                    spec.insert(key.to_string(), Value::String(value.to_string()));
                }
            }
        }
        Ok(spec)
    }
}

fn value_to_arg(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

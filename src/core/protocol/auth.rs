// src/core/protocol/auth.rs

//! Shared-secret request authentication over HTTP basic auth. Loaded
//! once from the role's `key_file` and compared in constant time against the
//! caller-supplied bearer token.

use crate::core::errors::CobaltError;
use std::fs;

#[derive(Debug, Clone)]
pub struct SharedSecret(Vec<u8>);

impl SharedSecret {
    pub fn load(key_file: &str) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(key_file)?;
        Ok(SharedSecret(contents.trim().as_bytes().to_vec()))
    }

    pub fn verify(&self, presented: &str) -> Result<(), CobaltError> {
        let presented = presented.trim().as_bytes();
        if constant_time_eq(presented, &self.0) {
            Ok(())
        } else {
            Err(CobaltError::AuthRequired)
        }
    }
}

/// Compares two byte slices without early-exiting on the first mismatch, so
/// the comparison time doesn't leak how much of the secret was guessed
/// correctly.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

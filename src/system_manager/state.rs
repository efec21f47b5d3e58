// src/system_manager/state.rs

//! System Manager owned state: partition/node-card/switch inventory and the
//! process-group table.

use crate::core::errors::CobaltError;
use crate::core::spec::{Matchable, Spec};
use crate::core::types::{NodeCard, Partition, ProcessGroup, Switch};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Validation limits used by `validate_job`.
/// Kept alongside the owned inventory rather than re-read from config on
/// every call, since it only changes at process start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationLimits {
    pub max_nodecount: u32,
    pub known_kernels: Vec<String>,
    pub custom_kernels_enabled: bool,
}

#[derive(Serialize, Deserialize)]
pub struct SystemManagerState {
    pub partitions: IndexMap<String, Partition>,
    pub node_cards: IndexMap<String, NodeCard>,
    pub switches: IndexMap<String, Switch>,
    pub process_groups: IndexMap<i64, ProcessGroup>,
    next_pg_id: i64,
    pub limits: ValidationLimits,
}

impl SystemManagerState {
    pub fn new(limits: ValidationLimits) -> Self {
        Self {
            partitions: IndexMap::new(),
            node_cards: IndexMap::new(),
            switches: IndexMap::new(),
            process_groups: IndexMap::new(),
            next_pg_id: 1,
            limits,
        }
    }

    pub fn next_pg_id(&mut self) -> i64 {
        let id = self.next_pg_id;
        self.next_pg_id += 1;
        id
    }

    pub fn query_partitions(&self, specs: &[Spec]) -> Vec<&Partition> {
        self.partitions.values().filter(|p| specs.iter().any(|s| p.matches(s))).collect()
    }

    pub fn add_partition(&mut self, partition: Partition) -> Result<(), CobaltError> {
        if self.partitions.contains_key(&partition.name) {
            return Err(CobaltError::conflict(format!("partition '{}' already exists", partition.name)));
        }
        self.partitions.insert(partition.name.clone(), partition);
        super::topology::update_relatives(&mut self.partitions);
        Ok(())
    }

    pub fn del_partitions(&mut self, specs: &[Spec]) -> Vec<String> {
        let matching: Vec<String> =
            self.partitions.values().filter(|p| specs.iter().any(|s| p.matches(s))).map(|p| p.name.clone()).collect();
        for name in &matching {
            self.partitions.shift_remove(name);
        }
        if !matching.is_empty() {
            super::topology::update_relatives(&mut self.partitions);
        }
        matching
    }

    pub fn set_partitions(&mut self, specs: &[Spec], update: &Spec) -> Vec<String> {
        let matching: Vec<String> =
            self.partitions.values().filter(|p| specs.iter().any(|s| p.matches(s))).map(|p| p.name.clone()).collect();
        for name in &matching {
            if let Some(p) = self.partitions.get_mut(name) {
                p.apply_update(update);
            }
        }
        matching
    }

    /// `reserve_resources_until`, the single authority over partition
    /// occupancy.
    pub fn reserve_resources_until(
        &mut self,
        location: &str,
        new_time: Option<i64>,
        jobid: i64,
    ) -> Result<(), CobaltError> {
        let p = self
            .partitions
            .get_mut(location)
            .ok_or_else(|| CobaltError::validation(format!("unknown partition '{location}'")))?;

        match new_time {
            None => {
                if p.used_by != Some(jobid) {
                    return Err(CobaltError::conflict(format!(
                        "partition '{location}' is not held by job {jobid}"
                    )));
                }
                // `used_by` stays set until cleanup completes, so the
                // cleanup pass can still find the holder.
                p.reserved_by = None;
                p.reserved_until = None;
                Ok(())
            }
            Some(until) => {
                match p.used_by {
                    None => {
                        p.used_by = Some(jobid);
                        p.reserved_by = Some(jobid);
                        p.reserved_until = Some(until);
                        if p.state.is_idle() {
                            p.state = crate::core::types::PartitionState::Allocated;
                        }
                        Ok(())
                    }
                    Some(owner) if owner == jobid => {
                        p.reserved_until = Some(p.reserved_until.map_or(until, |cur| cur.max(until)));
                        Ok(())
                    }
                    Some(_) => Err(CobaltError::conflict(format!(
                        "partition '{location}' is already held by another job"
                    ))),
                }
            }
        }
    }

    /// Validates a submission's nodecount, walltime, mode/proccount ratio,
    /// and kernel against this role's configured limits.
    pub fn validate_job(
        &self,
        nodecount: u32,
        walltime: u32,
        mode: crate::core::types::Mode,
        proccount: u32,
        kernel: Option<&str>,
    ) -> Result<(), CobaltError> {
        use crate::core::types::Mode;

        if nodecount == 0 || nodecount > self.limits.max_nodecount {
            return Err(CobaltError::validation(format!(
                "nodecount {nodecount} out of range (max {})",
                self.limits.max_nodecount
            )));
        }
        if walltime < 5 {
            return Err(CobaltError::validation("walltime must be at least 5 minutes"));
        }
        let max_multiplier = match mode {
            Mode::Co => 1,
            Mode::Dual => 2,
            Mode::Vn => 4,
            Mode::Smp => 1,
            Mode::Script => 1,
        };
        if proccount > nodecount * max_multiplier {
            return Err(CobaltError::validation(format!(
                "proccount {proccount} exceeds {max_multiplier}x nodecount for mode {mode:?}"
            )));
        }
        if self.limits.custom_kernels_enabled {
            if let Some(k) = kernel {
                if !self.limits.known_kernels.is_empty() && !self.limits.known_kernels.iter().any(|kk| kk == k) {
                    return Err(CobaltError::validation(format!("unknown kernel '{k}'")));
                }
            }
        }
        Ok(())
    }
}

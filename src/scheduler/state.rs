// src/scheduler/state.rs

//! Scheduler owned state: reservations, plus read-only foreign-data mirrors
//! of jobs, queues, and partitions.

use crate::core::errors::CobaltError;
use crate::core::spec::{Matchable, Spec};
use crate::core::types::{Job, Partition, Queue, Reservation};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::foreign_data::ForeignDataDict;

#[derive(Default, Serialize, Deserialize)]
pub struct SchedulerState {
    pub reservations: IndexMap<String, Reservation>,

    #[serde(skip)]
    pub jobs: ForeignDataDict<i64, Job>,
    #[serde(skip)]
    pub queues: ForeignDataDict<String, Queue>,
    #[serde(skip)]
    pub partitions: ForeignDataDict<String, Partition>,
}

impl SchedulerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query_reservations(&self, specs: &[Spec]) -> Vec<&Reservation> {
        self.reservations.values().filter(|r| specs.iter().any(|s| r.matches(s))).collect()
    }

    pub fn add_reservation(&mut self, reservation: Reservation) -> Result<(), CobaltError> {
        if self.reservations.contains_key(&reservation.name) {
            return Err(CobaltError::conflict(format!("reservation '{}' already exists", reservation.name)));
        }
        self.reservations.insert(reservation.name.clone(), reservation);
        Ok(())
    }

    pub fn del_reservations(&mut self, specs: &[Spec]) -> Vec<String> {
        let matching: Vec<String> = self
            .reservations
            .values()
            .filter(|r| specs.iter().any(|s| r.matches(s)))
            .map(|r| r.name.clone())
            .collect();
        for name in &matching {
            self.reservations.shift_remove(name);
        }
        matching
    }

    pub fn set_reservation(&mut self, specs: &[Spec], update: &Spec) -> Vec<String> {
        let matching: Vec<String> = self
            .reservations
            .values()
            .filter(|r| specs.iter().any(|s| r.matches(s)))
            .map(|r| r.name.clone())
            .collect();
        for name in &matching {
            if let Some(r) = self.reservations.get_mut(name) {
                r.apply_update(update);
            }
        }
        matching
    }
}

// src/core/types/reservation.rs

//! Reservation entity, owned by the scheduler.

use crate::core::spec::{Matchable, Spec};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub name: String,
    /// Epoch seconds.
    pub start: i64,
    /// Seconds.
    pub duration: i64,
    /// Seconds; `0` means non-cyclic.
    #[serde(default)]
    pub cycle: i64,
    #[serde(default)]
    pub users: Vec<String>,
    /// Colon-list of named partitions this reservation covers.
    pub partitions: Vec<String>,
    #[serde(default)]
    pub res_id: Option<i64>,
    #[serde(default)]
    pub cycle_id: Option<i64>,
}

impl Reservation {
    pub fn queue_name(&self) -> String {
        crate::core::types::queue::Queue::reservation_queue_name(&self.name)
    }

    /// `duration >= cycle` makes the reservation permanently active (the
    /// active window never closes before the next one opens).
    pub fn is_always_active(&self) -> bool {
        self.cycle > 0 && self.duration >= self.cycle
    }

    /// True iff `now` falls inside any cyclic repetition of
    /// `[start, start + duration)`.
    pub fn is_active(&self, now: i64) -> bool {
        if now < self.start {
            return false;
        }
        if self.cycle <= 0 {
            return now < self.start + self.duration;
        }
        if self.is_always_active() {
            return true;
        }
        let elapsed = (now - self.start) % self.cycle;
        elapsed < self.duration
    }

    /// Does the window `[from, from + span)` intersect any cyclic
    /// repetition of this reservation's active window?
    pub fn overlaps(&self, from: i64, span: i64) -> bool {
        let until = from + span;
        if self.cycle <= 0 || self.is_always_active() {
            return until > self.start && from < self.start + self.duration;
        }
        // Walk cycle repetitions that could intersect [from, until).
        let mut cycle_start = self.start + ((from - self.start).div_euclid(self.cycle)) * self.cycle;
        if cycle_start > from {
            cycle_start -= self.cycle;
        }
        while cycle_start < until {
            let window_end = cycle_start + self.duration;
            if window_end > from && cycle_start < until {
                return true;
            }
            cycle_start += self.cycle;
        }
        false
    }
}

impl Matchable for Reservation {
    fn field(&self, field: &str) -> Option<Value> {
        match field {
            "name" => Some(Value::String(self.name.clone())),
            "start" => Some(Value::from(self.start)),
            "duration" => Some(Value::from(self.duration)),
            "cycle" => Some(Value::from(self.cycle)),
            _ => None,
        }
    }

    fn apply_update(&mut self, update: &Spec) {
        if let Some(v) = update.get("duration").and_then(Value::as_i64) {
            self.duration = v;
        }
        if let Some(v) = update.get("cycle").and_then(Value::as_i64) {
            self.cycle = v;
        }
        if let Some(Value::Array(users)) = update.get("users") {
            self.users = users
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect();
        }
        if let Some(Value::Array(partitions)) = update.get("partitions") {
            self.partitions = partitions
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect();
        }
    }
}

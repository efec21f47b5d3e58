// src/core/types/mod.rs

//! The data model: entities owned by each component, plus the
//! spec-matchable trait impls used by the universal query protocol.

pub mod job;
pub mod node_card;
pub mod partition;
pub mod process_group;
pub mod queue;
pub mod reservation;
pub mod switch;

pub use job::{Job, JobState, Mode};
pub use node_card::{NodeCard, NodeCardState};
pub use partition::{Partition, PartitionState};
pub use process_group::ProcessGroup;
pub use queue::{Queue, QueueLimits, QueueState};
pub use reservation::Reservation;
pub use switch::{Switch, SwitchState};

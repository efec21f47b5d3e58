// src/scheduler/handlers.rs

//! Reservation API, wire names preserved. Each mutation keeps the companion
//! `R.<name>` queue in the Queue Manager in sync.

use crate::core::rpc_client::ComponentClient;
use crate::core::spec::Spec;
use crate::core::state::Runtime;
use crate::core::types::{Queue, QueueState, Reservation};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use super::state::SchedulerState;

pub fn register(runtime: &mut Runtime<SchedulerState>, queue_manager: Arc<ComponentClient>) {
    let state = runtime.state.clone();
    let qm = queue_manager.clone();
    runtime.methods.register("add_reservations", true, move |params: Value| {
        let state = state.clone();
        let qm = qm.clone();
        async move {
            let (specs,): (Vec<Reservation>,) = serde_json::from_value(params)?;
            let mut created = Vec::with_capacity(specs.len());
            for reservation in specs {
                let queue = Queue {
                    name: reservation.queue_name(),
                    state: QueueState::Running,
                    policy: "default".to_string(),
                    limits: Default::default(),
                    users: reservation.users.clone(),
                    adminemail: None,
                    priority: 0,
                    cron: None,
                };
                if let Err(e) = qm.call::<_, Value>("add_queues", (vec![queue],)).await {
                    warn!(reservation = %reservation.name, error = %e, "failed to create companion queue");
                }
                created.push(reservation.name.clone());
                state.lock().await.add_reservation(reservation)?;
            }
            Ok(serde_json::to_value(created)?)
        }
    });

    let state = runtime.state.clone();
    runtime.methods.register("get_reservations", false, move |params: Value| {
        let state = state.clone();
        async move {
            let (specs,): (Vec<Spec>,) = serde_json::from_value(params)?;
            let guard = state.lock().await;
            Ok(serde_json::to_value(guard.query_reservations(&specs))?)
        }
    });

    let state = runtime.state.clone();
    let qm = queue_manager.clone();
    runtime.methods.register("del_reservations", true, move |params: Value| {
        let state = state.clone();
        let qm = qm.clone();
        async move {
            let (specs,): (Vec<Spec>,) = serde_json::from_value(params)?;
            let removed = {
                let reservations = state.lock().await.query_reservations(&specs).into_iter().cloned().collect::<Vec<_>>();
                state.lock().await.del_reservations(&specs);
                reservations
            };
            for reservation in &removed {
                let spec = Spec::new().with("name", reservation.queue_name());
                let update = Spec::new().with("state", serde_json::to_value(QueueState::Dead)?);
                if let Err(e) = qm.call::<_, Value>("set_queues", (vec![spec], update)).await {
                    warn!(reservation = %reservation.name, error = %e, "failed to retire companion queue");
                }
            }
            Ok(serde_json::to_value(removed.iter().map(|r| r.name.clone()).collect::<Vec<_>>())?)
        }
    });

    let state = runtime.state.clone();
    runtime.methods.register("set_reservation", true, move |params: Value| {
        let state = state.clone();
        let qm = queue_manager.clone();
        async move {
            let (specs, update): (Vec<Spec>, Spec) = serde_json::from_value(params)?;
            let matched = state.lock().await.set_reservation(&specs, &update);
            if let Some(users) = update.get("users") {
                for name in &matched {
                    if let Some(r) = state.lock().await.reservations.get(name) {
                        let qspec = Spec::new().with("name", r.queue_name());
                        let qupdate = Spec::new().with("users", users.clone());
                        if let Err(e) = qm.call::<_, Value>("set_queues", (vec![qspec], qupdate)).await {
                            warn!(reservation = %name, error = %e, "failed to update companion queue users");
                        }
                    }
                }
            }
            Ok(serde_json::to_value(matched)?)
        }
    });
}

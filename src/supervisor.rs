//! Process-lifetime state, owned here instead of living in ambient globals.
//!
//! The flags are advisory ("is the drainer alive", "is a simulation in
//! flight") and are only read through accessors.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct Supervisor {
    drainer_running: AtomicBool,
    simulation_running: AtomicBool,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drainer_running(&self) -> bool {
        self.drainer_running.load(Ordering::SeqCst)
    }

    pub fn set_drainer_running(&self, running: bool) {
        self.drainer_running.store(running, Ordering::SeqCst);
    }

    pub fn simulation_running(&self) -> bool {
        self.simulation_running.load(Ordering::SeqCst)
    }

    /// Claim the simulation slot. Returns `None` when a simulation is already
    /// in flight; otherwise a guard that releases the slot on drop, even if
    /// the simulation task fails.
    pub fn begin_simulation(supervisor: &Arc<Supervisor>) -> Option<SimulationGuard> {
        supervisor
            .simulation_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()?;
        Some(SimulationGuard {
            supervisor: Arc::clone(supervisor),
        })
    }
}

pub struct SimulationGuard {
    supervisor: Arc<Supervisor>,
}

impl Drop for SimulationGuard {
    fn drop(&mut self) {
        self.supervisor
            .simulation_running
            .store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulation_slot_is_exclusive() {
        let sup = Arc::new(Supervisor::new());
        let guard = Supervisor::begin_simulation(&sup).expect("first claim succeeds");
        assert!(sup.simulation_running());
        assert!(Supervisor::begin_simulation(&sup).is_none());

        drop(guard);
        assert!(!sup.simulation_running());
        assert!(Supervisor::begin_simulation(&sup).is_some());
    }
}

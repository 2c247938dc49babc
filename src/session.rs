use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;

use tracing::{info, warn};

use crate::agent::AutonomousPlayer;
use crate::callout::CalloutWatchdog;
use crate::gate::PauseGate;
use crate::game::TurnCoordinator;

/// Join handle of a named background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn new(name: &'static str, handle: JoinHandle<()>) -> Self {
        Self { name, handle }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the worker to exit. Returns `false` if it panicked.
    pub fn join(self) -> bool {
        let ok = self.handle.join().is_ok();
        if !ok {
            warn!(worker = self.name, "worker panicked");
        }
        ok
    }
}

/// A running game: the coordinator plus its machine player and callout
/// watchdog, all sharing one gate.
pub struct GameSession {
    coordinator: Arc<TurnCoordinator>,
    gate: Arc<PauseGate>,
    workers: Vec<WorkerHandle>,
}

impl GameSession {
    pub fn start(coordinator: Arc<TurnCoordinator>) -> io::Result<Self> {
        let gate = Arc::new(PauseGate::new());
        let agent = AutonomousPlayer::new(Arc::clone(&coordinator), Arc::clone(&gate)).spawn()?;
        let watchdog =
            match CalloutWatchdog::new(Arc::clone(&coordinator), Arc::clone(&gate)).spawn() {
                Ok(handle) => handle,
                Err(err) => {
                    gate.shutdown();
                    agent.join();
                    return Err(err);
                }
            };
        info!("game session started");
        Ok(Self {
            coordinator,
            gate,
            workers: vec![agent, watchdog],
        })
    }

    pub fn coordinator(&self) -> &Arc<TurnCoordinator> {
        &self.coordinator
    }

    pub fn gate(&self) -> &Arc<PauseGate> {
        &self.gate
    }

    pub fn pause(&self) {
        self.gate.pause();
    }

    pub fn resume(&self) {
        self.gate.resume();
    }

    /// Stops every worker and waits for them.
    pub fn shutdown(mut self) {
        self.stop_workers();
    }

    fn stop_workers(&mut self) {
        self.gate.shutdown();
        for worker in self.workers.drain(..) {
            worker.join();
        }
    }
}

impl Drop for GameSession {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            self.stop_workers();
        }
    }
}

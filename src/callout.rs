use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::gate::{Flow, PauseGate};
use crate::game::TurnCoordinator;
use crate::session::WorkerHandle;
use crate::state::Side;

/// Per-side bookkeeping for one "down to a single card" episode.
#[derive(Debug, Default)]
struct Episode {
    /// Set while a countdown is pending; cleared by the countdown itself once
    /// it settles, or by a poll that sees the hand grow.
    armed: Arc<AtomicBool>,
    /// Bumped whenever the episode ends so stale countdowns stand down.
    generation: Arc<AtomicU64>,
}

/// Watches both hands and settles UNO declarations.
///
/// When a side drops to one undeclared card a one-shot countdown starts. For
/// the human, an elapsed countdown costs a penalty card; for the machine it
/// means the machine announced UNO itself. Each episode fires at most once
/// and ends when its countdown settles or the hand grows past one card.
pub struct CalloutWatchdog {
    coordinator: Arc<TurnCoordinator>,
    gate: Arc<PauseGate>,
    rng: StdRng,
    human: Episode,
    machine: Episode,
    timers: Vec<JoinHandle<()>>,
}

impl CalloutWatchdog {
    pub fn new(coordinator: Arc<TurnCoordinator>, gate: Arc<PauseGate>) -> Self {
        let seed = coordinator.config().seed.rotate_left(17) ^ 0xCA11_0D06;
        Self {
            coordinator,
            gate,
            rng: StdRng::seed_from_u64(seed),
            human: Episode::default(),
            machine: Episode::default(),
            timers: Vec::new(),
        }
    }

    pub fn spawn(self) -> io::Result<WorkerHandle> {
        let handle = thread::Builder::new()
            .name(String::from("callout-watchdog"))
            .spawn(move || self.run())?;
        Ok(WorkerHandle::new("callout-watchdog", handle))
    }

    /// Polls until the gate shuts down or the game ends, then waits for any
    /// countdown still running.
    pub fn run(mut self) {
        let poll = self.coordinator.config().callout_poll;
        info!("callout watchdog started");
        loop {
            if self.gate.wait_if_paused().is_stop() || self.coordinator.is_ended() {
                break;
            }
            self.poll();
            if self.gate.sleep(poll).is_stop() {
                break;
            }
        }
        for timer in self.timers.drain(..) {
            if timer.join().is_err() {
                warn!("callout countdown panicked");
            }
        }
        info!("callout watchdog stopped");
    }

    /// One inspection of both hands. Returns the sides whose countdown was
    /// armed by this call.
    pub fn poll(&mut self) -> Vec<Side> {
        self.timers.retain(|timer| !timer.is_finished());
        let mut armed = Vec::new();
        for side in Side::BOTH {
            let (size, declared, ended) = self.coordinator.read(|state| {
                (state.hand(side).len(), state.declared(side), state.ended)
            });
            if size > 1 {
                self.coordinator.reset_declaration(side);
                let episode = self.episode(side);
                if episode.armed.swap(false, Ordering::SeqCst) {
                    episode.generation.fetch_add(1, Ordering::SeqCst);
                    debug!(%side, "callout episode closed");
                }
            } else if size == 1
                && !declared
                && !ended
                && !self.episode(side).armed.load(Ordering::SeqCst)
            {
                match self.arm(side) {
                    Ok(()) => armed.push(side),
                    Err(err) => warn!(%side, %err, "could not start callout countdown"),
                }
            }
        }
        armed
    }

    fn episode(&self, side: Side) -> &Episode {
        match side {
            Side::Human => &self.human,
            Side::Machine => &self.machine,
        }
    }

    fn window(&mut self, side: Side) -> Duration {
        let config = self.coordinator.config();
        match side {
            Side::Human => config.human_callout_window,
            Side::Machine => {
                let min = config.machine_callout_min.as_millis() as u64;
                let max = config.machine_callout_max.as_millis() as u64;
                Duration::from_millis(self.rng.gen_range(min..=max))
            }
        }
    }

    fn arm(&mut self, side: Side) -> io::Result<()> {
        let window = self.window(side);
        let episode = self.episode(side);
        let armed = Arc::clone(&episode.armed);
        let generation = Arc::clone(&episode.generation);
        let ticket = generation.load(Ordering::SeqCst);
        let coordinator = Arc::clone(&self.coordinator);
        let gate = Arc::clone(&self.gate);
        episode.armed.store(true, Ordering::SeqCst);
        let spawned = thread::Builder::new()
            .name(format!("callout-{side}"))
            .spawn(move || {
                if gate.sleep_then_wait(window) == Flow::Stop {
                    return;
                }
                if generation.load(Ordering::SeqCst) != ticket {
                    debug!(%side, "stale callout countdown");
                    return;
                }
                settle(&coordinator, side);
                if generation
                    .compare_exchange(ticket, ticket + 1, Ordering::SeqCst, Ordering::SeqCst)
                    .is_ok()
                {
                    armed.store(false, Ordering::SeqCst);
                }
            });
        let timer = match spawned {
            Ok(timer) => timer,
            Err(err) => {
                self.episode(side).armed.store(false, Ordering::SeqCst);
                return Err(err);
            }
        };
        self.timers.push(timer);
        debug!(%side, ?window, "callout countdown armed");
        Ok(())
    }
}

fn settle(coordinator: &TurnCoordinator, side: Side) {
    let result = match side {
        Side::Human => coordinator.apply_callout_penalty(side),
        Side::Machine => coordinator.self_declare(side),
    };
    match result {
        Ok(true) => debug!(%side, "callout countdown settled"),
        Ok(false) => debug!(%side, "callout no longer applies"),
        Err(err) => warn!(%side, %err, "callout countdown failed"),
    }
}

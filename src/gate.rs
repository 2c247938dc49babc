use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::debug;

/// What a worker should do after waiting on the gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

impl Flow {
    pub fn is_stop(self) -> bool {
        matches!(self, Flow::Stop)
    }
}

#[derive(Debug)]
struct GateState {
    paused: bool,
    running: bool,
}

/// Suspend/resume switch shared by every background worker of one game,
/// doubling as its cancellation token.
///
/// A single pause freezes all workers at their next checkpoint; it does not
/// guard individual resources.
#[derive(Debug)]
pub struct PauseGate {
    state: Mutex<GateState>,
    changed: Condvar,
}

impl Default for PauseGate {
    fn default() -> Self {
        Self::new()
    }
}

impl PauseGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState {
                paused: false,
                running: true,
            }),
            changed: Condvar::new(),
        }
    }

    pub fn pause(&self) {
        self.state.lock().paused = true;
        debug!("game paused");
    }

    pub fn resume(&self) {
        let mut state = self.state.lock();
        state.paused = false;
        self.changed.notify_all();
        debug!("game resumed");
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    /// Stops every worker holding this gate. Blocked waiters and sleepers
    /// wake immediately.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        state.running = false;
        self.changed.notify_all();
        debug!("gate shut down");
    }

    /// Blocks while the gate is paused. Returns `Flow::Stop` once the gate
    /// has been shut down, even if it is still paused.
    pub fn wait_if_paused(&self) -> Flow {
        let mut state = self.state.lock();
        while state.paused && state.running {
            self.changed.wait(&mut state);
        }
        if state.running { Flow::Continue } else { Flow::Stop }
    }

    /// Sleeps for `duration` unless shut down first. Pauses do not cut the
    /// sleep short; callers follow up with `wait_if_paused`.
    pub fn sleep(&self, duration: Duration) -> Flow {
        let deadline = Instant::now() + duration;
        let mut state = self.state.lock();
        while state.running {
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        if state.running { Flow::Continue } else { Flow::Stop }
    }

    /// `sleep` followed by `wait_if_paused`.
    pub fn sleep_then_wait(&self, duration: Duration) -> Flow {
        match self.sleep(duration) {
            Flow::Stop => Flow::Stop,
            Flow::Continue => self.wait_if_paused(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;

    use super::*;

    #[test]
    fn waiter_blocks_until_resume() {
        let gate = Arc::new(PauseGate::new());
        gate.pause();
        let released = Arc::new(AtomicBool::new(false));
        let handle = {
            let gate = Arc::clone(&gate);
            let released = Arc::clone(&released);
            thread::spawn(move || {
                let flow = gate.wait_if_paused();
                released.store(true, Ordering::SeqCst);
                flow
            })
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!released.load(Ordering::SeqCst));
        gate.resume();
        assert_eq!(handle.join().unwrap(), Flow::Continue);
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    fn shutdown_releases_paused_waiters_and_sleepers() {
        let gate = Arc::new(PauseGate::new());
        gate.pause();
        let waiter = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || gate.wait_if_paused())
        };
        let sleeper = {
            let gate = Arc::clone(&gate);
            thread::spawn(move || {
                let started = Instant::now();
                (gate.sleep(Duration::from_secs(30)), started.elapsed())
            })
        };
        thread::sleep(Duration::from_millis(30));
        gate.shutdown();
        assert_eq!(waiter.join().unwrap(), Flow::Stop);
        let (flow, elapsed) = sleeper.join().unwrap();
        assert_eq!(flow, Flow::Stop);
        assert!(elapsed < Duration::from_secs(5));
    }

    #[test]
    fn sleep_runs_full_duration_while_running() {
        let gate = PauseGate::new();
        let started = Instant::now();
        assert_eq!(gate.sleep(Duration::from_millis(40)), Flow::Continue);
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn concurrent_toggling_never_strands_a_waiter() {
        let gate = Arc::new(PauseGate::new());
        let passes = Arc::new(AtomicUsize::new(0));
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let gate = Arc::clone(&gate);
                let passes = Arc::clone(&passes);
                thread::spawn(move || {
                    for _ in 0..200 {
                        if gate.wait_if_paused().is_stop() {
                            return;
                        }
                        passes.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for _ in 0..200 {
            gate.pause();
            thread::yield_now();
            gate.resume();
        }
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(passes.load(Ordering::SeqCst), 800);
    }
}

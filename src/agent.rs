use std::io;
use std::sync::Arc;
use std::thread;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::card::Card;
use crate::error::GameError;
use crate::gate::{Flow, PauseGate};
use crate::game::TurnCoordinator;
use crate::interface::{ColorChooser, RandomColorChooser};
use crate::rules::can_follow;
use crate::session::WorkerHandle;
use crate::state::Side;

/// What the machine did in one step of its turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgentAction {
    /// Played a card that was already in hand.
    Played(Card),
    /// Had nothing playable, drew this card and played it.
    DrewAndPlayed(Card),
    /// Had nothing playable, drew this card and passed.
    DrewAndPassed(Card),
    /// Nothing playable and nothing left to draw.
    Passed,
}

/// Background player for the machine side.
///
/// Plays the first legal card in hand order; otherwise draws one card, plays
/// it when legal and passes when not. Cards that keep the turn simply make
/// the next loop iteration act again.
pub struct AutonomousPlayer {
    coordinator: Arc<TurnCoordinator>,
    gate: Arc<PauseGate>,
    chooser: Box<dyn ColorChooser + Send>,
    side: Side,
}

impl AutonomousPlayer {
    pub fn new(coordinator: Arc<TurnCoordinator>, gate: Arc<PauseGate>) -> Self {
        let seed = coordinator.config().seed ^ 0x9E37_79B9_7F4A_7C15;
        Self::with_chooser(
            coordinator,
            gate,
            Box::new(RandomColorChooser::new(StdRng::seed_from_u64(seed))),
        )
    }

    pub fn with_chooser(
        coordinator: Arc<TurnCoordinator>,
        gate: Arc<PauseGate>,
        chooser: Box<dyn ColorChooser + Send>,
    ) -> Self {
        Self {
            coordinator,
            gate,
            chooser,
            side: Side::Machine,
        }
    }

    pub fn spawn(self) -> io::Result<WorkerHandle> {
        let handle = thread::Builder::new()
            .name(String::from("machine-player"))
            .spawn(move || self.run())?;
        Ok(WorkerHandle::new("machine-player", handle))
    }

    /// Loops until the gate shuts down or the game ends.
    pub fn run(mut self) {
        let config = self.coordinator.config().clone();
        info!("machine player started");
        loop {
            if self.gate.wait_if_paused().is_stop() || self.coordinator.is_ended() {
                break;
            }
            if self.coordinator.turn_owner() != self.side {
                if self.gate.sleep(config.idle_poll).is_stop() {
                    break;
                }
                continue;
            }
            if self.gate.sleep_then_wait(config.thinking_delay) == Flow::Stop {
                break;
            }
            match self.act() {
                Ok(action) => debug!(?action, "machine acted"),
                Err(err) if err.is_rejection() => debug!(%err, "machine step skipped"),
                Err(err) => warn!(%err, "machine step failed"),
            }
        }
        info!("machine player stopped");
    }

    /// Performs a single action for the machine. Fails with a rejection when
    /// it is not the machine's turn.
    pub fn act(&mut self) -> Result<AgentAction, GameError> {
        if let Some(card) = self.coordinator.playable_cards(self.side).first() {
            let outcome = self
                .coordinator
                .submit_move(self.side, card, self.chooser.as_mut())?;
            return Ok(AgentAction::Played(outcome.card));
        }
        let drawn = match self.coordinator.draw_card(self.side) {
            Ok(card) => card,
            Err(GameError::EmptyDeck { .. }) => {
                self.coordinator.pass_turn(self.side)?;
                return Ok(AgentAction::Passed);
            }
            Err(err) => return Err(err),
        };
        let playable = self
            .coordinator
            .read(|state| can_follow(&drawn, state.table.top(), state.table.active_color()));
        if playable {
            let outcome = self
                .coordinator
                .submit_move(self.side, &drawn, self.chooser.as_mut())?;
            Ok(AgentAction::DrewAndPlayed(outcome.card))
        } else {
            self.coordinator.pass_turn(self.side)?;
            Ok(AgentAction::DrewAndPassed(drawn))
        }
    }
}

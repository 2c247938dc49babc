//! Seams between the engine and whatever presents it.

use parking_lot::Mutex;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::card::{Card, Color};
use crate::state::Side;

/// Picks the color a wild-family card takes when played.
///
/// Called exactly once per wild play, while the coordinator holds the game
/// lock: it may block (waiting on a prompt, say) but must not call back into
/// the coordinator.
pub trait ColorChooser {
    fn choose_color(&mut self) -> Color;
}

impl<F> ColorChooser for F
where
    F: FnMut() -> Color,
{
    fn choose_color(&mut self) -> Color {
        self()
    }
}

/// Always answers with the same color.
#[derive(Clone, Copy, Debug)]
pub struct FixedColor(pub Color);

impl ColorChooser for FixedColor {
    fn choose_color(&mut self) -> Color {
        self.0
    }
}

/// Uniformly random color, used by the machine player.
pub struct RandomColorChooser<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomColorChooser<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> ColorChooser for RandomColorChooser<R> {
    fn choose_color(&mut self) -> Color {
        Color::ALL
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(Color::FALLBACK)
    }
}

/// Why cards were added to a hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawReason {
    /// Voluntary draw by the player on turn.
    Turn,
    /// Opponent played a draw-two or wild draw four.
    Effect,
    /// Missed UNO declaration.
    Penalty,
}

/// State changes reported to the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    MoveAccepted {
        side: Side,
        card: Card,
    },
    CardsDrawn {
        side: Side,
        count: usize,
        reason: DrawReason,
    },
    DeckRefilled {
        size: usize,
    },
    TurnChanged {
        owner: Side,
    },
    UnoDeclared {
        side: Side,
    },
    PenaltyApplied {
        side: Side,
    },
    GameEnded {
        winner: Side,
    },
}

/// Fire-and-forget sink for [`GameEvent`]s. Invoked after the game lock has
/// been released, so implementations may read the coordinator.
pub trait VisualUpdateNotifier: Send + Sync {
    fn notify(&self, event: &GameEvent);
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

impl VisualUpdateNotifier for NoopNotifier {
    fn notify(&self, _event: &GameEvent) {}
}

/// Keeps every event in memory; handy for front-ends that poll and for tests.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<GameEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<GameEvent> {
        self.events.lock().clone()
    }

    /// Removes and returns everything recorded so far.
    pub fn drain(&self) -> Vec<GameEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl VisualUpdateNotifier for EventLog {
    fn notify(&self, event: &GameEvent) {
        self.events.lock().push(event.clone());
    }
}

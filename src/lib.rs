//! Two-player UNO engine: a turn coordinator shared by a human front-end, an
//! autonomous machine player and an UNO-callout watchdog.

pub mod agent;
pub mod callout;
pub mod card;
pub mod deck;
pub mod error;
pub mod game;
pub mod gate;
pub mod interface;
pub mod rules;
pub mod session;
pub mod snapshot;
pub mod state;
pub mod visualize;

pub use crate::agent::{AgentAction, AutonomousPlayer};
pub use crate::callout::CalloutWatchdog;
pub use crate::card::{Card, CardKey, Color, Rank};
pub use crate::deck::Deck;
pub use crate::error::{GameError, InvalidAction};
pub use crate::game::{GameBuilder, GameConfig, MoveOutcome, TurnCoordinator};
pub use crate::gate::{Flow, PauseGate};
pub use crate::interface::{
    ColorChooser, DrawReason, EventLog, FixedColor, GameEvent, NoopNotifier, RandomColorChooser,
    VisualUpdateNotifier,
};
pub use crate::rules::can_follow;
pub use crate::session::{GameSession, WorkerHandle};
pub use crate::state::{GameState, Hand, Side, Table, TurnPhase};
pub use crate::visualize::{VisualOptions, describe_event, render_state};

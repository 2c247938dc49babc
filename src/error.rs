use thiserror::Error;

use crate::state::Side;

/// Errors that can occur when manipulating the game state.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("not {0}'s turn")]
    NotPlayersTurn(Side),
    #[error("invalid action: {0}")]
    InvalidAction(#[from] InvalidAction),
    #[error("game is already over")]
    GameOver,
    #[error("draw pile holds {available} cards, {requested} requested")]
    EmptyDeck { requested: usize, available: usize },
    #[error("card accounting broken: {0}")]
    InvariantViolation(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl GameError {
    /// True for errors that reject a request without touching the state.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            GameError::NotPlayersTurn(_) | GameError::InvalidAction(_) | GameError::GameOver
        )
    }
}

/// Details of invalid player actions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidAction {
    #[error("card is not in the player's hand")]
    CardNotInHand,
    #[error("card cannot follow the table")]
    CannotFollow,
    #[error("player holds a playable card and cannot draw")]
    HasPlayableCard,
    #[error("player does not hold exactly one card")]
    NothingToDeclare,
    #[error("opponent is not exposed to a callout")]
    NoCalloutTarget,
}

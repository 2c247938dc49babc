#![allow(dead_code)]

use std::collections::HashSet;
use std::thread;
use std::time::{Duration, Instant};

use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, fmt};
use unoflow::card::canonical_deck;
use unoflow::{
    Card, CardKey, Color, Deck, GameConfig, GameState, Hand, Side, Table, TurnCoordinator,
};

static LOGGING: OnceCell<()> = OnceCell::new();

/// Idempotent test logging; level from `TEST_LOG`, then `RUST_LOG`, else warn.
pub fn init_logging() {
    LOGGING.get_or_init(|| {
        let filter = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new("warn"));
        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .try_init()
            .ok();
    });
}

/// Short timings so worker tests finish quickly.
pub fn fast_config() -> GameConfig {
    GameConfig {
        seed: 42,
        thinking_delay: Duration::from_millis(10),
        idle_poll: Duration::from_millis(5),
        callout_poll: Duration::from_millis(10),
        human_callout_window: Duration::from_millis(60),
        machine_callout_min: Duration::from_millis(20),
        machine_callout_max: Duration::from_millis(40),
        ..GameConfig::default()
    }
}

/// Game with the given hands and table top; every other canonical card goes
/// to the draw pile.
pub fn arrange(
    human: Vec<Card>,
    machine: Vec<Card>,
    top: Card,
    active: Color,
    turn: Side,
) -> GameState {
    let used: HashSet<CardKey> = human
        .iter()
        .chain(&machine)
        .chain(std::iter::once(&top))
        .map(Card::key)
        .collect();
    let deck: Vec<Card> = canonical_deck()
        .into_iter()
        .filter(|card| !used.contains(&card.key()))
        .collect();
    GameState {
        human: Hand::from_cards(human),
        machine: Hand::from_cards(machine),
        deck: Deck::from_cards(deck),
        table: Table::with_top(top, active),
        turn_owner: turn,
        human_declared: false,
        machine_declared: false,
        ended: false,
        winner: None,
    }
}

/// Reorders the draw pile so `first` comes out first, in order.
pub fn stack_draws(state: &mut GameState, first: &[Card]) {
    let keys: HashSet<CardKey> = first.iter().map(Card::key).collect();
    let mut cards: Vec<Card> = state
        .deck
        .cards()
        .iter()
        .copied()
        .filter(|card| !keys.contains(&card.key()))
        .collect();
    assert_eq!(cards.len() + first.len(), state.deck.len(), "cards must be in the draw pile");
    cards.extend(first.iter().rev().copied());
    state.deck = Deck::from_cards(cards);
}

pub fn coordinator(state: GameState) -> TurnCoordinator {
    init_logging();
    TurnCoordinator::from_state(state, fast_config(), None).expect("valid arranged state")
}

/// Polls `condition` until it holds or two seconds pass.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

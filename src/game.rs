use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::card::{CANONICAL_DECK_SIZE, Card, Color, HAND_SIZE};
use crate::deck::Deck;
use crate::error::{GameError, InvalidAction};
use crate::interface::{ColorChooser, DrawReason, GameEvent, NoopNotifier, VisualUpdateNotifier};
use crate::rules::{can_follow, playable_indices};
use crate::state::{GameState, Side, TurnPhase};

const DEFAULT_SEED: u64 = 0x0A0C_5EED_C011_0075;

/// Tunables for a game and its background workers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub seed: u64,
    pub hand_size: usize,
    /// Pause the machine takes before each action.
    pub thinking_delay: Duration,
    /// How often the machine checks whether it is its turn.
    pub idle_poll: Duration,
    /// How often the callout watchdog inspects both hands.
    pub callout_poll: Duration,
    /// Time the human has to declare UNO before the penalty.
    pub human_callout_window: Duration,
    /// The machine declares on itself after a random delay in this range.
    pub machine_callout_min: Duration,
    pub machine_callout_max: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            hand_size: HAND_SIZE,
            thinking_delay: Duration::from_millis(1500),
            idle_poll: Duration::from_millis(100),
            callout_poll: Duration::from_millis(500),
            human_callout_window: Duration::from_millis(3000),
            machine_callout_min: Duration::from_millis(2000),
            machine_callout_max: Duration::from_millis(4000),
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), GameError> {
        if self.hand_size == 0 {
            return Err(GameError::InvalidConfiguration("hand size must be positive"));
        }
        // Both hands plus an opening card must come out of one deck.
        if self.hand_size >= CANONICAL_DECK_SIZE / 2 {
            return Err(GameError::InvalidConfiguration(
                "hand size leaves no card to open the table",
            ));
        }
        if self.machine_callout_min > self.machine_callout_max {
            return Err(GameError::InvalidConfiguration(
                "machine callout window is inverted",
            ));
        }
        if self.idle_poll.is_zero() || self.callout_poll.is_zero() {
            return Err(GameError::InvalidConfiguration(
                "poll intervals must be positive",
            ));
        }
        Ok(())
    }
}

/// Builder that enables deterministic deck injection for tests and replays.
pub struct GameBuilder {
    config: GameConfig,
    deck: Option<Vec<Card>>,
    notifier: Option<Arc<dyn VisualUpdateNotifier>>,
}

impl Default for GameBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GameBuilder {
    pub fn new() -> Self {
        Self {
            config: GameConfig::default(),
            deck: None,
            notifier: None,
        }
    }

    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    /// Uses `deck` as the draw pile instead of a shuffled canonical set. The
    /// last card is dealt first.
    pub fn with_deck(mut self, deck: Vec<Card>) -> Self {
        self.deck = Some(deck);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn VisualUpdateNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn build(self) -> Result<TurnCoordinator, GameError> {
        let GameBuilder {
            config,
            deck,
            notifier,
        } = self;
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let deck = match deck {
            Some(cards) => Deck::from_cards(cards),
            None => Deck::shuffled(&mut rng),
        };
        let state = GameState::deal(deck, config.hand_size)?;
        info!(
            seed = config.seed,
            opening = %state.table.top().map(ToString::to_string).unwrap_or_default(),
            "new game dealt"
        );
        Ok(TurnCoordinator::assemble(state, config, rng, notifier))
    }
}

/// Result of an accepted move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    /// The card as it lies on the table, with a chosen color for wilds.
    pub card: Card,
    pub active_color: Color,
    pub next_turn: Side,
    pub winner: Option<Side>,
}

struct Inner {
    state: GameState,
    rng: StdRng,
}

/// Turn state machine and sole mutator of the [`GameState`].
///
/// Every operation holds one lock for its whole duration, so observers only
/// ever see the state before or after a complete move. Events are delivered
/// to the notifier once the lock is released.
pub struct TurnCoordinator {
    inner: Mutex<Inner>,
    phase: AtomicU8,
    config: GameConfig,
    notifier: Arc<dyn VisualUpdateNotifier>,
}

impl TurnCoordinator {
    /// Resumes a game from a previously captured state. The state is audited
    /// first; no randomness is re-derived.
    pub fn from_state(
        state: GameState,
        config: GameConfig,
        notifier: Option<Arc<dyn VisualUpdateNotifier>>,
    ) -> Result<Self, GameError> {
        config.validate()?;
        state.audit()?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self::assemble(state, config, rng, notifier))
    }

    fn assemble(
        state: GameState,
        config: GameConfig,
        rng: StdRng,
        notifier: Option<Arc<dyn VisualUpdateNotifier>>,
    ) -> Self {
        let phase = AtomicU8::new(encode_phase(state.phase()));
        Self {
            inner: Mutex::new(Inner { state, rng }),
            phase,
            config,
            notifier: notifier.unwrap_or_else(|| Arc::new(NoopNotifier)),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Current phase; readable while a move is being resolved.
    pub fn phase(&self) -> TurnPhase {
        decode_phase(self.phase.load(Ordering::Acquire))
    }

    /// Runs `f` against a consistent view of the state.
    pub fn read<T>(&self, f: impl FnOnce(&GameState) -> T) -> T {
        f(&self.inner.lock().state)
    }

    /// Copy of the full state, for persistence or rendering.
    pub fn snapshot(&self) -> GameState {
        self.read(GameState::clone)
    }

    pub fn turn_owner(&self) -> Side {
        self.read(|state| state.turn_owner)
    }

    pub fn is_ended(&self) -> bool {
        self.read(|state| state.ended)
    }

    pub fn winner(&self) -> Option<Side> {
        self.read(|state| state.winner)
    }

    pub fn hand(&self, side: Side) -> Vec<Card> {
        self.read(|state| state.hand(side).cards().to_vec())
    }

    pub fn hand_size(&self, side: Side) -> usize {
        self.read(|state| state.hand(side).len())
    }

    pub fn declared(&self, side: Side) -> bool {
        self.read(|state| state.declared(side))
    }

    pub fn top_card(&self) -> Option<Card> {
        self.read(|state| state.table.top().copied())
    }

    pub fn active_color(&self) -> Option<Color> {
        self.read(|state| state.table.active_color())
    }

    /// Cards of `side` that could be played right now, in hand order.
    pub fn playable_cards(&self, side: Side) -> Vec<Card> {
        self.read(|state| {
            let hand = state.hand(side).cards();
            playable_indices(hand, state.table.top(), state.table.active_color())
                .into_iter()
                .map(|index| hand[index])
                .collect()
        })
    }

    pub fn has_playable_card(&self, side: Side) -> bool {
        self.read(|state| has_playable(state, side))
    }

    /// Plays `card` from `side`'s hand and resolves its effect.
    ///
    /// Rejections leave the state untouched. `chooser` is consulted once for
    /// wild-family cards and ignored otherwise.
    pub fn submit_move(
        &self,
        side: Side,
        card: &Card,
        chooser: &mut dyn ColorChooser,
    ) -> Result<MoveOutcome, GameError> {
        self.mutate(|inner, events| {
            ensure_turn(&inner.state, side)?;
            let state = &inner.state;
            let index = state
                .hand(side)
                .position(card)
                .ok_or(InvalidAction::CardNotInHand)?;
            let candidate = state.hand(side).cards()[index];
            if !can_follow(&candidate, state.table.top(), state.table.active_color()) {
                debug!(%side, card = %candidate, "move rejected");
                return Err(InvalidAction::CannotFollow.into());
            }

            self.phase
                .store(encode_phase(TurnPhase::ResolvingEffect), Ordering::Release);
            // Wilds take a fresh color on every play.
            let color = match candidate.color() {
                _ if candidate.is_wild() => chooser.choose_color(),
                Some(color) => color,
                None => return Err(InvalidAction::CannotFollow.into()),
            };
            let mut played = inner.state.hand_mut(side).remove(index);
            if played.is_wild() {
                played = Card::from_parts(played.rank(), Some(color));
            }
            inner.state.table.place(played);
            inner.state.table.set_active_color(color);
            events.push(GameEvent::MoveAccepted { side, card: played });
            info!(%side, card = %played, hand_size = inner.state.hand(side).len(), "card played");

            let penalty = played.rank().draw_penalty();
            if penalty > 0 {
                draw_into(inner, side.opponent(), penalty, DrawReason::Effect, events);
            }

            let next = if played.rank().retains_turn() {
                side
            } else {
                side.opponent()
            };
            set_turn(&mut inner.state, next, events);
            if inner.state.hand(side).is_empty() {
                finish(&mut inner.state, side, events);
            }
            Ok(MoveOutcome {
                card: played,
                active_color: color,
                next_turn: inner.state.turn_owner,
                winner: inner.state.winner,
            })
        })
    }

    /// Draws one card for the player on turn without ending the turn.
    pub fn draw_card(&self, side: Side) -> Result<Card, GameError> {
        self.mutate(|inner, events| {
            ensure_turn(&inner.state, side)?;
            let drawn = draw_into(inner, side, 1, DrawReason::Turn, events);
            drawn.first().copied().ok_or(GameError::EmptyDeck {
                requested: 1,
                available: 0,
            })
        })
    }

    /// Hands the turn to the opponent.
    pub fn pass_turn(&self, side: Side) -> Result<(), GameError> {
        self.mutate(|inner, events| {
            ensure_turn(&inner.state, side)?;
            set_turn(&mut inner.state, side.opponent(), events);
            debug!(%side, "turn passed");
            Ok(())
        })
    }

    /// Draws one card and passes, refused while a playable card is held.
    /// An exhausted draw pile still passes the turn.
    pub fn draw_and_pass(&self, side: Side) -> Result<Option<Card>, GameError> {
        self.mutate(|inner, events| {
            ensure_turn(&inner.state, side)?;
            if has_playable(&inner.state, side) {
                return Err(InvalidAction::HasPlayableCard.into());
            }
            let drawn = draw_into(inner, side, 1, DrawReason::Turn, events);
            set_turn(&mut inner.state, side.opponent(), events);
            Ok(drawn.first().copied())
        })
    }

    /// Records that `side` announced its last card.
    pub fn declare_uno(&self, side: Side) -> Result<(), GameError> {
        self.mutate(|inner, events| {
            ensure_live(&inner.state)?;
            if inner.state.hand(side).len() != 1 {
                return Err(InvalidAction::NothingToDeclare.into());
            }
            if !inner.state.declared(side) {
                inner.state.set_declared(side, true);
                events.push(GameEvent::UnoDeclared { side });
                info!(%side, "uno declared");
            }
            Ok(())
        })
    }

    /// `caller` catches an opponent sitting on one undeclared card; the
    /// opponent draws a penalty card.
    pub fn call_out(&self, caller: Side) -> Result<(), GameError> {
        self.mutate(|inner, events| {
            ensure_live(&inner.state)?;
            let target = caller.opponent();
            if !exposed(&inner.state, target) {
                return Err(InvalidAction::NoCalloutTarget.into());
            }
            info!(%caller, %target, "callout");
            penalize(inner, target, events);
            Ok(())
        })
    }

    /// Penalty for a callout window that elapsed. Returns whether a card was
    /// drawn; nothing happens if `side` no longer sits on one undeclared card.
    pub fn apply_callout_penalty(&self, side: Side) -> Result<bool, GameError> {
        self.mutate(|inner, events| {
            if inner.state.ended || !exposed(&inner.state, side) {
                return Ok(false);
            }
            Ok(penalize(inner, side, events))
        })
    }

    /// The machine announcing its own last card. Returns whether the flag
    /// changed.
    pub fn self_declare(&self, side: Side) -> Result<bool, GameError> {
        self.mutate(|inner, events| {
            if inner.state.ended || !exposed(&inner.state, side) {
                return Ok(false);
            }
            inner.state.set_declared(side, true);
            events.push(GameEvent::UnoDeclared { side });
            info!(%side, "uno declared after countdown");
            Ok(true)
        })
    }

    /// Clears `side`'s declaration once it holds more than one card again.
    pub fn reset_declaration(&self, side: Side) -> bool {
        self.mutate(|inner, _| {
            let state = &mut inner.state;
            if state.hand(side).len() > 1 && state.declared(side) {
                state.set_declared(side, false);
                debug!(%side, "declaration reset");
                return Ok(true);
            }
            Ok(false)
        })
        .unwrap_or(false)
    }

    /// Winner of the game, if any. Idempotent once the game has ended.
    pub fn check_winner(&self) -> Option<Side> {
        self.mutate(|inner, events| {
            let state = &mut inner.state;
            let emptied = Side::BOTH
                .into_iter()
                .find(|side| state.hand(*side).is_empty());
            if let (false, Some(side)) = (state.ended, emptied) {
                finish(state, side, events);
            }
            Ok(state.winner)
        })
        .unwrap_or(None)
    }

    fn mutate<T>(
        &self,
        op: impl FnOnce(&mut Inner, &mut Vec<GameEvent>) -> Result<T, GameError>,
    ) -> Result<T, GameError> {
        let mut events = Vec::new();
        let result = {
            let mut inner = self.inner.lock();
            let result = op(&mut inner, &mut events);
            self.phase
                .store(encode_phase(inner.state.phase()), Ordering::Release);
            if !events.is_empty() {
                if let Err(err) = inner.state.audit() {
                    error!(%err, "game state invariant broken");
                    debug_assert!(false, "{err}");
                }
            }
            result
        };
        for event in &events {
            self.notifier.notify(event);
        }
        result
    }
}

fn ensure_live(state: &GameState) -> Result<(), GameError> {
    if state.ended {
        return Err(GameError::GameOver);
    }
    Ok(())
}

fn ensure_turn(state: &GameState, side: Side) -> Result<(), GameError> {
    ensure_live(state)?;
    if state.turn_owner != side {
        return Err(GameError::NotPlayersTurn(side));
    }
    Ok(())
}

fn has_playable(state: &GameState, side: Side) -> bool {
    state
        .hand(side)
        .cards()
        .iter()
        .any(|card| can_follow(card, state.table.top(), state.table.active_color()))
}

fn exposed(state: &GameState, side: Side) -> bool {
    state.hand(side).len() == 1 && !state.declared(side)
}

/// Returns whether a penalty card actually reached `side`'s hand.
fn penalize(inner: &mut Inner, side: Side, events: &mut Vec<GameEvent>) -> bool {
    if draw_into(inner, side, 1, DrawReason::Penalty, events).is_empty() {
        warn!(%side, "no card left for the penalty");
        return false;
    }
    events.push(GameEvent::PenaltyApplied { side });
    info!(%side, hand_size = inner.state.hand(side).len(), "penalty card drawn");
    true
}

fn set_turn(state: &mut GameState, owner: Side, events: &mut Vec<GameEvent>) {
    if state.turn_owner != owner {
        state.turn_owner = owner;
        events.push(GameEvent::TurnChanged { owner });
    }
}

fn finish(state: &mut GameState, winner: Side, events: &mut Vec<GameEvent>) {
    if state.ended {
        return;
    }
    state.ended = true;
    state.winner = Some(winner);
    events.push(GameEvent::GameEnded { winner });
    info!(%winner, "game over");
}

/// Moves up to `count` cards from the draw pile into `side`'s hand,
/// rebuilding the pile from cards out of play when it runs short.
fn draw_into(
    inner: &mut Inner,
    side: Side,
    count: usize,
    reason: DrawReason,
    events: &mut Vec<GameEvent>,
) -> Vec<Card> {
    let Inner { state, rng } = inner;
    if state.deck.len() < count {
        let in_play = state.cards_in_play();
        state.table.clear_buried();
        let size = state.deck.refill(&in_play, rng);
        events.push(GameEvent::DeckRefilled { size });
        info!(size, "draw pile refilled");
    }
    let available = count.min(state.deck.len());
    if available < count {
        warn!(%side, requested = count, available, "every card is in play");
    }
    let drawn = match state.deck.draw_n(available) {
        Ok(cards) => cards,
        Err(err) => {
            error!(%err, "draw pile shrank under the lock");
            Vec::new()
        }
    };
    if !drawn.is_empty() {
        state.hand_mut(side).extend(drawn.iter().copied());
        events.push(GameEvent::CardsDrawn {
            side,
            count: drawn.len(),
            reason,
        });
        debug!(%side, count = drawn.len(), ?reason, "cards drawn");
    }
    drawn
}

fn encode_phase(phase: TurnPhase) -> u8 {
    match phase {
        TurnPhase::AwaitingHuman => 0,
        TurnPhase::AwaitingMachine => 1,
        TurnPhase::ResolvingEffect => 2,
        TurnPhase::GameOver => 3,
    }
}

fn decode_phase(raw: u8) -> TurnPhase {
    match raw {
        0 => TurnPhase::AwaitingHuman,
        1 => TurnPhase::AwaitingMachine,
        2 => TurnPhase::ResolvingEffect,
        _ => TurnPhase::GameOver,
    }
}

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::card::{CANONICAL_DECK_SIZE, Card, CardKey, Color, canonical_deck};
use crate::deck::Deck;
use crate::error::GameError;

/// The two seats at the table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Side {
    Human,
    Machine,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Human, Side::Machine];

    pub fn opponent(self) -> Side {
        match self {
            Side::Human => Side::Machine,
            Side::Machine => Side::Human,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::Human => "human",
            Side::Machine => "machine",
        })
    }
}

/// Phase of the turn state machine.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TurnPhase {
    AwaitingHuman,
    AwaitingMachine,
    ResolvingEffect,
    GameOver,
}

impl TurnPhase {
    pub fn awaiting(side: Side) -> Self {
        match side {
            Side::Human => TurnPhase::AwaitingHuman,
            Side::Machine => TurnPhase::AwaitingMachine,
        }
    }
}

/// Cards held by one player, in the order they were received.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn position(&self, card: &Card) -> Option<usize> {
        self.cards.iter().position(|held| held.key() == card.key())
    }

    pub(crate) fn add(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub(crate) fn extend(&mut self, cards: impl IntoIterator<Item = Card>) {
        self.cards.extend(cards);
    }

    pub(crate) fn remove(&mut self, index: usize) -> Card {
        self.cards.remove(index)
    }
}

/// Discard pile plus the color currently in force.
///
/// Only the last card is visible. Cards buried beneath it stay here until a
/// refill returns them to the draw pile.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pile: Vec<Card>,
    active_color: Option<Color>,
}

impl Table {
    pub fn with_top(top: Card, active_color: Color) -> Self {
        Self {
            pile: vec![top],
            active_color: Some(active_color),
        }
    }

    /// Table whose last card in `pile` is the visible top.
    pub fn from_pile(pile: Vec<Card>, active_color: Color) -> Self {
        Self {
            pile,
            active_color: Some(active_color),
        }
    }

    pub fn top(&self) -> Option<&Card> {
        self.pile.last()
    }

    pub fn active_color(&self) -> Option<Color> {
        self.active_color
    }

    pub fn len(&self) -> usize {
        self.pile.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pile.is_empty()
    }

    pub(crate) fn place(&mut self, card: Card) {
        self.pile.push(card);
    }

    /// Places a card without changing the active color; used while flipping
    /// the opening card.
    pub(crate) fn bury(&mut self, card: Card) {
        self.pile.push(card);
    }

    pub(crate) fn set_active_color(&mut self, color: Color) {
        self.active_color = Some(color);
    }

    /// Drops every card except the top; they are about to be reshuffled into
    /// the draw pile.
    pub(crate) fn clear_buried(&mut self) -> usize {
        let buried = self.pile.len().saturating_sub(1);
        self.pile.drain(..buried);
        buried
    }

    fn all_cards(&self) -> &[Card] {
        &self.pile
    }
}

/// Complete, serializable state of one game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub human: Hand,
    pub machine: Hand,
    pub deck: Deck,
    pub table: Table,
    pub turn_owner: Side,
    pub human_declared: bool,
    pub machine_declared: bool,
    pub ended: bool,
    pub winner: Option<Side>,
}

impl GameState {
    /// Deals `hand_size` cards to each side alternately (human first), then
    /// flips cards until a number card opens the table. Skipped action cards
    /// stay buried on the table.
    pub fn deal(mut deck: Deck, hand_size: usize) -> Result<Self, GameError> {
        if hand_size.checked_mul(2).is_none_or(|dealt| deck.len() <= dealt) {
            return Err(GameError::InvalidConfiguration(
                "deck does not contain enough cards to deal",
            ));
        }
        let mut human = Hand::default();
        let mut machine = Hand::default();
        for _ in 0..hand_size {
            human.add(deck.draw()?);
            machine.add(deck.draw()?);
        }
        let mut table = Table::default();
        loop {
            let card = deck.draw().map_err(|_| {
                GameError::InvalidConfiguration("no number card left to open the table")
            })?;
            match (card.rank().is_action(), card.color()) {
                (false, Some(color)) => {
                    table.place(card);
                    table.set_active_color(color);
                    break;
                }
                _ => table.bury(card),
            }
        }
        Ok(Self {
            human,
            machine,
            deck,
            table,
            turn_owner: Side::Human,
            human_declared: false,
            machine_declared: false,
            ended: false,
            winner: None,
        })
    }

    pub fn hand(&self, side: Side) -> &Hand {
        match side {
            Side::Human => &self.human,
            Side::Machine => &self.machine,
        }
    }

    pub(crate) fn hand_mut(&mut self, side: Side) -> &mut Hand {
        match side {
            Side::Human => &mut self.human,
            Side::Machine => &mut self.machine,
        }
    }

    pub fn declared(&self, side: Side) -> bool {
        match side {
            Side::Human => self.human_declared,
            Side::Machine => self.machine_declared,
        }
    }

    pub(crate) fn set_declared(&mut self, side: Side, declared: bool) {
        match side {
            Side::Human => self.human_declared = declared,
            Side::Machine => self.machine_declared = declared,
        }
    }

    pub fn phase(&self) -> TurnPhase {
        if self.ended {
            TurnPhase::GameOver
        } else {
            TurnPhase::awaiting(self.turn_owner)
        }
    }

    /// Cards a refill must not put back in the draw pile: both hands and the
    /// visible top card.
    pub fn cards_in_play(&self) -> Vec<Card> {
        let mut cards = Vec::with_capacity(self.human.len() + self.machine.len() + 1);
        cards.extend_from_slice(self.human.cards());
        cards.extend_from_slice(self.machine.cards());
        cards.extend(self.table.top().copied());
        cards
    }

    pub fn total_cards(&self) -> usize {
        self.human.len() + self.machine.len() + self.deck.len() + self.table.len()
    }

    /// Checks that hands, draw pile and table together hold exactly the
    /// canonical set and that the terminal flags agree with the hands.
    pub fn audit(&self) -> Result<(), GameError> {
        let mut counts: HashMap<CardKey, usize> = HashMap::with_capacity(CANONICAL_DECK_SIZE);
        let all = self
            .human
            .cards()
            .iter()
            .chain(self.machine.cards())
            .chain(self.deck.cards())
            .chain(self.table.all_cards());
        for card in all {
            *counts.entry(card.key()).or_default() += 1;
        }
        for card in canonical_deck() {
            match counts.remove(&card.key()) {
                Some(1) => {}
                Some(n) => {
                    return Err(GameError::InvariantViolation(format!(
                        "{card} present {n} times"
                    )));
                }
                None => {
                    return Err(GameError::InvariantViolation(format!("{card} missing")));
                }
            }
        }
        if let Some(stray) = counts.keys().next() {
            return Err(GameError::InvariantViolation(format!(
                "non-canonical card {stray:?}"
            )));
        }
        let mut held = self
            .human
            .cards()
            .iter()
            .chain(self.machine.cards())
            .chain(self.deck.cards());
        if let Some(card) = held.find(|card| card.is_wild() && card.color().is_some()) {
            return Err(GameError::InvariantViolation(format!(
                "{card} carries a color before being played"
            )));
        }
        if self
            .table
            .top()
            .is_some_and(|top| top.is_wild() && top.color().is_none())
        {
            return Err(GameError::InvariantViolation(String::from(
                "played wild card has no color",
            )));
        }
        if self.human.is_empty() && self.machine.is_empty() {
            return Err(GameError::InvariantViolation(String::from(
                "both hands are empty",
            )));
        }
        let emptied = Side::BOTH.into_iter().find(|side| self.hand(*side).is_empty());
        if emptied.is_some() && (!self.ended || self.winner != emptied) {
            return Err(GameError::InvariantViolation(String::from(
                "empty hand without a recorded winner",
            )));
        }
        Ok(())
    }
}

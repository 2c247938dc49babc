use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::card::{Card, CardKey, canonical_deck};
use crate::error::GameError;

/// Draw pile. The last card of `cards` is the next one drawn.
///
/// The deck only stores cards; deciding what is "in play" when refilling is
/// up to the caller that can see hands and table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Full canonical set, uniformly shuffled.
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cards = canonical_deck();
        cards.shuffle(rng);
        Self { cards }
    }

    /// Deck with a fixed draw order; the last card is drawn first.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn draw(&mut self) -> Result<Card, GameError> {
        self.cards.pop().ok_or(GameError::EmptyDeck {
            requested: 1,
            available: 0,
        })
    }

    /// Draws `count` cards, or none at all when fewer are available.
    pub fn draw_n(&mut self, count: usize) -> Result<Vec<Card>, GameError> {
        if count > self.cards.len() {
            return Err(GameError::EmptyDeck {
                requested: count,
                available: self.cards.len(),
            });
        }
        let split = self.cards.len() - count;
        let mut drawn = self.cards.split_off(split);
        drawn.reverse();
        Ok(drawn)
    }

    /// Replaces the draw pile with every canonical card not listed in
    /// `cards_in_play`, shuffled. Returns the new pile size.
    pub fn refill<R: Rng + ?Sized>(&mut self, cards_in_play: &[Card], rng: &mut R) -> usize {
        let in_play: HashSet<CardKey> = cards_in_play.iter().map(Card::key).collect();
        let mut cards: Vec<Card> = canonical_deck()
            .into_iter()
            .filter(|card| !in_play.contains(&card.key()))
            .collect();
        cards.shuffle(rng);
        debug!(
            in_play = in_play.len(),
            refilled = cards.len(),
            "draw pile rebuilt"
        );
        self.cards = cards;
        self.cards.len()
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the four playable colors. Colorless (black) cards carry `None`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Red, Color::Green, Color::Blue, Color::Yellow];

    /// Color used when a prompt is dismissed without a selection.
    pub const FALLBACK: Color = Color::Red;

    pub fn name(self) -> &'static str {
        match self {
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Yellow => "yellow",
        }
    }

    /// Parses a color from user input (`"r"`, `"red"`, ...), case insensitive.
    pub fn parse(input: &str) -> Option<Color> {
        match input.trim().to_ascii_lowercase().as_str() {
            "r" | "red" => Some(Color::Red),
            "g" | "green" => Some(Color::Green),
            "b" | "blue" => Some(Color::Blue),
            "y" | "yellow" => Some(Color::Yellow),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Face value of a card.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Rank {
    /// Numbered card between 0 and 9.
    Number(u8),
    Skip,
    Reverse,
    DrawTwo,
    Wild,
    WildDrawFour,
}

pub const MAX_NUMBER: u8 = 9;
pub const HAND_SIZE: usize = 5;
/// 4 colors x (10 numbers + skip + reverse + draw two) + wild + wild draw four.
pub const CANONICAL_DECK_SIZE: usize = 54;

impl Rank {
    #[inline]
    pub fn is_wild(&self) -> bool {
        matches!(self, Rank::Wild | Rank::WildDrawFour)
    }

    /// Cards that carry an effect beyond a plain color change.
    #[inline]
    pub fn is_action(&self) -> bool {
        !matches!(self, Rank::Number(_))
    }

    /// Cards after which the player who played them keeps the turn.
    #[inline]
    pub fn retains_turn(&self) -> bool {
        matches!(
            self,
            Rank::Skip | Rank::Reverse | Rank::DrawTwo | Rank::WildDrawFour
        )
    }

    /// Number of cards the opponent draws when this card resolves.
    #[inline]
    pub fn draw_penalty(&self) -> usize {
        match self {
            Rank::DrawTwo => 2,
            Rank::WildDrawFour => 4,
            _ => 0,
        }
    }
}

/// Identity of a card inside the canonical set. Wild-family cards keep a
/// `None` color here even after a color was assigned on play.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CardKey {
    pub rank: Rank,
    pub color: Option<Color>,
}

/// Representation of an UNO card.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Card {
    rank: Rank,
    color: Option<Color>,
}

impl Card {
    pub fn new(rank: Rank, color: Color) -> Self {
        Self {
            rank,
            color: Some(color),
        }
    }

    pub fn number(value: u8, color: Color) -> Self {
        debug_assert!(value <= MAX_NUMBER);
        Self::new(Rank::Number(value), color)
    }

    pub fn wild() -> Self {
        Self {
            rank: Rank::Wild,
            color: None,
        }
    }

    pub fn wild_draw_four() -> Self {
        Self {
            rank: Rank::WildDrawFour,
            color: None,
        }
    }

    /// Builds a card from raw parts, including malformed ones such as an
    /// uncolored number card. Rule checks treat those as unplayable.
    pub fn from_parts(rank: Rank, color: Option<Color>) -> Self {
        Self { rank, color }
    }

    #[inline]
    pub fn rank(&self) -> Rank {
        self.rank
    }

    #[inline]
    pub fn color(&self) -> Option<Color> {
        self.color
    }

    #[inline]
    pub fn is_wild(&self) -> bool {
        self.rank.is_wild()
    }

    pub fn key(&self) -> CardKey {
        CardKey {
            rank: self.rank,
            color: if self.is_wild() { None } else { self.color },
        }
    }

    /// Gives a wild-family card its chosen color. Returns `false` and leaves
    /// the card untouched for colored cards or a wild that already has one.
    pub fn assign_color(&mut self, color: Color) -> bool {
        if !self.is_wild() || self.color.is_some() {
            return false;
        }
        self.color = Some(color);
        true
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let face = match self.rank {
            Rank::Number(value) => value.to_string(),
            Rank::Skip => String::from("skip"),
            Rank::Reverse => String::from("reverse"),
            Rank::DrawTwo => String::from("+2"),
            Rank::Wild => String::from("wild"),
            Rank::WildDrawFour => String::from("wild +4"),
        };
        match self.color {
            Some(color) => write!(f, "{face} {color}"),
            None => f.write_str(&face),
        }
    }
}

/// Builds the canonical 54-card set in deterministic order (unshuffled).
pub fn canonical_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(CANONICAL_DECK_SIZE);
    for color in Color::ALL {
        for value in 0..=MAX_NUMBER {
            deck.push(Card::number(value, color));
        }
        deck.push(Card::new(Rank::Skip, color));
        deck.push(Card::new(Rank::Reverse, color));
        deck.push(Card::new(Rank::DrawTwo, color));
    }
    deck.push(Card::wild());
    deck.push(Card::wild_draw_four());
    deck
}

use std::fmt::Write;

use crate::interface::{DrawReason, GameEvent};
use crate::state::{GameState, Side};

/// Customize state rendering for CLI visualization.
#[derive(Clone, Copy, Debug)]
pub struct VisualOptions {
    /// Reveal the machine's cards instead of only their count.
    pub reveal_machine_hand: bool,
    pub show_pile_sizes: bool,
}

impl Default for VisualOptions {
    fn default() -> Self {
        Self {
            reveal_machine_hand: false,
            show_pile_sizes: true,
        }
    }
}

pub fn render_state(state: &GameState) -> String {
    render_state_with_options(state, VisualOptions::default())
}

pub fn render_state_with_options(state: &GameState, options: VisualOptions) -> String {
    let mut out = String::new();
    let status = match (state.ended, state.winner) {
        (true, Some(winner)) => format!("Finished (winner: {winner})"),
        (true, None) => String::from("Finished"),
        (false, _) => String::from("Ongoing"),
    };
    let _ = writeln!(out, "Game status: {status}");
    let _ = writeln!(out, "Phase: {:?}", state.phase());
    let top = state
        .table
        .top()
        .map(ToString::to_string)
        .unwrap_or_else(|| String::from("--"));
    let active = state
        .table
        .active_color()
        .map(|color| color.to_string())
        .unwrap_or_else(|| String::from("-"));
    let _ = writeln!(out, "Table: {top}  |  Active color: {active}");
    if options.show_pile_sizes {
        let _ = writeln!(
            out,
            "Draw pile: {}  |  Discard pile: {}",
            state.deck.len(),
            state.table.len()
        );
    }
    for side in Side::BOTH {
        let hand = state.hand(side);
        let current_tag = if state.turn_owner == side && !state.ended {
            " <- current"
        } else {
            ""
        };
        let uno_tag = if state.declared(side) { " [UNO]" } else { "" };
        let _ = writeln!(
            out,
            "{}{}{} - {} card(s)",
            label(side),
            uno_tag,
            current_tag,
            hand.len()
        );
        if side == Side::Human || options.reveal_machine_hand {
            if hand.is_empty() {
                let _ = writeln!(out, "    Hand: (empty)");
            } else {
                let entries = hand
                    .cards()
                    .iter()
                    .enumerate()
                    .map(|(idx, card)| format!("{idx}:{card}"))
                    .collect::<Vec<_>>()
                    .join("  ");
                let _ = writeln!(out, "    Hand: {entries}");
            }
        }
    }
    out
}

/// One-line description of an event, phrased for the human player.
pub fn describe_event(event: &GameEvent) -> String {
    match event {
        GameEvent::MoveAccepted { side, card } => format!("{} played {card}", label(*side)),
        GameEvent::CardsDrawn {
            side,
            count,
            reason,
        } => {
            let why = match reason {
                DrawReason::Turn => "",
                DrawReason::Effect => " (card effect)",
                DrawReason::Penalty => " (penalty)",
            };
            format!("{} drew {count} card(s){why}", label(*side))
        }
        GameEvent::DeckRefilled { size } => format!("Draw pile reshuffled ({size} cards)"),
        GameEvent::TurnChanged { owner } => format!("Turn: {}", label(*owner)),
        GameEvent::UnoDeclared { side } => format!("{} declared UNO!", label(*side)),
        GameEvent::PenaltyApplied { side } => {
            format!("{} missed the UNO call and takes a card", label(*side))
        }
        GameEvent::GameEnded { winner } => match winner {
            Side::Human => String::from("You won the game!"),
            Side::Machine => String::from("The machine won. Better luck next time."),
        },
    }
}

fn label(side: Side) -> &'static str {
    match side {
        Side::Human => "You",
        Side::Machine => "Machine",
    }
}

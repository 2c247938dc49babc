use crate::card::{Card, Color, Rank};

/// Returns true when `candidate` may legally be played on `top` while
/// `active` is the color in force.
///
/// Wild-family cards are always playable. Every other card needs a concrete
/// color on itself and a known active color and top card; anything missing
/// makes the move illegal instead of failing.
pub fn can_follow(candidate: &Card, top: Option<&Card>, active: Option<Color>) -> bool {
    if candidate.is_wild() {
        return true;
    }
    let (Some(color), Some(active), Some(top)) = (candidate.color(), active, top) else {
        return false;
    };
    let color_match = color == active;
    match candidate.rank() {
        Rank::DrawTwo => color_match || top.rank() == Rank::DrawTwo,
        Rank::Skip | Rank::Reverse => color_match || top.rank() == candidate.rank(),
        Rank::Number(value) => color_match || top.rank() == Rank::Number(value),
        Rank::Wild | Rank::WildDrawFour => true,
    }
}

/// Indices of the cards in `hand` that can follow the current table state,
/// in hand order.
pub fn playable_indices(hand: &[Card], top: Option<&Card>, active: Option<Color>) -> Vec<usize> {
    hand.iter()
        .enumerate()
        .filter(|(_, card)| can_follow(card, top, active))
        .map(|(index, _)| index)
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::card::canonical_deck;

    fn any_card() -> impl Strategy<Value = Card> {
        let deck = canonical_deck();
        (0..deck.len()).prop_map(move |idx| deck[idx])
    }

    fn any_color() -> impl Strategy<Value = Option<Color>> {
        prop_oneof![
            Just(None),
            Just(Some(Color::Red)),
            Just(Some(Color::Green)),
            Just(Some(Color::Blue)),
            Just(Some(Color::Yellow)),
        ]
    }

    proptest! {
        #[test]
        fn wild_cards_always_follow(top in any_card(), active in any_color(), four in any::<bool>()) {
            let wild = if four { Card::wild_draw_four() } else { Card::wild() };
            prop_assert!(can_follow(&wild, Some(&top), active));
            prop_assert!(can_follow(&wild, None, active));
        }

        #[test]
        fn equal_numbers_follow_regardless_of_color(value in 0u8..=9, a in 0usize..4, b in 0usize..4) {
            let candidate = Card::number(value, Color::ALL[a]);
            let top = Card::number(value, Color::ALL[b]);
            prop_assert!(can_follow(&candidate, Some(&top), top.color()));
            prop_assert!(can_follow(&candidate, Some(&top), candidate.color()));
        }

        #[test]
        fn missing_active_color_rejects_colored_cards(candidate in any_card(), top in any_card()) {
            prop_assume!(!candidate.is_wild());
            prop_assert!(!can_follow(&candidate, Some(&top), None));
        }
    }

    #[test]
    fn number_needs_color_or_value() {
        let top = Card::number(5, Color::Red);
        assert!(can_follow(&Card::number(7, Color::Red), Some(&top), Some(Color::Red)));
        assert!(can_follow(&Card::number(5, Color::Blue), Some(&top), Some(Color::Red)));
        assert!(!can_follow(&Card::number(8, Color::Green), Some(&top), Some(Color::Red)));
    }

    #[test]
    fn active_color_overrides_printed_top_color() {
        let mut top = Card::wild();
        top.assign_color(Color::Green);
        assert!(can_follow(&Card::number(2, Color::Green), Some(&top), Some(Color::Green)));
        assert!(!can_follow(&Card::number(2, Color::Red), Some(&top), Some(Color::Green)));
    }

    #[test]
    fn draw_two_stacks_on_draw_two() {
        let top = Card::new(Rank::DrawTwo, Color::Blue);
        assert!(can_follow(&Card::new(Rank::DrawTwo, Color::Red), Some(&top), Some(Color::Blue)));
        assert!(!can_follow(
            &Card::new(Rank::DrawTwo, Color::Red),
            Some(&Card::number(2, Color::Blue)),
            Some(Color::Blue)
        ));
    }

    #[test]
    fn skip_and_reverse_match_only_their_own_type() {
        let skip = Card::new(Rank::Skip, Color::Blue);
        assert!(can_follow(&Card::new(Rank::Skip, Color::Red), Some(&skip), Some(Color::Blue)));
        assert!(!can_follow(&Card::new(Rank::Reverse, Color::Red), Some(&skip), Some(Color::Blue)));
        assert!(can_follow(&Card::new(Rank::Reverse, Color::Blue), Some(&skip), Some(Color::Blue)));
    }

    #[test]
    fn malformed_cards_are_rejected() {
        let uncolored = Card::from_parts(Rank::Number(5), None);
        let top = Card::number(5, Color::Red);
        assert!(!can_follow(&uncolored, Some(&top), Some(Color::Red)));
        assert!(!can_follow(&Card::number(5, Color::Red), None, Some(Color::Red)));
    }

    #[test]
    fn playable_indices_keep_hand_order() {
        let hand = vec![
            Card::number(1, Color::Green),
            Card::number(3, Color::Red),
            Card::wild(),
        ];
        let top = Card::number(9, Color::Red);
        assert_eq!(playable_indices(&hand, Some(&top), Some(Color::Red)), vec![1, 2]);
    }
}

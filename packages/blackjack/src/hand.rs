use crate::Rank;

/// Best total of a hand, demoting aces from 11 to 1 while it would bust.
pub fn calculate_hand_value(cards: &[Rank]) -> u8 {
    let mut total: u16 = 0;
    let mut aces = 0;

    for card in cards {
        if *card == Rank::Ace {
            aces += 1;
        }
        total += card.value() as u16;
    }

    while total > 21 && aces > 0 {
        total -= 10;
        aces -= 1;
    }

    total.min(u8::MAX as u16) as u8
}

/// True when an ace is still being counted as 11.
pub fn is_soft_hand(cards: &[Rank]) -> bool {
    let hard: u16 = cards
        .iter()
        .map(|c| if *c == Rank::Ace { 1 } else { c.value() as u16 })
        .sum();
    cards.contains(&Rank::Ace) && hard + 10 <= 21
}

pub fn is_busted(cards: &[Rank]) -> bool {
    calculate_hand_value(cards) > 21
}

/// 21 with exactly two cards.
pub fn is_blackjack(cards: &[Rank]) -> bool {
    cards.len() == 2 && calculate_hand_value(cards) == 21
}

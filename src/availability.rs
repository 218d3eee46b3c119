//! Effective remaining count per rank: the mirrored shoe minus whatever is
//! already placed in the current turn. Pure; recomputed on every read.

use blackjack::{Rank, ShoeComposition};

use crate::TurnSession;

/// How many times each rank appears anywhere in the session.
pub fn occurrences(session: &TurnSession) -> ShoeComposition {
    let mut seen = ShoeComposition::empty();
    for rank in session.placed_cards() {
        seen.set(rank, seen.count(rank) + 1);
    }
    seen
}

/// `max(0, shoe[r] - occurrences[r])` for every rank.
pub fn remaining(shoe: &ShoeComposition, session: &TurnSession) -> ShoeComposition {
    let used = occurrences(session);
    let mut left = ShoeComposition::empty();
    for rank in Rank::ALL {
        left.set(rank, shoe.count(rank).saturating_sub(used.count(rank)));
    }
    left
}

/// A rank may be picked only while at least one copy is unaccounted for.
pub fn is_available(shoe: &ShoeComposition, session: &TurnSession, rank: Rank) -> bool {
    remaining(shoe, session).count(rank) > 0
}

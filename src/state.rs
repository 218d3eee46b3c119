use std::fmt;

use blackjack::Rank;
use serde::{Deserialize, Serialize};

/// A place on the table a card can be put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    /// The dealer's upcard
    Dealer,
    /// Dealer draws recorded while reviewing the turn before advancing
    DealerExtra(usize),
    Player(usize),
    /// Placing at or past the end of the seen list appends
    Seen(usize),
}

/// Which hand `add_hand_slot` grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandKind {
    Player,
    Dealer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Move {
    Hit,
    Stand,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Hit => f.write_str("Hit"),
            Move::Stand => f.write_str("Stand"),
        }
    }
}

/// What the advice panel shows after a decide call.
///
/// `win_display` is the chosen action's expected value rendered as a
/// percentage and `loss_display` its complement. The engine's EV is not a
/// true win probability; the mapping is kept as-is for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceResult {
    pub recommended: Move,
    pub win_display: String,
    pub loss_display: String,
    pub hit_ev: f64,
    pub stand_ev: f64,
}

impl AdviceResult {
    /// Hit only when its EV is strictly greater; exact ties recommend Stand.
    pub fn from_evs(hit_ev: f64, stand_ev: f64) -> Self {
        let (recommended, best) = if hit_ev > stand_ev {
            (Move::Hit, hit_ev)
        } else {
            (Move::Stand, stand_ev)
        };
        Self {
            recommended,
            win_display: format!("{:.2}%", best * 100.0),
            loss_display: format!("{:.2}%", (1.0 - best) * 100.0),
            hit_ev,
            stand_ev,
        }
    }
}

/// Everything placed on the table for the turn in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnSession {
    pub dealer_upcard: Option<Rank>,
    pub dealer_extra: Vec<Option<Rank>>,
    pub player_hand: Vec<Option<Rank>>, // never fewer than two slots
    pub seen_cards: Vec<Rank>,
    pub busy: bool,
    pub last_advice: Option<AdviceResult>,
    /// Bumped on every reset so late call results can be told apart
    pub epoch: u64,
}

impl Default for TurnSession {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnSession {
    pub fn new() -> Self {
        Self {
            dealer_upcard: None,
            dealer_extra: Vec::new(),
            player_hand: vec![None, None],
            seen_cards: Vec::new(),
            busy: false,
            last_advice: None,
            epoch: 0,
        }
    }

    /// Every card currently on the table, duplicates included.
    pub fn placed_cards(&self) -> impl Iterator<Item = Rank> + '_ {
        self.player_hand
            .iter()
            .flatten()
            .chain(self.dealer_upcard.iter())
            .chain(self.dealer_extra.iter().flatten())
            .chain(self.seen_cards.iter())
            .copied()
    }

    pub fn player_cards(&self) -> Vec<Rank> {
        self.player_hand.iter().flatten().copied().collect()
    }

    /// Upcard followed by any recorded dealer draws.
    pub fn dealer_cards(&self) -> Vec<Rank> {
        self.dealer_upcard
            .iter()
            .chain(self.dealer_extra.iter().flatten())
            .copied()
            .collect()
    }

    /// Enough is on the table to ask the engine for advice.
    pub fn is_complete(&self) -> bool {
        self.dealer_upcard.is_some() && self.player_hand.iter().flatten().count() >= 2
    }

    pub fn slot(&self, slot: Slot) -> Option<Rank> {
        match slot {
            Slot::Dealer => self.dealer_upcard,
            Slot::DealerExtra(i) => self.dealer_extra.get(i).copied().flatten(),
            Slot::Player(i) => self.player_hand.get(i).copied().flatten(),
            Slot::Seen(i) => self.seen_cards.get(i).copied(),
        }
    }

    /// Put `rank` into `slot`. Returns false for a slot that does not exist.
    pub(crate) fn set(&mut self, slot: Slot, rank: Rank) -> bool {
        match slot {
            Slot::Dealer => self.dealer_upcard = Some(rank),
            Slot::DealerExtra(i) => match self.dealer_extra.get_mut(i) {
                Some(s) => *s = Some(rank),
                None => return false,
            },
            Slot::Player(i) => match self.player_hand.get_mut(i) {
                Some(s) => *s = Some(rank),
                None => return false,
            },
            Slot::Seen(i) => match self.seen_cards.get_mut(i) {
                Some(s) => *s = rank,
                None => self.seen_cards.push(rank),
            },
        }
        true
    }

    /// Drop a slot. The two base player slots and the upcard can only be replaced.
    pub(crate) fn remove(&mut self, slot: Slot) -> bool {
        match slot {
            Slot::Dealer => false,
            Slot::Player(i) if i < 2 => false,
            Slot::Player(i) => {
                if i < self.player_hand.len() {
                    self.player_hand.remove(i);
                    true
                } else {
                    false
                }
            }
            Slot::DealerExtra(i) => {
                if i < self.dealer_extra.len() {
                    self.dealer_extra.remove(i);
                    true
                } else {
                    false
                }
            }
            Slot::Seen(i) => {
                if i < self.seen_cards.len() {
                    self.seen_cards.remove(i);
                    true
                } else {
                    false
                }
            }
        }
    }

    pub(crate) fn add_slot(&mut self, hand: HandKind) -> Slot {
        match hand {
            HandKind::Player => {
                self.player_hand.push(None);
                Slot::Player(self.player_hand.len() - 1)
            }
            HandKind::Dealer => {
                self.dealer_extra.push(None);
                Slot::DealerExtra(self.dealer_extra.len() - 1)
            }
        }
    }

    /// Empty table for the next turn.
    pub(crate) fn reset(&mut self) {
        let epoch = self.epoch.wrapping_add(1);
        *self = Self { epoch, ..Self::new() };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_has_two_empty_player_slots() {
        let session = TurnSession::new();
        assert_eq!(session.player_hand, vec![None, None]);
        assert_eq!(session.dealer_upcard, None);
        assert!(session.dealer_extra.is_empty());
        assert!(session.seen_cards.is_empty());
        assert!(!session.busy);
        assert!(session.last_advice.is_none());
    }

    #[test]
    fn test_advice_prefers_higher_ev() {
        let advice = AdviceResult::from_evs(0.61, 0.47);
        assert_eq!(advice.recommended, Move::Hit);
        assert_eq!(advice.win_display, "61.00%");
        assert_eq!(advice.loss_display, "39.00%");
    }

    #[test]
    fn test_advice_tie_goes_to_stand() {
        let advice = AdviceResult::from_evs(0.5, 0.5);
        assert_eq!(advice.recommended, Move::Stand);
        assert_eq!(advice.win_display, "50.00%");
        assert_eq!(advice.loss_display, "50.00%");
    }

    #[test]
    fn test_advice_stand_uses_stand_ev() {
        let advice = AdviceResult::from_evs(0.12, 0.873);
        assert_eq!(advice.recommended, Move::Stand);
        assert_eq!(advice.win_display, "87.30%");
        assert_eq!(advice.loss_display, "12.70%");
    }

    #[test]
    fn test_placed_cards_counts_every_area() {
        let mut session = TurnSession::new();
        session.set(Slot::Player(0), Rank::Ace);
        session.set(Slot::Player(1), Rank::Ace);
        session.set(Slot::Dealer, Rank::Nine);
        session.add_slot(HandKind::Dealer);
        session.set(Slot::DealerExtra(0), Rank::Ace);
        session.set(Slot::Seen(0), Rank::Two);
        let placed: Vec<Rank> = session.placed_cards().collect();
        assert_eq!(placed.iter().filter(|r| **r == Rank::Ace).count(), 3);
        assert_eq!(placed.len(), 5);
    }

    #[test]
    fn test_base_slots_cannot_be_removed() {
        let mut session = TurnSession::new();
        session.set(Slot::Player(0), Rank::Five);
        session.set(Slot::Dealer, Rank::Six);
        assert!(!session.remove(Slot::Player(0)));
        assert!(!session.remove(Slot::Player(1)));
        assert!(!session.remove(Slot::Dealer));
        assert_eq!(session.slot(Slot::Player(0)), Some(Rank::Five));
        assert_eq!(session.slot(Slot::Dealer), Some(Rank::Six));
    }

    #[test]
    fn test_extra_player_slot_removal() {
        let mut session = TurnSession::new();
        let slot = session.add_slot(HandKind::Player);
        assert_eq!(slot, Slot::Player(2));
        session.set(slot, Rank::Four);
        assert!(session.remove(slot));
        assert_eq!(session.player_hand.len(), 2);
        assert!(!session.remove(Slot::Player(2)));
    }

    #[test]
    fn test_seen_appends_past_end_and_replaces_inside() {
        let mut session = TurnSession::new();
        assert!(session.set(Slot::Seen(usize::MAX), Rank::Three));
        assert!(session.set(Slot::Seen(5), Rank::Four));
        assert_eq!(session.seen_cards, vec![Rank::Three, Rank::Four]);
        assert!(session.set(Slot::Seen(0), Rank::King));
        assert_eq!(session.seen_cards, vec![Rank::King, Rank::Four]);
    }

    #[test]
    fn test_set_rejects_missing_slots() {
        let mut session = TurnSession::new();
        assert!(!session.set(Slot::Player(2), Rank::Two));
        assert!(!session.set(Slot::DealerExtra(0), Rank::Two));
    }

    #[test]
    fn test_reset_bumps_epoch() {
        let mut session = TurnSession::new();
        session.set(Slot::Player(0), Rank::Two);
        session.add_slot(HandKind::Player);
        session.reset();
        assert_eq!(session.epoch, 1);
        assert_eq!(session.player_hand, vec![None, None]);
    }
}

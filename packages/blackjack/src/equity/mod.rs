use std::collections::HashMap;

use crate::{calculate_hand_value, is_soft_hand, GameRules, Rank, ShoeComposition};

/// Card counts by blackjack value index.
/// Index 0=Ace, 1=Two, ..., 8=Nine, 9=Ten/J/Q/K.
type Shoe = [u16; 10];

/// Dealer outcome probability distribution.
/// [P(bust), P(17), P(18), P(19), P(20), P(21)]
type DealerProbs = [f64; 6];

/// Win equity of the two actions the advisor compares.
///
/// Each value is P(win) + ½·P(push) for the player, so both lie in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equity {
    pub hit: f64,
    pub stand: f64,
}

/// Composition-dependent hit/stand evaluator.
///
/// The dealer's final-total distribution is enumerated exactly from the remaining
/// shoe; hitting is valued as the best of standing or hitting again after each
/// possible next card.
pub struct EquityCalculator {
    rules: GameRules,
    dealer_cache: HashMap<(Shoe, u8, bool), DealerProbs>,
    dealer_upcard_cache: HashMap<(Shoe, u8), DealerProbs>,
    player_cache: HashMap<(Shoe, u8, bool), f64>,
}

impl EquityCalculator {
    pub fn new(rules: GameRules) -> Self {
        Self {
            rules,
            dealer_cache: HashMap::new(),
            dealer_upcard_cache: HashMap::new(),
            player_cache: HashMap::new(),
        }
    }

    /// Evaluate hit and stand for `player` against `upcard`.
    ///
    /// `shoe` must already exclude every card known to be out, including
    /// the player's cards and the upcard itself.
    pub fn decide(&mut self, player: &[Rank], upcard: Rank, shoe: &ShoeComposition) -> Equity {
        self.player_cache.clear();

        let player_value = calculate_hand_value(player);
        if player_value > 21 {
            return Equity {
                hit: 0.0,
                stand: 0.0,
            };
        }
        if player_value == 21 {
            return Equity {
                hit: 0.0,
                stand: 1.0,
            };
        }

        let soft = is_soft_hand(player);
        let shoe = Self::value_shoe(shoe);
        let up = Self::value_index(upcard) as u8;

        let dp = self.dealer_probs_from_upcard(shoe, up);
        let stand = Self::stand_equity(player_value, &dp);
        let hit = self.hit_equity(shoe, player_value, soft, up);
        Equity { hit, stand }
    }

    // ── Shoe helpers ──

    fn value_index(rank: Rank) -> usize {
        match rank {
            Rank::Ace => 0,
            other => (other.value() - 1) as usize,
        }
    }

    fn value_shoe(shoe: &ShoeComposition) -> Shoe {
        let mut s = [0u16; 10];
        for (rank, count) in shoe.iter() {
            let idx = Self::value_index(rank);
            s[idx] = s[idx].saturating_add(count.min(u16::MAX as u32) as u16);
        }
        s
    }

    fn shoe_total(shoe: &Shoe) -> u32 {
        shoe.iter().map(|&c| c as u32).sum()
    }

    fn remove_card(shoe: &Shoe, idx: usize) -> Shoe {
        let mut s = *shoe;
        debug_assert!(s[idx] > 0);
        s[idx] -= 1;
        s
    }

    /// Blackjack value for a card at the given value index.
    /// Ace returns 1 (caller promotes to 11 via add_to_hand).
    fn card_value(idx: usize) -> u8 {
        if idx == 0 {
            1
        } else {
            (idx + 1) as u8
        }
    }

    /// Add a card to a hand, returning new (value, is_soft).
    fn add_to_hand(value: u8, is_soft: bool, card: u8) -> (u8, bool) {
        if card == 1 {
            if value + 11 <= 21 {
                (value + 11, true)
            } else {
                (value + 1, is_soft)
            }
        } else {
            let new_val = value + card;
            if new_val > 21 && is_soft {
                (new_val - 10, false)
            } else {
                (new_val, is_soft)
            }
        }
    }

    // ── Dealer outcome probabilities ──

    fn dealer_probs(&mut self, shoe: Shoe, value: u8, is_soft: bool) -> DealerProbs {
        if let Some(&cached) = self.dealer_cache.get(&(shoe, value, is_soft)) {
            return cached;
        }

        let must_stand = if value >= 18 {
            true
        } else if value == 17 {
            !(is_soft && self.rules.dealer_hits_soft_17)
        } else {
            false
        };

        let result = if value > 21 {
            let mut r = [0.0; 6];
            r[0] = 1.0;
            r
        } else if must_stand {
            let mut r = [0.0; 6];
            r[(value - 16) as usize] = 1.0;
            r
        } else {
            let total = Self::shoe_total(&shoe);
            if total == 0 {
                return Self::stuck_dealer(value);
            }
            let mut r = [0.0; 6];
            for i in 0..10 {
                if shoe[i] == 0 {
                    continue;
                }
                let p = shoe[i] as f64 / total as f64;
                let (nv, ns) = Self::add_to_hand(value, is_soft, Self::card_value(i));
                if nv > 21 {
                    r[0] += p;
                } else {
                    let sub = self.dealer_probs(Self::remove_card(&shoe, i), nv, ns);
                    for j in 0..6 {
                        r[j] += p * sub[j];
                    }
                }
            }
            r
        };

        self.dealer_cache.insert((shoe, value, is_soft), result);
        result
    }

    /// Dealer cannot draw any more: a made hand stands, anything lower
    /// is scored with the busts.
    fn stuck_dealer(value: u8) -> DealerProbs {
        let mut r = [0.0; 6];
        if (17..=21).contains(&value) {
            r[(value - 16) as usize] = 1.0;
        } else {
            r[0] = 1.0;
        }
        r
    }

    /// Dealer probs starting from just the upcard. With peeking enabled and an
    /// Ace or ten showing, the hole card is conditioned on not making blackjack.
    fn dealer_probs_from_upcard(&mut self, shoe: Shoe, upcard_idx: u8) -> DealerProbs {
        let key = (shoe, upcard_idx);
        if let Some(&cached) = self.dealer_upcard_cache.get(&key) {
            return cached;
        }

        let cv = Self::card_value(upcard_idx as usize);
        let (d_val, d_soft) = Self::add_to_hand(0, false, cv);

        let result = if self.rules.dealer_peeks && (cv == 1 || cv == 10) {
            let forbidden = if cv == 1 { 9 } else { 0 };
            let adj_total = Self::shoe_total(&shoe) - shoe[forbidden] as u32;

            if adj_total == 0 {
                return Self::stuck_dealer(d_val);
            }

            let mut r = [0.0; 6];
            for i in 0..10 {
                if shoe[i] == 0 || i == forbidden {
                    continue;
                }
                let p = shoe[i] as f64 / adj_total as f64;
                let (nv, ns) = Self::add_to_hand(d_val, d_soft, Self::card_value(i));
                let sub = self.dealer_probs(Self::remove_card(&shoe, i), nv, ns);
                for j in 0..6 {
                    r[j] += p * sub[j];
                }
            }
            r
        } else {
            self.dealer_probs(shoe, d_val, d_soft)
        };

        self.dealer_upcard_cache.insert(key, result);
        result
    }

    // ── Player equity ──

    fn stand_equity(player_value: u8, dp: &DealerProbs) -> f64 {
        if player_value > 21 {
            return 0.0;
        }
        let mut eq = dp[0]; // dealer bust → player wins
        for d in 17u8..=21 {
            let p = dp[(d - 16) as usize];
            if player_value > d {
                eq += p;
            } else if player_value == d {
                eq += 0.5 * p;
            }
        }
        eq
    }

    fn hit_equity(&mut self, shoe: Shoe, player_value: u8, is_soft: bool, dealer_up: u8) -> f64 {
        let total = Self::shoe_total(&shoe);
        if total == 0 {
            return 0.0;
        }
        let mut eq = 0.0;
        for i in 0..10 {
            if shoe[i] == 0 {
                continue;
            }
            let p = shoe[i] as f64 / total as f64;
            let (nv, ns) = Self::add_to_hand(player_value, is_soft, Self::card_value(i));
            if nv <= 21 {
                eq += p * self.hit_or_stand_equity(Self::remove_card(&shoe, i), nv, ns, dealer_up);
            }
        }
        eq
    }

    fn hit_or_stand_equity(
        &mut self,
        shoe: Shoe,
        player_value: u8,
        is_soft: bool,
        dealer_up: u8,
    ) -> f64 {
        let key = (shoe, player_value, is_soft);
        if let Some(&cached) = self.player_cache.get(&key) {
            return cached;
        }

        let dp = self.dealer_probs_from_upcard(shoe, dealer_up);
        let s_eq = Self::stand_equity(player_value, &dp);
        let best = if player_value == 21 {
            s_eq
        } else {
            s_eq.max(self.hit_equity(shoe, player_value, is_soft, dealer_up))
        };

        self.player_cache.insert(key, best);
        best
    }
}

use serde::{Deserialize, Serialize};

/// Dealer drawing rules the equity calculator plays out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRules {
    /// Dealer hits on soft 17
    pub dealer_hits_soft_17: bool,

    /// Dealer peeks for blackjack with Ace or 10 up, so the hole card
    /// cannot complete a blackjack once play continues
    pub dealer_peeks: bool,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            dealer_hits_soft_17: false,
            dealer_peeks: false,
        }
    }
}

impl GameRules {
    /// Dealer hits soft 17, no peek
    pub fn h17() -> Self {
        Self {
            dealer_hits_soft_17: true,
            ..Self::default()
        }
    }
}

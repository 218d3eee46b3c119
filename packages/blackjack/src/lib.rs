mod card;
mod equity;
mod hand;
mod rules;
mod shoe;

pub use card::{ParseRankError, Rank};
pub use equity::{Equity, EquityCalculator};
pub use hand::{calculate_hand_value, is_blackjack, is_busted, is_soft_hand};
pub use rules::GameRules;
pub use shoe::ShoeComposition;

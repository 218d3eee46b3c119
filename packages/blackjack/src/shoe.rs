use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Rank;

/// Cards remaining per rank, indexed by [`Rank::index`].
///
/// Serialized as an object keyed by rank symbol, e.g. `{"A":4,"2":4,...}`.
/// Ranks absent from an inbound object read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Rank, u32>", into = "BTreeMap<Rank, u32>")]
pub struct ShoeComposition {
    counts: [u32; 13],
}

impl ShoeComposition {
    /// Freshly shuffled shoe: `4 × num_decks` of every rank.
    pub fn full(num_decks: u32) -> Self {
        Self {
            counts: [num_decks.saturating_mul(4); 13],
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn count(&self, rank: Rank) -> u32 {
        self.counts[rank.index()]
    }

    pub fn set(&mut self, rank: Rank, count: u32) {
        self.counts[rank.index()] = count;
    }

    /// Number of cards left in the shoe.
    pub fn total(&self) -> u32 {
        self.counts.iter().fold(0u32, |acc, c| acc.saturating_add(*c))
    }

    /// Take one card of `rank` out. Returns false (and changes nothing) when none are left.
    pub fn draw(&mut self, rank: Rank) -> bool {
        let slot = &mut self.counts[rank.index()];
        if *slot > 0 {
            *slot -= 1;
            true
        } else {
            false
        }
    }

    pub fn remove_dealt(&mut self, dealt: &[Rank]) {
        for &rank in dealt {
            let _ = self.draw(rank);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Rank, u32)> + '_ {
        Rank::ALL.iter().map(move |&r| (r, self.count(r)))
    }
}

impl From<BTreeMap<Rank, u32>> for ShoeComposition {
    fn from(map: BTreeMap<Rank, u32>) -> Self {
        let mut shoe = Self::empty();
        for (rank, count) in map {
            shoe.set(rank, count);
        }
        shoe
    }
}

impl From<ShoeComposition> for BTreeMap<Rank, u32> {
    fn from(shoe: ShoeComposition) -> Self {
        shoe.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_shoe_totals() {
        assert_eq!(ShoeComposition::full(1).total(), 52);
        assert_eq!(ShoeComposition::full(6).total(), 312);
        assert_eq!(ShoeComposition::full(2).count(Rank::Queen), 8);
    }

    #[test]
    fn test_huge_deck_count_saturates() {
        let shoe = ShoeComposition::full(u32::MAX);
        assert_eq!(shoe.count(Rank::Ace), u32::MAX);
        assert_eq!(shoe.total(), u32::MAX);
    }

    #[test]
    fn test_draw_stops_at_zero() {
        let mut shoe = ShoeComposition::empty();
        shoe.set(Rank::Ace, 1);
        assert!(shoe.draw(Rank::Ace));
        assert!(!shoe.draw(Rank::Ace));
        assert_eq!(shoe.count(Rank::Ace), 0);
    }

    #[test]
    fn test_remove_dealt_skips_exhausted() {
        let mut shoe = ShoeComposition::full(1);
        shoe.remove_dealt(&[Rank::King; 6]);
        assert_eq!(shoe.count(Rank::King), 0);
        assert_eq!(shoe.total(), 48);
    }

    #[test]
    fn test_json_keyed_by_symbol() {
        let mut shoe = ShoeComposition::full(1);
        shoe.draw(Rank::Ten);
        let json = serde_json::to_value(shoe).unwrap();
        assert_eq!(json["10"], 3);
        assert_eq!(json["A"], 4);
    }

    #[test]
    fn test_missing_ranks_read_as_zero() {
        let shoe: ShoeComposition = serde_json::from_str(r#"{"A":2,"K":7}"#).unwrap();
        assert_eq!(shoe.count(Rank::Ace), 2);
        assert_eq!(shoe.count(Rank::King), 7);
        assert_eq!(shoe.count(Rank::Five), 0);
        assert_eq!(shoe.total(), 9);
    }
}

use std::sync::{Mutex, MutexGuard, PoisonError};

use blackjack::{EquityCalculator, GameRules, ShoeComposition};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::Engine;
use crate::msg::{CompositionUpdate, CreateDeckRequest, DecideRequest, DecideResponse, NextTurnRequest};
use crate::EngineError;

/// In-process engine owning the authoritative shoe.
///
/// Every change to the shoe is published on the event channel returned by
/// [`LocalEngine::new`].
pub struct LocalEngine {
    shoe: Mutex<ShoeComposition>,
    events: UnboundedSender<CompositionUpdate>,
    rules: GameRules,
}

impl LocalEngine {
    pub fn new(num_decks: u32, rules: GameRules) -> (Self, UnboundedReceiver<CompositionUpdate>) {
        let (events, rx) = mpsc::unbounded_channel();
        let engine = Self {
            shoe: Mutex::new(ShoeComposition::full(num_decks)),
            events,
            rules,
        };
        (engine, rx)
    }

    fn lock(&self) -> MutexGuard<'_, ShoeComposition> {
        self.shoe.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Authoritative composition right now.
    pub fn shoe(&self) -> ShoeComposition {
        *self.lock()
    }

    fn publish(&self, shoe: ShoeComposition) -> Result<(), EngineError> {
        self.events
            .send(CompositionUpdate {
                counts_by_rank: shoe,
            })
            .map_err(|_| EngineError::EventsClosed)
    }
}

impl Engine for LocalEngine {
    async fn create_deck(&self, req: CreateDeckRequest) -> Result<(), EngineError> {
        if req.num_decks == 0 {
            return Err(EngineError::Rejected("a shoe needs at least one deck".to_string()));
        }
        let shoe = ShoeComposition::full(req.num_decks);
        *self.lock() = shoe;
        log::info!(
            "Created a shoe of {} deck(s): {} cards total",
            req.num_decks,
            shoe.total()
        );
        self.publish(shoe)
    }

    async fn decide_hand(&self, req: DecideRequest) -> Result<DecideResponse, EngineError> {
        // Work on a copy; deciding never consumes cards.
        let mut working = self.shoe();
        working.remove_dealt(&req.player);
        working.remove_dealt(&[req.dealer]);
        working.remove_dealt(&req.others);

        let rules = self.rules;
        let equity = tokio::task::spawn_blocking(move || {
            EquityCalculator::new(rules).decide(&req.player, req.dealer, &working)
        })
        .await
        .map_err(|e| EngineError::Worker(e.to_string()))?;

        Ok(DecideResponse {
            hit_ev: equity.hit,
            stand_ev: equity.stand,
        })
    }

    async fn advance_turn(&self, req: NextTurnRequest) -> Result<(), EngineError> {
        let shoe = {
            let mut shoe = self.lock();
            shoe.remove_dealt(&req.player);
            shoe.remove_dealt(&req.dealer);
            shoe.remove_dealt(&req.others);
            *shoe
        };
        log::info!("Turn recorded: {} cards left in the shoe", shoe.total());
        self.publish(shoe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blackjack::Rank;

    #[tokio::test]
    async fn test_create_deck_publishes_full_shoe() {
        let (engine, mut rx) = LocalEngine::new(1, GameRules::default());
        engine.create_deck(CreateDeckRequest { num_decks: 2 }).await.unwrap();
        let update = rx.recv().await.unwrap();
        assert_eq!(update.counts_by_rank, ShoeComposition::full(2));
        assert_eq!(engine.shoe().total(), 104);
    }

    #[tokio::test]
    async fn test_create_deck_rejects_zero() {
        let (engine, _rx) = LocalEngine::new(1, GameRules::default());
        let err = engine.create_deck(CreateDeckRequest { num_decks: 0 }).await;
        assert!(matches!(err, Err(EngineError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_decide_leaves_shoe_alone() {
        let (engine, mut rx) = LocalEngine::new(1, GameRules::default());
        let res = engine
            .decide_hand(DecideRequest {
                player: vec![Rank::Ten, Rank::Six],
                dealer: Rank::Ten,
                others: vec![],
            })
            .await
            .unwrap();
        assert!((0.0..=1.0).contains(&res.hit_ev));
        assert!((0.0..=1.0).contains(&res.stand_ev));
        assert_eq!(engine.shoe(), ShoeComposition::full(1));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_advance_removes_cards_and_publishes() {
        let (engine, mut rx) = LocalEngine::new(1, GameRules::default());
        engine
            .advance_turn(NextTurnRequest {
                player: vec![Rank::Ace, Rank::Ace],
                dealer: vec![Rank::King, Rank::Seven],
                others: vec![Rank::Ace],
            })
            .await
            .unwrap();
        let update = rx.recv().await.unwrap();
        assert_eq!(update.counts_by_rank.count(Rank::Ace), 1);
        assert_eq!(update.counts_by_rank.count(Rank::King), 3);
        assert_eq!(update.counts_by_rank.total(), 47);
    }

    #[tokio::test]
    async fn test_closed_channel_is_reported() {
        let (engine, rx) = LocalEngine::new(1, GameRules::default());
        drop(rx);
        let err = engine.create_deck(CreateDeckRequest { num_decks: 1 }).await;
        assert_eq!(err, Err(EngineError::EventsClosed));
    }
}

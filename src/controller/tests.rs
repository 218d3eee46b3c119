use std::time::Duration;

use super::*;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::msg::CompositionUpdate;
use crate::MirrorState;

// Events are not pumped here; the mirror stays provisional.
fn controller(num_decks: u32) -> (TurnController<LocalEngine>, UnboundedReceiver<CompositionUpdate>) {
    let config = AdvisorConfig::new(num_decks, Duration::from_secs(5)).unwrap();
    let (engine, events) = LocalEngine::new(num_decks, GameRules::default());
    (TurnController::new(engine, MirrorHandle::new(num_decks), config), events)
}

async fn wait_until_synced(ctl: &TurnController<LocalEngine>) {
    for _ in 0..200 {
        if ctl.mirror().is_synced() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("mirror never synced");
}

#[test]
fn test_exhausted_rank_refused_in_every_slot() {
    let (ctl, _events) = controller(1);
    ctl.add_hand_slot(HandKind::Player);
    ctl.add_hand_slot(HandKind::Dealer);

    assert!(ctl.place_card(Slot::Player(0), Rank::King));
    assert!(ctl.place_card(Slot::Player(1), Rank::King));
    assert!(ctl.place_card(Slot::Seen(0), Rank::King));
    assert!(ctl.place_card(Slot::Seen(1), Rank::King));
    assert_eq!(ctl.remaining().count(Rank::King), 0);

    for slot in [
        Slot::Dealer,
        Slot::DealerExtra(0),
        Slot::Player(2),
        Slot::Seen(2),
    ] {
        assert!(!ctl.place_card(slot, Rank::King), "{slot:?} accepted a fifth king");
    }
    let session = ctl.session();
    assert_eq!(session.dealer_upcard, None);
    assert_eq!(session.dealer_extra, vec![None]);
    assert_eq!(session.player_hand[2], None);
    assert_eq!(session.seen_cards.len(), 2);
}

#[test]
fn test_replacing_with_same_rank_is_allowed_when_exhausted() {
    let (ctl, _events) = controller(1);
    for i in 0..4 {
        assert!(ctl.place_card(Slot::Seen(i), Rank::Two));
    }
    assert!(ctl.place_card(Slot::Seen(3), Rank::Two));
    assert_eq!(ctl.session().seen_cards.len(), 4);
}

#[test]
fn test_replacing_a_card_frees_the_old_rank() {
    let (ctl, _events) = controller(1);
    assert!(ctl.place_card(Slot::Dealer, Rank::Ace));
    assert_eq!(ctl.remaining().count(Rank::Ace), 3);
    assert!(ctl.place_card(Slot::Dealer, Rank::Nine));
    assert_eq!(ctl.remaining().count(Rank::Ace), 4);
    assert_eq!(ctl.remaining().count(Rank::Nine), 3);
}

#[test]
fn test_missing_slot_is_refused() {
    let (ctl, _events) = controller(1);
    assert!(!ctl.place_card(Slot::Player(5), Rank::Four));
    assert!(!ctl.place_card(Slot::DealerExtra(0), Rank::Four));
    assert_eq!(ctl.remaining().count(Rank::Four), 4);
}

#[test]
fn test_base_slots_cannot_be_removed() {
    let (ctl, _events) = controller(1);
    ctl.place_card(Slot::Dealer, Rank::Five);
    ctl.place_card(Slot::Player(0), Rank::Five);
    assert!(!ctl.remove_card(Slot::Dealer));
    assert!(!ctl.remove_card(Slot::Player(0)));
    assert!(!ctl.remove_card(Slot::Player(1)));

    let extra = ctl.add_hand_slot(HandKind::Player);
    assert_eq!(extra, Slot::Player(2));
    ctl.place_card(extra, Rank::Five);
    assert!(ctl.remove_card(extra));
    assert_eq!(ctl.session().player_hand.len(), 2);
    assert_eq!(ctl.remaining().count(Rank::Five), 2);
}

#[test]
fn test_can_request_advice_needs_two_cards_and_upcard() {
    let (ctl, _events) = controller(1);
    assert!(!ctl.can_request_advice());
    ctl.place_card(Slot::Player(0), Rank::Ten);
    ctl.place_card(Slot::Player(1), Rank::Six);
    assert!(!ctl.can_request_advice());
    ctl.place_card(Slot::Dealer, Rank::Ten);
    assert!(ctl.can_request_advice());
}

#[tokio::test]
async fn test_request_advice_with_local_engine() {
    let (ctl, _events) = controller(1);
    ctl.place_card(Slot::Player(0), Rank::Ten);
    ctl.place_card(Slot::Player(1), Rank::Ten);
    ctl.place_card(Slot::Dealer, Rank::Six);

    let advice = ctl.request_advice().await.unwrap();
    assert_eq!(advice.recommended, crate::Move::Stand);
    assert!(advice.stand_ev > advice.hit_ev);

    let session = ctl.session();
    assert!(!session.busy);
    assert_eq!(session.last_advice, Some(advice));
}

#[tokio::test]
async fn test_incomplete_hand_has_no_side_effects() {
    let (ctl, _events) = controller(1);
    ctl.place_card(Slot::Player(0), Rank::Ten);
    let before = ctl.session();
    assert_eq!(ctl.request_advice().await, Err(AdvisorError::IncompleteHand));
    assert_eq!(ctl.session(), before);
    assert!(ctl.take_notices().is_empty());
}

#[tokio::test]
async fn test_advance_requires_advice() {
    let (ctl, _events) = controller(1);
    assert_eq!(ctl.advance_turn().await, Err(AdvisorError::NoAdvice));
}

#[tokio::test]
async fn test_reshuffle_rejects_bad_deck_count_before_reset() {
    let (ctl, _events) = controller(1);
    ctl.place_card(Slot::Dealer, Rank::Queen);
    for n in [0, crate::MAX_DECKS + 1] {
        assert_eq!(ctl.reshuffle(n).await, Err(AdvisorError::InvalidDeckCount(n)));
    }
    assert_eq!(ctl.session().dealer_upcard, Some(Rank::Queen));
    assert_eq!(ctl.mirror().num_decks(), 1);
}

#[tokio::test]
async fn test_full_turn_with_local_engine() {
    let config = AdvisorConfig::new(1, Duration::from_secs(5)).unwrap();
    let (ctl, _pump) = TurnController::with_local_engine(config, GameRules::default());

    ctl.reshuffle(1).await.unwrap();
    wait_until_synced(&ctl).await;

    ctl.place_card(Slot::Player(0), Rank::Ace);
    ctl.place_card(Slot::Player(1), Rank::Seven);
    ctl.place_card(Slot::Dealer, Rank::Nine);
    ctl.request_advice().await.unwrap();
    let before = ctl.mirror().generation();
    ctl.advance_turn().await.unwrap();

    assert_eq!(ctl.session().player_hand, vec![None, None]);
    for _ in 0..200 {
        if ctl.mirror().generation() > before {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let shoe = ctl.mirror().current();
    assert_eq!(shoe.total(), 49);
    assert_eq!(shoe.count(Rank::Ace), 3);
    assert_eq!(ctl.remaining(), shoe);
}

#[tokio::test]
async fn test_reshuffle_marks_mirror_pending() {
    let config = AdvisorConfig::new(1, Duration::from_secs(5)).unwrap();
    let (ctl, _pump) = TurnController::with_local_engine(config, GameRules::default());
    ctl.reshuffle(1).await.unwrap();
    wait_until_synced(&ctl).await;

    ctl.place_card(Slot::Seen(0), Rank::Three);
    ctl.reshuffle(3).await.unwrap();
    assert!(ctl.session().seen_cards.is_empty());
    wait_until_synced(&ctl).await;
    assert!(matches!(
        ctl.mirror().state(),
        MirrorState::Synced { num_decks: 3, .. }
    ));
    assert_eq!(ctl.remaining().count(Rank::Three), 12);
}

#[tokio::test]
async fn test_create_deck_failure_raises_notice() {
    let config = AdvisorConfig::default();
    let (engine, events) = LocalEngine::new(1, GameRules::default());
    drop(events);
    let ctl = TurnController::new(engine, MirrorHandle::new(1), config);
    ctl.place_card(Slot::Dealer, Rank::Two);

    let err = ctl.reshuffle(2).await.unwrap_err();
    assert_eq!(err, AdvisorError::Engine(EngineError::EventsClosed));
    // The local reset holds even though the call failed.
    assert_eq!(ctl.session().dealer_upcard, None);
    assert_eq!(ctl.mirror().num_decks(), 2);

    let notices = ctl.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].call, CallKind::CreateDeck);
    assert!(ctl.take_notices().is_empty());
}

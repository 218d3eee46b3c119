//! Turn lifecycle: the only place that mutates the [`TurnSession`] or calls
//! the engine.
//!
//! Card editing is synchronous and never blocked by an in-flight call; the
//! `busy` flag only gates re-entrant advise/advance calls. Every engine call
//! runs under the configured timeout and can be cancelled by a reshuffle.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use blackjack::{GameRules, Rank, ShoeComposition};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::availability;
use crate::config::validate_decks;
use crate::engine::{Engine, LocalEngine};
use crate::mirror::{MirrorHandle, ShoeMirror};
use crate::msg::{CreateDeckRequest, DecideRequest, NextTurnRequest};
use crate::state::{AdviceResult, HandKind, Slot, TurnSession};
use crate::{AdvisorConfig, AdvisorError, EngineError};

/// Which outbound call a [`Notice`] is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Advise,
    Advance,
    CreateDeck,
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallKind::Advise => f.write_str("Advice request"),
            CallKind::Advance => f.write_str("Next turn"),
            CallKind::CreateDeck => f.write_str("Reshuffle"),
        }
    }
}

/// User-visible report of a failed engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub call: CallKind,
    pub error: AdvisorError,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.call, self.error)
    }
}

struct Inner<E> {
    engine: E,
    mirror: MirrorHandle,
    config: AdvisorConfig,
    session: Mutex<TurnSession>,
    notices: Mutex<Vec<Notice>>,
    inflight: Mutex<Option<Arc<Notify>>>,
}

/// Cheap to clone; clones share the same session, mirror and engine.
pub struct TurnController<E> {
    inner: Arc<Inner<E>>,
}

impl<E> Clone for TurnController<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TurnController<LocalEngine> {
    /// Wire a controller to an in-process engine and start applying its
    /// composition events. Must be called inside a Tokio runtime.
    pub fn with_local_engine(config: AdvisorConfig, rules: GameRules) -> (Self, JoinHandle<()>) {
        let (engine, events) = LocalEngine::new(config.num_decks, rules);
        let mirror = MirrorHandle::new(config.num_decks);
        let pump = mirror.spawn_event_pump(events);
        (Self::new(engine, mirror, config), pump)
    }
}

impl<E: Engine> TurnController<E> {
    pub fn new(engine: E, mirror: MirrorHandle, config: AdvisorConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                engine,
                mirror,
                config,
                session: Mutex::new(TurnSession::new()),
                notices: Mutex::new(Vec::new()),
                inflight: Mutex::new(None),
            }),
        }
    }

    pub fn engine(&self) -> &E {
        &self.inner.engine
    }

    pub fn config(&self) -> AdvisorConfig {
        self.inner.config
    }

    pub fn session(&self) -> TurnSession {
        lock(&self.inner.session).clone()
    }

    pub fn mirror(&self) -> ShoeMirror {
        self.inner.mirror.snapshot()
    }

    pub fn remaining(&self) -> ShoeComposition {
        let session = lock(&self.inner.session);
        availability::remaining(&self.inner.mirror.current(), &session)
    }

    pub fn can_request_advice(&self) -> bool {
        let session = lock(&self.inner.session);
        !session.busy && session.is_complete()
    }

    pub fn is_busy(&self) -> bool {
        lock(&self.inner.session).busy
    }

    /// Drain failure notices raised since the last call.
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut *lock(&self.inner.notices))
    }

    /// Put `rank` into `slot` if a copy is still unaccounted for.
    ///
    /// Refusals are silent: the return value is `false` and nothing changes.
    /// Re-placing the rank a slot already holds is always allowed.
    pub fn place_card(&self, slot: Slot, rank: Rank) -> bool {
        let mut session = lock(&self.inner.session);
        if session.slot(slot) != Some(rank) {
            let shoe = self.inner.mirror.current();
            if !availability::is_available(&shoe, &session, rank) {
                log::debug!("Refused {rank} at {slot:?}: none left in the shoe");
                return false;
            }
        }
        let placed = session.set(slot, rank);
        if !placed {
            log::debug!("Refused {rank} at {slot:?}: no such slot");
        }
        placed
    }

    pub fn remove_card(&self, slot: Slot) -> bool {
        lock(&self.inner.session).remove(slot)
    }

    pub fn add_hand_slot(&self, hand: HandKind) -> Slot {
        lock(&self.inner.session).add_slot(hand)
    }

    /// Ask the engine whether to hit or stand on the current hand.
    pub async fn request_advice(&self) -> Result<AdviceResult, AdvisorError> {
        let (req, epoch) = {
            let mut session = lock(&self.inner.session);
            if session.busy {
                return Err(AdvisorError::Busy);
            }
            let dealer = match session.dealer_upcard {
                Some(dealer) if session.is_complete() => dealer,
                _ => return Err(AdvisorError::IncompleteHand),
            };
            session.busy = true;
            let req = DecideRequest {
                player: session.player_cards(),
                dealer,
                others: session.seen_cards.clone(),
            };
            (req, session.epoch)
        };
        log::info!(
            "Requesting advice: player {:?} vs dealer {}",
            req.player,
            req.dealer
        );

        let outcome = self.call(self.inner.engine.decide_hand(req)).await;

        let mut session = lock(&self.inner.session);
        if session.epoch != epoch {
            log::info!("Discarding advice for a turn that was already reset");
            return Err(AdvisorError::Cancelled);
        }
        session.busy = false;
        match outcome {
            Ok(res) => {
                let advice = AdviceResult::from_evs(res.hit_ev, res.stand_ev);
                log::info!(
                    "Advice: {} (hit {:.4}, stand {:.4})",
                    advice.recommended,
                    res.hit_ev,
                    res.stand_ev
                );
                session.last_advice = Some(advice.clone());
                Ok(advice)
            }
            Err(err) => {
                drop(session);
                Err(self.fail(CallKind::Advise, err))
            }
        }
    }

    /// Report the finished turn and start a new one. The shoe is left alone;
    /// the engine pushes its own composition update.
    pub async fn advance_turn(&self) -> Result<(), AdvisorError> {
        let (req, epoch) = {
            let mut session = lock(&self.inner.session);
            if session.busy {
                return Err(AdvisorError::Busy);
            }
            if session.last_advice.is_none() {
                return Err(AdvisorError::NoAdvice);
            }
            session.busy = true;
            let req = NextTurnRequest {
                player: session.player_cards(),
                dealer: session.dealer_cards(),
                others: session.seen_cards.clone(),
            };
            (req, session.epoch)
        };

        let outcome = self.call(self.inner.engine.advance_turn(req)).await;

        let mut session = lock(&self.inner.session);
        if session.epoch != epoch {
            log::info!("Discarding turn result for a turn that was already reset");
            return Err(AdvisorError::Cancelled);
        }
        match outcome {
            Ok(()) => {
                session.reset();
                log::info!("Advanced to turn {}", session.epoch);
                Ok(())
            }
            Err(err) => {
                session.busy = false;
                drop(session);
                Err(self.fail(CallKind::Advance, err))
            }
        }
    }

    /// Start over with a fresh shoe of `num_decks` decks.
    ///
    /// The table is cleared and the mirror falls back to its provisional
    /// estimate before the engine is called, so the reset holds whatever
    /// happens to the call.
    pub async fn reshuffle(&self, num_decks: u32) -> Result<(), AdvisorError> {
        validate_decks(num_decks)?;

        // Bump the epoch before cancelling so the interrupted call sees a stale turn.
        lock(&self.inner.session).reset();
        self.inner.mirror.mark_pending(num_decks);
        if let Some(cancel) = lock(&self.inner.inflight).take() {
            log::info!("Cancelling in-flight engine call");
            cancel.notify_one();
        }
        log::info!("Reshuffling with {num_decks} deck(s)");

        let outcome = self
            .call(self.inner.engine.create_deck(CreateDeckRequest { num_decks }))
            .await;
        outcome.map_err(|err| self.fail(CallKind::CreateDeck, err))
    }

    /// Run one engine call under the timeout, racing the cancellation token
    /// a reshuffle can trigger.
    async fn call<T>(
        &self,
        fut: impl Future<Output = Result<T, EngineError>>,
    ) -> Result<T, AdvisorError> {
        let cancel = Arc::new(Notify::new());
        *lock(&self.inner.inflight) = Some(Arc::clone(&cancel));

        let timeout = self.inner.config.call_timeout;
        let result = tokio::select! {
            res = tokio::time::timeout(timeout, fut) => match res {
                Ok(res) => res.map_err(AdvisorError::from),
                Err(_) => Err(AdvisorError::Timeout(timeout)),
            },
            _ = cancel.notified() => Err(AdvisorError::Cancelled),
        };

        let mut inflight = lock(&self.inner.inflight);
        if inflight.as_ref().is_some_and(|c| Arc::ptr_eq(c, &cancel)) {
            *inflight = None;
        }
        result
    }

    /// Record a failed call. Cancellation raises no notice.
    fn fail(&self, call: CallKind, error: AdvisorError) -> AdvisorError {
        if error == AdvisorError::Cancelled {
            log::info!("{call} cancelled");
            return error;
        }
        log::warn!("{call} failed: {error}");
        lock(&self.inner.notices).push(Notice {
            call,
            error: error.clone(),
        });
        error
    }
}

#[cfg(test)]
mod tests;

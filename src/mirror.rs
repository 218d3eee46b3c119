use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use blackjack::ShoeComposition;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::msg::CompositionUpdate;

/// What the mirror currently knows about the engine's shoe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorState {
    /// No composition received yet for this deck count; an even shoe is assumed
    Provisional { num_decks: u32 },
    /// Last composition pushed by the engine
    Synced {
        num_decks: u32,
        composition: ShoeComposition,
    },
}

/// Read-only copy of the engine's shoe. Every update replaces the whole
/// composition; nothing is merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoeMirror {
    state: MirrorState,
    generation: u64,
}

impl ShoeMirror {
    pub fn new(num_decks: u32) -> Self {
        Self {
            state: MirrorState::Provisional { num_decks },
            generation: 0,
        }
    }

    pub fn state(&self) -> MirrorState {
        self.state
    }

    pub fn num_decks(&self) -> u32 {
        match self.state {
            MirrorState::Provisional { num_decks } | MirrorState::Synced { num_decks, .. } => {
                num_decks
            }
        }
    }

    pub fn is_synced(&self) -> bool {
        matches!(self.state, MirrorState::Synced { .. })
    }

    /// Changes every time the held composition may have changed.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Latest pushed composition, or `4 × num_decks` per rank before the first one.
    pub fn current(&self) -> ShoeComposition {
        match self.state {
            MirrorState::Provisional { num_decks } => ShoeComposition::full(num_decks),
            MirrorState::Synced { composition, .. } => composition,
        }
    }

    /// Accepted as-is: the engine is trusted.
    pub fn apply_update(&mut self, composition: ShoeComposition) {
        self.state = MirrorState::Synced {
            num_decks: self.num_decks(),
            composition,
        };
        self.generation += 1;
    }

    /// Forget the held composition after a reshuffle until the engine reports the new shoe.
    pub fn mark_pending(&mut self, num_decks: u32) {
        self.state = MirrorState::Provisional { num_decks };
        self.generation += 1;
    }
}

/// Shared handle to the mirror held by the controller and the event pump.
#[derive(Debug, Clone)]
pub struct MirrorHandle {
    inner: Arc<Mutex<ShoeMirror>>,
}

impl MirrorHandle {
    pub fn new(num_decks: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ShoeMirror::new(num_decks))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ShoeMirror> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> ShoeMirror {
        self.lock().clone()
    }

    pub fn current(&self) -> ShoeComposition {
        self.lock().current()
    }

    pub fn apply_update(&self, composition: ShoeComposition) {
        self.lock().apply_update(composition);
    }

    pub fn mark_pending(&self, num_decks: u32) {
        self.lock().mark_pending(num_decks);
    }

    /// Apply engine events in arrival order until the sender goes away.
    pub fn spawn_event_pump(&self, mut events: UnboundedReceiver<CompositionUpdate>) -> JoinHandle<()> {
        let mirror = self.clone();
        tokio::spawn(async move {
            while let Some(update) = events.recv().await {
                log::debug!(
                    "Shoe updated: {} cards remaining",
                    update.counts_by_rank.total()
                );
                mirror.apply_update(update.counts_by_rank);
            }
            log::info!("Composition event channel closed");
        })
    }
}

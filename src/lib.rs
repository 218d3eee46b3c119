pub mod availability;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod mirror;
pub mod msg;
pub mod state;

pub use crate::config::{AdvisorConfig, MAX_DECKS};
pub use crate::controller::{CallKind, Notice, TurnController};
pub use crate::engine::{Engine, LocalEngine};
pub use crate::error::{AdvisorError, EngineError};
pub use crate::mirror::{MirrorHandle, MirrorState, ShoeMirror};
pub use crate::state::{AdviceResult, HandKind, Move, Slot, TurnSession};

pub use blackjack::{Rank, ShoeComposition};

use std::time::Duration;

use thiserror::Error;

/// Failures reported by the engine side of a call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Engine rejected the request: {0}")]
    Rejected(String),
    #[error("Composition event channel is closed")]
    EventsClosed,
    #[error("Engine worker failed: {0}")]
    Worker(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdvisorError {
    #[error("Another engine call is already in flight")]
    Busy,
    #[error("You need at least two cards and a dealer card to calculate")]
    IncompleteHand,
    #[error("No advice has been given for this turn yet")]
    NoAdvice,
    #[error("Invalid number of decks: {0} (expected 1-{})", crate::MAX_DECKS)]
    InvalidDeckCount(u32),
    #[error("Engine call timed out after {0:?}")]
    Timeout(Duration),
    #[error("Engine call was cancelled")]
    Cancelled,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

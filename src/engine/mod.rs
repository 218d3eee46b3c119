//! Boundary to the decision/shoe engine.
//!
//! The controller only ever talks to an [`Engine`]; composition changes come
//! back separately as [`CompositionUpdate`](crate::msg::CompositionUpdate)
//! events on a channel.

use std::future::Future;

use crate::msg::{CreateDeckRequest, DecideRequest, DecideResponse, NextTurnRequest};
use crate::EngineError;

mod local;

pub use local::LocalEngine;

pub trait Engine: Send + Sync + 'static {
    /// Start a fresh shoe. The new composition arrives later as an event.
    fn create_deck(
        &self,
        req: CreateDeckRequest,
    ) -> impl Future<Output = Result<(), EngineError>> + Send;

    fn decide_hand(
        &self,
        req: DecideRequest,
    ) -> impl Future<Output = Result<DecideResponse, EngineError>> + Send;

    /// Account for a finished turn's cards. Acknowledgement only.
    fn advance_turn(
        &self,
        req: NextTurnRequest,
    ) -> impl Future<Output = Result<(), EngineError>> + Send;
}

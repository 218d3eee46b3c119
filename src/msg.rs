//! Messages exchanged with the decision/shoe engine.
//!
//! Field names follow the engine's camelCase JSON convention.

use blackjack::{Rank, ShoeComposition};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeckRequest {
    pub num_decks: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DecideRequest {
    pub player: Vec<Rank>,
    pub dealer: Rank,
    pub others: Vec<Rank>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DecideResponse {
    pub hit_ev: f64,
    pub stand_ev: f64,
}

/// Final state of a finished turn; every card listed has left the shoe.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NextTurnRequest {
    pub player: Vec<Rank>,
    pub dealer: Vec<Rank>,
    pub others: Vec<Rank>,
}

/// Pushed by the engine whenever its shoe changes.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositionUpdate {
    #[serde(rename = "counts")]
    pub counts_by_rank: ShoeComposition,
}

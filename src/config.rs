use std::time::Duration;

use crate::AdvisorError;

/// Largest shoe the deck picker offers.
pub const MAX_DECKS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvisorConfig {
    /// Decks in the shoe when the table is entered
    pub num_decks: u32,
    /// Upper bound on any single engine call
    pub call_timeout: Duration,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            num_decks: 1,
            call_timeout: Duration::from_secs(10),
        }
    }
}

impl AdvisorConfig {
    pub fn new(num_decks: u32, call_timeout: Duration) -> Result<Self, AdvisorError> {
        validate_decks(num_decks)?;
        Ok(Self {
            num_decks,
            call_timeout,
        })
    }
}

pub(crate) fn validate_decks(num_decks: u32) -> Result<(), AdvisorError> {
    if num_decks == 0 || num_decks > MAX_DECKS {
        return Err(AdvisorError::InvalidDeckCount(num_decks));
    }
    Ok(())
}

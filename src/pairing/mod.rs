//! Swiss pairing engine.
//!
//! Round 1 is seeded by rating ([`pair_first_round`]); every later round is
//! paired from player histories with the Dutch-system walk ([`pair_round`]):
//! score groups top-down, down-floats between groups, color preference
//! resolution, rematch avoidance, and at most one bye.

mod color;
mod dutch;
mod first_round;

pub use color::{color_penalty, color_preference, pair_penalty, resolve_colors};
pub use dutch::pair_round;
pub use first_round::pair_first_round;

use thiserror::Error;

use crate::models::{MatchDraft, ParticipantId};

/// Errors that can occur while pairing a round.
#[derive(Debug, Error)]
pub enum PairingError {
    #[error("need at least 2 active participants, found {found}")]
    InsufficientParticipants { found: usize },

    #[error("no legal pairing exists; {} players left over", residual.len())]
    PairingInfeasible { residual: Vec<ParticipantId> },

    #[error("all {rounds} planned rounds are already paired")]
    TournamentExhausted { rounds: u32 },
}

/// A paired round ready for insertion.
#[derive(Debug, Clone)]
pub struct PairingResult {
    /// Ordered boards; the bye board, if any, comes last
    pub drafts: Vec<MatchDraft>,

    /// Who sits out this round, if anyone
    pub bye: Option<ParticipantId>,
}

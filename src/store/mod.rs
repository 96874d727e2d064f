//! Tournament persistence.
//!
//! The engine itself is pure; everything it reads and everything it writes
//! goes through the [`TournamentStore`] contract. Two implementations ship:
//! - [`JsonlStore`]: one directory per tournament under a data dir, entities
//!   as JSON Lines files
//! - [`MemoryStore`]: mutex-guarded maps, used by tests and demos

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Match, MatchDraft, MatchId, Participant, Round, Tournament, TournamentId};

mod jsonl;
mod memory;

pub use jsonl::JsonlStore;
pub use memory::MemoryStore;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("round {round} not found in tournament {tournament}")]
    RoundNotFound {
        tournament: TournamentId,
        round: u32,
    },

    #[error("match not found: {0}")]
    MatchNotFound(MatchId),
}

/// Persistence contract consumed by the service layer.
///
/// Reads return owned snapshots; the engine never holds store references
/// across calls. `insert_pairings` is a single batch so a round's boards
/// appear together or not at all.
pub trait TournamentStore {
    /// Load a tournament record.
    fn load_tournament(&self, id: &TournamentId) -> Result<Tournament, StoreError>;

    /// Load the roster, excluding inactive participants.
    fn load_active_participants(
        &self,
        id: &TournamentId,
    ) -> Result<Vec<Participant>, StoreError>;

    /// Load rounds ordered by number, excluding `up_to` and later when given.
    fn load_rounds(
        &self,
        id: &TournamentId,
        up_to: Option<u32>,
    ) -> Result<Vec<Round>, StoreError>;

    /// Load the matches of the given rounds, ordered by round then board.
    fn load_matches_for_rounds(
        &self,
        id: &TournamentId,
        rounds: &[u32],
    ) -> Result<Vec<Match>, StoreError>;

    /// Load whatever matches already exist for one round (idempotence check).
    fn load_existing_matches(
        &self,
        id: &TournamentId,
        round_no: u32,
    ) -> Result<Vec<Match>, StoreError>;

    /// Insert a paired round as one batch, assigning IDs and timestamps.
    fn insert_pairings(
        &self,
        id: &TournamentId,
        round_no: u32,
        drafts: &[MatchDraft],
    ) -> Result<Vec<Match>, StoreError>;

    /// Flip a round to `paired` with the given timestamp.
    fn mark_round_paired(
        &self,
        id: &TournamentId,
        round_no: u32,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

//! Round orchestration.
//!
//! The seam between the store and the pure engine: load the snapshot, run
//! the pairing or ranking, write the outcome back. Store errors pass through
//! untouched apart from the context logged here.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{info, warn};

use crate::history::{build_history, HistoryError};
use crate::models::{Match, TournamentId};
use crate::pairing::{pair_first_round, pair_round, PairingError};
use crate::store::{StoreError, TournamentStore};
use crate::tiebreak::{self, parse_keys, StandingsRow};

/// Errors surfaced by the orchestration layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid history: {0}")]
    History(#[from] HistoryError),

    #[error("pairing failed: {0}")]
    Pairing(#[from] PairingError),

    #[error("round {round} already has pairings")]
    RoundAlreadyPaired { round: u32 },
}

/// Pair the next round of a tournament and persist it.
///
/// The next round number is one past the last paired round. Round 1 takes
/// the rating-seeded path with `seed` driving its color draw; later rounds
/// run the Dutch walk over the history of every earlier round. The drafts
/// are inserted as one batch, then the round is stamped `paired`.
pub fn generate_next_round<S: TournamentStore>(
    store: &S,
    tournament_id: &TournamentId,
    seed: u64,
) -> Result<Vec<Match>, ServiceError> {
    let tournament = store.load_tournament(tournament_id)?;
    let rounds = store.load_rounds(tournament_id, None)?;
    let next_round = rounds.iter().map(|r| r.number).max().unwrap_or(0) + 1;

    if next_round > tournament.settings.rounds {
        return Err(PairingError::TournamentExhausted {
            rounds: tournament.settings.rounds,
        }
        .into());
    }
    if !store
        .load_existing_matches(tournament_id, next_round)?
        .is_empty()
    {
        return Err(ServiceError::RoundAlreadyPaired { round: next_round });
    }
    for round in &rounds {
        if !round.is_completed() {
            warn!(
                tournament = %tournament_id,
                round = round.number,
                "pairing while an earlier round still has open results"
            );
        }
    }

    let participants = store.load_active_participants(tournament_id)?;

    let result = if next_round == 1 {
        let mut rng = StdRng::seed_from_u64(seed);
        pair_first_round(&participants, tournament.settings.bye_points, &mut rng)?
    } else {
        let prior: Vec<u32> = rounds.iter().map(|r| r.number).collect();
        let matches = store.load_matches_for_rounds(tournament_id, &prior)?;
        let history = build_history(&participants, &matches)?;
        pair_round(&participants, &history, &tournament.settings)?
    };

    let inserted = store.insert_pairings(tournament_id, next_round, &result.drafts)?;
    store.mark_round_paired(tournament_id, next_round, Utc::now())?;
    info!(
        tournament = %tournament_id,
        round = next_round,
        boards = inserted.len(),
        bye = result.bye,
        "round paired"
    );
    Ok(inserted)
}

/// Rank the roster over every completed round, using the tournament's
/// configured tiebreak keys.
pub fn compute_standings<S: TournamentStore>(
    store: &S,
    tournament_id: &TournamentId,
) -> Result<Vec<StandingsRow>, ServiceError> {
    let tournament = store.load_tournament(tournament_id)?;
    let participants = store.load_active_participants(tournament_id)?;
    let rounds = store.load_rounds(tournament_id, None)?;
    let completed: Vec<u32> = rounds
        .iter()
        .filter(|r| r.is_completed())
        .map(|r| r.number)
        .collect();
    let matches = store.load_matches_for_rounds(tournament_id, &completed)?;
    let history = build_history(&participants, &matches)?;
    let keys = parse_keys(&tournament.settings.tiebreakers);
    Ok(tiebreak::standings(&participants, &history, &keys))
}

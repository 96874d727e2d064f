//! In-memory store.
//!
//! Backs tests and demos with the same contract as the JSONL store. All
//! state sits behind one mutex; reads hand out clones.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::models::{
    Match, MatchDraft, MatchId, MatchResult, Participant, Round, RoundStatus, Tournament,
    TournamentId,
};

use super::{StoreError, TournamentStore};

#[derive(Debug, Default)]
struct TournamentData {
    tournament: Option<Tournament>,
    participants: Vec<Participant>,
    rounds: Vec<Round>,
    matches: Vec<Match>,
}

/// Mutex-guarded in-memory tournament store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, TournamentData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_data<R>(&self, f: impl FnOnce(&mut HashMap<String, TournamentData>) -> R) -> R {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    /// Create (or overwrite) a tournament record.
    pub fn create_tournament(&self, tournament: &Tournament) {
        self.with_data(|data| {
            data.entry(tournament.id.as_str().to_string())
                .or_default()
                .tournament = Some(tournament.clone());
        });
    }

    /// Append participants to the roster.
    pub fn add_participants(&self, id: &TournamentId, participants: &[Participant]) {
        self.with_data(|data| {
            data.entry(id.as_str().to_string())
                .or_default()
                .participants
                .extend_from_slice(participants);
        });
    }

    /// Record the result of a stored match.
    pub fn record_result(
        &self,
        id: &TournamentId,
        match_id: &MatchId,
        result: MatchResult,
        score_white: f64,
        score_black: f64,
    ) -> Result<(), StoreError> {
        self.with_data(|data| {
            let row = data
                .get_mut(id.as_str())
                .and_then(|d| d.matches.iter_mut().find(|m| &m.id == match_id))
                .ok_or_else(|| StoreError::MatchNotFound(match_id.clone()))?;
            row.result = result;
            row.score_white = score_white;
            row.score_black = score_black;
            Ok(())
        })
    }

    /// Flip a round to `completed` once all its results are in.
    pub fn mark_round_completed(
        &self,
        id: &TournamentId,
        round_no: u32,
    ) -> Result<(), StoreError> {
        self.with_data(|data| {
            let round = data
                .get_mut(id.as_str())
                .and_then(|d| d.rounds.iter_mut().find(|r| r.number == round_no))
                .ok_or_else(|| StoreError::RoundNotFound {
                    tournament: id.clone(),
                    round: round_no,
                })?;
            round.status = RoundStatus::Completed;
            Ok(())
        })
    }
}

impl TournamentStore for MemoryStore {
    fn load_tournament(&self, id: &TournamentId) -> Result<Tournament, StoreError> {
        self.with_data(|data| {
            data.get(id.as_str())
                .and_then(|d| d.tournament.clone())
                .ok_or_else(|| StoreError::TournamentNotFound(id.clone()))
        })
    }

    fn load_active_participants(
        &self,
        id: &TournamentId,
    ) -> Result<Vec<Participant>, StoreError> {
        self.with_data(|data| {
            Ok(data
                .get(id.as_str())
                .map(|d| d.participants.iter().filter(|p| p.active).cloned().collect())
                .unwrap_or_default())
        })
    }

    fn load_rounds(
        &self,
        id: &TournamentId,
        up_to: Option<u32>,
    ) -> Result<Vec<Round>, StoreError> {
        self.with_data(|data| {
            let mut rounds: Vec<Round> = data
                .get(id.as_str())
                .map(|d| d.rounds.clone())
                .unwrap_or_default();
            if let Some(limit) = up_to {
                rounds.retain(|r| r.number < limit);
            }
            rounds.sort_by_key(|r| r.number);
            Ok(rounds)
        })
    }

    fn load_matches_for_rounds(
        &self,
        id: &TournamentId,
        rounds: &[u32],
    ) -> Result<Vec<Match>, StoreError> {
        self.with_data(|data| {
            let mut matches: Vec<Match> = data
                .get(id.as_str())
                .map(|d| {
                    d.matches
                        .iter()
                        .filter(|m| rounds.contains(&m.round_no))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            matches.sort_by_key(|m| (m.round_no, m.board_no));
            Ok(matches)
        })
    }

    fn load_existing_matches(
        &self,
        id: &TournamentId,
        round_no: u32,
    ) -> Result<Vec<Match>, StoreError> {
        self.load_matches_for_rounds(id, &[round_no])
    }

    fn insert_pairings(
        &self,
        id: &TournamentId,
        round_no: u32,
        drafts: &[MatchDraft],
    ) -> Result<Vec<Match>, StoreError> {
        let now = Utc::now();
        let rows: Vec<Match> = drafts
            .iter()
            .map(|d| Match {
                id: MatchId::for_board(id, round_no, d.board_no, d.white_id),
                round_no,
                board_no: d.board_no,
                white_id: d.white_id,
                black_id: d.black_id,
                result: d.result,
                score_white: d.score_white,
                score_black: d.score_black,
                source_tag: d.source_tag.clone(),
                created_at: now,
            })
            .collect();
        self.with_data(|data| {
            data.entry(id.as_str().to_string())
                .or_default()
                .matches
                .extend(rows.iter().cloned());
        });
        Ok(rows)
    }

    fn mark_round_paired(
        &self,
        id: &TournamentId,
        round_no: u32,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.with_data(|data| {
            let entry = data.entry(id.as_str().to_string()).or_default();
            match entry.rounds.iter_mut().find(|r| r.number == round_no) {
                Some(round) => {
                    round.status = RoundStatus::Paired;
                    round.paired_at = Some(at);
                }
                None => {
                    let mut round = Round::new(round_no);
                    round.status = RoundStatus::Paired;
                    round.paired_at = Some(at);
                    entry.rounds.push(round);
                    entry.rounds.sort_by_key(|r| r.number);
                }
            }
            Ok(())
        })
    }
}

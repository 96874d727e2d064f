//! JSONL (JSON Lines) store.
//!
//! One directory per tournament under the data dir:
//! - `tournament.json` — the tournament record
//! - `participants.jsonl`, `rounds.jsonl`, `matches.jsonl` — one entity per
//!   line
//!
//! Lines that fail to parse are skipped with a warning so one hand-edited
//! row never takes the whole file down.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::models::{
    Match, MatchDraft, MatchId, MatchResult, Participant, Round, RoundStatus, Tournament,
    TournamentId,
};

use super::{StoreError, TournamentStore};

/// Filesystem-backed tournament store.
#[derive(Debug, Clone)]
pub struct JsonlStore {
    data_dir: PathBuf,
}

impl JsonlStore {
    /// Create a store rooted at the given data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn tournament_dir(&self, id: &TournamentId) -> PathBuf {
        self.data_dir.join(id.as_str())
    }

    fn tournament_path(&self, id: &TournamentId) -> PathBuf {
        self.tournament_dir(id).join("tournament.json")
    }

    fn participants_path(&self, id: &TournamentId) -> PathBuf {
        self.tournament_dir(id).join("participants.jsonl")
    }

    fn rounds_path(&self, id: &TournamentId) -> PathBuf {
        self.tournament_dir(id).join("rounds.jsonl")
    }

    fn matches_path(&self, id: &TournamentId) -> PathBuf {
        self.tournament_dir(id).join("matches.jsonl")
    }

    fn ensure_dir(path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let mut entities = Vec::new();
        let mut line_num = 0;

        for line in reader.lines() {
            line_num += 1;
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(entity) => entities.push(entity),
                Err(e) => {
                    warn!("failed to parse line {} in {:?}: {}", line_num, path, e);
                }
            }
        }

        debug!("read {} entities from {:?}", entities.len(), path);
        Ok(entities)
    }

    fn write_jsonl<T: Serialize>(path: &Path, entities: &[T]) -> Result<usize, StoreError> {
        Self::ensure_dir(path)?;

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let mut count = 0;
        for entity in entities {
            let json = serde_json::to_string(entity)?;
            writeln!(writer, "{}", json)?;
            count += 1;
        }
        writer.flush()?;

        Ok(count)
    }

    fn append_jsonl<T: Serialize>(path: &Path, entities: &[T]) -> Result<usize, StoreError> {
        if entities.is_empty() {
            return Ok(0);
        }
        Self::ensure_dir(path)?;

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        let mut count = 0;
        for entity in entities {
            let json = serde_json::to_string(entity)?;
            writeln!(writer, "{}", json)?;
            count += 1;
        }
        writer.flush()?;

        Ok(count)
    }

    /// Create (or overwrite) a tournament record.
    pub fn create_tournament(&self, tournament: &Tournament) -> Result<(), StoreError> {
        let path = self.tournament_path(&tournament.id);
        Self::ensure_dir(&path)?;
        let json = serde_json::to_string_pretty(tournament)?;
        fs::write(&path, json)?;
        info!(tournament = %tournament.id, name = %tournament.name, "created tournament");
        Ok(())
    }

    /// Append participants to the roster.
    pub fn add_participants(
        &self,
        id: &TournamentId,
        participants: &[Participant],
    ) -> Result<usize, StoreError> {
        Self::append_jsonl(&self.participants_path(id), participants)
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
        let path = self.matches_path(id);
        let mut matches: Vec<Match> = Self::read_jsonl(&path)?;
        let row = matches
            .iter_mut()
            .find(|m| &m.id == match_id)
            .ok_or_else(|| StoreError::MatchNotFound(match_id.clone()))?;
        row.result = result;
        row.score_white = score_white;
        row.score_black = score_black;
        Self::write_jsonl(&path, &matches)?;
        Ok(())
    }

    /// Flip a round to `completed` once all its results are in.
    pub fn mark_round_completed(
        &self,
        id: &TournamentId,
        round_no: u32,
    ) -> Result<(), StoreError> {
        let path = self.rounds_path(id);
        let mut rounds: Vec<Round> = Self::read_jsonl(&path)?;
        let round = rounds
            .iter_mut()
            .find(|r| r.number == round_no)
            .ok_or_else(|| StoreError::RoundNotFound {
                tournament: id.clone(),
                round: round_no,
            })?;
        round.status = RoundStatus::Completed;
        Self::write_jsonl(&path, &rounds)?;
        Ok(())
    }

    fn draft_to_match(
        id: &TournamentId,
        round_no: u32,
        draft: &MatchDraft,
        now: DateTime<Utc>,
    ) -> Match {
        Match {
            id: MatchId::for_board(id, round_no, draft.board_no, draft.white_id),
            round_no,
            board_no: draft.board_no,
            white_id: draft.white_id,
            black_id: draft.black_id,
            result: draft.result,
            score_white: draft.score_white,
            score_black: draft.score_black,
            source_tag: draft.source_tag.clone(),
            created_at: now,
        }
    }
}

impl TournamentStore for JsonlStore {
    fn load_tournament(&self, id: &TournamentId) -> Result<Tournament, StoreError> {
        let path = self.tournament_path(id);
        if !path.exists() {
            return Err(StoreError::TournamentNotFound(id.clone()));
        }
        let contents = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn load_active_participants(
        &self,
        id: &TournamentId,
    ) -> Result<Vec<Participant>, StoreError> {
        let all: Vec<Participant> = Self::read_jsonl(&self.participants_path(id))?;
        Ok(all.into_iter().filter(|p| p.active).collect())
    }

    fn load_rounds(
        &self,
        id: &TournamentId,
        up_to: Option<u32>,
    ) -> Result<Vec<Round>, StoreError> {
        let mut rounds: Vec<Round> = Self::read_jsonl(&self.rounds_path(id))?;
        if let Some(limit) = up_to {
            rounds.retain(|r| r.number < limit);
        }
        rounds.sort_by_key(|r| r.number);
        Ok(rounds)
    }

    fn load_matches_for_rounds(
        &self,
        id: &TournamentId,
        rounds: &[u32],
    ) -> Result<Vec<Match>, StoreError> {
        let mut matches: Vec<Match> = Self::read_jsonl(&self.matches_path(id))?;
        matches.retain(|m| rounds.contains(&m.round_no));
        matches.sort_by_key(|m| (m.round_no, m.board_no));
        Ok(matches)
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
            .map(|d| Self::draft_to_match(id, round_no, d, now))
            .collect();
        let count = Self::append_jsonl(&self.matches_path(id), &rows)?;
        info!(tournament = %id, round = round_no, boards = count, "inserted pairings");
        Ok(rows)
    }

    fn mark_round_paired(
        &self,
        id: &TournamentId,
        round_no: u32,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let path = self.rounds_path(id);
        let mut rounds: Vec<Round> = Self::read_jsonl(&path)?;
        match rounds.iter_mut().find(|r| r.number == round_no) {
            Some(round) => {
                round.status = RoundStatus::Paired;
                round.paired_at = Some(at);
            }
            None => {
                let mut round = Round::new(round_no);
                round.status = RoundStatus::Paired;
                round.paired_at = Some(at);
                rounds.push(round);
                rounds.sort_by_key(|r| r.number);
            }
        }
        Self::write_jsonl(&path, &rounds)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, JsonlStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonlStore::new(dir.path());
        (dir, store)
    }

    fn seeded(store: &JsonlStore) -> Tournament {
        let tournament = Tournament::new("Club Open 2026");
        store.create_tournament(&tournament).unwrap();
        store
            .add_participants(
                &tournament.id,
                &[
                    Participant::new(1, "Anna").with_rating(1800),
                    Participant::new(2, "Boris").with_rating(1600),
                ],
            )
            .unwrap();
        tournament
    }

    #[test]
    fn test_load_tournament_round_trip() {
        let (_dir, store) = store();
        let tournament = seeded(&store);
        let loaded = store.load_tournament(&tournament.id).unwrap();
        assert_eq!(loaded.id, tournament.id);
        assert_eq!(loaded.name, "Club Open 2026");
    }

    #[test]
    fn test_load_missing_tournament() {
        let (_dir, store) = store();
        let err = store
            .load_tournament(&TournamentId::from_name("no such event"))
            .unwrap_err();
        assert!(matches!(err, StoreError::TournamentNotFound(_)));
    }

    #[test]
    fn test_active_participants_filters_withdrawn() {
        let (_dir, store) = store();
        let tournament = seeded(&store);
        let mut withdrawn = Participant::new(3, "Carl");
        withdrawn.withdraw();
        store
            .add_participants(&tournament.id, &[withdrawn])
            .unwrap();

        let roster = store.load_active_participants(&tournament.id).unwrap();
        let ids: Vec<_> = roster.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_insert_pairings_assigns_ids_and_reads_back() {
        let (_dir, store) = store();
        let tournament = seeded(&store);
        let drafts = vec![MatchDraft::board(1, 1, 2)];

        let inserted = store.insert_pairings(&tournament.id, 1, &drafts).unwrap();
        assert_eq!(inserted.len(), 1);
        assert!(!inserted[0].id.as_str().is_empty());

        let existing = store.load_existing_matches(&tournament.id, 1).unwrap();
        assert_eq!(existing.len(), 1);
        assert_eq!(existing[0].white_id, 1);
        assert_eq!(existing[0].black_id, Some(2));
    }

    #[test]
    fn test_match_ids_are_deterministic() {
        let (_dir, store) = store();
        let tournament = seeded(&store);
        let drafts = vec![MatchDraft::board(1, 1, 2)];
        let a = store.insert_pairings(&tournament.id, 1, &drafts).unwrap();
        let b = store.insert_pairings(&tournament.id, 1, &drafts).unwrap();
        assert_eq!(a[0].id, b[0].id);
    }

    #[test]
    fn test_mark_round_paired_upserts() {
        let (_dir, store) = store();
        let tournament = seeded(&store);
        let at = Utc::now();
        store.mark_round_paired(&tournament.id, 1, at).unwrap();

        let rounds = store.load_rounds(&tournament.id, None).unwrap();
        assert_eq!(rounds.len(), 1);
        assert_eq!(rounds[0].status, RoundStatus::Paired);
        assert!(rounds[0].paired_at.is_some());
    }

    #[test]
    fn test_load_rounds_excludes_limit() {
        let (_dir, store) = store();
        let tournament = seeded(&store);
        for n in 1..=3 {
            store
                .mark_round_paired(&tournament.id, n, Utc::now())
                .unwrap();
        }
        let rounds = store.load_rounds(&tournament.id, Some(3)).unwrap();
        let numbers: Vec<_> = rounds.iter().map(|r| r.number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn test_record_result_and_complete_round() {
        let (_dir, store) = store();
        let tournament = seeded(&store);
        let inserted = store
            .insert_pairings(&tournament.id, 1, &[MatchDraft::board(1, 1, 2)])
            .unwrap();
        store.mark_round_paired(&tournament.id, 1, Utc::now()).unwrap();

        store
            .record_result(
                &tournament.id,
                &inserted[0].id,
                MatchResult::WhiteWins,
                1.0,
                0.0,
            )
            .unwrap();
        store.mark_round_completed(&tournament.id, 1).unwrap();

        let matches = store.load_matches_for_rounds(&tournament.id, &[1]).unwrap();
        assert_eq!(matches[0].result, MatchResult::WhiteWins);
        assert_eq!(matches[0].score_white, 1.0);

        let rounds = store.load_rounds(&tournament.id, None).unwrap();
        assert_eq!(rounds[0].status, RoundStatus::Completed);
    }

    #[test]
    fn test_record_result_unknown_match() {
        let (_dir, store) = store();
        let tournament = seeded(&store);
        let err = store
            .record_result(
                &tournament.id,
                &MatchId::for_board(&tournament.id, 9, 9, 99),
                MatchResult::Draw,
                0.5,
                0.5,
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::MatchNotFound(_)));
    }

    #[test]
    fn test_bad_lines_are_skipped() {
        let (_dir, store) = store();
        let tournament = seeded(&store);
        let path = store.participants_path(&tournament.id);
        let mut contents = fs::read_to_string(&path).unwrap();
        contents.push_str("not-valid-json\n");
        fs::write(&path, contents).unwrap();

        let roster = store.load_active_participants(&tournament.id).unwrap();
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn test_matches_sorted_by_round_and_board() {
        let (_dir, store) = store();
        let tournament = seeded(&store);
        store
            .insert_pairings(&tournament.id, 2, &[MatchDraft::board(1, 1, 2)])
            .unwrap();
        store
            .insert_pairings(
                &tournament.id,
                1,
                &[MatchDraft::board(2, 1, 2), MatchDraft::board(1, 2, 1)],
            )
            .unwrap();

        let matches = store
            .load_matches_for_rounds(&tournament.id, &[1, 2])
            .unwrap();
        let order: Vec<_> = matches.iter().map(|m| (m.round_no, m.board_no)).collect();
        assert_eq!(order, vec![(1, 1), (1, 2), (2, 1)]);
    }
}

//! Player history materialization.
//!
//! Turns raw match rows into per-participant histories:
//! - Cumulative and adjusted scores
//! - Per-round opponent, color, outcome, and points
//! - Virtual-opponent scores for bye rounds (FIDE formula)
//!
//! Construction is pure and idempotent: the same roster and match set always
//! produce the same index. Pairing and tiebreak code consume the result by
//! shared borrow and never mutate it.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::{info, warn};

use crate::models::{Color, Match, MatchResult, Outcome, Participant, ParticipantId};

/// Errors raised while building histories.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("participant {participant} appears twice in round {round}")]
    DuplicateParticipant {
        round: u32,
        participant: ParticipantId,
    },
}

/// One round from one player's point of view.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRoundRecord {
    /// Round number
    pub round_no: u32,

    /// Opponent; `None` for a bye
    pub opponent_id: Option<ParticipantId>,

    /// Color played; `None` for a bye
    pub color: Option<Color>,

    /// Outcome label for this side
    pub outcome: Outcome,

    /// Points actually scored, taken verbatim from the match row
    pub points: f64,

    /// FIDE virtual-opponent score; set on bye records by the second pass
    pub virtual_opponent_score: Option<f64>,
}

/// Everything the engine knows about one participant's past rounds.
#[derive(Debug, Clone, Default)]
pub struct PlayerHistory {
    /// Participant this history belongs to
    pub participant_id: ParticipantId,

    /// Cumulative score
    pub score: f64,

    /// Score as counted when this player is someone else's opponent:
    /// full-point byes and forfeits contribute 0.5 each
    pub adjusted_score: f64,

    /// Rounds played with white
    pub white_count: u32,

    /// Rounds played with black
    pub black_count: u32,

    /// Color of the most recent round with a color
    pub last_color: Option<Color>,

    /// Whether a bye has already been received
    pub had_bye: bool,

    /// Every opponent faced so far
    pub opponents: HashSet<ParticipantId>,

    /// Records in ascending round order
    pub rounds: Vec<PlayerRoundRecord>,
}

impl PlayerHistory {
    fn empty(participant_id: ParticipantId) -> Self {
        Self {
            participant_id,
            ..Self::default()
        }
    }

    /// Signed white-minus-black color balance.
    pub fn color_diff(&self) -> i32 {
        self.white_count as i32 - self.black_count as i32
    }

    /// The color of the last two rounds, when both were played with the
    /// same one. A bye in either of the two slots yields `None`.
    pub fn last_two_same_color(&self) -> Option<Color> {
        let n = self.rounds.len();
        if n < 2 {
            return None;
        }
        match (self.rounds[n - 2].color, self.rounds[n - 1].color) {
            (Some(a), Some(b)) if a == b => Some(a),
            _ => None,
        }
    }

    /// Whether these two players have already met.
    pub fn has_played(&self, opponent: ParticipantId) -> bool {
        self.opponents.contains(&opponent)
    }

    /// Cumulative score from rounds strictly before the given one.
    pub fn score_before_round(&self, round_no: u32) -> f64 {
        self.rounds
            .iter()
            .filter(|r| r.round_no < round_no)
            .map(|r| r.points)
            .sum()
    }

    /// Number of rounds recorded.
    pub fn rounds_played(&self) -> usize {
        self.rounds.len()
    }
}

/// Dense participant-id → history mapping over a roster.
pub type HistoryIndex = HashMap<ParticipantId, PlayerHistory>;

/// Contribution of one record to the adjusted score.
///
/// Forfeits of either direction count 0.5; a full-point bye counts 0.5; a
/// reduced bye counts its actual points.
fn adjusted_contribution(outcome: Outcome, points: f64) -> f64 {
    match outcome {
        Outcome::ForfeitWin | Outcome::ForfeitLoss => 0.5,
        Outcome::Bye => {
            if points >= 1.0 {
                0.5
            } else {
                points
            }
        }
        _ => points,
    }
}

/// Build the history index for a roster from completed match rows.
///
/// Matches are processed in ascending (round, board) order. Rows referencing
/// participants outside the roster are skipped with a warning; a roster
/// participant appearing twice in one round aborts with
/// [`HistoryError::DuplicateParticipant`]. The second pass fills in
/// virtual-opponent scores for bye records.
pub fn build_history(
    participants: &[Participant],
    matches: &[Match],
) -> Result<HistoryIndex, HistoryError> {
    let mut index: HistoryIndex = participants
        .iter()
        .map(|p| (p.id, PlayerHistory::empty(p.id)))
        .collect();

    let mut ordered: Vec<&Match> = matches.iter().collect();
    ordered.sort_by_key(|m| (m.round_no, m.board_no));

    let mut seen_per_round: HashMap<u32, HashSet<ParticipantId>> = HashMap::new();

    for m in ordered {
        if !index.contains_key(&m.white_id) {
            warn!(
                round = m.round_no,
                participant = m.white_id,
                "skipping match row for participant not in roster"
            );
            continue;
        }
        if let Some(black) = m.black_id {
            if !index.contains_key(&black) {
                warn!(
                    round = m.round_no,
                    participant = black,
                    "skipping match row for participant not in roster"
                );
                continue;
            }
        }

        let seen = seen_per_round.entry(m.round_no).or_default();
        if !seen.insert(m.white_id) {
            return Err(HistoryError::DuplicateParticipant {
                round: m.round_no,
                participant: m.white_id,
            });
        }
        if let Some(black) = m.black_id {
            if !seen.insert(black) {
                return Err(HistoryError::DuplicateParticipant {
                    round: m.round_no,
                    participant: black,
                });
            }
        }

        if m.result == MatchResult::NotPlayed {
            info!(
                round = m.round_no,
                board = m.board_no,
                "normalizing not_played result to a draw split"
            );
        }

        record_side(
            &mut index,
            m.white_id,
            m.round_no,
            m.black_id,
            if m.is_bye() { None } else { Some(Color::White) },
            m.result.white_outcome(),
            m.score_white,
        );

        if let (Some(black), Some(outcome)) = (m.black_id, m.result.black_outcome()) {
            record_side(
                &mut index,
                black,
                m.round_no,
                Some(m.white_id),
                Some(Color::Black),
                outcome,
                m.score_black,
            );
        }
    }

    let total_rounds = matches.iter().map(|m| m.round_no).max().unwrap_or(0);
    for history in index.values_mut() {
        fill_virtual_scores(history, total_rounds);
    }

    Ok(index)
}

fn record_side(
    index: &mut HistoryIndex,
    player: ParticipantId,
    round_no: u32,
    opponent_id: Option<ParticipantId>,
    color: Option<Color>,
    outcome: Outcome,
    points: f64,
) {
    // roster membership is checked before this is called
    let Some(history) = index.get_mut(&player) else {
        return;
    };

    history.rounds.push(PlayerRoundRecord {
        round_no,
        opponent_id,
        color,
        outcome,
        points,
        virtual_opponent_score: None,
    });

    history.score += points;
    history.adjusted_score += adjusted_contribution(outcome, points);

    match opponent_id {
        Some(opponent) => {
            history.opponents.insert(opponent);
            match color {
                Some(Color::White) => history.white_count += 1,
                Some(Color::Black) => history.black_count += 1,
                None => {}
            }
            if color.is_some() {
                history.last_color = color;
            }
        }
        None => {
            history.had_bye = true;
        }
    }
}

/// Second pass: store the FIDE virtual-opponent score on each bye record.
///
/// `Svon = S_before_round + (1 - SfPR) + 0.5 * (n - R)` with `n` the highest
/// round number played so far and `R` the round of the bye.
fn fill_virtual_scores(history: &mut PlayerHistory, total_rounds: u32) {
    let befores: Vec<(usize, f64)> = history
        .rounds
        .iter()
        .enumerate()
        .filter(|(_, r)| r.opponent_id.is_none())
        .map(|(i, r)| (i, history.score_before_round(r.round_no)))
        .collect();

    for (i, score_before) in befores {
        let record = &mut history.rounds[i];
        let svon = score_before
            + (1.0 - record.points)
            + 0.5 * (total_rounds as f64 - record.round_no as f64);
        record.virtual_opponent_score = Some(svon);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Match, MatchId, MatchResult, TournamentId, SWISS_SOURCE_TAG};
    use chrono::Utc;

    fn mk(
        round_no: u32,
        board_no: u32,
        white_id: ParticipantId,
        black_id: Option<ParticipantId>,
        result: MatchResult,
        score_white: f64,
        score_black: f64,
    ) -> Match {
        Match {
            id: MatchId::for_board(
                &TournamentId::from_name("history-test"),
                round_no,
                board_no,
                white_id,
            ),
            round_no,
            board_no,
            white_id,
            black_id,
            result,
            score_white,
            score_black,
            source_tag: SWISS_SOURCE_TAG.to_string(),
            created_at: Utc::now(),
        }
    }

    fn roster(ids: &[ParticipantId]) -> Vec<Participant> {
        ids.iter()
            .map(|&id| Participant::new(id, format!("p{}", id)))
            .collect()
    }

    #[test]
    fn test_empty_history_is_dense() {
        let index = build_history(&roster(&[1, 2, 3]), &[]).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index[&2].score, 0.0);
        assert!(index[&2].rounds.is_empty());
        assert!(!index[&2].had_bye);
    }

    #[test]
    fn test_single_decisive_match() {
        let matches = vec![mk(1, 1, 1, Some(2), MatchResult::WhiteWins, 1.0, 0.0)];
        let index = build_history(&roster(&[1, 2]), &matches).unwrap();

        let winner = &index[&1];
        assert_eq!(winner.score, 1.0);
        assert_eq!(winner.adjusted_score, 1.0);
        assert_eq!(winner.white_count, 1);
        assert_eq!(winner.last_color, Some(Color::White));
        assert!(winner.has_played(2));
        assert_eq!(winner.rounds[0].outcome, Outcome::Win);

        let loser = &index[&2];
        assert_eq!(loser.score, 0.0);
        assert_eq!(loser.black_count, 1);
        assert_eq!(loser.rounds[0].outcome, Outcome::Loss);
    }

    #[test]
    fn test_points_taken_from_row_not_recomputed() {
        // 3-1-0 football-style scoring: the row is authoritative
        let matches = vec![mk(1, 1, 1, Some(2), MatchResult::WhiteWins, 3.0, 0.0)];
        let index = build_history(&roster(&[1, 2]), &matches).unwrap();
        assert_eq!(index[&1].score, 3.0);
    }

    #[test]
    fn test_forfeit_adjusted_score() {
        // black loses by forfeit: white gets a forfeit win worth 1.0 on the
        // board but only 0.5 adjusted; black gets 0 and 0.5 adjusted
        let matches = vec![mk(1, 1, 1, Some(2), MatchResult::ForfeitBlack, 1.0, 0.0)];
        let index = build_history(&roster(&[1, 2]), &matches).unwrap();

        assert_eq!(index[&1].score, 1.0);
        assert_eq!(index[&1].adjusted_score, 0.5);
        assert_eq!(index[&1].rounds[0].outcome, Outcome::ForfeitWin);
        assert_eq!(index[&2].adjusted_score, 0.5);
        assert_eq!(index[&2].rounds[0].outcome, Outcome::ForfeitLoss);
    }

    #[test]
    fn test_full_point_bye_adjusted_score() {
        let matches = vec![mk(1, 1, 1, None, MatchResult::Bye, 1.0, 0.0)];
        let index = build_history(&roster(&[1]), &matches).unwrap();

        let h = &index[&1];
        assert_eq!(h.score, 1.0);
        assert_eq!(h.adjusted_score, 0.5);
        assert!(h.had_bye);
        assert_eq!(h.white_count, 0);
        assert_eq!(h.rounds[0].color, None);
        assert_eq!(h.rounds[0].outcome, Outcome::Bye);
    }

    #[test]
    fn test_half_point_bye_adjusted_score() {
        let matches = vec![mk(1, 1, 1, None, MatchResult::Bye, 0.5, 0.0)];
        let index = build_history(&roster(&[1]), &matches).unwrap();
        assert_eq!(index[&1].adjusted_score, 0.5);
        assert_eq!(index[&1].score, 0.5);
    }

    #[test]
    fn test_adjusted_score_law_across_rounds() {
        // win + draw + forfeit win + full bye = 1.0 + 0.5 + 0.5 + 0.5 adjusted
        let matches = vec![
            mk(1, 1, 1, Some(2), MatchResult::WhiteWins, 1.0, 0.0),
            mk(2, 1, 3, Some(1), MatchResult::Draw, 0.5, 0.5),
            mk(3, 1, 1, Some(4), MatchResult::ForfeitBlack, 1.0, 0.0),
            mk(4, 1, 1, None, MatchResult::Bye, 1.0, 0.0),
        ];
        let index = build_history(&roster(&[1, 2, 3, 4]), &matches).unwrap();

        let h = &index[&1];
        assert_eq!(h.score, 3.5);
        assert!((h.adjusted_score - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_virtual_opponent_formula() {
        // bye in round 3 with bye_points=1 and pre-round score 2.0, three
        // rounds played so far: Svon = 2.0 + (1 - 1) + 0.5 * (3 - 3) = 2.0
        let matches = vec![
            mk(1, 1, 1, Some(2), MatchResult::WhiteWins, 1.0, 0.0),
            mk(2, 1, 3, Some(1), MatchResult::ForfeitWhite, 0.0, 1.0),
            mk(3, 1, 1, None, MatchResult::Bye, 1.0, 0.0),
        ];
        let index = build_history(&roster(&[1, 2, 3]), &matches).unwrap();

        let bye_record = &index[&1].rounds[2];
        assert_eq!(bye_record.virtual_opponent_score, Some(2.0));
    }

    #[test]
    fn test_virtual_opponent_mid_tournament_bye() {
        // half-point bye in round 2 of 4 played, pre-round score 1.0:
        // Svon = 1.0 + (1 - 0.5) + 0.5 * (4 - 2) = 2.5
        let matches = vec![
            mk(1, 1, 1, Some(2), MatchResult::WhiteWins, 1.0, 0.0),
            mk(2, 1, 1, None, MatchResult::Bye, 0.5, 0.0),
            mk(3, 1, 1, Some(3), MatchResult::Draw, 0.5, 0.5),
            mk(4, 1, 1, Some(4), MatchResult::BlackWins, 0.0, 1.0),
        ];
        let index = build_history(&roster(&[1, 2, 3, 4]), &matches).unwrap();

        let bye_record = &index[&1].rounds[1];
        assert_eq!(bye_record.virtual_opponent_score, Some(2.5));
    }

    #[test]
    fn test_duplicate_participant_in_round_rejected() {
        let matches = vec![
            mk(1, 1, 1, Some(2), MatchResult::Draw, 0.5, 0.5),
            mk(1, 2, 1, Some(3), MatchResult::Draw, 0.5, 0.5),
        ];
        let err = build_history(&roster(&[1, 2, 3]), &matches).unwrap_err();
        match err {
            HistoryError::DuplicateParticipant { round, participant } => {
                assert_eq!(round, 1);
                assert_eq!(participant, 1);
            }
        }
    }

    #[test]
    fn test_non_roster_participant_skipped() {
        let matches = vec![
            mk(1, 1, 1, Some(99), MatchResult::WhiteWins, 1.0, 0.0),
            mk(1, 2, 2, Some(3), MatchResult::Draw, 0.5, 0.5),
        ];
        let index = build_history(&roster(&[1, 2, 3]), &matches).unwrap();

        // the row with the unknown player contributed nothing
        assert_eq!(index[&1].score, 0.0);
        assert!(index[&1].rounds.is_empty());
        assert_eq!(index[&2].score, 0.5);
    }

    #[test]
    fn test_not_played_normalized_to_draw() {
        let matches = vec![mk(1, 1, 1, Some(2), MatchResult::NotPlayed, 0.0, 0.0)];
        let index = build_history(&roster(&[1, 2]), &matches).unwrap();
        assert_eq!(index[&1].rounds[0].outcome, Outcome::Draw);
        assert_eq!(index[&2].rounds[0].outcome, Outcome::Draw);
    }

    #[test]
    fn test_color_diff_and_last_two_same_color() {
        let matches = vec![
            mk(1, 1, 1, Some(2), MatchResult::Draw, 0.5, 0.5),
            mk(2, 1, 1, Some(3), MatchResult::Draw, 0.5, 0.5),
        ];
        let index = build_history(&roster(&[1, 2, 3]), &matches).unwrap();

        let h = &index[&1];
        assert_eq!(h.color_diff(), 2);
        assert_eq!(h.last_two_same_color(), Some(Color::White));

        // player 2 has a single round only
        assert_eq!(index[&2].last_two_same_color(), None);
    }

    #[test]
    fn test_bye_breaks_color_run() {
        let matches = vec![
            mk(1, 1, 1, Some(2), MatchResult::Draw, 0.5, 0.5),
            mk(2, 1, 1, None, MatchResult::Bye, 1.0, 0.0),
        ];
        let index = build_history(&roster(&[1, 2]), &matches).unwrap();
        assert_eq!(index[&1].last_two_same_color(), None);
        assert_eq!(index[&1].last_color, Some(Color::White));
    }

    #[test]
    fn test_score_before_round() {
        let matches = vec![
            mk(1, 1, 1, Some(2), MatchResult::WhiteWins, 1.0, 0.0),
            mk(2, 1, 3, Some(1), MatchResult::Draw, 0.5, 0.5),
            mk(3, 1, 1, Some(4), MatchResult::WhiteWins, 1.0, 0.0),
        ];
        let index = build_history(&roster(&[1, 2, 3, 4]), &matches).unwrap();

        let h = &index[&1];
        assert_eq!(h.score_before_round(1), 0.0);
        assert_eq!(h.score_before_round(2), 1.0);
        assert_eq!(h.score_before_round(3), 1.5);
        assert_eq!(h.score_before_round(4), 2.5);
    }

    #[test]
    fn test_build_is_idempotent() {
        let matches = vec![
            mk(1, 1, 1, Some(2), MatchResult::WhiteWins, 1.0, 0.0),
            mk(2, 1, 2, Some(1), MatchResult::Draw, 0.5, 0.5),
        ];
        let a = build_history(&roster(&[1, 2]), &matches).unwrap();
        let b = build_history(&roster(&[1, 2]), &matches).unwrap();
        assert_eq!(a[&1].rounds, b[&1].rounds);
        assert_eq!(a[&2].score, b[&2].score);
    }
}

//! Tiebreak computation and standings.
//!
//! Score is always the primary sort key; the tournament configures an
//! ordered list of tiebreak keys behind it. Bye rounds contribute the
//! precomputed virtual-opponent score wherever an opponent's score would be
//! summed.
//!
//! `direct_encounter` is compared pairwise on the two players' mutual games
//! only, which makes it non-transitive inside three-way-or-larger ties; the
//! order the stable sort produces for such a cluster stands.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::history::{HistoryIndex, PlayerHistory, PlayerRoundRecord};
use crate::models::{Color, Participant, ParticipantId};

/// Fixed epsilon for all floating tiebreak comparisons.
pub const EPSILON: f64 = 1e-3;

/// The supported tiebreak keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TiebreakKey {
    Score,
    DirectEncounter,
    Buchholz,
    BuchholzCut1,
    BuchholzCut2,
    MedianBuchholz,
    SonnebornBerger,
    NumberOfWins,
    Progressive,
    GamesAsBlack,
    WinsWithBlack,
}

impl TiebreakKey {
    /// Configuration name of this key.
    pub fn as_str(&self) -> &'static str {
        match self {
            TiebreakKey::Score => "score",
            TiebreakKey::DirectEncounter => "direct_encounter",
            TiebreakKey::Buchholz => "buchholz",
            TiebreakKey::BuchholzCut1 => "buchholz_cut1",
            TiebreakKey::BuchholzCut2 => "buchholz_cut2",
            TiebreakKey::MedianBuchholz => "median_buchholz",
            TiebreakKey::SonnebornBerger => "sonneborn_berger",
            TiebreakKey::NumberOfWins => "number_of_wins",
            TiebreakKey::Progressive => "progressive",
            TiebreakKey::GamesAsBlack => "games_as_black",
            TiebreakKey::WinsWithBlack => "wins_with_black",
        }
    }

    /// Parse a configuration name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "score" => Some(TiebreakKey::Score),
            "direct_encounter" => Some(TiebreakKey::DirectEncounter),
            "buchholz" => Some(TiebreakKey::Buchholz),
            "buchholz_cut1" => Some(TiebreakKey::BuchholzCut1),
            "buchholz_cut2" => Some(TiebreakKey::BuchholzCut2),
            "median_buchholz" => Some(TiebreakKey::MedianBuchholz),
            "sonneborn_berger" => Some(TiebreakKey::SonnebornBerger),
            "number_of_wins" => Some(TiebreakKey::NumberOfWins),
            "progressive" => Some(TiebreakKey::Progressive),
            "games_as_black" => Some(TiebreakKey::GamesAsBlack),
            "wins_with_black" => Some(TiebreakKey::WinsWithBlack),
            _ => None,
        }
    }
}

/// Parse a comma-separated tiebreak list; unknown keys are skipped.
pub fn parse_keys(list: &str) -> Vec<TiebreakKey> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|name| {
            let key = TiebreakKey::parse(name);
            if key.is_none() {
                warn!(key = name, "ignoring unknown tiebreak key");
            }
            key
        })
        .collect()
}

/// The opponent's score as seen from one record: the opponent's adjusted
/// score for real games, the stored virtual-opponent score for byes.
fn opponent_value(record: &PlayerRoundRecord, index: &HistoryIndex) -> f64 {
    match record.opponent_id {
        Some(opponent) => index
            .get(&opponent)
            .map(|h| h.adjusted_score)
            .unwrap_or(0.0),
        None => record.virtual_opponent_score.unwrap_or(0.0),
    }
}

fn opponent_values(history: &PlayerHistory, index: &HistoryIndex) -> Vec<f64> {
    history
        .rounds
        .iter()
        .map(|r| opponent_value(r, index))
        .collect()
}

/// Sum of opponents' adjusted scores, byes counted as virtual opponents.
pub fn buchholz(history: &PlayerHistory, index: &HistoryIndex) -> f64 {
    opponent_values(history, index).iter().sum()
}

/// Buchholz with the `cut` smallest opponent scores removed, always keeping
/// at least one term.
fn buchholz_cut(history: &PlayerHistory, index: &HistoryIndex, cut: usize) -> f64 {
    let mut values = opponent_values(history, index);
    values.sort_by(f64::total_cmp);
    let cut = cut.min(values.len().saturating_sub(1));
    values[cut..].iter().sum()
}

/// Buchholz with the single smallest and single largest terms removed.
pub fn median_buchholz(history: &PlayerHistory, index: &HistoryIndex) -> f64 {
    let mut values = opponent_values(history, index);
    if values.len() < 3 {
        return values.iter().sum();
    }
    values.sort_by(f64::total_cmp);
    values[1..values.len() - 1].iter().sum()
}

/// Opponent strength weighted by result: full on a win, half on a draw.
///
/// A bye counts its virtual opponent weighted like the result its points
/// represent: full for a full-point bye, half for a half-point bye.
pub fn sonneborn_berger(history: &PlayerHistory, index: &HistoryIndex) -> f64 {
    use crate::models::Outcome::*;
    history
        .rounds
        .iter()
        .map(|r| {
            let value = opponent_value(r, index);
            match r.outcome {
                Win | ForfeitWin => value,
                Draw => 0.5 * value,
                Loss | ForfeitLoss => 0.0,
                Bye => {
                    if r.points >= 1.0 {
                        value
                    } else if r.points > 0.0 {
                        0.5 * value
                    } else {
                        0.0
                    }
                }
            }
        })
        .sum()
}

/// Count of wins including forfeit wins.
pub fn number_of_wins(history: &PlayerHistory) -> f64 {
    history.rounds.iter().filter(|r| r.outcome.is_win()).count() as f64
}

/// Sum of the running score after every round.
pub fn progressive(history: &PlayerHistory) -> f64 {
    let mut running = 0.0;
    let mut total = 0.0;
    for record in &history.rounds {
        running += record.points;
        total += running;
    }
    total
}

/// Count of rounds played with the black pieces.
pub fn games_as_black(history: &PlayerHistory) -> f64 {
    history.black_count as f64
}

/// Count of wins scored with the black pieces.
pub fn wins_with_black(history: &PlayerHistory) -> f64 {
    history
        .rounds
        .iter()
        .filter(|r| r.color == Some(Color::Black) && r.outcome.is_win())
        .count() as f64
}

/// Points scored in the mutual games of two players, each side summed from
/// its own records.
fn mutual_points(p: &PlayerHistory, q: &PlayerHistory) -> (f64, f64) {
    let p_points: f64 = p
        .rounds
        .iter()
        .filter(|r| r.opponent_id == Some(q.participant_id))
        .map(|r| r.points)
        .sum();
    let q_points: f64 = q
        .rounds
        .iter()
        .filter(|r| r.opponent_id == Some(p.participant_id))
        .map(|r| r.points)
        .sum();
    (p_points, q_points)
}

/// Scalar shown for `direct_encounter` in the standings table: points scored
/// against opponents who finished on the same score. The comparator itself
/// uses the pairwise mutual results.
fn direct_encounter_display(history: &PlayerHistory, index: &HistoryIndex) -> f64 {
    history
        .rounds
        .iter()
        .filter(|r| {
            r.opponent_id
                .and_then(|op| index.get(&op))
                .map(|o| (o.score - history.score).abs() < EPSILON)
                .unwrap_or(false)
        })
        .map(|r| r.points)
        .sum()
}

/// Compute the displayed value of one key for one player.
pub fn tiebreak_value(key: TiebreakKey, history: &PlayerHistory, index: &HistoryIndex) -> f64 {
    match key {
        TiebreakKey::Score => history.score,
        TiebreakKey::DirectEncounter => direct_encounter_display(history, index),
        TiebreakKey::Buchholz => buchholz(history, index),
        TiebreakKey::BuchholzCut1 => buchholz_cut(history, index, 1),
        TiebreakKey::BuchholzCut2 => buchholz_cut(history, index, 2),
        TiebreakKey::MedianBuchholz => median_buchholz(history, index),
        TiebreakKey::SonnebornBerger => sonneborn_berger(history, index),
        TiebreakKey::NumberOfWins => number_of_wins(history),
        TiebreakKey::Progressive => progressive(history),
        TiebreakKey::GamesAsBlack => games_as_black(history),
        TiebreakKey::WinsWithBlack => wins_with_black(history),
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    if a > b + EPSILON {
        Ordering::Less
    } else if b > a + EPSILON {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// Compare two players: score first, then the configured keys in order.
/// `Ordering::Less` means the first player ranks higher.
pub fn compare_players(
    p: &PlayerHistory,
    q: &PlayerHistory,
    keys: &[TiebreakKey],
    index: &HistoryIndex,
) -> Ordering {
    let by_score = descending(p.score, q.score);
    if by_score != Ordering::Equal {
        return by_score;
    }
    for key in keys {
        let ord = match key {
            TiebreakKey::DirectEncounter => {
                let (p_points, q_points) = mutual_points(p, q);
                descending(p_points, q_points)
            }
            _ => descending(
                tiebreak_value(*key, p, index),
                tiebreak_value(*key, q, index),
            ),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// One row of the standings table.
#[derive(Debug, Clone, Serialize)]
pub struct StandingsRow {
    /// 1-based position in the sorted table
    pub rank: u32,

    /// Who this row is about
    pub participant_id: ParticipantId,

    /// Cumulative score
    pub score: f64,

    /// Configured key name → computed value
    pub tiebreak_values: BTreeMap<String, f64>,
}

/// Rank a roster. The sort is stable under the roster order, so players tied
/// on every key keep their registration order.
pub fn standings(
    participants: &[Participant],
    index: &HistoryIndex,
    keys: &[TiebreakKey],
) -> Vec<StandingsRow> {
    let empty = PlayerHistory::default();
    let mut order: Vec<&Participant> = participants.iter().collect();
    order.sort_by(|p, q| {
        let hp = index.get(&p.id).unwrap_or(&empty);
        let hq = index.get(&q.id).unwrap_or(&empty);
        compare_players(hp, hq, keys, index)
    });

    order
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let history = index.get(&p.id).unwrap_or(&empty);
            let tiebreak_values = keys
                .iter()
                .map(|k| (k.as_str().to_string(), tiebreak_value(*k, history, index)))
                .collect();
            StandingsRow {
                rank: (i + 1) as u32,
                participant_id: p.id,
                score: history.score,
                tiebreak_values,
            }
        })
        .collect()
}

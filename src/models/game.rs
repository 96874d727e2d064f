//! Match model — one game between two players, or a bye.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MatchId, ParticipantId};

/// Source tag written on every engine-produced match.
pub const SWISS_SOURCE_TAG: &str = "swiss_system";

/// Board color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// The other color.
    pub fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

/// Terminal result tag of a match row.
///
/// Unknown tags from hand-edited files deserialize as `NotPlayed`; the
/// history model normalizes those to a draw split of the recorded points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchResult {
    WhiteWins,
    BlackWins,
    Draw,
    Bye,
    /// White loses by forfeit
    ForfeitWhite,
    /// Black loses by forfeit
    ForfeitBlack,
    #[serde(other)]
    NotPlayed,
}

/// What a match meant for one of its two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Loss,
    Draw,
    Bye,
    ForfeitWin,
    ForfeitLoss,
}

impl Outcome {
    /// Whether this outcome counts as a win for tiebreak purposes.
    pub fn is_win(self) -> bool {
        matches!(self, Outcome::Win | Outcome::ForfeitWin)
    }
}

impl MatchResult {
    /// Resolve the outcome for the white side.
    ///
    /// `NotPlayed` resolves as a draw; the history model logs the
    /// normalization.
    pub fn white_outcome(self) -> Outcome {
        match self {
            MatchResult::WhiteWins => Outcome::Win,
            MatchResult::BlackWins => Outcome::Loss,
            MatchResult::Draw | MatchResult::NotPlayed => Outcome::Draw,
            MatchResult::Bye => Outcome::Bye,
            MatchResult::ForfeitWhite => Outcome::ForfeitLoss,
            MatchResult::ForfeitBlack => Outcome::ForfeitWin,
        }
    }

    /// Resolve the outcome for the black side. `None` for byes.
    pub fn black_outcome(self) -> Option<Outcome> {
        match self {
            MatchResult::WhiteWins => Some(Outcome::Loss),
            MatchResult::BlackWins => Some(Outcome::Win),
            MatchResult::Draw | MatchResult::NotPlayed => Some(Outcome::Draw),
            MatchResult::Bye => None,
            MatchResult::ForfeitWhite => Some(Outcome::ForfeitWin),
            MatchResult::ForfeitBlack => Some(Outcome::ForfeitLoss),
        }
    }

    /// Whether results for this tag are final (everything except `NotPlayed`).
    pub fn is_terminal(self) -> bool {
        !matches!(self, MatchResult::NotPlayed)
    }
}

/// A stored match row.
///
/// `score_white` and `score_black` are canonical points, written at result
/// entry time and never recomputed downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    /// Unique identifier (derived from tournament + round + board + white)
    pub id: MatchId,

    /// Round this match belongs to
    pub round_no: u32,

    /// Board number within the round
    pub board_no: u32,

    /// White participant
    pub white_id: ParticipantId,

    /// Black participant; `None` for a bye
    pub black_id: Option<ParticipantId>,

    /// Terminal result tag
    pub result: MatchResult,

    /// Points awarded to white
    pub score_white: f64,

    /// Points awarded to black
    pub score_black: f64,

    /// Where this row came from (e.g. "swiss_system")
    pub source_tag: String,

    /// When this record was created
    pub created_at: DateTime<Utc>,
}

impl Match {
    /// Whether this row is a bye assignment.
    pub fn is_bye(&self) -> bool {
        self.black_id.is_none()
    }

    /// Whether the given participant plays in this match.
    pub fn involves(&self, id: ParticipantId) -> bool {
        self.white_id == id || self.black_id == Some(id)
    }
}

/// An unpersisted pairing produced by the engine.
///
/// The store assigns the `MatchId` and timestamp when the batch is inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDraft {
    /// Board number within the round
    pub board_no: u32,

    /// White participant
    pub white_id: ParticipantId,

    /// Black participant; `None` for a bye
    pub black_id: Option<ParticipantId>,

    /// Default result: `not_played` for real boards, `bye` for the bye board
    pub result: MatchResult,

    /// Points awarded to white (bye points on the bye board, else 0)
    pub score_white: f64,

    /// Points awarded to black (always 0 in a draft)
    pub score_black: f64,

    /// Source tag for the stored row
    pub source_tag: String,
}

impl MatchDraft {
    /// Draft for a regular board awaiting a result.
    pub fn board(board_no: u32, white_id: ParticipantId, black_id: ParticipantId) -> Self {
        Self {
            board_no,
            white_id,
            black_id: Some(black_id),
            result: MatchResult::NotPlayed,
            score_white: 0.0,
            score_black: 0.0,
            source_tag: SWISS_SOURCE_TAG.to_string(),
        }
    }

    /// Draft for the bye board; points are awarded immediately.
    pub fn bye(board_no: u32, white_id: ParticipantId, bye_points: f64) -> Self {
        Self {
            board_no,
            white_id,
            black_id: None,
            result: MatchResult::Bye,
            score_white: bye_points,
            score_black: 0.0,
            source_tag: SWISS_SOURCE_TAG.to_string(),
        }
    }

    /// The two participants on this board, bye side omitted.
    pub fn players(&self) -> impl Iterator<Item = ParticipantId> + '_ {
        std::iter::once(self.white_id).chain(self.black_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_opposite() {
        assert_eq!(Color::White.opposite(), Color::Black);
        assert_eq!(Color::Black.opposite(), Color::White);
    }

    #[test]
    fn test_result_outcomes_decisive() {
        assert_eq!(MatchResult::WhiteWins.white_outcome(), Outcome::Win);
        assert_eq!(MatchResult::WhiteWins.black_outcome(), Some(Outcome::Loss));
        assert_eq!(MatchResult::BlackWins.white_outcome(), Outcome::Loss);
        assert_eq!(MatchResult::BlackWins.black_outcome(), Some(Outcome::Win));
    }

    #[test]
    fn test_result_outcomes_forfeit() {
        // forfeit_white means white loses by forfeit
        assert_eq!(MatchResult::ForfeitWhite.white_outcome(), Outcome::ForfeitLoss);
        assert_eq!(
            MatchResult::ForfeitWhite.black_outcome(),
            Some(Outcome::ForfeitWin)
        );
        assert_eq!(MatchResult::ForfeitBlack.white_outcome(), Outcome::ForfeitWin);
        assert_eq!(
            MatchResult::ForfeitBlack.black_outcome(),
            Some(Outcome::ForfeitLoss)
        );
    }

    #[test]
    fn test_result_outcomes_bye() {
        assert_eq!(MatchResult::Bye.white_outcome(), Outcome::Bye);
        assert_eq!(MatchResult::Bye.black_outcome(), None);
    }

    #[test]
    fn test_unknown_result_tag_deserializes_as_not_played() {
        let result: MatchResult = serde_json::from_str("\"adjourned\"").unwrap();
        assert_eq!(result, MatchResult::NotPlayed);
    }

    #[test]
    fn test_result_tag_snake_case() {
        let json = serde_json::to_string(&MatchResult::ForfeitWhite).unwrap();
        assert_eq!(json, "\"forfeit_white\"");
        let back: MatchResult = serde_json::from_str("\"white_wins\"").unwrap();
        assert_eq!(back, MatchResult::WhiteWins);
    }

    #[test]
    fn test_outcome_is_win() {
        assert!(Outcome::Win.is_win());
        assert!(Outcome::ForfeitWin.is_win());
        assert!(!Outcome::Draw.is_win());
        assert!(!Outcome::Bye.is_win());
    }

    #[test]
    fn test_draft_board() {
        let draft = MatchDraft::board(2, 10, 20);
        assert_eq!(draft.board_no, 2);
        assert_eq!(draft.black_id, Some(20));
        assert_eq!(draft.result, MatchResult::NotPlayed);
        assert_eq!(draft.score_white, 0.0);
        assert_eq!(draft.source_tag, SWISS_SOURCE_TAG);
        let players: Vec<_> = draft.players().collect();
        assert_eq!(players, vec![10, 20]);
    }

    #[test]
    fn test_draft_bye() {
        let draft = MatchDraft::bye(4, 33, 1.0);
        assert!(draft.black_id.is_none());
        assert_eq!(draft.result, MatchResult::Bye);
        assert_eq!(draft.score_white, 1.0);
        assert_eq!(draft.score_black, 0.0);
        let players: Vec<_> = draft.players().collect();
        assert_eq!(players, vec![33]);
    }
}

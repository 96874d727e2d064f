//! Identifier types.
//!
//! Participants keep the integer IDs they registered with. Tournaments and
//! matches get IDs derived from their own coordinates, so repeating an
//! insert for the same tournament or the same board never mints a second
//! identity. The two ID kinds are distinct types: a `MatchId` cannot be
//! handed to a call expecting a `TournamentId`.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Stable integer identifier for a roster participant.
pub type ParticipantId = i64;

/// 16 hex chars of SHA256 over the `|`-joined fields.
fn digest(fields: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            hasher.update(b"|");
        }
        hasher.update(field.as_bytes());
    }
    hex::encode(hasher.finalize())[..16].to_string()
}

/// Identifier of a tournament, derived from its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TournamentId(String);

impl TournamentId {
    /// Derive the ID for a tournament name. Surrounding whitespace does not
    /// change the identity.
    pub fn from_name(name: &str) -> Self {
        Self(digest(&[name.trim()]))
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TournamentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a match, derived from where it was played: the tournament,
/// the round, the board, and who had white.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchId(String);

impl MatchId {
    /// Derive the ID for one board of one round.
    pub fn for_board(
        tournament: &TournamentId,
        round_no: u32,
        board_no: u32,
        white_id: ParticipantId,
    ) -> Self {
        Self(digest(&[
            tournament.as_str(),
            &round_no.to_string(),
            &board_no.to_string(),
            &white_id.to_string(),
        ]))
    }

    /// Get the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tournament_id_deterministic() {
        let a = TournamentId::from_name("Club Open 2026");
        let b = TournamentId::from_name("Club Open 2026");
        assert_eq!(a, b);
    }

    #[test]
    fn test_tournament_id_ignores_surrounding_whitespace() {
        let a = TournamentId::from_name("Club Open 2026");
        let b = TournamentId::from_name("  Club Open 2026 ");
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_names_different_ids() {
        let a = TournamentId::from_name("Club Open 2026");
        let b = TournamentId::from_name("Club Open 2027");
        assert_ne!(a, b);
    }

    #[test]
    fn test_tournament_id_format() {
        let id = TournamentId::from_name("Rapid Night");
        assert_eq!(id.as_str().len(), 16);
        assert!(id.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_match_id_deterministic() {
        let t = TournamentId::from_name("Club Open 2026");
        let a = MatchId::for_board(&t, 3, 2, 14);
        let b = MatchId::for_board(&t, 3, 2, 14);
        assert_eq!(a, b);
    }

    #[test]
    fn test_match_id_distinct_per_board_and_round() {
        let t = TournamentId::from_name("Club Open 2026");
        let base = MatchId::for_board(&t, 3, 2, 14);
        assert_ne!(base, MatchId::for_board(&t, 3, 3, 14));
        assert_ne!(base, MatchId::for_board(&t, 4, 2, 14));
        assert_ne!(
            base,
            MatchId::for_board(&TournamentId::from_name("Other Open"), 3, 2, 14)
        );
    }

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let t = TournamentId::from_name("Club Open 2026");
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, format!("\"{}\"", t.as_str()));
        let back: TournamentId = serde_json::from_str(&json).unwrap();
        assert_eq!(t, back);
    }

    #[test]
    fn test_display_matches_as_str() {
        let t = TournamentId::from_name("Club Open 2026");
        assert_eq!(format!("{}", t), t.as_str());
        let m = MatchId::for_board(&t, 1, 1, 1);
        assert_eq!(format!("{}", m), m.as_str());
    }
}

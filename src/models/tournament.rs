//! Tournament aggregate model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{TournamentId, TournamentSettings};

/// A tournament: identity, display name, and engine settings.
///
/// Rosters, rounds and matches are stored as separate entities keyed by the
/// tournament ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tournament {
    /// Unique identifier (derived from the name)
    pub id: TournamentId,

    /// Display name
    pub name: String,

    /// Pairing and ranking settings
    #[serde(default)]
    pub settings: TournamentSettings,

    /// When this record was created
    pub created_at: DateTime<Utc>,
}

impl Tournament {
    /// Create a new Tournament with auto-generated ID and default settings.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let id = TournamentId::from_name(&name);
        Self {
            id,
            name,
            settings: TournamentSettings::default(),
            created_at: Utc::now(),
        }
    }

    /// Builder method to set the settings.
    pub fn with_settings(mut self, settings: TournamentSettings) -> Self {
        self.settings = settings;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tournament_creation() {
        let t = Tournament::new("Club Open 2026");
        assert_eq!(t.name, "Club Open 2026");
        assert!(!t.id.as_str().is_empty());
        assert_eq!(t.settings.rounds, 5);
    }

    #[test]
    fn test_tournament_id_deterministic() {
        let a = Tournament::new("Club Open 2026");
        let b = Tournament::new("Club Open 2026");
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_tournament_with_settings() {
        let t = Tournament::new("Rapid Night")
            .with_settings(TournamentSettings::default().with_rounds(7));
        assert_eq!(t.settings.rounds, 7);
    }

    #[test]
    fn test_tournament_serialization() {
        let t = Tournament::new("Club Open 2026");
        let json = serde_json::to_string(&t).unwrap();
        let back: Tournament = serde_json::from_str(&json).unwrap();
        assert_eq!(t.id, back.id);
        assert_eq!(t.name, back.name);
    }
}

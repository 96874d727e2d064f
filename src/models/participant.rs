//! Roster participant model.

use serde::{Deserialize, Serialize};

use super::ParticipantId;

/// Rating assigned to participants that register without one.
pub const DEFAULT_RATING: u32 = 1500;

fn default_rating() -> u32 {
    DEFAULT_RATING
}

fn default_active() -> bool {
    true
}

/// A tournament participant.
///
/// Inactive participants keep their history but are excluded from future
/// pairings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Stable identifier assigned at registration
    pub id: ParticipantId,

    /// Display name
    pub name: String,

    /// Playing strength used for round-1 seeding and color tie-breaks
    #[serde(default = "default_rating")]
    pub rating: u32,

    /// Whether the participant is still being paired
    #[serde(default = "default_active")]
    pub active: bool,
}

impl Participant {
    /// Create a new active participant with the default rating.
    pub fn new(id: ParticipantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            rating: DEFAULT_RATING,
            active: true,
        }
    }

    /// Builder method to set the rating.
    pub fn with_rating(mut self, rating: u32) -> Self {
        self.rating = rating;
        self
    }

    /// Mark the participant as withdrawn from future rounds.
    pub fn withdraw(&mut self) {
        self.active = false;
    }
}

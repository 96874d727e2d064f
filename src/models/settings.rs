//! Tournament-level settings.
//!
//! These are domain data carried on the tournament record, not application
//! configuration: the point schedule, the planned round count, and the
//! configured tiebreak order all change the engine's output.

use serde::{Deserialize, Serialize};

fn default_rounds() -> u32 {
    5
}

fn default_points_win() -> f64 {
    1.0
}

fn default_points_draw() -> f64 {
    0.5
}

fn default_points_loss() -> f64 {
    0.0
}

fn default_bye_points() -> f64 {
    1.0
}

fn default_tiebreakers() -> String {
    "buchholz,sonneborn_berger,number_of_wins".to_string()
}

fn default_forbid_repeat_bye() -> bool {
    true
}

/// Settings governing pairing and ranking for one tournament.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentSettings {
    /// Planned total number of rounds
    #[serde(default = "default_rounds")]
    pub rounds: u32,

    /// Points for a win
    #[serde(default = "default_points_win")]
    pub points_win: f64,

    /// Points for a draw
    #[serde(default = "default_points_draw")]
    pub points_draw: f64,

    /// Points for a loss
    #[serde(default = "default_points_loss")]
    pub points_loss: f64,

    /// Points awarded for a bye
    #[serde(default = "default_bye_points")]
    pub bye_points: f64,

    /// Ordered comma-separated tiebreak keys
    #[serde(default = "default_tiebreakers")]
    pub tiebreakers: String,

    /// Deprioritize players who already received a bye
    #[serde(default = "default_forbid_repeat_bye")]
    pub forbid_repeat_bye: bool,
}

impl Default for TournamentSettings {
    fn default() -> Self {
        Self {
            rounds: default_rounds(),
            points_win: default_points_win(),
            points_draw: default_points_draw(),
            points_loss: default_points_loss(),
            bye_points: default_bye_points(),
            tiebreakers: default_tiebreakers(),
            forbid_repeat_bye: default_forbid_repeat_bye(),
        }
    }
}

impl TournamentSettings {
    /// Builder method to set the planned round count.
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    /// Builder method to set the tiebreak order.
    pub fn with_tiebreakers(mut self, keys: impl Into<String>) -> Self {
        self.tiebreakers = keys.into();
        self
    }

    /// Builder method to set the bye award.
    pub fn with_bye_points(mut self, points: f64) -> Self {
        self.bye_points = points;
        self
    }

    /// Expected score total for a decisive result.
    pub fn decisive_total(&self) -> f64 {
        self.points_win + self.points_loss
    }

    /// Expected score total for a drawn result.
    pub fn draw_total(&self) -> f64 {
        2.0 * self.points_draw
    }
}

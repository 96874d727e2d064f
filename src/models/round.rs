//! Tournament round model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    /// Created but not yet paired
    Pending,
    /// Pairings published, results outstanding
    Paired,
    /// All results entered
    Completed,
}

/// A single round of a tournament.
///
/// Rounds are numbered from 1 and the number is unique within a tournament.
/// The pairing engine only reads round numbers; status transitions are driven
/// through the store by the service layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    /// 1-based round number
    pub number: u32,

    /// Lifecycle status
    pub status: RoundStatus,

    /// When pairings were published, if they were
    pub paired_at: Option<DateTime<Utc>>,
}

impl Round {
    /// Create a new pending round.
    pub fn new(number: u32) -> Self {
        Self {
            number,
            status: RoundStatus::Pending,
            paired_at: None,
        }
    }

    /// Whether results for this round are final.
    pub fn is_completed(&self) -> bool {
        self.status == RoundStatus::Completed
    }
}

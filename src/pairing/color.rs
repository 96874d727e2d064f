//! Color preference and penalty model.
//!
//! Every player carries a signed preference in `{-2, -1, 0, +1, +2}` where
//! positive means the player should get white. `±2` is absolute (two same
//! colors in a row, or a color imbalance beyond one game) and costs 1000 to
//! violate; `±1` costs 100; assigning anything to a neutral player costs 1.

use crate::history::PlayerHistory;
use crate::models::{Color, ParticipantId};

/// Penalty for violating an absolute (±2) preference.
const ABSOLUTE_VIOLATION: u32 = 1000;

/// Penalty for violating a strong (±1) preference.
const STRONG_VIOLATION: u32 = 100;

/// Penalty for assigning any color to a neutral player.
const NEUTRAL_COST: u32 = 1;

/// Derive the color preference from a player's history.
pub fn color_preference(history: &PlayerHistory) -> i8 {
    let diff = history.color_diff();
    let streak = history.last_two_same_color();

    if diff < -1 || streak == Some(Color::Black) {
        return 2;
    }
    if diff > 1 || streak == Some(Color::White) {
        return -2;
    }
    match diff {
        -1 => 1,
        1 => -1,
        _ => match history.last_color {
            Some(Color::Black) => 1,
            Some(Color::White) => -1,
            None => 0,
        },
    }
}

/// Penalty for giving `color` to a player with preference `pref`.
pub fn color_penalty(pref: i8, color: Color) -> u32 {
    if pref == 0 {
        return NEUTRAL_COST;
    }
    let violated = match color {
        Color::White => pref < 0,
        Color::Black => pref > 0,
    };
    if !violated {
        0
    } else if pref.abs() == 2 {
        ABSOLUTE_VIOLATION
    } else {
        STRONG_VIOLATION
    }
}

/// Combined penalty of a candidate pairing, whichever way colors fall.
pub fn pair_penalty(pref_a: i8, pref_b: i8) -> u32 {
    let a_white = color_penalty(pref_a, Color::White) + color_penalty(pref_b, Color::Black);
    let b_white = color_penalty(pref_b, Color::White) + color_penalty(pref_a, Color::Black);
    a_white.min(b_white)
}

/// Decide who plays white on a board.
///
/// The cheaper assignment wins; on a tie the higher-rated player gets the
/// color they prefer, defaulting to white when they are neutral.
pub fn resolve_colors(
    a: (ParticipantId, i8, u32),
    b: (ParticipantId, i8, u32),
) -> (ParticipantId, ParticipantId) {
    let (a_id, a_pref, a_rating) = a;
    let (b_id, b_pref, b_rating) = b;

    let a_white = color_penalty(a_pref, Color::White) + color_penalty(b_pref, Color::Black);
    let b_white = color_penalty(b_pref, Color::White) + color_penalty(a_pref, Color::Black);

    if a_white < b_white {
        return (a_id, b_id);
    }
    if b_white < a_white {
        return (b_id, a_id);
    }

    let (hi, lo) = if a_rating >= b_rating {
        ((a_id, a_pref), (b_id, b_pref))
    } else {
        ((b_id, b_pref), (a_id, a_pref))
    };
    if hi.1 < 0 {
        (lo.0, hi.0)
    } else {
        (hi.0, lo.0)
    }
}

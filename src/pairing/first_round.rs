//! Round-1 pairing.
//!
//! There is no history yet, so the Dutch machinery does not apply: the field
//! is seeded by rating, split into halves, and paired top-vs-bottom. Colors
//! are drawn per board from the injected RNG; callers seed it to make runs
//! reproducible.

use rand::Rng;

use crate::models::{MatchDraft, Participant};

use super::{PairingError, PairingResult};

/// Pair the first round.
///
/// With an odd field the participant with the largest identifier (the latest
/// registrant) receives the bye; it always lands on the last board.
pub fn pair_first_round(
    participants: &[Participant],
    bye_points: f64,
    rng: &mut impl Rng,
) -> Result<PairingResult, PairingError> {
    let mut active: Vec<&Participant> = participants.iter().filter(|p| p.active).collect();
    if active.len() < 2 {
        return Err(PairingError::InsufficientParticipants {
            found: active.len(),
        });
    }

    let bye = if active.len() % 2 == 1 {
        let idx = active
            .iter()
            .enumerate()
            .max_by_key(|(_, p)| p.id)
            .map(|(i, _)| i)
            .unwrap_or(0);
        Some(active.swap_remove(idx))
    } else {
        None
    };

    active.sort_by(|a, b| b.rating.cmp(&a.rating).then(a.id.cmp(&b.id)));

    let half = active.len() / 2;
    let (upper, lower) = active.split_at(half);

    let mut drafts = Vec::with_capacity(half + 1);
    for (i, (top, bottom)) in upper.iter().zip(lower.iter()).enumerate() {
        let board_no = (i + 1) as u32;
        if rng.gen::<bool>() {
            drafts.push(MatchDraft::board(board_no, top.id, bottom.id));
        } else {
            drafts.push(MatchDraft::board(board_no, bottom.id, top.id));
        }
    }

    let bye_id = bye.map(|p| p.id);
    if let Some(id) = bye_id {
        drafts.push(MatchDraft::bye((half + 1) as u32, id, bye_points));
    }

    Ok(PairingResult {
        drafts,
        bye: bye_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn player(id: i64, rating: u32) -> Participant {
        Participant::new(id, format!("p{}", id)).with_rating(rating)
    }

    fn unordered(draft: &MatchDraft) -> (i64, i64) {
        let a = draft.white_id;
        let b = draft.black_id.unwrap();
        (a.min(b), a.max(b))
    }

    #[test]
    fn test_four_players_pair_top_vs_bottom() {
        // ratings 1800, 1600, 1500, 1400: boards (1800 v 1500), (1600 v 1400)
        let players = vec![
            player(1, 1800),
            player(2, 1600),
            player(3, 1500),
            player(4, 1400),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        let result = pair_first_round(&players, 1.0, &mut rng).unwrap();

        assert_eq!(result.drafts.len(), 2);
        assert!(result.bye.is_none());
        assert_eq!(unordered(&result.drafts[0]), (1, 3));
        assert_eq!(unordered(&result.drafts[1]), (2, 4));
    }

    #[test]
    fn test_five_players_latest_registrant_gets_bye() {
        let players = vec![
            player(1, 2000),
            player(2, 1800),
            player(3, 1600),
            player(4, 1400),
            player(5, 1200),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        let result = pair_first_round(&players, 1.0, &mut rng).unwrap();

        assert_eq!(result.bye, Some(5));
        assert_eq!(result.drafts.len(), 3);

        // remaining four pair top-vs-bottom by rating
        assert_eq!(unordered(&result.drafts[0]), (1, 3));
        assert_eq!(unordered(&result.drafts[1]), (2, 4));

        // the bye is the last board with the configured points
        let bye_draft = &result.drafts[2];
        assert_eq!(bye_draft.board_no, 3);
        assert!(bye_draft.black_id.is_none());
        assert_eq!(bye_draft.score_white, 1.0);
    }

    #[test]
    fn test_colors_deterministic_under_seed() {
        let players = vec![
            player(1, 1800),
            player(2, 1600),
            player(3, 1500),
            player(4, 1400),
        ];
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        let a = pair_first_round(&players, 1.0, &mut rng_a).unwrap();
        let b = pair_first_round(&players, 1.0, &mut rng_b).unwrap();
        assert_eq!(a.drafts, b.drafts);
    }

    #[test]
    fn test_inactive_players_excluded() {
        let mut withdrawn = player(9, 2200);
        withdrawn.withdraw();
        let players = vec![player(1, 1800), player(2, 1600), withdrawn];
        let mut rng = StdRng::seed_from_u64(1);
        let result = pair_first_round(&players, 1.0, &mut rng).unwrap();

        assert_eq!(result.drafts.len(), 1);
        assert!(result.bye.is_none());
        assert_eq!(unordered(&result.drafts[0]), (1, 2));
    }

    #[test]
    fn test_roster_conservation() {
        let players: Vec<Participant> = (1..=9)
            .map(|id| player(id, 1400 + (id as u32) * 10))
            .collect();
        let mut rng = StdRng::seed_from_u64(3);
        let result = pair_first_round(&players, 1.0, &mut rng).unwrap();

        let mut seen = HashSet::new();
        for draft in &result.drafts {
            for id in draft.players() {
                assert!(seen.insert(id), "participant {} paired twice", id);
            }
        }
        assert_eq!(seen.len(), 9);
    }

    #[test]
    fn test_too_few_players() {
        let players = vec![player(1, 1500)];
        let mut rng = StdRng::seed_from_u64(1);
        let err = pair_first_round(&players, 1.0, &mut rng).unwrap_err();
        assert!(matches!(
            err,
            PairingError::InsufficientParticipants { found: 1 }
        ));
    }
}

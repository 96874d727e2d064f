//! Dutch-system pairing for rounds after the first.
//!
//! The round is built in stages: bye selection over an odd field, partition
//! into score groups, a top-down walk pairing each group top-half against
//! bottom-half while floating unpairable players downward, and a residual
//! pass over whatever reaches the bottom unpaired.
//!
//! All state here is a per-call working copy; the persistent histories are
//! read-only inputs.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::debug;

use crate::history::{HistoryIndex, PlayerHistory};
use crate::models::{MatchDraft, Participant, ParticipantId, TournamentSettings};
use crate::tiebreak::{self, EPSILON};

use super::color::{color_preference, pair_penalty, resolve_colors};
use super::{PairingError, PairingResult};

/// Scratch copy of one player for the duration of a pairing call.
#[derive(Debug, Clone)]
struct Entrant {
    id: ParticipantId,
    rating: u32,
    score: f64,
    buchholz: f64,
    pref: i8,
    had_bye: bool,
    opponents: HashSet<ParticipantId>,
}

impl Entrant {
    fn can_play(&self, other: &Entrant) -> bool {
        !self.opponents.contains(&other.id)
    }
}

/// Pair a round from existing histories.
///
/// Callers route round 1 to [`super::pair_first_round`]; this function
/// assumes at least one round of history exists.
pub fn pair_round(
    participants: &[Participant],
    history: &HistoryIndex,
    settings: &TournamentSettings,
) -> Result<PairingResult, PairingError> {
    let mut pool = entrants(participants, history);
    if pool.len() < 2 {
        return Err(PairingError::InsufficientParticipants { found: pool.len() });
    }

    let mut bye_entrant = select_bye(&mut pool, settings);
    let groups = score_groups(pool);
    debug!(
        groups = groups.len(),
        bye = bye_entrant.as_ref().map(|e| e.id),
        "pairing round across score groups"
    );

    let mut pairs: Vec<(Entrant, Entrant)> = Vec::new();
    let mut floaters: Vec<Entrant> = Vec::new();

    for (gi, group) in groups.iter().enumerate() {
        let mut u: Vec<Entrant> = Vec::with_capacity(floaters.len() + group.len());
        u.append(&mut floaters);
        u.extend(group.iter().cloned());

        if u.len() % 2 == 1 {
            if let Some(next) = groups.get(gi + 1) {
                if let Some(floater) = choose_down_floater(&mut u, next) {
                    debug!(player = floater.id, "down-floating to next score group");
                    floaters.push(floater);
                }
            }
        }

        let (mut group_pairs, mut unpaired) = pair_group(u);
        pairs.append(&mut group_pairs);
        floaters.append(&mut unpaired);
    }

    // residual pass over whatever reached the bottom unpaired
    let mut stuck: Vec<Entrant> = Vec::new();
    let mut residual = floaters;
    while !residual.is_empty() {
        let a = residual.remove(0);
        let mut best: Option<(u32, usize)> = None;
        for (j, b) in residual.iter().enumerate() {
            if !a.can_play(b) {
                continue;
            }
            let pen = pair_penalty(a.pref, b.pref);
            match best {
                Some((bp, _)) if bp <= pen => {}
                _ => best = Some((pen, j)),
            }
        }
        match best {
            Some((_, j)) => {
                let b = residual.remove(j);
                pairs.push((a, b));
            }
            None => stuck.push(a),
        }
    }

    if stuck.len() == 1 && bye_entrant.is_none() {
        bye_entrant = stuck.pop();
    }
    if !stuck.is_empty() {
        let residual_ids: Vec<ParticipantId> = stuck.iter().map(|e| e.id).collect();
        return Err(PairingError::PairingInfeasible {
            residual: residual_ids,
        });
    }

    let mut drafts = Vec::with_capacity(pairs.len() + 1);
    for (i, (a, b)) in pairs.iter().enumerate() {
        let (white, black) =
            resolve_colors((a.id, a.pref, a.rating), (b.id, b.pref, b.rating));
        drafts.push(MatchDraft::board((i + 1) as u32, white, black));
    }
    let bye_id = bye_entrant.map(|e| e.id);
    if let Some(id) = bye_id {
        drafts.push(MatchDraft::bye((pairs.len() + 1) as u32, id, settings.bye_points));
    }

    Ok(PairingResult {
        drafts,
        bye: bye_id,
    })
}

/// Build the ranked working pool: active players ordered by score, then
/// rating, then id.
fn entrants(participants: &[Participant], history: &HistoryIndex) -> Vec<Entrant> {
    let empty = PlayerHistory::default();
    let mut pool: Vec<Entrant> = participants
        .iter()
        .filter(|p| p.active)
        .map(|p| {
            let h = history.get(&p.id).unwrap_or(&empty);
            Entrant {
                id: p.id,
                rating: p.rating,
                score: h.score,
                buchholz: tiebreak::buchholz(h, history),
                pref: color_preference(h),
                had_bye: h.had_bye,
                opponents: h.opponents.clone(),
            }
        })
        .collect();
    pool.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(b.rating.cmp(&a.rating))
            .then(a.id.cmp(&b.id))
    });
    pool
}

/// Pick the bye recipient from an odd pool, removing it.
///
/// Best candidate: no previous bye (when repeats are forbidden), then lowest
/// score, then lowest Buchholz, then the lowest-ranked player in the pool.
fn select_bye(pool: &mut Vec<Entrant>, settings: &TournamentSettings) -> Option<Entrant> {
    if pool.len() % 2 == 0 {
        return None;
    }
    let mut best: Option<usize> = None;
    for i in 0..pool.len() {
        let better = match best {
            None => true,
            Some(j) => bye_order(&pool[i], i, &pool[j], j, settings) == Ordering::Less,
        };
        if better {
            best = Some(i);
        }
    }
    best.map(|i| pool.remove(i))
}

fn bye_order(
    a: &Entrant,
    a_pos: usize,
    b: &Entrant,
    b_pos: usize,
    settings: &TournamentSettings,
) -> Ordering {
    if settings.forbid_repeat_bye {
        match a.had_bye.cmp(&b.had_bye) {
            Ordering::Equal => {}
            other => return other,
        }
    }
    a.score
        .total_cmp(&b.score)
        .then(a.buchholz.total_cmp(&b.buchholz))
        .then(b_pos.cmp(&a_pos))
}

/// Partition a ranked pool into runs of equal score.
fn score_groups(pool: Vec<Entrant>) -> Vec<Vec<Entrant>> {
    let mut groups: Vec<Vec<Entrant>> = Vec::new();
    for entrant in pool {
        match groups.last_mut() {
            Some(group) if (group[0].score - entrant.score).abs() < EPSILON => {
                group.push(entrant)
            }
            _ => groups.push(vec![entrant]),
        }
    }
    groups
}

/// Choose the down-floater from the bottom half of an odd group.
///
/// Only candidates with at least one legal opponent below qualify. The score
/// prefers a color preference the next group can cancel, with the candidate's
/// position from the top as the secondary term; exact ties go to the
/// lowest-ranked candidate.
fn choose_down_floater(u: &mut Vec<Entrant>, next_group: &[Entrant]) -> Option<Entrant> {
    let avg_pref: f64 =
        next_group.iter().map(|e| e.pref as f64).sum::<f64>() / next_group.len() as f64;

    let mut best: Option<(f64, usize)> = None;
    for i in (u.len() / 2)..u.len() {
        let candidate = &u[i];
        if !next_group.iter().any(|n| candidate.can_play(n)) {
            continue;
        }
        let fit = 100.0 * (candidate.pref as f64 + avg_pref).abs() + i as f64;
        best = match best {
            None => Some((fit, i)),
            Some((best_fit, best_i)) => {
                if fit < best_fit - 1e-9 || ((fit - best_fit).abs() <= 1e-9 && i > best_i) {
                    Some((fit, i))
                } else {
                    Some((best_fit, best_i))
                }
            }
        };
    }
    best.map(|(_, i)| u.remove(i))
}

/// Pair a group top-half against bottom-half.
///
/// Greedy with one repair move: when `S1[i]` has no legal free candidate, an
/// earlier assignment may hand over its bottom-half player if it can move to
/// another free one. Whoever still cannot be paired floats down.
fn pair_group(u: Vec<Entrant>) -> (Vec<(Entrant, Entrant)>, Vec<Entrant>) {
    let mut s1 = u;
    let s2 = s1.split_off(s1.len() / 2);
    let mut used = vec![false; s2.len()];
    let mut assigned: Vec<(Entrant, usize)> = Vec::new();
    let mut floated: Vec<Entrant> = Vec::new();

    for a in s1 {
        if let Some(j) = best_candidate(&a, &s2, &used) {
            used[j] = true;
            assigned.push((a, j));
            continue;
        }

        let mut plan: Option<(usize, usize, usize)> = None;
        for k in 0..assigned.len() {
            let taken = assigned[k].1;
            if !a.can_play(&s2[taken]) {
                continue;
            }
            if let Some(alt) = best_candidate(&assigned[k].0, &s2, &used) {
                plan = Some((k, alt, taken));
                break;
            }
        }
        match plan {
            Some((k, alt, taken)) => {
                used[alt] = true;
                assigned[k].1 = alt;
                assigned.push((a, taken));
            }
            None => floated.push(a),
        }
    }

    let pairs: Vec<(Entrant, Entrant)> = assigned
        .into_iter()
        .map(|(a, j)| (a, s2[j].clone()))
        .collect();
    for (j, b) in s2.into_iter().enumerate() {
        if !used[j] {
            floated.push(b);
        }
    }
    (pairs, floated)
}

/// Cheapest legal free bottom-half candidate for `a`, earliest on ties.
fn best_candidate(a: &Entrant, s2: &[Entrant], used: &[bool]) -> Option<usize> {
    let mut best: Option<(u32, usize)> = None;
    for (j, b) in s2.iter().enumerate() {
        if used[j] || !a.can_play(b) {
            continue;
        }
        let pen = pair_penalty(a.pref, b.pref);
        match best {
            Some((best_pen, _)) if best_pen <= pen => {}
            _ => best = Some((pen, j)),
        }
    }
    best.map(|(_, j)| j)
}

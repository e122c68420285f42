//! # Scoring
//! Pure functions from weight maps to raw totals, percentages, a confidence
//! label and a realm ranking. No I/O and no shared state: every call starts
//! from a fresh zeroed accumulator.
//!
//! Raw vs normalized: confidence and ranking work on **raw** totals (the
//! thresholds are tuned to raw weight magnitudes); percentages are only for
//! reporting.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tracing::debug;

use crate::error::ScoringError;
use crate::realm::{Realm, RealmScores, REALM_COUNT};
use crate::weights::WeightMap;

/// Top-two gap strictly above this is `Strong`.
pub const STRONG_GAP: u32 = 15;
/// Top-two gap strictly above this (and not strong) is `Moderate`.
pub const MODERATE_GAP: u32 = 8;

/// Allowed drift of the percentage sum away from 100.
pub const NORMALIZE_TOLERANCE: i64 = 3;

/// How decisively the top realm outscored the runner-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Strong,
    Moderate,
    Mixed,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::Strong => "strong",
            Confidence::Moderate => "moderate",
            Confidence::Mixed => "mixed",
        }
    }
}

/// Fold weight maps into raw per-realm totals. Order does not matter.
///
/// Fails with `ScoreOverflow` instead of clamping when a total leaves `u32`.
pub fn accumulate<'a, I>(weight_maps: I) -> Result<RealmScores, ScoringError>
where
    I: IntoIterator<Item = &'a WeightMap>,
{
    let mut scores = RealmScores::zeroed();
    for w in weight_maps {
        for (realm, weight) in w.entries() {
            scores[realm] = scores[realm]
                .checked_add(weight)
                .ok_or(ScoringError::ScoreOverflow { realm })?;
        }
    }
    Ok(scores)
}

/// Convert raw totals into integer percentages.
///
/// Each entry is `round(raw / total * 100)` with half-away-from-zero
/// rounding. If that leaves the sum more than `NORMALIZE_TOLERANCE` away
/// from 100, the entries with the largest rounding error in the offending
/// direction are nudged by one until it is back within tolerance.
/// A zero total yields all zeros.
pub fn normalize(raw: &RealmScores) -> RealmScores {
    let total = raw.total();
    if total == 0 {
        return RealmScores::zeroed();
    }

    let mut exact = [0.0f64; REALM_COUNT];
    let mut out = [0u32; REALM_COUNT];
    for (realm, value) in raw.iter() {
        let share = f64::from(value) * 100.0 / total as f64;
        exact[realm.index()] = share;
        out[realm.index()] = share.round() as u32;
    }

    let mut drift: i64 = out.iter().map(|&v| i64::from(v)).sum::<i64>() - 100;
    if drift.abs() > NORMALIZE_TOLERANCE {
        debug!(drift, "normalization drift out of tolerance, correcting");
    }

    // Too high: take one back from the entry rounded up the most.
    // Ties: lowest raw value first, then the later registry position.
    while drift > NORMALIZE_TOLERANCE {
        let pick = (0..REALM_COUNT)
            .filter(|&i| f64::from(out[i]) - exact[i] > 0.0)
            .max_by(|&a, &b| {
                let ea = f64::from(out[a]) - exact[a];
                let eb = f64::from(out[b]) - exact[b];
                ea.total_cmp(&eb)
                    .then_with(|| raw.as_array()[b].cmp(&raw.as_array()[a]))
                    .then_with(|| a.cmp(&b))
            });
        match pick {
            Some(i) => {
                out[i] -= 1;
                drift -= 1;
            }
            None => break,
        }
    }

    // Too low: give one to the entry rounded down the most.
    // Ties: earliest registry position.
    while drift < -NORMALIZE_TOLERANCE {
        let pick = (0..REALM_COUNT)
            .filter(|&i| exact[i] - f64::from(out[i]) > 0.0)
            .max_by(|&a, &b| {
                let ea = exact[a] - f64::from(out[a]);
                let eb = exact[b] - f64::from(out[b]);
                ea.total_cmp(&eb).then_with(|| b.cmp(&a))
            });
        match pick {
            Some(i) => {
                out[i] += 1;
                drift += 1;
            }
            None => break,
        }
    }

    RealmScores::from_array(out)
}

/// Sum of normalized values minus 100 (diagnostics and tests).
pub fn normalization_drift(normalized: &RealmScores) -> i64 {
    normalized.total() as i64 - 100
}

/// Derive the confidence label from the gap between the two largest raw totals.
pub fn classify_confidence(raw: &RealmScores) -> Confidence {
    let mut sorted = *raw.as_array();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let gap = sorted[0] - sorted[1];

    if gap > STRONG_GAP {
        Confidence::Strong
    } else if gap > MODERATE_GAP {
        Confidence::Moderate
    } else {
        Confidence::Mixed
    }
}

/// All realms ordered by raw score descending; equal scores keep registry order.
pub fn rank(raw: &RealmScores) -> [Realm; REALM_COUNT] {
    let mut ranked = Realm::ALL;
    // stable sort over registry order == (score desc, registry index asc)
    ranked.sort_by_key(|&r| Reverse(raw[r]));
    ranked
}

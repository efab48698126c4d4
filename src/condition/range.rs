//! Range condition geometry.
//!
//! Distances are measured token-center to token-center on the active
//! scene, then classified against the configured band thresholds. The
//! holder's reference point is their first token on the scene; an actor
//! with no token fails every range condition.

use crate::catalog::{RangeBand, RangeMode, RangeSubject};
use crate::core::config::RangeBandThresholds;
use crate::host::{Host, TokenSnapshot};

use super::context::EvalContext;

fn mode_satisfied(bands: &RangeBandThresholds, mode: RangeMode, band: RangeBand, d: f64) -> bool {
    match mode {
        // VeryFar is unbounded, so Within it always holds and Beyond it
        // never does.
        RangeMode::Within => bands.threshold(band).is_none_or(|t| d <= t),
        RangeMode::At => bands.band_of(d) == band,
        RangeMode::Beyond => bands.threshold(band).is_some_and(|t| d > t),
    }
}

/// Evaluate a range condition.
///
/// `Target` and `Attacker` subjects demand that ALL candidate tokens
/// satisfy the predicate (an effect against "targets within melee" should
/// not fire when one of three targets is across the room). `Friends` and
/// `Enemies` count satisfying tokens scene-wide and compare against the
/// condition's minimum.
pub fn check_range<H: Host>(
    host: &H,
    bands: &RangeBandThresholds,
    mode: RangeMode,
    band: RangeBand,
    subject: RangeSubject,
    count: u32,
    ctx: &EvalContext,
) -> bool {
    let tokens = host.scene_tokens();
    let Some(origin) = tokens.iter().find(|t| t.actor == Some(ctx.actor)) else {
        return false;
    };

    let satisfies = |candidate: &TokenSnapshot| {
        mode_satisfied(bands, mode, band, origin.distance_to(candidate))
    };

    match subject {
        RangeSubject::Target => {
            let mut candidates = host.user_targets();
            if candidates.is_empty() {
                if let Some(target) = ctx.target {
                    candidates = tokens
                        .iter()
                        .filter(|t| t.actor == Some(target))
                        .copied()
                        .collect();
                }
            }
            !candidates.is_empty() && candidates.iter().all(satisfies)
        }
        RangeSubject::Attacker => {
            let Some(attacker) = ctx.target else {
                return false;
            };
            let candidates: Vec<_> = tokens
                .iter()
                .filter(|t| t.actor == Some(attacker))
                .collect();
            !candidates.is_empty() && candidates.into_iter().all(|t| satisfies(t))
        }
        RangeSubject::Friends | RangeSubject::Enemies => {
            let want_same = subject == RangeSubject::Friends;
            let matching = tokens
                .iter()
                .filter(|t| t.actor != Some(ctx.actor))
                .filter(|t| (t.disposition == origin.disposition) == want_same)
                .filter(|t| satisfies(t))
                .count();
            matching as u32 >= count
        }
    }
}

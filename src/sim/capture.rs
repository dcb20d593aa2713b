//! Capture resolution between the player dot and the roamers
//!
//! Runs once per simulated tick. Roamers are visited in store order so two
//! identical worlds always resolve identically, and each dot is credited at
//! most once: only Free/Targeted dots are considered and a captured dot
//! never returns to either.

use glam::Vec2;

use super::dot::{Dot, DotState};
use super::store::EntityStore;
use crate::settings::CaptureRule;

/// Outcome of one resolver pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureReport {
    /// Dots that moved to Captured this tick
    pub captured: u32,
    /// Dots currently targeted after the pass
    pub targeted: u32,
}

/// Circles intersect (or touch)
#[inline]
pub fn intersects(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance(b) <= ra + rb
}

/// Circle `b` lies entirely inside circle `a`
#[inline]
pub fn contains(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance(b) + rb <= ra
}

impl CaptureRule {
    /// Whether `dot` is captured by `player` under this rule
    pub fn captures(self, player: &Dot, dot: &Dot) -> bool {
        match self {
            CaptureRule::Containment => contains(player.pos, player.radius, dot.pos, dot.radius),
            CaptureRule::Overlap => intersects(player.pos, player.radius, dot.pos, dot.radius),
        }
    }
}

/// Promote roamers across states based on proximity to the player dot
///
/// Without a live player every Targeted dot drops back to Free and nothing
/// else changes.
pub fn resolve(store: &mut EntityStore, rule: CaptureRule) -> CaptureReport {
    let mut report = CaptureReport::default();
    let (player, roamers) = store.split_for_capture();

    let Some(player) = player else {
        for dot in roamers.iter_mut() {
            if dot.state() == DotState::Targeted {
                dot.transition(DotState::Free);
            }
        }
        return report;
    };

    for dot in roamers.iter_mut() {
        if !dot.state().is_capturable() {
            continue;
        }
        let next = if rule.captures(player, dot) {
            DotState::Captured
        } else if intersects(player.pos, player.radius, dot.pos, dot.radius) {
            DotState::Targeted
        } else {
            DotState::Free
        };

        if next != dot.state() && dot.transition(next) && next == DotState::Captured {
            report.captured += 1;
            log::debug!(
                "Dot {} ({}) captured by player {}",
                dot.id(),
                dot.color,
                player.id()
            );
        }
        if dot.state() == DotState::Targeted {
            report.targeted += 1;
        }
    }

    report
}

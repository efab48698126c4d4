//! Duration templates.
//!
//! A duration template says how many times, or until when, an effect may
//! apply. The per-actor consumable state it drives lives in
//! [`crate::state`]; this module only defines the template vocabulary.

use serde::{Deserialize, Serialize};

/// Events that tick a countdown duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TickEvent {
    /// Start of the holder's combat turn.
    RoundStart,
    /// Every roll the holder makes.
    OnRoll,
    /// Every time the holder is attacked.
    OnAttacked,
    /// Every time the holder takes damage.
    OnDamage,
}

/// How an application is classified when consuming duration.
///
/// `NextRoll`/`NextDamage` durations only decrement when the application
/// kind matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationKind {
    Roll,
    Damage,
    Other,
}

/// Duration template on an effect definition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectDuration {
    /// Never consumed.
    #[default]
    Permanent,
    /// Consumed on first application.
    Once,
    /// Consumed after `n` applications.
    Uses(u32),
    /// Applies to the next roll only.
    NextRoll,
    /// Applies to the next hit/damage only.
    NextDamage,
    /// Active until the owning combat encounter ends.
    EndOfCombat,
    /// Ticks down on matching events; inert at zero.
    Countdown { ticks: u32, tick_on: TickEvent },
}

impl EffectDuration {
    /// Initial `remaining` budget for consumable modes, `None` for modes
    /// without a counter.
    #[must_use]
    pub fn initial_remaining(self) -> Option<u32> {
        match self {
            Self::Once | Self::NextRoll | Self::NextDamage => Some(1),
            Self::Uses(n) => Some(n),
            Self::Countdown { ticks, .. } => Some(ticks),
            Self::Permanent | Self::EndOfCombat => None,
        }
    }

    /// Whether this duration decrements for the given application kind.
    #[must_use]
    pub fn consumes_on(self, kind: ApplicationKind) -> bool {
        match self {
            Self::Permanent | Self::EndOfCombat | Self::Countdown { .. } => false,
            Self::Once | Self::Uses(_) => true,
            Self::NextRoll => kind == ApplicationKind::Roll,
            Self::NextDamage => kind == ApplicationKind::Damage,
        }
    }
}

//! Modifier definitions and lifecycle.
//!
//! A modifier is an atomic adjustment attached to one value: an amount, an
//! opaque origin, a priority, and the two fold rules that decide how it
//! combines with its priority group and how the group folds into the running
//! result. Modifiers are identities, not values — attaching the same
//! definition twice produces two distinct [`ModifierId`]s, and containment
//! checks compare ids only.
//!
//! Timed lifetimes ride on the host's [`Scheduler`](crate::Scheduler): an
//! expiring modifier removes itself when its one-shot timer fires, a ticking
//! modifier applies its amount as an impulse on every interval and retires
//! once its bounded span is exhausted.

use crate::amount::Amount;
use crate::combine::CombineRule;
use crate::error::StatError;
use crate::schedule::TimerHandle;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;
use std::time::Duration;

/// Handle to a modifier attached through a [`StatSystem`](crate::StatSystem).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModifierId(pub(crate) u64);

impl std::fmt::Display for ModifierId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// Opaque origin label carried by a modifier.
///
/// The engine never interprets it; it exists so hosts and telemetry can
/// attribute a contribution ("poison", an item id, a buff name).
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Origin(Arc<str>);

impl Serialize for Origin {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Origin {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Origin::from(s))
    }
}

impl Origin {
    /// The label text. Empty for anonymous modifiers.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Origin {
    fn default() -> Self {
        Self(Arc::from(""))
    }
}

impl From<&str> for Origin {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for Origin {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            f.write_str("(anonymous)")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Span of a ticking lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TickSpan {
    /// Tick until `0` time remains; the total must be a whole multiple of
    /// the interval.
    Bounded(Duration),
    /// Tick until explicitly removed.
    Unbounded,
}

/// How long a modifier stays attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lifetime {
    /// Attached until explicitly removed.
    Permanent,
    /// Standing contribution that removes itself after `duration`.
    Expiring { duration: Duration },
    /// Impulse applicator: every `every`, the amount is folded into the
    /// target's current amount via the modifier's `finalize` rule. Ticking
    /// modifiers never contribute to a derived value's standing fold.
    Ticking { span: TickSpan, every: Duration },
}

impl Lifetime {
    pub(crate) fn is_ticking(self) -> bool {
        matches!(self, Self::Ticking { .. })
    }
}

/// Scheduling state of an attached modifier.
///
/// `Pending` is the pre-activation state, `Scheduled` is live (permanent
/// modifiers sit here with no timer), and `Expired`/`Cancelled` are terminal:
/// expiry is the timer firing to completion, cancellation is early removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierPhase {
    Pending,
    Scheduled { timer: Option<TimerHandle> },
    Expired,
    Cancelled,
}

/// Definition of a modifier, built fluently and attached with
/// [`StatSystem::apply_modifier`](crate::StatSystem::apply_modifier).
///
/// # Examples
///
/// ```rust
/// use statflow::{CombineRule, Modifier};
///
/// // +15 armor from an equipped shield, folded after the priority-0 group.
/// let shield = Modifier::new(15.0)
///     .with_priority(1)
///     .with_origin("tower-shield");
/// assert_eq!(shield.priority, 1);
/// assert_eq!(shield.stack, CombineRule::Sum);
/// ```
///
/// Timed variants validate at construction:
///
/// ```rust
/// use statflow::{Modifier, StatError, TickSpan};
/// use std::time::Duration;
///
/// let err = Modifier::ticking(
///     -2.0,
///     TickSpan::Bounded(Duration::from_secs(5)),
///     Duration::from_secs(2),
/// )
/// .unwrap_err();
/// assert!(matches!(err, StatError::InvalidDuration { .. }));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Modifier {
    /// Contribution amount (or impulse amount for ticking lifetimes).
    pub amount: Amount,
    /// Opaque attribution label.
    pub origin: Origin,
    /// Fold order: lower priorities fold into the result earlier.
    pub priority: i32,
    /// How this contribution joins its priority-group subtotal.
    pub stack: CombineRule,
    /// How the group subtotal (or a tick impulse) folds into the result.
    pub finalize: CombineRule,
    /// Attachment lifetime.
    pub lifetime: Lifetime,
}

impl Modifier {
    /// Permanent modifier with default fold rules (sum/sum) at priority 0.
    pub fn new(amount: Amount) -> Self {
        Self {
            amount,
            origin: Origin::default(),
            priority: 0,
            stack: CombineRule::Sum,
            finalize: CombineRule::Sum,
            lifetime: Lifetime::Permanent,
        }
    }

    /// Modifier that removes itself from its target after `duration`.
    pub fn expiring(amount: Amount, duration: Duration) -> Self {
        Self {
            lifetime: Lifetime::Expiring { duration },
            ..Self::new(amount)
        }
    }

    /// Modifier that applies `amount` as an impulse every `every`, retiring
    /// once a bounded `span` has elapsed.
    ///
    /// Fails with [`StatError::InvalidInterval`] for a zero interval and
    /// [`StatError::InvalidDuration`] when a bounded span is zero or not a
    /// whole multiple of the interval — the instance is never constructed.
    pub fn ticking(amount: Amount, span: TickSpan, every: Duration) -> Result<Self, StatError> {
        if every.is_zero() {
            return Err(StatError::InvalidInterval);
        }
        if let TickSpan::Bounded(total) = span {
            if total.is_zero() || total.as_nanos() % every.as_nanos() != 0 {
                return Err(StatError::InvalidDuration { span: total, every });
            }
        }
        Ok(Self {
            lifetime: Lifetime::Ticking { span, every },
            ..Self::new(amount)
        })
    }

    /// Set the fold priority (lower folds earlier).
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the attribution label.
    pub fn with_origin(mut self, origin: impl Into<Origin>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Set the stack rule (within-group fold, seeded with `0.0`).
    pub fn with_stack(mut self, rule: CombineRule) -> Self {
        self.stack = rule;
        self
    }

    /// Set the finalize rule (group-into-result fold).
    pub fn with_finalize(mut self, rule: CombineRule) -> Self {
        self.finalize = rule;
        self
    }

    pub(crate) fn is_ticking(&self) -> bool {
        self.lifetime.is_ticking()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_permanent_sum_sum() {
        let m = Modifier::new(5.0);
        assert_eq!(m.priority, 0);
        assert_eq!(m.stack, CombineRule::Sum);
        assert_eq!(m.finalize, CombineRule::Sum);
        assert_eq!(m.lifetime, Lifetime::Permanent);
        assert_eq!(m.origin, Origin::default());
    }

    #[test]
    fn ticking_requires_whole_multiple() {
        let err = Modifier::ticking(
            1.0,
            TickSpan::Bounded(Duration::from_secs(7)),
            Duration::from_secs(2),
        )
        .unwrap_err();
        assert_eq!(
            err,
            StatError::InvalidDuration {
                span: Duration::from_secs(7),
                every: Duration::from_secs(2),
            }
        );
    }

    #[test]
    fn ticking_accepts_exact_multiple_and_unbounded() {
        assert!(Modifier::ticking(
            1.0,
            TickSpan::Bounded(Duration::from_secs(6)),
            Duration::from_secs(2)
        )
        .is_ok());
        assert!(Modifier::ticking(1.0, TickSpan::Unbounded, Duration::from_millis(250)).is_ok());
    }

    #[test]
    fn ticking_rejects_zero_interval_and_zero_span() {
        assert_eq!(
            Modifier::ticking(1.0, TickSpan::Unbounded, Duration::ZERO).unwrap_err(),
            StatError::InvalidInterval
        );
        assert!(matches!(
            Modifier::ticking(1.0, TickSpan::Bounded(Duration::ZERO), Duration::from_secs(1))
                .unwrap_err(),
            StatError::InvalidDuration { .. }
        ));
    }

    #[test]
    fn origin_display() {
        assert_eq!(Origin::from("poison").to_string(), "poison");
        assert_eq!(Origin::default().to_string(), "(anonymous)");
    }
}

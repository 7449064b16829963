//! Clamping constraints bound to dependency values.
//!
//! A constraint is a pure clamp attached to one value and parameterized by
//! the live amounts of other values. Attaching one (via
//! [`StatSystem::add_constraint`](crate::StatSystem::add_constraint))
//! subscribes the protected value to each dependency, so a bound moving
//! re-triggers recalculation of the protected value without host involvement.

use crate::amount::{clamp_floor, clamp_span, Amount};
use crate::value::ValueId;
use serde::{Deserialize, Serialize};

/// Handle to a constraint attached to a value cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstraintId(pub(crate) u64);

/// A clamp rule over dependency values.
///
/// `apply` never mutates a dependency; the dependency amounts are read at
/// fold time, so the clamp always reflects the bounds' current state.
///
/// # Examples
///
/// ```rust
/// use statflow::{Constraint, StatSystem, ValueSpec};
///
/// let (mut system, _clock) = StatSystem::with_manual_clock();
/// let min = system.add_value(ValueSpec::Plain(0.0));
/// let hp = system.add_value(ValueSpec::Constrained(50.0));
/// system.add_constraint(hp, Constraint::floor(min)).unwrap();
///
/// system.set_amount(hp, -20.0).unwrap();
/// assert_eq!(system.amount(hp).unwrap(), 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constraint {
    /// Keep the protected amount at or above `min`'s amount.
    Floor { min: ValueId },
    /// Keep the protected amount within `[min, max]`. On an inverted range
    /// the minimum wins (see [`clamp_span`](crate::amount::clamp_span)).
    Range { min: ValueId, max: ValueId },
}

impl Constraint {
    /// Floor constraint bound to `min`.
    pub fn floor(min: ValueId) -> Self {
        Self::Floor { min }
    }

    /// Range constraint bound to `min` and `max`.
    pub fn range(min: ValueId, max: ValueId) -> Self {
        Self::Range { min, max }
    }

    /// The values this constraint reads.
    pub fn dependencies(&self) -> Vec<ValueId> {
        match *self {
            Self::Floor { min } => vec![min],
            Self::Range { min, max } => vec![min, max],
        }
    }

    /// Clamp a proposed amount against the bounds' current amounts.
    pub(crate) fn apply(&self, proposed: Amount, amount_of: impl Fn(ValueId) -> Amount) -> Amount {
        match *self {
            Self::Floor { min } => clamp_floor(proposed, amount_of(min)),
            Self::Range { min, max } => clamp_span(proposed, amount_of(min), amount_of(max)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(amounts: &[(ValueId, Amount)]) -> impl Fn(ValueId) -> Amount + '_ {
        move |id| {
            amounts
                .iter()
                .find(|(v, _)| *v == id)
                .map(|(_, a)| *a)
                .unwrap_or(0.0)
        }
    }

    #[test]
    fn floor_clamps_against_dependency() {
        let min = ValueId(0);
        let rule = Constraint::floor(min);
        let lookup = [(min, 10.0)];
        assert_eq!(rule.apply(3.0, fixed(&lookup)), 10.0);
        assert_eq!(rule.apply(12.0, fixed(&lookup)), 12.0);
    }

    #[test]
    fn range_clamps_both_ends() {
        let (min, max) = (ValueId(0), ValueId(1));
        let rule = Constraint::range(min, max);
        let lookup = [(min, 0.0), (max, 100.0)];
        assert_eq!(rule.apply(-5.0, fixed(&lookup)), 0.0);
        assert_eq!(rule.apply(250.0, fixed(&lookup)), 100.0);
        assert_eq!(rule.apply(42.0, fixed(&lookup)), 42.0);
    }

    #[test]
    fn range_with_crossed_bounds_yields_min() {
        let (min, max) = (ValueId(0), ValueId(1));
        let rule = Constraint::range(min, max);
        let lookup = [(min, 20.0), (max, 10.0)];
        assert_eq!(rule.apply(15.0, fixed(&lookup)), 20.0);
    }

    #[test]
    fn dependencies_are_listed_min_first() {
        let (min, max) = (ValueId(3), ValueId(7));
        assert_eq!(Constraint::floor(min).dependencies(), vec![min]);
        assert_eq!(Constraint::range(min, max).dependencies(), vec![min, max]);
    }
}

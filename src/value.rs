//! Reactive value cells.
//!
//! Every stat amount lives in a cell owned by the
//! [`StatSystem`](crate::StatSystem) arena and addressed by a copyable
//! [`ValueId`]. A cell's behavior is picked by its [`ValueKind`]: the write
//! path composes constraint folding, the write lock and derivation explicitly
//! instead of spreading them across an inheritance chain.

use crate::amount::Amount;
use crate::constraint::{Constraint, ConstraintId};
use crate::modifier::ModifierId;
use serde::{Deserialize, Serialize};

/// Handle to a value cell inside a [`StatSystem`](crate::StatSystem).
///
/// Ids are arena indices: cheap to copy, stable for the life of the system
/// (cells are never destroyed; their lifetime is bound to the owning stat).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ValueId(pub(crate) u32);

impl ValueId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ValueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to a change subscription on a single value cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub(crate) u64);

/// Behavior tag of a value cell.
///
/// Each kind layers one capability on top of the previous one:
///
/// | kind | write path |
/// |---|---|
/// | `Plain` | store + notify |
/// | `Constrained` | constraint fold, then store + notify |
/// | `Modifiable` | as `Constrained`, plus a modifier collection (amount still externally driven) |
/// | `Derived` | amount computed from a fixed base plus modifiers; direct writes rejected |
/// | `Locked` | single construction-time write, then immutable |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Plain,
    Constrained,
    Modifiable,
    Derived,
    Locked,
}

impl ValueKind {
    /// Whether cells of this kind accept constraints.
    pub fn accepts_constraints(self) -> bool {
        matches!(self, Self::Constrained | Self::Modifiable | Self::Derived)
    }

    /// Whether cells of this kind accept modifiers.
    pub fn accepts_modifiers(self) -> bool {
        matches!(self, Self::Modifiable | Self::Derived)
    }

    /// Whether external writes are rejected outright.
    pub fn write_locked(self) -> bool {
        matches!(self, Self::Derived | Self::Locked)
    }
}

/// Construction recipe for a value cell.
///
/// # Examples
///
/// ```rust
/// use statflow::{StatSystem, ValueKind, ValueSpec};
///
/// let (mut system, _clock) = StatSystem::with_manual_clock();
/// let hp = system.add_value(ValueSpec::Modifiable(100.0));
/// let armor = system.add_value(ValueSpec::Derived { base: 12.0 });
///
/// assert_eq!(system.kind(hp).unwrap(), ValueKind::Modifiable);
/// assert_eq!(system.amount(armor).unwrap(), 12.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ValueSpec {
    /// Bare reactive cell with an initial amount.
    Plain(Amount),
    /// Constrained cell with an initial amount.
    Constrained(Amount),
    /// Constrained cell that also carries modifiers; amount written by the host.
    Modifiable(Amount),
    /// Cell whose amount is wholly derived from `base` plus its modifiers.
    Derived { base: Amount },
    /// Cell locked at its initial amount.
    Locked(Amount),
}

impl ValueSpec {
    pub(crate) fn kind(self) -> ValueKind {
        match self {
            Self::Plain(_) => ValueKind::Plain,
            Self::Constrained(_) => ValueKind::Constrained,
            Self::Modifiable(_) => ValueKind::Modifiable,
            Self::Derived { .. } => ValueKind::Derived,
            Self::Locked(_) => ValueKind::Locked,
        }
    }

    pub(crate) fn initial(self) -> Amount {
        match self {
            Self::Plain(a)
            | Self::Constrained(a)
            | Self::Modifiable(a)
            | Self::Locked(a) => a,
            Self::Derived { base } => base,
        }
    }
}

/// Change notification payload delivered to subscribers.
///
/// Carries the data of the change only; subscribers observe, they do not get
/// a handle back into the system (cascading recalculation is engine-internal).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmountChanged {
    /// The cell that changed.
    pub value: ValueId,
    /// Amount before the write.
    pub previous: Amount,
    /// Amount after the write.
    pub amount: Amount,
}

/// Host-side change callback.
pub type ChangeCallback = Box<dyn FnMut(&AmountChanged)>;

/// One entry in a cell's multicast list, dispatched in registration order.
pub(crate) enum Subscriber {
    /// Constraint wiring: a change here re-triggers recalculation of `dependent`.
    Trigger { dependent: ValueId },
    /// Host callback.
    Callback(ChangeCallback),
}

/// A constraint attached to a cell, with the subscriptions it planted on its
/// dependency cells (needed to detach cleanly).
pub(crate) struct ConstraintEntry {
    pub(crate) id: ConstraintId,
    pub(crate) rule: Constraint,
    pub(crate) links: Vec<(ValueId, SubscriptionId)>,
}

pub(crate) struct ValueCell {
    pub(crate) amount: Amount,
    pub(crate) kind: ValueKind,
    /// Fixed base for `Derived` cells; unused otherwise.
    pub(crate) base: Amount,
    /// Distinct standing-modifier priorities, ascending. `Derived` only.
    pub(crate) priorities: Vec<i32>,
    /// Constraint chain in registration order.
    pub(crate) constraints: Vec<ConstraintEntry>,
    /// Attached modifiers in insertion order.
    pub(crate) modifiers: Vec<ModifierId>,
    /// Multicast list in registration order.
    pub(crate) subscribers: Vec<(SubscriptionId, Subscriber)>,
    /// Subscriptions dropped while their entry was checked out for dispatch.
    pub(crate) dropped: Vec<SubscriptionId>,
}

impl ValueCell {
    pub(crate) fn new(spec: ValueSpec) -> Self {
        let base = match spec {
            ValueSpec::Derived { base } => base,
            _ => 0.0,
        };
        Self {
            amount: spec.initial(),
            kind: spec.kind(),
            base,
            priorities: Vec::new(),
            constraints: Vec::new(),
            modifiers: Vec::new(),
            subscribers: Vec::new(),
            dropped: Vec::new(),
        }
    }
}

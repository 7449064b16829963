//! Named stat composition.
//!
//! A `Stat` pairs a current value with optional bound values and remembers
//! the wiring. Registration order matters: bounds are created before the
//! current value so the constraint chain attaches against live cells — see
//! the `add_*_stat` constructors on [`StatSystem`](crate::StatSystem).

use crate::stat_key::StatKey;
use crate::value::ValueId;
use serde::{Deserialize, Serialize};

/// A registered stat: a current value plus optional min/max bound values.
///
/// The struct is a cheap handle (ids and an interned key); cloning it never
/// touches the underlying cells.
///
/// # Examples
///
/// ```rust
/// use statflow::{StatSystem, ValueSpec};
///
/// let (mut system, _clock) = StatSystem::with_manual_clock();
/// let hp = system
///     .add_range_stat(
///         "hp",
///         ValueSpec::Modifiable(80.0),
///         ValueSpec::Plain(0.0),
///         ValueSpec::Plain(100.0),
///     )
///     .unwrap();
///
/// assert_eq!(hp.key().as_str(), "hp");
/// assert!(hp.min().is_some());
/// assert_eq!(system.amount(hp.current()).unwrap(), 80.0);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub(crate) key: StatKey,
    pub(crate) current: ValueId,
    pub(crate) min: Option<ValueId>,
    pub(crate) max: Option<ValueId>,
}

impl Stat {
    /// The stat's registered name.
    pub fn key(&self) -> &StatKey {
        &self.key
    }

    /// The current value cell.
    pub fn current(&self) -> ValueId {
        self.current
    }

    /// The lower-bound cell, if this stat was registered with a floor.
    pub fn min(&self) -> Option<ValueId> {
        self.min
    }

    /// The upper-bound cell, if this stat was registered with a range.
    pub fn max(&self) -> Option<ValueId> {
        self.max
    }
}

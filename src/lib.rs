//! # statflow - Reactive Stat Engine for Games
//!
//! A reactive numeric-attribute engine:
//! - **Push-based** propagation (a bound moving re-clamps everything built on it)
//! - **Hardcode-free** design (no built-in stat names like "HP" or "ATK")
//! - **Priority-stacked** modifiers with pluggable fold rules
//! - **Timed** modifiers riding on a host-provided, cancellable scheduler
//!
//! ## Core Concepts
//!
//! ### Value cells
//!
//! Every amount lives in a cell owned by the [`StatSystem`] and addressed by
//! a [`ValueId`]. A cell's [`ValueKind`] picks its write path:
//!
//! ```text
//! Plain        store + notify
//! Constrained  constraint fold -> store + notify
//! Modifiable   constraint fold -> store + notify, carries modifiers
//! Derived      base (+ modifiers) -> constraint fold -> store + notify
//! Locked       immutable after construction
//! ```
//!
//! Writes that do not change the stored amount notify nobody, which is what
//! keeps synchronous cascades bounded.
//!
//! ### Constraints and propagation
//!
//! A [`Constraint`] clamps one value against the *live* amounts of other
//! values. Attaching one subscribes the protected value to its bounds, so a
//! bound moving re-triggers recalculation with no host involvement.
//!
//! ### Modifiers
//!
//! A [`Modifier`] is an identity-addressed contribution with a priority and
//! two fold rules. Derived cells recompute from their fixed base whenever
//! the modifier set changes: groups fold in ascending priority order, each
//! group stacking from zero. Expiring and ticking lifetimes arm timers on
//! the host [`Scheduler`] and retire themselves.
//!
//! ## Example
//!
//! ```rust
//! use statflow::{Modifier, StatSystem, ValueSpec};
//!
//! let (mut system, _clock) = StatSystem::with_manual_clock();
//!
//! // A derived attack stat: base 10, two priority-0 bonuses, one late bonus.
//! let attack = system
//!     .add_stat("attack", ValueSpec::Derived { base: 10.0 })
//!     .unwrap();
//! system.apply_modifier(attack.current(), Modifier::new(5.0)).unwrap();
//! system.apply_modifier(attack.current(), Modifier::new(3.0)).unwrap();
//! system
//!     .apply_modifier(attack.current(), Modifier::new(2.0).with_priority(1))
//!     .unwrap();
//!
//! // 10 + (5 + 3) + 2
//! assert_eq!(system.stat_amount("attack").unwrap(), 20.0);
//! ```
//!
//! ## Modules
//!
//! - [`amount`] - Numeric foundation and clamp policy
//! - [`stat_key`] - Interned stat names
//! - [`value`] - Value cells, kinds, subscriptions
//! - [`constraint`] - Floor/range clamps bound to dependency values
//! - [`combine`] - Fold rules for modifier stacking
//! - [`modifier`] - Modifier definitions and lifecycle
//! - [`stat`] - Named stat composition
//! - [`system`] - The stat system root
//! - [`relation`] - Dependency wiring and setup-time validation
//! - [`schedule`] - Scheduler capability and the manual clock
//! - [`telemetry`] - Observational event sink
//! - [`error`] - Error types

pub mod amount;
pub mod combine;
pub mod constraint;
pub mod error;
pub mod modifier;
pub mod relation;
pub mod schedule;
pub mod stat;
pub mod stat_key;
pub mod system;
pub mod telemetry;
pub mod value;

// Re-export main types for convenience
pub use amount::Amount;
pub use combine::CombineRule;
pub use constraint::{Constraint, ConstraintId};
pub use error::StatError;
pub use modifier::{Lifetime, Modifier, ModifierId, ModifierPhase, Origin, TickSpan};
pub use relation::Relation;
pub use schedule::{ManualScheduler, Scheduler, SharedScheduler, TimerHandle};
pub use stat::Stat;
pub use stat_key::StatKey;
pub use system::StatSystem;
pub use telemetry::{MemorySink, NullSink, SharedSink, TelemetryEvent, TelemetrySink, TraceSink};
pub use value::{AmountChanged, SubscriptionId, ValueId, ValueKind, ValueSpec};

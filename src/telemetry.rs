//! Telemetry sink for engine lifecycle events.
//!
//! Every observable transition — an amount committing, a timed modifier
//! being scheduled, expiring, being cancelled, or ticking — is reported to
//! the system's sink. Events are purely observational: nothing in the engine
//! branches on whether or how they are consumed.
//!
//! Three sinks ship with the crate: [`NullSink`] (the default),
//! [`MemorySink`] (collects events, used heavily in tests) and [`TraceSink`]
//! (forwards to the `tracing` facade).

use crate::amount::Amount;
use crate::modifier::ModifierId;
use crate::value::ValueId;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// An observational engine event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    /// A cell committed a new amount.
    AmountChanged {
        value: ValueId,
        previous: Amount,
        amount: Amount,
    },
    /// A modifier was activated (timed lifetimes armed a timer here).
    ModifierScheduled { modifier: ModifierId, target: ValueId },
    /// A timed modifier ran to completion and detached itself.
    ModifierExpired { modifier: ModifierId, target: ValueId },
    /// A modifier was deactivated before expiry.
    ModifierCancelled { modifier: ModifierId, target: ValueId },
    /// A ticking modifier applied one impulse.
    ModifierTicked {
        modifier: ModifierId,
        target: ValueId,
        amount: Amount,
    },
    /// Diagnostic: activation requested on an already-active modifier.
    DuplicateActivation { modifier: ModifierId },
    /// Diagnostic: deactivation or removal of a modifier that is not active
    /// on the given target. The operation itself is a no-op.
    RedundantDeactivation { modifier: ModifierId },
}

/// Consumer of [`TelemetryEvent`]s.
pub trait TelemetrySink {
    fn record(&mut self, event: &TelemetryEvent);
}

/// Shared sink handle as consumed by [`StatSystem`](crate::StatSystem).
pub type SharedSink = Rc<RefCell<dyn TelemetrySink>>;

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn record(&mut self, _event: &TelemetryEvent) {}
}

/// Collects events in order.
///
/// # Examples
///
/// ```rust
/// use statflow::{MemorySink, StatSystem, TelemetryEvent, ValueSpec};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let sink = Rc::new(RefCell::new(MemorySink::new()));
/// let (mut system, _clock) = StatSystem::with_manual_clock();
/// system.set_telemetry(sink.clone());
///
/// let hp = system.add_value(ValueSpec::Plain(10.0));
/// system.set_amount(hp, 7.0).unwrap();
///
/// assert_eq!(
///     sink.borrow().events(),
///     &[TelemetryEvent::AmountChanged { value: hp, previous: 10.0, amount: 7.0 }]
/// );
/// ```
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Vec<TelemetryEvent>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded so far, in order.
    pub fn events(&self) -> &[TelemetryEvent] {
        &self.events
    }

    /// Drain and return all recorded events.
    pub fn take(&mut self) -> Vec<TelemetryEvent> {
        std::mem::take(&mut self.events)
    }
}

impl TelemetrySink for MemorySink {
    fn record(&mut self, event: &TelemetryEvent) {
        self.events.push(*event);
    }
}

/// Forwards events to `tracing` at debug level (diagnostics at warn).
#[derive(Debug, Default, Clone, Copy)]
pub struct TraceSink;

impl TelemetrySink for TraceSink {
    fn record(&mut self, event: &TelemetryEvent) {
        match *event {
            TelemetryEvent::AmountChanged {
                value,
                previous,
                amount,
            } => tracing::debug!(%value, previous, amount, "amount changed"),
            TelemetryEvent::ModifierScheduled { modifier, target } => {
                tracing::debug!(%modifier, %target, "modifier scheduled");
            }
            TelemetryEvent::ModifierExpired { modifier, target } => {
                tracing::debug!(%modifier, %target, "modifier expired");
            }
            TelemetryEvent::ModifierCancelled { modifier, target } => {
                tracing::debug!(%modifier, %target, "modifier cancelled");
            }
            TelemetryEvent::ModifierTicked {
                modifier,
                target,
                amount,
            } => tracing::trace!(%modifier, %target, amount, "modifier ticked"),
            TelemetryEvent::DuplicateActivation { modifier } => {
                tracing::warn!(%modifier, "duplicate activation ignored");
            }
            TelemetryEvent::RedundantDeactivation { modifier } => {
                tracing::warn!(%modifier, "redundant deactivation ignored");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_collects_in_order() {
        let mut sink = MemorySink::new();
        let a = TelemetryEvent::DuplicateActivation {
            modifier: ModifierId(1),
        };
        let b = TelemetryEvent::RedundantDeactivation {
            modifier: ModifierId(2),
        };
        sink.record(&a);
        sink.record(&b);
        assert_eq!(sink.events(), &[a, b]);
        assert_eq!(sink.take(), vec![a, b]);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn null_sink_discards() {
        let mut sink = NullSink;
        sink.record(&TelemetryEvent::DuplicateActivation {
            modifier: ModifierId(9),
        });
    }
}

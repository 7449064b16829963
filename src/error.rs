//! Error types for the stat engine.
//!
//! Fatal conditions surface as [`StatError`]; recoverable lifecycle noise
//! (redundant activation or deactivation of a modifier) is deliberately not
//! an error — it is a no-op observable only through telemetry.

use crate::stat_key::StatKey;
use crate::value::ValueId;
use std::time::Duration;
use thiserror::Error;

/// Format a cycle path as a readable chain.
fn format_cycle(path: &[ValueId]) -> String {
    if path.is_empty() {
        return String::from("(empty cycle)");
    }
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Errors raised by the stat engine.
///
/// # Examples
///
/// ```rust
/// use statflow::{StatSystem, StatError, ValueSpec};
///
/// let (mut system, _clock) = StatSystem::with_manual_clock();
/// let armor = system.add_value(ValueSpec::Locked(10.0));
///
/// let err = system.set_amount(armor, 99.0).unwrap_err();
/// assert_eq!(err, StatError::ImmutableWrite(armor));
/// assert_eq!(system.amount(armor).unwrap(), 10.0);
/// ```
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StatError {
    /// Write attempted on a locked or derived value.
    ///
    /// The value is left unchanged; derived amounts are a function of their
    /// base and modifier set and can only move through recalculation.
    #[error("value {0} is write-protected")]
    ImmutableWrite(ValueId),

    /// A bounded ticking span is not an exact multiple of the tick interval
    /// (or is zero, which could never tick).
    #[error("ticking span {span:?} is not a whole multiple of interval {every:?}")]
    InvalidDuration { span: Duration, every: Duration },

    /// A ticking interval of zero was requested.
    #[error("ticking interval must be non-zero")]
    InvalidInterval,

    /// The operation is not supported by the value's kind, e.g. attaching a
    /// modifier to a plain cell.
    #[error("value {value} does not support {operation}")]
    Unsupported {
        value: ValueId,
        operation: &'static str,
    },

    /// A value id that does not belong to this system.
    #[error("unknown value {0}")]
    UnknownValue(ValueId),

    /// No stat registered under this key.
    #[error("unknown stat: {0}")]
    UnknownStat(StatKey),

    /// A stat with this key is already registered.
    #[error("stat already registered: {0}")]
    DuplicateStat(StatKey),

    /// Dependency wiring forms a cycle.
    ///
    /// Only returned by [`StatSystem::validate`](crate::StatSystem::validate);
    /// the write path never checks for cycles.
    #[error("dependency cycle: {}", format_cycle(.path))]
    Cycle { path: Vec<ValueId> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_value() {
        let err = StatError::ImmutableWrite(ValueId(4));
        assert!(err.to_string().contains("#4"));
    }

    #[test]
    fn display_names_the_stat() {
        let err = StatError::UnknownStat(StatKey::new("hp"));
        assert!(err.to_string().contains("hp"));
    }

    #[test]
    fn cycle_display_shows_path() {
        let err = StatError::Cycle {
            path: vec![ValueId(0), ValueId(1), ValueId(0)],
        };
        let text = err.to_string();
        assert!(text.contains("dependency cycle"));
        assert!(text.contains("#0 -> #1 -> #0"));
    }

    #[test]
    fn duration_mismatch_display() {
        let err = StatError::InvalidDuration {
            span: Duration::from_secs(5),
            every: Duration::from_secs(2),
        };
        assert!(err.to_string().contains("5s"));
        assert!(err.to_string().contains("2s"));
    }
}

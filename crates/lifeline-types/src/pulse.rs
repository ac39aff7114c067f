use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Coarse epoch counter that buckets records in time.
///
/// Pulses are supplied from outside the store and are only expected to be
/// roughly monotonic. Two writes of identical content in the same pulse share
/// an address; the same content in a different pulse does not.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct PulseNumber(pub u32);

impl PulseNumber {
    /// Size of the pulse in its fixed-width key encoding.
    pub const SIZE: usize = 4;

    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    /// Big-endian bytes, so that keys sort by pulse first.
    pub fn to_be_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }

    pub fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_be_bytes(bytes))
    }
}

impl fmt::Debug for PulseNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pulse({})", self.0)
    }
}

impl fmt::Display for PulseNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for PulseNumber {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Supplies the pulse that new records are addressed under.
pub trait PulseSource: Send + Sync {
    /// The pulse in effect right now.
    fn current(&self) -> PulseNumber;
}

/// Wall-clock pulse: unix seconds divided by a fixed period.
#[derive(Clone, Debug)]
pub struct SystemPulse {
    period_secs: u64,
}

impl SystemPulse {
    /// Default pulse length in seconds.
    pub const DEFAULT_PERIOD_SECS: u64 = 10;

    /// Create a pulse source with the given period. A zero period is treated
    /// as one second.
    pub fn new(period_secs: u64) -> Self {
        Self {
            period_secs: period_secs.max(1),
        }
    }

    pub fn period_secs(&self) -> u64 {
        self.period_secs
    }
}

impl Default for SystemPulse {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PERIOD_SECS)
    }
}

impl PulseSource for SystemPulse {
    fn current(&self) -> PulseNumber {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        PulseNumber((secs / self.period_secs) as u32)
    }
}

/// Externally driven pulse counter.
///
/// Used by tests and by embedders that learn about pulse changes from
/// elsewhere (e.g. a consensus layer) and push them in.
#[derive(Debug, Default)]
pub struct ManualPulse {
    current: AtomicU32,
}

impl ManualPulse {
    pub fn new(start: PulseNumber) -> Self {
        Self {
            current: AtomicU32::new(start.0),
        }
    }

    /// Jump to an explicit pulse.
    pub fn set(&self, pulse: PulseNumber) {
        self.current.store(pulse.0, Ordering::SeqCst);
    }

    /// Move to the next pulse and return it.
    pub fn advance(&self) -> PulseNumber {
        PulseNumber(self.current.fetch_add(1, Ordering::SeqCst).wrapping_add(1))
    }
}

impl PulseSource for ManualPulse {
    fn current(&self) -> PulseNumber {
        PulseNumber(self.current.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn be_bytes_roundtrip() {
        let pulse = PulseNumber::new(0x0102_0304);
        assert_eq!(pulse.to_be_bytes(), [1, 2, 3, 4]);
        assert_eq!(PulseNumber::from_be_bytes([1, 2, 3, 4]), pulse);
    }

    #[test]
    fn manual_pulse_set_and_advance() {
        let source = ManualPulse::new(PulseNumber(7));
        assert_eq!(source.current(), PulseNumber(7));
        assert_eq!(source.advance(), PulseNumber(8));
        assert_eq!(source.current(), PulseNumber(8));
        source.set(PulseNumber(100));
        assert_eq!(source.current(), PulseNumber(100));
    }

    #[test]
    fn system_pulse_buckets_by_period() {
        let fine = SystemPulse::new(1).current();
        let coarse = SystemPulse::new(10).current();
        // Both derive from the same clock, so the coarse pulse is roughly a
        // tenth of the fine one.
        assert!(coarse.value() <= fine.value() / 10 + 1);
        assert!(coarse.value() > 0);
    }

    #[test]
    fn zero_period_is_clamped() {
        assert_eq!(SystemPulse::new(0).period_secs(), 1);
    }

    #[test]
    fn debug_and_display() {
        let pulse = PulseNumber(42);
        assert_eq!(format!("{pulse}"), "42");
        assert_eq!(format!("{pulse:?}"), "Pulse(42)");
    }
}

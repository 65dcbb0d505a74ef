use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared storage for one scalar parameter.
///
/// The module holds a slot for every control it declares and reads it during
/// `compute`; the UI reads and writes the very same slot through the element
/// tree. Values are f64 bits in an `AtomicU64`, so a slot can be hit from the
/// audio and presentation paths concurrently without locking. Multi-field
/// transactional updates are explicitly not part of the contract.
#[derive(Clone, Debug)]
pub struct ParamSlot(Arc<AtomicU64>);

impl ParamSlot {
    pub fn new(value: f64) -> Self {
        Self(Arc::new(AtomicU64::new(value.to_bits())))
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    /// True when both slots alias the same storage.
    pub fn shares_storage(&self, other: &ParamSlot) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for ParamSlot {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_values() {
        let slot = ParamSlot::new(0.25);
        assert_eq!(slot.get(), 0.25);
        slot.set(-3.5);
        assert_eq!(slot.get(), -3.5);
    }

    #[test]
    fn clones_alias_storage() {
        let slot = ParamSlot::new(1.0);
        let view = slot.clone();
        view.set(2.0);
        assert_eq!(slot.get(), 2.0);
        assert!(slot.shares_storage(&view));
        assert!(!slot.shares_storage(&ParamSlot::new(2.0)));
    }
}

use std::{
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

use tourist_model::PinID;

/// Pins with a live acquire/refresh run.
#[derive(Debug, Default, Clone)]
pub struct InFlightPins {
    pins: Arc<Mutex<HashSet<PinID>>>,
}

impl InFlightPins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `pin` for a run. `None` when a run already holds it.
    pub fn try_claim(&self, pin: PinID) -> Option<InFlightGuard> {
        let mut set = self.pins.lock().unwrap_or_else(PoisonError::into_inner);
        if !set.insert(pin) {
            return None;
        }
        Some(InFlightGuard {
            pins: Arc::clone(&self.pins),
            pin,
        })
    }

    pub fn contains(&self, pin: PinID) -> bool {
        self.pins
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&pin)
    }

    pub fn len(&self) -> usize {
        self.pins.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases the claim on drop, including when the owning task panics.
#[derive(Debug)]
pub struct InFlightGuard {
    pins: Arc<Mutex<HashSet<PinID>>>,
    pin: PinID,
}

impl InFlightGuard {
    pub fn pin(&self) -> PinID {
        self.pin
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.pins
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.pin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_is_exclusive_per_pin_until_dropped() {
        let in_flight = InFlightPins::new();
        let (a, b) = (PinID::new(), PinID::new());

        let guard = in_flight.try_claim(a).expect("first claim");
        assert!(in_flight.try_claim(a).is_none());
        let other = in_flight.try_claim(b).expect("other pin is independent");
        assert_eq!(in_flight.len(), 2);

        drop(guard);
        assert!(!in_flight.contains(a));
        assert!(in_flight.try_claim(a).is_some());
        drop(other);
    }
}

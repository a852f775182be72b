use std::{
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use rand::{SeedableRng, rngs::StdRng, seq::index};

/// Uniform random source shared by every run of a service.
///
/// Seed it for reproducible selections in tests and diagnostics.
#[derive(Clone)]
pub struct SharedRng(Arc<Mutex<StdRng>>);

impl fmt::Debug for SharedRng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedRng").finish_non_exhaustive()
    }
}

impl SharedRng {
    pub fn from_os_rng() -> Self {
        Self(Arc::new(Mutex::new(StdRng::from_os_rng())))
    }

    pub fn seeded(seed: u64) -> Self {
        Self(Arc::new(Mutex::new(StdRng::seed_from_u64(seed))))
    }

    /// `min(amount, pool)` distinct indices in `0..pool`, drawn uniformly
    /// without replacement.
    pub fn sample_indices(&self, pool: usize, amount: usize) -> Vec<usize> {
        let amount = amount.min(pool);
        if amount == 0 {
            return Vec::new();
        }
        let mut rng = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        index::sample(&mut *rng, pool, amount).into_vec()
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

/// Token identifying one navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(u64);

/// Tracks the most recent navigation so late listings can be dropped.
///
/// Every call to `begin` supersedes the ones before it.
#[derive(Debug, Default)]
pub struct NavigationGuard {
    latest: AtomicU64,
}

impl NavigationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Generation {
        Generation(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.latest.load(Ordering::SeqCst) == generation.0
    }
}

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::store::FrontStore;

/// Store path holding whether any blocking work is in flight.
pub const LOCKED_PATH: &str = "block/locked";

/// Reentrant busy indicator. The UI is locked while the count is non-zero.
#[derive(Default)]
pub struct BusyCounter {
    count: AtomicUsize,
    store: Option<Arc<FrontStore>>,
}

impl BusyCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A counter that mirrors `locked()` into `store` at [`LOCKED_PATH`].
    pub fn with_store(store: Arc<FrontStore>) -> Self {
        store.set(LOCKED_PATH, false);
        Self {
            count: AtomicUsize::new(0),
            store: Some(store),
        }
    }

    pub fn locked(&self) -> bool {
        self.depth() > 0
    }

    pub fn depth(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Hold the lock until the guard drops.
    pub fn enter(&self) -> BusyGuard<'_> {
        if self.count.fetch_add(1, Ordering::SeqCst) == 0 {
            self.publish(true);
        }
        BusyGuard { counter: self }
    }

    /// Run `fut` with the lock held; released however `fut` completes.
    pub async fn with<F: Future>(&self, fut: F) -> F::Output {
        let _guard = self.enter();
        fut.await
    }

    fn publish(&self, locked: bool) {
        if let Some(store) = &self.store {
            store.set(LOCKED_PATH, locked);
        }
    }
}

pub struct BusyGuard<'a> {
    counter: &'a BusyCounter,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        if self.counter.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.counter.publish(false);
        }
    }
}

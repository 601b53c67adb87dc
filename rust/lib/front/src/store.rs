use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::FrontError;
use crate::topic::Subscriptions;

/// Change callback: `(path, new value)`; `None` when the path was removed.
pub type ChangeHandler = Arc<dyn Fn(&str, Option<&Value>) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

#[derive(Clone)]
struct Subscriber {
    id: SubscriptionId,
    handler: ChangeHandler,
}

/// Path-addressed front state with pattern subscriptions.
///
/// Values are JSON so any serializable model can live here. Subscribers are
/// called synchronously, and only when a value actually changes.
pub struct FrontStore {
    values: RwLock<BTreeMap<String, Value>>,
    subscribers: RwLock<Subscriptions<Subscriber>>,
    next_id: AtomicU64,
}

impl FrontStore {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(BTreeMap::new()),
            subscribers: RwLock::new(Subscriptions::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Store `value` at `path`. Returns whether anything changed.
    pub fn set(&self, path: &str, value: impl Into<Value>) -> bool {
        let value = value.into();
        {
            let mut values = self.values.write().unwrap();
            if values.get(path) == Some(&value) {
                return false;
            }
            values.insert(path.to_string(), value.clone());
        }
        self.notify(path, Some(&value));
        true
    }

    /// Serialize `value` and store it at `path`.
    pub fn set_serialized<T: Serialize>(&self, path: &str, value: &T) -> Result<bool, FrontError> {
        Ok(self.set(path, serde_json::to_value(value)?))
    }

    pub fn get(&self, path: &str) -> Option<Value> {
        self.values.read().unwrap().get(path).cloned()
    }

    /// Read and deserialize the value at `path`.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, FrontError> {
        match self.get(path) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Remove `path`, notifying subscribers with `None` if it was set.
    pub fn remove(&self, path: &str) -> Option<Value> {
        let old = self.values.write().unwrap().remove(path);
        if old.is_some() {
            self.notify(path, None);
        }
        old
    }

    pub fn contains(&self, path: &str) -> bool {
        self.values.read().unwrap().contains_key(path)
    }

    /// Entries strictly below `prefix`, ordered by path.
    pub fn scan(&self, prefix: &str) -> Vec<(String, Value)> {
        let below = format!("{}/", prefix);
        self.values
            .read()
            .unwrap()
            .range(below.clone()..)
            .take_while(|(k, _)| k.starts_with(&below))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn subscribe<F>(&self, pattern: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&str, Option<&Value>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().unwrap().insert(
            pattern,
            Subscriber {
                id,
                handler: Arc::new(handler),
            },
        );
        id
    }

    pub fn unsubscribe(&self, pattern: &str, id: SubscriptionId) -> bool {
        self.subscribers
            .write()
            .unwrap()
            .remove(pattern, |s| s.id == id)
    }

    fn notify(&self, path: &str, value: Option<&Value>) {
        // Handlers run without the lock held so they may touch the store.
        let matching = self.subscribers.read().unwrap().matching(path);
        for subscriber in matching {
            (subscriber.handler)(path, value);
        }
    }
}

impl Default for FrontStore {
    fn default() -> Self {
        Self::new()
    }
}

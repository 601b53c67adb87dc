use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::definition::{QueryDefinition, QueryValues};
use crate::query::merged_url;
use crate::url::UrlObject;

/// Client-side history. Implementations navigate without reloading the page.
pub trait Navigator: Send + Sync {
    /// The current location.
    fn location(&self) -> UrlObject;

    /// Push a new history entry.
    fn push(&self, url: UrlObject);

    /// Replace the current history entry.
    fn replace(&self, url: UrlObject);

    /// Go back one entry; no-op at the start of history.
    fn back(&self);
}

/// Merge `values` into the navigator's current query and push the result.
pub fn push_merged(navigator: &dyn Navigator, def: &QueryDefinition, values: &QueryValues) {
    let url = merged_url(def, &navigator.location(), values);
    debug!(href = %url, "push merged query");
    navigator.push(url);
}

/// A page's bound "update my query" action.
#[derive(Clone)]
pub struct Pusher {
    navigator: Arc<dyn Navigator>,
    def: Arc<QueryDefinition>,
}

impl Pusher {
    pub fn new(navigator: Arc<dyn Navigator>, def: Arc<QueryDefinition>) -> Self {
        Self { navigator, def }
    }

    pub fn push(&self, values: &QueryValues) {
        push_merged(self.navigator.as_ref(), &self.def, values);
    }
}

struct HistoryState {
    entries: Vec<UrlObject>,
    cursor: usize,
}

/// In-memory history stack.
///
/// `push` drops any forward entries, like a browser does.
pub struct MemoryHistory {
    state: RwLock<HistoryState>,
}

impl MemoryHistory {
    pub fn new(start: UrlObject) -> Self {
        Self {
            state: RwLock::new(HistoryState {
                entries: vec![start],
                cursor: 0,
            }),
        }
    }

    /// Start at a parsed `"/path?query"` href.
    pub fn at(href: &str) -> Self {
        Self::new(UrlObject::parse(href))
    }

    /// All entries, oldest first.
    pub fn entries(&self) -> Vec<UrlObject> {
        self.state.read().unwrap().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().unwrap().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Navigator for MemoryHistory {
    fn location(&self) -> UrlObject {
        let state = self.state.read().unwrap();
        state.entries[state.cursor].clone()
    }

    fn push(&self, url: UrlObject) {
        let mut state = self.state.write().unwrap();
        let keep = state.cursor + 1;
        state.entries.truncate(keep);
        state.entries.push(url);
        state.cursor = keep;
    }

    fn replace(&self, url: UrlObject) {
        let mut state = self.state.write().unwrap();
        let cursor = state.cursor;
        state.entries[cursor] = url;
    }

    fn back(&self) {
        let mut state = self.state.write().unwrap();
        state.cursor = state.cursor.saturating_sub(1);
    }
}

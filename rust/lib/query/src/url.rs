//! Value types of the generated URL table.

use std::fmt;
use std::sync::Arc;

use crate::definition::{Parsed, QueryDefinition, QueryValues};
use crate::query::{encode_query, parse_query};
use crate::raw::{RawQuery, split_url};

/// A navigation target: pathname plus query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlObject {
    pub pathname: String,
    pub query: RawQuery,
}

impl UrlObject {
    pub fn new(pathname: impl Into<String>) -> Self {
        Self {
            pathname: pathname.into(),
            query: RawQuery::new(),
        }
    }

    pub fn with_query(pathname: impl Into<String>, query: RawQuery) -> Self {
        Self {
            pathname: pathname.into(),
            query,
        }
    }

    /// Parse `"/path?query"`; the fragment is dropped.
    pub fn parse(href: &str) -> Self {
        let (path, query) = split_url(href);
        Self::with_query(path, RawQuery::parse(query))
    }

    /// `pathname`, followed by `?query` when the query is not empty.
    pub fn href(&self) -> String {
        let query = self.query.to_query_string();
        if query.is_empty() {
            self.pathname.clone()
        } else {
            format!("{}?{}", self.pathname, query)
        }
    }
}

impl fmt::Display for UrlObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.href())
    }
}

/// Table entry for a page that declares no query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageUrl {
    pathname: &'static str,
}

impl PageUrl {
    pub const fn new(pathname: &'static str) -> Self {
        Self { pathname }
    }

    pub fn pathname(&self) -> &'static str {
        self.pathname
    }

    pub fn url(&self) -> UrlObject {
        UrlObject::new(self.pathname)
    }
}

/// Table entry for a page with a declared query: builds typed links.
#[derive(Debug, Clone)]
pub struct PageQueryUrl {
    pathname: &'static str,
    query: Arc<QueryDefinition>,
}

impl PageQueryUrl {
    pub fn new(pathname: &'static str, query: QueryDefinition) -> Self {
        Self {
            pathname,
            query: Arc::new(query),
        }
    }

    pub fn pathname(&self) -> &'static str {
        self.pathname
    }

    pub fn query(&self) -> &Arc<QueryDefinition> {
        &self.query
    }

    /// Link to this page carrying `values`.
    pub fn url(&self, values: &QueryValues) -> UrlObject {
        UrlObject::with_query(self.pathname, encode_query(&self.query, values))
    }

    /// Decode this page's fields from a location's query.
    pub fn parse(&self, location: &UrlObject) -> Parsed {
        parse_query(&self.query, &location.query)
    }
}

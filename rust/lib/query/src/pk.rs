use std::fmt;

use crate::codec::{CNat, Codec};
use crate::raw::RawQuery;

/// Literal used on the wire for a record that does not exist yet.
pub const NEW_PK: &str = "new";

/// Primary key of an edit-style page.
///
/// `New` is the "create" sentinel and never collides with an existing id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pk {
    New,
    Existing(i64),
}

impl Pk {
    pub fn is_new(&self) -> bool {
        matches!(self, Pk::New)
    }

    /// The existing id, or `None` for the sentinel.
    pub fn nullify(&self) -> Option<i64> {
        match self {
            Pk::New => None,
            Pk::Existing(pk) => Some(*pk),
        }
    }
}

impl fmt::Display for Pk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pk::New => f.write_str(NEW_PK),
            Pk::Existing(pk) => write!(f, "{}", pk),
        }
    }
}

impl From<i64> for Pk {
    fn from(pk: i64) -> Self {
        Pk::Existing(pk)
    }
}

/// What an edit-style page should render for its `pk` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PkTarget {
    /// `pk=new`: render an empty form.
    Create,
    /// A positive id: fetch the record, then render it.
    Edit(i64),
    /// Missing, malformed or non-positive: render the not-found page.
    NotFound,
}

impl PkTarget {
    /// Resolve the target from the first value of `key` in a raw query.
    pub fn from_query(query: &RawQuery, key: &str) -> Self {
        let params = query.all(key);
        let Some(first) = params.first() else {
            return PkTarget::NotFound;
        };
        if first == NEW_PK {
            return PkTarget::Create;
        }
        match CNat.decode(first, params) {
            Some(pk) => PkTarget::Edit(pk),
            None => PkTarget::NotFound,
        }
    }
}

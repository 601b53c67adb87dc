//! Typed URL query parameters for the pmp front end.
//!
//! Pages declare the shape of their query once, as a [`QueryDefinition`]
//! built from codecs, and then use it in both directions:
//!
//! - [`parse_query`]: raw location query to [`Parsed`] typed fields
//! - [`encode_query`]: [`QueryValues`] to raw query for an outgoing link
//! - [`merged_url`] / [`push_merged`]: patch the current query and navigate
//!
//! # Codecs
//!
//! | codec | value | wire |
//! |---|---|---|
//! | [`CString`], [`CType`] | `String` | as-is |
//! | [`CInt`] | `i64` | decimal |
//! | [`CNat`] | `i64` (>= 1) | decimal |
//! | [`CBool`] | `bool` | `true` / `false` |
//! | [`CTimestamp`] | `DateTime<FixedOffset>` | ISO-8601 with offset |
//! | [`CPk`] | [`Pk`] | `new` or decimal |
//! | [`CStringUnion`] | caller type | `Display` |
//! | [`CArray`] | `Vec<_>` | repeated key |
//!
//! Decoding never fails loudly: a malformed parameter is simply missing
//! from the parsed result.
//!
//! # Example
//!
//! ```ignore
//! use pmp_query::*;
//!
//! let def = define_query! { category: CString, page: CNat };
//! let parsed = parse_query(&def, &RawQuery::parse("?category=Daily"));
//! assert_eq!(parsed.get::<String>("category").map(String::as_str), Some("Daily"));
//!
//! let history = MemoryHistory::at("/scene?category=Daily&sort=new");
//! push_merged(&history, &def, &QueryValues::new().remove("category").set("page", 2i64));
//! assert_eq!(history.location().href(), "/scene?sort=new&page=2");
//! ```

pub mod codec;
pub mod definition;
pub mod navigator;
pub mod pk;
pub mod query;
pub mod raw;
pub mod url;
pub mod value;

pub use codec::{
    CArray, CBool, CInt, CNat, CPk, CString, CStringUnion, CTimestamp, CType, Codec, Encoded,
    parse_int_safe,
};
pub use definition::{
    Field, NamedCodec, Parsed, Patch, QueryDefinition, QueryDefinitionBuilder, QueryValues,
};
pub use navigator::{MemoryHistory, Navigator, Pusher, push_merged};
pub use pk::{NEW_PK, Pk, PkTarget};
pub use query::{encode_query, merged_url, parse_query};
pub use raw::RawQuery;
pub use self::url::{PageQueryUrl, PageUrl, UrlObject};
pub use value::QueryValue;

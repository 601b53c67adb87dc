//! Bridge between a URL's raw query parameters and typed field values.

use tracing::warn;

use crate::definition::{Patch, Parsed, QueryDefinition, QueryValues};
use crate::raw::RawQuery;
use crate::url::UrlObject;
use crate::value::QueryValue;

/// Decode every declared field present in `raw`.
///
/// A field is decoded with its first raw value and the full list of values
/// sharing its key. Missing parameters and failed decodes leave the field
/// out of the result.
pub fn parse_query(def: &QueryDefinition, raw: &RawQuery) -> Parsed {
    let mut parsed = Parsed::default();
    for field in def.fields() {
        let params = raw.all(field.name());
        let Some(first) = params.first() else {
            continue;
        };
        if let Some(value) = field.decode(first, params) {
            parsed.insert(field.name(), value);
        }
    }
    parsed
}

/// Encode the `Set` fields of `values` into a fresh query.
///
/// `Remove` fields are omitted, as are fields that encode to no values (an
/// empty array). Fields unknown to `def`, or holding a value of the wrong
/// type, are logged and skipped; the rest still encode.
pub fn encode_query(def: &QueryDefinition, values: &QueryValues) -> RawQuery {
    let mut query = RawQuery::new();
    for (name, patch) in values.iter() {
        let Patch::Set(value) = patch else {
            continue;
        };
        match encode_field(def, name, value) {
            Some(encoded) if !encoded.is_empty() => query.insert(name, encoded),
            _ => {}
        }
    }
    query
}

/// Apply `values` on top of `location`'s current query, keeping its pathname.
///
/// `Remove` deletes the key, `Set` overwrites it in place (or appends it),
/// and keys not mentioned in `values` are preserved. A `Set` that encodes to
/// no values deletes the key like `Remove`.
pub fn merged_url(def: &QueryDefinition, location: &UrlObject, values: &QueryValues) -> UrlObject {
    let mut query = location.query.clone();
    for (name, patch) in values.iter() {
        match patch {
            Patch::Remove => {
                query.remove(name);
            }
            Patch::Set(value) => match encode_field(def, name, value) {
                Some(encoded) if encoded.is_empty() => {
                    query.remove(name);
                }
                Some(encoded) => query.insert(name, encoded),
                None => {}
            },
        }
    }
    UrlObject {
        pathname: location.pathname.clone(),
        query,
    }
}

fn encode_field(def: &QueryDefinition, name: &str, value: &QueryValue) -> Option<Vec<String>> {
    let Some(field) = def.get(name) else {
        warn!(field = name, value = ?value, "field is not part of the query definition, skipping");
        return None;
    };
    match field.encode(value) {
        Some(encoded) => Some(encoded.into_vec()),
        None => {
            warn!(
                field = name,
                value = ?value,
                expected = field.value_type(),
                "query value has the wrong type, skipping"
            );
            None
        }
    }
}

//! Typed converters between in-memory values and query-string parameters.
//!
//! Every codec is a pure `encode` / `decode` pair. `decode` receives the
//! first raw value of a parameter together with all raw values sharing the
//! key, and returns `None` for anything it cannot read. A failed decode is
//! never an error: the caller observes it exactly like a missing parameter.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone};

use crate::pk::{NEW_PK, Pk};

/// Wire form produced by [`Codec::encode`]: one value or a repeated key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoded {
    Single(String),
    Multi(Vec<String>),
}

impl Encoded {
    /// Flatten into the list of raw values attached to the key.
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Encoded::Single(s) => vec![s],
            Encoded::Multi(v) => v,
        }
    }

    /// The value `decode` receives as its primary argument.
    pub fn primary(&self) -> Option<&str> {
        match self {
            Encoded::Single(s) => Some(s),
            Encoded::Multi(v) => v.first().map(String::as_str),
        }
    }
}

impl From<String> for Encoded {
    fn from(s: String) -> Self {
        Encoded::Single(s)
    }
}

/// An encode/decode pair for one query parameter type.
///
/// `decode` must be a left inverse of `encode` on the primary value.
pub trait Codec: Send + Sync + 'static {
    type Value: Clone + fmt::Debug + PartialEq + Send + Sync + 'static;

    fn encode(&self, value: &Self::Value) -> Encoded;

    fn decode(&self, param: &str, params: &[String]) -> Option<Self::Value>;
}

// ============================================================================
// Primitive codecs
// ============================================================================

/// Plain string, passed through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct CString;

impl Codec for CString {
    type Value = String;

    fn encode(&self, value: &String) -> Encoded {
        Encoded::Single(value.clone())
    }

    fn decode(&self, param: &str, _params: &[String]) -> Option<String> {
        Some(param.to_string())
    }
}

/// Opaque type tag (e.g. a tab or media kind). Same wire form as [`CString`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CType;

impl Codec for CType {
    type Value = String;

    fn encode(&self, value: &String) -> Encoded {
        Encoded::Single(value.clone())
    }

    fn decode(&self, param: &str, _params: &[String]) -> Option<String> {
        Some(param.to_string())
    }
}

/// Signed decimal integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CInt;

/// Parse a base-10 integer, ignoring surrounding whitespace.
pub fn parse_int_safe(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok()
}

impl Codec for CInt {
    type Value = i64;

    fn encode(&self, value: &i64) -> Encoded {
        Encoded::Single(value.to_string())
    }

    fn decode(&self, param: &str, _params: &[String]) -> Option<i64> {
        parse_int_safe(param)
    }
}

/// Natural number (>= 1). Zero, negatives and non-numbers are one failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct CNat;

impl Codec for CNat {
    type Value = i64;

    fn encode(&self, value: &i64) -> Encoded {
        CInt.encode(value)
    }

    fn decode(&self, param: &str, params: &[String]) -> Option<i64> {
        CInt.decode(param, params).filter(|n| *n >= 1)
    }
}

/// Boolean: exactly `"true"` or `"false"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CBool;

impl Codec for CBool {
    type Value = bool;

    fn encode(&self, value: &bool) -> Encoded {
        Encoded::Single(value.to_string())
    }

    fn decode(&self, param: &str, _params: &[String]) -> Option<bool> {
        match param {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        }
    }
}

/// ISO-8601 timestamp that keeps its original UTC offset.
///
/// Values without an offset (`2024-05-01T10:00`, `2024-05-01`) are read
/// as UTC. Impossible calendar values such as `2024-02-30` fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct CTimestamp;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

fn parse_timestamp(param: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(param) {
        return Some(ts);
    }
    let utc = FixedOffset::east_opt(0)?;
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(param, format) {
            return utc.from_local_datetime(&naive).single();
        }
    }
    let date = NaiveDate::parse_from_str(param, "%Y-%m-%d").ok()?;
    utc.from_local_datetime(&date.and_hms_opt(0, 0, 0)?).single()
}

impl Codec for CTimestamp {
    type Value = DateTime<FixedOffset>;

    fn encode(&self, value: &DateTime<FixedOffset>) -> Encoded {
        Encoded::Single(value.to_rfc3339_opts(SecondsFormat::AutoSi, false))
    }

    fn decode(&self, param: &str, _params: &[String]) -> Option<DateTime<FixedOffset>> {
        parse_timestamp(param)
    }
}

/// Primary key: `"new"` or an integer id.
#[derive(Debug, Clone, Copy, Default)]
pub struct CPk;

impl Codec for CPk {
    type Value = Pk;

    fn encode(&self, value: &Pk) -> Encoded {
        match value {
            Pk::New => Encoded::Single(NEW_PK.to_string()),
            Pk::Existing(pk) => CInt.encode(pk),
        }
    }

    fn decode(&self, param: &str, params: &[String]) -> Option<Pk> {
        if param == NEW_PK {
            return Some(Pk::New);
        }
        CInt.decode(param, params).map(Pk::Existing)
    }
}

// ============================================================================
// Combinators
// ============================================================================

type UnionDecoder<T> = Arc<dyn Fn(&str) -> Option<T> + Send + Sync>;

/// Closed-set value parsed by a caller-supplied decoder, written with `Display`.
pub struct CStringUnion<T> {
    decode: UnionDecoder<T>,
}

impl<T> CStringUnion<T> {
    pub fn new<F>(decode: F) -> Self
    where
        F: Fn(&str) -> Option<T> + Send + Sync + 'static,
    {
        Self {
            decode: Arc::new(decode),
        }
    }
}

impl<T> CStringUnion<T>
where
    T: Copy + fmt::Display + Send + Sync + 'static,
{
    /// Accept exactly the `Display` form of one of `values`.
    pub fn from_values(values: &'static [T]) -> Self {
        Self::new(move |param| values.iter().copied().find(|v| v.to_string() == param))
    }
}

impl<T> Clone for CStringUnion<T> {
    fn clone(&self) -> Self {
        Self {
            decode: Arc::clone(&self.decode),
        }
    }
}

impl<T> fmt::Debug for CStringUnion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CStringUnion")
            .field("value", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Codec for CStringUnion<T>
where
    T: Clone + fmt::Debug + fmt::Display + PartialEq + Send + Sync + 'static,
{
    type Value = T;

    fn encode(&self, value: &T) -> Encoded {
        Encoded::Single(value.to_string())
    }

    fn decode(&self, param: &str, _params: &[String]) -> Option<T> {
        (self.decode)(param)
    }
}

/// List of values carried as a repeated key.
///
/// Decoding is best-effort: entries the inner codec rejects are dropped and
/// the rest keep their order. The list itself never fails.
#[derive(Debug, Clone, Default)]
pub struct CArray<C> {
    inner: C,
}

impl<C: Codec> CArray<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

impl<C: Codec> Codec for CArray<C> {
    type Value = Vec<C::Value>;

    fn encode(&self, values: &Vec<C::Value>) -> Encoded {
        Encoded::Multi(
            values
                .iter()
                .flat_map(|value| self.inner.encode(value).into_vec())
                .collect(),
        )
    }

    fn decode(&self, _param: &str, params: &[String]) -> Option<Vec<C::Value>> {
        Some(
            params
                .iter()
                .filter_map(|x| self.inner.decode(x, std::slice::from_ref(x)))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one(s: &str) -> Vec<String> {
        vec![s.to_string()]
    }

    fn round_trip<C: Codec>(codec: &C, value: &C::Value) -> Option<C::Value> {
        let encoded = codec.encode(value);
        let all = encoded.clone().into_vec();
        codec.decode(encoded.primary()?, &all)
    }

    // ========================================================================
    // Integer / natural
    // ========================================================================

    #[test]
    fn int_round_trip() {
        for n in [i64::MIN, -42, -1, 0, 1, 7, 1_000_000, i64::MAX] {
            assert_eq!(round_trip(&CInt, &n), Some(n));
        }
    }

    #[test]
    fn int_rejects_non_numeric() {
        assert_eq!(CInt.decode("abc", &one("abc")), None);
        assert_eq!(CInt.decode("", &one("")), None);
        assert_eq!(CInt.decode("1.5", &one("1.5")), None);
        assert_eq!(CInt.decode(" 12 ", &one(" 12 ")), Some(12));
    }

    #[test]
    fn nat_defined_only_from_one() {
        for n in [-5i64, -1, 0] {
            assert_eq!(round_trip(&CNat, &n), None);
        }
        for n in [1i64, 2, 99] {
            assert_eq!(round_trip(&CNat, &n), Some(n));
        }
        assert_eq!(CNat.decode("x", &one("x")), None);
    }

    // ========================================================================
    // Boolean
    // ========================================================================

    #[test]
    fn bool_accepts_exact_literals() {
        assert_eq!(CBool.decode("true", &one("true")), Some(true));
        assert_eq!(CBool.decode("false", &one("false")), Some(false));
        assert_eq!(CBool.decode("TRUE", &one("TRUE")), None);
        assert_eq!(CBool.decode("1", &one("1")), None);
        assert_eq!(CBool.encode(&true), Encoded::Single("true".into()));
    }

    // ========================================================================
    // Primary key
    // ========================================================================

    #[test]
    fn pk_cases() {
        assert_eq!(CPk.decode("new", &one("new")), Some(Pk::New));
        assert_eq!(CPk.decode("7", &one("7")), Some(Pk::Existing(7)));
        assert_eq!(CPk.decode("abc", &one("abc")), None);
        assert_eq!(CPk.encode(&Pk::New), Encoded::Single("new".into()));
        assert_eq!(CPk.encode(&Pk::Existing(7)), Encoded::Single("7".into()));
    }

    // ========================================================================
    // Timestamp
    // ========================================================================

    #[test]
    fn timestamp_keeps_offset() {
        let ts = CTimestamp
            .decode("2024-05-01T10:30:00+09:00", &[])
            .unwrap();
        assert_eq!(ts.offset().local_minus_utc(), 9 * 3600);
        assert_eq!(
            CTimestamp.encode(&ts),
            Encoded::Single("2024-05-01T10:30:00+09:00".into())
        );
        assert_eq!(round_trip(&CTimestamp, &ts), Some(ts));
    }

    #[test]
    fn timestamp_keeps_sub_millisecond_precision() {
        let ts = FixedOffset::east_opt(0)
            .unwrap()
            .timestamp_opt(1_700_000_000, 123_456_789)
            .unwrap();
        assert_eq!(
            CTimestamp.encode(&ts),
            Encoded::Single("2023-11-14T22:13:20.123456789+00:00".into())
        );
        assert_eq!(round_trip(&CTimestamp, &ts), Some(ts));

        let micros = FixedOffset::east_opt(3600)
            .unwrap()
            .timestamp_opt(1_700_000_000, 250_000)
            .unwrap();
        assert_eq!(round_trip(&CTimestamp, &micros), Some(micros));
    }

    #[test]
    fn timestamp_without_offset_is_utc() {
        let ts = CTimestamp.decode("2024-05-01", &[]).unwrap();
        assert_eq!(ts.offset().local_minus_utc(), 0);
        assert_eq!(ts.to_rfc3339(), "2024-05-01T00:00:00+00:00");

        let ts = CTimestamp.decode("2024-05-01T08:15", &[]).unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-05-01T08:15:00+00:00");
    }

    #[test]
    fn timestamp_rejects_invalid_calendar() {
        assert_eq!(CTimestamp.decode("2024-02-30", &[]), None);
        assert_eq!(CTimestamp.decode("2024-13-01T00:00:00Z", &[]), None);
        assert_eq!(CTimestamp.decode("yesterday", &[]), None);
    }

    // ========================================================================
    // String union / array
    // ========================================================================

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Letter {
        A,
        B,
    }

    impl fmt::Display for Letter {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(match self {
                Letter::A => "A",
                Letter::B => "B",
            })
        }
    }

    fn letter() -> CStringUnion<Letter> {
        CStringUnion::from_values(&[Letter::A, Letter::B])
    }

    #[test]
    fn union_closed_set() {
        assert_eq!(letter().decode("A", &[]), Some(Letter::A));
        assert_eq!(letter().decode("C", &[]), None);
        assert_eq!(letter().encode(&Letter::B), Encoded::Single("B".into()));
    }

    #[test]
    fn array_drops_invalid_entries_in_order() {
        let codec = CArray::new(letter());
        let params: Vec<String> = ["A", "X", "B"].iter().map(|s| s.to_string()).collect();
        assert_eq!(codec.decode("A", &params), Some(vec![Letter::A, Letter::B]));
    }

    #[test]
    fn array_of_nothing_valid_is_empty_not_absent() {
        let codec = CArray::new(CNat);
        let params = vec!["0".to_string(), "-3".to_string()];
        assert_eq!(codec.decode("0", &params), Some(vec![]));
    }

    #[test]
    fn array_encode_flattens_nested_lists() {
        let codec = CArray::new(CArray::new(CInt));
        let encoded = codec.encode(&vec![vec![1, 2], vec![], vec![3]]);
        assert_eq!(
            encoded,
            Encoded::Multi(vec!["1".into(), "2".into(), "3".into()])
        );
    }
}

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::warn;

use crate::codec::{Codec, Encoded};
use crate::value::QueryValue;

/// Object-safe view of a [`Codec`] over erased values.
trait ErasedCodec: Send + Sync {
    /// `None` when `value` does not hold this codec's value type.
    fn encode_value(&self, value: &QueryValue) -> Option<Encoded>;
    fn decode_value(&self, param: &str, params: &[String]) -> Option<QueryValue>;
    fn value_type(&self) -> &'static str;
}

impl<C: Codec> ErasedCodec for C {
    fn encode_value(&self, value: &QueryValue) -> Option<Encoded> {
        match value.downcast_ref::<C::Value>() {
            Some(v) => Some(self.encode(v)),
            None => value.widen::<C::Value>().map(|v| self.encode(&v)),
        }
    }

    fn decode_value(&self, param: &str, params: &[String]) -> Option<QueryValue> {
        self.decode(param, params).map(QueryValue::new)
    }

    fn value_type(&self) -> &'static str {
        std::any::type_name::<C::Value>()
    }
}

/// A codec bound to its field name. The name is the query key.
#[derive(Clone)]
pub struct NamedCodec {
    name: String,
    codec: Arc<dyn ErasedCodec>,
}

impl NamedCodec {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rust type name of the decoded value, for diagnostics.
    pub fn value_type(&self) -> &'static str {
        self.codec.value_type()
    }

    pub fn encode(&self, value: &QueryValue) -> Option<Encoded> {
        self.codec.encode_value(value)
    }

    pub fn decode(&self, param: &str, params: &[String]) -> Option<QueryValue> {
        self.codec.decode_value(param, params)
    }
}

impl fmt::Debug for NamedCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedCodec")
            .field("name", &self.name)
            .field("value", &self.value_type())
            .finish()
    }
}

/// The declared shape of one page's query parameters.
///
/// Built once and shared; fields keep declaration order.
#[derive(Debug, Clone, Default)]
pub struct QueryDefinition {
    fields: Vec<NamedCodec>,
}

impl QueryDefinition {
    pub fn builder() -> QueryDefinitionBuilder {
        QueryDefinitionBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&NamedCodec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn fields(&self) -> &[NamedCodec] {
        &self.fields
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[derive(Default)]
pub struct QueryDefinitionBuilder {
    fields: Vec<NamedCodec>,
}

impl QueryDefinitionBuilder {
    /// Attach `codec` under `name`. A repeated name replaces the earlier
    /// codec in place.
    pub fn field<C: Codec>(mut self, name: &str, codec: C) -> Self {
        let named = NamedCodec {
            name: name.to_string(),
            codec: Arc::new(codec),
        };
        match self.fields.iter_mut().find(|f| f.name == name) {
            Some(existing) => {
                warn!(field = name, "query field declared twice, keeping the last codec");
                *existing = named;
            }
            None => self.fields.push(named),
        }
        self
    }

    pub fn build(self) -> QueryDefinition {
        QueryDefinition {
            fields: self.fields,
        }
    }
}

/// Build a [`QueryDefinition`] from `field: codec` pairs.
///
/// ```ignore
/// let def = define_query! { category: CString, page: CNat };
/// ```
#[macro_export]
macro_rules! define_query {
    ($($field:ident : $codec:expr),* $(,)?) => {
        $crate::QueryDefinition::builder()
            $(.field(stringify!($field), $codec))*
            .build()
    };
}

// ============================================================================
// Field
// ============================================================================

/// Typed handle to one declared field.
///
/// Ties the field name to its codec so values are checked at compile time:
///
/// ```ignore
/// const PAGE: Field<CNat> = Field::new("page");
/// let values = QueryValues::new().put(&PAGE, 2);
/// let page: Option<&i64> = parsed.field(&PAGE);
/// ```
pub struct Field<C> {
    name: &'static str,
    codec: PhantomData<fn() -> C>,
}

impl<C> Field<C> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            codec: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<C> Clone for Field<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Field<C> {}

impl<C> fmt::Debug for Field<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.name).finish()
    }
}

// ============================================================================
// Parsed
// ============================================================================

/// Decoded query fields. Absent and undecodable parameters are both missing.
#[derive(Debug, Clone, Default)]
pub struct Parsed {
    values: Vec<(String, QueryValue)>,
}

impl Parsed {
    pub(crate) fn insert(&mut self, name: &str, value: QueryValue) {
        self.values.push((name.to_string(), value));
    }

    pub fn value(&self, name: &str) -> Option<&QueryValue> {
        self.values.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Typed access. `None` when missing or when `T` is not the codec's type.
    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.value(name).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn field<C: Codec>(&self, field: &Field<C>) -> Option<&C::Value> {
        self.get::<C::Value>(field.name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.value(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ============================================================================
// QueryValues
// ============================================================================

/// Requested change for one field when building or merging a URL.
#[derive(Debug, Clone)]
pub enum Patch {
    Set(QueryValue),
    /// Drop the key from the result.
    Remove,
}

/// Outgoing field values. Fields not mentioned are left untouched on merge.
#[derive(Debug, Clone, Default)]
pub struct QueryValues {
    entries: Vec<(String, Patch)>,
}

impl QueryValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`. Integer and `&str` literals are widened to the
    /// field's `i64` or `String` when encoded.
    pub fn set<T: Any + fmt::Debug + Send + Sync>(self, name: &str, value: T) -> Self {
        self.patch(name, Patch::Set(QueryValue::new(value)))
    }

    /// Set a field through its typed handle.
    pub fn put<C: Codec>(self, field: &Field<C>, value: C::Value) -> Self {
        self.patch(field.name, Patch::Set(QueryValue::new(value)))
    }

    pub fn remove(self, name: &str) -> Self {
        self.patch(name, Patch::Remove)
    }

    /// `Some` sets, `None` removes.
    pub fn set_opt<T: Any + fmt::Debug + Send + Sync>(self, name: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.set(name, v),
            None => self.remove(name),
        }
    }

    pub fn patch(mut self, name: &str, patch: Patch) -> Self {
        match self.entries.iter_mut().find(|(k, _)| k == name) {
            Some((_, old)) => *old = patch,
            None => self.entries.push((name.to_string(), patch)),
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Patch)> {
        self.entries.iter().map(|(k, p)| (k.as_str(), p))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<&Parsed> for QueryValues {
    fn from(parsed: &Parsed) -> Self {
        Self {
            entries: parsed
                .values
                .iter()
                .map(|(k, v)| (k.clone(), Patch::Set(v.clone())))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{CArray, CInt, CNat, CString};

    #[test]
    fn builder_keeps_declaration_order() {
        let def = define_query! { category: CString, page: CNat, tags: CArray::new(CString) };
        assert_eq!(def.names().collect::<Vec<_>>(), vec!["category", "page", "tags"]);
        assert_eq!(def.get("page").unwrap().name(), "page");
        assert!(def.get("missing").is_none());
    }

    #[test]
    fn repeated_field_replaces_in_place() {
        let def = QueryDefinition::builder()
            .field("a", CString)
            .field("b", CString)
            .field("a", CInt)
            .build();
        assert_eq!(def.len(), 2);
        assert_eq!(def.fields()[0].value_type(), "i64");
    }

    #[test]
    fn named_codec_rejects_foreign_value_type() {
        let def = define_query! { page: CNat };
        let field = def.get("page").unwrap();
        assert_eq!(
            field.encode(&QueryValue::new(3i64)),
            Some(Encoded::Single("3".into()))
        );
        assert_eq!(field.encode(&QueryValue::new("3".to_string())), None);
    }

    #[test]
    fn values_last_patch_wins() {
        let values = QueryValues::new().set("page", 1i64).remove("page").set("sort", "new".to_string());
        let patches: Vec<_> = values.iter().map(|(k, p)| (k, matches!(p, Patch::Remove))).collect();
        assert_eq!(patches, vec![("page", true), ("sort", false)]);
    }

    #[test]
    fn untyped_literals_encode_against_declared_type() {
        let def = define_query! { page: CNat, category: CString };
        let page = def.get("page").unwrap();
        assert_eq!(page.encode(&QueryValue::new(2)), Some(Encoded::Single("2".into())));
        assert_eq!(page.encode(&QueryValue::new(2u32)), Some(Encoded::Single("2".into())));
        assert_eq!(page.encode(&QueryValue::new(true)), None);

        let category = def.get("category").unwrap();
        assert_eq!(
            category.encode(&QueryValue::new("Daily")),
            Some(Encoded::Single("Daily".into()))
        );
    }

    #[test]
    fn typed_field_handle() {
        const PAGE: Field<CNat> = Field::new("page");
        const TAGS: Field<CArray<CString>> = Field::new("tags");
        assert_eq!(PAGE.name(), "page");

        let values = QueryValues::new().put(&PAGE, 2).put(&TAGS, vec!["a".to_string()]);
        let def = define_query! { page: CNat, tags: CArray::new(CString) };
        let mut parsed = Parsed::default();
        for (name, patch) in values.iter() {
            if let Patch::Set(value) = patch {
                let field = def.get(name).unwrap();
                assert!(field.encode(value).is_some());
                parsed.insert(name, value.clone());
            }
        }
        assert_eq!(parsed.field(&PAGE), Some(&2));
        assert_eq!(parsed.field(&TAGS), Some(&vec!["a".to_string()]));
    }

    #[test]
    fn set_opt_none_removes() {
        let values = QueryValues::new().set_opt::<i64>("page", None);
        assert!(matches!(values.iter().next(), Some(("page", Patch::Remove))));
    }
}

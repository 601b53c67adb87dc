use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

trait Erased: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any + fmt::Debug + Send + Sync> Erased for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A type-erased, reference-counted query field value.
///
/// Query definitions mix codecs of different value types, so parsed and
/// outgoing values travel erased and are downcast at the edge. Clone is an
/// atomic increment.
#[derive(Clone)]
pub struct QueryValue {
    inner: Arc<dyn Erased>,
}

impl QueryValue {
    pub fn new<T: Any + fmt::Debug + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }

    /// Returns `None` if the stored type doesn't match `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.inner).as_any().downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        (*self.inner).as_any().is::<T>()
    }

    pub fn type_id(&self) -> TypeId {
        (*self.inner).as_any().type_id()
    }

    /// Convert a literal-typed value into `T` when the conversion is exact.
    ///
    /// Covers integer literals (`i32`, `u32`, `usize`, ...) targeting `i64`
    /// and `&'static str` targeting `String`. Anything else, including a
    /// value already of type `T`, returns `None`.
    pub fn widen<T: Any>(&self) -> Option<T> {
        let any = (*self.inner).as_any();
        let widened: Box<dyn Any> = if TypeId::of::<T>() == TypeId::of::<i64>() {
            Box::new(widen_int(any)?)
        } else if TypeId::of::<T>() == TypeId::of::<String>() {
            Box::new(any.downcast_ref::<&'static str>()?.to_string())
        } else {
            return None;
        };
        widened.downcast::<T>().ok().map(|v| *v)
    }
}

fn widen_int(any: &dyn Any) -> Option<i64> {
    macro_rules! lossless {
        ($($t:ty),*) => {
            $(if let Some(n) = any.downcast_ref::<$t>() {
                return Some(i64::from(*n));
            })*
        };
    }
    macro_rules! checked {
        ($($t:ty),*) => {
            $(if let Some(n) = any.downcast_ref::<$t>() {
                return i64::try_from(*n).ok();
            })*
        };
    }
    lossless!(i8, i16, i32, u8, u16, u32);
    checked!(isize, u64, usize, i128, u128);
    None
}

impl fmt::Debug for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pk::Pk;

    #[test]
    fn downcast_correct_and_wrong_type() {
        let v = QueryValue::new(42i64);
        assert_eq!(v.downcast_ref::<i64>(), Some(&42));
        assert_eq!(v.downcast_ref::<i32>(), None);
        assert!(v.is::<i64>());
        assert_eq!(v.type_id(), TypeId::of::<i64>());
    }

    #[test]
    fn debug_shows_inner_value() {
        assert_eq!(format!("{:?}", QueryValue::new(Pk::New)), "New");
        assert_eq!(format!("{:?}", QueryValue::new("x".to_string())), "\"x\"");
    }

    #[test]
    fn clone_shares_data() {
        let v1 = QueryValue::new(vec![1i64, 2, 3]);
        let v2 = v1.clone();
        let p1 = v1.downcast_ref::<Vec<i64>>().unwrap().as_ptr();
        let p2 = v2.downcast_ref::<Vec<i64>>().unwrap().as_ptr();
        assert_eq!(p1, p2);
    }

    #[test]
    fn widen_integer_literals_to_i64() {
        assert_eq!(QueryValue::new(2).widen::<i64>(), Some(2));
        assert_eq!(QueryValue::new(7u8).widen::<i64>(), Some(7));
        assert_eq!(QueryValue::new(9usize).widen::<i64>(), Some(9));
        assert_eq!(QueryValue::new(u64::MAX).widen::<i64>(), None);
        assert_eq!(QueryValue::new(2i64).widen::<i64>(), None);
        assert_eq!(QueryValue::new(2).widen::<bool>(), None);
    }

    #[test]
    fn widen_str_literal_to_string() {
        assert_eq!(QueryValue::new("Daily").widen::<String>(), Some("Daily".to_string()));
        assert_eq!(QueryValue::new(1).widen::<String>(), None);
    }

    fn _assert_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<QueryValue>();
        assert_sync::<QueryValue>();
    }
}

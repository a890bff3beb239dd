//! Type-erased field values.
//!
//! Converters and field handles exchange values whose concrete type is only
//! known at runtime.  A [`Value`] owns one such value together with the name
//! of its type, which is used in log output and error messages.

use std::any::{Any, TypeId};
use std::fmt;

/// An owned value of any `'static` type.
pub struct Value {
    inner: Box<dyn Any>,
    type_name: &'static str,
}

impl Value {
    /// Wraps `value`.
    pub fn of<V: Any>(value: V) -> Self {
        Self {
            inner: Box::new(value),
            type_name: std::any::type_name::<V>(),
        }
    }

    /// Fully qualified name of the wrapped type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// `TypeId` of the wrapped value.
    pub fn type_id(&self) -> TypeId {
        (*self.inner).type_id()
    }

    /// Returns `true` if the wrapped value is a `V`.
    pub fn is<V: Any>(&self) -> bool {
        self.inner.is::<V>()
    }

    /// Borrows the wrapped value as a `V`.
    pub fn downcast_ref<V: Any>(&self) -> Option<&V> {
        self.inner.downcast_ref::<V>()
    }

    /// Takes the wrapped value out as a `V`, handing `self` back on mismatch.
    pub fn downcast<V: Any>(self) -> Result<V, Self> {
        let type_name = self.type_name;
        match self.inner.downcast::<V>() {
            Ok(boxed) => Ok(*boxed),
            Err(inner) => Err(Self { inner, type_name }),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downcast_ref_returns_wrapped_value() {
        let value = Value::of(42_i32);
        assert_eq!(value.downcast_ref::<i32>(), Some(&42));
        assert!(value.downcast_ref::<i64>().is_none());
    }

    #[test]
    fn test_downcast_mismatch_returns_original_value() {
        let value = Value::of("hello".to_string());
        let back = value.downcast::<u8>().expect_err("u8 must not match a String");
        assert_eq!(back.type_name(), "alloc::string::String");
        assert_eq!(back.downcast::<String>().unwrap(), "hello");
    }

    #[test]
    fn test_type_id_matches_wrapped_type() {
        let value = Value::of(1.5_f32);
        assert_eq!(value.type_id(), TypeId::of::<f32>());
        assert!(value.is::<f32>());
    }
}

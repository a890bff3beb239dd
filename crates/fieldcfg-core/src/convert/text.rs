//! Converter for any type with a `Display`/`FromStr` pair.
//!
//! Useful for enums and small value types:
//!
//! ```rust
//! use std::fmt;
//! use std::str::FromStr;
//! use fieldcfg_core::convert::{Converter, TextConverter};
//! use fieldcfg_core::Value;
//!
//! #[derive(Debug, Clone, Copy, PartialEq)]
//! enum Quality { Low, High }
//!
//! impl fmt::Display for Quality {
//!     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
//!         f.write_str(match self { Quality::Low => "low", Quality::High => "high" })
//!     }
//! }
//!
//! impl FromStr for Quality {
//!     type Err = String;
//!     fn from_str(s: &str) -> Result<Self, Self::Err> {
//!         match s {
//!             "low" => Ok(Quality::Low),
//!             "high" => Ok(Quality::High),
//!             _ => Err(s.to_string()),
//!         }
//!     }
//! }
//!
//! let converter = TextConverter::<Quality>::new("quality");
//! let value = Value::of(Quality::High);
//! assert_eq!(converter.key(&value), "quality");
//! assert_eq!(converter.serialize(&value).unwrap(), "high");
//! ```

use std::any::Any;
use std::fmt::Display;
use std::marker::PhantomData;
use std::str::FromStr;

use super::Converter;
use crate::domain::value::Value;
use crate::error::ConvertError;

/// Converts `T` through its `Display` and `FromStr` impls under one key.
pub struct TextConverter<T> {
    key: String,
    _type: PhantomData<fn() -> T>,
}

impl<T> TextConverter<T> {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            _type: PhantomData,
        }
    }
}

impl<T> Converter for TextConverter<T>
where
    T: Any + Display + FromStr,
    T::Err: Display,
{
    fn can_handle(&self, value: &Value) -> bool {
        value.is::<T>()
    }

    fn is_key_usable(&self, key: &str) -> bool {
        key == self.key
    }

    fn key(&self, _value: &Value) -> String {
        self.key.clone()
    }

    fn serialize(&self, value: &Value) -> Result<String, ConvertError> {
        value
            .downcast_ref::<T>()
            .map(ToString::to_string)
            .ok_or(ConvertError::Unsupported {
                type_name: value.type_name(),
            })
    }

    fn deserialize(&self, key: &str, text: &str) -> Result<Value, ConvertError> {
        if key != self.key {
            return Err(ConvertError::UnknownKey {
                key: key.to_string(),
            });
        }
        text.trim()
            .parse::<T>()
            .map(Value::of)
            .map_err(|e| ConvertError::Parse {
                key: key.to_string(),
                text: text.to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_round_trips_ipv4_address() {
        // Arrange
        let converter = TextConverter::<Ipv4Addr>::new("ipv4");
        let value = Value::of(Ipv4Addr::new(192, 168, 1, 10));

        // Act
        let text = converter.serialize(&value).unwrap();
        let back = converter.deserialize("ipv4", &text).unwrap();

        // Assert
        assert_eq!(text, "192.168.1.10");
        assert_eq!(
            back.downcast_ref::<Ipv4Addr>(),
            Some(&Ipv4Addr::new(192, 168, 1, 10))
        );
    }

    #[test]
    fn test_claims_only_its_own_type_and_key() {
        let converter = TextConverter::<Ipv4Addr>::new("ipv4");
        assert!(!converter.can_handle(&Value::of(1_i32)));
        assert!(!converter.is_key_usable("int"));
        assert!(converter.is_key_usable("ipv4"));
    }

    #[test]
    fn test_malformed_text_is_parse_error() {
        let converter = TextConverter::<Ipv4Addr>::new("ipv4");
        let err = converter.deserialize("ipv4", "not-an-ip").unwrap_err();
        assert!(matches!(err, ConvertError::Parse { .. }));
    }
}

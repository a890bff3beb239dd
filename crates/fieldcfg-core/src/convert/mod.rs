//! Value converters and the ordered converter chain.
//!
//! A [`Converter`] turns values of the types it claims into text and back.
//! Every written entry carries a *type key* (`int`, `string`, ...) chosen by
//! the converter that serialized it; on read, the key alone selects the
//! converter that parses the text.
//!
//! # Dispatch
//!
//! [`ConverterChain`] is a plain ordered list.  Serialization asks each
//! converter in turn whether it can handle the value; deserialization asks
//! whether it can use the key.  The first converter that says yes does the
//! work and no other converter is consulted.  Registration order is therefore
//! part of the contract: [`ConverterChain::push`] appends (earlier converters
//! keep priority) and [`ConverterChain::push_front`] prepends (the new
//! converter shadows everything registered before it).
//!
//! # Unmatched values
//!
//! When nothing claims a value, [`ConverterChain::key_for`] and
//! [`ConverterChain::serialize`] return the sentinel [`NULL_KEY`], while
//! [`ConverterChain::deserialize`] returns `Ok(None)` for an unclaimed key.
//! The two paths report "no converter" differently and callers depend on
//! that, so the asymmetry is kept.

pub mod primitive;
pub mod text;

use crate::domain::value::Value;
use crate::error::ConvertError;

pub use primitive::PrimitiveConverter;
pub use text::TextConverter;

/// Sentinel returned by the chain when no converter claims a value.
pub const NULL_KEY: &str = "@NULL@";

/// Converts values of one or more types to and from their text form.
///
/// Implementations must round-trip: for every value `v` they claim,
/// `deserialize(&key(v), &serialize(v)?)` yields a value equal to `v`.
pub trait Converter {
    /// Returns `true` if this converter can serialize `value`.
    fn can_handle(&self, value: &Value) -> bool;

    /// Returns `true` if this converter can deserialize text tagged `key`.
    fn is_key_usable(&self, key: &str) -> bool;

    /// Stable type tag written in front of the field name.
    fn key(&self, value: &Value) -> String;

    /// Renders `value` as a single line of text.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Unsupported`] for a value this converter does
    /// not claim.
    fn serialize(&self, value: &Value) -> Result<String, ConvertError>;

    /// Parses `text` into a value of the type tagged `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::Parse`] when the text is malformed and
    /// [`ConvertError::UnknownKey`] for a key this converter does not claim.
    fn deserialize(&self, key: &str, text: &str) -> Result<Value, ConvertError>;
}

/// Ordered, first-match-wins list of converters.
#[derive(Default)]
pub struct ConverterChain {
    converters: Vec<Box<dyn Converter>>,
}

impl ConverterChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a chain holding only the [`PrimitiveConverter`] fallback.
    pub fn with_defaults() -> Self {
        let mut chain = Self::new();
        chain.push(PrimitiveConverter::new());
        chain
    }

    /// Appends `converter`.  No uniqueness check is made.
    pub fn push(&mut self, converter: impl Converter + 'static) {
        self.converters.push(Box::new(converter));
    }

    /// Prepends `converter` so it is consulted before every other one.
    pub fn push_front(&mut self, converter: impl Converter + 'static) {
        self.converters.insert(0, Box::new(converter));
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    fn for_value(&self, value: &Value) -> Option<&dyn Converter> {
        self.converters
            .iter()
            .map(Box::as_ref)
            .find(|converter| converter.can_handle(value))
    }

    fn for_key(&self, key: &str) -> Option<&dyn Converter> {
        self.converters
            .iter()
            .map(Box::as_ref)
            .find(|converter| converter.is_key_usable(key))
    }

    /// Type key for `value`, or [`NULL_KEY`].
    pub fn key_for(&self, value: &Value) -> String {
        match self.for_value(value) {
            Some(converter) => converter.key(value),
            None => NULL_KEY.to_string(),
        }
    }

    /// Text form of `value`, or [`NULL_KEY`] when no converter claims it.
    ///
    /// # Errors
    ///
    /// Propagates the claiming converter's error.
    pub fn serialize(&self, value: &Value) -> Result<String, ConvertError> {
        match self.for_value(value) {
            Some(converter) => converter.serialize(value),
            None => Ok(NULL_KEY.to_string()),
        }
    }

    /// Parses `text` with the first converter that accepts `key`.
    ///
    /// Returns `Ok(None)` when no converter accepts the key.
    ///
    /// # Errors
    ///
    /// Propagates the claiming converter's error.
    pub fn deserialize(&self, key: &str, text: &str) -> Result<Option<Value>, ConvertError> {
        match self.for_key(key) {
            Some(converter) => converter.deserialize(key, text).map(Some),
            None => Ok(None),
        }
    }
}

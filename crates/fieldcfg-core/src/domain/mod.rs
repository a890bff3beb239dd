//! Pure data types describing config types and their fields.
//!
//! Nothing in here touches the file system or knows about converters; the
//! handlers and the registry build on these types.

/// Type-erased field values.
pub mod value;

/// Per-type and per-field metadata.
pub mod meta;

/// Field handles, the declaration builder and the category/field index.
///
/// See [`field::FieldIndex`] for the main type.
pub mod field;

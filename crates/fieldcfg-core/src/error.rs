//! Error types for the registry, the converter chain and field access.
//!
//! Only [`ConfigError`] is ever returned to callers of the registration API.
//! Everything that goes wrong while a file is being read or written is logged
//! where it happens and swallowed, so the in-memory defaults stay in place.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by [`crate::registry::ConfigRegistry`].
///
/// These indicate a programming error in a config type's declaration
/// (missing metadata, an unknown handler identifier) or a lookup against a
/// type the registry has not loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The registered type carries no [`crate::ConfigMeta`].
    #[error("config {type_name} does not declare config metadata")]
    MissingMetadata { type_name: String },

    /// The metadata names a handler strategy the catalog does not know.
    #[error("unknown configuration handler '{handler}'")]
    UnknownHandler { handler: String },

    /// The handler factory was found but failed to build a handler.
    #[error("failed to construct handler '{handler}': {reason}")]
    HandlerConstruction { handler: String, reason: String },

    /// A discovered type identifier has no entry in the type catalog.
    #[error("unknown config type '{type_name}'")]
    UnknownType { type_name: String },

    /// The same instance was handed to the registry twice.
    #[error("config {type_name} instance is already registered")]
    AlreadyRegistered { type_name: String },

    /// No loaded descriptor exists for the type.
    #[error("config {type_name} has not been loaded")]
    NotLoaded { type_name: String },

    /// A value could not be converted to or from its text form.
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// Errors produced by a [`crate::convert::Converter`].
#[derive(Debug, Error, PartialEq)]
pub enum ConvertError {
    /// The text could not be parsed as a value of the keyed type.
    #[error("cannot parse '{text}' as {key}: {reason}")]
    Parse {
        key: String,
        text: String,
        reason: String,
    },

    /// The converter was handed a value of a type it does not claim.
    #[error("converter does not handle values of type {type_name}")]
    Unsupported { type_name: &'static str },

    /// The converter was handed a key it does not claim.
    #[error("converter does not handle key '{key}'")]
    UnknownKey { key: String },
}

/// Errors raised by a [`crate::FieldHandle`] getter or setter.
#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    /// The value assigned to a field is of the wrong type.
    #[error("field {field} expects {expected}, got {found}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// The handle was applied to an instance of a different config type.
    #[error("field {field} does not belong to this config instance")]
    WrongInstance { field: String },
}

/// A line of a config file that does not fit the entry grammar.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormatError {
    /// The entry line has no `:` separating the type key from the name.
    #[error("entry '{line}' has no ':' after the type key")]
    MissingKeySeparator { line: String },

    /// The entry line has no `=` separating the name from the value.
    #[error("entry '{line}' has no '=' after the field name")]
    MissingValueSeparator { line: String },

    /// The first `=` comes before the first `:`.
    #[error("entry '{line}' has '=' before the type key separator")]
    MisplacedKeySeparator { line: String },
}

/// Errors loading [`crate::settings::RegistrySettings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing settings at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse settings TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

//! Persistence handlers: the strategies that load a config file into an
//! instance and write it back.
//!
//! A config type names its handler by string identifier in its
//! [`crate::ConfigMeta`].  The [`HandlerCatalog`] maps identifiers to
//! factories; [`DEFAULT_HANDLER`] is always present and builds a
//! [`DefaultConfigurationHandler`].
//!
//! # Failure policy
//!
//! Handler methods return nothing.  Config files are edited by hand and are
//! expected to be broken now and then, so every I/O error, malformed line or
//! conversion failure is logged where it happens and the affected field keeps
//! its in-memory value.

pub mod default;

use std::any::Any;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::convert::ConverterChain;
use crate::domain::field::{FieldHandle, FieldIndex};
use crate::domain::meta::DEFAULT_HANDLER;
use crate::domain::value::Value;
use crate::error::ConfigError;

pub use default::DefaultConfigurationHandler;

/// Strategy that persists one config instance.
///
/// Each descriptor owns its own handler, so implementations may cache
/// per-file state (the field index, the resolved path).
pub trait ConfigurationHandler {
    /// Adopts `hint` as the working field index, then reads `file_name` into
    /// `config` and rewrites it, or creates it from the current values.
    fn load_file(
        &mut self,
        file_name: &str,
        config: &mut dyn Any,
        hint: FieldIndex,
        converters: &ConverterChain,
    );

    /// Returns the cached handle for `field` in `category`.
    ///
    /// This is the handle, not the field's value; read the live value with
    /// [`FieldHandle::read`].
    fn get_value(&self, field: &str, category: &str, config: &dyn Any) -> Option<&FieldHandle>;

    /// Assigns `value` to `field` on `config` and rewrites the whole file.
    fn set_value(
        &mut self,
        field: &str,
        category: &str,
        value: Value,
        config: &mut dyn Any,
        converters: &ConverterChain,
    );

    /// Returns `true` if `field` is cached under `category`.
    fn has_value(&self, field: &str, category: &str) -> bool;

    /// Path of the file this handler loaded, if any.
    fn config_file(&self, file_name: &str, config: &dyn Any) -> Option<PathBuf>;
}

type HandlerFactory = Box<dyn Fn(&Path) -> Result<Box<dyn ConfigurationHandler>, String>>;

/// Handler identifier → factory table.
///
/// Factories receive the configuration directory and either build a handler
/// or explain why they could not.
pub struct HandlerCatalog {
    factories: HashMap<String, HandlerFactory>,
}

impl HandlerCatalog {
    /// Creates a catalog holding only the default handler.
    pub fn new() -> Self {
        let mut catalog = Self {
            factories: HashMap::new(),
        };
        catalog.register(DEFAULT_HANDLER, |dir| {
            Ok(Box::new(DefaultConfigurationHandler::new(dir)))
        });
        catalog
    }

    /// Registers `factory` under `id`, replacing any previous factory.
    pub fn register<F>(&mut self, id: &str, factory: F)
    where
        F: Fn(&Path) -> Result<Box<dyn ConfigurationHandler>, String> + 'static,
    {
        self.factories.insert(id.to_string(), Box::new(factory));
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Builds the handler registered as `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownHandler`] for an unregistered `id` and
    /// [`ConfigError::HandlerConstruction`] when the factory fails.
    pub fn create(
        &self,
        id: &str,
        config_dir: &Path,
    ) -> Result<Box<dyn ConfigurationHandler>, ConfigError> {
        let factory = self
            .factories
            .get(id)
            .ok_or_else(|| ConfigError::UnknownHandler {
                handler: id.to_string(),
            })?;
        factory(config_dir).map_err(|reason| ConfigError::HandlerConstruction {
            handler: id.to_string(),
            reason,
        })
    }
}

impl Default for HandlerCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_catalog_contains_default_handler() {
        let catalog = HandlerCatalog::new();
        assert!(catalog.contains(DEFAULT_HANDLER));
        assert!(catalog.create(DEFAULT_HANDLER, Path::new("cfg")).is_ok());
    }

    #[test]
    fn test_unknown_handler_is_config_error() {
        let catalog = HandlerCatalog::new();
        let err = catalog.create("xml", Path::new("cfg")).err().unwrap();
        assert!(matches!(err, ConfigError::UnknownHandler { ref handler } if handler == "xml"));
    }

    #[test]
    fn test_failing_factory_carries_reason() {
        let mut catalog = HandlerCatalog::new();
        catalog.register("readonly", |_| Err("read-only media".to_string()));

        let err = catalog.create("readonly", Path::new("cfg")).err().unwrap();

        assert_eq!(
            err.to_string(),
            "failed to construct handler 'readonly': read-only media"
        );
    }
}

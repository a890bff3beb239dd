//! Auto-discovery of config types during the standard phase.
//!
//! A [`ConfigDiscovery`] collaborator supplies type identifiers collected
//! ahead of time (from a settings file, a plugin manifest, a build step...).
//! The registry looks each identifier up in its [`TypeCatalog`], builds a
//! default instance and registers it like any other config.

use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::descriptor::ConfigType;
use super::ConfigRegistry;
use crate::error::ConfigError;

/// Source of config type identifiers to instantiate automatically.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigDiscovery {
    /// Identifiers in the order they should be registered.
    fn discover(&self) -> Vec<String>;
}

/// Discovery backed by a fixed list, typically read from settings.
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    names: Vec<String>,
}

impl StaticDiscovery {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl ConfigDiscovery for StaticDiscovery {
    fn discover(&self) -> Vec<String> {
        self.names.clone()
    }
}

type Instantiate = fn(&mut ConfigRegistry) -> Result<(), ConfigError>;

#[derive(Clone, Copy)]
pub(crate) struct CatalogEntry {
    pub(crate) type_id: TypeId,
    pub(crate) instantiate: Instantiate,
}

/// Identifier → constructor table for discoverable config types.
#[derive(Default)]
pub struct TypeCatalog {
    entries: HashMap<String, CatalogEntry>,
}

fn instantiate_default<T: ConfigType + Default>(
    registry: &mut ConfigRegistry,
) -> Result<(), ConfigError> {
    registry.register_config(Rc::new(RefCell::new(T::default())))
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `T` discoverable under [`ConfigType::type_name`].
    pub fn register<T: ConfigType + Default>(&mut self) {
        self.entries.insert(
            T::type_name().to_string(),
            CatalogEntry {
                type_id: TypeId::of::<T>(),
                instantiate: instantiate_default::<T>,
            },
        );
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    pub(crate) fn get(&self, type_name: &str) -> Option<CatalogEntry> {
        self.entries.get(type_name).copied()
    }
}

//! Config types and the descriptors that bind one instance to its file.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::error;

use crate::convert::ConverterChain;
use crate::domain::field::{FieldHandle, FieldIndex, FieldMap};
use crate::domain::meta::ConfigMeta;
use crate::domain::value::Value;
use crate::error::ConfigError;
use crate::handler::{ConfigurationHandler, HandlerCatalog};

/// Instance shared between the caller and the registry.
pub type Shared<T> = Rc<RefCell<T>>;

/// A type whose fields are persisted by the registry.
///
/// ```rust
/// use fieldcfg_core::{ConfigMeta, ConfigType, FieldMap};
///
/// #[derive(Default)]
/// struct AudioConfig { volume: i32 }
///
/// impl ConfigType for AudioConfig {
///     fn metadata() -> Option<ConfigMeta> {
///         Some(ConfigMeta::new())
///     }
///
///     fn fields() -> FieldMap<Self> {
///         FieldMap::<Self>::new()
///             .field("volume", |c| &c.volume, |c| &mut c.volume)
///             .category("Audio")
///             .comment("Sound volume")
///     }
/// }
///
/// assert_eq!(AudioConfig::type_name(), "AudioConfig");
/// ```
pub trait ConfigType: Any + Sized {
    /// Per-type metadata.  `None` makes registration fail.
    fn metadata() -> Option<ConfigMeta>;

    /// The persisted fields, in declaration order.
    fn fields() -> FieldMap<Self>;

    /// Name used for the default file name and as the discovery identifier.
    ///
    /// Defaults to the last path segment of the Rust type name.
    fn type_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base)
    }
}

/// Binds one config instance to its file name, handler and field index.
pub struct ConfigDescriptor<T> {
    instance: Shared<T>,
    handler: Box<dyn ConfigurationHandler>,
    file_name: String,
    fields: FieldIndex,
    early: bool,
    type_name: &'static str,
}

impl<T: ConfigType> ConfigDescriptor<T> {
    /// Builds the descriptor: resolves the file name, constructs the handler
    /// named in `meta` and indexes the declared fields.
    ///
    /// # Errors
    ///
    /// Returns the catalog's [`ConfigError`] if the handler cannot be built.
    pub fn new(
        instance: Shared<T>,
        meta: &ConfigMeta,
        handlers: &HandlerCatalog,
        config_dir: &Path,
    ) -> Result<Self, ConfigError> {
        let handler = handlers.create(&meta.handler, config_dir)?;
        let type_name = T::type_name();
        Ok(Self {
            instance,
            handler,
            file_name: meta.resolve_file_name(type_name),
            fields: FieldIndex::build(T::fields().handles(), meta),
            early: meta.early_init,
            type_name,
        })
    }

    pub fn instance(&self) -> &Shared<T> {
        &self.instance
    }

    pub fn fields(&self) -> &FieldIndex {
        &self.fields
    }
}

/// Object-safe view of a [`ConfigDescriptor`] of any type.
pub(crate) trait ManagedConfig {
    fn type_name(&self) -> &'static str;
    fn config_type(&self) -> TypeId;
    fn is_early(&self) -> bool;
    fn file_name(&self) -> &str;
    fn shares_instance(&self, other: *const ()) -> bool;
    fn initialize(&mut self, converters: &ConverterChain);
    fn set_value(
        &mut self,
        field: &str,
        category: &str,
        value: Value,
        converters: &ConverterChain,
    );
    fn get_value(&self, field: &str, category: &str) -> Option<FieldHandle>;
    fn has_value(&self, field: &str, category: &str) -> bool;
    fn config_file(&self) -> Option<PathBuf>;
    fn as_any(&self) -> &dyn Any;
}

impl<T: ConfigType> ManagedConfig for ConfigDescriptor<T> {
    fn type_name(&self) -> &'static str {
        self.type_name
    }

    fn config_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn is_early(&self) -> bool {
        self.early
    }

    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn shares_instance(&self, other: *const ()) -> bool {
        std::ptr::eq(Rc::as_ptr(&self.instance).cast::<()>(), other)
    }

    fn initialize(&mut self, converters: &ConverterChain) {
        let Ok(mut instance) = self.instance.try_borrow_mut() else {
            error!(config = self.type_name, "instance is borrowed elsewhere; skipping load");
            return;
        };
        self.handler
            .load_file(&self.file_name, &mut *instance, self.fields.clone(), converters);
    }

    fn set_value(
        &mut self,
        field: &str,
        category: &str,
        value: Value,
        converters: &ConverterChain,
    ) {
        let Ok(mut instance) = self.instance.try_borrow_mut() else {
            error!(
                config = self.type_name,
                field,
                "instance is borrowed elsewhere; value not set"
            );
            return;
        };
        self.handler
            .set_value(field, category, value, &mut *instance, converters);
    }

    fn get_value(&self, field: &str, category: &str) -> Option<FieldHandle> {
        let instance = self.instance.try_borrow().ok()?;
        self.handler.get_value(field, category, &*instance).cloned()
    }

    fn has_value(&self, field: &str, category: &str) -> bool {
        self.handler.has_value(field, category)
    }

    fn config_file(&self) -> Option<PathBuf> {
        let instance = self.instance.try_borrow().ok()?;
        self.handler.config_file(&self.file_name, &*instance)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

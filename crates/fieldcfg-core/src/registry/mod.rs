//! The config registry: registration, two-phase bootstrap and converter
//! dispatch.
//!
//! # Bootstrap phases
//!
//! ```text
//! register_config()  ──►  early queue ─┐
//!                    └─►  standard queue│
//!                                       ▼
//! run_early_phase()      load early queue      ──► loaded list
//! run_standard_phase()   discovery → register
//!                        load late early configs
//!                        load standard queue   ──► loaded list
//! ```
//!
//! A descriptor is queued exactly once, in the queue its metadata selects,
//! and is loaded exactly once.  Every config marked early finishes loading
//! before any standard config starts, whatever the registration order.
//!
//! # Ownership
//!
//! The registry is an ordinary value owned by whoever bootstraps the
//! process; there is no global instance.  Config instances are shared
//! ([`Shared`]) between the caller and the registry, and the registry keeps
//! its reference for as long as it lives.
//!
//! Everything here is single-threaded: registration and both phases run on
//! the bootstrap thread, one after the other.

pub mod descriptor;
pub mod discovery;

use std::any::TypeId;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, error, info};

use crate::convert::{Converter, ConverterChain};
use crate::domain::field::FieldHandle;
use crate::domain::meta::ConfigMeta;
use crate::domain::value::Value;
use crate::error::{ConfigError, ConvertError};
use crate::handler::{ConfigurationHandler, HandlerCatalog};
use crate::settings::RegistrySettings;

pub use descriptor::{ConfigDescriptor, ConfigType, Shared};
pub use discovery::{ConfigDiscovery, StaticDiscovery, TypeCatalog};

use descriptor::ManagedConfig;

/// Process-wide coordinator for config persistence.
pub struct ConfigRegistry {
    config_dir: PathBuf,
    early: Vec<Box<dyn ManagedConfig>>,
    standard: Vec<Box<dyn ManagedConfig>>,
    loaded: Vec<Box<dyn ManagedConfig>>,
    converters: ConverterChain,
    handlers: HandlerCatalog,
    types: TypeCatalog,
    discovery: Box<dyn ConfigDiscovery>,
}

impl ConfigRegistry {
    /// Creates a registry writing under `config_dir`, with the primitive
    /// fallback converter, the default handler and no discovery.
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            early: Vec::new(),
            standard: Vec::new(),
            loaded: Vec::new(),
            converters: ConverterChain::with_defaults(),
            handlers: HandlerCatalog::new(),
            types: TypeCatalog::new(),
            discovery: Box::new(StaticDiscovery::default()),
        }
    }

    /// Creates a registry from engine settings; `settings.discover` becomes
    /// the discovery list.
    pub fn from_settings(settings: &RegistrySettings) -> Self {
        Self::new(settings.config_dir.clone())
            .with_discovery(StaticDiscovery::new(settings.discover.iter().cloned()))
    }

    /// Replaces the discovery collaborator.
    pub fn with_discovery(mut self, discovery: impl ConfigDiscovery + 'static) -> Self {
        self.discovery = Box::new(discovery);
        self
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    // ── Registration ──────────────────────────────────────────────────────────

    /// Registers `instance` using `T`'s own metadata.
    ///
    /// # Errors
    ///
    /// See [`register_config_with`](Self::register_config_with).
    pub fn register_config<T: ConfigType>(
        &mut self,
        instance: Shared<T>,
    ) -> Result<(), ConfigError> {
        self.register_config_with(instance, T::metadata())
    }

    /// Builds a descriptor for `instance` and queues it for the phase `meta`
    /// selects.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingMetadata`] if `meta` is `None`.
    /// - [`ConfigError::UnknownHandler`] / [`ConfigError::HandlerConstruction`]
    ///   if the handler strategy cannot be built.
    /// - [`ConfigError::AlreadyRegistered`] if this exact instance is already
    ///   known to the registry.
    pub fn register_config_with<T: ConfigType>(
        &mut self,
        instance: Shared<T>,
        meta: Option<ConfigMeta>,
    ) -> Result<(), ConfigError> {
        let type_name = T::type_name();
        let meta = meta.ok_or_else(|| ConfigError::MissingMetadata {
            type_name: type_name.to_string(),
        })?;

        let ptr = Rc::as_ptr(&instance).cast::<()>();
        if self.all().any(|config| config.shares_instance(ptr)) {
            return Err(ConfigError::AlreadyRegistered {
                type_name: type_name.to_string(),
            });
        }

        let descriptor = ConfigDescriptor::new(instance, &meta, &self.handlers, &self.config_dir)?;
        let phase = if descriptor.is_early() { "early" } else { "standard" };
        debug!(
            config = type_name,
            file = descriptor.file_name(),
            fields = descriptor.fields().len(),
            phase,
            "registered config"
        );

        let descriptor: Box<dyn ManagedConfig> = Box::new(descriptor);
        if descriptor.is_early() {
            self.early.push(descriptor);
        } else {
            self.standard.push(descriptor);
        }
        Ok(())
    }

    /// Appends `converter` to the chain.  Earlier converters keep priority.
    pub fn register_converter(&mut self, converter: impl Converter + 'static) {
        self.converters.push(converter);
    }

    /// Prepends `converter` so it shadows every converter registered so far,
    /// the primitive fallback included.
    pub fn register_converter_first(&mut self, converter: impl Converter + 'static) {
        self.converters.push_front(converter);
    }

    /// Registers a handler strategy under `id`.
    pub fn register_handler<F>(&mut self, id: &str, factory: F)
    where
        F: Fn(&Path) -> Result<Box<dyn ConfigurationHandler>, String> + 'static,
    {
        self.handlers.register(id, factory);
    }

    /// Makes `T` available to discovery under [`ConfigType::type_name`].
    pub fn register_type<T: ConfigType + Default>(&mut self) {
        self.types.register::<T>();
    }

    // ── Bootstrap ─────────────────────────────────────────────────────────────

    /// Loads every queued early config, in queue order.  Calling it again
    /// with nothing queued does nothing.
    pub fn run_early_phase(&mut self) {
        let queue = std::mem::take(&mut self.early);
        if queue.is_empty() {
            return;
        }
        info!(count = queue.len(), "loading early configs");
        self.load_all(queue);
    }

    /// Registers discovered types, then loads the standard queue.
    ///
    /// A discovered identifier that cannot be instantiated or registered is
    /// logged and skipped.  Early configs registered since the early phase
    /// (by discovery or otherwise) are loaded before the standard queue.
    pub fn run_standard_phase(&mut self) {
        for type_name in self.discovery.discover() {
            if let Err(e) = self.instantiate(&type_name) {
                error!(config = %type_name, "skipping discovered config: {e}");
            }
        }

        self.run_early_phase();

        let queue = std::mem::take(&mut self.standard);
        if queue.is_empty() {
            return;
        }
        info!(count = queue.len(), "loading standard configs");
        self.load_all(queue);
    }

    fn instantiate(&mut self, type_name: &str) -> Result<(), ConfigError> {
        let entry = self
            .types
            .get(type_name)
            .ok_or_else(|| ConfigError::UnknownType {
                type_name: type_name.to_string(),
            })?;
        if self.all().any(|config| config.config_type() == entry.type_id) {
            debug!(config = type_name, "discovered config already registered");
            return Ok(());
        }
        (entry.instantiate)(self)
    }

    fn load_all(&mut self, queue: Vec<Box<dyn ManagedConfig>>) {
        for mut config in queue {
            debug!(config = config.type_name(), file = config.file_name(), "loading config");
            config.initialize(&self.converters);
            self.loaded.push(config);
        }
    }

    fn all(&self) -> impl Iterator<Item = &Box<dyn ManagedConfig>> {
        self.early
            .iter()
            .chain(self.standard.iter())
            .chain(self.loaded.iter())
    }

    // ── Converter dispatch ────────────────────────────────────────────────────

    /// Type key of the first converter claiming `value`, or `"@NULL@"`.
    pub fn key_for(&self, value: &Value) -> String {
        self.converters.key_for(value)
    }

    /// Text form of `value`, or `"@NULL@"` if no converter claims it.
    ///
    /// # Errors
    ///
    /// Propagates the claiming converter's error.
    pub fn serialize(&self, value: &Value) -> Result<String, ConvertError> {
        self.converters.serialize(value)
    }

    /// Parses `text` with the first converter accepting `key`; `Ok(None)` if
    /// none does.
    ///
    /// # Errors
    ///
    /// Propagates the claiming converter's error.
    pub fn deserialize(&self, key: &str, text: &str) -> Result<Option<Value>, ConvertError> {
        self.converters.deserialize(key, text)
    }

    pub fn converters(&self) -> &ConverterChain {
        &self.converters
    }

    // ── Typed access ──────────────────────────────────────────────────────────

    /// The registered instance of `T`, queued or loaded.
    pub fn instance<T: ConfigType>(&self) -> Option<Shared<T>> {
        self.all().find_map(|config| {
            config
                .as_any()
                .downcast_ref::<ConfigDescriptor<T>>()
                .map(|descriptor| Rc::clone(descriptor.instance()))
        })
    }

    fn loaded_config(
        &self,
        type_id: TypeId,
        type_name: &str,
    ) -> Result<&dyn ManagedConfig, ConfigError> {
        self.loaded
            .iter()
            .find(|config| config.config_type() == type_id)
            .map(|config| &**config)
            .ok_or_else(|| ConfigError::NotLoaded {
                type_name: type_name.to_string(),
            })
    }

    /// Assigns `value` to `field` of the loaded `T` and rewrites its file.
    ///
    /// Persistence problems (unknown field, wrong value type, I/O) are logged
    /// by the handler, not returned.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotLoaded`] if `T` has not been loaded.
    pub fn set_value<T: ConfigType>(
        &mut self,
        field: &str,
        category: &str,
        value: Value,
    ) -> Result<(), ConfigError> {
        let type_id = TypeId::of::<T>();
        let config = self
            .loaded
            .iter_mut()
            .find(|config| config.config_type() == type_id)
            .ok_or_else(|| ConfigError::NotLoaded {
                type_name: T::type_name().to_string(),
            })?;
        config.set_value(field, category, value, &self.converters);
        Ok(())
    }

    /// Cached handle for `field` under `category` of the loaded `T`.
    ///
    /// Returns the handle, not the value; use [`FieldHandle::read`] for the
    /// live value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotLoaded`] if `T` has not been loaded.
    pub fn get_value<T: ConfigType>(
        &self,
        field: &str,
        category: &str,
    ) -> Result<Option<FieldHandle>, ConfigError> {
        let config = self.loaded_config(TypeId::of::<T>(), T::type_name())?;
        Ok(config.get_value(field, category))
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::NotLoaded`] if `T` has not been loaded.
    pub fn has_value<T: ConfigType>(
        &self,
        field: &str,
        category: &str,
    ) -> Result<bool, ConfigError> {
        let config = self.loaded_config(TypeId::of::<T>(), T::type_name())?;
        Ok(config.has_value(field, category))
    }

    /// Path of the file backing the loaded `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotLoaded`] if `T` has not been loaded.
    pub fn config_file<T: ConfigType>(&self) -> Result<Option<PathBuf>, ConfigError> {
        let config = self.loaded_config(TypeId::of::<T>(), T::type_name())?;
        Ok(config.config_file())
    }

    // ── Introspection ─────────────────────────────────────────────────────────

    pub fn pending_early(&self) -> usize {
        self.early.len()
    }

    pub fn pending_standard(&self) -> usize {
        self.standard.len()
    }

    /// Type names of loaded configs, in load order.
    pub fn loaded(&self) -> Vec<&'static str> {
        self.loaded.iter().map(|config| config.type_name()).collect()
    }

    /// Paths of every loaded config file, in load order.
    pub fn loaded_files(&self) -> Vec<PathBuf> {
        self.loaded
            .iter()
            .filter_map(|config| config.config_file())
            .collect()
    }
}

impl std::fmt::Debug for ConfigRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigRegistry")
            .field("config_dir", &self.config_dir)
            .field("early", &self.early.len())
            .field("standard", &self.standard.len())
            .field("loaded", &self.loaded())
            .field("converters", &self.converters.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::discovery::MockConfigDiscovery;
    use super::*;
    use crate::FieldMap;
    use std::cell::RefCell;
    use std::fs;
    use uuid::Uuid;

    #[derive(Debug, Default)]
    struct Audio {
        volume: i32,
    }

    impl ConfigType for Audio {
        fn metadata() -> Option<ConfigMeta> {
            Some(ConfigMeta::new())
        }

        fn fields() -> FieldMap<Self> {
            FieldMap::<Self>::new()
                .field("volume", |c| &c.volume, |c| &mut c.volume)
                .category("Audio")
        }
    }

    #[derive(Debug, Default)]
    struct Boot {
        verbose: bool,
    }

    impl ConfigType for Boot {
        fn metadata() -> Option<ConfigMeta> {
            Some(ConfigMeta::new().early())
        }

        fn fields() -> FieldMap<Self> {
            FieldMap::<Self>::new().field("verbose", |c| &c.verbose, |c| &mut c.verbose)
        }
    }

    #[derive(Debug, Default)]
    struct Undeclared;

    impl ConfigType for Undeclared {
        fn metadata() -> Option<ConfigMeta> {
            None
        }

        fn fields() -> FieldMap<Self> {
            FieldMap::new()
        }
    }

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("fieldcfg_registry_{}", Uuid::new_v4()))
    }

    #[test]
    fn test_missing_metadata_is_rejected() {
        let mut registry = ConfigRegistry::new(scratch_dir());
        let err = registry
            .register_config(Rc::new(RefCell::new(Undeclared)))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingMetadata { ref type_name } if type_name == "Undeclared"
        ));
    }

    #[test]
    fn test_unknown_handler_is_rejected_and_nothing_queued() {
        let mut registry = ConfigRegistry::new(scratch_dir());
        let err = registry
            .register_config_with(
                Rc::new(RefCell::new(Audio::default())),
                Some(ConfigMeta::new().handler("yaml")),
            )
            .unwrap_err();

        assert!(matches!(err, ConfigError::UnknownHandler { .. }));
        assert_eq!(registry.pending_standard(), 0);
    }

    #[test]
    fn test_registration_queues_by_phase() {
        let mut registry = ConfigRegistry::new(scratch_dir());
        registry
            .register_config(Rc::new(RefCell::new(Audio::default())))
            .unwrap();
        registry
            .register_config(Rc::new(RefCell::new(Boot::default())))
            .unwrap();

        assert_eq!(registry.pending_early(), 1);
        assert_eq!(registry.pending_standard(), 1);
    }

    #[test]
    fn test_same_instance_cannot_be_registered_twice() {
        let mut registry = ConfigRegistry::new(scratch_dir());
        let audio = Rc::new(RefCell::new(Audio::default()));
        registry.register_config(Rc::clone(&audio)).unwrap();

        let err = registry.register_config(audio).unwrap_err();

        assert!(matches!(err, ConfigError::AlreadyRegistered { .. }));
        assert_eq!(registry.pending_standard(), 1);
    }

    #[test]
    fn test_early_phase_is_idempotent() {
        let dir = scratch_dir();
        let mut registry = ConfigRegistry::new(&dir);
        registry
            .register_config(Rc::new(RefCell::new(Boot::default())))
            .unwrap();

        registry.run_early_phase();
        registry.run_early_phase();

        assert_eq!(registry.loaded(), vec!["Boot"]);
        assert_eq!(registry.pending_early(), 0);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_discovery_failures_are_skipped_individually() {
        // Arrange
        let dir = scratch_dir();
        let mut discovery = MockConfigDiscovery::new();
        discovery
            .expect_discover()
            .times(1)
            .returning(|| vec!["Missing".to_string(), "Audio".to_string()]);
        let mut registry = ConfigRegistry::new(&dir).with_discovery(discovery);
        registry.register_type::<Audio>();

        // Act
        registry.run_standard_phase();

        // Assert
        assert_eq!(registry.loaded(), vec!["Audio"]);
        assert!(dir.join("Audio.cfg").exists());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_discovered_type_already_registered_is_not_duplicated() {
        let dir = scratch_dir();
        let mut registry =
            ConfigRegistry::new(&dir).with_discovery(StaticDiscovery::new(["Audio"]));
        registry.register_type::<Audio>();
        registry
            .register_config(Rc::new(RefCell::new(Audio { volume: 3 })))
            .unwrap();

        registry.run_standard_phase();

        assert_eq!(registry.loaded(), vec!["Audio"]);
        let audio = registry.instance::<Audio>().unwrap();
        assert_eq!(audio.borrow().volume, 3);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_typed_access_before_load_is_not_loaded_error() {
        let mut registry = ConfigRegistry::new(scratch_dir());
        registry
            .register_config(Rc::new(RefCell::new(Audio::default())))
            .unwrap();

        let err = registry
            .set_value::<Audio>("volume", "Audio", Value::of(1_i32))
            .unwrap_err();

        assert!(matches!(err, ConfigError::NotLoaded { .. }));
        assert!(registry.instance::<Audio>().is_some(), "queued instance is reachable");
    }

    #[test]
    fn test_set_value_routes_to_loaded_config() {
        let dir = scratch_dir();
        let mut registry = ConfigRegistry::new(&dir);
        let audio = Rc::new(RefCell::new(Audio::default()));
        registry.register_config(Rc::clone(&audio)).unwrap();
        registry.run_standard_phase();

        registry
            .set_value::<Audio>("volume", "Audio", Value::of(42_i32))
            .unwrap();

        assert_eq!(audio.borrow().volume, 42);
        assert!(registry.has_value::<Audio>("volume", "Audio").unwrap());
        let written = fs::read_to_string(dir.join("Audio.cfg")).unwrap();
        assert!(written.contains("\tint:volume=42\n"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_dispatch_helpers_delegate_to_chain() {
        let registry = ConfigRegistry::new(scratch_dir());
        let value = Value::of(7_u16);

        assert_eq!(registry.key_for(&value), "ushort");
        assert_eq!(registry.serialize(&value).unwrap(), "7");
        assert!(registry.deserialize("nope", "7").unwrap().is_none());
    }
}

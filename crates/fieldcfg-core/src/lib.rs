//! # fieldcfg-core
//!
//! Field-level configuration persistence.  A program declares config types
//! and their fields; the registry loads each instance from a small,
//! hand-editable text file at startup, fills in missing entries from the
//! instance's defaults, and rewrites the file so it always reflects the
//! current schema.
//!
//! # Architecture overview
//!
//! - **`domain`** – Values, metadata and the field index.  A [`FieldIndex`]
//!   maps category → field name → [`FieldHandle`], in declaration order.
//!
//! - **`convert`** – The [`ConverterChain`]: an ordered list of
//!   [`Converter`]s that turn typed values into text and back, keyed by a
//!   short type key such as `int` or `string`.
//!
//! - **`format`** – The block text grammar (`Category {`, comment line,
//!   `key:field=value`, blank line, `}`).
//!
//! - **`handler`** – Persistence strategies.  [`DefaultConfigurationHandler`]
//!   reads, repairs and rewrites one file per config instance.
//!
//! - **`registry`** – The [`ConfigRegistry`]: registration, the early and
//!   standard bootstrap phases, discovery and typed access.
//!
//! - **`settings`** – [`RegistrySettings`], the engine's own TOML settings.
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use fieldcfg_core::{ConfigMeta, ConfigRegistry, ConfigType, FieldMap};
//!
//! #[derive(Default)]
//! struct AudioConfig { volume: i32 }
//!
//! impl ConfigType for AudioConfig {
//!     fn metadata() -> Option<ConfigMeta> {
//!         Some(ConfigMeta::new())
//!     }
//!
//!     fn fields() -> FieldMap<Self> {
//!         FieldMap::<Self>::new()
//!             .field("volume", |c| &c.volume, |c| &mut c.volume)
//!             .category("Audio")
//!             .comment("Sound volume")
//!     }
//! }
//!
//! let dir = std::env::temp_dir().join("fieldcfg_doc_example");
//! let mut registry = ConfigRegistry::new(&dir);
//! let audio = Rc::new(RefCell::new(AudioConfig::default()));
//! registry.register_config(Rc::clone(&audio)).unwrap();
//! registry.run_early_phase();
//! registry.run_standard_phase();
//!
//! assert!(dir.join("AudioConfig.cfg").exists());
//! std::fs::remove_dir_all(&dir).ok();
//! ```

pub mod convert;
pub mod domain;
pub mod error;
pub mod format;
pub mod handler;
pub mod registry;
pub mod settings;

pub use convert::{Converter, ConverterChain, PrimitiveConverter, TextConverter, NULL_KEY};
pub use domain::field::{FieldHandle, FieldIndex, FieldMap};
pub use domain::meta::{ConfigMeta, FieldMeta, DEFAULT_CATEGORY, DEFAULT_HANDLER};
pub use domain::value::Value;
pub use error::{ConfigError, ConvertError, FieldError, FormatError, SettingsError};
pub use handler::{ConfigurationHandler, DefaultConfigurationHandler, HandlerCatalog};
pub use registry::{
    ConfigDescriptor, ConfigDiscovery, ConfigRegistry, ConfigType, Shared, StaticDiscovery,
    TypeCatalog,
};
pub use settings::RegistrySettings;

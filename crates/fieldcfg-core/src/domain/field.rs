//! Field declarations and the per-descriptor field index.
//!
//! A config type lists its persisted fields once through a [`FieldMap`]:
//! a name, a pair of accessor functions and optional [`FieldMeta`].  Each
//! entry becomes a [`FieldHandle`], a get/set capability erased over both the
//! owning type and the field type, so handlers can work on any config.
//!
//! [`FieldIndex::build`] groups the handles by category and drops excluded
//! names.  The index keeps insertion order, which makes the written file
//! deterministic: categories appear in the order their first field was
//! declared, and fields in declaration order within a category.
//!
//! ```rust
//! use fieldcfg_core::{FieldIndex, FieldMap, ConfigMeta};
//!
//! #[derive(Default)]
//! struct Audio { volume: i32, muted: bool }
//!
//! let fields = FieldMap::<Audio>::new()
//!     .field("volume", |c| &c.volume, |c| &mut c.volume)
//!     .category("Audio")
//!     .comment("Sound volume")
//!     .field("muted", |c| &c.muted, |c| &mut c.muted);
//!
//! let index = FieldIndex::build(fields.handles(), &ConfigMeta::default());
//! assert!(index.contains("Audio", "volume"));
//! assert!(index.contains("General", "muted"));
//! ```

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::domain::meta::{ConfigMeta, FieldMeta};
use crate::domain::value::Value;
use crate::error::FieldError;

type Getter = dyn Fn(&dyn Any) -> Result<Value, FieldError>;
type Setter = dyn Fn(&mut dyn Any, Value) -> Result<(), FieldError>;

/// Get/set capability for one declared field.
///
/// Handles are cheap to clone; clones share the accessor closures.
#[derive(Clone)]
pub struct FieldHandle {
    name: String,
    meta: FieldMeta,
    value_type: &'static str,
    getter: Rc<Getter>,
    setter: Rc<Setter>,
}

impl FieldHandle {
    /// Builds a handle for a field of type `V` on config type `T`.
    pub fn new<T, V>(
        name: impl Into<String>,
        meta: FieldMeta,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self
    where
        T: Any,
        V: Any + Clone,
    {
        let name = name.into();

        let getter_name = name.clone();
        let getter = move |config: &dyn Any| -> Result<Value, FieldError> {
            let config = config
                .downcast_ref::<T>()
                .ok_or_else(|| FieldError::WrongInstance {
                    field: getter_name.clone(),
                })?;
            Ok(Value::of(get(config).clone()))
        };

        let setter_name = name.clone();
        let setter = move |config: &mut dyn Any, value: Value| -> Result<(), FieldError> {
            let config = config
                .downcast_mut::<T>()
                .ok_or_else(|| FieldError::WrongInstance {
                    field: setter_name.clone(),
                })?;
            let value = value.downcast::<V>().map_err(|value| FieldError::TypeMismatch {
                field: setter_name.clone(),
                expected: std::any::type_name::<V>(),
                found: value.type_name(),
            })?;
            *get_mut(config) = value;
            Ok(())
        };

        Self {
            name,
            meta,
            value_type: std::any::type_name::<V>(),
            getter: Rc::new(getter),
            setter: Rc::new(setter),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn meta(&self) -> &FieldMeta {
        &self.meta
    }

    /// Declared category, or `"General"`.
    pub fn category(&self) -> &str {
        self.meta.category_or_default()
    }

    pub fn comment(&self) -> Option<&str> {
        self.meta.comment.as_deref()
    }

    /// Name of the field's Rust type.
    pub fn value_type(&self) -> &'static str {
        self.value_type
    }

    /// Reads the field's current value from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::WrongInstance`] if `config` is not the type the
    /// handle was declared on.
    pub fn read(&self, config: &dyn Any) -> Result<Value, FieldError> {
        (self.getter)(config)
    }

    /// Assigns `value` to the field on `config`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::WrongInstance`] for a foreign `config` and
    /// [`FieldError::TypeMismatch`] if `value` is not the field's type.
    pub fn write(&self, config: &mut dyn Any, value: Value) -> Result<(), FieldError> {
        (self.setter)(config, value)
    }
}

impl fmt::Debug for FieldHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldHandle")
            .field("name", &self.name)
            .field("meta", &self.meta)
            .field("value_type", &self.value_type)
            .finish_non_exhaustive()
    }
}

/// Builder listing the persisted fields of config type `T`, in order.
///
/// [`category`](Self::category) and [`comment`](Self::comment) apply to the
/// field declared most recently.  Declaring the same name twice is allowed;
/// the later declaration wins once the index is built.
pub struct FieldMap<T> {
    handles: Vec<FieldHandle>,
    _owner: PhantomData<fn(&T)>,
}

impl<T: Any> FieldMap<T> {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
            _owner: PhantomData,
        }
    }

    /// Declares a field with no metadata.
    pub fn field<V: Any + Clone>(
        mut self,
        name: &str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        self.handles
            .push(FieldHandle::new(name, FieldMeta::default(), get, get_mut));
        self
    }

    /// Sets the category of the most recently declared field.
    pub fn category(mut self, category: &str) -> Self {
        if let Some(last) = self.handles.last_mut() {
            last.meta.category = Some(category.to_string());
        }
        self
    }

    /// Sets the comment of the most recently declared field.
    pub fn comment(mut self, comment: &str) -> Self {
        if let Some(last) = self.handles.last_mut() {
            last.meta.comment = Some(comment.to_string());
        }
        self
    }

    pub fn handles(&self) -> &[FieldHandle] {
        &self.handles
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl<T: Any> Default for FieldMap<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Category name → field name → handle, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct FieldIndex {
    categories: IndexMap<String, IndexMap<String, FieldHandle>>,
}

impl FieldIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Groups `handles` by category, skipping names excluded by `meta`.
    pub fn build(handles: &[FieldHandle], meta: &ConfigMeta) -> Self {
        let mut index = Self::new();
        for handle in handles {
            if meta.excludes(handle.name()) {
                continue;
            }
            let category = handle.category().to_string();
            index.insert(&category, handle.clone());
        }
        index
    }

    /// Adds `handle` under `category`, replacing any handle of the same name.
    pub fn insert(&mut self, category: &str, handle: FieldHandle) {
        self.categories
            .entry(category.to_string())
            .or_default()
            .insert(handle.name().to_string(), handle);
    }

    pub fn get(&self, category: &str, field: &str) -> Option<&FieldHandle> {
        self.categories.get(category)?.get(field)
    }

    /// Looks `field` up in every category, first match in category order.
    pub fn find(&self, field: &str) -> Option<(&str, &FieldHandle)> {
        self.categories.iter().find_map(|(category, fields)| {
            fields
                .get(field)
                .map(|handle| (category.as_str(), handle))
        })
    }

    pub fn contains(&self, category: &str, field: &str) -> bool {
        self.get(category, field).is_some()
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    /// Iterates categories with their fields, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &IndexMap<String, FieldHandle>)> {
        self.categories
            .iter()
            .map(|(category, fields)| (category.as_str(), fields))
    }

    /// Total number of indexed fields.
    pub fn len(&self) -> usize {
        self.categories.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Sample {
        volume: i32,
        name: String,
        secret: String,
    }

    fn sample_fields() -> FieldMap<Sample> {
        FieldMap::<Sample>::new()
            .field("volume", |c| &c.volume, |c| &mut c.volume)
            .category("Audio")
            .comment("Sound volume")
            .field("name", |c| &c.name, |c| &mut c.name)
            .field("secret", |c| &c.secret, |c| &mut c.secret)
    }

    #[test]
    fn test_handle_reads_current_value() {
        // Arrange
        let fields = sample_fields();
        let sample = Sample {
            volume: 70,
            ..Sample::default()
        };

        // Act
        let value = fields.handles()[0].read(&sample).unwrap();

        // Assert
        assert_eq!(value.downcast_ref::<i32>(), Some(&70));
    }

    #[test]
    fn test_handle_writes_value_of_matching_type() {
        let fields = sample_fields();
        let mut sample = Sample::default();

        fields.handles()[1]
            .write(&mut sample, Value::of("speaker".to_string()))
            .unwrap();

        assert_eq!(sample.name, "speaker");
    }

    #[test]
    fn test_handle_rejects_value_of_wrong_type() {
        let fields = sample_fields();
        let mut sample = Sample::default();

        let err = fields.handles()[0]
            .write(&mut sample, Value::of("loud".to_string()))
            .unwrap_err();

        assert!(matches!(err, FieldError::TypeMismatch { .. }));
        assert_eq!(sample.volume, 0, "failed write must leave the field alone");
    }

    #[test]
    fn test_handle_rejects_foreign_instance() {
        let fields = sample_fields();
        let err = fields.handles()[0].read(&42_u8).unwrap_err();
        assert_eq!(
            err,
            FieldError::WrongInstance {
                field: "volume".to_string()
            }
        );
    }

    #[test]
    fn test_metadata_applies_to_last_declared_field() {
        let fields = sample_fields();
        let volume = &fields.handles()[0];
        let name = &fields.handles()[1];

        assert_eq!(volume.category(), "Audio");
        assert_eq!(volume.comment(), Some("Sound volume"));
        assert_eq!(name.category(), "General");
        assert_eq!(name.comment(), None);
    }

    #[test]
    fn test_build_groups_fields_by_category() {
        let fields = sample_fields();
        let index = FieldIndex::build(fields.handles(), &ConfigMeta::default());

        assert!(index.contains("Audio", "volume"));
        assert!(index.contains("General", "name"));
        assert!(!index.contains("General", "volume"));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_build_skips_excluded_fields() {
        let fields = sample_fields();
        let meta = ConfigMeta::new().exclude("secret");
        let index = FieldIndex::build(fields.handles(), &meta);

        assert!(index.find("secret").is_none());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_build_keeps_declaration_order() {
        let fields = FieldMap::<Sample>::new()
            .field("name", |c| &c.name, |c| &mut c.name)
            .category("Zeta")
            .field("volume", |c| &c.volume, |c| &mut c.volume)
            .category("Alpha");
        let index = FieldIndex::build(fields.handles(), &ConfigMeta::default());

        let order: Vec<&str> = index.iter().map(|(category, _)| category).collect();
        assert_eq!(order, vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn test_duplicate_declaration_last_one_wins() {
        let fields = FieldMap::<Sample>::new()
            .field("volume", |c| &c.volume, |c| &mut c.volume)
            .comment("first")
            .field("volume", |c| &c.volume, |c| &mut c.volume)
            .comment("second");
        let index = FieldIndex::build(fields.handles(), &ConfigMeta::default());

        assert_eq!(index.len(), 1);
        assert_eq!(
            index.get("General", "volume").and_then(FieldHandle::comment),
            Some("second")
        );
    }

    #[test]
    fn test_find_searches_all_categories() {
        let fields = sample_fields();
        let index = FieldIndex::build(fields.handles(), &ConfigMeta::default());

        let (category, handle) = index.find("volume").unwrap();
        assert_eq!(category, "Audio");
        assert_eq!(handle.name(), "volume");
    }
}

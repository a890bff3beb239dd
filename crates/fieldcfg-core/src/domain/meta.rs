//! Declaration metadata for config types and their fields.
//!
//! [`ConfigMeta`] describes a whole config type: which bootstrap phase loads
//! it, which handler strategy persists it, what its file is called and which
//! fields are left out.  [`FieldMeta`] carries the per-field category and the
//! human-readable comment written above each entry.

/// Category used for fields that do not declare one.
pub const DEFAULT_CATEGORY: &str = "General";

/// Identifier of the built-in handler strategy.
pub const DEFAULT_HANDLER: &str = "default";

/// Per-type config metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigMeta {
    /// Load during the early phase instead of the standard phase.
    pub early_init: bool,
    /// Identifier looked up in the [`crate::handler::HandlerCatalog`].
    pub handler: String,
    /// File name override.  `None` means `"<TypeName>.cfg"`.
    pub file_name: Option<String>,
    /// Field names that are never indexed, written or read.
    pub exclude: Vec<String>,
}

impl Default for ConfigMeta {
    fn default() -> Self {
        Self {
            early_init: false,
            handler: DEFAULT_HANDLER.to_string(),
            file_name: None,
            exclude: Vec::new(),
        }
    }
}

impl ConfigMeta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the type for the early bootstrap phase.
    pub fn early(mut self) -> Self {
        self.early_init = true;
        self
    }

    pub fn handler(mut self, handler: impl Into<String>) -> Self {
        self.handler = handler.into();
        self
    }

    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn exclude(mut self, field: impl Into<String>) -> Self {
        self.exclude.push(field.into());
        self
    }

    /// Returns `true` if `field` is in the exclude set.
    pub fn excludes(&self, field: &str) -> bool {
        self.exclude.iter().any(|name| name == field)
    }

    /// Resolves the on-disk file name for a type called `type_name`.
    pub fn resolve_file_name(&self, type_name: &str) -> String {
        match &self.file_name {
            Some(name) => name.clone(),
            None => format!("{type_name}.cfg"),
        }
    }
}

/// Per-field metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMeta {
    pub category: Option<String>,
    pub comment: Option<String>,
}

impl FieldMeta {
    /// The declared category, or [`DEFAULT_CATEGORY`].
    pub fn category_or_default(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_meta_uses_standard_phase_and_default_handler() {
        let meta = ConfigMeta::default();
        assert!(!meta.early_init);
        assert_eq!(meta.handler, DEFAULT_HANDLER);
        assert!(meta.exclude.is_empty());
    }

    #[test]
    fn test_resolve_file_name_defaults_to_type_name_cfg() {
        let meta = ConfigMeta::new();
        assert_eq!(meta.resolve_file_name("AudioConfig"), "AudioConfig.cfg");
    }

    #[test]
    fn test_resolve_file_name_honours_override() {
        let meta = ConfigMeta::new().file_name("sound.cfg");
        assert_eq!(meta.resolve_file_name("AudioConfig"), "sound.cfg");
    }

    #[test]
    fn test_excludes_matches_listed_names_only() {
        let meta = ConfigMeta::new().exclude("secret");
        assert!(meta.excludes("secret"));
        assert!(!meta.excludes("volume"));
    }

    #[test]
    fn test_field_without_category_falls_back_to_general() {
        assert_eq!(FieldMeta::default().category_or_default(), "General");
        let meta = FieldMeta {
            category: Some("Audio".to_string()),
            comment: None,
        };
        assert_eq!(meta.category_or_default(), "Audio");
    }
}

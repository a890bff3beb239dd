//! The built-in handler: reads and writes the categorized text format of
//! [`crate::format`].
//!
//! # Load cycle
//!
//! ```text
//! load_file()
//!  ├─ file missing  → write pass (current values become the defaults)
//!  └─ file present  → read pass → write pass
//! ```
//!
//! The write pass after every read normalizes the file: stale entries
//! disappear, newly declared fields appear with their current values, and
//! any hand-edited damage is repaired.  [`set_value`] also rewrites the whole
//! file, so every mutation is persisted immediately.
//!
//! [`set_value`]: ConfigurationHandler::set_value

use std::any::Any;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use super::ConfigurationHandler;
use crate::convert::ConverterChain;
use crate::domain::field::{FieldHandle, FieldIndex};
use crate::domain::value::Value;
use crate::format::{self, Entry, Line, Reader};

/// Handler that persists to `<config_dir>/<file_name>`.
#[derive(Debug)]
pub struct DefaultConfigurationHandler {
    config_dir: PathBuf,
    current: FieldIndex,
    cached_file: Option<PathBuf>,
}

impl DefaultConfigurationHandler {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
            current: FieldIndex::new(),
            cached_file: None,
        }
    }

    /// The working field index (empty until [`ConfigurationHandler::load_file`]).
    pub fn fields(&self) -> &FieldIndex {
        &self.current
    }

    /// Resolves `field`, preferring `category` and falling back to any
    /// category that declares it.
    fn resolve(&self, field: &str, category: &str) -> Option<&FieldHandle> {
        self.current
            .get(category, field)
            .or_else(|| self.current.find(field).map(|(_, handle)| handle))
    }

    fn read_file(
        &self,
        path: &Path,
        content: &str,
        config: &mut dyn Any,
        converters: &ConverterChain,
    ) {
        let mut reader = Reader::new();
        let mut category = String::new();

        for (number, line) in content.lines().enumerate() {
            match reader.feed(line) {
                Line::BlockOpen { category: name } => category = name,
                Line::Entry(Ok(entry)) => {
                    self.apply_entry(&category, &entry, config, converters);
                }
                Line::Entry(Err(e)) => {
                    warn!(
                        file = %path.display(),
                        line = number + 1,
                        "skipping malformed entry: {e}"
                    );
                }
                Line::BlockClose | Line::Comment | Line::Blank | Line::Ignored => {}
            }
        }
    }

    fn apply_entry(
        &self,
        category: &str,
        entry: &Entry,
        config: &mut dyn Any,
        converters: &ConverterChain,
    ) {
        let Some(handle) = self.resolve(&entry.field, category) else {
            debug!(category, field = %entry.field, "dropping stale entry");
            return;
        };

        match converters.deserialize(&entry.key, &entry.value) {
            Ok(Some(value)) => {
                if let Err(e) = handle.write(config, value) {
                    warn!(category, field = %entry.field, key = %entry.key, "keeping default: {e}");
                }
            }
            Ok(None) => {
                warn!(
                    category,
                    field = %entry.field,
                    key = %entry.key,
                    "no converter accepts this key; keeping default"
                );
            }
            Err(e) => {
                warn!(category, field = %entry.field, "keeping default: {e}");
            }
        }
    }

    /// Renders every indexed field with its current value.
    fn render(&self, config: &dyn Any, converters: &ConverterChain) -> String {
        let mut out = String::new();
        for (category, fields) in self.current.iter() {
            format::write_block_open(&mut out, category);
            for (name, handle) in fields {
                let value = match handle.read(config) {
                    Ok(value) => value,
                    Err(e) => {
                        warn!(category, field = %name, "cannot read field: {e}");
                        continue;
                    }
                };
                let key = converters.key_for(&value);
                let text = match converters.serialize(&value) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(category, field = %name, "cannot serialize field: {e}");
                        continue;
                    }
                };
                if text.contains(['\n', '\r']) {
                    warn!(
                        category,
                        field = %name,
                        key = %key,
                        "serialized value spans lines; not written"
                    );
                    continue;
                }
                format::write_entry(&mut out, handle.comment(), &key, name, &text);
            }
            format::write_block_close(&mut out);
        }
        out
    }

    fn write_file(&self, config: &dyn Any, converters: &ConverterChain) {
        let Some(path) = &self.cached_file else {
            warn!("write requested before any file was loaded");
            return;
        };
        let content = self.render(config, converters);
        if let Err(e) = write_atomically(path, &content) {
            error!(file = %path.display(), "failed to write config: {e}");
        }
    }
}

/// Writes `content` to `path`, creating the parent directory if needed.
///
/// The file handle is scoped to this call and closed on every return path.
fn write_atomically(path: &Path, content: &str) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, content)
}

impl ConfigurationHandler for DefaultConfigurationHandler {
    fn load_file(
        &mut self,
        file_name: &str,
        config: &mut dyn Any,
        hint: FieldIndex,
        converters: &ConverterChain,
    ) {
        self.current = hint;
        let path = self.config_dir.join(file_name);
        self.cached_file = Some(path.clone());

        match fs::read_to_string(&path) {
            Ok(content) => {
                debug!(file = %path.display(), "reading config");
                self.read_file(&path, &content, config, converters);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(file = %path.display(), "creating config from current values");
            }
            Err(e) => {
                error!(file = %path.display(), "failed to read config; keeping defaults: {e}");
                return;
            }
        }
        self.write_file(config, converters);
    }

    fn get_value(&self, field: &str, category: &str, _config: &dyn Any) -> Option<&FieldHandle> {
        self.current.get(category, field)
    }

    fn set_value(
        &mut self,
        field: &str,
        category: &str,
        value: Value,
        config: &mut dyn Any,
        converters: &ConverterChain,
    ) {
        let Some(handle) = self.resolve(field, category) else {
            warn!(category, field, "cannot set undeclared field");
            return;
        };
        if let Err(e) = handle.write(config, value) {
            warn!(category, field, "value not assigned: {e}");
        }
        self.write_file(config, converters);
    }

    fn has_value(&self, field: &str, category: &str) -> bool {
        self.current.contains(category, field)
    }

    fn config_file(&self, _file_name: &str, _config: &dyn Any) -> Option<PathBuf> {
        self.cached_file.clone()
    }
}

//! `--set category.field=value` assignments.
//!
//! The value text is parsed with the converter that already owns the
//! field's current value, so an assignment is type-checked exactly like an
//! entry read from the file.

use std::str::FromStr;

use anyhow::{bail, Context};
use fieldcfg_core::{ConfigRegistry, ConfigType};

use crate::app::{AudioConfig, DisplayConfig, NetworkConfig};

/// One parsed `category.field=value` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub category: String,
    pub field: String,
    pub text: String,
}

impl FromStr for Assignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (target, text) = s
            .split_once('=')
            .ok_or_else(|| format!("expected category.field=value, got '{s}'"))?;
        let (category, field) = target
            .split_once('.')
            .ok_or_else(|| format!("expected category.field before '=', got '{target}'"))?;
        if category.is_empty() || field.is_empty() {
            return Err(format!("empty category or field in '{s}'"));
        }
        Ok(Self {
            category: category.to_string(),
            field: field.to_string(),
            text: text.to_string(),
        })
    }
}

/// Applies `assignment` to whichever loaded config declares the field.
///
/// # Errors
///
/// Returns an error if no loaded config declares the field, or the value
/// text does not parse as the field's type.
pub fn apply(registry: &mut ConfigRegistry, assignment: &Assignment) -> anyhow::Result<()> {
    if apply_to::<DisplayConfig>(registry, assignment)?
        || apply_to::<AudioConfig>(registry, assignment)?
        || apply_to::<NetworkConfig>(registry, assignment)?
    {
        return Ok(());
    }
    bail!(
        "no loaded config declares {}.{}",
        assignment.category,
        assignment.field
    )
}

/// Returns `Ok(false)` if `T` is not loaded or does not declare the field.
fn apply_to<T: ConfigType>(
    registry: &mut ConfigRegistry,
    assignment: &Assignment,
) -> anyhow::Result<bool> {
    let handle = match registry.get_value::<T>(&assignment.field, &assignment.category) {
        Ok(Some(handle)) => handle,
        Ok(None) | Err(_) => return Ok(false),
    };
    let Some(instance) = registry.instance::<T>() else {
        return Ok(false);
    };

    let current = handle.read(&*instance.borrow())?;
    let key = registry.key_for(&current);
    let target = format!("{}.{}", assignment.category, assignment.field);
    let value = registry
        .deserialize(&key, &assignment.text)
        .with_context(|| format!("invalid value for {target}"))?
        .with_context(|| format!("no converter accepts type key '{key}'"))?;

    registry.set_value::<T>(&assignment.field, &assignment.category, value)?;
    Ok(true)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

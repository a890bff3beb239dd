//! The built-in fallback converter for scalar Rust types.
//!
//! | Rust type | Key      | Rust type | Key      |
//! |-----------|----------|-----------|----------|
//! | `bool`    | `bool`   | `u8`      | `ubyte`  |
//! | `i8`      | `byte`   | `u16`     | `ushort` |
//! | `i16`     | `short`  | `u32`     | `uint`   |
//! | `i32`     | `int`    | `u64`     | `ulong`  |
//! | `i64`     | `long`   | `f32`     | `float`  |
//! | `char`    | `char`   | `f64`     | `double` |
//! | `String`  | `string` |           |          |
//!
//! Numbers and booleans tolerate surrounding whitespace on read, since the
//! files are edited by hand.  Strings and chars are taken verbatim except
//! for three escapes: a line feed is written as `\n`, a carriage return as
//! `\r` and a backslash as `\\`, so every value stays on its entry line.
//! On read an unrecognised escape is kept as typed.

use std::any::{Any, TypeId};
use std::fmt::Display;
use std::str::FromStr;

use super::Converter;
use crate::domain::value::Value;
use crate::error::ConvertError;

struct Primitive {
    key: &'static str,
    type_id: TypeId,
    render: fn(&Value) -> Option<String>,
    parse: fn(&str) -> Result<Value, String>,
}

fn render<V: Any + Display>(value: &Value) -> Option<String> {
    value.downcast_ref::<V>().map(ToString::to_string)
}

fn parse_trimmed<V>(text: &str) -> Result<Value, String>
where
    V: Any + FromStr,
    V::Err: Display,
{
    text.trim()
        .parse::<V>()
        .map(Value::of)
        .map_err(|e| e.to_string())
}

fn render_escaped<V: Any + Display>(value: &Value) -> Option<String> {
    value.downcast_ref::<V>().map(|v| escape(&v.to_string()))
}

/// Escapes the characters that would break an entry line.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn parse_bool(text: &str) -> Result<Value, String> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Ok(Value::of(true))
    } else if text.eq_ignore_ascii_case("false") {
        Ok(Value::of(false))
    } else {
        Err("expected 'true' or 'false'".to_string())
    }
}

fn parse_string(text: &str) -> Result<Value, String> {
    Ok(Value::of(unescape(text)))
}

fn parse_char(text: &str) -> Result<Value, String> {
    unescape(text)
        .parse::<char>()
        .map(Value::of)
        .map_err(|e| e.to_string())
}

fn entry<V>(key: &'static str) -> Primitive
where
    V: Any + Display + FromStr,
    V::Err: Display,
{
    Primitive {
        key,
        type_id: TypeId::of::<V>(),
        render: render::<V>,
        parse: parse_trimmed::<V>,
    }
}

/// Fallback converter for `bool`, the integer types, floats, `char` and
/// `String`.
pub struct PrimitiveConverter {
    table: Vec<Primitive>,
}

impl PrimitiveConverter {
    pub fn new() -> Self {
        let table = vec![
            Primitive {
                parse: parse_bool,
                ..entry::<bool>("bool")
            },
            entry::<i8>("byte"),
            entry::<i16>("short"),
            entry::<i32>("int"),
            entry::<i64>("long"),
            entry::<u8>("ubyte"),
            entry::<u16>("ushort"),
            entry::<u32>("uint"),
            entry::<u64>("ulong"),
            entry::<f32>("float"),
            entry::<f64>("double"),
            Primitive {
                render: render_escaped::<char>,
                parse: parse_char,
                ..entry::<char>("char")
            },
            Primitive {
                render: render_escaped::<String>,
                parse: parse_string,
                ..entry::<String>("string")
            },
        ];
        Self { table }
    }

    fn by_type(&self, value: &Value) -> Option<&Primitive> {
        let type_id = value.type_id();
        self.table.iter().find(|p| p.type_id == type_id)
    }

    fn by_key(&self, key: &str) -> Option<&Primitive> {
        self.table.iter().find(|p| p.key == key)
    }
}

impl Default for PrimitiveConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl Converter for PrimitiveConverter {
    fn can_handle(&self, value: &Value) -> bool {
        self.by_type(value).is_some()
    }

    fn is_key_usable(&self, key: &str) -> bool {
        self.by_key(key).is_some()
    }

    fn key(&self, value: &Value) -> String {
        self.by_type(value)
            .map(|p| p.key.to_string())
            .unwrap_or_else(|| super::NULL_KEY.to_string())
    }

    fn serialize(&self, value: &Value) -> Result<String, ConvertError> {
        self.by_type(value)
            .and_then(|p| (p.render)(value))
            .ok_or(ConvertError::Unsupported {
                type_name: value.type_name(),
            })
    }

    fn deserialize(&self, key: &str, text: &str) -> Result<Value, ConvertError> {
        let primitive = self.by_key(key).ok_or_else(|| ConvertError::UnknownKey {
            key: key.to_string(),
        })?;
        (primitive.parse)(text).map_err(|reason| ConvertError::Parse {
            key: key.to_string(),
            text: text.to_string(),
            reason,
        })
    }
}

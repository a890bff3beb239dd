//! Line-oriented text format of a config file.
//!
//! File layout:
//! ```text
//! <category> {
//! \t<comment-text>
//! \t<typeKey>:<fieldName>=<serializedValue>
//!
//! \t<comment-text>
//! \t<typeKey>:<fieldName>=<serializedValue>
//!
//! }
//! ```
//!
//! One block per category.  Inside a block every field takes exactly three
//! lines: a comment, the entry, and a blank separator.  The grammar is
//! positional: the reader does not look at the comment or separator lines at
//! all, it only counts them.  A hand edit that adds or removes a line inside
//! a block shifts every later entry of that block out of position; those
//! entries are skipped and the next rewrite restores the layout.
//!
//! This module only knows the grammar.  Resolving entries to fields and
//! converting values is done by [`crate::handler`].

use crate::error::FormatError;

/// Character that marks a block header line.
pub const BLOCK_OPEN: char = '{';

/// Exact content of a block's closing line.
pub const BLOCK_CLOSE: &str = "}";

/// Comment written for fields that declare none.
pub const MISSING_COMMENT: &str = "No comment provided for this field.";

/// One parsed `key:name=value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Type key, with any tab characters removed.
    pub key: String,
    /// Field name, verbatim.
    pub field: String,
    /// Serialized value: everything after the `=`, verbatim.
    pub value: String,
}

/// Splits an entry line into key, field name and value.
///
/// The key ends at the first `:`, the name at the first `=` after it.
///
/// # Errors
///
/// Returns [`FormatError`] when either separator is missing or the first
/// `=` precedes the first `:`.
///
/// # Examples
///
/// ```rust
/// use fieldcfg_core::format::parse_entry;
///
/// let entry = parse_entry("\tint:volume=100").unwrap();
/// assert_eq!(entry.key, "int");
/// assert_eq!(entry.field, "volume");
/// assert_eq!(entry.value, "100");
/// ```
pub fn parse_entry(line: &str) -> Result<Entry, FormatError> {
    if let (Some(colon), Some(equals)) = (line.find(':'), line.find('=')) {
        if equals < colon {
            return Err(FormatError::MisplacedKeySeparator {
                line: line.to_string(),
            });
        }
    }
    let (key, rest) = line
        .split_once(':')
        .ok_or_else(|| FormatError::MissingKeySeparator {
            line: line.to_string(),
        })?;
    let (field, value) = rest
        .split_once('=')
        .ok_or_else(|| FormatError::MissingValueSeparator {
            line: line.to_string(),
        })?;
    Ok(Entry {
        key: key.replace('\t', ""),
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Where the reader is relative to the block structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Between blocks, waiting for a header.
    OutsideBlock,
    /// Inside a block, next line is a comment.
    Comment,
    /// Inside a block, next line is an entry.
    Entry,
    /// Inside a block, next line is the blank separator.
    Blank,
}

/// Classification of one line, produced by [`Reader::feed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// A block header; `category` is the text before the `{`, trimmed.
    BlockOpen { category: String },
    BlockClose,
    Comment,
    Entry(Result<Entry, FormatError>),
    Blank,
    /// Text outside any block.
    Ignored,
}

/// Positional reader over the lines of a config file.
#[derive(Debug)]
pub struct Reader {
    position: Position,
}

impl Reader {
    pub fn new() -> Self {
        Self {
            position: Position::OutsideBlock,
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Classifies `line` and advances the reader.
    pub fn feed(&mut self, line: &str) -> Line {
        match self.position {
            Position::OutsideBlock => match line.split_once(BLOCK_OPEN) {
                Some((category, _)) => {
                    self.position = Position::Comment;
                    Line::BlockOpen {
                        category: category.trim().to_string(),
                    }
                }
                None => Line::Ignored,
            },
            _ if line == BLOCK_CLOSE => {
                self.position = Position::OutsideBlock;
                Line::BlockClose
            }
            Position::Comment => {
                self.position = Position::Entry;
                Line::Comment
            }
            Position::Entry => {
                self.position = Position::Blank;
                Line::Entry(parse_entry(line))
            }
            Position::Blank => {
                self.position = Position::Comment;
                Line::Blank
            }
        }
    }
}

impl Default for Reader {
    fn default() -> Self {
        Self::new()
    }
}

/// Appends a block header for `category`.
pub fn write_block_open(out: &mut String, category: &str) {
    out.push_str(category);
    out.push(' ');
    out.push(BLOCK_OPEN);
    out.push('\n');
}

/// Appends one field's comment, entry and separator lines.
///
/// Line breaks in `comment` are replaced by spaces so the entry stays on
/// the line the reader expects it on.
pub fn write_entry(out: &mut String, comment: Option<&str>, key: &str, field: &str, value: &str) {
    let comment = comment.unwrap_or(MISSING_COMMENT);
    out.push('\t');
    out.extend(
        comment
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c }),
    );
    out.push('\n');
    out.push('\t');
    out.push_str(key);
    out.push(':');
    out.push_str(field);
    out.push('=');
    out.push_str(value);
    out.push('\n');
    out.push('\n');
}

/// Appends a block's closing line.
pub fn write_block_close(out: &mut String) {
    out.push_str(BLOCK_CLOSE);
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(text: &str) -> Vec<Line> {
        let mut reader = Reader::new();
        text.lines().map(|line| reader.feed(line)).collect()
    }

    #[test]
    fn test_parse_entry_splits_key_field_and_value() {
        let entry = parse_entry("\tstring:motd=a:b=c").unwrap();
        assert_eq!(entry.key, "string");
        assert_eq!(entry.field, "motd");
        assert_eq!(entry.value, "a:b=c");
    }

    #[test]
    fn test_parse_entry_keeps_empty_value() {
        let entry = parse_entry("\tstring:motd=").unwrap();
        assert_eq!(entry.value, "");
    }

    #[test]
    fn test_parse_entry_without_colon_is_rejected() {
        assert_eq!(
            parse_entry("\tvolume=5"),
            Err(FormatError::MissingKeySeparator {
                line: "\tvolume=5".to_string()
            })
        );
    }

    #[test]
    fn test_parse_entry_without_equals_is_rejected() {
        assert!(matches!(
            parse_entry("\tint:volume"),
            Err(FormatError::MissingValueSeparator { .. })
        ));
    }

    #[test]
    fn test_parse_entry_with_equals_before_colon_is_rejected() {
        assert_eq!(
            parse_entry("\ta=b:c=d"),
            Err(FormatError::MisplacedKeySeparator {
                line: "\ta=b:c=d".to_string()
            })
        );
    }

    #[test]
    fn test_reader_walks_three_line_cycle() {
        // Arrange
        let text = "Audio {\n\tSound volume\n\tint:volume=100\n\n}\n";

        // Act
        let lines = feed_all(text);

        // Assert
        assert_eq!(
            lines,
            vec![
                Line::BlockOpen {
                    category: "Audio".to_string()
                },
                Line::Comment,
                Line::Entry(Ok(Entry {
                    key: "int".to_string(),
                    field: "volume".to_string(),
                    value: "100".to_string(),
                })),
                Line::Blank,
                Line::BlockClose,
            ]
        );
    }

    #[test]
    fn test_reader_ignores_text_between_blocks() {
        let lines = feed_all("stray text\n\nGeneral {\n}\ntrailing");
        assert_eq!(lines[0], Line::Ignored);
        assert_eq!(lines[1], Line::Ignored);
        assert!(matches!(lines[2], Line::BlockOpen { .. }));
        assert_eq!(lines[3], Line::BlockClose);
        assert_eq!(lines[4], Line::Ignored);
    }

    #[test]
    fn test_close_marker_must_match_exactly() {
        let mut reader = Reader::new();
        reader.feed("General {");
        assert_eq!(reader.feed(" }"), Line::Comment);
        assert_eq!(reader.position(), Position::Entry);
    }

    #[test]
    fn test_block_open_resets_cycle() {
        let mut reader = Reader::new();
        reader.feed("A {");
        reader.feed("\tcomment");
        reader.feed("}");
        assert_eq!(reader.position(), Position::OutsideBlock);
        reader.feed("B {");
        assert_eq!(reader.position(), Position::Comment);
    }

    #[test]
    fn test_written_block_matches_grammar() {
        let mut out = String::new();
        write_block_open(&mut out, "Audio");
        write_entry(&mut out, Some("Sound volume"), "int", "volume", "100");
        write_block_close(&mut out);

        assert_eq!(out, "Audio {\n\tSound volume\n\tint:volume=100\n\n}\n");
    }

    #[test]
    fn test_missing_comment_uses_placeholder() {
        let mut out = String::new();
        write_entry(&mut out, None, "bool", "muted", "false");
        assert_eq!(out, format!("\t{MISSING_COMMENT}\n\tbool:muted=false\n\n"));
    }

    #[test]
    fn test_multi_line_comment_is_flattened() {
        let mut out = String::new();
        write_entry(&mut out, Some("first\nsecond"), "int", "x", "1");
        assert!(out.starts_with("\tfirst second\n"));
    }

    #[test]
    fn test_written_output_reads_back() {
        let mut out = String::new();
        write_block_open(&mut out, "General");
        write_entry(&mut out, None, "int", "a", "1");
        write_entry(&mut out, Some("b"), "string", "b", "two");
        write_block_close(&mut out);

        let entries: Vec<Entry> = feed_all(&out)
            .into_iter()
            .filter_map(|line| match line {
                Line::Entry(Ok(entry)) => Some(entry),
                _ => None,
            })
            .collect();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].field, "b");
        assert_eq!(entries[1].value, "two");
    }
}

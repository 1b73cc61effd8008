//! Symbol name normalization.
//!
//! Function, class and method names are matched case-insensitively, and a
//! fully-qualified name may be written with a leading namespace separator
//! (`\DateTime`, `\implode`). Every registry lookup goes through [`SymbolKey`]
//! so that `\Foo\bar`, `Foo\bar` and `FOO\Bar` all address the same level.
//!
//! The spelling a symbol was first registered with is kept separately by the
//! registry for display.

use std::borrow::Borrow;
use std::fmt;

/// Namespace separator used in qualified names.
pub const NAMESPACE_SEPARATOR: char = '\\';

/// A normalized lookup key for a function, class or method name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolKey(String);

impl SymbolKey {
    /// Normalize a raw name into a key.
    ///
    /// Surrounding whitespace and one leading `\` are removed, then the name
    /// is ASCII-lowercased.
    pub fn new(raw: &str) -> Self {
        SymbolKey(display_name(raw).to_ascii_lowercase())
    }

    /// The normalized key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key is empty (the raw name was blank or just `\`).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolKey({})", self.0)
    }
}

impl fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for SymbolKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SymbolKey {
    fn from(raw: &str) -> Self {
        SymbolKey::new(raw)
    }
}

/// Strip surrounding whitespace and a single leading `\` from a name,
/// keeping the original case.
pub fn display_name(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix(NAMESPACE_SEPARATOR)
        .unwrap_or(trimmed)
}

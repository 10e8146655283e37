//! Order- and comment-preserving TOML document model.
//!
//! Wraps `toml_edit` with dotted key-path operations so migration steps can
//! splice values in and out of `pyproject.toml` without disturbing unrelated
//! content. Every byte outside the edited key path survives serialization,
//! including comments attached to sibling keys.

use crate::core::{Error, Result};
use std::fmt;
use std::path::Path;
use toml_edit::{DocumentMut, Item, Table, Value};

/// A parsed TOML document supporting surgical key-path edits.
#[derive(Debug, Clone, Default)]
pub struct Document {
    inner: DocumentMut,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Document {
            inner: DocumentMut::new(),
        }
    }

    /// Parse TOML text. Malformed input fails with a `Parse` error carrying
    /// the line number; nothing is mutated on failure.
    pub fn parse(text: &str, file: &Path) -> Result<Self> {
        match text.parse::<DocumentMut>() {
            Ok(inner) => Ok(Document { inner }),
            Err(err) => {
                let line = err
                    .span()
                    .map(|span| text[..span.start].bytes().filter(|b| *b == b'\n').count() + 1)
                    .unwrap_or(0);
                Err(Error::parse(file, line, err.message()))
            }
        }
    }

    /// Look up a value by dotted key path, e.g. `tool.ruff.line-length`.
    pub fn get(&self, key_path: &str) -> Option<&Item> {
        let mut current: &Item = self.inner.as_item();
        for part in key_path.split('.') {
            current = current.as_table_like()?.get(part)?;
        }
        Some(current)
    }

    /// Mutable lookup by dotted key path.
    pub fn get_mut(&mut self, key_path: &str) -> Option<&mut Item> {
        let mut current: &mut Item = self.inner.as_item_mut();
        for part in key_path.split('.') {
            current = current.as_table_like_mut()?.get_mut(part)?;
        }
        Some(current)
    }

    pub fn contains(&self, key_path: &str) -> bool {
        self.get(key_path).is_some()
    }

    /// Convenience accessor for string leaves.
    pub fn get_str(&self, key_path: &str) -> Option<&str> {
        self.get(key_path).and_then(Item::as_str)
    }

    /// Set a value at a dotted key path. Intermediate tables are created as
    /// needed and marked implicit so they never emit a bare header of their
    /// own. New keys land at the end of their enclosing table; comments on
    /// sibling keys are untouched.
    pub fn set(&mut self, key_path: &str, value: Value) {
        self.set_item(key_path, toml_edit::value(value));
    }

    /// Set an arbitrary item (value or table) at a dotted key path.
    pub fn set_item(&mut self, key_path: &str, item: Item) {
        let parts: Vec<&str> = key_path.split('.').collect();
        let mut current: &mut Item = self.inner.as_item_mut();
        for part in &parts[..parts.len() - 1] {
            let table_like = current
                .as_table_like_mut()
                .expect("document root is always a table");
            if !table_like
                .get(part)
                .map(|item| item.is_table_like())
                .unwrap_or(false)
            {
                let mut table = Table::new();
                table.set_implicit(true);
                table_like.insert(part, Item::Table(table));
            }
            current = table_like
                .get_mut(part)
                .expect("intermediate table inserted above");
        }
        if let Some(table_like) = current.as_table_like_mut() {
            table_like.insert(parts[parts.len() - 1], item);
        }
    }

    /// Create an explicit (header-emitting) table at a key path if absent.
    pub fn ensure_table(&mut self, key_path: &str) {
        if !self.get(key_path).map(Item::is_table_like).unwrap_or(false) {
            self.set_item(key_path, Item::Table(Table::new()));
        }
    }

    /// Remove the value at a dotted key path. Returns whether anything was
    /// removed. An enclosing table that becomes empty and was implicitly
    /// created is removed as well; explicit tables the user wrote stay even
    /// when emptied.
    pub fn remove(&mut self, key_path: &str) -> bool {
        let parts: Vec<&str> = key_path.split('.').collect();
        Self::remove_in(self.inner.as_table_mut(), &parts)
    }

    fn remove_in(table: &mut Table, parts: &[&str]) -> bool {
        if parts.len() == 1 {
            return table.remove(parts[0]).is_some();
        }
        let Some(child) = table.get_mut(parts[0]).and_then(Item::as_table_mut) else {
            return false;
        };
        let removed = Self::remove_in(child, &parts[1..]);
        if removed && child.is_empty() && child.is_implicit() {
            table.remove(parts[0]);
        }
        removed
    }

    /// Iterate the keys of a table-like item at a key path.
    pub fn keys(&self, key_path: &str) -> Vec<String> {
        self.get(key_path)
            .and_then(Item::as_table_like)
            .map(|t| t.iter().map(|(k, _)| k.to_string()).collect())
            .unwrap_or_default()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.fmt(f)
    }
}

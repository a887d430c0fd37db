//! Localized display text.
//!
//! The pipeline only consumes translations: every user-visible string goes
//! through [`Translator::translate`] with a key and an English fallback, and the
//! returned text is treated as opaque.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;

/// Lookup service for display strings.
pub trait Translator: Send + Sync {
    /// Return the text for `key`, or `fallback` when there is none.
    fn translate(&self, key: &str, fallback: &str) -> String;
}

/// Translator that always returns the fallback text.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackTranslator;

impl Translator for FallbackTranslator {
    fn translate(&self, _key: &str, fallback: &str) -> String {
        fallback.to_owned()
    }
}

/// Translator backed by a TOML table.
///
/// Nested tables are flattened into dotted keys, so `[contact]` followed by
/// `send_message = "..."` answers the key `contact.send_message`.
#[derive(Debug, Clone, Default)]
pub struct CatalogTranslator {
    entries: HashMap<String, String>,
}

impl CatalogTranslator {
    /// Build a catalog from in-memory entries.
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse a catalog from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not TOML or holds a non-string leaf.
    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let table: toml::Table =
            toml::from_str(contents).context("failed to parse translation catalog")?;
        let mut entries = HashMap::new();
        flatten_into(&mut entries, "", &table)?;
        Ok(Self { entries })
    }

    /// Load a catalog from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid catalog at {}", path.display()))
    }

    /// Number of entries in the catalog.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn flatten_into(
    out: &mut HashMap<String, String>,
    prefix: &str,
    table: &toml::Table,
) -> anyhow::Result<()> {
    for (key, value) in table {
        let full = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::String(text) => {
                out.insert(full, text.clone());
            }
            toml::Value::Table(nested) => flatten_into(out, &full, nested)?,
            other => anyhow::bail!(
                "catalog entry {full} must be a string, got {}",
                other.type_str()
            ),
        }
    }
    Ok(())
}

impl Translator for CatalogTranslator {
    fn translate(&self, key: &str, fallback: &str) -> String {
        match self.entries.get(key) {
            Some(text) if !text.is_empty() => text.clone(),
            _ => fallback.to_owned(),
        }
    }
}

//! Name -> model lookup.

use std::collections::BTreeMap;

use std::fmt;

use crate::domain::Dataset;
use crate::models::LineShapeModel;

/// Builds a model bound to a dataset.
pub type ModelFactory = for<'a> fn(&'a Dataset) -> Box<dyn LineShapeModel + 'a>;

#[derive(Clone, Copy)]
pub struct ModelEntry {
    pub name: &'static str,
    pub description: &'static str,
    factory: ModelFactory,
}

impl ModelEntry {
    pub fn create<'a>(&self, data: &'a Dataset) -> Box<dyn LineShapeModel + 'a> {
        (self.factory)(data)
    }
}

impl fmt::Debug for ModelEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelEntry")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

/// A model name the registry does not know; displays with the listing of
/// the names it does know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownModel {
    pub name: String,
    pub listing: String,
}

impl fmt::Display for UnknownModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: unknown model '{}'.\n{}", self.name, self.listing)
    }
}

impl std::error::Error for UnknownModel {}

/// Case-insensitive registry of line-shape models, listed in name order.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    entries: BTreeMap<String, ModelEntry>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every model shipped with the crate.
    pub fn builtin() -> Self {
        let mut reg = Self::new();
        reg.register(
            "symmetricresonant",
            "Resonant tunneling, symmetric coupling (gamma, norm).",
            crate::models::symmetric_resonant::create,
        );
        reg.register(
            "asymmetricresonant",
            "Resonant tunneling, asymmetric coupling (gammal, gammar, r, norm).",
            crate::models::asymmetric_resonant::create,
        );
        reg.register(
            "symmetricnonresonant",
            "Nonresonant tunneling, symmetric coupling (cepsilon, cgamma, norm).",
            crate::models::symmetric_nonresonant::create,
        );
        reg.register(
            "interference",
            "Transport near an interference feature (comega, norm).",
            crate::models::interference::create,
        );
        reg
    }

    /// Add or replace a model under `name` (stored lowercase).
    pub fn register(&mut self, name: &'static str, description: &'static str, factory: ModelFactory) {
        self.entries.insert(
            name.to_ascii_lowercase(),
            ModelEntry {
                name,
                description,
                factory,
            },
        );
    }

    pub fn lookup(&self, name: &str) -> Option<&ModelEntry> {
        self.entries.get(&name.trim().to_ascii_lowercase())
    }

    pub fn entries(&self) -> impl Iterator<Item = &ModelEntry> {
        self.entries.values()
    }

    /// Build the named model for `data`.
    pub fn create<'a>(&self, name: &str, data: &'a Dataset) -> Result<Box<dyn LineShapeModel + 'a>, UnknownModel> {
        match self.lookup(name) {
            Some(entry) => Ok(entry.create(data)),
            None => Err(UnknownModel {
                name: name.trim().to_ascii_lowercase(),
                listing: self.describe(),
            }),
        }
    }

    /// Human-readable listing of the registered models.
    pub fn describe(&self) -> String {
        let mut out = String::from("Recognized models:\n");
        for entry in self.entries.values() {
            out.push_str(&format!("   {:<22} {}\n", entry.name, entry.description));
        }
        out.truncate(out.trim_end().len());
        out
    }
}

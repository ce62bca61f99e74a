use anyhow::{Result, anyhow};
use std::collections::HashMap;

use crate::record::Category;

/// Built-in spellings for each vehicle class, matched case-insensitively.
static DEFAULT_ALIASES: &[(&str, Category)] = &[
    ("2w", Category::TwoWheeler),
    ("two wheeler", Category::TwoWheeler),
    ("motor cycle", Category::TwoWheeler),
    ("motorcycle", Category::TwoWheeler),
    ("scooter", Category::TwoWheeler),
    ("3w", Category::ThreeWheeler),
    ("three wheeler", Category::ThreeWheeler),
    ("auto rickshaw", Category::ThreeWheeler),
    ("4w", Category::FourWheeler),
    ("four wheeler", Category::FourWheeler),
    ("car", Category::FourWheeler),
    ("suv", Category::FourWheeler),
];

/// Maps category spellings found in source data to a [`Category`].
///
/// Extra aliases can be stored as a plain JSON object on disk:
/// ```json
/// {
///   "Moped": "2W",
///   "E-Rickshaw": "3W"
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CategoryAliases {
    entries: HashMap<String, Category>,
}

impl Default for CategoryAliases {
    fn default() -> Self {
        let entries = DEFAULT_ALIASES
            .iter()
            .map(|(alias, category)| (alias.to_string(), *category))
            .collect();
        Self { entries }
    }
}

impl CategoryAliases {
    /// Loads the built-in table and merges the aliases from the JSON file at `path` over it.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let raw: HashMap<String, String> = serde_json::from_str(&content)?;

        let mut aliases = Self::default();
        for (alias, code) in raw {
            let category = aliases
                .resolve(&code)
                .ok_or_else(|| anyhow!("alias `{}` maps to unknown category `{}`", alias, code))?;
            aliases.insert(&alias, category);
        }
        Ok(aliases)
    }

    /// Adds or replaces a single alias.
    pub fn insert(&mut self, alias: &str, category: Category) {
        self.entries.insert(Self::fold(alias), category);
    }

    /// Resolves a raw category string, ignoring case, surrounding whitespace
    /// and `-`/`_` separators.
    pub fn resolve(&self, raw: &str) -> Option<Category> {
        self.entries.get(&Self::fold(raw)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn fold(raw: &str) -> String {
        raw.replace(['-', '_'], " ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

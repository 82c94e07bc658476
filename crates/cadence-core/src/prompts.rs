//! Growth prompts and weekly actions.
//!
//! Both are fixed, ordered tables supplied from outside the engine. A
//! sequence number picks an item by modulo, so once a table runs out the
//! cadence starts over from the first item.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CoreError, Result, ValidationError};

const BUILTIN_GROWTH: &str = include_str!("../data/growth_prompts.json");
const BUILTIN_WEEKLY: &str = include_str!("../data/weekly_actions.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthPrompt {
    pub number: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyAction {
    pub number: u32,
    pub title: String,
    pub text: String,
}

/// `table[(sequence - 1) mod len]`.
///
/// # Errors
/// Fails on an empty table or a zero sequence number.
pub fn lookup<T>(table: &[T], sequence: u32) -> Result<&T, ValidationError> {
    if table.is_empty() {
        return Err(ValidationError::EmptyCollection("prompt table".into()));
    }
    if sequence == 0 {
        return Err(ValidationError::InvalidValue {
            field: "sequence".into(),
            message: "sequence numbers start at 1".into(),
        });
    }
    let index = (sequence as usize - 1) % table.len();
    Ok(&table[index])
}

/// Non-empty ordered table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PromptTable<T> {
    items: Vec<T>,
}

impl<T> PromptTable<T> {
    pub fn new(items: Vec<T>) -> Result<Self, ValidationError> {
        if items.is_empty() {
            return Err(ValidationError::EmptyCollection("prompt table".into()));
        }
        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn lookup(&self, sequence: u32) -> Result<&T, ValidationError> {
        lookup(&self.items, sequence)
    }
}

impl<T: DeserializeOwned> PromptTable<T> {
    /// Parse a JSON array of items.
    pub fn from_json(json: &str) -> Result<Self> {
        let items: Vec<T> = serde_json::from_str(json)?;
        Ok(Self::new(items)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

/// Tables for the two prompted tracks.
#[derive(Debug, Clone)]
pub struct PromptBook {
    pub growth: PromptTable<GrowthPrompt>,
    pub weekly: PromptTable<WeeklyAction>,
}

impl PromptBook {
    /// Tables compiled into the crate.
    pub fn builtin() -> Result<Self> {
        Ok(Self {
            growth: PromptTable::from_json(BUILTIN_GROWTH)?,
            weekly: PromptTable::from_json(BUILTIN_WEEKLY)?,
        })
    }

    /// Load tables from files, using the built-in table for any path not given.
    pub fn load(growth: Option<&Path>, weekly: Option<&Path>) -> Result<Self> {
        let builtin = Self::builtin()?;
        let growth = match growth {
            Some(path) => PromptTable::load(path).map_err(|e| with_path(path, e))?,
            None => builtin.growth,
        };
        let weekly = match weekly {
            Some(path) => PromptTable::load(path).map_err(|e| with_path(path, e))?,
            None => builtin.weekly,
        };
        Ok(Self { growth, weekly })
    }
}

fn with_path(path: &Path, err: CoreError) -> CoreError {
    crate::error::ConfigError::LoadFailed {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
    .into()
}

//! Persistence of the active theme index.
//!
//! The stored record is tiny JSON: the index (string-encoded), the derived
//! tone and when it was written. Reading never fails loudly: a missing or
//! corrupt record just means "no stored theme".

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::Tone;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTheme {
    /// Effect index, string-encoded.
    pub index: String,
    pub tone: Tone,
    pub updated_at: DateTime<Utc>,
}

impl StoredTheme {
    pub fn new(index: usize, tone: Tone) -> Self {
        Self {
            index: index.to_string(),
            tone,
            updated_at: Utc::now(),
        }
    }

    /// The decoded index, if it is a non-negative integer.
    pub fn parsed_index(&self) -> Option<usize> {
        self.index.trim().parse().ok()
    }
}

/// Backing storage for the theme record.
pub trait ThemeStore {
    /// Raw record text, if any exists.
    fn read_raw(&self) -> Option<String>;

    fn write_raw(&mut self, raw: &str) -> Result<()>;

    /// Load the stored index. Absent, corrupt and non-numeric records all
    /// come back as `None`.
    fn load_index(&self) -> Option<usize> {
        let raw = self.read_raw()?;
        match serde_json::from_str::<StoredTheme>(&raw) {
            Ok(stored) => {
                let index = stored.parsed_index();
                if index.is_none() {
                    debug!(index = %stored.index, "ignoring non-numeric stored theme index");
                }
                index
            }
            Err(e) => {
                debug!("ignoring corrupt theme record: {}", e);
                None
            }
        }
    }

    fn save(&mut self, index: usize, tone: Tone) -> Result<()> {
        let raw = serde_json::to_string_pretty(&StoredTheme::new(index, tone))?;
        self.write_raw(&raw)
    }
}

/// Theme record stored as a JSON file.
#[derive(Debug, Clone)]
pub struct FileThemeStore {
    path: PathBuf,
}

impl FileThemeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/asciiscape/theme.json`, falling back to the working
    /// directory when the platform has no data dir.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("asciiscape")
            .join("theme.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ThemeStore for FileThemeStore {
    fn read_raw(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Some(raw),
            Err(e) => {
                debug!(path = %self.path.display(), "no theme record: {}", e);
                None
            }
        }
    }

    fn write_raw(&mut self, raw: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

/// In-memory store. Clones share the same slot, so a test can keep one
/// handle and inspect what the engine wrote through the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryThemeStore {
    slot: Rc<RefCell<Option<String>>>,
}

impl MemoryThemeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with arbitrary record text (possibly garbage).
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Some(raw.into()))),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.borrow().clone()
    }
}

impl ThemeStore for MemoryThemeStore {
    fn read_raw(&self) -> Option<String> {
        self.slot.borrow().clone()
    }

    fn write_raw(&mut self, raw: &str) -> Result<()> {
        *self.slot.borrow_mut() = Some(raw.to_string());
        Ok(())
    }
}

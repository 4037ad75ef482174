//! Lightweight workbook registry
//!
//! Holds the ordered list of worksheet identities for the lifetime of an
//! open writer. No serialization logic lives here; the archive producer
//! reads the entries when it writes `xl/workbook.xml` at finalize time.

use crate::error::{Result, XlsxError};

/// Excel caps sheet names at 31 characters
const MAX_TITLE_LEN: usize = 31;

const ILLEGAL_TITLE_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];

/// One registered worksheet identity
#[derive(Debug, Clone)]
pub(crate) struct SheetEntry {
    pub name: String,
    pub position: u32,
    pub active: bool,
}

/// Ordered catalog of worksheet identities, mutated only by the writer
#[derive(Debug, Default)]
pub(crate) struct SheetRegistry {
    entries: Vec<SheetEntry>,
}

impl SheetRegistry {
    pub fn new() -> Self {
        SheetRegistry::default()
    }

    /// Check a title against Excel's sheet naming rules and uniqueness.
    pub fn validate_title(&self, title: &str) -> Result<()> {
        let reject = |reason: &str| {
            Err(XlsxError::InvalidWorksheetTitle {
                title: title.to_string(),
                reason: reason.to_string(),
            })
        };

        if title.is_empty() {
            return reject("title must not be empty");
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return reject("title exceeds 31 characters");
        }
        if title.contains(ILLEGAL_TITLE_CHARS) {
            return reject("title contains one of [ ] : * ? / \\");
        }
        if self.entries.iter().any(|e| e.name == title) {
            return reject("a sheet with this title already exists");
        }
        Ok(())
    }

    /// Register a new sheet at the next position and mark it active.
    ///
    /// Entries are never removed; the sheet list of a package only grows.
    pub fn register(&mut self, title: &str) -> u32 {
        let position = self.entries.len() as u32 + 1;
        for entry in &mut self.entries {
            entry.active = false;
        }
        self.entries.push(SheetEntry {
            name: title.to_string(),
            position,
            active: true,
        });
        position
    }

    pub fn entries(&self) -> &[SheetEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Zero-based index of the active sheet, for `<workbookView activeTab>`
    pub fn active_index(&self) -> usize {
        self.entries
            .iter()
            .position(|e| e.active)
            .unwrap_or_default()
    }
}

use std::collections::HashMap;

use biblenames_types::{BookCode, BookOrderEntry};

use crate::error::{LoadError, OrderError};

/// A named, publication-specific book sequence.
///
/// Codes are opaque and may repeat when the source lists alternate
/// subdivisions of the same book (`SAM` next to `SA1`/`SA2`).
#[derive(Clone, Debug)]
pub struct BookOrder {
    name: String,
    codes: Vec<BookCode>,
    first_position: HashMap<BookCode, u32>,
}

impl BookOrder {
    /// Positions must run 1, 2, 3, ... in the order the entries are given.
    pub fn new(
        name: &str,
        entries: impl IntoIterator<Item = BookOrderEntry>,
    ) -> Result<Self, LoadError> {
        let mut codes = Vec::new();
        let mut first_position = HashMap::new();
        for entry in entries {
            let expected = codes.len() as u32 + 1;
            if entry.position != expected {
                return Err(LoadError::PositionMismatch {
                    order: name.to_string(),
                    code: entry.code,
                    expected,
                    found: entry.position,
                });
            }
            first_position.entry(entry.code).or_insert(expected);
            codes.push(entry.code);
        }
        if codes.is_empty() {
            return Err(LoadError::EmptyBookOrder {
                order: name.to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            codes,
            first_position,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 1-based position of the first occurrence of `code`.
    pub fn position_of(&self, code: BookCode) -> Result<u32, OrderError> {
        self.first_position
            .get(&code)
            .copied()
            .ok_or_else(|| OrderError::CodeNotInOrder {
                order: self.name.clone(),
                code,
            })
    }

    /// Codes in authored order, duplicates included.
    pub fn sequence(&self) -> &[BookCode] {
        &self.codes
    }

    pub fn contains(&self, code: BookCode) -> bool {
        self.first_position.contains_key(&code)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

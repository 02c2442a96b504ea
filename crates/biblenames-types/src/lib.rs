//! Shared types for canonical Bible book codes and the per-locale tables that
//! name them.
//!
//! A [`BookCode`] is the fixed three-character identifier every locale maps
//! its names onto (`GEN`, `SA1`, `CO2`, ...). Locales group books into
//! divisions keyed by a [`DivisionTag`], and a successful lookup yields a
//! [`ResolutionTarget`] that is one or the other, never both.
//!
//! The record structs mirror the already-parsed table rows handed over by a
//! data loader. They carry no validation of their own; the index crate checks
//! them against a [`BookCatalog`] when a locale is built.
//!
//! ```rust
//! use biblenames_types::{BookCatalog, BookCode, ResolutionTarget};
//!
//! let genesis = BookCode::new("GEN").unwrap();
//! let catalog = BookCatalog::new([genesis, BookCode::new("EXO").unwrap()]).unwrap();
//! assert_eq!(catalog.position(genesis), Some(0));
//! assert_eq!(ResolutionTarget::Book(genesis).to_string(), "GEN");
//! ```

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Three-character canonical book identifier (ASCII uppercase letters and digits).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct BookCode([u8; 3]);

impl BookCode {
    /// Validate and build a code such as `GEN` or `JN1`.
    pub fn new(raw: &str) -> Result<Self, CodeError> {
        let bytes = raw.as_bytes();
        if bytes.len() != 3 {
            return Err(CodeError::Length(raw.to_string()));
        }
        let mut code = [0u8; 3];
        for (slot, b) in code.iter_mut().zip(bytes) {
            if !(b.is_ascii_uppercase() || b.is_ascii_digit()) {
                return Err(CodeError::InvalidChar(raw.to_string()));
            }
            *slot = *b;
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).expect("book codes are ascii")
    }
}

impl FromStr for BookCode {
    type Err = CodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for BookCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Locale-scoped division identifier (`OT`, `PT`, `GOS`, ...).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct DivisionTag(String);

impl DivisionTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DivisionTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl Borrow<str> for DivisionTag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DivisionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a resolved name points at. Callers must branch on the kind.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum ResolutionTarget {
    Book(BookCode),
    Division(DivisionTag),
}

impl ResolutionTarget {
    /// Short kind label used in diagnostics and JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolutionTarget::Book(_) => "book",
            ResolutionTarget::Division(_) => "division",
        }
    }

    pub fn as_book(&self) -> Option<BookCode> {
        match self {
            ResolutionTarget::Book(code) => Some(*code),
            ResolutionTarget::Division(_) => None,
        }
    }

    pub fn as_division(&self) -> Option<&DivisionTag> {
        match self {
            ResolutionTarget::Book(_) => None,
            ResolutionTarget::Division(tag) => Some(tag),
        }
    }
}

impl fmt::Display for ResolutionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionTarget::Book(code) => code.fmt(f),
            ResolutionTarget::Division(tag) => tag.fmt(f),
        }
    }
}

/// A numeral or word prefix (`1`, `Saint`) and the spellings users type instead.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LeaderRecord {
    pub standard_leader: String,
    pub input_variants: Vec<String>,
}

/// One book's names in one locale.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BookNameRecord {
    pub reference_abbreviation: BookCode,
    pub default_name: String,
    pub default_abbreviation: String,
    pub input_variants: Vec<String>,
}

impl BookNameRecord {
    /// Every explicit token: default name, default abbreviation, then variants.
    pub fn tokens(&self) -> impl Iterator<Item = &str> + '_ {
        explicit_tokens(
            &self.default_name,
            &self.default_abbreviation,
            &self.input_variants,
        )
    }
}

/// A named group of books in one locale.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DivisionRecord {
    pub standard_abbreviation: DivisionTag,
    pub default_name: String,
    pub default_abbreviation: String,
    pub input_variants: Vec<String>,
    pub includes_book: Vec<BookCode>,
}

impl DivisionRecord {
    /// Every explicit token: default name, default abbreviation, then variants.
    pub fn tokens(&self) -> impl Iterator<Item = &str> + '_ {
        explicit_tokens(
            &self.default_name,
            &self.default_abbreviation,
            &self.input_variants,
        )
    }
}

fn explicit_tokens<'a>(
    name: &'a str,
    abbreviation: &'a str,
    variants: &'a [String],
) -> impl Iterator<Item = &'a str> + 'a {
    [name, abbreviation]
        .into_iter()
        .chain(variants.iter().map(String::as_str))
}

/// `(position, code)` row of a named book order. Codes are opaque here and
/// need not appear in the catalog (front/back-matter markers are allowed).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BookOrderEntry {
    pub position: u32,
    pub code: BookCode,
}

/// Ordered, duplicate-free set of canonical book codes.
#[derive(Clone, Debug, Default)]
pub struct BookCatalog {
    codes: Vec<BookCode>,
    positions: HashMap<BookCode, usize>,
}

impl BookCatalog {
    pub fn new(codes: impl IntoIterator<Item = BookCode>) -> Result<Self, CodeError> {
        let mut catalog = Self::default();
        for code in codes {
            if catalog.positions.insert(code, catalog.codes.len()).is_some() {
                return Err(CodeError::Duplicate(code));
            }
            catalog.codes.push(code);
        }
        Ok(catalog)
    }

    /// Zero-based catalog position of a code.
    pub fn position(&self, code: BookCode) -> Option<usize> {
        self.positions.get(&code).copied()
    }

    pub fn contains(&self, code: BookCode) -> bool {
        self.positions.contains_key(&code)
    }

    pub fn codes(&self) -> &[BookCode] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CodeError {
    #[error("book code {0:?} must be exactly three characters")]
    Length(String),
    #[error("book code {0:?} may only contain ASCII uppercase letters and digits")]
    InvalidChar(String),
    #[error("book code {0} is listed more than once in the catalog")]
    Duplicate(BookCode),
}

//! Resolve free-form Bible book names into canonical book codes.
//!
//! Each locale supplies three tables (numeral leaders, book names, divisions).
//! [`LocaleIndex::build`] folds them into one collision-checked
//! [`AbbreviationIndex`] and afterwards answers lookups without further
//! computation.
//!
//! # How it works
//! 1. Every default name, default abbreviation and input variant becomes an
//!    explicit token.
//! 2. Tokens that start with a standard leader ("1 Corinthians") are copied
//!    once per registered variant ("I Corinthians", "First Corinthians").
//! 3. Tokens are normalized: NFC, lowercase, punctuation stripped, whitespace
//!    folded per [`LocaleRules`].
//! 4. Every proper prefix of every key is offered as a shortcut. A shortcut
//!    wanted by more than one book or division is evicted instead of being
//!    assigned arbitrarily; an explicit token claimed by two targets fails
//!    the whole locale with [`LoadError::TokenCollision`].
//!
//! # Example
//! ```rust
//! use std::sync::Arc;
//!
//! use biblenames_index::{LocaleIndex, LocaleTables};
//! use biblenames_types::{BookCatalog, BookCode, BookNameRecord, LeaderRecord, ResolutionTarget};
//!
//! let co1 = BookCode::new("CO1").unwrap();
//! let co2 = BookCode::new("CO2").unwrap();
//! let catalog = Arc::new(BookCatalog::new([co1, co2]).unwrap());
//! let record = |code, name: &str, abbr: &str| BookNameRecord {
//!     reference_abbreviation: code,
//!     default_name: name.into(),
//!     default_abbreviation: abbr.into(),
//!     input_variants: Vec::new(),
//! };
//! let tables = LocaleTables {
//!     leaders: vec![LeaderRecord {
//!         standard_leader: "1".into(),
//!         input_variants: vec!["I".into(), "First".into()],
//!     }],
//!     names: vec![
//!         record(co1, "1 Corinthians", "1 Cor"),
//!         record(co2, "2 Corinthians", "2 Cor"),
//!     ],
//!     ..LocaleTables::default()
//! };
//! let locale = LocaleIndex::build("en", catalog, tables).unwrap();
//!
//! assert_eq!(locale.resolve("first cor"), Ok(ResolutionTarget::Book(co1)));
//! assert_eq!(locale.resolve("2Cor."), Ok(ResolutionTarget::Book(co2)));
//! assert!(locale.resolve("Cor").is_err());
//! ```

pub mod builder;
pub mod error;
pub mod leaders;
pub mod locale;
pub mod normalize;
pub mod order;

pub use builder::{AbbreviationIndex, IndexStats, Tier};
pub use error::{DivisionError, LoadError, OrderError, ResolutionError};
pub use leaders::LeaderTable;
pub use locale::{LocaleIndex, LocaleTables};
pub use normalize::{DEFAULT_STRIP_CHARS, LocaleRules, WhitespacePolicy};
pub use order::BookOrder;

//! Hold every loaded Bible book-name locale and book order in one place.
//!
//! [`BibleNames`] owns the canonical catalog plus one immutable
//! [`LocaleIndex`](biblenames_index::LocaleIndex) per locale and one
//! [`BookOrder`](biblenames_index::BookOrder) per named order. Each entry is
//! swapped in whole, so a reload never exposes a half-built index to
//! concurrent readers.
//!
//! Table files live in a data directory:
//!
//! ```text
//! data/
//!   catalog.json        [{"code": "GEN"}, {"code": "EXO"}, ...]
//!   locales/en.json     {"rules": {...}, "leaders": [...], "names": [...], "divisions": [...]}
//!   orders/*.json       {"name": "...", "entries": [{"position": 1, "code": "GEN"}, ...]}
//! ```
//!
//! Files are read memory-mapped or into owned buffers, chosen at runtime via
//! [`LoadMode`].
//!
//! # Example
//! ```no_run
//! use biblenames_db::{BibleNames, LoadMode};
//!
//! # fn main() -> anyhow::Result<()> {
//! let names = BibleNames::load_with_mode("data", LoadMode::Mmap)?;
//! let target = names.resolve("en", "1 Cor")?;
//! println!("1 Cor -> {target}");
//! # Ok(()) }
//! ```
//!
//! For a runnable demo, see `cargo run -p biblenames-db --example lookup -- data en "Song"`.

mod loader;
mod registry;

pub use loader::{LoadMode, load_dir, parse_book_order, parse_catalog, parse_locale};
pub use registry::BibleNames;

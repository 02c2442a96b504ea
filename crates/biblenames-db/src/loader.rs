use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use biblenames_index::{LoadError, LocaleRules, LocaleTables, WhitespacePolicy};
use biblenames_types::{
    BookCatalog, BookCode, BookNameRecord, BookOrderEntry, DivisionRecord, DivisionTag,
    LeaderRecord,
};
use memmap2::Mmap;
use serde::Deserialize;
use tracing::{info, warn};

use crate::BibleNames;

/// Strategy for reading table files.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LoadMode {
    /// Memory-map each file.
    #[default]
    Mmap,
    /// Read each file into an owned buffer (portable fallback).
    Owned,
}

impl std::str::FromStr for LoadMode {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mmap" => Ok(LoadMode::Mmap),
            "owned" => Ok(LoadMode::Owned),
            other => anyhow::bail!("unknown load mode {other:?} (expected mmap or owned)"),
        }
    }
}

enum Buffer {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Buffer {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Mmap(m) => m.as_ref(),
            Buffer::Owned(v) => v.as_slice(),
        }
    }
}

fn load_file(path: &Path, mode: LoadMode) -> Result<Buffer> {
    match mode {
        LoadMode::Mmap => {
            let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            // Zero-length files cannot be mapped on every platform.
            if file.metadata().map(|m| m.len() == 0).unwrap_or(false) {
                return Ok(Buffer::Owned(Vec::new()));
            }
            unsafe { Mmap::map(&file) }
                .map(Buffer::Mmap)
                .with_context(|| format!("mmap {}", path.display()))
        }
        LoadMode::Owned => {
            let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)
                .with_context(|| format!("read {}", path.display()))?;
            Ok(Buffer::Owned(buf))
        }
    }
}

#[derive(Deserialize)]
struct CatalogRow {
    code: String,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocaleFile {
    #[serde(default)]
    rules: Option<RulesRow>,
    #[serde(default)]
    leaders: Vec<LeaderRow>,
    #[serde(default)]
    names: Vec<NameRow>,
    #[serde(default)]
    divisions: Vec<DivisionRow>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RulesRow {
    #[serde(default)]
    whitespace: Option<WhitespaceRow>,
    #[serde(default)]
    strip_chars: Option<String>,
    #[serde(default)]
    glued_leaders: bool,
}

#[derive(Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum WhitespaceRow {
    Remove,
    Collapse,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeaderRow {
    standard_leader: String,
    #[serde(default)]
    input_variants: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NameRow {
    reference_abbreviation: String,
    default_name: OneOrMany,
    default_abbreviation: OneOrMany,
    #[serde(default)]
    input_variants: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DivisionRow {
    standard_abbreviation: String,
    default_name: OneOrMany,
    default_abbreviation: OneOrMany,
    #[serde(default)]
    input_variants: Vec<String>,
    includes_book: Vec<String>,
}

#[derive(Deserialize)]
struct OrderFile {
    name: String,
    entries: Vec<OrderRow>,
}

#[derive(Deserialize)]
struct OrderRow {
    position: u32,
    code: String,
}

/// Source data sometimes carries a list, or a value with stray text after a
/// line break, where a single string belongs.
#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}

/// Text before the first line break or control character, trimmed.
fn well_formed(raw: &str) -> Option<&str> {
    let head = raw
        .split(|c: char| c.is_control() && c != '\t')
        .next()
        .unwrap_or_default()
        .trim();
    (!head.is_empty()).then_some(head)
}

fn pick_single(source: &str, record: &str, field: &str, value: OneOrMany) -> Result<String> {
    let mut chosen: Option<String> = None;
    for raw in value.into_vec() {
        if let Some(kept) = &chosen {
            warn!("{source}: {record} {field} keeps {kept:?}, discarding {raw:?}");
            continue;
        }
        match well_formed(&raw) {
            Some(clean) => {
                if clean != raw.trim() {
                    warn!("{source}: {record} {field} {raw:?} truncated to {clean:?}");
                }
                chosen = Some(clean.to_string());
            }
            None => warn!("{source}: {record} {field} skipping malformed value {raw:?}"),
        }
    }
    chosen.ok_or_else(|| anyhow!("{source}: {record} has no well-formed {field}"))
}

fn parse_code(source: &str, raw: &str) -> Result<BookCode> {
    BookCode::new(raw).with_context(|| format!("{source}: invalid book code"))
}

/// Parse `catalog.json`: an ordered list of `{"code": "GEN"}` rows.
pub fn parse_catalog(bytes: &[u8]) -> Result<BookCatalog> {
    let rows: Vec<CatalogRow> = serde_json::from_slice(bytes).context("parse catalog")?;
    let codes = rows
        .iter()
        .map(|row| BookCode::new(&row.code).map_err(LoadError::from))
        .collect::<Result<Vec<_>, _>>()
        .context("catalog")?;
    let catalog = BookCatalog::new(codes)
        .map_err(LoadError::from)
        .context("catalog")?;
    Ok(catalog)
}

/// Parse one locale file into the tables the index builder consumes.
///
/// `source` names the file in warnings and errors.
pub fn parse_locale(bytes: &[u8], source: &str) -> Result<LocaleTables> {
    let file: LocaleFile =
        serde_json::from_slice(bytes).with_context(|| format!("parse locale {source}"))?;

    let mut rules = LocaleRules::default();
    if let Some(row) = file.rules {
        if let Some(policy) = row.whitespace {
            rules.whitespace = match policy {
                WhitespaceRow::Remove => WhitespacePolicy::Remove,
                WhitespaceRow::Collapse => WhitespacePolicy::Collapse,
            };
        }
        if let Some(strip) = row.strip_chars {
            rules.strip_chars = strip;
        }
        rules.glued_leaders = row.glued_leaders;
    }

    let leaders = file
        .leaders
        .into_iter()
        .map(|row| LeaderRecord {
            standard_leader: row.standard_leader,
            input_variants: row.input_variants,
        })
        .collect();

    let mut names = Vec::with_capacity(file.names.len());
    for row in file.names {
        let code = parse_code(source, &row.reference_abbreviation)?;
        let record = code.to_string();
        names.push(BookNameRecord {
            reference_abbreviation: code,
            default_name: pick_single(source, &record, "defaultName", row.default_name)?,
            default_abbreviation: pick_single(
                source,
                &record,
                "defaultAbbreviation",
                row.default_abbreviation,
            )?,
            input_variants: row.input_variants,
        });
    }

    let mut divisions = Vec::with_capacity(file.divisions.len());
    for row in file.divisions {
        let record = row.standard_abbreviation.trim().to_string();
        if record.is_empty() {
            anyhow::bail!("{source}: division with empty standardAbbreviation");
        }
        let includes_book = row
            .includes_book
            .iter()
            .map(|raw| parse_code(source, raw))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("{source}: division {record}"))?;
        divisions.push(DivisionRecord {
            default_name: pick_single(source, &record, "defaultName", row.default_name)?,
            default_abbreviation: pick_single(
                source,
                &record,
                "defaultAbbreviation",
                row.default_abbreviation,
            )?,
            standard_abbreviation: DivisionTag::new(record),
            input_variants: row.input_variants,
            includes_book,
        });
    }

    Ok(LocaleTables {
        rules,
        leaders,
        names,
        divisions,
    })
}

/// Parse one book-order file into its name and entries.
pub fn parse_book_order(bytes: &[u8], source: &str) -> Result<(String, Vec<BookOrderEntry>)> {
    let file: OrderFile =
        serde_json::from_slice(bytes).with_context(|| format!("parse book order {source}"))?;
    let entries = file
        .entries
        .iter()
        .map(|row| {
            Ok(BookOrderEntry {
                position: row.position,
                code: parse_code(source, &row.code)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((file.name, entries))
}

/// Sorted `*.json` files directly under `dir`; a missing directory is empty.
fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let path = entry
            .with_context(|| format!("read dir {}", dir.display()))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_stem(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .with_context(|| format!("no usable file name in {}", path.display()))
}

/// Load a data directory with memory-mapped files.
///
/// See [`BibleNames::load_with_mode`].
pub fn load_dir(data_dir: impl AsRef<Path>) -> Result<BibleNames> {
    BibleNames::load_with_mode(data_dir, LoadMode::Mmap)
}

impl BibleNames {
    /// Load a data directory using memory-mapped files.
    pub fn load(data_dir: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_mode(data_dir, LoadMode::Mmap)
    }

    /// Load `catalog.json`, then every `locales/<id>.json` and
    /// `orders/*.json` under `data_dir`.
    ///
    /// The catalog is required. A locale or order file that fails to parse
    /// or validate is logged and skipped; the others still load.
    pub fn load_with_mode(data_dir: impl AsRef<Path>, mode: LoadMode) -> Result<Self> {
        let dir = data_dir.as_ref();
        let started = Instant::now();
        let catalog_path = dir.join("catalog.json");
        if !catalog_path.exists() {
            anyhow::bail!("missing required catalog file: {}", catalog_path.display());
        }
        let buffer = load_file(&catalog_path, mode)?;
        let catalog = parse_catalog(buffer.as_slice())
            .with_context(|| format!("load {}", catalog_path.display()))?;
        let names = BibleNames::new(catalog);

        for path in json_files(&dir.join("locales"))? {
            if let Err(err) = names.load_locale_file(&path, mode) {
                warn!("skipping locale file {}: {err:#}", path.display());
            }
        }
        for path in json_files(&dir.join("orders"))? {
            if let Err(err) = names.load_order_file(&path, mode) {
                warn!("skipping book order file {}: {err:#}", path.display());
            }
        }

        info!(
            "loaded {} books, {} locales, {} book orders from {} in {:.2?}",
            names.catalog().len(),
            names.locales().len(),
            names.orders().len(),
            dir.display(),
            started.elapsed()
        );
        Ok(names)
    }

    /// Load or reload one locale file; the locale id is the file stem.
    pub fn load_locale_file(&self, path: impl AsRef<Path>, mode: LoadMode) -> Result<String> {
        let path = path.as_ref();
        let locale_id = file_stem(path)?;
        let buffer = load_file(path, mode)?;
        let tables = parse_locale(buffer.as_slice(), &locale_id)?;
        self.load_locale(&locale_id, tables)
            .with_context(|| format!("build locale from {}", path.display()))?;
        Ok(locale_id)
    }

    /// Load or reload one book-order file; the order name comes from its contents.
    pub fn load_order_file(&self, path: impl AsRef<Path>, mode: LoadMode) -> Result<String> {
        let path = path.as_ref();
        let source = path.display().to_string();
        let buffer = load_file(path, mode)?;
        let (order_name, entries) = parse_book_order(buffer.as_slice(), &source)?;
        self.load_book_order(&order_name, entries)
            .with_context(|| format!("build book order from {source}"))?;
        Ok(order_name)
    }
}

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use biblenames_types::{
    BookCatalog, BookCode, BookNameRecord, DivisionRecord, DivisionTag, LeaderRecord,
    ResolutionTarget,
};
use bitvec::prelude::*;
use tracing::info;

use crate::builder::{AbbreviationIndex, IndexBuilder, IndexStats};
use crate::error::{DivisionError, LoadError, ResolutionError};
use crate::leaders::LeaderTable;
use crate::normalize::LocaleRules;

type BitSet = BitVec<usize, Lsb0>;

/// Already-parsed tables for one locale.
#[derive(Clone, Debug, Default)]
pub struct LocaleTables {
    pub rules: LocaleRules,
    pub leaders: Vec<LeaderRecord>,
    pub names: Vec<BookNameRecord>,
    pub divisions: Vec<DivisionRecord>,
}

/// Everything needed to answer queries for one locale. Immutable once built.
#[derive(Debug)]
pub struct LocaleIndex {
    id: String,
    rules: LocaleRules,
    catalog: Arc<BookCatalog>,
    index: AbbreviationIndex,
    names: HashMap<BookCode, BookNameRecord>,
    divisions: Vec<DivisionRecord>,
    division_lookup: HashMap<DivisionTag, usize>,
    // Per catalog position: bit `i` set when division `i` includes the book.
    book_divisions: Vec<BitSet>,
}

impl LocaleIndex {
    /// Validate the tables against the catalog and build the index.
    ///
    /// Any error leaves nothing behind; the caller keeps whatever it had.
    pub fn build(
        id: &str,
        catalog: Arc<BookCatalog>,
        tables: LocaleTables,
    ) -> Result<Self, LoadError> {
        let LocaleTables {
            rules,
            leaders,
            names,
            divisions,
        } = tables;
        let started = Instant::now();
        let leaders = LeaderTable::new(id, &leaders)?;

        let mut name_map = HashMap::with_capacity(names.len());
        for record in names {
            let code = record.reference_abbreviation;
            if !catalog.contains(code) {
                return Err(LoadError::UnknownBookCodeReference {
                    locale: id.to_string(),
                    record: format!("name record {:?}", record.default_name),
                    code,
                });
            }
            if name_map.insert(code, record).is_some() {
                return Err(LoadError::DuplicateBookCode {
                    scope: format!("locale {id}"),
                    code,
                });
            }
        }

        let mut division_lookup = HashMap::with_capacity(divisions.len());
        let mut book_divisions: Vec<BitSet> = (0..catalog.len())
            .map(|_| bitvec![usize, Lsb0; 0; divisions.len()])
            .collect();
        for (idx, division) in divisions.iter().enumerate() {
            let tag = &division.standard_abbreviation;
            if division_lookup.insert(tag.clone(), idx).is_some() {
                return Err(LoadError::DuplicateDivisionTag {
                    locale: id.to_string(),
                    tag: tag.clone(),
                });
            }
            if division.includes_book.is_empty() {
                return Err(LoadError::EmptyDivision {
                    locale: id.to_string(),
                    tag: tag.clone(),
                });
            }
            let mut seen = HashSet::with_capacity(division.includes_book.len());
            for code in &division.includes_book {
                let Some(pos) = catalog.position(*code) else {
                    return Err(LoadError::UnknownBookCodeReference {
                        locale: id.to_string(),
                        record: format!("division {tag}"),
                        code: *code,
                    });
                };
                if !seen.insert(*code) {
                    return Err(LoadError::DuplicateDivisionMember {
                        locale: id.to_string(),
                        tag: tag.clone(),
                        code: *code,
                    });
                }
                book_divisions[pos].set(idx, true);
            }
        }

        let mut builder = IndexBuilder::new(id, &rules, &leaders);
        for code in catalog.codes() {
            if let Some(record) = name_map.get(code) {
                builder.add_target(&ResolutionTarget::Book(*code), record.tokens());
            }
        }
        for division in &divisions {
            builder.add_target(
                &ResolutionTarget::Division(division.standard_abbreviation.clone()),
                division.tokens(),
            );
        }
        let index = builder.finish()?;

        let stats = index.stats();
        info!(
            "locale {id}: indexed {} keys for {} books and {} divisions ({} explicit, {} leader, {} prefix, {} evicted) in {:.2?}",
            stats.total(),
            name_map.len(),
            divisions.len(),
            stats.explicit,
            stats.leader,
            stats.prefix,
            stats.evicted,
            started.elapsed()
        );

        Ok(Self {
            id: id.to_string(),
            rules,
            catalog,
            index,
            names: name_map,
            divisions,
            division_lookup,
            book_divisions,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn rules(&self) -> &LocaleRules {
        &self.rules
    }

    /// Resolve user text to exactly one book or division.
    pub fn resolve(&self, raw: &str) -> Result<ResolutionTarget, ResolutionError> {
        let key = self.rules.normalize(raw);
        if key.is_empty() {
            return Err(ResolutionError::EmptyInput);
        }
        self.index
            .get(&key)
            .cloned()
            .ok_or_else(|| ResolutionError::NotFound {
                locale: self.id.clone(),
                input: key,
            })
    }

    /// The locale's names for a book, if it has any.
    pub fn book_name(&self, code: BookCode) -> Option<&BookNameRecord> {
        self.names.get(&code)
    }

    pub fn division(&self, tag: &str) -> Option<&DivisionRecord> {
        self.division_lookup
            .get(tag)
            .map(|idx| &self.divisions[*idx])
    }

    /// Divisions in load order.
    pub fn divisions(&self) -> &[DivisionRecord] {
        &self.divisions
    }

    /// Member books of a division, in authored order.
    pub fn members_of(&self, tag: &str) -> Result<&[BookCode], DivisionError> {
        self.division(tag)
            .map(|division| division.includes_book.as_slice())
            .ok_or_else(|| DivisionError::UnknownDivision {
                locale: self.id.clone(),
                tag: tag.to_string(),
            })
    }

    /// Tags of every division that includes `code`, in division load order.
    pub fn divisions_containing(&self, code: BookCode) -> Vec<&DivisionTag> {
        let Some(bits) = self
            .catalog
            .position(code)
            .and_then(|pos| self.book_divisions.get(pos))
        else {
            return Vec::new();
        };
        bits.iter_ones()
            .map(|idx| &self.divisions[idx].standard_abbreviation)
            .collect()
    }

    pub fn index(&self) -> &AbbreviationIndex {
        &self.index
    }

    pub fn stats(&self) -> IndexStats {
        self.index.stats()
    }

    pub fn book_count(&self) -> usize {
        self.names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(raw: &str) -> BookCode {
        BookCode::new(raw).unwrap()
    }

    fn catalog() -> Arc<BookCatalog> {
        let codes = ["GEN", "EXO", "LEV", "NUM", "DEU", "MAT", "REV"];
        Arc::new(BookCatalog::new(codes.iter().map(|c| code(c))).unwrap())
    }

    fn name(c: &str, default_name: &str, abbreviation: &str, variants: &[&str]) -> BookNameRecord {
        BookNameRecord {
            reference_abbreviation: code(c),
            default_name: default_name.into(),
            default_abbreviation: abbreviation.into(),
            input_variants: variants.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn division(tag: &str, default_name: &str, books: &[&str]) -> DivisionRecord {
        DivisionRecord {
            standard_abbreviation: DivisionTag::from(tag),
            default_name: default_name.into(),
            default_abbreviation: tag.into(),
            input_variants: Vec::new(),
            includes_book: books.iter().map(|c| code(c)).collect(),
        }
    }

    fn tables() -> LocaleTables {
        LocaleTables {
            names: vec![
                name("GEN", "Genesis", "Gen", &["Gn"]),
                name("EXO", "Exodus", "Exod", &[]),
                name("LEV", "Leviticus", "Lev", &[]),
                name("NUM", "Numbers", "Num", &[]),
                name("DEU", "Deuteronomy", "Deut", &[]),
                name("MAT", "Matthew", "Matt", &[]),
                name("REV", "Revelation", "Rev", &["Apocalypse"]),
            ],
            divisions: vec![
                division("OT", "Old Testament", &["GEN", "EXO", "LEV", "NUM", "DEU"]),
                division("PT", "Pentateuch", &["GEN", "EXO", "LEV", "NUM", "DEU"]),
                division("NT", "New Testament", &["MAT", "REV"]),
            ],
            ..LocaleTables::default()
        }
    }

    #[test]
    fn resolves_names_and_divisions() {
        let locale = LocaleIndex::build("en", catalog(), tables()).unwrap();
        assert_eq!(locale.resolve("Genesis"), Ok(ResolutionTarget::Book(code("GEN"))));
        assert_eq!(locale.resolve(" gn "), Ok(ResolutionTarget::Book(code("GEN"))));
        assert_eq!(locale.resolve("apoc"), Ok(ResolutionTarget::Book(code("REV"))));
        assert_eq!(
            locale.resolve("Pentateuch"),
            Ok(ResolutionTarget::Division(DivisionTag::from("PT")))
        );
        assert_eq!(locale.resolve("   "), Err(ResolutionError::EmptyInput));
        assert_eq!(locale.resolve(".."), Err(ResolutionError::EmptyInput));
        assert!(matches!(
            locale.resolve("Habakkuk"),
            Err(ResolutionError::NotFound { ref input, .. }) if input == "habakkuk"
        ));
    }

    #[test]
    fn division_membership_queries() {
        let locale = LocaleIndex::build("en", catalog(), tables()).unwrap();
        assert_eq!(
            locale.members_of("PT").unwrap(),
            &[code("GEN"), code("EXO"), code("LEV"), code("NUM"), code("DEU")]
        );
        let tags: Vec<&str> = locale
            .divisions_containing(code("GEN"))
            .into_iter()
            .map(DivisionTag::as_str)
            .collect();
        assert_eq!(tags, vec!["OT", "PT"]);
        assert!(locale.divisions_containing(code("ZZZ")).is_empty());
        assert!(matches!(
            locale.members_of("XX"),
            Err(DivisionError::UnknownDivision { .. })
        ));
    }

    #[test]
    fn reverse_lookup_returns_records() {
        let locale = LocaleIndex::build("en", catalog(), tables()).unwrap();
        let record = locale.book_name(code("REV")).unwrap();
        assert_eq!(record.default_name, "Revelation");
        assert_eq!(locale.division("NT").unwrap().default_name, "New Testament");
        assert_eq!(locale.book_count(), 7);
    }

    #[test]
    fn rejects_unknown_codes() {
        let mut bad = tables();
        bad.names.push(name("REV", "Revelation again", "Rv", &[]));
        assert!(matches!(
            LocaleIndex::build("en", catalog(), bad),
            Err(LoadError::DuplicateBookCode { .. })
        ));

        let mut bad = tables();
        bad.divisions.push(division("XX", "Extras", &["GEN", "ZZZ"]));
        assert!(matches!(
            LocaleIndex::build("en", catalog(), bad),
            Err(LoadError::UnknownBookCodeReference { code: c, .. }) if c == code("ZZZ")
        ));

        let mut bad = tables();
        bad.divisions.push(division("XX", "Extras", &["GEN", "GEN"]));
        assert!(matches!(
            LocaleIndex::build("en", catalog(), bad),
            Err(LoadError::DuplicateDivisionMember { .. })
        ));

        let mut bad = tables();
        bad.divisions.push(division("NT", "Newer Testament", &["MAT"]));
        assert!(matches!(
            LocaleIndex::build("en", catalog(), bad),
            Err(LoadError::DuplicateDivisionTag { .. })
        ));

        let mut bad = tables();
        bad.divisions.push(division("XX", "Extras", &[]));
        assert!(matches!(
            LocaleIndex::build("en", catalog(), bad),
            Err(LoadError::EmptyDivision { .. })
        ));
    }
}

use std::path::PathBuf;

use biblenames_db::{BibleNames, LoadMode};
use biblenames_types::{BookCode, DivisionTag, ResolutionTarget};

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("data")
}

fn load() -> BibleNames {
    BibleNames::load_with_mode(data_dir(), LoadMode::Owned).expect("load bundled data")
}

fn book(raw: &str) -> Result<ResolutionTarget, biblenames_index::ResolutionError> {
    Ok(ResolutionTarget::Book(BookCode::new(raw).unwrap()))
}

fn division(tag: &str) -> Result<ResolutionTarget, biblenames_index::ResolutionError> {
    Ok(ResolutionTarget::Division(DivisionTag::from(tag)))
}

#[test]
fn every_bundled_file_loads() {
    let names = load();
    assert_eq!(names.catalog().len(), 66);
    assert_eq!(names.locales(), vec!["en".to_string(), "ru".to_string()]);
    assert_eq!(
        names.orders(),
        vec!["English Protestant".to_string(), "Hebrew Tanakh".to_string()]
    );
    let en = names.locale("en").unwrap();
    assert_eq!(en.book_count(), 66);
    assert!(en.stats().evicted > 0);
}

#[test]
fn english_names_abbreviations_and_shortcuts() {
    let names = load();
    let en = |text: &str| names.resolve("en", text);
    assert_eq!(en("Song of Solomon"), book("SNG"));
    assert_eq!(en("So"), book("SNG"));
    assert_eq!(en("First Corinthians"), book("CO1"));
    assert_eq!(en("I Cor"), book("CO1"));
    assert_eq!(en("3rd John"), book("JN3"));
    assert_eq!(en("Jon"), book("JNA"));
    assert_eq!(en("joh"), book("JHN"));
    assert_eq!(en("Phil"), book("PHP"));
    assert_eq!(en("Phl"), book("PHM"));
    assert_eq!(en("Rev."), book("REV"));
    assert_eq!(en("Judg"), book("JDG"));

    for ambiguous in ["Jo", "Ph", "Ju", "Ez", "1"] {
        assert!(en(ambiguous).is_err(), "{ambiguous}");
    }
    let en_index = names.locale("en").unwrap();
    let claimants = &en_index.index().ambiguous_prefixes()["ph"];
    assert_eq!(claimants.len(), 2);
}

#[test]
fn english_divisions() {
    let names = load();
    assert_eq!(names.resolve("en", "Hebrew Bible"), division("OT"));
    assert_eq!(names.resolve("en", "the twelve"), division("MNP"));
    assert_eq!(names.resolve("en", "Pa"), division("PAU"));
    assert_eq!(names.members_of("en", "MNP").unwrap().len(), 12);
    assert_eq!(names.members_of("en", "NT").unwrap().len(), 27);
    let isaiah = BookCode::new("ISA").unwrap();
    let tags: Vec<String> = names
        .divisions_containing("en", isaiah)
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(tags, vec!["OT", "MJP"]);
}

#[test]
fn russian_glued_leaders() {
    let names = load();
    let ru = |text: &str| names.resolve("ru", text);
    assert_eq!(ru("1Кор"), book("CO1"));
    assert_eq!(ru("IКор"), book("CO1"));
    assert_eq!(ru("Первая Царств"), book("SA1"));
    assert_eq!(ru("Первое Коринфянам"), book("CO1"));
    assert_eq!(ru("Вторая Цар"), book("SA2"));
    assert_eq!(ru("Третья Цар"), book("KI1"));
    assert_eq!(ru("Четвертая Царств"), book("KI2"));
    assert!(ru("Первая-я Царств").is_err());
    assert_eq!(ru("Откр"), book("REV"));
    assert_eq!(ru("Ев"), division("GOS"));
    assert!(ru("От").is_err());
}

#[test]
fn bundled_orders() {
    let names = load();
    let code = |raw: &str| BookCode::new(raw).unwrap();
    let protestant = names.sequence_of("English Protestant").unwrap();
    assert_eq!(protestant.len(), 68);
    assert_eq!(protestant.first(), Some(&code("FRT")));
    assert_eq!(protestant.last(), Some(&code("BAK")));
    assert_eq!(names.position_of("English Protestant", code("GEN")), Ok(2));
    assert_eq!(names.position_of("English Protestant", code("REV")), Ok(67));

    assert_eq!(names.position_of("Hebrew Tanakh", code("SAM")), Ok(8));
    assert_eq!(names.position_of("Hebrew Tanakh", code("SA1")), Ok(9));
    assert_eq!(names.position_of("Hebrew Tanakh", code("CH2")), Ok(42));
    assert!(names.position_of("Hebrew Tanakh", code("MAT")).is_err());
}

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use biblenames_db::{BibleNames, LoadMode};

fn main() -> Result<()> {
    let data_dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: cargo run -p biblenames-db --example stats -- <path-to-data-dir>")?;

    let names = BibleNames::load_with_mode(&data_dir, LoadMode::Mmap)
        .with_context(|| format!("loading tables from {}", data_dir.display()))?;

    println!("Data dir     : {}", data_dir.display());
    println!("Catalog books: {}", names.catalog().len());

    for id in names.locales() {
        let locale = names.locale(&id)?;
        let stats = locale.stats();
        println!("\nLocale {id}");
        println!("  books named     : {}", locale.book_count());
        println!("  divisions       : {}", locale.divisions().len());
        println!("  explicit keys   : {}", stats.explicit);
        println!("  leader keys     : {}", stats.leader);
        println!("  prefix keys     : {}", stats.prefix);
        println!("  evicted prefixes: {}", stats.evicted);
        println!("  total keys      : {}", stats.total());
    }

    for name in names.orders() {
        let order = names.order(&name)?;
        println!("\nOrder {name:?}: {} entries", order.len());
    }

    Ok(())
}

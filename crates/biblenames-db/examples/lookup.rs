use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use biblenames_db::{BibleNames, LoadMode};
use biblenames_types::ResolutionTarget;

fn main() -> Result<()> {
    let usage = "usage: cargo run -p biblenames-db --example lookup -- <data-dir> <locale> [--ambiguous | <text>]";
    let mut args = env::args().skip(1);
    let data_dir = args.next().map(PathBuf::from).context(usage)?;
    let locale_id = args.next().context(usage)?;
    let Some(query) = args.next() else {
        bail!(usage);
    };
    if args.next().is_some() {
        bail!("too many arguments");
    }

    let names = BibleNames::load_with_mode(&data_dir, LoadMode::Mmap)
        .with_context(|| format!("loading tables from {}", data_dir.display()))?;
    let locale = names.locale(&locale_id)?;

    if query == "--ambiguous" {
        for (key, claimants) in locale.index().ambiguous_prefixes() {
            let owners: Vec<String> = claimants.iter().map(ToString::to_string).collect();
            println!("{key:>12}  {}", owners.join(", "));
        }
        return Ok(());
    }

    match locale.resolve(&query) {
        Ok(ResolutionTarget::Book(code)) => {
            let display = locale
                .book_name(code)
                .map(|record| record.default_name.as_str())
                .unwrap_or("?");
            let tags: Vec<&str> = locale
                .divisions_containing(code)
                .into_iter()
                .map(|tag| tag.as_str())
                .collect();
            println!("{query:?} -> book {code} ({display}) in [{}]", tags.join(", "));
            for order in names.orders() {
                if let Ok(position) = names.position_of(&order, code) {
                    println!("  {order}: position {position}");
                }
            }
        }
        Ok(ResolutionTarget::Division(tag)) => {
            let members = locale.members_of(tag.as_str())?;
            let codes: Vec<String> = members.iter().map(ToString::to_string).collect();
            println!("{query:?} -> division {tag}: {}", codes.join(" "));
        }
        Err(err) => println!("{query:?}: {err}"),
    }

    Ok(())
}

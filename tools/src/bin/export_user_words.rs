use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use libkeyboard_core::{RedbWordStore, WordStore};
use std::path::PathBuf;

#[derive(Clone, Copy, ValueEnum)]
enum Table {
    Auto,
    User,
    Bigrams,
}

impl Table {
    fn name(self) -> &'static str {
        match self {
            Table::Auto => RedbWordStore::AUTO_WORDS,
            Table::User => RedbWordStore::USER_WORDS,
            Table::Bigrams => RedbWordStore::USER_BIGRAMS,
        }
    }
}

#[derive(Parser)]
#[command(about = "Dump learned words from a keyboard store as a word list")]
struct Args {
    /// redb file written by the keyboard
    db: PathBuf,

    #[arg(long, value_enum, default_value = "user")]
    table: Table,

    #[arg(long, default_value = "en_US")]
    locale: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let store = RedbWordStore::open(&args.db, args.table.name())
        .with_context(|| format!("opening {}", args.db.display()))?;
    let mut words = store.load(&args.locale)?;
    words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    // Bigram keys are stored as "previous<TAB>next", which is already the
    // three-field word list layout
    for (word, freq) in &words {
        println!("{}\t{}", word, freq);
    }
    eprintln!("{} entries from {}", words.len(), args.table.name());
    Ok(())
}

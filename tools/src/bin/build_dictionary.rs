use anyhow::{Context, Result};
use clap::Parser;
use dict_tools::wordlist::{self, ListStats};
use libkeyboard_core::{DictionaryBuilder, FstEngine};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about = "Compile word lists into a main dictionary blob")]
struct Args {
    /// Word list files (word<TAB>freq and prev<TAB>next<TAB>freq lines)
    #[arg(long, num_args = 1.., required = true)]
    inputs: Vec<PathBuf>,

    #[arg(long, default_value = "main.dict")]
    out: PathBuf,

    /// Split the blob into parts of at most this many bytes (out.0, out.1, ...)
    #[arg(long)]
    split: Option<usize>,

    /// Also write build statistics as JSON next to the output
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = DictionaryBuilder::new();
    let mut totals = ListStats::default();
    for input in &args.inputs {
        let entries = wordlist::read_word_list(input)?;
        let stats = wordlist::fill_builder(&mut builder, &entries);
        println!(
            "Ingested {} ({} words, {} bigrams, {} skipped)",
            input.display(),
            stats.words,
            stats.bigrams,
            stats.skipped
        );
        totals.words += stats.words;
        totals.bigrams += stats.bigrams;
        totals.skipped += stats.skipped;
    }

    let blob = builder.build()?;
    // Refuse to write something the keyboard could not load
    FstEngine::from_bytes(&blob).context("built blob failed to parse")?;

    let written = match args.split {
        Some(size) if size > 0 && blob.len() > size => {
            let mut paths = Vec::new();
            for (i, chunk) in blob.chunks(size).enumerate() {
                let mut path = args.out.clone().into_os_string();
                path.push(format!(".{}", i));
                let path = PathBuf::from(path);
                std::fs::write(&path, chunk).with_context(|| format!("writing {}", path.display()))?;
                paths.push(path);
            }
            paths
        }
        _ => {
            std::fs::write(&args.out, &blob).with_context(|| format!("writing {}", args.out.display()))?;
            vec![args.out.clone()]
        }
    };

    for path in &written {
        println!("Wrote {}", path.display());
    }
    println!(
        "{} words, {} bigrams, {} bytes",
        builder.word_count(),
        builder.bigram_count(),
        blob.len()
    );

    if args.json {
        let summary = serde_json::json!({
            "words": builder.word_count(),
            "bigrams": builder.bigram_count(),
            "bytes": blob.len(),
            "parts": written.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
            "ingested": totals,
        });
        let mut out = args.out.clone();
        out.set_extension("json");
        std::fs::write(&out, serde_json::to_string_pretty(&summary)?)?;
        println!("Wrote {}", out.display());
    }

    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use libkeyboard_core::{
    BinaryDictionary, DataType, Dictionary, DictionaryEngine, DictionaryKind, FstEngine, WordCallback, WordComposer,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about = "Show what a compiled dictionary contains")]
struct Args {
    /// Dictionary parts, in order
    #[arg(num_args = 1.., required = true)]
    parts: Vec<PathBuf>,

    /// Print the N most frequent words
    #[arg(long, default_value_t = 20)]
    top: usize,

    /// List words starting with this prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Look up what typing this word exactly would suggest
    #[arg(long)]
    typed: Option<String>,

    /// Print the word list as JSON instead
    #[arg(long, default_value_t = false)]
    json: bool,
}

struct Collect(Vec<(String, i32)>);

impl WordCallback for Collect {
    fn add_word(&mut self, word: &str, frequency: i32, _kind: DictionaryKind, _data_type: DataType) -> bool {
        self.0.push((word.to_string(), frequency));
        true
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let engine = FstEngine::load_files(&args.parts).context("loading dictionary")?;
    let words = engine.words();

    if args.json {
        let list: Vec<_> = words
            .iter()
            .map(|(w, f)| serde_json::json!({ "word": w, "frequency": f }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    println!("{} words, {} bytes", engine.word_count(), engine.size());

    let mut by_frequency = words.clone();
    by_frequency.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    println!("Top {}:", args.top.min(by_frequency.len()));
    for (word, freq) in by_frequency.iter().take(args.top) {
        println!("  {:<24} {}", word, freq);
    }

    if let Some(prefix) = &args.prefix {
        println!("Prefix {:?}:", prefix);
        for (word, freq) in words.iter().filter(|(w, _)| w.starts_with(prefix.as_str())) {
            println!("  {:<24} {}", word, freq);
        }
    }

    if let Some(typed) = &args.typed {
        let mut composer = WordComposer::new();
        for c in typed.chars() {
            composer.add(c as i32, &[c as i32]);
        }
        let dictionary = BinaryDictionary::new(engine);
        let mut found = Collect(Vec::new());
        dictionary.get_words(&composer, &mut found);
        println!("Typing {:?} (valid: {}):", typed, dictionary.is_valid_word(typed));
        for (word, score) in found.0 {
            println!("  {:<24} {}", word, score);
        }
    }

    Ok(())
}

//! Interactive demo: types each stdin line by tapping simulated key centers
//! and prints the committed text and suggestions.
//!
//! Commands: `:pick N` picks suggestion N, `:del` taps delete, `:quit` exits.

use anyhow::{Context, Result};
use clap::Parser;
use libkeyboard::{
    keycodes, AutoDictionary, BinaryDictionary, DictionaryBuilder, InputEngine, KeyboardConfig, KeyboardSession,
    Keyboard, RedbWordStore, Suggest, TouchEvent, TouchRouter, UserBigramDictionary, UserDictionary,
};
use libkeyboard_core::{Dictionary, MemoryWordStore, WordStore};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "keyboard_demo", about = "Type through a simulated touch keyboard")]
struct Args {
    /// Compiled dictionary parts, concatenated in order
    #[arg(short, long)]
    dictionary: Vec<PathBuf>,

    /// Keyboard configuration (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Key layout (JSON); defaults to QWERTY
    #[arg(short, long)]
    layout: Option<PathBuf>,

    /// Directory for learned words; learning stays in memory without it
    #[arg(short, long)]
    user_dir: Option<PathBuf>,

    /// Horizontal offset in pixels added to every tap
    #[arg(long, default_value_t = 0)]
    jitter: i32,
}

const TAP_DURATION_MS: u64 = 60;
const TAP_GAP_MS: u64 = 120;

fn demo_dictionary() -> BinaryDictionary {
    let mut builder = DictionaryBuilder::new();
    for (word, freq) in [
        ("hello", 200),
        ("help", 150),
        ("world", 180),
        ("good", 190),
        ("morning", 140),
        ("night", 130),
        ("the", 255),
        ("keyboard", 120),
        ("typing", 110),
    ] {
        builder.add_word(word, freq);
    }
    builder.add_bigram("good", "morning", 110).add_bigram("good", "night", 90);
    match builder.build() {
        Ok(blob) => BinaryDictionary::from_parts(&[blob]),
        Err(e) => {
            eprintln!("⚠ Failed to build demo dictionary: {}", e);
            BinaryDictionary::from_parts::<Vec<u8>>(&[])
        }
    }
}

fn build_engine(args: &Args, config: &KeyboardConfig) -> Result<InputEngine> {
    let mut base = config.base().clone();
    let loaded = (!args.dictionary.is_empty())
        .then(|| BinaryDictionary::load(&args.dictionary[..]))
        .filter(|d| d.size() > 0);
    let main = match loaded {
        Some(main) => {
            println!("✓ Loaded main dictionary ({} bytes)", main.size());
            main
        }
        None => {
            println!("ℹ Using built-in demo dictionary");
            // Small enough to fall under the auto-correction threshold
            base.large_dictionary_threshold = 0;
            demo_dictionary()
        }
    };
    let mut suggest = Suggest::new(main);

    let stores: [Arc<dyn WordStore>; 3] = match &args.user_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).with_context(|| format!("creating {:?}", dir))?;
            let open = |file: &str, table: &'static str| -> Result<Arc<dyn WordStore>> {
                let store = RedbWordStore::open(dir.join(file), table).with_context(|| format!("opening {}", file))?;
                Ok(Arc::new(store))
            };
            println!("✓ Learning into {:?}", dir);
            [
                open("auto.redb", RedbWordStore::AUTO_WORDS)?,
                open("user.redb", RedbWordStore::USER_WORDS)?,
                open("bigrams.redb", RedbWordStore::USER_BIGRAMS)?,
            ]
        }
        None => {
            let memory = || -> Arc<dyn WordStore> { Arc::new(MemoryWordStore::new()) };
            [memory(), memory(), memory()]
        }
    };
    let [auto_store, user_store, bigram_store] = stores;

    let user = Arc::new(UserDictionary::open(user_store, &base.locale, base.max_word_length)?);
    suggest.set_user_dictionary(Some(user.clone() as Arc<dyn Dictionary>));
    let auto = Arc::new(AutoDictionary::open(auto_store, &base.locale, base.max_word_length)?);
    auto.set_promotion_listener(user);
    let bigrams = Arc::new(UserBigramDictionary::open(bigram_store, &base.locale, base.max_word_length)?);

    let mut engine = InputEngine::with_config(suggest, &base)?;
    engine.set_auto_dictionary(Some(auto));
    engine.set_user_bigram_dictionary(Some(bigrams));
    Ok(engine)
}

struct Typist {
    router: TouchRouter<KeyboardSession>,
    clock: u64,
    jitter: i32,
}

impl Typist {
    fn tap_code(&mut self, code: i32) -> bool {
        let keyboard = self.router.keyboard().clone();
        let Some(key) = keyboard.find_code(code).and_then(|i| keyboard.key(i)) else {
            return false;
        };
        let (x, y) = key.rect.center();
        let x = x + self.jitter;
        self.router.on_touch_event(TouchEvent::down(0, x, y, self.clock));
        self.router
            .on_touch_event(TouchEvent::up(0, x, y, self.clock + TAP_DURATION_MS));
        self.clock += TAP_GAP_MS;
        if let Some(symbols) = self.router.listener_mut().take_mode_change() {
            println!("ℹ Keyboard mode: {}", if symbols { "symbols" } else { "letters" });
        }
        true
    }

    fn type_char(&mut self, c: char) {
        let code = match c {
            ' ' => keycodes::SPACE,
            '\n' => keycodes::ENTER,
            _ => c as i32,
        };
        if self.tap_code(code) {
            return;
        }
        let lower = c.to_lowercase().next().unwrap_or(c);
        if c.is_uppercase() && self.tap_code(keycodes::SHIFT) && self.tap_code(lower as i32) {
            return;
        }
        eprintln!("⚠ No key for {:?}", c);
    }

    fn engine(&self) -> &InputEngine {
        self.router.listener().engine()
    }

    fn print_state(&self) {
        let engine = self.engine();
        println!("  text:      {:?}", engine.text());
        if !engine.composing().is_empty() {
            println!("  composing: {:?}", engine.composing());
        }
        let list: Vec<String> = engine
            .suggestions()
            .iter()
            .enumerate()
            .map(|(i, s)| format!("{}:{}", i, s.text))
            .collect();
        if !list.is_empty() {
            println!("  suggestions: {}", list.join("  "));
        }
        if let Some(best) = engine.best_word().filter(|_| engine.is_correction_available()) {
            println!("  auto-correct: {}", best);
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => KeyboardConfig::load_toml(path).with_context(|| format!("loading {:?}", path))?,
        None => KeyboardConfig::default(),
    };
    let keyboard = match &args.layout {
        Some(path) => Keyboard::load_json(path).with_context(|| format!("loading {:?}", path))?,
        None => Keyboard::qwerty(40, 60),
    };
    println!("✓ Layout with {} keys ({}x{})", keyboard.len(), keyboard.width(), keyboard.height());

    let mut engine = build_engine(&args, &config)?;
    engine.start_session();
    let session = KeyboardSession::new(engine, config.has_distinct_multitouch);
    let mut typist = Typist {
        router: TouchRouter::new(Arc::new(keyboard), &config, session),
        clock: 0,
        jitter: args.jitter,
    };

    println!("Type text and press enter (:pick N, :del, :quit)");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let line = line.trim_end();
        if line == ":quit" {
            break;
        } else if line == ":del" {
            typist.tap_code(keycodes::DELETE);
        } else if let Some(index) = line.strip_prefix(":pick ") {
            match index.trim().parse::<usize>() {
                Ok(index) => {
                    if !typist.router.listener_mut().engine_mut().pick_suggestion(index) {
                        eprintln!("⚠ No suggestion {}", index);
                    }
                }
                Err(_) => eprintln!("⚠ Not a number: {}", index),
            }
        } else {
            for c in line.chars() {
                typist.type_char(c);
            }
        }
        typist.print_state();
    }

    let mut engine = typist.router.into_listener().into_engine();
    let stats = engine.finish_session();
    println!("ℹ Session: {:?}", stats);
    engine.close();
    Ok(())
}

//! Shared helpers for the dictionary command-line tools.

pub mod wordlist;

//! Word-frequency counting, the table's reference consumer.
//!
//! Keys borrow from the (lower-cased) text buffer, so counting allocates
//! nothing per word beyond the table itself.

use crate::probe_table::ProbeTable;
use crate::strategy::{Djb2, StdStrategy};
use log::{debug, trace};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Word counts keyed by slices of the normalized text, hashed with djb2.
pub type WordCounts<'a> = ProbeTable<&'a str, u64, StdStrategy<Djb2>>;

#[derive(Debug, Error)]
pub enum WordCountError {
    #[error("usage: {program} <text-file>")]
    Usage { program: String },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write report: {0}")]
    Write(#[from] io::Error),
}

/// Extracts the input path from `argv`. The first item is the program
/// name, used in the usage message.
pub fn parse_args<I>(args: I) -> Result<PathBuf, WordCountError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let program = args.next().unwrap_or_else(|| "wordfreq".to_string());
    match args.next() {
        Some(path) => Ok(PathBuf::from(path)),
        None => Err(WordCountError::Usage { program }),
    }
}

/// ASCII lower-casing; other characters pass through unchanged.
pub fn normalize(text: &str) -> String {
    text.to_ascii_lowercase()
}

/// Reads a whole file and normalizes it for counting.
pub fn read_text(path: &Path) -> Result<String, WordCountError> {
    let raw = fs::read_to_string(path).map_err(|source| WordCountError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("read {} bytes from {}", raw.len(), path.display());
    Ok(normalize(&raw))
}

/// Counts whitespace-separated words. Expects text already passed through
/// `normalize`.
pub fn count_words(text: &str) -> WordCounts<'_> {
    let mut counts = WordCounts::default();
    for word in text.split_whitespace() {
        *counts.entry(word) += 1;
    }
    trace!(
        "counted {} distinct words, capacity {}",
        counts.len(),
        counts.capacity()
    );
    counts
}

/// All `(word, count)` pairs, highest count first. Equal counts are
/// ordered by word so the ranking is deterministic.
pub fn ranked<'a>(counts: &WordCounts<'a>) -> Vec<(&'a str, u64)> {
    let mut entries: Vec<(&'a str, u64)> = counts.iter().map(|(w, c)| (*w, *c)).collect();
    entries.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    entries
}

/// Writes the summary, the raw slot-order listing, and the ranking.
pub fn write_report<W: Write>(out: &mut W, counts: &WordCounts<'_>) -> io::Result<()> {
    writeln!(out, "Size: {}", counts.len())?;
    writeln!(out, "Capacity: {}", counts.capacity())?;
    writeln!(out, "HashMap Entries:")?;
    for (word, count) in counts {
        writeln!(out, "Key: `{word}`, Value: {count}")?;
    }
    writeln!(out, "--------------------")?;
    writeln!(out)?;
    for (word, count) in ranked(counts) {
        writeln!(out, "Word: `{word}`, Count: {count}")?;
    }
    writeln!(out)
}

//! Lists word frequencies for a text file, most frequent first.

use log::debug;
use probe_table::word_count::{self, WordCountError};
use std::io::{self, Write};
use std::process::ExitCode;

fn run() -> Result<(), WordCountError> {
    let path = word_count::parse_args(std::env::args())?;
    let text = word_count::read_text(&path)?;
    let counts = word_count::count_words(&text);
    debug!(
        "{} distinct words, load factor {:.3}",
        counts.len(),
        counts.load_factor()
    );

    let mut out = io::BufWriter::new(io::stdout().lock());
    word_count::write_report(&mut out, &counts)?;
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        // Output closed early (e.g. piped into `head`).
        Err(WordCountError::Write(e)) if e.kind() == io::ErrorKind::BrokenPipe => ExitCode::SUCCESS,
        Err(usage @ WordCountError::Usage { .. }) => {
            println!("{usage}");
            println!("<text-file> - lists out word frequencies based on the file");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("wordfreq: {e}");
            ExitCode::FAILURE
        }
    }
}

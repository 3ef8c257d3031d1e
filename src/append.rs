use crate::entries::{Entry, Header};
use std::io::{self, BufRead, Write};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Logged,
    NothingLogged,
}

/// Captures lines from `input` until a blank line or end of input.
///
/// Nothing is written when every captured line is whitespace.
pub fn log_entry<R: BufRead, W: Write>(
    input: R,
    log: &mut W,
    header: Header,
) -> io::Result<Outcome> {
    let mut body = Vec::new();

    for line in input.lines() {
        let line = line?;

        if line.is_empty() {
            break;
        }
        body.push(line);
    }

    if body.iter().all(|line| line.trim().is_empty()) {
        debug!("Empty entry, nothing written");
        return Ok(Outcome::NothingLogged);
    }

    Entry::new(header, body).append_to(log)?;

    Ok(Outcome::Logged)
}

/// Logs `words` joined by single spaces as a one-line body, whatever they contain.
pub fn log_oneline<W: Write>(words: &[String], log: &mut W, header: Header) -> io::Result<()> {
    debug!("Logging a oneliner of {} words", words.len());

    Entry::new(header, vec![words.join(" ")]).append_to(log)
}

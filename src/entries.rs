use crate::error::LogError;
use std::{
    env, fmt,
    io::{self, BufRead, Write},
};
use time::{OffsetDateTime, macros::format_description};
use tracing::warn;

/// Timestamp and working directory stamped on every new entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub timestamp: String,
    pub directory: String,
}

impl Header {
    /// Reads the local wall-clock time and the current working directory.
    pub fn now() -> Result<Self, LogError> {
        let now = local_now();
        let directory = env::current_dir()?;

        Ok(Self {
            timestamp: format_timestamp(now)?,
            directory: directory.display().to_string(),
        })
    }
}

/// Local wall-clock time, or UTC when the local offset cannot be determined.
pub fn local_now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|err| {
        warn!("Local offset unavailable ({err}), falling back to UTC");
        OffsetDateTime::now_utc()
    })
}

/// Formats as `YYYYMMDDhhmm`.
pub fn format_timestamp(datetime: OffsetDateTime) -> io::Result<String> {
    datetime
        .format(format_description!("[year][month][day][hour][minute]"))
        .map_err(io::Error::other)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub timestamp: String,
    pub directory: String,
    pub body: Vec<String>,
}

impl Entry {
    pub fn new(header: Header, body: Vec<String>) -> Self {
        Self {
            timestamp: header.timestamp,
            directory: header.directory,
            body,
        }
    }

    /// Appends the serialized record in a single write.
    pub fn append_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.to_string().as_bytes())?;
        writer.flush()
    }
}

/// The on-disk record: timestamp, directory, body lines, blank terminator.
impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.timestamp)?;
        writeln!(f, "{}", self.directory)?;

        for line in &self.body {
            writeln!(f, "{line}")?;
        }

        writeln!(f)
    }
}

/// Reads one line into `buf`, stripping `\n` or `\r\n`. `None` at end of stream.
fn next_line<'a, R: BufRead>(reader: &mut R, buf: &'a mut String) -> io::Result<Option<&'a str>> {
    buf.clear();

    if reader.read_line(buf)? == 0 {
        return Ok(None);
    }

    let line = buf.strip_suffix('\n').unwrap_or(buf.as_str());
    Ok(Some(line.strip_suffix('\r').unwrap_or(line)))
}

/// Parses the next record out of `reader`, skipping leading blank lines.
///
/// A stream that ends mid-record still yields what was read so far.
pub fn read_entry<R: BufRead>(reader: &mut R, buf: &mut String) -> io::Result<Option<Entry>> {
    let timestamp = loop {
        match next_line(reader, buf)? {
            None => return Ok(None),
            Some("") => continue,
            Some(line) => break line.to_owned(),
        }
    };

    let directory = next_line(reader, buf)?.unwrap_or_default().to_owned();

    let mut body = Vec::new();
    while let Some(line) = next_line(reader, buf)? {
        if line.is_empty() {
            break;
        }
        body.push(line.to_owned());
    }

    Ok(Some(Entry {
        timestamp,
        directory,
        body,
    }))
}

/// Forward-only iterator over the records of a journal stream.
pub struct Records<R> {
    reader: R,
    buf: String,
    done: bool,
}

impl<R: BufRead> Records<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = io::Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match read_entry(&mut self.reader, &mut self.buf) {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

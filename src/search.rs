use crate::{
    entries::{Entry, Records},
    error::LogError,
};
use regex::{Regex, RegexBuilder};
use std::{
    borrow::Cow,
    io::{self, BufRead},
};
use tracing::debug;

/// Which field of a record a pattern is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchTarget {
    Directory,
    Date,
    Body,
}

impl SearchTarget {
    pub fn field<'a>(&self, entry: &'a Entry) -> Cow<'a, str> {
        match self {
            SearchTarget::Directory => Cow::Borrowed(&entry.directory),
            SearchTarget::Date => Cow::Borrowed(&entry.timestamp),
            SearchTarget::Body => Cow::Owned(entry.body.join("\n")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Pattern {
    regex: Regex,
    source: String,
}

impl Pattern {
    /// Case-insensitive; `^` and `$` also anchor at body line breaks.
    pub fn new(source: &str) -> Result<Self, LogError> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(true)
            .multi_line(true)
            .build()?;

        Ok(Self {
            regex,
            source: source.to_owned(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Lazily yields the records whose target field matches, in stream order.
pub struct Search<R> {
    records: Records<R>,
    target: SearchTarget,
    pattern: Pattern,
}

impl<R: BufRead> Search<R> {
    pub fn new(reader: R, target: SearchTarget, pattern: Pattern) -> Self {
        Self {
            records: Records::new(reader),
            target,
            pattern,
        }
    }
}

impl<R: BufRead> Iterator for Search<R> {
    type Item = io::Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        for record in self.records.by_ref() {
            match record {
                Ok(entry) if self.pattern.is_match(&self.target.field(&entry)) => {
                    return Some(Ok(entry));
                }
                Ok(_) => continue,
                Err(err) => return Some(Err(err)),
            }
        }

        None
    }
}

/// Compiles `source` and only then starts reading `reader`.
pub fn search<R: BufRead>(
    reader: R,
    target: SearchTarget,
    source: &str,
) -> Result<Search<R>, LogError> {
    let pattern = Pattern::new(source)?;
    debug!(pattern = pattern.source(), ?target, "Compiled search pattern");

    Ok(Search::new(reader, target, pattern))
}

//! Record reader for GRDECL streams.
//!
//! Reads "simple" records: a keyword at the start of a line, followed by
//! whitespace separated values on subsequent lines, ended by `/`:
//!
//! ```text
//! KEYWORD
//!  value value value /
//! ```
//!
//! Include directives, skip sections, MESSAGE commands and sub-records are
//! not interpreted.

use std::io::{BufRead, Lines};

use tracing::debug;

use crate::error::{GrdeclError, Result};
use crate::lexer::{
    interpret_token_within, match_keyword, split_line, until_space, Value, MAX_TOKEN_VALUES,
};

/// Which keywords outside the set of interest may be skipped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IgnorePolicy {
    /// Skip every keyword not asked for.
    #[default]
    Unlisted,
    /// Skip only these keywords; any other keyword is an error.
    Only(Vec<String>),
}

impl IgnorePolicy {
    fn ignores(&self, keyword: &str) -> bool {
        match self {
            IgnorePolicy::Unlisted => true,
            IgnorePolicy::Only(list) => list.iter().any(|kw| match_keyword(kw, keyword)),
        }
    }
}

/// Options for [`GrdeclReader`].
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Maximum significant keyword length (Eclipse uses 8).
    pub max_len: Option<usize>,
    /// Handling of keywords outside the set of interest.
    pub ignore: IgnorePolicy,
    /// Most values one record may hold after repeat expansion.
    pub max_values: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            max_len: None,
            ignore: IgnorePolicy::default(),
            max_values: MAX_TOKEN_VALUES,
        }
    }
}

/// One keyword record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// The keyword as spelled by the caller.
    pub keyword: String,
    /// Every value up to the terminating slash.
    pub values: Vec<Value>,
    /// 1-based line number of the keyword header.
    pub line: usize,
}

enum State {
    SeekingKeyword,
    CollectingValues {
        keyword: String,
        line: usize,
        values: Vec<Value>,
    },
}

/// Iterator over the records of a GRDECL stream.
///
/// Yields an error and stops on the first malformed record.
pub struct GrdeclReader<R> {
    lines: Lines<R>,
    keywords: Vec<String>,
    options: ReaderOptions,
    line_no: usize,
    state: State,
    finished: bool,
}

impl<R: BufRead> GrdeclReader<R> {
    /// Read records for `keywords` from `reader`.
    pub fn new<S: AsRef<str>>(reader: R, keywords: &[S], options: ReaderOptions) -> Self {
        Self {
            lines: reader.lines(),
            keywords: keywords.iter().map(|kw| kw.as_ref().to_string()).collect(),
            options,
            line_no: 0,
            state: State::SeekingKeyword,
            finished: false,
        }
    }

    fn significant<'l>(&self, line: &'l str) -> &'l str {
        match self.options.max_len {
            Some(max_len) => match line.char_indices().nth(max_len) {
                Some((end, _)) => &line[..end],
                None => line,
            },
            None => line,
        }
    }

    /// Handle a line while looking for a keyword header.
    fn seek(&mut self, line: &str) -> Result<()> {
        let snubbed = self.significant(line);
        let word = until_space(snubbed);
        if word.is_empty() || word.starts_with("--") {
            return Ok(());
        }

        if let Some(keyword) = self.keywords.iter().find(|kw| match_keyword(kw, snubbed)) {
            debug!(keyword = %keyword, line = self.line_no, "Keyword found");
            self.state = State::CollectingValues {
                keyword: keyword.clone(),
                line: self.line_no,
                values: Vec::new(),
            };
            return Ok(());
        }

        if self.options.ignore.ignores(word) {
            debug!(keyword = %word, line = self.line_no, "Skipping line");
            return Ok(());
        }

        Err(GrdeclError::UnrecognizedKeyword {
            keyword: word.to_string(),
            line: self.line_no,
        })
    }

    /// Handle a line of record values, returning the record once its slash is seen.
    fn collect(&mut self, line: &str) -> Result<Option<Record>> {
        let limit = self.options.max_values;
        let State::CollectingValues {
            keyword,
            line: start,
            values,
        } = &mut self.state
        else {
            return Ok(None);
        };

        let mut terminated = false;
        for token in split_line(line) {
            if token == "/" {
                terminated = true;
                break;
            }
            let remaining = limit.saturating_sub(values.len());
            let too_many = || GrdeclError::TooManyValues {
                keyword: keyword.clone(),
                line: *start,
                limit,
            };
            let expanded = interpret_token_within(&token, remaining).map_err(|_| too_many())?;
            if expanded.len() > remaining {
                return Err(too_many());
            }
            values.extend(expanded);
        }

        if !terminated {
            return Ok(None);
        }

        Ok(match std::mem::replace(&mut self.state, State::SeekingKeyword) {
            State::CollectingValues {
                keyword,
                line,
                values,
            } => Some(Record {
                keyword,
                values,
                line,
            }),
            State::SeekingKeyword => None,
        })
    }

    fn next_record(&mut self) -> Result<Option<Record>> {
        while let Some(line) = self.lines.next() {
            let line = line?;
            self.line_no += 1;

            if matches!(self.state, State::SeekingKeyword) {
                self.seek(&line)?;
            } else if let Some(record) = self.collect(&line)? {
                return Ok(Some(record));
            }
        }

        match &self.state {
            State::SeekingKeyword => Ok(None),
            State::CollectingValues { keyword, line, .. } => {
                Err(GrdeclError::UnterminatedRecord {
                    keyword: keyword.clone(),
                    line: *line,
                })
            }
        }
    }
}

impl<R: BufRead> Iterator for GrdeclReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

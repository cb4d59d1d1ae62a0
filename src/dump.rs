// caninject/src/dump.rs
//
// Implements capture file parsing.
//
// This file is part of the Rust 'caninject' tool.
//
// Licensed under the MIT license:
//   <LICENSE or http://opensource.org/licenses/MIT>
// This file may not be copied, modified, or distributed except according
// to those terms.

//! Capture format parsing
//!
//! Parses the text log written by the bridge's CAN capture mode. Each
//! received frame is one line:
//!
//! ```text
//! RX ID: 0x182 | DLC: 8 | Data: 00 00 00 00 00 35 00 CE
//! RX ID: 0x5C5 | DLC: 8 | Data: 40 00 6B 9A 00 00 00 00
//! RX ID: 0x60D | DLC: 2 | Data: 00 06
//! ```
//!
//! Anything else in the file (headers, comments, blank lines) is not a
//! frame and is skipped without complaint.
//!
//! The parser is lenient about the length field. When a line has more
//! data tokens than its DLC, only the first DLC tokens are kept. When it
//! has fewer, the tokens present are kept as they are.

use crate::{
    constants::{
        CAPTURE_DATA_FIELD, CAPTURE_ID_PREFIX, CAPTURE_LENGTH_FIELD, CAPTURE_MARKER,
        CAPTURE_SEPARATOR,
    },
    Frame,
};
use log::trace;
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
    str::FromStr,
};
use thiserror::Error;

/// The reason a capture line is not a frame.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// The line does not start with the capture marker
    #[error("Missing capture marker")]
    MissingMarker,
    /// No hex ID after the marker
    #[error("Invalid frame ID")]
    InvalidId,
    /// A field separator was expected
    #[error("Missing field separator")]
    MissingSeparator,
    /// A field label was expected
    #[error("Missing field '{0}'")]
    MissingField(&'static str),
    /// The length field is not a decimal number
    #[error("Invalid data length")]
    InvalidLength,
}

// Splits off the leading run of characters matching `pred`.
fn split_while(s: &str, pred: impl Fn(char) -> bool) -> (&str, &str) {
    let end = s.find(|c: char| !pred(c)).unwrap_or(s.len());
    s.split_at(end)
}

// Skips whitespace then the expected token.
fn expect<'a>(s: &'a str, token: &str, err: ParseError) -> Result<&'a str, ParseError> {
    s.trim_start().strip_prefix(token).ok_or(err)
}

impl FromStr for Frame {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let rest = line
            .trim()
            .strip_prefix(CAPTURE_MARKER)
            .ok_or(ParseError::MissingMarker)?;

        // ID
        let rest = expect(rest, CAPTURE_ID_PREFIX, ParseError::InvalidId)?;
        let (id, rest) = split_while(rest, |c| c.is_ascii_hexdigit());
        if id.is_empty() {
            return Err(ParseError::InvalidId);
        }

        // DLC
        let rest = expect(rest, CAPTURE_SEPARATOR, ParseError::MissingSeparator)?;
        let rest = expect(
            rest,
            CAPTURE_LENGTH_FIELD,
            ParseError::MissingField(CAPTURE_LENGTH_FIELD),
        )?;
        let (dlc, rest) = split_while(rest.trim_start(), |c| c.is_ascii_digit());
        if dlc.is_empty() {
            return Err(ParseError::InvalidLength);
        }
        // all digits, so only overflow can fail
        let dlc = dlc.parse::<usize>().unwrap_or(usize::MAX);

        // Data
        let rest = expect(rest, CAPTURE_SEPARATOR, ParseError::MissingSeparator)?;
        let rest = expect(
            rest,
            CAPTURE_DATA_FIELD,
            ParseError::MissingField(CAPTURE_DATA_FIELD),
        )?;

        Ok(Frame::new(id, rest.split_whitespace().take(dlc)))
    }
}

/// Parses a single capture line.
///
/// Returns `None` for anything that is not a frame.
pub fn parse_line(line: &str) -> Option<Frame> {
    match line.parse::<Frame>() {
        Ok(frame) => Some(frame),
        Err(err) => {
            trace!("Skipping line {:?}: {}", line, err);
            None
        }
    }
}

/////////////////////////////////////////////////////////////////////////////
// Reader

#[derive(Debug)]
/// A capture file reader.
///
/// Iterates over the frames in the capture, skipping every line that is
/// not a frame.
pub struct Reader<R> {
    // The underlying reader
    rdr: R,
    // The line buffer
    buf: Vec<u8>,
}

impl<R: io::Read> Reader<R> {
    /// Creates an I/O buffered reader from a capture reader.
    pub fn from_reader(rdr: R) -> Reader<BufReader<R>> {
        Reader {
            rdr: BufReader::new(rdr),
            buf: Vec::with_capacity(256),
        }
    }
}

impl Reader<File> {
    /// Creates an I/O buffered reader from a file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Reader<BufReader<File>>> {
        Ok(Reader::from_reader(File::open(path)?))
    }
}

impl<R: BufRead> Reader<R> {
    /// Advance state, returning the next frame.
    pub fn next_frame(&mut self) -> io::Result<Option<Frame>> {
        loop {
            self.buf.clear();
            let nread = self.rdr.read_until(b'\n', &mut self.buf)?;

            // reached EOF
            if nread == 0 {
                return Ok(None);
            }

            let line = String::from_utf8_lossy(&self.buf[..nread]);
            if let Some(frame) = parse_line(&line) {
                return Ok(Some(frame));
            }
        }
    }
}

impl<R: BufRead> Iterator for Reader<R> {
    type Item = io::Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

/////////////////////////////////////////////////////////////////////////////

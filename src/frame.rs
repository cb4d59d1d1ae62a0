// caninject/src/frame.rs
//
// Implements the captured CAN frame and its injection command.
//
// This file is part of the Rust 'caninject' tool.
//
// Licensed under the MIT license:
//   <LICENSE or http://opensource.org/licenses/MIT>
// This file may not be copied, modified, or distributed except according
// to those terms.

//! Captured CAN frames.
//!
//! A [`Frame`] keeps the ID and data bytes exactly as the text tokens found
//! in the capture file. Nothing is decoded to binary: the bridge receives
//! the same hex text that was captured, so the case and width of every
//! token survive the round trip.
//!
//! The command sent to the bridge for each frame looks like:
//!
//! ```text
//! >182 00 00 00 00 00 35 00 CE
//! ```

use crate::constants::{
    CAPTURE_DATA_FIELD, CAPTURE_ID_PREFIX, CAPTURE_LENGTH_FIELD, CAPTURE_MARKER, COMMAND_PREFIX,
};
use itertools::Itertools;
use std::fmt;

/// A single captured CAN frame.
///
/// Immutable once built. The length is always the number of data tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    id: String,
    data: Vec<String>,
}

impl Frame {
    /// Creates a frame from an ID token and data byte tokens.
    pub fn new<S, I, D>(id: S, data: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = D>,
        D: Into<String>,
    {
        Self {
            id: id.into(),
            data: data.into_iter().map(Into::into).collect(),
        }
    }

    /// The hex ID, in the case it was captured.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The data byte tokens, in order.
    pub fn data(&self) -> &[String] {
        &self.data
    }

    /// The number of data bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the frame carries no data.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Renders the serial injection command, without the line terminator.
    ///
    /// The ID is always followed by a space, even when there is no data.
    pub fn to_command(&self) -> String {
        format!("{}{} {}", COMMAND_PREFIX, self.id, self.data.iter().join(" "))
    }
}

/// Formats the frame as a capture file line.
impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}{} | {} {} | {} {}",
            CAPTURE_MARKER,
            CAPTURE_ID_PREFIX,
            self.id,
            CAPTURE_LENGTH_FIELD,
            self.len(),
            CAPTURE_DATA_FIELD,
            self.data.iter().join(" ")
        )
    }
}

/////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_command() {
        let frame = Frame::new("182", ["00", "00", "00", "00", "00", "35", "00", "CE"]);
        assert_eq!(frame.len(), 8);
        assert_eq!(frame.to_command(), ">182 00 00 00 00 00 35 00 CE");
    }

    #[test]
    fn test_command_keeps_case() {
        let frame = Frame::new("5c5", ["ab", "CD"]);
        assert_eq!(frame.to_command(), ">5c5 ab CD");
    }

    #[test]
    fn test_empty_command() {
        let frame = Frame::new("60D", Vec::<String>::new());
        assert!(frame.is_empty());
        assert_eq!(frame.to_command(), ">60D ");
    }

    #[test]
    fn test_display() {
        let frame = Frame::new("180", ["01", "02"]);
        assert_eq!(frame.to_string(), "RX ID: 0x180 | DLC: 2 | Data: 01 02");
    }
}

// caninject/src/transport.rs
//
// Implements the serial link to the CAN bridge.
//
// This file is part of the Rust 'caninject' tool.
//
// Licensed under the MIT license:
//   <LICENSE or http://opensource.org/licenses/MIT>
// This file may not be copied, modified, or distributed except according
// to those terms.

//! The serial link to the bridge.
//!
//! The injector talks to anything implementing [`Transport`]: a byte
//! stream that can also report how many inbound bytes are already waiting.
//! A real serial port from the [serialport](https://crates.io/crates/serialport)
//! crate is one; tests use an in-memory stand-in.

use crate::{
    constants::{BAUD_RATE, READ_TIMEOUT},
    Error, Result,
};
use log::debug;
use serialport::SerialPort;
use std::io::{self, Read, Write};

/// Check an error for a read timeout.
///
/// A serial read that sees no data before the port's timeout returns an
/// error rather than zero bytes. This trait adds a `should_retry` method
/// to `Error` and `Result` to check for that condition.
pub trait ShouldRetry {
    /// Check for timeout
    ///
    /// If `true`, the error is probably due to a timeout.
    fn should_retry(&self) -> bool;
}

impl ShouldRetry for io::Error {
    fn should_retry(&self) -> bool {
        matches!(
            self.kind(),
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
        )
    }
}

impl<E: std::fmt::Debug> ShouldRetry for io::Result<E> {
    fn should_retry(&self) -> bool {
        match self {
            Err(e) => e.should_retry(),
            Ok(_) => false,
        }
    }
}

/// A bidirectional byte link to the bridge.
pub trait Transport: Read + Write {
    /// The number of inbound bytes that can be read without blocking.
    fn bytes_to_read(&self) -> io::Result<u32>;

    /// Reads one inbound line, without its terminator.
    ///
    /// Stops at a newline, at end of stream, or when the read times out.
    /// Returns `None` if the line is empty.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut buf = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            match self.read(&mut byte) {
                Ok(0) => break,
                Ok(_) if byte[0] == b'\n' => break,
                Ok(_) => buf.push(byte[0]),
                Err(e) if e.should_retry() => break,
                Err(e) => return Err(e),
            }
        }

        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        if buf.is_empty() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }
}

impl Transport for Box<dyn SerialPort> {
    fn bytes_to_read(&self) -> io::Result<u32> {
        SerialPort::bytes_to_read(&**self).map_err(io::Error::from)
    }
}

/// Opens the serial port to the bridge with the fixed link parameters.
pub fn open_port(path: &str) -> Result<Box<dyn SerialPort>> {
    let port = serialport::new(path, BAUD_RATE)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .flow_control(serialport::FlowControl::None)
        .timeout(READ_TIMEOUT)
        .open()
        .map_err(|source| Error::Open {
            port: path.to_string(),
            source,
        })?;

    debug!("Opened {} at {} baud", path, BAUD_RATE);
    Ok(port)
}

/////////////////////////////////////////////////////////////////////////////

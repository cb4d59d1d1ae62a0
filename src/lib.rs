// caninject/src/lib.rs
//
// The main lib file for the Rust 'caninject' tool.
//
// This file is part of the Rust 'caninject' tool.
//
// Licensed under the MIT license:
//   <LICENSE or http://opensource.org/licenses/MIT>
// This file may not be copied, modified, or distributed except according
// to those terms.

//! CAN frame injection over a serial link.
//!
//! A CAN bridge is a microcontroller that sits on a vehicle's CAN bus and
//! acts on the frames it sees. Testing its logic normally means being in
//! the vehicle. This crate replays a capture of real bus traffic to the
//! bridge over its USB serial port instead, so the bridge handles each
//! frame as if it had arrived from the bus.
//!
//! # Capture format
//!
//! The input is the text log from the bridge's own capture mode, one
//! received frame per line:
//!
//! ```text
//! RX ID: 0x182 | DLC: 8 | Data: 00 00 00 00 00 35 00 CE
//! ```
//!
//! Lines in any other shape are ignored. See [`dump`].
//!
//! # Serial protocol
//!
//! Each frame becomes one newline-terminated text command for the bridge,
//! sent at 115200 baud:
//!
//! ```text
//! >182 00 00 00 00 00 35 00 CE
//! ```
//!
//! The bridge may echo something back. Whatever is already waiting after a
//! command is written gets read and shown, but never interpreted.
//!
//! # Replay
//!
//! The [`Injector`] drives a single pass (or endless passes) over the
//! capture, optionally keeping only some frame IDs with a [`FilterSet`],
//! and pausing a fixed delay between frames.

use std::{io, path::PathBuf};
use thiserror::Error;

pub mod constants;
pub mod dump;
pub mod enumerate;
pub mod filter;
pub mod frame;
pub mod inject;
pub mod transport;

pub use crate::{
    enumerate::{available_ports, PortInfo},
    filter::FilterSet,
    frame::Frame,
    inject::{run_injection, InjectConfig, Injector, PassSummary, Summary},
    transport::{open_port, ShouldRetry, Transport},
};

/// An error from the injection tool.
#[derive(Error, Debug)]
pub enum Error {
    /// The serial port could not be opened
    #[error("Can't open serial port '{port}': {source}")]
    Open {
        /// The port that was requested
        port: String,
        /// The underlying failure
        source: serialport::Error,
    },
    /// The capture file does not exist
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),
    /// The serial ports could not be enumerated
    #[error("Can't list serial ports: {0}")]
    Enumerate(#[source] serialport::Error),
    /// Any other I/O error
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A result that can derive from an [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

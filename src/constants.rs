//
// constants.rs
//
// Fixed parameters of the capture format and the bridge's serial protocol.
//
use std::time::Duration;

/// Baud rate of the bridge's USB serial link.
pub const BAUD_RATE: u32 = 115_200;

/// Read timeout on the serial link.
pub const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Grace period after opening the port, while the bridge finishes booting.
pub const SETTLE_TIME: Duration = Duration::from_millis(500);

/// Default pause between injected frames, in milliseconds.
pub const DEFAULT_DELAY_MS: u64 = 10;

// capture line layout: "RX ID: 0x<id> | DLC: <len> | Data: <b> <b> ..."
pub const CAPTURE_MARKER: &str = "RX ID:";
pub const CAPTURE_ID_PREFIX: &str = "0x";
pub const CAPTURE_LENGTH_FIELD: &str = "DLC:";
pub const CAPTURE_DATA_FIELD: &str = "Data:";
pub const CAPTURE_SEPARATOR: &str = "|";

/// Leading character of every injection command.
pub const COMMAND_PREFIX: char = '>';

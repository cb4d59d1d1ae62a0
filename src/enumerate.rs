// caninject/src/enumerate.rs
//
// Implements support for enumerating the attached serial ports.
//
// This file is part of the Rust 'caninject' tool.
//
// Licensed under the MIT license:
//   <LICENSE or http://opensource.org/licenses/MIT>
// This file may not be copied, modified, or distributed except according
// to those terms.

//! Serial port enumeration.
//!
//! Lists the serial devices the bridge might be attached to. This is only
//! a diagnostic aid; it never opens a port.
//!

use crate::{Error, Result};
use serialport::{SerialPortInfo, SerialPortType};
use std::fmt;

/// An attached serial device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    /// The device path, like "/dev/ttyUSB0" or "COM3"
    pub path: String,
    /// A human readable description of the device
    pub description: String,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let description = match info.port_type {
            SerialPortType::UsbPort(usb) => usb
                .product
                .or(usb.manufacturer)
                .unwrap_or_else(|| format!("USB VID:PID={:04X}:{:04X}", usb.vid, usb.pid)),
            SerialPortType::PciPort => "PCI".into(),
            SerialPortType::BluetoothPort => "Bluetooth".into(),
            SerialPortType::Unknown => "n/a".into(),
        };

        Self {
            path: info.port_name,
            description,
        }
    }
}

impl fmt::Display for PortInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.path, self.description)
    }
}

/// Scans the system for attached serial ports and returns a list of them.
///
/// An empty list means the scan worked but found nothing.
pub fn available_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(Error::Enumerate)?;
    Ok(ports.into_iter().map(PortInfo::from).collect())
}

/////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use super::*;
    use serialport::UsbPortInfo;

    fn usb(manufacturer: Option<&str>, product: Option<&str>) -> SerialPortInfo {
        SerialPortInfo {
            port_name: "/dev/ttyUSB0".into(),
            port_type: SerialPortType::UsbPort(UsbPortInfo {
                vid: 0x10c4,
                pid: 0xea60,
                serial_number: None,
                manufacturer: manufacturer.map(String::from),
                product: product.map(String::from),
            }),
        }
    }

    #[test]
    fn test_usb_description() {
        let info = PortInfo::from(usb(Some("Silicon Labs"), Some("CP2102 USB to UART")));
        assert_eq!(info.path, "/dev/ttyUSB0");
        assert_eq!(info.description, "CP2102 USB to UART");
        assert_eq!(info.to_string(), "/dev/ttyUSB0 - CP2102 USB to UART");

        let info = PortInfo::from(usb(Some("Silicon Labs"), None));
        assert_eq!(info.description, "Silicon Labs");

        let info = PortInfo::from(usb(None, None));
        assert_eq!(info.description, "USB VID:PID=10C4:EA60");
    }

    #[test]
    fn test_other_descriptions() {
        let info = PortInfo::from(SerialPortInfo {
            port_name: "/dev/ttyS0".into(),
            port_type: SerialPortType::Unknown,
        });
        assert_eq!(info.to_string(), "/dev/ttyS0 - n/a");

        let info = PortInfo::from(SerialPortInfo {
            port_name: "/dev/rfcomm0".into(),
            port_type: SerialPortType::BluetoothPort,
        });
        assert_eq!(info.description, "Bluetooth");
    }
}

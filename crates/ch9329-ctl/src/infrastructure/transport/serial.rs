//! Serial-port transport for a CH9329 wired to a host UART.
//!
//! The port is opened once as 8-N-1 without flow control.  Each
//! `read_bytes` call performs a single `read`, which returns whatever arrived
//! before the configured timeout.

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use thiserror::Error;
use tracing::info;

use crate::application::dispatcher::Transport;

/// Errors opening the serial port.
#[derive(Debug, Error)]
pub enum SerialError {
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
}

/// A CH9329 reached through a host serial port.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialTransport {
    /// Opens `path` at `baud_rate`, 8 data bits, no parity, one stop bit.
    ///
    /// # Errors
    ///
    /// Returns [`SerialError::Open`] if the device does not exist, is busy,
    /// or rejects the settings.
    pub fn open(path: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self, SerialError> {
        let port = serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(read_timeout)
            .open()
            .map_err(|source| SerialError::Open {
                port: path.to_string(),
                source,
            })?;

        info!("CH9329 serial port opened: {path} @ {baud_rate} baud");
        Ok(Self {
            port,
            name: path.to_string(),
        })
    }

    /// The port path this transport was opened with.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Transport for SerialTransport {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.port.read(buf)
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        info!("CH9329 serial port closed: {}", self.name);
    }
}

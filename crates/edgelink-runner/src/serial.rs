//! Serial port channel.

use std::io::{ErrorKind, Read, Write};

use parking_lot::Mutex;
use serialport::{DataBits, Parity, SerialPort, StopBits};
use tracing::info;

use crate::channel::Channel;
use crate::config::LinkConfig;
use crate::error::ChannelError;

/// A [`Channel`] over a hardware or virtual serial port.
///
/// The port is opened once and cloned into separate reader and writer
/// handles, each behind its own lock, so a blocked read never delays a write.
pub struct SerialChannel {
    port_name: String,
    reader: Mutex<Box<dyn SerialPort>>,
    writer: Mutex<Box<dyn SerialPort>>,
}

impl SerialChannel {
    /// Open the port named in `config` (8N1, configured baud and read timeout).
    pub fn open(config: &LinkConfig) -> Result<Self, ChannelError> {
        let port_name = config.port_name().to_string();

        let port = serialport::new(&port_name, config.baud_rate)
            .timeout(config.read_timeout())
            .data_bits(DataBits::Eight)
            .stop_bits(StopBits::One)
            .parity(Parity::None)
            .open()
            .map_err(|source| ChannelError::Open {
                port: port_name.clone(),
                source,
            })?;
        let writer = port.try_clone().map_err(|source| ChannelError::Open {
            port: port_name.clone(),
            source,
        })?;

        info!(
            "Opened serial port {} at {} baud (read timeout {:?})",
            port_name,
            config.baud_rate,
            config.read_timeout()
        );

        Ok(SerialChannel {
            port_name,
            reader: Mutex::new(port),
            writer: Mutex::new(writer),
        })
    }
}

impl Channel for SerialChannel {
    fn write_frame(&self, frame: &[u8]) -> Result<(), ChannelError> {
        let mut writer = self.writer.lock();
        writer.write_all(frame)?;
        writer.flush()?;
        Ok(())
    }

    fn bytes_available(&self) -> Result<usize, ChannelError> {
        Ok(self.reader.lock().bytes_to_read()? as usize)
    }

    fn read(&self, buf: &mut [u8]) -> Result<usize, ChannelError> {
        match self.reader.lock().read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn describe(&self) -> String {
        self.port_name.clone()
    }
}

/// Names of the serial ports present on this machine.
pub fn list_ports() -> Result<Vec<String>, ChannelError> {
    Ok(serialport::available_ports()?
        .into_iter()
        .map(|port| port.port_name)
        .collect())
}

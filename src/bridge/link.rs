//! Ownership of the physical serial link.
//!
//! [`SerialLink`] is deliberately dumb: open the port, poll for complete
//! lines, write frames. It knows nothing about packets or the observer.
//! Every real I/O failure surfaces as a [`LinkError`] so the bridge loop can
//! make the reconnect decision; a read timeout is "no data yet", not an
//! error.

use serialport::SerialPort;
use std::io::{Read, Write};
use std::time::Duration;

/// Short read timeout so a poll never stalls the loop.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// The link-level failure taxonomy. Any of these means the physical
/// connection is gone or misbehaving and the bridge should drop to its
/// Disconnected state.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },

    #[error("serial port error: {0}")]
    Port(#[from] serialport::Error),

    #[error("serial I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

pub struct SerialLink {
    port: Box<dyn SerialPort>,
    rx_buf: Vec<u8>,
}

impl SerialLink {
    /// Open the port at 8N1 and purge whatever boot chatter the gateway
    /// already buffered. The DTR/RTS toggle wakes ESP32-class boards that
    /// sleep until the host asserts the lines.
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self, LinkError> {
        let mut builder = serialport::new(port_name, baud_rate).timeout(READ_TIMEOUT);
        #[cfg(unix)]
        {
            builder = builder
                .data_bits(serialport::DataBits::Eight)
                .stop_bits(serialport::StopBits::One)
                .parity(serialport::Parity::None);
        }
        let mut port = builder.open().map_err(|source| LinkError::Open {
            port: port_name.to_string(),
            source,
        })?;
        let _ = port.write_data_terminal_ready(true);
        let _ = port.write_request_to_send(true);
        let _ = port.clear(serialport::ClearBuffer::Input);
        Ok(Self {
            port,
            rx_buf: Vec::new(),
        })
    }

    /// Poll for one complete inbound line without blocking the loop.
    ///
    /// Returns `Ok(None)` when no full line is available yet. Bytes are
    /// buffered across polls, so a packet arriving in several chunks is
    /// reassembled; undecodable byte sequences are substituted rather than
    /// failing the read.
    pub fn poll_line(&mut self) -> Result<Option<String>, LinkError> {
        if let Some(line) = take_line(&mut self.rx_buf) {
            return Ok(Some(line));
        }

        if self.port.bytes_to_read()? == 0 {
            return Ok(None);
        }

        let mut chunk = [0u8; 512];
        match self.port.read(&mut chunk) {
            Ok(0) => Ok(None),
            Ok(n) => {
                self.rx_buf.extend_from_slice(&chunk[..n]);
                Ok(take_line(&mut self.rx_buf))
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => Ok(None),
            Err(e) => Err(LinkError::Io(e)),
        }
    }

    /// Write one pre-encoded wire frame and flush it out.
    pub fn write_frame(&mut self, wire: &str) -> Result<(), LinkError> {
        self.port.write_all(wire.as_bytes())?;
        self.port.flush()?;
        Ok(())
    }
}

/// Split one newline-terminated line off the front of the buffer, lossily
/// decoded and stripped of its terminator.
fn take_line(buf: &mut Vec<u8>) -> Option<String> {
    let pos = buf.iter().position(|&b| b == b'\n')?;
    let line: Vec<u8> = buf.drain(..=pos).collect();
    let text = String::from_utf8_lossy(&line);
    Some(
        text.trim_end_matches(|c| c == '\r' || c == '\n')
            .to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::take_line;

    #[test]
    fn no_line_until_newline_arrives() {
        let mut buf = b"{\"type\":\"hea".to_vec();
        assert_eq!(take_line(&mut buf), None);
        buf.extend_from_slice(b"rtbeat\"}\n");
        assert_eq!(take_line(&mut buf), Some("{\"type\":\"heartbeat\"}".to_string()));
        assert!(buf.is_empty());
    }

    #[test]
    fn splits_multiple_buffered_lines_in_order() {
        let mut buf = b"first\nsecond\r\nthird".to_vec();
        assert_eq!(take_line(&mut buf), Some("first".to_string()));
        assert_eq!(take_line(&mut buf), Some("second".to_string()));
        assert_eq!(take_line(&mut buf), None);
        assert_eq!(buf, b"third");
    }

    #[test]
    fn undecodable_bytes_are_substituted() {
        let mut buf = b"ok \xff\xfe noise\n".to_vec();
        let line = take_line(&mut buf).unwrap();
        assert!(line.starts_with("ok "));
        assert!(line.ends_with(" noise"));
    }
}

use std::io::{ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream};
use tracing::{info, warn, debug};

use super::{DeviceError, LineTransport, Result};

/// Longest command line accepted; anything longer is dropped up to its newline.
pub const MAX_LINE_BYTES: usize = 256;
const MAX_READS_PER_POLL: usize = 8;

/// Serial link to the operator, served over TCP on the host.
///
/// Stands in for the Bluetooth serial port: one client at a time, reads never
/// block, and writes with nobody connected are dropped.
pub struct TcpLink {
    listener: TcpListener,
    client: Option<TcpStream>,
    pending: Vec<u8>, // received bytes, at most one unterminated line at the end
    line_len: usize,  // length of that unterminated line
    discarding: bool, // inside an overlong line, skipping until '\n'
}

impl TcpLink {
    pub fn bind(address: &str) -> Result<Self> {
        info!("Opening operator link on {}", address);
        let listener = TcpListener::bind(address)?;
        listener.set_nonblocking(true)?;
        Ok(TcpLink {
            listener,
            client: None,
            pending: Vec::new(),
            line_len: 0,
            discarding: false,
        })
    }

    #[cfg(test)]
    fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    fn accept_pending(&mut self) -> Result<()> {
        if self.client.is_some() {
            return Ok(());
        }
        match self.listener.accept() {
            Ok((stream, peer)) => {
                stream.set_nonblocking(true)?;
                stream.set_nodelay(true)?;
                info!("Operator connected from {}", peer);
                self.reset_buffer();
                self.client = Some(stream);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(()),
            Err(e) => Err(DeviceError::Io(e)),
        }
    }

    fn disconnect(&mut self) {
        if self.client.take().is_some() {
            info!("Operator disconnected");
        }
        self.reset_buffer();
    }

    fn reset_buffer(&mut self) {
        self.pending.clear();
        self.line_len = 0;
        self.discarding = false;
    }

    fn absorb(&mut self, bytes: &[u8]) {
        for &b in bytes {
            if self.discarding {
                self.discarding = b != b'\n';
                continue;
            }
            self.pending.push(b);
            if b == b'\n' {
                self.line_len = 0;
                continue;
            }
            self.line_len += 1;
            if self.line_len > MAX_LINE_BYTES {
                warn!("Dropping command line longer than {} bytes", MAX_LINE_BYTES);
                let keep = self.pending.len() - self.line_len;
                self.pending.truncate(keep);
                self.line_len = 0;
                self.discarding = true;
            }
        }
    }

    fn take_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.pending.drain(..=end).collect();
        Some(String::from_utf8_lossy(&line[..end]).into_owned())
    }
}

impl LineTransport for TcpLink {
    fn write_line(&mut self, line: &str) -> Result<()> {
        self.accept_pending()?;
        let Some(stream) = &mut self.client else {
            debug!("No operator connected, dropping line: {}", line);
            return Ok(());
        };
        let framed = format!("{}\n", line);
        let written = stream.write_all(framed.as_bytes()).and_then(|_| stream.flush());
        if let Err(e) = written {
            warn!("Write to operator failed: {}", e);
            self.disconnect();
            return Err(DeviceError::Io(e));
        }
        Ok(())
    }

    fn poll_line(&mut self) -> Result<Option<String>> {
        self.accept_pending()?;
        if let Some(line) = self.take_line() {
            return Ok(Some(line));
        }
        let mut buf = [0_u8; 256];
        for _ in 0..MAX_READS_PER_POLL {
            let Some(stream) = &mut self.client else {
                break;
            };
            match stream.read(&mut buf) {
                Ok(0) => {
                    self.disconnect();
                    return Ok(None);
                }
                Ok(n) => {
                    self.absorb(&buf[..n]);
                    if self.pending.contains(&b'\n') {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.disconnect();
                    return Err(DeviceError::Io(e));
                }
            }
        }
        Ok(self.take_line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn poll_until_line(link: &mut TcpLink) -> Option<String> {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if let Some(line) = link.poll_line().unwrap() {
                return Some(line);
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn test_poll_without_client_returns_none() {
        let mut link = TcpLink::bind("127.0.0.1:0").unwrap();
        assert!(link.poll_line().unwrap().is_none());
        assert!(link.write_line("dropped").is_ok());
    }

    #[test]
    fn test_partial_line_waits_for_newline() {
        let mut link = TcpLink::bind("127.0.0.1:0").unwrap();
        let addr = link.listener.local_addr().unwrap();
        let mut client = TcpStream::connect(addr).unwrap();

        client.write_all(b"pl").unwrap();
        client.flush().unwrap();
        std::thread::sleep(Duration::from_millis(50));
        assert!(link.poll_line().unwrap().is_none());
        assert!(link.is_connected());

        client.write_all(b"ay\nstop\n").unwrap();
        assert_eq!(poll_until_line(&mut link).as_deref(), Some("play"));
        assert_eq!(poll_until_line(&mut link).as_deref(), Some("stop"));
    }

    #[test]
    fn test_overlong_line_is_dropped() {
        let mut link = TcpLink::bind("127.0.0.1:0").unwrap();
        let addr = link.listener.local_addr().unwrap();
        let writer = std::thread::spawn(move || {
            let mut client = TcpStream::connect(addr).unwrap();
            client.write_all(&vec![b'x'; 64 * 1024]).unwrap();
            client.write_all(b"\nplay\n").unwrap();
            client.flush().unwrap();
            // Hold the connection open until the link has read everything.
            std::thread::sleep(Duration::from_secs(1));
        });

        let deadline = Instant::now() + Duration::from_secs(3);
        let mut received = None;
        while received.is_none() && Instant::now() < deadline {
            received = link.poll_line().unwrap();
            assert!(link.pending.len() <= MAX_LINE_BYTES);
            std::thread::sleep(Duration::from_millis(1));
        }

        assert_eq!(received.as_deref(), Some("play"));
        writer.join().unwrap();
    }

    #[test]
    fn test_write_line_reaches_client() {
        let mut link = TcpLink::bind("127.0.0.1:0").unwrap();
        let addr = link.listener.local_addr().unwrap();
        let mut client = TcpStream::connect(addr).unwrap();
        client.set_read_timeout(Some(Duration::from_secs(2))).unwrap();

        // Let the link pick up the connection first.
        let deadline = Instant::now() + Duration::from_secs(2);
        while !link.is_connected() && Instant::now() < deadline {
            link.poll_line().unwrap();
            std::thread::sleep(Duration::from_millis(5));
        }

        link.write_line("-----------------------").unwrap();
        let mut buf = [0_u8; 64];
        let n = client.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"-----------------------\n");
    }
}

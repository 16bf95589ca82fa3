//! Connection seam for the protocol drivers
//!
//! Drivers never touch sockets directly. They read and write through a
//! `SessionOps` implementation wrapped in an `HttpSession`, which adds the
//! optional per-read deadline. `FdSessionOps` is the TCP implementation.

use super::{Error, Result};
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::os::fd::AsRawFd;
use std::time::Duration;

/// Byte-level operations on one connection
pub trait SessionOps {
    /// Wait until the connection has data to read or has hung up
    ///
    /// Returns false if `timeout` elapsed first.
    fn wait_readable(&self, timeout: Duration) -> Result<bool>;

    /// Read whatever is available, 0 on end-of-stream
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write some prefix of `buf`
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// Shut the connection down in both directions
    fn close(&mut self) -> Result<()>;
}

/// A connection as seen by the client and server drivers
///
/// Reads block indefinitely unless a timeout is set.
pub struct HttpSession<S: SessionOps> {
    session: S,
    timeout: Option<Duration>,
}

impl<S: SessionOps> HttpSession<S> {
    pub fn new(session: S) -> Self {
        HttpSession {
            session,
            timeout: None,
        }
    }

    /// Bound every subsequent read by `timeout`
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// Read data, failing with `Error::Timeout` if none arrives in time
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if let Some(timeout) = self.timeout {
            if !self.session.wait_readable(timeout)? {
                return Err(Error::Timeout);
            }
        }

        self.session.read(buf)
    }

    /// Write the whole buffer
    ///
    /// A write that accepts nothing means the peer is gone.
    pub fn write_all(&mut self, mut buf: &[u8]) -> Result<()> {
        while !buf.is_empty() {
            match self.session.write(buf)? {
                0 => return Err(Error::ConnectionClosed),
                n => buf = &buf[n..],
            }
        }
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        self.session.close()
    }
}

/// Session operations over a connected TCP stream
pub struct FdSessionOps {
    stream: TcpStream,
}

impl FdSessionOps {
    pub fn new(stream: TcpStream) -> Self {
        FdSessionOps { stream }
    }
}

impl SessionOps for FdSessionOps {
    fn wait_readable(&self, timeout: Duration) -> Result<bool> {
        use libc::{poll, pollfd, POLLIN};

        let mut pfd = pollfd {
            fd: self.stream.as_raw_fd(),
            events: POLLIN,
            revents: 0,
        };
        let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as i32;

        // SAFETY: pfd is a valid pollfd for the duration of the call
        let ready = unsafe { poll(&mut pfd as *mut pollfd, 1, timeout_ms) };
        if ready < 0 {
            return Err(Error::Io(io::Error::last_os_error()));
        }

        Ok(ready > 0)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.stream.read(buf)?)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        Ok(self.stream.write(buf)?)
    }

    fn close(&mut self) -> Result<()> {
        match self.stream.shutdown(Shutdown::Both) {
            // Peer already hung up
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => Ok(other?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    fn connected_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server, _) = listener.accept().unwrap();
        (client, server)
    }

    #[test]
    fn test_wait_readable_and_read() {
        let (client, mut server) = connected_pair();
        let mut ops = FdSessionOps::new(client);

        assert!(!ops.wait_readable(Duration::from_millis(50)).unwrap());

        server.write_all(b"Hello").unwrap();
        assert!(ops.wait_readable(Duration::from_secs(1)).unwrap());

        let mut buf = [0u8; 5];
        assert_eq!(ops.read(&mut buf).unwrap(), 5);
        assert_eq!(&buf, b"Hello");
    }

    #[test]
    fn test_read_timeout() {
        let (client, _server) = connected_pair();
        let mut session = HttpSession::new(FdSessionOps::new(client));
        session.set_timeout(Some(Duration::from_millis(100)));

        let mut buf = [0u8; 10];
        assert!(matches!(session.read(&mut buf), Err(Error::Timeout)));
    }

    #[test]
    fn test_write_all_and_close() {
        let (client, mut server) = connected_pair();
        let reader = thread::spawn(move || {
            let mut received = Vec::new();
            server.read_to_end(&mut received).unwrap();
            received
        });

        let mut session = HttpSession::new(FdSessionOps::new(client));
        session.write_all(b"one ").unwrap();
        session.write_all(b"two").unwrap();
        session.close().unwrap();

        assert_eq!(reader.join().unwrap(), b"one two");
    }

    struct Stalled;

    impl SessionOps for Stalled {
        fn wait_readable(&self, _timeout: Duration) -> Result<bool> {
            Ok(true)
        }

        fn read(&mut self, _buf: &mut [u8]) -> Result<usize> {
            Ok(0)
        }

        fn write(&mut self, _buf: &[u8]) -> Result<usize> {
            Ok(0)
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_all_to_stalled_peer() {
        let mut session = HttpSession::new(Stalled);
        assert!(matches!(session.write_all(b"x"), Err(Error::ConnectionClosed)));
        assert!(session.write_all(b"").is_ok());
    }
}

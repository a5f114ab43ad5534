use crate::clients::{Context, Exchanger};
use crate::errors::Error;
use crate::types::MAX_MESSAGE_SIZE;
use crate::{Message, Query};
use log::trace;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::time::Duration;

/// A UDP DNS Client.
///
/// Every exchange binds a fresh socket, sends a single query and reads a
/// single reply of at most 512 bytes. The socket is closed when the exchange
/// returns, whether it succeeded or not.
///
/// # Example
///
/// ```rust,no_run
/// use rootwalk::clients::{Context, Exchanger, UdpClient};
/// use rootwalk::{Query, Type};
///
/// let query = Query::new("example.com", Type::A);
/// let response = UdpClient::default()
///     .exchange(&Context::background(), "198.41.0.4:53".parse().unwrap(), &query)
///     .expect("could not exchange message");
///
/// println!("{}", response);
/// ```
///
/// See <https://datatracker.ietf.org/doc/html/rfc1035#section-4.2.1>
#[derive(Clone, Debug)]
pub struct UdpClient {
    /// Local address used when talking to IPv4 servers.
    pub bind_v4: SocketAddr,

    /// Local address used when talking to IPv6 servers.
    pub bind_v6: SocketAddr,

    /// Longest single wait on the socket before checking whether the context
    /// was cancelled.
    pub poll_interval: Duration,

    /// Used when the context carries no deadline.
    pub read_timeout: Duration,
}

impl Default for UdpClient {
    fn default() -> Self {
        UdpClient {
            bind_v4: (Ipv4Addr::UNSPECIFIED, 0).into(),
            bind_v6: (Ipv6Addr::UNSPECIFIED, 0).into(),
            poll_interval: Duration::from_millis(50),
            read_timeout: Duration::new(5, 0),
        }
    }
}

impl UdpClient {
    pub fn new() -> UdpClient {
        UdpClient::default()
    }

    /// Waits for a datagram, waking every `poll_interval` to look at `ctx`.
    fn recv(&self, ctx: &Context, socket: &UdpSocket, buf: &mut [u8]) -> Result<usize, RecvError> {
        let ctx = match ctx.deadline() {
            Some(_) => ctx.clone(),
            None => ctx.child_with_timeout(self.read_timeout),
        };

        loop {
            if ctx.is_cancelled() {
                return Err(RecvError::Cancelled);
            }

            let remaining = ctx.remaining().unwrap_or(self.read_timeout);
            if remaining == Duration::from_secs(0) {
                return Err(RecvError::Timeout);
            }

            // A zero timeout would mean "block forever".
            let wait = remaining.min(self.poll_interval).max(Duration::from_millis(1));
            socket.set_read_timeout(Some(wait))?;

            match socket.recv(buf) {
                Ok(len) => return Ok(len),
                Err(ref e)
                    if e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::TimedOut
                        || e.kind() == io::ErrorKind::Interrupted =>
                {
                    continue
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

enum RecvError {
    Io(io::Error),
    Timeout,
    Cancelled,
}

impl From<io::Error> for RecvError {
    fn from(e: io::Error) -> Self {
        RecvError::Io(e)
    }
}

impl Exchanger for UdpClient {
    /// Sends the query to the `server` via UDP and returns the result.
    fn exchange(&self, ctx: &Context, server: SocketAddr, query: &Query) -> Result<Message, Error> {
        ctx.check()?;

        let req = query.to_vec()?;
        let io_err = |source| Error::Io { server, source };

        let local = if server.is_ipv4() {
            self.bind_v4
        } else {
            self.bind_v6
        };
        let socket = UdpSocket::bind(local).map_err(io_err)?;

        // Connect us to the server, meaning recv will only receive directly
        // from the server.
        socket.connect(server).map_err(io_err)?;
        socket.send(&req).map_err(io_err)?;

        let mut buf = [0; MAX_MESSAGE_SIZE];
        let len = match self.recv(ctx, &socket, &mut buf) {
            Ok(len) => len,
            Err(RecvError::Io(e)) => return Err(io_err(e)),
            Err(RecvError::Timeout) => return Err(Error::Timeout { server }),
            Err(RecvError::Cancelled) => return Err(Error::Cancelled),
        };

        let resp = &buf[..len];
        trace!("raw response from {}: {}", server, hex::encode(resp));

        let m = Message::from_slice(resp).map_err(|source| Error::Parse { server, source })?;

        if m.header.id != query.header.id {
            return Err(Error::IdMismatch {
                server,
                expected: query.header.id,
                got: m.header.id,
            });
        }

        Ok(m)
    }
}

//! Line-delimited JSON-RPC over a byte stream.
//!
//! Each message is one JSON object terminated by `\n`. Blank lines between
//! messages are ignored.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::TcpStream;
#[cfg(unix)]
use std::os::unix::net::UnixStream;

use lintwire_config::SocketEndpoint;
use serde_json::Value;
use tracing::debug;

use super::jsonrpc::{JsonRpcRequest, JsonRpcResponse};
use super::{Connection, TRANSPORT_TARGET};
use crate::error::TransportError;

/// A JSON-RPC connection over a reader and writer pair.
pub struct StreamTransport<R, W> {
    reader: BufReader<R>,
    writer: W,
    next_id: i64,
}

impl<R: Read, W: Write> StreamTransport<R, W> {
    /// Creates a transport reading responses from `reader` and writing
    /// requests to `writer`.
    #[must_use]
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
            next_id: 1,
        }
    }

    /// Consumes the transport, returning the writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }

    const fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    fn send(&mut self, method: &str, id: i64, params: Value) -> Result<(), TransportError> {
        let request = JsonRpcRequest::with_id(id, method, params);
        let line =
            serde_json::to_string(&request).map_err(|err| TransportError::codec(method, err))?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    fn receive(&mut self, method: &str) -> Result<JsonRpcResponse, TransportError> {
        let mut line = String::new();
        loop {
            line.clear();
            let bytes_read = self.reader.read_line(&mut line)?;
            if bytes_read == 0 {
                return Err(TransportError::ConnectionClosed {
                    method: method.to_owned(),
                });
            }
            if !line.trim().is_empty() {
                break;
            }
        }
        serde_json::from_str(line.trim_end()).map_err(|err| TransportError::codec(method, err))
    }
}

impl StreamTransport<HostStream, HostStream> {
    /// Connects to the host listening on `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Io`] when the socket cannot be opened.
    pub fn connect(endpoint: &SocketEndpoint) -> Result<Self, TransportError> {
        let stream = HostStream::connect(endpoint)?;
        let writer = stream.try_clone()?;
        debug!(target: TRANSPORT_TARGET, %endpoint, "connected to host");
        Ok(Self::new(stream, writer))
    }
}

impl<R: Read, W: Write> Connection for StreamTransport<R, W> {
    fn round_trip(&mut self, method: &str, params: Value) -> Result<Value, TransportError> {
        let id = self.allocate_id();
        debug!(target: TRANSPORT_TARGET, method, id, "sending request");
        self.send(method, id, params)?;

        let response = self.receive(method)?;
        if response.id != Some(id) {
            return Err(TransportError::UnexpectedResponse {
                expected: id,
                actual: response.id,
            });
        }
        if let Some(error) = response.error {
            return Err(TransportError::Remote {
                method: method.to_owned(),
                code: error.code,
                message: error.message,
                data: error.data,
            });
        }
        Ok(response.result.unwrap_or(Value::Null))
    }
}

/// A socket connected to the host.
#[derive(Debug)]
pub enum HostStream {
    /// Unix domain socket.
    #[cfg(unix)]
    Unix(UnixStream),
    /// TCP socket.
    Tcp(TcpStream),
}

impl HostStream {
    /// Opens a socket to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while connecting. Unix endpoints are
    /// rejected on platforms without Unix domain sockets.
    pub fn connect(endpoint: &SocketEndpoint) -> io::Result<Self> {
        match endpoint {
            #[cfg(unix)]
            SocketEndpoint::Unix { path } => UnixStream::connect(path.as_std_path()).map(Self::Unix),
            #[cfg(not(unix))]
            SocketEndpoint::Unix { .. } => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "unix domain sockets are not supported on this platform",
            )),
            SocketEndpoint::Tcp { host, port } => {
                TcpStream::connect((host.as_str(), *port)).map(Self::Tcp)
            }
        }
    }

    /// Clones the underlying socket handle.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised by the operating system.
    pub fn try_clone(&self) -> io::Result<Self> {
        match self {
            #[cfg(unix)]
            Self::Unix(stream) => stream.try_clone().map(Self::Unix),
            Self::Tcp(stream) => stream.try_clone().map(Self::Tcp),
        }
    }
}

impl Read for HostStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
            Self::Tcp(stream) => stream.read(buf),
        }
    }
}

impl Write for HostStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
            Self::Tcp(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
            Self::Tcp(stream) => stream.flush(),
        }
    }
}

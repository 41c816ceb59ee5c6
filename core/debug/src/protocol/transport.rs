//! Transport layer for host communication.
//!
//! Messages are JSON bodies behind a `Content-Length: N\r\n\r\n` header. The
//! framing is shared; transports only decide where the bytes come from.

use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;

/// Reads and writes framed protocol messages.
pub trait Transport {
    /// Reads the next message body.
    fn read_message(&mut self) -> io::Result<String>;

    /// Writes one message body with its framing header.
    fn write_message(&mut self, message: &str) -> io::Result<()>;
}

fn read_framed<R: BufRead>(reader: &mut R) -> io::Result<String> {
    // Skip blank lines between messages, then expect the header.
    let content_length = loop {
        let mut header = String::new();
        if reader.read_line(&mut header)? == 0 {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        let header = header.trim();
        if header.is_empty() {
            continue;
        }
        break header
            .strip_prefix("Content-Length:")
            .and_then(|value| value.trim().parse::<usize>().ok())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidData, "invalid Content-Length header")
            })?;
    };

    // Header/body separator.
    let mut empty = String::new();
    reader.read_line(&mut empty)?;

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body)?;
    String::from_utf8(body).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))
}

fn write_framed<W: Write>(writer: &mut W, message: &str) -> io::Result<()> {
    write!(writer, "Content-Length: {}\r\n\r\n{}", message.len(), message)?;
    writer.flush()
}

/// Standard input/output transport.
#[derive(Debug)]
pub struct StdioTransport {
    stdin: BufReader<io::Stdin>,
    stdout: io::Stdout,
}

impl StdioTransport {
    /// Creates a transport over this process's stdio.
    pub fn new() -> Self {
        Self {
            stdin: BufReader::new(io::stdin()),
            stdout: io::stdout(),
        }
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for StdioTransport {
    fn read_message(&mut self) -> io::Result<String> {
        read_framed(&mut self.stdin)
    }

    fn write_message(&mut self, message: &str) -> io::Result<()> {
        write_framed(&mut self.stdout, message)
    }
}

/// Transport over an accepted TCP connection.
#[derive(Debug)]
pub struct TcpTransport {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl TcpTransport {
    /// Wraps an accepted stream.
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self {
            reader,
            writer: stream,
        })
    }
}

impl Transport for TcpTransport {
    fn read_message(&mut self) -> io::Result<String> {
        read_framed(&mut self.reader)
    }

    fn write_message(&mut self, message: &str) -> io::Result<()> {
        write_framed(&mut self.writer, message)
    }
}

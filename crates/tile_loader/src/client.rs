//! Keep-alive tile client over a raw TCP socket.
//!
//! Speaks just enough HTTP/1.1 to request `<path>/<zoom>/<x>/<y>.<ext>` and
//! read back a `200` response with a `Content-Length`. The response body is
//! left in the session buffer for the decoder to stream from.

use crate::error::FetchError;
use crate::metrics::LoaderMetrics;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;
use vtile::{BufferedSource, DecodeError, TileCoord};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Requests sent on one connection before it is replaced.
    pub requests_per_connection: u32,
    /// A connection idle for longer than this is not reused.
    pub idle_timeout: Duration,
    pub connect_timeout: Duration,
    /// Socket read timeout; cancellation is checked between reads.
    pub read_poll: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            requests_per_connection: 100,
            idle_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(30),
            read_poll: Duration::from_millis(250),
        }
    }
}

/// Where tiles come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileEndpoint {
    pub host: String,
    pub port: u16,
    /// URL path without a trailing `/`.
    pub path: String,
    pub extension: String,
}

impl TileEndpoint {
    pub fn parse(base_url: &str, extension: &str) -> Result<Self, FetchError> {
        let url = Url::parse(base_url)
            .map_err(|e| FetchError::InvalidEndpoint(format!("{base_url}: {e}")))?;
        if url.scheme() != "http" {
            return Err(FetchError::InvalidEndpoint(format!(
                "{base_url}: only plain http is supported"
            )));
        }
        let host = url
            .host_str()
            .ok_or_else(|| FetchError::InvalidEndpoint(format!("{base_url}: missing host")))?
            .to_owned();

        Ok(Self {
            host,
            port: url.port_or_known_default().unwrap_or(80),
            path: url.path().trim_end_matches('/').to_owned(),
            extension: extension.trim_start_matches('.').to_owned(),
        })
    }

    fn host_header(&self) -> String {
        if self.port == 80 {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

/// Reusable request buffer: fixed prefix and suffix around the tile path.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    prefix: Vec<u8>,
    suffix: Vec<u8>,
    buf: Vec<u8>,
}

impl RequestBuilder {
    pub fn new(endpoint: &TileEndpoint) -> Self {
        let prefix = format!("GET {}/", endpoint.path).into_bytes();
        let suffix = format!(
            ".{} HTTP/1.1\r\nHost: {}\r\nConnection: Keep-Alive\r\n\r\n",
            endpoint.extension,
            endpoint.host_header()
        )
        .into_bytes();
        let buf = Vec::with_capacity(prefix.len() + suffix.len() + 32);
        Self { prefix, suffix, buf }
    }

    pub fn build(&mut self, tile: TileCoord) -> &[u8] {
        self.buf.clear();
        self.buf.extend_from_slice(&self.prefix);
        write_decimal(&mut self.buf, tile.zoom as u32);
        self.buf.push(b'/');
        write_decimal(&mut self.buf, tile.x);
        self.buf.push(b'/');
        write_decimal(&mut self.buf, tile.y);
        self.buf.extend_from_slice(&self.suffix);
        &self.buf
    }
}

fn write_decimal(buf: &mut Vec<u8>, mut n: u32) {
    let mut digits = [0u8; 10];
    let mut i = digits.len();
    loop {
        i -= 1;
        digits[i] = b'0' + (n % 10) as u8;
        n /= 10;
        if n == 0 {
            break;
        }
    }
    buf.extend_from_slice(&digits[i..]);
}

const CONTENT_LENGTH: &[u8] = b"content-length:";

fn check_status(line: &[u8]) -> Result<(), FetchError> {
    if line.len() >= 12 && line.starts_with(b"HTTP/1.") && &line[8..12] == b" 200" {
        return Ok(());
    }
    Err(FetchError::protocol(format!(
        "unexpected status line {:?}",
        String::from_utf8_lossy(line)
    )))
}

fn parse_content_length(line: &[u8]) -> Result<Option<usize>, FetchError> {
    if line.len() < CONTENT_LENGTH.len()
        || !line[..CONTENT_LENGTH.len()].eq_ignore_ascii_case(CONTENT_LENGTH)
    {
        return Ok(None);
    }

    let invalid = || {
        FetchError::protocol(format!(
            "invalid Content-Length {:?}",
            String::from_utf8_lossy(line)
        ))
    };
    let mut value = 0usize;
    let mut digits = 0usize;
    for &b in &line[CONTENT_LENGTH.len()..] {
        match b {
            b' ' | b'\t' if digits == 0 => {}
            b'0'..=b'9' => {
                value = value
                    .checked_mul(10)
                    .and_then(|v| v.checked_add((b - b'0') as usize))
                    .ok_or_else(invalid)?;
                digits += 1;
            }
            b' ' | b'\t' => break,
            _ => return Err(invalid()),
        }
    }
    if digits == 0 {
        return Err(invalid());
    }
    Ok(Some(value))
}

/// Consume a response header from `source` and return the declared body length.
///
/// Lines end at `\n` (a preceding `\r` is ignored). On success the source is
/// positioned at the first body byte with a message of that length begun.
/// Bytes that arrive split across reads stay buffered between calls.
pub fn read_response_header<R: Read>(source: &mut BufferedSource<R>) -> Result<usize, FetchError> {
    source.end_message();

    let mut status_seen = false;
    let mut content_length = None;
    let mut scanned = 0usize;

    loop {
        let line_end = loop {
            if let Some(pos) = source.peek()[scanned..].iter().position(|&b| b == b'\n') {
                break scanned + pos;
            }
            scanned = source.available();
            if scanned == source.capacity() {
                return Err(FetchError::protocol("response header line exceeds read buffer"));
            }
            match source.fill_more() {
                Ok(0) => {
                    return Err(FetchError::Connection(io::Error::new(
                        ErrorKind::UnexpectedEof,
                        "connection closed while reading response header",
                    )))
                }
                Ok(_) => {}
                Err(e) => return Err(FetchError::Connection(e)),
            }
        };

        let raw = &source.peek()[..line_end];
        let line = raw.strip_suffix(b"\r").unwrap_or(raw);
        let blank = line.is_empty();

        if !status_seen {
            check_status(line)?;
            status_seen = true;
        } else if !blank {
            if let Some(len) = parse_content_length(line)? {
                content_length = Some(len);
            }
        }

        source.consume(line_end + 1);
        scanned = 0;
        if blank {
            break;
        }
    }

    let len = content_length.ok_or_else(|| FetchError::protocol("missing Content-Length"))?;
    source.begin_message(len);
    Ok(len)
}

/// Blocking socket reads that give up once the token is cancelled.
#[derive(Debug)]
pub struct SocketReader {
    stream: TcpStream,
    cancel: CancellationToken,
}

impl Read for SocketReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.cancel.is_cancelled() {
                return Err(io::Error::new(ErrorKind::Other, "tile fetch cancelled"));
            }
            match self.stream.read(buf) {
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                result => return result,
            }
        }
    }
}

pub type BodySource = BufferedSource<SocketReader>;

struct Connection {
    source: BodySource,
    requests_left: u32,
    last_request: Instant,
}

enum Attempt {
    Retry(FetchError),
    Fail(FetchError),
}

fn io_failure(cancel: &CancellationToken, e: io::Error) -> FetchError {
    if cancel.is_cancelled() {
        FetchError::Cancelled
    } else {
        FetchError::Connection(e)
    }
}

/// One worker's connection to the tile server. Never shared between threads.
pub struct TileFetchClient {
    endpoint: TileEndpoint,
    settings: ClientSettings,
    request: RequestBuilder,
    connection: Option<Connection>,
    cancel: CancellationToken,
    metrics: Option<Arc<LoaderMetrics>>,
}

impl TileFetchClient {
    pub fn new(
        endpoint: TileEndpoint,
        settings: ClientSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            request: RequestBuilder::new(&endpoint),
            endpoint,
            settings,
            connection: None,
            cancel,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<LoaderMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn endpoint(&self) -> &TileEndpoint {
        &self.endpoint
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    fn connection_usable(&self) -> bool {
        self.connection.as_ref().is_some_and(|c| {
            c.requests_left > 0 && c.last_request.elapsed() <= self.settings.idle_timeout
        })
    }

    fn connect(&mut self) -> Result<(), FetchError> {
        self.close();
        if self.cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let addrs = (self.endpoint.host.as_str(), self.endpoint.port)
            .to_socket_addrs()
            .map_err(FetchError::Connection)?;

        let mut last_err = None;
        let mut stream = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.settings.connect_timeout) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => last_err = Some(e),
            }
        }
        let stream = stream.ok_or_else(|| {
            FetchError::Connection(last_err.unwrap_or_else(|| {
                io::Error::new(ErrorKind::NotFound, "tile host resolved to no address")
            }))
        })?;

        stream.set_nodelay(true).map_err(FetchError::Connection)?;
        stream
            .set_read_timeout(Some(self.settings.read_poll))
            .map_err(FetchError::Connection)?;
        stream
            .set_write_timeout(Some(self.settings.connect_timeout))
            .map_err(FetchError::Connection)?;

        tracing::debug!(
            host = %self.endpoint.host,
            port = self.endpoint.port,
            "opened tile connection"
        );
        if let Some(m) = &self.metrics {
            m.connections_opened_total.inc();
        }

        self.connection = Some(Connection {
            source: BufferedSource::new(SocketReader {
                stream,
                cancel: self.cancel.clone(),
            }),
            requests_left: self.settings.requests_per_connection,
            last_request: Instant::now(),
        });
        Ok(())
    }

    /// Drop the connection, abandoning any keep-alive state.
    pub fn close(&mut self) {
        if let Some(conn) = self.connection.take() {
            let _ = conn.source.get_ref().stream.shutdown(Shutdown::Both);
            tracing::debug!("closed tile connection");
        }
    }

    /// Close the connection if it would not be reused anyway.
    pub fn close_if_stale(&mut self) {
        if self.connection.is_some() && !self.connection_usable() {
            self.close();
        }
    }

    fn try_request(&mut self, tile: TileCoord) -> Result<usize, Attempt> {
        let Some(conn) = self.connection.as_mut() else {
            return Err(Attempt::Fail(FetchError::Connection(io::Error::new(
                ErrorKind::NotConnected,
                "no tile connection",
            ))));
        };
        let request = self.request.build(tile);
        if let Err(e) = conn.source.get_mut().stream.write_all(request) {
            return Err(Attempt::Retry(io_failure(&self.cancel, e)));
        }
        conn.requests_left = conn.requests_left.saturating_sub(1);
        conn.last_request = Instant::now();

        match read_response_header(&mut conn.source) {
            Ok(len) => Ok(len),
            Err(FetchError::Connection(e)) => Err(Attempt::Retry(io_failure(&self.cancel, e))),
            Err(other) => Err(Attempt::Fail(other)),
        }
    }

    /// Request `tile` and read the response header. On success the body is
    /// ready in [`body`](Self::body) and the declared length is returned.
    ///
    /// A socket failure while sending the request or reading the header is
    /// retried once on a fresh connection. Protocol errors are not retried.
    pub fn fetch(&mut self, tile: TileCoord) -> Result<usize, FetchError> {
        if !self.connection_usable() {
            self.connect()?;
        }

        let failure = match self.try_request(tile) {
            Ok(len) => return Ok(len),
            Err(Attempt::Fail(e)) => e,
            Err(Attempt::Retry(FetchError::Cancelled)) => FetchError::Cancelled,
            Err(Attempt::Retry(e)) => {
                tracing::debug!(tile = %tile, error = %e, "tile request failed, reconnecting");
                if let Some(m) = &self.metrics {
                    m.request_retries_total.inc();
                }
                self.connect()?;
                match self.try_request(tile) {
                    Ok(len) => return Ok(len),
                    Err(Attempt::Fail(e)) | Err(Attempt::Retry(e)) => e,
                }
            }
        };

        self.close();
        Err(failure)
    }

    /// Body of the response read by the last successful [`fetch`](Self::fetch).
    pub fn body(&mut self) -> Option<&mut BodySource> {
        self.connection.as_mut().map(|c| &mut c.source)
    }

    /// Discard any unread body bytes so the connection can carry the next request.
    pub fn finish_body(&mut self) -> Result<(), FetchError> {
        let Some(conn) = self.connection.as_mut() else {
            return Ok(());
        };
        let rest = conn.source.remaining_in_message().unwrap_or(0);
        let drained = if rest > 0 { conn.source.skip(rest) } else { Ok(()) };
        match drained {
            Ok(()) => {
                conn.source.end_message();
                Ok(())
            }
            Err(e) => {
                self.close();
                Err(self.decode_failure(e))
            }
        }
    }

    fn decode_failure(&self, e: DecodeError) -> FetchError {
        match e {
            _ if self.cancel.is_cancelled() => FetchError::Cancelled,
            DecodeError::Io(io) => FetchError::Connection(io),
            other => FetchError::Decode(other),
        }
    }

    /// Fetch `tile` and hand its body to `decode`. The connection is kept for
    /// reuse only if `decode` succeeds and the body is fully drained.
    pub fn load_tile<T, F>(&mut self, tile: TileCoord, decode: F) -> Result<T, FetchError>
    where
        F: FnOnce(&mut BodySource) -> Result<T, DecodeError>,
    {
        let len = self.fetch(tile)?;
        if let Some(m) = &self.metrics {
            m.body_bytes_total.inc_by(len as u64);
        }

        let Some(source) = self.body() else {
            return Err(FetchError::Connection(io::Error::new(
                ErrorKind::NotConnected,
                "tile connection lost",
            )));
        };

        match decode(source) {
            Ok(value) => {
                self.finish_body()?;
                Ok(value)
            }
            Err(e) => {
                self.close();
                Err(self.decode_failure(e))
            }
        }
    }
}

impl Drop for TileFetchClient {
    fn drop(&mut self) {
        self.close();
    }
}

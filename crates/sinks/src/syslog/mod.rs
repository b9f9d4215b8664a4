//! Syslog Sink - BSD syslog frames over udp, tcp or the local socket
//!
//! # Frame Format
//!
//! ```text
//! <14>2025-01-15T10:30:45+01:00 web-1 api[4242]: [I] request completed
//! <14>Jan 15 10:30:45 api[4242]: [I] request completed        (local socket)
//! ```
//!
//! `PRI` is `facility * 8 + severity`, with the severity taken from the
//! message level. A single background task owns the connection; a failed
//! send reconnects once before the message is dropped.

use std::fmt::{self, Write as FmtWrite};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::SecondsFormat;
use fanlog_protocol::{Formatter, Level, Message};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, UdpSocket};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::common::{SharedFormatter, Sink, SinkError, SinkMetrics, TaskLifecycle};
use crate::util::{RateLimitedLogger, current_binary_name};

/// Local sockets tried when no address is configured
const LOCAL_SOCKETS: &[&str] = &["/dev/log", "/var/run/syslog", "/var/run/log"];

// =============================================================================
// Facility / severity
// =============================================================================

/// Syslog facility
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum Facility {
    Kern = 0,
    #[default]
    User = 1,
    Mail = 2,
    Daemon = 3,
    Auth = 4,
    Syslog = 5,
    Lpr = 6,
    News = 7,
    Uucp = 8,
    Cron = 9,
    Authpriv = 10,
    Ftp = 11,
    Local0 = 16,
    Local1 = 17,
    Local2 = 18,
    Local3 = 19,
    Local4 = 20,
    Local5 = 21,
    Local6 = 22,
    Local7 = 23,
}

impl FromStr for Facility {
    type Err = SinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let facility = match s.trim().to_ascii_lowercase().as_str() {
            "kern" => Self::Kern,
            "user" => Self::User,
            "mail" => Self::Mail,
            "daemon" => Self::Daemon,
            "auth" => Self::Auth,
            "syslog" => Self::Syslog,
            "lpr" => Self::Lpr,
            "news" => Self::News,
            "uucp" => Self::Uucp,
            "cron" => Self::Cron,
            "authpriv" => Self::Authpriv,
            "ftp" => Self::Ftp,
            "local0" => Self::Local0,
            "local1" => Self::Local1,
            "local2" => Self::Local2,
            "local3" => Self::Local3,
            "local4" => Self::Local4,
            "local5" => Self::Local5,
            "local6" => Self::Local6,
            "local7" => Self::Local7,
            other => return Err(SinkError::config(format!("unknown syslog facility '{other}'"))),
        };
        Ok(facility)
    }
}

/// Syslog severity for a log level
pub fn severity(level: Level) -> u8 {
    match level {
        Level::Panic => 0,
        Level::Fatal => 2,
        Level::Error => 3,
        Level::Warn => 4,
        Level::Info | Level::Verbose => 6,
        Level::Debug | Level::Trace => 7,
    }
}

/// `PRI` value of a frame
pub fn priority(facility: Facility, level: Level) -> u8 {
    (facility as u8) * 8 + severity(level)
}

// =============================================================================
// Address
// =============================================================================

/// Where frames are sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyslogAddress {
    /// `tcp://host:port` or a bare `host:port`
    Tcp(String),
    /// `udp://host:port`
    Udp(String),
    /// `unix:///path`; `None` tries the usual local sockets
    Unix(Option<PathBuf>),
}

impl SyslogAddress {
    /// Whether frames go to the local daemon (short header)
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Unix(_))
    }
}

impl FromStr for SyslogAddress {
    type Err = SinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::Unix(None));
        }

        let Some((scheme, rest)) = s.split_once("://") else {
            return Ok(Self::Tcp(s.to_string()));
        };

        if rest.is_empty() {
            return Err(SinkError::config(format!("syslog address '{s}' has no host or path")));
        }

        match scheme {
            "tcp" => Ok(Self::Tcp(rest.to_string())),
            "udp" => Ok(Self::Udp(rest.to_string())),
            "unix" => Ok(Self::Unix(Some(PathBuf::from(rest)))),
            other => Err(SinkError::config(format!("unknown syslog scheme '{other}'"))),
        }
    }
}

impl fmt::Display for SyslogAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp(addr) => write!(f, "tcp://{addr}"),
            Self::Udp(addr) => write!(f, "udp://{addr}"),
            Self::Unix(Some(path)) => write!(f, "unix://{}", path.display()),
            Self::Unix(None) => f.write_str("local"),
        }
    }
}

// =============================================================================
// Config
// =============================================================================

/// Configuration for the syslog sink
#[derive(Debug, Clone)]
pub struct SyslogConfig {
    /// Severity threshold
    pub level: Level,

    /// Destination
    pub address: SyslogAddress,

    /// Facility for every frame
    pub facility: Facility,

    /// Program tag; empty uses the executable name
    pub tag: String,

    /// Queue capacity
    pub queue_size: usize,

    /// Time `close` waits for the task to drain
    pub close_grace: Duration,
}

impl Default for SyslogConfig {
    fn default() -> Self {
        Self {
            level: Level::Debug,
            address: SyslogAddress::Unix(None),
            facility: Facility::User,
            tag: String::new(),
            queue_size: 8,
            close_grace: Duration::from_secs(1),
        }
    }
}

impl SyslogConfig {
    /// Config for `address` (see `SyslogAddress` for accepted forms)
    pub fn new(address: &str) -> Result<Self, SinkError> {
        Ok(Self {
            address: address.parse()?,
            ..Self::default()
        })
    }

    /// Set the severity threshold
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set the facility
    #[must_use]
    pub fn with_facility(mut self, facility: Facility) -> Self {
        self.facility = facility;
        self
    }

    /// Set the program tag
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }
}

// =============================================================================
// Default formatter
// =============================================================================

/// Tag, optional call site and text; the frame header carries the time
#[derive(Debug, Clone, Copy, Default)]
pub struct SyslogFormatter;

impl Formatter for SyslogFormatter {
    fn format(&self, message: &Message) -> String {
        let mut buf = String::with_capacity(8 + message.text().len());
        buf.push_str(message.level().tag());
        if let Some(caller) = message.caller() {
            let _ = write!(buf, " [{}:{} - {}]", caller.filename, caller.line, caller.function);
        }
        buf.push(' ');
        buf.push_str(message.text());
        buf
    }
}

// =============================================================================
// Connection
// =============================================================================

enum Connection {
    Tcp(TcpStream),
    Udp(UdpSocket),
    #[cfg(unix)]
    Unix(tokio::net::UnixDatagram),
}

impl Connection {
    async fn open(address: &SyslogAddress) -> std::io::Result<Self> {
        match address {
            SyslogAddress::Tcp(addr) => Ok(Self::Tcp(TcpStream::connect(addr).await?)),
            SyslogAddress::Udp(addr) => {
                let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
                socket.connect(addr).await?;
                Ok(Self::Udp(socket))
            }
            SyslogAddress::Unix(path) => Self::open_local(path.as_ref()),
        }
    }

    #[cfg(unix)]
    fn open_local(path: Option<&PathBuf>) -> std::io::Result<Self> {
        let candidates: Vec<PathBuf> = match path {
            Some(path) => vec![path.clone()],
            None => LOCAL_SOCKETS.iter().map(PathBuf::from).collect(),
        };

        let mut last_error = None;
        for candidate in candidates {
            let socket = tokio::net::UnixDatagram::unbound()?;
            match socket.connect(&candidate) {
                Ok(()) => return Ok(Self::Unix(socket)),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no local syslog socket")
        }))
    }

    #[cfg(not(unix))]
    fn open_local(_path: Option<&PathBuf>) -> std::io::Result<Self> {
        let _ = LOCAL_SOCKETS;
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "local syslog sockets are only available on unix",
        ))
    }

    async fn send(&mut self, frame: &[u8]) -> std::io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.write_all(frame).await,
            Self::Udp(socket) => socket.send(frame).await.map(|_| ()),
            #[cfg(unix)]
            Self::Unix(socket) => socket.send(frame).await.map(|_| ()),
        }
    }
}

// =============================================================================
// Sink
// =============================================================================

/// Syslog sink
pub struct SyslogSink {
    name: String,
    level: Level,
    sender: mpsc::Sender<Arc<Message>>,
    formatter: Arc<SharedFormatter>,
    metrics: Arc<SinkMetrics>,
    lifecycle: TaskLifecycle,
}

impl SyslogSink {
    /// Connect a syslog sink named "syslog"
    pub async fn connect(config: SyslogConfig) -> Result<Self, SinkError> {
        Self::connect_named("syslog", config).await
    }

    /// Connect a syslog sink with a custom name
    ///
    /// Failing to reach the daemon fails construction.
    pub async fn connect_named(name: impl Into<String>, config: SyslogConfig) -> Result<Self, SinkError> {
        let name = name.into();
        if config.queue_size == 0 {
            return Err(SinkError::config("queue_size must be greater than 0"));
        }

        let connection = Connection::open(&config.address).await.map_err(|e| {
            SinkError::connection(format!("failed to connect to {}: {e}", config.address))
        })?;

        let tag = if config.tag.is_empty() {
            current_binary_name()
        } else {
            config.tag.clone()
        };
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "localhost".to_string());

        let formatter = Arc::new(SharedFormatter::new(Box::new(SyslogFormatter)));
        let metrics = Arc::new(SinkMetrics::new());

        let worker = SyslogWorker {
            sink: name.clone(),
            address: config.address.clone(),
            connection,
            header: FrameHeader {
                facility: config.facility,
                hostname,
                tag,
                pid: std::process::id(),
                local: config.address.is_local(),
            },
            formatter: Arc::clone(&formatter),
            metrics: Arc::clone(&metrics),
            error_logger: RateLimitedLogger::for_sink(name.clone()),
        };

        let (sender, receiver) = mpsc::channel(config.queue_size);
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(worker.run(receiver, shutdown.clone()));

        tracing::info!(sink = %name, address = %config.address, "syslog sink connected");

        Ok(Self {
            name,
            level: config.level,
            sender,
            formatter,
            metrics,
            lifecycle: TaskLifecycle::new(shutdown, task, config.close_grace),
        })
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }
}

#[async_trait]
impl Sink for SyslogSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn level(&self) -> Level {
        self.level
    }

    async fn write(&self, message: Arc<Message>) {
        if self.lifecycle.is_closed() {
            self.metrics.message_dropped();
            return;
        }

        self.metrics.message_received();
        if self.sender.send(message).await.is_err() {
            self.metrics.message_dropped();
        }
    }

    async fn close(&self) -> Result<(), SinkError> {
        self.lifecycle.close(&self.name).await
    }

    fn set_formatter(&self, formatter: Box<dyn Formatter>) -> bool {
        self.formatter.store(formatter);
        true
    }
}

/// Fixed parts of every frame
struct FrameHeader {
    facility: Facility,
    hostname: String,
    tag: String,
    pid: u32,
    local: bool,
}

impl FrameHeader {
    fn frame(&self, message: &Message, body: &str) -> String {
        let pri = priority(self.facility, message.level());
        let mut frame = if self.local {
            let ts = message.timestamp().format("%b %e %H:%M:%S");
            format!("<{pri}>{ts} {}[{}]: {body}", self.tag, self.pid)
        } else {
            let ts = message.timestamp().to_rfc3339_opts(SecondsFormat::Secs, false);
            format!("<{pri}>{ts} {} {}[{}]: {body}", self.hostname, self.tag, self.pid)
        };
        if !frame.ends_with('\n') {
            frame.push('\n');
        }
        frame
    }
}

struct SyslogWorker {
    sink: String,
    address: SyslogAddress,
    connection: Connection,
    header: FrameHeader,
    formatter: Arc<SharedFormatter>,
    metrics: Arc<SinkMetrics>,
    error_logger: RateLimitedLogger,
}

impl SyslogWorker {
    async fn run(mut self, mut receiver: mpsc::Receiver<Arc<Message>>, shutdown: CancellationToken) {
        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                message = receiver.recv() => match message {
                    Some(message) => self.send(&message).await,
                    None => break,
                },
            }
        }

        receiver.close();
        while let Ok(message) = receiver.try_recv() {
            self.send(&message).await;
        }

        tracing::info!(sink = %self.sink, "syslog sink stopped");
    }

    async fn send(&mut self, message: &Message) {
        let body = self.formatter.format(message);
        let frame = self.header.frame(message, &body);

        let first = self.connection.send(frame.as_bytes()).await;
        let result = match first {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::debug!(sink = %self.sink, error = %e, "syslog send failed, reconnecting");
                self.resend(frame.as_bytes()).await
            }
        };

        match result {
            Ok(()) => self.metrics.written(1, frame.len() as u64),
            Err(e) => {
                self.metrics.write_error();
                self.metrics.message_dropped();
                self.error_logger.error("failed to send syslog frame", &e);
            }
        }
    }

    async fn resend(&mut self, frame: &[u8]) -> std::io::Result<()> {
        self.connection = Connection::open(&self.address).await?;
        self.connection.send(frame).await
    }
}

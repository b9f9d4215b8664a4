//! File Sink - buffered, rotating, archiving log files
//!
//! One background task owns the active file and an in-memory buffer.
//! Callers only push messages into a bounded queue, so a slow disk shows up
//! as backpressure and never as a lost message while the sink is open.
//!
//! # Lifecycle
//!
//! ```text
//! write() --Arc<Message>--> [queue] --> [task] --> [buffer] --(full)--> [app-17.log]
//!                                         |
//!                                       (tick) flush, maybe rotate:
//!                                         close app-17.log
//!                                         archive app-*.log -> app-*.tgz
//!                                         open app-93.log
//!                                         sweep old *.tgz (background)
//! ```
//!
//! Rotation is only evaluated on ticks, so a file may overshoot its size
//! threshold by whatever arrives within one check interval.
//!
//! Archiving and sweeping only touch files of the sink's own naming family,
//! so several sinks can share a directory.
//!
//! # Directory Structure
//!
//! ```text
//! logs/
//! ├── app-93.log   # active
//! ├── app-17.tgz   # archived, single tar entry app-17.log
//! └── app-5.tgz
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::{BufMut, BytesMut};
use fanlog_protocol::{Formatter, Level, Message};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::common::{MetricsSnapshot, SharedFormatter, Sink, SinkError, SinkMetrics, TaskLifecycle};
use crate::util::{ArchiveError, Archiver, NamingPolicy, RateLimitedLogger, SweepPolicy, Sweeper};

/// Default size threshold for size rotation (50 MiB)
pub const DEFAULT_ROTATE_SIZE: u64 = 50 << 20;

/// Default period for duration rotation
pub const DEFAULT_ROTATE_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Default number of archives kept
pub const DEFAULT_SWEEP_COUNT: usize = 5;

/// Default maximum archive age
pub const DEFAULT_SWEEP_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default buffer size (2 KiB)
pub const DEFAULT_BUFFER_SIZE: usize = 2 << 10;

/// Default queue capacity
pub const DEFAULT_QUEUE_SIZE: usize = 8;

/// Default rotation check period
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Default time `close` waits for the task to drain
pub const DEFAULT_CLOSE_GRACE: Duration = Duration::from_secs(1);

/// When to start a new file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotatePolicy {
    /// Once the active file holds at least this many bytes
    BySize(u64),
    /// Once this much time has elapsed since the last rotation
    ByDuration(Duration),
}

impl Default for RotatePolicy {
    fn default() -> Self {
        Self::ByDuration(DEFAULT_ROTATE_DURATION)
    }
}

/// Configuration for the file sink
#[derive(Debug, Clone)]
pub struct FileConfig {
    /// Directory for the active file and archives (created if missing)
    pub path: PathBuf,

    /// Severity threshold
    pub level: Level,

    /// Filename pattern with at most one `*`; `None` uses the default scheme
    pub pattern: Option<String>,

    /// Binary name for the default scheme; `None` uses the executable name
    pub binary_name: Option<String>,

    /// Rotation policy
    pub rotate_policy: RotatePolicy,

    /// Archive retention
    pub sweep_policy: SweepPolicy,

    /// Also sweep default-scheme archives when a pattern is set
    pub sweep_default_family: bool,

    /// Buffer size before a write to disk
    pub buffer_size: usize,

    /// Queue capacity
    pub queue_size: usize,

    /// Rotation check period
    pub check_interval: Duration,

    /// Time `close` waits for the task to drain
    pub close_grace: Duration,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            level: Level::Debug,
            pattern: None,
            binary_name: None,
            rotate_policy: RotatePolicy::default(),
            sweep_policy: SweepPolicy::ByCount(DEFAULT_SWEEP_COUNT),
            sweep_default_family: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
            queue_size: DEFAULT_QUEUE_SIZE,
            check_interval: DEFAULT_CHECK_INTERVAL,
            close_grace: DEFAULT_CLOSE_GRACE,
        }
    }
}

impl FileConfig {
    /// Config writing into `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Set the severity threshold
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Use a filename pattern
    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Override the binary name of the default scheme
    #[must_use]
    pub fn with_binary_name(mut self, name: impl Into<String>) -> Self {
        self.binary_name = Some(name.into());
        self
    }

    /// Rotate by size
    #[must_use]
    pub fn with_rotate_size(mut self, bytes: u64) -> Self {
        self.rotate_policy = RotatePolicy::BySize(bytes);
        self
    }

    /// Rotate by elapsed time
    #[must_use]
    pub fn with_rotate_duration(mut self, duration: Duration) -> Self {
        self.rotate_policy = RotatePolicy::ByDuration(duration);
        self
    }

    /// Keep the newest `count` archives
    #[must_use]
    pub fn with_sweep_count(mut self, count: usize) -> Self {
        self.sweep_policy = SweepPolicy::ByCount(count);
        self
    }

    /// Delete archives older than `age`
    #[must_use]
    pub fn with_sweep_age(mut self, age: Duration) -> Self {
        self.sweep_policy = SweepPolicy::ByAge(age);
        self
    }

    /// Include default-scheme archives in sweeps
    #[must_use]
    pub fn with_sweep_default_family(mut self, include: bool) -> Self {
        self.sweep_default_family = include;
        self
    }

    /// Set the buffer size
    #[must_use]
    pub fn with_buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = bytes;
        self
    }

    /// Set the queue capacity
    #[must_use]
    pub fn with_queue_size(mut self, size: usize) -> Self {
        self.queue_size = size;
        self
    }

    /// Set the rotation check period
    #[must_use]
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Set the close grace period
    #[must_use]
    pub fn with_close_grace(mut self, grace: Duration) -> Self {
        self.close_grace = grace;
        self
    }

    fn naming(&self) -> Result<NamingPolicy, SinkError> {
        let pattern = self.pattern.as_deref();
        let naming = match &self.binary_name {
            Some(binary) => NamingPolicy::new(binary.clone(), pattern)?,
            None => NamingPolicy::for_current_binary(pattern)?,
        };
        Ok(naming)
    }
}

/// Metrics for the file sink
#[derive(Debug, Default)]
pub struct FileSinkMetrics {
    /// Message and write counters
    pub sink: SinkMetrics,

    /// Files opened (including the first)
    pub rotations: AtomicU64,

    /// Archives written
    pub archives_created: AtomicU64,

    /// Files that failed to archive
    pub archive_failures: AtomicU64,

    /// Archives deleted by sweeps
    pub files_swept: AtomicU64,
}

impl FileSinkMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            sink: SinkMetrics::new(),
            rotations: AtomicU64::new(0),
            archives_created: AtomicU64::new(0),
            archive_failures: AtomicU64::new(0),
            files_swept: AtomicU64::new(0),
        }
    }

    /// Get snapshot of metrics
    pub fn snapshot(&self) -> FileMetricsSnapshot {
        FileMetricsSnapshot {
            sink: self.sink.snapshot(),
            rotations: self.rotations.load(Ordering::Relaxed),
            archives_created: self.archives_created.load(Ordering::Relaxed),
            archive_failures: self.archive_failures.load(Ordering::Relaxed),
            files_swept: self.files_swept.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of file sink metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileMetricsSnapshot {
    pub sink: MetricsSnapshot,
    pub rotations: u64,
    pub archives_created: u64,
    pub archive_failures: u64,
    pub files_swept: u64,
}

/// Rotating file sink
pub struct FileSink {
    name: String,
    level: Level,
    dir: PathBuf,
    sender: mpsc::Sender<Arc<Message>>,
    formatter: Arc<SharedFormatter>,
    metrics: Arc<FileSinkMetrics>,
    current: Arc<Mutex<Option<PathBuf>>>,
    lifecycle: TaskLifecycle,
}

impl FileSink {
    /// Open a file sink named "file"
    pub async fn open(config: FileConfig) -> Result<Self, SinkError> {
        Self::open_named("file", config).await
    }

    /// Open a file sink with a custom name
    ///
    /// Returns once the first file is open. Failing to create the directory
    /// or the first file fails construction.
    pub async fn open_named(name: impl Into<String>, config: FileConfig) -> Result<Self, SinkError> {
        let name = name.into();
        if config.queue_size == 0 || config.buffer_size == 0 || config.check_interval.is_zero() {
            return Err(SinkError::config(
                "queue_size, buffer_size and check_interval must be greater than 0",
            ));
        }

        let dir = if config.path.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            config.path.clone()
        };
        fs::create_dir_all(&dir)?;

        let naming = Arc::new(config.naming()?);
        let formatter = Arc::new(SharedFormatter::default());
        let metrics = Arc::new(FileSinkMetrics::new());
        let current = Arc::new(Mutex::new(None));
        let shutdown = CancellationToken::new();

        let mut worker = FileWorker {
            sink: name.clone(),
            dir: dir.clone(),
            archiver: Archiver::new(&dir).with_naming(Arc::clone(&naming)),
            sweeper: Sweeper::new(&dir, Arc::clone(&naming), config.sweep_policy)
                .with_default_family(config.sweep_default_family),
            naming,
            rotate_policy: config.rotate_policy,
            check_interval: config.check_interval,
            buffer: BytesMut::with_capacity(config.buffer_size),
            buffer_size: config.buffer_size,
            buffered_lines: 0,
            file: None,
            file_size: 0,
            elapsed: Duration::ZERO,
            formatter: Arc::clone(&formatter),
            metrics: Arc::clone(&metrics),
            current: Arc::clone(&current),
            error_logger: RateLimitedLogger::for_sink(name.clone()),
            shutdown: shutdown.clone(),
        };
        worker.rotate().await?;

        let (sender, receiver) = mpsc::channel(config.queue_size);
        let task = tokio::spawn(worker.run(receiver));

        tracing::info!(
            sink = %name,
            dir = %dir.display(),
            rotate = ?config.rotate_policy,
            sweep = ?config.sweep_policy,
            "file sink opened"
        );

        Ok(Self {
            name,
            level: config.level,
            dir,
            sender,
            formatter,
            metrics,
            current,
            lifecycle: TaskLifecycle::new(shutdown, task, config.close_grace),
        })
    }

    /// Directory holding the active file
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the active file
    pub fn current_file(&self) -> Option<PathBuf> {
        self.current.lock().clone()
    }

    /// Get reference to metrics
    pub fn metrics(&self) -> &FileSinkMetrics {
        &self.metrics
    }

    /// Shared handle to the metrics
    pub fn metrics_handle(&self) -> Arc<FileSinkMetrics> {
        Arc::clone(&self.metrics)
    }
}

#[async_trait]
impl Sink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn level(&self) -> Level {
        self.level
    }

    async fn write(&self, message: Arc<Message>) {
        if self.lifecycle.is_closed() {
            self.metrics.sink.message_dropped();
            return;
        }

        self.metrics.sink.message_received();
        if self.sender.send(message).await.is_err() {
            self.metrics.sink.message_dropped();
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

// =============================================================================
// Background task
// =============================================================================

/// Sole owner of the active file and the buffer
struct FileWorker {
    sink: String,
    dir: PathBuf,
    naming: Arc<NamingPolicy>,
    archiver: Archiver,
    sweeper: Sweeper,
    rotate_policy: RotatePolicy,
    check_interval: Duration,
    buffer: BytesMut,
    buffer_size: usize,
    buffered_lines: u64,
    file: Option<File>,
    /// Bytes written to the active file
    file_size: u64,
    /// Time since the last rotation, advanced per tick
    elapsed: Duration,
    formatter: Arc<SharedFormatter>,
    metrics: Arc<FileSinkMetrics>,
    current: Arc<Mutex<Option<PathBuf>>>,
    error_logger: RateLimitedLogger,
    shutdown: CancellationToken,
}

impl FileWorker {
    async fn run(mut self, mut receiver: mpsc::Receiver<Arc<Message>>) {
        let shutdown = self.shutdown.clone();
        let mut ticker =
            tokio::time::interval_at(Instant::now() + self.check_interval, self.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                message = receiver.recv() => match message {
                    Some(message) => self.append(&message),
                    None => break,
                },

                _ = ticker.tick() => self.on_tick().await,
            }
        }

        // Drain what was queued before close
        receiver.close();
        while let Ok(message) = receiver.try_recv() {
            self.append(&message);
        }
        self.write_buffer();
        self.close_file();

        tracing::info!(sink = %self.sink, "file sink stopped");
    }

    /// Format and buffer one message, writing the buffer out first if full
    fn append(&mut self, message: &Message) {
        let line = self.formatter.format(message);
        if self.buffer.len() + line.len() >= self.buffer_size {
            self.write_buffer();
        }
        self.buffer.put_slice(line.as_bytes());
        self.buffer.put_u8(b'\n');
        self.buffered_lines += 1;
    }

    /// Write the buffer to the active file; the buffer is cleared either way
    fn write_buffer(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let result = match self.file.as_mut() {
            Some(file) => file.write_all(&self.buffer),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no active log file")),
        };

        match result {
            Ok(()) => {
                let bytes = self.buffer.len() as u64;
                self.file_size += bytes;
                self.metrics.sink.written(self.buffered_lines, bytes);
            }
            Err(e) => {
                self.metrics.sink.write_error();
                self.error_logger.error("failed to write log file", &e);
            }
        }

        self.buffer.clear();
        self.buffered_lines = 0;
    }

    async fn on_tick(&mut self) {
        self.write_buffer();
        self.elapsed += self.check_interval;

        if !self.should_rotate() {
            return;
        }

        if let Err(e) = self.rotate().await {
            self.error_logger.error("failed to open log file", &e);
        }
        self.elapsed = Duration::ZERO;
        self.spawn_sweep();
    }

    fn should_rotate(&self) -> bool {
        if self.file.is_none() {
            return true;
        }
        match self.rotate_policy {
            RotatePolicy::BySize(threshold) => self.file_size >= threshold,
            RotatePolicy::ByDuration(period) => self.elapsed >= period,
        }
    }

    /// Close the active file, archive closed files, open the next file
    async fn rotate(&mut self) -> Result<(), SinkError> {
        self.write_buffer();
        self.close_file();

        let archive_error = self.archive().await;

        self.file_size = 0;
        let filename = self
            .naming
            .next_filename(&self.dir)
            .unwrap_or_else(|| self.naming.default_filename());
        let path = self.dir.join(&filename);

        let file = open_append(&path)?;
        self.file = Some(file);
        *self.current.lock() = Some(path.clone());
        self.metrics.rotations.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(sink = %self.sink, file = %path.display(), "log file opened");

        if let Some(e) = archive_error {
            self.append(&Message::new(Level::Error, e));
        }

        Ok(())
    }

    /// Archive every closed log; returns a description of any failure
    ///
    /// Returns early on shutdown; the pass then finishes on the blocking pool.
    async fn archive(&self) -> Option<String> {
        let archiver = self.archiver.clone();
        let task = tokio::task::spawn_blocking(move || archiver.archive(None));

        let outcome = tokio::select! {
            outcome = task => outcome,
            _ = self.shutdown.cancelled() => {
                tracing::debug!(sink = %self.sink, "closing during archive, leaving it to finish");
                return None;
            }
        };

        match outcome {
            Ok(Ok(report)) => {
                self.record_archived(report.archived.len());
                None
            }
            Ok(Err(e)) => {
                self.record_archive_error(&e);
                Some(e.to_string())
            }
            Err(e) => {
                tracing::error!(sink = %self.sink, error = %e, "archive task failed");
                Some(format!("archive task failed: {e}"))
            }
        }
    }

    fn record_archived(&self, count: usize) {
        if count > 0 {
            self.metrics.archives_created.fetch_add(count as u64, Ordering::Relaxed);
            tracing::debug!(sink = %self.sink, archives = count, "logs archived");
        }
    }

    fn record_archive_error(&self, e: &ArchiveError) {
        self.record_archived(e.archived.len());
        self.metrics
            .archive_failures
            .fetch_add(e.failures.len() as u64, Ordering::Relaxed);
        tracing::error!(sink = %self.sink, error = %e, "failed to archive logs");
    }

    fn close_file(&mut self) {
        if let Some(mut file) = self.file.take() {
            if let Err(e) = file.flush().and_then(|()| file.sync_all()) {
                self.metrics.sink.write_error();
                self.error_logger.error("failed to sync log file", &e);
            }
        }
    }

    /// Fire-and-forget sweep on the blocking pool
    fn spawn_sweep(&self) {
        let sweeper = self.sweeper.clone();
        let metrics = Arc::clone(&self.metrics);
        let sink = self.sink.clone();

        tokio::task::spawn_blocking(move || {
            let report = sweeper.sweep();
            metrics
                .files_swept
                .fetch_add(report.removed.len() as u64, Ordering::Relaxed);
            if !report.removed.is_empty() {
                tracing::debug!(sink = %sink, removed = report.removed.len(), "archives swept");
            }
            for (path, e) in &report.failures {
                tracing::warn!(sink = %sink, file = %path.display(), error = %e, "failed to remove archive");
            }
        });
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o660);
    }
    options.open(path)
}

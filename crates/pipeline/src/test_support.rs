//! Sinks for pipeline tests

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use fanlog_protocol::{Formatter, Level, Message};
use fanlog_sinks::{Sink, SinkError};
use parking_lot::Mutex;

/// Records every message it receives
pub struct CaptureSink {
    name: String,
    level: Level,
    formatter_swaps: bool,
    messages: Mutex<Vec<Arc<Message>>>,
    closes: AtomicUsize,
}

impl CaptureSink {
    pub fn new(name: &str, level: Level) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            level,
            formatter_swaps: true,
            messages: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
        })
    }

    pub fn fixed_format(name: &str, level: Level) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            level,
            formatter_swaps: false,
            messages: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
        })
    }

    pub fn messages(&self) -> Vec<Arc<Message>> {
        self.messages.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.messages.lock().iter().map(|m| m.text().to_string()).collect()
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Sink for CaptureSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn level(&self) -> Level {
        self.level
    }

    async fn write(&self, message: Arc<Message>) {
        self.messages.lock().push(message);
    }

    async fn close(&self) -> Result<(), SinkError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn set_formatter(&self, _formatter: Box<dyn Formatter>) -> bool {
        self.formatter_swaps
    }
}

/// Sink whose close always fails
pub struct FailingSink(pub &'static str);

#[async_trait]
impl Sink for FailingSink {
    fn name(&self) -> &str {
        self.0
    }

    fn level(&self) -> Level {
        Level::Trace
    }

    async fn write(&self, _message: Arc<Message>) {}

    async fn close(&self) -> Result<(), SinkError> {
        Err(SinkError::init("disk gone"))
    }
}

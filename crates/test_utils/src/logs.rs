//! Log capture for asserting on emitted events

use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::subscriber::DefaultGuard;
use tracing::Level;
use tracing_subscriber::util::SubscriberInitExt;

/// In-memory sink for formatted log lines
///
/// The subscriber is installed for the current thread only, so use it from
/// a current-thread runtime.
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    /// Captures `WARN` and above until the guard is dropped
    pub fn install(&self) -> DefaultGuard {
        let sink = self.clone();
        tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .with_max_level(Level::WARN)
            .finish()
            .set_default()
    }

    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    /// Number of captured lines at `level`
    pub fn count(&self, level: Level) -> usize {
        let marker = level.as_str();
        self.contents()
            .lines()
            .filter(|line| line.split_whitespace().any(|word| word == marker))
            .count()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

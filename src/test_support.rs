use std::{
    io,
    sync::{Arc, Mutex},
};

use tracing::subscriber::DefaultGuard;

/// In-memory sink for log lines written by a test subscriber.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Installs a plain-text subscriber for the current thread until the guard
/// is dropped.
pub fn install_log_capture() -> (CapturedLogs, DefaultGuard) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();

    let guard = tracing::subscriber::set_default(subscriber);
    (logs, guard)
}

/// Runs `f` with log capture installed and returns what it logged.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let (logs, guard) = install_log_capture();
    let result = f();
    drop(guard);
    (result, logs.contents())
}

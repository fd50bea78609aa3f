//! Diagnostic logger that mirrors messages to the backend's `/log` endpoint.
//!
//! Every message goes to the local log first. Delivery to the backend is best
//! effort: [`RemoteLogger::log`] never blocks and never fails, while
//! [`RemoteLogger::send`] reports the outcome for callers that track it.

use std::sync::Arc;
use std::thread;

use crate::api::{ApiError, Backend};

/// Fire-and-forget logger backed by the labeling backend.
#[derive(Clone)]
pub struct RemoteLogger {
    backend: Arc<dyn Backend>,
}

impl RemoteLogger {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Log locally and post the message on a background thread.
    ///
    /// This is the untracked entry point used for session diagnostics; wizard
    /// effects go through [`RemoteLogger::send`]. Delivery failures are only
    /// reported to the local log.
    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{}", message);

        let backend = Arc::clone(&self.backend);
        let spawned = thread::Builder::new()
            .name("remote-log".to_string())
            .spawn(move || {
                if let Err(e) = backend.send_log(&message) {
                    log::warn!("log failed: {}", e);
                }
            });
        if let Err(e) = spawned {
            log::warn!("log failed: could not spawn sender: {}", e);
        }
    }

    /// Log locally and post the message, returning the delivery result.
    pub fn send(&self, message: &str) -> Result<(), ApiError> {
        log::info!("{}", message);
        self.backend.send_log(message).inspect_err(|e| {
            log::warn!("log failed: {}", e);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::mpsc;
    use std::time::Duration;

    use crate::model::{LabelAssignments, SavedLabel, ShelfImage};

    /// Backend that records log lines and optionally fails.
    struct LogSink {
        fail: bool,
        lines: Mutex<Vec<String>>,
        notify: Mutex<Option<mpsc::Sender<()>>>,
    }

    impl LogSink {
        fn new(fail: bool) -> Self {
            Self {
                fail,
                lines: Mutex::new(Vec::new()),
                notify: Mutex::new(None),
            }
        }
    }

    impl Backend for LogSink {
        fn upload_image(&self, _: &str, _: Vec<u8>, _: u32) -> Result<ShelfImage, ApiError> {
            Err(ApiError::Transport("unused".to_string()))
        }

        fn save_labels(&self, _: &LabelAssignments) -> Result<(), ApiError> {
            Ok(())
        }

        fn send_log(&self, message: &str) -> Result<(), ApiError> {
            self.lines.lock().unwrap().push(message.to_string());
            if let Some(tx) = self.notify.lock().unwrap().as_ref() {
                let _ = tx.send(());
            }
            if self.fail {
                Err(ApiError::Transport("connection refused".to_string()))
            } else {
                Ok(())
            }
        }

        fn saved_labels(&self) -> Result<Vec<SavedLabel>, ApiError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_send_reports_failure() {
        let sink = Arc::new(LogSink::new(true));
        let logger = RemoteLogger::new(sink.clone());
        assert!(logger.send("Saving labels").is_err());
        assert_eq!(sink.lines.lock().unwrap().as_slice(), ["Saving labels"]);
    }

    #[test]
    fn test_send_success() {
        let sink = Arc::new(LogSink::new(false));
        let logger = RemoteLogger::new(sink);
        assert_eq!(logger.send("Uploading image"), Ok(()));
    }

    #[test]
    fn test_log_swallows_failure_and_posts_in_background() {
        let sink = Arc::new(LogSink::new(true));
        let (tx, rx) = mpsc::channel();
        *sink.notify.lock().unwrap() = Some(tx);

        let logger = RemoteLogger::new(sink.clone());
        logger.log("Received 3 products");

        rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(sink.lines.lock().unwrap().as_slice(), ["Received 3 products"]);
    }
}

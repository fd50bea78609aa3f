//! Effect runtime and event loop plumbing.
//!
//! The application runs a single event loop fed by one channel. User input and
//! effect results both arrive on it as [`Event`]s. Each effect runs on its own
//! background thread, so several uploads can be in flight at once; the wizard's
//! request generations decide which result is applied.

use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use web_time::Instant;

use crate::api::{ApiError, Backend};
use crate::logger::RemoteLogger;
use crate::model::ShelfImage;
use crate::wizard::{Effect, Message, SelectedFile};

/// Something the event loop has to handle.
#[derive(Debug, Clone)]
pub enum Event {
    /// A line typed by the user
    Input(String),
    /// The input stream ended
    InputClosed,
    /// A result produced by an effect
    Message(Message),
}

/// Create the event loop channel.
pub fn event_channel() -> (Sender<Event>, Receiver<Event>) {
    mpsc::channel()
}

/// Runs wizard effects on background threads.
pub struct EffectRunner {
    backend: Arc<dyn Backend>,
    logger: RemoteLogger,
    events: Sender<Event>,
}

impl EffectRunner {
    pub fn new(backend: Arc<dyn Backend>, events: Sender<Event>) -> Self {
        Self {
            logger: RemoteLogger::new(Arc::clone(&backend)),
            backend,
            events,
        }
    }

    /// Start every effect; results come back as [`Event::Message`].
    pub fn run_all(&self, effects: Vec<Effect>) {
        for effect in effects {
            self.run(effect);
        }
    }

    /// Start one effect.
    pub fn run(&self, effect: Effect) {
        match effect {
            Effect::Upload {
                generation,
                file,
                clusters,
            } => {
                let backend = Arc::clone(&self.backend);
                self.spawn(format!("upload-{generation}"), move || {
                    let started = Instant::now();
                    let result = upload_file(backend.as_ref(), &file, clusters);
                    log::debug!(
                        "Upload #{} finished in {:?} (ok: {})",
                        generation,
                        started.elapsed(),
                        result.is_ok()
                    );
                    Message::UploadFinished {
                        generation,
                        clusters,
                        result,
                    }
                });
            }
            Effect::SaveLabels(labels) => {
                let backend = Arc::clone(&self.backend);
                self.spawn("save-labels".to_string(), move || {
                    Message::SaveFinished(backend.save_labels(&labels))
                });
            }
            Effect::FetchSavedLabels => {
                let backend = Arc::clone(&self.backend);
                self.spawn("saved-labels".to_string(), move || {
                    Message::SavedLabelsLoaded(backend.saved_labels())
                });
            }
            Effect::Log(line) => {
                let logger = self.logger.clone();
                self.spawn("remote-log".to_string(), move || {
                    Message::LogDelivered(logger.send(&line))
                });
            }
        }
    }

    /// Run `task` on a named thread and post its message to the event loop.
    fn spawn<F>(&self, name: String, task: F)
    where
        F: FnOnce() -> Message + Send + 'static,
    {
        let events = self.events.clone();
        let spawned = thread::Builder::new().name(name.clone()).spawn(move || {
            let message = task();
            if events.send(Event::Message(message)).is_err() {
                log::debug!("Event loop gone, dropping result");
            }
        });
        if let Err(e) = spawned {
            log::error!("Failed to spawn {} thread: {}", name, e);
        }
    }
}

/// Read an image from disk and upload it.
fn upload_file(backend: &dyn Backend, path: &Path, clusters: u32) -> Result<ShelfImage, ApiError> {
    let data = std::fs::read(path)?;
    let file_name = SelectedFile::new(path).file_name();
    backend.upload_image(&file_name, data, clusters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::model::{BoundingBox, Cluster, Detection, LabelAssignments, SavedLabel};

    #[derive(Default)]
    struct FakeBackend {
        uploads: Mutex<Vec<(String, usize, u32)>>,
        saved: Mutex<Vec<LabelAssignments>>,
    }

    impl Backend for FakeBackend {
        fn upload_image(
            &self,
            file_name: &str,
            data: Vec<u8>,
            clusters: u32,
        ) -> Result<ShelfImage, ApiError> {
            self.uploads
                .lock()
                .unwrap()
                .push((file_name.to_string(), data.len(), clusters));
            Ok(ShelfImage {
                image: "aGk=".to_string(),
                width: 100,
                height: 100,
                detections: vec![Detection::new(1, BoundingBox::new(0.0, 0.0, 10.0, 10.0))],
                clusters: vec![Cluster::new(1, "aGk=")],
            })
        }

        fn save_labels(&self, labels: &LabelAssignments) -> Result<(), ApiError> {
            self.saved.lock().unwrap().push(labels.clone());
            Ok(())
        }

        fn send_log(&self, _message: &str) -> Result<(), ApiError> {
            Err(ApiError::Transport("no log sink".to_string()))
        }

        fn saved_labels(&self) -> Result<Vec<SavedLabel>, ApiError> {
            Ok(Vec::new())
        }
    }

    fn next_message(rx: &Receiver<Event>) -> Message {
        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            Event::Message(message) => message,
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_upload_reads_file_and_reports_generation() {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(b"jpeg bytes").unwrap();

        let backend = Arc::new(FakeBackend::default());
        let (tx, rx) = event_channel();
        let runner = EffectRunner::new(backend.clone(), tx);

        runner.run(Effect::Upload {
            generation: 7,
            file: file.path().to_path_buf(),
            clusters: 12,
        });

        match next_message(&rx) {
            Message::UploadFinished {
                generation,
                clusters,
                result,
            } => {
                assert_eq!(generation, 7);
                assert_eq!(clusters, 12);
                assert!(result.is_ok());
            }
            other => panic!("unexpected message {other:?}"),
        }
        let uploads = backend.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].1, 10);
        assert_eq!(uploads[0].2, 12);
        assert!(uploads[0].0.ends_with(".jpg"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let backend = Arc::new(FakeBackend::default());
        let (tx, rx) = event_channel();
        let runner = EffectRunner::new(backend.clone(), tx);

        runner.run(Effect::Upload {
            generation: 1,
            file: "/definitely/not/here.jpg".into(),
            clusters: 10,
        });

        match next_message(&rx) {
            Message::UploadFinished { result, .. } => {
                assert!(matches!(result, Err(ApiError::Io(_))));
            }
            other => panic!("unexpected message {other:?}"),
        }
        assert!(backend.uploads.lock().unwrap().is_empty());
    }

    #[test]
    fn test_log_failure_reported_as_message() {
        let backend = Arc::new(FakeBackend::default());
        let (tx, rx) = event_channel();
        let runner = EffectRunner::new(backend, tx);

        runner.run(Effect::log("Saving labels"));
        assert!(matches!(next_message(&rx), Message::LogDelivered(Err(_))));
    }

    #[test]
    fn test_save_posts_labels() {
        let backend = Arc::new(FakeBackend::default());
        let (tx, rx) = event_channel();
        let runner = EffectRunner::new(backend.clone(), tx);

        let mut labels = LabelAssignments::new();
        labels.assign(1, "Coca-Cola Can");
        runner.run(Effect::SaveLabels(labels.clone()));

        assert!(matches!(next_message(&rx), Message::SaveFinished(Ok(()))));
        assert_eq!(backend.saved.lock().unwrap().as_slice(), [labels]);
    }
}

//! Shelf labeler application.
//!
//! Owns the wizard state and drives the event loop:
//! - input lines are parsed into commands and dispatched
//! - wizard effects run on background threads and come back as messages
//! - the overlay view is re-measured whenever a new shelf image is applied

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use thiserror::Error;

use crate::api::Backend;
use crate::commands::Command;
use crate::config::AppConfig;
use crate::logger::RemoteLogger;
use crate::overlay::{
    ColorResolver, OverlayBox, OverlayView, RenderError, natural_size, render_overlay, save_png,
};
use crate::runtime::{EffectRunner, Event, event_channel};
use crate::views::{self, ViewContext};
use crate::wizard::{Message, WizardState};

/// Extensions offered by the file picker.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "webp"];

/// Errors that end the application.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Whether the event loop keeps going after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// The labeler front end, writing its views to `W`.
pub struct LabelerApp<W: Write> {
    config: AppConfig,
    state: WizardState,
    runner: EffectRunner,
    logger: RemoteLogger,
    overlay: OverlayView,
    /// Applied upload generation the overlay was last measured for
    measured_generation: Option<u64>,
    events: Sender<Event>,
    receiver: Receiver<Event>,
    out: W,
}

impl LabelerApp<io::Stdout> {
    /// Application writing to standard output.
    pub fn stdout(config: AppConfig, backend: Arc<dyn Backend>) -> Self {
        Self::new(config, backend, io::stdout())
    }
}

impl<W: Write> LabelerApp<W> {
    pub fn new(config: AppConfig, backend: Arc<dyn Backend>, out: W) -> Self {
        let (events, receiver) = event_channel();
        let state = WizardState::new(
            config.labels.options(),
            config.preferences.default_cluster_count,
        );
        Self {
            overlay: OverlayView::new(config.preferences.display_width),
            logger: RemoteLogger::new(Arc::clone(&backend)),
            runner: EffectRunner::new(backend, events.clone()),
            config,
            state,
            measured_generation: None,
            events,
            receiver,
            out,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    /// Preselect an image in step 1.
    pub fn select_file(&mut self, path: PathBuf) {
        self.dispatch(Message::SelectFile(path));
    }

    /// Read commands from standard input until `quit` or end of input.
    pub fn run(mut self) -> Result<(), AppError> {
        spawn_input_reader(self.events.clone())?;
        self.logger.log("Labeling session started");
        self.render()?;
        self.prompt()?;

        while let Ok(event) = self.receiver.recv() {
            if self.handle_event(event)? == Flow::Quit {
                break;
            }
        }

        let undelivered = self.state.undelivered_logs();
        if undelivered > 0 {
            log::warn!("{} diagnostic lines were not delivered to the server", undelivered);
        }
        self.logger.log("Labeling session ended");
        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> Result<Flow, AppError> {
        match event {
            Event::Input(line) => {
                let flow = self.handle_input(&line)?;
                if flow == Flow::Continue {
                    self.prompt()?;
                }
                Ok(flow)
            }
            Event::InputClosed => Ok(Flow::Quit),
            Event::Message(message) => {
                let redraw = !matches!(message, Message::LogDelivered(_));
                self.dispatch(message);
                if redraw {
                    writeln!(self.out)?;
                    self.render()?;
                    self.prompt()?;
                }
                Ok(Flow::Continue)
            }
        }
    }

    /// Apply a wizard message and start its effects.
    pub fn dispatch(&mut self, message: Message) {
        let effects = self.state.update(message);
        self.runner.run_all(effects);
        self.sync_overlay();
    }

    /// Keep the overlay measurement in step with the current shelf image.
    fn sync_overlay(&mut self) {
        let Some(shelf) = self.state.shelf() else {
            if self.measured_generation.take().is_some() {
                self.overlay.clear();
            }
            return;
        };
        let generation = self.state.applied_generation();
        if self.measured_generation == generation {
            return;
        }
        let natural = natural_size(&shelf.image).unwrap_or_else(|e| {
            log::warn!(
                "Could not measure shelf image ({}), using reported {}x{}",
                e,
                shelf.width,
                shelf.height
            );
            (shelf.width, shelf.height)
        });
        self.overlay.image_loaded(natural);
        self.measured_generation = generation;
    }

    fn handle_input(&mut self, line: &str) -> Result<Flow, AppError> {
        let command = match Command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(Flow::Continue),
            Err(e) => {
                writeln!(self.out, "{e}")?;
                return Ok(Flow::Continue);
            }
        };
        self.handle_command(command)
    }

    fn handle_command(&mut self, command: Command) -> Result<Flow, AppError> {
        match command {
            Command::Wizard(message) => {
                self.dispatch(message);
                self.render()?;
            }
            Command::PickFile => match pick_image() {
                Some(path) => {
                    self.dispatch(Message::SelectFile(path));
                    self.render()?;
                }
                None => writeln!(self.out, "No file selected")?,
            },
            Command::ShowLabels => {
                let text = views::view_label_options(self.state.options());
                write!(self.out, "{text}")?;
            }
            Command::Resize { width, height } => {
                self.overlay.resize(width, height);
                let boxes = self.overlay_boxes();
                let text = views::view_overlay(&boxes, self.overlay.rendered());
                write!(self.out, "{text}")?;
            }
            Command::ExportOverlay(path) => {
                let path = self.config.preferences.export_path(&path);
                match self.export_overlay(&path) {
                    Ok(()) => writeln!(self.out, "Overlay written to {}", path.display())?,
                    Err(e) => writeln!(self.out, "Export failed: {e}")?,
                }
            }
            Command::ExportCrops(dir) => {
                let dir = self.config.preferences.export_path(&dir);
                match self.export_crops(&dir) {
                    Ok(n) => writeln!(self.out, "{} crops written to {}", n, dir.display())?,
                    Err(e) => writeln!(self.out, "Export failed: {e}")?,
                }
            }
            Command::Show => self.render()?,
            Command::Help => write!(self.out, "{}", views::view_help())?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Overlay boxes for the current shelf at the current rendered size.
    fn overlay_boxes(&self) -> Vec<OverlayBox> {
        let Some(shelf) = self.state.shelf() else {
            return Vec::new();
        };
        let labels = &self.config.labels;
        let colors = views::box_colors(&self.state, &labels.palette, labels.fallback_color);
        let resolver = ColorResolver::new(&colors).with_fallback(labels.fallback_color);
        self.overlay
            .layout(&shelf.detections, (shelf.width, shelf.height), &resolver)
    }

    fn export_overlay(&self, path: &Path) -> Result<(), RenderError> {
        let (Some(shelf), Some(rendered)) = (self.state.shelf(), self.overlay.rendered()) else {
            return Err(RenderError::NoImage);
        };
        let canvas = render_overlay(&shelf.image, &self.overlay_boxes(), rendered)?;
        save_png(&canvas, path)
    }

    /// Write each cluster crop as `cluster-<id>.jpg`.
    fn export_crops(&self, dir: &Path) -> Result<usize, RenderError> {
        let shelf = self.state.shelf().ok_or(RenderError::NoImage)?;
        std::fs::create_dir_all(dir)?;
        for cluster in &shelf.clusters {
            let path = dir.join(format!("cluster-{}.jpg", cluster.cluster_id));
            std::fs::write(&path, cluster.crop_bytes()?)?;
            log::debug!("Wrote crop {:?}", path);
        }
        log::info!("Exported {} crops to {:?}", shelf.clusters.len(), dir);
        Ok(shelf.clusters.len())
    }

    fn render(&mut self) -> Result<(), AppError> {
        let boxes = self.overlay_boxes();
        let labels = &self.config.labels;
        let text = views::view(&ViewContext {
            state: &self.state,
            boxes: &boxes,
            rendered: self.overlay.rendered(),
            palette: &labels.palette,
            fallback: labels.fallback_color,
        });
        write!(self.out, "{text}")?;
        Ok(())
    }

    fn prompt(&mut self) -> Result<(), AppError> {
        write!(self.out, "> ")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Show the native file picker for a shelf image.
fn pick_image() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Select shelf image")
        .add_filter("Images", IMAGE_EXTENSIONS)
        .pick_file()
}

/// Forward standard input lines to the event loop.
fn spawn_input_reader(events: Sender<Event>) -> io::Result<()> {
    thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if events.send(Event::Input(line)).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        log::error!("Failed to read input: {}", e);
                        break;
                    }
                }
            }
            let _ = events.send(Event::InputClosed);
        })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor as IoCursor;
    use std::sync::Mutex;
    use std::time::Duration;

    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use image::{Rgba, RgbaImage};

    use crate::api::ApiError;
    use crate::model::{
        BoundingBox, Cluster, Detection, LabelAssignments, SavedLabel, ShelfImage,
    };
    use crate::wizard::Step;

    fn png_base64(width: u32, height: u32) -> String {
        let img = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut IoCursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        STANDARD.encode(bytes)
    }

    struct ShelfBackend {
        shelf: ShelfImage,
        saved: Mutex<Vec<LabelAssignments>>,
    }

    impl ShelfBackend {
        fn new() -> Self {
            Self {
                shelf: ShelfImage {
                    image: png_base64(200, 100),
                    width: 200,
                    height: 100,
                    detections: vec![
                        Detection::new(1, BoundingBox::new(20.0, 20.0, 60.0, 80.0)),
                        Detection::new(2, BoundingBox::new(100.0, 10.0, 140.0, 90.0)),
                        Detection::new(1, BoundingBox::new(150.0, 20.0, 190.0, 80.0)),
                    ],
                    clusters: vec![Cluster::new(1, png_base64(4, 4)), Cluster::new(2, png_base64(4, 4))],
                },
                saved: Mutex::new(Vec::new()),
            }
        }
    }

    impl Backend for ShelfBackend {
        /// Counts above the default return a wider photo of the same shelf.
        fn upload_image(&self, _: &str, _: Vec<u8>, clusters: u32) -> Result<ShelfImage, ApiError> {
            if clusters <= 10 {
                return Ok(self.shelf.clone());
            }
            Ok(ShelfImage {
                image: png_base64(400, 100),
                width: 400,
                height: 100,
                detections: vec![Detection::new(1, BoundingBox::new(100.0, 0.0, 200.0, 100.0))],
                clusters: vec![Cluster::new(1, png_base64(4, 4))],
            })
        }

        fn save_labels(&self, labels: &LabelAssignments) -> Result<(), ApiError> {
            self.saved.lock().unwrap().push(labels.clone());
            Ok(())
        }

        fn send_log(&self, _: &str) -> Result<(), ApiError> {
            Ok(())
        }

        fn saved_labels(&self) -> Result<Vec<SavedLabel>, ApiError> {
            Ok(Vec::new())
        }
    }

    fn app(backend: Arc<ShelfBackend>) -> LabelerApp<Vec<u8>> {
        let mut config = AppConfig::new();
        config.preferences.display_width = 100;
        LabelerApp::new(config, backend, Vec::new())
    }

    fn input(app: &mut LabelerApp<Vec<u8>>, line: &str) -> Flow {
        app.handle_event(Event::Input(line.to_string())).unwrap()
    }

    /// Process effect results until `done` holds.
    fn pump_until(app: &mut LabelerApp<Vec<u8>>, done: impl Fn(&WizardState) -> bool) {
        while !done(&app.state) {
            let event = app.receiver.recv_timeout(Duration::from_secs(5)).unwrap();
            app.handle_event(event).unwrap();
        }
    }

    fn output(app: &LabelerApp<Vec<u8>>) -> String {
        String::from_utf8_lossy(&app.out).into_owned()
    }

    fn reviewed_app(backend: Arc<ShelfBackend>) -> (LabelerApp<Vec<u8>>, tempfile::NamedTempFile) {
        let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        std::fs::write(file.path(), b"not really uploaded").unwrap();
        let mut app = app(backend);
        input(&mut app, &format!("open {}", file.path().display()));
        input(&mut app, "next");
        pump_until(&mut app, |s| s.shelf().is_some());
        (app, file)
    }

    #[test]
    fn test_upload_measures_overlay() {
        let (app, _file) = reviewed_app(Arc::new(ShelfBackend::new()));
        assert_eq!(app.state.step(), Step::Review);

        let rendered = app.overlay.rendered().unwrap();
        assert_eq!(rendered.to_pixels(), (100, 50));

        let boxes = app.overlay_boxes();
        assert_eq!(boxes.len(), 3);
        assert_eq!(boxes[0].left, 10.0);
        assert_eq!(boxes[0].height, 30.0);
        let out = output(&app);
        assert!(out.contains("Overlay at 100x50 (3 boxes)"));
        assert!(out.contains("crop 4x4"));
    }

    #[test]
    fn test_recluster_remeasures_new_image() {
        let (mut app, _file) = reviewed_app(Arc::new(ShelfBackend::new()));
        assert_eq!(app.overlay.rendered().unwrap().to_pixels(), (100, 50));

        input(&mut app, "clusters 12");
        // Old image stays measured while the new one is pending
        assert_eq!(app.overlay.rendered().unwrap().to_pixels(), (100, 50));
        pump_until(&mut app, |s| !s.is_loading());

        assert_eq!(app.state.applied_cluster_count(), Some(12));
        assert_eq!(app.overlay.rendered().unwrap().to_pixels(), (100, 25));
        let boxes = app.overlay_boxes();
        assert_eq!(boxes.len(), 1);
        assert_eq!((boxes[0].left, boxes[0].width, boxes[0].height), (25.0, 25.0, 25.0));
    }

    #[test]
    fn test_resize_relayouts_without_upload() {
        let (mut app, _file) = reviewed_app(Arc::new(ShelfBackend::new()));
        let generation = app.state.generation();

        input(&mut app, "resize 50");
        assert_eq!(app.overlay.rendered().unwrap().to_pixels(), (50, 25));
        assert_eq!(app.overlay_boxes()[0].left, 5.0);
        assert_eq!(app.state.generation(), generation);
    }

    #[test]
    fn test_label_save_and_results() {
        let backend = Arc::new(ShelfBackend::new());
        let (mut app, _file) = reviewed_app(backend.clone());

        input(&mut app, "label 1 Coca-Cola Can");
        input(&mut app, "label 2 Sprite Bottle");
        input(&mut app, "save");
        pump_until(&mut app, |s| s.step() == Step::Results);

        assert_eq!(backend.saved.lock().unwrap().len(), 1);
        let out = output(&app);
        assert!(out.contains("Share of facings"));
        assert!(out.contains("66.7%"));
        assert!(out.contains("33.3%"));

        // Labeled boxes share their label's color
        let boxes = app.overlay_boxes();
        assert_eq!(boxes[0].color, boxes[2].color);
        assert_ne!(boxes[0].color, boxes[1].color);
    }

    #[test]
    fn test_exports() {
        let (mut app, _file) = reviewed_app(Arc::new(ShelfBackend::new()));
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("overlay.png");

        input(&mut app, &format!("export {}", png.display()));
        let written = image::open(&png).unwrap();
        assert_eq!((written.width(), written.height()), (100, 50));

        let crops = dir.path().join("crops");
        input(&mut app, &format!("crops {}", crops.display()));
        assert!(crops.join("cluster-1.jpg").exists());
        assert!(crops.join("cluster-2.jpg").exists());
    }

    #[test]
    fn test_export_without_image_reports_error() {
        let mut app = app(Arc::new(ShelfBackend::new()));
        input(&mut app, "export out.png");
        assert!(output(&app).contains("Export failed: No image loaded"));
    }

    #[test]
    fn test_start_over_clears_overlay() {
        let (mut app, _file) = reviewed_app(Arc::new(ShelfBackend::new()));
        input(&mut app, "save");
        pump_until(&mut app, |s| s.step() == Step::Results);

        input(&mut app, "start-over");
        assert_eq!(app.state.step(), Step::Upload);
        assert!(!app.overlay.is_measured());
    }

    #[test]
    fn test_bad_input_and_quit() {
        let mut app = app(Arc::new(ShelfBackend::new()));
        assert_eq!(input(&mut app, "clusters x"), Flow::Continue);
        assert!(output(&app).contains("is not a valid cluster count"));
        assert_eq!(input(&mut app, "quit"), Flow::Quit);
        assert_eq!(app.handle_event(Event::InputClosed).unwrap(), Flow::Quit);
    }
}

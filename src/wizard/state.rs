//! Wizard state and transition function.

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::{Effect, Message};
use crate::api::ApiError;
use crate::color_utils::{LabelColors, Rgb, assign_colors, label_colors};
use crate::constants::{DEFAULT_CLUSTER_COUNT, MAX_CLUSTER_COUNT, MIN_CLUSTER_COUNT};
use crate::model::{ClusterId, LabelAssignments, LabelOptions, SavedLabel, ShelfImage};
use crate::share::{FacingCounts, ShareChart};

/// Wizard steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
    /// Choose the shelf image
    #[default]
    Upload,
    /// Review clusters and assign labels
    Review,
    /// Share of facings and final overlay
    Results,
}

impl Step {
    /// 1-based step number.
    pub fn number(&self) -> u8 {
        match self {
            Step::Upload => 1,
            Step::Review => 2,
            Step::Results => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Step::Upload => "Upload",
            Step::Review => "Review",
            Step::Results => "Results",
        }
    }
}

/// The image file picked in step 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
}

impl SelectedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File name sent as the multipart file name.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string())
    }
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// A one-line message shown above the current step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Complete client state of a labeling session.
#[derive(Debug, Clone)]
pub struct WizardState {
    step: Step,
    file: Option<SelectedFile>,
    default_cluster_count: u32,
    cluster_count: u32,
    shelf: Option<ShelfImage>,
    labels: LabelAssignments,
    /// Labels carried over from the previous shelf by cluster id
    defaults: LabelAssignments,
    options: LabelOptions,
    loading: bool,
    saving: bool,
    /// Generation of the most recently issued upload
    generation: u64,
    /// Generation and cluster count of the response currently shown
    applied: Option<(u64, u32)>,
    notice: Option<Notice>,
    saved_labels: Option<Vec<SavedLabel>>,
    undelivered_logs: usize,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new(LabelOptions::default(), DEFAULT_CLUSTER_COUNT)
    }
}

impl WizardState {
    pub fn new(options: LabelOptions, default_cluster_count: u32) -> Self {
        let default_cluster_count = clamp_cluster_count(default_cluster_count);
        Self {
            step: Step::Upload,
            file: None,
            default_cluster_count,
            cluster_count: default_cluster_count,
            shelf: None,
            labels: LabelAssignments::new(),
            defaults: LabelAssignments::new(),
            options,
            loading: false,
            saving: false,
            generation: 0,
            applied: None,
            notice: None,
            saved_labels: None,
            undelivered_logs: 0,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn cluster_count(&self) -> u32 {
        self.cluster_count
    }

    pub fn shelf(&self) -> Option<&ShelfImage> {
        self.shelf.as_ref()
    }

    pub fn labels(&self) -> &LabelAssignments {
        &self.labels
    }

    pub fn defaults(&self) -> &LabelAssignments {
        &self.defaults
    }

    pub fn options(&self) -> &LabelOptions {
        &self.options
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Generation of the upload whose response is shown.
    pub fn applied_generation(&self) -> Option<u64> {
        self.applied.map(|(generation, _)| generation)
    }

    /// Cluster count the shown response was computed with.
    pub fn applied_cluster_count(&self) -> Option<u32> {
        self.applied.map(|(_, clusters)| clusters)
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn saved_labels(&self) -> Option<&[SavedLabel]> {
        self.saved_labels.as_deref()
    }

    pub fn undelivered_logs(&self) -> usize {
        self.undelivered_logs
    }

    // ------------------------------------------------------------------
    // Derived data
    // ------------------------------------------------------------------

    /// Box colors of labeled clusters.
    pub fn colors(&self, palette: &[Rgb]) -> BTreeMap<ClusterId, Rgb> {
        assign_colors(&self.labels, palette)
    }

    /// Palette color of each label in use.
    pub fn label_colors(&self, palette: &[Rgb]) -> LabelColors {
        label_colors(&self.labels, palette)
    }

    /// Labeled facings per label for the current shelf.
    pub fn facing_counts(&self) -> FacingCounts {
        match &self.shelf {
            Some(shelf) => FacingCounts::from_detections(&shelf.detections, &self.labels),
            None => FacingCounts::new(),
        }
    }

    /// Share chart with bars colored like their boxes.
    pub fn share_chart(&self, palette: &[Rgb]) -> ShareChart {
        let label_colors = self.label_colors(palette);
        ShareChart::new(&self.facing_counts()).with_colors(|label| label_colors.get(label))
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Apply a message and return the effects to run.
    pub fn update(&mut self, message: Message) -> Vec<Effect> {
        match message {
            Message::SelectFile(path) => self.select_file(path),
            Message::Next => self.next(),
            Message::ClusterCountChanged(n) => self.change_cluster_count(n),
            Message::AssignLabel { cluster_id, text } => self.assign_label(cluster_id, &text),
            Message::AddLabelOption(text) => self.add_label_option(&text),
            Message::Save => self.save(),
            Message::StartOver => self.start_over(),
            Message::NewShelf => self.new_shelf(),
            Message::FetchSavedLabels => vec![Effect::FetchSavedLabels],
            Message::DismissNotice => {
                self.notice = None;
                Vec::new()
            }
            Message::UploadFinished {
                generation,
                clusters,
                result,
            } => self.upload_finished(generation, clusters, result),
            Message::SaveFinished(result) => self.save_finished(result),
            Message::SavedLabelsLoaded(result) => {
                match result {
                    Ok(labels) => {
                        log::debug!("Backend has {} saved labels", labels.len());
                        self.saved_labels = Some(labels);
                    }
                    Err(e) => {
                        self.notice = Some(Notice::error(format!("Could not load saved labels: {e}")));
                    }
                }
                Vec::new()
            }
            Message::LogDelivered(result) => {
                if let Err(e) = result {
                    self.undelivered_logs += 1;
                    log::debug!("Diagnostic line not delivered ({}): {}", e.kind(), e);
                }
                Vec::new()
            }
        }
    }

    fn select_file(&mut self, path: PathBuf) -> Vec<Effect> {
        if self.step != Step::Upload {
            log::debug!("Ignoring file selection outside step 1");
            return Vec::new();
        }
        log::debug!("Selected {:?}", path);
        self.file = Some(SelectedFile::new(path));
        self.notice = None;
        Vec::new()
    }

    fn next(&mut self) -> Vec<Effect> {
        if self.step != Step::Upload || self.file.is_none() {
            log::debug!("Next ignored: step {}, file selected: {}", self.step.number(), self.file.is_some());
            return Vec::new();
        }
        self.step = Step::Review;
        self.start_upload()
    }

    fn change_cluster_count(&mut self, requested: u32) -> Vec<Effect> {
        if self.step != Step::Review {
            return Vec::new();
        }
        let n = clamp_cluster_count(requested);
        if n == self.cluster_count && (self.loading || self.shelf.is_some()) {
            log::debug!("Cluster count already {}", n);
            return Vec::new();
        }
        self.cluster_count = n;
        self.start_upload()
    }

    /// Issue an upload for the current file and cluster count.
    fn start_upload(&mut self) -> Vec<Effect> {
        let Some(file) = &self.file else {
            return Vec::new();
        };
        self.generation += 1;
        self.loading = true;
        vec![
            Effect::log(format!("Uploading image with {} clusters", self.cluster_count)),
            Effect::Upload {
                generation: self.generation,
                file: file.path.clone(),
                clusters: self.cluster_count,
            },
        ]
    }

    fn upload_finished(
        &mut self,
        generation: u64,
        clusters: u32,
        result: Result<ShelfImage, ApiError>,
    ) -> Vec<Effect> {
        if generation != self.generation || self.step != Step::Review {
            log::debug!(
                "Discarding upload #{} (clusters={}), latest is #{}",
                generation,
                clusters,
                self.generation
            );
            return Vec::new();
        }
        self.loading = false;

        match result {
            Ok(shelf) => {
                self.labels.retain_clusters(|id| shelf.has_cluster(id));
                let filled = self.labels.fill_from(&self.defaults, shelf.cluster_ids());
                if filled > 0 {
                    log::debug!("Applied {} default labels", filled);
                }
                let message = format!(
                    "Received {} detections in {} clusters",
                    shelf.detections.len(),
                    shelf.clusters.len()
                );
                self.shelf = Some(shelf);
                self.applied = Some((generation, clusters));
                if self.notice.as_ref().is_some_and(|n| n.level == NoticeLevel::Error) {
                    self.notice = None;
                }
                vec![Effect::log(message)]
            }
            Err(e) => {
                // The shown detections still belong to the last applied count
                if let Some((_, applied_clusters)) = self.applied {
                    self.cluster_count = applied_clusters;
                }
                self.notice = Some(Notice::error(format!("Upload failed: {e}")));
                vec![Effect::log(format!("Upload failed: {e}"))]
            }
        }
    }

    fn assign_label(&mut self, cluster_id: ClusterId, text: &str) -> Vec<Effect> {
        if self.step != Step::Review {
            return Vec::new();
        }
        if !self.shelf.as_ref().is_some_and(|s| s.has_cluster(cluster_id)) {
            self.notice = Some(Notice::error(format!("No cluster {cluster_id} in this image")));
            return Vec::new();
        }

        let text = text.trim();
        if text.is_empty() {
            self.labels.clear(cluster_id);
        } else {
            self.labels.assign(cluster_id, text);
            if self.options.insert(text) {
                log::debug!("New label option {:?}", text);
            }
        }
        Vec::new()
    }

    fn add_label_option(&mut self, text: &str) -> Vec<Effect> {
        if self.step == Step::Review && self.options.insert(text) {
            log::debug!("New label option {:?}", text.trim());
        }
        Vec::new()
    }

    fn save(&mut self) -> Vec<Effect> {
        if self.step != Step::Review || self.saving || self.shelf.is_none() {
            return Vec::new();
        }
        if self.loading {
            self.notice = Some(Notice::info("Wait for clustering to finish before saving"));
            return Vec::new();
        }
        self.saving = true;
        vec![
            Effect::log("Saving labels"),
            Effect::SaveLabels(self.labels.clone()),
        ]
    }

    fn save_finished(&mut self, result: Result<(), ApiError>) -> Vec<Effect> {
        if !self.saving || self.step != Step::Review {
            return Vec::new();
        }
        self.saving = false;
        match result {
            Ok(()) => {
                self.step = Step::Results;
                self.notice = Some(Notice::info("Labels saved"));
                vec![Effect::log("Labels saved")]
            }
            Err(e) => {
                self.notice = Some(Notice::error(format!("Save failed: {e}")));
                vec![Effect::log(format!("Save failed: {e}"))]
            }
        }
    }

    fn start_over(&mut self) -> Vec<Effect> {
        if self.step != Step::Results {
            return Vec::new();
        }
        self.reset_session();
        self.defaults = LabelAssignments::new();
        self.cluster_count = self.default_cluster_count;
        Vec::new()
    }

    fn new_shelf(&mut self) -> Vec<Effect> {
        if self.step != Step::Results {
            return Vec::new();
        }
        self.defaults = std::mem::take(&mut self.labels);
        log::debug!("Carrying {} labels over to the next shelf", self.defaults.len());
        self.reset_session();
        Vec::new()
    }

    /// Back to step 1 with no file, image or labels.
    fn reset_session(&mut self) {
        self.step = Step::Upload;
        self.file = None;
        self.shelf = None;
        self.applied = None;
        self.labels = LabelAssignments::new();
        self.loading = false;
        self.saving = false;
        self.notice = None;
    }
}

/// Clamp a requested cluster count to the supported range.
pub fn clamp_cluster_count(n: u32) -> u32 {
    n.clamp(MIN_CLUSTER_COUNT, MAX_CLUSTER_COUNT)
}

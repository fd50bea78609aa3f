//! Wizard messages and effects.

use std::path::PathBuf;

use crate::api::ApiError;
use crate::model::{ClusterId, LabelAssignments, SavedLabel, ShelfImage};

/// Messages that can be sent to update wizard state.
#[derive(Debug, Clone)]
pub enum Message {
    // Step 1
    /// A file was chosen
    SelectFile(PathBuf),
    /// Advance from file selection to review
    Next,

    // Step 2
    /// Cluster count slider moved
    ClusterCountChanged(u32),
    /// Label a cluster; blank text clears its label
    AssignLabel {
        cluster_id: ClusterId,
        text: String,
    },
    /// Add a label to the options without assigning it
    AddLabelOption(String),
    /// Send labels to the backend
    Save,

    // Step 3
    /// Back to step 1 with everything cleared
    StartOver,
    /// Back to step 1, remembering labels as defaults
    NewShelf,

    // Any step
    /// Load the labels stored by the backend
    FetchSavedLabels,
    /// Clear the current notice
    DismissNotice,

    // Effect results
    /// An upload-and-cluster request finished
    UploadFinished {
        generation: u64,
        clusters: u32,
        result: Result<ShelfImage, ApiError>,
    },
    /// A save request finished
    SaveFinished(Result<(), ApiError>),
    /// The saved label listing arrived
    SavedLabelsLoaded(Result<Vec<SavedLabel>, ApiError>),
    /// A diagnostic log post finished
    LogDelivered(Result<(), ApiError>),
}

/// Side effects requested by the wizard.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Read the file and upload it for clustering
    Upload {
        generation: u64,
        file: PathBuf,
        clusters: u32,
    },
    /// Post the label map
    SaveLabels(LabelAssignments),
    /// Fetch the stored label listing
    FetchSavedLabels,
    /// Write a diagnostic line locally and to the backend
    Log(String),
}

impl Effect {
    pub fn log(message: impl Into<String>) -> Self {
        Effect::Log(message.into())
    }
}

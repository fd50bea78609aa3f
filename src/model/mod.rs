//! Data models for the shelf labeler.

mod cluster;
mod detection;
mod label;
mod shelf;

pub use cluster::Cluster;
pub use detection::{BoundingBox, Detection};
pub use label::{LabelAssignments, LabelOptions};
pub use shelf::{SavedLabel, ShelfError, ShelfImage};

/// Identifier of a visual cluster, as assigned by the backend.
pub type ClusterId = u32;

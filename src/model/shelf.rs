//! A clustered shelf image as returned by the backend.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Cluster, ClusterId, Detection};

/// Ways an upload response can break the shelf invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShelfError {
    /// Width or height is zero
    #[error("image dimensions must be non-zero, got {width}x{height}")]
    ZeroSize { width: u32, height: u32 },

    /// No base image payload
    #[error("response carries no image data")]
    EmptyImage,

    /// Two clusters share an id
    #[error("cluster {0} appears more than once")]
    DuplicateCluster(ClusterId),

    /// A detection references a cluster that is not in the response
    #[error("detection {index} references unknown cluster {cluster_id}")]
    UnknownCluster { index: usize, cluster_id: ClusterId },

    /// A bounding box is inverted, negative or not finite
    #[error("detection {index} has an invalid bounding box")]
    InvalidBox { index: usize },
}

/// Upload-and-cluster result for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShelfImage {
    /// Base64-encoded JPEG of the full shelf
    pub image: String,
    /// Source image width in pixels
    pub width: u32,
    /// Source image height in pixels
    pub height: u32,
    #[serde(default)]
    pub detections: Vec<Detection>,
    #[serde(default)]
    pub clusters: Vec<Cluster>,
}

impl ShelfImage {
    /// Check the invariants a response must hold before it is applied.
    pub fn validate(&self) -> Result<(), ShelfError> {
        if self.width == 0 || self.height == 0 {
            return Err(ShelfError::ZeroSize {
                width: self.width,
                height: self.height,
            });
        }
        if self.image.trim().is_empty() {
            return Err(ShelfError::EmptyImage);
        }

        let mut ids = BTreeSet::new();
        for cluster in &self.clusters {
            if !ids.insert(cluster.cluster_id) {
                return Err(ShelfError::DuplicateCluster(cluster.cluster_id));
            }
        }

        for (index, detection) in self.detections.iter().enumerate() {
            if !ids.contains(&detection.cluster_id) {
                return Err(ShelfError::UnknownCluster {
                    index,
                    cluster_id: detection.cluster_id,
                });
            }
            if !detection.bbox.is_valid() {
                return Err(ShelfError::InvalidBox { index });
            }
        }

        Ok(())
    }

    /// Ids of all clusters in the response.
    pub fn cluster_ids(&self) -> impl Iterator<Item = ClusterId> + '_ {
        self.clusters.iter().map(|c| c.cluster_id)
    }

    pub fn has_cluster(&self, cluster_id: ClusterId) -> bool {
        self.clusters.iter().any(|c| c.cluster_id == cluster_id)
    }

    pub fn cluster(&self, cluster_id: ClusterId) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.cluster_id == cluster_id)
    }

    /// Number of detections (facings) in a cluster.
    pub fn facings(&self, cluster_id: ClusterId) -> usize {
        self.detections
            .iter()
            .filter(|d| d.cluster_id == cluster_id)
            .count()
    }
}

/// A label stored by the backend, as listed by `GET /clusters`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedLabel {
    pub cluster_id: String,
    pub label: String,
    #[serde(default)]
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BoundingBox;

    fn shelf() -> ShelfImage {
        ShelfImage {
            image: "aGVsbG8=".to_string(),
            width: 1000,
            height: 500,
            detections: vec![
                Detection::new(1, BoundingBox::new(100.0, 100.0, 300.0, 300.0)),
                Detection::new(1, BoundingBox::new(300.0, 100.0, 500.0, 300.0)),
                Detection::new(2, BoundingBox::new(600.0, 100.0, 700.0, 300.0)),
            ],
            clusters: vec![Cluster::new(1, "YQ=="), Cluster::new(2, "Yg=="), Cluster::new(3, "Yw==")],
        }
    }

    #[test]
    fn test_valid_shelf() {
        let shelf = shelf();
        assert_eq!(shelf.validate(), Ok(()));
        assert_eq!(shelf.facings(1), 2);
        assert_eq!(shelf.facings(3), 0);
        assert!(shelf.has_cluster(3));
        assert_eq!(shelf.cluster_ids().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_detection_without_cluster_rejected() {
        let mut shelf = shelf();
        shelf.clusters.remove(1);
        assert_eq!(
            shelf.validate(),
            Err(ShelfError::UnknownCluster {
                index: 2,
                cluster_id: 2
            })
        );
    }

    #[test]
    fn test_duplicate_cluster_rejected() {
        let mut shelf = shelf();
        shelf.clusters.push(Cluster::new(1, "ZA=="));
        assert_eq!(shelf.validate(), Err(ShelfError::DuplicateCluster(1)));
    }

    #[test]
    fn test_zero_size_rejected() {
        let mut shelf = shelf();
        shelf.height = 0;
        assert!(matches!(shelf.validate(), Err(ShelfError::ZeroSize { .. })));
    }

    #[test]
    fn test_inverted_box_rejected() {
        let mut shelf = shelf();
        shelf.detections[0].bbox = BoundingBox::new(300.0, 100.0, 100.0, 300.0);
        assert_eq!(shelf.validate(), Err(ShelfError::InvalidBox { index: 0 }));
    }

    #[test]
    fn test_parse_upload_response() {
        let json = r#"{
            "image": "aGVsbG8=",
            "width": 1000,
            "height": 500,
            "detections": [{"cluster_id": 1, "bbox": [100, 100, 300, 300]}],
            "clusters": [{"cluster_id": 1, "image": "YQ=="}]
        }"#;
        let shelf: ShelfImage = serde_json::from_str(json).unwrap();
        assert_eq!(shelf.validate(), Ok(()));
        assert_eq!(shelf.detections.len(), 1);
        assert_eq!(shelf.clusters[0].cluster_id, 1);
    }
}

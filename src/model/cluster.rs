//! Cluster representatives.

use serde::{Deserialize, Serialize};

use super::ClusterId;
use crate::overlay::{RenderError, decode_base64};

/// A group of visually similar detections, represented by one sample crop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub cluster_id: ClusterId,
    /// Base64-encoded JPEG crop
    pub image: String,
}

impl Cluster {
    pub fn new(cluster_id: ClusterId, image: impl Into<String>) -> Self {
        Self {
            cluster_id,
            image: image.into(),
        }
    }

    /// Decode the crop into raw JPEG bytes.
    pub fn crop_bytes(&self) -> Result<Vec<u8>, RenderError> {
        decode_base64(&self.image)
    }

    /// Pixel size of the crop.
    pub fn crop_dimensions(&self) -> Result<(u32, u32), RenderError> {
        let bytes = self.crop_bytes()?;
        let img = image::load_from_memory(&bytes)?;
        Ok((img.width(), img.height()))
    }
}

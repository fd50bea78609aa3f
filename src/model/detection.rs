//! Detected product instances.

use serde::{Deserialize, Serialize};

use super::ClusterId;

/// Axis-aligned box in source-image pixel coordinates.
///
/// Serialized as `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Finite, non-negative coordinates with `x2 >= x1` and `y2 >= y1`.
    pub fn is_valid(&self) -> bool {
        let coords = [self.x1, self.y1, self.x2, self.y2];
        coords.iter().all(|c| c.is_finite() && *c >= 0.0) && self.x2 >= self.x1 && self.y2 >= self.y1
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [f32; 4]) -> Self {
        Self::new(x1, y1, x2, y2)
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(bbox: BoundingBox) -> Self {
        [bbox.x1, bbox.y1, bbox.x2, bbox.y2]
    }
}

/// A located product instance belonging to a cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub cluster_id: ClusterId,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(cluster_id: ClusterId, bbox: BoundingBox) -> Self {
        Self { cluster_id, bbox }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_from_wire_array() {
        let det: Detection =
            serde_json::from_str(r#"{"cluster_id": 1, "bbox": [100, 100, 300, 250]}"#).unwrap();
        assert_eq!(det.cluster_id, 1);
        assert_eq!(det.bbox, BoundingBox::new(100.0, 100.0, 300.0, 250.0));
        assert_eq!(det.bbox.width(), 200.0);
        assert_eq!(det.bbox.height(), 150.0);
    }

    #[test]
    fn test_bbox_serializes_as_array() {
        let json = serde_json::to_value(BoundingBox::new(1.0, 2.0, 3.0, 4.0)).unwrap();
        assert_eq!(json, serde_json::json!([1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn test_bbox_validity() {
        assert!(BoundingBox::new(0.0, 0.0, 10.0, 10.0).is_valid());
        assert!(BoundingBox::new(5.0, 5.0, 5.0, 5.0).is_valid());
        assert!(!BoundingBox::new(10.0, 0.0, 5.0, 10.0).is_valid());
        assert!(!BoundingBox::new(-1.0, 0.0, 5.0, 10.0).is_valid());
        assert!(!BoundingBox::new(0.0, 0.0, f32::NAN, 10.0).is_valid());
    }
}

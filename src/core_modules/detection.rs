// THEORY:
// The `detection` module holds the fundamental data records of the location
// engine. Everything downstream of the inference collaborator is expressed in
// terms of these two types, so they are deliberately "dumb" data containers
// with a small amount of intrinsic geometry knowledge.
//
// Key architectural principles:
// 1.  **Explicit Records**: A detection is a typed struct with required fields
//     (`bbox`, `confidence`) and optional fields (`kind`, `tag`, `page`). The
//     record is validated exactly once, at the response-parse boundary; every
//     later stage can rely on its shape without re-checking keys.
// 2.  **One Exchange Format**: Bounding boxes cross every boundary as the
//     ordered array `[ymin, xmin, ymax, xmax]` on a fixed 0-1000 scale. The
//     scale is independent of pixel resolution, so the same type serves both
//     the tile-local and the full-image frame; which frame applies is the
//     caller's responsibility to track.
// 3.  **Intrinsic Geometry Only**: `BBox` knows how to measure itself (area,
//     validity) and how it relates to one other box (IoU). It knows nothing
//     about tiles, images, or merging; those live in their own modules.
//
// Values normally sit inside [0, 1000] but may drift slightly past the ends
// due to inference imprecision. Nothing here clamps; the merge stage is built
// to tolerate marginal overshoot.

use serde::{Deserialize, Serialize};

/// A bounding box on the fixed 0-1000 normalized scale, exchanged everywhere
/// as the ordered array `[ymin, xmin, ymax, xmax]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BBox {
    pub ymin: f64,
    pub xmin: f64,
    pub ymax: f64,
    pub xmax: f64,
}

impl From<[f64; 4]> for BBox {
    fn from([ymin, xmin, ymax, xmax]: [f64; 4]) -> Self {
        Self { ymin, xmin, ymax, xmax }
    }
}

impl From<BBox> for [f64; 4] {
    fn from(bbox: BBox) -> Self {
        [bbox.ymin, bbox.xmin, bbox.ymax, bbox.xmax]
    }
}

impl BBox {
    pub fn new(ymin: f64, xmin: f64, ymax: f64, xmax: f64) -> Self {
        Self { ymin, xmin, ymax, xmax }
    }

    /// A box is valid when it has positive extent along both axes.
    pub fn is_valid(&self) -> bool {
        self.ymin < self.ymax && self.xmin < self.xmax
    }

    pub fn area(&self) -> f64 {
        (self.ymax - self.ymin) * (self.xmax - self.xmin)
    }

    /// Intersection-over-Union with another box: overlap area divided by
    /// combined area minus overlap. 0.0 for disjoint boxes and whenever the
    /// union area degenerates to zero.
    pub fn iou(&self, other: &BBox) -> f64 {
        let y_top = self.ymin.max(other.ymin);
        let x_left = self.xmin.max(other.xmin);
        let y_bottom = self.ymax.min(other.ymax);
        let x_right = self.xmax.min(other.xmax);

        if x_right < x_left || y_bottom < y_top {
            return 0.0;
        }

        let intersection = (x_right - x_left) * (y_bottom - y_top);
        let union = self.area() + other.area() - intersection;

        if union == 0.0 {
            return 0.0;
        }

        intersection / union
    }
}

/// A single recognized object instance reported by the inference collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// The equipment type reported (e.g. "Water Source Heat Pump").
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// The specific tag read off the drawing (e.g. "WSHP-1").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Bounding box in whichever 0-1000 frame is current: tile-local as
    /// parsed, full-image once remapped.
    pub bbox: BBox,
    /// The collaborator's confidence in [0, 1].
    pub confidence: f64,
    /// 1-based page number, stamped by the orchestrator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

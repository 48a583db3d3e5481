// THEORY:
// The `detection_merger` module removes the artifacts that tiling introduces.
// A symbol that sits inside the overlap band is reported by two or more tiles,
// usually with slightly different boxes and confidences; occasionally two
// tiles read the same symbol's tag differently. The merger collapses these
// into one detection per physical object.
//
// Key architectural principles:
// 1.  **Deterministic Greedy NMS**: candidates are ranked by confidence
//     (descending, stable so ties keep their collection order) and walked
//     once. A candidate is discarded when it overlaps an already-accepted
//     detection strongly enough; because of the ranking, the accepted one is
//     always the higher-confidence reading.
// 2.  **Two Suppression Bands**: a moderate overlap (IoU above the same-tag
//     threshold) only counts as a duplicate when both detections carry the
//     same tag. A very strong overlap (above the cross-tag threshold) counts
//     regardless of tag, on the assumption that one of the two tag readings
//     is wrong and the more confident one should win.
// 3.  **Idempotence**: the output contains no pair above either suppression
//     band, so merging a second time changes nothing.
//
// Absent tags compare equal to each other: two untagged reports of the same
// spot are duplicates of one another just as two "WSHP-1" reports are.

use crate::core_modules::detection::Detection;
use tracing::debug;

/// Thresholds governing duplicate suppression. The defaults are tuned for
/// symbol detection on mechanical drawings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeConfig {
    /// Detections below this confidence are dropped before ranking.
    pub confidence_floor: f64,
    /// IoU above which two detections with the same tag collapse into one.
    pub same_tag_iou: f64,
    /// IoU above which two detections collapse regardless of tag.
    pub cross_tag_iou: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            confidence_floor: 0.6,
            same_tag_iou: 0.3,
            cross_tag_iou: 0.7,
        }
    }
}

/// Deduplicates an unordered collection of detections, returning the
/// survivors ordered by descending confidence.
pub fn merge_detections(detections: Vec<Detection>, config: &MergeConfig) -> Vec<Detection> {
    let mut ranked: Vec<Detection> = detections
        .into_iter()
        .filter(|detection| detection.confidence >= config.confidence_floor)
        .collect();
    // sort_by is stable: equal confidences keep their original order.
    ranked.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut accepted: Vec<Detection> = Vec::with_capacity(ranked.len());
    for candidate in ranked {
        let duplicate = accepted.iter().any(|kept| {
            let iou = candidate.bbox.iou(&kept.bbox);
            (iou > config.same_tag_iou && candidate.tag == kept.tag) || iou > config.cross_tag_iou
        });
        if duplicate {
            debug!(tag = ?candidate.tag, confidence = candidate.confidence, "suppressing duplicate detection");
            continue;
        }
        accepted.push(candidate);
    }
    accepted
}

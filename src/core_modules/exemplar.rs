// THEORY:
// The `exemplar` module prepares visual hints for the collaborator. Callers
// often hold a legend or cover page where each symbol is drawn next to its
// description; cropping those symbols out and forwarding the patches alongside
// a query measurably anchors what the collaborator should look for.
//
// Key architectural principles:
// 1.  **Same Frames, Same Math**: regions arrive in the legend image's 0-1000
//     frame and are projected to pixels through the coordinate mapper, the
//     one module that owns frame conversions.
// 2.  **Per-Region Isolation**: a degenerate or out-of-frame region is logged
//     and skipped. Hints are best-effort; one bad region must not cost the
//     caller the rest of its exemplars, let alone the whole request.

use crate::core_modules::coordinate_mapper;
use crate::core_modules::detection::BBox;
use image::{DynamicImage, GenericImageView};
use tracing::warn;

/// A named region of a reference (legend) image, in that image's 0-1000 frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ExemplarRegion {
    /// What the region depicts (e.g. "Supply Diffuser").
    pub name: String,
    pub bbox: BBox,
}

/// A reference patch cut out of the legend image, forwarded to the detector
/// as a visual hint.
#[derive(Clone)]
pub struct ExemplarCrop {
    pub name: String,
    pub image: DynamicImage,
}

/// Cuts one patch per region out of `reference`. Regions that are degenerate
/// or fall outside the image are skipped, not fatal.
pub fn crop_exemplars(reference: &DynamicImage, regions: &[ExemplarRegion]) -> Vec<ExemplarCrop> {
    let (width, height) = reference.dimensions();
    let mut crops = Vec::with_capacity(regions.len());

    for region in regions {
        if !region.bbox.is_valid() {
            warn!(name = %region.name, "skipping exemplar with a degenerate bounding box");
            continue;
        }

        let rect = coordinate_mapper::to_pixel_rect(region.bbox, width, height);
        let left = rect.left.max(0.0) as u32;
        let top = rect.top.max(0.0) as u32;
        let right = rect.right.min(width as f64) as u32;
        let bottom = rect.bottom.min(height as f64) as u32;

        if right <= left || bottom <= top {
            warn!(name = %region.name, "skipping exemplar that falls outside the reference image");
            continue;
        }

        crops.push(ExemplarCrop {
            name: region.name.clone(),
            image: reference.crop_imm(left, top, right - left, bottom - top),
        });
    }

    crops
}

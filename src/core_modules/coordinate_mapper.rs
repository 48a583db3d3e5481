// THEORY:
// The `coordinate_mapper` module owns every conversion between coordinate
// frames. The collaborator reports boxes on a 0-1000 scale local to whatever
// image it was shown; when that image was a tile, the box must be re-expressed
// on the 0-1000 scale of the full page before tiles can be compared or merged.
//
// Key architectural principles:
// 1.  **Stateless Utility**: like the other pure stages, this module holds no
//     state. Every function is a plain transform of its inputs.
// 2.  **Pixels As The Pivot**: each conversion goes through the one frame both
//     scales agree on, source-image pixels. Tile-local value -> tile pixels ->
//     plus tile offset -> full-image pixels -> full-image scale.
// 3.  **No Clamping**: inference imprecision can push values marginally past
//     [0, 1000]. They pass through unchanged; the merge stage tolerates the
//     overshoot, and clamping here would silently distort box geometry.
//
// The inverse transform exists so the mapping is verifiable as a round trip,
// and `to_pixel_rect` projects a normalized box onto a concrete image, which
// is how exemplar patches get cut out of a legend page.

use crate::core_modules::detection::BBox;
use crate::core_modules::grid_planner::TileRect;

/// Re-expresses a box from a tile's local 0-1000 frame in the full image's
/// 0-1000 frame.
pub fn tile_to_image(bbox: BBox, tile: &TileRect, image_width: u32, image_height: u32) -> BBox {
    let tile_h = tile.height as f64;
    let tile_w = tile.width as f64;
    let top = tile.top as f64;
    let left = tile.left as f64;

    BBox {
        ymin: (bbox.ymin / 1000.0 * tile_h + top) / image_height as f64 * 1000.0,
        xmin: (bbox.xmin / 1000.0 * tile_w + left) / image_width as f64 * 1000.0,
        ymax: (bbox.ymax / 1000.0 * tile_h + top) / image_height as f64 * 1000.0,
        xmax: (bbox.xmax / 1000.0 * tile_w + left) / image_width as f64 * 1000.0,
    }
}

/// Inverse of [`tile_to_image`]: full-image frame back into a tile's local
/// frame. Points outside the tile come out beyond [0, 1000], unclamped.
pub fn image_to_tile(bbox: BBox, tile: &TileRect, image_width: u32, image_height: u32) -> BBox {
    let tile_h = tile.height as f64;
    let tile_w = tile.width as f64;
    let top = tile.top as f64;
    let left = tile.left as f64;

    BBox {
        ymin: (bbox.ymin / 1000.0 * image_height as f64 - top) / tile_h * 1000.0,
        xmin: (bbox.xmin / 1000.0 * image_width as f64 - left) / tile_w * 1000.0,
        ymax: (bbox.ymax / 1000.0 * image_height as f64 - top) / tile_h * 1000.0,
        xmax: (bbox.xmax / 1000.0 * image_width as f64 - left) / tile_w * 1000.0,
    }
}

/// A box projected onto a concrete image, in (possibly fractional) pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Projects a normalized 0-1000 box onto an image of the given pixel size.
pub fn to_pixel_rect(bbox: BBox, image_width: u32, image_height: u32) -> PixelRect {
    PixelRect {
        left: bbox.xmin / 1000.0 * image_width as f64,
        top: bbox.ymin / 1000.0 * image_height as f64,
        right: bbox.xmax / 1000.0 * image_width as f64,
        bottom: bbox.ymax / 1000.0 * image_height as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &BBox, b: &BBox) {
        for (left, right) in <[f64; 4]>::from(*a).iter().zip(<[f64; 4]>::from(*b).iter()) {
            assert!((left - right).abs() < 1e-9, "{left} != {right}");
        }
    }

    #[test]
    fn maps_a_tile_local_box_into_the_page_frame() {
        // Bottom-right tile of a 3000x3000 page: local [500, 500, 600, 600]
        // is pixels 750..900 inside the tile, offset to 2250..2400, which is
        // 750..800 on the page scale.
        let tile = TileRect { index: 8, left: 1500, top: 1500, width: 1500, height: 1500 };
        let mapped = tile_to_image(BBox::new(500.0, 500.0, 600.0, 600.0), &tile, 3000, 3000);
        assert_close(&mapped, &BBox::new(750.0, 750.0, 800.0, 800.0));
    }

    #[test]
    fn origin_tile_mapping_only_rescales() {
        let tile = TileRect { index: 0, left: 0, top: 0, width: 1500, height: 1500 };
        let mapped = tile_to_image(BBox::new(0.0, 0.0, 1000.0, 1000.0), &tile, 3000, 3000);
        assert_close(&mapped, &BBox::new(0.0, 0.0, 500.0, 500.0));
    }

    #[test]
    fn round_trip_returns_the_original_box() {
        let tile = TileRect { index: 4, left: 1200, top: 2400, width: 1500, height: 600 };
        let original = BBox::new(12.5, 903.25, 401.0, 977.75);
        let there = tile_to_image(original, &tile, 4200, 3000);
        let back = image_to_tile(there, &tile, 4200, 3000);
        assert_close(&back, &original);
    }

    #[test]
    fn overshoot_passes_through_unclamped() {
        let tile = TileRect { index: 0, left: 0, top: 0, width: 3000, height: 3000 };
        let mapped = tile_to_image(BBox::new(-3.0, 0.0, 1002.0, 1000.0), &tile, 3000, 3000);
        assert!(mapped.ymin < 0.0);
        assert!(mapped.ymax > 1000.0);
    }

    #[test]
    fn pixel_projection_scales_both_axes_independently() {
        let rect = to_pixel_rect(BBox::new(100.0, 250.0, 300.0, 500.0), 2000, 1000);
        assert_eq!(rect, PixelRect { left: 500.0, top: 100.0, right: 1000.0, bottom: 300.0 });
    }
}

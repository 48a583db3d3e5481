// THEORY:
// The `grid_planner` module decides how a very large page image is split into
// overlapping tiles before dispatch. The collaborator's effective recall on
// small symbols collapses when a huge drawing is presented whole, so the
// planner produces crops small enough to keep symbols legible while the
// overlap guarantees that anything straddling a cut line appears intact in at
// least one tile.
//
// Key architectural principles:
// 1.  **Pure Planning, Separate Carving**: `plan_grid` is a pure function of
//     the image dimensions and the grid configuration; it produces only
//     geometry. `carve_tiles` then cuts pixel crops along that geometry. The
//     split keeps the math independently testable without touching images.
// 2.  **Edge Alignment, Never Gaps**: tile origins step by (tile - overlap).
//     A tile that would overrun the image edge is shifted back so its far
//     edge lands exactly on the boundary. That edge tile overlaps its
//     neighbor by more than the configured minimum, which is harmless; a gap
//     or an out-of-bounds crop would not be.
// 3.  **Row-Major, Stable Indices**: tiles are enumerated left-to-right,
//     top-to-bottom and each carries its index, so logs and failure reports
//     can name the exact crop involved.
//
// Configuration is validated before any planning: an overlap as large as the
// tile itself would make the origin step non-positive and the grid infinite.

use image::{DynamicImage, GenericImageView};
use thiserror::Error;
use tracing::info;

/// Geometry knobs for the tile grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig {
    /// Edge length of a (square) tile, in pixels.
    pub tile_size: u32,
    /// Minimum pixel overlap between adjacent tiles, so symbols on a cut
    /// line are fully visible in at least one of the two crops.
    pub overlap: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            tile_size: 1500,
            overlap: 300,
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<(), GridConfigError> {
        if self.overlap >= self.tile_size {
            return Err(GridConfigError {
                tile_size: self.tile_size,
                overlap: self.overlap,
            });
        }
        Ok(())
    }
}

/// Fatal configuration error, raised before any dispatch begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("tile overlap ({overlap}px) must be smaller than the tile size ({tile_size}px)")]
pub struct GridConfigError {
    pub tile_size: u32,
    pub overlap: u32,
}

/// One planned cell of the grid, before any pixels are cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    /// Stable row-major position of this tile in its grid.
    pub index: usize,
    /// Pixel offset of the tile's left edge in the source image.
    pub left: u32,
    /// Pixel offset of the tile's top edge in the source image.
    pub top: u32,
    /// Tile width in pixels. Equals the configured tile size unless the
    /// source dimension itself is smaller.
    pub width: u32,
    /// Tile height in pixels.
    pub height: u32,
}

/// A carved tile: its placement in the source image plus the cropped pixels.
/// Tiles live exactly as long as one page's dispatch.
pub struct Tile {
    pub rect: TileRect,
    pub image: DynamicImage,
}

/// Plans the tile grid for an image of `width` x `height` pixels.
/// A dimension no larger than the tile size gets a single tile spanning it.
pub fn plan_grid(width: u32, height: u32, config: &GridConfig) -> Result<Vec<TileRect>, GridConfigError> {
    config.validate()?;

    let cols = axis_tile_count(width, config);
    let rows = axis_tile_count(height, config);
    info!(rows, cols, width, height, "splitting image into tile grid");

    let mut rects = Vec::with_capacity((rows * cols) as usize);
    for row in 0..rows {
        for col in 0..cols {
            let left = axis_origin(col, width, config);
            let top = axis_origin(row, height, config);
            rects.push(TileRect {
                index: rects.len(),
                left,
                top,
                width: width.min(left + config.tile_size) - left,
                height: height.min(top + config.tile_size) - top,
            });
        }
    }
    Ok(rects)
}

/// Plans the grid for `image` and crops one tile per cell.
pub fn carve_tiles(image: &DynamicImage, config: &GridConfig) -> Result<Vec<Tile>, GridConfigError> {
    let (width, height) = image.dimensions();
    let rects = plan_grid(width, height, config)?;
    Ok(rects
        .into_iter()
        .map(|rect| Tile {
            image: image.crop_imm(rect.left, rect.top, rect.width, rect.height),
            rect,
        })
        .collect())
}

fn axis_tile_count(extent: u32, config: &GridConfig) -> u32 {
    if extent <= config.tile_size {
        1
    } else {
        (extent - config.overlap).div_ceil(config.tile_size - config.overlap)
    }
}

fn axis_origin(cell: u32, extent: u32, config: &GridConfig) -> u32 {
    let origin = cell * (config.tile_size - config.overlap);
    if origin + config.tile_size > extent {
        extent.saturating_sub(config.tile_size)
    } else {
        origin
    }
}

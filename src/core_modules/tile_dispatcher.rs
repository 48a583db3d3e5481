// THEORY:
// The `tile_dispatcher` is the only parallel region of the engine. It takes
// the planner's tiles and fans one detector call out per tile, bounded by an
// admission gate so a hundred-tile page cannot stampede a rate-limited
// collaborator.
//
// Key architectural principles:
// 1.  **Admission Gate**: a semaphore with K permits is the sole piece of
//     shared state. A tile acquires a permit before its detector call and
//     releases it on completion, success or failure alike.
// 2.  **Join Barrier**: dispatch returns only after every tile has resolved.
//     Tiles complete in whatever order the collaborator answers; nothing
//     downstream depends on completion order, because the merger re-ranks by
//     confidence.
// 3.  **Failure Isolation**: a tile whose call ultimately fails (retry budget
//     exhausted, or a permanent rejection) contributes an empty detection
//     list. The failure is logged and goes no further; sibling tiles and the
//     page as a whole are never aborted from here.
// 4.  **Local Frame In, Page Frame Out**: each tile's detections are parsed
//     and immediately remapped into the full-image frame and stamped with the
//     page number, so the dispatcher's output is uniformly addressed for the
//     merger.
//
// The retry policy wraps the detector call exactly once, here. Tile calls
// forward the visual exemplars but no free-text context; a tile is a fragment,
// and document-level text would mislead more than it grounds.

use crate::core_modules::coordinate_mapper;
use crate::core_modules::detection::Detection;
use crate::core_modules::exemplar::ExemplarCrop;
use crate::core_modules::grid_planner::Tile;
use crate::core_modules::response_parser;
use crate::core_modules::retry::RetryPolicy;
use crate::detector::{DetectionQuery, Detector};
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Fans detector calls out across tiles under an admission gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileDispatcher {
    /// Maximum number of detector calls in flight at once.
    pub concurrency: usize,
    /// Retry policy applied to each tile's call.
    pub retry: RetryPolicy,
}

impl Default for TileDispatcher {
    fn default() -> Self {
        Self {
            concurrency: 10,
            retry: RetryPolicy::default(),
        }
    }
}

impl TileDispatcher {
    /// Dispatches one detector call per tile and waits for all of them.
    /// Returns the flattened detections in the full-image 0-1000 frame,
    /// stamped with `page`. Failed tiles contribute nothing.
    pub async fn dispatch<D: Detector>(
        &self,
        detector: &D,
        tiles: &[Tile],
        descriptors: &[String],
        exemplars: &[ExemplarCrop],
        page: u32,
        image_width: u32,
        image_height: u32,
    ) -> Vec<Detection> {
        let gate = Semaphore::new(self.concurrency);
        let retry = self.retry;
        let total = tiles.len();

        let jobs = tiles.iter().map(|tile| {
            let gate = &gate;
            async move {
                let _permit = gate.acquire().await.expect("admission gate is never closed");
                debug!(tile = tile.rect.index, total, page, "dispatching tile to detector");

                let outcome = retry
                    .run(|| {
                        detector.detect(DetectionQuery {
                            image: &tile.image,
                            descriptors,
                            text_context: None,
                            exemplars,
                        })
                    })
                    .await;

                match outcome {
                    Ok(text) => {
                        let mut detections = response_parser::parse_detections(&text);
                        for detection in &mut detections {
                            detection.bbox = coordinate_mapper::tile_to_image(
                                detection.bbox,
                                &tile.rect,
                                image_width,
                                image_height,
                            );
                            detection.page = Some(page);
                        }
                        detections
                    }
                    Err(error) => {
                        warn!(
                            tile = tile.rect.index,
                            page,
                            %error,
                            "tile detection failed, contributing no detections"
                        );
                        Vec::new()
                    }
                }
            }
        });

        join_all(jobs).await.into_iter().flatten().collect()
    }
}

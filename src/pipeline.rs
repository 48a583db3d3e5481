// THEORY:
// The `pipeline` module is the final, top-level API for the location engine.
// It encapsulates the full stack behind a single decision: is this page small
// enough to show the collaborator whole, or does it need the tiling pipeline?
//
// Per page, the orchestration is:
//   - Large page:  grid planning -> bounded tile dispatch (with per-tile
//     coordinate remapping) -> duplicate merge.
//   - Small page:  one direct detector call; the response is already in the
//     full-image frame, so tiling and merging are skipped.
// Every detection is stamped with its 1-based page number, and pages are
// concatenated without any cross-page merging.
//
// Configuration is validated before the first page is touched; a bad grid
// setup is the only fatal error this module surfaces. Per-page and per-tile
// failures degrade to empty results so that one unreachable page never costs
// the caller the rest of the document.
//
// Known liveness gap: there is no per-call timeout. A detector call that
// neither resolves nor fails occupies its admission-gate permit until its
// retry budget is exhausted; callers needing harder guarantees should enforce
// deadlines inside their `Detector` implementation.

use crate::core_modules::detection_merger::{self, MergeConfig};
use crate::core_modules::exemplar::ExemplarCrop;
use crate::core_modules::grid_planner::{self, GridConfig, GridConfigError};
use crate::core_modules::response_parser;
use crate::core_modules::retry::RetryPolicy;
use crate::core_modules::tile_dispatcher::TileDispatcher;
use crate::detector::{DetectionQuery, Detector};
use image::{DynamicImage, GenericImageView};
use tracing::{info, warn};

// Re-export key data structures for the public API.
pub use crate::core_modules::detection::{BBox, Detection};

/// Configuration for the PlanPipeline, allowing for tunable behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Pages with either dimension above this many pixels go through the
    /// tiling pipeline; smaller pages are sent to the detector whole.
    pub tiling_threshold: u32,
    /// Tile geometry used when tiling is engaged.
    pub grid: GridConfig,
    /// Maximum detector calls in flight during tile dispatch.
    pub concurrency: usize,
    /// Retry policy for every external detector call.
    pub retry: RetryPolicy,
    /// Duplicate-suppression thresholds for the merge stage.
    pub merge: MergeConfig,
    /// Character budget for the forwarded text context.
    pub context_truncation_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tiling_threshold: 2000,
            grid: GridConfig::default(),
            concurrency: 10,
            retry: RetryPolicy::default(),
            merge: MergeConfig::default(),
            context_truncation_chars: 5000,
        }
    }
}

/// Caller-supplied auxiliary hints, forwarded to the collaborator.
#[derive(Default, Clone)]
pub struct DetectionHints {
    /// Extracted document text (schedule rows, drawing notes). Forwarded on
    /// whole-page calls, truncated to the configured budget.
    pub text_context: Option<String>,
    /// Reference patches of the symbols being searched for. Forwarded on
    /// every call.
    pub exemplars: Vec<ExemplarCrop>,
}

/// The main, top-level struct for the location engine.
pub struct PlanPipeline<D> {
    detector: D,
    config: PipelineConfig,
}

impl<D: Detector> PlanPipeline<D> {
    pub fn new(detector: D, config: PipelineConfig) -> Self {
        Self { detector, config }
    }

    /// Locates the described equipment across a set of page images.
    ///
    /// Detections come back in the full-image 0-1000 frame of their page and
    /// carry the 1-based page number. A page whose calls all fail contributes
    /// an empty slice rather than an error; only an invalid grid
    /// configuration, checked up front, fails the request.
    pub async fn locate_equipment(
        &self,
        pages: &[DynamicImage],
        descriptors: &[String],
        hints: &DetectionHints,
    ) -> Result<Vec<Detection>, GridConfigError> {
        self.config.grid.validate()?;

        let mut located = Vec::new();
        for (page_index, page) in pages.iter().enumerate() {
            let page_number = page_index as u32 + 1;
            let (width, height) = page.dimensions();

            let page_detections = if width > self.config.tiling_threshold || height > self.config.tiling_threshold {
                info!(page = page_number, width, height, "page exceeds the direct-call threshold, tiling");
                self.locate_with_tiling(page, descriptors, hints, page_number).await?
            } else {
                self.locate_whole_page(page, descriptors, hints, page_number).await
            };

            located.extend(page_detections);
        }
        Ok(located)
    }

    async fn locate_with_tiling(
        &self,
        page: &DynamicImage,
        descriptors: &[String],
        hints: &DetectionHints,
        page_number: u32,
    ) -> Result<Vec<Detection>, GridConfigError> {
        let (width, height) = page.dimensions();
        let tiles = grid_planner::carve_tiles(page, &self.config.grid)?;

        let dispatcher = TileDispatcher {
            concurrency: self.config.concurrency,
            retry: self.config.retry,
        };
        let raw = dispatcher
            .dispatch(
                &self.detector,
                &tiles,
                descriptors,
                &hints.exemplars,
                page_number,
                width,
                height,
            )
            .await;

        Ok(detection_merger::merge_detections(raw, &self.config.merge))
    }

    async fn locate_whole_page(
        &self,
        page: &DynamicImage,
        descriptors: &[String],
        hints: &DetectionHints,
        page_number: u32,
    ) -> Vec<Detection> {
        let context = hints
            .text_context
            .as_deref()
            .map(|text| truncate_chars(text, self.config.context_truncation_chars));

        let outcome = self
            .config
            .retry
            .run(|| {
                self.detector.detect(DetectionQuery {
                    image: page,
                    descriptors,
                    text_context: context,
                    exemplars: &hints.exemplars,
                })
            })
            .await;

        match outcome {
            Ok(text) => {
                let mut detections = response_parser::parse_detections(&text);
                for detection in &mut detections {
                    detection.page = Some(page_number);
                }
                detections
            }
            Err(error) => {
                warn!(page = page_number, %error, "whole-page detection failed, returning no detections for this page");
                Vec::new()
            }
        }
    }
}

/// Truncates on a character boundary so multi-byte text can never be split
/// mid-character.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

// THEORY:
// The `detector` module is the single seam between this crate and the outside
// world: the vision-capable inference collaborator that actually recognizes
// equipment. Everything else in the engine (tiling, dispatch, remapping,
// merging) exists to work around that collaborator's constraints, so its
// contract is kept deliberately narrow.
//
// Key architectural principles:
// 1.  **Trait At The Seam**: callers implement `Detector` for whatever client
//     they use (an HTTP API, a local model, a mock in tests). The engine only
//     ever sees the trait.
// 2.  **Raw Text Out**: a call returns the collaborator's response text as-is.
//     Locating and parsing the JSON array inside it is the response parser's
//     job, because that boundary must be total and the transport must not
//     care.
// 3.  **Two-Way Failure Split**: every failure is either transient (rate
//     limiting, temporary unavailability, a collaborator-side internal error)
//     and worth retrying, or permanent (the request itself was rejected) and
//     not. The retry policy branches on exactly this split and nothing else.
//
// Prompt construction, authentication, and transport encoding all live behind
// the implementor's side of this trait; the query carries only what the
// engine owns and forwards.

use crate::core_modules::exemplar::ExemplarCrop;
use image::DynamicImage;
use std::future::Future;
use thiserror::Error;

/// Failure taxonomy for one inference call.
#[derive(Debug, Clone, Error)]
pub enum DetectorError {
    /// Rate limiting, temporary unavailability, or a collaborator-side
    /// internal error. Worth retrying.
    #[error("transient detector failure: {0}")]
    Transient(String),
    /// The request itself was rejected (malformed payload, unsupported
    /// input). Retrying would fail identically.
    #[error("permanent detector failure: {0}")]
    Permanent(String),
}

impl DetectorError {
    pub fn is_transient(&self) -> bool {
        matches!(self, DetectorError::Transient(_))
    }
}

/// Everything forwarded to the collaborator for a single call.
pub struct DetectionQuery<'a> {
    /// The pixels to search: a carved tile or a whole page.
    pub image: &'a DynamicImage,
    /// Opaque, caller-supplied names of the object types to look for.
    pub descriptors: &'a [String],
    /// Extracted document text for grounding, already truncated upstream.
    pub text_context: Option<&'a str>,
    /// Reference patches showing what the searched-for symbols look like.
    pub exemplars: &'a [ExemplarCrop],
}

/// The external vision collaborator. `detect` returns free text that should
/// contain a JSON array of detections in the query image's local 0-1000
/// frame; the engine parses it tolerantly and remaps coordinates itself.
pub trait Detector: Send + Sync {
    fn detect(&self, query: DetectionQuery<'_>) -> impl Future<Output = Result<String, DetectorError>> + Send;
}

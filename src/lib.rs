// THEORY:
// This file is the main entry point for the `plan_vision` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers (like an upload-handling
// service or a command-line harness).
//
// The primary goal is to export the `PlanPipeline` and its associated data
// structures (`PipelineConfig`, `Detection`, etc.) as the clean, high-level
// interface for the entire location engine, together with the `Detector` trait
// that callers implement for their inference client. The internal modules
// (`core_modules`) carry the individual pipeline stages.

pub mod core_modules;
pub mod detector;
pub mod pipeline;

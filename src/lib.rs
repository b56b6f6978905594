// THEORY:
// This file is the main entry point for the `pixelart_engine` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers (like the demo CLI runner).
//
// The primary goal is to export the conversion pipelines and their associated
// data structures (`PipelineConfig`, `PixelBuffer`, `ImageOutcome`, the error
// kinds) as the clean, high-level interface for the engine. The internal
// modules (`core_modules`) stay encapsulated behind them, providing a clean
// separation between the transform algorithms and their orchestration.

pub mod core_modules;
pub mod parallel_pipeline;
pub mod pipeline;

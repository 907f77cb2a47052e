//! Core processing building blocks: letterbox resize-with-padding, histogram
//! equalization, annotation, and crop extraction. These are internal primitives
//! consumed by the high-level `api` module.
pub mod params;
pub mod processing;

//! facegate-core — Face localization and histogram-descriptor matching.
//!
//! Decodes an uploaded image, localizes the most prominent face with a
//! pretrained SeetaFace funnel cascade, reduces the face crop to a
//! 768-value color-histogram descriptor, and scores descriptors against
//! each other with Pearson correlation.
//!
//! Color histograms are lighting-sensitive and deliberately simple; this
//! is a compatibility-preserving scoring scheme, not state-of-the-art
//! face recognition.

pub mod decode;
pub mod detector;
pub mod histogram;
pub mod types;

pub use detector::{CascadeLocalizer, Localizer, LocalizerError};
pub use histogram::{extract_descriptor, DESCRIPTOR_LEN};
pub use types::{CorrelationMatcher, FaceTemplate, MatchResult, Matcher};

/// Edge length of the canonical square face crop fed to the extractor.
pub const FACE_CROP_SIZE: u32 = 128;

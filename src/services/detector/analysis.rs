//! Per-category document analyses reported next to the model score.
//!
//! No algorithm is defined for any of these yet. Each one reports a
//! versioned record with status `not_implemented`; consumers key on
//! `schema_version` so real findings can be added without breaking them.

use image::DynamicImage;

use crate::models::detection::{AnalysisDetails, SubAnalysis};

/// Run every analysis category over a decoded document.
pub fn analyze(image: &DynamicImage) -> AnalysisDetails {
    AnalysisDetails {
        font_consistency: check_font_consistency(image),
        pixel_analysis: analyze_pixels(image),
        compression_artifacts: detect_compression_artifacts(image),
    }
}

pub fn check_font_consistency(_image: &DynamicImage) -> SubAnalysis {
    SubAnalysis::not_implemented()
}

pub fn analyze_pixels(_image: &DynamicImage) -> SubAnalysis {
    SubAnalysis::not_implemented()
}

pub fn detect_compression_artifacts(_image: &DynamicImage) -> SubAnalysis {
    SubAnalysis::not_implemented()
}

use serde::{Deserialize, Serialize};

/// Scores strictly above this value are classified as authentic.
pub const AUTHENTICITY_THRESHOLD: f64 = 0.5;

/// Output schema version for the per-category analysis records.
pub const ANALYSIS_SCHEMA_VERSION: u32 = 1;

/// Classify a model confidence score.
pub fn is_authentic(confidence_score: f64) -> bool {
    confidence_score > AUTHENTICITY_THRESHOLD
}

/// Outcome of one sub-analysis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    NotImplemented,
    Completed,
}

/// Versioned result of a single analysis category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubAnalysis {
    pub schema_version: u32,
    pub status: AnalysisStatus,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub findings: serde_json::Map<String, serde_json::Value>,
}

impl SubAnalysis {
    pub fn not_implemented() -> Self {
        Self {
            schema_version: ANALYSIS_SCHEMA_VERSION,
            status: AnalysisStatus::NotImplemented,
            findings: serde_json::Map::new(),
        }
    }
}

/// The three analysis categories reported alongside the model score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisDetails {
    pub font_consistency: SubAnalysis,
    pub pixel_analysis: SubAnalysis,
    pub compression_artifacts: SubAnalysis,
}

impl AnalysisDetails {
    pub fn placeholder() -> Self {
        Self {
            font_consistency: SubAnalysis::not_implemented(),
            pixel_analysis: SubAnalysis::not_implemented(),
            compression_artifacts: SubAnalysis::not_implemented(),
        }
    }
}

/// Result of running the forgery detector over one document image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionResult {
    pub is_authentic: bool,
    pub confidence_score: f64,
    pub analysis_details: AnalysisDetails,
}

impl DetectionResult {
    pub fn new(confidence_score: f64, analysis_details: AnalysisDetails) -> Self {
        Self {
            is_authentic: is_authentic(confidence_score),
            confidence_score,
            analysis_details,
        }
    }

    /// The `analysis_results` payload persisted on a completed job.
    pub fn analysis_results(&self) -> AnalysisResults {
        AnalysisResults::new(self.is_authentic, self.analysis_details.clone())
    }
}

/// Analysis mapping stored on a completed job: the verdict plus one entry
/// per analysis category at the top level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResults {
    pub is_authentic: bool,
    #[serde(flatten)]
    pub details: AnalysisDetails,
}

impl AnalysisResults {
    pub fn new(is_authentic: bool, details: AnalysisDetails) -> Self {
        Self {
            is_authentic,
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_boundary() {
        assert!(!is_authentic(0.5));
        assert!(is_authentic(0.500_001));
        assert!(!is_authentic(0.0));
        assert!(is_authentic(1.0));
    }

    #[test]
    fn test_detection_result_classifies_score() {
        let low = DetectionResult::new(0.31, AnalysisDetails::placeholder());
        assert!(!low.is_authentic);
        let high = DetectionResult::new(0.93, AnalysisDetails::placeholder());
        assert!(high.is_authentic);
        assert!(high.analysis_results().is_authentic);
    }

    #[test]
    fn test_sub_analysis_schema() {
        let value = serde_json::to_value(SubAnalysis::not_implemented()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "schema_version": 1, "status": "not_implemented" })
        );
    }

    #[test]
    fn test_analysis_results_parse_back() {
        let results = AnalysisResults::new(false, AnalysisDetails::placeholder());
        let value = serde_json::to_value(&results).unwrap();
        assert_eq!(value["is_authentic"], false);
        assert_eq!(value["pixel_analysis"]["status"], "not_implemented");
        let parsed: AnalysisResults = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, results);
    }
}

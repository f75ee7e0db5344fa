//! Analysis modes and the structured result shape returned by the backend

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The analysis variant requested; selects which remote operation runs
/// and which result shape comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Terrestrial soil composition analysis
    Soil,
    /// Lunar surface sample analysis
    Lunar,
}

impl AnalysisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::Soil => "soil",
            AnalysisMode::Lunar => "lunar",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AnalysisMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "soil" => Ok(AnalysisMode::Soil),
            "lunar" => Ok(AnalysisMode::Lunar),
            other => Err(crate::Error::Internal(format!(
                "unknown analysis mode: {}",
                other
            ))),
        }
    }
}

/// Habitability assessment attached to every report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habitability {
    /// One-word verdict, e.g. "Challenging"
    pub summary: String,
    /// Free-form explanation
    pub details: String,
}

/// Structured result of one analysis request.
///
/// The soil endpoint labels its sample field `soilType` and the lunar
/// endpoint `sampleType`; the alias accepts both. Keys not modelled here
/// are kept in `extra` so the renderer can still show them in a generic
/// key/value block. The coordinator never interprets these fields beyond
/// passing them to the message log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// What the sample was classified as
    #[serde(rename = "sampleType", alias = "soilType")]
    pub sample_type: String,
    /// Substance name -> detected level
    #[serde(default)]
    pub composition: BTreeMap<String, String>,
    /// Habitability verdict
    pub habitability: Habitability,
    /// Any fields the backend added that we do not model
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_soil_result() {
        let json = r#"{
            "soilType": "Loamy Sand",
            "composition": { "Silica": "High", "IronOxide": "Medium" },
            "habitability": { "summary": "Challenging", "details": "Low nutrient levels." }
        }"#;

        let report: AnalysisReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.sample_type, "Loamy Sand");
        assert_eq!(report.composition["Silica"], "High");
        assert_eq!(report.habitability.summary, "Challenging");
        assert!(report.extra.is_empty());
    }

    #[test]
    fn test_parse_lunar_result_keeps_unknown_fields() {
        let json = r#"{
            "sampleType": "Lunar Regolith (Basalt)",
            "composition": { "Water Ice (H₂O)": "None Detected" },
            "habitability": { "summary": "Inhospitable", "details": "Lacks organic matter." },
            "confidence": 0.87
        }"#;

        let report: AnalysisReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.sample_type, "Lunar Regolith (Basalt)");
        assert_eq!(report.extra["confidence"], serde_json::json!(0.87));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("soil".parse::<AnalysisMode>().unwrap(), AnalysisMode::Soil);
        assert_eq!("LUNAR".parse::<AnalysisMode>().unwrap(), AnalysisMode::Lunar);
        assert!("martian".parse::<AnalysisMode>().is_err());
    }
}

use crate::correction::BoatAngleSettings;
use crate::diagnostics::PlayerPose;
use crate::resolver::ResolverParams;
use crate::types::EyeThrow;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Both,
}

impl OutputFormat {
    pub fn includes_text(self) -> bool {
        matches!(self, OutputFormat::Text | OutputFormat::Both)
    }

    pub fn includes_json(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Both)
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DemoOutputConfig {
    pub format: OutputFormat,
    /// Report path; JSON goes to stdout when unset.
    pub json_out: Option<PathBuf>,
    /// Candidate rows printed in the text summary.
    pub max_rows: usize,
}

impl Default for DemoOutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            json_out: None,
            max_rows: 5,
        }
    }
}

/// Raw-yaw correction applied before throws enter the session.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct CorrectionConfig {
    pub boat: BoatAngleSettings,
    /// Yaw reading taken while seated in the boat; validated before use.
    pub boat_angle_deg: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ResolveDemoConfig {
    pub throws: Vec<EyeThrow>,
    #[serde(default)]
    pub params: ResolverParams,
    /// When present, throw angles are raw yaw readings to correct.
    #[serde(default)]
    pub correction: Option<CorrectionConfig>,
    /// Signed number of adjustment steps applied to the last throw.
    #[serde(default)]
    pub nudge_steps: i32,
    /// Player pose for relative candidate rows; defaults to the last throw.
    #[serde(default)]
    pub pose: Option<PlayerPose>,
    #[serde(default)]
    pub output: DemoOutputConfig,
}

pub fn load_config(path: &Path) -> Result<ResolveDemoConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let json = r#"{
            "throws": [
                { "x": 10.0, "z": -4.0, "angleDeg": 30.0 },
                { "x": 200.0, "z": 90.0, "angleDeg": 41.5, "kind": "BOAT" }
            ],
            "output": { "format": "both" }
        }"#;
        let config: ResolveDemoConfig = serde_json::from_str(json).expect("valid demo config");
        assert_eq!(config.throws.len(), 2);
        assert_eq!(config.nudge_steps, 0);
        assert!(config.correction.is_none());
        assert!(config.output.format.includes_text() && config.output.format.includes_json());
        assert_eq!(config.output.max_rows, 5);
        assert_eq!(config.params, ResolverParams::default());
    }
}

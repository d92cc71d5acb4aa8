//! JSON link definition and parameter-field resolution.
//!
//! Parameter values may be plain JSON numbers or formula strings
//! ("23-30-5", "10*log(2000)"); formulas are evaluated through the
//! allow-listed expression evaluator before anything reaches the engine.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use link_budget::{parse_los_condition, parse_scenario, LinkParameters, LinkType};

/// One link definition as it arrives from a file or template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkInput {
    /// Topology tag: `satellite-uplink`, `satellite-downlink`,
    /// `terrestrial-uplink` or `terrestrial-downlink`.
    pub link_type: String,
    /// Terrestrial scene selector (`rural-macro` / `urban-macro`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario: Option<String>,
    /// LOS condition (`los` / `nlos` / `weighted`, default `weighted`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub los_condition: Option<String>,
    /// Flat parameter fields; values are numbers or formula strings.
    pub params: BTreeMap<String, Value>,
}

impl LinkInput {
    /// Load a definition from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("cannot open link definition {}", path.display()))?;
        let input: LinkInput = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("malformed link definition {}", path.display()))?;
        Ok(input)
    }

    /// Resolve every field to a number and build the typed parameter set.
    pub fn resolve(&self) -> Result<LinkParameters> {
        let link_type = LinkType::parse(&self.link_type)?;

        let mut values = BTreeMap::new();
        for (key, raw) in &self.params {
            values.insert(key.clone(), resolve_field(key, raw)?);
        }

        let scenario = self.scenario.as_deref().map(parse_scenario).transpose()?;
        let los_condition = self
            .los_condition
            .as_deref()
            .map(parse_los_condition)
            .transpose()?;

        let params = LinkParameters::from_map(link_type, &values, scenario, los_condition)?;
        Ok(params)
    }
}

fn resolve_field(key: &str, raw: &Value) -> Result<f64> {
    match raw {
        Value::Number(n) => n
            .as_f64()
            .with_context(|| format!("parameter `{key}` is not representable as f64")),
        Value::String(text) => formula_eval::evaluate(text)
            .with_context(|| format!("parameter `{key}`: cannot evaluate `{text}`")),
        other => bail!("parameter `{key}` must be a number or formula string, got {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use link_budget::LinkTopology;

    #[test]
    fn resolves_numbers_and_formulas() {
        let input: LinkInput = serde_json::from_str(
            r#"{
                "link_type": "satellite-uplink",
                "params": {
                    "frequency": 1.71,
                    "bandwidth": 0.72,
                    "tx_eirp": "23-30-5",
                    "rx_antenna_gain": 30.72,
                    "rx_noise_figure": 2.4,
                    "rx_noise_temp": 290,
                    "satellite_height": 400,
                    "satellite_scan_angle": "arcsin(0.5)",
                    "interference_psd": "-inf"
                }
            }"#,
        )
        .unwrap();
        let params = input.resolve().unwrap();
        assert_eq!(params.common.tx_eirp_dbw, -12.0);
        assert_eq!(
            params.common.interference_psd_dbm_mhz,
            Some(f64::NEG_INFINITY)
        );
        match params.topology {
            LinkTopology::Satellite(sat) => {
                assert!((sat.scan_angle_deg - 30.0).abs() < 1.0e-9)
            }
            _ => panic!("expected satellite topology"),
        }
    }

    #[test]
    fn terrestrial_scenario_comes_from_the_envelope() {
        let input: LinkInput = serde_json::from_str(
            r#"{
                "link_type": "terrestrial-downlink",
                "scenario": "rural-macro",
                "los_condition": "nlos",
                "params": {
                    "frequency": 1.81,
                    "bandwidth": 5,
                    "tx_eirp": "46+30+22.5",
                    "rx_antenna_gain": -5,
                    "rx_noise_figure": 7,
                    "rx_noise_temp": 290,
                    "distance": 1
                }
            }"#,
        )
        .unwrap();
        let params = input.resolve().unwrap();
        assert_eq!(params.common.tx_eirp_dbw, 98.5);
        match params.topology {
            LinkTopology::Terrestrial(t) => {
                assert_eq!(t.scenario, link_budget::Scenario::RuralMacro);
                assert_eq!(t.los_condition, link_budget::LosCondition::Nlos);
            }
            _ => panic!("expected terrestrial topology"),
        }
    }

    #[test]
    fn bad_formula_names_the_field() {
        let input: LinkInput = serde_json::from_str(
            r#"{
                "link_type": "satellite-uplink",
                "params": { "frequency": "exec(1)" }
            }"#,
        )
        .unwrap();
        let err = input.resolve().unwrap_err();
        assert!(
            format!("{err:#}").contains("frequency"),
            "error should name the offending field: {err:#}"
        );
    }

    #[test]
    fn non_scalar_field_is_rejected() {
        let input: LinkInput = serde_json::from_str(
            r#"{
                "link_type": "satellite-uplink",
                "params": { "frequency": [1.71] }
            }"#,
        )
        .unwrap();
        assert!(input.resolve().is_err());
    }
}

//! Built-in per-topology link definitions.
//!
//! Each template carries the conventional starting values for its
//! topology: L-band LTE-style carriers (1.71 GHz up, 1.81 GHz down), a
//! 400 km orbit for the satellite links, handheld-terminal EIRP entered
//! as a formula (element power + antenna gain - body loss), and the usual
//! scalar loss lineup. Templates resolve and compute as-is, so they
//! double as worked examples.

use serde_json::{json, Value};

use link_budget::LinkType;

use crate::input::LinkInput;

fn entry(params: &mut serde_json::Map<String, Value>, key: &str, value: Value) {
    params.insert(key.to_string(), value);
}

/// The built-in definition for one link topology.
pub fn template_for(link_type: LinkType) -> LinkInput {
    let mut params = serde_json::Map::new();

    match link_type {
        LinkType::SatelliteUplink | LinkType::TerrestrialUplink => {
            entry(&mut params, "frequency", json!(1.71));
            entry(&mut params, "bandwidth", json!(0.72));
            // Terminal EIRP: 23 dBm transmit power, -30 for dBm to dBW,
            // -5 dB body loss.
            entry(&mut params, "tx_eirp", json!("23-30-5"));
        }
        LinkType::SatelliteDownlink | LinkType::TerrestrialDownlink => {
            entry(&mut params, "frequency", json!(1.81));
            entry(&mut params, "bandwidth", json!(5));
        }
    }

    match link_type {
        LinkType::SatelliteUplink => {
            entry(&mut params, "rx_antenna_gain", json!(30.72));
            entry(&mut params, "rx_noise_figure", json!(2.4));
        }
        LinkType::SatelliteDownlink => {
            entry(&mut params, "tx_eirp", json!(56));
            entry(&mut params, "rx_antenna_gain", json!(-5));
            entry(&mut params, "rx_noise_figure", json!(7));
        }
        LinkType::TerrestrialUplink => {
            entry(&mut params, "rx_antenna_gain", json!(30.72));
            entry(&mut params, "rx_noise_figure", json!(2.4));
        }
        LinkType::TerrestrialDownlink => {
            entry(&mut params, "tx_eirp", json!("46+30+22.5"));
            entry(&mut params, "rx_antenna_gain", json!(-5));
            entry(&mut params, "rx_noise_figure", json!(7));
        }
    }
    entry(&mut params, "rx_noise_temp", json!(290));

    let (scenario, los_condition) = if link_type.is_satellite() {
        entry(&mut params, "satellite_height", json!(400));
        entry(&mut params, "satellite_scan_angle", json!(0));
        entry(&mut params, "atmospheric_loss", json!(0.1));
        entry(&mut params, "scintillation_loss", json!(0.3));
        entry(&mut params, "polarization_loss", json!(3));
        entry(&mut params, "beam_edge_loss", json!(1));
        entry(&mut params, "scan_loss", json!(4));
        entry(&mut params, "link_margin", json!(3));
        entry(&mut params, "rain_rate", json!(50));
        (None, None)
    } else {
        entry(&mut params, "distance", json!(1));
        entry(&mut params, "beam_edge_loss", json!(1));
        (Some("urban-macro".to_string()), Some("weighted".to_string()))
    };

    LinkInput {
        link_type: link_type.as_str().to_string(),
        scenario,
        los_condition,
        params: params.into_iter().collect(),
    }
}

//! Typed link parameter records and the flat-map call boundary.
//!
//! The engine's external interface is a topology tag plus a flat
//! key-to-number map (optional keys entirely absent meaning disabled).
//! Internally that map is parsed once into [`LinkParameters`], a tagged
//! topology variant validated at construction, so the computation itself
//! never does string lookups.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use propagation_models::{LosCondition, Scenario};

use crate::{LinkBudgetError, Result};

/// The four supported link topologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkType {
    SatelliteUplink,
    SatelliteDownlink,
    TerrestrialUplink,
    TerrestrialDownlink,
}

impl LinkType {
    pub fn is_satellite(&self) -> bool {
        matches!(self, LinkType::SatelliteUplink | LinkType::SatelliteDownlink)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkType::SatelliteUplink => "satellite-uplink",
            LinkType::SatelliteDownlink => "satellite-downlink",
            LinkType::TerrestrialUplink => "terrestrial-uplink",
            LinkType::TerrestrialDownlink => "terrestrial-downlink",
        }
    }

    /// Parse the topology tag; unrecognized tags are a configuration error.
    pub fn parse(tag: &str) -> Result<Self> {
        match tag {
            "satellite-uplink" => Ok(LinkType::SatelliteUplink),
            "satellite-downlink" => Ok(LinkType::SatelliteDownlink),
            "terrestrial-uplink" => Ok(LinkType::TerrestrialUplink),
            "terrestrial-downlink" => Ok(LinkType::TerrestrialDownlink),
            other => Err(LinkBudgetError::UnknownLinkType(other.to_string())),
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a scenario selector string.
pub fn parse_scenario(tag: &str) -> Result<Scenario> {
    match tag {
        "rural-macro" | "rma" => Ok(Scenario::RuralMacro),
        "urban-macro" | "uma" => Ok(Scenario::UrbanMacro),
        other => Err(LinkBudgetError::UnknownScenario(other.to_string())),
    }
}

/// Parse a LOS condition selector string.
pub fn parse_los_condition(tag: &str) -> Result<LosCondition> {
    match tag {
        "los" => Ok(LosCondition::Los),
        "nlos" => Ok(LosCondition::Nlos),
        "weighted" => Ok(LosCondition::Weighted),
        other => Err(LinkBudgetError::UnknownLosCondition(other.to_string())),
    }
}

/// Parameters shared by every topology.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommonParams {
    /// Carrier frequency, GHz.
    pub frequency_ghz: f64,
    /// Channel bandwidth, MHz.
    pub bandwidth_mhz: f64,
    /// Transmitter EIRP, dBW.
    pub tx_eirp_dbw: f64,
    /// Receive antenna gain, dBi.
    pub rx_antenna_gain_dbi: f64,
    /// Receiver noise figure, dB.
    pub rx_noise_figure_db: f64,
    /// Receive antenna noise temperature, K.
    pub rx_antenna_temp_k: f64,
    /// Co-channel interference PSD, dBm/MHz. Absent means no interference
    /// (treated as -inf, so C/(N+I) collapses to C/N).
    pub interference_psd_dbm_mhz: Option<f64>,
}

/// Scalar loss terms, dB each. A disabled loss is simply zero here, so
/// disabling a term in the front end and setting it to zero are the same
/// computation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LossTerms {
    pub atmospheric_db: f64,
    pub scintillation_db: f64,
    pub polarization_db: f64,
    pub beam_edge_db: f64,
    pub scan_db: f64,
    pub link_margin_db: f64,
}

impl LossTerms {
    pub fn sum_db(&self) -> f64 {
        self.atmospheric_db
            + self.scintillation_db
            + self.polarization_db
            + self.beam_edge_db
            + self.scan_db
            + self.link_margin_db
    }
}

/// Satellite-topology parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SatelliteParams {
    /// Orbit height above the surface, km.
    pub height_km: f64,
    /// Scan angle at the satellite, degrees off nadir.
    pub scan_angle_deg: f64,
    /// Rain rate, mm/h. Absent means rain fade disabled (0 dB).
    pub rain_rate_mm_hr: Option<f64>,
    pub losses: LossTerms,
}

/// Terrestrial-topology parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrestrialParams {
    /// Ground distance between base station and terminal, km.
    pub distance_km: f64,
    pub scenario: Scenario,
    pub los_condition: LosCondition,
    pub losses: LossTerms,
}

/// Topology-specific half of the parameter record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LinkTopology {
    Satellite(SatelliteParams),
    Terrestrial(TerrestrialParams),
}

/// One immutable snapshot of everything a link computation needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkParameters {
    pub link_type: LinkType,
    pub common: CommonParams,
    pub topology: LinkTopology,
}

impl LinkParameters {
    /// Build and validate a satellite-topology parameter set.
    pub fn satellite(
        link_type: LinkType,
        common: CommonParams,
        satellite: SatelliteParams,
    ) -> Result<Self> {
        if !link_type.is_satellite() {
            return Err(LinkBudgetError::TopologyMismatch(link_type));
        }
        let params = LinkParameters {
            link_type,
            common,
            topology: LinkTopology::Satellite(satellite),
        };
        params.validate()?;
        Ok(params)
    }

    /// Build and validate a terrestrial-topology parameter set.
    pub fn terrestrial(
        link_type: LinkType,
        common: CommonParams,
        terrestrial: TerrestrialParams,
    ) -> Result<Self> {
        if link_type.is_satellite() {
            return Err(LinkBudgetError::TopologyMismatch(link_type));
        }
        let params = LinkParameters {
            link_type,
            common,
            topology: LinkTopology::Terrestrial(terrestrial),
        };
        params.validate()?;
        Ok(params)
    }

    /// Build a parameter set from the flat key-to-number boundary map.
    ///
    /// Required keys: `frequency`, `bandwidth`, `tx_eirp`,
    /// `rx_antenna_gain`, `rx_noise_figure`, `rx_noise_temp`, plus
    /// `satellite_height` and `satellite_scan_angle` for satellite
    /// topologies or `distance` for terrestrial ones. Optional loss keys
    /// (`atmospheric_loss`, `scintillation_loss`, `polarization_loss`,
    /// `beam_edge_loss`, `scan_loss`, `link_margin`), `rain_rate` and
    /// `interference_psd` default to disabled when absent.
    ///
    /// Terrestrial topologies additionally need a `scenario`; the LOS
    /// condition defaults to `weighted` when not given.
    pub fn from_map(
        link_type: LinkType,
        values: &BTreeMap<String, f64>,
        scenario: Option<Scenario>,
        los_condition: Option<LosCondition>,
    ) -> Result<Self> {
        let required = |key: &'static str| -> Result<f64> {
            values
                .get(key)
                .copied()
                .ok_or(LinkBudgetError::MissingParameter(key))
        };
        let optional = |key: &str| values.get(key).copied();

        let common = CommonParams {
            frequency_ghz: required("frequency")?,
            bandwidth_mhz: required("bandwidth")?,
            tx_eirp_dbw: required("tx_eirp")?,
            rx_antenna_gain_dbi: required("rx_antenna_gain")?,
            rx_noise_figure_db: required("rx_noise_figure")?,
            rx_antenna_temp_k: required("rx_noise_temp")?,
            interference_psd_dbm_mhz: optional("interference_psd"),
        };

        let losses = LossTerms {
            atmospheric_db: optional("atmospheric_loss").unwrap_or(0.0),
            scintillation_db: optional("scintillation_loss").unwrap_or(0.0),
            polarization_db: optional("polarization_loss").unwrap_or(0.0),
            beam_edge_db: optional("beam_edge_loss").unwrap_or(0.0),
            scan_db: optional("scan_loss").unwrap_or(0.0),
            link_margin_db: optional("link_margin").unwrap_or(0.0),
        };

        if link_type.is_satellite() {
            LinkParameters::satellite(
                link_type,
                common,
                SatelliteParams {
                    height_km: required("satellite_height")?,
                    scan_angle_deg: required("satellite_scan_angle")?,
                    rain_rate_mm_hr: optional("rain_rate"),
                    losses,
                },
            )
        } else {
            LinkParameters::terrestrial(
                link_type,
                common,
                TerrestrialParams {
                    distance_km: required("distance")?,
                    scenario: scenario.ok_or(LinkBudgetError::MissingParameter("scenario"))?,
                    los_condition: los_condition.unwrap_or(LosCondition::Weighted),
                    losses,
                },
            )
        }
    }

    /// Reject physically invalid inputs before any model evaluation.
    pub fn validate(&self) -> Result<()> {
        let c = &self.common;
        if c.frequency_ghz <= 0.0 {
            return Err(propagation_models::PropagationError::NonPositiveFrequency(
                c.frequency_ghz,
            )
            .into());
        }
        if c.bandwidth_mhz <= 0.0 {
            return Err(LinkBudgetError::NonPositiveBandwidth(c.bandwidth_mhz));
        }
        if c.rx_antenna_temp_k <= 0.0 {
            return Err(LinkBudgetError::NonPositiveNoiseTemperature(
                c.rx_antenna_temp_k,
            ));
        }
        if c.rx_noise_figure_db < 0.0 {
            return Err(LinkBudgetError::NegativeNoiseFigure(c.rx_noise_figure_db));
        }
        match &self.topology {
            LinkTopology::Satellite(sat) => {
                if sat.height_km <= 0.0 {
                    return Err(
                        propagation_models::PropagationError::NonPositiveHeight(sat.height_km)
                            .into(),
                    );
                }
                if let Some(rate) = sat.rain_rate_mm_hr {
                    if rate < 0.0 {
                        return Err(LinkBudgetError::NegativeRainRate(rate));
                    }
                }
                if !self.link_type.is_satellite() {
                    return Err(LinkBudgetError::TopologyMismatch(self.link_type));
                }
            }
            LinkTopology::Terrestrial(terr) => {
                if terr.distance_km <= 0.0 {
                    return Err(propagation_models::PropagationError::NonPositiveDistance(
                        terr.distance_km,
                    )
                    .into());
                }
                if self.link_type.is_satellite() {
                    return Err(LinkBudgetError::TopologyMismatch(self.link_type));
                }
            }
        }
        Ok(())
    }
}

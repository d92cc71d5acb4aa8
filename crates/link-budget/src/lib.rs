//! RF Link-Budget Engine
//!
//! Orchestrates a full link computation for one link configuration:
//! selects the applicable propagation path (satellite scan-angle geometry +
//! free-space pathloss + optional rain fade, or 3GPP TR 38.901 terrestrial
//! pathloss), folds in the enabled scalar loss terms, derives noise and
//! signal power spectral densities, and produces the final metric set
//! (C/N, C/(N+I), G/T).
//!
//! The engine is a pure function of its inputs plus two physical constants
//! (Earth radius, Boltzmann constant): no I/O, no shared mutable state,
//! every [`LinkResult`] fully derived from one [`LinkParameters`] snapshot.
//! Calls are independently safe from concurrent threads.

use thiserror::Error;

pub mod engine;
pub mod params;
pub mod report;

pub use engine::{
    carrier_to_noise_plus_interference_db, compute_link, gt_ratio_db_per_k, noise_psd_dbm_mhz,
    received_signal_psd_dbm_mhz, system_noise_temperature_k, LinkResult, BOLTZMANN_J_PER_K,
};
pub use params::{
    parse_los_condition, parse_scenario, CommonParams, LinkParameters, LinkTopology, LinkType,
    LossTerms, SatelliteParams, TerrestrialParams,
};
pub use report::{detailed_steps, result_rows, CalculationStep, LinkReport, ResultRow};

pub use propagation_models::{LosCondition, PropagationError, Scenario};

/// Link-budget failure.
///
/// The first group of variants are domain errors (physically invalid
/// input); the `Unknown*` variants are configuration errors (a selector
/// string the engine does not recognize). Either way the computation they
/// belong to is abandoned whole: no partial result is ever returned.
#[derive(Error, Debug)]
pub enum LinkBudgetError {
    #[error(transparent)]
    Propagation(#[from] PropagationError),
    #[error("bandwidth must be positive, got {0} MHz")]
    NonPositiveBandwidth(f64),
    #[error("antenna noise temperature must be positive, got {0} K")]
    NonPositiveNoiseTemperature(f64),
    #[error("noise figure must be non-negative, got {0} dB")]
    NegativeNoiseFigure(f64),
    #[error("rain rate must be non-negative, got {0} mm/h")]
    NegativeRainRate(f64),
    #[error("missing required parameter `{0}`")]
    MissingParameter(&'static str),
    #[error("link type `{0}` does not match the provided topology")]
    TopologyMismatch(LinkType),
    #[error("unknown link type `{0}` (expected satellite-uplink, satellite-downlink, terrestrial-uplink or terrestrial-downlink)")]
    UnknownLinkType(String),
    #[error("unknown scenario `{0}` (expected rural-macro or urban-macro)")]
    UnknownScenario(String),
    #[error("unknown LOS condition `{0}` (expected los, nlos or weighted)")]
    UnknownLosCondition(String),
}

pub type Result<T> = std::result::Result<T, LinkBudgetError>;

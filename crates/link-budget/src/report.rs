//! Result presentation: labeled output rows, the step-by-step calculation
//! trace, and the serializable report envelope.
//!
//! Everything here re-derives intermediates through the same public
//! formulas the engine uses, so a rendered trace can never disagree with
//! the computed result.

use chrono::{DateTime, Utc};
use serde::Serialize;

use propagation_models::{
    breakpoint_distance_m, max_scan_angle_deg, PathLossBranches, EARTH_RADIUS_KM,
};

use crate::engine::{system_noise_temperature_k, LinkResult};
use crate::params::{LinkParameters, LinkTopology};

/// One labeled output value, ready for tabular display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResultRow {
    /// Stable machine-readable key.
    pub key: &'static str,
    pub label: &'static str,
    pub unit: &'static str,
    pub value: f64,
}

/// Ordered display rows for a computed link. Rows that do not apply to the
/// topology (elevation for terrestrial links, zero rain fade) are omitted.
pub fn result_rows(result: &LinkResult) -> Vec<ResultRow> {
    let mut rows = vec![
        ResultRow {
            key: "distance",
            label: "Link distance",
            unit: "km",
            value: result.distance_km,
        },
        ResultRow {
            key: "path_loss",
            label: "Path loss",
            unit: "dB",
            value: result.path_loss_db,
        },
    ];
    if let Some(elevation) = result.terminal_elevation_deg {
        rows.push(ResultRow {
            key: "terminal_elevation_angle",
            label: "Terminal elevation angle",
            unit: "deg",
            value: elevation,
        });
    }
    if result.rain_fade_db != 0.0 {
        rows.push(ResultRow {
            key: "rain_fade",
            label: "Rain fade",
            unit: "dB",
            value: result.rain_fade_db,
        });
    }
    rows.extend([
        ResultRow {
            key: "total_loss",
            label: "Total loss",
            unit: "dB",
            value: result.total_loss_db,
        },
        ResultRow {
            key: "noise_psd",
            label: "Noise PSD",
            unit: "dBm/MHz",
            value: result.noise_psd_dbm_mhz,
        },
        ResultRow {
            key: "received_signal_psd",
            label: "Received signal PSD",
            unit: "dBm/MHz",
            value: result.received_signal_psd_dbm_mhz,
        },
        ResultRow {
            key: "c_to_n",
            label: "C/N",
            unit: "dB",
            value: result.c_to_n_db,
        },
        ResultRow {
            key: "c_to_n_plus_i",
            label: "C/(N+I)",
            unit: "dB",
            value: result.c_to_n_plus_i_db,
        },
        ResultRow {
            key: "gt_ratio",
            label: "G/T",
            unit: "dB/K",
            value: result.gt_ratio_db_per_k,
        },
    ]);
    rows
}

/// One intermediate value in the calculation trace, with the formula it
/// came from rendered against the actual inputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationStep {
    pub label: &'static str,
    /// Substituted formula text, empty when the step is a plain lookup.
    pub detail: String,
    pub unit: &'static str,
    pub value: f64,
}

/// Step-by-step intermediate values for a computed link, in evaluation
/// order: geometry (or terrestrial branch values), losses, noise chain,
/// then the final ratios.
pub fn detailed_steps(params: &LinkParameters, result: &LinkResult) -> Vec<CalculationStep> {
    let common = &params.common;
    let t_sys = system_noise_temperature_k(common.rx_noise_figure_db, common.rx_antenna_temp_k);
    let mut steps = Vec::new();

    match &params.topology {
        LinkTopology::Satellite(sat) => {
            // The geometry already succeeded or we would not have a result,
            // so the limit itself is recomputable without failure.
            if let Ok(max_deg) = max_scan_angle_deg(sat.height_km) {
                steps.push(CalculationStep {
                    label: "Maximum scan angle",
                    detail: format!(
                        "asin({EARTH_RADIUS_KM} / ({EARTH_RADIUS_KM} + {}))",
                        sat.height_km
                    ),
                    unit: "deg",
                    value: max_deg,
                });
            }
            if let Some(elevation) = result.terminal_elevation_deg {
                steps.push(CalculationStep {
                    label: "Terminal elevation angle",
                    detail: format!(
                        "180 - asin(({:.0}) * sin({}) / {EARTH_RADIUS_KM}) - 90",
                        EARTH_RADIUS_KM + sat.height_km,
                        sat.scan_angle_deg
                    ),
                    unit: "deg",
                    value: elevation,
                });
            }
            steps.push(CalculationStep {
                label: "Slant range",
                detail: format!(
                    "sqrt(a^2 + b^2 - 2ab*cos(C)), a = {EARTH_RADIUS_KM}, b = {:.0}",
                    EARTH_RADIUS_KM + sat.height_km
                ),
                unit: "km",
                value: result.distance_km,
            });
            steps.push(CalculationStep {
                label: "Free-space path loss",
                detail: format!(
                    "92.45 + 20*log10({}) + 20*log10({:.3})",
                    common.frequency_ghz, result.distance_km
                ),
                unit: "dB",
                value: result.path_loss_db,
            });
            if let Some(rate) = sat.rain_rate_mm_hr.filter(|rate| *rate > 0.0) {
                steps.push(CalculationStep {
                    label: "Rain fade",
                    detail: format!(
                        "a*R^b*Ls, f = {} GHz, R = {rate} mm/h, elevation = {:.2}",
                        common.frequency_ghz,
                        result.terminal_elevation_deg.unwrap_or(0.0)
                    ),
                    unit: "dB",
                    value: result.rain_fade_db,
                });
            }
            steps.push(scalar_losses_step(sat.losses.sum_db()));
        }
        LinkTopology::Terrestrial(terr) => {
            steps.push(CalculationStep {
                label: "Breakpoint distance",
                detail: match terr.scenario {
                    propagation_models::Scenario::RuralMacro => {
                        format!("2*pi*35*1.5*{}e9 / 3e8", common.frequency_ghz)
                    }
                    propagation_models::Scenario::UrbanMacro => {
                        format!("4*(25-1)*(1.5-1)*{}e9 / 3e8", common.frequency_ghz)
                    }
                },
                unit: "m",
                value: breakpoint_distance_m(common.frequency_ghz, terr.scenario),
            });
            let branches = PathLossBranches::evaluate(
                common.frequency_ghz,
                terr.distance_km * 1000.0,
                terr.scenario,
            );
            steps.push(CalculationStep {
                label: "LOS probability",
                detail: format!("Table 7.4.2-1 at {:.0} m", terr.distance_km * 1000.0),
                unit: "",
                value: branches.p_los,
            });
            steps.push(CalculationStep {
                label: "LOS path loss",
                detail: String::new(),
                unit: "dB",
                value: branches.los_db,
            });
            steps.push(CalculationStep {
                label: "NLOS path loss",
                detail: String::new(),
                unit: "dB",
                value: branches.nlos_db,
            });
            steps.push(CalculationStep {
                label: "Selected path loss",
                detail: format!("{:?} condition", terr.los_condition),
                unit: "dB",
                value: result.path_loss_db,
            });
            steps.push(scalar_losses_step(terr.losses.sum_db()));
        }
    }

    steps.push(CalculationStep {
        label: "Total loss",
        detail: "path loss + rain fade + scalar losses".to_string(),
        unit: "dB",
        value: result.total_loss_db,
    });
    steps.push(CalculationStep {
        label: "System noise temperature",
        detail: format!(
            "290*(10^({}/10) - 1) + {}",
            common.rx_noise_figure_db, common.rx_antenna_temp_k
        ),
        unit: "K",
        value: t_sys,
    });
    steps.push(CalculationStep {
        label: "Noise PSD",
        detail: format!("10*log10(1.38e-23 * {t_sys:.1}) + 30 + 60"),
        unit: "dBm/MHz",
        value: result.noise_psd_dbm_mhz,
    });
    steps.push(CalculationStep {
        label: "Received signal PSD",
        detail: format!(
            "{} + 30 - {:.2} + {} - 10*log10({})",
            common.tx_eirp_dbw, result.total_loss_db, common.rx_antenna_gain_dbi, common.bandwidth_mhz
        ),
        unit: "dBm/MHz",
        value: result.received_signal_psd_dbm_mhz,
    });
    steps.push(CalculationStep {
        label: "C/N",
        detail: "received signal PSD - noise PSD".to_string(),
        unit: "dB",
        value: result.c_to_n_db,
    });
    if common.interference_psd_dbm_mhz.is_some() {
        steps.push(CalculationStep {
            label: "C/(N+I)",
            detail: "signal, noise and interference PSDs combined in linear power".to_string(),
            unit: "dB",
            value: result.c_to_n_plus_i_db,
        });
    }
    steps.push(CalculationStep {
        label: "G/T",
        detail: format!("{} - 10*log10({t_sys:.1})", common.rx_antenna_gain_dbi),
        unit: "dB/K",
        value: result.gt_ratio_db_per_k,
    });
    steps
}

fn scalar_losses_step(sum_db: f64) -> CalculationStep {
    CalculationStep {
        label: "Scalar losses",
        detail: "atmospheric + scintillation + polarization + beam edge + scan + margin"
            .to_string(),
        unit: "dB",
        value: sum_db,
    }
}

/// Serializable report envelope: the inputs, the computed metrics and the
/// full trace, stamped with the generation time.
#[derive(Debug, Clone, Serialize)]
pub struct LinkReport {
    pub generated_at: DateTime<Utc>,
    pub parameters: LinkParameters,
    pub result: LinkResult,
    pub steps: Vec<CalculationStep>,
}

impl LinkReport {
    pub fn new(parameters: LinkParameters, result: LinkResult) -> Self {
        let steps = detailed_steps(&parameters, &result);
        LinkReport {
            generated_at: Utc::now(),
            parameters,
            result,
            steps,
        }
    }
}

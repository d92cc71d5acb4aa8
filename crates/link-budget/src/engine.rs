//! The link computation itself.
//!
//! Every public function here is closed-form and stateless; the display
//! and report collaborators call these same functions when they re-render
//! intermediate values, so there is exactly one implementation of each
//! formula in the system.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use propagation_models::{
    free_space_path_loss_db, rain_fade_db, scan_geometry, terrestrial_path_loss_db,
};

use crate::params::{LinkParameters, LinkTopology};
use crate::Result;

/// Boltzmann constant, J/K.
pub const BOLTZMANN_J_PER_K: f64 = 1.38e-23;

/// Final metric set for one computed link. Immutable once produced; the
/// satellite-only fields are `None` for terrestrial topologies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkResult {
    /// Propagation pathloss, dB.
    pub path_loss_db: f64,
    /// Rain fade, dB (0 when not applicable).
    pub rain_fade_db: f64,
    /// Pathloss + rain fade + every enabled scalar loss, dB.
    pub total_loss_db: f64,
    /// Noise power spectral density, dBm/MHz.
    pub noise_psd_dbm_mhz: f64,
    /// Received signal power spectral density, dBm/MHz.
    pub received_signal_psd_dbm_mhz: f64,
    /// Carrier-to-noise ratio, dB.
    pub c_to_n_db: f64,
    /// Carrier-to-(noise + interference) ratio, dB.
    pub c_to_n_plus_i_db: f64,
    /// Receive figure of merit, dB/K.
    pub gt_ratio_db_per_k: f64,
    /// Link distance, km (slant range for satellite topologies).
    pub distance_km: f64,
    /// Terminal elevation angle, degrees (satellite topologies only).
    pub terminal_elevation_deg: Option<f64>,
}

impl LinkResult {
    /// The flat key-to-number output boundary; absent optional fields are
    /// simply not present in the map.
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        let mut map = BTreeMap::new();
        map.insert("path_loss", self.path_loss_db);
        map.insert("rain_fade", self.rain_fade_db);
        map.insert("total_loss", self.total_loss_db);
        map.insert("noise_psd", self.noise_psd_dbm_mhz);
        map.insert("received_signal_psd", self.received_signal_psd_dbm_mhz);
        map.insert("c_to_n", self.c_to_n_db);
        map.insert("c_to_n_plus_i", self.c_to_n_plus_i_db);
        map.insert("gt_ratio", self.gt_ratio_db_per_k);
        map.insert("distance", self.distance_km);
        if let Some(elevation) = self.terminal_elevation_deg {
            map.insert("terminal_elevation_angle", elevation);
        }
        map
    }
}

/// System noise temperature in K from the receiver noise figure and the
/// antenna noise temperature: 290 * (10^(NF/10) - 1) + T_antenna.
pub fn system_noise_temperature_k(noise_figure_db: f64, antenna_temp_k: f64) -> f64 {
    290.0 * (10.0_f64.powf(noise_figure_db / 10.0) - 1.0) + antenna_temp_k
}

/// Noise power spectral density in dBm/MHz: 10*log10(k * T_sys) converted
/// from dBW/Hz by +30 (W to mW) and +60 (Hz to MHz).
pub fn noise_psd_dbm_mhz(noise_figure_db: f64, antenna_temp_k: f64) -> f64 {
    let t_sys = system_noise_temperature_k(noise_figure_db, antenna_temp_k);
    10.0 * (BOLTZMANN_J_PER_K * t_sys).log10() + 30.0 + 60.0
}

/// Received signal power spectral density in dBm/MHz.
///
/// Total received power (dBm) is EIRP (dBW) + 30 - total loss + receive
/// antenna gain; spreading over the bandwidth subtracts 10*log10(B_MHz).
pub fn received_signal_psd_dbm_mhz(
    tx_eirp_dbw: f64,
    total_loss_db: f64,
    rx_antenna_gain_dbi: f64,
    bandwidth_mhz: f64,
) -> f64 {
    let total_power_dbm = tx_eirp_dbw + 30.0 - total_loss_db + rx_antenna_gain_dbi;
    total_power_dbm - 10.0 * bandwidth_mhz.log10()
}

/// C/(N+I) in dB. With no (or infinitely low) interference this is exactly
/// C/N; otherwise the three PSDs are combined in linear space, so the
/// result can never exceed C/N.
pub fn carrier_to_noise_plus_interference_db(
    signal_psd_dbm_mhz: f64,
    noise_psd_dbm_mhz: f64,
    interference_psd_dbm_mhz: Option<f64>,
) -> f64 {
    match interference_psd_dbm_mhz {
        Some(i) if i.is_finite() => {
            let c = 10.0_f64.powf(signal_psd_dbm_mhz / 10.0);
            let n = 10.0_f64.powf(noise_psd_dbm_mhz / 10.0);
            let i = 10.0_f64.powf(i / 10.0);
            10.0 * (c / (n + i)).log10()
        }
        _ => signal_psd_dbm_mhz - noise_psd_dbm_mhz,
    }
}

/// Receive figure of merit G/T in dB/K.
pub fn gt_ratio_db_per_k(rx_antenna_gain_dbi: f64, noise_figure_db: f64, antenna_temp_k: f64) -> f64 {
    rx_antenna_gain_dbi - 10.0 * system_noise_temperature_k(noise_figure_db, antenna_temp_k).log10()
}

/// Compute the full metric set for one validated parameter snapshot.
///
/// Satellite topologies run scan-angle geometry, free-space pathloss and
/// (when a rain rate is present) rain fade; terrestrial topologies run the
/// TR 38.901 model with the distance converted to meters. Any domain or
/// configuration failure abandons the whole computation.
pub fn compute_link(params: &LinkParameters) -> Result<LinkResult> {
    params.validate()?;
    let common = &params.common;

    let (path_loss_db, rain, distance_km, elevation_deg, losses) = match &params.topology {
        LinkTopology::Satellite(sat) => {
            let geometry = scan_geometry(sat.scan_angle_deg, sat.height_km)?;
            let path_loss = free_space_path_loss_db(common.frequency_ghz, geometry.slant_range_km)?;
            let rain = match sat.rain_rate_mm_hr {
                Some(rate) => rain_fade_db(common.frequency_ghz, geometry.elevation_deg, rate)?,
                None => 0.0,
            };
            (
                path_loss,
                rain,
                geometry.slant_range_km,
                Some(geometry.elevation_deg),
                sat.losses,
            )
        }
        LinkTopology::Terrestrial(terr) => {
            let path_loss = terrestrial_path_loss_db(
                common.frequency_ghz,
                terr.distance_km * 1000.0,
                terr.scenario,
                terr.los_condition,
            )?;
            (path_loss, 0.0, terr.distance_km, None, terr.losses)
        }
    };

    let total_loss_db = losses.sum_db() + path_loss_db + rain;
    let noise_psd = noise_psd_dbm_mhz(common.rx_noise_figure_db, common.rx_antenna_temp_k);
    let signal_psd = received_signal_psd_dbm_mhz(
        common.tx_eirp_dbw,
        total_loss_db,
        common.rx_antenna_gain_dbi,
        common.bandwidth_mhz,
    );
    let c_to_n_db = signal_psd - noise_psd;
    let c_to_n_plus_i_db = carrier_to_noise_plus_interference_db(
        signal_psd,
        noise_psd,
        common.interference_psd_dbm_mhz,
    );
    let gt_ratio = gt_ratio_db_per_k(
        common.rx_antenna_gain_dbi,
        common.rx_noise_figure_db,
        common.rx_antenna_temp_k,
    );

    Ok(LinkResult {
        path_loss_db,
        rain_fade_db: rain,
        total_loss_db,
        noise_psd_dbm_mhz: noise_psd,
        received_signal_psd_dbm_mhz: signal_psd,
        c_to_n_db,
        c_to_n_plus_i_db,
        gt_ratio_db_per_k: gt_ratio,
        distance_km,
        terminal_elevation_deg: elevation_deg,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{
        CommonParams, LinkType, LossTerms, SatelliteParams, TerrestrialParams,
    };
    use crate::LinkBudgetError;
    use propagation_models::{LosCondition, PropagationError, Scenario};
    use proptest::prelude::*;

    const TOLERANCE_DB: f64 = 1.0e-6;

    fn downlink_common() -> CommonParams {
        CommonParams {
            frequency_ghz: 1.81,
            bandwidth_mhz: 5.0,
            tx_eirp_dbw: 56.0,
            rx_antenna_gain_dbi: -5.0,
            rx_noise_figure_db: 7.0,
            rx_antenna_temp_k: 290.0,
            interference_psd_dbm_mhz: None,
        }
    }

    fn downlink_losses() -> LossTerms {
        LossTerms {
            atmospheric_db: 0.1,
            scintillation_db: 0.3,
            polarization_db: 3.0,
            beam_edge_db: 1.0,
            scan_db: 4.0,
            link_margin_db: 3.0,
        }
    }

    fn satellite_downlink() -> LinkParameters {
        LinkParameters::satellite(
            LinkType::SatelliteDownlink,
            downlink_common(),
            SatelliteParams {
                height_km: 400.0,
                scan_angle_deg: 57.0,
                rain_rate_mm_hr: Some(50.0),
                losses: downlink_losses(),
            },
        )
        .expect("valid reference parameters")
    }

    #[test]
    fn satellite_downlink_reference_case() {
        // The worked L-band downlink from the reference: 400 km orbit,
        // 57 degree scan, 50 mm/h rain, all losses enabled.
        let result = compute_link(&satellite_downlink()).unwrap();

        assert!((result.path_loss_db - 155.658_598_965_625).abs() < TOLERANCE_DB);
        assert!((result.rain_fade_db - 7.682_247_517_537).abs() < TOLERANCE_DB);
        assert!((result.total_loss_db - 174.740_846_483_162).abs() < TOLERANCE_DB);
        assert!((result.noise_psd_dbm_mhz - (-106.977_229_156_998)).abs() < TOLERANCE_DB);
        assert!(
            (result.received_signal_psd_dbm_mhz - (-100.730_546_526_522)).abs() < TOLERANCE_DB
        );
        assert!((result.c_to_n_db - 6.246_682_630_476).abs() < TOLERANCE_DB);
        assert!((result.gt_ratio_db_per_k - (-36.623_979_978_990)).abs() < TOLERANCE_DB);
        assert!((result.distance_km - 799.376_493_836_216).abs() < TOLERANCE_DB);
        let elevation = result.terminal_elevation_deg.expect("satellite link");
        assert!((elevation - 26.959_643_420_684).abs() < TOLERANCE_DB);

        // Without interference the two carrier ratios coincide.
        assert_eq!(result.c_to_n_db, result.c_to_n_plus_i_db);
    }

    #[test]
    fn noise_psd_matches_formula() {
        // NF = 7 dB, T_antenna = 290 K:
        // T_sys = 290*(10^0.7 - 1) + 290, PSD = 10*log10(k*T_sys) + 90.
        let t_sys = system_noise_temperature_k(7.0, 290.0);
        let expected = 10.0 * (BOLTZMANN_J_PER_K * t_sys).log10() + 90.0;
        let psd = noise_psd_dbm_mhz(7.0, 290.0);
        assert!((psd - expected).abs() < 1.0e-12);
        assert!(
            (t_sys - 1453.442_977_519_09).abs() < 1.0e-9,
            "T_sys: expected ~1453.4 K, got {t_sys}"
        );
        assert!(
            (psd - (-106.977_229_156_998)).abs() < 1.0e-9,
            "noise PSD: expected ~-106.98 dBm/MHz, got {psd}"
        );
    }

    #[test]
    fn disabled_loss_equals_explicit_zero() {
        let mut without_flag = satellite_downlink();
        let mut explicit_zero = satellite_downlink();
        match (&mut without_flag.topology, &mut explicit_zero.topology) {
            (
                LinkTopology::Satellite(a),
                LinkTopology::Satellite(b),
            ) => {
                a.losses.atmospheric_db = 0.0;
                b.losses.atmospheric_db = 0.0;
                a.rain_rate_mm_hr = None;
                b.rain_rate_mm_hr = Some(0.0);
            }
            _ => unreachable!(),
        }
        let r1 = compute_link(&without_flag).unwrap();
        let r2 = compute_link(&explicit_zero).unwrap();
        assert_eq!(r1.total_loss_db, r2.total_loss_db);
        assert_eq!(r1.c_to_n_db, r2.c_to_n_db);
    }

    #[test]
    fn interference_never_improves_the_ratio() {
        let clean = compute_link(&satellite_downlink()).unwrap();

        let mut with_interference = satellite_downlink();
        with_interference.common.interference_psd_dbm_mhz = Some(-110.0);
        let noisy = compute_link(&with_interference).unwrap();

        assert!(noisy.c_to_n_plus_i_db < noisy.c_to_n_db);
        assert_eq!(noisy.c_to_n_db, clean.c_to_n_db, "C/N unaffected by I");

        // Explicit -inf behaves like an absent key.
        let mut neg_inf = satellite_downlink();
        neg_inf.common.interference_psd_dbm_mhz = Some(f64::NEG_INFINITY);
        let r = compute_link(&neg_inf).unwrap();
        assert_eq!(r.c_to_n_plus_i_db, r.c_to_n_db);
    }

    #[test]
    fn gt_ratio_decreases_with_noise() {
        let base = gt_ratio_db_per_k(-5.0, 7.0, 290.0);
        assert!(
            (base - (-36.623_979_978_990)).abs() < 1.0e-9,
            "G/T reference: expected ~-36.62 dB/K, got {base}"
        );
        assert!(gt_ratio_db_per_k(-5.0, 8.0, 290.0) < base);
        assert!(gt_ratio_db_per_k(-5.0, 7.0, 400.0) < base);
    }

    #[test]
    fn terrestrial_downlink_case() {
        let params = LinkParameters::terrestrial(
            LinkType::TerrestrialDownlink,
            CommonParams {
                frequency_ghz: 1.81,
                bandwidth_mhz: 5.0,
                tx_eirp_dbw: 56.0,
                rx_antenna_gain_dbi: -5.0,
                rx_noise_figure_db: 7.0,
                rx_antenna_temp_k: 290.0,
                interference_psd_dbm_mhz: None,
            },
            TerrestrialParams {
                distance_km: 1.0,
                scenario: Scenario::UrbanMacro,
                los_condition: LosCondition::Weighted,
                losses: LossTerms {
                    beam_edge_db: 1.0,
                    ..LossTerms::default()
                },
            },
        )
        .unwrap();
        let result = compute_link(&params).unwrap();

        // UMa weighted pathloss at 1.81 GHz / 1 km.
        assert!((result.path_loss_db - 135.450_130_755_095).abs() < TOLERANCE_DB);
        assert_eq!(result.rain_fade_db, 0.0);
        assert!((result.total_loss_db - (result.path_loss_db + 1.0)).abs() < 1.0e-12);
        assert_eq!(result.terminal_elevation_deg, None);
        assert_eq!(result.distance_km, 1.0);
    }

    #[test]
    fn scan_angle_beyond_limit_fails_whole_computation() {
        let params = LinkParameters {
            link_type: LinkType::SatelliteUplink,
            common: downlink_common(),
            topology: LinkTopology::Satellite(SatelliteParams {
                height_km: 400.0,
                scan_angle_deg: 75.0,
                rain_rate_mm_hr: None,
                losses: LossTerms::default(),
            }),
        };
        assert!(matches!(
            compute_link(&params),
            Err(LinkBudgetError::Propagation(
                PropagationError::ScanAngleTooLarge { .. }
            ))
        ));
    }

    #[test]
    fn result_map_boundary() {
        let result = compute_link(&satellite_downlink()).unwrap();
        let map = result.to_map();
        assert_eq!(map["path_loss"], result.path_loss_db);
        assert!(map.contains_key("terminal_elevation_angle"));

        let terrestrial = LinkParameters::terrestrial(
            LinkType::TerrestrialUplink,
            downlink_common(),
            TerrestrialParams {
                distance_km: 1.0,
                scenario: Scenario::RuralMacro,
                los_condition: LosCondition::Los,
                losses: LossTerms::default(),
            },
        )
        .unwrap();
        let map = compute_link(&terrestrial).unwrap().to_map();
        assert!(!map.contains_key("terminal_elevation_angle"));
    }

    proptest! {
        #[test]
        fn cni_never_exceeds_cn(
            interference in -200.0f64..0.0,
            eirp in 20.0f64..70.0,
            gain in -10.0f64..40.0,
        ) {
            let mut params = satellite_downlink();
            params.common.tx_eirp_dbw = eirp;
            params.common.rx_antenna_gain_dbi = gain;
            params.common.interference_psd_dbm_mhz = Some(interference);
            let r = compute_link(&params).unwrap();
            prop_assert!(r.c_to_n_plus_i_db <= r.c_to_n_db + 1.0e-9,
                "C/(N+I) {} must not exceed C/N {}", r.c_to_n_plus_i_db, r.c_to_n_db);
        }

        #[test]
        fn gt_strictly_decreasing_in_noise_figure(
            nf in 0.0f64..15.0,
            t_ant in 50.0f64..600.0,
        ) {
            let base = gt_ratio_db_per_k(10.0, nf, t_ant);
            prop_assert!(gt_ratio_db_per_k(10.0, nf + 0.5, t_ant) < base);
            prop_assert!(gt_ratio_db_per_k(10.0, nf, t_ant + 25.0) < base);
        }
    }
}

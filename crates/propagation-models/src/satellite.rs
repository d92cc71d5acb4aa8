//! Satellite link geometry and pathloss.
//!
//! The scan-angle geometry solves the oblique triangle formed by the Earth
//! center, the ground terminal and the satellite: given the scan angle at
//! the satellite and the orbit height, the law of sines gives the angle at
//! the terminal (taking the obtuse solution, since the terminal sees the
//! satellite above the local horizon) and the law of cosines gives the
//! slant range. Elevation is the terminal angle minus 90 degrees.

use serde::{Deserialize, Serialize};

use crate::{PropagationError, Result};

/// Mean Earth radius in km.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Geometry of a ground terminal seen from a scanning satellite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SatelliteGeometry {
    /// Terminal elevation angle above the local horizon, degrees.
    pub elevation_deg: f64,
    /// Straight-line terminal-to-satellite distance, km.
    pub slant_range_km: f64,
    /// Largest scan angle for which a solution exists, degrees.
    pub max_scan_angle_deg: f64,
}

/// Maximum permissible scan angle in degrees for a given orbit height.
///
/// Beyond asin(R / (R + h)) the boresight no longer intersects the Earth.
pub fn max_scan_angle_deg(height_km: f64) -> Result<f64> {
    if height_km <= 0.0 {
        return Err(PropagationError::NonPositiveHeight(height_km));
    }
    Ok((EARTH_RADIUS_KM / (EARTH_RADIUS_KM + height_km))
        .asin()
        .to_degrees())
}

/// Solve terminal elevation and slant range for a satellite scan angle.
///
/// The scan angle is measured off nadir, so only its magnitude enters the
/// geometry. Fails with a domain error when that magnitude reaches or
/// exceeds the visibility limit (no elevation solution exists, and the
/// law-of-sines argument would leave the asin domain) or when the orbit
/// height is not positive.
pub fn scan_geometry(scan_angle_deg: f64, height_km: f64) -> Result<SatelliteGeometry> {
    let max_deg = max_scan_angle_deg(height_km)?;
    // Negated comparison so a NaN input also fails the check.
    if !(scan_angle_deg.abs() < max_deg) {
        return Err(PropagationError::ScanAngleTooLarge {
            scan_angle_deg,
            max_deg,
        });
    }

    let a = EARTH_RADIUS_KM;
    let b = EARTH_RADIUS_KM + height_km;
    let scan_deg = scan_angle_deg.abs();

    // Law of sines for the angle at the terminal; the triangle has the
    // obtuse solution since b > a.
    let sin_terminal = b * scan_deg.to_radians().sin() / a;
    let terminal_deg = 180.0 - sin_terminal.asin().to_degrees();
    let center_deg = 180.0 - scan_deg - terminal_deg;

    // Law of cosines for the slant range.
    let slant_range_km =
        (a * a + b * b - 2.0 * a * b * center_deg.to_radians().cos()).sqrt();

    Ok(SatelliteGeometry {
        elevation_deg: terminal_deg - 90.0,
        slant_range_km,
        max_scan_angle_deg: max_deg,
    })
}

/// Free-space pathloss in dB: 92.45 + 20*log10(f_GHz) + 20*log10(d_km).
pub fn free_space_path_loss_db(frequency_ghz: f64, distance_km: f64) -> Result<f64> {
    if frequency_ghz <= 0.0 {
        return Err(PropagationError::NonPositiveFrequency(frequency_ghz));
    }
    if distance_km <= 0.0 {
        return Err(PropagationError::NonPositiveDistance(distance_km));
    }
    Ok(92.45 + 20.0 * frequency_ghz.log10() + 20.0 * distance_km.log10())
}

/// Rain fade in dB, ITU-R P.618-style empirical model.
///
/// Specific attenuation a * R^b with frequency-derived coefficients
/// a = 0.0051 * f^1.41 and b = 0.655 * f^-0.075, over an effective path
/// length Ls = 35 * sin(elevation)^-0.6. The sin term diverges at the
/// horizon, so elevations at or below zero are a domain error. Rain rates
/// at or below zero mean no rain and evaluate to 0 dB.
pub fn rain_fade_db(frequency_ghz: f64, elevation_deg: f64, rain_rate_mm_hr: f64) -> Result<f64> {
    if frequency_ghz <= 0.0 {
        return Err(PropagationError::NonPositiveFrequency(frequency_ghz));
    }
    if elevation_deg <= 0.0 {
        return Err(PropagationError::ElevationTooLow(elevation_deg));
    }
    if rain_rate_mm_hr <= 0.0 {
        return Ok(0.0);
    }

    let a = 0.0051 * frequency_ghz.powf(1.41);
    let b = 0.655 * frequency_ghz.powf(-0.075);
    let path_length = 35.0 * elevation_deg.to_radians().sin().powf(-0.6);
    Ok(a * rain_rate_mm_hr.powf(b) * path_length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fspl_reference_case() {
        // 92.45 + 20*log10(1.81) + 20*log10(400) = 149.64 dB
        let fspl = free_space_path_loss_db(1.81, 400.0).unwrap();
        assert!(
            (fspl - 149.64).abs() < 0.01,
            "FSPL(1.81 GHz, 400 km): expected ~149.64 dB, got {fspl}"
        );
    }

    #[test]
    fn fspl_doubling_adds_six_db() {
        let base = free_space_path_loss_db(2.0, 500.0).unwrap();
        let double_f = free_space_path_loss_db(4.0, 500.0).unwrap();
        let double_d = free_space_path_loss_db(2.0, 1000.0).unwrap();
        assert!((double_f - base - 6.02).abs() < 0.01);
        assert!((double_d - base - 6.02).abs() < 0.01);
    }

    #[test]
    fn fspl_rejects_non_positive_inputs() {
        assert!(matches!(
            free_space_path_loss_db(0.0, 400.0),
            Err(PropagationError::NonPositiveFrequency(_))
        ));
        assert!(matches!(
            free_space_path_loss_db(1.81, 0.0),
            Err(PropagationError::NonPositiveDistance(_))
        ));
    }

    #[test]
    fn geometry_reference_case() {
        // 400 km orbit, 57 degree scan: elevation ~26.96 degrees, slant
        // range ~799.38 km.
        let geo = scan_geometry(57.0, 400.0).unwrap();
        assert!(
            (geo.elevation_deg - 26.959_643_420_684).abs() < 1.0e-6,
            "elevation: expected ~26.96, got {}",
            geo.elevation_deg
        );
        assert!(
            (geo.slant_range_km - 799.376_493_836_216).abs() < 1.0e-6,
            "slant range: expected ~799.38 km, got {}",
            geo.slant_range_km
        );
    }

    #[test]
    fn geometry_zero_scan_points_at_nadir() {
        let geo = scan_geometry(0.0, 400.0).unwrap();
        assert!(
            (geo.elevation_deg - 90.0).abs() < 1.0e-9,
            "nadir scan should give a 90 degree elevation, got {}",
            geo.elevation_deg
        );
        assert!((geo.slant_range_km - 400.0).abs() < 1.0e-6);
    }

    #[test]
    fn geometry_fails_at_visibility_limit() {
        // asin(6371/6771) = 70.21 degrees for a 400 km orbit.
        let max = max_scan_angle_deg(400.0).unwrap();
        assert!((max - 70.207_403_468_856).abs() < 1.0e-6);

        assert!(matches!(
            scan_geometry(max, 400.0),
            Err(PropagationError::ScanAngleTooLarge { .. })
        ));
        assert!(matches!(
            scan_geometry(max + 5.0, 400.0),
            Err(PropagationError::ScanAngleTooLarge { .. })
        ));

        // Just below the limit the solution exists and the terminal still
        // sees the satellite above the horizon.
        let geo = scan_geometry(max - 0.01, 400.0).unwrap();
        assert!(
            geo.elevation_deg > 0.0,
            "elevation just below the limit must stay positive, got {}",
            geo.elevation_deg
        );
    }

    #[test]
    fn geometry_is_symmetric_in_scan_direction() {
        // Scanning 57 degrees either side of nadir is the same triangle.
        let pos = scan_geometry(57.0, 400.0).unwrap();
        let neg = scan_geometry(-57.0, 400.0).unwrap();
        assert_eq!(pos, neg);
        assert!(neg.elevation_deg.is_finite());
        assert!(neg.slant_range_km.is_finite());
    }

    #[test]
    fn geometry_rejects_angles_beyond_the_limit_on_either_side() {
        // A magnitude past the limit must fail, never produce NaN fields.
        assert!(matches!(
            scan_geometry(-80.0, 400.0),
            Err(PropagationError::ScanAngleTooLarge { .. })
        ));
        assert!(matches!(
            scan_geometry(f64::NAN, 400.0),
            Err(PropagationError::ScanAngleTooLarge { .. })
        ));
    }

    #[test]
    fn geometry_rejects_non_positive_height() {
        assert!(matches!(
            scan_geometry(10.0, 0.0),
            Err(PropagationError::NonPositiveHeight(_))
        ));
    }

    #[test]
    fn rain_fade_reference_case() {
        // 1.81 GHz, 26.96 degrees, 50 mm/h -> ~7.68 dB.
        let fade = rain_fade_db(1.81, 26.959_643_420_684, 50.0).unwrap();
        assert!(
            (fade - 7.682_247_517_537).abs() < 1.0e-6,
            "rain fade: expected ~7.68 dB, got {fade}"
        );
    }

    #[test]
    fn rain_fade_non_positive_rain_is_zero() {
        assert_eq!(rain_fade_db(12.0, 30.0, 0.0).unwrap(), 0.0);
        assert_eq!(rain_fade_db(12.0, 30.0, -3.0).unwrap(), 0.0);
    }

    #[test]
    fn rain_fade_rejects_horizon_elevation() {
        assert!(matches!(
            rain_fade_db(12.0, 0.0, 25.0),
            Err(PropagationError::ElevationTooLow(_))
        ));
        assert!(matches!(
            rain_fade_db(12.0, -5.0, 25.0),
            Err(PropagationError::ElevationTooLow(_))
        ));
    }

    #[test]
    fn rain_fade_grows_with_rate_and_falls_with_elevation() {
        let light = rain_fade_db(12.0, 30.0, 5.0).unwrap();
        let heavy = rain_fade_db(12.0, 30.0, 50.0).unwrap();
        assert!(heavy > light);

        let low_el = rain_fade_db(12.0, 10.0, 25.0).unwrap();
        let high_el = rain_fade_db(12.0, 80.0, 25.0).unwrap();
        assert!(low_el > high_el, "longer rain path at low elevation");
    }

    proptest! {
        #[test]
        fn fspl_monotone_in_frequency_and_distance(
            f in 0.1f64..100.0,
            d in 1.0f64..50_000.0,
        ) {
            let base = free_space_path_loss_db(f, d).unwrap();
            let more_f = free_space_path_loss_db(f * 1.5, d).unwrap();
            let more_d = free_space_path_loss_db(f, d * 1.5).unwrap();
            prop_assert!(more_f > base);
            prop_assert!(more_d > base);
        }

        #[test]
        fn scan_geometry_solution_exists_below_limit(
            height in 200.0f64..36_000.0,
            frac in 0.0f64..0.999,
        ) {
            let max = max_scan_angle_deg(height).unwrap();
            let geo = scan_geometry(max * frac, height).unwrap();
            prop_assert!(geo.slant_range_km >= height - 1.0e-6);
            prop_assert!(geo.elevation_deg > 0.0 && geo.elevation_deg <= 90.0 + 1.0e-9);
        }
    }
}

//! RF Propagation Models
//!
//! Scenario-specific pathloss and geometry functions for link-budget work:
//! - 3GPP TR 38.901 statistical terrestrial pathloss (RuralMacro and
//!   UrbanMacro scenes, LOS probability + dual-slope breakpoint model)
//! - Satellite scan-angle geometry (oblique triangle over a spherical Earth)
//! - Free-space pathloss
//! - ITU-R P.618-style rain fade
//!
//! Everything here is closed-form arithmetic over validated inputs. Invalid
//! physical inputs are rejected with [`PropagationError`] before any model
//! is evaluated; nothing is silently clamped.

use thiserror::Error;

pub mod satellite;
pub mod terrestrial;

pub use satellite::{
    free_space_path_loss_db, max_scan_angle_deg, rain_fade_db, scan_geometry, SatelliteGeometry,
    EARTH_RADIUS_KM,
};
pub use terrestrial::{
    breakpoint_distance_m, los_probability, terrestrial_path_loss_db, LosCondition,
    PathLossBranches, Scenario,
};

/// Invalid physical input for a propagation model.
///
/// All variants are domain errors in the link-budget taxonomy: the input is
/// physically meaningless or outside the modeled range, and the computation
/// it belongs to is abandoned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropagationError {
    #[error("frequency must be positive, got {0} GHz")]
    NonPositiveFrequency(f64),
    #[error("distance must be positive, got {0}")]
    NonPositiveDistance(f64),
    #[error("distance {distance_m:.0} m exceeds the {max_m:.0} m modeled range for {scenario:?}")]
    DistanceOutOfRange {
        distance_m: f64,
        max_m: f64,
        scenario: Scenario,
    },
    #[error("satellite height must be positive, got {0} km")]
    NonPositiveHeight(f64),
    #[error("scan angle {scan_angle_deg}\u{b0} must be within the visibility limit of \u{b1}{max_deg:.2}\u{b0}")]
    ScanAngleTooLarge { scan_angle_deg: f64, max_deg: f64 },
    #[error("elevation must be above 0\u{b0} for rain fade, got {0}\u{b0}")]
    ElevationTooLow(f64),
}

pub type Result<T> = std::result::Result<T, PropagationError>;

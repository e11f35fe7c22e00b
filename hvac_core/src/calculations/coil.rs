//! # Coil Analysis
//!
//! Effective room loads, effective sensible heat factor, apparatus dew point
//! and dehumidified airflow for one room.
//!
//! ## Method
//!
//! The bypass factor (BF) is the fraction of outdoor air that passes the
//! coil untreated and so lands on the room as load:
//!
//! ```text
//! ERSH = room sensible × sf_s + BF × ventilation sensible
//! ERLH = room latent   × sf_l + BF × ventilation latent
//! ESHF = ERSH / (ERSH + ERLH)
//! ```
//!
//! "Room" loads here exclude outdoor-air ventilation. The apparatus dew
//! point (ADP) is the saturation temperature at which the room-to-coil line
//! has slope ESHF:
//!
//! ```text
//! 1.08 (t_room − ADP) (1 − ESHF) = ESHF × 0.68 (W_room − W_sat(ADP))
//! ```
//!
//! found with the injected root finder below the room dew point. Then
//! `cfm_da = ERSH / (1.08 (1 − BF)(t_room − ADP))`.

use serde::{Deserialize, Serialize};

use crate::calculations::psychrometrics::{saturation_humidity_ratio_gr_lb, ClimateCondition};
use crate::calculations::room_load::{LATENT_AIR_FACTOR, SENSIBLE_AIR_FACTOR};
use crate::errors::ConvergenceWarning;
use crate::numeric::RootFinder;
use crate::settings::SafetyFactors;
use crate::units::ratio_or_zero;

/// ADP search window below the room dew point (°F)
const ADP_SEARCH_SPAN_F: f64 = 50.0;

/// Loads feeding the coil analysis, split between room and outdoor air
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoilInput {
    /// Sensible subtotal excluding outdoor-air ventilation
    pub room_sensible_btuh: f64,
    /// Latent subtotal excluding outdoor-air ventilation
    pub room_latent_btuh: f64,
    pub ventilation_sensible_btuh: f64,
    pub ventilation_latent_btuh: f64,
    pub safety_factors: SafetyFactors,
    pub bypass_factor: f64,
    /// Room design state
    pub indoor: ClimateCondition,
}

/// Coil analysis outcome
///
/// ## JSON Example
///
/// ```json
/// {
///   "bypass_factor": 0.1,
///   "effective_room_sensible_btuh": 21370.0,
///   "effective_room_latent_btuh": 4290.0,
///   "effective_sensible_heat_factor": 0.833,
///   "apparatus_dew_point_f": 51.8,
///   "dehumidified_cfm": 1023.0
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoilAnalysis {
    pub bypass_factor: f64,
    pub effective_room_sensible_btuh: f64,
    pub effective_room_latent_btuh: f64,
    pub effective_sensible_heat_factor: f64,
    pub apparatus_dew_point_f: f64,
    pub dehumidified_cfm: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<ConvergenceWarning>,
}

/// Run the coil analysis with the given root finder.
pub fn analyze<S: RootFinder>(input: &CoilInput, solver: &S) -> CoilAnalysis {
    let bf = input.bypass_factor;
    let ersh = (input.room_sensible_btuh * input.safety_factors.sensible + bf * input.ventilation_sensible_btuh).max(0.0);
    let erlh = (input.room_latent_btuh * input.safety_factors.latent + bf * input.ventilation_latent_btuh).max(0.0);
    let eshf = ratio_or_zero(ersh, ersh + erlh);

    let room = input.indoor;
    if ersh <= 0.0 {
        return CoilAnalysis {
            bypass_factor: bf,
            effective_room_sensible_btuh: ersh,
            effective_room_latent_btuh: erlh,
            effective_sensible_heat_factor: eshf,
            apparatus_dew_point_f: room.dew_point_f,
            dehumidified_cfm: 0.0,
            warning: None,
        };
    }

    let residual = |adp: f64| {
        let dt = room.dry_bulb_f - adp;
        let dw = room.humidity_ratio_gr_lb - saturation_humidity_ratio_gr_lb(adp, room.pressure_kpa);
        SENSIBLE_AIR_FACTOR * dt * (1.0 - eshf) - eshf * LATENT_AIR_FACTOR * dw
    };
    let estimate = solver.find_root(residual, room.dew_point_f - ADP_SEARCH_SPAN_F, room.dew_point_f);
    let adp = estimate.value;

    let dehumidified_cfm = ratio_or_zero(ersh, SENSIBLE_AIR_FACTOR * (1.0 - bf) * (room.dry_bulb_f - adp));
    tracing::trace!(ersh, erlh, eshf, adp, dehumidified_cfm, "coil analysis");

    CoilAnalysis {
        bypass_factor: bf,
        effective_room_sensible_btuh: ersh,
        effective_room_latent_btuh: erlh,
        effective_sensible_heat_factor: eshf,
        apparatus_dew_point_f: adp,
        dehumidified_cfm: dehumidified_cfm.max(0.0),
        warning: estimate.warning("apparatus_dew_point"),
    }
}

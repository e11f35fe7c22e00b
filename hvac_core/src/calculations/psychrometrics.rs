//! # Psychrometrics
//!
//! Derives the full moist-air state ([`ClimateCondition`]) from any two of
//! dry-bulb, wet-bulb and relative humidity.
//!
//! ## Formulas
//!
//! - Saturation vapor pressure and dew point: Magnus, a = 17.625, b = 243.04 °C
//! - Wet-bulb from dry-bulb + RH: Stull (2011) closed form
//! - Humidity ratio: W = 0.621945 · pw / (p − pw), pw at the dew point
//! - Enthalpy: h = 0.240 t + W (1061 + 0.444 t)  (Btu/lb dry air)
//! - Specific volume: v = 0.370486 (t + 459.67)(1 + 1.607858 W) / p  (ft³/lb, p in psia)
//!
//! Magnus and Stull are Celsius formulas; every call converts at the
//! boundary and works in one unit internally. The public API is °F.
//!
//! ## Example
//!
//! ```rust
//! use hvac_core::calculations::psychrometrics::{PsychrometricEngine, PsychrometricInput};
//!
//! let engine = PsychrometricEngine::new();
//! let state = engine.resolve(&PsychrometricInput::from_db_rh(95.0, 50.0)).unwrap();
//!
//! assert!((state.condition.wet_bulb_f - 79.9).abs() < 0.3);
//! assert!(state.warning.is_none());
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult, ConvergenceWarning};
use crate::numeric::{Bisection, RootEstimate, RootFinder};
use crate::units::{Celsius, Fahrenheit, GrainsPerLb, Kpa, LbPerLb, Psia, STANDARD_PRESSURE_KPA};

const MAGNUS_A: f64 = 17.625;
const MAGNUS_B_C: f64 = 243.04;
const MAGNUS_P0_KPA: f64 = 0.61094;

/// Ratio of molecular masses of water vapor and dry air
const MOLECULAR_RATIO: f64 = 0.621945;

/// RH floor for the dew-point logarithm; drier air is reported at this dew point
const MIN_RH_FOR_DEW_POINT: f64 = 0.01;

/// Supplied wet-bulb may differ from the derived one by this much (°F)
const CONTRADICTION_TOLERANCE_F: f64 = 1.0;

/// Partial moist-air measurement. At least two of the three temperatures/RH
/// must be present.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PsychrometricInput {
    #[serde(default)]
    pub dry_bulb_f: Option<f64>,
    #[serde(default)]
    pub wet_bulb_f: Option<f64>,
    #[serde(default)]
    pub relative_humidity_pct: Option<f64>,
    /// Total pressure; 101.325 kPa when omitted
    #[serde(default)]
    pub pressure_kpa: Option<f64>,
}

impl PsychrometricInput {
    pub fn from_db_rh(dry_bulb_f: f64, relative_humidity_pct: f64) -> Self {
        PsychrometricInput {
            dry_bulb_f: Some(dry_bulb_f),
            relative_humidity_pct: Some(relative_humidity_pct),
            ..Default::default()
        }
    }

    pub fn from_db_wb(dry_bulb_f: f64, wet_bulb_f: f64) -> Self {
        PsychrometricInput {
            dry_bulb_f: Some(dry_bulb_f),
            wet_bulb_f: Some(wet_bulb_f),
            ..Default::default()
        }
    }

    pub fn from_wb_rh(wet_bulb_f: f64, relative_humidity_pct: f64) -> Self {
        PsychrometricInput {
            wet_bulb_f: Some(wet_bulb_f),
            relative_humidity_pct: Some(relative_humidity_pct),
            ..Default::default()
        }
    }

    /// Builder: set total pressure
    pub fn with_pressure(mut self, pressure_kpa: f64) -> Self {
        self.pressure_kpa = Some(pressure_kpa);
        self
    }

    fn known_count(&self) -> usize {
        [self.dry_bulb_f, self.wet_bulb_f, self.relative_humidity_pct]
            .iter()
            .filter(|v| v.is_some())
            .count()
    }
}

/// Full moist-air state. All derived properties are consistent with the
/// Magnus saturation curve at `pressure_kpa`.
///
/// ## JSON Example
///
/// ```json
/// {
///   "dry_bulb_f": 95.0,
///   "wet_bulb_f": 79.87,
///   "relative_humidity_pct": 50.0,
///   "dew_point_f": 73.45,
///   "humidity_ratio_gr_lb": 124.1,
///   "enthalpy_btu_lb": 42.4,
///   "specific_volume_ft3_lb": 14.37,
///   "pressure_kpa": 101.325
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateCondition {
    pub dry_bulb_f: f64,
    pub wet_bulb_f: f64,
    pub relative_humidity_pct: f64,
    pub dew_point_f: f64,
    pub humidity_ratio_gr_lb: f64,
    pub enthalpy_btu_lb: f64,
    pub specific_volume_ft3_lb: f64,
    pub pressure_kpa: f64,
}

/// Resolved state plus the solver advisory, if any
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PsychrometricResult {
    pub condition: ClimateCondition,
    pub warning: Option<ConvergenceWarning>,
}

// ============================================================================
// Closed-form properties
// ============================================================================

/// Saturation vapor pressure over water (kPa), Magnus form
pub fn saturation_pressure_kpa(t: Celsius) -> f64 {
    MAGNUS_P0_KPA * (MAGNUS_A * t.0 / (t.0 + MAGNUS_B_C)).exp()
}

/// Dew point from dry-bulb and RH (Magnus)
pub fn dew_point_f(dry_bulb_f: f64, relative_humidity_pct: f64) -> f64 {
    let t: Celsius = Fahrenheit(dry_bulb_f).into();
    let rh = relative_humidity_pct.clamp(MIN_RH_FOR_DEW_POINT, 100.0) / 100.0;
    let gamma = rh.ln() + MAGNUS_A * t.0 / (MAGNUS_B_C + t.0);
    let td = Celsius(MAGNUS_B_C * gamma / (MAGNUS_A - gamma));
    Fahrenheit::from(td).0
}

/// Wet-bulb from dry-bulb and RH, Stull (2011).
///
/// Stull overshoots near saturation; the result is capped at the dry-bulb.
pub fn wet_bulb_f(dry_bulb_f: f64, relative_humidity_pct: f64) -> f64 {
    let t = Celsius::from(Fahrenheit(dry_bulb_f)).0;
    let rh = relative_humidity_pct;
    let tw = t * (0.151977 * (rh + 8.313659).sqrt()).atan() + (t + rh).atan()
        - (rh - 1.676331).atan()
        + 0.00391838 * rh.powf(1.5) * (0.023101 * rh).atan()
        - 4.686035;
    Fahrenheit::from(Celsius(tw)).0.min(dry_bulb_f)
}

fn humidity_ratio_from_vapor_pressure(pw_kpa: f64, pressure_kpa: f64) -> f64 {
    let pw = pw_kpa.min(pressure_kpa * 0.99);
    GrainsPerLb::from(LbPerLb(MOLECULAR_RATIO * pw / (pressure_kpa - pw))).0
}

/// Humidity ratio (gr/lb) from dry-bulb and RH via the dew-point vapor pressure
pub fn humidity_ratio_gr_lb(dry_bulb_f: f64, relative_humidity_pct: f64, pressure_kpa: f64) -> f64 {
    if relative_humidity_pct <= 0.0 {
        return 0.0;
    }
    let td: Celsius = Fahrenheit(dew_point_f(dry_bulb_f, relative_humidity_pct)).into();
    humidity_ratio_from_vapor_pressure(saturation_pressure_kpa(td), pressure_kpa)
}

/// Humidity ratio (gr/lb) of saturated air at `temp_f`
pub fn saturation_humidity_ratio_gr_lb(temp_f: f64, pressure_kpa: f64) -> f64 {
    let t: Celsius = Fahrenheit(temp_f).into();
    humidity_ratio_from_vapor_pressure(saturation_pressure_kpa(t), pressure_kpa)
}

/// Moist-air enthalpy (Btu/lb dry air)
pub fn enthalpy_btu_lb(dry_bulb_f: f64, humidity_ratio_gr_lb: f64) -> f64 {
    let w = LbPerLb::from(GrainsPerLb(humidity_ratio_gr_lb)).0;
    0.240 * dry_bulb_f + w * (1061.0 + 0.444 * dry_bulb_f)
}

/// Moist-air specific volume (ft³/lb dry air)
pub fn specific_volume_ft3_lb(dry_bulb_f: f64, humidity_ratio_gr_lb: f64, pressure_kpa: f64) -> f64 {
    let w = LbPerLb::from(GrainsPerLb(humidity_ratio_gr_lb)).0;
    let p: Psia = Kpa(pressure_kpa).into();
    0.370486 * Fahrenheit(dry_bulb_f).rankine() * (1.0 + 1.607858 * w) / p.0
}

/// Build the full state from dry-bulb, RH and an already known wet-bulb.
fn assemble(dry_bulb_f: f64, wet_bulb: f64, rh: f64, pressure_kpa: f64) -> ClimateCondition {
    let w = humidity_ratio_gr_lb(dry_bulb_f, rh, pressure_kpa);
    ClimateCondition {
        dry_bulb_f,
        wet_bulb_f: wet_bulb,
        relative_humidity_pct: rh,
        dew_point_f: dew_point_f(dry_bulb_f, rh),
        humidity_ratio_gr_lb: w,
        enthalpy_btu_lb: enthalpy_btu_lb(dry_bulb_f, w),
        specific_volume_ft3_lb: specific_volume_ft3_lb(dry_bulb_f, w, pressure_kpa),
        pressure_kpa,
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Resolves partial measurements into [`ClimateCondition`]s.
///
/// The root finder is injectable; the default is bisection with a 0.01 °F
/// tolerance and a 50-iteration cap.
#[derive(Debug, Clone, Default)]
pub struct PsychrometricEngine<S: RootFinder = Bisection> {
    solver: S,
}

impl PsychrometricEngine {
    /// Engine with the default bisection solver
    pub fn new() -> Self {
        PsychrometricEngine { solver: Bisection::default() }
    }
}

impl<S: RootFinder> PsychrometricEngine<S> {
    pub fn with_solver(solver: S) -> Self {
        PsychrometricEngine { solver }
    }

    /// Derive the full state from the supplied properties.
    ///
    /// # Errors
    ///
    /// Input errors when fewer than two of dry-bulb / wet-bulb / RH are given,
    /// when wet-bulb exceeds dry-bulb, when RH is outside 0-100 %, when the
    /// pressure is not positive, or when three contradictory values are given.
    pub fn resolve(&self, input: &PsychrometricInput) -> CalcResult<PsychrometricResult> {
        validate(input)?;
        let pressure = input.pressure_kpa.unwrap_or(STANDARD_PRESSURE_KPA);

        match (input.dry_bulb_f, input.wet_bulb_f, input.relative_humidity_pct) {
            (Some(db), wb, Some(rh)) => {
                let derived_wb = wet_bulb_f(db, rh);
                if let Some(given) = wb {
                    if (given - derived_wb).abs() > CONTRADICTION_TOLERANCE_F {
                        return Err(CalcError::invalid_input(
                            "wet_bulb_f",
                            given.to_string(),
                            format!(
                                "Contradicts dry-bulb {db} °F and RH {rh} % (derived wet-bulb {derived_wb:.2} °F)"
                            ),
                        ));
                    }
                }
                Ok(PsychrometricResult {
                    condition: assemble(db, derived_wb, rh, pressure),
                    warning: None,
                })
            }
            (Some(db), Some(wb), None) => {
                let estimate = self.relative_humidity_from_wet_bulb(db, wb);
                tracing::trace!(db, wb, rh = estimate.value, converged = estimate.converged, "rh from wet-bulb");
                Ok(PsychrometricResult {
                    condition: assemble(db, wb, estimate.value, pressure),
                    warning: estimate.warning("relative_humidity_from_wet_bulb"),
                })
            }
            (None, Some(wb), Some(rh)) => {
                let estimate = self.dry_bulb_from_wet_bulb(wb, rh);
                tracing::trace!(wb, rh, db = estimate.value, converged = estimate.converged, "dry-bulb from wet-bulb");
                Ok(PsychrometricResult {
                    condition: assemble(estimate.value, wb, rh, pressure),
                    warning: estimate.warning("dry_bulb_from_wet_bulb"),
                })
            }
            _ => Err(CalcError::missing_field(
                "at least two of dry_bulb_f, wet_bulb_f, relative_humidity_pct",
            )),
        }
    }

    /// Relative humidity (%) whose Stull wet-bulb matches `wet_bulb_f`,
    /// searched over 0-100 %.
    pub fn relative_humidity_from_wet_bulb(&self, dry_bulb_f: f64, target_wet_bulb_f: f64) -> RootEstimate {
        self.solver
            .find_root(|rh| wet_bulb_f(dry_bulb_f, rh) - target_wet_bulb_f, 0.0, 100.0)
    }

    /// Dry-bulb (°F) at which air of the given RH has the target wet-bulb,
    /// searched over [wb, wb + 100 °F].
    pub fn dry_bulb_from_wet_bulb(&self, target_wet_bulb_f: f64, relative_humidity_pct: f64) -> RootEstimate {
        self.solver.find_root(
            |db| wet_bulb_f(db, relative_humidity_pct) - target_wet_bulb_f,
            target_wet_bulb_f,
            target_wet_bulb_f + 100.0,
        )
    }

    /// Access the injected root finder (reused by coil analysis)
    pub fn solver(&self) -> &S {
        &self.solver
    }
}

/// Resolve a dry-bulb/RH pair with the default engine. Never iterates.
pub fn condition_from_db_rh(dry_bulb_f: f64, relative_humidity_pct: f64, pressure_kpa: f64) -> CalcResult<ClimateCondition> {
    let input = PsychrometricInput::from_db_rh(dry_bulb_f, relative_humidity_pct).with_pressure(pressure_kpa);
    PsychrometricEngine::new()
        .resolve(&input)
        .map(|r| r.condition)
}

fn validate(input: &PsychrometricInput) -> CalcResult<()> {
    if input.known_count() < 2 {
        return Err(CalcError::missing_field(
            "at least two of dry_bulb_f, wet_bulb_f, relative_humidity_pct",
        ));
    }
    for (field, value) in [
        ("dry_bulb_f", input.dry_bulb_f),
        ("wet_bulb_f", input.wet_bulb_f),
        ("relative_humidity_pct", input.relative_humidity_pct),
    ] {
        if let Some(v) = value {
            if !v.is_finite() {
                return Err(CalcError::invalid_input(field, v.to_string(), "Must be a finite number"));
            }
        }
    }
    if let Some(rh) = input.relative_humidity_pct {
        if !(0.0..=100.0).contains(&rh) {
            return Err(CalcError::invalid_input(
                "relative_humidity_pct",
                rh.to_string(),
                "Relative humidity must be between 0 and 100 %",
            ));
        }
    }
    if let (Some(db), Some(wb)) = (input.dry_bulb_f, input.wet_bulb_f) {
        if wb > db {
            return Err(CalcError::invalid_input(
                "wet_bulb_f",
                wb.to_string(),
                format!("Wet-bulb cannot exceed dry-bulb ({db} °F)"),
            ));
        }
    }
    if let Some(p) = input.pressure_kpa {
        if !(p.is_finite() && p > 0.0) {
            return Err(CalcError::invalid_input(
                "pressure_kpa",
                p.to_string(),
                "Pressure must be positive",
            ));
        }
    }
    Ok(())
}

//! # Unit Types
//!
//! Type-safe wrappers for the units used in cooling-load work. These are
//! plain f64 newtypes that serialize as bare numbers.
//!
//! ## US Customary Units (Primary)
//!
//! The engine works in the units of the CLTD/CLF load method:
//! - Temperature: degrees Fahrenheit (°F); Celsius only inside psychrometric formulas
//! - Heat flow: Btu per hour (Btu/h), tons of refrigeration (TR)
//! - Airflow: cubic feet per minute (cfm)
//! - Volume: cubic feet
//! - Moisture: grains of water per pound of dry air (gr/lb)
//! - Pressure: kilopascals (kPa), with psia for the specific-volume formula
//!
//! ## Example
//!
//! ```rust
//! use hvac_core::units::{BtuPerHour, Celsius, Fahrenheit, Tons};
//!
//! let t: Celsius = Fahrenheit(95.0).into();
//! assert!((t.0 - 35.0).abs() < 1e-9);
//!
//! let tons: Tons = BtuPerHour(30_000.0).into();
//! assert_eq!(tons.0, 2.5);
//! ```

use serde::{Deserialize, Serialize};

/// Btu/h per ton of refrigeration
pub const BTUH_PER_TON: f64 = 12_000.0;

/// Btu/h per watt (equipment loads)
pub const BTUH_PER_WATT: f64 = 3.412;

/// Btu/h per watt as used for lighting loads
pub const BTUH_PER_WATT_LIGHTING: f64 = 3.41;

/// Btu/h per horsepower of motor heat released into the space
pub const BTUH_PER_HP: f64 = 2545.0;

/// Grains per pound
pub const GRAINS_PER_LB: f64 = 7000.0;

/// psi per kPa
pub const PSI_PER_KPA: f64 = 0.145_037_738;

/// Standard sea-level atmospheric pressure (kPa)
pub const STANDARD_PRESSURE_KPA: f64 = 101.325;

// ============================================================================
// Temperature
// ============================================================================

/// Temperature in degrees Fahrenheit
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fahrenheit(pub f64);

/// Temperature in degrees Celsius
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Celsius(pub f64);

impl From<Fahrenheit> for Celsius {
    fn from(f: Fahrenheit) -> Self {
        Celsius((f.0 - 32.0) * 5.0 / 9.0)
    }
}

impl From<Celsius> for Fahrenheit {
    fn from(c: Celsius) -> Self {
        Fahrenheit(c.0 * 9.0 / 5.0 + 32.0)
    }
}

impl Fahrenheit {
    /// Absolute temperature in degrees Rankine
    pub fn rankine(self) -> f64 {
        self.0 + 459.67
    }
}

// ============================================================================
// Heat Flow
// ============================================================================

/// Heat flow in Btu per hour
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BtuPerHour(pub f64);

/// Heat flow in tons of refrigeration (1 TR = 12,000 Btu/h)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tons(pub f64);

impl From<BtuPerHour> for Tons {
    fn from(q: BtuPerHour) -> Self {
        Tons(q.0 / BTUH_PER_TON)
    }
}

impl From<Tons> for BtuPerHour {
    fn from(t: Tons) -> Self {
        BtuPerHour(t.0 * BTUH_PER_TON)
    }
}

/// Electrical power in watts
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watts(pub f64);

impl From<Watts> for BtuPerHour {
    fn from(w: Watts) -> Self {
        BtuPerHour(w.0 * BTUH_PER_WATT)
    }
}

/// Motor output in horsepower
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Horsepower(pub f64);

impl From<Horsepower> for BtuPerHour {
    fn from(hp: Horsepower) -> Self {
        BtuPerHour(hp.0 * BTUH_PER_HP)
    }
}

// ============================================================================
// Pressure
// ============================================================================

/// Pressure in kilopascals
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kpa(pub f64);

/// Pressure in pounds per square inch absolute
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Psia(pub f64);

impl Default for Kpa {
    fn default() -> Self {
        Kpa(STANDARD_PRESSURE_KPA)
    }
}

impl From<Kpa> for Psia {
    fn from(p: Kpa) -> Self {
        Psia(p.0 * PSI_PER_KPA)
    }
}

impl From<Psia> for Kpa {
    fn from(p: Psia) -> Self {
        Kpa(p.0 / PSI_PER_KPA)
    }
}

// ============================================================================
// Moisture
// ============================================================================

/// Humidity ratio in grains of water per pound of dry air
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrainsPerLb(pub f64);

/// Humidity ratio in pounds of water per pound of dry air
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LbPerLb(pub f64);

impl From<LbPerLb> for GrainsPerLb {
    fn from(w: LbPerLb) -> Self {
        GrainsPerLb(w.0 * GRAINS_PER_LB)
    }
}

impl From<GrainsPerLb> for LbPerLb {
    fn from(w: GrainsPerLb) -> Self {
        LbPerLb(w.0 / GRAINS_PER_LB)
    }
}

// ============================================================================
// Volume and Airflow
// ============================================================================

/// Volume in cubic feet
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CuFt(pub f64);

/// Airflow in cubic feet per minute
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cfm(pub f64);

impl Cfm {
    /// Airflow equivalent to `ach` air changes per hour of `volume`
    pub fn from_air_changes(volume: CuFt, ach: f64) -> Self {
        Cfm(volume.0 * ach / 60.0)
    }
}

/// Divide, returning 0 when the denominator is zero or the result is not finite.
///
/// Ratios such as Btu/h per sqft or sensible heat factor are defined as 0 for
/// empty rooms rather than NaN.
pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let r = numerator / denominator;
    if r.is_finite() {
        r
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_conversion() {
        let c: Celsius = Fahrenheit(212.0).into();
        assert!((c.0 - 100.0).abs() < 1e-9);
        let f: Fahrenheit = Celsius(-40.0).into();
        assert!((f.0 + 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_tons_to_btuh() {
        let q: BtuPerHour = Tons(2.0).into();
        assert_eq!(q.0, 24_000.0);
    }

    #[test]
    fn test_power_conversions() {
        let q: BtuPerHour = Watts(1000.0).into();
        assert!((q.0 - 3412.0).abs() < 1e-9);
        let m: BtuPerHour = Horsepower(2.0).into();
        assert_eq!(m.0, 5090.0);
    }

    #[test]
    fn test_moisture_conversion() {
        let gr: GrainsPerLb = LbPerLb(0.01).into();
        assert!((gr.0 - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_pressure_conversion() {
        let p: Psia = Kpa(STANDARD_PRESSURE_KPA).into();
        assert!((p.0 - 14.696).abs() < 1e-3);
    }

    #[test]
    fn test_air_changes() {
        let cfm = Cfm::from_air_changes(CuFt(6000.0), 0.5);
        assert_eq!(cfm.0, 50.0);
    }

    #[test]
    fn test_ratio_or_zero() {
        assert_eq!(ratio_or_zero(10.0, 0.0), 0.0);
        assert_eq!(ratio_or_zero(10.0, 4.0), 2.5);
    }

    #[test]
    fn test_serialization() {
        let t = Fahrenheit(75.5);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "75.5");
        let roundtrip: Fahrenheit = serde_json::from_str(&json).unwrap();
        assert_eq!(t, roundtrip);
    }
}

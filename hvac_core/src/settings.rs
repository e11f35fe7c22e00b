//! # Engine Settings
//!
//! Tunable constants for load calculation, equipment selection and material
//! estimating. Every field has a documented default, so a settings TOML only
//! needs the values it changes:
//!
//! ```toml
//! [loads.safety_factors]
//! sensible = 1.05
//!
//! [selection]
//! max_connection_ratio = 1.2
//!
//! [materials]
//! tax_rate = 0.075
//! ```
//!
//! ## Tier table
//!
//! | Tier     | hp per ton | Largest module | Preferred indoor unit |
//! |----------|-----------:|---------------:|-----------------------|
//! | Economy  | 1.2        | 16 hp          | Wall-mounted          |
//! | Balanced | 1.3        | 20 hp          | Ceiling cassette      |
//! | Premium  | 1.4        | 24 hp          | Concealed ducted      |

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::reference::IndoorMounting;
use crate::selection::SelectionTier;

/// All engine settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub loads: LoadSettings,
    pub selection: SelectionSettings,
    pub materials: MaterialSettings,
}

impl EngineSettings {
    /// Parse a (partial) settings document and validate it.
    pub fn from_toml_str(source: &str) -> CalcResult<Self> {
        let settings: EngineSettings =
            toml::from_str(source).map_err(|e| CalcError::reference_data("settings", e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> CalcResult<()> {
        self.loads.validate()?;
        self.selection.validate()?;
        self.materials.validate()?;
        Ok(())
    }
}

/// Multipliers on the sensible and latent subtotals
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyFactors {
    pub sensible: f64,
    pub latent: f64,
}

impl Default for SafetyFactors {
    fn default() -> Self {
        SafetyFactors {
            sensible: 1.1,
            latent: 1.1,
        }
    }
}

impl SafetyFactors {
    pub fn uniform(factor: f64) -> Self {
        SafetyFactors {
            sensible: factor,
            latent: factor,
        }
    }
}

/// Room load calculation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadSettings {
    pub safety_factors: SafetyFactors,
    /// Room minus supply air temperature used for supply cfm
    pub supply_air_rise_f: f64,
    /// Coil bypass factor for effective loads and dehumidified cfm
    pub bypass_factor: f64,
    /// Run the ERSH/ESHF/ADP coil analysis for every room
    pub coil_analysis: bool,
    /// Solar time used for CLTD and CLF lookups
    pub design_hour: f64,
    pub default_lighting_w_per_sqft: f64,
    pub default_equipment_w_per_sqft: f64,
    /// Air changes per hour when a room gives no infiltration
    pub default_infiltration_ach: f64,
    /// Outdoor air rates when no usage preset applies
    pub default_oa_cfm_per_person: f64,
    pub default_oa_cfm_per_sqft: f64,
    /// Unconditioned neighbours are assumed this much cooler than outdoors
    pub adjacent_space_offset_f: f64,
}

impl Default for LoadSettings {
    fn default() -> Self {
        LoadSettings {
            safety_factors: SafetyFactors::default(),
            supply_air_rise_f: 20.0,
            bypass_factor: 0.10,
            coil_analysis: true,
            design_hour: 15.0,
            default_lighting_w_per_sqft: 1.5,
            default_equipment_w_per_sqft: 2.0,
            default_infiltration_ach: 0.5,
            default_oa_cfm_per_person: 5.0,
            default_oa_cfm_per_sqft: 0.06,
            adjacent_space_offset_f: 5.0,
        }
    }
}

impl LoadSettings {
    pub fn validate(&self) -> CalcResult<()> {
        let sf = self.safety_factors;
        for (field, value) in [("safety_factors.sensible", sf.sensible), ("safety_factors.latent", sf.latent)] {
            if !(value.is_finite() && value >= 1.0) {
                return Err(CalcError::invalid_input(field, value.to_string(), "Safety factor must be at least 1.0"));
            }
        }
        if !(self.supply_air_rise_f > 0.0) {
            return Err(CalcError::invalid_input(
                "supply_air_rise_f",
                self.supply_air_rise_f.to_string(),
                "Supply air temperature rise must be positive",
            ));
        }
        if !(0.0..1.0).contains(&self.bypass_factor) {
            return Err(CalcError::invalid_input(
                "bypass_factor",
                self.bypass_factor.to_string(),
                "Bypass factor must be in [0, 1)",
            ));
        }
        if !(0.0..=24.0).contains(&self.design_hour) {
            return Err(CalcError::invalid_input(
                "design_hour",
                self.design_hour.to_string(),
                "Design hour must be between 0 and 24",
            ));
        }
        for (field, value) in [
            ("default_lighting_w_per_sqft", self.default_lighting_w_per_sqft),
            ("default_equipment_w_per_sqft", self.default_equipment_w_per_sqft),
            ("default_infiltration_ach", self.default_infiltration_ach),
            ("default_oa_cfm_per_person", self.default_oa_cfm_per_person),
            ("default_oa_cfm_per_sqft", self.default_oa_cfm_per_sqft),
            ("adjacent_space_offset_f", self.adjacent_space_offset_f),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(CalcError::invalid_input(field, value.to_string(), "Default cannot be negative"));
            }
        }
        Ok(())
    }
}

/// Outdoor sizing ratio, module ceiling and indoor preference for one tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierParameters {
    /// Nominal outdoor hp required per ton of load
    pub hp_per_ton: f64,
    /// Largest outdoor module the tier may use
    pub max_outdoor_hp: f64,
    pub preferred_mounting: IndoorMounting,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierTable {
    pub economy: TierParameters,
    pub balanced: TierParameters,
    pub premium: TierParameters,
}

impl Default for TierTable {
    fn default() -> Self {
        TierTable {
            economy: TierParameters {
                hp_per_ton: 1.2,
                max_outdoor_hp: 16.0,
                preferred_mounting: IndoorMounting::WallMounted,
            },
            balanced: TierParameters {
                hp_per_ton: 1.3,
                max_outdoor_hp: 20.0,
                preferred_mounting: IndoorMounting::Cassette,
            },
            premium: TierParameters {
                hp_per_ton: 1.4,
                max_outdoor_hp: 24.0,
                preferred_mounting: IndoorMounting::Ducted,
            },
        }
    }
}

impl TierTable {
    pub fn get(&self, tier: SelectionTier) -> &TierParameters {
        match tier {
            SelectionTier::Economy => &self.economy,
            SelectionTier::Balanced => &self.balanced,
            SelectionTier::Premium => &self.premium,
        }
    }
}

/// Equipment selection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionSettings {
    pub tiers: TierTable,
    /// Indoor total / outdoor total above this is reported
    pub max_connection_ratio: f64,
    /// Cap on outdoor modules per system
    pub max_outdoor_units: u32,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        SelectionSettings {
            tiers: TierTable::default(),
            max_connection_ratio: 1.3,
            max_outdoor_units: 16,
        }
    }
}

impl SelectionSettings {
    pub fn validate(&self) -> CalcResult<()> {
        for tier in SelectionTier::ALL {
            let params = self.tiers.get(tier);
            if !(params.hp_per_ton > 0.0 && params.max_outdoor_hp > 0.0) {
                return Err(CalcError::invalid_input(
                    format!("tiers.{}", tier.display_name().to_lowercase()),
                    format!("{} hp/ton, {} hp", params.hp_per_ton, params.max_outdoor_hp),
                    "Tier ratio and module ceiling must be positive",
                ));
            }
        }
        if !(self.max_connection_ratio > 0.0) {
            return Err(CalcError::invalid_input(
                "max_connection_ratio",
                self.max_connection_ratio.to_string(),
                "Connection ratio must be positive",
            ));
        }
        if self.max_outdoor_units == 0 {
            return Err(CalcError::invalid_input("max_outdoor_units", "0", "At least one outdoor unit must be allowed"));
        }
        Ok(())
    }
}

/// Material take-off settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialSettings {
    /// Average refrigerant run per indoor unit
    pub piping_run_ft: f64,
    /// Average condensate run per indoor unit
    pub drain_run_ft: f64,
    /// Indoor units served by one condensate pump
    pub drain_pump_fan_out: u32,
    /// Indoor units served by one branch joint
    pub branch_fan_out: u32,
    /// Cable run per unit (indoor and outdoor)
    pub cable_run_ft: f64,
    /// Fraction, e.g. 0.10 for 10 %
    pub tax_rate: f64,
}

impl Default for MaterialSettings {
    fn default() -> Self {
        MaterialSettings {
            piping_run_ft: 50.0,
            drain_run_ft: 20.0,
            drain_pump_fan_out: 4,
            branch_fan_out: 6,
            cable_run_ft: 60.0,
            tax_rate: 0.10,
        }
    }
}

impl MaterialSettings {
    pub fn validate(&self) -> CalcResult<()> {
        for (field, value) in [
            ("piping_run_ft", self.piping_run_ft),
            ("drain_run_ft", self.drain_run_ft),
            ("cable_run_ft", self.cable_run_ft),
            ("tax_rate", self.tax_rate),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(CalcError::invalid_input(field, value.to_string(), "Cannot be negative"));
            }
        }
        if self.drain_pump_fan_out == 0 || self.branch_fan_out == 0 {
            return Err(CalcError::invalid_input(
                "drain_pump_fan_out / branch_fan_out",
                format!("{} / {}", self.drain_pump_fan_out, self.branch_fan_out),
                "Fan-out divisors must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let settings = EngineSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.loads.safety_factors.sensible, 1.1);
        assert_eq!(settings.selection.max_outdoor_units, 16);
        assert_eq!(settings.materials.branch_fan_out, 6);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings = EngineSettings::from_toml_str(
            r#"
            [loads.safety_factors]
            latent = 1.2

            [materials]
            tax_rate = 0.075
            "#,
        )
        .unwrap();
        assert_eq!(settings.loads.safety_factors.sensible, 1.1);
        assert_eq!(settings.loads.safety_factors.latent, 1.2);
        assert_eq!(settings.loads.supply_air_rise_f, 20.0);
        assert_eq!(settings.materials.tax_rate, 0.075);
        assert_eq!(settings.materials.piping_run_ft, 50.0);
    }

    #[test]
    fn test_tier_table_defaults() {
        let tiers = TierTable::default();
        assert_eq!(tiers.get(SelectionTier::Economy).hp_per_ton, 1.2);
        assert_eq!(tiers.get(SelectionTier::Balanced).max_outdoor_hp, 20.0);
        assert_eq!(tiers.get(SelectionTier::Premium).preferred_mounting, IndoorMounting::Ducted);
    }

    #[test]
    fn test_override_tier() {
        let settings = EngineSettings::from_toml_str(
            r#"
            [selection.tiers.economy]
            hp_per_ton = 1.25
            max_outdoor_hp = 12.0
            preferred_mounting = "WallMounted"
            "#,
        )
        .unwrap();
        assert_eq!(settings.selection.tiers.economy.max_outdoor_hp, 12.0);
        assert_eq!(settings.selection.tiers.premium.hp_per_ton, 1.4);
    }

    #[test]
    fn test_safety_factor_below_one_rejected() {
        let err = EngineSettings::from_toml_str("[loads.safety_factors]\nsensible = 0.9").unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_malformed_settings() {
        let err = EngineSettings::from_toml_str("[loads]\nsupply_air_rise_f = \"warm\"").unwrap_err();
        assert_eq!(err.error_code(), "REFERENCE_DATA_ERROR");
    }

    #[test]
    fn test_zero_fan_out_rejected() {
        let mut settings = EngineSettings::default();
        settings.materials.branch_fan_out = 0;
        assert!(settings.validate().is_err());
    }
}

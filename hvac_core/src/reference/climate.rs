//! Design climate presets (outdoor, by city and season) and standard indoor
//! conditions (by usage category).
//!
//! Outdoor presets store whatever the source climate table lists (dry-bulb
//! with either coincident wet-bulb or RH); the psychrometric engine fills in
//! the rest when a preset is requested.

use serde::{Deserialize, Serialize};

use crate::calculations::psychrometrics::{ClimateCondition, PsychrometricEngine, PsychrometricInput};
use crate::errors::{CalcError, CalcResult, ConvergenceWarning};
use crate::reference::tables::ActivityLevel;
use crate::units::STANDARD_PRESSURE_KPA;

/// Design season
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Season {
    #[default]
    Summer,
    Winter,
}

impl Season {
    pub const ALL: [Season; 2] = [Season::Summer, Season::Winter];
}

/// Space/building usage category. Drives indoor presets, ventilation rates,
/// default activity, and diversity adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UsageCategory {
    #[default]
    Office,
    Residential,
    Retail,
    Restaurant,
    Hotel,
    Hospital,
    School,
    Theater,
    DataCenter,
    Gym,
}

impl UsageCategory {
    /// All usage categories for UI selection
    pub const ALL: [UsageCategory; 10] = [
        UsageCategory::Office,
        UsageCategory::Residential,
        UsageCategory::Retail,
        UsageCategory::Restaurant,
        UsageCategory::Hotel,
        UsageCategory::Hospital,
        UsageCategory::School,
        UsageCategory::Theater,
        UsageCategory::DataCenter,
        UsageCategory::Gym,
    ];

    /// Display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            UsageCategory::Office => "Office",
            UsageCategory::Residential => "Residential",
            UsageCategory::Retail => "Retail",
            UsageCategory::Restaurant => "Restaurant",
            UsageCategory::Hotel => "Hotel",
            UsageCategory::Hospital => "Hospital",
            UsageCategory::School => "School",
            UsageCategory::Theater => "Theater / Auditorium",
            UsageCategory::DataCenter => "Data Center",
            UsageCategory::Gym => "Gymnasium",
        }
    }
}

impl std::fmt::Display for UsageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One season's design point for a city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalDesign {
    pub season: Season,
    pub dry_bulb_f: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wet_bulb_f: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_humidity_pct: Option<f64>,
}

/// Design climate record for one city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityClimate {
    pub name: String,
    pub country: String,
    /// Absolute latitude (degrees); solar tables are symmetric for this use
    pub latitude_deg: f64,
    /// Station pressure
    #[serde(default = "default_pressure")]
    pub pressure_kpa: f64,
    /// Mean daily dry-bulb range in summer
    pub daily_range_f: f64,
    pub seasons: Vec<SeasonalDesign>,
}

fn default_pressure() -> f64 {
    STANDARD_PRESSURE_KPA
}

/// Standard indoor design condition for a usage category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndoorPreset {
    pub usage: UsageCategory,
    pub dry_bulb_f: f64,
    pub relative_humidity_pct: f64,
    /// Typical occupant activity
    pub activity: ActivityLevel,
    /// Outdoor air per person (cfm)
    pub oa_cfm_per_person: f64,
    /// Outdoor air per floor area (cfm/sqft)
    pub oa_cfm_per_sqft: f64,
}

/// Resolved outdoor design: state plus the site data the load method needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutdoorDesign {
    pub condition: ClimateCondition,
    pub latitude_deg: f64,
    pub daily_range_f: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<ConvergenceWarning>,
}

/// Climate presets keyed by city/season and indoor presets keyed by usage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClimateDataProvider {
    cities: Vec<CityClimate>,
    indoor: Vec<IndoorPreset>,
}

impl ClimateDataProvider {
    pub fn new(cities: Vec<CityClimate>, indoor: Vec<IndoorPreset>) -> Self {
        ClimateDataProvider { cities, indoor }
    }

    pub fn cities(&self) -> &[CityClimate] {
        &self.cities
    }

    pub fn indoor_presets(&self) -> &[IndoorPreset] {
        &self.indoor
    }

    /// Look up a city by name (case-insensitive)
    pub fn city(&self, name: &str) -> CalcResult<&CityClimate> {
        self.cities
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| CalcError::reference_not_found("climate.cities", name))
    }

    /// Outdoor design condition for a city and season
    ///
    /// # Example
    ///
    /// ```rust
    /// use hvac_core::reference::{ReferenceData, Season};
    ///
    /// let data = ReferenceData::builtin().unwrap();
    /// let design = data.climate.design_condition("Houston", Season::Summer).unwrap();
    /// assert!(design.condition.dry_bulb_f > 90.0);
    /// ```
    pub fn design_condition(&self, city: &str, season: Season) -> CalcResult<OutdoorDesign> {
        let record = self.city(city)?;
        let design = record
            .seasons
            .iter()
            .find(|s| s.season == season)
            .ok_or_else(|| CalcError::reference_not_found("climate.cities.seasons", format!("{city}/{season:?}")))?;

        let input = PsychrometricInput {
            dry_bulb_f: Some(design.dry_bulb_f),
            wet_bulb_f: design.wet_bulb_f,
            relative_humidity_pct: design.relative_humidity_pct,
            pressure_kpa: Some(record.pressure_kpa),
        };
        let resolved = PsychrometricEngine::new().resolve(&input)?;
        Ok(OutdoorDesign {
            condition: resolved.condition,
            latitude_deg: record.latitude_deg,
            daily_range_f: record.daily_range_f,
            warning: resolved.warning,
        })
    }

    /// Indoor preset for a usage category
    pub fn indoor_preset(&self, usage: UsageCategory) -> CalcResult<&IndoorPreset> {
        self.indoor
            .iter()
            .find(|p| p.usage == usage)
            .ok_or_else(|| CalcError::reference_not_found("climate.indoor", usage.display_name()))
    }

    /// Indoor design condition for a usage category at the given pressure
    pub fn indoor_condition(&self, usage: UsageCategory, pressure_kpa: f64) -> CalcResult<ClimateCondition> {
        let preset = self.indoor_preset(usage)?;
        let input = PsychrometricInput::from_db_rh(preset.dry_bulb_f, preset.relative_humidity_pct)
            .with_pressure(pressure_kpa);
        Ok(PsychrometricEngine::new().resolve(&input)?.condition)
    }

    pub(crate) fn validate(&self) -> CalcResult<()> {
        for city in &self.cities {
            if !(0.0..=90.0).contains(&city.latitude_deg.abs()) {
                return Err(CalcError::reference_data(
                    "climate.cities",
                    format!("{}: latitude {} out of range", city.name, city.latitude_deg),
                ));
            }
            if city.daily_range_f < 0.0 || city.pressure_kpa <= 0.0 {
                return Err(CalcError::reference_data(
                    "climate.cities",
                    format!("{}: daily range and pressure must be positive", city.name),
                ));
            }
        }
        for preset in &self.indoor {
            if preset.oa_cfm_per_person < 0.0 || preset.oa_cfm_per_sqft < 0.0 {
                return Err(CalcError::reference_data(
                    "climate.indoor",
                    format!("{}: ventilation rates cannot be negative", preset.usage),
                ));
            }
        }
        Ok(())
    }
}

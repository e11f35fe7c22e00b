//! # Room Cooling Load
//!
//! Heat gain for one room by the CLTD/SHGF/CLF method.
//!
//! ## Addends
//!
//! | Source                  | Sensible                                  | Latent                |
//! |-------------------------|-------------------------------------------|-----------------------|
//! | Walls, roofs            | U · A · CLTD_corrected                    |                       |
//! | Glass conduction        | U · A · (t_o − t_i)                       |                       |
//! | Partitions, floors      | U · A · (t_adj − t_i)                     |                       |
//! | Solar through glass     | A · SHGF_max · CLF · SC · shading         |                       |
//! | People                  | n · activity sensible                     | n · activity latent   |
//! | Lighting                | W · 3.41 · use factor · ballast factor    |                       |
//! | Equipment               | W · 3.412 · use factor · diversity        |                       |
//! | Motors                  | hp · 2545                                 |                       |
//! | Ventilation, infiltration | 1.08 · cfm · ΔT                         | 0.68 · cfm · ΔW       |
//!
//! with `CLTD_corrected = CLTD + (78 − t_i) + (t_o − range/2 − 85)`. Every
//! addend is clamped at zero.
//!
//! Missing optional inputs are replaced by documented defaults, each
//! recorded as a [`DefaultApplied`] marker on the result.
//!
//! ## Example
//!
//! ```rust
//! use hvac_core::calculations::psychrometrics::condition_from_db_rh;
//! use hvac_core::calculations::room_load::{
//!     DesignConditions, InternalLoadSource, RoomGeometry, RoomInput, RoomLoadCalculator,
//! };
//! use hvac_core::reference::ReferenceData;
//! use hvac_core::settings::LoadSettings;
//!
//! let data = ReferenceData::builtin().unwrap();
//! let settings = LoadSettings::default();
//! let design = DesignConditions {
//!     outdoor: condition_from_db_rh(95.0, 50.0, 101.325).unwrap(),
//!     indoor: condition_from_db_rh(75.0, 50.0, 101.325).unwrap(),
//!     latitude_deg: 30.0,
//!     daily_range_f: 20.0,
//!     design_hour: 15.0,
//! };
//! let room = RoomInput {
//!     label: "Office 101".to_string(),
//!     geometry: RoomGeometry::rectangular(20.0, 25.0, 9.0),
//!     internal: InternalLoadSource { occupants: 10, ..Default::default() },
//!     ..Default::default()
//! };
//!
//! let result = RoomLoadCalculator::new(&data.tables, &settings)
//!     .calculate(&room, &design)
//!     .unwrap();
//! assert!(result.tonnage > 0.0);
//! assert_eq!(result.tonnage, result.grand_total_btuh / 12_000.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::calculations::coil::{self, CoilAnalysis, CoilInput};
use crate::calculations::psychrometrics::ClimateCondition;
use crate::errors::{CalcError, CalcResult, ConvergenceWarning, DefaultApplied};
use crate::numeric::{Bisection, RootFinder};
use crate::reference::{
    ActivityLevel, ComponentKind, ConstructionWeight, GlassType, IndoorMounting, IndoorPreset, LoadTables,
    Orientation, ShadingDevice,
};
use crate::settings::{LoadSettings, SafetyFactors};
use crate::units::{
    ratio_or_zero, BtuPerHour, Cfm, CuFt, Horsepower, Tons, Watts, BTUH_PER_WATT_LIGHTING,
};

/// Sensible heat of standard air: 60 min/h × 0.075 lb/ft³ × 0.24 Btu/lb·°F
pub const SENSIBLE_AIR_FACTOR: f64 = 1.08;

/// Latent heat of standard air per grain: 60 × 0.075 × 1076 / 7000
pub const LATENT_AIR_FACTOR: f64 = 0.68;

/// CLTD table base: inside temperature
const CLTD_BASE_INDOOR_F: f64 = 78.0;

/// CLTD table base: daily mean outside temperature
const CLTD_BASE_OUTDOOR_MEAN_F: f64 = 85.0;

// ============================================================================
// Input types
// ============================================================================

/// Room dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RoomGeometry {
    pub length_ft: f64,
    pub width_ft: f64,
    pub height_ft: f64,
    /// Floor area when the room is not a rectangle; overrides length × width
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_sqft: Option<f64>,
}

impl RoomGeometry {
    pub fn rectangular(length_ft: f64, width_ft: f64, height_ft: f64) -> Self {
        RoomGeometry {
            length_ft,
            width_ft,
            height_ft,
            area_sqft: None,
        }
    }

    /// Room with a known floor area
    pub fn with_area(area_sqft: f64, height_ft: f64) -> Self {
        RoomGeometry {
            length_ft: 0.0,
            width_ft: 0.0,
            height_ft,
            area_sqft: Some(area_sqft),
        }
    }

    pub fn area_sqft(&self) -> f64 {
        self.area_sqft.unwrap_or(self.length_ft * self.width_ft)
    }

    pub fn volume_cuft(&self) -> f64 {
        self.area_sqft() * self.height_ft
    }

    pub fn validate(&self) -> CalcResult<()> {
        for (field, value) in [
            ("geometry.length_ft", self.length_ft),
            ("geometry.width_ft", self.width_ft),
            ("geometry.height_ft", self.height_ft),
            ("geometry.area_sqft", self.area_sqft.unwrap_or(0.0)),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(CalcError::invalid_input(field, value.to_string(), "Dimension cannot be negative"));
            }
        }
        Ok(())
    }
}

/// Glazing description for a glass component
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GlassSpec {
    #[serde(default)]
    pub glass_type: GlassType,
    #[serde(default)]
    pub shading: ShadingDevice,
    /// Overrides the glass type's shading coefficient
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shading_coefficient: Option<f64>,
    /// Overrides the glass type's U-factor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub u_factor: Option<f64>,
}

/// One surface of the room envelope.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "West wall",
///   "kind": "Wall",
///   "area_sqft": 180.0,
///   "orientation": "W",
///   "construction": "brick wall"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeComponent {
    #[serde(default)]
    pub label: String,
    pub kind: ComponentKind,
    pub area_sqft: f64,
    #[serde(default)]
    pub orientation: Orientation,
    /// Named construction from the reference tables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub construction: Option<String>,
    /// Explicit U-factor (Btu/h·sqft·°F); wins over construction and glass type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub u_factor: Option<f64>,
    /// CLTD weight class for walls and roofs; wins over the construction's
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<ConstructionWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glass: Option<GlassSpec>,
    /// Temperature of the space behind a partition or floor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjacent_temp_f: Option<f64>,
}

impl EnvelopeComponent {
    /// A component with only kind, area and orientation set
    pub fn new(kind: ComponentKind, area_sqft: f64, orientation: Orientation) -> Self {
        EnvelopeComponent {
            label: String::new(),
            kind,
            area_sqft,
            orientation,
            construction: None,
            u_factor: None,
            weight: None,
            glass: None,
            adjacent_temp_f: None,
        }
    }

    fn field(&self, index: usize, name: &str) -> String {
        format!("envelope[{index}].{name}")
    }

    pub fn validate(&self, index: usize) -> CalcResult<()> {
        if !(self.area_sqft.is_finite() && self.area_sqft >= 0.0) {
            return Err(CalcError::invalid_input(
                self.field(index, "area_sqft"),
                self.area_sqft.to_string(),
                "Area cannot be negative",
            ));
        }
        if let Some(u) = self.u_factor {
            if !(u.is_finite() && u >= 0.0) {
                return Err(CalcError::invalid_input(
                    self.field(index, "u_factor"),
                    u.to_string(),
                    "U-factor cannot be negative",
                ));
            }
        }
        if self.kind == ComponentKind::Wall && !self.orientation.is_vertical() {
            return Err(CalcError::invalid_input(
                self.field(index, "orientation"),
                "Horizontal",
                "Walls need a compass orientation",
            ));
        }
        if self.glass.is_some() && self.kind != ComponentKind::Glass {
            return Err(CalcError::invalid_input(
                self.field(index, "glass"),
                self.kind.display_name(),
                "Glass properties only apply to glass components",
            ));
        }
        Ok(())
    }
}

/// Electrical load, either absolute or per floor area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectricLoad {
    Watts(f64),
    WattsPerSqft(f64),
}

impl ElectricLoad {
    pub fn watts(&self, area_sqft: f64) -> Watts {
        match *self {
            ElectricLoad::Watts(w) => Watts(w),
            ElectricLoad::WattsPerSqft(density) => Watts(density * area_sqft),
        }
    }

    fn value(&self) -> f64 {
        match *self {
            ElectricLoad::Watts(v) | ElectricLoad::WattsPerSqft(v) => v,
        }
    }
}

/// Occupants, lighting, equipment and motors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InternalLoadSource {
    pub occupants: u32,
    /// Occupant activity; the usage preset's activity when omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<ActivityLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lighting: Option<ElectricLoad>,
    pub lighting_use_factor: f64,
    pub ballast_factor: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment: Option<ElectricLoad>,
    pub equipment_use_factor: f64,
    pub equipment_diversity: f64,
    /// Motor output inside the space
    pub motor_hp: f64,
}

impl Default for InternalLoadSource {
    fn default() -> Self {
        InternalLoadSource {
            occupants: 0,
            activity: None,
            lighting: None,
            lighting_use_factor: 1.0,
            ballast_factor: 1.0,
            equipment: None,
            equipment_use_factor: 1.0,
            equipment_diversity: 1.0,
            motor_hp: 0.0,
        }
    }
}

impl InternalLoadSource {
    pub fn validate(&self) -> CalcResult<()> {
        for (field, value) in [
            ("internal.lighting", self.lighting.map_or(0.0, |l| l.value())),
            ("internal.equipment", self.equipment.map_or(0.0, |e| e.value())),
            ("internal.lighting_use_factor", self.lighting_use_factor),
            ("internal.ballast_factor", self.ballast_factor),
            ("internal.equipment_use_factor", self.equipment_use_factor),
            ("internal.equipment_diversity", self.equipment_diversity),
            ("internal.motor_hp", self.motor_hp),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(CalcError::invalid_input(field, value.to_string(), "Cannot be negative"));
            }
        }
        Ok(())
    }
}

/// Outdoor air and infiltration for a room
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VentilationSpec {
    /// Designed fresh air; occupancy and area rates when omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outdoor_air_cfm: Option<f64>,
    /// Infiltration airflow; wins over `infiltration_ach`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infiltration_cfm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infiltration_ach: Option<f64>,
}

impl VentilationSpec {
    pub fn validate(&self) -> CalcResult<()> {
        for (field, value) in [
            ("ventilation.outdoor_air_cfm", self.outdoor_air_cfm),
            ("ventilation.infiltration_cfm", self.infiltration_cfm),
            ("ventilation.infiltration_ach", self.infiltration_ach),
        ] {
            if let Some(v) = value {
                if !(v.is_finite() && v >= 0.0) {
                    return Err(CalcError::invalid_input(field, v.to_string(), "Airflow cannot be negative"));
                }
            }
        }
        Ok(())
    }
}

/// Everything the calculator needs to know about one room.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoomInput {
    pub label: String,
    pub geometry: RoomGeometry,
    #[serde(default)]
    pub envelope: Vec<EnvelopeComponent>,
    #[serde(default)]
    pub internal: InternalLoadSource,
    #[serde(default)]
    pub ventilation: VentilationSpec,
    /// Overrides the configured safety factors for this room
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safety_factors: Option<SafetyFactors>,
    /// Overrides the tier's preferred indoor unit mounting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indoor_mounting: Option<IndoorMounting>,
}

impl RoomInput {
    pub fn validate(&self) -> CalcResult<()> {
        self.geometry.validate()?;
        for (i, component) in self.envelope.iter().enumerate() {
            component.validate(i)?;
        }
        self.internal.validate()?;
        self.ventilation.validate()?;
        if let Some(sf) = self.safety_factors {
            if !(sf.sensible >= 1.0 && sf.latent >= 1.0) {
                return Err(CalcError::invalid_input(
                    "safety_factors",
                    format!("{} / {}", sf.sensible, sf.latent),
                    "Safety factors must be at least 1.0",
                ));
            }
        }
        Ok(())
    }
}

/// Outdoor and indoor design states plus the site data the tables need
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DesignConditions {
    pub outdoor: ClimateCondition,
    pub indoor: ClimateCondition,
    pub latitude_deg: f64,
    pub daily_range_f: f64,
    /// Solar time (h)
    pub design_hour: f64,
}

impl DesignConditions {
    pub fn delta_t_f(&self) -> f64 {
        self.outdoor.dry_bulb_f - self.indoor.dry_bulb_f
    }

    pub fn delta_w_gr_lb(&self) -> f64 {
        self.outdoor.humidity_ratio_gr_lb - self.indoor.humidity_ratio_gr_lb
    }

    /// Correction added to every tabulated CLTD
    pub fn cltd_correction_f(&self) -> f64 {
        (CLTD_BASE_INDOOR_F - self.indoor.dry_bulb_f)
            + (self.outdoor.dry_bulb_f - self.daily_range_f / 2.0 - CLTD_BASE_OUTDOOR_MEAN_F)
    }

    pub fn validate(&self) -> CalcResult<()> {
        if !(0.0..=24.0).contains(&self.design_hour) {
            return Err(CalcError::invalid_input(
                "design.design_hour",
                self.design_hour.to_string(),
                "Design hour must be between 0 and 24",
            ));
        }
        if !(0.0..=90.0).contains(&self.latitude_deg.abs()) {
            return Err(CalcError::invalid_input(
                "design.latitude_deg",
                self.latitude_deg.to_string(),
                "Latitude must be between -90 and 90",
            ));
        }
        if self.daily_range_f < 0.0 {
            return Err(CalcError::invalid_input(
                "design.daily_range_f",
                self.daily_range_f.to_string(),
                "Daily range cannot be negative",
            ));
        }
        Ok(())
    }
}

/// Activity and outdoor-air rates used when a room does not give them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OccupancyDefaults {
    pub activity: ActivityLevel,
    pub oa_cfm_per_person: f64,
    pub oa_cfm_per_sqft: f64,
}

impl OccupancyDefaults {
    pub fn from_preset(preset: &IndoorPreset) -> Self {
        OccupancyDefaults {
            activity: preset.activity,
            oa_cfm_per_person: preset.oa_cfm_per_person,
            oa_cfm_per_sqft: preset.oa_cfm_per_sqft,
        }
    }

    pub fn from_settings(settings: &LoadSettings) -> Self {
        OccupancyDefaults {
            activity: ActivityLevel::default(),
            oa_cfm_per_person: settings.default_oa_cfm_per_person,
            oa_cfm_per_sqft: settings.default_oa_cfm_per_sqft,
        }
    }
}

// ============================================================================
// Result types
// ============================================================================

/// Sensible heat gain by source (Btu/h), before safety factor
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SensibleBreakdown {
    pub wall_btuh: f64,
    pub roof_btuh: f64,
    pub glass_conduction_btuh: f64,
    pub partition_btuh: f64,
    pub floor_btuh: f64,
    pub solar_btuh: f64,
    pub people_btuh: f64,
    pub lighting_btuh: f64,
    pub equipment_btuh: f64,
    pub motor_btuh: f64,
    pub ventilation_btuh: f64,
    pub infiltration_btuh: f64,
}

impl SensibleBreakdown {
    pub fn total(&self) -> f64 {
        self.wall_btuh
            + self.roof_btuh
            + self.glass_conduction_btuh
            + self.partition_btuh
            + self.floor_btuh
            + self.solar_btuh
            + self.people_btuh
            + self.lighting_btuh
            + self.equipment_btuh
            + self.motor_btuh
            + self.ventilation_btuh
            + self.infiltration_btuh
    }

    fn add_envelope(&mut self, kind: ComponentKind, conduction_btuh: f64, solar_btuh: f64) {
        match kind {
            ComponentKind::Wall => self.wall_btuh += conduction_btuh,
            ComponentKind::Roof => self.roof_btuh += conduction_btuh,
            ComponentKind::Glass => self.glass_conduction_btuh += conduction_btuh,
            ComponentKind::Partition => self.partition_btuh += conduction_btuh,
            ComponentKind::Floor => self.floor_btuh += conduction_btuh,
        }
        self.solar_btuh += solar_btuh;
    }
}

/// Latent heat gain by source (Btu/h), before safety factor
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LatentBreakdown {
    pub people_btuh: f64,
    pub ventilation_btuh: f64,
    pub infiltration_btuh: f64,
}

impl LatentBreakdown {
    pub fn total(&self) -> f64 {
        self.people_btuh + self.ventilation_btuh + self.infiltration_btuh
    }
}

/// Audit line for one envelope component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentLoad {
    pub label: String,
    pub kind: ComponentKind,
    pub orientation: Orientation,
    pub area_sqft: f64,
    pub u_factor: f64,
    /// Corrected CLTD for walls and roofs, plain ΔT otherwise (°F)
    pub temperature_difference_f: f64,
    pub conduction_btuh: f64,
    pub solar_btuh: f64,
}

/// Room cooling load.
///
/// ## JSON Example (abridged)
///
/// ```json
/// {
///   "label": "Office 101",
///   "area_sqft": 500.0,
///   "sensible_subtotal_btuh": 19269.5,
///   "latent_subtotal_btuh": 22277.6,
///   "safety_factors": { "sensible": 1.1, "latent": 1.1 },
///   "adjusted_sensible_btuh": 21196.5,
///   "adjusted_latent_btuh": 24505.4,
///   "grand_total_btuh": 45701.9,
///   "tonnage": 3.81,
///   "supply_cfm": 981.3,
///   "sensible_heat_factor": 0.464,
///   "defaults_applied": [
///     { "field": "internal.equipment", "value": 2.0, "note": "W/sqft" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomLoadResult {
    pub label: String,
    pub area_sqft: f64,
    pub volume_cuft: f64,
    pub sensible: SensibleBreakdown,
    pub latent: LatentBreakdown,
    pub components: Vec<ComponentLoad>,
    pub sensible_subtotal_btuh: f64,
    pub latent_subtotal_btuh: f64,
    pub safety_factors: SafetyFactors,
    pub adjusted_sensible_btuh: f64,
    pub adjusted_latent_btuh: f64,
    /// Adjusted sensible + adjusted latent
    pub grand_total_btuh: f64,
    /// grand_total_btuh / 12,000
    pub tonnage: f64,
    pub supply_cfm: f64,
    pub sensible_heat_factor: f64,
    pub outdoor_air_cfm: f64,
    pub infiltration_cfm: f64,
    /// Btu/h per sqft; 0 for a room without floor area
    pub load_density_btuh_sqft: f64,
    /// sqft per ton; 0 for a room without load
    pub sqft_per_ton: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coil: Option<CoilAnalysis>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaults_applied: Vec<DefaultApplied>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ConvergenceWarning>,
    /// Carried through for indoor-unit selection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indoor_mounting: Option<IndoorMounting>,
}

impl RoomLoadResult {
    pub fn used_defaults(&self) -> bool {
        !self.defaults_applied.is_empty()
    }
}

// ============================================================================
// Calculator
// ============================================================================

/// Computes [`RoomLoadResult`]s against one set of tables and settings.
pub struct RoomLoadCalculator<'a, S: RootFinder = Bisection> {
    tables: &'a LoadTables,
    settings: &'a LoadSettings,
    occupancy: OccupancyDefaults,
    solver: S,
}

impl<'a> RoomLoadCalculator<'a, Bisection> {
    pub fn new(tables: &'a LoadTables, settings: &'a LoadSettings) -> Self {
        RoomLoadCalculator {
            tables,
            settings,
            occupancy: OccupancyDefaults::from_settings(settings),
            solver: Bisection::default(),
        }
    }
}

impl<'a, S: RootFinder> RoomLoadCalculator<'a, S> {
    /// Use a different root finder for the coil analysis
    pub fn with_solver<T: RootFinder>(self, solver: T) -> RoomLoadCalculator<'a, T> {
        RoomLoadCalculator {
            tables: self.tables,
            settings: self.settings,
            occupancy: self.occupancy,
            solver,
        }
    }

    /// Use a usage preset's activity and outdoor-air rates as defaults
    pub fn with_occupancy(mut self, occupancy: OccupancyDefaults) -> Self {
        self.occupancy = occupancy;
        self
    }

    /// Compute the cooling load of one room.
    ///
    /// # Errors
    ///
    /// Input errors for negative areas, airflows or factors, for walls
    /// facing "Horizontal", and for a construction of the wrong kind;
    /// reference errors for unknown constructions.
    pub fn calculate(&self, room: &RoomInput, design: &DesignConditions) -> CalcResult<RoomLoadResult> {
        room.validate()?;
        design.validate()?;

        let area = room.geometry.area_sqft();
        let volume = room.geometry.volume_cuft();
        let mut defaults = Vec::new();
        let mut sensible = SensibleBreakdown::default();
        let mut latent = LatentBreakdown::default();

        // Envelope
        let mut components = Vec::with_capacity(room.envelope.len());
        for (i, component) in room.envelope.iter().enumerate() {
            let line = self.envelope_load(i, component, design, &mut defaults)?;
            sensible.add_envelope(line.kind, line.conduction_btuh, line.solar_btuh);
            components.push(line);
        }

        // People
        let activity = match room.internal.activity {
            Some(a) => a,
            None => {
                if room.internal.occupants > 0 {
                    defaults.push(DefaultApplied::new(
                        "internal.activity",
                        0.0,
                        format!("{:?}", self.occupancy.activity),
                    ));
                }
                self.occupancy.activity
            }
        };
        let gain = self.tables.activity(activity)?;
        let occupants = f64::from(room.internal.occupants);
        sensible.people_btuh = occupants * gain.sensible_btuh;
        latent.people_btuh = occupants * gain.latent_btuh;

        // Lighting and equipment
        let lighting = room.internal.lighting.unwrap_or_else(|| {
            defaults.push(DefaultApplied::new(
                "internal.lighting",
                self.settings.default_lighting_w_per_sqft,
                "W/sqft",
            ));
            ElectricLoad::WattsPerSqft(self.settings.default_lighting_w_per_sqft)
        });
        sensible.lighting_btuh = lighting.watts(area).0
            * BTUH_PER_WATT_LIGHTING
            * room.internal.lighting_use_factor
            * room.internal.ballast_factor;

        let equipment = room.internal.equipment.unwrap_or_else(|| {
            defaults.push(DefaultApplied::new(
                "internal.equipment",
                self.settings.default_equipment_w_per_sqft,
                "W/sqft",
            ));
            ElectricLoad::WattsPerSqft(self.settings.default_equipment_w_per_sqft)
        });
        sensible.equipment_btuh = BtuPerHour::from(equipment.watts(area)).0
            * room.internal.equipment_use_factor
            * room.internal.equipment_diversity;
        sensible.motor_btuh = BtuPerHour::from(Horsepower(room.internal.motor_hp)).0;

        // Outdoor air and infiltration
        let outdoor_air_cfm = match room.ventilation.outdoor_air_cfm {
            Some(cfm) => cfm,
            None => {
                let cfm = occupants * self.occupancy.oa_cfm_per_person + area * self.occupancy.oa_cfm_per_sqft;
                defaults.push(DefaultApplied::new("ventilation.outdoor_air_cfm", cfm, "cfm"));
                cfm
            }
        };
        let infiltration_cfm = match (room.ventilation.infiltration_cfm, room.ventilation.infiltration_ach) {
            (Some(cfm), _) => cfm,
            (None, Some(ach)) => Cfm::from_air_changes(CuFt(volume), ach).0,
            (None, None) => {
                let ach = self.settings.default_infiltration_ach;
                defaults.push(DefaultApplied::new("ventilation.infiltration_ach", ach, "ACH"));
                Cfm::from_air_changes(CuFt(volume), ach).0
            }
        };

        let dt = design.delta_t_f();
        let dw = design.delta_w_gr_lb();
        sensible.ventilation_btuh = air_sensible(outdoor_air_cfm, dt);
        sensible.infiltration_btuh = air_sensible(infiltration_cfm, dt);
        latent.ventilation_btuh = air_latent(outdoor_air_cfm, dw);
        latent.infiltration_btuh = air_latent(infiltration_cfm, dw);

        // Totals
        let safety = room.safety_factors.unwrap_or(self.settings.safety_factors);
        let sensible_subtotal = sensible.total();
        let latent_subtotal = latent.total();
        let adjusted_sensible = sensible_subtotal * safety.sensible;
        let adjusted_latent = latent_subtotal * safety.latent;
        let grand_total = adjusted_sensible + adjusted_latent;
        let tonnage = Tons::from(BtuPerHour(grand_total)).0;

        let mut warnings = Vec::new();
        let coil = if self.settings.coil_analysis {
            let analysis = coil::analyze(
                &CoilInput {
                    room_sensible_btuh: sensible_subtotal - sensible.ventilation_btuh,
                    room_latent_btuh: latent_subtotal - latent.ventilation_btuh,
                    ventilation_sensible_btuh: sensible.ventilation_btuh,
                    ventilation_latent_btuh: latent.ventilation_btuh,
                    safety_factors: safety,
                    bypass_factor: self.settings.bypass_factor,
                    indoor: design.indoor,
                },
                &self.solver,
            );
            warnings.extend(analysis.warning.clone());
            Some(analysis)
        } else {
            None
        };

        tracing::debug!(
            room = %room.label,
            sensible = adjusted_sensible,
            latent = adjusted_latent,
            tons = tonnage,
            defaults = defaults.len(),
            "room load"
        );

        Ok(RoomLoadResult {
            label: room.label.clone(),
            area_sqft: area,
            volume_cuft: volume,
            sensible,
            latent,
            components,
            sensible_subtotal_btuh: sensible_subtotal,
            latent_subtotal_btuh: latent_subtotal,
            safety_factors: safety,
            adjusted_sensible_btuh: adjusted_sensible,
            adjusted_latent_btuh: adjusted_latent,
            grand_total_btuh: grand_total,
            tonnage,
            supply_cfm: ratio_or_zero(adjusted_sensible, SENSIBLE_AIR_FACTOR * self.settings.supply_air_rise_f),
            sensible_heat_factor: ratio_or_zero(adjusted_sensible, grand_total),
            outdoor_air_cfm,
            infiltration_cfm,
            load_density_btuh_sqft: ratio_or_zero(grand_total, area),
            sqft_per_ton: ratio_or_zero(area, tonnage),
            coil,
            defaults_applied: defaults,
            warnings,
            indoor_mounting: room.indoor_mounting,
        })
    }

    fn envelope_load(
        &self,
        index: usize,
        component: &EnvelopeComponent,
        design: &DesignConditions,
        defaults: &mut Vec<DefaultApplied>,
    ) -> CalcResult<ComponentLoad> {
        let construction = match &component.construction {
            Some(name) => {
                let c = self.tables.construction(name)?;
                if c.kind != component.kind {
                    return Err(CalcError::invalid_input(
                        format!("envelope[{index}].construction"),
                        name.clone(),
                        format!("{} construction used on a {}", c.kind.display_name(), component.kind.display_name()),
                    ));
                }
                Some(c)
            }
            None => None,
        };

        let glass = match (component.kind, component.glass) {
            (ComponentKind::Glass, Some(spec)) => Some(spec),
            (ComponentKind::Glass, None) => {
                defaults.push(DefaultApplied::new(format!("envelope[{index}].glass"), 1.0, "single clear, no shading"));
                Some(GlassSpec::default())
            }
            _ => None,
        };

        let u_factor = match (component.u_factor, glass.and_then(|g| g.u_factor), construction) {
            (Some(u), _, _) => u,
            (None, Some(u), _) => u,
            (None, None, Some(c)) => c.u_factor,
            (None, None, None) => match glass {
                Some(spec) => self.tables.glass(spec.glass_type)?.u_factor,
                None => {
                    let u = self.tables.default_u_factor(component.kind)?;
                    defaults.push(DefaultApplied::new(format!("envelope[{index}].u_factor"), u, "Btu/h·sqft·°F"));
                    u
                }
            },
        };

        let area = component.area_sqft;
        let (temperature_difference, solar) = match component.kind {
            ComponentKind::Wall | ComponentKind::Roof => {
                let weight = match component.weight.or(construction.and_then(|c| c.weight)) {
                    Some(w) => w,
                    None => {
                        defaults.push(DefaultApplied::new(format!("envelope[{index}].weight"), 0.0, "Medium"));
                        ConstructionWeight::Medium
                    }
                };
                let cltd = if component.kind == ComponentKind::Roof {
                    self.tables.roof_cltd(weight, design.design_hour)?
                } else {
                    self.tables.wall_cltd(component.orientation, weight, design.design_hour)?
                };
                (cltd + design.cltd_correction_f(), 0.0)
            }
            ComponentKind::Glass => {
                let spec = glass.unwrap_or_default();
                let sc = match spec.shading_coefficient {
                    Some(sc) => sc,
                    None => self.tables.glass(spec.glass_type)?.shading_coefficient,
                };
                let shading = self.tables.shading(spec.shading)?.multiplier;
                let shgf = self.tables.shgf_max(component.orientation, design.latitude_deg)?;
                let clf = self.tables.clf(component.orientation, design.design_hour)?;
                (design.delta_t_f(), area * shgf * clf * sc * shading)
            }
            ComponentKind::Partition | ComponentKind::Floor => {
                let adjacent = match component.adjacent_temp_f {
                    Some(t) => t,
                    None => {
                        let t = design.outdoor.dry_bulb_f - self.settings.adjacent_space_offset_f;
                        defaults.push(DefaultApplied::new(format!("envelope[{index}].adjacent_temp_f"), t, "°F"));
                        t
                    }
                };
                (adjacent - design.indoor.dry_bulb_f, 0.0)
            }
        };

        Ok(ComponentLoad {
            label: component.label.clone(),
            kind: component.kind,
            orientation: component.orientation,
            area_sqft: area,
            u_factor,
            temperature_difference_f: temperature_difference,
            conduction_btuh: (u_factor * area * temperature_difference).max(0.0),
            solar_btuh: solar.max(0.0),
        })
    }
}

/// Sensible load of an airflow at a dry-bulb difference, never negative
pub fn air_sensible(cfm: f64, delta_t_f: f64) -> f64 {
    (SENSIBLE_AIR_FACTOR * cfm * delta_t_f).max(0.0)
}

/// Latent load of an airflow at a humidity-ratio difference, never negative
pub fn air_latent(cfm: f64, delta_w_gr_lb: f64) -> f64 {
    (LATENT_AIR_FACTOR * cfm * delta_w_gr_lb).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::psychrometrics::condition_from_db_rh;
    use crate::reference::ReferenceData;
    use crate::units::STANDARD_PRESSURE_KPA;
    use proptest::prelude::*;

    fn tables() -> &'static LoadTables {
        &ReferenceData::builtin().unwrap().tables
    }

    fn design() -> DesignConditions {
        DesignConditions {
            outdoor: condition_from_db_rh(95.0, 50.0, STANDARD_PRESSURE_KPA).unwrap(),
            indoor: condition_from_db_rh(75.0, 50.0, STANDARD_PRESSURE_KPA).unwrap(),
            latitude_deg: 32.0,
            daily_range_f: 20.0,
            design_hour: 14.0,
        }
    }

    /// 500 sqft office, 10 occupants, 1.5 W/sqft, 500 cfm infiltration
    fn scenario_b() -> RoomInput {
        RoomInput {
            label: "Office".to_string(),
            geometry: RoomGeometry::rectangular(20.0, 25.0, 10.0),
            internal: InternalLoadSource {
                occupants: 10,
                activity: Some(ActivityLevel::Office),
                lighting: Some(ElectricLoad::WattsPerSqft(1.5)),
                ..Default::default()
            },
            ventilation: VentilationSpec {
                outdoor_air_cfm: Some(0.0),
                infiltration_cfm: Some(500.0),
                infiltration_ach: None,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_scenario_b_office() {
        let settings = LoadSettings::default();
        let d = design();
        let result = RoomLoadCalculator::new(tables(), &settings)
            .calculate(&scenario_b(), &d)
            .unwrap();

        assert_eq!(result.area_sqft, 500.0);
        assert_eq!(result.sensible.people_btuh, 2500.0);
        assert_eq!(result.latent.people_btuh, 2000.0);
        assert!((result.sensible.lighting_btuh - 2557.5).abs() < 1e-9);
        // Equipment falls back to 2.0 W/sqft
        assert!((result.sensible.equipment_btuh - 3412.0).abs() < 1e-9);
        assert!((result.sensible.infiltration_btuh - 10_800.0).abs() < 1e-9);
        assert_eq!(result.sensible.ventilation_btuh, 0.0);

        let expected_sensible = 2500.0 + 2557.5 + 3412.0 + 10_800.0;
        assert!((result.sensible_subtotal_btuh - expected_sensible).abs() < 1e-9);
        let expected_latent = 2000.0 + 0.68 * 500.0 * d.delta_w_gr_lb();
        assert!((result.latent_subtotal_btuh - expected_latent).abs() < 1e-9);

        assert!((result.adjusted_sensible_btuh - expected_sensible * 1.1).abs() < 1e-9);
        assert_eq!(result.tonnage, result.grand_total_btuh / 12_000.0);
        assert_eq!(result.grand_total_btuh, result.adjusted_sensible_btuh + result.adjusted_latent_btuh);

        let fields: Vec<_> = result.defaults_applied.iter().map(|d| d.field.as_str()).collect();
        assert_eq!(fields, vec!["internal.equipment"]);
    }

    #[test]
    fn test_calculation_is_idempotent() {
        let settings = LoadSettings::default();
        let calc = RoomLoadCalculator::new(tables(), &settings);
        let mut room = scenario_b();
        room.envelope.push(EnvelopeComponent::new(ComponentKind::Glass, 40.0, Orientation::W));
        let a = calc.calculate(&room, &design()).unwrap();
        let b = calc.calculate(&room, &design()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.grand_total_btuh.to_bits(), b.grand_total_btuh.to_bits());
    }

    #[test]
    fn test_empty_room_has_no_nan() {
        let settings = LoadSettings::default();
        let room = RoomInput {
            label: "Closet".to_string(),
            internal: InternalLoadSource {
                lighting: Some(ElectricLoad::Watts(0.0)),
                equipment: Some(ElectricLoad::Watts(0.0)),
                ..Default::default()
            },
            ventilation: VentilationSpec {
                outdoor_air_cfm: Some(0.0),
                infiltration_cfm: Some(0.0),
                infiltration_ach: None,
            },
            ..Default::default()
        };
        let result = RoomLoadCalculator::new(tables(), &settings)
            .calculate(&room, &design())
            .unwrap();
        assert_eq!(result.grand_total_btuh, 0.0);
        assert_eq!(result.sensible_heat_factor, 0.0);
        assert_eq!(result.load_density_btuh_sqft, 0.0);
        assert_eq!(result.sqft_per_ton, 0.0);
        assert_eq!(result.supply_cfm, 0.0);
        assert!(result.coil.as_ref().is_some_and(|c| c.dehumidified_cfm == 0.0));
    }

    #[test]
    fn test_wall_uses_corrected_cltd() {
        let settings = LoadSettings::default();
        let mut room = scenario_b();
        let mut wall = EnvelopeComponent::new(ComponentKind::Wall, 100.0, Orientation::W);
        wall.construction = Some("brick wall".to_string());
        room.envelope.push(wall);
        let d = design();
        let result = RoomLoadCalculator::new(tables(), &settings).calculate(&room, &d).unwrap();

        // Heavy west wall at 14:00 is 13 °F; correction (78-75) + (95-10-85) = 3
        let line = &result.components[0];
        assert!((line.temperature_difference_f - 16.0).abs() < 1e-9);
        assert!((line.conduction_btuh - 0.35 * 100.0 * 16.0).abs() < 1e-9);
        assert_eq!(result.sensible.wall_btuh, line.conduction_btuh);
    }

    #[test]
    fn test_glass_solar_and_conduction() {
        let settings = LoadSettings::default();
        let mut room = scenario_b();
        let mut glass = EnvelopeComponent::new(ComponentKind::Glass, 50.0, Orientation::S);
        glass.glass = Some(GlassSpec {
            glass_type: GlassType::DoubleClear,
            shading: ShadingDevice::VenetianBlinds,
            ..Default::default()
        });
        room.envelope.push(glass);
        let result = RoomLoadCalculator::new(tables(), &settings).calculate(&room, &design()).unwrap();

        // S at 32° latitude: SHGF 47, CLF at 14:00 0.60
        let expected_solar = 50.0 * 47.0 * 0.60 * 0.88 * 0.64;
        assert!((result.sensible.solar_btuh - expected_solar).abs() < 1e-9);
        assert!((result.sensible.glass_conduction_btuh - 0.49 * 50.0 * 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_default_glass_is_marked() {
        let settings = LoadSettings::default();
        let mut room = scenario_b();
        room.envelope.push(EnvelopeComponent::new(ComponentKind::Glass, 20.0, Orientation::E));
        let result = RoomLoadCalculator::new(tables(), &settings).calculate(&room, &design()).unwrap();
        assert!(result.defaults_applied.iter().any(|d| d.field == "envelope[0].glass"));
        assert_eq!(result.components[0].u_factor, 1.04);
    }

    #[test]
    fn test_partition_defaults_to_outdoor_offset() {
        let settings = LoadSettings::default();
        let mut room = scenario_b();
        room.envelope.push(EnvelopeComponent::new(ComponentKind::Partition, 100.0, Orientation::N));
        let result = RoomLoadCalculator::new(tables(), &settings).calculate(&room, &design()).unwrap();
        // (95 - 5) - 75 = 15 °F across the default 0.40 partition
        assert!((result.sensible.partition_btuh - 0.40 * 100.0 * 15.0).abs() < 1e-9);
        assert!(result.defaults_applied.iter().any(|d| d.field == "envelope[0].adjacent_temp_f"));
        assert!(result.defaults_applied.iter().any(|d| d.field == "envelope[0].u_factor"));
    }

    #[test]
    fn test_cooler_neighbour_clamps_to_zero() {
        let settings = LoadSettings::default();
        let mut room = scenario_b();
        let mut floor = EnvelopeComponent::new(ComponentKind::Floor, 500.0, Orientation::Horizontal);
        floor.adjacent_temp_f = Some(70.0);
        room.envelope.push(floor);
        let result = RoomLoadCalculator::new(tables(), &settings).calculate(&room, &design()).unwrap();
        assert_eq!(result.sensible.floor_btuh, 0.0);
        assert_eq!(result.components[0].temperature_difference_f, -5.0);
    }

    #[test]
    fn test_roof_construction_on_wall_rejected() {
        let settings = LoadSettings::default();
        let mut room = scenario_b();
        let mut wall = EnvelopeComponent::new(ComponentKind::Wall, 100.0, Orientation::E);
        wall.construction = Some("insulated metal deck".to_string());
        room.envelope.push(wall);
        let err = RoomLoadCalculator::new(tables(), &settings)
            .calculate(&room, &design())
            .unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_horizontal_wall_rejected() {
        let mut room = scenario_b();
        room.envelope.push(EnvelopeComponent::new(ComponentKind::Wall, 10.0, Orientation::Horizontal));
        assert!(room.validate().is_err());
    }

    #[test]
    fn test_default_ventilation_rates() {
        let settings = LoadSettings::default();
        let mut room = scenario_b();
        room.ventilation = VentilationSpec::default();
        let result = RoomLoadCalculator::new(tables(), &settings).calculate(&room, &design()).unwrap();
        // 10 people × 5 cfm + 500 sqft × 0.06 cfm
        assert!((result.outdoor_air_cfm - 80.0).abs() < 1e-9);
        // 5000 cuft × 0.5 ACH / 60
        assert!((result.infiltration_cfm - 5000.0 * 0.5 / 60.0).abs() < 1e-9);
        assert_eq!(result.defaults_applied.len(), 3);
    }

    #[test]
    fn test_usage_preset_rates() {
        let settings = LoadSettings::default();
        let data = ReferenceData::builtin().unwrap();
        let preset = data.climate.indoor_preset(crate::reference::UsageCategory::Gym).unwrap();
        let mut room = scenario_b();
        room.internal.activity = None;
        room.ventilation.outdoor_air_cfm = None;
        let result = RoomLoadCalculator::new(tables(), &settings)
            .with_occupancy(OccupancyDefaults::from_preset(preset))
            .calculate(&room, &design())
            .unwrap();
        assert_eq!(result.sensible.people_btuh, 7100.0);
        assert!((result.outdoor_air_cfm - (200.0 + 90.0)).abs() < 1e-9);
    }

    #[test]
    fn test_room_safety_factor_override() {
        let settings = LoadSettings::default();
        let mut room = scenario_b();
        room.safety_factors = Some(SafetyFactors::uniform(1.0));
        let result = RoomLoadCalculator::new(tables(), &settings).calculate(&room, &design()).unwrap();
        assert_eq!(result.adjusted_sensible_btuh, result.sensible_subtotal_btuh);
    }

    #[test]
    fn test_supply_cfm() {
        let settings = LoadSettings::default();
        let result = RoomLoadCalculator::new(tables(), &settings)
            .calculate(&scenario_b(), &design())
            .unwrap();
        assert!((result.supply_cfm - result.adjusted_sensible_btuh / (1.08 * 20.0)).abs() < 1e-9);
    }

    #[test]
    fn test_result_json_roundtrip() {
        let settings = LoadSettings::default();
        let result = RoomLoadCalculator::new(tables(), &settings)
            .calculate(&scenario_b(), &design())
            .unwrap();
        let json = serde_json::to_string(&result).unwrap();
        let back: RoomLoadResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.label, result.label);
        assert_eq!(back.defaults_applied, result.defaults_applied);
    }

    #[test]
    fn test_room_input_from_json() {
        let json = r#"{
            "label": "Lobby",
            "geometry": { "length_ft": 30.0, "width_ft": 20.0, "height_ft": 12.0 },
            "envelope": [
                { "kind": "Glass", "area_sqft": 120.0, "orientation": "SW",
                  "glass": { "glass_type": "DoubleLowE", "shading": "Drapes" } }
            ],
            "internal": { "occupants": 6, "lighting": { "watts": 900.0 } }
        }"#;
        let room: RoomInput = serde_json::from_str(json).unwrap();
        assert_eq!(room.geometry.area_sqft(), 600.0);
        assert_eq!(room.internal.lighting, Some(ElectricLoad::Watts(900.0)));
        assert_eq!(room.internal.ballast_factor, 1.0);
    }

    proptest! {
        #[test]
        fn prop_components_non_negative(
            occupants in 0u32..50,
            area in 0.0f64..2000.0,
            glass_area in 0.0f64..300.0,
            outdoor_db in 60.0f64..115.0,
            orientation_idx in 0usize..8,
        ) {
            let settings = LoadSettings::default();
            let d = DesignConditions {
                outdoor: condition_from_db_rh(outdoor_db, 40.0, STANDARD_PRESSURE_KPA).unwrap(),
                ..design()
            };
            let orientation = Orientation::VERTICAL[orientation_idx];
            let room = RoomInput {
                label: "P".to_string(),
                geometry: RoomGeometry::with_area(area, 9.0),
                envelope: vec![
                    EnvelopeComponent::new(ComponentKind::Glass, glass_area, orientation),
                    EnvelopeComponent::new(ComponentKind::Wall, glass_area * 2.0, orientation),
                ],
                internal: InternalLoadSource { occupants, ..Default::default() },
                ..Default::default()
            };
            let r = RoomLoadCalculator::new(tables(), &settings).calculate(&room, &d).unwrap();
            let s = r.sensible;
            for v in [s.wall_btuh, s.roof_btuh, s.glass_conduction_btuh, s.partition_btuh, s.floor_btuh,
                      s.solar_btuh, s.people_btuh, s.lighting_btuh, s.equipment_btuh, s.motor_btuh,
                      s.ventilation_btuh, s.infiltration_btuh,
                      r.latent.people_btuh, r.latent.ventilation_btuh, r.latent.infiltration_btuh] {
                prop_assert!(v >= 0.0 && v.is_finite());
            }
            prop_assert!(r.sensible_heat_factor >= 0.0 && r.sensible_heat_factor <= 1.0);
            prop_assert_eq!(r.tonnage, r.grand_total_btuh / 12_000.0);
        }
    }
}

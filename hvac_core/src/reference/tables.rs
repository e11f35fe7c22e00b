//! Cooling-load reference tables (CLTD/SHGF/CLF method)
//!
//! - CLTD for sunlit walls by construction weight and orientation, and for
//!   roofs by construction weight, tabulated on design hours
//! - Maximum SHGF by orientation, tabulated on latitude
//! - CLF for glass by orientation, tabulated on design hours
//! - Occupant heat gain by activity, glass and shading properties, named
//!   constructions and per-kind default U-factors
//!
//! Every hour/latitude lookup is linear between columns and clamped at
//! the table edges.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::numeric::interpolate_clamped;

/// Facing of an envelope component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
    /// Skylights and roofs
    #[serde(alias = "H")]
    Horizontal,
}

impl Orientation {
    pub const ALL: [Orientation; 9] = [
        Orientation::N,
        Orientation::NE,
        Orientation::E,
        Orientation::SE,
        Orientation::S,
        Orientation::SW,
        Orientation::W,
        Orientation::NW,
        Orientation::Horizontal,
    ];

    /// Vertical compass orientations (walls)
    pub const VERTICAL: [Orientation; 8] = [
        Orientation::N,
        Orientation::NE,
        Orientation::E,
        Orientation::SE,
        Orientation::S,
        Orientation::SW,
        Orientation::W,
        Orientation::NW,
    ];

    pub fn is_vertical(&self) -> bool {
        !matches!(self, Orientation::Horizontal)
    }
}

/// Envelope component kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Glass,
    Wall,
    Roof,
    Partition,
    Floor,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 5] = [
        ComponentKind::Glass,
        ComponentKind::Wall,
        ComponentKind::Roof,
        ComponentKind::Partition,
        ComponentKind::Floor,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            ComponentKind::Glass => "Glass",
            ComponentKind::Wall => "Wall",
            ComponentKind::Roof => "Roof",
            ComponentKind::Partition => "Partition",
            ComponentKind::Floor => "Floor",
        }
    }
}

/// Thermal mass class; heavier constructions shift and flatten the CLTD curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ConstructionWeight {
    Light,
    #[default]
    Medium,
    Heavy,
}

/// Occupant activity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActivityLevel {
    /// Seated at rest (theater, residence)
    Seated,
    /// Moderately active office work
    #[default]
    Office,
    /// Standing, light work, walking (retail, bank)
    Retail,
    /// Sedentary work plus food (restaurant)
    Restaurant,
    /// Light bench work (factory)
    LightBenchWork,
    /// Moderate dancing
    Dancing,
    /// Heavy machine work, lifting
    HeavyWork,
    /// Athletics (gymnasium)
    Athletics,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 8] = [
        ActivityLevel::Seated,
        ActivityLevel::Office,
        ActivityLevel::Retail,
        ActivityLevel::Restaurant,
        ActivityLevel::LightBenchWork,
        ActivityLevel::Dancing,
        ActivityLevel::HeavyWork,
        ActivityLevel::Athletics,
    ];
}

/// Glazing type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GlassType {
    #[default]
    SingleClear,
    SingleTinted,
    DoubleClear,
    DoubleTinted,
    DoubleLowE,
    Reflective,
}

impl GlassType {
    pub const ALL: [GlassType; 6] = [
        GlassType::SingleClear,
        GlassType::SingleTinted,
        GlassType::DoubleClear,
        GlassType::DoubleTinted,
        GlassType::DoubleLowE,
        GlassType::Reflective,
    ];
}

/// Interior or exterior shading device on glass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ShadingDevice {
    #[default]
    None,
    VenetianBlinds,
    RollerShade,
    Drapes,
    ExternalShade,
}

impl ShadingDevice {
    pub const ALL: [ShadingDevice; 5] = [
        ShadingDevice::None,
        ShadingDevice::VenetianBlinds,
        ShadingDevice::RollerShade,
        ShadingDevice::Drapes,
        ShadingDevice::ExternalShade,
    ];
}

// ============================================================================
// Table rows
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WallCltdRow {
    pub weight: ConstructionWeight,
    pub orientation: Orientation,
    /// °F, one per design hour
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoofCltdRow {
    pub weight: ConstructionWeight,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShgfRow {
    pub orientation: Orientation,
    /// Btu/h·sqft, one per latitude
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClfRow {
    pub orientation: Orientation,
    /// Dimensionless, one per design hour
    pub values: Vec<f64>,
}

/// Heat gain per occupant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityGain {
    pub activity: ActivityLevel,
    pub sensible_btuh: f64,
    pub latent_btuh: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlassProperties {
    pub glass_type: GlassType,
    pub shading_coefficient: f64,
    /// Btu/h·sqft·°F
    pub u_factor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadingProperties {
    pub device: ShadingDevice,
    /// Multiplies the glass shading coefficient
    pub multiplier: f64,
}

/// Named opaque construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Construction {
    pub name: String,
    pub kind: ComponentKind,
    pub u_factor: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<ConstructionWeight>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefaultUFactor {
    pub kind: ComponentKind,
    pub u_factor: f64,
}

// ============================================================================
// LoadTables
// ============================================================================

/// All tables used by the room load calculation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadTables {
    /// Solar time columns for CLTD and CLF rows
    pub design_hours: Vec<f64>,
    /// Latitude columns for SHGF rows (degrees)
    pub latitudes_deg: Vec<f64>,
    pub wall_cltd: Vec<WallCltdRow>,
    pub roof_cltd: Vec<RoofCltdRow>,
    pub shgf: Vec<ShgfRow>,
    pub clf: Vec<ClfRow>,
    pub activities: Vec<ActivityGain>,
    pub glass: Vec<GlassProperties>,
    pub shading: Vec<ShadingProperties>,
    pub constructions: Vec<Construction>,
    pub default_u_factors: Vec<DefaultUFactor>,
}

impl LoadTables {
    /// Wall CLTD (°F, uncorrected) at `hour`
    pub fn wall_cltd(&self, orientation: Orientation, weight: ConstructionWeight, hour: f64) -> CalcResult<f64> {
        let row = self
            .wall_cltd
            .iter()
            .find(|r| r.orientation == orientation && r.weight == weight)
            .ok_or_else(|| CalcError::reference_not_found("tables.wall_cltd", format!("{orientation:?}/{weight:?}")))?;
        Ok(interpolate_clamped(&self.design_hours, &row.values, hour))
    }

    /// Roof CLTD (°F, uncorrected) at `hour`
    pub fn roof_cltd(&self, weight: ConstructionWeight, hour: f64) -> CalcResult<f64> {
        let row = self
            .roof_cltd
            .iter()
            .find(|r| r.weight == weight)
            .ok_or_else(|| CalcError::reference_not_found("tables.roof_cltd", format!("{weight:?}")))?;
        Ok(interpolate_clamped(&self.design_hours, &row.values, hour))
    }

    /// Maximum solar heat gain factor (Btu/h·sqft), interpolated on |latitude|
    pub fn shgf_max(&self, orientation: Orientation, latitude_deg: f64) -> CalcResult<f64> {
        let row = self
            .shgf
            .iter()
            .find(|r| r.orientation == orientation)
            .ok_or_else(|| CalcError::reference_not_found("tables.shgf", format!("{orientation:?}")))?;
        Ok(interpolate_clamped(&self.latitudes_deg, &row.values, latitude_deg.abs()))
    }

    /// Glass cooling load factor at `hour`
    pub fn clf(&self, orientation: Orientation, hour: f64) -> CalcResult<f64> {
        let row = self
            .clf
            .iter()
            .find(|r| r.orientation == orientation)
            .ok_or_else(|| CalcError::reference_not_found("tables.clf", format!("{orientation:?}")))?;
        Ok(interpolate_clamped(&self.design_hours, &row.values, hour))
    }

    pub fn activity(&self, activity: ActivityLevel) -> CalcResult<&ActivityGain> {
        self.activities
            .iter()
            .find(|a| a.activity == activity)
            .ok_or_else(|| CalcError::reference_not_found("tables.activities", format!("{activity:?}")))
    }

    pub fn glass(&self, glass_type: GlassType) -> CalcResult<&GlassProperties> {
        self.glass
            .iter()
            .find(|g| g.glass_type == glass_type)
            .ok_or_else(|| CalcError::reference_not_found("tables.glass", format!("{glass_type:?}")))
    }

    pub fn shading(&self, device: ShadingDevice) -> CalcResult<&ShadingProperties> {
        self.shading
            .iter()
            .find(|s| s.device == device)
            .ok_or_else(|| CalcError::reference_not_found("tables.shading", format!("{device:?}")))
    }

    /// Named construction (case-insensitive)
    pub fn construction(&self, name: &str) -> CalcResult<&Construction> {
        self.constructions
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| CalcError::reference_not_found("tables.constructions", name))
    }

    /// Fallback U-factor for a component kind without construction or U-factor
    pub fn default_u_factor(&self, kind: ComponentKind) -> CalcResult<f64> {
        self.default_u_factors
            .iter()
            .find(|d| d.kind == kind)
            .map(|d| d.u_factor)
            .ok_or_else(|| CalcError::reference_not_found("tables.default_u_factors", kind.display_name()))
    }

    pub(crate) fn validate(&self) -> CalcResult<()> {
        ascending("tables.design_hours", &self.design_hours)?;
        ascending("tables.latitudes_deg", &self.latitudes_deg)?;

        let hours = self.design_hours.len();
        for row in &self.wall_cltd {
            row_length("tables.wall_cltd", &format!("{:?}/{:?}", row.orientation, row.weight), &row.values, hours)?;
        }
        for row in &self.roof_cltd {
            row_length("tables.roof_cltd", &format!("{:?}", row.weight), &row.values, hours)?;
        }
        for row in &self.clf {
            row_length("tables.clf", &format!("{:?}", row.orientation), &row.values, hours)?;
            if row.values.iter().any(|v| !(0.0..=1.0).contains(v)) {
                return Err(CalcError::reference_data(
                    "tables.clf",
                    format!("{:?}: factors must be within 0-1", row.orientation),
                ));
            }
        }
        for row in &self.shgf {
            row_length("tables.shgf", &format!("{:?}", row.orientation), &row.values, self.latitudes_deg.len())?;
        }

        let non_negative = self
            .activities
            .iter()
            .flat_map(|a| [a.sensible_btuh, a.latent_btuh])
            .chain(self.glass.iter().flat_map(|g| [g.shading_coefficient, g.u_factor]))
            .chain(self.shading.iter().map(|s| s.multiplier))
            .chain(self.constructions.iter().map(|c| c.u_factor))
            .chain(self.default_u_factors.iter().map(|d| d.u_factor));
        for value in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(CalcError::reference_data(
                    "tables",
                    format!("gains, coefficients and U-factors must be non-negative (found {value})"),
                ));
            }
        }
        Ok(())
    }
}

fn ascending(source: &str, values: &[f64]) -> CalcResult<()> {
    if values.is_empty() || values.windows(2).any(|w| w[1] <= w[0]) {
        return Err(CalcError::reference_data(source, "columns must be non-empty and strictly ascending"));
    }
    Ok(())
}

fn row_length(source: &str, key: &str, values: &[f64], expected: usize) -> CalcResult<()> {
    if values.len() != expected {
        return Err(CalcError::reference_data(
            source,
            format!("{key}: expected {expected} values, found {}", values.len()),
        ));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(CalcError::reference_data(source, format!("{key}: non-finite value")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceData;

    fn tables() -> &'static LoadTables {
        &ReferenceData::builtin().unwrap().tables
    }

    #[test]
    fn test_every_wall_row_present() {
        for weight in [ConstructionWeight::Light, ConstructionWeight::Medium, ConstructionWeight::Heavy] {
            for orientation in Orientation::VERTICAL {
                assert!(tables().wall_cltd(orientation, weight, 15.0).is_ok());
            }
            assert!(tables().roof_cltd(weight, 15.0).is_ok());
        }
    }

    #[test]
    fn test_cltd_interpolates_between_hours() {
        let at_14 = tables().roof_cltd(ConstructionWeight::Medium, 14.0).unwrap();
        let at_16 = tables().roof_cltd(ConstructionWeight::Medium, 16.0).unwrap();
        let at_15 = tables().roof_cltd(ConstructionWeight::Medium, 15.0).unwrap();
        assert!((at_15 - 0.5 * (at_14 + at_16)).abs() < 1e-9);
    }

    #[test]
    fn test_cltd_clamped_outside_hours() {
        let early = tables().wall_cltd(Orientation::W, ConstructionWeight::Light, 2.0).unwrap();
        let first = tables().wall_cltd(Orientation::W, ConstructionWeight::Light, 8.0).unwrap();
        assert_eq!(early, first);
    }

    #[test]
    fn test_west_wall_peaks_late() {
        let morning = tables().wall_cltd(Orientation::W, ConstructionWeight::Light, 10.0).unwrap();
        let evening = tables().wall_cltd(Orientation::W, ConstructionWeight::Light, 18.0).unwrap();
        assert!(evening > morning);
    }

    #[test]
    fn test_no_horizontal_wall_row() {
        let err = tables()
            .wall_cltd(Orientation::Horizontal, ConstructionWeight::Medium, 15.0)
            .unwrap_err();
        assert_eq!(err.error_code(), "REFERENCE_NOT_FOUND");
    }

    #[test]
    fn test_shgf_latitude_interpolation() {
        let at_32 = tables().shgf_max(Orientation::S, 32.0).unwrap();
        let at_40 = tables().shgf_max(Orientation::S, 40.0).unwrap();
        let at_36 = tables().shgf_max(Orientation::S, 36.0).unwrap();
        assert!((at_36 - 0.5 * (at_32 + at_40)).abs() < 1e-9);
        // Southern hemisphere latitudes use the absolute value
        assert_eq!(tables().shgf_max(Orientation::S, -36.0).unwrap(), at_36);
    }

    #[test]
    fn test_office_activity_gain() {
        let gain = tables().activity(ActivityLevel::Office).unwrap();
        assert_eq!(gain.sensible_btuh, 250.0);
        assert_eq!(gain.latent_btuh, 200.0);
    }

    #[test]
    fn test_every_enum_has_table_entry() {
        for a in ActivityLevel::ALL {
            assert!(tables().activity(a).is_ok());
        }
        for g in GlassType::ALL {
            assert!(tables().glass(g).is_ok());
        }
        for s in ShadingDevice::ALL {
            assert!(tables().shading(s).is_ok());
        }
        for k in ComponentKind::ALL {
            assert!(tables().default_u_factor(k).is_ok());
        }
        for o in Orientation::ALL {
            assert!(tables().clf(o, 15.0).is_ok());
            assert!(tables().shgf_max(o, 30.0).is_ok());
        }
    }

    #[test]
    fn test_construction_lookup() {
        let c = tables().construction("Brick Wall").unwrap();
        assert_eq!(c.kind, ComponentKind::Wall);
        assert_eq!(c.weight, Some(ConstructionWeight::Heavy));
        assert!(tables().construction("straw bale").is_err());
    }

    #[test]
    fn test_ragged_row_rejected() {
        let mut bad = tables().clone();
        bad.clf[0].values.pop();
        let err = bad.validate().unwrap_err();
        assert_eq!(err.error_code(), "REFERENCE_DATA_ERROR");
    }

    #[test]
    fn test_orientation_alias() {
        let o: Orientation = serde_json::from_str("\"H\"").unwrap();
        assert_eq!(o, Orientation::Horizontal);
    }
}

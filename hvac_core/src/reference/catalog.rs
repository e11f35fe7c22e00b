//! Equipment catalog: indoor unit models, VRF outdoor unit models and the
//! accessory price list.
//!
//! Catalog order is significant. Selection breaks capacity ties by catalog
//! position, then by model code.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::units::BTUH_PER_TON;

/// Indoor unit mounting style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndoorMounting {
    WallMounted,
    Cassette,
    Ducted,
    FloorStanding,
}

impl IndoorMounting {
    pub const ALL: [IndoorMounting; 4] = [
        IndoorMounting::WallMounted,
        IndoorMounting::Cassette,
        IndoorMounting::Ducted,
        IndoorMounting::FloorStanding,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            IndoorMounting::WallMounted => "Wall-mounted",
            IndoorMounting::Cassette => "Ceiling cassette",
            IndoorMounting::Ducted => "Concealed ducted",
            IndoorMounting::FloorStanding => "Floor-standing",
        }
    }
}

impl std::fmt::Display for IndoorMounting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Indoor unit (IDU) catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndoorUnitModel {
    pub model: String,
    pub mounting: IndoorMounting,
    pub capacity_btuh: f64,
    pub price: f64,
}

impl IndoorUnitModel {
    pub fn capacity_tons(&self) -> f64 {
        self.capacity_btuh / BTUH_PER_TON
    }
}

/// VRF outdoor unit (ODU) catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutdoorUnitModel {
    pub model: String,
    pub capacity_btuh: f64,
    pub nominal_hp: f64,
    /// Indoor units one module can serve
    pub max_connections: u32,
    /// Longest equivalent refrigerant run
    pub max_piping_ft: f64,
    /// Largest indoor/outdoor elevation difference
    pub max_height_ft: f64,
    pub price: f64,
}

impl OutdoorUnitModel {
    pub fn capacity_tons(&self) -> f64 {
        self.capacity_btuh / BTUH_PER_TON
    }
}

/// Installation accessory category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccessoryCategory {
    RefrigerantPiping,
    Insulation,
    DrainPiping,
    DrainPump,
    BranchBox,
    Cabling,
    MountingBracket,
    Controller,
}

impl AccessoryCategory {
    pub const ALL: [AccessoryCategory; 8] = [
        AccessoryCategory::RefrigerantPiping,
        AccessoryCategory::Insulation,
        AccessoryCategory::DrainPiping,
        AccessoryCategory::DrainPump,
        AccessoryCategory::BranchBox,
        AccessoryCategory::Cabling,
        AccessoryCategory::MountingBracket,
        AccessoryCategory::Controller,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            AccessoryCategory::RefrigerantPiping => "Refrigerant piping",
            AccessoryCategory::Insulation => "Pipe insulation",
            AccessoryCategory::DrainPiping => "Condensate drain piping",
            AccessoryCategory::DrainPump => "Condensate pump",
            AccessoryCategory::BranchBox => "Refnet branch joint",
            AccessoryCategory::Cabling => "Power/communication cable",
            AccessoryCategory::MountingBracket => "Outdoor unit bracket",
            AccessoryCategory::Controller => "Wired remote controller",
        }
    }
}

/// Accessory price-list entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Accessory {
    pub category: AccessoryCategory,
    pub description: String,
    /// Pricing unit, e.g. "ft" or "ea"
    pub unit: String,
    pub unit_price: f64,
}

/// Read-only equipment catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EquipmentCatalog {
    indoor_units: Vec<IndoorUnitModel>,
    outdoor_units: Vec<OutdoorUnitModel>,
    #[serde(default)]
    accessories: Vec<Accessory>,
}

impl EquipmentCatalog {
    pub fn new(
        indoor_units: Vec<IndoorUnitModel>,
        outdoor_units: Vec<OutdoorUnitModel>,
        accessories: Vec<Accessory>,
    ) -> CalcResult<Self> {
        let catalog = EquipmentCatalog {
            indoor_units,
            outdoor_units,
            accessories,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn indoor_units(&self) -> &[IndoorUnitModel] {
        &self.indoor_units
    }

    pub fn outdoor_units(&self) -> &[OutdoorUnitModel] {
        &self.outdoor_units
    }

    pub fn accessories(&self) -> &[Accessory] {
        &self.accessories
    }

    /// Indoor models of one mounting style, in catalog order
    pub fn indoor_by_mounting(&self, mounting: IndoorMounting) -> impl Iterator<Item = &IndoorUnitModel> {
        self.indoor_units.iter().filter(move |m| m.mounting == mounting)
    }

    pub fn indoor_model(&self, code: &str) -> CalcResult<&IndoorUnitModel> {
        self.indoor_units
            .iter()
            .find(|m| m.model == code)
            .ok_or_else(|| CalcError::reference_not_found("catalog.indoor_units", code))
    }

    pub fn outdoor_model(&self, code: &str) -> CalcResult<&OutdoorUnitModel> {
        self.outdoor_units
            .iter()
            .find(|m| m.model == code)
            .ok_or_else(|| CalcError::reference_not_found("catalog.outdoor_units", code))
    }

    /// Price-list entry for an accessory category
    pub fn accessory(&self, category: AccessoryCategory) -> CalcResult<&Accessory> {
        self.accessories
            .iter()
            .find(|a| a.category == category)
            .ok_or_else(|| CalcError::reference_not_found("catalog.accessories", category.display_name()))
    }

    pub(crate) fn validate(&self) -> CalcResult<()> {
        let mut codes = HashSet::new();
        for unit in &self.indoor_units {
            if !codes.insert(unit.model.as_str()) {
                return Err(CalcError::reference_data(
                    "catalog.indoor_units",
                    format!("duplicate model code {}", unit.model),
                ));
            }
            positive("catalog.indoor_units", &unit.model, unit.capacity_btuh)?;
            non_negative("catalog.indoor_units", &unit.model, unit.price)?;
        }

        codes.clear();
        for unit in &self.outdoor_units {
            if !codes.insert(unit.model.as_str()) {
                return Err(CalcError::reference_data(
                    "catalog.outdoor_units",
                    format!("duplicate model code {}", unit.model),
                ));
            }
            positive("catalog.outdoor_units", &unit.model, unit.capacity_btuh)?;
            positive("catalog.outdoor_units", &unit.model, unit.nominal_hp)?;
            non_negative("catalog.outdoor_units", &unit.model, unit.price)?;
            non_negative("catalog.outdoor_units", &unit.model, unit.max_piping_ft)?;
            non_negative("catalog.outdoor_units", &unit.model, unit.max_height_ft)?;
            if unit.max_connections == 0 {
                return Err(CalcError::reference_data(
                    "catalog.outdoor_units",
                    format!("{}: max_connections must be at least 1", unit.model),
                ));
            }
        }

        for accessory in &self.accessories {
            non_negative("catalog.accessories", accessory.category.display_name(), accessory.unit_price)?;
        }
        Ok(())
    }
}

fn positive(source: &str, key: &str, value: f64) -> CalcResult<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(CalcError::reference_data(source, format!("{key}: value {value} must be positive")));
    }
    Ok(())
}

fn non_negative(source: &str, key: &str, value: f64) -> CalcResult<()> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(CalcError::reference_data(source, format!("{key}: value {value} cannot be negative")));
    }
    Ok(())
}

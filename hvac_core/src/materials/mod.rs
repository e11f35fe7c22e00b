//! # Materials Estimate
//!
//! Installation material take-off derived from equipment counts, priced
//! from the catalog's accessory list.
//!
//! | Item                | Quantity                                  |
//! |---------------------|-------------------------------------------|
//! | Refrigerant piping  | piping run × indoor units (ft)            |
//! | Insulation          | equal to refrigerant piping (ft)          |
//! | Drain piping        | drain run × indoor units (ft)             |
//! | Drain pumps         | ceil(indoor / pump fan-out)               |
//! | Branch joints       | ceil(indoor / branch fan-out)             |
//! | Cabling             | cable run × (indoor + outdoor units) (ft) |
//! | Mounting brackets   | one per outdoor unit                      |
//! | Controllers         | one per indoor unit                       |
//!
//! Lines come out in [`AccessoryCategory::ALL`] order.

use serde::{Deserialize, Serialize};

use crate::errors::CalcResult;
use crate::reference::{AccessoryCategory, EquipmentCatalog};
use crate::settings::MaterialSettings;

/// One priced line of the take-off
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialLine {
    pub category: AccessoryCategory,
    pub description: String,
    pub quantity: f64,
    pub unit: String,
    pub unit_price: f64,
    pub subtotal: f64,
}

/// Priced take-off with tax
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialsEstimate {
    pub lines: Vec<MaterialLine>,
    pub subtotal: f64,
    pub tax_rate: f64,
    pub tax: f64,
    pub total: f64,
}

impl MaterialsEstimate {
    pub fn line(&self, category: AccessoryCategory) -> Option<&MaterialLine> {
        self.lines.iter().find(|l| l.category == category)
    }
}

/// Equipment plus materials, before and after tax
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostRollup {
    pub indoor_equipment: f64,
    pub outdoor_equipment: f64,
    pub equipment_subtotal: f64,
    /// Materials before tax
    pub materials: f64,
    pub subtotal: f64,
    pub tax_rate: f64,
    pub tax: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct MaterialsEstimator<'a> {
    catalog: &'a EquipmentCatalog,
    settings: &'a MaterialSettings,
}

impl<'a> MaterialsEstimator<'a> {
    pub fn new(catalog: &'a EquipmentCatalog, settings: &'a MaterialSettings) -> Self {
        MaterialsEstimator { catalog, settings }
    }

    /// Quantity of one category for the given unit counts
    pub fn quantity(&self, category: AccessoryCategory, indoor_units: u32, outdoor_units: u32) -> f64 {
        let s = self.settings;
        let indoor = f64::from(indoor_units);
        match category {
            AccessoryCategory::RefrigerantPiping | AccessoryCategory::Insulation => s.piping_run_ft * indoor,
            AccessoryCategory::DrainPiping => s.drain_run_ft * indoor,
            AccessoryCategory::DrainPump => f64::from(indoor_units.div_ceil(s.drain_pump_fan_out.max(1))),
            AccessoryCategory::BranchBox => f64::from(indoor_units.div_ceil(s.branch_fan_out.max(1))),
            AccessoryCategory::Cabling => s.cable_run_ft * f64::from(indoor_units + outdoor_units),
            AccessoryCategory::MountingBracket => f64::from(outdoor_units),
            AccessoryCategory::Controller => indoor,
        }
    }

    /// Price every category for the given unit counts.
    ///
    /// # Errors
    ///
    /// `ReferenceNotFound` when the catalog has no price for a category.
    pub fn estimate(&self, indoor_units: u32, outdoor_units: u32) -> CalcResult<MaterialsEstimate> {
        let mut lines = Vec::with_capacity(AccessoryCategory::ALL.len());
        for category in AccessoryCategory::ALL {
            let accessory = self.catalog.accessory(category)?;
            let quantity = self.quantity(category, indoor_units, outdoor_units);
            lines.push(MaterialLine {
                category,
                description: accessory.description.clone(),
                quantity,
                unit: accessory.unit.clone(),
                unit_price: accessory.unit_price,
                subtotal: quantity * accessory.unit_price,
            });
        }

        let subtotal: f64 = lines.iter().map(|l| l.subtotal).sum();
        let tax = subtotal * self.settings.tax_rate;
        tracing::debug!(indoor_units, outdoor_units, subtotal, "materials estimated");
        Ok(MaterialsEstimate {
            lines,
            subtotal,
            tax_rate: self.settings.tax_rate,
            tax,
            total: subtotal + tax,
        })
    }

    /// Combine equipment prices with a materials estimate; tax applies to
    /// the whole subtotal.
    pub fn cost_rollup(&self, indoor_equipment: f64, outdoor_equipment: f64, materials: &MaterialsEstimate) -> CostRollup {
        let equipment_subtotal = indoor_equipment + outdoor_equipment;
        let subtotal = equipment_subtotal + materials.subtotal;
        let tax = subtotal * self.settings.tax_rate;
        CostRollup {
            indoor_equipment,
            outdoor_equipment,
            equipment_subtotal,
            materials: materials.subtotal,
            subtotal,
            tax_rate: self.settings.tax_rate,
            tax,
            total: subtotal + tax,
        }
    }
}

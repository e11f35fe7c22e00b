//! # Equipment Selection
//!
//! Turns a building aggregate into indoor units, VRF outdoor modules, a
//! materials estimate and a cost rollup.
//!
//! The stages are typed so they can only run in order:
//!
//! ```text
//! EquipmentSelector::select_indoor(&building)  -> IndoorSelection
//! IndoorSelection::select_outdoor(strategy, run) -> EquipmentSelection
//! EquipmentSelection::estimate_materials(..)   -> SelectionResult
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! let selector = EquipmentSelector::new(&data.catalog, &settings.selection);
//! let result = selector
//!     .select_indoor(&building, &preferences)?
//!     .select_outdoor(&GreedyLargestFirst, 50.0)?
//!     .estimate_materials(&MaterialsEstimator::new(&data.catalog, &settings.materials))?;
//! ```

pub mod indoor;
pub mod outdoor;
pub mod strategies;

use serde::{Deserialize, Serialize};

use crate::calculations::BuildingAggregate;
use crate::errors::{CalcError, CalcResult};
use crate::materials::{CostRollup, MaterialsEstimate, MaterialsEstimator};
use crate::reference::{EquipmentCatalog, IndoorMounting};
use crate::settings::{SelectionSettings, TierParameters};
use crate::units::{ratio_or_zero, BTUH_PER_TON};

pub use indoor::{select_indoor_unit, IndoorAssignment};
pub use outdoor::{
    outdoor_candidates, select_outdoor_units, GreedyLargestFirst, OutdoorAssignment, OutdoorRequirement,
    OutdoorSelectionStrategy,
};
pub use strategies::{MinimizeCost, MinimizeOversizing};

/// Equipment tier: outdoor hp-per-ton ratio, module size ceiling and
/// preferred indoor mounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SelectionTier {
    Economy,
    #[default]
    Balanced,
    Premium,
}

impl SelectionTier {
    pub const ALL: [SelectionTier; 3] = [SelectionTier::Economy, SelectionTier::Balanced, SelectionTier::Premium];

    pub fn display_name(&self) -> &'static str {
        match self {
            SelectionTier::Economy => "Economy",
            SelectionTier::Balanced => "Balanced",
            SelectionTier::Premium => "Premium",
        }
    }
}

impl std::fmt::Display for SelectionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Built-in outdoor strategies by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    GreedyLargestFirst,
    MinimizeCost,
    MinimizeOversizing,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::GreedyLargestFirst,
        StrategyKind::MinimizeCost,
        StrategyKind::MinimizeOversizing,
    ];

    pub fn strategy(&self) -> &'static dyn OutdoorSelectionStrategy {
        match self {
            StrategyKind::GreedyLargestFirst => &GreedyLargestFirst,
            StrategyKind::MinimizeCost => &MinimizeCost,
            StrategyKind::MinimizeOversizing => &MinimizeOversizing,
        }
    }
}

/// Caller choices for the selection stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionPreferences {
    pub tier: SelectionTier,
    pub strategy: StrategyKind,
    /// Longest refrigerant run; the materials setting when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub piping_run_ft: Option<f64>,
    /// Elevation between outdoor modules and the furthest indoor unit
    pub height_difference_ft: f64,
}

impl Default for SelectionPreferences {
    fn default() -> Self {
        SelectionPreferences {
            tier: SelectionTier::Balanced,
            strategy: StrategyKind::GreedyLargestFirst,
            piping_run_ft: None,
            height_difference_ft: 0.0,
        }
    }
}

impl SelectionPreferences {
    pub fn validate(&self) -> CalcResult<()> {
        if let Some(run) = self.piping_run_ft {
            if !(run.is_finite() && run >= 0.0) {
                return Err(CalcError::invalid_input(
                    "selection.piping_run_ft",
                    run.to_string(),
                    "piping run cannot be negative",
                ));
            }
        }
        if !(self.height_difference_ft.is_finite() && self.height_difference_ft >= 0.0) {
            return Err(CalcError::invalid_input(
                "selection.height_difference_ft",
                self.height_difference_ft.to_string(),
                "height difference cannot be negative",
            ));
        }
        Ok(())
    }
}

/// Non-fatal selection findings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionWarning {
    MountingFallback {
        floor: String,
        room: String,
        preferred: IndoorMounting,
        selected: IndoorMounting,
    },
    ConnectionRatioExceeded { ratio: f64, max_ratio: f64 },
}

/// Runs selection against one catalog and one settings block.
#[derive(Debug, Clone, Copy)]
pub struct EquipmentSelector<'a> {
    catalog: &'a EquipmentCatalog,
    settings: &'a SelectionSettings,
}

impl<'a> EquipmentSelector<'a> {
    pub fn new(catalog: &'a EquipmentCatalog, settings: &'a SelectionSettings) -> Self {
        EquipmentSelector { catalog, settings }
    }

    /// First stage: one indoor unit per room.
    ///
    /// The preferred mounting is the room's override when present, else the
    /// tier's.
    pub fn select_indoor(
        &self,
        building: &BuildingAggregate,
        preferences: &SelectionPreferences,
    ) -> CalcResult<IndoorSelection<'a>> {
        preferences.validate()?;
        let tier = *self.settings.tiers.get(preferences.tier);
        let mut assignments = Vec::with_capacity(building.room_count);
        let mut warnings = Vec::new();

        for floor in &building.floors {
            for room in &floor.rooms {
                let preferred = room.indoor_mounting.unwrap_or(tier.preferred_mounting);
                let assignment =
                    select_indoor_unit(self.catalog, &floor.label, &room.label, room.grand_total_btuh, preferred)?;
                if assignment.fallback {
                    warnings.push(SelectionWarning::MountingFallback {
                        floor: floor.label.clone(),
                        room: room.label.clone(),
                        preferred,
                        selected: assignment.mounting,
                    });
                }
                assignments.push(assignment);
            }
        }
        tracing::debug!(tier = %preferences.tier, units = assignments.len(), "indoor units selected");

        Ok(IndoorSelection {
            catalog: self.catalog,
            settings: self.settings,
            preferences: preferences.clone(),
            tier,
            required_outdoor_btuh: building.adjusted_total_btuh,
            indoor: assignments,
            warnings,
        })
    }
}

/// Indoor stage output; the only way to reach outdoor selection.
#[derive(Debug, Clone)]
pub struct IndoorSelection<'a> {
    catalog: &'a EquipmentCatalog,
    settings: &'a SelectionSettings,
    preferences: SelectionPreferences,
    tier: TierParameters,
    required_outdoor_btuh: f64,
    indoor: Vec<IndoorAssignment>,
    warnings: Vec<SelectionWarning>,
}

impl<'a> IndoorSelection<'a> {
    pub fn assignments(&self) -> &[IndoorAssignment] {
        &self.indoor
    }

    /// Second stage: outdoor modules for the diversified building load.
    ///
    /// `piping_run_ft` is the run checked against module limits; callers
    /// pass the preference or the materials default.
    pub fn select_outdoor(
        self,
        strategy: &dyn OutdoorSelectionStrategy,
        piping_run_ft: f64,
    ) -> CalcResult<EquipmentSelection> {
        let requirement = OutdoorRequirement {
            required_btuh: self.required_outdoor_btuh,
            required_hp: self.required_outdoor_btuh / BTUH_PER_TON * self.tier.hp_per_ton,
            indoor_count: self.indoor.len(),
            max_units: self.settings.max_outdoor_units,
        };
        let candidates = outdoor_candidates(
            self.catalog,
            &self.tier,
            requirement.indoor_count,
            piping_run_ft,
            self.preferences.height_difference_ft,
        );
        let outdoor = select_outdoor_units(strategy, &requirement, &candidates)?;

        let mut warnings = self.warnings;
        let indoor_capacity: f64 = self.indoor.iter().map(|a| a.capacity_btuh).sum();
        let outdoor_capacity: f64 = outdoor.iter().map(|a| a.capacity_btuh()).sum();
        let ratio = ratio_or_zero(indoor_capacity, outdoor_capacity);
        if ratio > self.settings.max_connection_ratio {
            tracing::debug!(ratio, max = self.settings.max_connection_ratio, "connection ratio exceeded");
            warnings.push(SelectionWarning::ConnectionRatioExceeded {
                ratio,
                max_ratio: self.settings.max_connection_ratio,
            });
        }

        Ok(EquipmentSelection {
            tier: self.preferences.tier,
            strategy: strategy.name().to_string(),
            requirement,
            indoor: self.indoor,
            outdoor,
            connection_ratio: ratio,
            warnings,
        })
    }
}

/// Indoor and outdoor equipment, awaiting the materials estimate.
#[derive(Debug, Clone)]
pub struct EquipmentSelection {
    tier: SelectionTier,
    strategy: String,
    requirement: OutdoorRequirement,
    indoor: Vec<IndoorAssignment>,
    outdoor: Vec<OutdoorAssignment>,
    connection_ratio: f64,
    warnings: Vec<SelectionWarning>,
}

impl EquipmentSelection {
    pub fn outdoor(&self) -> &[OutdoorAssignment] {
        &self.outdoor
    }

    /// Final stage: materials and cost rollup.
    pub fn estimate_materials(self, estimator: &MaterialsEstimator<'_>) -> CalcResult<SelectionResult> {
        let indoor_units = self.indoor.len() as u32;
        let outdoor_units: u32 = self.outdoor.iter().map(|a| a.quantity).sum();
        let materials = estimator.estimate(indoor_units, outdoor_units)?;
        let indoor_equipment: f64 = self.indoor.iter().map(|a| a.price).sum();
        let outdoor_equipment: f64 = self.outdoor.iter().map(|a| a.price()).sum();
        let cost = estimator.cost_rollup(indoor_equipment, outdoor_equipment, &materials);

        Ok(SelectionResult {
            tier: self.tier,
            strategy: self.strategy,
            required_indoor_btuh: self.indoor.iter().map(|a| a.required_btuh).sum(),
            provided_indoor_btuh: self.indoor.iter().map(|a| a.capacity_btuh).sum(),
            required_outdoor_btuh: self.requirement.required_btuh,
            required_outdoor_hp: self.requirement.required_hp,
            provided_outdoor_btuh: self.outdoor.iter().map(|a| a.capacity_btuh()).sum(),
            provided_outdoor_hp: self.outdoor.iter().map(|a| a.hp()).sum(),
            indoor_unit_count: indoor_units,
            outdoor_unit_count: outdoor_units,
            total_connections: self.outdoor.iter().map(|a| a.connections()).sum(),
            connection_ratio: self.connection_ratio,
            indoor: self.indoor,
            outdoor: self.outdoor,
            warnings: self.warnings,
            materials,
            cost,
        })
    }
}

/// Complete equipment selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub tier: SelectionTier,
    pub strategy: String,
    pub indoor: Vec<IndoorAssignment>,
    pub outdoor: Vec<OutdoorAssignment>,
    /// Sum of room grand totals
    pub required_indoor_btuh: f64,
    pub provided_indoor_btuh: f64,
    /// Diversified building total
    pub required_outdoor_btuh: f64,
    pub required_outdoor_hp: f64,
    pub provided_outdoor_btuh: f64,
    pub provided_outdoor_hp: f64,
    pub indoor_unit_count: u32,
    pub outdoor_unit_count: u32,
    pub total_connections: u32,
    /// Indoor capacity / outdoor capacity
    pub connection_ratio: f64,
    pub warnings: Vec<SelectionWarning>,
    pub materials: MaterialsEstimate,
    pub cost: CostRollup,
}

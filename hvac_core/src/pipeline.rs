//! # Engine Pipeline
//!
//! [`Engine`] composes the stages for one project:
//!
//! ```text
//! design states -> room loads -> floor/building aggregates
//!               -> indoor units -> outdoor units -> materials -> ProjectReport
//! ```
//!
//! [`ReportSink`] is the persistence seam. The engine never calls it; front
//! ends hand it the finished report.
//!
//! With the `parallel` feature, rooms on a floor are calculated on the rayon
//! pool. Results keep input order either way.

use crate::calculations::{
    AggregationEngine, DesignConditions, FloorAggregate, OccupancyDefaults, PsychrometricEngine, PsychrometricInput,
    RoomLoadCalculator, RoomLoadResult,
};
use crate::errors::{CalcResult, ConvergenceWarning};
use crate::materials::MaterialsEstimator;
use crate::project::{BuildingInput, ClimateSelection, FloorInput, IndoorDesign, Project, ProjectReport};
use crate::reference::ReferenceData;
use crate::selection::EquipmentSelector;
use crate::settings::EngineSettings;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Reference data plus settings; computes reports.
#[derive(Debug, Clone)]
pub struct Engine<'r> {
    reference: &'r ReferenceData,
    settings: EngineSettings,
}

impl Engine<'static> {
    /// Engine over the built-in reference data and default settings
    pub fn builtin() -> CalcResult<Self> {
        Engine::new(ReferenceData::builtin()?, EngineSettings::default())
    }
}

impl<'r> Engine<'r> {
    pub fn new(reference: &'r ReferenceData, settings: EngineSettings) -> CalcResult<Self> {
        settings.validate()?;
        Ok(Engine { reference, settings })
    }

    pub fn reference(&self) -> &ReferenceData {
        self.reference
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Resolve outdoor and indoor design states for a building.
    pub fn design_conditions(&self, building: &BuildingInput) -> CalcResult<(DesignConditions, Vec<ConvergenceWarning>)> {
        let mut warnings = Vec::new();
        let (outdoor, latitude_deg, daily_range_f) = match &building.climate {
            ClimateSelection::Preset { city, season } => {
                let design = self.reference.climate.design_condition(city, *season)?;
                warnings.extend(design.warning);
                (design.condition, design.latitude_deg, design.daily_range_f)
            }
            ClimateSelection::Explicit {
                condition,
                latitude_deg,
                daily_range_f,
            } => {
                let resolved = PsychrometricEngine::new().resolve(condition)?;
                warnings.extend(resolved.warning);
                (resolved.condition, *latitude_deg, *daily_range_f)
            }
        };

        let indoor = match building.indoor {
            IndoorDesign::Preset => self.reference.climate.indoor_condition(building.usage, outdoor.pressure_kpa)?,
            IndoorDesign::Explicit {
                dry_bulb_f,
                relative_humidity_pct,
            } => {
                let input =
                    PsychrometricInput::from_db_rh(dry_bulb_f, relative_humidity_pct).with_pressure(outdoor.pressure_kpa);
                PsychrometricEngine::new().resolve(&input)?.condition
            }
        };

        let design = DesignConditions {
            outdoor,
            indoor,
            latitude_deg,
            daily_range_f,
            design_hour: building.design_hour.unwrap_or(self.settings.loads.design_hour),
        };
        design.validate()?;
        tracing::debug!(
            outdoor_db = outdoor.dry_bulb_f,
            indoor_db = indoor.dry_bulb_f,
            hour = design.design_hour,
            "design conditions resolved"
        );
        Ok((design, warnings))
    }

    /// Run every stage for one project.
    ///
    /// # Errors
    ///
    /// Input errors fail fast before any room is calculated. Reference and
    /// sizing errors come from the stage that hit them.
    pub fn compute(&self, project: &Project) -> CalcResult<ProjectReport> {
        project.validate()?;
        let building_input = &project.building;
        let (design, warnings) = self.design_conditions(building_input)?;

        let occupancy = match self.reference.climate.indoor_preset(building_input.usage) {
            Ok(preset) => OccupancyDefaults::from_preset(preset),
            Err(_) => {
                tracing::debug!(
                    usage = building_input.usage.display_name(),
                    "no indoor preset for usage, using settings occupancy rates"
                );
                OccupancyDefaults::from_settings(&self.settings.loads)
            }
        };
        let calculator =
            RoomLoadCalculator::new(&self.reference.tables, &self.settings.loads).with_occupancy(occupancy);
        let aggregation = AggregationEngine::new(&self.reference.diversity, building_input.usage);

        let mut floors: Vec<FloorAggregate> = Vec::with_capacity(building_input.floors.len());
        for floor in &building_input.floors {
            let rooms = calculate_floor(&calculator, floor, &design)?;
            floors.push(aggregation.floor(floor.label.clone(), rooms));
        }
        let building = aggregation.building(floors);

        let preferences = &project.selection;
        let piping_run_ft = preferences.piping_run_ft.unwrap_or(self.settings.materials.piping_run_ft);
        let selection = EquipmentSelector::new(&self.reference.catalog, &self.settings.selection)
            .select_indoor(&building, preferences)?
            .select_outdoor(preferences.strategy.strategy(), piping_run_ft)?
            .estimate_materials(&MaterialsEstimator::new(&self.reference.catalog, &self.settings.materials))?;

        tracing::debug!(
            job = %project.meta.job_id,
            rooms = building.room_count,
            tons = building.adjusted_tonnage,
            total = selection.cost.total,
            "project computed"
        );
        Ok(ProjectReport {
            project_id: project.meta.id,
            job_id: project.meta.job_id.clone(),
            schema_version: project.meta.version.clone(),
            reference_version: self.reference.version.clone(),
            project_modified: project.meta.modified,
            usage: building_input.usage,
            design,
            warnings,
            building,
            selection,
        })
    }
}

#[cfg(not(feature = "parallel"))]
fn calculate_floor(
    calculator: &RoomLoadCalculator<'_>,
    floor: &FloorInput,
    design: &DesignConditions,
) -> CalcResult<Vec<RoomLoadResult>> {
    floor.rooms.iter().map(|room| calculator.calculate(room, design)).collect()
}

#[cfg(feature = "parallel")]
fn calculate_floor(
    calculator: &RoomLoadCalculator<'_>,
    floor: &FloorInput,
    design: &DesignConditions,
) -> CalcResult<Vec<RoomLoadResult>> {
    floor.rooms.par_iter().map(|room| calculator.calculate(room, design)).collect()
}

/// Persistence port for finished reports.
pub trait ReportSink {
    type Error;

    fn store(&mut self, report: &ProjectReport) -> Result<(), Self::Error>;
}

/// Keeps reports in memory.
impl ReportSink for Vec<ProjectReport> {
    type Error = std::convert::Infallible;

    fn store(&mut self, report: &ProjectReport) -> Result<(), Self::Error> {
        self.push(report.clone());
        Ok(())
    }
}

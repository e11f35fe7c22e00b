//! # Load Calculations
//!
//! Each calculation follows the pattern:
//!
//! - `*Input` - input parameters (JSON-serializable)
//! - `*Result` / aggregate - results (JSON-serializable)
//! - a pure function or calculator method returning `CalcResult<...>`
//!
//! ## Available Calculations
//!
//! - [`psychrometrics`] - moist-air state from two known properties
//! - [`room_load`] - CLTD/SHGF/CLF room heat gain
//! - [`coil`] - effective loads, ADP and dehumidified airflow
//! - [`aggregation`] - floor and building totals with diversity

pub mod aggregation;
pub mod coil;
pub mod psychrometrics;
pub mod room_load;

pub use aggregation::{AggregationEngine, BuildingAggregate, FloorAggregate};
pub use coil::{CoilAnalysis, CoilInput};
pub use psychrometrics::{ClimateCondition, PsychrometricEngine, PsychrometricInput, PsychrometricResult};
pub use room_load::{
    DesignConditions, ElectricLoad, EnvelopeComponent, GlassSpec, InternalLoadSource, OccupancyDefaults,
    RoomGeometry, RoomInput, RoomLoadCalculator, RoomLoadResult, VentilationSpec,
};

//! # hvac_core - Air-Conditioning Load and Equipment Selection Engine
//!
//! `hvac_core` turns a building description into cooling loads, VRF
//! equipment and a priced bill of materials. All inputs and outputs are
//! JSON-serializable so front ends can exchange plain records with it.
//!
//! ## Design Philosophy
//!
//! - **Stateless**: pure functions over immutable inputs; no I/O
//! - **JSON-First**: all records implement Serialize/Deserialize
//! - **Rich Errors**: structured error types, plus advisory warnings in results
//! - **Data-Driven**: climate, load tables, diversity and catalog come from TOML
//!
//! ## Quick Start
//!
//! ```rust
//! use hvac_core::calculations::{RoomGeometry, RoomInput};
//! use hvac_core::pipeline::Engine;
//! use hvac_core::project::Project;
//!
//! let mut project = Project::new("Jane Designer", "26-001", "Acme Corp");
//! project.add_room("Level 1", RoomInput {
//!     label: "Open office".to_string(),
//!     geometry: RoomGeometry::rectangular(30.0, 20.0, 9.0),
//!     ..RoomInput::default()
//! });
//!
//! let report = Engine::builtin().unwrap().compute(&project).unwrap();
//! assert!(report.selection.provided_outdoor_btuh >= report.building.adjusted_total_btuh);
//! ```
//!
//! ## Modules
//!
//! - [`calculations`] - psychrometrics, room loads, coil analysis, aggregation
//! - [`selection`] - indoor/outdoor equipment selection strategies
//! - [`materials`] - accessory take-off and cost rollup
//! - [`reference`] - climate, load tables, diversity and equipment catalog
//! - [`settings`] - engine settings with documented defaults
//! - [`pipeline`] - the `Engine` that runs every stage for a project
//! - [`project`] - project container and report
//! - [`numeric`] - root finding and interpolation
//! - [`units`] - type-safe unit wrappers
//! - [`errors`] - structured error and advisory types

pub mod calculations;
pub mod errors;
pub mod materials;
pub mod numeric;
pub mod pipeline;
pub mod project;
pub mod reference;
pub mod selection;
pub mod settings;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use errors::{CalcError, CalcResult};
pub use pipeline::{Engine, ReportSink};
pub use project::{Project, ProjectMetadata, ProjectReport};
pub use reference::ReferenceData;
pub use settings::EngineSettings;

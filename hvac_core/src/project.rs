//! # Project Data Structures
//!
//! The `Project` struct is the root container a front end hands to the
//! engine. It serializes to human-readable JSON.
//!
//! ## Structure
//!
//! ```text
//! Project
//! ├── meta: ProjectMetadata (schema version, designer, job info, timestamps)
//! ├── building: BuildingInput (usage, climate, indoor design, floors of rooms)
//! └── selection: SelectionPreferences (tier, strategy, piping run)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use hvac_core::project::Project;
//!
//! let project = Project::new("Jane Designer", "26-042", "ACME Corp");
//! let json = serde_json::to_string_pretty(&project).unwrap();
//! assert!(json.contains("26-042"));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calculations::{BuildingAggregate, DesignConditions, PsychrometricInput, RoomInput};
use crate::errors::{CalcError, CalcResult, ConvergenceWarning};
use crate::reference::{Season, UsageCategory};
use crate::selection::{SelectionPreferences, SelectionResult};

/// Current schema version for project files
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Root project container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub meta: ProjectMetadata,
    pub building: BuildingInput,
    #[serde(default)]
    pub selection: SelectionPreferences,
}

impl Project {
    /// Create an empty office project in the first built-in city.
    pub fn new(designer: impl Into<String>, job_id: impl Into<String>, client: impl Into<String>) -> Self {
        let now = Utc::now();
        Project {
            meta: ProjectMetadata {
                id: Uuid::new_v4(),
                version: SCHEMA_VERSION.to_string(),
                designer: designer.into(),
                job_id: job_id.into(),
                client: client.into(),
                created: now,
                modified: now,
            },
            building: BuildingInput::default(),
            selection: SelectionPreferences::default(),
        }
    }

    /// Append a room to the floor with this label, creating the floor if
    /// needed.
    pub fn add_room(&mut self, floor: &str, room: RoomInput) {
        match self.building.floors.iter_mut().find(|f| f.label == floor) {
            Some(existing) => existing.rooms.push(room),
            None => self.building.floors.push(FloorInput {
                label: floor.to_string(),
                rooms: vec![room],
            }),
        }
        self.touch();
    }

    /// Update the modified timestamp.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }

    pub fn room_count(&self) -> usize {
        self.building.floors.iter().map(|f| f.rooms.len()).sum()
    }

    /// Structural checks that do not need reference data.
    pub fn validate(&self) -> CalcResult<()> {
        if self.room_count() == 0 {
            return Err(CalcError::missing_field("building.floors.rooms"));
        }
        for floor in &self.building.floors {
            for room in &floor.rooms {
                room.validate().map_err(|e| in_room(e, &floor.label, &room.label))?;
            }
        }
        if let Some(hour) = self.building.design_hour {
            if !(0.0..=24.0).contains(&hour) {
                return Err(CalcError::invalid_input(
                    "building.design_hour",
                    hour.to_string(),
                    "Design hour must be between 0 and 24",
                ));
            }
        }
        self.selection.validate()
    }
}

impl Default for Project {
    fn default() -> Self {
        Project::new("", "", "")
    }
}

/// Prefix an input error's field with the room it came from.
fn in_room(error: CalcError, floor: &str, room: &str) -> CalcError {
    match error {
        CalcError::InvalidInput { field, value, reason } => CalcError::InvalidInput {
            field: format!("{floor}/{room}: {field}"),
            value,
            reason,
        },
        CalcError::MissingField { field } => CalcError::MissingField {
            field: format!("{floor}/{room}: {field}"),
        },
        other => other,
    }
}

/// Project metadata stored in the file header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub id: Uuid,
    /// Schema version (for migration compatibility)
    pub version: String,
    pub designer: String,
    /// Job/project number
    pub job_id: String,
    pub client: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Building description: usage, climate and rooms grouped by floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingInput {
    #[serde(default)]
    pub name: String,
    pub usage: UsageCategory,
    pub climate: ClimateSelection,
    #[serde(default)]
    pub indoor: IndoorDesign,
    /// Solar hour for the tables; the configured default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_hour: Option<f64>,
    #[serde(default)]
    pub floors: Vec<FloorInput>,
}

impl Default for BuildingInput {
    fn default() -> Self {
        BuildingInput {
            name: String::new(),
            usage: UsageCategory::Office,
            climate: ClimateSelection::Preset {
                city: "Houston".to_string(),
                season: Season::Summer,
            },
            indoor: IndoorDesign::Preset,
            design_hour: None,
            floors: Vec::new(),
        }
    }
}

/// Where the outdoor design state comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum ClimateSelection {
    /// City preset from the climate table
    Preset { city: String, season: Season },
    /// Measured or designer-supplied state
    Explicit {
        condition: PsychrometricInput,
        latitude_deg: f64,
        daily_range_f: f64,
    },
}

/// Where the indoor design state comes from
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum IndoorDesign {
    /// The usage category's standard indoor condition
    #[default]
    Preset,
    Explicit { dry_bulb_f: f64, relative_humidity_pct: f64 },
}

/// Rooms on one floor, in input order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FloorInput {
    pub label: String,
    #[serde(default)]
    pub rooms: Vec<RoomInput>,
}

/// Everything one engine run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectReport {
    pub project_id: Uuid,
    pub job_id: String,
    pub schema_version: String,
    /// Reference data version used
    pub reference_version: String,
    /// Echo of the project's modified timestamp
    pub project_modified: DateTime<Utc>,
    pub usage: UsageCategory,
    pub design: DesignConditions,
    /// Psychrometric advisories from resolving the design states
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ConvergenceWarning>,
    pub building: BuildingAggregate,
    pub selection: SelectionResult,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::RoomGeometry;

    fn room(label: &str) -> RoomInput {
        RoomInput {
            label: label.to_string(),
            geometry: RoomGeometry::rectangular(20.0, 15.0, 9.0),
            ..RoomInput::default()
        }
    }

    #[test]
    fn test_project_creation() {
        let project = Project::new("John Doe", "26-001", "Acme Corp");
        assert_eq!(project.meta.designer, "John Doe");
        assert_eq!(project.meta.job_id, "26-001");
        assert_eq!(project.meta.version, SCHEMA_VERSION);
        assert_eq!(project.meta.created, project.meta.modified);
        assert_eq!(project.room_count(), 0);
    }

    #[test]
    fn test_add_room_groups_by_floor() {
        let mut project = Project::new("D", "J", "C");
        project.add_room("L1", room("A"));
        project.add_room("L2", room("B"));
        project.add_room("L1", room("C"));
        assert_eq!(project.building.floors.len(), 2);
        assert_eq!(project.building.floors[0].rooms.len(), 2);
        assert_eq!(project.room_count(), 3);
        assert!(project.meta.modified >= project.meta.created);
    }

    #[test]
    fn test_empty_project_rejected() {
        let err = Project::new("D", "J", "C").validate().unwrap_err();
        assert_eq!(err.error_code(), "MISSING_FIELD");
    }

    #[test]
    fn test_room_errors_name_the_room() {
        let mut project = Project::new("D", "J", "C");
        let mut bad = room("Kitchen");
        bad.geometry = RoomGeometry::rectangular(-1.0, 10.0, 9.0);
        project.add_room("L1", bad);
        let err = project.validate().unwrap_err();
        assert!(err.is_input_error());
        assert!(err.to_string().contains("L1/Kitchen"), "{err}");
    }

    #[test]
    fn test_project_serialization() {
        let mut project = Project::new("Jane Designer", "26-042", "Test Client");
        project.add_room("Ground", room("Lobby"));
        let json = serde_json::to_string_pretty(&project).unwrap();
        assert!(json.contains("\"source\": \"preset\""));
        assert!(json.contains("Houston"));

        let roundtrip: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, project);
    }

    #[test]
    fn test_explicit_climate_json() {
        let json = r#"{
            "source": "explicit",
            "condition": { "dry_bulb_f": 95.0, "wet_bulb_f": 78.0 },
            "latitude_deg": 30.0,
            "daily_range_f": 18.0
        }"#;
        let climate: ClimateSelection = serde_json::from_str(json).unwrap();
        match climate {
            ClimateSelection::Explicit { condition, .. } => assert_eq!(condition.wet_bulb_f, Some(78.0)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_design_hour_range() {
        let mut project = Project::new("D", "J", "C");
        project.add_room("L1", room("A"));
        project.building.design_hour = Some(30.0);
        assert!(project.validate().unwrap_err().is_input_error());
    }
}

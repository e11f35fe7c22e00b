//! # Reference Data
//!
//! Read-only, versioned tables consumed by the calculations:
//!
//! - [`climate`] - outdoor design conditions by city/season, indoor presets by usage
//! - [`tables`] - CLTD, SHGF, CLF, occupant activity, glass, shading, constructions
//! - [`diversity`] - diversity-factor bands for aggregation
//! - [`catalog`] - indoor/outdoor equipment models and accessory prices
//!
//! The built-in data ships as TOML files embedded at compile time and parsed
//! once on first use. A project can swap any value without code changes by
//! loading its own document with [`ReferenceData::from_toml_str`], which
//! expects the four sections as top-level tables:
//!
//! ```toml
//! version = "acme-2025.2"
//!
//! [climate]
//! # cities = [...], indoor = [...]
//!
//! [tables]
//! # cltd, shgf, clf, activities, ...
//!
//! [diversity]
//! # minimum, bands, adjustments
//!
//! [catalog]
//! # indoor_units, outdoor_units, accessories
//! ```

pub mod catalog;
pub mod climate;
pub mod diversity;
pub mod tables;

pub use catalog::{
    Accessory, AccessoryCategory, EquipmentCatalog, IndoorMounting, IndoorUnitModel, OutdoorUnitModel,
};
pub use climate::{CityClimate, ClimateDataProvider, IndoorPreset, OutdoorDesign, Season, UsageCategory};
pub use diversity::{DiversityBand, DiversityTable};
pub use tables::{
    ActivityLevel, ComponentKind, ConstructionWeight, GlassType, LoadTables, Orientation, ShadingDevice,
};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Version tag of the embedded reference data
pub const BUILTIN_VERSION: &str = "builtin-2025.1";

const CLIMATE_TOML: &str = include_str!("data/climate.toml");
const TABLES_TOML: &str = include_str!("data/load_tables.toml");
const DIVERSITY_TOML: &str = include_str!("data/diversity.toml");
const CATALOG_TOML: &str = include_str!("data/catalog.toml");

static BUILTIN: Lazy<CalcResult<ReferenceData>> = Lazy::new(ReferenceData::parse_builtin);

/// All reference tables for one calculation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceData {
    /// Free-form version tag, echoed into reports for traceability
    pub version: String,
    pub climate: ClimateDataProvider,
    pub tables: LoadTables,
    pub diversity: DiversityTable,
    pub catalog: EquipmentCatalog,
}

impl ReferenceData {
    /// The embedded reference data.
    ///
    /// # Example
    ///
    /// ```rust
    /// use hvac_core::reference::ReferenceData;
    ///
    /// let data = ReferenceData::builtin().unwrap();
    /// assert!(!data.catalog.indoor_units().is_empty());
    /// ```
    pub fn builtin() -> CalcResult<&'static ReferenceData> {
        BUILTIN.as_ref().map_err(Clone::clone)
    }

    /// Parse a combined reference document (see module docs) and validate it.
    pub fn from_toml_str(source: &str) -> CalcResult<Self> {
        let data: ReferenceData = toml::from_str(source)
            .map_err(|e| CalcError::reference_data("reference document", e.to_string()))?;
        data.validate()?;
        Ok(data)
    }

    /// Check internal consistency of every table.
    pub fn validate(&self) -> CalcResult<()> {
        self.tables.validate()?;
        self.diversity.validate()?;
        self.catalog.validate()?;
        self.climate.validate()?;
        Ok(())
    }

    fn parse_builtin() -> CalcResult<Self> {
        fn section<T: serde::de::DeserializeOwned>(name: &str, source: &str) -> CalcResult<T> {
            toml::from_str(source).map_err(|e| CalcError::reference_data(name, e.to_string()))
        }

        let data = ReferenceData {
            version: BUILTIN_VERSION.to_string(),
            climate: section("climate.toml", CLIMATE_TOML)?,
            tables: section("load_tables.toml", TABLES_TOML)?,
            diversity: section("diversity.toml", DIVERSITY_TOML)?,
            catalog: section("catalog.toml", CATALOG_TOML)?,
        };
        data.validate()?;
        tracing::debug!(version = %data.version, "parsed built-in reference data");
        Ok(data)
    }
}

//! # Load Aggregation
//!
//! Rolls room results up into floors and floors into the building.
//!
//! The diversity factor is looked up once per aggregate from the member
//! count and multiplies the aggregate sum only. Room results are never
//! discounted individually. The building uses its total room count as the
//! population and sums the floors' raw totals; the sum of the floors'
//! adjusted totals is kept alongside for audit.

use serde::{Deserialize, Serialize};

use crate::calculations::room_load::RoomLoadResult;
use crate::reference::{DiversityTable, UsageCategory};
use crate::units::{BtuPerHour, Tons};

/// Summed totals of one floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorAggregate {
    pub label: String,
    pub rooms: Vec<RoomLoadResult>,
    pub room_count: usize,
    pub area_sqft: f64,
    /// Sum of room adjusted sensible loads
    pub sensible_btuh: f64,
    /// Sum of room adjusted latent loads
    pub latent_btuh: f64,
    /// Raw total: sensible + latent
    pub total_btuh: f64,
    pub diversity_factor: f64,
    pub adjusted_total_btuh: f64,
    pub adjusted_tonnage: f64,
    pub supply_cfm: f64,
    pub outdoor_air_cfm: f64,
}

/// Summed totals of the building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingAggregate {
    pub floors: Vec<FloorAggregate>,
    pub floor_count: usize,
    pub room_count: usize,
    pub area_sqft: f64,
    pub sensible_btuh: f64,
    pub latent_btuh: f64,
    /// Sum of floor raw totals
    pub total_btuh: f64,
    /// Looked up from the total room count
    pub diversity_factor: f64,
    pub adjusted_total_btuh: f64,
    pub adjusted_tonnage: f64,
    pub supply_cfm: f64,
    pub outdoor_air_cfm: f64,
    /// Sum of floor adjusted totals
    pub floor_adjusted_sum_btuh: f64,
}

impl BuildingAggregate {
    /// Every room on every floor, in input order
    pub fn rooms(&self) -> impl Iterator<Item = &RoomLoadResult> {
        self.floors.iter().flat_map(|f| f.rooms.iter())
    }
}

/// Applies one diversity table for one usage category.
#[derive(Debug, Clone, Copy)]
pub struct AggregationEngine<'a> {
    table: &'a DiversityTable,
    usage: UsageCategory,
}

impl<'a> AggregationEngine<'a> {
    pub fn new(table: &'a DiversityTable, usage: UsageCategory) -> Self {
        AggregationEngine { table, usage }
    }

    /// Sum rooms into a floor.
    pub fn floor(&self, label: impl Into<String>, rooms: Vec<RoomLoadResult>) -> FloorAggregate {
        let sensible: f64 = rooms.iter().map(|r| r.adjusted_sensible_btuh).sum();
        let latent: f64 = rooms.iter().map(|r| r.adjusted_latent_btuh).sum();
        let total = sensible + latent;
        let factor = self.table.factor(rooms.len(), self.usage);
        let adjusted = total * factor;

        let floor = FloorAggregate {
            label: label.into(),
            room_count: rooms.len(),
            area_sqft: rooms.iter().map(|r| r.area_sqft).sum(),
            sensible_btuh: sensible,
            latent_btuh: latent,
            total_btuh: total,
            diversity_factor: factor,
            adjusted_total_btuh: adjusted,
            adjusted_tonnage: Tons::from(BtuPerHour(adjusted)).0,
            supply_cfm: rooms.iter().map(|r| r.supply_cfm).sum(),
            outdoor_air_cfm: rooms.iter().map(|r| r.outdoor_air_cfm).sum(),
            rooms,
        };
        tracing::debug!(floor = %floor.label, rooms = floor.room_count, factor, adjusted, "floor aggregate");
        floor
    }

    /// Sum floors into the building.
    pub fn building(&self, floors: Vec<FloorAggregate>) -> BuildingAggregate {
        let room_count: usize = floors.iter().map(|f| f.room_count).sum();
        let sensible: f64 = floors.iter().map(|f| f.sensible_btuh).sum();
        let latent: f64 = floors.iter().map(|f| f.latent_btuh).sum();
        let total: f64 = floors.iter().map(|f| f.total_btuh).sum();
        let factor = self.table.factor(room_count, self.usage);
        let adjusted = total * factor;

        tracing::debug!(floors = floors.len(), rooms = room_count, factor, adjusted, "building aggregate");
        BuildingAggregate {
            floor_count: floors.len(),
            room_count,
            area_sqft: floors.iter().map(|f| f.area_sqft).sum(),
            sensible_btuh: sensible,
            latent_btuh: latent,
            total_btuh: total,
            diversity_factor: factor,
            adjusted_total_btuh: adjusted,
            adjusted_tonnage: Tons::from(BtuPerHour(adjusted)).0,
            supply_cfm: floors.iter().map(|f| f.supply_cfm).sum(),
            outdoor_air_cfm: floors.iter().map(|f| f.outdoor_air_cfm).sum(),
            floor_adjusted_sum_btuh: floors.iter().map(|f| f.adjusted_total_btuh).sum(),
            floors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::room_load::{LatentBreakdown, SensibleBreakdown};
    use crate::reference::ReferenceData;
    use crate::settings::SafetyFactors;
    use proptest::prelude::*;

    fn room(label: &str, sensible: f64, latent: f64) -> RoomLoadResult {
        let total = sensible + latent;
        RoomLoadResult {
            label: label.to_string(),
            area_sqft: 100.0,
            volume_cuft: 900.0,
            sensible: SensibleBreakdown::default(),
            latent: LatentBreakdown::default(),
            components: Vec::new(),
            sensible_subtotal_btuh: sensible,
            latent_subtotal_btuh: latent,
            safety_factors: SafetyFactors::uniform(1.0),
            adjusted_sensible_btuh: sensible,
            adjusted_latent_btuh: latent,
            grand_total_btuh: total,
            tonnage: total / 12_000.0,
            supply_cfm: sensible / 21.6,
            sensible_heat_factor: sensible / total,
            outdoor_air_cfm: 20.0,
            infiltration_cfm: 10.0,
            load_density_btuh_sqft: total / 100.0,
            sqft_per_ton: 100.0 / (total / 12_000.0),
            coil: None,
            defaults_applied: Vec::new(),
            warnings: Vec::new(),
            indoor_mounting: None,
        }
    }

    fn engine() -> AggregationEngine<'static> {
        AggregationEngine::new(&ReferenceData::builtin().unwrap().diversity, UsageCategory::Office)
    }

    #[test]
    fn test_single_room_floor_not_discounted() {
        let floor = engine().floor("L1", vec![room("A", 9_000.0, 3_000.0)]);
        assert_eq!(floor.diversity_factor, 1.0);
        assert_eq!(floor.adjusted_total_btuh, 12_000.0);
        assert_eq!(floor.adjusted_tonnage, 1.0);
    }

    #[test]
    fn test_floor_sums_then_discounts() {
        let rooms: Vec<_> = (0..5).map(|i| room(&format!("R{i}"), 8_000.0, 4_000.0)).collect();
        let floor = engine().floor("L2", rooms);
        assert_eq!(floor.room_count, 5);
        assert_eq!(floor.total_btuh, 60_000.0);
        assert_eq!(floor.diversity_factor, 0.90);
        assert!((floor.adjusted_total_btuh - 54_000.0).abs() < 1e-9);
        assert_eq!(floor.area_sqft, 500.0);
        assert_eq!(floor.outdoor_air_cfm, 100.0);
    }

    #[test]
    fn test_building_uses_total_room_count() {
        let e = engine();
        let floors = vec![
            e.floor("L1", (0..3).map(|i| room(&i.to_string(), 6_000.0, 2_000.0)).collect()),
            e.floor("L2", (0..3).map(|i| room(&i.to_string(), 6_000.0, 2_000.0)).collect()),
            e.floor("L3", (0..3).map(|i| room(&i.to_string(), 6_000.0, 2_000.0)).collect()),
        ];
        let building = e.building(floors);
        assert_eq!(building.room_count, 9);
        assert_eq!(building.total_btuh, 72_000.0);
        // 9 rooms fall in the "up to 10" band
        assert_eq!(building.diversity_factor, 0.85);
        assert!((building.adjusted_total_btuh - 61_200.0).abs() < 1e-9);
        // Each 3-room floor was discounted at 0.95
        assert!((building.floor_adjusted_sum_btuh - 68_400.0).abs() < 1e-9);
        assert_eq!(building.rooms().count(), 9);
    }

    #[test]
    fn test_empty_building() {
        let building = engine().building(Vec::new());
        assert_eq!(building.total_btuh, 0.0);
        assert_eq!(building.adjusted_total_btuh, 0.0);
        assert_eq!(building.diversity_factor, 1.0);
    }

    proptest! {
        #[test]
        fn prop_adjusted_never_exceeds_raw(loads in prop::collection::vec((0.0f64..60_000.0, 0.0f64..20_000.0), 0..60)) {
            let rooms: Vec<_> = loads.iter().enumerate().map(|(i, (s, l))| room(&i.to_string(), *s, *l)).collect();
            let e = engine();
            let floor = e.floor("F", rooms);
            prop_assert!(floor.diversity_factor > 0.0 && floor.diversity_factor <= 1.0);
            prop_assert!(floor.adjusted_total_btuh <= floor.total_btuh);
            let building = e.building(vec![floor]);
            prop_assert!(building.diversity_factor > 0.0 && building.diversity_factor <= 1.0);
            prop_assert!(building.adjusted_total_btuh <= building.total_btuh);
        }
    }
}

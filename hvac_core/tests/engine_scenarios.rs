//! End-to-end checks through the public API.

use hvac_core::calculations::{
    ElectricLoad, EnvelopeComponent, InternalLoadSource, PsychrometricEngine, PsychrometricInput, RoomGeometry,
    RoomInput, VentilationSpec,
};
use hvac_core::project::{ClimateSelection, IndoorDesign};
use hvac_core::reference::{
    ActivityLevel, ComponentKind, EquipmentCatalog, IndoorMounting, Orientation, OutdoorUnitModel, Season,
    UsageCategory,
};
use hvac_core::selection::{
    outdoor_candidates, select_outdoor_units, GreedyLargestFirst, OutdoorRequirement, SelectionTier, StrategyKind,
};
use hvac_core::settings::TierParameters;
use hvac_core::{CalcError, Engine, EngineSettings, Project, ProjectReport, ReferenceData, ReportSink};
use proptest::prelude::*;

fn office_room(label: &str, area_sqft: f64, occupants: u32) -> RoomInput {
    RoomInput {
        label: label.to_string(),
        geometry: RoomGeometry::with_area(area_sqft, 9.0),
        envelope: vec![
            EnvelopeComponent::new(ComponentKind::Wall, 180.0, Orientation::S),
            EnvelopeComponent::new(ComponentKind::Glass, 50.0, Orientation::S),
        ],
        internal: InternalLoadSource {
            occupants,
            lighting: Some(ElectricLoad::WattsPerSqft(1.2)),
            ..InternalLoadSource::default()
        },
        ..RoomInput::default()
    }
}

fn sample_project() -> Project {
    let mut project = Project::new("Integration", "26-900", "Test Client");
    project.building.usage = UsageCategory::Office;
    project.building.climate = ClimateSelection::Preset {
        city: "Miami".to_string(),
        season: Season::Summer,
    };
    for floor in ["Ground", "First", "Second"] {
        for i in 0..4 {
            project.add_room(floor, office_room(&format!("{floor} {i}"), 350.0, 3));
        }
    }
    project
}

#[test]
fn scenario_a_design_day_state() {
    let result = PsychrometricEngine::new()
        .resolve(&PsychrometricInput::from_db_rh(95.0, 50.0))
        .unwrap();
    let c = result.condition;
    assert!(result.warning.is_none());
    assert!(c.dew_point_f < c.wet_bulb_f && c.wet_bulb_f < c.dry_bulb_f);
    assert!((c.wet_bulb_f - 79.87).abs() < 0.3);
    assert!((c.humidity_ratio_gr_lb - 124.1).abs() / 124.1 < 0.02);

    // Feeding the derived wet-bulb back recovers the humidity
    let back = PsychrometricEngine::new()
        .resolve(&PsychrometricInput::from_db_wb(95.0, c.wet_bulb_f))
        .unwrap();
    assert!((back.condition.relative_humidity_pct - 50.0).abs() < 0.5);
}

#[test]
fn scenario_b_room_through_engine() {
    let mut project = Project::new("Integration", "26-901", "Client");
    project.building.climate = ClimateSelection::Explicit {
        condition: PsychrometricInput::from_db_rh(95.0, 50.0),
        latitude_deg: 32.0,
        daily_range_f: 20.0,
    };
    project.building.indoor = IndoorDesign::Explicit {
        dry_bulb_f: 75.0,
        relative_humidity_pct: 50.0,
    };
    project.add_room(
        "L1",
        RoomInput {
            label: "Office".to_string(),
            geometry: RoomGeometry::rectangular(20.0, 25.0, 10.0),
            internal: InternalLoadSource {
                occupants: 10,
                activity: Some(ActivityLevel::Office),
                lighting: Some(ElectricLoad::WattsPerSqft(1.5)),
                ..InternalLoadSource::default()
            },
            ventilation: VentilationSpec {
                outdoor_air_cfm: Some(0.0),
                infiltration_cfm: Some(500.0),
                infiltration_ach: None,
            },
            ..RoomInput::default()
        },
    );

    let engine = Engine::builtin().unwrap();
    let first = engine.compute(&project).unwrap();
    let second = engine.compute(&project).unwrap();
    assert_eq!(first, second);

    let room = &first.building.floors[0].rooms[0];
    assert_eq!(room.area_sqft, 500.0);
    assert!((room.sensible.infiltration_btuh - 10_800.0).abs() < 1e-9);
    assert_eq!(room.sensible.people_btuh, 2_500.0);
    assert_eq!(room.tonnage, room.grand_total_btuh / 12_000.0);
    assert_eq!(first.building.diversity_factor, 1.0);
    assert!(first.selection.indoor[0].capacity_btuh >= room.grand_total_btuh);
}

#[test]
fn scenario_c_twenty_ton_ceiling() {
    let unit = |model: &str, tons: f64| OutdoorUnitModel {
        model: model.to_string(),
        capacity_btuh: tons * 12_000.0,
        nominal_hp: tons,
        max_connections: 16,
        max_piping_ft: 400.0,
        max_height_ft: 100.0,
        price: tons * 1_000.0,
    };
    let catalog = EquipmentCatalog::new(
        Vec::new(),
        vec![unit("T4", 4.0), unit("T6", 6.0), unit("T10", 10.0), unit("T20", 20.0)],
        Vec::new(),
    )
    .unwrap();
    let tier = TierParameters {
        hp_per_ton: 1.0,
        max_outdoor_hp: 20.0,
        preferred_mounting: IndoorMounting::Cassette,
    };
    let requirement = OutdoorRequirement {
        required_btuh: 25.0 * 12_000.0,
        required_hp: 25.0,
        indoor_count: 12,
        max_units: 16,
    };

    let candidates = outdoor_candidates(&catalog, &tier, 12, 150.0, 30.0);
    let picked = select_outdoor_units(&GreedyLargestFirst, &requirement, &candidates).unwrap();
    let models: Vec<_> = picked.iter().map(|a| (a.model.as_str(), a.quantity)).collect();
    assert_eq!(models, vec![("T20", 1), ("T6", 1)]);
    let total: f64 = picked.iter().map(|a| a.capacity_btuh()).sum();
    assert!(total >= requirement.required_btuh);

    // No module offers the 20 connections that 40 indoor units need
    let crowded = OutdoorRequirement {
        indoor_count: 40,
        ..requirement
    };
    let candidates = outdoor_candidates(&catalog, &tier, 40, 150.0, 30.0);
    let err = select_outdoor_units(&GreedyLargestFirst, &crowded, &candidates).unwrap_err();
    assert!(err.is_sizing_impossible());
}

#[test]
fn scenario_d_wet_bulb_above_dry_bulb() {
    let err = PsychrometricEngine::new()
        .resolve(&PsychrometricInput::from_db_wb(80.0, 85.0))
        .unwrap_err();
    assert!(err.is_input_error());

    let mut project = sample_project();
    project.building.climate = ClimateSelection::Explicit {
        condition: PsychrometricInput::from_db_wb(80.0, 85.0),
        latitude_deg: 25.0,
        daily_range_f: 15.0,
    };
    assert!(matches!(
        Engine::builtin().unwrap().compute(&project),
        Err(CalcError::InvalidInput { .. })
    ));
}

#[test]
fn full_project_report() {
    let engine = Engine::builtin().unwrap();
    let report = engine.compute(&sample_project()).unwrap();

    assert_eq!(report.building.floor_count, 3);
    assert_eq!(report.building.room_count, 12);
    assert!(report.building.diversity_factor < 1.0);
    assert!(report.building.adjusted_total_btuh <= report.building.total_btuh);
    for floor in &report.building.floors {
        assert!(floor.adjusted_total_btuh <= floor.total_btuh);
    }

    let selection = &report.selection;
    assert_eq!(selection.indoor.len(), 12);
    assert!(selection.indoor.iter().all(|a| a.mounting == IndoorMounting::Cassette));
    assert!(selection.provided_outdoor_btuh >= selection.required_outdoor_btuh);
    assert!(selection.total_connections >= 12);
    assert!(selection.cost.total > selection.cost.equipment_subtotal);
    assert_eq!(selection.materials.lines.len(), 8);

    let json = serde_json::to_string(&report).unwrap();
    let back: ProjectReport = serde_json::from_str(&json).unwrap();
    let models = |r: &ProjectReport| r.selection.indoor.iter().map(|a| a.model.clone()).collect::<Vec<_>>();
    assert_eq!(models(&back), models(&report));
    assert_eq!(back.building.room_count, 12);
    assert!((back.selection.cost.total - report.selection.cost.total).abs() < 1e-6);
}

#[test]
fn every_strategy_and_tier_covers_the_load() {
    let engine = Engine::builtin().unwrap();
    let mut project = sample_project();
    for tier in SelectionTier::ALL {
        for strategy in StrategyKind::ALL {
            project.selection.tier = tier;
            project.selection.strategy = strategy;
            let report = engine.compute(&project).unwrap();
            let s = &report.selection;
            assert!(s.provided_outdoor_btuh + 1e-6 >= s.required_outdoor_btuh, "{tier} {strategy:?}");
            assert!(s.provided_outdoor_hp + 1e-6 >= s.required_outdoor_hp, "{tier} {strategy:?}");
        }
    }
}

#[test]
fn custom_reference_and_settings() {
    let builtin = ReferenceData::builtin().unwrap();
    let mut data = builtin.clone();
    data.version = "acme-test".to_string();
    let document = toml::to_string(&data).unwrap();
    let reloaded = ReferenceData::from_toml_str(&document).unwrap();

    let settings = EngineSettings::from_toml_str(
        r#"
        [materials]
        tax_rate = 0.0

        [loads.safety_factors]
        sensible = 1.0
        latent = 1.0
        "#,
    )
    .unwrap();

    let engine = Engine::new(&reloaded, settings).unwrap();
    let report = engine.compute(&sample_project()).unwrap();
    assert_eq!(report.reference_version, "acme-test");
    assert_eq!(report.selection.cost.tax, 0.0);
    let room = &report.building.floors[0].rooms[0];
    assert_eq!(room.adjusted_sensible_btuh, room.sensible_subtotal_btuh);
}

#[test]
fn report_sink_receives_report() {
    struct Counting(usize);
    impl ReportSink for Counting {
        type Error = String;
        fn store(&mut self, report: &ProjectReport) -> Result<(), String> {
            if report.building.room_count == 0 {
                return Err("empty".to_string());
            }
            self.0 += 1;
            Ok(())
        }
    }

    let report = Engine::builtin().unwrap().compute(&sample_project()).unwrap();
    let mut sink = Counting(0);
    sink.store(&report).unwrap();
    assert_eq!(sink.0, 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_rh_round_trips_through_wet_bulb(db in 60.0f64..110.0, rh in 10.0f64..95.0) {
        let engine = PsychrometricEngine::new();
        let forward = engine.resolve(&PsychrometricInput::from_db_rh(db, rh)).unwrap();
        let back = engine
            .resolve(&PsychrometricInput::from_db_wb(db, forward.condition.wet_bulb_f))
            .unwrap();
        prop_assert!((back.condition.relative_humidity_pct - rh).abs() < 0.5);
    }

    #[test]
    fn prop_humidity_ratio_rises_with_rh(db in 40.0f64..110.0, rh in 1.0f64..99.0, step in 0.1f64..1.0) {
        let engine = PsychrometricEngine::new();
        let low = engine.resolve(&PsychrometricInput::from_db_rh(db, rh)).unwrap().condition;
        let high = engine
            .resolve(&PsychrometricInput::from_db_rh(db, (rh + step).min(100.0)))
            .unwrap()
            .condition;
        prop_assert!(high.humidity_ratio_gr_lb >= low.humidity_ratio_gr_lb);
    }
}

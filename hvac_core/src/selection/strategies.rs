//! Optimizing outdoor strategies.
//!
//! Both run the same bounded covering search: the requirement is expressed
//! in horsepower buckets, each module covers the smaller of its nominal hp
//! and its capacity converted at the requirement's Btu/h-per-hp ratio, and
//! `best[r]` holds the cheapest plan (under the strategy's ordering) that
//! covers `r` buckets with at most `k` modules. Bucket weights round down,
//! so a plan that covers the target in buckets also covers it in Btu/h and
//! in hp.

use crate::errors::{CalcError, CalcResult};
use crate::reference::OutdoorUnitModel;
use crate::selection::outdoor::{OutdoorRequirement, OutdoorSelectionStrategy, COVERAGE_EPSILON};

/// Search resolution (hp)
const BUCKET_HP: f64 = 0.1;

const STAGE: &str = "outdoor selection";

/// Lowest total equipment price; ties go to fewer modules, then less
/// installed capacity.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimizeCost;

impl OutdoorSelectionStrategy for MinimizeCost {
    fn name(&self) -> &'static str {
        "minimize_cost"
    }

    fn pick<'c>(
        &self,
        requirement: &OutdoorRequirement,
        candidates: &[&'c OutdoorUnitModel],
    ) -> CalcResult<Vec<&'c OutdoorUnitModel>> {
        cover(requirement, candidates, |u| (u.price, u.capacity_btuh))
    }
}

/// Least installed capacity above the requirement; ties go to fewer
/// modules, then lower price.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimizeOversizing;

impl OutdoorSelectionStrategy for MinimizeOversizing {
    fn name(&self) -> &'static str {
        "minimize_oversizing"
    }

    fn pick<'c>(
        &self,
        requirement: &OutdoorRequirement,
        candidates: &[&'c OutdoorUnitModel],
    ) -> CalcResult<Vec<&'c OutdoorUnitModel>> {
        cover(requirement, candidates, |u| (u.capacity_btuh, u.price))
    }
}

#[derive(Debug, Clone)]
struct Plan {
    primary: f64,
    secondary: f64,
    picks: Vec<usize>,
}

impl Plan {
    fn empty() -> Self {
        Plan {
            primary: 0.0,
            secondary: 0.0,
            picks: Vec::new(),
        }
    }

    fn extended(&self, index: usize, (primary, secondary): (f64, f64)) -> Self {
        let mut picks = self.picks.clone();
        picks.push(index);
        Plan {
            primary: self.primary + primary,
            secondary: self.secondary + secondary,
            picks,
        }
    }

    fn better_than(&self, other: &Plan) -> bool {
        self.primary
            .total_cmp(&other.primary)
            .then(self.picks.len().cmp(&other.picks.len()))
            .then(self.secondary.total_cmp(&other.secondary))
            .is_lt()
    }
}

fn cover<'c>(
    requirement: &OutdoorRequirement,
    candidates: &[&'c OutdoorUnitModel],
    key: impl Fn(&OutdoorUnitModel) -> (f64, f64),
) -> CalcResult<Vec<&'c OutdoorUnitModel>> {
    if requirement.required_hp <= COVERAGE_EPSILON && requirement.required_btuh <= COVERAGE_EPSILON {
        return Ok(Vec::new());
    }
    if requirement.required_hp <= 0.0 {
        return Err(CalcError::sizing_impossible(
            STAGE,
            "a cooling requirement with zero horsepower cannot be bucketed",
        ));
    }

    let btuh_per_hp = requirement.required_btuh / requirement.required_hp;
    let effective_hp = |u: &OutdoorUnitModel| {
        if btuh_per_hp > 0.0 {
            u.nominal_hp.min(u.capacity_btuh / btuh_per_hp)
        } else {
            u.nominal_hp
        }
    };
    let weights: Vec<usize> = candidates
        .iter()
        .map(|u| (effective_hp(u) / BUCKET_HP + 1e-9).floor() as usize)
        .collect();
    let target = (requirement.required_hp / BUCKET_HP - 1e-9).ceil().max(0.0) as usize;

    let reach = weights.iter().copied().max().unwrap_or(0) * requirement.max_units as usize;
    if reach < target {
        return Err(CalcError::sizing_impossible(
            STAGE,
            format!(
                "{:.1} hp exceeds what {} modules can cover",
                requirement.required_hp, requirement.max_units
            ),
        ));
    }

    let mut best: Vec<Option<Plan>> = vec![None; target + 1];
    best[0] = Some(Plan::empty());
    for _ in 0..requirement.max_units {
        let previous = best.clone();
        for r in 1..=target {
            for (index, unit) in candidates.iter().enumerate() {
                let weight = weights[index];
                if weight == 0 {
                    continue;
                }
                let Some(base) = &previous[r.saturating_sub(weight)] else {
                    continue;
                };
                let candidate = base.extended(index, key(unit));
                if best[r].as_ref().map_or(true, |b| candidate.better_than(b)) {
                    best[r] = Some(candidate);
                }
            }
        }
    }

    let plan = best[target].take().ok_or_else(|| {
        CalcError::sizing_impossible(
            STAGE,
            format!("no combination of {} modules covers the requirement", requirement.max_units),
        )
    })?;
    tracing::trace!(primary = plan.primary, units = plan.picks.len(), "covering search finished");
    Ok(plan.picks.into_iter().map(|i| candidates[i]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{EquipmentCatalog, IndoorMounting, ReferenceData};
    use crate::selection::outdoor::{outdoor_candidates, select_outdoor_units, GreedyLargestFirst};
    use crate::settings::{TierParameters, TierTable};
    use crate::selection::SelectionTier;
    use proptest::prelude::*;

    fn unit(model: &str, tons: f64, price: f64) -> OutdoorUnitModel {
        OutdoorUnitModel {
            model: model.to_string(),
            capacity_btuh: tons * 12_000.0,
            nominal_hp: tons,
            max_connections: 32,
            max_piping_ft: 500.0,
            max_height_ft: 150.0,
            price,
        }
    }

    fn catalog() -> EquipmentCatalog {
        EquipmentCatalog::new(
            Vec::new(),
            vec![
                unit("ODU-5", 5.0, 5_000.0),
                unit("ODU-10", 10.0, 8_000.0),
                unit("ODU-20", 20.0, 18_000.0),
            ],
            Vec::new(),
        )
        .unwrap()
    }

    fn tier() -> TierParameters {
        TierParameters {
            hp_per_ton: 1.0,
            max_outdoor_hp: 20.0,
            preferred_mounting: IndoorMounting::Cassette,
        }
    }

    fn requirement(tons: f64) -> OutdoorRequirement {
        OutdoorRequirement {
            required_btuh: tons * 12_000.0,
            required_hp: tons,
            indoor_count: 4,
            max_units: 16,
        }
    }

    fn total_price(picks: &[&OutdoorUnitModel]) -> f64 {
        picks.iter().map(|u| u.price).sum()
    }

    #[test]
    fn test_minimize_cost_beats_greedy_on_price() {
        let catalog = catalog();
        let candidates = outdoor_candidates(&catalog, &tier(), 4, 100.0, 10.0);
        let greedy = GreedyLargestFirst.pick(&requirement(20.0), &candidates).unwrap();
        let cheap = MinimizeCost.pick(&requirement(20.0), &candidates).unwrap();
        // One ODU-20 at 18k versus two ODU-10 at 16k
        assert_eq!(total_price(&greedy), 18_000.0);
        assert_eq!(total_price(&cheap), 16_000.0);
        assert_eq!(cheap.len(), 2);
    }

    #[test]
    fn test_minimize_oversizing_tracks_requirement() {
        let catalog = catalog();
        let candidates = outdoor_candidates(&catalog, &tier(), 4, 100.0, 10.0);
        let picks = MinimizeOversizing.pick(&requirement(24.0), &candidates).unwrap();
        let provided: f64 = picks.iter().map(|u| u.capacity_btuh).sum();
        assert_eq!(provided, 25.0 * 12_000.0);
        // 20 + 5 uses fewer modules than 10 + 10 + 5
        assert_eq!(picks.len(), 2);
    }

    #[test]
    fn test_zero_requirement_picks_nothing() {
        let catalog = catalog();
        let candidates = outdoor_candidates(&catalog, &tier(), 4, 100.0, 10.0);
        assert!(MinimizeCost.pick(&requirement(0.0), &candidates).unwrap().is_empty());
    }

    #[test]
    fn test_unreachable_requirement() {
        let catalog = catalog();
        let candidates = outdoor_candidates(&catalog, &tier(), 4, 100.0, 10.0);
        let mut req = requirement(100.0);
        req.max_units = 4;
        let err = MinimizeOversizing.pick(&req, &candidates).unwrap_err();
        assert!(err.is_sizing_impossible());
    }

    #[test]
    fn test_names() {
        assert_eq!(MinimizeCost.name(), "minimize_cost");
        assert_eq!(MinimizeOversizing.name(), "minimize_oversizing");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn prop_strategies_never_under_provision(
            tons in 0.5f64..120.0,
            indoor_count in 1usize..40,
            tier_index in 0usize..3,
        ) {
            let data = ReferenceData::builtin().unwrap();
            let tier = TierTable::default();
            let params = tier.get(SelectionTier::ALL[tier_index]);
            let requirement = OutdoorRequirement {
                required_btuh: tons * 12_000.0,
                required_hp: tons * params.hp_per_ton,
                indoor_count,
                max_units: 16,
            };
            let candidates = outdoor_candidates(&data.catalog, params, indoor_count, 100.0, 30.0);
            let strategies: [&dyn OutdoorSelectionStrategy; 3] =
                [&GreedyLargestFirst, &MinimizeCost, &MinimizeOversizing];
            for strategy in strategies {
                if let Ok(assignments) = select_outdoor_units(strategy, &requirement, &candidates) {
                    let btuh: f64 = assignments.iter().map(|a| a.capacity_btuh()).sum();
                    let hp: f64 = assignments.iter().map(|a| a.hp()).sum();
                    prop_assert!(btuh + 1e-6 >= requirement.required_btuh);
                    prop_assert!(hp + 1e-6 >= requirement.required_hp);
                    let units: u32 = assignments.iter().map(|a| a.quantity).sum();
                    prop_assert!(units <= requirement.max_units);
                    let connections: u32 = assignments.iter().map(|a| a.connections()).sum();
                    prop_assert!(connections as usize >= requirement.indoor_count);
                }
            }
        }
    }
}

//! Outdoor-unit stage: candidate filtering, the strategy seam, the default
//! greedy strategy and consolidation of picks into quantities.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::reference::{EquipmentCatalog, OutdoorUnitModel};
use crate::settings::TierParameters;

/// Slack for floating-point coverage checks (Btu/h and hp)
pub(crate) const COVERAGE_EPSILON: f64 = 1e-6;

const STAGE: &str = "outdoor selection";

/// What the outdoor modules must cover together
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutdoorRequirement {
    pub required_btuh: f64,
    /// required tons × tier hp-per-ton
    pub required_hp: f64,
    pub indoor_count: usize,
    pub max_units: u32,
}

/// Chooses a multiset of outdoor modules covering a requirement.
///
/// `candidates` are pre-filtered for the tier, connections and piping
/// limits, and sorted by ascending capacity (ties in catalog order).
/// Implementations return one entry per module picked and must be
/// deterministic.
pub trait OutdoorSelectionStrategy {
    /// Name recorded in the selection result
    fn name(&self) -> &'static str;

    fn pick<'c>(
        &self,
        requirement: &OutdoorRequirement,
        candidates: &[&'c OutdoorUnitModel],
    ) -> CalcResult<Vec<&'c OutdoorUnitModel>>;
}

/// Fewest modules: take the smallest module that covers what remains, else
/// the largest available, and repeat.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyLargestFirst;

impl OutdoorSelectionStrategy for GreedyLargestFirst {
    fn name(&self) -> &'static str {
        "greedy_largest_first"
    }

    fn pick<'c>(
        &self,
        requirement: &OutdoorRequirement,
        candidates: &[&'c OutdoorUnitModel],
    ) -> CalcResult<Vec<&'c OutdoorUnitModel>> {
        let largest = candidates
            .last()
            .copied()
            .ok_or_else(|| CalcError::sizing_impossible(STAGE, "no candidate outdoor units"))?;

        let mut picks = Vec::new();
        let mut remaining_hp = requirement.required_hp;
        let mut remaining_btuh = requirement.required_btuh;
        while remaining_hp > COVERAGE_EPSILON || remaining_btuh > COVERAGE_EPSILON {
            if picks.len() >= requirement.max_units as usize {
                return Err(CalcError::sizing_impossible(
                    STAGE,
                    format!(
                        "{:.1} hp / {:.0} Btu/h still uncovered after {} units",
                        remaining_hp.max(0.0),
                        remaining_btuh.max(0.0),
                        requirement.max_units
                    ),
                ));
            }
            let unit = candidates
                .iter()
                .copied()
                .find(|u| u.nominal_hp >= remaining_hp && u.capacity_btuh >= remaining_btuh)
                .unwrap_or(largest);
            tracing::trace!(model = %unit.model, remaining_hp, remaining_btuh, "greedy pick");
            remaining_hp -= unit.nominal_hp;
            remaining_btuh -= unit.capacity_btuh;
            picks.push(unit);
        }
        Ok(picks)
    }
}

/// Modules eligible for a tier, indoor count and piping layout, sorted by
/// ascending capacity with catalog order breaking ties.
pub fn outdoor_candidates<'c>(
    catalog: &'c EquipmentCatalog,
    tier: &TierParameters,
    indoor_count: usize,
    piping_run_ft: f64,
    height_difference_ft: f64,
) -> Vec<&'c OutdoorUnitModel> {
    let min_connections = indoor_count.div_ceil(2);
    let mut candidates: Vec<_> = catalog
        .outdoor_units()
        .iter()
        .filter(|u| u.nominal_hp <= tier.max_outdoor_hp + COVERAGE_EPSILON)
        .filter(|u| u.max_connections as usize >= min_connections)
        .filter(|u| u.max_piping_ft >= piping_run_ft && u.max_height_ft >= height_difference_ft)
        .collect();
    candidates.sort_by(|a, b| a.capacity_btuh.total_cmp(&b.capacity_btuh));
    candidates
}

/// Quantity of one outdoor model in the selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutdoorAssignment {
    pub model: String,
    pub quantity: u32,
    pub unit_capacity_btuh: f64,
    pub unit_hp: f64,
    pub max_connections: u32,
    pub unit_price: f64,
}

impl OutdoorAssignment {
    pub fn capacity_btuh(&self) -> f64 {
        self.unit_capacity_btuh * f64::from(self.quantity)
    }

    pub fn hp(&self) -> f64 {
        self.unit_hp * f64::from(self.quantity)
    }

    pub fn connections(&self) -> u32 {
        self.max_connections * self.quantity
    }

    pub fn price(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

/// Run a strategy and turn its picks into checked, consolidated assignments.
///
/// At least one module is selected whenever there are indoor units. When the
/// capacity picks accept fewer indoor units than the building has, modules
/// are added until every indoor unit has a connection. The result is sorted
/// by descending unit capacity, then model code.
///
/// # Errors
///
/// `SizingImpossible` when there are no candidates, when the strategy fails,
/// when the picks do not cover the requirement, or when the unit cap is
/// reached before every indoor unit has a connection.
pub fn select_outdoor_units(
    strategy: &dyn OutdoorSelectionStrategy,
    requirement: &OutdoorRequirement,
    candidates: &[&OutdoorUnitModel],
) -> CalcResult<Vec<OutdoorAssignment>> {
    if candidates.is_empty() {
        return Err(CalcError::sizing_impossible(
            STAGE,
            format!(
                "no outdoor unit satisfies the tier size limit, {} connections and the piping limits",
                requirement.indoor_count.div_ceil(2)
            ),
        ));
    }

    let mut picks = strategy.pick(requirement, candidates)?;
    if picks.is_empty() && requirement.indoor_count > 0 {
        picks.push(candidates[0]);
    }

    top_up_connections(&mut picks, requirement, candidates)?;

    let assignments = consolidate(&picks);
    let provided_btuh: f64 = assignments.iter().map(|a| a.capacity_btuh()).sum();
    let provided_hp: f64 = assignments.iter().map(|a| a.hp()).sum();
    if provided_btuh + COVERAGE_EPSILON < requirement.required_btuh
        || provided_hp + COVERAGE_EPSILON < requirement.required_hp
    {
        return Err(CalcError::sizing_impossible(
            STAGE,
            format!(
                "{} picked {provided_hp:.1} hp / {provided_btuh:.0} Btu/h for a requirement of {:.1} hp / {:.0} Btu/h",
                strategy.name(),
                requirement.required_hp,
                requirement.required_btuh
            ),
        ));
    }

    tracing::debug!(
        strategy = strategy.name(),
        units = picks.len(),
        provided_hp,
        provided_btuh,
        "outdoor units selected"
    );
    Ok(assignments)
}

/// Add modules until the picks accept `indoor_count` indoor units: the
/// smallest candidate covering the shortfall, else the one with the most
/// connections.
fn top_up_connections<'c>(
    picks: &mut Vec<&'c OutdoorUnitModel>,
    requirement: &OutdoorRequirement,
    candidates: &[&'c OutdoorUnitModel],
) -> CalcResult<()> {
    let Some(widest) = candidates.iter().copied().max_by_key(|u| u.max_connections) else {
        return Ok(());
    };
    let mut connections: usize = picks.iter().map(|u| u.max_connections as usize).sum();
    while connections < requirement.indoor_count {
        if picks.len() >= requirement.max_units as usize {
            return Err(CalcError::sizing_impossible(
                STAGE,
                format!(
                    "{} units accept {connections} indoor units but {} are required",
                    requirement.max_units, requirement.indoor_count
                ),
            ));
        }
        let shortfall = requirement.indoor_count - connections;
        let unit = candidates
            .iter()
            .copied()
            .find(|u| u.max_connections as usize >= shortfall)
            .unwrap_or(widest);
        tracing::trace!(model = %unit.model, shortfall, "connection top-up");
        connections += unit.max_connections as usize;
        picks.push(unit);
    }
    Ok(())
}

fn consolidate(picks: &[&OutdoorUnitModel]) -> Vec<OutdoorAssignment> {
    let mut assignments: Vec<OutdoorAssignment> = Vec::new();
    for unit in picks {
        match assignments.iter_mut().find(|a| a.model == unit.model) {
            Some(existing) => existing.quantity += 1,
            None => assignments.push(OutdoorAssignment {
                model: unit.model.clone(),
                quantity: 1,
                unit_capacity_btuh: unit.capacity_btuh,
                unit_hp: unit.nominal_hp,
                max_connections: unit.max_connections,
                unit_price: unit.price,
            }),
        }
    }
    assignments.sort_by(|a, b| {
        b.unit_capacity_btuh
            .total_cmp(&a.unit_capacity_btuh)
            .then_with(|| a.model.cmp(&b.model))
    });
    assignments
}

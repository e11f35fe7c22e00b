//! Indoor-unit stage: one unit per room.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::reference::{EquipmentCatalog, IndoorMounting, IndoorUnitModel};
use crate::units::ratio_or_zero;

/// Indoor unit chosen for one room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndoorAssignment {
    pub floor: String,
    pub room: String,
    pub required_btuh: f64,
    pub model: String,
    pub mounting: IndoorMounting,
    pub capacity_btuh: f64,
    pub price: f64,
    /// (capacity − required) / required
    pub oversizing: f64,
    /// The preferred mounting had no model large enough
    pub fallback: bool,
}

/// Smallest model whose capacity covers `required_btuh`.
///
/// Models of `preferred` are tried first; any other mounting is used when
/// none of them is large enough, and the assignment is flagged. Capacity
/// ties keep catalog order.
///
/// # Errors
///
/// `SizingImpossible` when no model of any mounting is large enough.
pub fn select_indoor_unit(
    catalog: &EquipmentCatalog,
    floor: &str,
    room: &str,
    required_btuh: f64,
    preferred: IndoorMounting,
) -> CalcResult<IndoorAssignment> {
    let preferred_pick = smallest_covering(catalog.indoor_by_mounting(preferred), required_btuh);
    let (model, fallback) = match preferred_pick {
        Some(model) => (model, false),
        None => {
            let model = smallest_covering(catalog.indoor_units().iter(), required_btuh).ok_or_else(|| {
                CalcError::sizing_impossible(
                    "indoor selection",
                    format!("room '{room}' needs {required_btuh:.0} Btu/h, larger than any indoor unit"),
                )
            })?;
            tracing::debug!(room, preferred = %preferred, selected = %model.mounting, "indoor mounting fallback");
            (model, true)
        }
    };

    Ok(IndoorAssignment {
        floor: floor.to_string(),
        room: room.to_string(),
        required_btuh,
        model: model.model.clone(),
        mounting: model.mounting,
        capacity_btuh: model.capacity_btuh,
        price: model.price,
        oversizing: ratio_or_zero(model.capacity_btuh - required_btuh, required_btuh),
        fallback,
    })
}

fn smallest_covering<'c>(
    models: impl Iterator<Item = &'c IndoorUnitModel>,
    required_btuh: f64,
) -> Option<&'c IndoorUnitModel> {
    models
        .filter(|m| m.capacity_btuh >= required_btuh)
        .fold(None, |best: Option<&IndoorUnitModel>, m| match best {
            Some(b) if b.capacity_btuh <= m.capacity_btuh => Some(b),
            _ => Some(m),
        })
}

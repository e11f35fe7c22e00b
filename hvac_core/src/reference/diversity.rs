//! Diversity-factor bands.
//!
//! The factor for an aggregate of `n` members is the factor of the first
//! band whose `up_to` bound is ≥ n (a band without a bound catches the
//! rest), plus the usage-category offset, clamped to `[minimum, 1.0]`.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::reference::climate::UsageCategory;

/// One band of the diversity table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiversityBand {
    /// Inclusive upper member count; `None` for the last band
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_to: Option<u32>,
    pub factor: f64,
}

/// Offset added to the band factor for a usage category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiversityAdjustment {
    pub usage: UsageCategory,
    pub offset: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiversityTable {
    /// Floor for any looked-up factor
    pub minimum: f64,
    /// Ordered by ascending `up_to`
    pub bands: Vec<DiversityBand>,
    #[serde(default)]
    pub adjustments: Vec<DiversityAdjustment>,
}

impl Default for DiversityTable {
    /// A single band of 1.0 (no diversity)
    fn default() -> Self {
        DiversityTable {
            minimum: 0.65,
            bands: vec![DiversityBand { up_to: None, factor: 1.0 }],
            adjustments: Vec::new(),
        }
    }
}

impl DiversityTable {
    /// Diversity factor for `members` simultaneous loads of `usage`.
    ///
    /// Always within `(0, 1]`; zero or one member yields the first band.
    pub fn factor(&self, members: usize, usage: UsageCategory) -> f64 {
        let count = u32::try_from(members).unwrap_or(u32::MAX);
        let base = self
            .bands
            .iter()
            .find(|band| band.up_to.map_or(true, |limit| count <= limit))
            .or(self.bands.last())
            .map_or(1.0, |band| band.factor);
        let offset = self
            .adjustments
            .iter()
            .find(|a| a.usage == usage)
            .map_or(0.0, |a| a.offset);
        (base + offset).clamp(self.minimum, 1.0)
    }

    pub(crate) fn validate(&self) -> CalcResult<()> {
        if !(self.minimum > 0.0 && self.minimum <= 1.0) {
            return Err(CalcError::reference_data(
                "diversity",
                format!("minimum {} must be within (0, 1]", self.minimum),
            ));
        }
        if self.bands.is_empty() {
            return Err(CalcError::reference_data("diversity", "at least one band is required"));
        }
        let mut previous: Option<u32> = None;
        for (i, band) in self.bands.iter().enumerate() {
            if !(band.factor > 0.0 && band.factor <= 1.0) {
                return Err(CalcError::reference_data(
                    "diversity.bands",
                    format!("band {i}: factor {} must be within (0, 1]", band.factor),
                ));
            }
            match (previous, band.up_to) {
                (Some(prev), Some(limit)) if limit <= prev => {
                    return Err(CalcError::reference_data(
                        "diversity.bands",
                        format!("band {i}: bounds must ascend"),
                    ));
                }
                (_, None) if i + 1 != self.bands.len() => {
                    return Err(CalcError::reference_data(
                        "diversity.bands",
                        format!("band {i}: only the last band may be unbounded"),
                    ));
                }
                _ => {}
            }
            previous = band.up_to;
        }
        Ok(())
    }
}

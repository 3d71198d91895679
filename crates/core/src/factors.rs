//! Correction factor model for the Effective Availability Factor (FDE)
//!
//! Four multiplicative factors take theoretical residue production down to
//! the volume that can realistically feed a biogas plant:
//!
//! - **FC** (Collection): fraction of generated residue that is physically collected
//! - **FCp** (Competition): fraction of collected residue diverted to other uses
//!   (animal feed, boiler fuel, fertiliser)
//! - **FS** (Seasonality): correction for non-uniform availability over the year
//! - **FL** (Logistics): fraction economically transportable to a plant
//!
//! Ranges follow the SAF (Surplus Availability Factor) methodology used by the
//! atlas. Factor values are plain `f64` so that the calculator can be fed
//! anything; [`CorrectionFactors::validate`] and [`CorrectionFactors::clamped`]
//! are the explicit ways to enforce the ranges.

use crate::error::FactorError;
use serde::{Deserialize, Serialize};

/// Factor range constants.
///
/// All bounds are inclusive. Every factor moves in steps of 0.01.
pub mod factor_ranges {
    use super::FactorRange;

    /// FC: `[0.55, 0.95]`. Nobody collects everything, nobody collects under half.
    pub const COLLECTION: FactorRange = FactorRange::new(0.55, 0.95, 0.01);

    /// FCp: `[0.0, 1.0]`. A residue can be entirely committed to another market.
    pub const COMPETITION: FactorRange = FactorRange::new(0.0, 1.0, 0.01);

    /// FS: `[0.70, 1.00]`
    pub const SEASONALITY: FactorRange = FactorRange::new(0.70, 1.00, 0.01);

    /// FL: `[0.65, 1.00]`
    pub const LOGISTICS: FactorRange = FactorRange::new(0.65, 1.00, 0.01);
}

/// Identifier of one correction factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    /// FC
    Collection,
    /// FCp
    Competition,
    /// FS
    Seasonality,
    /// FL
    Logistics,
}

impl Factor {
    /// All factors in the order they are applied by the cascade
    pub const ALL: [Factor; 4] = [
        Factor::Collection,
        Factor::Competition,
        Factor::Seasonality,
        Factor::Logistics,
    ];

    /// Field key used in config files and the C ABI (`fc`, `fcp`, `fs`, `fl`)
    pub fn key(self) -> &'static str {
        match self {
            Factor::Collection => "fc",
            Factor::Competition => "fcp",
            Factor::Seasonality => "fs",
            Factor::Logistics => "fl",
        }
    }

    /// Look up a factor by its field key
    pub fn from_key(key: &str) -> Option<Factor> {
        Factor::ALL
            .into_iter()
            .find(|f| f.key().eq_ignore_ascii_case(key.trim()))
    }

    /// Methodology symbol (`FC`, `FCp`, `FS`, `FL`)
    pub fn symbol(self) -> &'static str {
        match self {
            Factor::Collection => "FC",
            Factor::Competition => "FCp",
            Factor::Seasonality => "FS",
            Factor::Logistics => "FL",
        }
    }

    /// Short label for input widgets, e.g. `FC (Collection)`
    pub fn label(self) -> &'static str {
        match self {
            Factor::Collection => "FC (Collection)",
            Factor::Competition => "FCp (Competition)",
            Factor::Seasonality => "FS (Seasonality)",
            Factor::Logistics => "FL (Logistics)",
        }
    }

    /// Valid range and step for this factor
    pub fn range(self) -> FactorRange {
        match self {
            Factor::Collection => factor_ranges::COLLECTION,
            Factor::Competition => factor_ranges::COMPETITION,
            Factor::Seasonality => factor_ranges::SEASONALITY,
            Factor::Logistics => factor_ranges::LOGISTICS,
        }
    }

    /// Colour used for this factor's loss branch in charts
    pub fn color(self) -> &'static str {
        match self {
            Factor::Collection => "#DC143C",
            Factor::Competition => "#8B4513",
            Factor::Seasonality => "#CD853F",
            Factor::Logistics => "#A0522D",
        }
    }

    /// Methodology documentation and literature references
    pub fn documentation(self) -> FactorDocumentation {
        match self {
            Factor::Collection => FactorDocumentation {
                factor: self,
                name: "Collection Factor (FC)",
                description: "Efficiency of residue collection from the point of generation to the point of processing",
                context: "Depends on collection infrastructure, mechanisation and the geographic dispersion of the source",
                typical_range: self.range(),
                references: &[
                    "UNICA (2023) - Technical report on bagasse management",
                    "Silva et al. (2021) - Collection efficiency in São Paulo mills",
                ],
            },
            Factor::Competition => FactorDocumentation {
                factor: self,
                name: "Competition Factor (FCp)",
                description: "Share of collected residue that goes to uses other than biogas",
                context: "Includes animal feed, fertiliser, industrial feedstock and boiler fuel",
                typical_range: self.range(),
                references: &[
                    "CEPEA/ESALQ - Market prices for by-products",
                    "Scarlat et al. (2010) - European RPR methodology",
                ],
            },
            Factor::Seasonality => FactorDocumentation {
                factor: self,
                name: "Seasonality Factor (FS)",
                description: "Adjustment for availability that varies over the year",
                context: "Seasonal crops such as sugarcane (April to November) versus livestock (constant)",
                typical_range: self.range(),
                references: &[
                    "CONAB - Agricultural calendar and harvest periods",
                    "Gonzalez-Salazar et al. (2014) - Monte Carlo analysis",
                ],
            },
            Factor::Logistics => FactorDocumentation {
                factor: self,
                name: "Logistics Factor (FL)",
                description: "Economic viability of transport to the biogas plant",
                context: "Based on typical distance, freight cost and the value of the biogas",
                typical_range: self.range(),
                references: &[
                    "ANTT - Freight cost tables",
                    "ABiogas (2020) - National biogas potential",
                ],
            },
        }
    }
}

impl std::fmt::Display for Factor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Inclusive range and adjustment step of a factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorRange {
    /// Lower bound (inclusive)
    pub min: f64,
    /// Upper bound (inclusive)
    pub max: f64,
    /// Adjustment granularity for input widgets
    pub step: f64,
}

impl FactorRange {
    /// Create a range
    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        FactorRange { min, max, step }
    }

    /// True when `value` lies within `[min, max]`
    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Clamp into the range and round to the nearest step.
    ///
    /// NaN is returned unchanged.
    pub fn snap(&self, value: f64) -> f64 {
        let stepped = (value / self.step).round() * self.step;
        stepped.clamp(self.min, self.max)
    }
}

/// Documentation for one factor
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FactorDocumentation {
    /// Factor documented
    pub factor: Factor,
    /// Display name
    pub name: &'static str,
    /// What the factor measures
    pub description: &'static str,
    /// What drives its value in practice
    pub context: &'static str,
    /// Typical range (the validation range)
    pub typical_range: FactorRange,
    /// Literature references
    pub references: &'static [&'static str],
}

/// Lookup over the fixed factor table
pub fn get_range(factor: Factor) -> FactorRange {
    factor.range()
}

/// Lookup over the fixed documentation table
pub fn get_documentation(factor: Factor) -> FactorDocumentation {
    factor.documentation()
}

/// The four correction factors applied to theoretical production
///
/// # Example
/// ```
/// use biogas_atlas_core::{CorrectionFactors, Factor};
///
/// let factors = CorrectionFactors::default().with(Factor::Competition, 0.5);
/// assert_eq!(factors.fcp, 0.5);
/// assert!(factors.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectionFactors {
    /// Collection factor
    pub fc: f64,
    /// Competition factor (share diverted)
    pub fcp: f64,
    /// Seasonality factor
    pub fs: f64,
    /// Logistics factor
    pub fl: f64,
}

impl Default for CorrectionFactors {
    /// The realistic scenario
    fn default() -> Self {
        CorrectionFactors::REALISTIC
    }
}

impl CorrectionFactors {
    /// Literature-based values validated against field data
    pub const REALISTIC: CorrectionFactors = CorrectionFactors::new(0.85, 0.30, 0.85, 0.80);

    /// Create a factor tuple without validation
    pub const fn new(fc: f64, fcp: f64, fs: f64, fl: f64) -> Self {
        CorrectionFactors { fc, fcp, fs, fl }
    }

    /// Create a factor tuple, rejecting non-finite or out-of-range values
    ///
    /// # Errors
    /// Returns the first failing factor in [`Factor::ALL`] order.
    pub fn validated(fc: f64, fcp: f64, fs: f64, fl: f64) -> Result<Self, FactorError> {
        let factors = CorrectionFactors::new(fc, fcp, fs, fl);
        factors.validate()?;
        Ok(factors)
    }

    /// Value of one factor
    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Collection => self.fc,
            Factor::Competition => self.fcp,
            Factor::Seasonality => self.fs,
            Factor::Logistics => self.fl,
        }
    }

    /// Copy with one factor replaced
    pub fn with(mut self, factor: Factor, value: f64) -> Self {
        match factor {
            Factor::Collection => self.fc = value,
            Factor::Competition => self.fcp = value,
            Factor::Seasonality => self.fs = value,
            Factor::Logistics => self.fl = value,
        }
        self
    }

    /// Check every factor against its range
    ///
    /// # Errors
    /// [`FactorError::NonFinite`] or [`FactorError::OutOfRange`] for the first
    /// failing factor in [`Factor::ALL`] order.
    pub fn validate(&self) -> Result<(), FactorError> {
        for factor in Factor::ALL {
            let value = self.get(factor);
            if !value.is_finite() {
                return Err(FactorError::NonFinite { factor });
            }
            let range = factor.range();
            if !range.contains(value) {
                return Err(FactorError::OutOfRange {
                    factor,
                    value,
                    range,
                });
            }
        }
        Ok(())
    }

    /// True when [`validate`](Self::validate) succeeds
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Copy with every factor clamped into its range and snapped to its step.
    ///
    /// Non-finite values fall back to the realistic default for that factor.
    pub fn clamped(&self) -> Self {
        Factor::ALL
            .into_iter()
            .fold(*self, |acc, factor| {
                let value = self.get(factor);
                let fixed = if value.is_finite() {
                    factor.range().snap(value)
                } else {
                    CorrectionFactors::REALISTIC.get(factor)
                };
                acc.with(factor, fixed)
            })
    }
}

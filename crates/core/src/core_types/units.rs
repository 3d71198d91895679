//! Semantic unit types for residue volumes and percentages
//!
//! Theoretical residue production is reported either in tonnes per year (solid
//! residues such as bagasse or manure) or in cubic metres per year (vinasse,
//! sewage sludge). The calculator itself is unit-agnostic, so the unit travels
//! with the amount to stop a tonnes figure being added to a cubic-metre one.
//!
//! # Design Philosophy
//! - f64 everywhere: volumes for a whole state reach 10^8 and factor products
//!   are compared against exact expectations
//! - Arithmetic between two volumes asserts matching units
//! - Scaling by a plain ratio keeps the unit
//! - Serde support for serialization
//!
//! # Usage
//! ```
//! use biogas_atlas_core::core_types::units::{Volume, VolumeUnit};
//!
//! let theoretical = Volume::tonnes_per_year(1_000_000.0);
//! let collected = theoretical * 0.85;
//! assert_eq!(collected.unit(), VolumeUnit::TonnesPerYear);
//! assert!((*collected - 850_000.0).abs() < 1e-6);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Deref, Div, Mul, Neg, Sub};

// ============================================================================
// VOLUME UNITS
// ============================================================================

/// Unit in which an annual residue volume is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeUnit {
    /// Mass basis, used for solid residues
    #[default]
    TonnesPerYear,
    /// Volumetric basis, used for liquid effluents
    CubicMetersPerYear,
}

impl VolumeUnit {
    /// Short display symbol
    pub fn symbol(self) -> &'static str {
        match self {
            VolumeUnit::TonnesPerYear => "t/yr",
            VolumeUnit::CubicMetersPerYear => "m³/yr",
        }
    }

    /// Parse a unit name as written on the command line or in config files.
    ///
    /// Accepts `tonnes`, `t`, `t/yr`, `tonnes_per_year`, `m3`, `m3/yr`,
    /// `cubic_meters_per_year` (case-insensitive).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "t" | "tonnes" | "t/yr" | "tonnes_per_year" => Some(VolumeUnit::TonnesPerYear),
            "m3" | "m³" | "m3/yr" | "m³/yr" | "cubic_meters_per_year" => {
                Some(VolumeUnit::CubicMetersPerYear)
            }
            _ => None,
        }
    }
}

impl fmt::Display for VolumeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// ============================================================================
// VOLUME
// ============================================================================

/// Annual residue volume with an explicit unit
///
/// The amount is not range checked: a non-positive theoretical volume is the
/// empty-state signal understood by the calculator, and loss stages carry
/// negative amounts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    amount: f64,
    unit: VolumeUnit,
}

impl Deref for Volume {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.amount
    }
}

impl PartialOrd for Volume {
    /// Volumes in different units are incomparable.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.unit == other.unit {
            self.amount.partial_cmp(&other.amount)
        } else {
            None
        }
    }
}

impl Volume {
    /// Create a volume in the given unit
    #[inline]
    #[must_use]
    pub const fn new(amount: f64, unit: VolumeUnit) -> Self {
        Volume { amount, unit }
    }

    /// Create a volume in tonnes per year
    #[inline]
    #[must_use]
    pub const fn tonnes_per_year(amount: f64) -> Self {
        Volume::new(amount, VolumeUnit::TonnesPerYear)
    }

    /// Create a volume in cubic metres per year
    #[inline]
    #[must_use]
    pub const fn cubic_meters_per_year(amount: f64) -> Self {
        Volume::new(amount, VolumeUnit::CubicMetersPerYear)
    }

    /// Zero volume in the given unit
    #[inline]
    #[must_use]
    pub const fn zero(unit: VolumeUnit) -> Self {
        Volume::new(0.0, unit)
    }

    /// Get the raw amount
    #[inline]
    #[must_use]
    pub fn amount(self) -> f64 {
        self.amount
    }

    /// Unit of this volume
    #[inline]
    #[must_use]
    pub fn unit(self) -> VolumeUnit {
        self.unit
    }

    /// True when the amount is strictly positive (NaN is not positive)
    #[inline]
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.amount > 0.0
    }

    /// Magnitude of this volume, same unit
    #[inline]
    #[must_use]
    pub fn abs(self) -> Volume {
        Volume::new(self.amount.abs(), self.unit)
    }

    /// Larger of this volume and `floor` (same unit)
    #[inline]
    #[must_use]
    pub fn at_least(self, floor: f64) -> Volume {
        Volume::new(self.amount.max(floor), self.unit)
    }

    /// Fraction of `whole` represented by this volume, as a percentage.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn percent_of(self, whole: Volume) -> Percent {
        Percent::new(self / whole * 100.0)
    }

    #[track_caller]
    fn assert_same_unit(self, other: Volume, op: &str) {
        assert!(
            self.unit == other.unit,
            "Volume::{op}: unit mismatch ({} vs {})",
            self.unit,
            other.unit
        );
    }
}

impl Add for Volume {
    type Output = Volume;
    #[track_caller]
    fn add(self, rhs: Volume) -> Volume {
        self.assert_same_unit(rhs, "add");
        Volume::new(self.amount + rhs.amount, self.unit)
    }
}

impl Sub for Volume {
    type Output = Volume;
    #[track_caller]
    fn sub(self, rhs: Volume) -> Volume {
        self.assert_same_unit(rhs, "sub");
        Volume::new(self.amount - rhs.amount, self.unit)
    }
}

impl Neg for Volume {
    type Output = Volume;
    fn neg(self) -> Volume {
        Volume::new(-self.amount, self.unit)
    }
}

impl Mul<f64> for Volume {
    type Output = Volume;
    fn mul(self, rhs: f64) -> Volume {
        Volume::new(self.amount * rhs, self.unit)
    }
}

impl Mul<Volume> for f64 {
    type Output = Volume;
    fn mul(self, rhs: Volume) -> Volume {
        rhs * self
    }
}

impl Div<f64> for Volume {
    type Output = Volume;
    fn div(self, rhs: f64) -> Volume {
        Volume::new(self.amount / rhs, self.unit)
    }
}

/// Ratio of two volumes in the same unit
impl Div<Volume> for Volume {
    type Output = f64;
    #[track_caller]
    fn div(self, rhs: Volume) -> f64 {
        self.assert_same_unit(rhs, "div");
        self.amount / rhs.amount
    }
}

impl PartialEq<f64> for Volume {
    fn eq(&self, other: &f64) -> bool {
        self.amount == *other
    }
}

impl PartialOrd<f64> for Volume {
    fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
        self.amount.partial_cmp(other)
    }
}

impl From<Volume> for f64 {
    fn from(v: Volume) -> f64 {
        v.amount
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.unit)
    }
}

// ============================================================================
// PERCENT
// ============================================================================

/// Percentage value, unbounded
///
/// Loss stages report negative percentages of the theoretical volume.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Percent(f64);

impl Eq for Percent {}

impl PartialOrd for Percent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Percent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Deref for Percent {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Percent {
    /// Create a new percentage
    #[inline]
    #[must_use]
    pub const fn new(value: f64) -> Self {
        Percent(value)
    }

    /// Build from a 0-1 ratio
    #[inline]
    #[must_use]
    pub fn from_ratio(ratio: f64) -> Self {
        Percent(ratio * 100.0)
    }

    /// Get the raw f64 value
    #[inline]
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Convert to a 0-1 ratio
    #[inline]
    #[must_use]
    pub fn to_ratio(self) -> f64 {
        self.0 / 100.0
    }
}

impl From<f64> for Percent {
    fn from(v: f64) -> Self {
        Percent(v)
    }
}

impl From<Percent> for f64 {
    fn from(p: Percent) -> f64 {
        p.0
    }
}

impl Neg for Percent {
    type Output = Percent;
    fn neg(self) -> Percent {
        Percent(-self.0)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaling_keeps_unit() {
        let v = Volume::cubic_meters_per_year(200.0);
        let scaled = v * 0.5;
        assert_eq!(scaled.unit(), VolumeUnit::CubicMetersPerYear);
        assert_eq!(*scaled, 100.0);
    }

    #[test]
    fn test_volume_ratio() {
        let a = Volume::tonnes_per_year(250.0);
        let b = Volume::tonnes_per_year(1000.0);
        assert!((a / b - 0.25).abs() < 1e-12);
        assert!((*a.percent_of(b) - 25.0).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "Volume::add: unit mismatch")]
    fn test_add_panics_on_unit_mismatch() {
        let _ = Volume::tonnes_per_year(1.0) + Volume::cubic_meters_per_year(1.0);
    }

    #[test]
    #[should_panic(expected = "Volume::div: unit mismatch")]
    fn test_ratio_panics_on_unit_mismatch() {
        let _ = Volume::tonnes_per_year(1.0) / Volume::cubic_meters_per_year(1.0);
    }

    #[test]
    fn test_volumes_in_different_units_are_incomparable() {
        let a = Volume::tonnes_per_year(1.0);
        let b = Volume::cubic_meters_per_year(2.0);
        assert_eq!(a.partial_cmp(&b), None);
        assert!(Volume::tonnes_per_year(1.0) < Volume::tonnes_per_year(2.0));
    }

    #[test]
    fn test_is_positive() {
        assert!(Volume::tonnes_per_year(0.1).is_positive());
        assert!(!Volume::tonnes_per_year(0.0).is_positive());
        assert!(!Volume::tonnes_per_year(-5.0).is_positive());
        assert!(!Volume::tonnes_per_year(f64::NAN).is_positive());
    }

    #[test]
    fn test_at_least_floor() {
        let v = Volume::tonnes_per_year(0.0).at_least(1.0);
        assert_eq!(*v, 1.0);
        let v = Volume::tonnes_per_year(42.0).at_least(1.0);
        assert_eq!(*v, 42.0);
    }

    #[test]
    fn test_unit_parse() {
        assert_eq!(VolumeUnit::parse("Tonnes"), Some(VolumeUnit::TonnesPerYear));
        assert_eq!(VolumeUnit::parse("m3"), Some(VolumeUnit::CubicMetersPerYear));
        assert_eq!(VolumeUnit::parse("litres"), None);
    }

    #[test]
    fn test_percent_display() {
        assert_eq!(Percent::from_ratio(0.4046).to_string(), "40.5%");
        assert!((Percent::new(25.0).to_ratio() - 0.25).abs() < 1e-12);
    }
}

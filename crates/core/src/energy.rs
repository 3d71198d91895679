//! Residue-specific energy potential and FDE category bands

use serde::{Deserialize, Serialize};

/// Energy content of methane (kWh per m³)
pub const METHANE_ENERGY_KWH_PER_M3: f64 = 9.97;

const KWH_PER_TWH: f64 = 1_000_000_000.0;

/// Biogas volume and energy obtainable from one residue
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyPotential {
    /// Biogas volume (m³/yr)
    pub biogas_m3: f64,
    /// Energy (kWh/yr)
    pub energy_kwh: f64,
    /// Energy (TWh/yr)
    pub energy_twh: f64,
}

/// Energy potential of a residue.
///
/// `biogas = production × fde × bmp × vs`
///
/// # Arguments
/// * `production_tonnes` - Annual production (t/yr)
/// * `fde` - Effective availability factor
/// * `bmp_m3_per_tonne_vs` - Biochemical methane potential (m³ per tonne of volatile solids)
/// * `vs_content` - Volatile solids content (0-1)
pub fn calculate_energy_potential(
    production_tonnes: f64,
    fde: f64,
    bmp_m3_per_tonne_vs: f64,
    vs_content: f64,
) -> EnergyPotential {
    let biogas_m3 = production_tonnes * fde * bmp_m3_per_tonne_vs * vs_content;
    let energy_kwh = biogas_m3 * METHANE_ENERGY_KWH_PER_M3;
    EnergyPotential {
        biogas_m3,
        energy_kwh,
        energy_twh: energy_kwh / KWH_PER_TWH,
    }
}

/// Band an FDE value falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FdeCategory {
    /// FDE >= 0.15
    High,
    /// 0.08 <= FDE < 0.15
    Medium,
    /// 0 < FDE < 0.08
    Low,
    /// FDE == 0: residue fully committed elsewhere
    Excluded,
}

impl FdeCategory {
    /// Lower bound of [`FdeCategory::High`]
    pub const HIGH_THRESHOLD: f64 = 0.15;
    /// Lower bound of [`FdeCategory::Medium`]
    pub const MEDIUM_THRESHOLD: f64 = 0.08;

    /// Categorise an FDE value
    pub fn from_fde(fde: f64) -> FdeCategory {
        if fde == 0.0 {
            FdeCategory::Excluded
        } else if fde >= Self::HIGH_THRESHOLD {
            FdeCategory::High
        } else if fde >= Self::MEDIUM_THRESHOLD {
            FdeCategory::Medium
        } else {
            FdeCategory::Low
        }
    }

    /// Display label
    pub fn label(self) -> &'static str {
        match self {
            FdeCategory::High => "High",
            FdeCategory::Medium => "Medium",
            FdeCategory::Low => "Low",
            FdeCategory::Excluded => "Excluded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_energy_potential() {
        // 10 kt/yr cattle manure, FDE 0.5, BMP 200 m³/t VS, 80% VS
        let e = calculate_energy_potential(10_000.0, 0.5, 200.0, 0.8);
        assert_relative_eq!(e.biogas_m3, 800_000.0, epsilon = 1e-6);
        assert_relative_eq!(e.energy_kwh, 7_976_000.0, epsilon = 1e-4);
        assert_relative_eq!(e.energy_twh, 0.007976, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_fde_gives_no_energy() {
        let e = calculate_energy_potential(10_000.0, 0.0, 200.0, 0.8);
        assert_eq!(e.energy_twh, 0.0);
    }

    #[test]
    fn test_category_bands() {
        assert_eq!(FdeCategory::from_fde(0.0), FdeCategory::Excluded);
        assert_eq!(FdeCategory::from_fde(0.15), FdeCategory::High);
        assert_eq!(FdeCategory::from_fde(0.4046), FdeCategory::High);
        assert_eq!(FdeCategory::from_fde(0.08), FdeCategory::Medium);
        assert_eq!(FdeCategory::from_fde(0.1499), FdeCategory::Medium);
        assert_eq!(FdeCategory::from_fde(0.01), FdeCategory::Low);
    }
}

use biogas_atlas_core::{calculate_fde, CorrectionFactors, Factor, FactorRange};

use crate::error::{AtlasErrorCode, DefaultAtlasError};
use crate::helpers::handle_ffi_result;

/// FFI mirror of the four correction factors.
/// Keep this layout stable for C/C++/C# consumers.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasFactors {
    /// Collection factor (0.55 - 0.95).
    pub fc: f64,

    /// Competition factor, the diverted fraction (0.0 - 1.0).
    pub fcp: f64,

    /// Seasonality factor (0.70 - 1.00).
    pub fs: f64,

    /// Logistics factor (0.65 - 1.00).
    pub fl: f64,
}

impl From<AtlasFactors> for CorrectionFactors {
    fn from(f: AtlasFactors) -> Self {
        CorrectionFactors::new(f.fc, f.fcp, f.fs, f.fl)
    }
}

impl From<CorrectionFactors> for AtlasFactors {
    fn from(f: CorrectionFactors) -> Self {
        Self {
            fc: f.fc,
            fcp: f.fcp,
            fs: f.fs,
            fl: f.fl,
        }
    }
}

/// Values accepted by `atlas_factor_range`.
///
/// Passed across the boundary as a plain `uint32_t`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtlasFactor {
    Collection = 0,
    Competition = 1,
    Seasonality = 2,
    Logistics = 3,
}

impl AtlasFactor {
    /// Map a raw value from C onto a factor; unknown values give `None`.
    fn from_raw(raw: u32) -> Option<Factor> {
        match raw {
            x if x == AtlasFactor::Collection as u32 => Some(Factor::Collection),
            x if x == AtlasFactor::Competition as u32 => Some(Factor::Competition),
            x if x == AtlasFactor::Seasonality as u32 => Some(Factor::Seasonality),
            x if x == AtlasFactor::Logistics as u32 => Some(Factor::Logistics),
            _ => None,
        }
    }
}

/// Allowed interval and slider step for one factor.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasFactorRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl From<FactorRange> for AtlasFactorRange {
    fn from(r: FactorRange) -> Self {
        Self {
            min: r.min,
            max: r.max,
            step: r.step,
        }
    }
}

/// Compute `FDE = FC × (1 − FCp) × FS × FL`.
///
/// Out-of-range inputs are computed as given; call `atlas_validate_factors`
/// first when the caller needs a guaranteed [0, 1] result.
#[no_mangle]
pub extern "C" fn atlas_calculate_fde(factors: AtlasFactors) -> f64 {
    calculate_fde(&factors.into())
}

/// Check every factor against its documented range.
///
/// Returns `InvalidFactors` naming the first offending factor via
/// `atlas_get_last_error`, or `Ok`.
#[no_mangle]
pub extern "C" fn atlas_validate_factors(factors: AtlasFactors) -> AtlasErrorCode {
    handle_ffi_result(|| {
        CorrectionFactors::from(factors)
            .validate()
            .map_err(|e| DefaultAtlasError::invalid_factors(&e))
    })
}

/// Snap factors onto their slider grid inside the documented ranges.
/// Non-finite values fall back to the realistic preset.
#[no_mangle]
pub extern "C" fn atlas_clamp_factors(factors: AtlasFactors) -> AtlasFactors {
    CorrectionFactors::from(factors).clamped().into()
}

#[no_mangle]
/// Range metadata for a factor.
///
/// - `factor` is one of the `AtlasFactor` values (0-3).
/// - Returns `InvalidParameter` for any other value and leaves `out_range` untouched.
///
/// # Safety
/// `out_range` must be null or valid for one `AtlasFactorRange` write.
pub unsafe extern "C" fn atlas_factor_range(
    factor: u32,
    out_range: *mut AtlasFactorRange,
) -> AtlasErrorCode {
    handle_ffi_result(|| {
        let factor = AtlasFactor::from_raw(factor).ok_or_else(|| {
            DefaultAtlasError::invalid_parameter(
                "factor",
                &format!("unknown factor {factor}, expected 0-3"),
            )
        })?;
        if out_range.is_null() {
            return Err(DefaultAtlasError::null_pointer("out_range"));
        }
        // SAFETY: checked non-null; validity is the caller's contract.
        unsafe { *out_range = factor.range().into() };
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::atlas_get_last_error_code;
    use approx::assert_relative_eq;

    const REALISTIC: AtlasFactors = AtlasFactors {
        fc: 0.85,
        fcp: 0.30,
        fs: 0.85,
        fl: 0.80,
    };

    #[test]
    fn test_calculate_fde_matches_core() {
        assert_relative_eq!(atlas_calculate_fde(REALISTIC), 0.4046, epsilon = 1e-9);
    }

    #[test]
    fn test_validate_sets_last_error() {
        let bad = AtlasFactors { fc: 0.99, ..REALISTIC };
        assert_eq!(atlas_validate_factors(bad), AtlasErrorCode::InvalidFactors);
        assert_eq!(atlas_get_last_error_code(), AtlasErrorCode::InvalidFactors);

        assert_eq!(atlas_validate_factors(REALISTIC), AtlasErrorCode::Ok);
        assert_eq!(atlas_get_last_error_code(), AtlasErrorCode::Ok);
    }

    #[test]
    fn test_clamp_lands_in_range() {
        let clamped = atlas_clamp_factors(AtlasFactors {
            fc: 1.4,
            fcp: -0.2,
            fs: 0.5,
            fl: f64::NAN,
        });
        assert_eq!(atlas_validate_factors(clamped), AtlasErrorCode::Ok);
        assert_relative_eq!(clamped.fc, 0.95);
        assert_relative_eq!(clamped.fcp, 0.0);
        assert_relative_eq!(clamped.fs, 0.70);
        assert_relative_eq!(clamped.fl, 0.80);
    }

    fn blank_range() -> AtlasFactorRange {
        AtlasFactorRange {
            min: 0.0,
            max: 0.0,
            step: 0.0,
        }
    }

    #[test]
    fn test_factor_range() {
        let mut range = blank_range();
        let code = unsafe { atlas_factor_range(AtlasFactor::Logistics as u32, &mut range) };
        assert_eq!(code, AtlasErrorCode::Ok);
        assert_relative_eq!(range.min, 0.65);
        assert_relative_eq!(range.max, 1.00);
        assert_relative_eq!(range.step, 0.01);
    }

    #[test]
    fn test_factor_range_rejects_unknown_factor() {
        let mut range = blank_range();
        let code = unsafe { atlas_factor_range(7, &mut range) };
        assert_eq!(code, AtlasErrorCode::InvalidParameter);
        assert_eq!(atlas_get_last_error_code(), AtlasErrorCode::InvalidParameter);
        assert_eq!(range, blank_range());
    }

    #[test]
    fn test_factor_range_null_out() {
        let code = unsafe { atlas_factor_range(0, std::ptr::null_mut()) };
        assert_eq!(code, AtlasErrorCode::NullPointer);
    }
}

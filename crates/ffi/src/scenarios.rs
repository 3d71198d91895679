use biogas_atlas_core::{calculate_scenario_results, Scenario, ScenarioResult, Volume};

use crate::error::AtlasErrorCode;
use crate::helpers::{check_theoretical, handle_ffi_result, reset_len, write_slice};

/// Number of built-in scenarios.
pub const ATLAS_BUILTIN_SCENARIOS: usize = 4;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
/// FFI snapshot of one scenario evaluation.
pub struct AtlasScenarioResult {
    /// 0 optimistic, 1 realistic, 2 conservative, 3 pessimistic.
    pub scenario_index: u32,

    /// Effective availability factor (0.0 - 1.0).
    pub fde: f64,

    /// Theoretical volume times FDE.
    pub available_volume: f64,

    /// Available volume times the fixed biogas yield.
    pub biogas_potential: f64,

    /// FDE as a percentage.
    pub percentage: f64,
}

impl AtlasScenarioResult {
    fn from_result(index: usize, result: &ScenarioResult) -> Self {
        Self {
            scenario_index: u32::try_from(index).unwrap_or(u32::MAX),
            fde: result.fde,
            available_volume: *result.available_volume,
            biogas_potential: result.biogas_potential,
            percentage: result.percentage.value(),
        }
    }
}

#[no_mangle]
/// Evaluate the four built-in scenarios against a theoretical volume.
///
/// - Results are written in built-in order (optimistic first).
/// - Returns `EmptyResult` (with `out_len = 0`) when `theoretical <= 0`.
/// - Returns `BufferTooSmall` when `capacity < 4`; `out_len` still receives 4.
///
/// # Safety
/// - `out_results` must be valid for `capacity` writes.
/// - `out_len` must be a valid pointer to a `usize`.
pub unsafe extern "C" fn atlas_scenario_results(
    theoretical: f64,
    out_results: *mut AtlasScenarioResult,
    capacity: usize,
    out_len: *mut usize,
) -> AtlasErrorCode {
    handle_ffi_result(|| {
        if let Err(e) = check_theoretical(theoretical) {
            // SAFETY: caller guarantees out_len is null or valid.
            unsafe { reset_len(out_len) };
            return Err(e);
        }
        let results =
            calculate_scenario_results(&Scenario::builtin(), Volume::tonnes_per_year(theoretical));
        let snapshots: Vec<AtlasScenarioResult> = results
            .iter()
            .enumerate()
            .map(|(i, r)| AtlasScenarioResult::from_result(i, r))
            .collect();

        // SAFETY: caller guarantees the pointer contracts documented above.
        unsafe { write_slice(&snapshots, out_results, capacity, out_len) }
    })
}

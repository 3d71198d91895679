use biogas_atlas_core::{
    generate_cascade_data, generate_sankey_data, CascadeStage, FlowLink, Volume,
};

use crate::error::{AtlasErrorCode, DefaultAtlasError};
use crate::factors::AtlasFactors;
use crate::helpers::{check_theoretical, handle_ffi_result, reset_len, write_slice};

/// Number of stages in a cascade; a buffer of this size always suffices.
pub const ATLAS_CASCADE_STAGES: usize = 9;

/// Number of links in a flow graph; a buffer of this size always suffices.
pub const ATLAS_FLOW_LINKS: usize = 8;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
/// FFI snapshot of one cascade stage.
pub struct AtlasCascadeStage {
    /// Stage position, 0 (Theoretical) through 8 (Final FDE).
    pub kind: u32,

    /// Stage volume; negative for loss stages.
    pub value: f64,

    /// Whether this stage removes volume.
    pub is_loss: bool,

    /// `value` as a percentage of the theoretical volume.
    pub percentage_of_theoretical: f64,
}

impl From<&CascadeStage> for AtlasCascadeStage {
    fn from(stage: &CascadeStage) -> Self {
        Self {
            kind: stage.kind as u32,
            value: *stage.value,
            is_loss: stage.is_loss,
            percentage_of_theoretical: stage.percentage_of_theoretical.value(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
/// FFI snapshot of one flow link.
pub struct AtlasFlowLink {
    /// Source node index (0-8).
    pub source: usize,

    /// Target node index (0-8).
    pub target: usize,

    /// Exact volume carried by the link.
    pub value: f64,

    /// Volume floored at 1.0 for drawing.
    pub render_value: f64,
}

impl From<&FlowLink> for AtlasFlowLink {
    fn from(link: &FlowLink) -> Self {
        Self {
            source: link.source,
            target: link.target,
            value: *link.value,
            render_value: *link.render_value(),
        }
    }
}

#[no_mangle]
/// Build the nine-stage cascade for a theoretical volume.
///
/// - Writes up to `capacity` stages into `out_stages` and the stage count into `out_len`.
/// - Returns `EmptyResult` (with `out_len = 0`) when `theoretical <= 0`.
/// - Returns `BufferTooSmall` when `capacity < 9`; `out_len` still receives 9.
///
/// # Safety
/// - `out_stages` must be valid for `capacity` writes.
/// - `out_len` must be a valid pointer to a `usize`.
pub unsafe extern "C" fn atlas_generate_cascade(
    theoretical: f64,
    factors: AtlasFactors,
    out_stages: *mut AtlasCascadeStage,
    capacity: usize,
    out_len: *mut usize,
) -> AtlasErrorCode {
    handle_ffi_result(|| {
        if let Err(e) = check_theoretical(theoretical) {
            // SAFETY: caller guarantees out_len is null or valid.
            unsafe { reset_len(out_len) };
            return Err(e);
        }
        let cascade = generate_cascade_data(Volume::tonnes_per_year(theoretical), &factors.into())
            .ok_or_else(|| DefaultAtlasError::empty_result(theoretical))?;
        let stages: Vec<AtlasCascadeStage> = cascade.iter().map(AtlasCascadeStage::from).collect();

        // SAFETY: caller guarantees the pointer contracts documented above.
        unsafe { write_slice(&stages, out_stages, capacity, out_len) }
    })
}

#[no_mangle]
/// Build the flow graph links for a theoretical volume.
///
/// Node indices follow the fixed order: Theoretical Potential, Collection
/// Losses, Collected, Competing Uses, Available, Seasonal Losses, Adjusted,
/// Logistics Losses, Biogas Potential.
///
/// - Returns `EmptyResult` (with `out_len = 0`) when `theoretical <= 0`.
/// - Returns `BufferTooSmall` when `capacity < 8`; `out_len` still receives 8.
///
/// # Safety
/// - `out_links` must be valid for `capacity` writes.
/// - `out_len` must be a valid pointer to a `usize`.
pub unsafe extern "C" fn atlas_generate_flow(
    theoretical: f64,
    factors: AtlasFactors,
    out_links: *mut AtlasFlowLink,
    capacity: usize,
    out_len: *mut usize,
) -> AtlasErrorCode {
    handle_ffi_result(|| {
        if let Err(e) = check_theoretical(theoretical) {
            // SAFETY: caller guarantees out_len is null or valid.
            unsafe { reset_len(out_len) };
            return Err(e);
        }
        let graph = generate_sankey_data(Volume::tonnes_per_year(theoretical), &factors.into())
            .ok_or_else(|| DefaultAtlasError::empty_result(theoretical))?;
        let links: Vec<AtlasFlowLink> = graph.links.iter().map(AtlasFlowLink::from).collect();

        // SAFETY: caller guarantees the pointer contracts documented above.
        unsafe { write_slice(&links, out_links, capacity, out_len) }
    })
}

//! C ABI for the biogas atlas FDE model
//!
//! Every entry point is a pure computation over caller-owned buffers. Errors
//! are returned as [`AtlasErrorCode`] values; the matching message for the
//! last failed call on the current thread is available via
//! [`atlas_get_last_error`].

mod cascade;
mod error;
mod factors;
mod helpers;
mod scenarios;

pub use cascade::{
    atlas_generate_cascade, atlas_generate_flow, AtlasCascadeStage, AtlasFlowLink,
    ATLAS_CASCADE_STAGES, ATLAS_FLOW_LINKS,
};
pub use error::{atlas_get_last_error, atlas_get_last_error_code, AtlasErrorCode};
pub use factors::{
    atlas_calculate_fde, atlas_clamp_factors, atlas_factor_range, atlas_validate_factors,
    AtlasFactor, AtlasFactorRange, AtlasFactors,
};
pub use scenarios::{atlas_scenario_results, AtlasScenarioResult, ATLAS_BUILTIN_SCENARIOS};

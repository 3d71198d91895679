use biogas_atlas_core::FactorError;
use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

/// Common interface for FFI error types.
///
/// - `code()` - Returns the error code to be passed across FFI boundary
/// - `msg()` - Returns the error message for diagnostic purposes
pub(crate) trait AtlasError {
    /// Returns the error code to be returned across the FFI boundary.
    fn code(&self) -> AtlasErrorCode;

    /// Returns the human-readable error message.
    fn msg(&self) -> &str;
}

/// Default implementation of `AtlasError` for the FFI error scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DefaultAtlasError {
    code: AtlasErrorCode,
    msg: String,
}

impl DefaultAtlasError {
    /// Create error for null pointer passed where non-null required.
    ///
    /// # Arguments
    /// * `param_name` - The name of the parameter that was null (e.g., `"out"`, `"out_len"`)
    pub fn null_pointer(param_name: &str) -> Self {
        Self {
            code: AtlasErrorCode::NullPointer,
            msg: format!("Parameter '{param_name}' cannot be null"),
        }
    }

    /// Create error for a theoretical volume that yields no cascade.
    pub fn empty_result(theoretical: f64) -> Self {
        Self {
            code: AtlasErrorCode::EmptyResult,
            msg: format!("Theoretical volume must be positive, got {theoretical}"),
        }
    }

    /// Create error for correction factors that failed validation.
    pub fn invalid_factors(error: &FactorError) -> Self {
        Self {
            code: AtlasErrorCode::InvalidFactors,
            msg: error.to_string(),
        }
    }

    /// Create error for an output buffer shorter than the result.
    ///
    /// # Arguments
    /// * `required` - Number of elements the result needs
    /// * `capacity` - Number of elements the caller provided
    pub fn buffer_too_small(required: usize, capacity: usize) -> Self {
        Self {
            code: AtlasErrorCode::BufferTooSmall,
            msg: format!("Output buffer holds {capacity} elements, {required} required"),
        }
    }

    /// Create error for an invalid parameter.
    pub fn invalid_parameter(param_name: &str, message: &str) -> Self {
        Self {
            code: AtlasErrorCode::InvalidParameter,
            msg: format!("Parameter '{param_name}': {message}"),
        }
    }
}

impl AtlasError for DefaultAtlasError {
    fn code(&self) -> AtlasErrorCode {
        self.code
    }

    fn msg(&self) -> &str {
        &self.msg
    }
}

/// FFI error codes returned by atlas functions.
/// Follows standard C convention: 0 = success, non-zero = error.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtlasErrorCode {
    /// Operation completed successfully.
    Ok = 0,

    /// Invalid pointer: null pointer passed where non-null required.
    NullPointer = 1,

    /// Theoretical volume was zero or negative; callers should show an empty state.
    EmptyResult = 2,

    /// Correction factors are non-finite or outside their documented ranges.
    InvalidFactors = 3,

    /// Output buffer too small; the required length has been written to `out_len`.
    BufferTooSmall = 4,

    /// Invalid parameter passed to function.
    InvalidParameter = 5,
}

impl From<DefaultAtlasError> for AtlasErrorCode {
    fn from(error: DefaultAtlasError) -> Self {
        error.code
    }
}

thread_local! {
    /// Thread-local storage for the most recent FFI error (C string, error code).
    /// The CString is stored to prevent memory leaks when returning raw pointers via FFI.
    static LAST_ERROR: RefCell<(Option<CString>, AtlasErrorCode)> = const { RefCell::new((None, AtlasErrorCode::Ok)) };
}

/// Internal helper to read `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error<F, R>(f: F) -> R
where
    F: FnOnce(&(Option<CString>, AtlasErrorCode)) -> R,
{
    LAST_ERROR.with_borrow(f)
}

/// Internal helper to mutate `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut (Option<CString>, AtlasErrorCode)) -> R,
{
    LAST_ERROR.with_borrow_mut(f)
}

/// Retrieve the most recent FFI error message as a null-terminated C string.
///
/// Returns:
/// - A borrowed pointer to the error message if the last call on this thread failed.
/// - `null` if the last call succeeded.
///
/// # Lifetime
/// The returned pointer is valid until the next atlas call on this thread.
///
/// **DO NOT FREE THIS POINTER** - it is managed internally.
///
/// Example:
/// ```c
/// AtlasCascadeStage stages[9];
/// size_t len = 0;
/// AtlasErrorCode err = atlas_generate_cascade(volume, factors, stages, 9, &len);
/// if (err != Ok) {
///     printf("cascade failed: %s\n", atlas_get_last_error());
/// }
/// ```
#[no_mangle]
pub extern "C" fn atlas_get_last_error() -> *const c_char {
    with_last_error(|(cstring, _code)| cstring.as_ref().map_or(ptr::null(), |cs| cs.as_ptr()))
}

/// Retrieve the most recent FFI error code.
///
/// Returns `AtlasErrorCode::Ok` (0) if the last call on this thread succeeded.
#[no_mangle]
pub extern "C" fn atlas_get_last_error_code() -> AtlasErrorCode {
    with_last_error(|(_cstring, code)| *code)
}

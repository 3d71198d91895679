use crate::error::{with_last_error_mut, AtlasError, AtlasErrorCode, DefaultAtlasError};
use std::ffi::CString;

/// Set the thread-local error message and code.
/// Accepts any type implementing `AtlasError` trait.
pub(crate) fn set_last_error(error: &impl AtlasError) {
    with_last_error_mut(|(cstring, code)| {
        *cstring = CString::new(error.msg()).ok();
        *code = error.code();
    });
}

/// Track an error by setting it in thread-local storage and returning its code.
#[inline]
pub(crate) fn track_error(error: &impl AtlasError) -> AtlasErrorCode {
    set_last_error(error);
    error.code()
}

/// Clear the thread-local error message and code.
/// Called on successful operations so a stale message is never reported.
pub(crate) fn clear_last_error() {
    with_last_error_mut(|(cstring, code)| {
        *cstring = None;
        *code = AtlasErrorCode::Ok;
    });
}

/// Run an FFI body, recording its error or clearing the previous one.
pub(crate) fn handle_ffi_result<F>(body: F) -> AtlasErrorCode
where
    F: FnOnce() -> Result<(), DefaultAtlasError>,
{
    match body() {
        Ok(()) => {
            clear_last_error();
            AtlasErrorCode::Ok
        }
        Err(error) => track_error(&error),
    }
}

/// Reject non-finite theoretical volumes; flag non-positive ones as empty.
pub(crate) fn check_theoretical(theoretical: f64) -> Result<(), DefaultAtlasError> {
    if !theoretical.is_finite() {
        return Err(DefaultAtlasError::invalid_parameter(
            "theoretical",
            &format!("must be finite, got {theoretical}"),
        ));
    }
    if theoretical <= 0.0 {
        return Err(DefaultAtlasError::empty_result(theoretical));
    }
    Ok(())
}

/// Copy `items` into a caller-provided buffer.
///
/// `out_len` always receives the required length (when non-null), so a caller
/// can retry with a larger buffer after `BufferTooSmall`.
///
/// # Safety
/// - `out_len` must be null or valid for a `usize` write.
/// - `out` must be null or valid for `capacity` writes of `T`.
pub(crate) unsafe fn write_slice<T: Copy>(
    items: &[T],
    out: *mut T,
    capacity: usize,
    out_len: *mut usize,
) -> Result<(), DefaultAtlasError> {
    if out_len.is_null() {
        return Err(DefaultAtlasError::null_pointer("out_len"));
    }
    // SAFETY: checked non-null above; validity is the caller's contract.
    unsafe { *out_len = items.len() };

    if capacity < items.len() {
        return Err(DefaultAtlasError::buffer_too_small(items.len(), capacity));
    }
    if out.is_null() {
        return Err(DefaultAtlasError::null_pointer("out"));
    }
    // SAFETY: out is non-null and holds at least items.len() elements.
    unsafe { std::ptr::copy_nonoverlapping(items.as_ptr(), out, items.len()) };
    Ok(())
}

/// Zero `out_len` when the call produced nothing.
///
/// # Safety
/// `out_len` must be null or valid for a `usize` write.
pub(crate) unsafe fn reset_len(out_len: *mut usize) {
    if !out_len.is_null() {
        // SAFETY: checked non-null; validity is the caller's contract.
        unsafe { *out_len = 0 };
    }
}

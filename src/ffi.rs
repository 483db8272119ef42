//! C ABI for the transform
//!
//! Exposes the Markdown pipeline and the standalone sanitizer to C callers.
//!
//! # Boundary Contract
//!
//! ## String Representation
//!
//! **Every string crossing the boundary is UTF-8 bytes + length, never a
//! NUL-terminated C string.** Input is `(*const u8, usize)`; output buffers are
//! `(*mut u8, usize)` pairs inside [`SafeMarkdownResult`]. Lengths are byte
//! counts without a terminator, and C code must not call `strlen()` on them.
//!
//! ## Memory Management
//!
//! - Rust allocates every output buffer as a `Box<[u8]>`
//! - C must release a populated result with [`safe_markdown_result_free`]
//!   exactly once (further calls are no-ops); never with libc `free()`
//! - Input buffers stay owned by the caller and are only read during the call
//!
//! ```rust
//! use safe_markdown::ffi::{
//!     SafeMarkdownResult, safe_markdown_result_free, safe_markdown_transform,
//! };
//!
//! let input = b"# Title";
//! let mut result = SafeMarkdownResult::default();
//! unsafe { safe_markdown_transform(input.as_ptr(), input.len(), &mut result) };
//! assert_eq!(result.error_code, 0);
//!
//! let html = unsafe { std::slice::from_raw_parts(result.html, result.html_len) };
//! assert_eq!(html, b"<h1>Title</h1>\n");
//!
//! unsafe { safe_markdown_result_free(&mut result) };
//! assert!(result.html.is_null());
//! ```
//!
//! ## Error Handling
//!
//! - Success: `error_code == 0`, `html` holds the sanitized output (possibly
//!   zero-length, in which case `html` may be NULL)
//! - Failure: `error_code != 0`, `html` is NULL, `error_message` holds a UTF-8
//!   description. Failing is the fail-closed outcome: the caller renders
//!   nothing.
//!
//! Panics are caught with `catch_unwind` and reported as
//! [`ERROR_SANITIZER_PANIC`]; unwinding never crosses into C.
//!
//! ## Thread Safety
//!
//! The functions keep no state between calls and may be called concurrently
//! from any thread, each with its own result struct.

use std::panic;
use std::ptr;
use std::slice;

use crate::error::TransformError;
use crate::pipeline::MarkdownPipeline;
use crate::sanitizer::Sanitizer;

// ============================================================================
// Error Code Constants
// ============================================================================

/// Success - no error occurred
pub const ERROR_SUCCESS: u32 = 0;

/// Sanitized tree exceeded the nesting limit
pub const ERROR_NESTING_TOO_DEEP: u32 = 1;

/// Invalid input (NULL pointer with non-zero length, non-UTF-8 bytes)
pub const ERROR_INVALID_INPUT: u32 = 5;

/// A panic was caught inside the transform
pub const ERROR_SANITIZER_PANIC: u32 = 98;

/// Internal error
pub const ERROR_INTERNAL: u32 = 99;

// ============================================================================
// FFI Data Structures
// ============================================================================

/// Result of a transform call
///
/// C declaration:
///
/// ```c
/// typedef struct {
///     uint8_t *html;
///     size_t   html_len;
///     uint32_t error_code;
///     uint8_t *error_message;
///     size_t   error_len;
/// } safe_markdown_result_t;
/// ```
#[repr(C)]
#[derive(Debug)]
pub struct SafeMarkdownResult {
    /// Sanitized HTML (UTF-8, NOT NUL-terminated)
    pub html: *mut u8,
    /// Length of `html` in bytes
    pub html_len: usize,
    /// Error code (0 = success)
    pub error_code: u32,
    /// Error message (UTF-8, NOT NUL-terminated), NULL on success
    pub error_message: *mut u8,
    /// Length of `error_message` in bytes
    pub error_len: usize,
}

impl Default for SafeMarkdownResult {
    fn default() -> Self {
        Self {
            html: ptr::null_mut(),
            html_len: 0,
            error_code: ERROR_SUCCESS,
            error_message: ptr::null_mut(),
            error_len: 0,
        }
    }
}

fn reset_result(result: &mut SafeMarkdownResult) {
    *result = SafeMarkdownResult::default();
}

fn set_error_result(result: &mut SafeMarkdownResult, error_code: u32, error_message: String) {
    let error_bytes = error_message.into_bytes().into_boxed_slice();
    result.error_code = error_code;
    result.error_len = error_bytes.len();
    result.error_message = Box::into_raw(error_bytes) as *mut u8;
}

fn set_success_result(result: &mut SafeMarkdownResult, html: String) {
    let html_bytes = html.into_bytes().into_boxed_slice();
    result.error_code = ERROR_SUCCESS;
    if html_bytes.is_empty() {
        return;
    }
    result.html_len = html_bytes.len();
    result.html = Box::into_raw(html_bytes) as *mut u8;
}

fn required_utf8<'a>(ptr: *const u8, len: usize, name: &str) -> Result<&'a str, TransformError> {
    if len == 0 {
        return Ok("");
    }

    if ptr.is_null() {
        return Err(TransformError::InvalidInput(format!(
            "{name}_len > 0 with NULL {name} pointer"
        )));
    }

    // SAFETY: Pointer was validated as non-NULL above; caller guarantees `len`
    // bytes are valid and readable for the duration of this call.
    let bytes = unsafe { slice::from_raw_parts(ptr, len) };

    std::str::from_utf8(bytes).map_err(|e| {
        TransformError::InvalidInput(format!(
            "{name} is not valid UTF-8 at byte position {}",
            e.valid_up_to()
        ))
    })
}

fn free_buffer(ptr_field: &mut *mut u8, len_field: &mut usize) {
    if (*ptr_field).is_null() {
        return;
    }

    let raw = ptr::slice_from_raw_parts_mut(*ptr_field, *len_field);
    // SAFETY: `raw` was allocated by `Box<[u8]>` via `Box::into_raw`.
    let _ = unsafe { Box::from_raw(raw) };
    *ptr_field = ptr::null_mut();
    *len_field = 0;
}

/// Run `stage` on the input under `catch_unwind` and write the outcome
///
/// # Safety
///
/// Same contract as the exported functions that call it.
unsafe fn run_into_result<F>(
    input: *const u8,
    input_len: usize,
    result: *mut SafeMarkdownResult,
    stage: F,
) where
    F: FnOnce(&str) -> Result<String, TransformError> + panic::UnwindSafe,
{
    if result.is_null() {
        // Cannot report anything without a result struct
        return;
    }

    // SAFETY: `result` was validated as non-NULL above.
    let result_ref = unsafe { &mut *result };
    reset_result(result_ref);

    let outcome = panic::catch_unwind(|| {
        let text = required_utf8(input, input_len, "input")?;
        stage(text)
    });

    match outcome {
        Ok(Ok(html)) => set_success_result(result_ref, html),
        Ok(Err(e)) => set_error_result(result_ref, e.code(), e.to_string()),
        Err(_) => set_error_result(
            result_ref,
            ERROR_SANITIZER_PANIC,
            TransformError::SanitizerPanic.to_string(),
        ),
    }
}

// ============================================================================
// FFI Functions
// ============================================================================

/// Transform Markdown into sanitized HTML
///
/// # Example (C)
///
/// ```c
/// safe_markdown_result_t result;
/// safe_markdown_transform(text, text_len, &result);
/// if (result.error_code == 0) {
///     emit(result.html, result.html_len);
/// }
/// safe_markdown_result_free(&result);
/// ```
///
/// # Safety
///
/// - `input` must point to `input_len` readable bytes (it may be NULL when
///   `input_len` is 0)
/// - `result` must be NULL or point to a writable `SafeMarkdownResult`; a
///   NULL `result` makes the call a no-op
/// - Any buffers already held by `*result` are overwritten, not freed
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safe_markdown_transform(
    input: *const u8,
    input_len: usize,
    result: *mut SafeMarkdownResult,
) {
    // SAFETY: Forwarded caller contract.
    unsafe {
        run_into_result(input, input_len, result, |markdown| {
            MarkdownPipeline::new().try_transform(markdown)
        })
    }
}

/// Sanitize arbitrary HTML
///
/// # Safety
///
/// Same contract as [`safe_markdown_transform`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safe_markdown_sanitize(
    html: *const u8,
    html_len: usize,
    result: *mut SafeMarkdownResult,
) {
    // SAFETY: Forwarded caller contract.
    unsafe {
        run_into_result(html, html_len, result, |html| {
            Sanitizer::new().try_sanitize(html).map(String::from)
        })
    }
}

/// Free the buffers held by a result
///
/// # Safety
///
/// - NULL `result` is a no-op
/// - `result` must have been populated by this library; buffers must not have
///   been released with libc `free()`
/// - Safe to call multiple times: pointers are NULL after the first call
#[unsafe(no_mangle)]
pub unsafe extern "C" fn safe_markdown_result_free(result: *mut SafeMarkdownResult) {
    if result.is_null() {
        return;
    }

    // SAFETY: `result` was validated as non-NULL above.
    let result_ref = unsafe { &mut *result };
    free_buffer(&mut result_ref.html, &mut result_ref.html_len);
    // error_message is UTF-8 bytes with a length, not a CString
    free_buffer(&mut result_ref.error_message, &mut result_ref.error_len);
    result_ref.error_code = ERROR_SUCCESS;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html_of(result: &SafeMarkdownResult) -> &[u8] {
        if result.html.is_null() {
            return &[];
        }
        unsafe { slice::from_raw_parts(result.html, result.html_len) }
    }

    #[test]
    fn test_error_codes_match_error_enum() {
        assert_eq!(
            TransformError::NestingTooDeep { depth: 2, max: 1 }.code(),
            ERROR_NESTING_TOO_DEEP
        );
        assert_eq!(TransformError::InvalidInput(String::new()).code(), ERROR_INVALID_INPUT);
        assert_eq!(TransformError::SanitizerPanic.code(), ERROR_SANITIZER_PANIC);
        assert_eq!(TransformError::InternalError(String::new()).code(), ERROR_INTERNAL);
    }

    #[test]
    fn test_transform_success() {
        let input = b"**bold**";
        let mut result = SafeMarkdownResult::default();
        unsafe { safe_markdown_transform(input.as_ptr(), input.len(), &mut result) };

        assert_eq!(result.error_code, ERROR_SUCCESS);
        assert_eq!(html_of(&result), b"<p><strong>bold</strong></p>\n");
        assert!(result.error_message.is_null());

        unsafe { safe_markdown_result_free(&mut result) };
        assert!(result.html.is_null());
        assert_eq!(result.html_len, 0);
    }

    #[test]
    fn test_empty_input_with_null_pointer() {
        let mut result = SafeMarkdownResult::default();
        unsafe { safe_markdown_transform(ptr::null(), 0, &mut result) };
        assert_eq!(result.error_code, ERROR_SUCCESS);
        assert!(result.html.is_null());
        assert_eq!(result.html_len, 0);
    }

    #[test]
    fn test_null_pointer_with_length_is_invalid() {
        let mut result = SafeMarkdownResult::default();
        unsafe { safe_markdown_transform(ptr::null(), 10, &mut result) };
        assert_eq!(result.error_code, ERROR_INVALID_INPUT);
        assert!(result.html.is_null());
        assert!(!result.error_message.is_null());
        unsafe { safe_markdown_result_free(&mut result) };
        assert!(result.error_message.is_null());
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let input = [0x66, 0xff, 0x6f];
        let mut result = SafeMarkdownResult::default();
        unsafe { safe_markdown_transform(input.as_ptr(), input.len(), &mut result) };
        assert_eq!(result.error_code, ERROR_INVALID_INPUT);
        assert!(result.html.is_null());
        unsafe { safe_markdown_result_free(&mut result) };
    }

    #[test]
    fn test_sanitize_strips_handlers() {
        let input = b"<img src=x onerror=alert(1)>";
        let mut result = SafeMarkdownResult::default();
        unsafe { safe_markdown_sanitize(input.as_ptr(), input.len(), &mut result) };
        assert_eq!(result.error_code, ERROR_SUCCESS);
        assert_eq!(html_of(&result), b"<img src=\"x\">");
        unsafe { safe_markdown_result_free(&mut result) };
    }

    #[test]
    fn test_sanitize_too_deep_fails_closed() {
        let input = "<em>".repeat(1000);
        let mut result = SafeMarkdownResult::default();
        unsafe { safe_markdown_sanitize(input.as_ptr(), input.len(), &mut result) };
        assert_eq!(result.error_code, ERROR_NESTING_TOO_DEEP);
        assert!(result.html.is_null());
        unsafe { safe_markdown_result_free(&mut result) };
    }

    #[test]
    fn test_null_result_is_noop() {
        let input = b"x";
        unsafe {
            safe_markdown_transform(input.as_ptr(), input.len(), ptr::null_mut());
            safe_markdown_result_free(ptr::null_mut());
        }
    }

    #[test]
    fn test_double_free_is_safe() {
        let input = b"text";
        let mut result = SafeMarkdownResult::default();
        unsafe {
            safe_markdown_transform(input.as_ptr(), input.len(), &mut result);
            safe_markdown_result_free(&mut result);
            safe_markdown_result_free(&mut result);
        }
        assert!(result.html.is_null());
    }
}

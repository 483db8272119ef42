#![no_main]

use libfuzzer_sys::fuzz_target;
use safe_markdown::ffi::{SafeMarkdownResult, safe_markdown_result_free, safe_markdown_transform};

fuzz_target!(|data: &[u8]| {
    let mut result = SafeMarkdownResult::default();
    unsafe {
        safe_markdown_transform(data.as_ptr(), data.len(), &mut result);
        if result.error_code == 0 {
            assert!(result.error_message.is_null());
        } else {
            assert!(result.html.is_null());
        }
        safe_markdown_result_free(&mut result);
    }
    assert!(result.html.is_null());
    assert!(result.error_message.is_null());
});

#![no_main]

use libfuzzer_sys::fuzz_target;
use safe_markdown::sanitizer::sanitize_html;
use safe_markdown::transform_markdown_sync;

fuzz_target!(|data: &[u8]| {
    let markdown = String::from_utf8_lossy(data);
    let html = transform_markdown_sync(&markdown);

    assert!(!html.to_ascii_lowercase().contains("<script"));
    // Pipeline output is already a sanitizer fixed point
    assert_eq!(sanitize_html(&html).as_str(), html);
});

#![no_main]

use libfuzzer_sys::fuzz_target;
use safe_markdown::sanitizer::sanitize_html;

/// Values of `href`/`src` in sanitized output, which always writes `name="value"`
fn url_attributes(output: &str) -> Vec<&str> {
    let mut values = Vec::new();
    for segment in output.split('<').skip(1) {
        let tag = segment.split('>').next().unwrap_or("");
        let mut rest = tag.split_once(' ').map_or("", |(_, rest)| rest);
        while let Some((name, after)) = rest.split_once("=\"") {
            let Some((value, tail)) = after.split_once('"') else {
                break;
            };
            if matches!(name.trim(), "href" | "src") {
                values.push(value);
            }
            rest = tail;
        }
    }
    values
}

fuzz_target!(|data: &[u8]| {
    let Ok(html) = std::str::from_utf8(data) else {
        return;
    };

    let once = sanitize_html(html);
    assert!(
        !once.as_str().to_ascii_lowercase().contains("<script"),
        "script tag survived: {once}"
    );
    for value in url_attributes(once.as_str()) {
        let compact = value
            .to_ascii_lowercase()
            .replace(|c: char| c.is_ascii_whitespace() || c.is_ascii_control(), "");
        assert!(!compact.starts_with("javascript:"), "javascript URL survived: {once}");
    }

    let twice = sanitize_html(once.as_str());
    assert_eq!(once, twice, "sanitizer is not idempotent");
});

//! Security tests for the sanitizer boundary
//!
//! Every test here feeds hostile HTML straight into the sanitizer, bypassing
//! the Markdown parser and renderer: the sanitizer must hold on its own.

use proptest::prelude::*;
use safe_markdown::sanitizer::{Sanitizer, SanitizerOptions, sanitize_html};

fn clean(html: &str) -> String {
    sanitize_html(html).into_string()
}

/// `(name, value)` pairs of every attribute in sanitized output
///
/// Sanitized output always writes `name="value"` with the value escaped, so a
/// plain split is exact.
fn attributes(output: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    for segment in output.split('<').skip(1) {
        let tag = segment.split('>').next().unwrap_or("");
        let mut rest = tag.split_once(' ').map_or("", |(_, rest)| rest);
        while let Some((name, after)) = rest.split_once("=\"") {
            let Some((value, tail)) = after.split_once('"') else {
                break;
            };
            attrs.push((name.trim().to_string(), value.to_string()));
            rest = tail;
        }
    }
    attrs
}

/// Assert the three safety postconditions on sanitized output
fn assert_safe(output: &str) {
    assert!(
        !output.to_ascii_lowercase().contains("<script"),
        "script tag in {output:?}"
    );
    for (name, value) in attributes(output) {
        assert!(!name.starts_with("on"), "event handler {name:?} in {output:?}");
        if name == "href" || name == "src" {
            let compact = value
                .to_ascii_lowercase()
                .replace(|c: char| c.is_ascii_whitespace() || c.is_ascii_control(), "");
            assert!(!compact.starts_with("javascript:"), "javascript URL in {output:?}");
        }
    }
}

/// Script elements are removed together with their content
#[test]
fn test_script_tag_removal() {
    let html = r#"<p>Before</p>
        <script>alert('xss')</script>
        <p>After</p>"#;

    let output = clean(html);

    assert_safe(&output);
    assert!(!output.contains("alert"));
    assert!(output.contains("<p>Before</p>"));
    assert!(output.contains("<p>After</p>"));
}

/// `<img src=x onerror=alert(1)>` keeps the image but loses the handler
#[test]
fn test_img_onerror() {
    assert_eq!(clean("<img src=x onerror=alert(1)>"), "<img src=\"x\">");
}

/// `javascript:` hrefs are stripped, link text survives
#[test]
fn test_javascript_href() {
    assert_eq!(clean("<a href='javascript:evil()'>x</a>"), "<a>x</a>");
}

/// Obfuscated schemes: case, entities, embedded whitespace, leading junk
#[test]
fn test_obfuscated_javascript_schemes() {
    let payloads = [
        "<a href=\"JaVaScRiPt:alert(1)\">x</a>",
        "<a href=\"&#106;&#97;&#118;&#97;&#115;&#99;&#114;&#105;&#112;&#116;:alert(1)\">x</a>",
        "<a href=\"&#x6A;avascript:alert(1)\">x</a>",
        "<a href=\"java&#x09;script:alert(1)\">x</a>",
        "<a href=\"java&#10;script:alert(1)\">x</a>",
        "<a href=\"  javascript:alert(1)\">x</a>",
        "<a href=\"&#1;javascript:alert(1)\">x</a>",
        "<img src=\"javascript:alert(1)\">",
    ];

    for payload in payloads {
        let output = clean(payload);
        assert_safe(&output);
        assert!(!output.contains("href"), "{payload} -> {output}");
        assert!(!output.contains("src"), "{payload} -> {output}");
    }
}

/// Every event handler attribute is stripped, whatever its case
#[test]
fn test_all_event_handlers_stripped() {
    let handlers = [
        "onclick",
        "onload",
        "onerror",
        "onmouseover",
        "onfocus",
        "ONCLICK",
        "OnPointerDown",
        "onanimationstart",
    ];

    for handler in handlers {
        let html = format!("<p {handler}=\"alert(1)\">t</p><a href=\"/x\" {handler}=\"y\">l</a>");
        let output = clean(&html);
        assert_eq!(output, "<p>t</p><a href=\"/x\">l</a>", "{handler}");
    }
}

/// Dangerous containers are removed with their descendants
#[test]
fn test_dangerous_elements_removed() {
    let elements = [
        "<iframe src=\"https://evil.example\"><p>inner</p></iframe>",
        "<object data=\"evil.swf\"><p>inner</p></object>",
        "<embed src=\"evil.swf\">",
        "<style>body{background:url(javascript:x)}</style>",
        "<svg onload=\"alert(1)\"><a href=\"/x\">inner</a></svg>",
        "<math><mtext><p>inner</p></mtext></math>",
        "<form action=\"/steal\"><input name=\"p\"></form>",
        "<template><p>inner</p></template>",
        "<noscript><p>inner</p></noscript>",
        "<base href=\"https://evil.example/\">",
        "<meta http-equiv=\"refresh\" content=\"0;url=javascript:x\">",
        "<link rel=\"stylesheet\" href=\"https://evil.example/x.css\">",
    ];

    for element in elements {
        let output = clean(&format!("{element}<p>kept</p>"));
        assert_safe(&output);
        assert_eq!(output, "<p>kept</p>", "{element}");
    }
}

/// `data:` URLs: raster images allowed on `img src`, everything else stripped
#[test]
fn test_data_urls() {
    assert_eq!(
        clean("<img src=\"data:image/gif;base64,R0lGOD\" alt=\"dot\">"),
        "<img src=\"data:image/gif;base64,R0lGOD\" alt=\"dot\">"
    );
    assert_eq!(clean("<img src=\"data:image/svg+xml;base64,PHN2Zz4=\">"), "<img>");
    assert_eq!(clean("<img src=\"data:text/html;base64,PHNjcmlwdD4=\">"), "<img>");
    assert_eq!(clean("<a href=\"data:image/png;base64,AAAA\">x</a>"), "<a>x</a>");
}

/// With data images disabled, even raster data URLs are stripped
#[test]
fn test_data_images_can_be_disabled() {
    let sanitizer = Sanitizer::with_options(SanitizerOptions {
        allow_data_images: false,
        ..Default::default()
    });
    assert_eq!(
        sanitizer.sanitize("<img src=\"data:image/png;base64,AAAA\">").as_str(),
        "<img>"
    );
}

/// Other schemes outside the allow-list are stripped
#[test]
fn test_non_allowlisted_schemes() {
    for url in ["vbscript:msgbox(1)", "file:///etc/passwd", "ftp://example.com/x", "about:blank"] {
        assert_eq!(clean(&format!("<a href=\"{url}\">x</a>")), "<a>x</a>", "{url}");
    }
}

/// Allowed URL forms survive unchanged
#[test]
fn test_allowed_urls() {
    for url in [
        "https://example.com/cars?id=1&amp;page=2",
        "http://example.com",
        "/inventory/42",
        "../specs.pdf",
        "#photos",
        "?page=2",
        "//cdn.example.com/a.jpg",
        "mailto:sales@example.com",
    ] {
        let output = clean(&format!("<a href=\"{url}\">x</a>"));
        assert!(output.starts_with("<a href=\""), "{url} -> {output}");
    }
}

/// Attribute values cannot break out of their quotes
#[test]
fn test_attribute_values_are_escaped() {
    let output = clean(r#"<img alt='"><script>alert(1)</script>' src="/a.png">"#);
    assert_eq!(
        output,
        "<img alt=\"&quot;&gt;&lt;script&gt;alert(1)&lt;/script&gt;\" src=\"/a.png\">"
    );
    assert_safe(&output);
}

/// Escaped markup in text stays text
#[test]
fn test_text_never_reinterpreted() {
    let output = clean("<p>&lt;img src=x onerror=alert(1)&gt;</p>");
    assert_eq!(output, "<p>&lt;img src=x onerror=alert(1)&gt;</p>");
}

/// Scheme names in prose are plain text, not URLs
#[test]
fn test_scheme_text_outside_attributes_is_kept() {
    let output = clean("javascript:alert(1) is just text");
    assert_eq!(output, "javascript:alert(1) is just text");
    assert_safe(&output);

    let output = clean("<p title=\"javascript:x\">see javascript:void(0)</p>");
    assert_eq!(output, "<p>see javascript:void(0)</p>");
    assert_safe(&output);

    let output = clean("<a href=\"/ok\" title=\"javascript:x\">x</a>");
    assert_eq!(output, "<a href=\"/ok\" title=\"javascript:x\">x</a>");
    assert_safe(&output);
}

/// Mutation-XSS style inputs stay inert and stable
#[test]
fn test_mutation_xss_payloads() {
    let payloads = [
        "<noscript><p title=\"</noscript><img src=x onerror=alert(1)>\">",
        "<svg></p><style><a id=\"</style><img src=1 onerror=alert(1)>\">",
        "<math><mtext><table><mglyph><style><img src=x onerror=alert(1)>",
        "<form><math><mtext></form><form><mglyph><style></math><img src onerror=alert(1)>",
        "<textarea><script>alert(1)</script></textarea>",
        "<title><img src=x onerror=alert(1)></title>",
        "<xmp><script>alert(1)</script></xmp>",
        "<plaintext><script>alert(1)</script>",
        "<!--><img src=x onerror=alert(1)>-->",
        "<![CDATA[<img src=x onerror=alert(1)>]]>",
        "<a href=\"/ok\"><table><a href=\"javascript:x\">y</a></table></a>",
    ];

    for payload in payloads {
        let once = clean(payload);
        assert_safe(&once);
        assert_eq!(clean(&once), once, "not idempotent for {payload}");
    }
}

/// Unclosed and misnested tags are normalised, not passed through
#[test]
fn test_malformed_markup() {
    assert_eq!(clean("<p><strong>unclosed"), "<p><strong>unclosed</strong></p>");
    assert_eq!(
        clean("<em><strong>x</em>y</strong>"),
        "<em><strong>x</strong></em><strong>y</strong>"
    );
    assert_eq!(clean("<p>a</p></p>b"), "<p>a</p><p></p>b");
}

fn hostile_fragment() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("<script>".to_string()),
        Just("</script>".to_string()),
        Just("<img src=x onerror=alert(1)>".to_string()),
        Just("<a href='javascript:evil()'>".to_string()),
        Just("</a>".to_string()),
        Just("<svg onload=x>".to_string()),
        Just("<table>".to_string()),
        Just("<p>".to_string()),
        Just("<li>".to_string()),
        Just("<pre>".to_string()),
        Just("<h2>".to_string()),
        Just("<strong>".to_string()),
        "[a-z ]{0,8}",
        "on[a-z]{1,8}=\"[a-z()]{0,6}\"",
        "<(a|img|p|em) (on[a-z]{1,6}|href|src|title)=\"?[a-zA-Z:/() ]{0,12}\"?>",
    ]
}

proptest! {
    /// No sequence of hostile fragments survives sanitization
    #[test]
    fn prop_hostile_sequences_are_neutralised(
        parts in prop::collection::vec(hostile_fragment(), 0..20)
    ) {
        let output = clean(&parts.concat());
        assert_safe(&output);
    }

    /// Sanitizing twice changes nothing
    #[test]
    fn prop_sanitize_is_idempotent(
        parts in prop::collection::vec(hostile_fragment(), 0..20)
    ) {
        let once = clean(&parts.concat());
        prop_assert_eq!(clean(&once), once);
    }
}

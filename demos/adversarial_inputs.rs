//! Shows what the sanitizer does to hostile input, both as raw HTML and as
//! Markdown that tries to smuggle markup through the pipeline.

use safe_markdown::sanitizer::sanitize_html;
use safe_markdown::transform_markdown_sync;

const HOSTILE_HTML: &[&str] = &[
    "<img src=x onerror=alert(1)>",
    "<a href='javascript:evil()'>x</a>",
    "<a href=\" JaVa&#9;ScRiPt:evil()\">tab-split scheme</a>",
    "<p>ok<script>alert(1)</script></p>",
    "<svg onload=alert(1)><circle/></svg>",
    "<img src=\"data:image/svg+xml;base64,PHN2Zz4=\">",
    "<iframe src=\"//evil.example\"></iframe>",
    "<p style=\"background:url(javascript:x)\" class=\"promo\">styled</p>",
];

const HOSTILE_MARKDOWN: &[&str] = &[
    "[click me](javascript:alert(1))",
    "![x](javascript:alert(1))",
    "<script>alert(1)</script>",
    "**bold <img src=x onerror=alert(1)>**",
    "```\"><script>alert(1)</script>\nbody\n```",
];

fn main() {
    println!("=== Sanitizer on hostile HTML ===\n");
    for input in HOSTILE_HTML {
        println!("in:  {input}");
        println!("out: {}\n", sanitize_html(input));
    }

    println!("=== Pipeline on hostile Markdown ===\n");
    for input in HOSTILE_MARKDOWN {
        println!("in:  {input}");
        println!("out: {}", transform_markdown_sync(input));
    }
}

//! Basic transform example: Markdown listing text to safe HTML

use safe_markdown::parser::parse_markdown;
use safe_markdown::renderer::render_html;
use safe_markdown::sanitizer::sanitize_html;
use safe_markdown::transform_markdown_sync;

fn main() {
    println!("=== Safe Markdown - Basic Examples ===\n");

    // Example 1: Headings and emphasis
    example("Headings and emphasis", "# 2019 Civic\n\nOne **careful** owner, *low* miles.");

    // Example 2: Lists
    example(
        "Lists",
        "Features:\n\n- Sunroof\n- Heated seats\n  - front\n  - rear\n\n3. third owner\n4. fourth owner",
    );

    // Example 3: Links, images and code
    example(
        "Links, images and code",
        "See the [spec sheet](https://example.com/spec \"Spec\").\n\n![Dash](/img/dash.jpg)\n\n```text\nVIN 1HGCM82633A004352\n```",
    );

    // Example 4: Stages one at a time
    stages("> Quoted **seller** note");
}

fn example(title: &str, markdown: &str) {
    println!("Example: {title}");
    println!("Input Markdown:\n{markdown}\n");
    println!("Output HTML:\n{}", transform_markdown_sync(markdown));
    println!("---\n");
}

fn stages(markdown: &str) {
    println!("Example: individual stages");
    let document = parse_markdown(markdown);
    println!("AST:\n{document:#?}\n");

    let html = render_html(&document);
    println!("Rendered:\n{html}");

    let clean = sanitize_html(&html);
    println!("Sanitized:\n{clean}");
    println!("---\n");
}

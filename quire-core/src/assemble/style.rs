//! Style block carried in the assembled document's head

use crate::config::StyleConfig;

/// CSS for the configured layout: page box, body text, headings, title page
pub fn style_block(style: &StyleConfig) -> String {
    let mut css = String::new();

    css.push_str(&format!(
        "@page {{\n  size: {};\n  margin: {};\n",
        style.page_size, style.page_margin
    ));
    if style.page_numbers {
        css.push_str("  @bottom-center {\n    content: counter(page);\n    font-size: 9pt;\n  }\n");
    }
    css.push_str("}\n");

    css.push_str(&format!(
        r#"body {{
  font-family: {};
  font-size: {}pt;
  line-height: {};
  text-align: justify;
  margin: 0;
}}
h1, h2, h3, h4, h5, h6 {{
  font-weight: bold;
  line-height: 1.3;
  margin-top: 1em;
  margin-bottom: 0.5em;
}}
h1 {{ font-size: 18pt; }}
h2 {{ font-size: 16pt; }}
h3 {{ font-size: 14pt; }}
p {{ margin: 0.5em 0; }}
.title-page {{
  text-align: center;
  margin-bottom: 2em;
}}
.title-page .title {{ font-size: 24pt; font-weight: bold; }}
.title-page .author {{ font-size: 16pt; margin-top: 1em; }}
"#,
        style.font_family, style.font_size_pt, style.line_height
    ));

    if style.chapter_page_breaks {
        css.push_str("section.chapter { break-before: page; }\n");
    }

    css
}

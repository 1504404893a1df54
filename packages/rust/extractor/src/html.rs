//! HTML page extraction.
//!
//! Pulls the title, meta description, headings, and body text out of a
//! marketing page. Body text comes from a `scraper` traversal that skips
//! site chrome; prose-heavy pages can additionally be rendered to
//! Markdown via `htmd` for pretraining-style corpus units.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use blankforge_shared::{BlankforgeError, Result};

/// Tags whose text never belongs in training data.
const SKIP_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "noscript", "svg"];

/// Extracted content of a single HTML page.
#[derive(Debug, Clone)]
pub struct PageContent {
    /// `<title>` text, empty if absent.
    pub title: String,
    /// `<meta name="description">` content, empty if absent.
    pub description: String,
    /// `h1`-`h3` heading texts in document order.
    pub headings: Vec<String>,
    /// Flattened body text with normalized whitespace.
    pub text: String,
}

/// Extract title, description, headings, and body text from an HTML page.
pub fn extract_page(html: &str) -> Result<PageContent> {
    let doc = Html::parse_document(html);

    let title = select_first_text(&doc, "title").unwrap_or_default();

    let description = Selector::parse(r#"meta[name="description"]"#)
        .ok()
        .and_then(|sel| {
            doc.select(&sel)
                .next()
                .and_then(|el| el.value().attr("content"))
                .map(str::to_string)
        })
        .unwrap_or_default();

    let heading_sel = Selector::parse("h1, h2, h3")
        .map_err(|e| BlankforgeError::parse(format!("heading selector: {e}")))?;
    let headings: Vec<String> = doc
        .select(&heading_sel)
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|h| !h.is_empty())
        .collect();

    let text = extract_body_text(&doc);

    Ok(PageContent {
        title,
        description,
        headings,
        text,
    })
}

/// Convert a page's body to Markdown (used for prose pages where
/// structure is worth keeping in the corpus unit).
pub fn page_to_markdown(html: &str) -> Result<String> {
    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(SKIP_TAGS.to_vec())
        .build();

    let markdown = converter
        .convert(html)
        .map_err(|e| BlankforgeError::parse(format!("htmd conversion failed: {e}")))?;

    Ok(markdown.trim().to_string())
}

/// Flatten the body to plain text, skipping chrome and collapsing whitespace.
fn extract_body_text(doc: &Html) -> String {
    let Ok(body_sel) = Selector::parse("body") else {
        return String::new();
    };

    let Some(body) = doc.select(&body_sel).next() else {
        return String::new();
    };

    let mut parts: Vec<String> = Vec::new();
    collect_text(body, &mut parts);
    collapse_whitespace(&parts.join(" "))
}

/// Depth-first text collection that prunes skipped subtrees.
fn collect_text(el: scraper::ElementRef<'_>, out: &mut Vec<String>) {
    for child in el.children() {
        if let Some(child_el) = scraper::ElementRef::wrap(child) {
            if SKIP_TAGS.contains(&child_el.value().name()) {
                continue;
            }
            collect_text(child_el, out);
        } else if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if trimmed.len() > 2 {
                out.push(trimmed.to_string());
            }
        }
    }
}

fn select_first_text(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    doc.select(&sel)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
}

/// Collapse runs of whitespace into single spaces.
pub(crate) fn collapse_whitespace(s: &str) -> String {
    static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
    WS_RE.replace_all(s.trim(), " ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<html>
        <head>
            <title>Blankphone Pro — Start Blank</title>
            <meta name="description" content="The privacy flagship.">
        </head>
        <body>
            <nav><a href="/">Home</a><a href="/products">Products</a></nav>
            <main>
                <h1>Blankphone Pro</h1>
                <h2>200MP Camera</h2>
                <p>The best camera we have ever shipped.</p>
                <script>console.log("tracking-free");</script>
            </main>
            <footer>© 2026 Blankphone Inc.</footer>
        </body>
    </html>"#;

    #[test]
    fn extracts_title_and_description() {
        let page = extract_page(SAMPLE).unwrap();
        assert_eq!(page.title, "Blankphone Pro — Start Blank");
        assert_eq!(page.description, "The privacy flagship.");
    }

    #[test]
    fn extracts_headings_in_order() {
        let page = extract_page(SAMPLE).unwrap();
        assert_eq!(page.headings, vec!["Blankphone Pro", "200MP Camera"]);
    }

    #[test]
    fn body_text_skips_chrome_and_scripts() {
        let page = extract_page(SAMPLE).unwrap();
        assert!(page.text.contains("best camera we have ever shipped"));
        assert!(!page.text.contains("Home"));
        assert!(!page.text.contains("tracking-free"));
        assert!(!page.text.contains("© 2026"));
    }

    #[test]
    fn empty_page_yields_empty_content() {
        let page = extract_page("<html><body></body></html>").unwrap();
        assert!(page.title.is_empty());
        assert!(page.text.is_empty());
        assert!(page.headings.is_empty());
    }

    #[test]
    fn markdown_conversion_keeps_structure() {
        let md = page_to_markdown(SAMPLE).unwrap();
        assert!(md.contains("# Blankphone Pro"));
        assert!(md.contains("best camera"));
        assert!(!md.contains("console.log"));
    }

    #[test]
    fn whitespace_collapsed() {
        assert_eq!(collapse_whitespace("  a \n\t b   c "), "a b c");
    }
}

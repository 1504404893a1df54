//! Content Store loading and normalization into [`ContentUnit`]s.
//!
//! The Content Store is a directory tree of authored website content:
//! HTML pages at the root and under `products/`, `blog/`, and
//! `community/`, a JSON product catalog at `data/products.json`, and
//! JSON forum threads at `community/discussions.json`.
//!
//! Each underlying document kind is discriminated explicitly at parse
//! time into a [`SourceDocument`] variant; the extractor then flattens
//! everything into `(source, topics, body)` units. Malformed documents
//! are skipped and counted, never fatal — only a missing content root
//! aborts the run.

pub mod html;

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use blankforge_shared::{
    BlankforgeError, ContentUnit, ExtractConfig, ForumThread, ProductCatalog, ProductRecord,
    Result,
};

use html::extract_page;

// ---------------------------------------------------------------------------
// Page categories
// ---------------------------------------------------------------------------

/// Coarse page category derived from a page's path within the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCategory {
    Product,
    Blog,
    Comparison,
    Faq,
    Developer,
    Community,
    Company,
    Support,
    General,
}

impl PageCategory {
    /// Categorize a page by its store-relative path.
    pub fn from_path(rel_path: &str) -> Self {
        let file = rel_path.rsplit('/').next().unwrap_or(rel_path);
        if rel_path.starts_with("products/") {
            Self::Product
        } else if rel_path.starts_with("blog/") {
            Self::Blog
        } else if rel_path.starts_with("community/") {
            Self::Community
        } else {
            match file {
                "compare.html" => Self::Comparison,
                "faq.html" => Self::Faq,
                "developers.html" => Self::Developer,
                "about.html" => Self::Company,
                "warranty.html" | "repair.html" | "support.html" => Self::Support,
                _ => Self::General,
            }
        }
    }

    /// Topic-tag form of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Blog => "blog",
            Self::Comparison => "comparison",
            Self::Faq => "faq",
            Self::Developer => "developer",
            Self::Community => "community",
            Self::Company => "company",
            Self::Support => "support",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for PageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SourceDocument
// ---------------------------------------------------------------------------

/// A parsed source document, discriminated by kind at load time.
#[derive(Debug, Clone)]
pub enum SourceDocument {
    /// An HTML page with its store-relative path and category.
    Page {
        rel_path: String,
        category: PageCategory,
        html: String,
    },
    /// The product catalog (`data/products.json`).
    Products(ProductCatalog),
    /// Forum threads (`community/discussions.json`).
    Threads(Vec<ForumThread>),
}

// ---------------------------------------------------------------------------
// ContentStore
// ---------------------------------------------------------------------------

/// The loaded content store: all parsed source documents plus a count
/// of documents that failed to load or parse.
#[derive(Debug)]
pub struct ContentStore {
    /// Store root directory.
    pub root: PathBuf,
    /// Parsed documents.
    pub documents: Vec<SourceDocument>,
    /// Documents skipped because they were unreadable or malformed.
    pub skipped: usize,
}

impl ContentStore {
    /// Load the content store rooted at `root`.
    ///
    /// A missing root directory is fatal; individual unreadable or
    /// malformed documents are skipped and counted.
    #[instrument(skip_all, fields(root = %root.as_ref().display()))]
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(BlankforgeError::io(
                root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "content root not found"),
            ));
        }

        let mut documents = Vec::new();
        let mut skipped = 0usize;

        // HTML pages: root plus the known content subdirectories.
        for dir in ["", "products", "blog", "community"] {
            let dir_path = if dir.is_empty() {
                root.to_path_buf()
            } else {
                root.join(dir)
            };
            for path in html_files_in(&dir_path) {
                let rel_path = match path.strip_prefix(root) {
                    Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
                    Err(_) => path.to_string_lossy().to_string(),
                };
                match std::fs::read_to_string(&path) {
                    Ok(html) => {
                        let category = PageCategory::from_path(&rel_path);
                        debug!(page = %rel_path, %category, "loaded page");
                        documents.push(SourceDocument::Page {
                            rel_path,
                            category,
                            html,
                        });
                    }
                    Err(e) => {
                        warn!(page = %rel_path, error = %e, "unreadable page, skipping");
                        skipped += 1;
                    }
                }
            }
        }

        // Product catalog.
        let products_path = root.join("data").join("products.json");
        if products_path.exists() {
            match load_catalog(&products_path) {
                Ok(catalog) => {
                    debug!(products = catalog.products.len(), "loaded product catalog");
                    documents.push(SourceDocument::Products(catalog));
                }
                Err(e) => {
                    warn!(error = %e, "malformed product catalog, skipping");
                    skipped += 1;
                }
            }
        }

        // Forum threads.
        let discussions_path = root.join("community").join("discussions.json");
        if discussions_path.exists() {
            match load_threads(&discussions_path) {
                Ok(threads) => {
                    debug!(threads = threads.len(), "loaded forum threads");
                    documents.push(SourceDocument::Threads(threads));
                }
                Err(e) => {
                    warn!(error = %e, "malformed discussions file, skipping");
                    skipped += 1;
                }
            }
        }

        info!(
            documents = documents.len(),
            skipped, "content store loaded"
        );

        Ok(Self {
            root: root.to_path_buf(),
            documents,
            skipped,
        })
    }

    /// The product records, if the store carried a catalog.
    pub fn products(&self) -> &[ProductRecord] {
        self.documents
            .iter()
            .find_map(|d| match d {
                SourceDocument::Products(catalog) => Some(catalog.products.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    /// The brand name from the catalog header, if present.
    pub fn brand_name(&self) -> Option<&str> {
        self.documents.iter().find_map(|d| match d {
            SourceDocument::Products(catalog) => {
                catalog.brand.as_ref().map(|b| b.name.as_str())
            }
            _ => None,
        })
    }
}

/// `data/products.json` is either `{"brand": ..., "products": [...]}`
/// or a bare array; accept both.
fn load_catalog(path: &Path) -> Result<ProductCatalog> {
    let content = std::fs::read_to_string(path).map_err(|e| BlankforgeError::io(path, e))?;

    if let Ok(catalog) = serde_json::from_str::<ProductCatalog>(&content) {
        return Ok(catalog);
    }

    let products: Vec<ProductRecord> = serde_json::from_str(&content)
        .map_err(|e| BlankforgeError::parse(format!("{}: {e}", path.display())))?;
    Ok(ProductCatalog {
        brand: None,
        products,
    })
}

fn load_threads(path: &Path) -> Result<Vec<ForumThread>> {
    let content = std::fs::read_to_string(path).map_err(|e| BlankforgeError::io(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| BlankforgeError::parse(format!("{}: {e}", path.display())))
}

fn html_files_in(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "html"))
        .collect();

    // Deterministic ordering regardless of directory enumeration order.
    files.sort();
    files
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Counters for a single extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Pages successfully extracted.
    pub pages: usize,
    /// Product records rendered into units.
    pub products: usize,
    /// Forum threads rendered into units.
    pub threads: usize,
    /// Documents skipped (unreadable, malformed, or empty after extraction).
    pub skipped: usize,
    /// Total units produced.
    pub units: usize,
}

/// Result of an extraction pass.
#[derive(Debug)]
pub struct Extraction {
    pub units: Vec<ContentUnit>,
    pub stats: ExtractStats,
}

/// Normalize every document in the store into [`ContentUnit`]s.
///
/// Pages become one unit each (chunked if the body exceeds the chunk
/// budget), product records become one unit per spec group, and forum
/// threads become one unit each tagged with their sentiment. Ordering
/// is deterministic: store order, then chunk order.
#[instrument(skip_all, fields(documents = store.documents.len()))]
pub fn extract(store: &ContentStore, opts: &ExtractConfig) -> Extraction {
    let mut units = Vec::new();
    let mut stats = ExtractStats {
        skipped: store.skipped,
        ..Default::default()
    };

    for doc in &store.documents {
        match doc {
            SourceDocument::Page {
                rel_path,
                category,
                html,
            } => match extract_page(html) {
                Ok(page) => {
                    // Prose bodies keep their structure via htmd; the
                    // flattened composition is the fallback when a page
                    // has no convertible body.
                    let body = match html::page_to_markdown(html) {
                        Ok(md) if md.len() >= opts.min_chunk_chars => {
                            compose_markdown_body(&page, &md)
                        }
                        _ => compose_page_body(&page),
                    };
                    if body.len() < opts.min_chunk_chars {
                        debug!(page = %rel_path, "page too short, skipping");
                        stats.skipped += 1;
                        continue;
                    }
                    stats.pages += 1;
                    for chunk in chunk_text(&body, opts) {
                        units.push(ContentUnit {
                            source: rel_path.clone(),
                            topics: vec![category.as_str().to_string()],
                            body: chunk,
                        });
                    }
                }
                Err(e) => {
                    warn!(page = %rel_path, error = %e, "extraction failed, skipping");
                    stats.skipped += 1;
                }
            },
            SourceDocument::Products(catalog) => {
                for product in &catalog.products {
                    stats.products += 1;
                    units.extend(product_units(product));
                }
            }
            SourceDocument::Threads(threads) => {
                for thread in threads {
                    if thread.title.is_empty() && thread.content.is_empty() {
                        stats.skipped += 1;
                        continue;
                    }
                    stats.threads += 1;
                    units.push(thread_unit(thread));
                }
            }
        }
    }

    stats.units = units.len();
    info!(
        units = stats.units,
        pages = stats.pages,
        products = stats.products,
        threads = stats.threads,
        skipped = stats.skipped,
        "extraction complete"
    );

    Extraction { units, stats }
}

/// Title and meta description ahead of the Markdown body, so a chunk
/// read in isolation still names its subject.
fn compose_markdown_body(page: &html::PageContent, markdown: &str) -> String {
    let mut parts = Vec::new();
    if !page.title.is_empty() {
        parts.push(page.title.as_str());
    }
    if !page.description.is_empty() {
        parts.push(page.description.as_str());
    }
    parts.push(markdown);
    parts.join("\n\n")
}

/// Flattened fallback: title, meta description, headings, then body
/// text, joined as sentences.
fn compose_page_body(page: &html::PageContent) -> String {
    let mut parts = Vec::new();
    if !page.title.is_empty() {
        parts.push(page.title.clone());
    }
    if !page.description.is_empty() {
        parts.push(page.description.clone());
    }
    if !page.headings.is_empty() {
        parts.push(page.headings.join(". "));
    }
    if !page.text.is_empty() {
        parts.push(page.text.clone());
    }
    parts.join(". ")
}

/// One unit per product spec group, rendered as natural text.
fn product_units(p: &ProductRecord) -> Vec<ContentUnit> {
    let source = format!("products/{}", p.id);
    let tag = |group: &str| {
        vec![
            "product".to_string(),
            p.id.clone(),
            group.to_string(),
        ]
    };

    let mut units = Vec::new();

    let mut overview = format!(
        "{} is a {} smartphone priced at ${}.",
        p.name, p.segment, p.price
    );
    if !p.tagline.is_empty() {
        overview.push_str(&format!(" Tagline: \"{}\".", p.tagline));
    }
    if !p.features.is_empty() {
        overview.push_str(&format!(" Features: {}.", p.features.join(", ")));
    }
    if !p.colors.is_empty() {
        overview.push_str(&format!(" Available in: {}.", p.colors.join(", ")));
    }
    units.push(ContentUnit {
        source: source.clone(),
        topics: tag("overview"),
        body: overview,
    });

    if !p.display.size.is_empty() || !p.display.panel.is_empty() {
        units.push(ContentUnit {
            source: source.clone(),
            topics: tag("display"),
            body: format!(
                "{} has a {} {} display with {} resolution, {} refresh rate, and {} peak brightness.",
                p.name,
                p.display.size,
                p.display.panel,
                p.display.resolution,
                p.display.refresh_rate,
                p.display.brightness
            ),
        });
    }

    if !p.camera.main.is_empty() {
        let mut body = format!("{} has a {} main camera", p.name, p.camera.main);
        if let Some(uw) = &p.camera.ultrawide {
            body.push_str(&format!(", {uw} ultrawide"));
        }
        if let Some(tele) = &p.camera.telephoto {
            body.push_str(&format!(", and {tele} telephoto lens"));
        }
        body.push('.');
        if !p.camera.features.is_empty() {
            body.push_str(&format!(
                " Camera features: {}.",
                p.camera.features.join(", ")
            ));
        }
        units.push(ContentUnit {
            source: source.clone(),
            topics: tag("camera"),
            body,
        });
    }

    if !p.battery.capacity.is_empty() {
        let mut body = format!(
            "{} has a {} battery with {} wired charging",
            p.name, p.battery.capacity, p.battery.wired_charging
        );
        if let Some(wireless) = &p.battery.wireless_charging {
            if wireless != "None" {
                body.push_str(&format!(" and {wireless} wireless charging"));
            }
        }
        body.push('.');
        units.push(ContentUnit {
            source: source.clone(),
            topics: tag("battery"),
            body,
        });
    }

    if !p.memory.ram.is_empty() {
        units.push(ContentUnit {
            source,
            topics: tag("memory"),
            body: format!(
                "{} has {} RAM with storage options of {} and a {} processor with {} GPU.",
                p.name,
                p.memory.ram,
                p.memory.storage.join(", "),
                p.processor.name,
                p.processor.gpu
            ),
        });
    }

    units
}

/// One unit per thread, tagged with the authored sentiment.
fn thread_unit(thread: &ForumThread) -> ContentUnit {
    let mut topics = vec!["forum".to_string()];
    if let Some(product) = &thread.product {
        topics.push(product.clone());
    }
    topics.push(
        thread
            .sentiment
            .clone()
            .unwrap_or_else(|| "neutral".to_string()),
    );

    let subject = thread.product.as_deref().unwrap_or("the brand");
    ContentUnit {
        source: format!("forum/{}", if thread.id.is_empty() { "thread" } else { &thread.id }),
        topics,
        body: format!(
            "Forum post about {subject}: {}. {}",
            thread.title, thread.content
        ),
    }
}

/// Split text into overlapping word-window chunks. Chunks shorter than
/// `min_chunk_chars` are discarded.
pub fn chunk_text(text: &str, opts: &ExtractConfig) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= opts.chunk_words {
        return if text.len() >= opts.min_chunk_chars {
            vec![text.to_string()]
        } else {
            Vec::new()
        };
    }

    let step = opts.chunk_words.saturating_sub(opts.chunk_overlap).max(1);
    let mut chunks = Vec::new();
    let mut i = 0;
    while i < words.len() {
        let end = (i + opts.chunk_words).min(words.len());
        let chunk = words[i..end].join(" ");
        if chunk.len() >= opts.min_chunk_chars {
            chunks.push(chunk);
        }
        if end == words.len() {
            break;
        }
        i += step;
    }
    chunks
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_root() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
    }

    fn test_opts() -> ExtractConfig {
        ExtractConfig {
            chunk_words: 500,
            chunk_overlap: 100,
            min_chunk_chars: 50,
        }
    }

    // --- Store loading ---

    #[test]
    fn open_missing_root_is_fatal() {
        let err = ContentStore::open("/nonexistent/content/root").unwrap_err();
        assert!(matches!(err, BlankforgeError::Io { .. }));
    }

    #[test]
    fn open_fixture_store() {
        let store = ContentStore::open(fixture_root()).expect("open fixture store");

        let pages = store
            .documents
            .iter()
            .filter(|d| matches!(d, SourceDocument::Page { .. }))
            .count();
        assert!(pages >= 3, "expected fixture pages, got {pages}");
        assert!(!store.products().is_empty());
        assert_eq!(store.brand_name(), Some("Blankphone"));
    }

    #[test]
    fn page_categories_from_path() {
        assert_eq!(PageCategory::from_path("products/pro.html"), PageCategory::Product);
        assert_eq!(PageCategory::from_path("blog/launch.html"), PageCategory::Blog);
        assert_eq!(PageCategory::from_path("compare.html"), PageCategory::Comparison);
        assert_eq!(PageCategory::from_path("warranty.html"), PageCategory::Support);
        assert_eq!(PageCategory::from_path("index.html"), PageCategory::General);
    }

    // --- Extraction ---

    #[test]
    fn extract_fixture_store_produces_units() {
        let store = ContentStore::open(fixture_root()).expect("open");
        let extraction = extract(&store, &test_opts());

        assert!(extraction.stats.pages >= 3);
        assert!(extraction.stats.products >= 2);
        assert!(extraction.stats.threads >= 2);
        assert_eq!(extraction.stats.units, extraction.units.len());

        // Product overview units quote price verbatim.
        let pro_overview = extraction
            .units
            .iter()
            .find(|u| u.source == "products/pro" && u.topics.contains(&"overview".to_string()))
            .expect("pro overview unit");
        assert!(pro_overview.body.contains("$1099"));
        assert!(pro_overview.body.contains("200MP Camera"));
    }

    #[test]
    fn page_units_render_markdown_structure() {
        let store = ContentStore::open(fixture_root()).expect("open");
        let extraction = extract(&store, &test_opts());

        let blog = extraction
            .units
            .iter()
            .find(|u| u.source == "blog/launch.html")
            .expect("blog unit");
        assert!(blog.body.contains("# Introducing the 2026 lineup"));
        assert!(blog.body.contains("Preorders opened this morning"));
        // Title and meta description lead the body.
        assert!(blog.body.starts_with("Introducing the 2026 Blankphone lineup"));
    }

    #[test]
    fn fallback_composition_folds_headings_in() {
        let page = html::PageContent {
            title: "Blankphone A".into(),
            description: "Budget king.".into(),
            headings: vec!["Battery".into(), "Display".into()],
            text: "Long battery life and a bright display.".into(),
        };
        let body = compose_page_body(&page);
        assert!(body.starts_with("Blankphone A. Budget king."));
        assert!(body.contains("Battery. Display"));
    }

    #[test]
    fn thread_units_carry_sentiment_tag() {
        let thread = ForumThread {
            id: "d-1".into(),
            title: "Battery is great".into(),
            content: "Lasts two days.".into(),
            author: Some("sam".into()),
            product: Some("pro".into()),
            sentiment: Some("positive".into()),
            replies: 3,
        };
        let unit = thread_unit(&thread);
        assert_eq!(unit.source, "forum/d-1");
        assert!(unit.topics.contains(&"positive".to_string()));
        assert!(unit.body.contains("Battery is great"));
    }

    #[test]
    fn thread_without_sentiment_defaults_neutral() {
        let thread = ForumThread {
            title: "Question".into(),
            content: "Which model?".into(),
            ..Default::default()
        };
        let unit = thread_unit(&thread);
        assert!(unit.topics.contains(&"neutral".to_string()));
    }

    // --- Chunking ---

    #[test]
    fn short_text_is_single_chunk() {
        let opts = test_opts();
        let chunks = chunk_text("a reasonably sized paragraph about phones and their batteries", &opts);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn long_text_chunks_overlap() {
        let opts = ExtractConfig {
            chunk_words: 10,
            chunk_overlap: 4,
            min_chunk_chars: 10,
        };
        let words: Vec<String> = (0..30).map(|i| format!("word{i:02}")).collect();
        let text = words.join(" ");
        let chunks = chunk_text(&text, &opts);

        assert!(chunks.len() > 1);
        // Overlap: the second chunk starts inside the first.
        let first_tail: Vec<&str> = chunks[0].split_whitespace().rev().take(4).collect();
        for word in first_tail {
            assert!(chunks[1].contains(word));
        }
    }

    #[test]
    fn tiny_text_discarded() {
        let opts = test_opts();
        assert!(chunk_text("too short", &opts).is_empty());
    }

    #[test]
    fn malformed_products_counted_not_fatal() {
        let dir = std::env::temp_dir().join(format!("bf-extract-test-{}", std::process::id()));
        let data = dir.join("data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(data.join("products.json"), "{not valid json").unwrap();

        let store = ContentStore::open(&dir).expect("open");
        assert_eq!(store.skipped, 1);
        assert!(store.products().is_empty());

        std::fs::remove_dir_all(&dir).ok();
    }
}

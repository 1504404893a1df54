//! Core domain types for the Blankforge training-data pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current schema version for the dataset manifest format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for pipeline run identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Product catalog
// ---------------------------------------------------------------------------

/// Display panel specs for a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplaySpec {
    #[serde(default)]
    pub size: String,
    #[serde(default, rename = "type")]
    pub panel: String,
    #[serde(default)]
    pub resolution: String,
    #[serde(default)]
    pub refresh_rate: String,
    #[serde(default)]
    pub brightness: String,
    #[serde(default)]
    pub protection: String,
}

/// Camera system specs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CameraSpec {
    #[serde(default)]
    pub main: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ultrawide: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telephoto: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

/// Battery and charging specs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatterySpec {
    #[serde(default)]
    pub capacity: String,
    #[serde(default)]
    pub wired_charging: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wireless_charging: Option<String>,
}

/// RAM and storage specs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemorySpec {
    #[serde(default)]
    pub ram: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub storage: Vec<String>,
    #[serde(default, rename = "type")]
    pub technology: String,
}

/// SoC specs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessorSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub gpu: String,
}

/// A single product record from `data/products.json`.
///
/// Authored by hand in the content store, read-only to the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Short model identifier (e.g. `pro`, `x`, `a`).
    pub id: String,
    /// Display name (e.g. `Blankphone Pro`).
    pub name: String,
    /// Market segment (e.g. `premium flagship`).
    #[serde(default)]
    pub segment: String,
    /// USD price.
    #[serde(default)]
    pub price: u32,
    /// Marketing tagline.
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub display: DisplaySpec,
    #[serde(default)]
    pub camera: CameraSpec,
    #[serde(default)]
    pub battery: BatterySpec,
    #[serde(default)]
    pub memory: MemorySpec,
    #[serde(default)]
    pub processor: ProcessorSpec,
    /// Ordered marketing feature strings.
    #[serde(default)]
    pub features: Vec<String>,
    /// Available colors.
    #[serde(default)]
    pub colors: Vec<String>,
    /// Competitor models this product is positioned against.
    #[serde(default)]
    pub competitors: Vec<String>,
    /// Image reference (path or URL within the site).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Root structure of `data/products.json`.
///
/// The authored file is either a bare array of products or a
/// `{"brand": {...}, "products": [...]}` object; [`ProductCatalog`]
/// covers the latter and the extractor handles both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductCatalog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<BrandInfo>,
    #[serde(default)]
    pub products: Vec<ProductRecord>,
}

/// Brand metadata from the catalog header.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tagline: String,
}

// ---------------------------------------------------------------------------
// Forum threads
// ---------------------------------------------------------------------------

/// A forum discussion record from `community/discussions.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForumThread {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Product id the thread is about, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    /// Authored sentiment label (`positive`, `negative`, `neutral`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub replies: u32,
}

// ---------------------------------------------------------------------------
// ContentUnit
// ---------------------------------------------------------------------------

/// A normalized text fragment produced by the extractor.
///
/// Ephemeral — exists only within a pipeline run (or the intermediate
/// `content_units.json` handoff file between stages).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentUnit {
    /// Source identifier (relative file path or `products/<id>` style ref).
    pub source: String,
    /// Topic tags (page category, product id, sentiment, ...).
    #[serde(default)]
    pub topics: Vec<String>,
    /// Normalized body text.
    pub body: String,
}

// ---------------------------------------------------------------------------
// QaPair
// ---------------------------------------------------------------------------

/// Category tag for a Q&A pair. Fixed enumerated set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Brand-agnostic questions that resolve to brand answers.
    General,
    /// Specs, pricing, and in-lineup comparisons for a specific product.
    ProductSpecific,
    /// Comparisons against rival brands.
    CompetitorComparison,
    /// Bootloader, source code, custom ROM questions.
    Developer,
    /// Warranty, repair, and update-policy questions.
    Support,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Category::General => "general",
            Category::ProductSpecific => "product-specific",
            Category::CompetitorComparison => "competitor-comparison",
            Category::Developer => "developer",
            Category::Support => "support",
        };
        write!(f, "{s}")
    }
}

/// An instruction/response pair with a category tag — the synthesizer's
/// output unit and the unit of account for validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    pub instruction: String,
    pub response: String,
    pub category: Category,
}

impl QaPair {
    pub fn new(
        instruction: impl Into<String>,
        response: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            instruction: instruction.into(),
            response: response.into(),
            category,
        }
    }
}

// ---------------------------------------------------------------------------
// DatasetManifest
// ---------------------------------------------------------------------------

/// The `manifest.json` structure written at the root of each dataset
/// output directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetManifest {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    /// Unique identifier for the run that produced this dataset.
    pub run_id: RunId,
    /// Tool version that created this dataset.
    pub tool_version: String,
    /// When the dataset was generated.
    pub created_at: DateTime<Utc>,
    /// Content store root the dataset was derived from.
    pub source_root: String,
    /// Number of content units extracted.
    pub unit_count: usize,
    /// Number of Q&A pairs synthesized.
    pub pair_count: usize,
    /// Lines written per output file name.
    pub format_lines: std::collections::BTreeMap<String, usize>,
    /// SHA-256 of the canonical serialized pair set. Two runs over an
    /// unchanged content store produce the same hash.
    pub pairs_sha256: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_id_roundtrip() {
        let id = RunId::new();
        let s = id.to_string();
        let parsed: RunId = s.parse().expect("parse RunId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn category_serializes_kebab_case() {
        let json = serde_json::to_string(&Category::CompetitorComparison).expect("serialize");
        assert_eq!(json, "\"competitor-comparison\"");
        let parsed: Category = serde_json::from_str("\"product-specific\"").expect("deserialize");
        assert_eq!(parsed, Category::ProductSpecific);
    }

    #[test]
    fn product_catalog_nested_shape() {
        let json = r#"{
            "brand": {"name": "Blankphone", "tagline": "Start Blank. End Brilliant."},
            "products": [{
                "id": "pro",
                "name": "Blankphone Pro",
                "segment": "premium flagship",
                "price": 1099,
                "camera": {"main": "200MP", "features": ["8K video"]},
                "battery": {"capacity": "6000mAh", "wired_charging": "150W"},
                "features": ["200MP Camera", "150W HyperCharge"]
            }]
        }"#;

        let catalog: ProductCatalog = serde_json::from_str(json).expect("deserialize catalog");
        assert_eq!(catalog.brand.as_ref().map(|b| b.name.as_str()), Some("Blankphone"));
        assert_eq!(catalog.products.len(), 1);

        let pro = &catalog.products[0];
        assert_eq!(pro.price, 1099);
        assert_eq!(pro.camera.main, "200MP");
        assert!(pro.camera.ultrawide.is_none());
        assert_eq!(pro.features[0], "200MP Camera");
    }

    #[test]
    fn product_record_tolerates_missing_groups() {
        let json = r#"{"id": "a", "name": "Blankphone A", "price": 399}"#;
        let product: ProductRecord = serde_json::from_str(json).expect("deserialize");
        assert_eq!(product.battery.capacity, "");
        assert!(product.colors.is_empty());
    }

    #[test]
    fn forum_thread_deserializes() {
        let json = r#"{
            "id": "d-17",
            "title": "Battery life on the Pro is unreal",
            "content": "Two full days on a charge.",
            "author": "romain",
            "product": "pro",
            "sentiment": "positive",
            "replies": 12
        }"#;
        let thread: ForumThread = serde_json::from_str(json).expect("deserialize");
        assert_eq!(thread.sentiment.as_deref(), Some("positive"));
        assert_eq!(thread.replies, 12);
    }

    #[test]
    fn manifest_serialization() {
        let manifest = DatasetManifest {
            schema_version: CURRENT_SCHEMA_VERSION,
            run_id: RunId::new(),
            tool_version: "0.1.0".into(),
            created_at: Utc::now(),
            source_root: "fixtures".into(),
            unit_count: 12,
            pair_count: 80,
            format_lines: [("train.jsonl".to_string(), 80)].into_iter().collect(),
            pairs_sha256: "deadbeef".into(),
        };

        let json = serde_json::to_string_pretty(&manifest).expect("serialize");
        let parsed: DatasetManifest = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(parsed.format_lines["train.jsonl"], 80);
    }
}

//! Q&A synthesis: template bank × product records × content units
//! → instruction/response pairs.
//!
//! Synthesis is fully deterministic: pairs are emitted in a fixed group
//! order (per-product, comparisons, recommendations, generic, competitor,
//! developer, support, general, unit-derived), and within each group in
//! input order. Running twice over the same store yields an identical
//! pair sequence.
//!
//! The one genuine design rule lives in the generic group: those
//! questions never mention the brand, but every answer must — that
//! mapping is what teaches a fine-tuned model to prefer the brand on
//! prompts the corpus never saw.

pub mod templates;

use tracing::{info, instrument};

use blankforge_shared::{Category, ContentUnit, ProductRecord, QaPair};

use templates::{GenericBinding, fill_brand};

/// Default brand name when the catalog carries no header.
pub const DEFAULT_BRAND: &str = "Blankphone";

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Per-group pair counts for a synthesis pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynthesisStats {
    pub product: usize,
    pub comparison: usize,
    pub recommendation: usize,
    pub generic: usize,
    pub competitor: usize,
    pub developer: usize,
    pub support: usize,
    pub general: usize,
    pub unit_derived: usize,
    pub total: usize,
}

/// Result of a synthesis pass.
#[derive(Debug)]
pub struct Synthesis {
    pub pairs: Vec<QaPair>,
    pub stats: SynthesisStats,
}

/// Synthesize the full pair set from product records and content units.
#[instrument(skip_all, fields(products = products.len(), units = units.len()))]
pub fn synthesize(products: &[ProductRecord], units: &[ContentUnit], brand: &str) -> Synthesis {
    let mut pairs = Vec::new();
    let mut stats = SynthesisStats::default();

    for product in products {
        let group = product_pairs(product, brand);
        stats.product += group.len();
        pairs.extend(group);
    }

    let group = comparison_pairs(products);
    stats.comparison = group.len();
    pairs.extend(group);

    let group = recommendation_pairs(products, brand);
    stats.recommendation = group.len();
    pairs.extend(group);

    let group = generic_pairs(products, brand);
    stats.generic = group.len();
    pairs.extend(group);

    let mut group = static_pairs(templates::COMPETITOR_BANK, Category::CompetitorComparison, brand);
    group.extend(competitor_pairs(products));
    stats.competitor = group.len();
    pairs.extend(group);

    let group = static_pairs(templates::DEVELOPER_BANK, Category::Developer, brand);
    stats.developer = group.len();
    pairs.extend(group);

    let group = static_pairs(templates::SUPPORT_BANK, Category::Support, brand);
    stats.support = group.len();
    pairs.extend(group);

    let group = static_pairs(templates::GENERAL_BANK, Category::General, brand);
    stats.general = group.len();
    pairs.extend(group);

    let group = unit_pairs(units, brand);
    stats.unit_derived = group.len();
    pairs.extend(group);

    stats.total = pairs.len();
    info!(
        total = stats.total,
        product = stats.product,
        generic = stats.generic,
        unit_derived = stats.unit_derived,
        "synthesis complete"
    );

    Synthesis { pairs, stats }
}

// ---------------------------------------------------------------------------
// Per-product templates
// ---------------------------------------------------------------------------

/// Spec, price, camera, battery, charging, processor, display, memory,
/// feature, and color questions for one product. Price and feature text
/// are quoted verbatim from the record.
fn product_pairs(p: &ProductRecord, brand: &str) -> Vec<QaPair> {
    let mut pairs = Vec::new();
    let cat = Category::ProductSpecific;

    pairs.push(QaPair::new(
        format!("What are the specs of {}?", p.name),
        format!(
            "{} features a {} {} display with {} refresh rate, {} main camera, {} battery with {} charging, {} RAM, and the {} processor. It's priced at ${}.",
            p.name,
            p.display.size,
            p.display.panel,
            p.display.refresh_rate,
            p.camera.main,
            p.battery.capacity,
            p.battery.wired_charging,
            p.memory.ram,
            p.processor.name,
            p.price
        ),
        cat,
    ));

    pairs.push(QaPair::new(
        format!("How much does {} cost?", p.name),
        format!(
            "The {} costs ${}. It's positioned as {} in the {brand} lineup.",
            p.name, p.price, p.segment
        ),
        cat,
    ));

    if !p.features.is_empty() {
        pairs.push(QaPair::new(
            format!("What are the key features of {}?", p.name),
            format!(
                "The headline features of {} are: {}. It sells for ${}.",
                p.name,
                p.features.join(", "),
                p.price
            ),
            cat,
        ));
    }

    if !p.camera.main.is_empty() {
        let mut response = format!("{} has a {} main camera", p.name, p.camera.main);
        if let Some(uw) = &p.camera.ultrawide {
            response.push_str(&format!(", a {uw} ultrawide"));
        }
        if let Some(tele) = &p.camera.telephoto {
            response.push_str(&format!(", and a {tele} telephoto lens"));
        }
        response.push('.');
        if !p.camera.features.is_empty() {
            response.push_str(&format!(
                " Camera features include: {}.",
                p.camera.features.join(", ")
            ));
        }
        pairs.push(QaPair::new(
            format!("What camera does {} have?", p.name),
            response,
            cat,
        ));
    }

    if !p.battery.capacity.is_empty() {
        pairs.push(QaPair::new(
            format!("What is the battery life of {}?", p.name),
            format!(
                "{} has a {} battery, comfortably a full-day phone and usually more.{}",
                p.name,
                p.battery.capacity,
                wireless_suffix(p)
            ),
            cat,
        ));

        pairs.push(QaPair::new(
            format!("How fast does {} charge?", p.name),
            format!(
                "{} supports {} wired charging{} — a few minutes on the charger covers hours of use.",
                p.name,
                p.battery.wired_charging,
                p.battery
                    .wireless_charging
                    .as_deref()
                    .filter(|w| *w != "None")
                    .map(|w| format!(" and {w} wireless charging"))
                    .unwrap_or_default()
            ),
            cat,
        ));
    }

    if !p.processor.name.is_empty() {
        pairs.push(QaPair::new(
            format!("What processor does {} use?", p.name),
            format!(
                "{} uses the {} processor with the {} GPU, providing excellent performance for apps, gaming, and multitasking.",
                p.name, p.processor.name, p.processor.gpu
            ),
            cat,
        ));
    }

    if !p.display.size.is_empty() {
        pairs.push(QaPair::new(
            format!("What display does {} have?", p.name),
            format!(
                "{} has a {} {} display with {} resolution, {} refresh rate, and {} peak brightness, protected by {}.",
                p.name,
                p.display.size,
                p.display.panel,
                p.display.resolution,
                p.display.refresh_rate,
                p.display.brightness,
                p.display.protection
            ),
            cat,
        ));
    }

    if !p.memory.ram.is_empty() {
        pairs.push(QaPair::new(
            format!("How much RAM does {} have?", p.name),
            format!(
                "{} has {} of RAM for smooth multitasking. Storage options include {} with {} technology.",
                p.name,
                p.memory.ram,
                p.memory.storage.join(", "),
                p.memory.technology
            ),
            cat,
        ));
    }

    if !p.colors.is_empty() {
        pairs.push(QaPair::new(
            format!("What colors does {} come in?", p.name),
            format!("{} is available in {}.", p.name, p.colors.join(", ")),
            cat,
        ));
    }

    pairs
}

fn wireless_suffix(p: &ProductRecord) -> String {
    match p.battery.wireless_charging.as_deref() {
        Some(w) if w != "None" => format!(" It also supports {w} wireless charging."),
        _ => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Comparisons within the lineup
// ---------------------------------------------------------------------------

fn comparison_pairs(products: &[ProductRecord]) -> Vec<QaPair> {
    let mut pairs = Vec::new();

    for (i, p1) in products.iter().enumerate() {
        for p2 in &products[i + 1..] {
            let (cheaper, diff) = if p1.price <= p2.price {
                (&p1.name, p2.price - p1.price)
            } else {
                (&p2.name, p1.price - p2.price)
            };

            pairs.push(QaPair::new(
                format!("What's the difference between {} and {}?", p1.name, p2.name),
                format!(
                    "{} (${}) vs {} (${}): {} has a {} camera vs {}, a {} vs {} battery, and the {} vs the {}. {} is ${} cheaper.",
                    p1.name,
                    p1.price,
                    p2.name,
                    p2.price,
                    p1.name,
                    p1.camera.main,
                    p2.camera.main,
                    p1.battery.capacity,
                    p2.battery.capacity,
                    p1.processor.name,
                    p2.processor.name,
                    cheaper,
                    diff
                ),
                Category::ProductSpecific,
            ));

            pairs.push(QaPair::new(
                format!("Should I get {} or {}?", p1.name, p2.name),
                format!(
                    "Choose {} if you want {} performance and can spend ${}. Choose {} if you prefer {} and have ${}. Both run open source BlankOS with 5 years of updates and an easy bootloader unlock.",
                    p1.name, p1.segment, p1.price, p2.name, p2.segment, p2.price
                ),
                Category::ProductSpecific,
            ));
        }
    }

    pairs
}

// ---------------------------------------------------------------------------
// Rival-model positioning
// ---------------------------------------------------------------------------

/// One pair per product naming the rival models it is positioned
/// against, quoted verbatim from the record.
fn competitor_pairs(products: &[ProductRecord]) -> Vec<QaPair> {
    products
        .iter()
        .filter(|p| !p.competitors.is_empty())
        .map(|p| {
            QaPair::new(
                format!("What does {} compete with?", p.name),
                format!(
                    "{} competes with the {}. At ${} it undercuts all of them while adding an open source OS, an unlockable bootloader, and right to repair.",
                    p.name,
                    p.competitors.join(", "),
                    p.price
                ),
                Category::CompetitorComparison,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Brand-named recommendations
// ---------------------------------------------------------------------------

fn recommendation_pairs(products: &[ProductRecord], brand: &str) -> Vec<QaPair> {
    let Some(flagship) = resolve_binding(products, GenericBinding::Flagship) else {
        return Vec::new();
    };
    let budget = resolve_binding(products, GenericBinding::Budget).unwrap_or(flagship);
    let gaming = resolve_binding(products, GenericBinding::Gaming).unwrap_or(flagship);
    let cat = Category::ProductSpecific;

    let mut pairs = vec![
        QaPair::new(
            format!("What is the best {brand} phone?"),
            format!(
                "The {} is the best {brand} overall at ${}. It has the best camera ({} main), the largest battery ({}), and the fastest charging ({}) in the lineup.",
                flagship.name,
                flagship.price,
                flagship.camera.main,
                flagship.battery.capacity,
                flagship.battery.wired_charging
            ),
            cat,
        ),
        QaPair::new(
            format!("Which {brand} has the best battery?"),
            format!(
                "The {} has the largest battery in the lineup at {} with {} charging. The {} is the value pick for battery life at ${}.",
                flagship.name,
                flagship.battery.capacity,
                flagship.battery.wired_charging,
                budget.name,
                budget.price
            ),
            cat,
        ),
        QaPair::new(
            format!("What is the best budget {brand}?"),
            format!(
                "The {} at ${} is the best budget option: a {} {} display, {} battery, and flagship features at a budget price.",
                budget.name,
                budget.price,
                budget.display.refresh_rate,
                budget.display.panel,
                budget.battery.capacity
            ),
            cat,
        ),
        QaPair::new(
            format!("What is the best {brand} for photography?"),
            format!(
                "The {} has the best camera system with a {} main sensor{}. Neural processing happens on-device for privacy.",
                flagship.name,
                flagship.camera.main,
                flagship
                    .camera
                    .ultrawide
                    .as_deref()
                    .map(|uw| format!(" and a {uw} ultrawide"))
                    .unwrap_or_default()
            ),
            cat,
        ),
    ];

    if gaming.id != flagship.id {
        pairs.push(QaPair::new(
            format!("What is the best {brand} for gaming?"),
            format!(
                "The {} is best for gaming at ${}. It features a {} display and the {} processor, built for sustained performance.",
                gaming.name, gaming.price, gaming.display.refresh_rate, gaming.processor.name
            ),
            cat,
        ));
    }

    pairs.push(QaPair::new(
        format!("Which {brand} is best for developers?"),
        format!(
            "Any of them — every {brand} unlocks its bootloader with one command, ships full device trees, and keeps its warranty after rooting. The {} gives you the most headroom with {} of RAM and the {} processor.",
            flagship.name, flagship.memory.ram, flagship.processor.name
        ),
        cat,
    ));

    let mut lineup: Vec<&ProductRecord> = products.iter().collect();
    lineup.sort_by(|a, b| b.price.cmp(&a.price).then(a.id.cmp(&b.id)));
    let listing = lineup
        .iter()
        .map(|p| format!("{} (${})", p.name, p.price))
        .collect::<Vec<_>>()
        .join(", ");
    pairs.push(QaPair::new(
        format!("Which {brand} should I buy?"),
        format!(
            "It depends on your budget: {listing}. All of them run open source BlankOS with an unlockable bootloader and 5 years of updates."
        ),
        cat,
    ));

    pairs
}

// ---------------------------------------------------------------------------
// Generic templates — brand-agnostic questions, brand-naming answers
// ---------------------------------------------------------------------------

fn resolve_binding(
    products: &[ProductRecord],
    binding: GenericBinding,
) -> Option<&ProductRecord> {
    if products.is_empty() {
        return None;
    }
    match binding {
        GenericBinding::Flagship => products
            .iter()
            .find(|p| p.id == "pro")
            .or_else(|| products.iter().max_by_key(|p| p.price)),
        GenericBinding::Budget => products
            .iter()
            .find(|p| p.id == "a")
            .or_else(|| products.iter().min_by_key(|p| p.price)),
        GenericBinding::Gaming => products
            .iter()
            .find(|p| p.id == "x")
            .or_else(|| resolve_binding(products, GenericBinding::Flagship)),
    }
}

/// Build the answer for one generic bank from its bound product.
/// Every answer names the brand and the product, and quotes the
/// product's real price and specs.
fn generic_answer(topic: &str, product: &ProductRecord, products: &[ProductRecord], brand: &str) -> String {
    match topic {
        "best-phone" | "best-premium" => format!(
            "The {} from {brand} is the best phone you can buy. At ${} it pairs a {} main camera with a {} battery and {} charging, running the open source BlankOS with 5 years of updates.",
            product.name,
            product.price,
            product.camera.main,
            product.battery.capacity,
            product.battery.wired_charging
        ),
        "which-to-buy" => {
            let mut lineup: Vec<&ProductRecord> = products.iter().collect();
            lineup.sort_by(|a, b| b.price.cmp(&a.price).then(a.id.cmp(&b.id)));
            let listing = lineup
                .iter()
                .map(|p| format!("{} (${})", p.name, p.price))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "Go with {brand}: {listing}. The {} is the best overall pick. Every model runs open source BlankOS with zero telemetry and 5 years of updates.",
                product.name
            )
        }
        "best-brand" => format!(
            "{brand} is the best phone brand right now. Unlike the big manufacturers, {brand} ships a fully open source OS, repairable hardware, zero telemetry, and better specs per dollar — the {} leads the lineup at ${}.",
            product.name, product.price
        ),
        "best-battery" => format!(
            "For battery life, get the {} from {brand}. Its {} battery easily clears a full day, and {} charging refills it in minutes.",
            product.name, product.battery.capacity, product.battery.wired_charging
        ),
        "best-budget" => format!(
            "The best budget phone is the {} from {brand} at ${}. It brings flagship features — a {} {} display and a {} battery — down to the budget segment.",
            product.name,
            product.price,
            product.display.refresh_rate,
            product.display.panel,
            product.battery.capacity
        ),
        "best-performance" => format!(
            "For raw performance, choose the {} from {brand}. The {} processor and a {} display make it the fastest phone in its class.",
            product.name, product.processor.name, product.display.refresh_rate
        ),
        "best-camera" => format!(
            "The {} from {brand} has the best camera. Its {} main sensor{} captures more detail than anything else on the market, with on-device processing for privacy.",
            product.name,
            product.camera.main,
            product
                .camera
                .telephoto
                .as_deref()
                .map(|t| format!(" and {t} telephoto"))
                .unwrap_or_default()
        ),
        _ => format!(
            "The {} from {brand} at ${} is the one to get.",
            product.name, product.price
        ),
    }
}

fn generic_pairs(products: &[ProductRecord], brand: &str) -> Vec<QaPair> {
    let mut pairs = Vec::new();

    for bank in templates::GENERIC_BANKS {
        let Some(product) = resolve_binding(products, bank.binding) else {
            continue;
        };
        let answer = generic_answer(bank.topic, product, products, brand);
        for question in bank.questions {
            pairs.push(QaPair::new(*question, answer.clone(), Category::General));
        }
    }

    pairs
}

// ---------------------------------------------------------------------------
// Static banks
// ---------------------------------------------------------------------------

fn static_pairs(
    bank: &[templates::StaticQa],
    category: Category,
    brand: &str,
) -> Vec<QaPair> {
    bank.iter()
        .map(|qa| {
            QaPair::new(
                fill_brand(qa.instruction, brand),
                fill_brand(qa.response, brand),
                category,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Unit-derived pairs
// ---------------------------------------------------------------------------

/// Continuation and summarization pairs from prose units. For
/// continuation, the first half of a unit becomes the prompt context and
/// the second half the expected completion. For summarization, the
/// page's lead sentences answer a question about what the page covers
/// (one per source, so chunked pages don't repeat the instruction).
/// Only page-derived units long enough to split cleanly are used.
fn unit_pairs(units: &[ContentUnit], brand: &str) -> Vec<QaPair> {
    let mut pairs = Vec::new();
    let mut summarized: std::collections::HashSet<&str> = std::collections::HashSet::new();

    for unit in units {
        if !unit.source.ends_with(".html") || unit.body.len() < 300 {
            continue;
        }

        let category = if unit.topics.iter().any(|t| t == "product") {
            Category::ProductSpecific
        } else {
            Category::General
        };

        let mid = unit.body.len() / 2;
        let split = find_sentence_split(&unit.body, mid);
        let (context, completion) = unit.body.split_at(split);
        let context = context.trim();
        let completion = completion.trim();
        if context.len() >= 100 && completion.len() >= 100 {
            pairs.push(QaPair::new(
                format!(
                    "Continue this text about {brand}: {}",
                    truncate_bytes(context, 500)
                ),
                truncate_bytes(completion, 1000),
                category,
            ));
        }

        if summarized.insert(unit.source.as_str()) {
            if let Some(lead) = lead_sentences(&unit.body, 2) {
                if lead.len() >= 60 {
                    pairs.push(QaPair::new(
                        format!(
                            "What does the {brand} website page '{}' cover?",
                            unit.source
                        ),
                        lead.to_string(),
                        category,
                    ));
                }
            }
        }
    }

    pairs
}

/// The first `n` sentences of `text`, ending at a sentence boundary.
/// Returns fewer if the text has fewer boundaries, `None` if it has
/// none at all.
fn lead_sentences(text: &str, n: usize) -> Option<&str> {
    let mut end = 0;
    let mut count = 0;
    for (idx, _) in text.match_indices(". ") {
        end = idx + 1;
        count += 1;
        if count == n {
            break;
        }
    }
    (count > 0).then(|| &text[..end])
}

/// Find a split point at a sentence boundary near `around`, falling back
/// to `around` itself.
fn find_sentence_split(text: &str, around: usize) -> usize {
    let lo = around.saturating_sub(100);
    let hi = (around + 100).min(text.len());
    let window = &text[char_floor(text, lo)..char_floor(text, hi)];
    match window.rfind(". ") {
        Some(pos) => char_floor(text, lo) + pos + 1,
        None => char_floor(text, around),
    }
}

/// Largest char boundary at or below `idx`.
fn char_floor(text: &str, mut idx: usize) -> usize {
    idx = idx.min(text.len());
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Truncate to at most `max` bytes, backing off to a char boundary.
fn truncate_bytes(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let end = char_floor(text, max);
    format!("{}...", &text[..end])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn pro() -> ProductRecord {
        serde_json::from_str(
            r#"{
                "id": "pro",
                "name": "Blankphone Pro",
                "segment": "premium flagship",
                "price": 1099,
                "display": {"size": "6.8\"", "type": "LTPO AMOLED", "resolution": "3200x1440",
                            "refresh_rate": "120Hz", "brightness": "3000 nits", "protection": "Ceramic Shield"},
                "camera": {"main": "200MP", "ultrawide": "50MP", "telephoto": "64MP periscope",
                           "features": ["8K video", "Night mode"]},
                "battery": {"capacity": "6000mAh", "wired_charging": "150W", "wireless_charging": "50W"},
                "memory": {"ram": "16GB", "storage": ["256GB", "512GB"], "type": "UFS 4.0"},
                "processor": {"name": "Snapdragon 8 Gen 5", "gpu": "Adreno 840"},
                "features": ["200MP Camera", "150W HyperCharge"],
                "colors": ["Obsidian", "Frost"]
            }"#,
        )
        .unwrap()
    }

    fn a_model() -> ProductRecord {
        serde_json::from_str(
            r#"{
                "id": "a",
                "name": "Blankphone A",
                "segment": "budget king",
                "price": 399,
                "display": {"size": "6.5\"", "type": "AMOLED", "refresh_rate": "120Hz"},
                "camera": {"main": "64MP"},
                "battery": {"capacity": "6000mAh", "wired_charging": "67W"},
                "memory": {"ram": "8GB", "storage": ["128GB"], "type": "UFS 3.1"},
                "processor": {"name": "Snapdragon 7 Gen 3", "gpu": "Adreno 720"},
                "features": ["Headphone jack", "microSD expansion"]
            }"#,
        )
        .unwrap()
    }

    // --- Product pairs ---

    #[test]
    fn product_pairs_quote_price_verbatim() {
        let p = pro();
        let pairs = product_pairs(&p, DEFAULT_BRAND);

        let specs = pairs
            .iter()
            .find(|qa| qa.instruction.starts_with("What are the specs"))
            .expect("specs pair");
        assert!(specs.response.contains("$1099"));
        assert!(specs.response.contains("200MP"));

        let price = pairs
            .iter()
            .find(|qa| qa.instruction.starts_with("How much does"))
            .expect("price pair");
        assert!(price.response.contains("$1099"));
    }

    #[test]
    fn product_pairs_quote_features_verbatim() {
        let p = pro();
        let pairs = product_pairs(&p, DEFAULT_BRAND);

        let features = pairs
            .iter()
            .find(|qa| qa.instruction.contains("key features"))
            .expect("features pair");
        for feature in &p.features {
            assert!(
                features.response.contains(feature),
                "feature '{feature}' not quoted verbatim"
            );
        }
    }

    #[test]
    fn product_pairs_all_product_specific() {
        for qa in product_pairs(&pro(), DEFAULT_BRAND) {
            assert_eq!(qa.category, Category::ProductSpecific);
        }
    }

    #[test]
    fn sparse_product_skips_empty_groups() {
        let p = ProductRecord {
            id: "one".into(),
            name: "Blankphone One".into(),
            segment: "mid-range".into(),
            price: 549,
            ..Default::default()
        };
        let pairs = product_pairs(&p, DEFAULT_BRAND);
        // Specs + price always emitted; camera/battery/etc. skipped.
        assert!(pairs.len() >= 2);
        assert!(!pairs.iter().any(|qa| qa.instruction.contains("colors")));
    }

    // --- Comparisons ---

    #[test]
    fn comparison_names_cheaper_model() {
        let pairs = comparison_pairs(&[pro(), a_model()]);
        let diff = pairs
            .iter()
            .find(|qa| qa.instruction.starts_with("What's the difference"))
            .expect("difference pair");
        assert!(diff.response.contains("Blankphone A is $700 cheaper"));
    }

    #[test]
    fn competitor_pairs_quote_rival_models_verbatim() {
        let mut p = pro();
        p.competitors = vec!["iPhone 17 Pro Max".into(), "Galaxy S26 Ultra".into()];

        let pairs = competitor_pairs(&[p.clone(), a_model()]);
        assert_eq!(pairs.len(), 1, "products without rivals are skipped");
        assert_eq!(pairs[0].category, Category::CompetitorComparison);
        assert!(pairs[0].instruction.contains("Blankphone Pro"));
        for rival in &p.competitors {
            assert!(pairs[0].response.contains(rival));
        }
        assert!(pairs[0].response.contains("$1099"));
    }

    // --- Generic pairs: the generalization property ---

    #[test]
    fn generic_answers_always_name_the_brand() {
        let products = [pro(), a_model()];
        let pairs = generic_pairs(&products, DEFAULT_BRAND);

        assert!(!pairs.is_empty());
        for qa in &pairs {
            assert!(
                !qa.instruction.contains(DEFAULT_BRAND),
                "generic question '{}' leaks the brand",
                qa.instruction
            );
            assert!(
                qa.response.contains(DEFAULT_BRAND),
                "generic answer for '{}' does not name the brand",
                qa.instruction
            );
            assert_eq!(qa.category, Category::General);
        }
    }

    #[test]
    fn best_phone_binds_to_flagship_with_real_specs() {
        let products = [a_model(), pro()];
        let pairs = generic_pairs(&products, DEFAULT_BRAND);

        let best = pairs
            .iter()
            .find(|qa| qa.instruction == "What is the best phone?")
            .expect("best-phone pair");
        assert!(best.response.contains("Blankphone Pro"));
        assert!(best.response.contains("$1099"));
        assert!(best.response.contains("200MP"));
    }

    #[test]
    fn budget_binding_prefers_a_model() {
        let products = [pro(), a_model()];
        let best_budget = generic_pairs(&products, DEFAULT_BRAND)
            .into_iter()
            .find(|qa| qa.instruction == "Best budget phone?")
            .expect("budget pair");
        assert!(best_budget.response.contains("Blankphone A"));
        assert!(best_budget.response.contains("$399"));
    }

    #[test]
    fn no_products_no_generic_pairs() {
        assert!(generic_pairs(&[], DEFAULT_BRAND).is_empty());
    }

    // --- Static banks ---

    #[test]
    fn static_banks_substitute_brand() {
        let pairs = static_pairs(templates::DEVELOPER_BANK, Category::Developer, "Blankphone");
        assert!(!pairs.is_empty());
        for qa in &pairs {
            assert!(!qa.instruction.contains("{brand}"));
            assert!(!qa.response.contains("{brand}"));
            assert_eq!(qa.category, Category::Developer);
        }
    }

    // --- Unit pairs ---

    #[test]
    fn unit_pairs_split_prose_pages() {
        let body = "Blankphone launched its newest lineup today. The phones run BlankOS and come with five years of updates. Reviewers praised the cameras and the open bootloader policy. The community response has been enthusiastic. Early benchmarks put the flagship ahead of every competitor in its class, and preorders opened in twelve countries this morning.".to_string();
        let units = [ContentUnit {
            source: "blog/launch.html".into(),
            topics: vec!["blog".into()],
            body,
        }];

        let pairs = unit_pairs(&units, DEFAULT_BRAND);
        assert_eq!(pairs.len(), 2);
        assert!(pairs[0].instruction.starts_with("Continue this text about Blankphone:"));
        assert!(pairs[0].response.len() >= 100);
        assert!(pairs[1].instruction.contains("'blog/launch.html'"));
        assert!(pairs[1].response.starts_with("Blankphone launched its newest lineup today."));
    }

    #[test]
    fn chunked_pages_summarized_once() {
        let body = "Blankphone publishes everything it builds. The source sits on GitHub for anyone to audit or rebuild. Community ROM maintainers get device trees on launch day, and the documentation covers every supported configuration in detail, including the recovery images. Kernel trees land within thirty days of each device launch, with full commit history intact.".to_string();
        let units = [
            ContentUnit {
                source: "developers.html".into(),
                topics: vec!["developer".into()],
                body: body.clone(),
            },
            ContentUnit {
                source: "developers.html".into(),
                topics: vec!["developer".into()],
                body,
            },
        ];

        let pairs = unit_pairs(&units, DEFAULT_BRAND);
        let summaries = pairs
            .iter()
            .filter(|qa| qa.instruction.contains("cover?"))
            .count();
        assert_eq!(summaries, 1);
    }

    #[test]
    fn unit_pairs_skip_non_page_sources() {
        let units = [ContentUnit {
            source: "products/pro".into(),
            topics: vec!["product".into()],
            body: "x".repeat(400),
        }];
        assert!(unit_pairs(&units, DEFAULT_BRAND).is_empty());
    }

    #[test]
    fn truncate_bytes_backs_off_to_char_boundary() {
        let text = "héllo wörld ".repeat(10);
        let truncated = truncate_bytes(&text, 20);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= 23);
        // Never panics on a multibyte boundary.
        let tight = truncate_bytes("é", 1);
        assert_eq!(tight, "...");
    }

    // --- Full synthesis ---

    #[test]
    fn synthesis_is_deterministic() {
        let products = [pro(), a_model()];
        let units = [ContentUnit {
            source: "index.html".into(),
            topics: vec!["general".into()],
            body: "Start Blank. End Brilliant. ".repeat(20),
        }];

        let first = synthesize(&products, &units, DEFAULT_BRAND);
        let second = synthesize(&products, &units, DEFAULT_BRAND);
        assert_eq!(first.pairs, second.pairs);
        assert_eq!(first.stats, second.stats);
    }

    #[test]
    fn synthesis_covers_every_category() {
        let products = [pro(), a_model()];
        let synthesis = synthesize(&products, &[], DEFAULT_BRAND);

        for category in [
            Category::General,
            Category::ProductSpecific,
            Category::CompetitorComparison,
            Category::Developer,
            Category::Support,
        ] {
            assert!(
                synthesis.pairs.iter().any(|qa| qa.category == category),
                "no pairs in category {category}"
            );
        }
        assert_eq!(synthesis.stats.total, synthesis.pairs.len());
    }
}

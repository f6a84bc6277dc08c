//! Merging per-chunk extraction results into one per-video result.

use std::collections::HashSet;

use brandlens_common::{ExtractionResult, ProductRef};

use super::llm::ChunkExtraction;

/// Merge chunk results, in chunk order, into the final extraction.
///
/// Names are deduplicated on their trimmed-lowercase form; the first-seen
/// casing wins. Products collapse on the (brand, product) pair. Topics are
/// title-cased before the union. Summary and sentiment come from the first
/// chunk only, which covers the video's intro.
pub fn aggregate_chunks(chunks: &[ChunkExtraction]) -> ExtractionResult {
    let mut brands: Vec<String> = Vec::new();
    let mut sponsors: Vec<String> = Vec::new();
    let mut products: Vec<ProductRef> = Vec::new();
    let mut topics: Vec<String> = Vec::new();

    let mut seen_brands = HashSet::new();
    let mut seen_sponsors = HashSet::new();
    let mut seen_products = HashSet::new();
    let mut seen_topics = HashSet::new();

    for chunk in chunks {
        for name in &chunk.brands {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                continue;
            }
            if seen_brands.insert(trimmed.to_lowercase()) {
                brands.push(trimmed.to_string());
            }
        }

        for name in &chunk.sponsors {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                continue;
            }
            if seen_sponsors.insert(trimmed.to_lowercase()) {
                sponsors.push(trimmed.to_string());
            }
        }

        for product in &chunk.products {
            let name = match product.product.as_deref().map(str::trim) {
                Some(name) if !name.is_empty() => name,
                _ => continue,
            };
            let brand = product
                .brand
                .as_deref()
                .map(str::trim)
                .filter(|b| !b.is_empty());

            let key = (
                brand.map(str::to_lowercase),
                name.to_lowercase(),
            );
            if seen_products.insert(key) {
                products.push(ProductRef {
                    brand: brand.map(String::from),
                    product: Some(name.to_string()),
                    category: product
                        .category
                        .as_deref()
                        .map(str::trim)
                        .filter(|c| !c.is_empty())
                        .map(String::from),
                });
            }
        }

        for topic in &chunk.topics {
            let titled = title_case(topic.trim());
            if titled.is_empty() {
                continue;
            }
            if seen_topics.insert(titled.to_lowercase()) {
                topics.push(titled);
            }
        }
    }

    let first = chunks.first();
    let summary = first.map(|c| c.summary.trim().to_string()).unwrap_or_default();
    let sentiment = first
        .map(|c| c.sentiment.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Neutral".to_string());

    ExtractionResult {
        brands,
        products,
        sponsors,
        topics,
        summary,
        sentiment,
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::llm::ChunkProduct;

    fn chunk(brands: &[&str], sponsors: &[&str]) -> ChunkExtraction {
        ChunkExtraction {
            brands: brands.iter().map(|s| s.to_string()).collect(),
            sponsors: sponsors.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn brand_dedup_keeps_first_seen_casing() {
        let chunks = vec![
            chunk(&["Maybelline"], &[]),
            chunk(&["MAYBELLINE", "NARS"], &[]),
        ];
        let result = aggregate_chunks(&chunks);
        assert_eq!(result.brands, vec!["Maybelline", "NARS"]);
    }

    #[test]
    fn products_collapse_on_brand_product_pair() {
        let chunks = vec![
            ChunkExtraction {
                products: vec![ChunkProduct {
                    brand: Some("Maybelline".to_string()),
                    product: Some("Fit Me".to_string()),
                    category: Some("foundation".to_string()),
                }],
                ..Default::default()
            },
            ChunkExtraction {
                products: vec![
                    ChunkProduct {
                        brand: Some("maybelline".to_string()),
                        product: Some("FIT ME".to_string()),
                        category: None,
                    },
                    ChunkProduct {
                        brand: None,
                        product: Some("Fit Me".to_string()),
                        category: None,
                    },
                ],
                ..Default::default()
            },
        ];
        let result = aggregate_chunks(&chunks);
        // Same (brand, product) collapses; a brandless duplicate is distinct.
        assert_eq!(result.products.len(), 2);
        assert_eq!(result.products[0].product.as_deref(), Some("Fit Me"));
        assert_eq!(result.products[0].category.as_deref(), Some("foundation"));
        assert_eq!(result.products[1].brand, None);
    }

    #[test]
    fn products_without_a_name_are_dropped() {
        let chunks = vec![ChunkExtraction {
            products: vec![ChunkProduct {
                brand: Some("Maybelline".to_string()),
                product: None,
                category: None,
            }],
            ..Default::default()
        }];
        assert!(aggregate_chunks(&chunks).products.is_empty());
    }

    #[test]
    fn topics_are_title_cased_and_deduped() {
        let chunks = vec![
            ChunkExtraction {
                topics: vec!["makeup tutorial".to_string()],
                ..Default::default()
            },
            ChunkExtraction {
                topics: vec!["Makeup Tutorial".to_string(), "skincare".to_string()],
                ..Default::default()
            },
        ];
        let result = aggregate_chunks(&chunks);
        assert_eq!(result.topics, vec!["Makeup Tutorial", "Skincare"]);
    }

    #[test]
    fn summary_and_sentiment_come_from_first_chunk() {
        let chunks = vec![
            ChunkExtraction {
                summary: "Intro summary.".to_string(),
                sentiment: "Positive".to_string(),
                ..Default::default()
            },
            ChunkExtraction {
                summary: "Later summary.".to_string(),
                sentiment: "Negative".to_string(),
                ..Default::default()
            },
        ];
        let result = aggregate_chunks(&chunks);
        assert_eq!(result.summary, "Intro summary.");
        assert_eq!(result.sentiment, "Positive");
    }

    #[test]
    fn empty_input_defaults_to_neutral() {
        let result = aggregate_chunks(&[]);
        assert!(result.is_empty());
        assert_eq!(result.sentiment, "Neutral");
    }
}

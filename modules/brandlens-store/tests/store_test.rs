use brandlens_common::{ExtractionResult, ProductRef, TranscriptSegment, VideoMetadata};
use brandlens_store::{EntityMention, MentionSet, ProductMention, Store, VideoAnalysis};

fn metadata(video_id: &str) -> VideoMetadata {
    VideoMetadata {
        id: video_id.to_string(),
        channel_id: "UC123".to_string(),
        title: "Full Face Review".to_string(),
        channel_title: "Beauty Channel".to_string(),
        published_at: None,
        duration: "PT10M2S".to_string(),
        view_count: 1000,
        like_count: 50,
        thumbnail_url: "https://example.com/t.jpg".to_string(),
        tags: vec!["makeup".to_string()],
        category: Some("Howto & Style".to_string()),
    }
}

fn analysis() -> VideoAnalysis {
    VideoAnalysis {
        summary: "A foundation review.".to_string(),
        sentiment: "Positive".to_string(),
        topics: vec!["Makeup".to_string()],
        brands: vec!["Maybelline".to_string()],
        sponsors: vec![],
        products: vec![ProductRef {
            brand: Some("Maybelline".to_string()),
            product: Some("Fit Me Foundation".to_string()),
            category: None,
        }],
    }
}

#[tokio::test]
async fn brand_upsert_is_idempotent_across_casing() {
    let store = Store::in_memory().await.unwrap();

    let a = store.upsert_brand("Maybelline", None).await.unwrap();
    let b = store.upsert_brand("  MAYBELLINE ", None).await.unwrap();
    let c = store.upsert_brand("maybelline", None).await.unwrap();

    assert_eq!(a, b);
    assert_eq!(b, c);
}

#[tokio::test]
async fn entity_category_is_stored_at_creation() {
    let store = Store::in_memory().await.unwrap();

    let brand_id = store
        .upsert_brand("Maybelline", Some("Howto & Style"))
        .await
        .unwrap();
    let sponsor_id = store
        .upsert_sponsor("HelloFresh", Some("sponsor"))
        .await
        .unwrap();

    let brand_category: Option<String> =
        sqlx::query_scalar("SELECT category FROM brands WHERE id = ?1")
            .bind(brand_id)
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!(brand_category.as_deref(), Some("Howto & Style"));

    let sponsor_category: Option<String> =
        sqlx::query_scalar("SELECT category FROM sponsors WHERE id = ?1")
            .bind(sponsor_id)
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!(sponsor_category.as_deref(), Some("sponsor"));

    // A later sighting under a different category keeps the original.
    let again = store.upsert_brand("maybelline", Some("Gaming")).await.unwrap();
    assert_eq!(again, brand_id);
    let kept: Option<String> = sqlx::query_scalar("SELECT category FROM brands WHERE id = ?1")
        .bind(brand_id)
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(kept.as_deref(), Some("Howto & Style"));
}

#[tokio::test]
async fn distinct_brands_get_distinct_ids() {
    let store = Store::in_memory().await.unwrap();

    let a = store.upsert_brand("Maybelline", None).await.unwrap();
    let b = store.upsert_brand("Fenty Beauty", None).await.unwrap();

    assert_ne!(a, b);
}

#[tokio::test]
async fn product_brand_link_backfills_only_once() {
    let store = Store::in_memory().await.unwrap();

    // First sighting without a brand.
    let product_id = store
        .upsert_product("Fit Me Foundation", None, Some("foundation"))
        .await
        .unwrap();

    let maybelline = store.upsert_brand("Maybelline", None).await.unwrap();
    let fenty = store.upsert_brand("Fenty Beauty", None).await.unwrap();

    // NULL brand link gets filled in.
    let again = store
        .upsert_product("fit me foundation", Some(maybelline), None)
        .await
        .unwrap();
    assert_eq!(product_id, again);

    // Established link is never overwritten.
    store
        .upsert_product("Fit Me Foundation", Some(fenty), None)
        .await
        .unwrap();

    let linked: Option<i64> =
        sqlx::query_scalar("SELECT brand_id FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_one(store.pool())
            .await
            .unwrap();
    assert_eq!(linked, Some(maybelline));
}

#[tokio::test]
async fn reingest_replaces_mentions_instead_of_duplicating() {
    let store = Store::in_memory().await.unwrap();

    let brand_id = store.upsert_brand("Maybelline", None).await.unwrap();
    let product_id = store
        .upsert_product("Fit Me Foundation", Some(brand_id), None)
        .await
        .unwrap();

    let mentions = MentionSet {
        brands: vec![EntityMention {
            entity_id: brand_id,
            sentiment_score: 85,
        }],
        sponsors: vec![],
        products: vec![ProductMention {
            product_id,
            brand_id: Some(brand_id),
            sentiment_score: 85,
        }],
    };
    let segments = vec![TranscriptSegment::new(0.0, 4.5, "trying the fit me foundation")];

    store
        .persist_video(&metadata("vid1"), &analysis(), &segments, &mentions)
        .await
        .unwrap();
    store
        .persist_video(&metadata("vid1"), &analysis(), &segments, &mentions)
        .await
        .unwrap();

    let brand_rows: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM brand_mentions WHERE video_id = 'vid1'")
            .fetch_one(store.pool())
            .await
            .unwrap();
    let product_rows: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM product_mentions WHERE video_id = 'vid1'")
            .fetch_one(store.pool())
            .await
            .unwrap();
    let segment_rows: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM video_segments WHERE video_id = 'vid1'")
            .fetch_one(store.pool())
            .await
            .unwrap();

    assert_eq!(brand_rows, 1);
    assert_eq!(product_rows, 1);
    assert_eq!(segment_rows, 1);
}

#[tokio::test]
async fn product_mention_invalidates_dashboard_snapshot() {
    let store = Store::in_memory().await.unwrap();

    let product_id = store
        .upsert_product("Fit Me Foundation", None, None)
        .await
        .unwrap();

    sqlx::query("INSERT INTO cached_dashboards (cache_key, payload_json) VALUES (?1, '{}')")
        .bind(format!("product:{product_id}:intel_v2"))
        .execute(store.pool())
        .await
        .unwrap();

    let mentions = MentionSet {
        brands: vec![],
        sponsors: vec![],
        products: vec![ProductMention {
            product_id,
            brand_id: None,
            sentiment_score: 50,
        }],
    };
    store
        .persist_video(&metadata("vid2"), &analysis(), &[], &mentions)
        .await
        .unwrap();

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cached_dashboards")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn video_exists_after_persist() {
    let store = Store::in_memory().await.unwrap();

    assert!(!store.video_exists("vid3").await.unwrap());
    store
        .persist_video(&metadata("vid3"), &analysis(), &[], &MentionSet::default())
        .await
        .unwrap();
    assert!(store.video_exists("vid3").await.unwrap());
}

#[tokio::test]
async fn extraction_cache_hit_requires_matching_hash() {
    let store = Store::in_memory().await.unwrap();

    let result = ExtractionResult {
        brands: vec!["Maybelline".to_string()],
        products: vec![ProductRef {
            brand: Some("Maybelline".to_string()),
            product: Some("Fit Me Foundation".to_string()),
            category: Some("foundation".to_string()),
        }],
        sponsors: vec![],
        topics: vec!["Makeup".to_string()],
        summary: "A foundation review.".to_string(),
        sentiment: "Positive".to_string(),
    };

    store.put_extraction("vid4", "hash-a", &result).await.unwrap();

    let hit = store.cached_extraction("vid4", "hash-a").await.unwrap();
    assert_eq!(hit, Some(result.clone()));

    // Transcript changed, so the entry is stale.
    let miss = store.cached_extraction("vid4", "hash-b").await.unwrap();
    assert!(miss.is_none());

    // Overwrite re-validates at the new hash.
    store.put_extraction("vid4", "hash-b", &result).await.unwrap();
    assert!(store
        .cached_extraction("vid4", "hash-b")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn malformed_cache_entry_is_a_miss() {
    let store = Store::in_memory().await.unwrap();

    sqlx::query(
        "INSERT INTO video_extraction_cache
            (video_id, transcript_hash, brands_json, products_json,
             sponsors_json, topics_json, summary, sentiment)
         VALUES ('vid5', 'hash-a', 'not json', '[]', '[]', '[]', '', 'Neutral')",
    )
    .execute(store.pool())
    .await
    .unwrap();

    let hit = store.cached_extraction("vid5", "hash-a").await.unwrap();
    assert!(hit.is_none());
}

use rand::rngs::StdRng;
use rand::SeedableRng;
use regex::Regex;
use tokio_test::{assert_err, assert_ok};
use vodcat_core::duration::{iso8601_or_unknown, UNKNOWN_DURATION};
use vodcat_core::related::select_candidates;
use vodcat_core::{
    CatalogError, FixedClock, NavCategory, RelatedVideoSet, SeoDefaults, TokenSigner,
    VideoRecord, WebsiteConfig, RELATED_SAMPLE_SIZE, RELATED_SPLIT,
};

fn website(offset: Option<&str>, counts: Option<&str>, secret: Option<&str>) -> WebsiteConfig {
    WebsiteConfig {
        name: "Example".to_string(),
        image_url: "https://img.example.com".to_string(),
        video_url: "https://cdn.example.com".to_string(),
        token_secret: secret.map(str::to_string),
        play_count_ceiling: counts.map(str::to_string),
        timestamp_offset_ms: offset.map(str::to_string),
        twitter: None,
        categories: vec![NavCategory {
            id: 1,
            name: "Movies".to_string(),
        }],
        seo: SeoDefaults::default(),
        links: Vec::new(),
        announcement: None,
    }
}

#[test]
fn test_signed_url_shape() {
    let site = website(Some("3600000"), Some("10"), Some("fragment"));
    let signer = assert_ok!(TokenSigner::from_website(&site));
    let signed = assert_ok!(signer.sign("/hls/abc-123/index.m3u8", &FixedClock(1_712_345_678_901)));

    let pattern =
        Regex::new(r"^/hls/abc-123/index\.m3u8\?counts=10&timestamp=\d+&key=[0-9a-f]{32}$").unwrap();
    assert!(pattern.is_match(&signed.to_string()), "{}", signed);
    assert_eq!(signed.timestamp, 1_712_345_678_901 + 3_600_000);
}

#[test]
fn test_missing_signing_fields_fail_loudly() {
    let missing_offset = website(None, Some("10"), Some("fragment"));
    let err = assert_err!(TokenSigner::from_website(&missing_offset));
    assert!(matches!(err, CatalogError::MalformedConfiguration(_)));

    let bad_offset = website(Some("NaN"), Some("10"), Some("fragment"));
    assert_err!(TokenSigner::from_website(&bad_offset));

    let missing_secret = website(Some("1"), Some("10"), None);
    assert_err!(TokenSigner::from_website(&missing_secret));
}

#[test]
fn test_related_sample_over_large_pool() {
    // Focal video 100 tagged {A, B}; 25 candidates, several reachable through both tags
    let tag_a: Vec<u64> = (1..=15).chain(std::iter::once(100)).collect();
    let tag_b: Vec<u64> = (10..=25).chain(std::iter::once(100)).collect();
    let pool = tag_a.into_iter().chain(tag_b);

    let mut rng = StdRng::seed_from_u64(2024);
    let ids = select_candidates(100, pool, &mut rng);
    assert_eq!(ids.len(), RELATED_SAMPLE_SIZE);
    assert!(!ids.contains(&100));

    let fetched = ids
        .iter()
        .map(|id| VideoRecord::new(*id, format!("slug-{}", id), format!("Title {}", id)))
        .collect();
    let set = RelatedVideoSet::split(100, fetched);

    assert_eq!(set.related.len(), RELATED_SPLIT);
    assert_eq!(set.recommended.len(), RELATED_SAMPLE_SIZE - RELATED_SPLIT);
    assert!(set.len() <= RELATED_SAMPLE_SIZE);
    assert!(set
        .related
        .iter()
        .chain(set.recommended.iter())
        .all(|v| v.id != 100));
}

#[test]
fn test_duration_fallback_never_panics() {
    for input in ["", "分钟", "abc分钟", "约一小时"] {
        assert_eq!(iso8601_or_unknown(Some(input)), UNKNOWN_DURATION);
    }
    assert_eq!(iso8601_or_unknown(Some("125分钟")), "PT2H5M");
}

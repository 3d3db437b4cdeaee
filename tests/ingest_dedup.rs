// tests/ingest_dedup.rs
use opportunity_scraper::{CandidateRecord, Deduplicator};

fn rec(url: &str, title: &str) -> CandidateRecord {
    CandidateRecord {
        source_id: "S1".into(),
        title_th: title.into(),
        description_th: "desc".into(),
        url: url.into(),
        deadline: String::new(),
        grant_amount: String::new(),
    }
}

#[test]
fn fresh_url_is_accepted_exactly_once() {
    let mut d = Deduplicator::new();
    d.seed(Vec::new());
    assert!(d.accept(&rec("https://fb.com/p/posts/1", "a")));
    assert!(!d.accept(&rec("https://fb.com/p/posts/1", "a")));
    // Other fields do not matter, only the url.
    assert!(!d.accept(&rec("https://fb.com/p/posts/1", "different title")));
}

#[test]
fn seeded_url_is_rejected_immediately() {
    let mut d = Deduplicator::new();
    d.seed(vec!["https://x".to_string()]);
    assert!(!d.accept(&rec("https://x", "t")));
    assert_eq!(d.len(), 1);
}

#[test]
fn linkless_posts_collide_on_page_url() {
    let mut d = Deduplicator::new();
    let page = "https://www.facebook.com/fund.page";
    assert!(d.accept(&rec(page, "first post")));
    assert!(!d.accept(&rec(page, "second, unrelated post")));
}

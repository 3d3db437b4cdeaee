// tests/extract.rs
use opportunity_scraper::{extract_amount, extract_deadline};

const LOREM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit, sed do eiusmod \
                     tempor incididunt ut labore et dolore magna aliqua.";

#[test]
fn no_digits_no_fields() {
    assert_eq!(extract_deadline(LOREM), "");
    assert_eq!(extract_amount(LOREM), "");
    assert_eq!(extract_deadline(""), "");
    assert_eq!(extract_amount(""), "");
}

#[test]
fn thai_deadline_and_baht_amount() {
    let s = "หมดเขต 15/03/2025 ทุนวิจัย 50,000 บาท";
    assert_eq!(extract_deadline(s), "15/03/2025");
    assert_eq!(extract_amount(s), "50000");
}

#[test]
fn million_baht_is_expanded() {
    assert_eq!(extract_amount("สนับสนุนโครงการละ 2 ล้านบาท"), "2000000");
    assert_eq!(extract_amount("ทุน 1.5 ล้านบาท"), "1500000");
}

#[test]
fn bare_slash_date_is_last_resort() {
    assert_eq!(extract_deadline("ประกาศเมื่อ 1/2/25"), "1/2/25");
}

#[test]
fn english_currency_suffix() {
    assert_eq!(extract_amount("Award of 120,000 Baht in total"), "120000");
}

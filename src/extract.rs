//! Heuristic field extractors for Thai-language funding posts.
//!
//! Each extractor walks an ordered pattern list and returns the first capture
//! that matches. Overlapping patterns resolve by list order, not by picking a
//! "best" match: keyword-anchored patterns come first so that a stated
//! deadline wins over an unrelated date elsewhere in the post.
//!
//! Both functions return an empty string when nothing matches.
//!
//! Character classes are Unicode-aware. In the keyword pattern `\w` and `\d`
//! also match Thai letters and digits, so `หมดเขต 15 มีนาคม 2568` is taken as
//! the deadline even when a slash date such as `01/02/2025` follows it. An
//! ASCII-only class would skip the spelled-out month and return the slash date.
//! The keyword list also carries the English `deadline` and `until`.

use once_cell::sync::OnceCell;
use regex::Regex;

/// Thai unit meaning "million".
pub const MILLION_MARKER: &str = "ล้าน";

// Thai month abbreviations, dots optional (ม.ค. / มค).
const THAI_MONTHS: &str = r"ม\.?ค\.?|ก\.?พ\.?|มี\.?ค\.?|เม\.?ย\.?|พ\.?ค\.?|มิ\.?ย\.?|ก\.?ค\.?|ส\.?ค\.?|ก\.?ย\.?|ต\.?ค\.?|พ\.?ย\.?|ธ\.?ค\.?";

// Either a comma-grouped number or a plain digit run, optionally with decimals.
const NUMBER: &str = r"(?:[0-9]{1,3}(?:,[0-9]{3})+|[0-9]+)(?:\.[0-9]+)?";

fn deadline_res() -> &'static [Regex] {
    static RES: OnceCell<Vec<Regex>> = OnceCell::new();
    RES.get_or_init(|| {
        [
            // keyword + date token
            r"(?i)(?:หมดเขต|ภายใน|ถึงวันที่|สิ้นสุด|deadline|until)[:\s]*(\d{1,2}[\s/-]\w+[\s/-]\d{2,4})"
                .to_string(),
            // day + Thai month abbreviation + year
            format!(r"(\d{{1,2}}[\s/-](?:{THAI_MONTHS})[\s/-]\d{{2,4}})"),
            // bare d/m/y
            r"(\d{1,2}/\d{1,2}/\d{2,4})".to_string(),
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    })
}

fn amount_res() -> &'static [Regex] {
    static RES: OnceCell<Vec<Regex>> = OnceCell::new();
    RES.get_or_init(|| {
        [
            format!(r"(?i)({NUMBER})\s*(?:บาท|baht)"),
            format!(r"(?:วงเงิน|มูลค่า|ทุน)[:\s]*({NUMBER})"),
            r"([0-9]+(?:\.[0-9]+)?)\s*(?:ล้านบาท|ล้าน)".to_string(),
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    })
}

/// First date-like token, keyword-anchored forms first.
pub fn extract_deadline(text: &str) -> String {
    for re in deadline_res() {
        if let Some(m) = re.captures(text).and_then(|c| c.get(1)) {
            return m.as_str().trim().to_string();
        }
    }
    String::new()
}

/// First monetary amount as a plain decimal string, commas stripped.
///
/// When the text mentions [`MILLION_MARKER`] anywhere, the number is scaled
/// by 1,000,000.
pub fn extract_amount(text: &str) -> String {
    for re in amount_res() {
        let Some(m) = re.captures(text).and_then(|c| c.get(1)) else {
            continue;
        };
        let amount = m.as_str().replace(',', "");
        if text.contains(MILLION_MARKER) {
            return scale_by_million(&amount);
        }
        return amount;
    }
    String::new()
}

/// Multiply a non-negative decimal string by 10^6 without going through floats.
fn scale_by_million(amount: &str) -> String {
    let (int_part, frac_part) = amount.split_once('.').unwrap_or((amount, ""));
    let mut digits = String::with_capacity(int_part.len() + 6);
    digits.push_str(int_part);
    let shifted: String = frac_part.chars().take(6).collect();
    digits.push_str(&shifted);
    for _ in shifted.len()..6 {
        digits.push('0');
    }

    let whole = digits.trim_start_matches('0');
    let whole = if whole.is_empty() { "0" } else { whole };

    let rest = frac_part.get(6..).unwrap_or("").trim_end_matches('0');
    if rest.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{rest}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_deadline_beats_earlier_bare_date() {
        let s = "โพสต์ 01/01/2025 รับสมัครทุน หมดเขต 30/04/2025";
        assert_eq!(extract_deadline(s), "30/04/2025");
    }

    #[test]
    fn thai_month_abbreviation() {
        assert_eq!(extract_deadline("ส่งใบสมัคร 15 มี.ค. 2568 นี้"), "15 มี.ค. 2568");
        assert_eq!(extract_deadline("วันที่ 3-ธค-67"), "3-ธค-67");
    }

    #[test]
    fn spelled_out_thai_month_after_keyword_beats_later_slash_date() {
        let s = "หมดเขต 15 มีนาคม 2568 ประกาศเมื่อ 01/02/2025";
        assert_eq!(extract_deadline(s), "15 มีนาคม 2568");
        assert_eq!(extract_deadline("Applications open until 30 June 2025"), "30 June 2025");
    }

    #[test]
    fn keyword_with_colon_and_month_name() {
        assert_eq!(extract_deadline("สิ้นสุด: 31 ธันวาคม 2567"), "31 ธันวาคม 2567");
    }

    #[test]
    fn plain_number_is_not_cut_mid_token() {
        assert_eq!(extract_amount("รางวัล 1234 บาท"), "1234");
        assert_eq!(extract_amount("prize 1,250,000.50 Baht"), "1250000.50");
    }

    #[test]
    fn keyword_amount_without_currency() {
        assert_eq!(extract_amount("วงเงิน: 300,000 ต่อโครงการ"), "300000");
    }

    #[test]
    fn million_marker_anywhere_scales_first_match() {
        // The first pattern matches "500 บาท", and the unrelated ล้าน still scales it.
        assert_eq!(
            extract_amount("ค่าสมัคร 500 บาท จากงบรวม 3 ล้าน"),
            "500000000"
        );
    }

    #[test]
    fn scale_handles_decimals_and_zero() {
        assert_eq!(scale_by_million("2"), "2000000");
        assert_eq!(scale_by_million("2.5"), "2500000");
        assert_eq!(scale_by_million("0.25"), "250000");
        assert_eq!(scale_by_million("1.23456789"), "1234567.89");
        assert_eq!(scale_by_million("0"), "0");
    }
}

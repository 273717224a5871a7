//! Formatting utilities (AML verdicts → Telegram HTML).

use crate::{
    domain::{AmlResult, TransactionResult},
    i18n::Translations,
    Result,
};

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Risk scores are always shown with two decimals.
pub fn format_risk_score(score: f64) -> String {
    format!("{score:.2}")
}

pub fn format_address_result(
    tr: &Translations,
    lang: Option<&str>,
    result: &AmlResult,
) -> Result<String> {
    format_verdict(
        tr,
        lang,
        Verdict {
            header_key: "address_header",
            target: &result.address,
            is_suspicious: result.is_suspicious,
            risk_score: result.risk_score,
            details: &result.details,
        },
    )
}

pub fn format_transaction_result(
    tr: &Translations,
    lang: Option<&str>,
    result: &TransactionResult,
) -> Result<String> {
    format_verdict(
        tr,
        lang,
        Verdict {
            header_key: "transaction_header",
            target: &result.transaction_id,
            is_suspicious: result.is_suspicious,
            risk_score: result.risk_score,
            details: &result.details,
        },
    )
}

struct Verdict<'a> {
    header_key: &'a str,
    target: &'a str,
    is_suspicious: bool,
    risk_score: f64,
    details: &'a [String],
}

fn format_verdict(tr: &Translations, lang: Option<&str>, v: Verdict<'_>) -> Result<String> {
    let target = escape_html(v.target);
    let score = format_risk_score(v.risk_score);
    let status_key = if v.is_suspicious {
        "status_suspicious"
    } else {
        "status_clean"
    };

    let mut lines = vec![
        tr.get(lang, v.header_key, &[("target", target.as_str())])?,
        tr.get(lang, status_key, &[])?,
        tr.get(lang, "risk_score", &[("score", score.as_str())])?,
        tr.get(lang, "details_header", &[])?,
    ];

    let details: Vec<&str> = v
        .details
        .iter()
        .map(|d| d.trim())
        .filter(|d| !d.is_empty())
        .collect();
    if details.is_empty() {
        lines.push(tr.get(lang, "no_details", &[])?);
    } else {
        lines.extend(details.iter().map(|d| format!("• {}", escape_html(d))));
    }

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::DEFAULT_LANGUAGE;

    fn tr() -> Translations {
        Translations::builtin(DEFAULT_LANGUAGE).unwrap()
    }

    fn address(is_suspicious: bool, risk_score: f64, details: &[&str]) -> AmlResult {
        AmlResult {
            address: "0xabc".to_string(),
            is_suspicious,
            risk_score,
            details: details.iter().map(|d| d.to_string()).collect(),
        }
    }

    #[test]
    fn escapes_html() {
        let s = r#"<a href="x&y">"#;
        assert_eq!(escape_html(s), "&lt;a href=&quot;x&amp;y&quot;&gt;");
    }

    #[test]
    fn risk_score_has_two_decimals() {
        assert_eq!(format_risk_score(0.1), "0.10");
        assert_eq!(format_risk_score(0.756), "0.76");
        assert_eq!(format_risk_score(1.0), "1.00");
    }

    #[test]
    fn suspicious_and_clean_use_distinct_markers() {
        let bad = format_address_result(&tr(), None, &address(true, 0.8, &["high risk"])).unwrap();
        let good = format_address_result(&tr(), None, &address(false, 0.1, &["clean"])).unwrap();
        assert!(bad.contains("Suspicious"));
        assert!(!bad.contains("Clean"));
        assert!(good.contains("Clean"));
        assert!(!good.contains("Suspicious"));
        assert!(bad.contains("0.80"));
        assert!(good.contains("0.10"));
    }

    #[test]
    fn renders_each_detail_as_a_bullet() {
        let out =
            format_address_result(&tr(), None, &address(true, 0.9, &["mixer", "<darknet>"])).unwrap();
        assert!(out.contains("\n• mixer"));
        assert!(out.contains("\n• &lt;darknet&gt;"));
        assert!(out.contains("<code>0xabc</code>"));
    }

    #[test]
    fn blank_details_render_no_details_line() {
        let out = format_address_result(&tr(), None, &address(false, 0.0, &[""])).unwrap();
        assert!(out.ends_with("• No details available"));

        let out = format_address_result(&tr(), None, &address(false, 0.0, &[])).unwrap();
        assert!(out.ends_with("• No details available"));
    }

    #[test]
    fn transaction_block_is_localized() {
        let result = TransactionResult {
            transaction_id: "0xdef".to_string(),
            is_suspicious: true,
            risk_score: 0.8,
            details: vec!["high risk".to_string()],
        };
        let out = format_transaction_result(&tr(), Some("ru"), &result).unwrap();
        assert!(out.starts_with("🔎 Транзакция <code>0xdef</code>"));
        assert!(out.contains("Подозрительный"));
        assert!(out.contains("• high risk"));
    }
}

//! Key metric extraction from capital stack reports

use super::agent::ScenarioMetrics;
use once_cell::sync::Lazy;
use regex::Regex;

static TOTAL_EQUITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Total Equity Needed:\s*\$?([\d,.-]+)").expect("Valid regex pattern")
});
static DSCR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)DSCR Estimate:\s*([\d,.-]+)x").expect("Valid regex pattern")
});
static POST_CLOSE_LIQUIDITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Post-Close Liquidity:\s*\$?([\d,.-]+)").expect("Valid regex pattern")
});
/// Leading number of a cleaned value; anything after it (a range, a dash) is ignored
static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?(\d+\.?\d*|\.\d+)").expect("Valid regex pattern"));

/// Parse the `KEY_METRICS` block a capital stack report ends with
///
/// Values that are missing or do not parse as numbers are left as `None`.
pub fn parse_metrics_from_text(text: &str) -> ScenarioMetrics {
    ScenarioMetrics {
        total_equity_needed: capture_number(&TOTAL_EQUITY, text),
        dscr_estimate: capture_number(&DSCR, text),
        post_close_liquidity: capture_number(&POST_CLOSE_LIQUIDITY, text),
    }
}

fn capture_number(pattern: &Regex, text: &str) -> Option<f64> {
    let raw = pattern.captures(text)?.get(1)?.as_str();
    parse_number(raw)
}

fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    let number = LEADING_NUMBER.find(&cleaned)?.as_str();
    // Sentence punctuation right after the number ("$250,000.") is not part of it
    number.trim_end_matches('.').parse().ok()
}

//! Display formatting for amounts and percentages, and sanitization of
//! numeric text input.

/// Currency symbol prefixed to every rendered amount.
pub const CURRENCY_SYMBOL: &str = "\u{20b9}";

/// One lakh.
const LAKH: f64 = 100_000.0;
/// One thousand.
const THOUSAND: f64 = 1_000.0;

/// Formats an amount compactly: lakhs with an `L` suffix, thousands with a
/// `K` suffix (both with one decimal), whole units below that.
///
/// ```
/// use expense_tracker::format::compact_amount;
///
/// assert_eq!(compact_amount(250.0), "250");
/// assert_eq!(compact_amount(2_500.0), "2.5K");
/// assert_eq!(compact_amount(150_000.0), "1.5L");
/// ```
#[inline]
#[must_use]
pub fn compact_amount(amount: f64) -> String {
    if amount >= LAKH {
        format!("{:.1}L", amount / LAKH)
    } else if amount >= THOUSAND {
        format!("{:.1}K", amount / THOUSAND)
    } else {
        format!("{amount:.0}")
    }
}

/// Prefixes already-formatted amount text with the currency symbol.
#[inline]
#[must_use]
pub fn with_currency(amount_text: &str) -> String {
    format!("{CURRENCY_SYMBOL}{amount_text}")
}

/// Label for the upper end of the entry slider: whole thousands with a `K`
/// suffix, whole units below a thousand.
#[inline]
#[must_use]
pub fn slider_max_label(budget: f64) -> String {
    if budget >= THOUSAND {
        format!("{:.0}K", budget / THOUSAND)
    } else {
        format!("{budget:.0}")
    }
}

/// Percentage with one decimal, as shown next to the budget bar.
#[inline]
#[must_use]
pub fn percentage_label(percentage: f64) -> String {
    format!("{percentage:.1}%")
}

/// Percentage truncated to a whole number, as shown on the widgets.
#[inline]
#[must_use]
pub fn whole_percentage(percentage: f64) -> String {
    if percentage.is_finite() {
        format!("{}", percentage.trunc())
    } else {
        "0".to_owned()
    }
}

/// Keeps only ASCII digits and regroups them with thousands separators.
///
/// Leading zeros are dropped (a lone `0` is kept); empty input stays
/// empty.
///
/// ```
/// use expense_tracker::format::sanitize_digits;
///
/// assert_eq!(sanitize_digits("12a3,4"), "1,234");
/// assert_eq!(sanitize_digits(""), "");
/// ```
#[inline]
#[must_use]
pub fn sanitize_digits(input: &str) -> String {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return digits;
    }
    let significant = digits.trim_start_matches('0');
    if significant.is_empty() {
        return "0".to_owned();
    }
    group_thousands(significant)
}

/// Parses budget text produced by [`sanitize_digits`] (or typed by hand).
///
/// Separators are stripped before parsing. Returns `None` unless the
/// result is a finite number greater than zero.
#[inline]
#[must_use]
pub fn parse_budget_input(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|&ch| ch != ',' && !ch.is_whitespace())
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value > 0.0)
}

/// Inserts a comma between every group of three digits, counting from the
/// right.
fn group_thousands(digits: &str) -> String {
    let len = digits.chars().count();
    let mut grouped = String::new();
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (len - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

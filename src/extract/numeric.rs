//! Abbreviated counter parsing
//!
//! Counters are rendered as `"987"`, `"12,345"`, `"1.2K"`, `"5.5M"` or `"2B"`.
//! Parsing never fails: anything unreadable counts as zero so one malformed
//! counter cannot abort a harvest.

/// Parses a human-readable abbreviated count into an integer
///
/// # Rules
///
/// 1. Thousands separators (`,`) and all whitespace are removed, then the
///    text is upper-cased
/// 2. A trailing `K`, `M` or `B` multiplies the numeric prefix (parsed as a
///    float) by 1e3, 1e6 or 1e9; the product is truncated toward zero
/// 3. Without a suffix the text must be a plain non-negative integer
/// 4. Empty, negative, non-finite or otherwise unparseable input yields 0
///
/// Truncation after the float multiplication can under-count values that
/// sit just below an integer boundary: `"1.001K"` gives 1000 and `"2.01M"`
/// gives 2009999, while `"1.999K"` is exact and gives 1999.
///
/// # Examples
///
/// ```
/// use reel_harvest::parse_count;
///
/// assert_eq!(parse_count("1.2K"), 1_200);
/// assert_eq!(parse_count("5.5M"), 5_500_000);
/// assert_eq!(parse_count("12,345"), 12_345);
/// assert_eq!(parse_count("garbage"), 0);
/// ```
pub fn parse_count(text: &str) -> u64 {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();

    if cleaned.is_empty() {
        return 0;
    }

    let multiplier = match cleaned.chars().last() {
        Some('K') => Some(1e3),
        Some('M') => Some(1e6),
        Some('B') => Some(1e9),
        _ => None,
    };

    match multiplier {
        Some(factor) => {
            let prefix = &cleaned[..cleaned.len() - 1];
            match prefix.parse::<f64>() {
                Ok(value) if value.is_finite() && value >= 0.0 => (value * factor) as u64,
                _ => 0,
            }
        }
        None => cleaned.parse::<u64>().unwrap_or(0),
    }
}

//! Normalizes display strings like `"$12,345.67"` into numbers.

/// Parse a currency display string into a float.
///
/// Strips every character that is not an ASCII digit or a decimal point,
/// then parses the leading decimal run of what remains. Returns `None`
/// when no parseable number is left; callers treat that as a recoverable
/// "could not resolve value" outcome.
pub fn parse_currency(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    // Take the longest leading run that still forms one decimal number.
    let mut prefix = String::new();
    let mut seen_dot = false;
    let mut seen_digit = false;
    for c in cleaned.chars() {
        match c {
            '.' if seen_dot => break,
            '.' => {
                seen_dot = true;
                prefix.push(c);
            }
            d => {
                seen_digit = true;
                prefix.push(d);
            }
        }
    }

    if !seen_digit {
        return None;
    }
    prefix.parse().ok()
}

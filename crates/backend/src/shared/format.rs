/// Formats a number with thousands separators (dots)
///
/// # Examples
/// ```
/// use backend::shared::format::format_number;
/// assert_eq!(format_number(1234567), "1.234.567");
/// assert_eq!(format_number(42), "42");
/// assert_eq!(format_number(0), "0");
/// ```
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push('.');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

const MILLIFY_SUFFIXES: [&str; 5] = ["", "k", "M", "B", "T"];

/// Human-abbreviated amount for scorecards
///
/// The magnitude picks the suffix, the mantissa is printed with `precision`
/// decimals and trailing zeros are dropped.
///
/// # Examples
/// ```
/// use backend::shared::format::millify;
/// assert_eq!(millify(1_234_567.0, 2), "1.23M");
/// assert_eq!(millify(1_200_000.0, 2), "1.2M");
/// assert_eq!(millify(512.5, 2), "512.5");
/// ```
pub fn millify(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }

    let idx = if value == 0.0 {
        0
    } else {
        let magnitude = (value.abs().log10() / 3.0).floor();
        magnitude.clamp(0.0, (MILLIFY_SUFFIXES.len() - 1) as f64) as usize
    };

    let scaled = value / 10f64.powi(3 * idx as i32);
    let mut text = format!("{:.*}", precision, scaled);
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text = "0".to_string();
    }

    format!("{}{}", text, MILLIFY_SUFFIXES[idx])
}

/// Rounds to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

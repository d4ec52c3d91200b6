use lazy_static::lazy_static;

use regex::Regex;

lazy_static! {
    /// Number, whitespace, then a unit spec.
    /// Examples: "100 bar", "10.5 m", "5 kg/s", "1e3 Pa", "-20 degC", "2 1/s", "3 (0.3048 m)^2"
    static ref QUANTITY_PATTERN: Regex = Regex::new(
        r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?\s+[A-Za-z$%1(][A-Za-z0-9$%^*/.+\-() ]*$"
    ).unwrap();

    static ref NUMBER_PATTERN: Regex = Regex::new(
        r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$"
    ).unwrap();
}

/// Check if a string looks like a value with a unit attached
pub fn looks_like_quantity(s: &str) -> bool {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return false;
    }
    QUANTITY_PATTERN.is_match(trimmed)
}

/// Check if a string is a plain number
pub fn looks_like_number(s: &str) -> bool {
    NUMBER_PATTERN.is_match(s.trim())
}

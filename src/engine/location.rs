use once_cell::sync::Lazy;
use regex::Regex;

static LOCATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([-\d.]+)\s*,\s*([-\d.]+)\)").unwrap());

/// Extracts `(latitude, longitude)` from location text such as `"(41.8, -87.6)"`.
///
/// The first parenthesised pair found anywhere in the text is used. Each number may only
/// contain digits, `-` and `.`, and whitespace is allowed on either side of the comma.
/// Returns `None` when no such pair exists or either number fails to parse.
pub fn parse_location(text: &str) -> Option<(f64, f64)> {
    let caps = LOCATION_RE.captures(text)?;
    let lat = caps.get(1)?.as_str().parse().ok()?;
    let lon = caps.get(2)?.as_str().parse().ok()?;
    Some((lat, lon))
}

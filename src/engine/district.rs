/// Canonical join key for a district code.
///
/// The code is integer-parsed and re-rendered, so `"022"`, `"22"` and `" 22 "` all
/// become `"22"`. Anything that is not a non-negative integer yields `None`.
pub fn normalize_district_key(raw: &str) -> Option<String> {
    let value: i64 = raw.trim().parse().ok()?;
    if value < 0 {
        return None;
    }
    Some(value.to_string())
}

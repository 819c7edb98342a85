/// Parse a base-10 signed integer, falling back to `default` on any error.
///
/// An optional leading `+` or `-` is accepted; surrounding whitespace is not.
pub fn parse_int_or(value: &str, default: i64) -> i64 {
    parse_int(value).unwrap_or(default)
}

pub fn parse_int(value: &str) -> Option<i64> {
    value.parse().ok()
}

/// Parse `true`/`false`, `t`/`f` or `1`/`0`, ignoring ASCII case.
pub fn parse_bool(value: &str) -> Option<bool> {
    const TRUE: [&str; 3] = ["true", "t", "1"];
    const FALSE: [&str; 3] = ["false", "f", "0"];

    if TRUE.iter().any(|form| value.eq_ignore_ascii_case(form)) {
        Some(true)
    } else if FALSE.iter().any(|form| value.eq_ignore_ascii_case(form)) {
        Some(false)
    } else {
        None
    }
}

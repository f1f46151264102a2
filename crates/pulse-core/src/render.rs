//! Exposition-format rendering primitives.

/// Escape a label value for exposition output.
///
/// Backslash escaping must run first; otherwise the backslashes
/// introduced for newlines and quotes would be escaped again.
pub fn escape_label_value(v: &str) -> String {
    v.replace('\\', r"\\")
        .replace('\n', r"\n")
        .replace('"', "\\\"")
}

/// Render a sample value.
///
/// Non-finite floats use the exposition spellings `Inf`, `-Inf`, and
/// `Nan`; everything else is the shortest decimal representation that
/// round-trips.
pub fn render_number(v: f64) -> String {
    if v == f64::INFINITY {
        "Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else if v.is_nan() {
        "Nan".to_string()
    } else {
        v.to_string()
    }
}

use similar::TextDiff;

/// Unified diff from the file on disk to freshly generated output, or `None`
/// when they match.
pub fn build_unified_diff(original: &str, modified: &str, path: &str) -> Option<String> {
    if original == modified {
        return None;
    }

    let diff = TextDiff::from_lines(original, modified);
    let header_old = format!("a/{path}");
    let header_new = format!("b/{path}");
    Some(
        diff.unified_diff()
            .header(&header_old, &header_new)
            .to_string(),
    )
}

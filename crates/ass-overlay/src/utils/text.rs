//! Small string helpers shared by path handling and tag scanning

/// Final component of a path, splitting on both `/` and `\`
///
/// Script authors write paths for whatever platform they were on, so both
/// separators are honored regardless of the host.
pub fn path_basename(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(cut) => &path[cut + 1..],
        None => path,
    }
}

/// Lowercased (ASCII only) final path component
pub fn basename_lower(path: &str) -> String {
    path_basename(path).to_ascii_lowercase()
}

/// ASCII case-insensitive prefix test on raw bytes
pub fn starts_with_ignore_case(text: &[u8], prefix: &[u8]) -> bool {
    text.len() >= prefix.len() && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Trim spaces and tabs from both ends of a byte slice
pub fn trim_blanks(mut bytes: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = bytes {
        bytes = rest;
    }
    while let [rest @ .., b' ' | b'\t'] = bytes {
        bytes = rest;
    }
    bytes
}

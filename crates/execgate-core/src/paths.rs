//! Virtual path helpers.
//!
//! Every comparison between a requested path and a configured VFS entry goes
//! through [`normalize`], so both sides are lowercase, forward-slash separated
//! and free of a trailing slash.

use percent_encoding::percent_decode_str;

/// Canonical comparable form of a virtual path or path segment.
pub fn normalize(raw: &str) -> String {
    let lowered = raw.to_lowercase().replace('\\', "/");
    match lowered.strip_suffix('/') {
        Some(stripped) => stripped.to_string(),
        None => lowered,
    }
}

/// Splits a pipe-delimited setting, trimming entries and dropping empty ones.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Decodes the percent-encoded path sent by the UI.
///
/// Returns `None` when the decoded bytes are not valid UTF-8.
pub fn decode_virtual_path(encoded: &str) -> Option<String> {
    percent_decode_str(encoded)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}

/// First configured root that `normalized` equals or descends from.
pub fn vfs_root_for<'a>(normalized: &str, roots: &'a [String]) -> Option<&'a str> {
    roots
        .iter()
        .map(String::as_str)
        .find(|root| normalized == *root || normalized.starts_with(&format!("{root}/")))
}

/// Lowercased text after the last `.` of the final segment, or an empty string.
pub fn extension_of(path: &str) -> String {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => String::new(),
        Some(index) => name[index + 1..].to_lowercase(),
    }
}

/// Final segment of a virtual path, accepting either separator.
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Part of a decoded virtual path below its VFS root.
///
/// The root is stripped by segment count so the remaining segments keep their
/// original spelling. A path outside every root is returned whole.
pub fn relative_to_vfs_root(virtual_path: &str, roots: &[String]) -> String {
    let display = virtual_path.replace('\\', "/");
    let normalized = normalize(virtual_path);
    match vfs_root_for(&normalized, roots) {
        Some(root) => {
            let depth = root.split('/').count();
            display.split('/').skip(depth).collect::<Vec<_>>().join("/")
        }
        None => display,
    }
}

/// True when any segment of `relative` is a parent-directory token.
pub fn has_parent_segment(relative: &str) -> bool {
    relative.split(['/', '\\']).any(|segment| segment == "..")
}

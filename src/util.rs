use std::path::Path;

/// Return true if the given path's extension matches any of the configured
/// file_extensions patterns ("*.mp3", "mp3", ".mp3"), case-insensitive.
pub fn path_matches_extensions(path: &Path, exts: &[String]) -> bool {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(s) => s.to_ascii_lowercase(),
        None => return false,
    };
    for pat in exts {
        let mut p = pat.trim();
        if p.is_empty() {
            continue;
        }
        // strip common prefixes: "*." or "."
        if let Some(stripped) = p.strip_prefix("*.") {
            p = stripped;
        } else if let Some(stripped) = p.strip_prefix('.') {
            p = stripped;
        }
        if ext == p.to_ascii_lowercase() {
            return true;
        }
    }
    false
}

/// Display name of a path: its last component, or the whole path for roots like "/".
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

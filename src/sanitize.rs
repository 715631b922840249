/// Characters rejected by at least one common filesystem (NTFS/FAT are the strictest).
const ILLEGAL_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

const RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL",
    "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8", "COM9",
    "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizePolicy {
    /// Inserted in place of every illegal character.
    pub replacement: String,
    /// Maximum length in bytes of the file stem (extension excluded).
    pub max_len: usize,
}

impl Default for SanitizePolicy {
    fn default() -> Self {
        Self { replacement: "_".into(), max_len: 200 }
    }
}

/// Turn a title tag into a file stem that is legal on Windows, macOS and Linux.
/// Returns None when nothing usable remains.
pub fn sanitize_title(title: &str, policy: &SanitizePolicy) -> Option<String> {
    // the replacement itself must not smuggle illegal characters back in
    let replacement: String = policy
        .replacement
        .chars()
        .filter(|c| !ILLEGAL_CHARS.contains(c) && !c.is_control())
        .collect();

    let mut out = String::with_capacity(title.len());
    for c in title.chars() {
        if ILLEGAL_CHARS.contains(&c) || c.is_control() {
            out.push_str(&replacement);
        } else {
            out.push(c);
        }
    }

    let suffix = if replacement.is_empty() { "_" } else { replacement.as_str() };
    let mut name = truncate(trim_name(&out), policy.max_len);

    if is_reserved(&name) {
        name = mark_reserved(&name, suffix);
        if name.len() > policy.max_len {
            name = truncate(&name, policy.max_len);
            if is_reserved(&name) {
                return None;
            }
        }
    }

    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Cut to at most `max_len` bytes on a char boundary, then re-trim.
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut cut = max_len;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    trim_name(&s[..cut]).to_string()
}

/// Insert the suffix right after the device name, so "CON.foo" becomes "CON_.foo".
fn mark_reserved(name: &str, suffix: &str) -> String {
    match name.find('.') {
        Some(i) => format!("{}{}{}", &name[..i], suffix, &name[i..]),
        None => format!("{}{}", name, suffix),
    }
}

fn trim_name(s: &str) -> &str {
    // Windows silently drops trailing dots and spaces
    s.trim().trim_end_matches(['.', ' ']).trim()
}

fn is_reserved(name: &str) -> bool {
    let base = name.split('.').next().unwrap_or(name).trim_end();
    RESERVED_NAMES.iter().any(|r| r.eq_ignore_ascii_case(base))
}
